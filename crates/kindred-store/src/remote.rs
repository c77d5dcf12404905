use std::time::Duration;

use async_trait::async_trait;
use kindred_core::{export_json, import_json, Graph};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use tracing::debug;

use crate::{DocumentStore, StoreError, StoreResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Document kept by an HTTP document service:
/// `GET`/`PUT {endpoint}/documents/{key}`.
#[derive(Debug, Clone)]
pub struct RemoteStore {
    client: Client,
    url: Url,
    api_key: String,
}

impl RemoteStore {
    pub fn new(endpoint: &str, api_key: &str, document: &str) -> StoreResult<Self> {
        let endpoint = endpoint.trim().trim_end_matches('/');
        if endpoint.is_empty() {
            return Err(StoreError::MissingEndpoint);
        }
        let invalid = || StoreError::InvalidEndpoint(endpoint.to_string());
        let mut url = Url::parse(endpoint).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .push("documents")
            .push(document);

        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            url,
            api_key: api_key.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        if self.api_key.is_empty() {
            req
        } else {
            req.bearer_auth(&self.api_key)
        }
    }
}

#[async_trait]
impl DocumentStore for RemoteStore {
    fn name(&self) -> &str {
        "remote"
    }

    async fn load(&self) -> StoreResult<Option<Graph>> {
        let resp = self.authorized(self.client.get(self.url.clone())).send().await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            debug!(url = %self.url, "no remote document");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
            });
        }
        let body = resp.text().await?;
        Ok(Some(import_json(&body)?))
    }

    async fn save(&self, graph: &Graph) -> StoreResult<()> {
        let body = export_json(graph)?;
        let resp = self
            .authorized(self.client.put(self.url.clone()))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    async fn test_connection(&self) -> bool {
        match self.authorized(self.client.get(self.url.clone())).send().await {
            Ok(resp) => resp.status().is_success() || resp.status() == StatusCode::NOT_FOUND,
            Err(e) => {
                debug!(url = %self.url, error = %e, "remote store unreachable");
                false
            }
        }
    }
}
