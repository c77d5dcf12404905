//! User settings: AI provider, storage backend and layout options.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::layout::LayoutSettings;
use crate::storage::kindred_dir;

pub const DEFAULT_DOCUMENT: &str = "family-tree";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AiSettings {
    pub provider: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Local,
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageSettings {
    pub backend: Backend,
    /// Base URL of the remote document store.
    pub endpoint: String,
    pub api_key: String,
    /// Document key, also the tree name for the local backend.
    pub document: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: Backend::Local,
            endpoint: String::new(),
            api_key: String::new(),
            document: DEFAULT_DOCUMENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub ai: AiSettings,
    pub storage: StorageSettings,
    pub layout: LayoutSettings,
}

pub fn settings_path() -> PathBuf {
    kindred_dir().join("settings.json")
}

/// Missing or unreadable settings fall back to defaults.
pub fn read_settings() -> Settings {
    let path = settings_path();
    if !path.exists() {
        return Settings::default();
    }
    fs::read_to_string(&path)
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

pub fn write_settings(settings: &Settings) -> std::io::Result<()> {
    let dir = kindred_dir();
    fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(settings_path(), json)
}

pub fn ai_configured(settings: &AiSettings) -> bool {
    !settings.provider.is_empty()
        && !settings.model.is_empty()
        && (settings.provider == "ollama" || !settings.api_key.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Orientation;

    #[test]
    fn partial_document_fills_defaults() {
        let settings: Settings = serde_json::from_str(
            r#"{"storage": {"backend": "remote", "endpoint": "https://example.org"},
                "layout": {"orientation": "horizontal"}}"#,
        )
        .unwrap();
        assert_eq!(settings.storage.backend, Backend::Remote);
        assert_eq!(settings.storage.document, DEFAULT_DOCUMENT);
        assert_eq!(settings.layout.orientation, Orientation::Horizontal);
        assert_eq!(settings.layout.node_width, LayoutSettings::default().node_width);
        assert!(settings.ai.provider.is_empty());
    }

    #[test]
    fn ai_needs_key_except_for_ollama() {
        let mut ai = AiSettings {
            provider: "openai".into(),
            api_key: String::new(),
            model: "gpt-4o-mini".into(),
        };
        assert!(!ai_configured(&ai));
        ai.api_key = "sk-test".into();
        assert!(ai_configured(&ai));
        let local = AiSettings {
            provider: "ollama".into(),
            api_key: String::new(),
            model: "llama3".into(),
        };
        assert!(ai_configured(&local));
        assert!(!ai_configured(&AiSettings::default()));
    }
}
