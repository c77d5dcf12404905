pub mod engine;
mod parse;
mod prompt;

use kindred_core::{ai_configured, AiSettings, Graph};
use tracing::{debug, warn};

pub use engine::GenerateError;
pub use parse::clean_output;
pub use prompt::biography_prompt;

/// Returned instead of generated text whenever generation fails.
pub const FALLBACK_TEXT: &str = "Text generation is unavailable right now. Check the AI settings and try again.";

/// Generate text for `prompt`. Never fails: any error yields [`FALLBACK_TEXT`].
pub async fn generate_text(settings: &AiSettings, prompt: &str) -> String {
    if !ai_configured(settings) {
        debug!("AI provider not configured");
        return FALLBACK_TEXT.to_string();
    }
    let system = prompt::system_prompt();

    debug!(provider = %settings.provider, model = %settings.model, "sending prompt");

    match engine::generate(settings, &system, prompt).await {
        Ok(raw) => {
            let text = clean_output(&raw);
            if text.is_empty() {
                warn!("generated text was empty after cleanup");
                FALLBACK_TEXT.to_string()
            } else {
                text
            }
        }
        Err(e) => {
            warn!(error = %e, "text generation failed");
            FALLBACK_TEXT.to_string()
        }
    }
}

/// Biography for one member, from the member and their immediate family.
pub async fn generate_biography(settings: &AiSettings, graph: &Graph, id: &str) -> String {
    match prompt::biography_prompt(graph, id) {
        Some(prompt) => generate_text(settings, &prompt).await,
        None => {
            warn!(member_id = id, "biography requested for unknown member");
            FALLBACK_TEXT.to_string()
        }
    }
}
