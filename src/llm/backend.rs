use async_trait::async_trait;

use crate::errors::DeskPilotResult;

/// Unified AI backend trait. All backends implement this trait.
/// New backends only need to implement this trait and register in config.toml.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Returns the backend's identifier (matches config.toml key).
    fn name(&self) -> &str;

    /// Sends one prompt and returns the raw text completion.
    ///
    /// The payload is untrusted free text; callers must validate anything
    /// extracted from it before acting on it.
    async fn complete(&self, prompt: &str) -> DeskPilotResult<String>;
}
