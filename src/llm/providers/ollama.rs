use async_trait::async_trait;

use crate::errors::{DeskPilotError, DeskPilotResult};
use crate::llm::backend::LlmBackend;

/// Local Ollama instance, spoken to through its native generate endpoint.
pub struct OllamaBackend {
    id: String,
    api_base: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaBackend {
    pub fn new(id: String, api_base: String, model: String) -> Self {
        Self {
            id,
            api_base,
            model,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    fn name(&self) -> &str {
        &self.id
    }

    async fn complete(&self, prompt: &str) -> DeskPilotResult<String> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
        });

        tracing::debug!(backend = %self.id, model = %self.model, "sending generate request");

        let response = self
            .client
            .post(format!("{}/api/generate", self.api_base))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let err_body = response.text().await.unwrap_or_default();
            return Err(DeskPilotError::LlmBackend(format!("{status}: {err_body}")));
        }

        let json: serde_json::Value = response.json().await?;
        let content = json["response"].as_str().unwrap_or("").to_string();

        tracing::debug!(backend = %self.id, content_len = content.len(), "generate response received");
        Ok(content)
    }
}
