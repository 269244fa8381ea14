use async_trait::async_trait;

use crate::errors::{DeskPilotError, DeskPilotResult};
use crate::llm::backend::LlmBackend;

const SYSTEM_ROLE: &str = "You are an automation command parser. Return only valid JSON.";

pub struct OpenAiCompatibleBackend {
    id: String,
    api_base: String,
    api_key: String,
    model: String,
    temperature: f64,
    client: reqwest::Client,
}

impl OpenAiCompatibleBackend {
    pub fn new(
        id: String,
        api_base: String,
        api_key: String,
        model: String,
        temperature: f64,
    ) -> Self {
        Self {
            id,
            api_base,
            api_key,
            model,
            temperature,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LlmBackend for OpenAiCompatibleBackend {
    fn name(&self) -> &str {
        &self.id
    }

    async fn complete(&self, prompt: &str) -> DeskPilotResult<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_ROLE },
                { "role": "user", "content": prompt },
            ],
            "stream": false,
            "temperature": self.temperature,
        });

        tracing::debug!(
            backend = %self.id,
            model = %self.model,
            prompt_len = prompt.len(),
            "sending completion request"
        );

        let response = self
            .client
            .post(&self.api_base)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let err_body = response.text().await.unwrap_or_default();
            return Err(DeskPilotError::LlmBackend(format!("{status}: {err_body}")));
        }

        let json: serde_json::Value = response.json().await?;
        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_string();

        tracing::debug!(backend = %self.id, content_len = content.len(), "completion received");
        Ok(content)
    }
}
