use std::collections::HashMap;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::errors::{DeskPilotError, DeskPilotResult};
use crate::llm::backend::LlmBackend;
use crate::llm::providers::ollama::OllamaBackend;
use crate::llm::providers::openai_compatible::OpenAiCompatibleBackend;

/// Registry of all available AI backends, keyed by their config.toml identifier.
pub struct BackendRegistry {
    backends: HashMap<String, Arc<dyn LlmBackend>>,
    active: String,
}

impl BackendRegistry {
    pub fn new(active: String) -> Self {
        Self {
            backends: HashMap::new(),
            active,
        }
    }

    pub fn register(&mut self, backend: Arc<dyn LlmBackend>) {
        self.backends.insert(backend.name().to_string(), backend);
    }

    pub fn get_active(&self) -> DeskPilotResult<Arc<dyn LlmBackend>> {
        self.backends.get(&self.active).cloned().ok_or_else(|| {
            DeskPilotError::Config(format!(
                "Active backend '{}' not found in registry",
                self.active
            ))
        })
    }

    pub fn set_active(&mut self, name: String) -> DeskPilotResult<()> {
        if self.backends.contains_key(&name) {
            self.active = name;
            Ok(())
        } else {
            Err(DeskPilotError::Config(format!(
                "Backend '{name}' not registered"
            )))
        }
    }

    pub fn list_names(&self) -> Vec<String> {
        self.backends.keys().cloned().collect()
    }

    /// Build a registry from the loaded app config.
    /// API keys are read from environment variables named `DESKPILOT_<ID>_API_KEY`.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut registry = Self::new(config.llm.active_backend.clone());
        for (id, entry) in &config.llm.backends {
            let backend: Arc<dyn LlmBackend> = match entry.adapter.as_deref() {
                Some("ollama") => Arc::new(OllamaBackend::new(
                    id.clone(),
                    entry.api_base.clone(),
                    entry.model.clone(),
                )),
                _ => {
                    let api_key = std::env::var(format!("DESKPILOT_{}_API_KEY", id.to_uppercase()))
                        .unwrap_or_else(|_| entry.api_key.clone().unwrap_or_default());
                    Arc::new(OpenAiCompatibleBackend::new(
                        id.clone(),
                        entry.api_base.clone(),
                        api_key,
                        entry.model.clone(),
                        entry.temperature,
                    ))
                }
            };
            registry.register(backend);
        }
        registry
    }
}
