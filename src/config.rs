use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::{DeskPilotError, DeskPilotResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub llm: LlmConfig,
    #[serde(default)]
    pub automation: AutomationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LlmConfig {
    pub active_backend: String,
    pub backends: HashMap<String, BackendEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendEntry {
    pub display_name: String,
    pub api_base: String,
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// "ollama" for a local Ollama instance, None for OpenAI-compatible.
    pub adapter: Option<String>,
    /// Optional API key stored in config.toml (falls back to env var DESKPILOT_<ID>_API_KEY).
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_temperature() -> f64 {
    0.3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationConfig {
    /// Upper bound on one driver call.
    #[serde(default = "default_action_timeout")]
    pub action_timeout_secs: u64,
    /// Upper bound on one AI-backend call.
    #[serde(default = "default_interpret_timeout")]
    pub interpret_timeout_secs: u64,
    /// Route sensitive actions through the confirmation gate.
    #[serde(default)]
    pub require_confirmation: bool,
    /// How long to wait for approval before treating it as denial.
    #[serde(default = "default_confirmation_timeout")]
    pub confirmation_timeout_secs: u64,
    #[serde(default)]
    pub headless_browser: bool,
    /// Registry capacity; oldest terminal tasks are evicted past this.
    #[serde(default = "default_max_tasks")]
    pub max_tasks: usize,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            action_timeout_secs: default_action_timeout(),
            interpret_timeout_secs: default_interpret_timeout(),
            require_confirmation: false,
            confirmation_timeout_secs: default_confirmation_timeout(),
            headless_browser: false,
            max_tasks: default_max_tasks(),
        }
    }
}

fn default_action_timeout() -> u64 {
    30
}

fn default_interpret_timeout() -> u64 {
    60
}

fn default_confirmation_timeout() -> u64 {
    30
}

fn default_max_tasks() -> usize {
    100
}

fn resolve_config_path() -> DeskPilotResult<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            let candidate = parent.join("config.toml");
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "config found next to executable");
                return Ok(candidate);
            }
        }
    }

    let cwd = std::env::current_dir()?;
    let candidate = cwd.join("config.toml");
    if candidate.exists() {
        tracing::debug!(path = %candidate.display(), "config found in working directory");
        return Ok(candidate);
    }

    Err(DeskPilotError::Config(
        "config.toml not found next to executable or in working directory".into(),
    ))
}

pub fn load_config() -> DeskPilotResult<AppConfig> {
    let path = resolve_config_path()?;
    let content = std::fs::read_to_string(&path)?;
    let config: AppConfig = toml::from_str(&content)?;
    tracing::info!(
        path = %path.display(),
        backend = %config.llm.active_backend,
        "config loaded"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn automation_defaults_apply() {
        let config: AppConfig = toml::from_str(
            r#"
            [llm]
            active_backend = "openai"

            [llm.backends.openai]
            display_name = "OpenAI"
            api_base = "https://api.openai.com/v1/chat/completions"
            model = "gpt-4o-mini"
            "#,
        )
        .unwrap();
        assert_eq!(config.automation.action_timeout_secs, 30);
        assert_eq!(config.automation.max_tasks, 100);
        assert!(!config.automation.require_confirmation);
    }

    #[test]
    fn ollama_entry_parses() {
        let config: AppConfig = toml::from_str(
            r#"
            [llm]
            active_backend = "local"

            [llm.backends.local]
            display_name = "Ollama"
            api_base = "http://localhost:11434"
            model = "llama2"
            adapter = "ollama"

            [automation]
            require_confirmation = true
            headless_browser = true
            "#,
        )
        .unwrap();
        let entry = &config.llm.backends["local"];
        assert_eq!(entry.adapter.as_deref(), Some("ollama"));
        assert!(config.automation.require_confirmation);
        assert!(config.automation.headless_browser);
    }
}
