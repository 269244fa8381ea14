use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::errors::{DeskPilotError, DeskPilotResult};

/// One plan entry as the model emitted it, before schema validation.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAction {
    pub action: String,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub description: Option<String>,
}

fn array_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\[.*\]").expect("hard-coded pattern"))
}

/// Extracts the action array from a free-text model payload.
///
/// Models often wrap the JSON in prose or code fences, so the first
/// bracketed region is located before decoding. Anything that does not
/// decode as an array of action records is a malformed-output failure,
/// never an empty plan.
pub fn extract_actions(payload: &str) -> DeskPilotResult<Vec<RawAction>> {
    let candidate = array_pattern()
        .find(payload)
        .map(|m| m.as_str())
        .unwrap_or_else(|| payload.trim());

    serde_json::from_str::<Vec<RawAction>>(candidate).map_err(|e| {
        DeskPilotError::MalformedOutput(format!("expected a JSON array of actions: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_array_from_chatty_payload() {
        let payload = r#"Sure! Here is the plan:
```json
[
  {"action": "open_browser", "params": {}},
  {"action": "navigate", "params": {"url": "https://google.com"}}
]
```
Let me know if you need anything else."#;
        let actions = extract_actions(payload).unwrap();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].action, "open_browser");
        assert_eq!(actions[1].params["url"], "https://google.com");
    }

    #[test]
    fn bare_array_parses() {
        let actions = extract_actions(r#"[{"action": "wait"}]"#).unwrap();
        assert_eq!(actions.len(), 1);
        assert!(actions[0].params.is_empty());
    }

    #[test]
    fn empty_array_is_not_an_error_here() {
        assert!(extract_actions("[]").unwrap().is_empty());
    }

    #[test]
    fn prose_without_json_is_malformed() {
        let err = extract_actions("I cannot help with that.").unwrap_err();
        assert!(matches!(err, DeskPilotError::MalformedOutput(_)));
    }

    #[test]
    fn object_payload_is_malformed() {
        // A record instead of an array must fail loudly, not yield an empty plan.
        let err = extract_actions(r#"{"action": "open_browser"}"#).unwrap_err();
        assert!(matches!(err, DeskPilotError::MalformedOutput(_)));
    }
}
