use std::fmt::Write as _;

use crate::schema::{ActionSpec, ACTION_SPECS};

/// Builds the interpretation prompt: the command, the enumerated action
/// schema, and optionally the previous plan as context.
pub fn build_prompt(command: &str, context: Option<&str>) -> String {
    let mut prompt = String::from(
        "You are an automation parser. Convert the user command into a JSON array of actions.\n\n\
         Available action types:\n",
    );
    for spec in ACTION_SPECS {
        let _ = writeln!(prompt, "- {}", describe(spec));
    }

    prompt.push_str(
        "\nReturn ONLY a valid JSON array of actions. Example:\n\
         [\n\
         \x20 {\"action\": \"open_browser\", \"params\": {}},\n\
         \x20 {\"action\": \"navigate\", \"params\": {\"url\": \"https://youtube.com\"}},\n\
         \x20 {\"action\": \"search_web\", \"params\": {\"query\": \"songs\", \"site\": \"youtube\"}},\n\
         \x20 {\"action\": \"press_key\", \"params\": {\"key\": \"space\"}}\n\
         ]\n\n\
         Only use the listed action types and parameter names. \
         If the command contains no actionable intent, return an empty array [].\n",
    );

    if let Some(context) = context {
        let _ = write!(prompt, "\nPrevious plan for context:\n{context}\n");
    }

    let _ = write!(prompt, "\nUser command: {command}\n\nReturn JSON array:");
    prompt
}

fn describe(spec: &ActionSpec) -> String {
    let mut line = format!("{}: {}", spec.name, spec.summary);
    if !spec.required.is_empty() {
        let keys: Vec<&str> = spec.required.iter().map(|p| p.key).collect();
        let _ = write!(line, " (params: {})", keys.join(", "));
    }
    if !spec.optional.is_empty() {
        let keys: Vec<&str> = spec.optional.iter().map(|p| p.key).collect();
        let _ = write!(line, " (optional: {})", keys.join(", "));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_enumerates_every_kind() {
        let prompt = build_prompt("open chrome", None);
        for spec in ACTION_SPECS {
            assert!(prompt.contains(spec.name), "missing {}", spec.name);
        }
        assert!(prompt.contains("User command: open chrome"));
    }

    #[test]
    fn prompt_embeds_context_when_given() {
        let prompt = build_prompt("try again", Some("[{\"action\":\"open_browser\"}]"));
        assert!(prompt.contains("Previous plan for context"));
        assert!(prompt.contains("open_browser"));
    }
}
