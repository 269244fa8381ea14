//! Shared action vocabulary: every kind the interpreter may emit and the
//! engine may dispatch, with its parameter shape and backend affinity.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Closed set of automation action kinds.
///
/// Adding a kind means adding one entry to [`ACTION_SPECS`] (at the matching
/// discriminant position) and one dispatch arm in the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    OpenBrowser,
    Navigate,
    SearchWeb,
    Click,
    FillField,
    CloseBrowser,
    OpenApp,
    PressKey,
    Hotkey,
    TypeText,
    Wait,
    Screenshot,
}

/// Which execution backend an action kind is dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Affinity {
    Browser,
    System,
}

/// Expected JSON type of one parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Str,
    Number,
}

impl ParamType {
    pub fn matches(self, value: &Value) -> bool {
        match self {
            ParamType::Str => value.is_string(),
            ParamType::Number => value.is_number(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub key: &'static str,
    pub ty: ParamType,
}

const fn p(key: &'static str, ty: ParamType) -> ParamSpec {
    ParamSpec { key, ty }
}

/// Static schema entry for one action kind.
#[derive(Debug, Clone, Copy)]
pub struct ActionSpec {
    pub kind: ActionKind,
    pub name: &'static str,
    pub summary: &'static str,
    pub required: &'static [ParamSpec],
    pub optional: &'static [ParamSpec],
    pub affinity: Affinity,
    /// A failed blocking action invalidates every later action in the plan.
    pub blocking: bool,
    /// Sensitive actions go through the confirmation gate when it is enabled.
    pub sensitive: bool,
}

impl ActionSpec {
    /// Looks a parameter key up across the required and optional sets.
    pub fn param(&self, key: &str) -> Option<&'static ParamSpec> {
        self.required
            .iter()
            .chain(self.optional.iter())
            .find(|spec| spec.key == key)
    }
}

/// The full action schema, indexed by `ActionKind` discriminant.
pub const ACTION_SPECS: &[ActionSpec] = &[
    ActionSpec {
        kind: ActionKind::OpenBrowser,
        name: "open_browser",
        summary: "Open the web browser",
        required: &[],
        optional: &[],
        affinity: Affinity::Browser,
        blocking: true,
        sensitive: false,
    },
    ActionSpec {
        kind: ActionKind::Navigate,
        name: "navigate",
        summary: "Go to a URL",
        required: &[p("url", ParamType::Str)],
        optional: &[],
        affinity: Affinity::Browser,
        blocking: false,
        sensitive: false,
    },
    ActionSpec {
        kind: ActionKind::SearchWeb,
        name: "search_web",
        summary: "Search on a website (site defaults to google)",
        required: &[p("query", ParamType::Str)],
        optional: &[p("site", ParamType::Str)],
        affinity: Affinity::Browser,
        blocking: false,
        sensitive: false,
    },
    ActionSpec {
        kind: ActionKind::Click,
        name: "click",
        summary: "Click a page element by CSS selector",
        required: &[p("selector", ParamType::Str)],
        optional: &[],
        affinity: Affinity::Browser,
        blocking: false,
        sensitive: true,
    },
    ActionSpec {
        kind: ActionKind::FillField,
        name: "fill_field",
        summary: "Fill a form field by CSS selector",
        required: &[p("selector", ParamType::Str), p("text", ParamType::Str)],
        optional: &[],
        affinity: Affinity::Browser,
        blocking: false,
        sensitive: true,
    },
    ActionSpec {
        kind: ActionKind::CloseBrowser,
        name: "close_browser",
        summary: "Close the web browser",
        required: &[],
        optional: &[],
        affinity: Affinity::Browser,
        blocking: false,
        sensitive: false,
    },
    ActionSpec {
        kind: ActionKind::OpenApp,
        name: "open_app",
        summary: "Open a desktop application",
        required: &[p("name", ParamType::Str)],
        optional: &[],
        affinity: Affinity::System,
        blocking: true,
        sensitive: true,
    },
    ActionSpec {
        kind: ActionKind::PressKey,
        name: "press_key",
        summary: "Press a keyboard key",
        required: &[p("key", ParamType::Str)],
        optional: &[],
        affinity: Affinity::System,
        blocking: false,
        sensitive: true,
    },
    ActionSpec {
        kind: ActionKind::Hotkey,
        name: "hotkey",
        summary: "Press a hotkey combination, e.g. \"ctrl+s\"",
        required: &[p("keys", ParamType::Str)],
        optional: &[],
        affinity: Affinity::System,
        blocking: false,
        sensitive: true,
    },
    ActionSpec {
        kind: ActionKind::TypeText,
        name: "type_text",
        summary: "Type text with the keyboard",
        required: &[p("text", ParamType::Str)],
        optional: &[],
        affinity: Affinity::System,
        blocking: false,
        sensitive: true,
    },
    ActionSpec {
        kind: ActionKind::Wait,
        name: "wait",
        summary: "Wait for a number of seconds (default 1)",
        required: &[],
        optional: &[p("seconds", ParamType::Number)],
        affinity: Affinity::System,
        blocking: false,
        sensitive: false,
    },
    ActionSpec {
        kind: ActionKind::Screenshot,
        name: "screenshot",
        summary: "Capture the screen to a file",
        required: &[],
        optional: &[p("filename", ParamType::Str)],
        affinity: Affinity::System,
        blocking: false,
        sensitive: false,
    },
];

impl ActionKind {
    /// Schema entry for this kind. The table is indexed by discriminant.
    pub const fn spec(self) -> &'static ActionSpec {
        &ACTION_SPECS[self as usize]
    }

    /// Resolves a wire name ("open_browser") back to a kind.
    pub fn parse(name: &str) -> Option<ActionKind> {
        ACTION_SPECS
            .iter()
            .find(|spec| spec.name == name)
            .map(|spec| spec.kind)
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.spec().name)
    }
}

/// One typed, parameterized operation targeting a browser or system capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "action")]
    pub kind: ActionKind,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Action {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            params: Map::new(),
            description: None,
        }
    }

    pub fn with_param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn str_param(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }

    pub fn f64_param(&self, key: &str) -> Option<f64> {
        self.params.get(key).and_then(Value::as_f64)
    }
}

/// Ordered, non-empty sequence of actions derived from one command.
/// Order is execution order; there is no implicit parallelism.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plan {
    pub actions: Vec<Action>,
}

impl Plan {
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
