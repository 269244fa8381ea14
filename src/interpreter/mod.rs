//! Turns one natural-language command into a validated [`Plan`].
//!
//! The AI backend's reply is an untrusted boundary: everything it produces
//! is parsed and checked against the action schema before any of it reaches
//! the engine.

pub mod parser;
pub mod prompt;

use std::sync::Arc;
use std::time::Duration;

use crate::errors::{DeskPilotError, DeskPilotResult, PlanViolation};
use crate::llm::backend::LlmBackend;
use crate::schema::{Action, ActionKind, Plan};

use parser::RawAction;

pub struct CommandInterpreter {
    backend: Arc<dyn LlmBackend>,
    timeout: Duration,
}

impl CommandInterpreter {
    pub fn new(backend: Arc<dyn LlmBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    /// Interprets `command` into a plan, optionally giving the model the
    /// previous plan as context (e.g. for a retry or follow-up command).
    pub async fn interpret(&self, command: &str, context: Option<&Plan>) -> DeskPilotResult<Plan> {
        let context_json = context.map(serde_json::to_string).transpose()?;
        let prompt = prompt::build_prompt(command, context_json.as_deref());

        tracing::debug!(
            backend = %self.backend.name(),
            command = %command,
            "interpreting command"
        );

        let payload = tokio::time::timeout(self.timeout, self.backend.complete(&prompt))
            .await
            .map_err(|_| {
                DeskPilotError::Timeout(format!(
                    "AI backend call exceeded {}s",
                    self.timeout.as_secs()
                ))
            })??;

        let raw = parser::extract_actions(&payload)?;
        let plan = validate_plan(raw)?;
        if plan.is_empty() {
            return Err(DeskPilotError::NoActionableIntent);
        }

        tracing::info!(
            backend = %self.backend.name(),
            actions = plan.len(),
            "command interpreted"
        );
        Ok(plan)
    }
}

/// Validates parsed entries against the action schema.
///
/// Validation is exhaustive: every violation across the whole plan is
/// collected before failing, so the caller gets one actionable error
/// instead of the first of several.
pub fn validate_plan(raw: Vec<RawAction>) -> DeskPilotResult<Plan> {
    let mut violations = Vec::new();
    let mut actions = Vec::with_capacity(raw.len());

    for (index, entry) in raw.into_iter().enumerate() {
        let Some(kind) = ActionKind::parse(&entry.action) else {
            violations.push(PlanViolation::UnknownKind {
                index,
                kind: entry.action,
            });
            continue;
        };
        let spec = kind.spec();

        for param in spec.required {
            if !entry.params.contains_key(param.key) {
                violations.push(PlanViolation::MissingParameter {
                    index,
                    kind: spec.name,
                    key: param.key,
                });
            }
        }
        for (key, value) in &entry.params {
            match spec.param(key) {
                Some(param) if !param.ty.matches(value) => {
                    violations.push(PlanViolation::InvalidValue {
                        index,
                        kind: spec.name,
                        key: key.clone(),
                    });
                }
                Some(_) => {}
                None => violations.push(PlanViolation::UnknownParameter {
                    index,
                    kind: spec.name,
                    key: key.clone(),
                }),
            }
        }

        actions.push(Action {
            kind,
            params: entry.params,
            description: entry.description,
        });
    }

    if !violations.is_empty() {
        return Err(DeskPilotError::InvalidPlan(violations));
    }
    Ok(Plan { actions })
}
