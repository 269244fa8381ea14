//! Sequential plan execution against the driver capabilities.
//!
//! The engine owns no task state: it takes a validated plan, dispatches each
//! action to the matching driver, and reports outcomes through its return
//! value and the per-action observer.

pub mod confirm;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::config::AutomationConfig;
use crate::drivers::{BrowserDriver, SystemDriver};
use crate::errors::{DeskPilotError, DeskPilotResult, PlanViolation};
use crate::schema::{Action, ActionKind, Plan};

pub use confirm::{ApprovalRequest, ConfirmationGate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Succeeded,
    Failed,
    Skipped,
}

/// Outcome of executing one action. Immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub kind: ActionKind,
    pub status: ActionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Return payload, e.g. a screenshot artifact path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ActionResult {
    fn succeeded(kind: ActionKind, payload: Option<String>) -> Self {
        Self {
            kind,
            status: ActionStatus::Succeeded,
            error: None,
            payload,
            timestamp: Utc::now(),
        }
    }

    fn failed(kind: ActionKind, error: String) -> Self {
        Self {
            kind,
            status: ActionStatus::Failed,
            error: Some(error),
            payload: None,
            timestamp: Utc::now(),
        }
    }

    fn skipped(kind: ActionKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            status: ActionStatus::Skipped,
            error: Some(reason.into()),
            payload: None,
            timestamp: Utc::now(),
        }
    }
}

pub struct AutomationEngine {
    browser: Arc<dyn BrowserDriver>,
    system: Arc<dyn SystemDriver>,
    action_timeout: Duration,
    headless: bool,
    gate: Option<ConfirmationGate>,
}

impl AutomationEngine {
    pub fn new(
        browser: Arc<dyn BrowserDriver>,
        system: Arc<dyn SystemDriver>,
        config: &AutomationConfig,
    ) -> Self {
        Self {
            browser,
            system,
            action_timeout: Duration::from_secs(config.action_timeout_secs),
            headless: config.headless_browser,
            gate: None,
        }
    }

    /// Routes sensitive actions through `gate` before executing them.
    pub fn with_confirmation(mut self, gate: ConfirmationGate) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Executes `plan` in order, returning exactly one result per action.
    pub async fn execute(&self, plan: &Plan, cancel: watch::Receiver<bool>) -> Vec<ActionResult> {
        self.execute_with(plan, cancel, |_, _| {}).await
    }

    /// Like [`execute`](Self::execute), invoking `observe` as each result is
    /// recorded so callers can track progress without the engine holding any
    /// reference to their state.
    ///
    /// Fail-soft: a failed non-blocking action does not stop the run. A
    /// failed blocking action marks every remaining action skipped. The
    /// cancel flag is honored between actions, never inside one.
    pub async fn execute_with<F>(
        &self,
        plan: &Plan,
        cancel: watch::Receiver<bool>,
        mut observe: F,
    ) -> Vec<ActionResult>
    where
        F: FnMut(usize, &ActionResult),
    {
        let mut results = Vec::with_capacity(plan.len());
        let mut skip_reason: Option<String> = None;

        for (index, action) in plan.actions.iter().enumerate() {
            if skip_reason.is_none() && *cancel.borrow() {
                tracing::info!(step = index + 1, "cancellation requested, skipping the rest");
                skip_reason = Some("task cancelled".to_string());
            }

            let result = if let Some(reason) = &skip_reason {
                ActionResult::skipped(action.kind, reason.clone())
            } else {
                self.run_action(index, action).await
            };

            if result.status == ActionStatus::Failed && action.kind.spec().blocking {
                tracing::warn!(
                    step = index + 1,
                    kind = %action.kind,
                    "blocking action failed, remaining actions will be skipped"
                );
                skip_reason = Some(format!("blocked by failed '{}'", action.kind));
            }

            observe(index, &result);
            results.push(result);
        }

        results
    }

    async fn run_action(&self, index: usize, action: &Action) -> ActionResult {
        if let Some(gate) = &self.gate {
            if action.kind.spec().sensitive && !gate.request(action).await {
                tracing::info!(step = index + 1, kind = %action.kind, "confirmation denied");
                return ActionResult::skipped(action.kind, "confirmation denied");
            }
        }

        tracing::info!(step = index + 1, kind = %action.kind, "executing action");
        match tokio::time::timeout(self.action_timeout, self.dispatch(index, action)).await {
            Ok(Ok(payload)) => ActionResult::succeeded(action.kind, payload),
            Ok(Err(e)) => {
                tracing::warn!(step = index + 1, kind = %action.kind, error = %e, "action failed");
                ActionResult::failed(action.kind, e.to_string())
            }
            Err(_) => {
                tracing::warn!(step = index + 1, kind = %action.kind, "action timed out");
                ActionResult::failed(
                    action.kind,
                    format!("timed out after {}s", self.action_timeout.as_secs()),
                )
            }
        }
    }

    /// Kind-to-capability mapping. The only backend knowledge the engine has.
    async fn dispatch(&self, index: usize, action: &Action) -> DeskPilotResult<Option<String>> {
        match action.kind {
            ActionKind::OpenBrowser => self.browser.open(self.headless).await.map(|_| None),
            ActionKind::Navigate => {
                let url = required_str(action, index, "url")?;
                self.browser.navigate(url).await.map(|_| None)
            }
            ActionKind::SearchWeb => {
                let query = required_str(action, index, "query")?;
                let site = action.str_param("site").unwrap_or("google");
                self.browser.search(site, query).await.map(|_| None)
            }
            ActionKind::Click => {
                let selector = required_str(action, index, "selector")?;
                self.browser.click(selector).await.map(|_| None)
            }
            ActionKind::FillField => {
                let selector = required_str(action, index, "selector")?;
                let text = required_str(action, index, "text")?;
                self.browser.fill(selector, text).await.map(|_| None)
            }
            ActionKind::CloseBrowser => self.browser.close().await.map(|_| None),
            ActionKind::OpenApp => {
                let name = required_str(action, index, "name")?;
                self.system.launch_application(name).await.map(|_| None)
            }
            ActionKind::PressKey => {
                let key = required_str(action, index, "key")?;
                self.system.press_key(key).await.map(|_| None)
            }
            ActionKind::Hotkey => {
                let keys = required_str(action, index, "keys")?;
                self.system.hotkey(keys).await.map(|_| None)
            }
            ActionKind::TypeText => {
                let text = required_str(action, index, "text")?;
                self.system.type_text(text).await.map(|_| None)
            }
            ActionKind::Wait => {
                // Schema validation only guarantees a JSON number; negative,
                // NaN, and overflowing values must fail the action, not panic.
                let seconds = action.f64_param("seconds").unwrap_or(1.0);
                let duration = Duration::try_from_secs_f64(seconds).map_err(|_| {
                    DeskPilotError::Driver(format!("wait of {seconds}s is out of range"))
                })?;
                self.system.wait(duration).await.map(|_| None)
            }
            ActionKind::Screenshot => {
                let filename = action.str_param("filename");
                self.system.screenshot(filename).await.map(Some)
            }
        }
    }
}

/// Plans reach the engine validated, so a miss here means the plan bypassed
/// the interpreter; surface it as the validation failure it is.
fn required_str<'a>(
    action: &'a Action,
    index: usize,
    key: &'static str,
) -> DeskPilotResult<&'a str> {
    action.str_param(key).ok_or_else(|| {
        DeskPilotError::InvalidPlan(vec![PlanViolation::MissingParameter {
            index,
            kind: action.kind.spec().name,
            key,
        }])
    })
}
