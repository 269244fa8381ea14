use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use crate::schema::Action;

/// One pending approval, delivered to whoever owns the approval surface.
/// Dropping `respond` without answering counts as denial.
#[derive(Debug)]
pub struct ApprovalRequest {
    pub action: Action,
    pub respond: oneshot::Sender<bool>,
}

/// Human-in-the-loop interrupt point for sensitive actions.
///
/// The engine sends an [`ApprovalRequest`] and waits for the verdict with a
/// timeout, so a missing approver never wedges a run: timeout is implicit
/// denial and the action is recorded as skipped.
#[derive(Clone)]
pub struct ConfirmationGate {
    tx: mpsc::Sender<ApprovalRequest>,
    timeout: Duration,
}

impl ConfirmationGate {
    /// Creates a gate and the receiving end for the approval surface.
    pub fn channel(timeout: Duration, buffer: usize) -> (Self, mpsc::Receiver<ApprovalRequest>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx, timeout }, rx)
    }

    /// Asks for approval of `action`. Returns false on denial, timeout, or a
    /// closed approval channel.
    pub async fn request(&self, action: &Action) -> bool {
        let (respond, verdict) = oneshot::channel();
        let request = ApprovalRequest {
            action: action.clone(),
            respond,
        };
        if self.tx.send(request).await.is_err() {
            tracing::warn!(kind = %action.kind, "approval channel closed, denying action");
            return false;
        }
        match tokio::time::timeout(self.timeout, verdict).await {
            Ok(Ok(approved)) => approved,
            Ok(Err(_)) => {
                tracing::info!(kind = %action.kind, "approver dropped the request, denying");
                false
            }
            Err(_) => {
                tracing::info!(kind = %action.kind, "approval timed out, denying");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ActionKind;

    #[tokio::test]
    async fn approval_flows_through() {
        let (gate, mut rx) = ConfirmationGate::channel(Duration::from_secs(1), 8);
        tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                let _ = request.respond.send(true);
            }
        });
        assert!(gate.request(&Action::new(ActionKind::Click)).await);
    }

    #[tokio::test]
    async fn timeout_is_denial() {
        let (gate, _rx) = ConfirmationGate::channel(Duration::from_millis(10), 8);
        // Nobody answers; the wait must end on its own.
        assert!(!gate.request(&Action::new(ActionKind::Hotkey)).await);
    }

    #[tokio::test]
    async fn closed_channel_is_denial() {
        let (gate, rx) = ConfirmationGate::channel(Duration::from_secs(1), 8);
        drop(rx);
        assert!(!gate.request(&Action::new(ActionKind::TypeText)).await);
    }
}
