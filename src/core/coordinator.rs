//! # Action Coordinator
//!
//! Drives one card: runs the `update()` reducer and carries out the effect
//! it returns. Network calls are spawned onto the tokio runtime so
//! `confirm()` never waits on the server; their results come back over a
//! channel owned by the coordinator and are applied by `settle()` or
//! `poll_completion()`.
//!
//! ```text
//!   request_action / cancel / confirm
//!                │
//!                ▼
//!        update(state, app, action) ──▶ Effect
//!                                         │
//!     ┌──────────────┬────────────────────┼──────────────┐
//!     ▼              ▼                    ▼              ▼
//!  Dispatch      Invalidate            Notify         Reject
//!  (spawn call)  ("app-state")        (publish)      (Err to caller)
//!     │
//!     └──▶ completion channel ──▶ settle()/poll_completion() ──▶ update()
//! ```

use std::sync::Arc;

use log::{error, info, warn};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::api::{ApiError, ServerApi};
use crate::core::action::{Action, Effect, Rejection, ServerCall, update};
use crate::core::application::{ActionKind, ApplicationRef, MenuItem, menu};
use crate::core::cache::Invalidator;
use crate::core::notify::Notifier;
use crate::core::state::CardState;

/// How a submitted action ended, as seen by the caller of `settle()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded(ActionKind),
    Failed { kind: ActionKind, message: String },
}

pub struct ActionCoordinator {
    app: ApplicationRef,
    state: CardState,
    api: Arc<dyn ServerApi>,
    invalidator: Arc<dyn Invalidator>,
    notifier: Arc<dyn Notifier>,
    runtime: Option<Handle>,
    completion_tx: mpsc::UnboundedSender<Result<(), ApiError>>,
    completion_rx: mpsc::UnboundedReceiver<Result<(), ApiError>>,
}

/// Delivers exactly one result per dispatched call. If the call never
/// produces one (the task panicked or was dropped), `Interrupted` is sent
/// on drop so `settle()` still returns.
struct CompletionGuard {
    tx: Option<mpsc::UnboundedSender<Result<(), ApiError>>>,
}

impl CompletionGuard {
    fn send(mut self, result: Result<(), ApiError>) {
        if let Some(tx) = self.tx.take() {
            // Receiver is gone only if the card was dropped mid-call
            let _ = tx.send(result);
        }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            error!("Server call ended without a result");
            let _ = tx.send(Err(ApiError::Interrupted));
        }
    }
}

impl ActionCoordinator {
    pub fn new(
        app: ApplicationRef,
        api: Arc<dyn ServerApi>,
        invalidator: Arc<dyn Invalidator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            app,
            state: CardState::Idle,
            api,
            invalidator,
            notifier,
            runtime: Handle::try_current().ok(),
            completion_tx,
            completion_rx,
        }
    }

    /// Send calls on `handle` instead of the runtime current at construction.
    pub fn with_runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    pub fn app(&self) -> &ApplicationRef {
        &self.app
    }

    pub fn state(&self) -> &CardState {
        &self.state
    }

    pub fn pending_action(&self) -> Option<ActionKind> {
        self.state.pending_action()
    }

    pub fn is_submitting(&self) -> bool {
        self.state.is_submitting()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.state.last_error()
    }

    /// Actions offered by this card. Depends only on the app snapshot.
    pub fn menu(&self) -> Vec<MenuItem> {
        menu(&self.app)
    }

    /// Open the confirmation dialog for `kind`. Nothing is sent yet.
    pub fn request_action(&mut self, kind: ActionKind) -> Result<(), Rejection> {
        self.apply(Action::Request(kind))
    }

    /// Close the dialog and drop any error it was showing.
    pub fn cancel(&mut self) -> Result<(), Rejection> {
        self.apply(Action::Cancel)
    }

    /// Send the pending action. Returns as soon as the request is spawned.
    pub fn confirm(&mut self) -> Result<(), Rejection> {
        if matches!(self.state, CardState::Confirming { .. }) && self.spawner().is_none() {
            warn!("[{}] No runtime to send {:?} on", self.app.id, self.pending_action());
            return Err(Rejection::NoRuntime);
        }
        self.apply(Action::Confirm)
    }

    /// Wait for the outstanding call and apply its result.
    /// Returns `None` immediately if nothing is in flight.
    pub async fn settle(&mut self) -> Option<Outcome> {
        let CardState::Submitting { kind } = self.state else {
            return None;
        };
        let result = self.completion_rx.recv().await?;
        Some(self.complete(kind, result))
    }

    /// Apply the outstanding call's result if it has already arrived.
    pub fn poll_completion(&mut self) -> Option<Outcome> {
        let CardState::Submitting { kind } = self.state else {
            return None;
        };
        let result = self.completion_rx.try_recv().ok()?;
        Some(self.complete(kind, result))
    }

    fn complete(&mut self, kind: ActionKind, result: Result<(), ApiError>) -> Outcome {
        match result {
            Ok(()) => {
                info!("[{}] {} succeeded", self.app.id, kind);
                let _ = self.apply(Action::Succeeded);
                Outcome::Succeeded(kind)
            }
            Err(err) => {
                warn!("[{}] {} failed: {}", self.app.id, kind, err);
                let message = err.user_message();
                let _ = self.apply(Action::Failed(message));
                Outcome::Failed {
                    kind,
                    message: self.state.last_error().unwrap_or_default().to_string(),
                }
            }
        }
    }

    fn apply(&mut self, action: Action) -> Result<(), Rejection> {
        match update(&mut self.state, &self.app, action) {
            Effect::None => Ok(()),
            Effect::Dispatch(call) => {
                self.dispatch(call);
                Ok(())
            }
            Effect::Invalidate(tag) => {
                self.invalidator.invalidate(tag);
                Ok(())
            }
            Effect::Notify(message) => {
                self.notifier.publish(message);
                Ok(())
            }
            Effect::Reject(rejection) => {
                warn!("[{}] Rejected: {}", self.app.id, rejection);
                Err(rejection)
            }
        }
    }

    fn spawner(&self) -> Option<Handle> {
        self.runtime.clone().or_else(|| Handle::try_current().ok())
    }

    fn dispatch(&self, call: ServerCall) {
        info!("[{}] Dispatching {}", self.app.id, call);
        let api = Arc::clone(&self.api);
        let guard = CompletionGuard {
            tx: Some(self.completion_tx.clone()),
        };

        let Some(runtime) = self.spawner() else {
            // Checked in confirm(); the guard reports the call as interrupted
            return;
        };
        runtime.spawn(async move {
            let result = match &call {
                ServerCall::Start { id } => api.start_server(id).await,
                ServerCall::Remove { id, remove } => api.remove_server(id, *remove).await,
            };
            guard.send(result);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::action::APP_STATE_TAG;
    use crate::core::notify::NotificationSlot;
    use crate::test_support::{RecordingApi, RecordingInvalidator, test_application};

    struct Harness {
        api: Arc<RecordingApi>,
        cache: Arc<RecordingInvalidator>,
        notices: Arc<NotificationSlot>,
        card: ActionCoordinator,
    }

    fn harness(ready: bool) -> Harness {
        let api = Arc::new(RecordingApi::new());
        let cache = Arc::new(RecordingInvalidator::default());
        let notices = Arc::new(NotificationSlot::new());
        let card = ActionCoordinator::new(
            test_application(ready),
            api.clone(),
            cache.clone(),
            notices.clone(),
        );
        Harness {
            api,
            cache,
            notices,
            card,
        }
    }

    #[tokio::test]
    async fn test_start_success_scenario() {
        let mut h = harness(false);

        h.card.request_action(ActionKind::Start).unwrap();
        assert_eq!(h.card.pending_action(), Some(ActionKind::Start));
        assert!(h.api.calls().is_empty());

        h.card.confirm().unwrap();
        assert!(h.card.is_submitting());

        let outcome = h.card.settle().await;

        assert_eq!(outcome, Some(Outcome::Succeeded(ActionKind::Start)));
        assert_eq!(h.api.calls(), vec!["POST /server/app-1"]);
        assert_eq!(h.cache.tags(), vec![APP_STATE_TAG]);
        assert!(h.card.state().is_idle());
        assert_eq!(h.notices.current(), None);
    }

    #[tokio::test]
    async fn test_stop_success_sends_remove_false() {
        let mut h = harness(true);

        h.card.request_action(ActionKind::Stop).unwrap();
        h.card.confirm().unwrap();
        h.card.settle().await;

        assert_eq!(h.api.calls(), vec!["DELETE /server/app-1?remove=false"]);
        assert_eq!(h.cache.tags().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_failure_scenario() {
        let mut h = harness(true);
        h.api
            .fail_with(ApiError::Network("server unreachable".to_string()));

        h.card.request_action(ActionKind::Delete).unwrap();
        h.card.confirm().unwrap();
        let outcome = h.card.settle().await;

        assert_eq!(
            outcome,
            Some(Outcome::Failed {
                kind: ActionKind::Delete,
                message: "server unreachable".to_string()
            })
        );
        assert_eq!(h.api.calls(), vec!["DELETE /server/app-1?remove=true"]);
        assert_eq!(h.card.last_error(), Some("server unreachable"));
        assert_eq!(h.card.pending_action(), Some(ActionKind::Delete));
        assert!(!h.card.is_submitting());
        assert!(h.cache.tags().is_empty());
        assert_eq!(h.notices.current().as_deref(), Some("server unreachable"));
    }

    #[tokio::test]
    async fn test_stop_then_cancel_sends_nothing() {
        let mut h = harness(true);

        h.card.request_action(ActionKind::Stop).unwrap();
        h.card.cancel().unwrap();

        assert!(h.card.state().is_idle());
        assert!(h.api.calls().is_empty());
        assert_eq!(h.card.settle().await, None);
    }

    #[tokio::test]
    async fn test_reentrant_confirm_is_rejected() {
        let mut h = harness(false);
        let gate = h.api.hold();

        h.card.request_action(ActionKind::Start).unwrap();
        h.card.confirm().unwrap();

        assert_eq!(
            h.card.confirm(),
            Err(Rejection::InFlight(ActionKind::Start))
        );
        assert_eq!(h.card.cancel(), Err(Rejection::InFlight(ActionKind::Start)));
        assert_eq!(h.card.poll_completion(), None);

        gate.notify_one();
        h.card.settle().await;

        assert_eq!(h.api.calls().len(), 1);
        assert_eq!(h.cache.tags().len(), 1);
        assert!(h.card.state().is_idle());
    }

    #[tokio::test]
    async fn test_retry_after_failure() {
        let mut h = harness(true);
        h.api.fail_with(ApiError::Timeout);

        h.card.request_action(ActionKind::Stop).unwrap();
        h.card.confirm().unwrap();
        h.card.settle().await;
        assert_eq!(h.card.last_error(), Some("request timed out"));

        h.api.succeed();
        h.card.confirm().unwrap();
        assert_eq!(h.card.last_error(), None);
        let outcome = h.card.settle().await;

        assert_eq!(outcome, Some(Outcome::Succeeded(ActionKind::Stop)));
        assert_eq!(h.api.calls().len(), 2);
        assert_eq!(h.cache.tags(), vec![APP_STATE_TAG]);
    }

    #[tokio::test]
    async fn test_failure_then_cancel_is_idle() {
        let mut h = harness(true);
        h.api.fail_with(ApiError::Api {
            status: 500,
            message: "Request failed with status code 500".to_string(),
        });

        h.card.request_action(ActionKind::Delete).unwrap();
        h.card.confirm().unwrap();
        h.card.settle().await;
        h.card.cancel().unwrap();

        assert!(h.card.state().is_idle());
        assert_eq!(h.card.last_error(), None);
        assert_eq!(h.api.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_disabled_action_is_rejected_without_call() {
        let mut h = harness(true);

        assert_eq!(
            h.card.request_action(ActionKind::Start),
            Err(Rejection::NotOffered(ActionKind::Start))
        );
        assert_eq!(h.card.confirm(), Err(Rejection::NothingPending));
        assert!(h.api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_menu_follows_snapshot() {
        let h = harness(true);
        let start = h.card.menu().into_iter().find(|i| i.id == "start").unwrap();
        assert!(start.disabled);
    }

    /// Panics inside every mutating call.
    struct PanickingApi;

    #[async_trait::async_trait]
    impl ServerApi for PanickingApi {
        async fn start_server(&self, _id: &str) -> Result<(), ApiError> {
            panic!("connection pool poisoned");
        }

        async fn remove_server(&self, _id: &str, _remove: bool) -> Result<(), ApiError> {
            panic!("connection pool poisoned");
        }

        async fn list_servers(&self) -> Result<Vec<crate::api::ServerRecord>, ApiError> {
            Ok(Vec::new())
        }

        async fn get_server(&self, id: &str) -> Result<crate::api::ServerRecord, ApiError> {
            Err(ApiError::Api {
                status: 404,
                message: format!("server {id} not found"),
            })
        }

        async fn list_frameworks(&self) -> Result<Vec<crate::api::FrameworkInfo>, ApiError> {
            Ok(Vec::new())
        }

        async fn create_server(
            &self,
            _id: &str,
            _options: &crate::api::UserOptions,
        ) -> Result<(), ApiError> {
            panic!("connection pool poisoned");
        }
    }

    #[tokio::test]
    async fn test_panicking_call_still_settles_as_failure() {
        let cache = Arc::new(RecordingInvalidator::default());
        let notices = Arc::new(NotificationSlot::new());
        let mut card = ActionCoordinator::new(
            test_application(false),
            Arc::new(PanickingApi),
            cache.clone(),
            notices.clone(),
        );

        card.request_action(ActionKind::Start).unwrap();
        card.confirm().unwrap();
        let outcome = card.settle().await;

        assert_eq!(
            outcome,
            Some(Outcome::Failed {
                kind: ActionKind::Start,
                message: "request was interrupted".to_string()
            })
        );
        assert!(!card.is_submitting());
        assert_eq!(card.pending_action(), Some(ActionKind::Start));
        assert!(cache.tags().is_empty());
        assert_eq!(notices.current().as_deref(), Some("request was interrupted"));
    }

    #[test]
    fn test_confirm_outside_runtime_uses_given_handle() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let h = harness(false);
        let mut card = h.card.with_runtime(runtime.handle().clone());

        card.request_action(ActionKind::Start).unwrap();
        card.confirm().unwrap();
        let outcome = runtime.block_on(card.settle());

        assert_eq!(outcome, Some(Outcome::Succeeded(ActionKind::Start)));
        assert_eq!(h.api.calls(), vec!["POST /server/app-1"]);
        assert_eq!(h.cache.tags(), vec![APP_STATE_TAG]);
    }

    #[test]
    fn test_confirm_without_runtime_is_rejected() {
        let mut h = harness(false);

        h.card.request_action(ActionKind::Start).unwrap();
        assert_eq!(h.card.confirm(), Err(Rejection::NoRuntime));

        assert_eq!(h.card.pending_action(), Some(ActionKind::Start));
        assert!(!h.card.is_submitting());
        assert!(h.api.calls().is_empty());
    }
}
