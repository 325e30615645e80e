//! # Actions
//!
//! Everything that can happen to a card becomes an `Action`.
//! User opens the Stop dialog? That's `Action::Request(ActionKind::Stop)`.
//! The server answers? That's `Action::Succeeded` or `Action::Failed(message)`.
//!
//! `update()` applies an action to the card state and returns the single
//! `Effect` the caller must carry out. No I/O happens here.
//!
//! ```text
//! CardState + Action  →  update()  →  CardState' + Effect
//! ```

use std::fmt;

use log::{debug, warn};

use crate::core::application::{ActionKind, ApplicationRef};
use crate::core::state::CardState;

/// Cache tag covering all application-list data.
pub const APP_STATE_TAG: &str = "app-state";

/// Shown when a failure arrives without any text of its own.
const FALLBACK_ERROR: &str = "Request failed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Open the confirmation dialog for an action.
    Request(ActionKind),
    /// Close the dialog without sending anything.
    Cancel,
    /// Send the pending action to the server.
    Confirm,
    /// The outstanding call completed.
    Succeeded,
    /// The outstanding call failed after the transport's retry.
    Failed(String),
}

/// The network request an action maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerCall {
    /// `POST /server/{id}`
    Start { id: String },
    /// `DELETE /server/{id}?remove={remove}`
    Remove { id: String, remove: bool },
}

impl ServerCall {
    pub fn for_action(kind: ActionKind, id: &str) -> Self {
        let id = id.to_string();
        match kind {
            ActionKind::Start => ServerCall::Start { id },
            ActionKind::Stop => ServerCall::Remove { id, remove: false },
            ActionKind::Delete => ServerCall::Remove { id, remove: true },
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            ServerCall::Start { .. } => "POST",
            ServerCall::Remove { .. } => "DELETE",
        }
    }

    pub fn path(&self) -> String {
        match self {
            ServerCall::Start { id } | ServerCall::Remove { id, .. } => format!("/server/{id}"),
        }
    }

    pub fn query(&self) -> Option<String> {
        match self {
            ServerCall::Start { .. } => None,
            ServerCall::Remove { remove, .. } => Some(format!("remove={remove}")),
        }
    }
}

impl fmt::Display for ServerCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.query() {
            Some(query) => write!(f, "{} {}?{}", self.method(), self.path(), query),
            None => write!(f, "{} {}", self.method(), self.path()),
        }
    }
}

/// Why an action was refused. State is left untouched on rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The app snapshot does not offer this action (e.g. Start while ready).
    NotOffered(ActionKind),
    /// A call for this card is already outstanding.
    InFlight(ActionKind),
    /// `Confirm` with no dialog open.
    NothingPending,
    /// `Confirm` with no tokio runtime to send the request on.
    NoRuntime,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NotOffered(kind) => write!(f, "{kind} is not available for this app"),
            Rejection::InFlight(kind) => write!(f, "a {kind} request is already in progress"),
            Rejection::NothingPending => write!(f, "no action is awaiting confirmation"),
            Rejection::NoRuntime => write!(f, "no async runtime available to send the request"),
        }
    }
}

impl std::error::Error for Rejection {}

/// What the caller has to do after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Issue exactly this request; report back with `Succeeded`/`Failed`.
    Dispatch(ServerCall),
    /// Mark cached data under this tag stale.
    Invalidate(&'static str),
    /// Publish a message to the user.
    Notify(String),
    Reject(Rejection),
}

pub fn update(state: &mut CardState, app: &ApplicationRef, action: Action) -> Effect {
    debug!("[{}] {:?} in {:?}", app.id, action, state);

    match action {
        Action::Request(kind) => {
            if let CardState::Submitting { kind: busy } = state {
                return Effect::Reject(Rejection::InFlight(*busy));
            }
            if !kind.is_offered(app) {
                return Effect::Reject(Rejection::NotOffered(kind));
            }
            if state.pending_action() != Some(kind) {
                *state = CardState::Confirming { kind, error: None };
            }
            Effect::None
        }

        Action::Cancel => {
            if let CardState::Submitting { kind } = state {
                return Effect::Reject(Rejection::InFlight(*kind));
            }
            *state = CardState::Idle;
            Effect::None
        }

        Action::Confirm => match state {
            CardState::Idle => Effect::Reject(Rejection::NothingPending),
            CardState::Submitting { kind } => Effect::Reject(Rejection::InFlight(*kind)),
            CardState::Confirming { kind, .. } => {
                let kind = *kind;
                *state = CardState::Submitting { kind };
                Effect::Dispatch(ServerCall::for_action(kind, &app.id))
            }
        },

        Action::Succeeded => {
            if !state.is_submitting() {
                warn!("[{}] Completion with no call in flight, ignoring", app.id);
                return Effect::None;
            }
            *state = CardState::Idle;
            Effect::Invalidate(APP_STATE_TAG)
        }

        Action::Failed(message) => {
            let CardState::Submitting { kind } = *state else {
                warn!("[{}] Failure with no call in flight, ignoring: {}", app.id, message);
                return Effect::None;
            };
            let message = if message.trim().is_empty() {
                FALLBACK_ERROR.to_string()
            } else {
                message
            };
            *state = CardState::Confirming {
                kind,
                error: Some(message.clone()),
            };
            Effect::Notify(message)
        }
    }
}
