//! # Card State
//!
//! The per-card action state. One tagged enum instead of independent flags,
//! so "two dialogs open" or "submitting with no dialog" cannot be expressed.
//!
//! ```text
//!            request_action            confirm
//!   Idle ────────────────▶ Confirming ─────────▶ Submitting
//!    ▲ ◀──────────────────┘   ▲  (error: None)        │
//!    │        cancel          │                       │
//!    │                        └───── failure ─────────┤
//!    │                      (error: Some(message))    │
//!    └──────────────────────── success ───────────────┘
//! ```
//!
//! State changes only happen through `update()` in action.rs.

use crate::core::application::ActionKind;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CardState {
    /// No dialog open, nothing in flight.
    #[default]
    Idle,
    /// A confirmation dialog is open. `error` holds the last failure when
    /// the dialog was reopened by a failed submission.
    Confirming {
        kind: ActionKind,
        error: Option<String>,
    },
    /// The request for `kind` is outstanding.
    Submitting { kind: ActionKind },
}

impl CardState {
    /// Which confirmation dialog is open, if any. A submitting card keeps
    /// its dialog open until the call resolves.
    pub fn pending_action(&self) -> Option<ActionKind> {
        match self {
            CardState::Idle => None,
            CardState::Confirming { kind, .. } | CardState::Submitting { kind } => Some(*kind),
        }
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self, CardState::Submitting { .. })
    }

    pub fn last_error(&self) -> Option<&str> {
        match self {
            CardState::Confirming { error, .. } => error.as_deref(),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, CardState::Idle)
    }
}
