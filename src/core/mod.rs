//! # Core Application Logic
//!
//! This module contains the launcher's business logic for one app card.
//! It knows nothing about how the card is shown.
//!
//! ```text
//!                    ┌──────────────────────────┐
//!                    │          CORE            │
//!                    │   (this module)          │
//!                    │                          │
//!                    │  • CardState (state)     │
//!                    │  • Action (events)       │
//!                    │  • update() (reducer)    │
//!                    │  • ActionCoordinator     │
//!                    └────────────┬─────────────┘
//!                                 │ traits
//!            ┌────────────────────┼────────────────────┐
//!            ▼                    ▼                    ▼
//!     ┌────────────┐       ┌──────────────┐     ┌──────────────────┐
//!     │ ServerApi  │       │ Invalidator  │     │    Notifier      │
//!     │ (HubClient)│       │(AppListCache)│     │(NotificationSlot)│
//!     └────────────┘       └──────────────┘     └──────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`application`]: `ApplicationRef`, `ActionKind`, and the card menu
//! - [`state`]: `CardState`, the per-card state machine
//! - [`action`]: `Action`, `Effect`, and the `update()` reducer
//! - [`coordinator`]: `ActionCoordinator`, which runs effects against collaborators
//! - [`cache`]: the shared app-list cache and its invalidation trait
//! - [`notify`]: the single-slot notification channel
//! - [`config`]: layered configuration

pub mod action;
pub mod application;
pub mod cache;
pub mod config;
pub mod coordinator;
pub mod notify;
pub mod state;

pub use action::{APP_STATE_TAG, Action, Effect, Rejection, ServerCall, update};
pub use application::{ActionKind, ApplicationRef, MenuItem, menu};
pub use cache::{AppListCache, Invalidator};
pub use coordinator::{ActionCoordinator, Outcome};
pub use notify::{NotificationSlot, Notifier};
pub use state::CardState;
