//! # Applications and their actions
//!
//! An [`ApplicationRef`] is an immutable snapshot of one managed app, taken
//! from the server listing. Which actions a card offers is a pure function
//! of that snapshot, see [`menu`].

use std::fmt;

/// Identity and display data for one managed app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationRef {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub framework: String,
    pub thumbnail: Option<String>,
    pub url: String,
    /// Running and reachable.
    pub ready: bool,
    pub is_public: bool,
}

/// A user-initiated operation against one app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Start,
    Stop,
    Delete,
}

impl ActionKind {
    pub const ALL: [ActionKind; 3] = [ActionKind::Start, ActionKind::Stop, ActionKind::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Start => "start",
            ActionKind::Stop => "stop",
            ActionKind::Delete => "delete",
        }
    }

    /// Dialog title, e.g. `Stop My Dashboard`.
    pub fn dialog_title(&self, app_title: &str) -> String {
        match self {
            ActionKind::Start => format!("Start {app_title}"),
            ActionKind::Stop => format!("Stop {app_title}"),
            ActionKind::Delete => format!("Delete {app_title}"),
        }
    }

    /// Confirmation question shown before anything is sent.
    pub fn confirmation_prompt(&self, app_title: &str) -> String {
        match self {
            ActionKind::Start => format!("Are you sure you want to start {app_title}?"),
            ActionKind::Stop => format!("Are you sure you want to stop {app_title}?"),
            ActionKind::Delete => format!(
                "Are you sure you want to delete {app_title}? \
                 This action is permanent and cannot be reversed."
            ),
        }
    }

    /// Whether the app snapshot allows this action right now.
    pub fn is_offered(&self, app: &ApplicationRef) -> bool {
        match self {
            ActionKind::Start => !app.ready,
            ActionKind::Stop => app.ready,
            ActionKind::Delete => true,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a card's context menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub id: &'static str,
    pub title: &'static str,
    pub disabled: bool,
}

/// The card menu for an app: Start, Stop, Edit, Delete, in that order.
///
/// Start is disabled while the app is ready, Stop while it is not.
/// Edit and Delete are always enabled.
pub fn menu(app: &ApplicationRef) -> Vec<MenuItem> {
    vec![
        MenuItem {
            id: "start",
            title: "Start",
            disabled: !ActionKind::Start.is_offered(app),
        },
        MenuItem {
            id: "stop",
            title: "Stop",
            disabled: !ActionKind::Stop.is_offered(app),
        },
        MenuItem {
            id: "edit",
            title: "Edit",
            disabled: false,
        },
        MenuItem {
            id: "delete",
            title: "Delete",
            disabled: !ActionKind::Delete.is_offered(app),
        },
    ]
}
