//! # Command-line Front End
//!
//! The headless surface over the core: lists apps, shows a card's menu,
//! and walks one action through request → confirm → settle, asking the
//! user at each gate. Output goes to any `Write` so the flows are testable.

pub mod prompt;

use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

use clap::Subcommand;
use log::{debug, info};

use crate::api::{ApiError, ServerApi, UserOptions};
use crate::core::{
    APP_STATE_TAG, ActionCoordinator, ActionKind, AppListCache, ApplicationRef, Invalidator,
    NotificationSlot, Outcome, Rejection, menu,
};
use prompt::Confirm;

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List managed apps
    List,
    /// List frameworks apps can be launched with
    Frameworks,
    /// Show the actions offered for an app
    Menu { id: String },
    /// Start a stopped app
    Start {
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Stop a running app, keeping its definition
    Stop {
        id: String,
        #[arg(short, long)]
        yes: bool,
    },
    /// Delete an app permanently
    Delete {
        id: String,
        #[arg(short, long)]
        yes: bool,
    },
    /// Create a new app
    Create {
        /// Display name; the lowercased name becomes the app id
        name: String,
        /// Framework to serve the app with (see `frameworks`)
        #[arg(short, long)]
        framework: String,
        /// Script or notebook to serve
        #[arg(long)]
        filepath: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },
}

#[derive(Debug)]
pub enum CliError {
    Api(ApiError),
    Rejected(Rejection),
    Io(io::Error),
    /// The action ran and failed, and the user chose not to retry.
    ActionFailed(String),
    /// Rejected before anything was sent.
    InvalidInput(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Api(e) => write!(f, "{e}"),
            CliError::Rejected(r) => write!(f, "{r}"),
            CliError::Io(e) => write!(f, "I/O error: {e}"),
            CliError::ActionFailed(msg) => write!(f, "{msg}"),
            CliError::InvalidInput(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ApiError> for CliError {
    fn from(e: ApiError) -> Self {
        CliError::Api(e)
    }
}

impl From<Rejection> for CliError {
    fn from(r: Rejection) -> Self {
        CliError::Rejected(r)
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}

/// How an action command ended without error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionReport {
    Completed(ActionKind),
    Cancelled,
}

/// Shared collaborators for every command in one process.
pub struct Launcher {
    api: Arc<dyn ServerApi>,
    cache: Arc<AppListCache>,
    notices: Arc<NotificationSlot>,
}

impl Launcher {
    pub fn new(api: Arc<dyn ServerApi>) -> Self {
        Self {
            api,
            cache: Arc::new(AppListCache::new()),
            notices: Arc::new(NotificationSlot::new()),
        }
    }

    pub fn cache(&self) -> &AppListCache {
        &self.cache
    }

    pub fn notices(&self) -> &NotificationSlot {
        &self.notices
    }

    pub async fn list(&self, out: &mut impl Write) -> Result<(), CliError> {
        let apps = self.cache.apps(self.api.as_ref()).await?;
        if apps.is_empty() {
            writeln!(out, "No apps found.")?;
            return Ok(());
        }

        writeln!(out, "{:<20} {:<28} {:<12} {:<8}", "ID", "TITLE", "FRAMEWORK", "STATUS")?;
        for app in &apps {
            writeln!(out, "{}", app_row(app).trim_end())?;
        }
        if let Some(at) = self.cache.fetched_at() {
            debug!("Listed {} app(s) fetched at {}", apps.len(), at.to_rfc3339());
        }
        Ok(())
    }

    pub async fn frameworks(&self, out: &mut impl Write) -> Result<(), CliError> {
        for framework in self.api.list_frameworks().await? {
            writeln!(out, "{:<16} {}", framework.name, framework.display_name)?;
        }
        Ok(())
    }

    pub async fn menu(&self, id: &str, out: &mut impl Write) -> Result<(), CliError> {
        let app = self.api.get_server(id).await?.to_application();
        writeln!(out, "{} ({})", app.title, status_label(&app))?;
        for item in menu(&app) {
            let marker = if item.disabled { "-" } else { "*" };
            writeln!(out, "  {marker} {}", item.title)?;
        }
        Ok(())
    }

    /// Run one action end to end: open the dialog, ask, send, and on failure
    /// offer a retry until the user gives up or the call succeeds.
    pub async fn run_action(
        &self,
        kind: ActionKind,
        id: &str,
        answers: &mut dyn Confirm,
        out: &mut impl Write,
    ) -> Result<ActionReport, CliError> {
        let app = self.api.get_server(id).await?.to_application();
        let title = app.title.clone();

        let mut card = ActionCoordinator::new(
            app,
            Arc::clone(&self.api),
            self.cache.clone(),
            self.notices.clone(),
        );
        card.request_action(kind)?;
        writeln!(out, "{}", kind.dialog_title(&title))?;

        if !answers.confirm(&kind.confirmation_prompt(&title))? {
            card.cancel()?;
            writeln!(out, "Cancelled.")?;
            return Ok(ActionReport::Cancelled);
        }

        loop {
            card.confirm()?;
            match card.settle().await {
                Some(Outcome::Succeeded(kind)) => {
                    info!("{kind} {id} completed");
                    break;
                }
                Some(Outcome::Failed { message, .. }) => {
                    // Shown here, so the slot is drained
                    self.notices.take();
                    writeln!(out, "Error: {message}")?;
                    if !answers.retry(&message)? {
                        card.cancel()?;
                        return Err(CliError::ActionFailed(message));
                    }
                }
                None => break,
            }
        }

        writeln!(out, "{} {}: done.", capitalize(kind.as_str()), title)?;
        self.print_refreshed(id, out).await?;
        Ok(ActionReport::Completed(kind))
    }

    /// Create an app. The id is the lowercased name; the name as typed is
    /// kept as the display name.
    pub async fn create(
        &self,
        name: &str,
        framework: &str,
        filepath: Option<&str>,
        description: Option<&str>,
        out: &mut impl Write,
    ) -> Result<String, CliError> {
        let id = name.trim().to_lowercase();
        if id.is_empty() {
            return Err(CliError::InvalidInput("app name must not be empty".to_string()));
        }

        let frameworks = self.api.list_frameworks().await?;
        if !frameworks.iter().any(|f| f.name == framework) {
            let known: Vec<&str> = frameworks.iter().map(|f| f.name.as_str()).collect();
            return Err(CliError::InvalidInput(format!(
                "unknown framework {framework:?} (available: {})",
                known.join(", ")
            )));
        }

        let options = UserOptions::for_new_app(name.trim(), framework, filepath, description);
        self.api.create_server(&id, &options).await?;
        info!("Created {id} with framework {framework}");
        self.cache.invalidate(APP_STATE_TAG);

        writeln!(out, "Created {id}.")?;
        self.print_refreshed(&id, out).await?;
        Ok(id)
    }

    /// The cache was invalidated by the change; reading it refetches.
    async fn print_refreshed(&self, id: &str, out: &mut impl Write) -> Result<(), CliError> {
        self.cache.apps(self.api.as_ref()).await?;
        match self.cache.get(id) {
            Some(app) => writeln!(out, "{}", app_row(&app).trim_end())?,
            None => writeln!(out, "{id} is not listed.")?,
        }
        Ok(())
    }
}

fn status_label(app: &ApplicationRef) -> &'static str {
    if app.ready { "running" } else { "stopped" }
}

fn app_row(app: &ApplicationRef) -> String {
    let public = if app.is_public { "public" } else { "" };
    format!(
        "{:<20} {:<28} {:<12} {:<8} {}",
        app.id,
        app.title,
        app.framework,
        status_label(app),
        public
    )
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
