//! # Application List Cache
//!
//! Process-wide store of the app list, shared through an `Arc`.
//! Writers never touch the contents: they mark the list stale with
//! [`Invalidator::invalidate`] and the next reader refetches.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::api::{ApiError, ServerApi};
use crate::core::action::APP_STATE_TAG;
use crate::core::application::ApplicationRef;

/// Marks cached data stale by tag.
pub trait Invalidator: Send + Sync {
    fn invalidate(&self, tag: &str);
}

#[derive(Debug, Default)]
struct Inner {
    apps: Option<Vec<ApplicationRef>>,
    fetched_at: Option<DateTime<Utc>>,
    stale: bool,
    /// Bumped on every invalidation.
    generation: u64,
}

#[derive(Debug, Default)]
pub struct AppListCache {
    inner: Mutex<Inner>,
}

impl AppListCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Cached list without fetching. May be stale.
    pub fn snapshot(&self) -> Option<Vec<ApplicationRef>> {
        self.lock().apps.clone()
    }

    /// Cached entry for one app without fetching.
    pub fn get(&self, id: &str) -> Option<ApplicationRef> {
        self.lock()
            .apps
            .as_ref()
            .and_then(|apps| apps.iter().find(|a| a.id == id).cloned())
    }

    /// True if the next read will hit the server.
    pub fn is_stale(&self) -> bool {
        let inner = self.lock();
        inner.stale || inner.apps.is_none()
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.lock().fetched_at
    }

    /// The app list, refetched first if empty or stale.
    pub async fn apps(&self, api: &dyn ServerApi) -> Result<Vec<ApplicationRef>, ApiError> {
        if !self.is_stale() {
            if let Some(apps) = self.snapshot() {
                debug!("App list served from cache");
                return Ok(apps);
            }
        }
        self.refresh(api).await
    }

    /// Unconditionally refetch the app list.
    pub async fn refresh(&self, api: &dyn ServerApi) -> Result<Vec<ApplicationRef>, ApiError> {
        let started_at = self.lock().generation;

        let records = api.list_servers().await?;
        let apps: Vec<ApplicationRef> = records.iter().map(|r| r.to_application()).collect();

        let mut inner = self.lock();
        inner.apps = Some(apps.clone());
        inner.fetched_at = Some(Utc::now());
        // An invalidation that landed mid-fetch may not be reflected in `records`
        inner.stale = inner.generation != started_at;
        info!("App list refreshed: {} app(s)", apps.len());
        Ok(apps)
    }
}

impl Invalidator for AppListCache {
    fn invalidate(&self, tag: &str) {
        if tag != APP_STATE_TAG {
            debug!("Ignoring invalidation for unknown tag {tag:?}");
            return;
        }
        let mut inner = self.lock();
        inner.stale = true;
        inner.generation += 1;
        debug!("Invalidated {tag:?} (generation {})", inner.generation);
    }
}
