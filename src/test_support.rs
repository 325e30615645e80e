//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::api::{ApiError, FrameworkInfo, ServerApi, ServerRecord, UserOptions};
use crate::core::application::ApplicationRef;
use crate::core::cache::Invalidator;

/// The app used throughout the unit tests: id `app-1`.
pub fn test_application(ready: bool) -> ApplicationRef {
    ApplicationRef {
        id: "app-1".to_string(),
        title: "Test App".to_string(),
        description: Some("App Description".to_string()),
        framework: "panel".to_string(),
        thumbnail: None,
        url: "/user/test/app-1/".to_string(),
        ready,
        is_public: false,
    }
}

fn test_record(name: &str) -> ServerRecord {
    ServerRecord {
        name: name.to_string(),
        url: Some(format!("/user/test/{name}/")),
        ready: Some(false),
        user_options: Some(UserOptions {
            jhub_app: true,
            display_name: Some(name.to_uppercase()),
            framework: Some("panel".to_string()),
            ..Default::default()
        }),
    }
}

/// In-memory [`ServerApi`] that records every mutating call as
/// `METHOD /path[?query]`.
#[derive(Default)]
pub struct RecordingApi {
    calls: Mutex<Vec<String>>,
    action_failure: Mutex<Option<ApiError>>,
    read_failure: Mutex<Option<ApiError>>,
    gate: Mutex<Option<Arc<Notify>>>,
    apps: Vec<ServerRecord>,
    created: Mutex<Vec<(String, UserOptions)>>,
    list_calls: AtomicUsize,
}

impl RecordingApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_apps(names: &[&str]) -> Self {
        Self {
            apps: names.iter().map(|n| test_record(n)).collect(),
            ..Default::default()
        }
    }

    /// Every subsequent start/remove call fails with `error`.
    pub fn fail_with(&self, error: ApiError) {
        *self.action_failure.lock().unwrap() = Some(error);
    }

    /// Every subsequent list/get call fails with `error`.
    pub fn fail_reads_with(&self, error: ApiError) {
        *self.read_failure.lock().unwrap() = Some(error);
    }

    pub fn succeed(&self) {
        *self.action_failure.lock().unwrap() = None;
        *self.read_failure.lock().unwrap() = None;
    }

    /// Holds mutating calls in flight until the returned handle is notified.
    pub fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Ids and options passed to `create_server`, in call order.
    pub fn created(&self) -> Vec<(String, UserOptions)> {
        self.created.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    async fn record(&self, call: String) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(call);
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        outcome(&self.action_failure)
    }

    fn read_outcome(&self) -> Result<(), ApiError> {
        outcome(&self.read_failure)
    }
}

fn outcome(failure: &Mutex<Option<ApiError>>) -> Result<(), ApiError> {
    match failure.lock().unwrap().clone() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[async_trait]
impl ServerApi for RecordingApi {
    async fn start_server(&self, id: &str) -> Result<(), ApiError> {
        self.record(format!("POST /server/{id}")).await
    }

    async fn remove_server(&self, id: &str, remove: bool) -> Result<(), ApiError> {
        self.record(format!("DELETE /server/{id}?remove={remove}")).await
    }

    async fn list_servers(&self) -> Result<Vec<ServerRecord>, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.read_outcome()?;
        Ok(self.apps.clone())
    }

    async fn get_server(&self, id: &str) -> Result<ServerRecord, ApiError> {
        self.read_outcome()?;
        self.apps
            .iter()
            .find(|r| r.name == id)
            .cloned()
            .ok_or_else(|| ApiError::Api {
                status: 404,
                message: format!("server {id} not found"),
            })
    }

    async fn list_frameworks(&self) -> Result<Vec<FrameworkInfo>, ApiError> {
        self.read_outcome()?;
        Ok(vec![FrameworkInfo {
            name: "panel".to_string(),
            display_name: "Panel".to_string(),
            logo: None,
        }])
    }

    async fn create_server(&self, id: &str, options: &UserOptions) -> Result<(), ApiError> {
        self.created
            .lock()
            .unwrap()
            .push((id.to_string(), options.clone()));
        self.record(format!("POST /server/{id}")).await
    }
}

/// Records every invalidated tag.
#[derive(Default)]
pub struct RecordingInvalidator {
    tags: Mutex<Vec<String>>,
}

impl RecordingInvalidator {
    pub fn tags(&self) -> Vec<String> {
        self.tags.lock().unwrap().clone()
    }
}

impl Invalidator for RecordingInvalidator {
    fn invalidate(&self, tag: &str) {
        self.tags.lock().unwrap().push(tag.to_string());
    }
}
