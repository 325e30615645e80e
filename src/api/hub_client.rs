//! HTTP implementation of [`ServerApi`] against the launcher service.
//!
//! The service lives under the hub's service prefix, e.g.
//! `http://localhost:8000/services/japps`. Every call is retried
//! `retries` times before its error is surfaced.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Response, Url};

use super::server_api::{ApiError, ServerApi};
use super::types::{CreateServerBody, ErrorBody, FrameworkInfo, ServerRecord, UserOptions};

/// Connection settings for [`HubClient`].
#[derive(Debug, Clone)]
pub struct HubClientConfig {
    pub base_url: String,
    pub api_token: Option<String>,
    pub timeout: Duration,
    /// Additional attempts after the first failure.
    pub retries: u32,
    pub retry_delay: Duration,
}

impl HubClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: None,
            timeout: Duration::from_secs(30),
            retries: 1,
            retry_delay: Duration::from_millis(1000),
        }
    }
}

pub struct HubClient {
    base_url: Url,
    api_token: Option<String>,
    retries: u32,
    retry_delay: Duration,
    client: reqwest::Client,
}

impl HubClient {
    pub fn new(config: HubClientConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|e| ApiError::Config(format!("invalid base URL {}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Config(format!(
                "base URL cannot carry paths: {}",
                config.base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;

        info!(
            "Hub client configured: base_url={}, retries={}, timeout={:?}",
            base_url, config.retries, config.timeout
        );

        Ok(Self {
            base_url,
            api_token: config.api_token,
            retries: config.retries,
            retry_delay: config.retry_delay,
            client,
        })
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Config(format!("invalid base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.header("Authorization", format!("token {token}")),
            None => request,
        }
    }

    /// Runs `call` until it succeeds or the retry budget is spent.
    async fn with_retry<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut attempt = 0u32;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                // A bad configuration will not fix itself between attempts
                Err(err @ ApiError::Config(_)) => return Err(err),
                Err(err) if attempt < self.retries => {
                    attempt += 1;
                    warn!("{operation} failed ({err}), retry {attempt}/{}", self.retries);
                    if !self.retry_delay.is_zero() {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
                Err(err) => {
                    warn!("{operation} failed after {} attempt(s): {err}", attempt + 1);
                    return Err(err);
                }
            }
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, ApiError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(transport_error)?;

        debug!("{} -> {}", response.url(), response.status());
        ensure_success(response).await
    }
}

fn transport_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Network(err.to_string())
    }
}

/// Converts a non-2xx response into [`ApiError::Api`], pulling the message
/// out of the body when the server sent one.
async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));

    Err(ApiError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn parse_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let body = response.text().await.map_err(transport_error)?;
    serde_json::from_str(&body).map_err(|e| ApiError::Parse(e.to_string()))
}

#[async_trait]
impl ServerApi for HubClient {
    async fn start_server(&self, id: &str) -> Result<(), ApiError> {
        let url = &self.url(&["server", id])?;
        info!("Starting server {id}");
        self.with_retry("start", move || async move {
            self.send(self.client.post(url.clone())).await.map(|_| ())
        })
        .await
    }

    async fn remove_server(&self, id: &str, remove: bool) -> Result<(), ApiError> {
        let url = &self.url(&["server", id])?;
        info!("Removing server {id} (remove={remove})");
        self.with_retry(if remove { "delete" } else { "stop" }, move || async move {
            self.send(self.client.delete(url.clone()).query(&[("remove", remove)]))
                .await
                .map(|_| ())
        })
        .await
    }

    async fn list_servers(&self) -> Result<Vec<ServerRecord>, ApiError> {
        // Trailing empty segment keeps the slash: `/server/`
        let url = &self.url(&["server", ""])?;
        let servers: BTreeMap<String, ServerRecord> = self
            .with_retry("list", move || async move {
                parse_json(self.send(self.client.get(url.clone())).await?).await
            })
            .await?;

        let apps: Vec<ServerRecord> = servers
            .into_iter()
            .map(|(key, mut record)| {
                if record.name.is_empty() {
                    record.name = key;
                }
                record
            })
            .filter(|record| {
                let keep = record.is_app();
                if !keep {
                    debug!("Skipping non-app server: {}", record.name);
                }
                keep
            })
            .collect();

        debug!("Listed {} app(s)", apps.len());
        Ok(apps)
    }

    async fn get_server(&self, id: &str) -> Result<ServerRecord, ApiError> {
        let url = &self.url(&["server", id])?;
        let mut record: ServerRecord = self
            .with_retry("get", move || async move {
                parse_json(self.send(self.client.get(url.clone())).await?).await
            })
            .await?;
        if record.name.is_empty() {
            record.name = id.to_string();
        }
        Ok(record)
    }

    async fn list_frameworks(&self) -> Result<Vec<FrameworkInfo>, ApiError> {
        let url = &self.url(&["frameworks"])?;
        self.with_retry("frameworks", move || async move {
            parse_json(self.send(self.client.get(url.clone())).await?).await
        })
        .await
    }

    async fn create_server(&self, id: &str, options: &UserOptions) -> Result<(), ApiError> {
        let url = &self.url(&["server", id])?;
        let body = &CreateServerBody {
            user_options: options,
        };
        info!(
            "Creating server {id} (framework={:?})",
            options.framework.as_deref().unwrap_or("")
        );
        self.with_retry("create", move || async move {
            self.send(self.client.post(url.clone()).json(body))
                .await
                .map(|_| ())
        })
        .await
    }
}
