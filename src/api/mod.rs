//! REST accessor for the incident co-pilot API
//!
//! Typed wrappers over the backend endpoints:
//! - `GET /incidents` - List incidents with filters and pagination
//! - `GET /incidents/{id}` - Single incident
//! - `GET /incidents/{id}/actions` - Action history
//! - `PUT /incidents/{id}/status` - Update status
//! - `GET /analytics/dashboard` - Aggregate statistics
//! - `GET /analytics/mttr` - Mean time to resolution

pub mod analytics;
pub mod incidents;

use std::time::{Duration, Instant};

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::config::Config;

pub use incidents::IncidentQuery;

/// REST accessor failure, carrying a human-readable message
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection, timeout, or body decoding failure
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },
}

impl ApiError {
    /// HTTP status, when the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Request(e) => e.status().map(|s| s.as_u16()),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// HTTP client bound to one API base address
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for `base_url` (e.g. `http://localhost:8000/api/v1`)
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(&config.api_url, config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T>(&self, path: &str, query: &[(&'static str, String)]) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let url = self.url(path);
        log::debug!("[API] GET {} {:?}", url, query);

        let start = Instant::now();
        let response = self.http.get(&url).query(query).send().await?;
        log::debug!("[API] GET {} -> {} in {:?}", path, response.status(), start.elapsed());

        decode(response).await
    }

    async fn put_json<B>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
        body: &B,
    ) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        log::debug!("[API] PUT {} {:?}", url, query);

        let response = self.http.put(&url).query(query).json(body).send().await?;
        check_status(response).await.map(|_| ())
    }
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body)
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| "Request failed".to_string());

    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let response = check_status(response).await?;
    Ok(response.json::<T>().await?)
}

/// Extract a readable message from an error body
///
/// FastAPI wraps errors as `{"detail": ...}`; anything else is used as text.
fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => match value.get("detail") {
            Some(serde_json::Value::String(detail)) => Some(detail.clone()),
            Some(detail) => Some(detail.to_string()),
            None => Some(body.to_string()),
        },
        Err(_) => Some(body.to_string()),
    }
}
