//! Incident endpoints

use serde::Serialize;

use super::{ApiClient, ApiError};
use crate::types::{Incident, IncidentAction, IncidentStatus, Severity};

/// Filters and pagination for `GET /incidents`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidentQuery {
    pub status: Option<IncidentStatus>,
    pub severity: Option<Severity>,
    pub service: Option<String>,
    /// Maximum number of incidents (backend default 50, max 100)
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl IncidentQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: IncidentStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Query string pairs, unset filters omitted
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(severity) = self.severity {
            pairs.push(("severity", severity.as_str().to_string()));
        }
        if let Some(service) = &self.service {
            pairs.push(("service", service.clone()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset", offset.to_string()));
        }
        pairs
    }
}

#[derive(Serialize)]
struct StatusUpdate<'a> {
    status: &'a str,
}

impl ApiClient {
    /// GET /incidents
    pub async fn list_incidents(&self, query: &IncidentQuery) -> Result<Vec<Incident>, ApiError> {
        self.get_json("/incidents", &query.to_pairs()).await
    }

    /// GET /incidents/{id}
    pub async fn get_incident(&self, id: i64) -> Result<Incident, ApiError> {
        self.get_json(&format!("/incidents/{}", id), &[]).await
    }

    /// GET /incidents/{id}/actions
    pub async fn get_incident_actions(&self, id: i64) -> Result<Vec<IncidentAction>, ApiError> {
        self.get_json(&format!("/incidents/{}/actions", id), &[]).await
    }

    /// PUT /incidents/{id}/status
    ///
    /// The status goes out both as `?status=` and as a JSON body; backend
    /// versions differ in which one they read.
    pub async fn update_status(&self, id: i64, status: IncidentStatus) -> Result<(), ApiError> {
        let body = StatusUpdate {
            status: status.as_str(),
        };
        let query = [("status", status.as_str().to_string())];
        self.put_json(&format!("/incidents/{}/status", id), &query, &body)
            .await
    }
}
