//! Data types for the incident co-pilot API
//!
//! Shapes of the JSON bodies returned by the REST endpoints.

mod analytics;
mod incident;

pub use analytics::{DailyCount, DashboardStats, Mttr, ServiceCount};
pub use incident::{ActionOutcome, Incident, IncidentAction, IncidentStatus, ParseEnumError, Severity};
