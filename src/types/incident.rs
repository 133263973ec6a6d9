//! Incident types returned by the REST API

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::utils::time::{minutes_between, parse_timestamp};

/// Incident severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

/// Incident lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    Detected,
    Analyzing,
    Resolving,
    Resolved,
    Failed,
}

impl IncidentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentStatus::Detected => "detected",
            IncidentStatus::Analyzing => "analyzing",
            IncidentStatus::Resolving => "resolving",
            IncidentStatus::Resolved => "resolved",
            IncidentStatus::Failed => "failed",
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, IncidentStatus::Resolved)
    }
}

/// Unknown severity or status name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for Severity {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|sev| sev.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseEnumError {
                kind: "severity",
                value: s.to_string(),
            })
    }
}

impl FromStr for IncidentStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "detected" => Ok(IncidentStatus::Detected),
            "analyzing" => Ok(IncidentStatus::Analyzing),
            "resolving" => Ok(IncidentStatus::Resolving),
            "resolved" => Ok(IncidentStatus::Resolved),
            "failed" => Ok(IncidentStatus::Failed),
            _ => Err(ParseEnumError {
                kind: "status",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// An incident as listed by `GET /incidents`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: i64,
    pub title: String,
    /// Empty when the backend sends `null`
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    pub severity: Severity,
    pub status: IncidentStatus,
    pub service_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub error_type: String,
    #[serde(default)]
    pub root_cause: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub resolution_steps: Vec<String>,
    pub detected_at: String,
    #[serde(default)]
    pub resolved_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl Incident {
    /// Still being worked on
    pub fn is_active(&self) -> bool {
        !self.status.is_resolved()
    }

    /// Minutes from detection to resolution, when both timestamps parse
    pub fn resolution_minutes(&self) -> Option<f64> {
        let detected = parse_timestamp(&self.detected_at)?;
        let resolved = parse_timestamp(self.resolved_at.as_deref()?)?;
        Some(minutes_between(detected, resolved))
    }
}

/// One automated or manual step recorded against an incident
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentAction {
    pub id: i64,
    /// Not every backend version echoes the owning incident
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident_id: Option<i64>,
    pub action_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub result: Map<String, Value>,
    /// Raw backend code: 1 success, 0 pending, -1 failed
    #[serde(default)]
    pub success: i64,
    pub created_at: String,
}

/// Outcome of an [`IncidentAction`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionOutcome {
    Pending,
    Succeeded,
    Failed,
}

impl ActionOutcome {
    /// Decode the backend's integer code
    pub fn from_code(code: i64) -> Self {
        match code {
            c if c > 0 => ActionOutcome::Succeeded,
            0 => ActionOutcome::Pending,
            _ => ActionOutcome::Failed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionOutcome::Pending => "pending",
            ActionOutcome::Succeeded => "ok",
            ActionOutcome::Failed => "failed",
        }
    }
}

impl fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl IncidentAction {
    pub fn outcome(&self) -> ActionOutcome {
        ActionOutcome::from_code(self.success)
    }

    pub fn succeeded(&self) -> bool {
        self.outcome() == ActionOutcome::Succeeded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incident_deserialization() {
        let json = r#"{
            "id": 42,
            "title": "High error rate",
            "description": "5xx spike",
            "severity": "critical",
            "status": "analyzing",
            "service_name": "payments",
            "error_type": "HTTP_500",
            "root_cause": null,
            "resolution_steps": [],
            "detected_at": "2024-03-01T10:00:00",
            "resolved_at": null
        }"#;

        let incident: Incident = serde_json::from_str(json).unwrap();
        assert_eq!(incident.id, 42);
        assert_eq!(incident.severity, Severity::Critical);
        assert!(incident.is_active());
        assert_eq!(incident.resolution_minutes(), None);
    }

    #[test]
    fn test_resolution_minutes() {
        let json = r#"{
            "id": 1, "title": "t", "severity": "low", "status": "resolved",
            "service_name": "api", "detected_at": "2024-03-01T10:00:00",
            "resolved_at": "2024-03-01T10:45:30"
        }"#;

        let incident: Incident = serde_json::from_str(json).unwrap();
        assert!(!incident.is_active());
        assert_eq!(incident.resolution_minutes(), Some(45.5));
    }

    #[test]
    fn test_action_without_incident_id() {
        let json = r#"{
            "id": 3, "action_type": "restart_service", "description": "Restarted pods",
            "result": {"pods": 3}, "success": 1, "created_at": "2024-03-01T10:05:00"
        }"#;

        let action: IncidentAction = serde_json::from_str(json).unwrap();
        assert_eq!(action.incident_id, None);
        assert!(action.succeeded());
    }

    #[test]
    fn test_null_fields_fall_back_to_defaults() {
        let json = r#"{
            "id": 7,
            "title": "Latency spike",
            "description": null,
            "severity": "medium",
            "status": "detected",
            "service_name": "search",
            "error_type": null,
            "root_cause": null,
            "resolution_steps": null,
            "detected_at": "2024-03-01T10:00:00",
            "resolved_at": null
        }"#;

        let incident: Incident = serde_json::from_str(json).unwrap();
        assert_eq!(incident.description, "");
        assert_eq!(incident.error_type, "");
        assert!(incident.resolution_steps.is_empty());
        assert_eq!(incident.root_cause, None);
    }

    #[test]
    fn test_action_outcomes() {
        let action = |success: i64| IncidentAction {
            id: 1,
            incident_id: None,
            action_type: "rollback".to_string(),
            description: String::new(),
            result: Map::new(),
            success,
            created_at: "2024-03-01T10:05:00".to_string(),
        };

        assert_eq!(action(1).outcome(), ActionOutcome::Succeeded);
        assert_eq!(action(0).outcome(), ActionOutcome::Pending);
        assert_eq!(action(-1).outcome(), ActionOutcome::Failed);
        assert!(action(1).succeeded());
        assert!(!action(0).succeeded());
        assert!(!action(-1).succeeded());

        let json = r#"{"id": 4, "action_type": "scale", "description": null,
            "result": null, "success": -1, "created_at": "2024-03-01T10:06:00"}"#;
        let parsed: IncidentAction = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.outcome(), ActionOutcome::Failed);
        assert!(parsed.result.is_empty());
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("HIGH".parse::<Severity>().unwrap(), Severity::High);
        assert_eq!("resolved".parse::<IncidentStatus>().unwrap(), IncidentStatus::Resolved);

        let err = "urgent".parse::<Severity>().unwrap_err();
        assert_eq!(err.to_string(), "unknown severity 'urgent'");
    }
}
