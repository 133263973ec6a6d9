//! Aggregate analytics returned by `/analytics/*`

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Incident count for one service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCount {
    pub service: String,
    pub count: u64,
}

/// Incident count for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: String,
    pub count: u64,
}

/// Dashboard aggregate statistics
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_incidents: u64,
    pub active_incidents: u64,
    pub resolved_today: u64,
    #[serde(default)]
    pub avg_resolution_time_minutes: f64,
    #[serde(default)]
    pub severity_distribution: BTreeMap<String, u64>,
    #[serde(default)]
    pub top_services: Vec<ServiceCount>,
    #[serde(default)]
    pub daily_trend: Vec<DailyCount>,
}

impl DashboardStats {
    /// Severity counts keyed by lowercase name
    ///
    /// The backend may key the map by the enum's repr (`SeverityLevel.CRITICAL`)
    /// rather than its value; both forms fold onto `critical`.
    pub fn severity_counts(&self) -> BTreeMap<String, u64> {
        let mut counts = BTreeMap::new();
        for (key, count) in &self.severity_distribution {
            *counts.entry(severity_key(key)).or_insert(0) += count;
        }
        counts
    }

    /// Count for one severity name, zero when absent
    pub fn severity_count(&self, severity: &str) -> u64 {
        let wanted = severity_key(severity);
        self.severity_distribution
            .iter()
            .filter(|(key, _)| severity_key(key) == wanted)
            .map(|(_, count)| count)
            .sum()
    }
}

fn severity_key(key: &str) -> String {
    let name = key.rsplit('.').next().unwrap_or(key);
    name.trim().to_ascii_lowercase()
}

/// Mean time to resolution over a trailing window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mttr {
    pub mttr_minutes: f64,
    pub sample_size: u64,
    /// Omitted by the backend when there were no samples
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_days: Option<u32>,
}
