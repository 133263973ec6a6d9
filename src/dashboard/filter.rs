//! Client-side incident views

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::types::{Incident, ParseEnumError, Severity};

/// Which incidents a list shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IncidentView {
    #[default]
    All,
    /// Anything not yet resolved
    Active,
    Resolved,
    Severity(Severity),
}

impl IncidentView {
    pub fn matches(&self, incident: &Incident) -> bool {
        match self {
            IncidentView::All => true,
            IncidentView::Active => incident.is_active(),
            IncidentView::Resolved => !incident.is_active(),
            IncidentView::Severity(severity) => incident.severity == *severity,
        }
    }

    pub fn apply<'a>(&self, incidents: &'a [Incident]) -> Vec<&'a Incident> {
        incidents.iter().filter(|i| self.matches(i)).collect()
    }
}

impl FromStr for IncidentView {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(IncidentView::All),
            "active" => Ok(IncidentView::Active),
            "resolved" => Ok(IncidentView::Resolved),
            other => other
                .parse::<Severity>()
                .map(IncidentView::Severity)
                .map_err(|_| ParseEnumError {
                    kind: "view",
                    value: s.to_string(),
                }),
        }
    }
}

impl fmt::Display for IncidentView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IncidentView::All => f.write_str("all"),
            IncidentView::Active => f.write_str("active"),
            IncidentView::Resolved => f.write_str("resolved"),
            IncidentView::Severity(severity) => write!(f, "{}", severity),
        }
    }
}

/// Per-view incident counts for filter buttons
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewCounts {
    pub all: usize,
    pub active: usize,
    pub resolved: usize,
    pub by_severity: BTreeMap<Severity, usize>,
}

impl ViewCounts {
    pub fn tally(incidents: &[Incident]) -> Self {
        let mut counts = ViewCounts {
            all: incidents.len(),
            ..Default::default()
        };

        for incident in incidents {
            if incident.is_active() {
                counts.active += 1;
            } else {
                counts.resolved += 1;
            }
            *counts.by_severity.entry(incident.severity).or_insert(0) += 1;
        }

        counts
    }

    pub fn get(&self, view: IncidentView) -> usize {
        match view {
            IncidentView::All => self.all,
            IncidentView::Active => self.active,
            IncidentView::Resolved => self.resolved,
            IncidentView::Severity(severity) => self.by_severity.get(&severity).copied().unwrap_or(0),
        }
    }
}
