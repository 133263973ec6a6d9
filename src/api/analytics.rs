//! Analytics endpoints

use super::{ApiClient, ApiError};
use crate::types::{DashboardStats, Mttr};

/// Trailing window used when none is given
pub const DEFAULT_MTTR_DAYS: u32 = 30;

impl ApiClient {
    /// GET /analytics/dashboard
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        self.get_json("/analytics/dashboard", &[]).await
    }

    /// GET /analytics/mttr?days=N
    pub async fn mttr(&self, days: u32) -> Result<Mttr, ApiError> {
        self.get_json("/analytics/mttr", &[("days", days.to_string())]).await
    }
}
