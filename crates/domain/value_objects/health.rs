use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::value_objects::enums::health_statuses::HealthStatus;

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseHealth {
    pub status: HealthStatus,
    pub appointments: Option<i64>,
    pub email_logs: Option<i64>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SmtpHealth {
    pub status: HealthStatus,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentErrorsHealth {
    pub status: HealthStatus,
    pub failed_last_hour: Option<i64>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub overall: HealthStatus,
    pub database: DatabaseHealth,
    pub smtp: SmtpHealth,
    pub recent_errors: RecentErrorsHealth,
    pub timestamp: DateTime<Utc>,
}
