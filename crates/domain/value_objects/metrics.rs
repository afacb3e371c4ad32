use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::value_objects::enums::delivery_statuses::DeliveryStatus;

/// One aggregation row from the delivery log: count of attempts grouped by
/// (status, email kind) within a time window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailCountRow {
    pub status: String,
    pub email_kind: String,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct KindBreakdown {
    pub sent: i64,
    pub skipped: i64,
    pub failed: i64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct EmailStats {
    pub total: i64,
    pub sent: i64,
    pub skipped: i64,
    pub failed: i64,
    pub by_kind: BTreeMap<String, KindBreakdown>,
}

impl EmailStats {
    pub fn from_rows(rows: &[EmailCountRow]) -> Self {
        let mut stats = EmailStats::default();

        for row in rows {
            stats.total += row.count;

            let breakdown = stats.by_kind.entry(row.email_kind.clone()).or_default();
            match DeliveryStatus::from_str(&row.status) {
                Some(DeliveryStatus::Sent) => {
                    stats.sent += row.count;
                    breakdown.sent += row.count;
                }
                Some(DeliveryStatus::Skipped) => {
                    stats.skipped += row.count;
                    breakdown.skipped += row.count;
                }
                Some(DeliveryStatus::Failed) => {
                    stats.failed += row.count;
                    breakdown.failed += row.count;
                }
                // Unknown statuses still count toward the total.
                None => {}
            }
        }

        stats
    }

    /// Share of attempts that resulted in a delivered email, as a percentage.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.sent as f64 / self.total as f64) * 100.0
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct AppointmentStats {
    pub total: i64,
    pub today: i64,
    pub last_7_days: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub timestamp: DateTime<Utc>,
    pub email_stats_24h: EmailStats,
    pub email_stats_7d: EmailStats,
    pub appointment_stats: AppointmentStats,
    pub success_rate_24h: f64,
    pub success_rate_7d: f64,
}

/// Compact summary for the dashboard landing card and the CLI stats command.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatsSummary {
    pub total_appointments: i64,
    pub appointments_today: i64,
    pub emails_sent: i64,
    pub emails_failed: i64,
    pub recent_emails_24h: i64,
    pub success_rate: f64,
}
