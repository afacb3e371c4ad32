use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use mockall::automock;

use crate::domain::value_objects::enums::delivery_statuses::DeliveryStatus;
use crate::domain::value_objects::metrics::EmailCountRow;

/// Read-only aggregations over the delivery log and appointment table,
/// consumed by the dashboard and the CLI stats/health commands.
#[async_trait]
#[automock]
pub trait MetricsRepository {
    async fn email_counts_since(&self, since: DateTime<Utc>) -> Result<Vec<EmailCountRow>>;

    async fn count_appointments(&self) -> Result<i64>;
    async fn count_appointments_on(&self, date: NaiveDate) -> Result<i64>;
    async fn count_appointments_since(&self, date: NaiveDate) -> Result<i64>;

    async fn count_logs(&self) -> Result<i64>;
    async fn count_logs_since(&self, since: DateTime<Utc>) -> Result<i64>;
    async fn count_logs_with_status(&self, status: DeliveryStatus) -> Result<i64>;
    async fn count_failed_since(&self, since: DateTime<Utc>) -> Result<i64>;
}
