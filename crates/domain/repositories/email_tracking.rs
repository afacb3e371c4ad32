use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;

use crate::domain::entities::email_tracking::EmailTrackingEntity;
use crate::domain::value_objects::email_kinds::EmailKind;

#[async_trait]
#[automock]
pub trait EmailTrackingRepository {
    /// Tracking record for an appointment; absent means nothing sent yet.
    async fn get(&self, appointment_id: i64) -> Result<Option<EmailTrackingEntity>>;

    /// Record a confirmed successful send: sets the flag for `kind` (creating
    /// the tracking row if needed) and appends the `sent` delivery-log entry,
    /// both in a single transaction so a crash cannot separate them.
    async fn mark_sent(
        &self,
        appointment_id: i64,
        kind: EmailKind,
        sent_at: DateTime<Utc>,
    ) -> Result<()>;
}
