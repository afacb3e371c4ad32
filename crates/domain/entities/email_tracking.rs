use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::value_objects::email_kinds::{EmailKind, TimeSlot};
use crate::infra::db::postgres::schema::email_tracking;

/// Per-appointment send flags. One row per appointment, created lazily on the
/// first successful send. Flags only ever go false -> true in normal operation.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = email_tracking)]
pub struct EmailTrackingEntity {
    pub id: i64,
    pub appointment_id: i64,
    pub thank_you_sent_noon: bool,
    pub thank_you_sent_evening: bool,
    pub followup_sent: bool,
    pub followup_sent_at: Option<DateTime<Utc>>,
}

impl EmailTrackingEntity {
    pub fn is_sent(&self, kind: EmailKind) -> bool {
        match kind {
            EmailKind::ThankYou(TimeSlot::Noon) => self.thank_you_sent_noon,
            EmailKind::ThankYou(TimeSlot::Evening) => self.thank_you_sent_evening,
            EmailKind::Followup => self.followup_sent,
        }
    }
}
