use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::infra::db::postgres::schema::email_logs;

/// Append-only audit row, one per send attempt (including skips).
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = email_logs)]
pub struct EmailLogEntity {
    pub id: i64,
    pub appointment_id: Option<i64>,
    pub email_kind: String,
    pub status: String,
    pub error_message: Option<String>,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = email_logs)]
pub struct InsertEmailLogEntity {
    pub appointment_id: Option<i64>,
    pub email_kind: String,
    pub status: String,
    pub error_message: Option<String>,
}
