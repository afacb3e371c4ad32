use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::Deserialize;

use crate::infra::db::postgres::schema::appointments;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = appointments)]
pub struct AppointmentEntity {
    pub id: i64,
    pub platform_id: String,
    pub customer_name: String,
    pub customer_email: String,
    /// Wall-clock date/time of the visit as the booking platform reports it.
    pub appointment_date: NaiveDateTime,
    pub service_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable, Deserialize)]
#[diesel(table_name = appointments)]
pub struct InsertAppointmentEntity {
    pub platform_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub appointment_date: NaiveDateTime,
    pub service_type: Option<String>,
}
