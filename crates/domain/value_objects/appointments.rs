use chrono::NaiveDateTime;

use crate::domain::entities::appointments::AppointmentEntity;

/// Engine-facing view of an appointment. The surrogate id is optional: an
/// appointment without one cannot be tracked and is skipped by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentModel {
    pub id: Option<i64>,
    pub platform_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub appointment_date: NaiveDateTime,
    pub service_type: Option<String>,
}

impl From<AppointmentEntity> for AppointmentModel {
    fn from(value: AppointmentEntity) -> Self {
        Self {
            id: Some(value.id),
            platform_id: value.platform_id,
            customer_name: value.customer_name,
            customer_email: value.customer_email,
            appointment_date: value.appointment_date,
            service_type: value.service_type,
        }
    }
}
