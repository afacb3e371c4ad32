use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use mockall::automock;

use crate::domain::entities::appointments::InsertAppointmentEntity;
use crate::domain::value_objects::appointments::AppointmentModel;

#[async_trait]
#[automock]
pub trait AppointmentRepository {
    /// Upsert by platform id: re-importing the same booking updates fields but
    /// preserves the surrogate id and all tracking state. Returns the id.
    async fn upsert(&self, appointment: InsertAppointmentEntity) -> Result<i64>;

    /// All appointments whose calendar date equals `date`, ordered by id so
    /// dispatch runs process candidates deterministically.
    async fn find_by_date(&self, date: NaiveDate) -> Result<Vec<AppointmentModel>>;
}
