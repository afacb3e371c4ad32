use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveTime};
use diesel::prelude::*;
use diesel::{insert_into, upsert::excluded};
use std::sync::Arc;

use crate::domain::{
    entities::appointments::{AppointmentEntity, InsertAppointmentEntity},
    repositories::appointments::AppointmentRepository,
    value_objects::appointments::AppointmentModel,
};
use crate::infra::db::postgres::{postgres_connection::PgPoolSquad, schema::appointments};

pub struct AppointmentPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl AppointmentPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl AppointmentRepository for AppointmentPostgres {
    async fn upsert(&self, appointment: InsertAppointmentEntity) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let id = insert_into(appointments::table)
            .values(&appointment)
            .on_conflict(appointments::platform_id)
            .do_update()
            .set((
                appointments::customer_name.eq(excluded(appointments::customer_name)),
                appointments::customer_email.eq(excluded(appointments::customer_email)),
                appointments::appointment_date.eq(excluded(appointments::appointment_date)),
                appointments::service_type.eq(excluded(appointments::service_type)),
            ))
            .returning(appointments::id)
            .get_result::<i64>(&mut conn)?;

        Ok(id)
    }

    async fn find_by_date(&self, date: NaiveDate) -> Result<Vec<AppointmentModel>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // Calendar-day match on the wall-clock appointment time.
        let day_start = date.and_time(NaiveTime::MIN);
        let day_end = day_start + Duration::days(1);

        let results = appointments::table
            .filter(appointments::appointment_date.ge(day_start))
            .filter(appointments::appointment_date.lt(day_end))
            .order(appointments::id.asc())
            .load::<AppointmentEntity>(&mut conn)?;

        Ok(results.into_iter().map(AppointmentModel::from).collect())
    }
}
