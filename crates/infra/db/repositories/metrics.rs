use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use diesel::dsl::count_star;
use diesel::prelude::*;
use std::sync::Arc;

use crate::domain::{
    repositories::metrics::MetricsRepository,
    value_objects::{enums::delivery_statuses::DeliveryStatus, metrics::EmailCountRow},
};
use crate::infra::db::postgres::{
    postgres_connection::PgPoolSquad,
    schema::{appointments, email_logs},
};

pub struct MetricsPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl MetricsPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl MetricsRepository for MetricsPostgres {
    async fn email_counts_since(&self, since: DateTime<Utc>) -> Result<Vec<EmailCountRow>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = email_logs::table
            .filter(email_logs::sent_at.ge(since))
            .group_by((email_logs::status, email_logs::email_kind))
            .select((email_logs::status, email_logs::email_kind, count_star()))
            .load::<(String, String, i64)>(&mut conn)?;

        Ok(rows
            .into_iter()
            .map(|(status, email_kind, count)| EmailCountRow {
                status,
                email_kind,
                count,
            })
            .collect())
    }

    async fn count_appointments(&self) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let count = appointments::table
            .select(count_star())
            .first::<i64>(&mut conn)?;

        Ok(count)
    }

    async fn count_appointments_on(&self, date: NaiveDate) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let day_start = date.and_time(NaiveTime::MIN);
        let day_end = day_start + Duration::days(1);

        let count = appointments::table
            .filter(appointments::appointment_date.ge(day_start))
            .filter(appointments::appointment_date.lt(day_end))
            .select(count_star())
            .first::<i64>(&mut conn)?;

        Ok(count)
    }

    async fn count_appointments_since(&self, date: NaiveDate) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let since = date.and_time(NaiveTime::MIN);

        let count = appointments::table
            .filter(appointments::appointment_date.ge(since))
            .select(count_star())
            .first::<i64>(&mut conn)?;

        Ok(count)
    }

    async fn count_logs(&self) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let count = email_logs::table
            .select(count_star())
            .first::<i64>(&mut conn)?;

        Ok(count)
    }

    async fn count_logs_since(&self, since: DateTime<Utc>) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let count = email_logs::table
            .filter(email_logs::sent_at.ge(since))
            .select(count_star())
            .first::<i64>(&mut conn)?;

        Ok(count)
    }

    async fn count_logs_with_status(&self, status: DeliveryStatus) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let count = email_logs::table
            .filter(email_logs::status.eq(status.as_str()))
            .select(count_star())
            .first::<i64>(&mut conn)?;

        Ok(count)
    }

    async fn count_failed_since(&self, since: DateTime<Utc>) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let count = email_logs::table
            .filter(email_logs::status.eq(DeliveryStatus::Failed.as_str()))
            .filter(email_logs::sent_at.ge(since))
            .select(count_star())
            .first::<i64>(&mut conn)?;

        Ok(count)
    }
}
