use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::insert_into;
use diesel::prelude::*;
use std::sync::Arc;

use crate::domain::{
    entities::email_tracking::EmailTrackingEntity,
    repositories::email_tracking::EmailTrackingRepository,
    value_objects::{
        email_kinds::{EmailKind, TimeSlot},
        enums::delivery_statuses::DeliveryStatus,
    },
};
use crate::infra::db::postgres::{
    postgres_connection::PgPoolSquad,
    schema::{email_logs, email_tracking},
};

pub struct EmailTrackingPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl EmailTrackingPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl EmailTrackingRepository for EmailTrackingPostgres {
    async fn get(&self, appointment_id: i64) -> Result<Option<EmailTrackingEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = email_tracking::table
            .filter(email_tracking::appointment_id.eq(appointment_id))
            .first::<EmailTrackingEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn mark_sent(
        &self,
        appointment_id: i64,
        kind: EmailKind,
        sent_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // The flag flip and the delivery log row must land together, so both
        // writes run inside one transaction.
        conn.transaction::<(), diesel::result::Error, _>(|conn| {
            match kind {
                EmailKind::ThankYou(TimeSlot::Noon) => {
                    insert_into(email_tracking::table)
                        .values((
                            email_tracking::appointment_id.eq(appointment_id),
                            email_tracking::thank_you_sent_noon.eq(true),
                        ))
                        .on_conflict(email_tracking::appointment_id)
                        .do_update()
                        .set(email_tracking::thank_you_sent_noon.eq(true))
                        .execute(conn)?;
                }
                EmailKind::ThankYou(TimeSlot::Evening) => {
                    insert_into(email_tracking::table)
                        .values((
                            email_tracking::appointment_id.eq(appointment_id),
                            email_tracking::thank_you_sent_evening.eq(true),
                        ))
                        .on_conflict(email_tracking::appointment_id)
                        .do_update()
                        .set(email_tracking::thank_you_sent_evening.eq(true))
                        .execute(conn)?;
                }
                EmailKind::Followup => {
                    insert_into(email_tracking::table)
                        .values((
                            email_tracking::appointment_id.eq(appointment_id),
                            email_tracking::followup_sent.eq(true),
                            email_tracking::followup_sent_at.eq(sent_at),
                        ))
                        .on_conflict(email_tracking::appointment_id)
                        .do_update()
                        .set((
                            email_tracking::followup_sent.eq(true),
                            email_tracking::followup_sent_at.eq(sent_at),
                        ))
                        .execute(conn)?;
                }
            }

            insert_into(email_logs::table)
                .values((
                    email_logs::appointment_id.eq(Some(appointment_id)),
                    email_logs::email_kind.eq(kind.label()),
                    email_logs::status.eq(DeliveryStatus::Sent.as_str()),
                    email_logs::sent_at.eq(sent_at),
                ))
                .execute(conn)?;

            Ok(())
        })?;

        Ok(())
    }
}
