use anyhow::Result;
use async_trait::async_trait;
use diesel::insert_into;
use diesel::prelude::*;
use std::sync::Arc;

use crate::domain::{
    entities::email_logs::InsertEmailLogEntity, repositories::email_logs::EmailLogRepository,
};
use crate::infra::db::postgres::{postgres_connection::PgPoolSquad, schema::email_logs};

pub struct EmailLogPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl EmailLogPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl EmailLogRepository for EmailLogPostgres {
    async fn append(&self, log: InsertEmailLogEntity) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let id = insert_into(email_logs::table)
            .values(&log)
            .returning(email_logs::id)
            .get_result::<i64>(&mut conn)?;

        Ok(id)
    }
}
