use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::email_logs::InsertEmailLogEntity;

#[async_trait]
#[automock]
pub trait EmailLogRepository {
    /// Append one attempt row. Rows are never updated or deleted.
    async fn append(&self, entry: InsertEmailLogEntity) -> Result<i64>;
}
