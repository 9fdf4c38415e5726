use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::gateway_logs::InsertGatewayLogEntity;

/// Append-only audit ledger used for manual reconciliation and disputes.
#[automock]
#[async_trait]
pub trait GatewayLogRepository {
    async fn append(&self, entry: InsertGatewayLogEntity) -> Result<i64>;
}
