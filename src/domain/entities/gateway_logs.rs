use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

use crate::infrastructure::postgres::schema::gateway_logs;

/// Append-only audit ledger entry. One row per inbound webhook delivery and
/// per manual-refresh recording attempt; never updated or deleted.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = gateway_logs)]
pub struct GatewayLogEntity {
    pub id: i64,
    pub invoice_id: Option<i64>,
    pub transaction_id: Option<String>,
    pub amount: Option<f64>,
    pub payload: Value,
    pub outcome: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = gateway_logs)]
pub struct InsertGatewayLogEntity {
    pub invoice_id: Option<i64>,
    pub transaction_id: Option<String>,
    pub amount: Option<f64>,
    pub payload: Value,
    pub outcome: String,
}
