use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::payment_sessions::{
    InsertPaymentSessionEntity, PaymentSessionEntity, UpdatePaymentSessionEntity,
};

/// Reconciliation ledger between host invoices and VOLTXT sessions. Rows are
/// append-only; the active session for an invoice is the newest row.
#[automock]
#[async_trait]
pub trait PaymentSessionRepository {
    /// Returns the newest session row for the invoice, superseded or not.
    async fn find_active_by_invoice(
        &self,
        host_invoice_id: i64,
    ) -> Result<Option<PaymentSessionEntity>>;

    /// Inserts a new session row, logically superseding any prior one.
    async fn insert(&self, session: InsertPaymentSessionEntity) -> Result<i64>;

    /// Merges a partial update into the newest session row for the invoice.
    /// Must be atomic per invoice: a single UPDATE, no read-modify-write in
    /// application code.
    async fn merge(&self, host_invoice_id: i64, update: UpdatePaymentSessionEntity) -> Result<()>;
}
