use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::host_invoices::HostInvoiceEntity;

/// Seam to the host platform's own invoice accounting. This service's
/// responsibility ends at calling it with a validated, deduplicated request;
/// the Unpaid -> Paid transition itself is platform-owned.
#[automock]
#[async_trait]
pub trait HostInvoiceRepository {
    async fn find_invoice(&self, invoice_id: i64) -> Result<Option<HostInvoiceEntity>>;

    /// Duplicate-delivery protection: the platform keeps a unique constraint
    /// on gateway transaction ids.
    async fn transaction_exists(&self, transaction_id: &str) -> Result<bool>;

    /// Applies the payment and marks the invoice Paid.
    async fn add_payment(
        &self,
        invoice_id: i64,
        transaction_id: &str,
        amount: f64,
        fee: f64,
    ) -> Result<()>;

    /// Best-effort payment confirmation notification. Callers log failures
    /// and never escalate them.
    async fn send_payment_confirmation(&self, invoice_id: i64) -> Result<()>;
}
