use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{
    entities::host_invoices::HostInvoiceEntity, repositories::host_invoices::HostInvoiceRepository,
};

#[derive(Debug, Error)]
pub enum RecordingError {
    #[error("transaction lookup failed: {0}")]
    Lookup(String),

    #[error("payment recording failed: {0}")]
    Recording(String),
}

/// What actually happened for a terminal-success notification. Every variant
/// is an acknowledgeable outcome; only `Recorded` changed platform state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded,
    AlreadyPaid,
    AlreadyRecorded,
}

/// Applies a confirmed payment to the host invoice exactly once. Shared by
/// the webhook path and the manual status refresh so both go through the
/// same dedup checks.
pub struct PaymentRecorder<H>
where
    H: HostInvoiceRepository + Send + Sync + 'static,
{
    host_invoice_repository: Arc<H>,
}

impl<H> PaymentRecorder<H>
where
    H: HostInvoiceRepository + Send + Sync + 'static,
{
    pub fn new(host_invoice_repository: Arc<H>) -> Self {
        Self {
            host_invoice_repository,
        }
    }

    pub async fn record(
        &self,
        invoice: &HostInvoiceEntity,
        transaction_id: &str,
        amount: f64,
    ) -> Result<RecordOutcome, RecordingError> {
        if invoice.is_paid() {
            info!(
                invoice_id = invoice.id,
                "payments: invoice already paid, nothing to record"
            );
            return Ok(RecordOutcome::AlreadyPaid);
        }

        let exists = self
            .host_invoice_repository
            .transaction_exists(transaction_id)
            .await
            .map_err(|err| RecordingError::Lookup(err.to_string()))?;
        if exists {
            info!(
                invoice_id = invoice.id,
                transaction_id, "payments: transaction already recorded, skipping"
            );
            return Ok(RecordOutcome::AlreadyRecorded);
        }

        self.host_invoice_repository
            .add_payment(invoice.id, transaction_id, amount, 0.0)
            .await
            .map_err(|err| RecordingError::Recording(err.to_string()))?;

        info!(
            invoice_id = invoice.id,
            transaction_id, amount, "payments: payment recorded"
        );

        if let Err(err) = self
            .host_invoice_repository
            .send_payment_confirmation(invoice.id)
            .await
        {
            warn!(
                invoice_id = invoice.id,
                error = ?err,
                "payments: confirmation notification failed"
            );
        }

        Ok(RecordOutcome::Recorded)
    }
}
