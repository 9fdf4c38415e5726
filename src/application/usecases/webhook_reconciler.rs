use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    application::usecases::payment_recorder::{PaymentRecorder, RecordOutcome},
    domain::{
        entities::{
            gateway_logs::InsertGatewayLogEntity,
            host_invoices::HostInvoiceEntity,
            payment_sessions::{
                InsertPaymentSessionEntity, PaymentSessionEntity, UpdatePaymentSessionEntity,
            },
        },
        repositories::{
            gateway_logs::GatewayLogRepository, host_invoices::HostInvoiceRepository,
            payment_sessions::PaymentSessionRepository,
        },
        value_objects::{
            reconciliation::WebhookAck,
            webhook::{ValidatedWebhook, WebhookPayload},
        },
    },
};

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("invalid webhook payload: {0}")]
    Validation(String),

    #[error("invoice {0} not found")]
    NotFound(i64),

    #[error("payment recording failed for invoice {0}: {1}")]
    Recording(i64, String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ReconcileError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ReconcileError::Validation(_) => StatusCode::BAD_REQUEST,
            ReconcileError::NotFound(_) => StatusCode::NOT_FOUND,
            ReconcileError::Recording(..) => StatusCode::INTERNAL_SERVER_ERROR,
            ReconcileError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Fields collected while a delivery is processed, flushed to the audit
/// ledger exactly once per delivery whatever the outcome.
struct AuditFields {
    invoice_id: Option<i64>,
    transaction_id: Option<String>,
    amount: Option<f64>,
    outcome: &'static str,
}

impl Default for AuditFields {
    fn default() -> Self {
        Self {
            invoice_id: None,
            transaction_id: None,
            amount: None,
            outcome: "internal_error",
        }
    }
}

/// Reconciles inbound VOLTXT webhooks against the session ledger and the
/// host invoice. Deliveries are treated as untrusted hints: nothing is
/// recorded until the invoice and transaction checks pass.
pub struct WebhookReconcilerUseCase<S, H, L>
where
    S: PaymentSessionRepository + Send + Sync + 'static,
    H: HostInvoiceRepository + Send + Sync + 'static,
    L: GatewayLogRepository + Send + Sync + 'static,
{
    payment_session_repository: Arc<S>,
    host_invoice_repository: Arc<H>,
    gateway_log_repository: Arc<L>,
    payment_recorder: PaymentRecorder<H>,
}

impl<S, H, L> WebhookReconcilerUseCase<S, H, L>
where
    S: PaymentSessionRepository + Send + Sync + 'static,
    H: HostInvoiceRepository + Send + Sync + 'static,
    L: GatewayLogRepository + Send + Sync + 'static,
{
    pub fn new(
        payment_session_repository: Arc<S>,
        host_invoice_repository: Arc<H>,
        gateway_log_repository: Arc<L>,
    ) -> Self {
        let payment_recorder = PaymentRecorder::new(Arc::clone(&host_invoice_repository));
        Self {
            payment_session_repository,
            host_invoice_repository,
            gateway_log_repository,
            payment_recorder,
        }
    }

    /// Processes one delivery and appends one audit entry, success or not.
    /// A failed audit append is logged but never turns a processed delivery
    /// into a retryable error.
    pub async fn handle_webhook(
        &self,
        payload: WebhookPayload,
    ) -> Result<WebhookAck, ReconcileError> {
        let mut audit = AuditFields::default();
        let result = self.process(&payload, &mut audit).await;

        if let Err(err) = &result {
            audit.outcome = match err {
                ReconcileError::Validation(reason) => {
                    let raw = serde_json::to_string(&payload).unwrap_or_default();
                    warn!(
                        reason = %reason,
                        payload = %truncate_for_log(&raw, 500),
                        "webhooks: delivery rejected"
                    );
                    "validation_failed"
                }
                ReconcileError::NotFound(_) => "invoice_not_found",
                ReconcileError::Recording(..) => "recording_failed",
                ReconcileError::Internal(_) => "internal_error",
            };
        }

        let entry = InsertGatewayLogEntity {
            invoice_id: audit.invoice_id,
            transaction_id: audit.transaction_id.clone(),
            amount: audit.amount,
            payload: serde_json::to_value(&payload).unwrap_or(serde_json::Value::Null),
            outcome: audit.outcome.to_string(),
        };
        if let Err(err) = self.gateway_log_repository.append(entry).await {
            warn!(db_error = ?err, "webhooks: audit entry append failed");
        }

        result
    }

    async fn process(
        &self,
        payload: &WebhookPayload,
        audit: &mut AuditFields,
    ) -> Result<WebhookAck, ReconcileError> {
        let validated = payload.validate().map_err(ReconcileError::Validation)?;
        audit.invoice_id = Some(validated.host_invoice_id);

        info!(
            invoice_id = validated.host_invoice_id,
            family = %validated.family,
            event_type = %validated.event_type,
            status = %validated.status,
            "webhooks: delivery accepted"
        );

        let invoice = self
            .host_invoice_repository
            .find_invoice(validated.host_invoice_id)
            .await?
            .ok_or(ReconcileError::NotFound(validated.host_invoice_id))?;

        if invoice.is_paid() {
            audit.outcome = "already_paid";
            info!(
                invoice_id = invoice.id,
                "webhooks: invoice already paid, acknowledging"
            );
            return Ok(WebhookAck::acknowledged(invoice.id));
        }

        let session = self
            .payment_session_repository
            .find_active_by_invoice(invoice.id)
            .await?;

        match &session {
            Some(_) => self.merge_delivery(invoice.id, payload, &validated).await?,
            None => {
                // Delivery raced ahead of any checkout we know about. Seed a
                // ledger row from the delivery itself so the refresh path has
                // something to work against.
                self.insert_from_delivery(&invoice, payload, &validated)
                    .await?
            }
        }

        if !validated.status.is_terminal_success() {
            audit.outcome = "merged";
            return Ok(WebhookAck::acknowledged(invoice.id));
        }

        let Some(amount) = effective_amount(payload, session.as_ref()) else {
            audit.outcome = "no_amount";
            warn!(
                invoice_id = invoice.id,
                "webhooks: terminal status without a resolvable amount"
            );
            return Ok(WebhookAck::failed(
                Some(invoice.id),
                "no payment amount available",
            ));
        };

        let transaction_id = resolve_transaction_id(payload, &validated);
        audit.transaction_id = Some(transaction_id.clone());
        audit.amount = Some(amount);

        let outcome = self
            .payment_recorder
            .record(&invoice, &transaction_id, amount)
            .await
            .map_err(|err| ReconcileError::Recording(invoice.id, err.to_string()))?;

        match outcome {
            RecordOutcome::Recorded => {
                let update = UpdatePaymentSessionEntity {
                    recorded_transaction_id: Some(transaction_id.clone()),
                    last_updated_at: Some(Utc::now()),
                    ..Default::default()
                };
                if let Err(err) = self.payment_session_repository.merge(invoice.id, update).await {
                    warn!(
                        invoice_id = invoice.id,
                        db_error = ?err,
                        "webhooks: failed to stamp recorded transaction onto session"
                    );
                }
                audit.outcome = "recorded";
                Ok(WebhookAck::recorded(invoice.id))
            }
            RecordOutcome::AlreadyPaid => {
                audit.outcome = "already_paid";
                Ok(WebhookAck::acknowledged(invoice.id))
            }
            RecordOutcome::AlreadyRecorded => {
                audit.outcome = "already_recorded";
                Ok(WebhookAck::acknowledged(invoice.id))
            }
        }
    }

    async fn merge_delivery(
        &self,
        invoice_id: i64,
        payload: &WebhookPayload,
        validated: &ValidatedWebhook,
    ) -> Result<(), ReconcileError> {
        let update = UpdatePaymentSessionEntity {
            status: Some(validated.status.as_str().to_string()),
            payment_tx_id: payload.payment_tx_id.clone(),
            auto_process_tx_id: payload.auto_process_tx_id.clone(),
            last_updated_at: Some(Utc::now()),
            ..Default::default()
        };
        self.payment_session_repository
            .merge(invoice_id, update)
            .await?;
        Ok(())
    }

    async fn insert_from_delivery(
        &self,
        invoice: &HostInvoiceEntity,
        payload: &WebhookPayload,
        validated: &ValidatedWebhook,
    ) -> Result<(), ReconcileError> {
        let row = InsertPaymentSessionEntity {
            host_invoice_id: invoice.id,
            family: validated.family.as_str().to_string(),
            external_session_id: validated.external_session_id.clone(),
            network: validated.network.as_str().to_string(),
            status: validated.status.as_str().to_string(),
            amount_fiat: payload.payload_amount().unwrap_or(invoice.total),
            currency: invoice.currency.clone(),
            amount_crypto: None,
            payment_url: String::new(),
            status_check_url: None,
            deposit_address: None,
            payment_tx_id: payload.payment_tx_id.clone(),
            auto_process_tx_id: payload.auto_process_tx_id.clone(),
            expires_at: None,
        };
        self.payment_session_repository.insert(row).await?;
        Ok(())
    }
}

/// Byte-capped log excerpt that never splits a multibyte character.
fn truncate_for_log(raw: &str, max: usize) -> &str {
    if raw.len() <= max {
        return raw;
    }
    let mut end = max;
    while !raw.is_char_boundary(end) {
        end -= 1;
    }
    &raw[..end]
}

/// Explicit fiat amount first, then the generic amount field, then whatever
/// the session ledger already holds.
fn effective_amount(payload: &WebhookPayload, session: Option<&PaymentSessionEntity>) -> Option<f64> {
    if let Some(amount) = payload.payload_amount() {
        return Some(amount);
    }
    session
        .filter(|row| row.amount_fiat > 0.0)
        .map(|row| row.amount_fiat)
}

/// Transaction id priority mirrors what the API actually sends: the on-chain
/// payment transaction, then the auto-process transaction, then a synthetic
/// id derived from the session so dedup still has something stable enough.
fn resolve_transaction_id(payload: &WebhookPayload, validated: &ValidatedWebhook) -> String {
    if let Some(tx) = payload.payment_tx_id.as_deref() {
        if !tx.trim().is_empty() {
            return tx.to_string();
        }
    }
    if let Some(tx) = payload.auto_process_tx_id.as_deref() {
        if !tx.trim().is_empty() {
            return tx.to_string();
        }
    }
    format!(
        "{}-{}",
        validated.external_session_id,
        Utc::now().timestamp()
    )
}
