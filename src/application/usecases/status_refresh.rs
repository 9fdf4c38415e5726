use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Utc;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    application::{
        usecases::payment_recorder::{PaymentRecorder, RecordOutcome},
        voltxt_gateway::{RemoteSessionStatus, VoltxtGateway},
    },
    domain::{
        entities::{
            gateway_logs::InsertGatewayLogEntity,
            payment_sessions::{PaymentSessionEntity, UpdatePaymentSessionEntity},
        },
        repositories::{
            gateway_logs::GatewayLogRepository, host_invoices::HostInvoiceRepository,
            payment_sessions::PaymentSessionRepository,
        },
        value_objects::{
            enums::{payment_families::PaymentFamily, session_statuses::SessionStatus},
            reconciliation::RefreshOutcome,
        },
    },
};

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("invoice {0} not found")]
    InvoiceNotFound(i64),

    #[error("no payment session for invoice {0}")]
    SessionNotFound(i64),

    #[error("{0}")]
    Upstream(String),

    #[error("payment recording failed for invoice {0}: {1}")]
    Recording(i64, String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl RefreshError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RefreshError::InvoiceNotFound(_) => StatusCode::NOT_FOUND,
            RefreshError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            RefreshError::Upstream(_) => StatusCode::BAD_GATEWAY,
            RefreshError::Recording(..) => StatusCode::INTERNAL_SERVER_ERROR,
            RefreshError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Pull-side counterpart to the webhook path: asks the API for the current
/// session state and runs it through the same merge and recording rules, so
/// a missed delivery can be repaired by hand.
pub struct StatusRefreshUseCase<S, H, G, L>
where
    S: PaymentSessionRepository + Send + Sync + 'static,
    H: HostInvoiceRepository + Send + Sync + 'static,
    G: VoltxtGateway + 'static,
    L: GatewayLogRepository + Send + Sync + 'static,
{
    payment_session_repository: Arc<S>,
    host_invoice_repository: Arc<H>,
    voltxt_gateway: Arc<G>,
    gateway_log_repository: Arc<L>,
    payment_recorder: PaymentRecorder<H>,
}

impl<S, H, G, L> StatusRefreshUseCase<S, H, G, L>
where
    S: PaymentSessionRepository + Send + Sync + 'static,
    H: HostInvoiceRepository + Send + Sync + 'static,
    G: VoltxtGateway + 'static,
    L: GatewayLogRepository + Send + Sync + 'static,
{
    pub fn new(
        payment_session_repository: Arc<S>,
        host_invoice_repository: Arc<H>,
        voltxt_gateway: Arc<G>,
        gateway_log_repository: Arc<L>,
    ) -> Self {
        let payment_recorder = PaymentRecorder::new(Arc::clone(&host_invoice_repository));
        Self {
            payment_session_repository,
            host_invoice_repository,
            voltxt_gateway,
            gateway_log_repository,
            payment_recorder,
        }
    }

    pub async fn refresh(&self, invoice_id: i64) -> Result<RefreshOutcome, RefreshError> {
        let invoice = self
            .host_invoice_repository
            .find_invoice(invoice_id)
            .await?
            .ok_or(RefreshError::InvoiceNotFound(invoice_id))?;

        let session = self
            .payment_session_repository
            .find_active_by_invoice(invoice_id)
            .await?
            .ok_or(RefreshError::SessionNotFound(invoice_id))?;

        let family = PaymentFamily::from_str(&session.family).unwrap_or(PaymentFamily::Dynamic);
        let previous_status =
            SessionStatus::from_api(&session.status).unwrap_or(SessionStatus::Pending);

        let remote = self
            .voltxt_gateway
            .session_status(family, &session.external_session_id)
            .await
            .map_err(|err| {
                warn!(
                    invoice_id,
                    external_session_id = %session.external_session_id,
                    api_error = %err,
                    "refresh: status lookup failed"
                );
                RefreshError::Upstream(err.user_message().to_string())
            })?;

        let update = UpdatePaymentSessionEntity {
            status: Some(remote.status.as_str().to_string()),
            amount_crypto: remote.amount_crypto,
            payment_tx_id: remote.payment_tx_id.clone(),
            auto_process_tx_id: remote.auto_process_tx_id.clone(),
            last_updated_at: Some(Utc::now()),
            ..Default::default()
        };
        self.payment_session_repository
            .merge(invoice_id, update)
            .await?;

        let mut payment_recorded = false;
        if remote.status.is_terminal_success() {
            match effective_amount(&remote, &session) {
                Some(amount) => {
                    let transaction_id = resolve_transaction_id(&remote, &session);
                    let result = self
                        .payment_recorder
                        .record(&invoice, &transaction_id, amount)
                        .await;

                    let outcome_label = match &result {
                        Ok(RecordOutcome::Recorded) => "recorded",
                        Ok(RecordOutcome::AlreadyPaid) => "already_paid",
                        Ok(RecordOutcome::AlreadyRecorded) => "already_recorded",
                        Err(_) => "recording_failed",
                    };
                    self.append_audit(
                        invoice_id,
                        Some(transaction_id.clone()),
                        Some(amount),
                        &remote,
                        outcome_label,
                    )
                    .await;

                    let outcome = result
                        .map_err(|err| RefreshError::Recording(invoice_id, err.to_string()))?;
                    if outcome == RecordOutcome::Recorded {
                        payment_recorded = true;
                        let stamp = UpdatePaymentSessionEntity {
                            recorded_transaction_id: Some(transaction_id),
                            last_updated_at: Some(Utc::now()),
                            ..Default::default()
                        };
                        if let Err(err) = self
                            .payment_session_repository
                            .merge(invoice_id, stamp)
                            .await
                        {
                            warn!(
                                invoice_id,
                                db_error = ?err,
                                "refresh: failed to stamp recorded transaction onto session"
                            );
                        }
                    }
                }
                None => {
                    warn!(
                        invoice_id,
                        "refresh: terminal status without a resolvable amount"
                    );
                    self.append_audit(invoice_id, None, None, &remote, "no_amount")
                        .await;
                }
            }
        }

        info!(
            invoice_id,
            previous_status = %previous_status,
            new_status = %remote.status,
            payment_recorded,
            "refresh: session reconciled"
        );

        Ok(RefreshOutcome {
            invoice_id,
            previous_status,
            new_status: remote.status,
            payment_recorded,
        })
    }

    /// One ledger row per recording attempt, mirroring the webhook path. A
    /// failed append is logged but never fails the refresh itself.
    async fn append_audit(
        &self,
        invoice_id: i64,
        transaction_id: Option<String>,
        amount: Option<f64>,
        remote: &RemoteSessionStatus,
        outcome: &str,
    ) {
        let entry = InsertGatewayLogEntity {
            invoice_id: Some(invoice_id),
            transaction_id,
            amount,
            payload: json!({
                "source": "manual_refresh",
                "remote_status": remote.status.as_str(),
                "amount_fiat": remote.amount_fiat,
                "payment_tx_id": remote.payment_tx_id,
                "auto_process_tx_id": remote.auto_process_tx_id,
            }),
            outcome: outcome.to_string(),
        };
        if let Err(err) = self.gateway_log_repository.append(entry).await {
            warn!(invoice_id, db_error = ?err, "refresh: audit entry append failed");
        }
    }
}

fn effective_amount(remote: &RemoteSessionStatus, session: &PaymentSessionEntity) -> Option<f64> {
    match remote.amount_fiat {
        Some(v) if v > 0.0 => Some(v),
        _ if session.amount_fiat > 0.0 => Some(session.amount_fiat),
        _ => None,
    }
}

fn resolve_transaction_id(remote: &RemoteSessionStatus, session: &PaymentSessionEntity) -> String {
    if let Some(tx) = remote.payment_tx_id.as_deref() {
        if !tx.trim().is_empty() {
            return tx.to_string();
        }
    }
    if let Some(tx) = remote.auto_process_tx_id.as_deref() {
        if !tx.trim().is_empty() {
            return tx.to_string();
        }
    }
    format!("{}-{}", session.external_session_id, Utc::now().timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use mockall::predicate::eq;

    use crate::{
        application::voltxt_gateway::{MockVoltxtGateway, VoltxtApiError},
        domain::{
            entities::host_invoices::{
                HostInvoiceEntity, INVOICE_STATUS_PAID, INVOICE_STATUS_UNPAID,
            },
            repositories::{
                gateway_logs::MockGatewayLogRepository, host_invoices::MockHostInvoiceRepository,
                payment_sessions::MockPaymentSessionRepository,
            },
        },
    };

    fn sample_invoice(status: &str) -> HostInvoiceEntity {
        HostInvoiceEntity {
            id: 55,
            client_id: 7,
            client_name: "Ada Lovelace".to_string(),
            client_email: "ada@example.com".to_string(),
            status: status.to_string(),
            total: 25.0,
            currency: "USD".to_string(),
            paid_at: None,
            created_at: Utc::now(),
        }
    }

    fn sample_session() -> PaymentSessionEntity {
        let now = Utc::now();
        PaymentSessionEntity {
            id: 1,
            host_invoice_id: 55,
            family: "dynamic".to_string(),
            external_session_id: "sess_1".to_string(),
            network: "mainnet".to_string(),
            status: "pending".to_string(),
            amount_fiat: 25.0,
            currency: "USD".to_string(),
            amount_crypto: None,
            payment_url: "https://app.voltxt.io/pay/sess_1".to_string(),
            status_check_url: None,
            deposit_address: None,
            payment_tx_id: None,
            auto_process_tx_id: None,
            recorded_transaction_id: None,
            expires_at: Some(now + Duration::hours(12)),
            created_at: now,
            last_updated_at: now,
        }
    }

    fn completed_remote() -> RemoteSessionStatus {
        RemoteSessionStatus {
            status: SessionStatus::Completed,
            amount_fiat: Some(25.0),
            amount_crypto: Some(0.25),
            payment_tx_id: Some("tx_abc".to_string()),
            auto_process_tx_id: None,
            network: None,
        }
    }

    fn usecase(
        session_repo: MockPaymentSessionRepository,
        host_repo: MockHostInvoiceRepository,
        gateway: MockVoltxtGateway,
        log_repo: MockGatewayLogRepository,
    ) -> StatusRefreshUseCase<
        MockPaymentSessionRepository,
        MockHostInvoiceRepository,
        MockVoltxtGateway,
        MockGatewayLogRepository,
    > {
        StatusRefreshUseCase::new(
            Arc::new(session_repo),
            Arc::new(host_repo),
            Arc::new(gateway),
            Arc::new(log_repo),
        )
    }

    #[tokio::test]
    async fn completed_remote_status_records_payment_and_audits() {
        let mut session_repo = MockPaymentSessionRepository::new();
        let mut host_repo = MockHostInvoiceRepository::new();
        let mut gateway = MockVoltxtGateway::new();
        let mut log_repo = MockGatewayLogRepository::new();

        host_repo
            .expect_find_invoice()
            .with(eq(55))
            .returning(|_| Ok(Some(sample_invoice(INVOICE_STATUS_UNPAID))));
        session_repo
            .expect_find_active_by_invoice()
            .with(eq(55))
            .returning(|_| Ok(Some(sample_session())));
        gateway
            .expect_session_status()
            .withf(|family, id| *family == PaymentFamily::Dynamic && id == "sess_1")
            .returning(|_, _| Ok(completed_remote()));
        session_repo
            .expect_merge()
            .withf(|id, update| *id == 55 && update.status.as_deref() == Some("completed"))
            .times(1)
            .returning(|_, _| Ok(()));
        host_repo
            .expect_transaction_exists()
            .returning(|_| Ok(false));
        host_repo
            .expect_add_payment()
            .with(eq(55), eq("tx_abc"), eq(25.0), eq(0.0))
            .times(1)
            .returning(|_, _, _, _| Ok(()));
        host_repo
            .expect_send_payment_confirmation()
            .returning(|_| Ok(()));
        log_repo
            .expect_append()
            .withf(|entry| {
                entry.outcome == "recorded"
                    && entry.invoice_id == Some(55)
                    && entry.transaction_id.as_deref() == Some("tx_abc")
                    && entry.amount == Some(25.0)
            })
            .times(1)
            .returning(|_| Ok(1));
        session_repo
            .expect_merge()
            .withf(|id, update| {
                *id == 55 && update.recorded_transaction_id.as_deref() == Some("tx_abc")
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let outcome = usecase(session_repo, host_repo, gateway, log_repo)
            .refresh(55)
            .await
            .unwrap();
        assert_eq!(outcome.previous_status, SessionStatus::Pending);
        assert_eq!(outcome.new_status, SessionStatus::Completed);
        assert!(outcome.payment_recorded);
    }

    #[tokio::test]
    async fn pending_remote_status_merges_without_recording_or_audit() {
        let mut session_repo = MockPaymentSessionRepository::new();
        let mut host_repo = MockHostInvoiceRepository::new();
        let mut gateway = MockVoltxtGateway::new();
        let log_repo = MockGatewayLogRepository::new();

        host_repo
            .expect_find_invoice()
            .returning(|_| Ok(Some(sample_invoice(INVOICE_STATUS_UNPAID))));
        session_repo
            .expect_find_active_by_invoice()
            .returning(|_| Ok(Some(sample_session())));
        gateway.expect_session_status().returning(|_, _| {
            Ok(RemoteSessionStatus {
                status: SessionStatus::Pending,
                amount_fiat: None,
                amount_crypto: None,
                payment_tx_id: None,
                auto_process_tx_id: None,
                network: None,
            })
        });
        session_repo
            .expect_merge()
            .times(1)
            .returning(|_, _| Ok(()));

        let outcome = usecase(session_repo, host_repo, gateway, log_repo)
            .refresh(55)
            .await
            .unwrap();
        assert!(!outcome.payment_recorded);
        assert_eq!(outcome.new_status, SessionStatus::Pending);
    }

    #[tokio::test]
    async fn paid_invoice_never_double_records_but_still_audits() {
        let mut session_repo = MockPaymentSessionRepository::new();
        let mut host_repo = MockHostInvoiceRepository::new();
        let mut gateway = MockVoltxtGateway::new();
        let mut log_repo = MockGatewayLogRepository::new();

        host_repo
            .expect_find_invoice()
            .returning(|_| Ok(Some(sample_invoice(INVOICE_STATUS_PAID))));
        session_repo
            .expect_find_active_by_invoice()
            .returning(|_| Ok(Some(sample_session())));
        gateway
            .expect_session_status()
            .returning(|_, _| Ok(completed_remote()));
        session_repo
            .expect_merge()
            .times(1)
            .returning(|_, _| Ok(()));
        log_repo
            .expect_append()
            .withf(|entry| entry.outcome == "already_paid")
            .times(1)
            .returning(|_| Ok(1));

        let outcome = usecase(session_repo, host_repo, gateway, log_repo)
            .refresh(55)
            .await
            .unwrap();
        assert!(!outcome.payment_recorded);
    }

    #[tokio::test]
    async fn recording_failure_escalates_after_audit() {
        let mut session_repo = MockPaymentSessionRepository::new();
        let mut host_repo = MockHostInvoiceRepository::new();
        let mut gateway = MockVoltxtGateway::new();
        let mut log_repo = MockGatewayLogRepository::new();

        host_repo
            .expect_find_invoice()
            .returning(|_| Ok(Some(sample_invoice(INVOICE_STATUS_UNPAID))));
        session_repo
            .expect_find_active_by_invoice()
            .returning(|_| Ok(Some(sample_session())));
        gateway
            .expect_session_status()
            .returning(|_, _| Ok(completed_remote()));
        session_repo
            .expect_merge()
            .times(1)
            .returning(|_, _| Ok(()));
        host_repo
            .expect_transaction_exists()
            .returning(|_| Ok(false));
        host_repo
            .expect_add_payment()
            .returning(|_, _, _, _| Err(anyhow::anyhow!("deadlock detected")));
        log_repo
            .expect_append()
            .withf(|entry| entry.outcome == "recording_failed")
            .times(1)
            .returning(|_| Ok(1));

        let err = usecase(session_repo, host_repo, gateway, log_repo)
            .refresh(55)
            .await
            .unwrap_err();
        assert!(matches!(err, RefreshError::Recording(55, _)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn missing_session_is_not_found() {
        let mut session_repo = MockPaymentSessionRepository::new();
        let mut host_repo = MockHostInvoiceRepository::new();
        let gateway = MockVoltxtGateway::new();
        let log_repo = MockGatewayLogRepository::new();

        host_repo
            .expect_find_invoice()
            .returning(|_| Ok(Some(sample_invoice(INVOICE_STATUS_UNPAID))));
        session_repo
            .expect_find_active_by_invoice()
            .returning(|_| Ok(None));

        let err = usecase(session_repo, host_repo, gateway, log_repo)
            .refresh(55)
            .await
            .unwrap_err();
        assert!(matches!(err, RefreshError::SessionNotFound(55)));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn upstream_failure_is_bad_gateway() {
        let mut session_repo = MockPaymentSessionRepository::new();
        let mut host_repo = MockHostInvoiceRepository::new();
        let mut gateway = MockVoltxtGateway::new();
        let log_repo = MockGatewayLogRepository::new();

        host_repo
            .expect_find_invoice()
            .returning(|_| Ok(Some(sample_invoice(INVOICE_STATUS_UNPAID))));
        session_repo
            .expect_find_active_by_invoice()
            .returning(|_| Ok(Some(sample_session())));
        gateway.expect_session_status().returning(|_, _| {
            Err(VoltxtApiError::Api {
                code: "PAYMENT_NOT_FOUND".to_string(),
                message: "no such session".to_string(),
            })
        });

        let err = usecase(session_repo, host_repo, gateway, log_repo)
            .refresh(55)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }
}
