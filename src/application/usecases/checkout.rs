use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    application::voltxt_gateway::{CreateSessionRequest, VoltxtGateway},
    domain::{
        entities::{
            host_invoices::HostInvoiceEntity,
            payment_sessions::{InsertPaymentSessionEntity, PaymentSessionEntity},
        },
        repositories::{
            host_invoices::HostInvoiceRepository, payment_sessions::PaymentSessionRepository,
        },
        value_objects::{
            checkout::{CheckoutDto, CheckoutRequest},
            enums::{networks::Network, session_statuses::SessionStatus},
        },
    },
};

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("invoice {0} not found")]
    NotFound(i64),

    #[error("invoice {0} is already paid")]
    AlreadyPaid(i64),

    #[error("{0}")]
    Upstream(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CheckoutError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CheckoutError::NotFound(_) => StatusCode::NOT_FOUND,
            CheckoutError::AlreadyPaid(_) => StatusCode::BAD_REQUEST,
            CheckoutError::Upstream(_) => StatusCode::BAD_GATEWAY,
            CheckoutError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Hands the customer a payment URL for an invoice, reusing the active
/// session when it still matches what the invoice quotes and opening a
/// superseding one when it does not.
pub struct CheckoutUseCase<S, H, G>
where
    S: PaymentSessionRepository + Send + Sync + 'static,
    H: HostInvoiceRepository + Send + Sync + 'static,
    G: VoltxtGateway + 'static,
{
    payment_session_repository: Arc<S>,
    host_invoice_repository: Arc<H>,
    voltxt_gateway: Arc<G>,
    network: Network,
}

impl<S, H, G> CheckoutUseCase<S, H, G>
where
    S: PaymentSessionRepository + Send + Sync + 'static,
    H: HostInvoiceRepository + Send + Sync + 'static,
    G: VoltxtGateway + 'static,
{
    pub fn new(
        payment_session_repository: Arc<S>,
        host_invoice_repository: Arc<H>,
        voltxt_gateway: Arc<G>,
        network: Network,
    ) -> Self {
        Self {
            payment_session_repository,
            host_invoice_repository,
            voltxt_gateway,
            network,
        }
    }

    pub async fn checkout(&self, request: CheckoutRequest) -> Result<CheckoutDto, CheckoutError> {
        let invoice = self
            .host_invoice_repository
            .find_invoice(request.invoice_id)
            .await?
            .ok_or(CheckoutError::NotFound(request.invoice_id))?;

        if invoice.is_paid() {
            return Err(CheckoutError::AlreadyPaid(invoice.id));
        }

        let existing = self
            .payment_session_repository
            .find_active_by_invoice(invoice.id)
            .await?;

        if let Some(row) = existing {
            if self.can_reuse(&row, &invoice, &request) {
                info!(
                    invoice_id = invoice.id,
                    external_session_id = %row.external_session_id,
                    "checkout: reusing active session"
                );
                return Ok(CheckoutDto {
                    invoice_id: invoice.id,
                    family: request.family,
                    payment_url: row.payment_url,
                    reused_session: true,
                });
            }
            info!(
                invoice_id = invoice.id,
                external_session_id = %row.external_session_id,
                "checkout: active session no longer matches invoice, superseding"
            );
        }

        let create = CreateSessionRequest {
            invoice_id: invoice.id,
            customer_id: invoice.client_id,
            amount: invoice.total,
            currency: invoice.currency.clone(),
            description: format!("Invoice #{}", invoice.id),
            customer_email: invoice.client_email.clone(),
            customer_name: invoice.client_name.clone(),
        };
        let created = self
            .voltxt_gateway
            .create_session(request.family, &create)
            .await
            .map_err(|err| {
                warn!(
                    invoice_id = invoice.id,
                    api_error = %err,
                    "checkout: session creation failed"
                );
                CheckoutError::Upstream(err.user_message().to_string())
            })?;

        let row = InsertPaymentSessionEntity {
            host_invoice_id: invoice.id,
            family: request.family.as_str().to_string(),
            external_session_id: created.external_session_id.clone(),
            network: self.network.as_str().to_string(),
            status: SessionStatus::Pending.as_str().to_string(),
            amount_fiat: created.amount_fiat,
            currency: created.currency.clone(),
            amount_crypto: created.amount_crypto,
            payment_url: created.payment_url.clone(),
            status_check_url: created.status_check_url.clone(),
            deposit_address: created.deposit_address.clone(),
            payment_tx_id: None,
            auto_process_tx_id: None,
            expires_at: created.expires_at,
        };
        self.payment_session_repository.insert(row).await?;

        info!(
            invoice_id = invoice.id,
            external_session_id = %created.external_session_id,
            "checkout: new session opened"
        );

        Ok(CheckoutDto {
            invoice_id: invoice.id,
            family: request.family,
            payment_url: created.payment_url,
            reused_session: false,
        })
    }

    fn can_reuse(
        &self,
        row: &PaymentSessionEntity,
        invoice: &HostInvoiceEntity,
        request: &CheckoutRequest,
    ) -> bool {
        let still_open = matches!(
            SessionStatus::from_api(&row.status),
            Some(SessionStatus::Pending | SessionStatus::Received | SessionStatus::Partial)
        );
        still_open
            && row.is_reusable(
                request.family,
                invoice.total,
                &invoice.currency,
                self.network,
                Utc::now(),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use mockall::predicate::eq;

    use crate::{
        application::voltxt_gateway::{MockVoltxtGateway, SessionCreated, VoltxtApiError},
        domain::{
            entities::host_invoices::{INVOICE_STATUS_PAID, INVOICE_STATUS_UNPAID},
            repositories::{
                host_invoices::MockHostInvoiceRepository,
                payment_sessions::MockPaymentSessionRepository,
            },
            value_objects::enums::payment_families::PaymentFamily,
        },
    };

    fn sample_invoice(status: &str, total: f64) -> HostInvoiceEntity {
        HostInvoiceEntity {
            id: 55,
            client_id: 7,
            client_name: "Ada Lovelace".to_string(),
            client_email: "ada@example.com".to_string(),
            status: status.to_string(),
            total,
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
            amount_fiat: 50.0,
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

    fn sample_created() -> SessionCreated {
        SessionCreated {
            external_session_id: "sess_2".to_string(),
            payment_url: "https://app.voltxt.io/pay/sess_2".to_string(),
            status_check_url: None,
            deposit_address: None,
            amount_fiat: 60.0,
            currency: "USD".to_string(),
            amount_crypto: None,
            expires_at: Some(Utc::now() + Duration::hours(24)),
        }
    }

    fn dynamic_request() -> CheckoutRequest {
        CheckoutRequest {
            invoice_id: 55,
            family: PaymentFamily::Dynamic,
        }
    }

    fn usecase(
        session_repo: MockPaymentSessionRepository,
        host_repo: MockHostInvoiceRepository,
        gateway: MockVoltxtGateway,
    ) -> CheckoutUseCase<MockPaymentSessionRepository, MockHostInvoiceRepository, MockVoltxtGateway>
    {
        CheckoutUseCase::new(
            Arc::new(session_repo),
            Arc::new(host_repo),
            Arc::new(gateway),
            Network::Mainnet,
        )
    }

    #[tokio::test]
    async fn matching_session_is_reused() {
        let mut session_repo = MockPaymentSessionRepository::new();
        let mut host_repo = MockHostInvoiceRepository::new();
        let gateway = MockVoltxtGateway::new();

        host_repo
            .expect_find_invoice()
            .with(eq(55))
            .returning(|_| Ok(Some(sample_invoice(INVOICE_STATUS_UNPAID, 50.0))));
        session_repo
            .expect_find_active_by_invoice()
            .returning(|_| Ok(Some(sample_session())));

        let dto = usecase(session_repo, host_repo, gateway)
            .checkout(dynamic_request())
            .await
            .unwrap();
        assert!(dto.reused_session);
        assert_eq!(dto.payment_url, "https://app.voltxt.io/pay/sess_1");
    }

    #[tokio::test]
    async fn amount_change_supersedes_session() {
        let mut session_repo = MockPaymentSessionRepository::new();
        let mut host_repo = MockHostInvoiceRepository::new();
        let mut gateway = MockVoltxtGateway::new();

        host_repo
            .expect_find_invoice()
            .returning(|_| Ok(Some(sample_invoice(INVOICE_STATUS_UNPAID, 60.0))));
        session_repo
            .expect_find_active_by_invoice()
            .returning(|_| Ok(Some(sample_session())));
        gateway
            .expect_create_session()
            .withf(|family, request| {
                *family == PaymentFamily::Dynamic && request.amount == 60.0
            })
            .times(1)
            .returning(|_, _| Ok(sample_created()));
        session_repo
            .expect_insert()
            .withf(|row| row.external_session_id == "sess_2" && row.amount_fiat == 60.0)
            .times(1)
            .returning(|_| Ok(2));

        let dto = usecase(session_repo, host_repo, gateway)
            .checkout(dynamic_request())
            .await
            .unwrap();
        assert!(!dto.reused_session);
        assert_eq!(dto.payment_url, "https://app.voltxt.io/pay/sess_2");
    }

    #[tokio::test]
    async fn expired_session_forces_a_new_one() {
        let mut session_repo = MockPaymentSessionRepository::new();
        let mut host_repo = MockHostInvoiceRepository::new();
        let mut gateway = MockVoltxtGateway::new();

        let mut stale = sample_session();
        stale.expires_at = Some(Utc::now() - Duration::minutes(5));

        host_repo
            .expect_find_invoice()
            .returning(|_| Ok(Some(sample_invoice(INVOICE_STATUS_UNPAID, 50.0))));
        session_repo
            .expect_find_active_by_invoice()
            .returning(move |_| Ok(Some(stale.clone())));
        gateway
            .expect_create_session()
            .times(1)
            .returning(|_, _| Ok(sample_created()));
        session_repo.expect_insert().returning(|_| Ok(2));

        let dto = usecase(session_repo, host_repo, gateway)
            .checkout(dynamic_request())
            .await
            .unwrap();
        assert!(!dto.reused_session);
    }

    #[tokio::test]
    async fn paid_invoice_is_rejected() {
        let session_repo = MockPaymentSessionRepository::new();
        let mut host_repo = MockHostInvoiceRepository::new();
        let gateway = MockVoltxtGateway::new();

        host_repo
            .expect_find_invoice()
            .returning(|_| Ok(Some(sample_invoice(INVOICE_STATUS_PAID, 50.0))));

        let err = usecase(session_repo, host_repo, gateway)
            .checkout(dynamic_request())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::AlreadyPaid(55)));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn upstream_failure_maps_to_bad_gateway_with_sanitized_message() {
        let mut session_repo = MockPaymentSessionRepository::new();
        let mut host_repo = MockHostInvoiceRepository::new();
        let mut gateway = MockVoltxtGateway::new();

        host_repo
            .expect_find_invoice()
            .returning(|_| Ok(Some(sample_invoice(INVOICE_STATUS_UNPAID, 50.0))));
        session_repo
            .expect_find_active_by_invoice()
            .returning(|_| Ok(None));
        gateway.expect_create_session().returning(|_, _| {
            Err(VoltxtApiError::Connection("dns lookup failed".to_string()))
        });

        let err = usecase(session_repo, host_repo, gateway)
            .checkout(dynamic_request())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        // Raw transport details stay out of the customer-facing message.
        assert!(!err.to_string().contains("dns"));
    }
}
