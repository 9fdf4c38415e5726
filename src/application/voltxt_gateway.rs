use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::value_objects::enums::{
    networks::Network, payment_families::PaymentFamily, session_statuses::SessionStatus,
};

/// Transport/protocol/application failures from the VOLTXT API. There is no
/// retry at this layer: a transport failure surfaces immediately.
#[derive(Debug, Error)]
pub enum VoltxtApiError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("invalid response from payment service: {0}")]
    Protocol(String),

    #[error("api error {code}: {message}")]
    Api { code: String, message: String },
}

impl VoltxtApiError {
    /// Sanitized message safe to show an end customer. Raw codes and
    /// messages are for operator logs only.
    pub fn user_message(&self) -> &'static str {
        match self {
            VoltxtApiError::Connection(_) => {
                crate::infrastructure::voltxt_api::error_messages::lookup("CONNECTION_ERROR")
            }
            VoltxtApiError::Protocol(_) => {
                crate::infrastructure::voltxt_api::error_messages::lookup("JSON_DECODE_ERROR")
            }
            VoltxtApiError::Api { code, .. } => {
                crate::infrastructure::voltxt_api::error_messages::lookup(code)
            }
        }
    }
}

/// Everything the API needs to open a payment session for a host invoice.
#[derive(Debug, Clone)]
pub struct CreateSessionRequest {
    pub invoice_id: i64,
    pub customer_id: i64,
    pub amount: f64,
    pub currency: String,
    pub description: String,
    pub customer_email: String,
    pub customer_name: String,
}

/// Session/invoice as returned by the create endpoints, URLs already
/// rewritten to the customer-facing domain.
#[derive(Debug, Clone)]
pub struct SessionCreated {
    pub external_session_id: String,
    pub payment_url: String,
    pub status_check_url: Option<String>,
    pub deposit_address: Option<String>,
    pub amount_fiat: f64,
    pub currency: String,
    pub amount_crypto: Option<f64>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Point-in-time status snapshot from the status endpoints.
#[derive(Debug, Clone)]
pub struct RemoteSessionStatus {
    pub status: SessionStatus,
    pub amount_fiat: Option<f64>,
    pub amount_crypto: Option<f64>,
    pub payment_tx_id: Option<String>,
    pub auto_process_tx_id: Option<String>,
    pub network: Option<Network>,
}

#[derive(Debug, Clone)]
pub struct ConnectionSummary {
    pub store_name: Option<String>,
    pub account_email: Option<String>,
    pub has_destination_wallet: bool,
    pub network: Network,
}

/// Outbound seam to VOLTXT. The concrete client lives in
/// `infrastructure::voltxt_api`; usecases depend on this trait so tests can
/// mock the payment service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoltxtGateway: Send + Sync {
    async fn create_session(
        &self,
        family: PaymentFamily,
        request: &CreateSessionRequest,
    ) -> Result<SessionCreated, VoltxtApiError>;

    async fn session_status(
        &self,
        family: PaymentFamily,
        external_session_id: &str,
    ) -> Result<RemoteSessionStatus, VoltxtApiError>;

    async fn test_connection(&self, store_name: &str) -> Result<ConnectionSummary, VoltxtApiError>;
}
