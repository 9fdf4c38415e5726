use serde::{Deserialize, Serialize};

use crate::domain::value_objects::enums::session_statuses::SessionStatus;

/// Body returned to the webhook sender. Senders retry on non-2xx, so every
/// processed delivery gets one of these even when the outcome was a no-op.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WebhookAck {
    pub fn recorded(invoice_id: i64) -> Self {
        Self {
            success: true,
            invoice_id: Some(invoice_id),
            error: None,
        }
    }

    pub fn acknowledged(invoice_id: i64) -> Self {
        Self {
            success: true,
            invoice_id: Some(invoice_id),
            error: None,
        }
    }

    pub fn failed(invoice_id: Option<i64>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            invoice_id,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshStatusRequest {
    pub invoice_id: i64,
}

/// Result of an admin-triggered status refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshOutcome {
    pub invoice_id: i64,
    pub previous_status: SessionStatus,
    pub new_status: SessionStatus,
    pub payment_recorded: bool,
}
