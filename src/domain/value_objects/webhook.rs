use serde::{Deserialize, Serialize};

use crate::domain::value_objects::enums::{
    networks::Network, payment_families::PaymentFamily, session_statuses::SessionStatus,
};

/// Literal prefix VOLTXT puts in front of the host invoice id when echoing
/// back `external_payment_id` / `external_invoice_id`.
pub const EXTERNAL_ID_PREFIX: &str = "whmcs_invoice_";

/// Event types accepted on traditional webhooks.
const TRADITIONAL_EVENT_TYPES: [&str; 5] = [
    "payment_received",
    "partial_payment_received",
    "payment_completed",
    "payment_expired",
    "overpayment_detected",
];

/// Raw inbound webhook body. Dynamic and traditional deliveries share one
/// shape; the family is decided by which identifier field is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub event_type: Option<String>,
    pub session_id: Option<String>,
    pub external_payment_id: Option<String>,
    pub external_invoice_id: Option<String>,
    pub invoice_number: Option<String>,
    pub status: Option<String>,
    pub network: Option<String>,
    pub amount_fiat: Option<f64>,
    pub amount: Option<f64>,
    pub payment_tx_id: Option<String>,
    pub auto_process_tx_id: Option<String>,
    pub metadata: Option<WebhookMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookMetadata {
    pub invoice_id: Option<i64>,
}

/// Payload after family classification and required-field validation.
#[derive(Debug, Clone)]
pub struct ValidatedWebhook {
    pub family: PaymentFamily,
    pub host_invoice_id: i64,
    pub event_type: String,
    pub status: SessionStatus,
    pub network: Network,
    pub external_session_id: String,
}

impl WebhookPayload {
    /// Dynamic deliveries carry a `session_id`; everything else is treated
    /// as the traditional invoice flow.
    pub fn family(&self) -> PaymentFamily {
        if self.session_id.is_some() {
            PaymentFamily::Dynamic
        } else {
            PaymentFamily::Traditional
        }
    }

    pub fn validate(&self) -> Result<ValidatedWebhook, String> {
        match self.family() {
            PaymentFamily::Dynamic => self.validate_dynamic(),
            PaymentFamily::Traditional => self.validate_traditional(),
        }
    }

    fn validate_dynamic(&self) -> Result<ValidatedWebhook, String> {
        let mut missing = Vec::new();
        if is_blank(&self.event_type) {
            missing.push("event_type");
        }
        if is_blank(&self.session_id) {
            missing.push("session_id");
        }
        if is_blank(&self.external_payment_id) {
            missing.push("external_payment_id");
        }
        if is_blank(&self.network) {
            missing.push("network");
        }
        if !missing.is_empty() {
            return Err(format!("missing required fields: {}", missing.join(", ")));
        }

        let external_id = self.external_payment_id.as_deref().unwrap_or_default();
        let host_invoice_id = self.resolve_invoice_id(external_id)?;
        let network = parse_network(self.network.as_deref())?;
        let event_type = self.event_type.clone().unwrap_or_default();
        let status = self.effective_status(&event_type)?;

        Ok(ValidatedWebhook {
            family: PaymentFamily::Dynamic,
            host_invoice_id,
            event_type,
            status,
            network,
            external_session_id: self.session_id.clone().unwrap_or_default(),
        })
    }

    fn validate_traditional(&self) -> Result<ValidatedWebhook, String> {
        let mut missing = Vec::new();
        if is_blank(&self.event_type) {
            missing.push("event_type");
        }
        if is_blank(&self.external_invoice_id) {
            missing.push("external_invoice_id");
        }
        if is_blank(&self.invoice_number) {
            missing.push("invoice_number");
        }
        if is_blank(&self.status) {
            missing.push("status");
        }
        if is_blank(&self.network) {
            missing.push("network");
        }
        if !missing.is_empty() {
            return Err(format!("missing required fields: {}", missing.join(", ")));
        }

        let event_type = self.event_type.clone().unwrap_or_default();
        if !TRADITIONAL_EVENT_TYPES.contains(&event_type.as_str()) {
            return Err(format!("invalid event_type: {event_type}"));
        }

        let external_id = self.external_invoice_id.as_deref().unwrap_or_default();
        let host_invoice_id = self.resolve_invoice_id(external_id)?;
        let network = parse_network(self.network.as_deref())?;
        let status = self.effective_status(&event_type)?;

        Ok(ValidatedWebhook {
            family: PaymentFamily::Traditional,
            host_invoice_id,
            event_type,
            status,
            network,
            external_session_id: self.invoice_number.clone().unwrap_or_default(),
        })
    }

    /// Strips the host prefix from the external id; falls back to
    /// `metadata.invoice_id` when the prefixed id is unparsable but the
    /// prefix convention itself was honored.
    fn resolve_invoice_id(&self, external_id: &str) -> Result<i64, String> {
        let Some(raw) = external_id.strip_prefix(EXTERNAL_ID_PREFIX) else {
            return Err(format!(
                "external id {external_id:?} does not start with {EXTERNAL_ID_PREFIX:?}"
            ));
        };

        if let Ok(id) = raw.parse::<i64>() {
            if id > 0 {
                return Ok(id);
            }
        }

        if let Some(id) = self.metadata.as_ref().and_then(|m| m.invoice_id) {
            if id > 0 {
                return Ok(id);
            }
        }

        Err(format!("no host invoice id resolvable from {external_id:?}"))
    }

    /// Explicit `status` wins over the event-type mapping when present.
    fn effective_status(&self, event_type: &str) -> Result<SessionStatus, String> {
        if let Some(raw) = self.status.as_deref() {
            if let Some(status) = SessionStatus::from_api(raw) {
                return Ok(status);
            }
            return Err(format!("unknown status value: {raw}"));
        }
        SessionStatus::from_event(event_type)
            .ok_or_else(|| format!("unknown event_type: {event_type}"))
    }

    /// Amount priority: explicit fiat, then explicit crypto/generic amount.
    /// The stored session amount is the caller's last resort.
    pub fn payload_amount(&self) -> Option<f64> {
        match self.amount_fiat {
            Some(v) if v > 0.0 => Some(v),
            _ => match self.amount {
                Some(v) if v > 0.0 => Some(v),
                _ => None,
            },
        }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).unwrap_or("").is_empty()
}

fn parse_network(value: Option<&str>) -> Result<Network, String> {
    let raw = value.unwrap_or_default();
    Network::from_str(raw).ok_or_else(|| format!("invalid network value: {raw}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dynamic_payload() -> WebhookPayload {
        WebhookPayload {
            event_type: Some("payment_completed".to_string()),
            session_id: Some("sess_1".to_string()),
            external_payment_id: Some("whmcs_invoice_482".to_string()),
            external_invoice_id: None,
            invoice_number: None,
            status: None,
            network: Some("mainnet".to_string()),
            amount_fiat: Some(50.0),
            amount: Some(0.5),
            payment_tx_id: Some("tx_abc".to_string()),
            auto_process_tx_id: None,
            metadata: None,
        }
    }

    fn traditional_payload() -> WebhookPayload {
        WebhookPayload {
            event_type: Some("payment_completed".to_string()),
            session_id: None,
            external_payment_id: None,
            external_invoice_id: Some("whmcs_invoice_482".to_string()),
            invoice_number: Some("VTX-1001".to_string()),
            status: Some("paid".to_string()),
            network: Some("testnet".to_string()),
            amount_fiat: None,
            amount: Some(1.2),
            payment_tx_id: None,
            auto_process_tx_id: None,
            metadata: None,
        }
    }

    #[test]
    fn classifies_by_session_id_presence() {
        assert_eq!(dynamic_payload().family(), PaymentFamily::Dynamic);
        assert_eq!(traditional_payload().family(), PaymentFamily::Traditional);
    }

    #[test]
    fn prefixed_external_id_resolves_invoice() {
        let validated = dynamic_payload().validate().unwrap();
        assert_eq!(validated.host_invoice_id, 482);
        assert_eq!(validated.status, SessionStatus::Completed);
        assert_eq!(validated.network, Network::Mainnet);
    }

    #[test]
    fn unprefixed_external_id_is_rejected() {
        let mut payload = dynamic_payload();
        payload.external_payment_id = Some("482".to_string());
        let err = payload.validate().unwrap_err();
        assert!(err.contains("whmcs_invoice_"));
    }

    #[test]
    fn metadata_invoice_id_is_fallback() {
        let mut payload = dynamic_payload();
        payload.external_payment_id = Some("whmcs_invoice_".to_string());
        payload.metadata = Some(WebhookMetadata {
            invoice_id: Some(99),
        });
        assert_eq!(payload.validate().unwrap().host_invoice_id, 99);
    }

    #[test]
    fn missing_dynamic_fields_are_reported() {
        let mut payload = dynamic_payload();
        payload.event_type = None;
        payload.network = Some(String::new());
        let err = payload.validate().unwrap_err();
        assert!(err.contains("event_type"));
        assert!(err.contains("network"));
    }

    #[test]
    fn unknown_network_is_rejected() {
        let mut payload = traditional_payload();
        payload.network = Some("devnet".to_string());
        assert!(payload.validate().unwrap_err().contains("network"));
    }

    #[test]
    fn traditional_event_type_allow_list_enforced() {
        let mut payload = traditional_payload();
        payload.event_type = Some("refund_issued".to_string());
        assert!(payload.validate().unwrap_err().contains("event_type"));
    }

    #[test]
    fn explicit_status_wins_over_event_type() {
        let mut payload = traditional_payload();
        payload.event_type = Some("payment_received".to_string());
        payload.status = Some("auto_processed".to_string());
        let validated = payload.validate().unwrap();
        assert_eq!(validated.status, SessionStatus::Completed);
    }

    #[test]
    fn fiat_amount_takes_priority() {
        let payload = dynamic_payload();
        assert_eq!(payload.payload_amount(), Some(50.0));

        let mut crypto_only = dynamic_payload();
        crypto_only.amount_fiat = None;
        assert_eq!(crypto_only.payload_amount(), Some(0.5));

        let mut none = dynamic_payload();
        none.amount_fiat = Some(0.0);
        none.amount = None;
        assert_eq!(none.payload_amount(), None);
    }
}
