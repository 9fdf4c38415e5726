use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};

use crate::{
    application::voltxt_gateway::{
        ConnectionSummary, CreateSessionRequest, RemoteSessionStatus, SessionCreated,
        VoltxtApiError, VoltxtGateway,
    },
    config::config_model::Voltxt,
    domain::value_objects::enums::{
        networks::Network, payment_families::PaymentFamily, session_statuses::SessionStatus,
    },
};

const PLATFORM: &str = "whmcs";
const GATEWAY_VERSION: &str = "2.0.0";

/// The service returns URLs on its API domain; customers are sent to the app
/// domain instead. Rewriting happens here, once, so stored records always
/// carry customer-facing URLs.
const API_DOMAIN: &str = "api.voltxt.io";
const APP_DOMAIN: &str = "app.voltxt.io";

/// VOLTXT API client built on reqwest. Single-attempt calls with a connect
/// timeout and a total timeout; no retry.
pub struct VoltxtClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    network: Network,
    expiry_hours: u32,
    system_url: String,
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    success: Option<bool>,
    message: Option<String>,
    error: Option<String>,
    error_code: Option<String>,
    data: Option<serde_json::Value>,
    invoice: Option<serde_json::Value>,
    session: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct DynamicSessionBody {
    session_id: String,
    payment_url: String,
    status_check_url: Option<String>,
    deposit_address: Option<String>,
    amount_fiat: Option<f64>,
    fiat_currency: Option<String>,
    amount_sol: Option<f64>,
    expiry_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TraditionalInvoiceBody {
    invoice_number: String,
    payment_url: String,
    status_check_url: Option<String>,
    amount_fiat: Option<f64>,
    fiat_currency: Option<String>,
    amount_crypto: Option<f64>,
    expiry_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RemoteStatusBody {
    status: String,
    amount_fiat: Option<f64>,
    amount_sol: Option<f64>,
    amount_crypto: Option<f64>,
    payment_tx_id: Option<String>,
    auto_process_tx_id: Option<String>,
    network: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ConnectionBody {
    #[serde(default)]
    store: ConnectionStore,
    #[serde(default)]
    user: ConnectionUser,
}

#[derive(Debug, Deserialize, Default)]
struct ConnectionStore {
    name: Option<String>,
    #[serde(default)]
    has_destination_wallet: bool,
}

#[derive(Debug, Deserialize, Default)]
struct ConnectionUser {
    email: Option<String>,
}

impl VoltxtClient {
    pub fn new(config: &Voltxt) -> Result<Self, VoltxtApiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(|err| VoltxtApiError::Connection(err.to_string()))?;

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            network: config.network,
            expiry_hours: config.expiry_hours.clamp(1, 168),
            system_url: config.system_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// API key with the middle masked, for operator logs.
    pub fn masked_api_key(&self) -> String {
        let chars: Vec<char> = self.api_key.chars().collect();
        if chars.len() <= 8 {
            return "*".repeat(chars.len());
        }
        let prefix: String = chars[..4].iter().collect();
        let suffix: String = chars[chars.len() - 4..].iter().collect();
        format!("{prefix}{}{suffix}", "*".repeat(chars.len() - 8))
    }

    fn invoice_view_url(&self, invoice_id: i64) -> String {
        format!("{}/viewinvoice.php?id={invoice_id}", self.system_url)
    }

    fn callback_url(&self) -> String {
        format!("{}/api/v1/webhooks/voltxt", self.system_url)
    }

    fn create_payload(
        &self,
        family: PaymentFamily,
        request: &CreateSessionRequest,
    ) -> serde_json::Value {
        let external_id_field = match family {
            PaymentFamily::Dynamic => "external_payment_id",
            PaymentFamily::Traditional => "external_invoice_id",
        };
        let return_url = self.invoice_view_url(request.invoice_id);

        json!({
            "api_key": self.api_key,
            "network": self.network.as_str(),
            "platform": PLATFORM,
            external_id_field: format!(
                "{}{}",
                crate::domain::value_objects::webhook::EXTERNAL_ID_PREFIX,
                request.invoice_id
            ),
            "amount_type": "fiat",
            "amount": request.amount,
            "fiat_currency": request.currency,
            "expiry_hours": self.expiry_hours,
            "description": request.description,
            "customer_email": request.customer_email,
            "customer_name": request.customer_name,
            "callback_url": self.callback_url(),
            "success_url": return_url,
            "cancel_url": return_url,
            "metadata": {
                "invoice_id": request.invoice_id,
                "customer_id": request.customer_id,
                "site_url": self.system_url,
                "network": self.network.as_str(),
                "platform": PLATFORM,
                "gateway_version": GATEWAY_VERSION,
                "payment_type": family.as_str(),
                "created_at": Utc::now().to_rfc3339(),
            },
        })
    }

    async fn post(
        &self,
        endpoint: &str,
        payload: &serde_json::Value,
    ) -> Result<ApiEnvelope, VoltxtApiError> {
        let url = format!("{}{endpoint}", self.api_url);
        debug!(%url, api_key = %self.masked_api_key(), "voltxt_api: POST");
        let response = self
            .http
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|err| VoltxtApiError::Connection(err.to_string()))?;
        Self::decode(response).await
    }

    async fn get(&self, endpoint: &str) -> Result<ApiEnvelope, VoltxtApiError> {
        let url = format!(
            "{}{endpoint}?api_key={}",
            self.api_url,
            urlencode(&self.api_key)
        );
        debug!(endpoint, api_key = %self.masked_api_key(), "voltxt_api: GET");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| VoltxtApiError::Connection(err.to_string()))?;
        Self::decode(response).await
    }

    async fn decode(response: reqwest::Response) -> Result<ApiEnvelope, VoltxtApiError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| VoltxtApiError::Connection(err.to_string()))?;

        let envelope: ApiEnvelope = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(err) => {
                // Truncate the raw body before it reaches any log sink.
                error!(
                    http_status = status.as_u16(),
                    raw = %truncate_for_log(&body, 500),
                    "voltxt_api: non-JSON response"
                );
                return Err(VoltxtApiError::Protocol(err.to_string()));
            }
        };

        if status.as_u16() >= 400 {
            let message = envelope
                .message
                .or(envelope.error)
                .unwrap_or_else(|| format!("HTTP error {}", status.as_u16()));
            let code = envelope
                .error_code
                .unwrap_or_else(|| format!("HTTP_{}", status.as_u16()));
            error!(code = %code, message = %message, "voltxt_api: http error");
            return Err(VoltxtApiError::Api { code, message });
        }

        if envelope.success == Some(false) {
            let message = envelope
                .message
                .clone()
                .or(envelope.error.clone())
                .unwrap_or_else(|| "API request failed".to_string());
            let code = envelope
                .error_code
                .clone()
                .unwrap_or_else(|| "API_ERROR".to_string());
            error!(code = %code, message = %message, "voltxt_api: application error");
            return Err(VoltxtApiError::Api { code, message });
        }

        Ok(envelope)
    }

    fn parse_expiry(raw: Option<String>) -> Option<DateTime<Utc>> {
        raw.and_then(|value| {
            DateTime::parse_from_rfc3339(&value)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        })
    }

    fn body_field(
        envelope: ApiEnvelope,
        family: PaymentFamily,
    ) -> Result<serde_json::Value, VoltxtApiError> {
        let value = match family {
            PaymentFamily::Dynamic => envelope.data.or(envelope.session),
            PaymentFamily::Traditional => envelope.invoice,
        };
        value.ok_or_else(|| VoltxtApiError::Protocol("missing response body".to_string()))
    }
}

/// Swaps the API domain for the customer-facing app domain. Traditional
/// invoice URLs additionally move from `/invoice/` to `/pay/`. Status-check
/// URLs stay on the API domain.
pub fn rewrite_payment_url(url: &str, family: PaymentFamily) -> String {
    let rewritten = url.replace(API_DOMAIN, APP_DOMAIN);
    match family {
        PaymentFamily::Dynamic => rewritten,
        PaymentFamily::Traditional => rewritten.replace("/invoice/", "/pay/"),
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

fn urlencode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}

#[async_trait]
impl VoltxtGateway for VoltxtClient {
    async fn create_session(
        &self,
        family: PaymentFamily,
        request: &CreateSessionRequest,
    ) -> Result<SessionCreated, VoltxtApiError> {
        let endpoint = match family {
            PaymentFamily::Dynamic => "/api/dynamic-payment/initiate",
            PaymentFamily::Traditional => "/api/plugin/invoice/create",
        };
        let payload = self.create_payload(family, request);
        let envelope = self.post(endpoint, &payload).await?;
        let body = Self::body_field(envelope, family)?;

        let created = match family {
            PaymentFamily::Dynamic => {
                let session: DynamicSessionBody = serde_json::from_value(body)
                    .map_err(|err| VoltxtApiError::Protocol(err.to_string()))?;
                SessionCreated {
                    external_session_id: session.session_id,
                    payment_url: rewrite_payment_url(&session.payment_url, family),
                    status_check_url: session.status_check_url,
                    deposit_address: session.deposit_address,
                    amount_fiat: session.amount_fiat.unwrap_or(request.amount),
                    currency: session
                        .fiat_currency
                        .unwrap_or_else(|| request.currency.clone()),
                    amount_crypto: session.amount_sol,
                    expires_at: Self::parse_expiry(session.expiry_date),
                }
            }
            PaymentFamily::Traditional => {
                let invoice: TraditionalInvoiceBody = serde_json::from_value(body)
                    .map_err(|err| VoltxtApiError::Protocol(err.to_string()))?;
                SessionCreated {
                    external_session_id: invoice.invoice_number,
                    payment_url: rewrite_payment_url(&invoice.payment_url, family),
                    status_check_url: invoice.status_check_url,
                    deposit_address: None,
                    amount_fiat: invoice.amount_fiat.unwrap_or(request.amount),
                    currency: invoice
                        .fiat_currency
                        .unwrap_or_else(|| request.currency.clone()),
                    amount_crypto: invoice.amount_crypto,
                    expires_at: Self::parse_expiry(invoice.expiry_date),
                }
            }
        };

        Ok(created)
    }

    async fn session_status(
        &self,
        family: PaymentFamily,
        external_session_id: &str,
    ) -> Result<RemoteSessionStatus, VoltxtApiError> {
        let endpoint = match family {
            PaymentFamily::Dynamic => {
                format!("/api/dynamic-payment/{}/status", urlencode(external_session_id))
            }
            PaymentFamily::Traditional => {
                format!("/api/plugin/invoice/{}/status", urlencode(external_session_id))
            }
        };

        let envelope = self.get(&endpoint).await?;
        let body = Self::body_field(envelope, family)?;
        let raw: RemoteStatusBody = serde_json::from_value(body)
            .map_err(|err| VoltxtApiError::Protocol(err.to_string()))?;

        let status = SessionStatus::from_api(&raw.status)
            .ok_or_else(|| VoltxtApiError::Protocol(format!("unknown status {:?}", raw.status)))?;

        Ok(RemoteSessionStatus {
            status,
            amount_fiat: raw.amount_fiat,
            amount_crypto: raw.amount_crypto.or(raw.amount_sol),
            payment_tx_id: raw.payment_tx_id,
            auto_process_tx_id: raw.auto_process_tx_id,
            network: raw.network.as_deref().and_then(Network::from_str),
        })
    }

    async fn test_connection(&self, store_name: &str) -> Result<ConnectionSummary, VoltxtApiError> {
        let payload = json!({
            "api_key": self.api_key,
            "store_name": store_name,
            "network": self.network.as_str(),
            "platform": PLATFORM,
            "version": GATEWAY_VERSION,
        });

        let envelope = self.post("/api/plugin/test-connection", &payload).await?;
        let body: ConnectionBody = envelope
            .data
            .map(serde_json::from_value)
            .transpose()
            .map_err(|err| VoltxtApiError::Protocol(err.to_string()))?
            .unwrap_or_default();

        Ok(ConnectionSummary {
            store_name: body.store.name,
            account_email: body.user.email,
            has_destination_wallet: body.store.has_destination_wallet,
            network: self.network,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dynamic_urls_move_to_app_domain() {
        let url = "https://api.voltxt.io/session/sess_1";
        assert_eq!(
            rewrite_payment_url(url, PaymentFamily::Dynamic),
            "https://app.voltxt.io/session/sess_1"
        );
    }

    #[test]
    fn traditional_urls_also_move_to_pay_path() {
        let url = "https://api.voltxt.io/invoice/VTX-1001";
        assert_eq!(
            rewrite_payment_url(url, PaymentFamily::Traditional),
            "https://app.voltxt.io/pay/VTX-1001"
        );
    }

    #[test]
    fn masked_key_keeps_edges() {
        let client = VoltxtClient::new(&Voltxt {
            api_url: "https://api.voltxt.io".to_string(),
            api_key: "vtx_1234567890ab".to_string(),
            network: Network::Testnet,
            expiry_hours: 24,
            connect_timeout: 10,
            timeout: 30,
            system_url: "https://billing.example.com".to_string(),
        })
        .unwrap();

        assert_eq!(client.masked_api_key(), "vtx_******90ab");
    }

    #[test]
    fn masked_key_handles_multibyte_keys() {
        let client = VoltxtClient::new(&Voltxt {
            api_url: "https://api.voltxt.io".to_string(),
            api_key: "ключ-секрет-1234".to_string(),
            network: Network::Testnet,
            expiry_hours: 24,
            connect_timeout: 10,
            timeout: 30,
            system_url: "https://billing.example.com".to_string(),
        })
        .unwrap();

        assert_eq!(client.masked_api_key(), "ключ********1234");
    }

    #[test]
    fn raw_body_excerpt_respects_char_boundaries() {
        let body = "é".repeat(400);
        let excerpt = truncate_for_log(&body, 500);
        assert!(excerpt.len() <= 500);
        assert!(body.starts_with(excerpt));
    }

    #[test]
    fn expiry_hours_are_clamped() {
        let client = VoltxtClient::new(&Voltxt {
            api_url: "https://api.voltxt.io/".to_string(),
            api_key: "k".to_string(),
            network: Network::Mainnet,
            expiry_hours: 500,
            connect_timeout: 10,
            timeout: 30,
            system_url: "https://billing.example.com/".to_string(),
        })
        .unwrap();

        assert_eq!(client.expiry_hours, 168);
        assert_eq!(client.api_url, "https://api.voltxt.io");
    }
}
