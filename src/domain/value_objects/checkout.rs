use serde::{Deserialize, Serialize};

use crate::domain::value_objects::enums::payment_families::PaymentFamily;

fn default_family() -> PaymentFamily {
    PaymentFamily::Dynamic
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub invoice_id: i64,
    #[serde(default = "default_family")]
    pub family: PaymentFamily,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutDto {
    pub invoice_id: i64,
    pub family: PaymentFamily,
    pub payment_url: String,
    /// True when an existing unexpired session was returned instead of a
    /// freshly created one.
    pub reused_session: bool,
}
