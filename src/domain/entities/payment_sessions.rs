use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::{
    domain::value_objects::enums::{networks::Network, payment_families::PaymentFamily},
    infrastructure::postgres::schema::payment_sessions,
};

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = payment_sessions)]
pub struct PaymentSessionEntity {
    pub id: i64,
    pub host_invoice_id: i64,
    pub family: String,
    pub external_session_id: String,
    pub network: String,
    pub status: String,
    pub amount_fiat: f64,
    pub currency: String,
    pub amount_crypto: Option<f64>,
    pub payment_url: String,
    pub status_check_url: Option<String>,
    pub deposit_address: Option<String>,
    pub payment_tx_id: Option<String>,
    pub auto_process_tx_id: Option<String>,
    pub recorded_transaction_id: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

impl PaymentSessionEntity {
    /// A stored session may be handed back to the customer only while it
    /// still matches what the host invoice quotes today. Any mismatch forces
    /// a superseding session.
    pub fn is_reusable(
        &self,
        family: PaymentFamily,
        invoice_amount: f64,
        invoice_currency: &str,
        network: Network,
        now: DateTime<Utc>,
    ) -> bool {
        if self.family != family.as_str() {
            return false;
        }
        if self.network != network.as_str() {
            return false;
        }
        if self.amount_fiat != invoice_amount || self.currency != invoice_currency {
            return false;
        }
        match self.expires_at {
            Some(expires_at) => expires_at > now,
            None => true,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = payment_sessions)]
pub struct InsertPaymentSessionEntity {
    pub host_invoice_id: i64,
    pub family: String,
    pub external_session_id: String,
    pub network: String,
    pub status: String,
    pub amount_fiat: f64,
    pub currency: String,
    pub amount_crypto: Option<f64>,
    pub payment_url: String,
    pub status_check_url: Option<String>,
    pub deposit_address: Option<String>,
    pub payment_tx_id: Option<String>,
    pub auto_process_tx_id: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Partial update merged into the newest session row of an invoice.
/// `None` fields are left untouched.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = payment_sessions)]
pub struct UpdatePaymentSessionEntity {
    pub status: Option<String>,
    pub amount_crypto: Option<f64>,
    pub payment_tx_id: Option<String>,
    pub auto_process_tx_id: Option<String>,
    pub recorded_transaction_id: Option<String>,
    pub last_updated_at: Option<DateTime<Utc>>,
}
