use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::infrastructure::postgres::schema::{host_invoices, invoice_transactions};

pub const INVOICE_STATUS_UNPAID: &str = "Unpaid";
pub const INVOICE_STATUS_PAID: &str = "Paid";

/// Gateway name transactions are filed under on the host platform.
pub const GATEWAY_NAME: &str = "voltxt";

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = host_invoices)]
pub struct HostInvoiceEntity {
    pub id: i64,
    pub client_id: i64,
    pub client_name: String,
    pub client_email: String,
    pub status: String,
    pub total: f64,
    pub currency: String,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl HostInvoiceEntity {
    pub fn is_paid(&self) -> bool {
        self.status == INVOICE_STATUS_PAID
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = invoice_transactions)]
pub struct InsertInvoiceTransactionEntity {
    pub invoice_id: i64,
    pub transaction_id: String,
    pub amount: f64,
    pub fee: f64,
    pub gateway: String,
}
