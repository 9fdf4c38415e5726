use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{dsl::exists, insert_into, prelude::*, select, update};
use tracing::info;

use crate::{
    domain::{
        entities::host_invoices::{
            GATEWAY_NAME, HostInvoiceEntity, INVOICE_STATUS_PAID, InsertInvoiceTransactionEntity,
        },
        repositories::host_invoices::HostInvoiceRepository,
    },
    infrastructure::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{host_invoices, invoice_transactions},
    },
};

pub struct HostInvoicePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl HostInvoicePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl HostInvoiceRepository for HostInvoicePostgres {
    async fn find_invoice(&self, invoice_id: i64) -> Result<Option<HostInvoiceEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = host_invoices::table
            .find(invoice_id)
            .select(HostInvoiceEntity::as_select())
            .first::<HostInvoiceEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn transaction_exists(&self, transaction_id: &str) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = select(exists(
            invoice_transactions::table
                .filter(invoice_transactions::transaction_id.eq(transaction_id)),
        ))
        .get_result::<bool>(&mut conn)?;

        Ok(result)
    }

    async fn add_payment(
        &self,
        invoice_id: i64,
        transaction_id: &str,
        amount: f64,
        fee: f64,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let entity = InsertInvoiceTransactionEntity {
            invoice_id,
            transaction_id: transaction_id.to_string(),
            amount,
            fee,
            gateway: GATEWAY_NAME.to_string(),
        };

        conn.transaction::<(), diesel::result::Error, _>(|tx| {
            insert_into(invoice_transactions::table)
                .values(&entity)
                .execute(tx)?;

            update(host_invoices::table.find(invoice_id))
                .set((
                    host_invoices::status.eq(INVOICE_STATUS_PAID),
                    host_invoices::paid_at.eq(Utc::now()),
                ))
                .execute(tx)?;

            Ok(())
        })?;

        Ok(())
    }

    async fn send_payment_confirmation(&self, invoice_id: i64) -> Result<()> {
        // The platform mails the customer off the Unpaid -> Paid transition;
        // there is nothing extra to deliver from this side.
        info!(invoice_id, "invoices: payment confirmation requested");
        Ok(())
    }
}
