use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use diesel::{insert_into, prelude::*, update};

use crate::{
    domain::{
        entities::payment_sessions::{
            InsertPaymentSessionEntity, PaymentSessionEntity, UpdatePaymentSessionEntity,
        },
        repositories::payment_sessions::PaymentSessionRepository,
    },
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::payment_sessions},
};

pub struct PaymentSessionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PaymentSessionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PaymentSessionRepository for PaymentSessionPostgres {
    async fn find_active_by_invoice(
        &self,
        host_invoice_id: i64,
    ) -> Result<Option<PaymentSessionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = payment_sessions::table
            .filter(payment_sessions::host_invoice_id.eq(host_invoice_id))
            .order(payment_sessions::id.desc())
            .select(PaymentSessionEntity::as_select())
            .first::<PaymentSessionEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn insert(&self, session: InsertPaymentSessionEntity) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(payment_sessions::table)
            .values(&session)
            .returning(payment_sessions::id)
            .get_result::<i64>(&mut conn)?;

        Ok(result)
    }

    async fn merge(&self, host_invoice_id: i64, changes: UpdatePaymentSessionEntity) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // Newest-row lookup and the update run in one transaction so
        // concurrent deliveries for the same invoice cannot interleave a
        // read-modify-write.
        conn.transaction::<(), diesel::result::Error, _>(|tx| {
            let newest = payment_sessions::table
                .filter(payment_sessions::host_invoice_id.eq(host_invoice_id))
                .order(payment_sessions::id.desc())
                .select(payment_sessions::id)
                .first::<i64>(tx)
                .optional()?;

            if let Some(session_id) = newest {
                update(payment_sessions::table.find(session_id))
                    .set(&changes)
                    .execute(tx)?;
            }

            Ok(())
        })?;

        Ok(())
    }
}
