use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use diesel::{insert_into, prelude::*};

use crate::{
    domain::{
        entities::gateway_logs::InsertGatewayLogEntity,
        repositories::gateway_logs::GatewayLogRepository,
    },
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::gateway_logs},
};

pub struct GatewayLogPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl GatewayLogPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl GatewayLogRepository for GatewayLogPostgres {
    async fn append(&self, entry: InsertGatewayLogEntity) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(gateway_logs::table)
            .values(&entry)
            .returning(gateway_logs::id)
            .get_result::<i64>(&mut conn)?;

        Ok(result)
    }
}
