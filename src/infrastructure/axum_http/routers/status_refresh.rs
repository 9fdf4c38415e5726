use std::sync::Arc;

use axum::{
    Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post,
};
use serde_json::json;
use tracing::info;

use crate::{
    application::{
        usecases::status_refresh::{RefreshError, StatusRefreshUseCase},
        voltxt_gateway::VoltxtGateway,
    },
    auth::AdminUser,
    domain::{
        repositories::{
            gateway_logs::GatewayLogRepository, host_invoices::HostInvoiceRepository,
            payment_sessions::PaymentSessionRepository,
        },
        value_objects::reconciliation::RefreshStatusRequest,
    },
    infrastructure::{
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{
                gateway_logs::GatewayLogPostgres, host_invoices::HostInvoicePostgres,
                payment_sessions::PaymentSessionPostgres,
            },
        },
        voltxt_api::client::VoltxtClient,
    },
};

pub fn routes(db_pool: Arc<PgPoolSquad>, voltxt_client: Arc<VoltxtClient>) -> Router {
    let payment_session_repository = PaymentSessionPostgres::new(Arc::clone(&db_pool));
    let host_invoice_repository = HostInvoicePostgres::new(Arc::clone(&db_pool));
    let gateway_log_repository = GatewayLogPostgres::new(Arc::clone(&db_pool));
    let status_refresh_usecase = StatusRefreshUseCase::new(
        Arc::new(payment_session_repository),
        Arc::new(host_invoice_repository),
        voltxt_client,
        Arc::new(gateway_log_repository),
    );

    Router::new()
        .route(
            "/refresh-status",
            post(
                refresh::<PaymentSessionPostgres, HostInvoicePostgres, VoltxtClient, GatewayLogPostgres>,
            ),
        )
        .with_state(Arc::new(status_refresh_usecase))
}

pub async fn refresh<S, H, G, L>(
    State(status_refresh_usecase): State<Arc<StatusRefreshUseCase<S, H, G, L>>>,
    admin_user: AdminUser,
    Json(request): Json<RefreshStatusRequest>,
) -> impl IntoResponse
where
    S: PaymentSessionRepository + Send + Sync + 'static,
    H: HostInvoiceRepository + Send + Sync + 'static,
    G: VoltxtGateway + 'static,
    L: GatewayLogRepository + Send + Sync + 'static,
{
    info!(
        invoice_id = request.invoice_id,
        admin_id = %admin_user.admin_id,
        "refresh: manual status refresh requested"
    );

    match status_refresh_usecase.refresh(request.invoice_id).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => {
            let message = match &err {
                RefreshError::Recording(..) | RefreshError::Internal(_) => {
                    "internal server error".to_string()
                }
                _ => err.to_string(),
            };
            (err.status_code(), Json(json!({ "message": message }))).into_response()
        }
    }
}
