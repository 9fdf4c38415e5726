use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::post,
};

use crate::{
    application::usecases::webhook_reconciler::{ReconcileError, WebhookReconcilerUseCase},
    domain::{
        repositories::{
            gateway_logs::GatewayLogRepository, host_invoices::HostInvoiceRepository,
            payment_sessions::PaymentSessionRepository,
        },
        value_objects::{reconciliation::WebhookAck, webhook::WebhookPayload},
    },
    infrastructure::postgres::{
        postgres_connection::PgPoolSquad,
        repositories::{
            gateway_logs::GatewayLogPostgres, host_invoices::HostInvoicePostgres,
            payment_sessions::PaymentSessionPostgres,
        },
    },
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let payment_session_repository = PaymentSessionPostgres::new(Arc::clone(&db_pool));
    let host_invoice_repository = HostInvoicePostgres::new(Arc::clone(&db_pool));
    let gateway_log_repository = GatewayLogPostgres::new(Arc::clone(&db_pool));
    let webhook_reconciler_usecase = WebhookReconcilerUseCase::new(
        Arc::new(payment_session_repository),
        Arc::new(host_invoice_repository),
        Arc::new(gateway_log_repository),
    );

    Router::new()
        .route(
            "/voltxt",
            post(handle_webhook::<PaymentSessionPostgres, HostInvoicePostgres, GatewayLogPostgres>),
        )
        .with_state(Arc::new(webhook_reconciler_usecase))
}

pub async fn handle_webhook<S, H, L>(
    State(webhook_reconciler_usecase): State<Arc<WebhookReconcilerUseCase<S, H, L>>>,
    Json(payload): Json<WebhookPayload>,
) -> impl IntoResponse
where
    S: PaymentSessionRepository + Send + Sync + 'static,
    H: HostInvoiceRepository + Send + Sync + 'static,
    L: GatewayLogRepository + Send + Sync + 'static,
{
    match webhook_reconciler_usecase.handle_webhook(payload).await {
        Ok(ack) => (axum::http::StatusCode::OK, Json(ack)).into_response(),
        Err(err) => {
            let message = match &err {
                ReconcileError::Validation(reason) => reason.clone(),
                ReconcileError::NotFound(_) => err.to_string(),
                ReconcileError::Recording(..) | ReconcileError::Internal(_) => {
                    "internal server error".to_string()
                }
            };
            (
                err.status_code(),
                Json(WebhookAck::failed(None, message)),
            )
                .into_response()
        }
    }
}
