use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use serde_json::json;

use crate::{
    application::{
        usecases::checkout::{CheckoutError, CheckoutUseCase},
        voltxt_gateway::VoltxtGateway,
    },
    domain::{
        repositories::{
            host_invoices::HostInvoiceRepository, payment_sessions::PaymentSessionRepository,
        },
        value_objects::checkout::CheckoutRequest,
    },
    infrastructure::{
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{
                host_invoices::HostInvoicePostgres, payment_sessions::PaymentSessionPostgres,
            },
        },
        voltxt_api::client::VoltxtClient,
    },
};

pub fn routes(db_pool: Arc<PgPoolSquad>, voltxt_client: Arc<VoltxtClient>) -> Router {
    let payment_session_repository = PaymentSessionPostgres::new(Arc::clone(&db_pool));
    let host_invoice_repository = HostInvoicePostgres::new(Arc::clone(&db_pool));
    let network = voltxt_client.network();
    let checkout_usecase = CheckoutUseCase::new(
        Arc::new(payment_session_repository),
        Arc::new(host_invoice_repository),
        voltxt_client,
        network,
    );

    Router::new()
        .route(
            "/",
            post(checkout::<PaymentSessionPostgres, HostInvoicePostgres, VoltxtClient>),
        )
        .with_state(Arc::new(checkout_usecase))
}

pub async fn checkout<S, H, G>(
    State(checkout_usecase): State<Arc<CheckoutUseCase<S, H, G>>>,
    Json(request): Json<CheckoutRequest>,
) -> impl IntoResponse
where
    S: PaymentSessionRepository + Send + Sync + 'static,
    H: HostInvoiceRepository + Send + Sync + 'static,
    G: VoltxtGateway + 'static,
{
    match checkout_usecase.checkout(request).await {
        Ok(dto) => (StatusCode::OK, Json(dto)).into_response(),
        Err(err) => {
            let message = match &err {
                CheckoutError::Internal(_) => "internal server error".to_string(),
                _ => err.to_string(),
            };
            (err.status_code(), Json(json!({ "message": message }))).into_response()
        }
    }
}
