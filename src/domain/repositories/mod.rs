pub mod gateway_logs;
pub mod host_invoices;
pub mod payment_sessions;
