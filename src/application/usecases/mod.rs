pub mod checkout;
pub mod payment_recorder;
pub mod status_refresh;
pub mod webhook_reconciler;
