pub mod checkout;
pub mod status_refresh;
pub mod webhooks;
