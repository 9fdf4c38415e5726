pub mod networks;
pub mod payment_families;
pub mod session_statuses;
