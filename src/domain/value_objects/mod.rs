pub mod checkout;
pub mod enums;
pub mod reconciliation;
pub mod webhook;
