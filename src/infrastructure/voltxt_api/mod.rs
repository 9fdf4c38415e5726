pub mod client;
pub mod error_messages;
