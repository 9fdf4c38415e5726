use crate::domain::value_objects::enums::networks::Network;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub server: Server,
    pub database: Database,
    pub voltxt: Voltxt,
}

#[derive(Debug, Clone)]
pub struct Server {
    pub port: u16,
    pub body_limit: u64,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Voltxt {
    pub api_url: String,
    pub api_key: String,
    pub network: Network,
    pub expiry_hours: u32,
    pub connect_timeout: u64,
    pub timeout: u64,
    /// Public base URL of this installation, used for callback and return
    /// URLs sent to the payment service.
    pub system_url: String,
}

#[derive(Debug, Clone)]
pub struct AdminSecret {
    pub secret: String,
}

#[derive(Debug, Clone)]
pub struct StoreIdentity {
    pub name: String,
}
