use anyhow::{Ok, Result, anyhow};

use crate::domain::value_objects::enums::networks::Network;

use super::config_model::{AdminSecret, Database, DotEnvyConfig, Server, StoreIdentity, Voltxt};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let server = Server {
        port: std::env::var("SERVER_PORT")
            .expect("SERVER_PORT is invalid")
            .parse()?,
        body_limit: std::env::var("SERVER_BODY_LIMIT")
            .expect("SERVER_BODY_LIMIT is invalid")
            .parse()?,
        timeout: std::env::var("SERVER_TIMEOUT")
            .expect("SERVER_TIMEOUT is invalid")
            .parse()?,
    };

    let database = Database {
        url: std::env::var("DATABASE_URL").expect("DATABASE_URL is invalid"),
    };

    let network_raw = std::env::var("VOLTXT_NETWORK").unwrap_or("testnet".to_string());
    let network = Network::from_str(&network_raw)
        .ok_or_else(|| anyhow!("VOLTXT_NETWORK must be testnet or mainnet"))?;

    let voltxt = Voltxt {
        api_url: std::env::var("VOLTXT_API_URL").expect("VOLTXT_API_URL is invalid"),
        api_key: std::env::var("VOLTXT_API_KEY").expect("VOLTXT_API_KEY is invalid"),
        network,
        expiry_hours: std::env::var("VOLTXT_EXPIRY_HOURS")
            .unwrap_or("24".to_string())
            .parse()?,
        connect_timeout: std::env::var("VOLTXT_CONNECT_TIMEOUT")
            .unwrap_or("10".to_string())
            .parse()?,
        timeout: std::env::var("VOLTXT_TIMEOUT")
            .unwrap_or("30".to_string())
            .parse()?,
        system_url: std::env::var("SYSTEM_URL").expect("SYSTEM_URL is invalid"),
    };

    Ok(DotEnvyConfig {
        server,
        database,
        voltxt,
    })
}

pub fn get_admin_secret() -> Result<AdminSecret> {
    dotenvy::dotenv().ok();

    Ok(AdminSecret {
        secret: std::env::var("JWT_ADMIN_SECRET").expect("JWT_ADMIN_SECRET is invalid"),
    })
}

pub fn get_store_identity() -> Result<StoreIdentity> {
    dotenvy::dotenv().ok();

    Ok(StoreIdentity {
        name: std::env::var("STORE_NAME").unwrap_or("VOLTXT Store".to_string()),
    })
}
