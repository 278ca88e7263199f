// src/config.rs

use dotenvy::dotenv;
use std::env;

/// Fallback shown to students when no eligible hint exists for their answer.
pub const NO_HINTS_MESSAGE: &str = "Sorry, there are no hints for this answer.";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    /// Optional staff account seeded at startup.
    pub staff_username: Option<String>,
    pub staff_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86400);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let staff_username = env::var("STAFF_USERNAME").ok();
        let staff_password = env::var("STAFF_PASSWORD").ok();

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            staff_username,
            staff_password,
        }
    }
}
