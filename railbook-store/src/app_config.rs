use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Base configuration checked into the repo
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, selected by RUN_MODE
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Machine-local overrides, never checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Environment variables win, e.g. RAILBOOK__SERVER__PORT=8080
            .add_source(config::Environment::with_prefix("RAILBOOK").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
