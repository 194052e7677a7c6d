//! Application settings, read from `settings.toml`.

use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Database {
    Memory,
    Sqlite { path: String },
}

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

#[derive(Debug, Deserialize)]
pub struct Bank {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub return_url: String,
}

#[derive(Debug, Deserialize)]
pub struct Ecomm {
    pub base_url: String,
    pub client_url: String,
    /// Path to the PEM bundle with the merchant certificate and key.
    pub certificate: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Gateways {
    pub bank: Option<Bank>,
    pub ecomm: Option<Ecomm>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Server,
    #[serde(default)]
    pub gateways: Gateways,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings"))
            .build()?;

        settings.try_deserialize()
    }
}
