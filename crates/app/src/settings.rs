//! Application settings, read from `settings.toml` (optional) and
//! `CASHBOOK__*` environment variables, e.g. `CASHBOOK__SERVER__PORT=8080`.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    /// Log level for the cashbook crates (`error` .. `trace`).
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

/// Where the entity store lives.
///
/// ```toml
/// database = "memory"
/// database = { sqlite = "cashbook.db" }
/// ```
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
    #[serde(default = "default_allow_registration")]
    pub allow_registration: bool,
}

fn default_allow_registration() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
pub struct Ledger {
    /// IANA timezone used for "today" and default entry timestamps.
    pub timezone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Option<Server>,
    #[serde(default)]
    pub ledger: Ledger,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("CASHBOOK").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
