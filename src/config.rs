//! Service settings.
//!
//! Loaded from built-in defaults, then an optional `config.toml` next to the binary, then
//! `ATTENDANCE__SECTION__KEY` environment variables. `DATABASE_URL` (read through `.env` as
//! well) wins over `database.url`.

use std::env;

use config::{Config, Environment, File};
use dotenvy::dotenv;
use serde::Deserialize;
use tracing::info;

use crate::{error::AppResult, manager::DEFAULT_SESSION_LIMIT};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub sessions: SessionSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    /// Sessions returned by a listing that gives no limit.
    pub default_limit: i64,
    /// Upper bound on any requested listing limit.
    pub max_limit: i64,
}

impl Settings {
    pub fn load() -> AppResult<Self> {
        dotenv().ok();

        let settings: Settings = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.url", "attendance.sqlite")?
            .set_default("sessions.default_limit", DEFAULT_SESSION_LIMIT)?
            .set_default("sessions.max_limit", 100)?
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("ATTENDANCE").separator("__"))
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .build()?
            .try_deserialize()?;

        info!(
            "Loaded settings: database {}, listening on {}:{}",
            settings.database.url, settings.server.host, settings.server.port
        );

        Ok(settings)
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// The listing limit to use for a request, falling back to the default and capped at the
    /// maximum.
    pub fn session_limit(&self, requested: Option<i64>) -> i64 {
        requested
            .unwrap_or(self.sessions.default_limit)
            .min(self.sessions.max_limit)
    }

    /// Default settings pointing at `database_url`, without reading files or the environment.
    pub fn for_database(database_url: &str) -> Self {
        Settings {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            database: DatabaseSettings {
                url: database_url.to_string(),
            },
            sessions: SessionSettings {
                default_limit: DEFAULT_SESSION_LIMIT,
                max_limit: 100,
            },
        }
    }
}
