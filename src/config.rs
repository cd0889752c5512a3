use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use nextbus::Settings;

use crate::store::DEFAULT_CAPACITY;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_STOP_DB: &str = "stops.json";
const DEFAULT_BUSTIME_URL: &str = "http://realtime.portauthority.org/bustime/api/v1";

/// Process configuration, read from the environment at start-up.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub stop_db: PathBuf,
    pub bustime_url: String,
    pub bustime_key: String,

    /// Key callers must pass as `?key=` on protected routes. Unset disables
    /// the check.
    pub app_key: Option<String>,

    /// Additional key required to toggle upstream calls.
    pub operator_key: Option<String>,

    /// Most entries the response cache holds.
    pub cache_capacity: usize,
    pub settings: Settings,
}

impl AppConfig {
    /// # Errors
    ///
    /// Returns an error when `BIND_ADDR` is not a socket address or
    /// `CACHE_CAPACITY` is not a count.
    pub fn from_env() -> Result<Self> {
        let bind_addr = env_or("BIND_ADDR", DEFAULT_BIND_ADDR);
        let bind_addr = bind_addr.parse().with_context(|| format!("invalid BIND_ADDR {bind_addr}"))?;
        let cache_capacity = env_or("CACHE_CAPACITY", &DEFAULT_CAPACITY.to_string());
        let cache_capacity =
            cache_capacity.parse().with_context(|| format!("invalid CACHE_CAPACITY {cache_capacity}"))?;

        Ok(Self {
            bind_addr,
            stop_db: PathBuf::from(env_or("STOP_DB", DEFAULT_STOP_DB)),
            bustime_url: env_or("BUSTIME_URL", DEFAULT_BUSTIME_URL),
            bustime_key: env_opt("BUSTIME_KEY").unwrap_or_default(),
            app_key: env_opt("APP_KEY"),
            operator_key: env_opt("OPERATOR_KEY"),
            cache_capacity,
            settings: Settings::from_env(),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| {
        tracing::trace!("{key} not set, using default: {default}");
        default.to_string()
    })
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}
