use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Runtime configuration for the gateway server, assembled from environment
/// variables (and, optionally, a config file) via the `config` crate.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Shared-secret value callers must present in `X-API-Key` to reach the
    /// admin surface.
    pub api_key: String,

    /// Path to the DuckDB database file backing the engine handle.
    #[serde(default = "default_duckdb_path")]
    pub duckdb_path: PathBuf,

    /// Address the HTTP server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Timeout applied to each outbound dispatch request, in seconds.
    #[serde(default = "default_dispatch_timeout_secs")]
    pub dispatch_timeout_secs: u64,
}

fn default_duckdb_path() -> PathBuf {
    PathBuf::from("gateway.duckdb")
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_dispatch_timeout_secs() -> u64 {
    10
}

impl GatewayConfig {
    /// Loads configuration from environment variables prefixed `GATEWAY_`
    /// plus a handful of unprefixed legacy names kept for compatibility
    /// with the original system's env vars.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .set_default("api_key", "")?
            .set_default("duckdb_path", "gateway.duckdb")?
            .set_default("bind_addr", "0.0.0.0:8080")?
            .set_default("dispatch_timeout_secs", 10)?
            .add_source(
                config::Environment::default()
                    .prefix("GATEWAY")
                    .try_parsing(true),
            );

        let mut cfg: GatewayConfig = builder.build()?.try_deserialize()?;

        if let Ok(key) = std::env::var("WEBHOOK_GATEWAY_API_KEY") {
            cfg.api_key = key;
        }
        if let Ok(path) = std::env::var("DUCKDB_PATH") {
            cfg.duckdb_path = PathBuf::from(path);
        }
        if let Ok(addr) = std::env::var("GATEWAY_BIND_ADDR") {
            cfg.bind_addr = addr;
        }
        if let Ok(secs) = std::env::var("DISPATCH_TIMEOUT_SECS") {
            cfg.dispatch_timeout_secs = secs
                .parse()
                .map_err(|e| config::ConfigError::Message(format!("invalid DISPATCH_TIMEOUT_SECS: {e}")))?;
        }

        if cfg.api_key.is_empty() {
            return Err(config::ConfigError::Message(
                "WEBHOOK_GATEWAY_API_KEY must be set".to_string(),
            ));
        }

        Ok(cfg)
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_timeout_converts_seconds() {
        let cfg = GatewayConfig {
            api_key: "k".into(),
            duckdb_path: PathBuf::from("x.duckdb"),
            bind_addr: "0.0.0.0:8080".into(),
            dispatch_timeout_secs: 5,
        };
        assert_eq!(cfg.dispatch_timeout(), Duration::from_secs(5));
    }
}
