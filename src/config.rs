//! Session configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{SessionError, SessionResult};
use crate::session::Network;

pub const DEFAULT_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_RPC_URL: &str = "https://fullnode.testnet.sui.io:443";
pub const DEFAULT_PROFILE_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;
pub const DEFAULT_STORAGE_PATH: &str = ".zksession.json";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub client_id: String,
    pub origin: String,
    pub rpc_url: String,
    pub profile_url: String,
    pub poll_interval: Duration,
    pub storage_path: PathBuf,
    pub default_network: Network,
    pub http_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            origin: DEFAULT_ORIGIN.into(),
            rpc_url: DEFAULT_RPC_URL.into(),
            profile_url: DEFAULT_PROFILE_URL.into(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            default_network: Network::default(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl SessionConfig {
    /// Build typed config from environment variables. All are optional:
    ///
    /// - `ZKSESSION_CLIENT_ID`: OAuth client id (default empty)
    /// - `ZKSESSION_ORIGIN`: callback origin (default `http://localhost:3000`)
    /// - `ZKSESSION_RPC_URL`: Sui JSON-RPC endpoint (default testnet fullnode)
    /// - `ZKSESSION_PROFILE_URL`: profile store base URL
    /// - `ZKSESSION_POLL_INTERVAL_MS`: default 3000
    /// - `ZKSESSION_STORAGE_PATH`: default `.zksession.json`
    /// - `ZKSESSION_DEFAULT_NETWORK`: `mainnet` or `testnet` (default)
    /// - `ZKSESSION_HTTP_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ConfigParse`] for an unknown default network.
    pub fn from_env() -> SessionResult<Self> {
        Self::from_lookup(|key| std::env::var(key).map_err(|_| ()))
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ConfigParse`] for an unknown default network.
    pub fn from_lookup<F>(lookup: F) -> SessionResult<Self>
    where
        F: Fn(&str) -> Result<String, ()>,
    {
        let defaults = Self::default();
        let string = |key: &str, default: String| match lookup(key) {
            Ok(value) if !value.trim().is_empty() => value.trim().to_owned(),
            _ => default,
        };
        let number = |key: &str, default: u64| match lookup(key) {
            Ok(value) => value.trim().parse::<u64>().unwrap_or(default),
            Err(()) => default,
        };

        let default_network = match lookup("ZKSESSION_DEFAULT_NETWORK") {
            Ok(raw) if !raw.trim().is_empty() => raw
                .trim()
                .parse::<Network>()
                .map_err(|e| SessionError::ConfigParse(format!("ZKSESSION_DEFAULT_NETWORK: {e}")))?,
            _ => defaults.default_network,
        };

        Ok(Self {
            client_id: string("ZKSESSION_CLIENT_ID", defaults.client_id),
            origin: string("ZKSESSION_ORIGIN", defaults.origin)
                .trim_end_matches('/')
                .to_owned(),
            rpc_url: string("ZKSESSION_RPC_URL", defaults.rpc_url),
            profile_url: string("ZKSESSION_PROFILE_URL", defaults.profile_url),
            poll_interval: Duration::from_millis(number("ZKSESSION_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)),
            storage_path: PathBuf::from(string(
                "ZKSESSION_STORAGE_PATH",
                defaults.storage_path.to_string_lossy().into_owned(),
            )),
            default_network,
            http_timeout: Duration::from_secs(number("ZKSESSION_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)),
        })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
