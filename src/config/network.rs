//! Network endpoint configuration
//!
//! Resolution order for each value:
//! 1. Explicit environment variable (STELLAR_RPC_URL, STELLAR_FRIENDBOT_URL, ...)
//! 2. Well-known public endpoints for the selected network name
//!
//! # Examples
//!
//! ```bash
//! # Use a private RPC provider for testnet
//! export STELLAR_RPC_URL="https://soroban-testnet.example.org"
//!
//! # Point at a local quickstart container
//! export STELLAR_NETWORK=local
//! ```

use serde::{Deserialize, Serialize};

/// Environment variable names
pub mod env_vars {
    pub const NETWORK: &str = "STELLAR_NETWORK";
    pub const RPC_URL: &str = "STELLAR_RPC_URL";
    pub const NETWORK_PASSPHRASE: &str = "STELLAR_NETWORK_PASSPHRASE";
    pub const FRIENDBOT_URL: &str = "STELLAR_FRIENDBOT_URL";
    pub const CLI_BINARY: &str = "STELLAR_CLI";
}

/// Public endpoints and passphrases per well-known network
mod known {
    pub const TESTNET_RPC: &str = "https://soroban-testnet.stellar.org";
    pub const TESTNET_PASSPHRASE: &str = "Test SDF Network ; September 2015";
    pub const TESTNET_FRIENDBOT: &str = "https://friendbot.stellar.org";

    pub const FUTURENET_RPC: &str = "https://rpc-futurenet.stellar.org";
    pub const FUTURENET_PASSPHRASE: &str = "Test SDF Future Network ; October 2022";
    pub const FUTURENET_FRIENDBOT: &str = "https://friendbot-futurenet.stellar.org";

    pub const LOCAL_RPC: &str = "http://localhost:8000/rpc";
    pub const LOCAL_PASSPHRASE: &str = "Standalone Network ; February 2017";
    pub const LOCAL_FRIENDBOT: &str = "http://localhost:8000/friendbot";
}

const DEFAULT_NETWORK: &str = "testnet";
const DEFAULT_CLI_BINARY: &str = "stellar";

/// Endpoints and identity of the target network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Network name as understood by the stellar CLI (`testnet`, `futurenet`, `local`)
    pub name: String,
    /// Network passphrase
    pub passphrase: String,
    /// Soroban RPC endpoint
    pub rpc_url: String,
    /// Friendbot faucet endpoint
    pub friendbot_url: String,
    /// Path or name of the stellar CLI binary
    #[serde(default = "default_cli_binary")]
    pub cli_binary: String,
}

fn default_cli_binary() -> String {
    DEFAULT_CLI_BINARY.to_string()
}

impl NetworkConfig {
    /// Well-known endpoints for a network name, without consulting the environment
    pub fn named(name: &str) -> Self {
        let (rpc, passphrase, friendbot) = match name {
            "futurenet" => (
                known::FUTURENET_RPC,
                known::FUTURENET_PASSPHRASE,
                known::FUTURENET_FRIENDBOT,
            ),
            "local" | "standalone" => (
                known::LOCAL_RPC,
                known::LOCAL_PASSPHRASE,
                known::LOCAL_FRIENDBOT,
            ),
            _ => (
                known::TESTNET_RPC,
                known::TESTNET_PASSPHRASE,
                known::TESTNET_FRIENDBOT,
            ),
        };

        Self {
            name: name.to_string(),
            passphrase: passphrase.to_string(),
            rpc_url: rpc.to_string(),
            friendbot_url: friendbot.to_string(),
            cli_binary: default_cli_binary(),
        }
    }

    /// Public testnet endpoints
    pub fn testnet() -> Self {
        Self::named(DEFAULT_NETWORK)
    }

    /// Resolve network settings from environment variables
    pub fn from_env() -> Self {
        let name = std::env::var(env_vars::NETWORK).unwrap_or_else(|_| DEFAULT_NETWORK.to_string());
        Self::from_env_named(&name)
    }

    /// Well-known endpoints for `name` with environment overrides applied
    pub fn from_env_named(name: &str) -> Self {
        let mut config = Self::named(name);
        config.apply_overrides(env_lookup);
        config
    }

    /// Switch to the network `name`
    ///
    /// Settings for the same network are kept as they are. Another network
    /// starts from its well-known endpoints plus environment overrides and
    /// keeps the configured CLI binary.
    pub fn select(&self, name: &str) -> Self {
        self.select_with(name, env_lookup)
    }

    fn select_with(&self, name: &str, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if self.name == name {
            return self.clone();
        }
        let mut selected = Self::named(name);
        selected.cli_binary = self.cli_binary.clone();
        selected.apply_overrides(lookup);
        selected
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(env_vars::RPC_URL) {
            tracing::debug!("Using STELLAR_RPC_URL for {}", self.name);
            self.rpc_url = url;
        }
        if let Some(passphrase) = lookup(env_vars::NETWORK_PASSPHRASE) {
            self.passphrase = passphrase;
        }
        if let Some(url) = lookup(env_vars::FRIENDBOT_URL) {
            tracing::debug!("Using STELLAR_FRIENDBOT_URL for {}", self.name);
            self.friendbot_url = url;
        }
        if let Some(binary) = lookup(env_vars::CLI_BINARY) {
            self.cli_binary = binary;
        }
    }

    /// Validate endpoint URLs
    pub fn validate(&self) -> crate::Result<()> {
        for (label, value) in [("rpc_url", &self.rpc_url), ("friendbot_url", &self.friendbot_url)] {
            url::Url::parse(value)
                .map_err(|e| crate::Error::Config(format!("Invalid {}: {} ({})", label, value, e)))?;
        }
        if self.name.trim().is_empty() {
            return Err(crate::Error::Config("Network name is empty".to_string()));
        }
        Ok(())
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
