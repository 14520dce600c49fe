//! Signing identities held by the `stellar` CLI keystore

use crate::toolchain::StellarCli;
use crate::{Error, Result};
use async_trait::async_trait;
use secrecy::SecretString;

/// A freshly generated identity
pub struct GeneratedKey {
    pub public_key: String,
    pub secret_key: SecretString,
}

impl std::fmt::Debug for GeneratedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedKey")
            .field("public_key", &self.public_key)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Whether a signing key exists locally for `alias`
    async fn has_key(&self, alias: &str) -> Result<bool>;

    /// Create (or overwrite) the identity `alias`
    async fn generate(&self, alias: &str) -> Result<GeneratedKey>;
}

/// Keystore managed through `stellar keys ...`
#[derive(Debug, Clone)]
pub struct StellarKeyStore {
    cli: StellarCli,
}

impl StellarKeyStore {
    pub fn new(cli: StellarCli) -> Self {
        Self { cli }
    }

    async fn address(&self, alias: &str) -> Result<Option<String>> {
        let output = self
            .cli
            .run(&args(&["keys", "address", alias]))
            .await?;
        let address = output.stdout.trim();
        if output.success && crate::invoker::classify::is_account_address(address) {
            Ok(Some(address.to_string()))
        } else {
            Ok(None)
        }
    }
}

#[async_trait]
impl KeyStore for StellarKeyStore {
    async fn has_key(&self, alias: &str) -> Result<bool> {
        Ok(self.address(alias).await?.is_some())
    }

    async fn generate(&self, alias: &str) -> Result<GeneratedKey> {
        let output = self.cli.run(&generate_args(&self.cli, alias)).await?;
        if !output.success {
            return Err(Error::KeyGeneration {
                alias: alias.to_string(),
                reason: output.combined().trim().to_string(),
            });
        }

        let public_key = self.address(alias).await?.ok_or_else(|| Error::KeyGeneration {
            alias: alias.to_string(),
            reason: "no address reported after generation".to_string(),
        })?;

        let shown = self
            .cli
            .run(&args(&["keys", "show", alias]))
            .await?;
        let secret = shown.stdout.trim();
        if !shown.success || !secret.starts_with('S') {
            return Err(Error::KeyGeneration {
                alias: alias.to_string(),
                reason: "secret key could not be read back".to_string(),
            });
        }

        tracing::info!(alias, public_key = %public_key, "Generated signing identity");
        Ok(GeneratedKey {
            public_key,
            secret_key: SecretString::from(secret.to_string()),
        })
    }
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| p.to_string()).collect()
}

fn generate_args(cli: &StellarCli, alias: &str) -> Vec<String> {
    let mut argv = args(&["keys", "generate", alias]);
    argv.extend(cli.network_args());
    argv.push("--overwrite".to_string());
    argv
}
