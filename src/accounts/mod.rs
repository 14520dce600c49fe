//! Account provisioning
//!
//! SECURITY:
//! - Secret keys are held in `SecretString` and redacted from `Debug`
//! - Secrets are only written to the per-alias credential file
//! - Secrets are never logged

mod faucet;
mod keystore;

pub use faucet::{Faucet, FriendbotFaucet};
pub use keystore::{GeneratedKey, KeyStore, StellarKeyStore};

use crate::ledger::DeploymentLedger;
use crate::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A provisioned signing identity
pub struct Account {
    pub alias: String,
    pub public_key: String,
    pub secret_key: Option<SecretString>,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("alias", &self.alias)
            .field("public_key", &self.public_key)
            .field(
                "secret_key",
                &self.secret_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// On-disk credential record
#[derive(Serialize, Deserialize)]
struct CredentialRecord {
    name: String,
    public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    secret_key: Option<String>,
}

/// `<dir>/<alias>_keys.json` credential files
#[derive(Debug, Clone)]
pub struct CredentialStore {
    dir: PathBuf,
}

impl CredentialStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, alias: &str) -> PathBuf {
        self.dir.join(format!("{}_keys.json", alias))
    }

    pub fn load(&self, alias: &str) -> Result<Option<Account>> {
        let path = self.path_for(alias);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        let record: CredentialRecord = serde_json::from_str(&content)?;
        Ok(Some(Account {
            alias: record.name,
            public_key: record.public_key,
            secret_key: record.secret_key.map(SecretString::from),
        }))
    }

    pub fn save(&self, account: &Account) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let record = CredentialRecord {
            name: account.alias.clone(),
            public_key: account.public_key.clone(),
            secret_key: account
                .secret_key
                .as_ref()
                .map(|s| s.expose_secret().to_string()),
        };
        write_private(&self.path_for(&account.alias), &serde_json::to_vec_pretty(&record)?)
    }

    /// Delete the credential file; a missing file is not an error
    pub fn remove(&self, alias: &str) -> Result<bool> {
        match std::fs::remove_file(self.path_for(alias)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(unix)]
fn write_private(path: &Path, content: &[u8]) -> Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(content)?;
    Ok(())
}

#[cfg(not(unix))]
fn write_private(path: &Path, content: &[u8]) -> Result<()> {
    std::fs::write(path, content)?;
    Ok(())
}

/// Creates, funds and records signing identities
pub struct AccountProvisioner<'a> {
    store: CredentialStore,
    keystore: &'a dyn KeyStore,
    faucet: &'a dyn Faucet,
    allow_regeneration: bool,
}

impl<'a> AccountProvisioner<'a> {
    pub fn new(store: CredentialStore, keystore: &'a dyn KeyStore, faucet: &'a dyn Faucet) -> Self {
        Self {
            store,
            keystore,
            faucet,
            allow_regeneration: false,
        }
    }

    /// Permit minting a new identity when a recorded alias lost its key
    pub fn allow_regeneration(mut self, allow: bool) -> Self {
        self.allow_regeneration = allow;
        self
    }

    /// Return the account for `alias`, creating it on first use
    pub async fn provision(&self, alias: &str, ledger: &mut DeploymentLedger) -> Result<Account> {
        let record = self.store.load(alias)?;
        let has_key = self.keystore.has_key(alias).await?;

        if let Some(account) = record {
            if has_key {
                tracing::debug!(alias, public_key = %account.public_key, "Using existing account");
                if !ledger.contains(alias) {
                    ledger.set(alias, &account.public_key)?;
                }
                return Ok(account);
            }
            self.regeneration_guard(alias, Some(&account.public_key))?;
        } else if let Some(recorded) = ledger.get(alias).map(str::to_string) {
            if has_key {
                // Keystore still holds the identity; only the local record is gone
                let account = Account {
                    alias: alias.to_string(),
                    public_key: recorded,
                    secret_key: None,
                };
                self.store.save(&account)?;
                tracing::warn!(alias, "Credential file missing, rebuilt from ledger without secret");
                return Ok(account);
            }
            self.regeneration_guard(alias, Some(&recorded))?;
        }

        self.create(alias, ledger).await
    }

    fn regeneration_guard(&self, alias: &str, recorded: Option<&str>) -> Result<()> {
        if !self.allow_regeneration {
            tracing::error!(
                alias,
                recorded_public_key = recorded.unwrap_or_default(),
                "Signing key missing for a recorded account"
            );
            return Err(Error::MissingSigningKey {
                alias: alias.to_string(),
            });
        }
        tracing::error!(
            alias,
            recorded_public_key = recorded.unwrap_or_default(),
            "Signing key missing; minting a NEW identity under the same alias. \
             Contracts administered by the old key are no longer controllable"
        );
        Ok(())
    }

    async fn create(&self, alias: &str, ledger: &mut DeploymentLedger) -> Result<Account> {
        let generated = self.keystore.generate(alias).await?;

        if let Err(e) = self.faucet.fund(&generated.public_key).await {
            tracing::warn!(alias, error = %e, "Faucet funding failed, continuing");
        }

        let account = Account {
            alias: alias.to_string(),
            public_key: generated.public_key,
            secret_key: Some(generated.secret_key),
        };
        self.store.save(&account)?;
        ledger.set(alias, &account.public_key)?;

        tracing::info!(alias, public_key = %account.public_key, "Account provisioned");
        Ok(account)
    }
}
