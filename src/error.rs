//! Error types for the deployment harness

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Required tool `{0}` is not installed or not on PATH")]
    ToolMissing(String),

    #[error("Build failed: {0}")]
    Build(String),

    #[error("Build artifact missing: {}", .0.display())]
    ArtifactMissing(PathBuf),

    #[error("Deployment ledger {} is corrupt: {reason}", .path.display())]
    LedgerCorrupt { path: PathBuf, reason: String },

    #[error("No contract address found in deploy output for {contract}")]
    AddressNotFound { contract: String },

    #[error("`{0}` has no recorded address in the deployment ledger")]
    MissingDeployment(String),

    #[error(
        "Signing key for `{alias}` is missing from the keystore but a public key is recorded; \
         re-run with --allow-key-regeneration to mint a new identity under the same alias"
    )]
    MissingSigningKey { alias: String },

    #[error("Key generation failed for `{alias}`: {reason}")]
    KeyGeneration { alias: String, reason: String },

    #[error("Faucet error: {0}")]
    Faucet(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
