//! Configuration for the deployment harness
//!
//! A single [`Config`] is built at start-up (defaults, optionally overridden by
//! a JSON file) and passed by reference into every component.

pub mod network;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use network::NetworkConfig;

use crate::contracts::ContractDescriptor;

/// Default signing identity used for deployment and administration
pub const DEFAULT_ADMIN_ALIAS: &str = "admin";

/// Filesystem layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding the ledger and credential files
    pub deployments_dir: PathBuf,
    /// Cargo workspace containing the contract crates
    pub workspace_dir: PathBuf,
    /// Target triple the contracts compile to
    pub wasm_target: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            deployments_dir: PathBuf::from("deployments"),
            workspace_dir: PathBuf::from("."),
            wasm_target: "wasm32-unknown-unknown".to_string(),
        }
    }
}

/// Pre-existing network contracts the protocol is wired against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalAssets {
    /// Native XLM stellar asset contract
    pub xlm_token: String,
    /// USDC token contract
    pub usdc_token: String,
    /// Blend lending pool
    pub blend_pool: String,
    /// Reflector price oracle
    pub reflector_oracle: String,
}

impl Default for ExternalAssets {
    fn default() -> Self {
        // Testnet deployments
        Self {
            xlm_token: "CDLZFC3SYJYDZT7K67VZ75HPJVIEUVNIXF47ZG2FB2RMQQVU2HHGCYSC".to_string(),
            usdc_token: "CBIELTK6YBZJU5UP2WWQEUCYKLPU6AUNZ2BQ4WWFEIE3USCIHMXQDAMA".to_string(),
            blend_pool: "CCLBPEYS3XFK65MYYXSBMOGKUI4ODN5S7SUZBGD7NALUQF64QILLX5B5".to_string(),
            reflector_oracle: "CCYOZJCOPG34LLQQ7N24YXBM7LL62R7ONMZ3G6WZAAYPB5OYKOMJRN63"
                .to_string(),
        }
    }
}

/// Interest rate curve passed to the pool at initialization (basis points)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InterestRateParams {
    pub base_rate: u32,
    pub slope1: u32,
    pub slope2: u32,
    pub optimal_utilization: u32,
}

impl Default for InterestRateParams {
    fn default() -> Self {
        Self {
            base_rate: 200,            // 2%
            slope1: 400,               // 4%
            slope2: 7500,              // 75%
            optimal_utilization: 8000, // 80%
        }
    }
}

/// Risk engine parameters (basis points unless noted)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RiskParams {
    pub k_factor: u32,
    /// Days
    pub time_horizon_days: u32,
    pub stop_loss_threshold: i64,
    pub liquidation_threshold: i64,
    pub target_health_factor: i64,
    pub liquidation_penalty: u32,
    pub protocol_fee: u32,
    pub min_collateral_factor: u32,
}

impl Default for RiskParams {
    fn default() -> Self {
        Self {
            k_factor: 100,
            time_horizon_days: 30,
            stop_loss_threshold: 10200,
            liquidation_threshold: 10000,
            target_health_factor: 10500,
            liquidation_penalty: 500,
            protocol_fee: 100,
            min_collateral_factor: 3000,
        }
    }
}

/// Collateral asset registered with the oracle, adapter and pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollateralParams {
    /// Oracle symbol
    pub symbol: String,
    pub decimals: u32,
    pub base_ltv: u32,
    pub collateral_factor: u32,
    pub liquidation_threshold: u32,
    pub liquidation_penalty: u32,
    /// Reserve index of the asset inside the Blend pool
    pub reserve_index: u32,
}

impl Default for CollateralParams {
    fn default() -> Self {
        Self {
            symbol: "XLM".to_string(),
            decimals: 7,
            base_ltv: 7500,
            collateral_factor: 7500,
            liquidation_threshold: 8000,
            liquidation_penalty: 500,
            reserve_index: 0,
        }
    }
}

/// Oracle seeding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleParams {
    /// Seconds before a price is considered stale
    pub staleness_threshold_secs: u64,
    /// Initial collateral price, USD with 14 decimals
    pub initial_price: i64,
}

impl Default for OracleParams {
    fn default() -> Self {
        Self {
            staleness_threshold_secs: 300,
            initial_price: 12_000_000_000_000, // $0.12
        }
    }
}

/// Protocol defaults consumed when composing initialization calls
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProtocolParams {
    pub interest: InterestRateParams,
    pub risk: RiskParams,
    pub collateral: CollateralParams,
    pub oracle: OracleParams,
}

/// Bounded poll used while waiting for transaction finality
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalityConfig {
    pub attempts: u32,
    pub interval_ms: u64,
}

impl Default for FinalityConfig {
    fn default() -> Self {
        Self {
            attempts: 10,
            interval_ms: 2_000,
        }
    }
}

/// Amounts used by the payment-flow suite (token base units)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentFlowParams {
    pub deposit_amount: i64,
    pub borrow_amount: i64,
    pub repay_amount: i64,
    pub withdraw_amount: i64,
}

impl Default for PaymentFlowParams {
    fn default() -> Self {
        Self {
            deposit_amount: 1_000_000_000, // 100 XLM
            borrow_amount: 50_000_000,     // 5 USDC
            repay_amount: 50_000_000,
            withdraw_amount: 1_000_000_000,
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Target network
    pub network: NetworkConfig,
    /// Filesystem layout
    #[serde(default)]
    pub paths: PathsConfig,
    /// Alias of the deploying/admin identity
    pub admin_alias: String,
    /// External contracts
    #[serde(default)]
    pub assets: ExternalAssets,
    /// Protocol defaults
    #[serde(default)]
    pub protocol: ProtocolParams,
    /// Finality polling
    #[serde(default)]
    pub finality: FinalityConfig,
    /// Payment-flow amounts
    #[serde(default)]
    pub payment_flow: PaymentFlowParams,
    /// Mint a new key when a recorded alias lost its secret
    #[serde(default)]
    pub allow_key_regeneration: bool,
    /// Path to the invocation audit log (JSONL)
    pub audit_log_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::for_network(NetworkConfig::default())
    }
}

impl Config {
    /// Default settings targeting `network`
    pub fn for_network(network: NetworkConfig) -> Self {
        Self {
            network,
            paths: PathsConfig::default(),
            admin_alias: DEFAULT_ADMIN_ALIAS.to_string(),
            assets: ExternalAssets::default(),
            protocol: ProtocolParams::default(),
            finality: FinalityConfig::default(),
            payment_flow: PaymentFlowParams::default(),
            allow_key_regeneration: false,
            audit_log_path: None,
        }
    }

    /// Load a JSON config file
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::Config(format!("{}: {}", path.display(), e)))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("{}: {}", path.display(), e)))?;
        config.network.validate()?;
        Ok(config)
    }

    /// Ledger file for the configured network
    pub fn ledger_path(&self) -> PathBuf {
        self.paths
            .deployments_dir
            .join(format!("{}.json", self.network.name))
    }

    /// Directory for `<alias>_keys.json` credential files
    pub fn credentials_dir(&self) -> &Path {
        &self.paths.deployments_dir
    }

    /// Directory holding compiled wasm for a profile
    pub fn artifacts_dir(&self, profile: &str) -> PathBuf {
        self.paths
            .workspace_dir
            .join("target")
            .join(&self.paths.wasm_target)
            .join(profile)
    }

    /// Release artifact path for a contract
    pub fn artifact_path(&self, descriptor: &ContractDescriptor) -> PathBuf {
        self.artifacts_dir("release").join(descriptor.artifact)
    }
}
