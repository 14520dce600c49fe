//! Argument sets for initialization and wiring calls
//!
//! Struct arguments are passed as JSON objects, the form `stellar contract
//! invoke` accepts for contract types.

use crate::config::Config;
use crate::contracts::ContractKind;
use crate::invoker::CallArg;
use crate::ledger::DeploymentLedger;
use crate::{Error, Result};
use serde_json::json;

/// Contract default staleness window
pub const DEFAULT_STALENESS_SECS: u64 = 300;

fn address_of(ledger: &DeploymentLedger, kind: ContractKind) -> Result<String> {
    ledger
        .get(kind.name())
        .map(str::to_string)
        .ok_or_else(|| Error::MissingDeployment(kind.name().to_string()))
}

/// `initialize` arguments for `kind`
///
/// Fails if a contract it references has not been deployed yet.
pub fn initialize_args(
    kind: ContractKind,
    config: &Config,
    admin: &str,
    ledger: &DeploymentLedger,
) -> Result<Vec<CallArg>> {
    let assets = &config.assets;
    let admin_arg = CallArg::new("admin", admin);

    let args = match kind {
        ContractKind::OracleAdapter => vec![
            admin_arg,
            CallArg::new("oracle_contract", &assets.reflector_oracle),
        ],
        ContractKind::BlendAdapter => vec![
            admin_arg,
            CallArg::new("blend_pool", &assets.blend_pool),
            CallArg::new("oracle", address_of(ledger, ContractKind::OracleAdapter)?),
            CallArg::new("usdc_token", &assets.usdc_token),
        ],
        ContractKind::VantisPool => {
            let interest = &config.protocol.interest;
            vec![
                admin_arg,
                CallArg::new("oracle", address_of(ledger, ContractKind::OracleAdapter)?),
                CallArg::new("xlm_token", &assets.xlm_token),
                CallArg::new(
                    "blend_pool_address",
                    address_of(ledger, ContractKind::BlendAdapter)?,
                ),
                CallArg::new(
                    "interest_params",
                    json!({
                        "base_rate": interest.base_rate,
                        "slope1": interest.slope1,
                        "slope2": interest.slope2,
                        "optimal_utilization": interest.optimal_utilization,
                    })
                    .to_string(),
                ),
            ]
        }
        ContractKind::RiskEngine => {
            let risk = &config.protocol.risk;
            vec![
                admin_arg,
                CallArg::new("oracle", address_of(ledger, ContractKind::OracleAdapter)?),
                CallArg::new("pool", address_of(ledger, ContractKind::VantisPool)?),
                CallArg::new("usdc_token", &assets.usdc_token),
                CallArg::new(
                    "blend_adapter",
                    address_of(ledger, ContractKind::BlendAdapter)?,
                ),
                CallArg::new(
                    "params",
                    json!({
                        "k_factor": risk.k_factor,
                        "time_horizon_days": risk.time_horizon_days,
                        "stop_loss_threshold": risk.stop_loss_threshold.to_string(),
                        "liquidation_threshold": risk.liquidation_threshold.to_string(),
                        "target_health_factor": risk.target_health_factor.to_string(),
                        "liquidation_penalty": risk.liquidation_penalty,
                        "protocol_fee": risk.protocol_fee,
                        "min_collateral_factor": risk.min_collateral_factor,
                    })
                    .to_string(),
                ),
            ]
        }
        ContractKind::BorrowLimitPolicy => vec![admin_arg],
    };
    Ok(args)
}

/// Oracle `add_asset` for the collateral
pub fn oracle_add_asset(config: &Config, admin: &str) -> Vec<CallArg> {
    let collateral = &config.protocol.collateral;
    vec![
        CallArg::new("caller", admin),
        CallArg::new(
            "config",
            json!({
                "symbol": collateral.symbol,
                "contract": config.assets.xlm_token,
                "decimals": collateral.decimals,
                "base_ltv": collateral.base_ltv,
                "liquidation_threshold": collateral.liquidation_threshold,
            })
            .to_string(),
        ),
    ]
}

pub fn oracle_is_asset_supported(config: &Config) -> Vec<CallArg> {
    vec![CallArg::new("asset", &config.protocol.collateral.symbol)]
}

pub fn oracle_set_staleness(config: &Config, admin: &str) -> Vec<CallArg> {
    vec![
        CallArg::new("caller", admin),
        CallArg::new(
            "threshold_seconds",
            config.protocol.oracle.staleness_threshold_secs.to_string(),
        ),
    ]
}

pub fn oracle_update_price(config: &Config, admin: &str) -> Vec<CallArg> {
    vec![
        CallArg::new("caller", admin),
        CallArg::new("asset", &config.protocol.collateral.symbol),
        CallArg::new("price", config.protocol.oracle.initial_price.to_string()),
    ]
}

pub fn blend_register_asset(config: &Config, admin: &str) -> Vec<CallArg> {
    vec![
        CallArg::new("caller", admin),
        CallArg::new("asset", &config.assets.xlm_token),
        CallArg::new(
            "reserve_index",
            config.protocol.collateral.reserve_index.to_string(),
        ),
    ]
}

pub fn pool_add_collateral(config: &Config, admin: &str) -> Vec<CallArg> {
    let collateral = &config.protocol.collateral;
    vec![
        CallArg::new("caller", admin),
        CallArg::new(
            "config",
            json!({
                "token": config.assets.xlm_token,
                "symbol": collateral.symbol,
                "collateral_factor": collateral.collateral_factor,
                "liquidation_threshold": collateral.liquidation_threshold,
                "liquidation_penalty": collateral.liquidation_penalty,
                "is_active": true,
            })
            .to_string(),
        ),
    ]
}

pub fn pool_set_risk_engine(admin: &str, ledger: &DeploymentLedger) -> Result<Vec<CallArg>> {
    Ok(vec![
        CallArg::new("caller", admin),
        CallArg::new("risk_engine", address_of(ledger, ContractKind::RiskEngine)?),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkConfig;
    use tempfile::tempdir;

    #[test]
    fn blend_adapter_needs_oracle_address() {
        let dir = tempdir().unwrap();
        let mut ledger = DeploymentLedger::open(dir.path().join("testnet.json")).unwrap();
        let config = Config::for_network(NetworkConfig::testnet());

        let err = initialize_args(ContractKind::BlendAdapter, &config, "GADMIN", &ledger).unwrap_err();
        assert!(matches!(err, Error::MissingDeployment(name) if name == "oracle_adapter"));

        ledger.set("oracle_adapter", "CORACLE").unwrap();
        let args = initialize_args(ContractKind::BlendAdapter, &config, "GADMIN", &ledger).unwrap();
        assert_eq!(CallArg::value_of(&args, "oracle"), Some("CORACLE"));
        assert_eq!(
            CallArg::value_of(&args, "blend_pool"),
            Some(config.assets.blend_pool.as_str())
        );
    }

    #[test]
    fn risk_params_carry_configured_defaults() {
        let dir = tempdir().unwrap();
        let mut ledger = DeploymentLedger::open(dir.path().join("testnet.json")).unwrap();
        for (name, addr) in [
            ("oracle_adapter", "CORACLE"),
            ("blend_adapter", "CBLEND"),
            ("vantis_pool", "CPOOL"),
        ] {
            ledger.set(name, addr).unwrap();
        }
        let config = Config::for_network(NetworkConfig::testnet());

        let args = initialize_args(ContractKind::RiskEngine, &config, "GADMIN", &ledger).unwrap();
        let params: serde_json::Value =
            serde_json::from_str(CallArg::value_of(&args, "params").unwrap()).unwrap();
        assert_eq!(params["k_factor"], 100);
        assert_eq!(params["time_horizon_days"], 30);
        assert_eq!(params["stop_loss_threshold"], "10200");
        assert_eq!(params["min_collateral_factor"], 3000);
        assert_eq!(CallArg::value_of(&args, "blend_adapter"), Some("CBLEND"));
        assert_eq!(CallArg::value_of(&args, "pool"), Some("CPOOL"));
    }

    #[test]
    fn pool_points_at_blend_adapter() {
        let dir = tempdir().unwrap();
        let mut ledger = DeploymentLedger::open(dir.path().join("testnet.json")).unwrap();
        ledger.set("oracle_adapter", "CORACLE").unwrap();
        ledger.set("blend_adapter", "CBLEND").unwrap();

        let config = Config::for_network(NetworkConfig::testnet());
        let args = initialize_args(ContractKind::VantisPool, &config, "GADMIN", &ledger).unwrap();
        assert_eq!(CallArg::value_of(&args, "blend_pool_address"), Some("CBLEND"));
        let interest: serde_json::Value =
            serde_json::from_str(CallArg::value_of(&args, "interest_params").unwrap()).unwrap();
        assert_eq!(interest["optimal_utilization"], 8000);
    }
}
