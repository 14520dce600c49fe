//! Vantis deployment harness
//!
//! Deploys the Vantis lending contracts to a Soroban network and verifies
//! them end to end:
//! - Provisions and funds the admin identity
//! - Deploys, initializes and wires the contracts in dependency order
//! - Runs verification suites against the live deployment
//!
//! All network access goes through the `stellar` CLI and the Soroban RPC.
//! Deployment state lives in a per-network JSON ledger so every run can be
//! replayed safely.

pub mod accounts;
pub mod artifacts;
pub mod config;
pub mod contracts;
pub mod invoker;
pub mod ledger;
pub mod orchestrator;
pub mod rpc;
pub mod status;
pub mod suites;
pub mod toolchain;

mod error;

#[cfg(test)]
mod testing;

pub use config::{Config, NetworkConfig};
pub use contracts::{ContractKind, DEPLOYMENT_GRAPH};
pub use error::{Error, Result};
pub use invoker::{ContractInvoker, InvocationResult, Outcome, StellarInvoker};
pub use ledger::DeploymentLedger;
pub use orchestrator::{DeployOptions, DeployReport, Orchestrator};
pub use suites::{SuiteName, SuiteSummary, TestRunner};
