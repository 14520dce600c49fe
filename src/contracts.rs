//! The fixed deployment graph
//!
//! Contracts are deployed, initialized and verified strictly in the order of
//! [`DEPLOYMENT_GRAPH`]; later contracts reference the addresses of earlier ones.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the protocol contracts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractKind {
    OracleAdapter,
    BlendAdapter,
    VantisPool,
    RiskEngine,
    BorrowLimitPolicy,
}

impl ContractKind {
    /// All contracts in dependency order
    pub const ALL: [ContractKind; 5] = [
        ContractKind::OracleAdapter,
        ContractKind::BlendAdapter,
        ContractKind::VantisPool,
        ContractKind::RiskEngine,
        ContractKind::BorrowLimitPolicy,
    ];

    pub fn descriptor(&self) -> &'static ContractDescriptor {
        &DEPLOYMENT_GRAPH[self.order()]
    }

    /// Ledger key
    pub fn name(&self) -> &'static str {
        self.descriptor().logical_name
    }

    pub fn order(&self) -> usize {
        match self {
            ContractKind::OracleAdapter => 0,
            ContractKind::BlendAdapter => 1,
            ContractKind::VantisPool => 2,
            ContractKind::RiskEngine => 3,
            ContractKind::BorrowLimitPolicy => 4,
        }
    }

    /// Resolve a logical name, also accepting the cargo package spelling
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|kind| {
            let descriptor = kind.descriptor();
            descriptor.logical_name == normalized
                || descriptor.package.replace('-', "_") == normalized
        })
    }
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Static description of a deployable contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractDescriptor {
    pub kind: ContractKind,
    /// Key in the deployment ledger
    pub logical_name: &'static str,
    /// Cargo package producing the artifact
    pub package: &'static str,
    /// Wasm file name inside the target directory
    pub artifact: &'static str,
    /// Position in the deployment order
    pub order: usize,
}

pub static DEPLOYMENT_GRAPH: [ContractDescriptor; 5] = [
    ContractDescriptor {
        kind: ContractKind::OracleAdapter,
        logical_name: "oracle_adapter",
        package: "oracle-adapter",
        artifact: "oracle_adapter.wasm",
        order: 0,
    },
    ContractDescriptor {
        kind: ContractKind::BlendAdapter,
        logical_name: "blend_adapter",
        package: "blend-adapter",
        artifact: "blend_adapter.wasm",
        order: 1,
    },
    ContractDescriptor {
        kind: ContractKind::VantisPool,
        logical_name: "vantis_pool",
        package: "vantis-pool",
        artifact: "vantis_pool.wasm",
        order: 2,
    },
    ContractDescriptor {
        kind: ContractKind::RiskEngine,
        logical_name: "risk_engine",
        package: "risk-engine",
        artifact: "risk_engine.wasm",
        order: 3,
    },
    ContractDescriptor {
        kind: ContractKind::BorrowLimitPolicy,
        logical_name: "borrow_limit_policy",
        package: "borrow-limit",
        artifact: "borrow_limit.wasm",
        order: 4,
    },
];
