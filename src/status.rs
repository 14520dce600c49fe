//! Deployment status report

use crate::contracts::ContractKind;
use crate::invoker::ContractInvoker;
use crate::ledger::DeploymentLedger;
use crate::rpc::RpcClient;
use crate::Result;

/// Liveness of one ledger contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Liveness {
    NotDeployed,
    /// `admin` answered with this address
    Live(String),
    Unreachable(String),
}

#[derive(Debug, Clone)]
pub struct ContractStatus {
    pub kind: ContractKind,
    pub address: Option<String>,
    pub liveness: Liveness,
}

#[derive(Debug, Clone)]
pub struct StatusReport {
    pub network: String,
    /// Non-contract ledger entries (accounts)
    pub accounts: Vec<(String, String)>,
    pub contracts: Vec<ContractStatus>,
    /// `getHealth` status, or the error text
    pub rpc_health: std::result::Result<String, String>,
}

impl StatusReport {
    pub fn print(&self) {
        println!("Network: {}", self.network);
        match &self.rpc_health {
            Ok(status) => println!("RPC:     {}", status),
            Err(e) => println!("RPC:     unreachable ({})", e),
        }
        println!();
        for (name, value) in &self.accounts {
            println!("  {:<22} {}", name, value);
        }
        for contract in &self.contracts {
            let address = contract.address.as_deref().unwrap_or("-");
            let state = match &contract.liveness {
                Liveness::NotDeployed => "not deployed".to_string(),
                Liveness::Live(_) => "live".to_string(),
                Liveness::Unreachable(reason) => format!("unreachable: {}", reason),
            };
            println!("  {:<22} {:<58} {}", contract.kind.name(), address, state);
        }
    }
}

/// Probe every contract of the deployment graph
pub async fn contract_statuses(
    ledger: &DeploymentLedger,
    invoker: &dyn ContractInvoker,
) -> Result<Vec<ContractStatus>> {
    let mut statuses = Vec::new();
    for kind in ContractKind::ALL {
        let Some(address) = ledger.get(kind.name()) else {
            statuses.push(ContractStatus {
                kind,
                address: None,
                liveness: Liveness::NotDeployed,
            });
            continue;
        };

        let result = invoker.read(address, "admin", &[]).await?;
        let liveness = if result.is_ok() {
            Liveness::Live(result.value().to_string())
        } else {
            Liveness::Unreachable(result.outcome.to_string())
        };
        statuses.push(ContractStatus {
            kind,
            address: Some(address.to_string()),
            liveness,
        });
    }
    Ok(statuses)
}

pub async fn collect(
    network: &str,
    ledger: &DeploymentLedger,
    invoker: &dyn ContractInvoker,
    rpc: &RpcClient,
) -> Result<StatusReport> {
    let contract_names: Vec<&str> = ContractKind::ALL.iter().map(|k| k.name()).collect();
    let accounts = ledger
        .entries()
        .filter(|(name, _)| !contract_names.contains(name))
        .map(|(n, v)| (n.to_string(), v.to_string()))
        .collect();

    let rpc_health = rpc
        .get_health()
        .await
        .map(|h| match h.latest_ledger {
            Some(seq) => format!("{} (ledger {})", h.status, seq),
            None => h.status,
        })
        .map_err(|e| e.to_string());

    Ok(StatusReport {
        network: network.to_string(),
        accounts,
        contracts: contract_statuses(ledger, invoker).await?,
        rpc_health,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suites::tests::deployed_context;
    use crate::testing::FakeChain;
    use tempfile::tempdir;

    #[tokio::test]
    async fn deployed_contracts_are_live() {
        let (_dir, chain, context) = deployed_context().await;
        let statuses = contract_statuses(&context.ledger, &chain).await.unwrap();

        assert_eq!(statuses.len(), 5);
        for status in statuses {
            assert_eq!(status.liveness, Liveness::Live(context.admin.clone()));
        }
    }

    #[tokio::test]
    async fn missing_and_dead_contracts_are_reported() {
        let dir = tempdir().unwrap();
        let mut ledger = DeploymentLedger::open(dir.path().join("testnet.json")).unwrap();
        ledger
            .set("oracle_adapter", "CAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA")
            .unwrap();

        let statuses = contract_statuses(&ledger, &FakeChain::new()).await.unwrap();
        assert!(matches!(statuses[0].liveness, Liveness::Unreachable(_)));
        assert_eq!(statuses[1].liveness, Liveness::NotDeployed);
    }
}
