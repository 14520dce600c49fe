//! Deployment orchestration
//!
//! A deployment is a fixed list of [`Stage`]s executed in order. Every stage
//! has a guard that makes it a no-op when its effect is already in place, so
//! a replay against a complete deployment issues only reads.
//!
//! Fatal: build failure, missing artifact, deploy output without an address,
//! ledger I/O. Everything after deployment is recorded in the
//! [`DeployReport`] and the run continues.

pub mod calls;

use crate::accounts::{Account, AccountProvisioner};
use crate::artifacts::{ArtifactBuilder, BuildOptions};
use crate::config::Config;
use crate::contracts::ContractKind;
use crate::invoker::{extract_contract_address, ContractInvoker, InvocationResult, Outcome};
use crate::ledger::DeploymentLedger;
use crate::rpc::{await_finality, Finality, TransactionTracker};
use crate::{Error, Result};
use std::fmt;
use tracing::{error, info, warn};

/// Post-initialization wiring steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigureStep {
    RegisterOracleAsset,
    SetStalenessThreshold,
    RegisterAdapterAsset,
    RegisterPoolCollateral,
    LinkRiskEngine,
    SeedPrice,
}

impl ConfigureStep {
    pub const ALL: [ConfigureStep; 6] = [
        ConfigureStep::RegisterOracleAsset,
        ConfigureStep::SetStalenessThreshold,
        ConfigureStep::RegisterAdapterAsset,
        ConfigureStep::RegisterPoolCollateral,
        ConfigureStep::LinkRiskEngine,
        ConfigureStep::SeedPrice,
    ];

    pub fn target(&self) -> ContractKind {
        match self {
            ConfigureStep::RegisterOracleAsset
            | ConfigureStep::SetStalenessThreshold
            | ConfigureStep::SeedPrice => ContractKind::OracleAdapter,
            ConfigureStep::RegisterAdapterAsset => ContractKind::BlendAdapter,
            ConfigureStep::RegisterPoolCollateral | ConfigureStep::LinkRiskEngine => {
                ContractKind::VantisPool
            }
        }
    }

    pub fn function(&self) -> &'static str {
        match self {
            ConfigureStep::RegisterOracleAsset => "add_asset",
            ConfigureStep::SetStalenessThreshold => "set_staleness_threshold",
            ConfigureStep::RegisterAdapterAsset => "register_asset",
            ConfigureStep::RegisterPoolCollateral => "add_collateral_asset",
            ConfigureStep::LinkRiskEngine => "set_risk_engine",
            ConfigureStep::SeedPrice => "update_price",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Build,
    ProvisionAdmin,
    Deploy(ContractKind),
    Initialize(ContractKind),
    Configure(ConfigureStep),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Build => f.write_str("build"),
            Stage::ProvisionAdmin => f.write_str("provision admin"),
            Stage::Deploy(kind) => write!(f, "deploy {}", kind),
            Stage::Initialize(kind) => write!(f, "initialize {}", kind),
            Stage::Configure(step) => write!(f, "{}.{}", step.target(), step.function()),
        }
    }
}

/// The full stage list in execution order
pub fn plan(options: &DeployOptions) -> Vec<Stage> {
    let mut stages = Vec::new();
    if options.build {
        stages.push(Stage::Build);
    }
    stages.push(Stage::ProvisionAdmin);
    stages.extend(ContractKind::ALL.iter().map(|k| Stage::Deploy(*k)));
    stages.extend(ContractKind::ALL.iter().map(|k| Stage::Initialize(*k)));
    stages.extend(ConfigureStep::ALL.iter().map(|s| Stage::Configure(*s)));
    stages
}

#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// Compile contracts before deploying
    pub build: bool,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self { build: true }
    }
}

/// A stage that failed without aborting the run
#[derive(Debug, Clone)]
pub struct StageFailure {
    pub stage: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct DeployReport {
    /// Contracts deployed in this run
    pub deployed: Vec<String>,
    /// Stages skipped because their effect was already in place
    pub skipped: Vec<String>,
    pub failures: Vec<StageFailure>,
}

impl DeployReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, stage: Stage, reason: impl Into<String>) {
        let reason = reason.into();
        error!(stage = %stage, reason = %reason, "Stage failed");
        self.failures.push(StageFailure {
            stage: stage.to_string(),
            reason,
        });
    }
}

pub struct Orchestrator<'a> {
    config: &'a Config,
    invoker: &'a dyn ContractInvoker,
    provisioner: &'a AccountProvisioner<'a>,
    tracker: &'a dyn TransactionTracker,
    builder: Option<&'a ArtifactBuilder<'a>>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        config: &'a Config,
        invoker: &'a dyn ContractInvoker,
        provisioner: &'a AccountProvisioner<'a>,
        tracker: &'a dyn TransactionTracker,
    ) -> Self {
        Self {
            config,
            invoker,
            provisioner,
            tracker,
            builder: None,
        }
    }

    pub fn with_builder(mut self, builder: &'a ArtifactBuilder<'a>) -> Self {
        self.builder = Some(builder);
        self
    }

    /// Run every stage of [`plan`]
    pub async fn run(
        &self,
        ledger: &mut DeploymentLedger,
        options: &DeployOptions,
    ) -> Result<DeployReport> {
        let mut report = DeployReport::default();
        let mut admin: Option<Account> = None;

        info!(network = %self.config.network.name, ledger = %ledger.path().display(), "Starting deployment");

        for stage in plan(options) {
            match stage {
                Stage::Build => self.build().await?,
                Stage::ProvisionAdmin => {
                    let account = self
                        .provisioner
                        .provision(&self.config.admin_alias, ledger)
                        .await?;
                    info!(alias = %account.alias, public_key = %account.public_key, "Admin ready");
                    admin = Some(account);
                }
                Stage::Deploy(kind) => self.deploy(kind, ledger, &mut report).await?,
                Stage::Initialize(kind) => {
                    let admin = admin.as_ref().ok_or_else(|| missing_admin(stage))?;
                    self.initialize(kind, admin, ledger, &mut report).await?;
                }
                Stage::Configure(step) => {
                    let admin = admin.as_ref().ok_or_else(|| missing_admin(stage))?;
                    self.configure(step, admin, ledger, &mut report).await?;
                }
            }
        }

        if report.is_success() {
            info!(
                deployed = report.deployed.len(),
                skipped = report.skipped.len(),
                "Deployment complete"
            );
        } else {
            warn!(failures = report.failures.len(), "Deployment finished with failures");
        }
        Ok(report)
    }

    async fn build(&self) -> Result<()> {
        match self.builder {
            Some(builder) => {
                builder.build(&BuildOptions::default()).await?;
                Ok(())
            }
            None => {
                tracing::debug!("No artifact builder configured, skipping build");
                Ok(())
            }
        }
    }

    async fn deploy(
        &self,
        kind: ContractKind,
        ledger: &mut DeploymentLedger,
        report: &mut DeployReport,
    ) -> Result<()> {
        let name = kind.name();
        if let Some(address) = ledger.get(name) {
            info!(contract = name, address, "Already deployed, skipping");
            report.skipped.push(Stage::Deploy(kind).to_string());
            return Ok(());
        }

        let wasm = self.config.artifact_path(kind.descriptor());
        info!(contract = name, wasm = %wasm.display(), "Deploying");
        let result = self.invoker.deploy(&wasm, &self.config.admin_alias).await?;

        let address = extract_contract_address(&result.raw_output).ok_or_else(|| {
            if let Outcome::GenericError { reason } = &result.outcome {
                error!(contract = name, reason = %reason, "Deploy failed");
            }
            Error::AddressNotFound {
                contract: name.to_string(),
            }
        })?;

        ledger.set(name, &address)?;
        info!(contract = name, address = %address, "Deployed");
        report.deployed.push(name.to_string());
        Ok(())
    }

    async fn initialize(
        &self,
        kind: ContractKind,
        admin: &Account,
        ledger: &DeploymentLedger,
        report: &mut DeployReport,
    ) -> Result<()> {
        let stage = Stage::Initialize(kind);
        let address = contract_address(ledger, kind)?;

        let guard = self.invoker.read(&address, "admin", &[]).await?;
        if guard.is_ok() && !guard.value().is_empty() {
            info!(contract = %kind, admin = guard.value(), "Already initialized, skipping");
            report.skipped.push(stage.to_string());
            return Ok(());
        }

        let args = calls::initialize_args(kind, self.config, &admin.public_key, ledger)?;
        info!(contract = %kind, "Initializing");
        let result = self
            .invoker
            .invoke(&address, "initialize", &self.config.admin_alias, &args)
            .await?;
        self.settle(stage, &result, report).await;
        Ok(())
    }

    async fn configure(
        &self,
        step: ConfigureStep,
        admin: &Account,
        ledger: &DeploymentLedger,
        report: &mut DeployReport,
    ) -> Result<()> {
        let stage = Stage::Configure(step);
        let address = contract_address(ledger, step.target())?;
        let caller = admin.public_key.as_str();

        let args = match step {
            ConfigureStep::RegisterOracleAsset => {
                let supported = self
                    .invoker
                    .read(&address, "is_asset_supported", &calls::oracle_is_asset_supported(self.config))
                    .await?;
                if supported.is_ok() && supported.value() == "true" {
                    info!(asset = %self.config.protocol.collateral.symbol, "Oracle asset already registered");
                    report.skipped.push(stage.to_string());
                    return Ok(());
                }
                calls::oracle_add_asset(self.config, caller)
            }
            ConfigureStep::SetStalenessThreshold => {
                if self.config.protocol.oracle.staleness_threshold_secs
                    == calls::DEFAULT_STALENESS_SECS
                {
                    report.skipped.push(stage.to_string());
                    return Ok(());
                }
                calls::oracle_set_staleness(self.config, caller)
            }
            ConfigureStep::RegisterAdapterAsset => calls::blend_register_asset(self.config, caller),
            ConfigureStep::RegisterPoolCollateral => calls::pool_add_collateral(self.config, caller),
            ConfigureStep::LinkRiskEngine => calls::pool_set_risk_engine(caller, ledger)?,
            ConfigureStep::SeedPrice => calls::oracle_update_price(self.config, caller),
        };

        info!(stage = %stage, "Configuring");
        let result = self
            .invoker
            .invoke(&address, step.function(), &self.config.admin_alias, &args)
            .await?;
        self.settle(stage, &result, report).await;
        Ok(())
    }

    /// Record the outcome of a state-changing call and wait for its transaction
    async fn settle(&self, stage: Stage, result: &InvocationResult, report: &mut DeployReport) {
        match &result.outcome {
            Outcome::Success { tx_hash } => {
                if let Some(hash) = tx_hash {
                    match await_finality(self.tracker, hash, &self.config.finality).await {
                        Finality::Confirmed => info!(stage = %stage, tx = %hash, "Confirmed"),
                        Finality::Failed => {
                            report.fail(stage, format!("transaction {} failed on chain", hash))
                        }
                        Finality::Pending => {
                            warn!(stage = %stage, tx = %hash, "Transaction not final after polling, continuing")
                        }
                    }
                } else {
                    info!(stage = %stage, "Done");
                }
            }
            Outcome::AlreadyDone => info!(stage = %stage, "Already done"),
            Outcome::GenericError { reason } => report.fail(stage, reason.clone()),
            other => report.fail(stage, other.to_string()),
        }
    }
}

fn contract_address(ledger: &DeploymentLedger, kind: ContractKind) -> Result<String> {
    ledger
        .get(kind.name())
        .map(str::to_string)
        .ok_or_else(|| Error::MissingDeployment(kind.name().to_string()))
}

fn missing_admin(stage: Stage) -> Error {
    Error::Config(format!("{} reached before the admin account was provisioned", stage))
}
