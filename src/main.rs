//! Vantis deployment harness CLI

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vantis_harness::accounts::{AccountProvisioner, CredentialStore, FriendbotFaucet, StellarKeyStore};
use vantis_harness::artifacts::{ArtifactBuilder, BuildOptions, BuildProfile};
use vantis_harness::invoker::{AuditedInvoker, CallArg};
use vantis_harness::rpc::RpcClient;
use vantis_harness::suites::TestContext;
use vantis_harness::toolchain::StellarCli;
use vantis_harness::{
    status, Config, ContractInvoker, ContractKind, DeployOptions, DeploymentLedger, Error,
    Orchestrator, Result, StellarInvoker, SuiteName, TestRunner,
};

#[derive(Parser)]
#[command(name = "vantis")]
#[command(about = "Deploy and verify the Vantis lending contracts on Soroban")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Target network (testnet, futurenet, local)
    #[arg(short, long, global = true)]
    network: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy, initialize and wire all contracts
    Deploy {
        /// Clear the deployment ledger and admin credentials first
        #[arg(long)]
        reset: bool,

        /// Build contracts before deploying (default)
        #[arg(long, overrides_with = "no_build")]
        build: bool,

        /// Deploy existing artifacts without building
        #[arg(long)]
        no_build: bool,

        /// Mint a new admin key if the recorded one is missing locally
        #[arg(long)]
        allow_key_regeneration: bool,
    },

    /// Run end-to-end verification suites
    E2eTests {
        #[arg(short, long, value_enum, default_value_t = SuiteName::All)]
        suite: SuiteName,
    },

    /// Call a deployed contract function
    Invoke {
        /// Contract name (e.g. vantis_pool) or address
        contract: String,

        /// Function name
        function: String,

        /// Simulate only, do not submit
        #[arg(long)]
        read: bool,

        /// Function arguments, passed through (e.g. --user G... --amount 100)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Build contract artifacts
    Build {
        /// Release profile (default)
        #[arg(long, conflicts_with = "debug")]
        release: bool,

        /// Debug profile
        #[arg(long)]
        debug: bool,

        /// Build a single contract
        #[arg(long)]
        contract: Option<String>,

        /// Clean build outputs first
        #[arg(long)]
        clean: bool,
    },

    /// Show ledger contents, RPC health and contract liveness
    Status,

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    let json_layer = cli.log_json.then(|| fmt::layer().json());
    let text_layer = (!cli.log_json).then(|| fmt::layer());

    tracing_subscriber::registry()
        .with(json_layer)
        .with(text_layer)
        .with(filter)
        .init();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(name) = cli.network {
        config.network = config.network.select(&name);
    }

    let ok = match cli.command {
        Commands::Deploy {
            reset,
            build: _,
            no_build,
            allow_key_regeneration,
        } => {
            if allow_key_regeneration {
                config.allow_key_regeneration = true;
            }
            run_deploy(&config, reset, !no_build).await?
        }
        Commands::E2eTests { suite } => run_tests(config, suite).await?,
        Commands::Invoke {
            contract,
            function,
            read,
            args,
        } => run_invoke(&config, &contract, &function, read, args).await?,
        Commands::Build {
            release: _,
            debug,
            contract,
            clean,
        } => {
            run_build(&config, debug, contract, clean).await?;
            true
        }
        Commands::Status => {
            run_status(&config).await?;
            true
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            true
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

fn make_invoker(config: &Config) -> Arc<dyn ContractInvoker> {
    let invoker = StellarInvoker::new(StellarCli::from_config(&config.network), &config.admin_alias);
    match &config.audit_log_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Auditing contract calls");
            Arc::new(AuditedInvoker::new(invoker, path))
        }
        None => Arc::new(invoker),
    }
}

async fn run_deploy(config: &Config, reset: bool, build: bool) -> Result<bool> {
    let mut ledger = DeploymentLedger::open(config.ledger_path())?;
    let credentials = CredentialStore::new(config.credentials_dir());

    if reset {
        ledger.reset()?;
        if credentials.remove(&config.admin_alias)? {
            tracing::warn!(alias = %config.admin_alias, "Admin credentials removed");
        }
    }

    let cli = StellarCli::from_config(&config.network);
    let keystore = StellarKeyStore::new(cli);
    let faucet = FriendbotFaucet::new(&config.network.friendbot_url);
    let provisioner = AccountProvisioner::new(credentials, &keystore, &faucet)
        .allow_regeneration(config.allow_key_regeneration);
    let invoker = make_invoker(config);
    let rpc = RpcClient::new(&config.network.rpc_url);
    let builder = ArtifactBuilder::new(config);

    let orchestrator = Orchestrator::new(config, invoker.as_ref(), &provisioner, &rpc).with_builder(&builder);
    let report = orchestrator.run(&mut ledger, &DeployOptions { build }).await?;

    println!();
    println!("Deployed: {}", report.deployed.len());
    println!("Skipped:  {}", report.skipped.len());
    for (name, value) in ledger.entries() {
        println!("  {:<22} {}", name, value);
    }
    if !report.is_success() {
        println!("Failures:");
        for failure in &report.failures {
            println!("  ✗ {}: {}", failure.stage, failure.reason);
        }
    }
    Ok(report.is_success())
}

async fn run_tests(config: Config, suite: SuiteName) -> Result<bool> {
    let ledger = DeploymentLedger::open(config.ledger_path())?;
    let admin = ledger
        .get(&config.admin_alias)
        .ok_or_else(|| Error::MissingDeployment(config.admin_alias.clone()))?
        .to_string();

    let context = TestContext {
        invoker: make_invoker(&config),
        ledger,
        admin,
        config,
    };
    let summary = TestRunner::new(context).run_suite(suite).await;

    println!();
    println!("Summary: {}", summary);
    Ok(summary.is_success())
}

async fn run_invoke(
    config: &Config,
    contract: &str,
    function: &str,
    read: bool,
    args: Vec<String>,
) -> Result<bool> {
    let ledger = DeploymentLedger::open(config.ledger_path())?;
    let address = match ContractKind::from_name(contract) {
        Some(kind) => ledger
            .get(kind.name())
            .ok_or_else(|| Error::MissingDeployment(kind.name().to_string()))?
            .to_string(),
        None if vantis_harness::invoker::classify::is_contract_address(contract) => contract.to_string(),
        None => {
            return Err(Error::InvalidArgument(format!("Unknown contract: {}", contract)));
        }
    };

    let args: Vec<CallArg> = args.into_iter().map(CallArg::raw).collect();
    let invoker = make_invoker(config);
    let result = if read {
        invoker.read(&address, function, &args).await?
    } else {
        invoker
            .invoke(&address, function, &config.admin_alias, &args)
            .await?
    };

    if !result.payload.is_empty() {
        println!("{}", result.payload);
    }
    println!("Outcome: {}", result.outcome);
    if result.outcome.is_error() {
        tracing::error!(contract, function, "{}", result.raw_output.trim());
    }
    Ok(!result.outcome.is_error())
}

async fn run_build(config: &Config, debug: bool, contract: Option<String>, clean: bool) -> Result<()> {
    let contract = contract
        .map(|name| {
            ContractKind::from_name(&name)
                .ok_or_else(|| Error::InvalidArgument(format!("Unknown contract: {}", name)))
        })
        .transpose()?;

    let options = BuildOptions {
        profile: if debug {
            BuildProfile::Debug
        } else {
            BuildProfile::Release
        },
        contract,
        clean,
    };
    let paths = ArtifactBuilder::new(config).build(&options).await?;
    for path in paths {
        println!("{}", path.display());
    }
    Ok(())
}

async fn run_status(config: &Config) -> Result<()> {
    let ledger = DeploymentLedger::open(config.ledger_path())?;
    let invoker = make_invoker(config);
    let rpc = RpcClient::new(&config.network.rpc_url);
    let report = status::collect(&config.network.name, &ledger, invoker.as_ref(), &rpc).await?;
    report.print();
    Ok(())
}
