//! End-to-end verification suites
//!
//! A suite is a static list of [`TestCase`]s. The runner executes every case
//! regardless of earlier failures and skips cases whose contracts are not in
//! the ledger.

mod blend;
mod integration;
mod oracle;
mod payment;
mod pool;
mod risk;

use crate::config::Config;
use crate::contracts::ContractKind;
use crate::invoker::{CallArg, ContractInvoker, InvocationResult, Outcome};
use crate::ledger::DeploymentLedger;
use clap::ValueEnum;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    /// Passed, but with an expected precondition failure worth reporting
    Warn(String),
    Fail(String),
}

impl Verdict {
    /// Map a call outcome: preconditions warn, generic errors fail
    pub fn from_result(result: &InvocationResult) -> Self {
        match &result.outcome {
            Outcome::GenericError { reason } => Verdict::Fail(reason.clone()),
            outcome if outcome.is_precondition() => Verdict::Warn(outcome.to_string()),
            _ => Verdict::Pass,
        }
    }

    /// Fail unless `actual` equals `expected`
    pub fn expect_eq(what: &str, actual: &str, expected: &str) -> Self {
        if actual == expected {
            Verdict::Pass
        } else {
            Verdict::Fail(format!("{}: expected {}, got {}", what, expected, actual))
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Verdict::Fail(_))
    }
}

pub type TestFn = for<'a> fn(&'a TestContext) -> BoxFuture<'a, Verdict>;

pub struct TestCase {
    pub name: &'static str,
    /// Contracts that must be in the ledger for the case to run
    pub requires: &'static [ContractKind],
    pub run: TestFn,
}

/// Everything a test case may touch
pub struct TestContext {
    pub invoker: Arc<dyn ContractInvoker>,
    pub ledger: DeploymentLedger,
    /// Admin public key
    pub admin: String,
    pub config: Config,
}

impl TestContext {
    /// Address of a deployed contract; cases only run when it is present
    pub fn address(&self, kind: ContractKind) -> &str {
        self.ledger.get(kind.name()).unwrap_or_default()
    }

    /// Simulated call with error codes read in the numbering of `kind`
    pub async fn read_raw(
        &self,
        kind: ContractKind,
        function: &str,
        args: &[CallArg],
    ) -> crate::Result<InvocationResult> {
        let result = self
            .invoker
            .read(self.address(kind), function, args)
            .await?
            .attributed_to(kind);
        log_result(kind, function, &result);
        Ok(result)
    }

    /// Signed call with error codes read in the numbering of `kind`
    pub async fn invoke_raw(
        &self,
        kind: ContractKind,
        function: &str,
        args: &[CallArg],
    ) -> crate::Result<InvocationResult> {
        let result = self
            .invoker
            .invoke(self.address(kind), function, &self.config.admin_alias, args)
            .await?
            .attributed_to(kind);
        log_result(kind, function, &result);
        Ok(result)
    }

    pub async fn read(&self, kind: ContractKind, function: &str, args: &[CallArg]) -> Verdict {
        match self.read_raw(kind, function, args).await {
            Ok(result) => Verdict::from_result(&result),
            Err(e) => Verdict::Fail(e.to_string()),
        }
    }

    /// Read and return the raw result for value assertions
    pub async fn read_value(
        &self,
        kind: ContractKind,
        function: &str,
        args: &[CallArg],
    ) -> Result<InvocationResult, Verdict> {
        match self.read_raw(kind, function, args).await {
            Ok(result) => match Verdict::from_result(&result) {
                Verdict::Pass => Ok(result),
                other => Err(other),
            },
            Err(e) => Err(Verdict::Fail(e.to_string())),
        }
    }

    pub async fn invoke(&self, kind: ContractKind, function: &str, args: &[CallArg]) -> Verdict {
        match self.invoke_raw(kind, function, args).await {
            Ok(result) => Verdict::from_result(&result),
            Err(e) => Verdict::Fail(e.to_string()),
        }
    }

    /// Read `function` and compare its value with `expected`
    pub async fn expect_value(
        &self,
        kind: ContractKind,
        function: &str,
        args: &[CallArg],
        expected: &str,
    ) -> Verdict {
        match self.read_value(kind, function, args).await {
            Ok(result) => {
                Verdict::expect_eq(&format!("{}.{}", kind, function), result.value(), expected)
            }
            Err(verdict) => verdict,
        }
    }
}

fn log_result(kind: ContractKind, function: &str, result: &InvocationResult) {
    tracing::debug!(contract = %kind, function, outcome = %result.outcome, payload = %result.payload, "call");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SuiteName {
    Oracle,
    Blend,
    Pool,
    Risk,
    Integration,
    Payment,
    All,
}

impl SuiteName {
    /// Concrete suites `self` expands to, in run order
    pub fn expand(&self) -> Vec<SuiteName> {
        match self {
            SuiteName::All => vec![
                SuiteName::Oracle,
                SuiteName::Blend,
                SuiteName::Pool,
                SuiteName::Risk,
                SuiteName::Integration,
                SuiteName::Payment,
            ],
            other => vec![*other],
        }
    }

    pub fn cases(&self) -> &'static [TestCase] {
        match self {
            SuiteName::Oracle => oracle::CASES,
            SuiteName::Blend => blend::CASES,
            SuiteName::Pool => pool::CASES,
            SuiteName::Risk => risk::CASES,
            SuiteName::Integration => integration::CASES,
            SuiteName::Payment => payment::CASES,
            SuiteName::All => &[],
        }
    }
}

impl fmt::Display for SuiteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SuiteName::Oracle => "oracle",
            SuiteName::Blend => "blend",
            SuiteName::Pool => "pool",
            SuiteName::Risk => "risk",
            SuiteName::Integration => "integration",
            SuiteName::Payment => "payment",
            SuiteName::All => "all",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteSummary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Passed with a warning, included in `passed`
    pub warnings: usize,
}

impl SuiteSummary {
    pub fn merge(&mut self, other: &SuiteSummary) {
        self.passed += other.passed;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.warnings += other.warnings;
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for SuiteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "passed: {}  failed: {}  skipped: {}  (warnings: {})",
            self.passed, self.failed, self.skipped, self.warnings
        )
    }
}

pub struct TestRunner {
    context: TestContext,
}

impl TestRunner {
    pub fn new(context: TestContext) -> Self {
        Self { context }
    }

    pub async fn run_suite(&self, suite: SuiteName) -> SuiteSummary {
        let mut summary = SuiteSummary::default();
        for name in suite.expand() {
            info!(suite = %name, "Running suite");
            let part = self.run_cases(name.cases()).await;
            println!("[{}] {}", name, part);
            summary.merge(&part);
        }
        summary
    }

    pub async fn run_cases(&self, cases: &[TestCase]) -> SuiteSummary {
        let mut summary = SuiteSummary::default();
        for case in cases {
            let missing: Vec<&str> = case
                .requires
                .iter()
                .filter(|k| !self.context.ledger.contains(k.name()))
                .map(|k| k.name())
                .collect();
            if !missing.is_empty() {
                warn!(test = case.name, missing = ?missing, "Skipped: contracts not deployed");
                println!("  - {} (skipped)", case.name);
                summary.skipped += 1;
                continue;
            }

            match (case.run)(&self.context).await {
                Verdict::Pass => {
                    info!(test = case.name, "PASS");
                    println!("  ✓ {}", case.name);
                    summary.passed += 1;
                }
                Verdict::Warn(reason) => {
                    warn!(test = case.name, reason = %reason, "PASS with warning");
                    println!("  ✓ {} (warning: {})", case.name, reason);
                    summary.passed += 1;
                    summary.warnings += 1;
                }
                Verdict::Fail(reason) => {
                    error!(test = case.name, reason = %reason, "FAIL");
                    println!("  ✗ {}: {}", case.name, reason);
                    summary.failed += 1;
                }
            }
        }
        summary
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::NetworkConfig;
    use crate::accounts::CredentialStore;
    use crate::orchestrator::{DeployOptions, Orchestrator};
    use crate::testing::{FakeChain, MockFaucet, MockKeyStore, MockTracker};
    use futures::FutureExt;
    use tempfile::{tempdir, TempDir};

    /// A fully deployed fake network and a context pointing at it
    pub(crate) async fn deployed_context() -> (TempDir, FakeChain, TestContext) {
        let dir = tempdir().unwrap();
        let mut config = Config::for_network(NetworkConfig::testnet());
        config.paths.deployments_dir = dir.path().join("deployments");
        config.finality.interval_ms = 1;

        let chain = FakeChain::new();
        let keystore = MockKeyStore::new();
        let faucet = MockFaucet::new();
        let tracker = MockTracker::confirming();
        let provisioner =
            crate::accounts::AccountProvisioner::new(CredentialStore::new(config.credentials_dir()), &keystore, &faucet);
        let mut ledger = DeploymentLedger::open(config.ledger_path()).unwrap();
        Orchestrator::new(&config, &chain, &provisioner, &tracker)
            .run(&mut ledger, &DeployOptions { build: false })
            .await
            .unwrap();

        let admin = ledger.get("admin").unwrap().to_string();
        let context = TestContext {
            invoker: Arc::new(chain.clone()),
            ledger,
            admin,
            config,
        };
        (dir, chain, context)
    }

    fn pass(_: &TestContext) -> BoxFuture<'_, Verdict> {
        async { Verdict::Pass }.boxed()
    }

    fn fail(_: &TestContext) -> BoxFuture<'_, Verdict> {
        async { Verdict::Fail("boom".to_string()) }.boxed()
    }

    fn warn_case(_: &TestContext) -> BoxFuture<'_, Verdict> {
        async { Verdict::Warn("stale_price".to_string()) }.boxed()
    }

    #[tokio::test]
    async fn failing_case_does_not_stop_the_suite() {
        let (_dir, _chain, context) = deployed_context().await;
        let runner = TestRunner::new(context);
        let cases = [
            TestCase { name: "one", requires: &[], run: pass },
            TestCase { name: "two", requires: &[], run: fail },
            TestCase { name: "three", requires: &[], run: pass },
            TestCase { name: "four", requires: &[], run: warn_case },
            TestCase { name: "five", requires: &[], run: pass },
        ];

        let summary = runner.run_cases(&cases).await;
        assert_eq!(summary.passed, 4);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.warnings, 1);
        assert!(!summary.is_success());
    }

    #[tokio::test]
    async fn cases_without_their_contracts_are_skipped() {
        let dir = tempdir().unwrap();
        let config = Config::for_network(NetworkConfig::testnet());
        let context = TestContext {
            invoker: Arc::new(FakeChain::new()),
            ledger: DeploymentLedger::open(dir.path().join("testnet.json")).unwrap(),
            admin: "GADMIN".to_string(),
            config,
        };
        let runner = TestRunner::new(context);
        let cases = [
            TestCase { name: "needs pool", requires: &[ContractKind::VantisPool], run: fail },
            TestCase { name: "standalone", requires: &[], run: pass },
        ];

        let summary = runner.run_cases(&cases).await;
        assert_eq!(summary, SuiteSummary { passed: 1, failed: 0, skipped: 1, warnings: 0 });
    }

    #[test]
    fn all_expands_in_fixed_order() {
        let names: Vec<String> = SuiteName::All.expand().iter().map(|s| s.to_string()).collect();
        assert_eq!(names, ["oracle", "blend", "pool", "risk", "integration", "payment"]);
        assert_eq!(SuiteName::Risk.expand(), vec![SuiteName::Risk]);
    }

    #[test]
    fn verdict_mapping() {
        let result = |outcome: Outcome| InvocationResult {
            raw_output: String::new(),
            payload: String::new(),
            exit_success: true,
            outcome,
        };
        assert_eq!(Verdict::from_result(&result(Outcome::AlreadyDone)), Verdict::Pass);
        assert!(matches!(Verdict::from_result(&result(Outcome::StalePrice)), Verdict::Warn(_)));
        assert!(Verdict::from_result(&result(Outcome::GenericError { reason: "x".into() })).is_failure());
    }

    #[tokio::test]
    async fn every_suite_passes_against_a_fresh_deployment() {
        let (_dir, _chain, context) = deployed_context().await;
        let runner = TestRunner::new(context);

        let summary = runner.run_suite(SuiteName::All).await;
        assert_eq!(summary.failed, 0, "{}", summary);
        assert_eq!(summary.skipped, 0);
        assert!(summary.passed > 20);
    }
}
