//! Contract invocation
//!
//! [`ContractInvoker`] is the seam between the harness and the network. The
//! production implementation shells out to `stellar contract ...`; tests swap
//! in an in-memory chain.
//!
//! Invokers never decide fatality. A call that reached the tool always comes
//! back as `Ok(InvocationResult)` with a classified [`Outcome`]; only failing
//! to spawn the tool at all is an `Err`.

mod audit;
pub mod classify;

pub use audit::AuditedInvoker;
pub use classify::{
    attribute, classify, contract_error_code, extract_contract_address, extract_tx_hash, Outcome,
};

use crate::contracts::ContractKind;
use crate::toolchain::{StellarCli, ToolOutput};
use crate::Result;
use async_trait::async_trait;
use std::path::Path;

/// One already-serialized argument of a contract call
///
/// Arity and types are checked by the contract, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallArg {
    /// `--name value`
    Named(String, String),
    /// Passed through verbatim
    Raw(String),
}

impl CallArg {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        CallArg::Named(name.into(), value.into())
    }

    pub fn raw(token: impl Into<String>) -> Self {
        CallArg::Raw(token.into())
    }

    /// Value of a named argument
    pub fn value_of<'a>(args: &'a [CallArg], name: &str) -> Option<&'a str> {
        args.iter().find_map(|arg| match arg {
            CallArg::Named(n, v) if n == name => Some(v.as_str()),
            _ => None,
        })
    }

    fn push_tokens(&self, out: &mut Vec<String>) {
        match self {
            CallArg::Named(name, value) => {
                out.push(format!("--{}", name));
                out.push(value.clone());
            }
            CallArg::Raw(token) => out.push(token.clone()),
        }
    }
}

/// Result of one remote call
#[derive(Debug, Clone)]
pub struct InvocationResult {
    /// stdout and stderr as printed
    pub raw_output: String,
    /// Trimmed stdout, the function's return value on success
    pub payload: String,
    pub exit_success: bool,
    pub outcome: Outcome,
}

impl InvocationResult {
    pub fn from_output(output: &ToolOutput, allow_empty: bool) -> Self {
        let raw_output = output.combined();
        let outcome = classify(&raw_output, output.success, allow_empty);
        Self {
            raw_output,
            payload: output.stdout.trim().to_string(),
            exit_success: output.success,
            outcome,
        }
    }

    /// Read contract error codes with the numbering of `kind`
    pub fn attributed_to(mut self, kind: ContractKind) -> Self {
        self.outcome = attribute(self.outcome, &self.raw_output, kind);
        self
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Payload with surrounding JSON string quotes removed
    pub fn value(&self) -> &str {
        self.payload.trim().trim_matches('"')
    }

    pub fn contract_error_code(&self) -> Option<u32> {
        contract_error_code(&self.raw_output)
    }
}

#[async_trait]
pub trait ContractInvoker: Send + Sync {
    /// Upload and instantiate a wasm artifact
    async fn deploy(&self, wasm: &Path, signer: &str) -> Result<InvocationResult>;

    /// State-changing call signed by `signer`
    async fn invoke(
        &self,
        contract: &str,
        function: &str,
        signer: &str,
        args: &[CallArg],
    ) -> Result<InvocationResult>;

    /// Simulated call, nothing is submitted
    async fn read(&self, contract: &str, function: &str, args: &[CallArg])
        -> Result<InvocationResult>;
}

/// Invoker backed by the `stellar` CLI
#[derive(Debug, Clone)]
pub struct StellarInvoker {
    cli: StellarCli,
    /// Identity used as source for simulated reads
    read_source: String,
}

impl StellarInvoker {
    pub fn new(cli: StellarCli, read_source: impl Into<String>) -> Self {
        Self {
            cli,
            read_source: read_source.into(),
        }
    }

    fn call_args(
        &self,
        contract: &str,
        function: &str,
        source: &str,
        args: &[CallArg],
        send: bool,
    ) -> Vec<String> {
        let mut out: Vec<String> = vec![
            "contract".into(),
            "invoke".into(),
            "--id".into(),
            contract.into(),
            "--source-account".into(),
            source.into(),
        ];
        out.extend(self.cli.network_args());
        if !send {
            out.push("--send=no".into());
        }
        out.push("--".into());
        out.push(function.into());
        for arg in args {
            arg.push_tokens(&mut out);
        }
        out
    }
}

#[async_trait]
impl ContractInvoker for StellarInvoker {
    async fn deploy(&self, wasm: &Path, signer: &str) -> Result<InvocationResult> {
        let mut args: Vec<String> = vec![
            "contract".into(),
            "deploy".into(),
            "--wasm".into(),
            wasm.display().to_string(),
            "--source-account".into(),
            signer.into(),
        ];
        args.extend(self.cli.network_args());
        let output = self.cli.run(&args).await?;
        Ok(InvocationResult::from_output(&output, false))
    }

    async fn invoke(
        &self,
        contract: &str,
        function: &str,
        signer: &str,
        args: &[CallArg],
    ) -> Result<InvocationResult> {
        let argv = self.call_args(contract, function, signer, args, true);
        let output = self.cli.run(&argv).await?;
        // Unit-returning functions print nothing on success
        let result = InvocationResult::from_output(&output, true);
        tracing::debug!(contract, function, outcome = %result.outcome, "invoke");
        Ok(result)
    }

    async fn read(
        &self,
        contract: &str,
        function: &str,
        args: &[CallArg],
    ) -> Result<InvocationResult> {
        let argv = self.call_args(contract, function, &self.read_source, args, false);
        let output = self.cli.run(&argv).await?;
        let result = InvocationResult::from_output(&output, true);
        tracing::debug!(contract, function, outcome = %result.outcome, "read");
        Ok(result)
    }
}
