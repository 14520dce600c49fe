//! Invocation audit trail
//!
//! Wraps any invoker and appends one JSONL record per call. Writing the log
//! never affects the call result.

use super::{CallArg, ContractInvoker, InvocationResult};
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Serialize)]
struct AuditEntry<'a> {
    timestamp: DateTime<Utc>,
    run_id: Uuid,
    kind: &'static str,
    contract: &'a str,
    function: &'a str,
    signer: Option<&'a str>,
    outcome: &'static str,
    tx_hash: Option<&'a str>,
    error: Option<String>,
    duration_ms: u64,
}

struct AuditLogWriter {
    path: PathBuf,
}

impl AuditLogWriter {
    fn write(&self, entry: &AuditEntry<'_>) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let json = serde_json::to_string(entry)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }
}

/// Invoker decorator that records every call
pub struct AuditedInvoker<I> {
    inner: I,
    run_id: Uuid,
    writer: Mutex<AuditLogWriter>,
}

impl<I: ContractInvoker> AuditedInvoker<I> {
    /// # Arguments
    /// * `log_path` - JSONL file, created on first write
    pub fn new(inner: I, log_path: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            run_id: Uuid::new_v4(),
            writer: Mutex::new(AuditLogWriter {
                path: log_path.into(),
            }),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    async fn record(
        &self,
        kind: &'static str,
        contract: &str,
        function: &str,
        signer: Option<&str>,
        result: &Result<InvocationResult>,
        started: Instant,
    ) {
        let (outcome, tx_hash, error) = match result {
            Ok(r) => (
                r.outcome.label(),
                r.outcome.tx_hash(),
                match &r.outcome {
                    super::Outcome::GenericError { reason } => Some(reason.clone()),
                    _ => None,
                },
            ),
            Err(e) => ("spawn_failed", None, Some(e.to_string())),
        };

        let entry = AuditEntry {
            timestamp: Utc::now(),
            run_id: self.run_id,
            kind,
            contract,
            function,
            signer,
            outcome,
            tx_hash,
            error,
            duration_ms: started.elapsed().as_millis() as u64,
        };

        let writer = self.writer.lock().await;
        if let Err(e) = writer.write(&entry) {
            tracing::warn!(error = %e, path = %writer.path.display(), "Failed to write audit log entry");
        }
    }
}

#[async_trait]
impl<I: ContractInvoker> ContractInvoker for AuditedInvoker<I> {
    async fn deploy(&self, wasm: &Path, signer: &str) -> Result<InvocationResult> {
        let started = Instant::now();
        let result = self.inner.deploy(wasm, signer).await;
        let artifact = wasm.display().to_string();
        self.record("deploy", &artifact, "deploy", Some(signer), &result, started)
            .await;
        result
    }

    async fn invoke(
        &self,
        contract: &str,
        function: &str,
        signer: &str,
        args: &[CallArg],
    ) -> Result<InvocationResult> {
        let started = Instant::now();
        let result = self.inner.invoke(contract, function, signer, args).await;
        self.record("invoke", contract, function, Some(signer), &result, started)
            .await;
        result
    }

    async fn read(
        &self,
        contract: &str,
        function: &str,
        args: &[CallArg],
    ) -> Result<InvocationResult> {
        let started = Instant::now();
        let result = self.inner.read(contract, function, args).await;
        self.record("read", contract, function, None, &result, started)
            .await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeChain;
    use tempfile::tempdir;

    #[tokio::test]
    async fn records_each_call_as_jsonl() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("audit").join("testnet_audit.jsonl");
        let invoker = AuditedInvoker::new(FakeChain::new(), &log);

        let deployed = invoker
            .deploy(Path::new("oracle_adapter.wasm"), "admin")
            .await
            .unwrap();
        let address = extract(&deployed);
        invoker
            .invoke(&address, "initialize", "admin", &[CallArg::new("admin", "GADMIN")])
            .await
            .unwrap();
        invoker.read(&address, "admin", &[]).await.unwrap();

        let content = std::fs::read_to_string(&log).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["kind"], "deploy");
        assert_eq!(lines[1]["function"], "initialize");
        assert_eq!(lines[1]["outcome"], "success");
        assert_eq!(lines[2]["kind"], "read");
        assert_eq!(lines[0]["run_id"], lines[2]["run_id"]);
    }

    #[tokio::test]
    async fn unwritable_log_does_not_fail_the_call() {
        let dir = tempdir().unwrap();
        // A directory cannot be opened for append
        let invoker = AuditedInvoker::new(FakeChain::new(), dir.path());

        let result = invoker
            .deploy(Path::new("risk_engine.wasm"), "admin")
            .await
            .unwrap();
        assert!(result.is_ok());
    }

    fn extract(result: &InvocationResult) -> String {
        super::super::extract_contract_address(&result.raw_output).unwrap()
    }
}
