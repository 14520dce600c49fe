//! In-memory stand-ins for the network-facing traits

use crate::accounts::{Faucet, GeneratedKey, KeyStore};
use crate::invoker::{CallArg, ContractInvoker, InvocationResult};
use crate::rpc::{TransactionTracker, TxStatus};
use crate::toolchain::ToolOutput;
use crate::{Error, Result};
use async_trait::async_trait;
use secrecy::SecretString;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};

const BASE32: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Deterministic strkey-shaped address
pub fn fake_address(prefix: char, n: u64) -> String {
    let mut body = vec![b'A'; 55];
    let mut value = n;
    let mut idx = body.len();
    while value > 0 && idx > 0 {
        idx -= 1;
        body[idx] = BASE32[(value % 32) as usize];
        value /= 32;
    }
    format!("{}{}", prefix, String::from_utf8_lossy(&body))
}

fn fake_hash(n: u64) -> String {
    format!("{:064x}", n)
}

fn ok(stdout: impl Into<String>, stderr: impl Into<String>) -> ToolOutput {
    ToolOutput {
        stdout: stdout.into(),
        stderr: stderr.into(),
        success: true,
    }
}

fn failed(stderr: impl Into<String>) -> ToolOutput {
    ToolOutput {
        stdout: String::new(),
        stderr: stderr.into(),
        success: false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Deploy,
    Invoke,
    Read,
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub kind: CallKind,
    /// Contract address, or the wasm file name for deploys
    pub target: String,
    pub function: String,
    pub args: Vec<CallArg>,
}

#[derive(Default)]
struct FakeContract {
    artifact: String,
    admin: Option<String>,
    /// Named arguments seen by `initialize` and setters
    storage: HashMap<String, String>,
    assets: HashSet<String>,
}

#[derive(Default)]
struct ChainState {
    counter: u64,
    calls: Vec<RecordedCall>,
    contracts: HashMap<String, FakeContract>,
    forced: HashMap<String, ToolOutput>,
    deploy_stdout_override: Option<String>,
}

impl ChainState {
    fn next(&mut self) -> u64 {
        self.counter += 1;
        self.counter
    }
}

/// A tiny simulated network
///
/// Contracts come into existence on `deploy`, remember their `initialize`
/// arguments, and answer `admin` only once initialized. Any function can be
/// forced to a canned response with [`FakeChain::force`].
#[derive(Clone, Default)]
pub struct FakeChain {
    state: Arc<Mutex<ChainState>>,
}

impl FakeChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call to `function` (any contract) returns `output`
    pub fn force(&self, function: &str, output: ToolOutput) {
        self.lock().forced.insert(function.to_string(), output);
    }

    pub fn force_error(&self, function: &str, stderr: &str) {
        self.force(function, failed(stderr));
    }

    pub fn force_value(&self, function: &str, stdout: &str) {
        self.force(function, ok(stdout, ""));
    }

    /// Deploys print this instead of the new address
    pub fn break_deploy_output(&self, stdout: &str) {
        self.lock().deploy_stdout_override = Some(stdout.to_string());
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    pub fn count(&self, kind: CallKind, function: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.kind == kind && c.function == function)
            .count()
    }

    pub fn deploy_count(&self) -> usize {
        self.count(CallKind::Deploy, "deploy")
    }

    /// Artifact file name deployed at `address`
    pub fn artifact_at(&self, address: &str) -> Option<String> {
        self.lock()
            .contracts
            .get(address)
            .map(|c| c.artifact.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ChainState> {
        self.state.lock().unwrap()
    }

    fn record(&self, kind: CallKind, target: &str, function: &str, args: &[CallArg]) {
        self.lock().calls.push(RecordedCall {
            kind,
            target: target.to_string(),
            function: function.to_string(),
            args: args.to_vec(),
        });
    }

    fn respond_invoke(&self, contract: &str, function: &str, args: &[CallArg]) -> ToolOutput {
        let mut state = self.lock();
        if let Some(forced) = state.forced.get(function) {
            return forced.clone();
        }
        let n = state.next();
        let Some(target) = state.contracts.get_mut(contract) else {
            return failed(format!("error: contract {} not found", contract));
        };

        match function {
            "initialize" => {
                if target.admin.is_some() {
                    return failed("error: HostError: Error(Contract, #1)\nAlreadyInitialized");
                }
                target.admin = CallArg::value_of(args, "admin").map(str::to_string);
            }
            "add_asset" => {
                let symbol = CallArg::value_of(args, "config")
                    .and_then(|c| serde_json::from_str::<serde_json::Value>(c).ok())
                    .and_then(|v| v["symbol"].as_str().map(str::to_string));
                if let Some(symbol) = symbol {
                    if !target.assets.insert(symbol) {
                        return failed("error: asset already exists");
                    }
                }
            }
            _ => {}
        }
        for arg in args {
            if let CallArg::Named(name, value) = arg {
                target.storage.insert(name.clone(), value.clone());
            }
        }

        ok("", format!("Signing transaction: {}\n", fake_hash(n)))
    }

    fn respond_read(&self, contract: &str, function: &str, args: &[CallArg]) -> ToolOutput {
        let state = self.lock();
        if let Some(forced) = state.forced.get(function) {
            return forced.clone();
        }
        let Some(target) = state.contracts.get(contract) else {
            return failed(format!("error: contract {} not found", contract));
        };

        if function == "admin" {
            return match &target.admin {
                Some(admin) => ok(format!("\"{}\"\n", admin), ""),
                None => failed("error: HostError: Error(Storage, MissingValue)"),
            };
        }
        if target.admin.is_none() {
            return failed("error: HostError: Error(Storage, MissingValue)");
        }
        match function {
            "is_asset_supported" => {
                let asset = CallArg::value_of(args, "asset").unwrap_or_default();
                return ok(format!("{}\n", target.assets.contains(asset)), "");
            }
            "get_assets" => {
                let mut assets: Vec<&String> = target.assets.iter().collect();
                assets.sort();
                return ok(format!("{}\n", serde_json::json!(assets)), "");
            }
            "get_price" | "get_volatility" => {
                let asset = CallArg::value_of(args, "asset").unwrap_or_default();
                if !target.assets.contains(asset) {
                    return failed("error: HostError: Error(Contract, #2)");
                }
            }
            _ => {}
        }

        let key = function.strip_prefix("get_").unwrap_or(function);
        let stored = target
            .storage
            .get(key)
            .or_else(|| target.storage.get(&format!("{}_address", key)));
        match stored {
            Some(value) if value.starts_with('{') || value.parse::<i64>().is_ok() => {
                ok(format!("{}\n", value), "")
            }
            Some(value) => ok(format!("\"{}\"\n", value), ""),
            None => ok("0\n", ""),
        }
    }
}

#[async_trait]
impl ContractInvoker for FakeChain {
    async fn deploy(&self, wasm: &Path, signer: &str) -> Result<InvocationResult> {
        let artifact = wasm
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.record(CallKind::Deploy, &artifact, "deploy", &[CallArg::new("source", signer)]);

        let mut state = self.lock();
        if let Some(forced) = state.forced.get("deploy") {
            return Ok(InvocationResult::from_output(&forced.clone(), false));
        }
        let n = state.next();
        let address = fake_address('C', n);
        state.contracts.insert(
            address.clone(),
            FakeContract {
                artifact,
                ..FakeContract::default()
            },
        );
        let stdout = state
            .deploy_stdout_override
            .clone()
            .unwrap_or_else(|| format!("{}\n", address));
        let output = ok(stdout, "ℹ️ Uploading contract WASM...\n✅ Deployed!\n");
        Ok(InvocationResult::from_output(&output, false))
    }

    async fn invoke(
        &self,
        contract: &str,
        function: &str,
        _signer: &str,
        args: &[CallArg],
    ) -> Result<InvocationResult> {
        self.record(CallKind::Invoke, contract, function, args);
        let output = self.respond_invoke(contract, function, args);
        Ok(InvocationResult::from_output(&output, true))
    }

    async fn read(
        &self,
        contract: &str,
        function: &str,
        args: &[CallArg],
    ) -> Result<InvocationResult> {
        self.record(CallKind::Read, contract, function, args);
        let output = self.respond_read(contract, function, args);
        Ok(InvocationResult::from_output(&output, true))
    }
}

/// Keystore holding generated aliases in memory
#[derive(Default)]
pub struct MockKeyStore {
    keys: Mutex<HashMap<String, String>>,
    generated: Mutex<u64>,
}

impl MockKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the local key while leaving any credential file behind
    pub fn forget(&self, alias: &str) {
        self.keys.lock().unwrap().remove(alias);
    }

    pub fn generated_count(&self) -> u64 {
        *self.generated.lock().unwrap()
    }
}

#[async_trait]
impl KeyStore for MockKeyStore {
    async fn has_key(&self, alias: &str) -> Result<bool> {
        Ok(self.keys.lock().unwrap().contains_key(alias))
    }

    async fn generate(&self, alias: &str) -> Result<GeneratedKey> {
        let n = {
            let mut generated = self.generated.lock().unwrap();
            *generated += 1;
            *generated
        };
        let public_key = fake_address('G', 1_000 + n);
        self.keys
            .lock()
            .unwrap()
            .insert(alias.to_string(), public_key.clone());
        Ok(GeneratedKey {
            public_key,
            secret_key: SecretString::from(fake_address('S', 1_000 + n)),
        })
    }
}

#[derive(Default)]
pub struct MockFaucet {
    funded: Mutex<Vec<String>>,
    fail: bool,
}

impl MockFaucet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn funded(&self) -> Vec<String> {
        self.funded.lock().unwrap().clone()
    }
}

#[async_trait]
impl Faucet for MockFaucet {
    async fn fund(&self, public_key: &str) -> Result<()> {
        if self.fail {
            return Err(Error::Faucet("friendbot unavailable".to_string()));
        }
        self.funded.lock().unwrap().push(public_key.to_string());
        Ok(())
    }
}

/// Replays a fixed status sequence, then reports NOT_FOUND
#[derive(Default)]
pub struct MockTracker {
    statuses: Mutex<VecDeque<TxStatus>>,
    polls: Mutex<usize>,
}

impl MockTracker {
    pub fn confirming() -> Self {
        Self::with_statuses(vec![TxStatus::Success; 64])
    }

    pub fn with_statuses(statuses: Vec<TxStatus>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            polls: Mutex::new(0),
        }
    }

    pub fn polls(&self) -> usize {
        *self.polls.lock().unwrap()
    }
}

#[async_trait]
impl TransactionTracker for MockTracker {
    async fn transaction_status(&self, _hash: &str) -> Result<TxStatus> {
        *self.polls.lock().unwrap() += 1;
        Ok(self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(TxStatus::NotFound))
    }
}

#[test]
fn fake_addresses_are_well_formed() {
    use crate::invoker::classify::{is_account_address, is_contract_address};
    assert!(is_contract_address(&fake_address('C', 1)));
    assert!(is_contract_address(&fake_address('C', 123_456)));
    assert!(is_account_address(&fake_address('G', 7)));
    assert_ne!(fake_address('C', 1), fake_address('C', 2));
}
