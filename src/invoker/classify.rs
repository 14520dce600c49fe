//! Outcome classification of CLI responses
//!
//! The remote tool answers in free-form text. The rules below run in a fixed
//! order and the first match wins.

use crate::contracts::ContractKind;
use serde::Serialize;
use std::fmt;

/// Length of a contract address (`C` + 55 base32 characters)
pub const CONTRACT_ADDRESS_LEN: usize = 56;
/// Length of a transaction hash in hex
pub const TX_HASH_LEN: usize = 64;

const USAGE_MARKERS: &[&str] = &["Usage:", "USAGE:"];

const ALREADY_DONE_MARKERS: &[&str] = &[
    "already initialized",
    "already registered",
    "already exists",
    "alreadyinitialized",
];

const ERROR_MARKERS: &[&str] = &["error:", "error(", "panicked", "transaction failed"];

/// Contract error codes the harness reacts to
///
/// Numbering is per contract: pool `#3` and oracle `#3` mean different things.
pub mod codes {
    pub mod oracle {
        pub const ASSET_NOT_SUPPORTED: u32 = 2;
        pub const STALE_PRICE: u32 = 3;
        pub const INSUFFICIENT_HISTORY: u32 = 6;
    }

    pub mod pool {
        pub const INSUFFICIENT_COLLATERAL: u32 = 3;
        /// Withdrawal would push the position below its liquidation threshold
        pub const WITHDRAWAL_WOULD_LIQUIDATE: u32 = 8;
    }
}

/// Classified result of a contract call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Success { tx_hash: Option<String> },
    AlreadyDone,
    AssetNotSupported,
    StalePrice,
    InsufficientHistory,
    GenericError { reason: String },
}

impl Outcome {
    /// Success or already-done
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Success { .. } | Outcome::AlreadyDone)
    }

    /// Expected precondition failure on a live network, not a defect
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Outcome::AssetNotSupported | Outcome::StalePrice | Outcome::InsufficientHistory
        )
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::GenericError { .. })
    }

    pub fn tx_hash(&self) -> Option<&str> {
        match self {
            Outcome::Success { tx_hash } => tx_hash.as_deref(),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Success { .. } => "success",
            Outcome::AlreadyDone => "already_done",
            Outcome::AssetNotSupported => "asset_not_supported",
            Outcome::StalePrice => "stale_price",
            Outcome::InsufficientHistory => "insufficient_history",
            Outcome::GenericError { .. } => "error",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success { tx_hash: Some(hash) } => write!(f, "success (tx {})", hash),
            Outcome::GenericError { reason } => write!(f, "error: {}", reason),
            other => f.write_str(other.label()),
        }
    }
}

/// Classify raw CLI output
///
/// `allow_empty` lets read calls of functions returning unit succeed with no
/// payload; everywhere else an empty answer is an error. Contract error codes
/// come out as generic errors here; [`attribute`] gives them meaning once the
/// answering contract is known.
pub fn classify(raw: &str, exit_ok: bool, allow_empty: bool) -> Outcome {
    let text = raw.trim();

    if text.is_empty() {
        return if exit_ok && allow_empty {
            Outcome::Success { tx_hash: None }
        } else {
            Outcome::GenericError {
                reason: "empty response".to_string(),
            }
        };
    }

    if USAGE_MARKERS.iter().any(|m| text.contains(m)) {
        return Outcome::GenericError {
            reason: "tool printed usage text; the call arguments were rejected".to_string(),
        };
    }

    let lower = text.to_ascii_lowercase();

    if ALREADY_DONE_MARKERS.iter().any(|m| lower.contains(m)) {
        return Outcome::AlreadyDone;
    }

    let failed = contract_error_code(text).is_some()
        || ERROR_MARKERS.iter().any(|m| lower.contains(m))
        || !exit_ok;
    if failed {
        return Outcome::GenericError {
            reason: error_line(text),
        };
    }

    Outcome::Success {
        tx_hash: extract_tx_hash(text),
    }
}

/// Reinterpret a generic error raised by the contract `kind`
///
/// Only the oracle adapter's codes name preconditions. Codes from every other
/// contract stay generic errors.
pub fn attribute(outcome: Outcome, raw: &str, kind: ContractKind) -> Outcome {
    if !outcome.is_error() || kind != ContractKind::OracleAdapter {
        return outcome;
    }
    match contract_error_code(raw) {
        Some(codes::oracle::ASSET_NOT_SUPPORTED) => Outcome::AssetNotSupported,
        Some(codes::oracle::STALE_PRICE) => Outcome::StalePrice,
        Some(codes::oracle::INSUFFICIENT_HISTORY) => Outcome::InsufficientHistory,
        _ => outcome,
    }
}

/// Numeric code from an `Error(Contract, #N)` marker
pub fn contract_error_code(raw: &str) -> Option<u32> {
    const MARKER: &str = "Error(Contract, #";
    let start = raw.find(MARKER)? + MARKER.len();
    let digits: String = raw[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// First contract address token in the text
pub fn extract_contract_address(raw: &str) -> Option<String> {
    tokens(raw)
        .find(|t| is_contract_address(t))
        .map(str::to_string)
}

/// First 64-hex token in the text
pub fn extract_tx_hash(raw: &str) -> Option<String> {
    tokens(raw)
        .find(|t| t.len() == TX_HASH_LEN && t.chars().all(|c| c.is_ascii_hexdigit()))
        .map(|t| t.to_ascii_lowercase())
}

pub fn is_contract_address(token: &str) -> bool {
    is_strkey(token, 'C')
}

pub fn is_account_address(token: &str) -> bool {
    is_strkey(token, 'G')
}

fn is_strkey(token: &str, prefix: char) -> bool {
    token.len() == CONTRACT_ADDRESS_LEN
        && token.starts_with(prefix)
        && token
            .chars()
            .all(|c| c.is_ascii_uppercase() || ('2'..='7').contains(&c))
}

fn tokens(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
}

/// Most informative single line for a log message
fn error_line(text: &str) -> String {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    lines
        .iter()
        .find(|l| {
            let lower = l.to_ascii_lowercase();
            ERROR_MARKERS.iter().any(|m| lower.contains(m))
        })
        .or_else(|| lines.first())
        .map(|l| l.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTRACT: &str = "CDLZFC3SYJYDZT7K67VZ75HPJVIEUVNIXF47ZG2FB2RMQQVU2HHGCYSC";
    const HASH: &str = "3a1f0c9e8b7d6a5f4e3d2c1b0a9f8e7d6c5b4a3f2e1d0c9b8a7f6e5d4c3b2a10";

    #[test]
    fn usage_text_is_error_even_on_success_exit() {
        let raw = "Usage: stellar contract invoke [OPTIONS] --id <CONTRACT_ID>";
        assert!(classify(raw, true, false).is_error());
        assert!(classify("USAGE:\n    initialize --admin <Address>", true, false).is_error());
    }

    #[test]
    fn already_done_markers() {
        for raw in [
            "Error: contract already initialized",
            "asset Already Registered",
            "HostError: Error(Contract, #1) AlreadyInitialized",
            "identity already exists",
        ] {
            assert_eq!(classify(raw, false, false), Outcome::AlreadyDone, "{}", raw);
        }
    }

    fn attributed(raw: &str, kind: ContractKind) -> Outcome {
        attribute(classify(raw, false, false), raw, kind)
    }

    #[test]
    fn oracle_error_codes() {
        let oracle = ContractKind::OracleAdapter;
        assert_eq!(
            attributed("HostError: Error(Contract, #2)", oracle),
            Outcome::AssetNotSupported
        );
        assert_eq!(
            attributed("Event log: ... Error(Contract, #3)\n", oracle),
            Outcome::StalePrice
        );
        assert_eq!(
            attributed("Error(Contract, #6)", oracle),
            Outcome::InsufficientHistory
        );
        assert!(attributed("Error(Contract, #5)", oracle).is_error());
    }

    #[test]
    fn contract_codes_without_origin_are_generic() {
        for raw in ["Error(Contract, #2)", "Error(Contract, #3)", "Error(Contract, #6)"] {
            assert!(classify(raw, true, false).is_error(), "{}", raw);
        }
    }

    #[test]
    fn same_code_from_other_contracts_stays_generic() {
        let raw = "error: HostError: Error(Contract, #3)";
        for kind in [
            ContractKind::VantisPool,
            ContractKind::RiskEngine,
            ContractKind::BlendAdapter,
            ContractKind::BorrowLimitPolicy,
        ] {
            assert!(attributed(raw, kind).is_error(), "{}", kind);
        }
        assert!(attributed("Error(Contract, #6)", ContractKind::RiskEngine).is_error());
    }

    #[test]
    fn attribute_leaves_non_errors_alone() {
        assert_eq!(
            attribute(Outcome::AlreadyDone, "Error(Contract, #3)", ContractKind::OracleAdapter),
            Outcome::AlreadyDone
        );
    }

    #[test]
    fn other_contract_codes_are_generic() {
        let outcome = classify("error: HostError: Error(Contract, #8)", false, false);
        assert!(outcome.is_error());
        assert_eq!(contract_error_code("HostError: Error(Contract, #8)"), Some(8));
        assert_eq!(contract_error_code("Error(Contract, #12) trailing"), Some(12));
        assert_eq!(contract_error_code("Error(WasmVm, InvalidAction)"), None);
    }

    #[test]
    fn generic_markers() {
        assert!(classify("thread 'main' panicked at src/lib.rs", true, false).is_error());
        assert!(classify("Transaction failed: txBadSeq", true, false).is_error());
        assert!(classify("something odd", false, false).is_error());
    }

    #[test]
    fn error_reason_prefers_marker_line() {
        let raw = "Simulating...\nerror: transaction simulation failed\nmore";
        assert_eq!(
            classify(raw, false, false),
            Outcome::GenericError {
                reason: "error: transaction simulation failed".to_string()
            }
        );
    }

    #[test]
    fn empty_output_depends_on_caller() {
        assert!(classify("   \n", true, false).is_error());
        assert_eq!(
            classify("", true, true),
            Outcome::Success { tx_hash: None }
        );
        assert!(classify("", false, true).is_error());
    }

    #[test]
    fn success_with_and_without_hash() {
        let raw = format!("Signing transaction: {}\n", HASH);
        assert_eq!(
            classify(&raw, true, false),
            Outcome::Success {
                tx_hash: Some(HASH.to_string())
            }
        );
        assert_eq!(
            classify("\"GBZX...\"", true, false),
            Outcome::Success { tx_hash: None }
        );
    }

    #[test]
    fn extracts_contract_address_from_deploy_output() {
        let raw = format!(
            "ℹ️ Uploading wasm...\n🔗 https://stellar.expert/explorer/testnet/contract/{}\n✅ Deployed!\n{}\n",
            CONTRACT, CONTRACT
        );
        assert_eq!(extract_contract_address(&raw), Some(CONTRACT.to_string()));
        assert_eq!(extract_contract_address("Deployed! but no id"), None);
        // One character short
        assert_eq!(extract_contract_address(&CONTRACT[..55]), None);
    }

    #[test]
    fn address_kinds() {
        assert!(is_contract_address(CONTRACT));
        assert!(!is_account_address(CONTRACT));
        let account = format!("G{}", &CONTRACT[1..]);
        assert!(is_account_address(&account));
        // Lowercase and digits outside 2-7 are not base32
        assert!(!is_contract_address(&CONTRACT.to_ascii_lowercase()));
        assert!(!is_contract_address(&format!("C{}", "1".repeat(55))));
    }
}
