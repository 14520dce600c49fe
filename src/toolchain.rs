//! External tool execution
//!
//! Everything that reaches the network goes through the `stellar` CLI. This
//! module only spawns processes and captures their output; interpreting that
//! output is the invoker's job.

use crate::config::NetworkConfig;
use crate::{Error, Result};
use std::path::Path;
use tokio::process::Command;

/// Captured output of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

impl ToolOutput {
    /// stdout followed by stderr, the text classification runs over
    pub fn combined(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (true, true) => String::new(),
            (false, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}\n{}", self.stdout, self.stderr),
        }
    }
}

/// Run `program args...` to completion
///
/// A program that cannot be spawned because it is not installed is
/// [`Error::ToolMissing`]; a non-zero exit is not an error here.
pub async fn run_tool(program: &str, args: &[String], cwd: Option<&Path>) -> Result<ToolOutput> {
    let mut command = Command::new(program);
    command.args(args);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    tracing::debug!(program, args = ?args, "Spawning tool");

    let output = command.output().await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::ToolMissing(program.to_string()),
        _ => Error::Io(e),
    })?;

    Ok(ToolOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        success: output.status.success(),
    })
}

/// Handle on the `stellar` CLI bound to one network
#[derive(Debug, Clone)]
pub struct StellarCli {
    binary: String,
    network: String,
    /// Explicit RPC endpoint and passphrase, overriding the CLI's own network registry
    endpoint: Option<(String, String)>,
}

impl StellarCli {
    pub fn new(binary: impl Into<String>, network: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            network: network.into(),
            endpoint: None,
        }
    }

    pub fn from_config(network: &NetworkConfig) -> Self {
        Self::new(network.cli_binary.clone(), network.name.clone())
            .with_endpoint(network.rpc_url.clone(), network.passphrase.clone())
    }

    pub fn with_endpoint(mut self, rpc_url: impl Into<String>, passphrase: impl Into<String>) -> Self {
        self.endpoint = Some((rpc_url.into(), passphrase.into()));
        self
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    /// Network selection flags for commands that talk to the network
    ///
    /// `--rpc-url` and `--network-passphrase` take precedence over the
    /// named network inside the CLI, so calls reach the same RPC the
    /// harness polls for finality.
    pub fn network_args(&self) -> Vec<String> {
        let mut args = vec!["--network".to_string(), self.network.clone()];
        if let Some((rpc_url, passphrase)) = &self.endpoint {
            args.extend([
                "--rpc-url".to_string(),
                rpc_url.clone(),
                "--network-passphrase".to_string(),
                passphrase.clone(),
            ]);
        }
        args
    }

    pub async fn run(&self, args: &[String]) -> Result<ToolOutput> {
        run_tool(&self.binary, args, None).await
    }

    pub async fn run_in(&self, args: &[String], cwd: &Path) -> Result<ToolOutput> {
        run_tool(&self.binary, args, Some(cwd)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binary_is_tool_missing() {
        let err = run_tool("definitely-not-a-real-binary-4821", &[], None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ToolMissing(name) if name == "definitely-not-a-real-binary-4821"));
    }

    #[tokio::test]
    async fn captures_output_and_status() {
        let output = run_tool("sh", &["-c".to_string(), "echo out; echo err 1>&2; exit 3".to_string()], None)
            .await
            .unwrap();
        assert!(!output.success);
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
        assert_eq!(output.combined(), "out\n\nerr\n");
    }

    #[test]
    fn combined_skips_blank_streams() {
        let output = ToolOutput {
            stdout: "CABC".to_string(),
            stderr: "  \n".to_string(),
            success: true,
        };
        assert_eq!(output.combined(), "CABC");
    }

    #[test]
    fn network_args_carry_configured_endpoint() {
        let mut network = NetworkConfig::named("staging");
        network.rpc_url = "https://rpc.staging.example.org".to_string();
        network.passphrase = "Staging ; 2024".to_string();

        let cli = StellarCli::from_config(&network);
        assert_eq!(
            cli.network_args(),
            [
                "--network",
                "staging",
                "--rpc-url",
                "https://rpc.staging.example.org",
                "--network-passphrase",
                "Staging ; 2024",
            ]
        );
        assert_eq!(StellarCli::new("stellar", "testnet").network_args(), ["--network", "testnet"]);
    }
}
