//! Contract artifact builds

use crate::config::Config;
use crate::contracts::{ContractDescriptor, ContractKind, DEPLOYMENT_GRAPH};
use crate::toolchain::{run_tool, StellarCli};
use crate::{Error, Result};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildProfile {
    #[default]
    Release,
    Debug,
}

impl BuildProfile {
    /// Cargo profile name
    pub fn cargo_profile(&self) -> &'static str {
        match self {
            BuildProfile::Release => "release",
            BuildProfile::Debug => "dev",
        }
    }

    /// Directory name under the target triple
    pub fn target_dir(&self) -> &'static str {
        match self {
            BuildProfile::Release => "release",
            BuildProfile::Debug => "debug",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub profile: BuildProfile,
    /// Build only this contract
    pub contract: Option<ContractKind>,
    /// `cargo clean` before building
    pub clean: bool,
}

pub struct ArtifactBuilder<'a> {
    config: &'a Config,
    cli: StellarCli,
}

impl<'a> ArtifactBuilder<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            cli: StellarCli::from_config(&config.network),
        }
    }

    pub fn artifact_path(&self, descriptor: &ContractDescriptor, profile: BuildProfile) -> PathBuf {
        self.config
            .artifacts_dir(profile.target_dir())
            .join(descriptor.artifact)
    }

    /// Build and verify artifacts, returning their paths in deployment order
    pub async fn build(&self, options: &BuildOptions) -> Result<Vec<PathBuf>> {
        let workspace = &self.config.paths.workspace_dir;

        if options.clean {
            tracing::info!(workspace = %workspace.display(), "Cleaning build outputs");
            let output = run_tool("cargo", &["clean".to_string()], Some(workspace)).await?;
            if !output.success {
                return Err(Error::Build(format!("cargo clean: {}", output.combined().trim())));
            }
        }

        let mut args: Vec<String> = vec!["contract".into(), "build".into()];
        if let Some(kind) = options.contract {
            args.push("--package".into());
            args.push(kind.descriptor().package.into());
        }
        args.push("--profile".into());
        args.push(options.profile.cargo_profile().into());

        tracing::info!(
            contract = ?options.contract.map(|k| k.name()),
            profile = options.profile.target_dir(),
            "Building contracts"
        );
        let output = self.cli.run_in(&args, workspace).await?;
        if !output.success {
            return Err(Error::Build(last_lines(&output.combined(), 20)));
        }

        self.verify(options)
    }

    /// Every expected artifact must exist
    pub fn verify(&self, options: &BuildOptions) -> Result<Vec<PathBuf>> {
        let expected = DEPLOYMENT_GRAPH
            .iter()
            .filter(|d| options.contract.map_or(true, |k| k == d.kind));

        let mut paths = Vec::new();
        for descriptor in expected {
            let path = self.artifact_path(descriptor, options.profile);
            if !path.is_file() {
                return Err(Error::ArtifactMissing(path));
            }
            tracing::debug!(contract = descriptor.logical_name, path = %path.display(), "Artifact ready");
            paths.push(path);
        }
        Ok(paths)
    }
}

fn last_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}
