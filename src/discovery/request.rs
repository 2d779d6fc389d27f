//! The immutable request handed to the deployment scanner

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// What the scanner should produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    ProvisioningXml,
}

/// Session used by collaborators to resolve feature packs and libraries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ResolverContext {
    /// Channel manifests pinning artifact versions
    pub channels: Vec<String>,
    pub offline: bool,
    pub local_repository: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryRequest {
    pub(super) deployment: PathBuf,
    pub(super) baseline: Option<PathBuf>,
    pub(super) config_name: Option<String>,
    pub(super) execution_context: String,
    pub(super) profiles: BTreeSet<String>,
    pub(super) add_ons: BTreeSet<String>,
    pub(super) suggest: bool,
    pub(super) jndi_layers: BTreeSet<String>,
    pub(super) excluded_archives: BTreeSet<String>,
    pub(super) verbose: bool,
    pub(super) resolver: Option<ResolverContext>,
    pub(super) output: OutputFormat,
}

impl DiscoveryRequest {
    pub fn deployment(&self) -> &Path {
        &self.deployment
    }

    /// Provisioning description the scan starts from
    pub fn baseline(&self) -> Option<&Path> {
        self.baseline.as_deref()
    }

    pub fn config_name(&self) -> Option<&str> {
        self.config_name.as_deref()
    }

    pub fn execution_context(&self) -> &str {
        &self.execution_context
    }

    pub fn profiles(&self) -> &BTreeSet<String> {
        &self.profiles
    }

    pub fn add_ons(&self) -> &BTreeSet<String> {
        &self.add_ons
    }

    pub fn suggest(&self) -> bool {
        self.suggest
    }

    pub fn jndi_layers(&self) -> &BTreeSet<String> {
        &self.jndi_layers
    }

    pub fn excluded_archives(&self) -> &BTreeSet<String> {
        &self.excluded_archives
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn resolver(&self) -> Option<&ResolverContext> {
        self.resolver.as_ref()
    }

    pub fn output(&self) -> OutputFormat {
        self.output
    }
}
