use crate::discovery::{CompositionConfig, ResolverContext};
use crate::packaging::DEFAULT_CLASSIFIER;
use crate::provisioning::{ExplicitComposition, ProvisioningConfig};
use serde::Serialize;
use std::path::PathBuf;

/// Default server directory, relative to the output directory
pub const DEFAULT_PROVISIONING_DIR: &str = "server";

/// Bootable archive settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootableOptions {
    /// Archive file name; `server-bootable.<ext>` when absent
    pub name: Option<String>,
    pub classifier: String,
}

impl Default for BootableOptions {
    fn default() -> Self {
        Self {
            name: None,
            classifier: DEFAULT_CLASSIFIER.to_string(),
        }
    }
}

/// One package invocation
#[derive(Debug, Clone)]
pub struct PackageRequest {
    /// Discovery settings; `None` selects the explicit composition
    pub discovery: Option<CompositionConfig>,
    pub explicit: ExplicitComposition,
    pub dry_run: bool,
    pub deployment: PathBuf,
    pub output_dir: PathBuf,
    /// Relative paths are resolved against `output_dir`
    pub provisioning_dir: PathBuf,
    pub overwrite: bool,
    pub bootable: Option<BootableOptions>,
    pub resolver: Option<ResolverContext>,
}

impl PackageRequest {
    pub fn new(deployment: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            discovery: None,
            explicit: ExplicitComposition::default(),
            dry_run: false,
            deployment: deployment.into(),
            output_dir: output_dir.into(),
            provisioning_dir: PathBuf::from(DEFAULT_PROVISIONING_DIR),
            overwrite: false,
            bootable: None,
            resolver: None,
        }
    }

    pub fn server_dir(&self) -> PathBuf {
        self.output_dir.join(&self.provisioning_dir)
    }
}

/// The composition selected for an invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub config: ProvisioningConfig,
    /// True when the composition came from scanning the deployment
    pub discovered: bool,
    /// Unfixed errors the warn policy let through
    pub discovery_errors: usize,
    pub scan_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageOutcome {
    #[serde(flatten)]
    pub resolution: Resolution,
    pub server: Option<PathBuf>,
    pub archive: Option<PathBuf>,
}

impl PackageOutcome {
    pub fn provisioned(&self) -> bool {
        self.server.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request = PackageRequest::new("app.war", "target");
        assert!(request.discovery.is_none());
        assert!(!request.dry_run);
        assert_eq!(request.server_dir(), PathBuf::from("target/server"));
    }

    #[test]
    fn test_absolute_provisioning_dir_wins() {
        let mut request = PackageRequest::new("app.war", "target");
        request.provisioning_dir = PathBuf::from("/opt/server");
        assert_eq!(request.server_dir(), PathBuf::from("/opt/server"));
    }

    #[test]
    fn test_bootable_defaults() {
        let options = BootableOptions::default();
        assert_eq!(options.classifier, "bootable");
        assert!(options.name.is_none());
    }
}
