use super::baseline::{BaselineDescriptor, DescriptorKey, DescriptorSource};
use super::config::CompositionConfig;
use super::request::ResolverContext;
use super::scanner::{ScanHandle, Scanner};
use crate::error::PipelineError;
use crate::progress::MessageWriter;
use crate::provisioning::{ExplicitComposition, ProvisioningConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Per-invocation working directory under the output directory
pub const SCAN_DIR: &str = "glow-scan";

/// Pinned baseline written when explicit feature packs seed the scan
pub const IN_PROVISIONING_FILE: &str = "eap-maven-plugin-in-provisioning.xml";

/// Everything one discovery run needs from the caller
#[derive(Debug, Clone, Copy)]
pub struct ScanInput<'a> {
    pub config: &'a CompositionConfig,
    /// Explicit composition; layers and excluded layers must stay empty
    pub explicit: &'a ExplicitComposition,
    pub dry_run: bool,
    pub deployment: &'a Path,
    pub output_dir: &'a Path,
    pub resolver: Option<&'a ResolverContext>,
}

enum Baseline {
    Pinned(PathBuf),
    Resolved(BaselineDescriptor),
}

impl Baseline {
    fn path(&self) -> &Path {
        match self {
            Baseline::Pinned(path) => path,
            Baseline::Resolved(descriptor) => descriptor.path(),
        }
    }
}

/// Computes a composition by scanning a deployment
pub struct DiscoveryOrchestrator<'a> {
    descriptors: &'a dyn DescriptorSource,
    scanner: &'a dyn Scanner,
    writer: &'a dyn MessageWriter,
}

impl<'a> DiscoveryOrchestrator<'a> {
    pub fn new(
        descriptors: &'a dyn DescriptorSource,
        scanner: &'a dyn Scanner,
        writer: &'a dyn MessageWriter,
    ) -> Self {
        Self {
            descriptors,
            scanner,
            writer,
        }
    }

    /// Scans `input.deployment` and returns the open scan results.
    ///
    /// Inputs are validated before anything touches the filesystem. The
    /// baseline's temporary copy lives until this call returns; the returned
    /// handle is the caller's to release.
    pub fn scan(&self, input: &ScanInput<'_>) -> Result<ScanHandle, PipelineError> {
        validate(input)?;

        let scan_dir = input.output_dir.join(SCAN_DIR);
        fs::create_dir_all(&scan_dir).map_err(|e| PipelineError::io(&scan_dir, e))?;

        let baseline = self.baseline(input, &scan_dir)?;
        debug!(baseline = %baseline.path().display(), "Using baseline descriptor");

        let request = input.config.to_arguments(
            input.deployment,
            Some(baseline.path()),
            input.explicit.config_name.as_deref(),
            input.resolver,
        );

        info!(deployment = %input.deployment.display(), "Scanning the deployment...");
        let results = self
            .scanner
            .scan(&request, self.writer)
            .map_err(PipelineError::scan_failure)?;
        info!("Scanning DONE.");
        let handle = ScanHandle::new(results);

        if let Err(e) = handle.output_information(self.writer) {
            handle.release();
            return Err(PipelineError::scan_failure(e));
        }

        if !input.dry_run {
            let written = handle.output_config(&scan_dir, None).map_err(|e| {
                PipelineError::collaborator("Failed to persist the discovered composition", e)
            })?;
            info!(path = %written.display(), "Discovered composition stored");
        }

        input.config.error_policy().apply(handle, self.writer)
    }

    fn baseline(&self, input: &ScanInput<'_>, scan_dir: &Path) -> Result<Baseline, PipelineError> {
        if input.explicit.feature_packs.is_empty() {
            let key = DescriptorKey::new(input.config.product(), input.config.context());
            return self.descriptors.resolve(&key).map(Baseline::Resolved);
        }

        let pinned = ProvisioningConfig::from_explicit(input.explicit);
        let path = scan_dir.join(IN_PROVISIONING_FILE);
        pinned.store(&path).map_err(|e| {
            PipelineError::collaborator("Failed to store the explicit feature-pack baseline", e)
        })?;
        Ok(Baseline::Pinned(path))
    }
}

fn validate(input: &ScanInput<'_>) -> Result<(), PipelineError> {
    if !input.explicit.layers.is_empty() {
        return Err(PipelineError::validation(
            "layers must be empty when discovery is enabled",
        ));
    }
    if !input.explicit.excluded_layers.is_empty() {
        return Err(PipelineError::validation(
            "excluded layers must be empty when discovery is enabled",
        ));
    }
    if !input.deployment.exists() {
        return Err(PipelineError::validation(format!(
            "a deployment artifact is required for discovery, none found at {}",
            input.deployment.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::baseline::BundledDescriptors;
    use crate::discovery::request::DiscoveryRequest;
    use crate::discovery::scanner::{ErrorSession, InfoReport, ScanResults};
    use crate::progress::RecordingWriter;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    struct UnreachableScanner;

    impl Scanner for UnreachableScanner {
        fn scan(
            &self,
            _request: &DiscoveryRequest,
            _writer: &dyn MessageWriter,
        ) -> anyhow::Result<Box<dyn ScanResults>> {
            panic!("scanner must not be invoked");
        }
    }

    fn run(explicit: &ExplicitComposition, deployment: &Path, out: &Path) -> PipelineError {
        let descriptors = BundledDescriptors::new();
        let writer = RecordingWriter::new();
        let orchestrator = DiscoveryOrchestrator::new(&descriptors, &UnreachableScanner, &writer);
        let config = CompositionConfig::new();

        orchestrator
            .scan(&ScanInput {
                config: &config,
                explicit,
                dry_run: false,
                deployment,
                output_dir: out,
                resolver: None,
            })
            .unwrap_err()
    }

    #[test]
    fn test_explicit_layers_rejected() {
        let temp = TempDir::new().unwrap();
        let deployment = temp.path().join("app.war");
        fs::write(&deployment, b"PK").unwrap();
        let explicit = ExplicitComposition {
            layers: vec!["base-layer".to_string()],
            ..Default::default()
        };

        let err = run(&explicit, &deployment, temp.path());

        assert!(matches!(err, PipelineError::Validation(ref m) if m.starts_with("layers")));
        assert!(!temp.path().join(SCAN_DIR).exists());
    }

    #[test]
    fn test_explicit_excluded_layers_rejected() {
        let temp = TempDir::new().unwrap();
        let explicit = ExplicitComposition {
            excluded_layers: vec!["jmx-remoting".to_string()],
            ..Default::default()
        };

        let err = run(&explicit, &temp.path().join("missing.war"), temp.path());

        assert!(matches!(err, PipelineError::Validation(ref m) if m.starts_with("excluded layers")));
    }

    #[test]
    fn test_missing_deployment_rejected_before_scan_dir_exists() {
        let temp = TempDir::new().unwrap();

        let err = run(
            &ExplicitComposition::default(),
            &temp.path().join("missing.war"),
            temp.path(),
        );

        assert!(matches!(err, PipelineError::Validation(ref m) if m.contains("deployment artifact is required")));
        assert!(!temp.path().join(SCAN_DIR).exists());
    }

    struct UnrenderableResults {
        config: ProvisioningConfig,
        errors: ErrorSession,
        info: InfoReport,
        closes: Arc<AtomicUsize>,
    }

    impl ScanResults for UnrenderableResults {
        fn provisioning_config(&self) -> &ProvisioningConfig {
            &self.config
        }

        fn error_session(&self) -> &ErrorSession {
            &self.errors
        }

        fn info_report(&self) -> &InfoReport {
            &self.info
        }

        fn output_information(&self, _writer: &dyn MessageWriter) -> anyhow::Result<()> {
            anyhow::bail!("report template missing")
        }

        fn close(&mut self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct UnrenderableScanner {
        closes: Arc<AtomicUsize>,
    }

    impl Scanner for UnrenderableScanner {
        fn scan(
            &self,
            _request: &DiscoveryRequest,
            _writer: &dyn MessageWriter,
        ) -> anyhow::Result<Box<dyn ScanResults>> {
            Ok(Box::new(UnrenderableResults {
                config: ProvisioningConfig::default(),
                errors: ErrorSession::default(),
                info: InfoReport::default(),
                closes: self.closes.clone(),
            }))
        }
    }

    #[test]
    fn test_render_failure_releases_results() {
        let temp = TempDir::new().unwrap();
        let deployment = temp.path().join("app.war");
        fs::write(&deployment, b"PK").unwrap();
        let closes = Arc::new(AtomicUsize::new(0));
        let scanner = UnrenderableScanner {
            closes: closes.clone(),
        };
        let descriptors = BundledDescriptors::new();
        let writer = RecordingWriter::new();
        let config = CompositionConfig::new();

        let err = DiscoveryOrchestrator::new(&descriptors, &scanner, &writer)
            .scan(&ScanInput {
                config: &config,
                explicit: &ExplicitComposition::default(),
                dry_run: false,
                deployment: &deployment,
                output_dir: temp.path(),
                resolver: None,
            })
            .unwrap_err();

        assert!(matches!(err, PipelineError::ScanFailure { ref message, .. } if message.contains("report template missing")));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert!(!temp.path().join(SCAN_DIR).join("provisioning.xml").exists());
    }
}
