use super::request::{PackageOutcome, PackageRequest, Resolution};
use crate::discovery::{DescriptorSource, DiscoveryOrchestrator, ScanInput, Scanner, SCAN_DIR};
use crate::error::PipelineError;
use crate::packaging::{ArchiveAssembler, ArchivePackager, OutputRegistry};
use crate::progress::{MessageWriter, ProgressEvent, ProgressHandler};
use crate::provisioning::{ProvisioningConfig, ProvisioningInvoker, Provisioner};
use std::time::Instant;
use tracing::{debug, info};

/// Resolves a composition, provisions it and optionally packages the result
pub struct PackagePipeline<'a> {
    descriptors: &'a dyn DescriptorSource,
    scanner: &'a dyn Scanner,
    provisioner: &'a dyn Provisioner,
    assembler: &'a dyn ArchiveAssembler,
    writer: &'a dyn MessageWriter,
    progress_handler: Option<&'a dyn ProgressHandler>,
}

impl<'a> PackagePipeline<'a> {
    pub fn new(
        descriptors: &'a dyn DescriptorSource,
        scanner: &'a dyn Scanner,
        provisioner: &'a dyn Provisioner,
        assembler: &'a dyn ArchiveAssembler,
        writer: &'a dyn MessageWriter,
    ) -> Self {
        Self {
            descriptors,
            scanner,
            provisioner,
            assembler,
            writer,
            progress_handler: None,
        }
    }

    pub fn with_progress(mut self, handler: &'a dyn ProgressHandler) -> Self {
        self.progress_handler = Some(handler);
        self
    }

    pub fn run(
        &self,
        request: &PackageRequest,
        registry: &mut dyn OutputRegistry,
    ) -> Result<PackageOutcome, PipelineError> {
        let start = Instant::now();
        info!(
            "Starting package pipeline for: {}",
            request.deployment.display()
        );
        self.emit(&ProgressEvent::Started {
            deployment: request.deployment.display().to_string(),
        });

        let result = self.execute(request, registry);

        match &result {
            Ok(outcome) => self.emit(&ProgressEvent::Completed {
                provisioned: outcome.provisioned(),
                archive: outcome
                    .archive
                    .as_ref()
                    .map(|p| p.display().to_string()),
                total_time: start.elapsed(),
            }),
            Err(e) => self.emit(&ProgressEvent::Failed {
                error: e.to_string(),
            }),
        }
        result
    }

    /// Selects the composition without provisioning anything.
    ///
    /// With discovery configured the deployment is scanned and the scan
    /// results are released before returning; otherwise the explicit
    /// feature packs are used as given.
    pub fn resolve(&self, request: &PackageRequest) -> Result<Resolution, PipelineError> {
        let Some(config) = &request.discovery else {
            return resolve_explicit(request);
        };

        let orchestrator = DiscoveryOrchestrator::new(self.descriptors, self.scanner, self.writer);
        let handle = orchestrator.scan(&ScanInput {
            config,
            explicit: &request.explicit,
            dry_run: request.dry_run,
            deployment: &request.deployment,
            output_dir: &request.output_dir,
            resolver: request.resolver.as_ref(),
        })?;

        let discovery_errors = handle.error_session().error_count();
        if discovery_errors > 0 {
            self.emit(&ProgressEvent::DiscoveryWarnings {
                errors: discovery_errors,
            });
        }

        Ok(Resolution {
            config: handle.into_provisioning_config(),
            discovered: true,
            discovery_errors,
            scan_dir: Some(request.output_dir.join(SCAN_DIR)),
        })
    }

    fn execute(
        &self,
        request: &PackageRequest,
        registry: &mut dyn OutputRegistry,
    ) -> Result<PackageOutcome, PipelineError> {
        let resolution = self.phase("resolve", || self.resolve(request))?;

        if request.dry_run {
            info!("Dry run, skipping provisioning");
            return Ok(PackageOutcome {
                resolution,
                server: None,
                archive: None,
            });
        }

        let server_dir = request.server_dir();
        let server = self.phase("provision", || {
            ProvisioningInvoker::new(self.provisioner).materialize(
                &resolution.config,
                &server_dir,
                request.overwrite,
            )
        })?;

        let archive = match &request.bootable {
            Some(options) => Some(self.phase("package", || {
                ArchivePackager::new(self.assembler, self.writer)
                    .with_resolver(request.resolver.as_ref())
                    .with_classifier(options.classifier.as_str())
                    .package(
                        &server,
                        &resolution.config,
                        &request.output_dir,
                        options.name.as_deref(),
                        registry,
                    )
            })?),
            None => None,
        };

        Ok(PackageOutcome {
            resolution,
            server: Some(server),
            archive,
        })
    }

    fn phase<T>(
        &self,
        name: &str,
        body: impl FnOnce() -> Result<T, PipelineError>,
    ) -> Result<T, PipelineError> {
        info!("Phase: {}", name);
        self.emit(&ProgressEvent::PhaseStarted {
            phase: name.to_string(),
        });

        let phase_start = Instant::now();
        let value = body()?;

        self.emit(&ProgressEvent::PhaseComplete {
            phase: name.to_string(),
            duration: phase_start.elapsed(),
        });
        debug!("Phase {} complete", name);
        Ok(value)
    }

    fn emit(&self, event: &ProgressEvent) {
        if let Some(handler) = self.progress_handler {
            handler.on_progress(event);
        }
    }
}

fn resolve_explicit(request: &PackageRequest) -> Result<Resolution, PipelineError> {
    if request.explicit.feature_packs.is_empty() {
        return Err(PipelineError::validation(
            "no feature pack configured; set feature-packs or enable discovery",
        ));
    }
    Ok(Resolution {
        config: ProvisioningConfig::from_explicit(&request.explicit),
        discovered: false,
        discovery_errors: 0,
        scan_dir: None,
    })
}
