//! Command handlers wiring configuration to the pipeline

use super::commands::{BaselinesArgs, CliArgs, PackageArgs, ScanArgs};
use super::output::OutputFormatter;
use crate::config::{ConfigError, PackageConfig, ProgramConfig};
use crate::discovery::{
    BundledDescriptors, DescriptorSource, DirectoryDescriptors, DiscoveryRequest, ProcessScanner,
    ScanResults, Scanner,
};
use crate::error::PipelineError;
use crate::packaging::{ArtifactManifest, TarGzAssembler};
use crate::pipeline::PackagePipeline;
use crate::progress::{LoggingHandler, MessageWriter, TracingMessageWriter};
use crate::provisioning::{ProcessProvisioner, Provisioner, ProvisioningConfig};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Stands in for a collaborator the invocation does not need
struct Unconfigured(&'static str);

impl Scanner for Unconfigured {
    fn scan(
        &self,
        _request: &DiscoveryRequest,
        _writer: &dyn MessageWriter,
    ) -> Result<Box<dyn ScanResults>> {
        Err(ConfigError::MissingProgram(self.0).into())
    }
}

impl Provisioner for Unconfigured {
    fn materialize(&self, _config: &ProvisioningConfig, _target: &Path) -> Result<PathBuf> {
        Err(ConfigError::MissingProgram(self.0).into())
    }
}

struct Collaborators {
    descriptors: Box<dyn DescriptorSource>,
    scanner: Box<dyn Scanner>,
    provisioner: Box<dyn Provisioner>,
    writer: TracingMessageWriter,
}

impl Collaborators {
    fn from_config(config: &PackageConfig, verbose: bool) -> Result<Self, ConfigError> {
        let descriptors: Box<dyn DescriptorSource> = match &config.baseline_dir {
            Some(dir) => Box::new(DirectoryDescriptors::new(dir)),
            None => Box::new(BundledDescriptors::new()),
        };

        let scanner: Box<dyn Scanner> = match &config.discover_provisioning_info {
            Some(_) => {
                let ProgramConfig { program, args } = config.scanner()?.clone();
                Box::new(ProcessScanner::new(program, args))
            }
            None => Box::new(Unconfigured("scanner")),
        };

        let provisioner: Box<dyn Provisioner> = if config.dry_run {
            Box::new(Unconfigured("provisioner"))
        } else {
            let ProgramConfig { program, args } = config.provisioner()?.clone();
            Box::new(ProcessProvisioner::new(program, args))
        };

        let scan_verbose = config
            .discover_provisioning_info
            .as_ref()
            .is_some_and(|d| d.verbose());

        Ok(Self {
            descriptors,
            scanner,
            provisioner,
            writer: TracingMessageWriter::new(verbose || scan_verbose),
        })
    }
}

fn load_config(cli: &CliArgs, apply: impl FnOnce(&mut PackageConfig)) -> Result<PackageConfig> {
    let mut config = PackageConfig::discover(cli.config.as_deref())?;
    apply(&mut config);
    config.validate()?;
    debug!("{}", config);
    Ok(config)
}

pub fn handle_package(args: &PackageArgs, cli: &CliArgs) -> Result<String> {
    let config = load_config(cli, |config| args.apply(config))?;
    let collaborators = Collaborators::from_config(&config, cli.verbose)?;
    let assembler = TarGzAssembler;
    let progress = LoggingHandler;

    let pipeline = PackagePipeline::new(
        collaborators.descriptors.as_ref(),
        collaborators.scanner.as_ref(),
        collaborators.provisioner.as_ref(),
        &assembler,
        &collaborators.writer,
    )
    .with_progress(&progress);

    let mut manifest = ArtifactManifest::new();
    let outcome = pipeline.run(&config.to_request(), &mut manifest)?;

    if !manifest.is_empty() {
        let path = manifest
            .persist(&config.output_dir)
            .context("Failed to record attached artifacts")?;
        info!(path = %path.display(), "Attached artifacts recorded");
    }

    OutputFormatter::new(args.common.format.into()).format_outcome(&outcome)
}

pub fn handle_scan(args: &ScanArgs, cli: &CliArgs) -> Result<String> {
    let config = load_config(cli, |config| {
        args.common.apply(config);
        config
            .discover_provisioning_info
            .get_or_insert_with(Default::default);
    })?;

    // resolve() never provisions
    let mut collaborator_config = config.clone();
    collaborator_config.dry_run = true;
    let collaborators = Collaborators::from_config(&collaborator_config, cli.verbose)?;
    let assembler = TarGzAssembler;

    let pipeline = PackagePipeline::new(
        collaborators.descriptors.as_ref(),
        collaborators.scanner.as_ref(),
        collaborators.provisioner.as_ref(),
        &assembler,
        &collaborators.writer,
    )
    .with_progress(&LoggingHandler);

    let resolution = pipeline.resolve(&config.to_request())?;
    OutputFormatter::new(args.common.format.into()).format_resolution(&resolution)
}

pub fn handle_baselines(args: &BaselinesArgs) -> Result<String> {
    OutputFormatter::new(args.format.into()).format_baselines(&BundledDescriptors::available())
}

/// Usage and configuration problems exit with 2, everything else with 1
pub fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(pipeline) = err.downcast_ref::<PipelineError>() {
        return pipeline.exit_code();
    }
    if err.downcast_ref::<ConfigError>().is_some() {
        return 2;
    }
    1
}
