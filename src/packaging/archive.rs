//! Bootable archive packaging
//!
//! Bundles a provisioned distribution and the composition it was built from
//! into one file, then registers that file as a build output.

use super::registry::OutputRegistry;
use crate::discovery::ResolverContext;
use crate::error::PipelineError;
use crate::progress::MessageWriter;
use crate::provisioning::ProvisioningConfig;
use anyhow::{bail, Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::env;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const ARCHIVE_NAME_RADICAL: &str = "server-";
pub const BOOTABLE_SUFFIX: &str = "bootable";
pub const DEFAULT_CLASSIFIER: &str = BOOTABLE_SUFFIX;

/// Archive entry holding the composition description
pub const DESCRIPTOR_ENTRY: &str = "provisioning.xml";
/// Archive directory holding the distribution tree
pub const DISTRIBUTION_ENTRY: &str = "server";

/// Physically assembles an archive from a distribution directory
pub trait ArchiveAssembler: Send + Sync {
    /// File extension of produced archives, also used as the artifact kind
    fn extension(&self) -> &str;

    fn assemble(
        &self,
        target: &Path,
        distribution: &Path,
        config: &ProvisioningConfig,
        resolver: Option<&ResolverContext>,
        writer: &dyn MessageWriter,
    ) -> Result<()>;
}

/// Gzip-compressed tar with the distribution under `server/`
#[derive(Debug, Default, Clone, Copy)]
pub struct TarGzAssembler;

impl ArchiveAssembler for TarGzAssembler {
    fn extension(&self) -> &str {
        "tar.gz"
    }

    fn assemble(
        &self,
        target: &Path,
        distribution: &Path,
        config: &ProvisioningConfig,
        _resolver: Option<&ResolverContext>,
        writer: &dyn MessageWriter,
    ) -> Result<()> {
        if !distribution.is_dir() {
            bail!("Distribution {} is not a directory", distribution.display());
        }

        let file = File::create(target)
            .with_context(|| format!("Failed to create archive {}", target.display()))?;
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        builder.follow_symlinks(false);

        builder
            .append_dir_all(DISTRIBUTION_ENTRY, distribution)
            .with_context(|| format!("Failed to archive {}", distribution.display()))?;

        let descriptor = config.to_xml();
        let mut header = tar::Header::new_gnu();
        header.set_size(descriptor.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(chrono::Utc::now().timestamp().max(0) as u64);
        header.set_cksum();
        builder
            .append_data(&mut header, DESCRIPTOR_ENTRY, descriptor.as_bytes())
            .context("Failed to add the provisioning description")?;

        builder
            .into_inner()
            .and_then(|encoder| encoder.finish())
            .with_context(|| format!("Failed to finish archive {}", target.display()))?;

        writer.trace(&format!(
            "Archived {} with its provisioning description",
            distribution.display()
        ));
        Ok(())
    }
}

/// Produces the bootable archive for a provisioned distribution
pub struct ArchivePackager<'a> {
    assembler: &'a dyn ArchiveAssembler,
    writer: &'a dyn MessageWriter,
    resolver: Option<&'a ResolverContext>,
    classifier: String,
}

impl<'a> ArchivePackager<'a> {
    pub fn new(assembler: &'a dyn ArchiveAssembler, writer: &'a dyn MessageWriter) -> Self {
        Self {
            assembler,
            writer,
            resolver: None,
            classifier: DEFAULT_CLASSIFIER.to_string(),
        }
    }

    pub fn with_resolver(mut self, resolver: Option<&'a ResolverContext>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = classifier.into();
        self
    }

    /// `name_override`, or `server-bootable.<extension>`
    pub fn archive_name(&self, name_override: Option<&str>) -> String {
        match name_override {
            Some(name) => name.to_string(),
            None => format!(
                "{}{}.{}",
                ARCHIVE_NAME_RADICAL,
                BOOTABLE_SUFFIX,
                self.assembler.extension()
            ),
        }
    }

    /// Writes the archive into `output_dir`, replacing any previous one
    pub fn package(
        &self,
        distribution: &Path,
        config: &ProvisioningConfig,
        output_dir: &Path,
        name_override: Option<&str>,
        registry: &mut dyn OutputRegistry,
    ) -> Result<PathBuf, PipelineError> {
        info!("Building bootable archive...");
        let output_dir = absolute(output_dir)?;
        fs::create_dir_all(&output_dir).map_err(|e| PipelineError::io(&output_dir, e))?;

        let target = output_dir.join(self.archive_name(name_override));
        remove_stale(&target)?;

        self.assembler
            .assemble(&target, distribution, config, self.resolver, self.writer)
            .map_err(|e| {
                PipelineError::collaborator(
                    format!("Failed to assemble {}", target.display()),
                    e,
                )
            })?;

        registry.attach(self.assembler.extension(), &self.classifier, &target);
        debug!(
            classifier = %self.classifier,
            path = %target.display(),
            "Attached bootable archive"
        );
        info!(path = %target.display(), "Bootable archive packaging DONE");
        Ok(target)
    }
}

fn absolute(path: &Path) -> Result<PathBuf, PipelineError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|e| PipelineError::io(path, e))
}

fn remove_stale(target: &Path) -> Result<(), PipelineError> {
    match fs::remove_file(target) {
        Ok(()) => {
            debug!(path = %target.display(), "Removed previous archive");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(PipelineError::io(target, e)),
    }
}
