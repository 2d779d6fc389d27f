//! Deployment scanner boundary
//!
//! The scanner inspects a deployment and proposes a composition. Its results
//! may hold resources (scratch directories, open outputs), so they travel in a
//! [`ScanHandle`] that closes them exactly once.

use super::request::DiscoveryRequest;
use crate::progress::MessageWriter;
use crate::provisioning::ProvisioningConfig;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use tracing::{debug, warn};

/// File name used when persisting a scanned composition
pub const DEFAULT_OUTPUT_NAME: &str = "provisioning.xml";

const REQUEST_FILE: &str = "request.json";
const REPORT_FILE: &str = "report.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifiedError {
    pub id: String,
    pub description: String,
    /// Set when the scanner resolved the problem itself (for example by adding a layer)
    #[serde(default)]
    pub fixed: bool,
}

impl IdentifiedError {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            fixed: false,
        }
    }
}

/// Problems detected while scanning
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorSession {
    errors: Vec<IdentifiedError>,
}

impl ErrorSession {
    pub fn new(errors: Vec<IdentifiedError>) -> Self {
        Self { errors }
    }

    pub fn add(&mut self, error: IdentifiedError) {
        self.errors.push(error);
    }

    pub fn errors(&self) -> &[IdentifiedError] {
        &self.errors
    }

    /// Unfixed errors only
    pub fn error_count(&self) -> usize {
        self.errors.iter().filter(|e| !e.fixed).count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }
}

/// Human-readable summary of a scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct InfoReport {
    pub layers: Vec<String>,
    pub excluded_layers: Vec<String>,
    pub enabled_add_ons: Vec<String>,
    pub suggested_add_ons: Vec<String>,
    pub messages: Vec<String>,
}

impl InfoReport {
    pub fn render(&self, writer: &dyn MessageWriter) {
        render_list(writer, "layers", &self.layers);
        render_list(writer, "excluded layers", &self.excluded_layers);
        render_list(writer, "enabled add-ons", &self.enabled_add_ons);
        render_list(writer, "suggested add-ons", &self.suggested_add_ons);
        for message in &self.messages {
            writer.info(message);
        }
    }
}

fn render_list(writer: &dyn MessageWriter, label: &str, values: &[String]) {
    if !values.is_empty() {
        writer.info(&format!("{}: {}", label, values.join(", ")));
    }
}

pub trait ScanResults: Send {
    fn provisioning_config(&self) -> &ProvisioningConfig;

    fn error_session(&self) -> &ErrorSession;

    fn info_report(&self) -> &InfoReport;

    fn output_information(&self, writer: &dyn MessageWriter) -> Result<()> {
        self.info_report().render(writer);
        for error in self.error_session().errors() {
            if error.fixed {
                writer.info(&format!("[{}] fixed: {}", error.id, error.description));
            } else {
                writer.error(&format!("[{}] {}", error.id, error.description));
            }
        }
        Ok(())
    }

    /// Persists the composition into `target_dir`, returning the written file
    fn output_config(&self, target_dir: &Path, name: Option<&str>) -> Result<PathBuf> {
        let path = target_dir.join(name.unwrap_or(DEFAULT_OUTPUT_NAME));
        self.provisioning_config().store(&path)?;
        Ok(path)
    }

    fn close(&mut self) {}
}

/// Plain scan output without attached resources
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutput {
    pub config: ProvisioningConfig,
    pub errors: ErrorSession,
    pub info: InfoReport,
}

impl ScanResults for ScanOutput {
    fn provisioning_config(&self) -> &ProvisioningConfig {
        &self.config
    }

    fn error_session(&self) -> &ErrorSession {
        &self.errors
    }

    fn info_report(&self) -> &InfoReport {
        &self.info
    }
}

/// Owns scan results and closes them exactly once, on `release` or drop
pub struct ScanHandle {
    results: Box<dyn ScanResults>,
    closed: bool,
}

impl ScanHandle {
    pub fn new(results: Box<dyn ScanResults>) -> Self {
        Self {
            results,
            closed: false,
        }
    }

    pub fn provisioning_config(&self) -> &ProvisioningConfig {
        self.results.provisioning_config()
    }

    pub fn error_session(&self) -> &ErrorSession {
        self.results.error_session()
    }

    pub fn info_report(&self) -> &InfoReport {
        self.results.info_report()
    }

    pub fn output_information(&self, writer: &dyn MessageWriter) -> Result<()> {
        self.results.output_information(writer)
    }

    pub fn output_config(&self, target_dir: &Path, name: Option<&str>) -> Result<PathBuf> {
        self.results.output_config(target_dir, name)
    }

    /// Takes a copy of the composition and releases the results
    pub fn into_provisioning_config(self) -> ProvisioningConfig {
        let config = self.provisioning_config().clone();
        self.release();
        config
    }

    pub fn release(mut self) {
        self.close_once();
    }

    fn close_once(&mut self) {
        if !self.closed {
            self.closed = true;
            self.results.close();
        }
    }
}

impl Drop for ScanHandle {
    fn drop(&mut self) {
        self.close_once();
    }
}

impl fmt::Debug for ScanHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanHandle")
            .field("feature_packs", &self.provisioning_config().feature_packs.len())
            .field("errors", &self.error_session().error_count())
            .field("closed", &self.closed)
            .finish()
    }
}

pub trait Scanner: Send + Sync {
    fn scan(
        &self,
        request: &DiscoveryRequest,
        writer: &dyn MessageWriter,
    ) -> Result<Box<dyn ScanResults>>;
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReportFile {
    errors: ErrorSession,
    info: InfoReport,
}

/// Drives an external scanning program.
///
/// The program is invoked as `<program> <args...> <scratch-dir>`. It finds
/// the serialized [`DiscoveryRequest`] in `<scratch-dir>/request.json` and
/// must leave `provisioning.xml` (and optionally `report.json`) next to it.
#[derive(Debug, Clone)]
pub struct ProcessScanner {
    program: String,
    args: Vec<String>,
}

impl ProcessScanner {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn read_output(scratch: &Path) -> Result<ScanOutput> {
        let config = ProvisioningConfig::load(&scratch.join(DEFAULT_OUTPUT_NAME))
            .context("Scanner did not produce a usable provisioning description")?;

        let report_path = scratch.join(REPORT_FILE);
        let report = if report_path.exists() {
            let content = fs::read_to_string(&report_path)
                .with_context(|| format!("Failed to read {}", report_path.display()))?;
            serde_json::from_str::<ReportFile>(&content)
                .with_context(|| format!("Invalid scan report {}", report_path.display()))?
        } else {
            ReportFile::default()
        };

        Ok(ScanOutput {
            config,
            errors: report.errors,
            info: report.info,
        })
    }
}

impl Scanner for ProcessScanner {
    fn scan(
        &self,
        request: &DiscoveryRequest,
        writer: &dyn MessageWriter,
    ) -> Result<Box<dyn ScanResults>> {
        let scratch = tempfile::Builder::new()
            .prefix("glowpack-scan-")
            .tempdir()
            .context("Failed to create scanner scratch directory")?;

        let request_path = scratch.path().join(REQUEST_FILE);
        let payload =
            serde_json::to_vec_pretty(request).context("Failed to serialize discovery request")?;
        fs::write(&request_path, payload)
            .with_context(|| format!("Failed to write {}", request_path.display()))?;

        debug!(program = %self.program, scratch = %scratch.path().display(), "Running scanner");
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(scratch.path())
            .output()
            .with_context(|| format!("Failed to start scanner '{}'", self.program))?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            writer.trace(line);
        }
        if !output.status.success() {
            bail!(
                "Scanner '{}' exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let scan_output = Self::read_output(scratch.path())?;
        Ok(Box::new(ProcessScanResults {
            output: scan_output,
            scratch: Some(scratch),
        }))
    }
}

struct ProcessScanResults {
    output: ScanOutput,
    scratch: Option<TempDir>,
}

impl ScanResults for ProcessScanResults {
    fn provisioning_config(&self) -> &ProvisioningConfig {
        &self.output.config
    }

    fn error_session(&self) -> &ErrorSession {
        &self.output.errors
    }

    fn info_report(&self) -> &InfoReport {
        &self.output.info
    }

    fn close(&mut self) {
        if let Some(scratch) = self.scratch.take() {
            let path = scratch.path().to_path_buf();
            if let Err(e) = scratch.close() {
                warn!(path = %path.display(), error = %e, "Failed to remove scanner scratch directory");
            }
        }
    }
}
