//! Configuration management for glowpack
//!
//! Settings are read from a TOML file whose keys mirror the packaging
//! parameters, then selectively overridden from the environment and finally
//! from command-line flags.
//!
//! # File lookup
//!
//! 1. `--config <path>` on the command line
//! 2. `GLOWPACK_CONFIG`
//! 3. `glowpack.toml` in the working directory, when present
//!
//! Without any file the defaults below apply.
//!
//! # Environment Variables
//!
//! - `GLOWPACK_OUTPUT_DIR`: Build output directory - default: "target"
//! - `GLOWPACK_DRY_RUN`: Skip provisioning (true|false) - default: "false"
//! - `GLOWPACK_OFFLINE`: Resolve artifacts offline (true|false) - default: "false"
//! - `GLOWPACK_LOG_LEVEL`, `GLOWPACK_LOG_JSON`: see [`crate::util::logging`]
//!
//! # Example
//!
//! ```toml
//! deployment = "target/app.war"
//! bootable-jar = true
//!
//! [discover-provisioning-info]
//! context = "cloud"
//! add-ons = ["postgresql"]
//!
//! [scanner]
//! program = "glow"
//! args = ["scan"]
//!
//! [provisioner]
//! program = "galleon.sh"
//! args = ["provision"]
//! ```

use crate::discovery::{CompositionConfig, ResolverContext};
use crate::packaging::DEFAULT_CLASSIFIER;
use crate::pipeline::{BootableOptions, PackageRequest, DEFAULT_PROVISIONING_DIR};
use crate::provisioning::{ExplicitComposition, FeaturePack};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "glowpack.toml";
pub const CONFIG_ENV: &str = "GLOWPACK_CONFIG";
const DEFAULT_OUTPUT_DIR: &str = "target";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A collaborator program is needed but not configured
    #[error("No {0} program configured. Add a [{0}] table with `program = \"...\"`")]
    MissingProgram(&'static str),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    /// Failed to parse an environment override
    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },
}

/// An external program and its leading arguments
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProgramConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl fmt::Display for ProgramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Everything one `glowpack` invocation is configured with
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct PackageConfig {
    pub output_dir: PathBuf,
    pub deployment: Option<PathBuf>,
    pub dry_run: bool,
    pub provisioning_dir: PathBuf,
    pub overwrite_provisioned_server: bool,

    pub feature_packs: Vec<FeaturePack>,
    pub layers: Vec<String>,
    pub excluded_layers: Vec<String>,
    pub galleon_options: BTreeMap<String, String>,
    pub layers_configuration_file_name: Option<String>,

    /// Root of user-supplied baseline descriptors; bundled ones when absent
    pub baseline_dir: Option<PathBuf>,
    pub discover_provisioning_info: Option<CompositionConfig>,

    pub bootable_jar: bool,
    pub bootable_jar_name: Option<String>,
    pub bootable_jar_install_artifact_classifier: String,

    pub scanner: Option<ProgramConfig>,
    pub provisioner: Option<ProgramConfig>,
    pub resolver: ResolverContext,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            deployment: None,
            dry_run: false,
            provisioning_dir: PathBuf::from(DEFAULT_PROVISIONING_DIR),
            overwrite_provisioned_server: false,
            feature_packs: Vec::new(),
            layers: Vec::new(),
            excluded_layers: Vec::new(),
            galleon_options: BTreeMap::new(),
            layers_configuration_file_name: None,
            baseline_dir: None,
            discover_provisioning_info: None,
            bootable_jar: false,
            bootable_jar_name: None,
            bootable_jar_install_artifact_classifier: DEFAULT_CLASSIFIER.to_string(),
            scanner: None,
            provisioner: None,
            resolver: ResolverContext::default(),
        }
    }
}

impl PackageConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the file selected by `explicit`, `GLOWPACK_CONFIG` or the
    /// default name, then applies environment overrides
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let selected = explicit
            .map(Path::to_path_buf)
            .or_else(|| env::var(CONFIG_ENV).ok().map(PathBuf::from));

        let config = match selected {
            Some(path) => Self::load(&path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::load(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => {
                debug!("No configuration file found, using defaults");
                Self::default()
            }
        };
        config.with_env_overrides()
    }

    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(dir) = env::var("GLOWPACK_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(dry_run) = env_bool("GLOWPACK_DRY_RUN")? {
            self.dry_run = dry_run;
        }
        if let Some(offline) = env_bool("GLOWPACK_OFFLINE")? {
            self.resolver.offline = offline;
        }
        Ok(self)
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when names are blank, the bootable archive name
    /// is not a plain file name, or a configured program is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "output-dir must not be empty".to_string(),
            ));
        }
        if self.provisioning_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "provisioning-dir must not be empty".to_string(),
            ));
        }
        if self.bootable_jar_install_artifact_classifier.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "bootable-jar-install-artifact-classifier must not be empty".to_string(),
            ));
        }
        if let Some(name) = &self.bootable_jar_name {
            if name.trim().is_empty() || name.contains(['/', '\\']) {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid bootable-jar-name '{}': expected a plain file name",
                    name
                )));
            }
        }
        for (kind, program) in [("scanner", &self.scanner), ("provisioner", &self.provisioner)] {
            if matches!(program, Some(p) if p.program.trim().is_empty()) {
                return Err(ConfigError::ValidationFailed(format!(
                    "[{}] program must not be empty",
                    kind
                )));
            }
        }
        if let Some(discovery) = &self.discover_provisioning_info {
            if discovery.product().is_empty() || discovery.context().is_empty() {
                return Err(ConfigError::ValidationFailed(
                    "discovery product and context must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn scanner(&self) -> Result<&ProgramConfig, ConfigError> {
        self.scanner
            .as_ref()
            .ok_or(ConfigError::MissingProgram("scanner"))
    }

    pub fn provisioner(&self) -> Result<&ProgramConfig, ConfigError> {
        self.provisioner
            .as_ref()
            .ok_or(ConfigError::MissingProgram("provisioner"))
    }

    pub fn explicit_composition(&self) -> ExplicitComposition {
        ExplicitComposition {
            feature_packs: self.feature_packs.clone(),
            layers: self.layers.clone(),
            excluded_layers: self.excluded_layers.clone(),
            options: self.galleon_options.clone(),
            config_name: self.layers_configuration_file_name.clone(),
        }
    }

    pub fn to_request(&self) -> PackageRequest {
        let mut request = PackageRequest::new(
            self.deployment.clone().unwrap_or_default(),
            self.output_dir.clone(),
        );
        request.discovery = self.discover_provisioning_info.clone();
        request.explicit = self.explicit_composition();
        request.dry_run = self.dry_run;
        request.provisioning_dir = self.provisioning_dir.clone();
        request.overwrite = self.overwrite_provisioned_server;
        request.bootable = self.bootable_jar.then(|| BootableOptions {
            name: self.bootable_jar_name.clone(),
            classifier: self.bootable_jar_install_artifact_classifier.clone(),
        });
        request.resolver = Some(self.resolver.clone());
        request
    }
}

fn env_bool(key: &str) -> Result<Option<bool>, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .to_lowercase()
            .parse::<bool>()
            .map(Some)
            .map_err(|e| ConfigError::ParseError {
                field: key.to_string(),
                error: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

impl fmt::Display for PackageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Glowpack Configuration:")?;
        writeln!(f, "  Output Dir: {}", self.output_dir.display())?;
        if let Some(ref deployment) = self.deployment {
            writeln!(f, "  Deployment: {}", deployment.display())?;
        }
        writeln!(f, "  Dry Run: {}", self.dry_run)?;
        writeln!(f, "  Provisioning Dir: {}", self.provisioning_dir.display())?;
        match &self.discover_provisioning_info {
            Some(discovery) => writeln!(
                f,
                "  Discovery: {} / {}",
                discovery.product(),
                discovery.context()
            )?,
            None => writeln!(f, "  Feature Packs: {}", self.feature_packs.len())?,
        }
        if self.bootable_jar {
            writeln!(
                f,
                "  Bootable Archive: {} ({})",
                self.bootable_jar_name.as_deref().unwrap_or("default name"),
                self.bootable_jar_install_artifact_classifier
            )?;
        }
        if let Some(ref scanner) = self.scanner {
            writeln!(f, "  Scanner: {}", scanner)?;
        }
        if let Some(ref provisioner) = self.provisioner {
            writeln!(f, "  Provisioner: {}", provisioner)?;
        }
        writeln!(f, "  Offline: {}", self.resolver.offline)?;
        Ok(())
    }
}
