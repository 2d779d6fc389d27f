//! Baseline descriptor lookup
//!
//! A baseline is the provisioning description a scan starts from, keyed by
//! product and execution context. Scanners want a file on disk, so resolving
//! a baseline copies it into a temporary file owned by the returned
//! [`BaselineDescriptor`]; the file goes away when the descriptor is dropped.

use crate::error::PipelineError;
use serde::Serialize;
use std::env;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempPath;

const BUNDLED: &[(&str, &str, &str)] = &[
    (
        "eap8.0",
        "bare-metal",
        include_str!("../../resources/eap8.0/provisioning-bare-metal.xml"),
    ),
    (
        "eap8.0",
        "cloud",
        include_str!("../../resources/eap8.0/provisioning-cloud.xml"),
    ),
    (
        "eap8.1",
        "bare-metal",
        include_str!("../../resources/eap8.1/provisioning-bare-metal.xml"),
    ),
    (
        "eap8.1",
        "cloud",
        include_str!("../../resources/eap8.1/provisioning-cloud.xml"),
    ),
];

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DescriptorKey {
    pub product: String,
    pub context: String,
}

impl DescriptorKey {
    pub fn new(product: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            product: product.into(),
            context: context.into(),
        }
    }

    /// Resource location, `/<product>/provisioning-<context>.xml`
    pub fn location(&self) -> String {
        format!("/{}/provisioning-{}.xml", self.product, self.context)
    }

    fn not_found(&self) -> PipelineError {
        PipelineError::DescriptorNotFound {
            product: self.product.clone(),
            context: self.context.clone(),
            location: self.location(),
        }
    }
}

impl fmt::Display for DescriptorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.product, self.context)
    }
}

/// Temporary on-disk copy of a baseline descriptor, deleted on drop
#[derive(Debug)]
pub struct BaselineDescriptor {
    path: TempPath,
}

impl BaselineDescriptor {
    fn create(content: &[u8], dir: Option<&Path>) -> Result<Self, PipelineError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("glowpack-baseline-").suffix("-provisioning.xml");

        let created = match dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        };
        let mut file = created.map_err(|e| {
            PipelineError::io(dir.map(Path::to_path_buf).unwrap_or_else(env::temp_dir), e)
        })?;
        file.write_all(content)
            .and_then(|_| file.flush())
            .map_err(|e| PipelineError::io(file.path(), e))?;

        Ok(Self {
            path: file.into_temp_path(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub trait DescriptorSource: Send + Sync {
    /// Raw descriptor bytes for `key`, or `DescriptorNotFound`
    fn load(&self, key: &DescriptorKey) -> Result<Vec<u8>, PipelineError>;

    /// Directory for temporary copies; the system default when `None`
    fn temp_dir(&self) -> Option<&Path> {
        None
    }

    /// Copies the descriptor for `key` into a fresh temporary file.
    ///
    /// Every call creates a new file. Nothing is written when `key` is unknown.
    fn resolve(&self, key: &DescriptorKey) -> Result<BaselineDescriptor, PipelineError> {
        let content = self.load(key)?;
        BaselineDescriptor::create(&content, self.temp_dir())
    }
}

/// Descriptors compiled into the binary
#[derive(Debug, Clone, Default)]
pub struct BundledDescriptors {
    temp_dir: Option<PathBuf>,
}

impl BundledDescriptors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    pub fn available() -> Vec<DescriptorKey> {
        BUNDLED
            .iter()
            .map(|(product, context, _)| DescriptorKey::new(*product, *context))
            .collect()
    }
}

impl DescriptorSource for BundledDescriptors {
    fn load(&self, key: &DescriptorKey) -> Result<Vec<u8>, PipelineError> {
        BUNDLED
            .iter()
            .find(|(product, context, _)| *product == key.product && *context == key.context)
            .map(|(_, _, content)| content.as_bytes().to_vec())
            .ok_or_else(|| key.not_found())
    }

    fn temp_dir(&self) -> Option<&Path> {
        self.temp_dir.as_deref()
    }
}

/// User-supplied descriptors laid out as `<root>/<product>/provisioning-<context>.xml`
#[derive(Debug, Clone)]
pub struct DirectoryDescriptors {
    root: PathBuf,
    temp_dir: Option<PathBuf>,
}

impl DirectoryDescriptors {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            temp_dir: None,
        }
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl DescriptorSource for DirectoryDescriptors {
    fn load(&self, key: &DescriptorKey) -> Result<Vec<u8>, PipelineError> {
        let location = key.location();
        let path = self.root.join(location.trim_start_matches('/'));
        if !path.is_file() {
            return Err(key.not_found());
        }
        fs::read(&path).map_err(|e| PipelineError::io(path, e))
    }

    fn temp_dir(&self) -> Option<&Path> {
        self.temp_dir.as_deref()
    }
}
