//! Build-output registration

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const MANIFEST_FILE: &str = "attached-artifacts.json";

/// Records files produced by the pipeline as build outputs
#[cfg_attr(test, mockall::automock)]
pub trait OutputRegistry {
    fn attach(&mut self, kind: &str, classifier: &str, path: &Path);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedArtifact {
    pub kind: String,
    pub classifier: String,
    pub path: PathBuf,
    pub attached_at: DateTime<Utc>,
}

/// In-memory registry that can be written next to the build outputs
#[derive(Debug, Clone, Default)]
pub struct ArtifactManifest {
    artifacts: Vec<AttachedArtifact>,
}

impl ArtifactManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn artifacts(&self) -> &[AttachedArtifact] {
        &self.artifacts
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Writes `attached-artifacts.json` into `output_dir`
    pub fn persist(&self, output_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create directory {}", output_dir.display()))?;
        let path = output_dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(&self.artifacts)
            .context("Failed to serialize attached artifacts")?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let artifacts = serde_json::from_str(&content)
            .with_context(|| format!("Invalid artifact manifest {}", path.display()))?;
        Ok(Self { artifacts })
    }
}

impl OutputRegistry for ArtifactManifest {
    /// A second attachment with the same kind and classifier replaces the first
    fn attach(&mut self, kind: &str, classifier: &str, path: &Path) {
        debug!(kind, classifier, path = %path.display(), "Attaching build output");
        self.artifacts
            .retain(|a| !(a.kind == kind && a.classifier == classifier));
        self.artifacts.push(AttachedArtifact {
            kind: kind.to_string(),
            classifier: classifier.to_string(),
            path: path.to_path_buf(),
            attached_at: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_attach_replaces_same_classifier() {
        let mut manifest = ArtifactManifest::new();
        manifest.attach("tar.gz", "bootable", Path::new("/out/a.tar.gz"));
        manifest.attach("tar.gz", "bootable", Path::new("/out/b.tar.gz"));
        manifest.attach("tar.gz", "cloud", Path::new("/out/c.tar.gz"));

        let paths: Vec<_> = manifest.artifacts().iter().map(|a| a.path.clone()).collect();
        assert_eq!(
            paths,
            vec![PathBuf::from("/out/b.tar.gz"), PathBuf::from("/out/c.tar.gz")]
        );
    }

    #[test]
    fn test_persist_and_load() {
        let temp = TempDir::new().unwrap();
        let mut manifest = ArtifactManifest::new();
        manifest.attach("tar.gz", "bootable", &temp.path().join("server-bootable.tar.gz"));

        let path = manifest.persist(temp.path()).unwrap();
        assert_eq!(path, temp.path().join(MANIFEST_FILE));

        let loaded = ArtifactManifest::load(&path).unwrap();
        assert_eq!(loaded.artifacts(), manifest.artifacts());
    }

    #[test]
    fn test_empty_manifest() {
        assert!(ArtifactManifest::new().is_empty());
    }
}
