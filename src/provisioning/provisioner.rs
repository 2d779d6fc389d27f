//! Provisioning engine boundary

use super::descriptor::ProvisioningConfig;
use crate::error::PipelineError;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Turns a composition into an installed distribution directory
#[cfg_attr(test, mockall::automock)]
pub trait Provisioner: Send + Sync {
    /// Installs `config` into `target` and returns the distribution root
    fn materialize(&self, config: &ProvisioningConfig, target: &Path) -> Result<PathBuf>;
}

/// Runs an external provisioning program as
/// `<program> <args...> <provisioning.xml> <target-dir>`
#[derive(Debug, Clone)]
pub struct ProcessProvisioner {
    program: String,
    args: Vec<String>,
}

impl ProcessProvisioner {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Where the description is stored for the engine, beside the target directory
    pub fn descriptor_path(target: &Path) -> PathBuf {
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "server".to_string());
        target.with_file_name(format!("{}-provisioning.xml", name))
    }
}

impl Provisioner for ProcessProvisioner {
    fn materialize(&self, config: &ProvisioningConfig, target: &Path) -> Result<PathBuf> {
        let descriptor = Self::descriptor_path(target);
        config.store(&descriptor)?;

        debug!(program = %self.program, descriptor = %descriptor.display(), "Running provisioner");
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(&descriptor)
            .arg(target)
            .output()
            .with_context(|| format!("Failed to start provisioner '{}'", self.program))?;

        if !output.status.success() {
            bail!(
                "Provisioner '{}' exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        if !target.is_dir() {
            bail!(
                "Provisioner '{}' succeeded but left no distribution at {}",
                self.program,
                target.display()
            );
        }
        Ok(target.to_path_buf())
    }
}

/// Feeds the selected composition to a [`Provisioner`]
pub struct ProvisioningInvoker<'a> {
    provisioner: &'a dyn Provisioner,
}

impl<'a> ProvisioningInvoker<'a> {
    pub fn new(provisioner: &'a dyn Provisioner) -> Self {
        Self { provisioner }
    }

    /// Materializes `config` into `target`.
    ///
    /// An existing `target` is replaced only when `overwrite` is set.
    pub fn materialize(
        &self,
        config: &ProvisioningConfig,
        target: &Path,
        overwrite: bool,
    ) -> Result<PathBuf, PipelineError> {
        if config.is_empty() {
            return Err(PipelineError::validation(
                "the composition does not reference any feature pack",
            ));
        }
        prepare_target(target, overwrite)?;

        info!(target = %target.display(), "Provisioning server");
        self.provisioner
            .materialize(config, target)
            .map_err(|e| {
                PipelineError::collaborator(
                    format!("Provisioning into {} failed", target.display()),
                    e,
                )
            })
    }
}

fn prepare_target(target: &Path, overwrite: bool) -> Result<(), PipelineError> {
    if !target.exists() {
        return Ok(());
    }
    if !overwrite {
        return Err(PipelineError::validation(format!(
            "a server already exists in {}, enable overwrite-provisioned-server to replace it",
            target.display()
        )));
    }
    debug!(target = %target.display(), "Removing previously provisioned server");
    fs::remove_dir_all(target).map_err(|e| PipelineError::io(target, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provisioning::FeaturePack;
    use mockall::predicate::eq;
    use tempfile::TempDir;

    fn config() -> ProvisioningConfig {
        ProvisioningConfig {
            feature_packs: vec![FeaturePack::new("org.jboss.eap:wildfly-ee-galleon-pack")],
            layers: vec!["jaxrs-server".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_invoker_delegates_once() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("server");
        let expected = target.clone();

        let mut provisioner = MockProvisioner::new();
        provisioner
            .expect_materialize()
            .with(eq(config()), eq(target.clone()))
            .times(1)
            .returning(|_, target| Ok(target.to_path_buf()));

        let installed = ProvisioningInvoker::new(&provisioner)
            .materialize(&config(), &target, false)
            .unwrap();
        assert_eq!(installed, expected);
    }

    #[test]
    fn test_existing_target_without_overwrite_is_rejected() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("server");
        fs::create_dir_all(&target).unwrap();

        let mut provisioner = MockProvisioner::new();
        provisioner.expect_materialize().times(0);

        let err = ProvisioningInvoker::new(&provisioner)
            .materialize(&config(), &target, false)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
        assert!(target.exists());
    }

    #[test]
    fn test_existing_target_with_overwrite_is_cleared() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("server");
        fs::create_dir_all(target.join("standalone")).unwrap();
        fs::write(target.join("stale.txt"), "old").unwrap();

        let mut provisioner = MockProvisioner::new();
        provisioner
            .expect_materialize()
            .times(1)
            .returning(|_, target| {
                assert!(!target.exists());
                Ok(target.to_path_buf())
            });

        ProvisioningInvoker::new(&provisioner)
            .materialize(&config(), &target, true)
            .unwrap();
    }

    #[test]
    fn test_failure_is_wrapped_with_context() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("server");

        let mut provisioner = MockProvisioner::new();
        provisioner
            .expect_materialize()
            .returning(|_, _| Err(anyhow::anyhow!("feature pack not found")));

        let err = ProvisioningInvoker::new(&provisioner)
            .materialize(&config(), &target, false)
            .unwrap_err();
        match err {
            PipelineError::Collaborator { context, source } => {
                assert!(context.starts_with("Provisioning into"));
                assert_eq!(source.to_string(), "feature pack not found");
            }
            other => panic!("Expected Collaborator error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_composition_is_rejected() {
        let temp = TempDir::new().unwrap();
        let mut provisioner = MockProvisioner::new();
        provisioner.expect_materialize().times(0);

        let err = ProvisioningInvoker::new(&provisioner)
            .materialize(&ProvisioningConfig::default(), &temp.path().join("server"), false)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
    }

    #[test]
    fn test_descriptor_path_sits_beside_target() {
        assert_eq!(
            ProcessProvisioner::descriptor_path(Path::new("/out/server")),
            PathBuf::from("/out/server-provisioning.xml")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_process_provisioner_runs_program() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("server");
        let provisioner = ProcessProvisioner::new(
            "sh",
            vec![
                "-c".to_string(),
                r#"grep -q wildfly-ee-galleon-pack "$1" && mkdir -p "$2/bin""#.to_string(),
                "provisioner".to_string(),
            ],
        );

        let installed = provisioner.materialize(&config(), &target).unwrap();

        assert_eq!(installed, target);
        assert!(target.join("bin").is_dir());
        assert!(temp.path().join("server-provisioning.xml").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn test_process_provisioner_reports_exit_status() {
        let temp = TempDir::new().unwrap();
        let provisioner = ProcessProvisioner::new(
            "sh",
            vec![
                "-c".to_string(),
                "echo unresolved >&2; exit 3".to_string(),
                "provisioner".to_string(),
            ],
        );

        let err = provisioner
            .materialize(&config(), &temp.path().join("server"))
            .unwrap_err();
        assert!(err.to_string().contains("unresolved"));
    }
}
