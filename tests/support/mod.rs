//! Test doubles shared by the integration tests
#![allow(dead_code)]

use glowpack::discovery::{
    DescriptorKey, DescriptorSource, DiscoveryRequest, ErrorSession, IdentifiedError, InfoReport,
    ScanOutput, ScanResults, Scanner,
};
use glowpack::progress::MessageWriter;
use glowpack::provisioning::{FeaturePack, ProvisioningConfig, Provisioner};
use glowpack::PipelineError;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const BASELINE_XML: &str = r#"<?xml version="1.0" ?>
<installation xmlns="urn:jboss:galleon:provisioning:3.0">
    <feature-pack location="org.jboss.eap:wildfly-ee-galleon-pack">
        <default-configs inherit="false"/>
        <packages inherit="false"/>
    </feature-pack>
</installation>
"#;

pub fn deployment(dir: &Path) -> PathBuf {
    let path = dir.join("app.war");
    fs::write(&path, b"PK\x03\x04").unwrap();
    path
}

pub fn discovered_config() -> ProvisioningConfig {
    ProvisioningConfig {
        feature_packs: vec![FeaturePack::new("org.jboss.eap:wildfly-ee-galleon-pack")],
        layers: vec![
            "jaxrs-server".to_string(),
            "deployment-scanner".to_string(),
        ],
        ..Default::default()
    }
}

pub fn files_in(dir: &Path) -> usize {
    fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

/// Descriptor source backed by a map, writing temp copies into `temp_dir`
pub struct InMemoryDescriptors {
    entries: HashMap<DescriptorKey, Vec<u8>>,
    temp_dir: PathBuf,
}

impl InMemoryDescriptors {
    pub fn new(temp_dir: &Path) -> Self {
        fs::create_dir_all(temp_dir).unwrap();
        Self {
            entries: HashMap::new(),
            temp_dir: temp_dir.to_path_buf(),
        }
    }

    pub fn with(mut self, product: &str, context: &str, content: &str) -> Self {
        self.entries.insert(
            DescriptorKey::new(product, context),
            content.as_bytes().to_vec(),
        );
        self
    }
}

impl DescriptorSource for InMemoryDescriptors {
    fn load(&self, key: &DescriptorKey) -> Result<Vec<u8>, PipelineError> {
        self.entries
            .get(key)
            .cloned()
            .ok_or_else(|| PipelineError::DescriptorNotFound {
                product: key.product.clone(),
                context: key.context.clone(),
                location: key.location(),
            })
    }

    fn temp_dir(&self) -> Option<&Path> {
        Some(&self.temp_dir)
    }
}

/// What a [`StubScanner`] observed on one call
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub request: DiscoveryRequest,
    pub baseline_existed: bool,
}

/// Scanner returning canned results and counting calls and closes
#[derive(Default)]
pub struct StubScanner {
    output: ScanOutput,
    failure: Option<String>,
    pub calls: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
    pub seen: Mutex<Vec<SeenRequest>>,
}

impl StubScanner {
    pub fn returning(config: ProvisioningConfig) -> Self {
        Self {
            output: ScanOutput {
                config,
                info: InfoReport {
                    layers: vec!["jaxrs-server".to_string()],
                    ..Default::default()
                },
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn with_errors(mut self, errors: Vec<IdentifiedError>) -> Self {
        self.output.errors = ErrorSession::new(errors);
        self
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> SeenRequest {
        self.seen.lock().unwrap().last().cloned().unwrap()
    }
}

impl Scanner for StubScanner {
    fn scan(
        &self,
        request: &DiscoveryRequest,
        _writer: &dyn MessageWriter,
    ) -> anyhow::Result<Box<dyn ScanResults>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(SeenRequest {
            request: request.clone(),
            baseline_existed: request.baseline().is_some_and(Path::is_file),
        });
        if let Some(message) = &self.failure {
            anyhow::bail!("{}", message);
        }
        Ok(Box::new(StubResults {
            output: self.output.clone(),
            closes: self.closes.clone(),
        }))
    }
}

struct StubResults {
    output: ScanOutput,
    closes: Arc<AtomicUsize>,
}

impl ScanResults for StubResults {
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
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Fails the test if discovery reaches the scanner
pub struct UnreachableScanner;

impl Scanner for UnreachableScanner {
    fn scan(
        &self,
        _request: &DiscoveryRequest,
        _writer: &dyn MessageWriter,
    ) -> anyhow::Result<Box<dyn ScanResults>> {
        panic!("scanner must not be invoked");
    }
}

/// Provisioner that lays out a minimal server tree
#[derive(Default)]
pub struct InstallingProvisioner {
    pub installed: Mutex<Vec<ProvisioningConfig>>,
}

impl InstallingProvisioner {
    pub fn calls(&self) -> usize {
        self.installed.lock().unwrap().len()
    }
}

impl Provisioner for InstallingProvisioner {
    fn materialize(&self, config: &ProvisioningConfig, target: &Path) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(target.join("bin"))?;
        fs::write(target.join("bin/standalone.sh"), "#!/bin/sh\n")?;
        self.installed.lock().unwrap().push(config.clone());
        Ok(target.to_path_buf())
    }
}
