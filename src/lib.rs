//! glowpack - provision and package application servers for a deployment
//!
//! Given a deployment artifact, glowpack decides which feature packs and
//! layers a server needs, provisions that server through an external engine
//! and optionally bundles it into a single bootable archive.
//!
//! # Core Concepts
//!
//! - **Composition**: feature packs, layers and options that fully determine
//!   a server distribution ([`ProvisioningConfig`])
//! - **Discovery**: computing the composition by scanning the deployment,
//!   starting from a baseline descriptor keyed by product and execution
//!   context
//! - **Explicit mode**: the caller lists the feature packs and layers; it
//!   excludes discovery
//! - **Bootable archive**: the provisioned server plus its composition in one
//!   file, registered as a build output
//!
//! # Example Usage
//!
//! ```no_run
//! use glowpack::discovery::{BundledDescriptors, CompositionConfig, ProcessScanner};
//! use glowpack::packaging::{ArtifactManifest, TarGzAssembler};
//! use glowpack::pipeline::{PackagePipeline, PackageRequest};
//! use glowpack::progress::TracingMessageWriter;
//! use glowpack::provisioning::ProcessProvisioner;
//!
//! # fn main() -> Result<(), glowpack::PipelineError> {
//! let descriptors = BundledDescriptors::new();
//! let scanner = ProcessScanner::new("glow", vec!["scan".to_string()]);
//! let provisioner = ProcessProvisioner::new("galleon.sh", Vec::new());
//! let writer = TracingMessageWriter::new(false);
//!
//! let mut request = PackageRequest::new("target/app.war", "target");
//! request.discovery = Some(CompositionConfig::new().with_context("cloud"));
//!
//! let mut manifest = ArtifactManifest::new();
//! let outcome = PackagePipeline::new(&descriptors, &scanner, &provisioner, &TarGzAssembler, &writer)
//!     .run(&request, &mut manifest)?;
//! println!("{:?}", outcome.server);
//! # Ok(())
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`discovery`]: composition config, baselines, scanner boundary, error policy
//! - [`provisioning`]: provisioning descriptions and the engine boundary
//! - [`packaging`]: bootable archives and build-output registration
//! - [`pipeline`]: the end-to-end package flow

pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod packaging;
pub mod pipeline;
pub mod progress;
pub mod provisioning;
pub mod util;

pub use config::{ConfigError, PackageConfig};
pub use discovery::{CompositionConfig, DiscoveryOrchestrator, ScanHandle};
pub use error::PipelineError;
pub use pipeline::{PackageOutcome, PackagePipeline, PackageRequest};
pub use provisioning::ProvisioningConfig;
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
