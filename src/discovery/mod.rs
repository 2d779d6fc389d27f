//! Deployment-driven composition discovery
//!
//! Discovery and an explicitly configured layer set are mutually exclusive:
//! discovery computes the layers, it never merges with caller-supplied ones.

pub mod baseline;
pub mod config;
pub mod orchestrator;
pub mod policy;
pub mod request;
pub mod scanner;

pub use baseline::{
    BaselineDescriptor, BundledDescriptors, DescriptorKey, DescriptorSource, DirectoryDescriptors,
};
pub use config::{CompositionConfig, JNDI_SENTINEL_LAYER};
pub use orchestrator::{DiscoveryOrchestrator, ScanInput, IN_PROVISIONING_FILE, SCAN_DIR};
pub use policy::ErrorPolicy;
pub use request::{DiscoveryRequest, OutputFormat, ResolverContext};
pub use scanner::{
    ErrorSession, IdentifiedError, InfoReport, ProcessScanner, ScanHandle, ScanOutput,
    ScanResults, Scanner, DEFAULT_OUTPUT_NAME,
};
