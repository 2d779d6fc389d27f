pub mod orchestrator;
pub mod request;

pub use orchestrator::PackagePipeline;
pub use request::{
    BootableOptions, PackageOutcome, PackageRequest, Resolution, DEFAULT_PROVISIONING_DIR,
};
