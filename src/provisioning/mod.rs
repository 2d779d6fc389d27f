//! Provisioning descriptions and the engine that installs them

pub mod descriptor;
pub mod provisioner;

pub use descriptor::{ExplicitComposition, FeaturePack, ProvisioningConfig};
pub use provisioner::{ProcessProvisioner, Provisioner, ProvisioningInvoker};
