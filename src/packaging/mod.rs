//! Bootable archives and build-output registration

pub mod archive;
pub mod registry;

pub use archive::{
    ArchiveAssembler, ArchivePackager, TarGzAssembler, ARCHIVE_NAME_RADICAL, BOOTABLE_SUFFIX,
    DEFAULT_CLASSIFIER,
};
pub use registry::{ArtifactManifest, AttachedArtifact, OutputRegistry, MANIFEST_FILE};
