//! Error taxonomy for the provisioning pipeline
//!
//! Collaborator seams (scanner, provisioner, archive assembler) speak
//! `anyhow::Result`; everything that reaches the caller is folded into
//! [`PipelineError`] so the binary can pick an exit status.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The caller supplied an invalid combination of inputs
    #[error("Invalid request: {0}")]
    Validation(String),

    /// No baseline descriptor exists for the requested product/context pair
    #[error("No baseline descriptor for product '{product}' and context '{context}' (looked up {location})")]
    DescriptorNotFound {
        product: String,
        context: String,
        location: String,
    },

    /// The external scanner raised an error
    #[error("Deployment scan failed: {message}")]
    ScanFailure {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    /// The scan completed but reported errors while the fail policy is active
    #[error("{errors} error(s) detected during discovery; aborting")]
    Discovery { errors: usize },

    /// A provisioning, packaging or registration collaborator failed
    #[error("{context}: {source:#}")]
    Collaborator {
        context: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PipelineError {
    pub fn validation(message: impl Into<String>) -> Self {
        PipelineError::Validation(message.into())
    }

    pub fn scan_failure(source: anyhow::Error) -> Self {
        PipelineError::ScanFailure {
            message: format!("{:#}", source),
            source,
        }
    }

    pub fn collaborator(context: impl Into<String>, source: anyhow::Error) -> Self {
        PipelineError::Collaborator {
            context: context.into(),
            source,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit status for this failure. Never zero.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::Validation(_) | PipelineError::DescriptorNotFound { .. } => 2,
            _ => 1,
        }
    }
}
