//! What to do when a completed scan reports errors

use super::scanner::ScanHandle;
use crate::error::PipelineError;
use crate::progress::MessageWriter;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Release the scan and abort the invocation
    Fail,
    /// Warn and keep the possibly incomplete composition
    Warn,
}

impl ErrorPolicy {
    pub fn from_fails_on_error(fails_on_error: bool) -> Self {
        if fails_on_error {
            ErrorPolicy::Fail
        } else {
            ErrorPolicy::Warn
        }
    }

    pub fn apply(
        self,
        handle: ScanHandle,
        writer: &dyn MessageWriter,
    ) -> Result<ScanHandle, PipelineError> {
        if !handle.error_session().has_errors() {
            return Ok(handle);
        }
        match self {
            ErrorPolicy::Fail => fail_on_errors(handle),
            ErrorPolicy::Warn => warn_on_errors(handle, writer),
        }
    }
}

fn fail_on_errors(handle: ScanHandle) -> Result<ScanHandle, PipelineError> {
    let errors = handle.error_session().error_count();
    handle.release();
    Err(PipelineError::Discovery { errors })
}

fn warn_on_errors(
    handle: ScanHandle,
    writer: &dyn MessageWriter,
) -> Result<ScanHandle, PipelineError> {
    let errors = handle.error_session().error_count();
    warn!(errors, "Discovery reported errors, continuing");
    writer.warn("Some errors have been identified, check logs.");
    Ok(handle)
}
