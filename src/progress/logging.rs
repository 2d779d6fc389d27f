//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{info, warn};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started { deployment } => {
                info!(deployment = %deployment, "Starting package pipeline");
            }
            ProgressEvent::PhaseStarted { phase } => {
                info!(phase = %phase, "Starting phase");
            }
            ProgressEvent::PhaseComplete { phase, duration } => {
                info!(
                    phase = %phase,
                    duration_ms = duration.as_millis(),
                    "Phase complete"
                );
            }
            ProgressEvent::DiscoveryWarnings { errors } => {
                warn!(errors, "Discovery reported errors, continuing with a possibly incomplete composition");
            }
            ProgressEvent::Completed {
                provisioned,
                archive,
                total_time,
            } => {
                info!(
                    provisioned,
                    archive = archive.as_deref().unwrap_or("-"),
                    total_time_ms = total_time.as_millis(),
                    "Package pipeline complete"
                );
            }
            ProgressEvent::Failed { error } => {
                warn!(error = %error, "Package pipeline failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_logging_all_events() {
        let handler = LoggingHandler;

        let events = vec![
            ProgressEvent::Started {
                deployment: "/test/app.war".to_string(),
            },
            ProgressEvent::PhaseStarted {
                phase: "discovery".to_string(),
            },
            ProgressEvent::PhaseComplete {
                phase: "discovery".to_string(),
                duration: Duration::from_millis(10),
            },
            ProgressEvent::DiscoveryWarnings { errors: 2 },
            ProgressEvent::Completed {
                provisioned: true,
                archive: Some("/out/server-bootable.tar.gz".to_string()),
                total_time: Duration::from_secs(5),
            },
            ProgressEvent::Failed {
                error: "Test error".to_string(),
            },
        ];

        for event in events {
            handler.on_progress(&event);
        }
    }
}
