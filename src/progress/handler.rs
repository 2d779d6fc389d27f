//! Progress handler trait and events

use std::time::Duration;

/// Events emitted while a package pipeline runs
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Pipeline started for a deployment
    Started { deployment: String },

    /// A pipeline phase started
    PhaseStarted { phase: String },

    /// A pipeline phase completed
    PhaseComplete { phase: String, duration: Duration },

    /// Discovery finished with errors that the warn policy let through
    DiscoveryWarnings { errors: usize },

    /// Pipeline completed successfully
    Completed {
        provisioned: bool,
        archive: Option<String>,
        total_time: Duration,
    },

    /// Pipeline failed
    Failed { error: String },
}

/// Trait for handling progress events during a pipeline run
pub trait ProgressHandler: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingHandler {
        count: Arc<AtomicUsize>,
    }

    impl ProgressHandler for CountingHandler {
        fn on_progress(&self, _event: &ProgressEvent) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_noop_handler() {
        let handler = NoOpHandler;
        handler.on_progress(&ProgressEvent::Started {
            deployment: "/test/app.war".to_string(),
        });
    }

    #[test]
    fn test_progress_events() {
        let count = Arc::new(AtomicUsize::new(0));
        let handler = CountingHandler {
            count: count.clone(),
        };

        handler.on_progress(&ProgressEvent::Started {
            deployment: "/test/app.war".to_string(),
        });
        handler.on_progress(&ProgressEvent::PhaseComplete {
            phase: "discovery".to_string(),
            duration: Duration::from_millis(50),
        });
        handler.on_progress(&ProgressEvent::Completed {
            provisioned: true,
            archive: None,
            total_time: Duration::from_secs(5),
        });

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_event_debug() {
        let event = ProgressEvent::DiscoveryWarnings { errors: 1 };
        let debug_str = format!("{:?}", event);
        assert!(debug_str.contains("DiscoveryWarnings"));
        assert!(debug_str.contains("errors: 1"));
    }
}
