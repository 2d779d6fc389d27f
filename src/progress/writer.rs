//! Message sinks handed to the scanner and the archive assembler
//!
//! Collaborators report human-oriented messages (scan summaries, packaging
//! notes) through a [`MessageWriter`] instead of logging directly, so the
//! caller decides where they end up.

use std::sync::Mutex;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Trace,
    Info,
    Warn,
    Error,
}

pub trait MessageWriter: Send + Sync {
    fn write(&self, level: MessageLevel, message: &str);

    fn is_verbose(&self) -> bool {
        false
    }

    fn trace(&self, message: &str) {
        self.write(MessageLevel::Trace, message);
    }

    fn info(&self, message: &str) {
        self.write(MessageLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.write(MessageLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.write(MessageLevel::Error, message);
    }
}

/// Forwards messages to `tracing`; verbose mode promotes trace messages to info
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMessageWriter {
    verbose: bool,
}

impl TracingMessageWriter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl MessageWriter for TracingMessageWriter {
    fn write(&self, level: MessageLevel, message: &str) {
        match level {
            MessageLevel::Trace if self.verbose => info!(target: "glowpack::scan", "{}", message),
            MessageLevel::Trace => debug!(target: "glowpack::scan", "{}", message),
            MessageLevel::Info => info!(target: "glowpack::scan", "{}", message),
            MessageLevel::Warn => warn!(target: "glowpack::scan", "{}", message),
            MessageLevel::Error => error!(target: "glowpack::scan", "{}", message),
        }
    }

    fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Keeps every message in memory
#[derive(Debug, Default)]
pub struct RecordingWriter {
    messages: Mutex<Vec<(MessageLevel, String)>>,
}

impl RecordingWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(MessageLevel, String)> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }

    pub fn contains(&self, level: MessageLevel, needle: &str) -> bool {
        self.messages()
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }
}

impl MessageWriter for RecordingWriter {
    fn write(&self, level: MessageLevel, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push((level, message.to_string()));
        }
    }
}
