//! Progress reporting and message sinks for pipeline runs

mod handler;
mod logging;
mod writer;

pub use handler::{NoOpHandler, ProgressEvent, ProgressHandler};
pub use logging::LoggingHandler;
pub use writer::{MessageLevel, MessageWriter, RecordingWriter, TracingMessageWriter};
