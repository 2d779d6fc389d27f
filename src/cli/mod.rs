pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{BaselinesArgs, CliArgs, Commands, CommonArgs, PackageArgs, ScanArgs};
pub use output::{OutputFormat, OutputFormatter};
