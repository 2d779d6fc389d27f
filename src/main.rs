use glowpack::cli::commands::{CliArgs, Commands};
use glowpack::cli::handlers::{exit_code, handle_baselines, handle_package, handle_scan};
use glowpack::util::logging::{init_logging, parse_level, LoggingConfig};
use glowpack::VERSION;

use clap::Parser;
use tracing::{debug, Level};

fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("glowpack v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let result = match &args.command {
        Commands::Package(package_args) => handle_package(package_args, &args),
        Commands::Scan(scan_args) => handle_scan(scan_args, &args),
        Commands::Baselines(baselines_args) => handle_baselines(baselines_args),
    };

    let code = match result {
        Ok(output) => {
            print!("{}", output);
            if !output.ends_with('\n') {
                println!();
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_code(&e)
        }
    };

    std::process::exit(code);
}

fn init_logging_from_args(args: &CliArgs) {
    let mut config = LoggingConfig::from_env();
    if let Some(level_str) = &args.log_level {
        config.level = parse_level(level_str);
    } else if args.verbose {
        config.level = Level::DEBUG;
    } else if args.quiet {
        config.level = Level::ERROR;
    }
    init_logging(config);
}
