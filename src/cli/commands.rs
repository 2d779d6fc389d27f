use crate::config::PackageConfig;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Provisions and packages application servers from a deployment
#[derive(Parser, Debug)]
#[command(
    name = "glowpack",
    about = "Provision and package an application server for a deployment",
    version,
    author,
    long_about = "glowpack works out which feature packs and layers a deployment needs, either \
                  from an explicit list or by scanning the deployment, provisions a server from \
                  that composition and optionally bundles it into a bootable archive."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        short = 'c',
        long,
        global = true,
        value_name = "FILE",
        help = "Configuration file (defaults to $GLOWPACK_CONFIG or ./glowpack.toml)"
    )]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(
        short = 'v',
        long,
        global = true,
        help = "Verbose output, including scanner details"
    )]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Resolve the composition, provision the server and optionally package it",
        long_about = "Runs the whole pipeline. With discovery enabled the deployment is scanned \
                      to compute the layers; otherwise the configured feature packs are used.\n\n\
                      Examples:\n  \
                      glowpack package target/app.war --discover\n  \
                      glowpack package target/app.war --discover --context cloud --bootable\n  \
                      glowpack package --dry-run --format json"
    )]
    Package(PackageArgs),

    #[command(
        about = "Scan a deployment and print the discovered composition",
        long_about = "Runs discovery only. The composition is stored under \
                      <output-dir>/glow-scan unless --dry-run is given.\n\n\
                      Examples:\n  \
                      glowpack scan target/app.war\n  \
                      glowpack scan target/app.war --add-on postgresql --suggest"
    )]
    Scan(ScanArgs),

    #[command(about = "List the bundled baseline descriptors")]
    Baselines(BaselinesArgs),
}

/// Overrides shared by `package` and `scan`
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    #[arg(value_name = "DEPLOYMENT", help = "Deployment artifact to scan")]
    pub deployment: Option<PathBuf>,

    #[arg(short = 'o', long, value_name = "DIR", help = "Build output directory")]
    pub output_dir: Option<PathBuf>,

    #[arg(long, help = "Resolve the composition without persisting or provisioning it")]
    pub dry_run: bool,

    #[arg(long, help = "Enable discovery even if the configuration file does not")]
    pub discover: bool,

    #[arg(long, value_name = "CONTEXT", help = "Execution context, e.g. bare-metal or cloud")]
    pub context: Option<String>,

    #[arg(long, value_name = "PRODUCT", help = "Product whose baseline is used, e.g. eap8.0")]
    pub product: Option<String>,

    #[arg(long, value_name = "PROFILE", help = "Execution profile, e.g. ha")]
    pub profile: Option<String>,

    #[arg(long = "add-on", value_name = "ADD_ON", help = "Enable an add-on (repeatable)")]
    pub add_ons: Vec<String>,

    #[arg(long, help = "Only suggest add-ons instead of enabling them")]
    pub suggest: bool,

    #[arg(long, help = "Continue when discovery reports errors")]
    pub warn_on_error: bool,

    #[arg(long, help = "Resolve artifacts without network access")]
    pub offline: bool,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

impl CommonArgs {
    fn wants_discovery(&self) -> bool {
        self.discover
            || self.context.is_some()
            || self.product.is_some()
            || self.profile.is_some()
            || !self.add_ons.is_empty()
            || self.suggest
            || self.warn_on_error
    }

    /// Applies the flags on top of file and environment settings
    pub fn apply(&self, config: &mut PackageConfig) {
        if let Some(deployment) = &self.deployment {
            config.deployment = Some(deployment.clone());
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if self.dry_run {
            config.dry_run = true;
        }
        if self.offline {
            config.resolver.offline = true;
        }
        if !self.wants_discovery() {
            return;
        }

        let mut discovery = config.discover_provisioning_info.take().unwrap_or_default();
        if let Some(context) = &self.context {
            discovery = discovery.with_context(context.as_str());
        }
        if let Some(product) = &self.product {
            discovery = discovery.with_product(product.as_str());
        }
        if let Some(profile) = &self.profile {
            discovery = discovery.with_profile(Some(profile.as_str()));
        }
        if !self.add_ons.is_empty() {
            let merged: Vec<String> = discovery
                .add_ons()
                .iter()
                .chain(&self.add_ons)
                .cloned()
                .collect();
            discovery = discovery.with_add_ons(merged);
        }
        if self.suggest {
            discovery = discovery.with_suggest(true);
        }
        if self.warn_on_error {
            discovery = discovery.with_fails_on_error(false);
        }
        config.discover_provisioning_info = Some(discovery);
    }
}

#[derive(Args, Debug, Clone)]
pub struct PackageArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[arg(long, help = "Bundle the provisioned server into a bootable archive")]
    pub bootable: bool,

    #[arg(long, value_name = "NAME", help = "Bootable archive file name")]
    pub bootable_name: Option<String>,

    #[arg(long, help = "Replace a previously provisioned server")]
    pub overwrite: bool,
}

impl PackageArgs {
    pub fn apply(&self, config: &mut PackageConfig) {
        self.common.apply(config);
        if self.bootable || self.bootable_name.is_some() {
            config.bootable_jar = true;
        }
        if let Some(name) = &self.bootable_name {
            config.bootable_jar_name = Some(name.clone());
        }
        if self.overwrite {
            config.overwrite_provisioned_server = true;
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Args, Debug, Clone)]
pub struct BaselinesArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    #[default]
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_args_verify() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_default_package_args() {
        let args = CliArgs::parse_from(["glowpack", "package"]);
        match args.command {
            Commands::Package(package) => {
                assert_eq!(package.common.format, OutputFormatArg::Human);
                assert!(package.common.deployment.is_none());
                assert!(!package.common.dry_run);
                assert!(!package.bootable);
            }
            _ => panic!("Expected Package command"),
        }
        assert!(args.config.is_none());
    }

    #[test]
    fn test_scan_with_options() {
        let args = CliArgs::parse_from([
            "glowpack",
            "scan",
            "target/app.war",
            "--context",
            "cloud",
            "--add-on",
            "postgresql",
            "--add-on",
            "ha",
            "--format",
            "json",
            "-v",
        ]);
        assert!(args.verbose);
        match args.command {
            Commands::Scan(scan) => {
                assert_eq!(scan.common.deployment, Some(PathBuf::from("target/app.war")));
                assert_eq!(scan.common.add_ons, vec!["postgresql", "ha"]);
                assert_eq!(scan.common.format, OutputFormatArg::Json);
            }
            _ => panic!("Expected Scan command"),
        }
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        let result = CliArgs::try_parse_from(["glowpack", "baselines", "-v", "-q"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_apply_without_discovery_flags_keeps_explicit_mode() {
        let mut config = PackageConfig::default();
        let args = CommonArgs {
            deployment: Some(PathBuf::from("app.war")),
            dry_run: true,
            ..Default::default()
        };

        args.apply(&mut config);

        assert!(config.discover_provisioning_info.is_none());
        assert!(config.dry_run);
        assert_eq!(config.deployment, Some(PathBuf::from("app.war")));
    }

    #[test]
    fn test_apply_merges_add_ons_and_policy() {
        let mut config: PackageConfig = toml::from_str(
            "[discover-provisioning-info]\ncontext = \"cloud\"\nadd-ons = [\"ha\"]\n",
        )
        .unwrap();
        let args = CommonArgs {
            add_ons: vec!["postgresql".to_string()],
            warn_on_error: true,
            ..Default::default()
        };

        args.apply(&mut config);

        let discovery = config.discover_provisioning_info.unwrap();
        assert_eq!(discovery.context(), "cloud");
        assert!(discovery.add_ons().contains("ha"));
        assert!(discovery.add_ons().contains("postgresql"));
        assert!(!discovery.fails_on_error());
    }

    #[test]
    fn test_package_flags() {
        let args = CliArgs::parse_from([
            "glowpack",
            "package",
            "--bootable-name",
            "app.tar.gz",
            "--overwrite",
        ]);
        let Commands::Package(package) = args.command else {
            panic!("Expected Package command");
        };
        let mut config = PackageConfig::default();

        package.apply(&mut config);

        assert!(config.bootable_jar);
        assert_eq!(config.bootable_jar_name.as_deref(), Some("app.tar.gz"));
        assert!(config.overwrite_provisioned_server);
    }
}
