//! Output formatting for multiple formats
//!
//! Command results are rendered as JSON, YAML or human-readable text.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::discovery::DescriptorKey;
use crate::pipeline::{PackageOutcome, Resolution};
use crate::provisioning::ProvisioningConfig;

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format
    Yaml,
    /// Human-readable formatted text
    Human,
}

const RULE: &str = "\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}";

#[derive(Serialize)]
struct BaselineEntry<'a> {
    #[serde(flatten)]
    key: &'a DescriptorKey,
    location: String,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_outcome(&self, outcome: &PackageOutcome) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(outcome, "package outcome"),
            OutputFormat::Yaml => to_yaml(outcome, "package outcome"),
            OutputFormat::Human => Ok(self.format_outcome_human(outcome)),
        }
    }

    pub fn format_resolution(&self, resolution: &Resolution) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(resolution, "composition"),
            OutputFormat::Yaml => to_yaml(resolution, "composition"),
            OutputFormat::Human => Ok(self.format_resolution_human(resolution)),
        }
    }

    pub fn format_baselines(&self, keys: &[DescriptorKey]) -> Result<String> {
        let entries: Vec<BaselineEntry<'_>> = keys
            .iter()
            .map(|key| BaselineEntry {
                key,
                location: key.location(),
            })
            .collect();
        match self.format {
            OutputFormat::Json => to_json(&entries, "baselines"),
            OutputFormat::Yaml => to_yaml(&entries, "baselines"),
            OutputFormat::Human => {
                let mut output = String::from("Bundled Baselines\n");
                output.push_str(RULE);
                output.push('\n');
                for entry in &entries {
                    output.push_str(&format!("{:<24} {}\n", entry.key.to_string(), entry.location));
                }
                Ok(output)
            }
        }
    }

    fn format_outcome_human(&self, outcome: &PackageOutcome) -> String {
        let mut output = self.format_resolution_human(&outcome.resolution);
        output.push('\n');
        match &outcome.server {
            Some(server) => output.push_str(&format!("Server:   {}\n", server.display())),
            None => output.push_str("Server:   (dry run, not provisioned)\n"),
        }
        if let Some(archive) = &outcome.archive {
            output.push_str(&format!("Archive:  {}\n", archive.display()));
        }
        output
    }

    fn format_resolution_human(&self, resolution: &Resolution) -> String {
        let mut output = String::new();
        if resolution.discovery_errors > 0 {
            output.push_str(&format!(
                "\u{26A0} Composition ({} discovery error(s))\n",
                resolution.discovery_errors
            ));
        } else {
            output.push_str("\u{2713} Composition\n");
        }
        output.push_str(RULE);
        output.push_str("\n\n");

        let source = if resolution.discovered {
            "discovered"
        } else {
            "explicit"
        };
        output.push_str(&format!("Source:   {}\n", source));
        if let Some(dir) = &resolution.scan_dir {
            output.push_str(&format!("Scan Dir: {}\n", dir.display()));
        }
        output.push('\n');
        push_composition(&mut output, &resolution.config);
        output
    }
}

fn push_composition(output: &mut String, config: &ProvisioningConfig) {
    output.push_str("Feature Packs:\n");
    push_tree(
        output,
        config.feature_packs.iter().map(|fp| fp.location.as_str()),
    );
    output.push_str("Layers:\n");
    push_tree(output, config.layers.iter().map(String::as_str));
    if !config.excluded_layers.is_empty() {
        output.push_str("Excluded Layers:\n");
        push_tree(output, config.excluded_layers.iter().map(String::as_str));
    }
    output.push_str(&format!(
        "Config:   {} ({})\n",
        config.config_name, config.config_model
    ));
}

fn push_tree<'a>(output: &mut String, items: impl ExactSizeIterator<Item = &'a str>) {
    let len = items.len();
    if len == 0 {
        output.push_str("\u{2514}\u{2500} (none)\n");
        return;
    }
    for (i, item) in items.enumerate() {
        let connector = if i + 1 == len { "\u{2514}" } else { "\u{251C}" };
        output.push_str(&format!("{}\u{2500} {}\n", connector, item));
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T, what: &str) -> Result<String> {
    serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {} to JSON", what))
}

fn to_yaml<T: Serialize + ?Sized>(value: &T, what: &str) -> Result<String> {
    serde_yaml::to_string(value).with_context(|| format!("Failed to serialize {} to YAML", what))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provisioning::FeaturePack;
    use std::path::PathBuf;

    fn create_outcome() -> PackageOutcome {
        PackageOutcome {
            resolution: Resolution {
                config: ProvisioningConfig {
                    feature_packs: vec![FeaturePack::new("org.jboss.eap:wildfly-ee-galleon-pack")],
                    layers: vec!["jaxrs-server".to_string(), "postgresql-datasource".to_string()],
                    ..Default::default()
                },
                discovered: true,
                discovery_errors: 0,
                scan_dir: Some(PathBuf::from("/build/target/glow-scan")),
            },
            server: Some(PathBuf::from("/build/target/server")),
            archive: Some(PathBuf::from("/build/target/server-bootable.tar.gz")),
        }
    }

    #[test]
    fn test_json_format() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let output = formatter.format_outcome(&create_outcome()).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["discovered"], true);
        assert_eq!(parsed["config"]["layers"][0], "jaxrs-server");
        assert_eq!(parsed["archive"], "/build/target/server-bootable.tar.gz");
    }

    #[test]
    fn test_yaml_format() {
        let formatter = OutputFormatter::new(OutputFormat::Yaml);
        let output = formatter.format_outcome(&create_outcome()).unwrap();

        let parsed: serde_yaml::Value = serde_yaml::from_str(&output).unwrap();
        assert_eq!(parsed["server"].as_str(), Some("/build/target/server"));
    }

    #[test]
    fn test_human_format() {
        let formatter = OutputFormatter::new(OutputFormat::Human);
        let output = formatter.format_outcome(&create_outcome()).unwrap();

        assert!(output.contains("\u{2713} Composition"));
        assert!(output.contains("Source:   discovered"));
        assert!(output.contains("wildfly-ee-galleon-pack"));
        assert!(output.contains("\u{2514}\u{2500} postgresql-datasource"));
        assert!(output.contains("Archive:  /build/target/server-bootable.tar.gz"));
    }

    #[test]
    fn test_human_format_dry_run_with_warnings() {
        let mut outcome = create_outcome();
        outcome.server = None;
        outcome.archive = None;
        outcome.resolution.discovery_errors = 2;

        let output = OutputFormatter::new(OutputFormat::Human)
            .format_outcome(&outcome)
            .unwrap();

        assert!(output.contains("2 discovery error(s)"));
        assert!(output.contains("dry run, not provisioned"));
        assert!(!output.contains("Archive:"));
    }

    #[test]
    fn test_baselines_json() {
        let keys = vec![DescriptorKey::new("eap8.0", "cloud")];
        let output = OutputFormatter::new(OutputFormat::Json)
            .format_baselines(&keys)
            .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed[0]["product"], "eap8.0");
        assert_eq!(parsed[0]["location"], "/eap8.0/provisioning-cloud.xml");
    }

    #[test]
    fn test_baselines_human() {
        let keys = vec![DescriptorKey::new("eap8.1", "bare-metal")];
        let output = OutputFormatter::new(OutputFormat::Human)
            .format_baselines(&keys)
            .unwrap();

        assert!(output.contains("eap8.1/bare-metal"));
        assert!(output.contains("/eap8.1/provisioning-bare-metal.xml"));
    }
}
