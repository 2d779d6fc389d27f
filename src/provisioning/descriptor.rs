//! Provisioning descriptions
//!
//! A [`ProvisioningConfig`] is the fully resolved composition handed to the
//! provisioning engine: feature packs, the layer selection of one server
//! configuration, and free-form engine options. It round-trips through the
//! `<installation>` XML document the engine consumes.

use anyhow::{bail, Context, Result};
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const PROVISIONING_NAMESPACE: &str = "urn:jboss:galleon:provisioning:3.0";
pub const DEFAULT_CONFIG_MODEL: &str = "standalone";
pub const DEFAULT_CONFIG_NAME: &str = "standalone.xml";

fn default_true() -> bool {
    true
}

/// One feature pack of a composition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FeaturePack {
    /// Feature-pack location (`groupId:artifactId[:version]` or a universe location)
    pub location: String,

    #[serde(default = "default_true")]
    pub inherit_configs: bool,

    #[serde(default = "default_true")]
    pub inherit_packages: bool,

    #[serde(default)]
    pub included_packages: Vec<String>,

    #[serde(default)]
    pub excluded_packages: Vec<String>,
}

impl FeaturePack {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            inherit_configs: true,
            inherit_packages: true,
            included_packages: Vec::new(),
            excluded_packages: Vec::new(),
        }
    }
}

/// Composition supplied verbatim by the caller (explicit mode)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplicitComposition {
    pub feature_packs: Vec<FeaturePack>,
    pub layers: Vec<String>,
    pub excluded_layers: Vec<String>,
    pub options: BTreeMap<String, String>,
    /// Overrides the name of the generated server configuration
    pub config_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisioningConfig {
    pub feature_packs: Vec<FeaturePack>,
    pub layers: Vec<String>,
    pub excluded_layers: Vec<String>,
    pub config_model: String,
    pub config_name: String,
    pub options: BTreeMap<String, String>,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            feature_packs: Vec::new(),
            layers: Vec::new(),
            excluded_layers: Vec::new(),
            config_model: DEFAULT_CONFIG_MODEL.to_string(),
            config_name: DEFAULT_CONFIG_NAME.to_string(),
            options: BTreeMap::new(),
        }
    }
}

impl ProvisioningConfig {
    /// Builds the description of an explicitly configured composition.
    ///
    /// When layers are selected, feature packs stop inheriting their default
    /// configs and packages so only the layer closure is installed.
    pub fn from_explicit(explicit: &ExplicitComposition) -> Self {
        let trims = !explicit.layers.is_empty();
        let feature_packs = explicit
            .feature_packs
            .iter()
            .cloned()
            .map(|mut fp| {
                if trims {
                    fp.inherit_configs = false;
                    fp.inherit_packages = false;
                }
                fp
            })
            .collect();

        Self {
            feature_packs,
            layers: explicit.layers.clone(),
            excluded_layers: explicit.excluded_layers.clone(),
            config_name: explicit
                .config_name
                .clone()
                .unwrap_or_else(|| DEFAULT_CONFIG_NAME.to_string()),
            options: explicit.options.clone(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.feature_packs.is_empty()
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" ?>\n");
        out.push_str(&format!("<installation xmlns=\"{}\">\n", PROVISIONING_NAMESPACE));

        for fp in &self.feature_packs {
            out.push_str(&format!("    <feature-pack location=\"{}\">\n", escape(&fp.location)));
            if !fp.inherit_configs {
                out.push_str("        <default-configs inherit=\"false\"/>\n");
            }
            let has_package_rules =
                !fp.included_packages.is_empty() || !fp.excluded_packages.is_empty();
            if !fp.inherit_packages || has_package_rules {
                let inherit = if fp.inherit_packages { "" } else { " inherit=\"false\"" };
                if has_package_rules {
                    out.push_str(&format!("        <packages{}>\n", inherit));
                    for name in &fp.included_packages {
                        out.push_str(&format!("            <include name=\"{}\"/>\n", escape(name)));
                    }
                    for name in &fp.excluded_packages {
                        out.push_str(&format!("            <exclude name=\"{}\"/>\n", escape(name)));
                    }
                    out.push_str("        </packages>\n");
                } else {
                    out.push_str(&format!("        <packages{}/>\n", inherit));
                }
            }
            out.push_str("    </feature-pack>\n");
        }

        if !self.layers.is_empty() || !self.excluded_layers.is_empty() {
            out.push_str(&format!(
                "    <config model=\"{}\" name=\"{}\">\n",
                escape(&self.config_model),
                escape(&self.config_name)
            ));
            out.push_str("        <layers>\n");
            for layer in &self.layers {
                out.push_str(&format!("            <include name=\"{}\"/>\n", escape(layer)));
            }
            for layer in &self.excluded_layers {
                out.push_str(&format!("            <exclude name=\"{}\"/>\n", escape(layer)));
            }
            out.push_str("        </layers>\n");
            out.push_str("    </config>\n");
        }

        if !self.options.is_empty() {
            out.push_str("    <options>\n");
            for (name, value) in &self.options {
                out.push_str(&format!(
                    "        <option name=\"{}\" value=\"{}\"/>\n",
                    escape(name),
                    escape(value)
                ));
            }
            out.push_str("    </options>\n");
        }

        out.push_str("</installation>\n");
        out
    }

    pub fn from_xml(content: &str) -> Result<Self> {
        let doc = Document::parse(content).context("Failed to parse provisioning XML")?;
        let root = doc.root_element();
        if root.tag_name().name() != "installation" {
            bail!(
                "Unexpected root element <{}>, expected <installation>",
                root.tag_name().name()
            );
        }

        let mut config = ProvisioningConfig::default();
        for child in root.children().filter(Node::is_element) {
            match child.tag_name().name() {
                "feature-pack" => config.feature_packs.push(parse_feature_pack(child)?),
                "config" => {
                    if let Some(model) = child.attribute("model") {
                        config.config_model = model.to_string();
                    }
                    if let Some(name) = child.attribute("name") {
                        config.config_name = name.to_string();
                    }
                    for layers in child
                        .children()
                        .filter(|n| n.is_element() && n.has_tag_name("layers"))
                    {
                        collect_names(layers, &mut config.layers, &mut config.excluded_layers);
                    }
                }
                "options" => {
                    for option in child
                        .children()
                        .filter(|n| n.is_element() && n.has_tag_name("option"))
                    {
                        let name = option
                            .attribute("name")
                            .context("<option> is missing the 'name' attribute")?;
                        let value = option.attribute("value").unwrap_or_default();
                        config.options.insert(name.to_string(), value.to_string());
                    }
                }
                _ => {}
            }
        }

        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read provisioning file {}", path.display()))?;
        Self::from_xml(&content)
            .with_context(|| format!("Invalid provisioning file {}", path.display()))
    }

    pub fn store(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(path, self.to_xml())
            .with_context(|| format!("Failed to write provisioning file {}", path.display()))
    }
}

fn parse_feature_pack(node: Node) -> Result<FeaturePack> {
    let location = node
        .attribute("location")
        .context("<feature-pack> is missing the 'location' attribute")?;
    let mut fp = FeaturePack::new(location);

    for child in node.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "default-configs" => {
                fp.inherit_configs = child.attribute("inherit") != Some("false");
            }
            "packages" => {
                fp.inherit_packages = child.attribute("inherit") != Some("false");
                collect_names(child, &mut fp.included_packages, &mut fp.excluded_packages);
            }
            _ => {}
        }
    }

    Ok(fp)
}

fn collect_names(node: Node, included: &mut Vec<String>, excluded: &mut Vec<String>) {
    for child in node.children().filter(Node::is_element) {
        let Some(name) = child.attribute("name") else {
            continue;
        };
        match child.tag_name().name() {
            "include" => included.push(name.to_string()),
            "exclude" => excluded.push(name.to_string()),
            _ => {}
        }
    }
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
