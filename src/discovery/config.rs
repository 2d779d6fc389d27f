//! Discovery intent for one pipeline invocation
//!
//! [`CompositionConfig`] is built once from caller parameters and never
//! mutated afterwards. Every set-valued field is stored as its own sorted
//! snapshot, so later changes to the caller's collections cannot leak in.

use super::policy::ErrorPolicy;
use super::request::{DiscoveryRequest, OutputFormat, ResolverContext};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;

pub const DEFAULT_EXECUTION_CONTEXT: &str = "bare-metal";
pub const DEFAULT_PRODUCT: &str = "eap8.0";

/// Layer the baseline products lack but JNDI lookups need; always requested
pub const JNDI_SENTINEL_LAYER: &str = "deployment-scanner";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawCompositionConfig")]
pub struct CompositionConfig {
    context: String,
    profile: Option<String>,
    add_ons: BTreeSet<String>,
    suggest: bool,
    layers_for_jndi: BTreeSet<String>,
    excluded_archives: BTreeSet<String>,
    fails_on_error: bool,
    verbose: bool,
    product: String,
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            context: DEFAULT_EXECUTION_CONTEXT.to_string(),
            profile: None,
            add_ons: BTreeSet::new(),
            suggest: false,
            layers_for_jndi: BTreeSet::new(),
            excluded_archives: BTreeSet::new(),
            fails_on_error: true,
            verbose: false,
            product: DEFAULT_PRODUCT.to_string(),
        }
    }
}

fn snapshot<I, S>(values: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values.into_iter().map(Into::into).collect()
}

impl CompositionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn with_profile(mut self, profile: Option<impl Into<String>>) -> Self {
        self.profile = profile.map(Into::into);
        self
    }

    pub fn with_add_ons<I, S>(mut self, add_ons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_ons = snapshot(add_ons);
        self
    }

    pub fn with_suggest(mut self, suggest: bool) -> Self {
        self.suggest = suggest;
        self
    }

    pub fn with_layers_for_jndi<I, S>(mut self, layers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.layers_for_jndi = snapshot(layers);
        self
    }

    pub fn with_excluded_archives<I, S>(mut self, archives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_archives = snapshot(archives);
        self
    }

    pub fn with_fails_on_error(mut self, fails_on_error: bool) -> Self {
        self.fails_on_error = fails_on_error;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_product(mut self, product: impl Into<String>) -> Self {
        self.product = product.into();
        self
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    /// Named execution profiles; empty when no profile is selected
    pub fn profiles(&self) -> BTreeSet<String> {
        self.profile.iter().cloned().collect()
    }

    pub fn add_ons(&self) -> &BTreeSet<String> {
        &self.add_ons
    }

    pub fn suggest(&self) -> bool {
        self.suggest
    }

    /// Layers forced on for JNDI support. Always contains [`JNDI_SENTINEL_LAYER`].
    pub fn jndi_layers(&self) -> BTreeSet<String> {
        let mut layers = BTreeSet::from([JNDI_SENTINEL_LAYER.to_string()]);
        layers.extend(self.layers_for_jndi.iter().cloned());
        layers
    }

    pub fn excluded_archives(&self) -> &BTreeSet<String> {
        &self.excluded_archives
    }

    pub fn fails_on_error(&self) -> bool {
        self.fails_on_error
    }

    pub fn error_policy(&self) -> ErrorPolicy {
        ErrorPolicy::from_fails_on_error(self.fails_on_error)
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    /// Builds the scanner request for `deployment`.
    ///
    /// The deployment's existence is the caller's concern.
    pub fn to_arguments(
        &self,
        deployment: &Path,
        baseline: Option<&Path>,
        config_name: Option<&str>,
        resolver: Option<&ResolverContext>,
    ) -> DiscoveryRequest {
        DiscoveryRequest {
            deployment: deployment.to_path_buf(),
            baseline: baseline.map(Path::to_path_buf),
            config_name: config_name.map(str::to_string),
            execution_context: self.context.clone(),
            profiles: self.profiles(),
            add_ons: self.add_ons.clone(),
            suggest: self.suggest,
            jndi_layers: self.jndi_layers(),
            excluded_archives: self.excluded_archives.clone(),
            verbose: self.verbose,
            resolver: resolver.cloned(),
            output: OutputFormat::ProvisioningXml,
        }
    }
}

/// Shape of the `[discover-provisioning-info]` configuration table
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
struct RawCompositionConfig {
    context: String,
    profile: Option<String>,
    add_ons: Vec<String>,
    suggest: bool,
    layers_for_jndi: Vec<String>,
    excluded_archives: Vec<String>,
    fails_on_error: bool,
    verbose: bool,
    product: String,
}

impl Default for RawCompositionConfig {
    fn default() -> Self {
        Self {
            context: DEFAULT_EXECUTION_CONTEXT.to_string(),
            profile: None,
            add_ons: Vec::new(),
            suggest: false,
            layers_for_jndi: Vec::new(),
            excluded_archives: Vec::new(),
            fails_on_error: true,
            verbose: false,
            product: DEFAULT_PRODUCT.to_string(),
        }
    }
}

impl From<RawCompositionConfig> for CompositionConfig {
    fn from(raw: RawCompositionConfig) -> Self {
        CompositionConfig::new()
            .with_context(raw.context)
            .with_profile(raw.profile)
            .with_add_ons(raw.add_ons)
            .with_suggest(raw.suggest)
            .with_layers_for_jndi(raw.layers_for_jndi)
            .with_excluded_archives(raw.excluded_archives)
            .with_fails_on_error(raw.fails_on_error)
            .with_verbose(raw.verbose)
            .with_product(raw.product)
    }
}
