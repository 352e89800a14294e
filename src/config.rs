//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/catmap/catmap.toml`
//! 3. Explicit config file (`--config <file>`)
//! 4. Environment variables: `CATMAP_*` prefix, `__` between sections
//!    (e.g. `CATMAP_LAYOUT__H_GAP=60`)

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{NodeKind, NodeMetrics, NodeSize, Perspective, RecordFilter, TreeBuilder};

/// Paging limits for the record source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FetchConfig {
    /// Stop following continuation tokens after this many pages
    pub max_pages: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { max_pages: 1000 }
    }
}

/// Tree shaping options.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TreeConfig {
    /// Label of a synthetic root above all top-level nodes (none by default)
    pub root_label: Option<String>,
}

/// Unified configuration for catmap.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub default_perspective: Perspective,
    pub layout: NodeMetrics,
    pub filter: RecordFilter,
    pub fetch: FetchConfig,
    pub tree: TreeConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_perspective: Perspective::Organization,
            layout: NodeMetrics::default(),
            filter: RecordFilter::default(),
            fetch: FetchConfig::default(),
            tree: TreeConfig::default(),
        }
    }
}

/// Raw layout section (every field optional to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawLayout {
    pub h_gap: Option<f64>,
    pub v_gap: Option<f64>,
    pub sizes: Option<BTreeMap<NodeKind, NodeSize>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawFilter {
    pub require_department_name: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawFetch {
    pub max_pages: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawTree {
    pub root_label: Option<String>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub default_perspective: Option<Perspective>,
    pub layout: RawLayout,
    pub filter: RawFilter,
    pub fetch: RawFetch,
    pub tree: RawTree,
}

/// Get the XDG config directory for catmap.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "catmap").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("catmap.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Overlay wins where it specifies a value. Size entries merge per kind.
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        let mut sizes = self.layout.sizes.clone();
        if let Some(extra) = &overlay.layout.sizes {
            sizes.extend(extra.iter().map(|(k, v)| (*k, *v)));
        }
        Self {
            default_perspective: overlay
                .default_perspective
                .unwrap_or(self.default_perspective),
            layout: NodeMetrics {
                h_gap: overlay.layout.h_gap.unwrap_or(self.layout.h_gap),
                v_gap: overlay.layout.v_gap.unwrap_or(self.layout.v_gap),
                sizes,
            },
            filter: RecordFilter {
                require_department_name: overlay
                    .filter
                    .require_department_name
                    .unwrap_or(self.filter.require_department_name),
            },
            fetch: FetchConfig {
                max_pages: overlay.fetch.max_pages.unwrap_or(self.fetch.max_pages),
            },
            tree: TreeConfig {
                root_label: overlay
                    .tree
                    .root_label
                    .clone()
                    .or_else(|| self.tree.root_label.clone()),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Optional explicit config file, applied over the global one
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 3. Explicit file must exist when given
        if let Some(path) = config_file {
            let raw = load_raw_settings(path)?;
            current = current.merge_with(&raw);
        }

        // 4. Environment variables
        Self::apply_env_overrides(current, Self::environment())
    }

    fn environment() -> Environment {
        Environment::with_prefix("CATMAP")
            .prefix_separator("_")
            .separator("__")
    }

    /// Apply CATMAP_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self, env: Environment) -> Result<Self, ApplicationError> {
        let config = Config::builder().add_source(env).build().map_err(config_err)?;

        if let Ok(val) = config.get_string("default_perspective") {
            settings.default_perspective = val.parse().map_err(|e: String| {
                ApplicationError::Config { message: e }
            })?;
        }
        if let Ok(val) = config.get_float("layout.h_gap") {
            settings.layout.h_gap = val;
        }
        if let Ok(val) = config.get_float("layout.v_gap") {
            settings.layout.v_gap = val;
        }
        if let Ok(val) = config.get_bool("filter.require_department_name") {
            settings.filter.require_department_name = val;
        }
        if let Ok(val) = config.get_int("fetch.max_pages") {
            settings.fetch.max_pages = usize::try_from(val).map_err(|_| ApplicationError::Config {
                message: format!("fetch.max_pages must be positive, got {val}"),
            })?;
        }
        if let Ok(val) = config.get_string("tree.root_label") {
            settings.tree.root_label = Some(val);
        }

        Ok(settings)
    }

    /// Tree builder configured from these settings.
    pub fn tree_builder(&self) -> TreeBuilder {
        let builder = TreeBuilder::new().with_filter(self.filter);
        match &self.tree.root_label {
            Some(label) => builder.with_root_label(label.clone()),
            None => builder,
        }
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# catmap configuration
#
# Locations (by precedence, lowest to highest):
#   Global:   ~/.config/catmap/catmap.toml
#   Explicit: --config <file>
#   Env:      CATMAP_* environment variables (CATMAP_LAYOUT__H_GAP=60)

# Tree grouping axis: "organization" or "business_domain"
# default_perspective = "organization"

[layout]
# Horizontal gap between a node and its children column
# h_gap = 40.0
# Vertical gap between sibling subtrees
# v_gap = 24.0

# Node sizes per kind (unlisted kinds keep the built-in size)
# [layout.sizes.info_catalog]
# width = 180.0
# height = 40.0

[filter]
# Skip records whose first department has no name (organization view)
# require_department_name = true

[fetch]
# Upper bound on followed continuation pages
# max_pages = 1000

[tree]
# Put every top-level node under one synthetic root
# root_label = "Organization"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::environment().source(Some(map))
    }

    #[test]
    fn given_defaults_when_created_then_gaps_match_mindmap_constants() {
        let settings = Settings::default();
        assert_eq!(settings.layout.h_gap, 40.0);
        assert_eq!(settings.layout.v_gap, 24.0);
        assert!(settings.filter.require_department_name);
        assert_eq!(settings.fetch.max_pages, 1000);
        assert_eq!(settings.default_perspective, Perspective::Organization);
    }

    #[test]
    fn given_partial_overlay_when_merging_then_only_specified_fields_change() {
        let raw: RawSettings = toml::from_str(
            r#"
default_perspective = "business_domain"

[layout]
h_gap = 60.0

[layout.sizes.process]
width = 100.0
height = 30.0
"#,
        )
        .unwrap();

        let merged = Settings::default().merge_with(&raw);

        assert_eq!(merged.default_perspective, Perspective::BusinessDomain);
        assert_eq!(merged.layout.h_gap, 60.0);
        assert_eq!(merged.layout.v_gap, 24.0);
        assert_eq!(
            merged.layout.size_of(NodeKind::Process),
            NodeSize::new(100.0, 30.0)
        );
        assert_eq!(
            merged.layout.size_of(NodeKind::InfoCatalog),
            NodeSize::new(180.0, 40.0)
        );
        assert!(merged.filter.require_department_name);
    }

    #[test]
    fn given_env_overrides_when_applied_then_replace_values() {
        let env = env_from(&[
            ("CATMAP_LAYOUT__V_GAP", "12"),
            ("CATMAP_FILTER__REQUIRE_DEPARTMENT_NAME", "false"),
            ("CATMAP_DEFAULT_PERSPECTIVE", "domain"),
            ("CATMAP_TREE__ROOT_LABEL", "All"),
        ]);

        let settings = Settings::apply_env_overrides(Settings::default(), env).unwrap();

        assert_eq!(settings.layout.v_gap, 12.0);
        assert!(!settings.filter.require_department_name);
        assert_eq!(settings.default_perspective, Perspective::BusinessDomain);
        assert_eq!(settings.tree.root_label.as_deref(), Some("All"));
    }

    #[test]
    fn given_bad_perspective_in_env_when_applied_then_config_error() {
        let env = env_from(&[("CATMAP_DEFAULT_PERSPECTIVE", "sideways")]);
        let result = Settings::apply_env_overrides(Settings::default(), env);
        assert!(matches!(result, Err(ApplicationError::Config { .. })));
    }

    #[test]
    fn given_settings_when_serialized_then_template_and_toml_parse_back() {
        let rendered = Settings::default().to_toml().unwrap();
        let raw: RawSettings = toml::from_str(&rendered).unwrap();
        assert_eq!(raw.layout.h_gap, Some(40.0));

        let template: RawSettings = toml::from_str(&Settings::template()).unwrap();
        assert!(template.layout.h_gap.is_none());
    }
}
