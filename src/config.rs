//! Engine configuration.
//!
//! Handles loading, validating, and merging the `config.toml` at the content
//! root. Stock defaults are the base layer; the file only needs the keys it
//! wants to override.
//!
//! ## Config File Location
//!
//! ```text
//! content/
//! ├── config.toml              # Optional, overrides stock defaults
//! ├── index.mdx
//! ├── 01-getting-started/
//! │   └── README.md
//! └── talks/
//!     └── SLIDES.mdx
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! alias = "@content"                 # Virtual alias token in addresses
//! ignore = ["node_modules", "dist"]  # Segments excluded from the tree
//! extensions = ["mdx", "md", "tsx", "ts", "jsx", "js",
//!               "png", "jpg", "jpeg", "gif", "svg", "webp", "css"]
//!
//! [watch]
//! debounce_ms = 1000                 # Quiet period after the last change
//! marker = ".running"                # Suppresses broadcasts while present
//!
//! [posts]
//! sort = "alpha"                     # "alpha" or "date"
//!
//! [site]
//! name = "folio"
//! description = ""
//! github = ""
//! homepage = ""
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::listing::SortPolicy;
use crate::path::{CONTENT_EXTENSIONS, DEFAULT_ALIAS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Virtual alias token that prefixes addresses (`@content/guide.mdx`).
    pub alias: String,
    /// Path segments excluded from the tree, on top of dot-prefixed ones.
    pub ignore: Vec<String>,
    /// Recognized content extensions, without the leading dot.
    pub extensions: Vec<String>,
    /// File watching settings.
    pub watch: WatchConfig,
    /// Post listing settings.
    pub posts: PostsConfig,
    /// Site identity shown by the rendering layer.
    pub site: SiteInfo,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            alias: DEFAULT_ALIAS.to_string(),
            ignore: vec!["node_modules".to_string(), "dist".to_string()],
            extensions: CONTENT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            watch: WatchConfig::default(),
            posts: PostsConfig::default(),
            site: SiteInfo::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.alias.is_empty() || self.alias.contains('/') {
            return Err(ConfigError::Validation(
                "alias must be non-empty and must not contain '/'".into(),
            ));
        }
        if self.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "extensions must not be empty".into(),
            ));
        }
        if let Some(ext) = self.extensions.iter().find(|e| e.is_empty() || e.starts_with('.')) {
            return Err(ConfigError::Validation(format!(
                "extensions are written without a leading dot, got '{ext}'"
            )));
        }
        if self.watch.debounce_ms == 0 {
            return Err(ConfigError::Validation(
                "watch.debounce_ms must be greater than 0".into(),
            ));
        }
        if self.watch.marker.is_empty() || self.watch.marker.contains('/') {
            return Err(ConfigError::Validation(
                "watch.marker must be a file name in the content root".into(),
            ));
        }
        Ok(())
    }

    /// Extensions as string slices, for the path helpers.
    pub fn extension_refs(&self) -> Vec<&str> {
        self.extensions.iter().map(String::as_str).collect()
    }
}

/// File watching settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfig {
    /// Quiet period after the last change before a rebuild starts.
    pub debounce_ms: u64,
    /// Name of the marker file that suppresses broadcasts while present.
    pub marker: String,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 1000,
            marker: ".running".to_string(),
        }
    }
}

impl WatchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Post listing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PostsConfig {
    pub sort: SortPolicy,
}

/// Site identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteInfo {
    pub name: String,
    pub description: String,
    pub github: String,
    pub homepage: String,
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            name: "folio".to_string(),
            description: String::new(),
            github: String::new(),
            homepage: String::new(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(SiteConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given content root.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Folio Configuration
# ===================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file at the root of the content directory:
#   content/config.toml
#
# Unknown keys will cause an error.

# Virtual alias token that addresses may be prefixed with,
# e.g. "@content/guide/index.mdx".
alias = "@content"

# Path segments excluded from the content tree. Dot-prefixed files and
# folders are always excluded.
ignore = ["node_modules", "dist"]

# Recognized content extensions (no leading dot). Only these files are
# scanned into the tree and only changes to them trigger a rebuild.
extensions = [
    "mdx", "md",
    "tsx", "ts", "jsx", "js",
    "png", "jpg", "jpeg", "gif", "svg", "webp",
    "css",
]

# ---------------------------------------------------------------------------
# Live editing
# ---------------------------------------------------------------------------
[watch]
# Quiet period in milliseconds after the last change before the tree is
# rebuilt. A burst of saves produces a single rebuild.
debounce_ms = 1000

# While this file exists in the content root, rebuilds still happen but no
# change notification is sent. Removing it triggers a rebuild.
marker = ".running"

# ---------------------------------------------------------------------------
# Post listings
# ---------------------------------------------------------------------------
[posts]
# "alpha": numbered entries first, then by title.
# "date":  numbered entries first, then newest date, then by title.
sort = "alpha"

# ---------------------------------------------------------------------------
# Site identity
# ---------------------------------------------------------------------------
[site]
name = "folio"
description = ""
github = ""
homepage = ""
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = SiteConfig::default();
        assert_eq!(config.alias, "@content");
        assert_eq!(config.ignore, vec!["node_modules", "dist"]);
        assert_eq!(config.extensions.len(), CONTENT_EXTENSIONS.len());
        assert_eq!(config.watch.debounce(), Duration::from_secs(1));
        assert_eq!(config.watch.marker, ".running");
        assert_eq!(config.posts.sort, SortPolicy::Alpha);
        assert_eq!(config.site.name, "folio");
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[watch]
debounce_ms = 250
"#;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.watch.debounce_ms, 250);
        // Defaults preserved
        assert_eq!(config.watch.marker, ".running");
        assert_eq!(config.alias, "@content");
    }

    #[test]
    fn parse_sort_policy() {
        let config: SiteConfig = toml::from_str("[posts]\nsort = \"date\"\n").unwrap();
        assert_eq!(config.posts.sort, SortPolicy::Date);
        assert!(toml::from_str::<SiteConfig>("[posts]\nsort = \"random\"\n").is_err());
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(toml::from_str::<SiteConfig>("alais = \"@docs\"\n").is_err());
        assert!(toml::from_str::<SiteConfig>("[watch]\ndebounce = 10\n").is_err());
    }

    // =========================================================================
    // validate()
    // =========================================================================

    #[test]
    fn validate_accepts_defaults() {
        assert!(SiteConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_debounce() {
        let mut config = SiteConfig::default();
        config.watch.debounce_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_dotted_extensions() {
        let mut config = SiteConfig::default();
        config.extensions = vec![".md".into()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains(".md"));
    }

    #[test]
    fn validate_rejects_empty_extensions() {
        let mut config = SiteConfig::default();
        config.extensions.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_alias_with_slash() {
        let mut config = SiteConfig::default();
        config.alias = "@content/docs".into();
        assert!(config.validate().is_err());
        config.alias = String::new();
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // merge_toml()
    // =========================================================================

    #[test]
    fn merge_overlay_wins_for_scalars() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("b = 3\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["b"].as_integer(), Some(3));
    }

    #[test]
    fn merge_tables_recursively() {
        let base = stock_defaults_value().unwrap();
        let overlay: toml::Value = toml::from_str("[watch]\nmarker = \".busy\"\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["watch"]["marker"].as_str(), Some(".busy"));
        assert_eq!(merged["watch"]["debounce_ms"].as_integer(), Some(1000));
    }

    #[test]
    fn merge_arrays_replace() {
        let base = stock_defaults_value().unwrap();
        let overlay: toml::Value = toml::from_str("ignore = [\"build\"]\n").unwrap();
        let config = resolve_config(base, Some(overlay)).unwrap();
        assert_eq!(config.ignore, vec!["build"]);
    }

    // =========================================================================
    // load_config()
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config, SiteConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r#"
alias = "@docs"

[site]
name = "Handbook"
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.alias, "@docs");
        assert_eq!(config.site.name, "Handbook");
        assert_eq!(config.watch.debounce_ms, 1000);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "this is not toml [[[").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_validates() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "[watch]\ndebounce_ms = 0\n").unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    // =========================================================================
    // stock_config_toml()
    // =========================================================================

    #[test]
    fn stock_config_parses_to_defaults() {
        let config: SiteConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, SiteConfig::default());
    }
}
