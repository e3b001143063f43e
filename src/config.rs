//! Site configuration.
//!
//! Configuration comes from three layers, later layers winning:
//!
//! 1. Stock defaults ([`SiteConfig::default`]).
//! 2. `quire.toml` in the working directory, if present.
//! 3. Environment variables for the content store.
//!
//! ## Config File
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! title = "Marianne MacRae"
//! base_url = ""             # Prefix for absolute links, e.g. "https://example.com"
//! output_dir = "dist"       # Where rendered pages and the render cache live
//!
//! [store]
//! # url = "sqlite:content/site.db"   # or "memory:" or a bare path
//! # key = "..."                      # access key given to `quire store init`
//!
//! [admin]
//! # email = "author@example.com"
//! # password_sha256 = "..."          # sha-256 hex of the admin password
//! session_ttl_secs = 28800
//!
//! [uploads]
//! root = "media"            # Directory uploaded audio is written under
//! public_base_url = "/media"
//! max_bytes = 104857600     # 100 MB
//!
//! [logging]
//! level = "info"            # Used when RUST_LOG is not set
//!
//! [colors.light]
//! background = "#faf9f7"
//! text = "#1c1b1a"
//! text_muted = "#6b6862"
//! border = "#e4e1dc"
//!
//! [colors.dark]
//! background = "#141312"
//! text = "#ecebe8"
//! text_muted = "#9a968f"
//! border = "#2e2c29"
//! ```
//!
//! Unknown keys are rejected to catch typos early.
//!
//! ## Environment
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `QUIRE_STORE_URL`, else `STORE_URL` | `store.url` |
//! | `QUIRE_STORE_KEY`, else `STORE_KEY` | `store.key` |
//!
//! The URL and key fall back independently. If either ends up missing, the
//! site runs on compiled-in defaults with no persistence.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the config file looked up in the working directory.
pub const CONFIG_FILENAME: &str = "quire.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Everything `quire` reads from `quire.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub site: SiteSection,
    pub store: StoreConfig,
    pub admin: AdminConfig,
    pub uploads: UploadsConfig,
    pub logging: LoggingConfig,
    pub colors: ColorConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site.output_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "site.output_dir must not be empty".into(),
            ));
        }
        if self.admin.session_ttl_secs == 0 || self.admin.session_ttl_secs > MAX_SESSION_TTL_SECS {
            return Err(ConfigError::Validation(format!(
                "admin.session_ttl_secs must be between 1 and {MAX_SESSION_TTL_SECS}"
            )));
        }
        if let Some(hash) = &self.admin.password_sha256
            && (hash.len() != 64 || !hash.chars().all(|c| c.is_ascii_hexdigit()))
        {
            return Err(ConfigError::Validation(
                "admin.password_sha256 must be 64 hex characters".into(),
            ));
        }
        if self.uploads.max_bytes == 0 {
            return Err(ConfigError::Validation(
                "uploads.max_bytes must be greater than 0".into(),
            ));
        }
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.level must be one of {}",
                LOG_LEVELS.join(", ")
            )));
        }
        Ok(())
    }

    /// Apply store overrides from the environment via `lookup`.
    ///
    /// `lookup` is `std::env::var(..).ok()` in the binary; tests pass a map.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let first = |names: &[&str]| {
            names
                .iter()
                .find_map(|n| lookup(*n).filter(|v| !v.trim().is_empty()))
        };
        if let Some(url) = first(&["QUIRE_STORE_URL", "STORE_URL"]) {
            self.store.url = Some(url);
        }
        if let Some(key) = first(&["QUIRE_STORE_KEY", "STORE_KEY"]) {
            self.store.key = Some(key);
        }
    }
}

/// One year.
pub const MAX_SESSION_TTL_SECS: u64 = 365 * 24 * 60 * 60;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Site identity and output location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSection {
    /// Author name shown in page titles and the header.
    pub title: String,
    /// Prefix for absolute links. Empty means root-relative links.
    pub base_url: String,
    /// Directory rendered pages and the render cache manifest are written to.
    pub output_dir: String,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            title: "Marianne MacRae".to_string(),
            base_url: String::new(),
            output_dir: "dist".to_string(),
        }
    }
}

/// Content store location and access key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// Admin sign-in settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdminConfig {
    /// When set, sign-in also requires this email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// SHA-256 hex of the admin password. Unset disables sign-in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_sha256: Option<String>,
    pub session_ttl_secs: u64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            email: None,
            password_sha256: None,
            session_ttl_secs: 8 * 60 * 60,
        }
    }
}

/// Audio upload storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadsConfig {
    pub root: String,
    pub public_base_url: String,
    pub max_bytes: u64,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            root: "media".to_string(),
            public_base_url: "/media".to_string(),
            max_bytes: 100 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Page colors for light and dark modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorConfig {
    pub light: ColorScheme,
    pub dark: ColorScheme,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            light: ColorScheme {
                background: "#faf9f7".to_string(),
                text: "#1c1b1a".to_string(),
                text_muted: "#6b6862".to_string(),
                border: "#e4e1dc".to_string(),
            },
            dark: ColorScheme {
                background: "#141312".to_string(),
                text: "#ecebe8".to_string(),
                text_muted: "#9a968f".to_string(),
                border: "#2e2c29".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorScheme {
    pub background: String,
    pub text: String,
    /// Labels, dates, navigation.
    pub text_muted: String,
    pub border: String,
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` onto `base`. Tables merge key by key; any
/// other value in the overlay replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut table), toml::Value::Table(over)) => {
            for (key, value) in over {
                let merged = match table.remove(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => value,
                };
                table.insert(key, merged);
            }
            toml::Value::Table(table)
        }
        (_, overlay) => overlay,
    }
}

/// Read `quire.toml` from `dir` without interpreting it.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let path = dir.join(CONFIG_FILENAME);
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)?;
    Ok(Some(toml::from_str(&content)?))
}

/// Merge an optional overlay onto `base`, deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(over) => merge_toml(base, over),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `quire.toml` from `dir` over the stock defaults.
///
/// Environment overrides are not applied here; see [`SiteConfig::apply_env`].
pub fn load_config(dir: &Path) -> Result<SiteConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(dir)?)
}

/// CSS custom properties for the configured colors.
pub fn generate_color_css(colors: &ColorConfig) -> String {
    let vars = |s: &ColorScheme| {
        format!(
            "--color-bg: {};\n    --color-text: {};\n    --color-text-muted: {};\n    --color-border: {};",
            s.background, s.text, s.text_muted, s.border
        )
    };
    format!(
        ":root {{\n    {}\n}}\n\n@media (prefers-color-scheme: dark) {{\n  :root {{\n    {}\n  }}\n}}",
        vars(&colors.light),
        vars(&colors.dark)
    )
}

/// A fully commented `quire.toml` with every key at its default.
///
/// Printed by `quire gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# quire configuration
# ===================
# Every setting is optional. Values below are the defaults.
# Unknown keys are an error.

# ---------------------------------------------------------------------------
# Site
# ---------------------------------------------------------------------------
[site]
# Author name used in page titles and the header.
title = "Marianne MacRae"

# Prefix for absolute links. Leave empty for root-relative links.
base_url = ""

# Rendered pages and the render cache manifest go here.
output_dir = "dist"

# ---------------------------------------------------------------------------
# Content store
# ---------------------------------------------------------------------------
# Without both url and key the site serves compiled-in defaults and the
# editor is read-only. QUIRE_STORE_URL / STORE_URL and QUIRE_STORE_KEY /
# STORE_KEY override these.
[store]
# url = "sqlite:content/site.db"
# key = "change-me"

# ---------------------------------------------------------------------------
# Admin
# ---------------------------------------------------------------------------
[admin]
# Require this email at sign-in (optional).
# email = "author@example.com"

# sha-256 hex digest of the admin password. Sign-in is disabled until set.
#   printf '%s' 'password' | sha256sum
# password_sha256 = ""

# How long an admin session stays valid, in seconds (at most 31536000).
session_ttl_secs = 28800

# ---------------------------------------------------------------------------
# Audio uploads
# ---------------------------------------------------------------------------
[uploads]
# Directory uploaded files are written under.
root = "media"

# Public URL prefix that serves `root`.
public_base_url = "/media"

# Largest accepted upload, in bytes (100 MB).
max_bytes = 104857600

# ---------------------------------------------------------------------------
# Logging
# ---------------------------------------------------------------------------
[logging]
# trace, debug, info, warn or error. RUST_LOG takes precedence.
level = "info"

# ---------------------------------------------------------------------------
# Colors - light mode
# ---------------------------------------------------------------------------
[colors.light]
background = "#faf9f7"
text = "#1c1b1a"
text_muted = "#6b6862"    # Labels, dates, navigation
border = "#e4e1dc"

# ---------------------------------------------------------------------------
# Colors - dark mode (prefers-color-scheme: dark)
# ---------------------------------------------------------------------------
[colors.dark]
background = "#141312"
text = "#ecebe8"
text_muted = "#9a968f"
border = "#2e2c29"
"##
}
