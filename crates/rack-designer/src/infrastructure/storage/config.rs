//! TOML-based configuration persistence for Rack Designer.
//!
//! Reads `AppConfig` from the platform-appropriate config file:
//! - Windows:  `%APPDATA%\RackDesigner\config.toml`
//! - Linux:    `~/.config/rackdesigner/config.toml`
//! - macOS:    `~/Library/Application Support/RackDesigner/config.toml`
//!
//! Example:
//!
//! ```toml
//! [editor]
//! log_level = "info"
//! default_cable_color = "#38bdf8"
//!
//! [storage]
//! layout_file = "layout.json"
//!
//! [[catalog]]
//! key = "UPS_3U"
//! name = "Line-Interactive UPS"
//! height_units = 3
//! port_count = 2
//! display_color = "bg-amber-900"
//! category = "PATCH"
//! ```
//!
//! Every section and field is optional; missing ones take the defaults below.
//! `[[catalog]]` entries are added to the built-in catalog, replacing a
//! built-in model when the key matches.

use std::path::{Path, PathBuf};

use rack_core::{Catalog, CatalogError, Category, HardwareModel, DEFAULT_CABLE_COLOR};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level application configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    /// Extra hardware models layered over the built-in catalog.
    #[serde(default)]
    pub catalog: Vec<CatalogEntry>,
}

/// Editor behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EditorConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Color given to newly created cables.
    #[serde(default = "default_cable_color")]
    pub default_cable_color: String,
}

/// Where the layout is kept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Layout JSON file.  Relative paths resolve against the config directory.
    #[serde(default = "default_layout_file")]
    pub layout_file: PathBuf,
}

/// One `[[catalog]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry {
    pub key: String,
    pub name: String,
    pub height_units: u32,
    #[serde(default)]
    pub port_count: u32,
    #[serde(default = "default_display_color")]
    pub display_color: String,
    pub category: Category,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_cable_color() -> String {
    DEFAULT_CABLE_COLOR.to_string()
}
fn default_layout_file() -> PathBuf {
    PathBuf::from("layout.json")
}
fn default_display_color() -> String {
    "bg-slate-800".to_string()
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            default_cable_color: default_cable_color(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            layout_file: default_layout_file(),
        }
    }
}

impl AppConfig {
    /// Builds the effective catalog: built-in models plus `[[catalog]]` entries.
    ///
    /// # Errors
    ///
    /// Returns the first [`CatalogError`] raised by an invalid entry.
    pub fn build_catalog(&self) -> Result<Catalog, CatalogError> {
        let mut catalog = Catalog::builtin();
        for entry in &self.catalog {
            catalog.insert(
                entry.key.clone(),
                HardwareModel::new(
                    entry.name.clone(),
                    entry.height_units,
                    entry.port_count,
                    entry.display_color.clone(),
                    entry.category,
                ),
            )?;
        }
        Ok(catalog)
    }

    /// Resolves the layout file path against `config_dir` when it is relative.
    pub fn layout_file_path(&self, config_dir: &Path) -> PathBuf {
        if self.storage.layout_file.is_absolute() {
            self.storage.layout_file.clone()
        } else {
            config_dir.join(&self.storage.layout_file)
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the file
/// does not yet exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Resolves the platform config directory including the `RackDesigner` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("RackDesigner"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("rackdesigner"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("RackDesigner")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
