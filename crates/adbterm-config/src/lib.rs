//! Shared configuration for adbterm.
//!
//! TOML settings layered with environment overrides, platform directories,
//! Android tool discovery and the JSON session record.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use adbterm_core::DispatchSettings;
use adbterm_core::dispatch::DEFAULT_DEVICE_DOWNLOADS;

pub mod store;
pub mod tools;

pub use store::JsonSessionStore;
pub use tools::{ResolvedTools, ToolGroup, resolve_tools};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{} : not found on your computer", .tools.join(", "))]
    MissingTools { tools: Vec<String> },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("invalid session record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub paths: PathsConfig,
}

/// Folders holding the Android tools. Unset means "look on `PATH`".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ToolsConfig {
    /// Folder searched recursively for `adb`.
    pub platform_tools: Option<PathBuf>,

    /// Folder searched recursively for `aapt`.
    pub build_tools: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Link poll cadence of the connection monitor.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    500
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Root searched by `.install <name>`; defaults to `<data dir>/apks`.
    pub search_root: Option<PathBuf>,

    #[serde(default = "default_device_downloads")]
    pub device_downloads: String,

    /// Destination of `.pull`; defaults to `<data dir>/adb-downloads`.
    pub local_downloads: Option<PathBuf>,

    /// Where bundles are unpacked; defaults to `<cache dir>/extract`.
    pub extract_dir: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            search_root: None,
            device_downloads: default_device_downloads(),
            local_downloads: None,
            extract_dir: None,
        }
    }
}

fn default_device_downloads() -> String {
    DEFAULT_DEVICE_DOWNLOADS.into()
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.session.poll_interval_ms)
    }

    pub fn search_root(&self) -> PathBuf {
        self.paths
            .search_root
            .clone()
            .unwrap_or_else(|| data_dir().join("apks"))
    }

    pub fn local_downloads(&self) -> PathBuf {
        self.paths
            .local_downloads
            .clone()
            .unwrap_or_else(|| data_dir().join("adb-downloads"))
    }

    pub fn extract_dir(&self) -> PathBuf {
        self.paths
            .extract_dir
            .clone()
            .unwrap_or_else(|| cache_dir().join("extract"))
    }

    /// Paths handed to the command dispatcher.
    pub fn dispatch_settings(&self) -> DispatchSettings {
        DispatchSettings {
            search_root: self.search_root(),
            device_downloads: self.paths.device_downloads.clone(),
            local_downloads: self.local_downloads(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.poll_interval_ms == 0 {
            return Err(ConfigError::Validation {
                field: "session.poll_interval_ms".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if self.paths.device_downloads.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "paths.device_downloads".into(),
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

// ── Directories ─────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "adbterm", "adbterm")
}

fn dirs_fallback(kind: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(kind);
    p.push("adbterm");
    p
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Session record, log file and default transfer folders live here.
pub fn data_dir() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".local/share"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

pub fn cache_dir() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".cache"),
        |dirs| dirs.cache_dir().to_path_buf(),
    )
}

pub fn session_path() -> PathBuf {
    data_dir().join("session.json")
}

pub fn log_dir() -> PathBuf {
    data_dir()
}

// ── Config loading ──────────────────────────────────────────────────

/// Provider chain: defaults, then `path`, then the tool folder variables,
/// then `ADBTERM_*` (`__` separates sections).
pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(
            Env::raw()
                .only(&[tools::PLATFORM_TOOLS.env_key])
                .map(|_| "tools.platform_tools".into()),
        )
        .merge(
            Env::raw()
                .only(&[tools::BUILD_TOOLS.env_key])
                .map(|_| "tools.build_tools".into()),
        )
        .merge(Env::prefixed("ADBTERM_").split("__"))
}

/// Load and validate the config at `path`; a missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = figment(path).extract()?;
    config.validate()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
