//! Kython compiler configuration
//!
//! Supports user-level and project-level configuration files plus
//! environment overrides.
//!
//! # Configuration hierarchy
//!
//! ```text
//! Priority (high → low):
//! 1. CLI arguments
//! 2. Environment variables (KYTHON_BRIDGE_LIB, CPYTHON_EXE, KYTHON_KYC_SCRIPT)
//! 3. Project-level (kython.toml)
//! 4. User-level (~/.config/kython/config.toml)
//! 5. Default values
//! ```
//!
//! # Usage
//!
//! ```rust
//! use kython_compiler::util::config::{CompilerConfig, Backend};
//!
//! let config: CompilerConfig = toml::from_str("backend = \"subprocess\"").unwrap();
//! assert_eq!(config.backend, Backend::Subprocess);
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Project-level configuration file name
pub const PROJECT_CONFIG_FILE: &str = "kython.toml";

/// Overrides the native bridge library path
pub const ENV_BRIDGE_LIB: &str = "KYTHON_BRIDGE_LIB";
/// Overrides the Python executable used by the subprocess backend
pub const ENV_CPYTHON_EXE: &str = "CPYTHON_EXE";
/// Overrides the kyc script run by the subprocess backend
pub const ENV_KYC_SCRIPT: &str = "KYTHON_KYC_SCRIPT";

/// Which compiler backend produces KYC artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// In-process call into `kython_bridge`
    #[default]
    Native,
    /// External CPython running the kyc script
    Subprocess,
}

impl std::fmt::Display for Backend {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Backend::Native => write!(f, "native"),
            Backend::Subprocess => write!(f, "subprocess"),
        }
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "native" => Ok(Backend::Native),
            "subprocess" => Ok(Backend::Subprocess),
            other => Err(format!(
                "unknown backend '{}', expected 'native' or 'subprocess'",
                other
            )),
        }
    }
}

/// Complete compiler configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CompilerConfig {
    /// Selected backend
    #[serde(default)]
    pub backend: Backend,
    /// Native bridge settings
    #[serde(default)]
    pub bridge: BridgeConfig,
    /// Subprocess backend settings
    #[serde(default)]
    pub subprocess: SubprocessConfig,
}

/// Where to find `kython_bridge`
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct BridgeConfig {
    /// Exact library file; disables searching when set
    #[serde(default)]
    pub library: Option<PathBuf>,
    /// Directories searched before the system loader path
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,
}

/// Subprocess backend configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubprocessConfig {
    /// Python executable
    #[serde(default = "default_python")]
    pub python: String,
    /// Path to the kyc compile script
    #[serde(default)]
    pub script: Option<PathBuf>,
    /// Write source to a temporary file and pass `--path` instead of `--code`
    #[serde(default)]
    pub stage_via_file: bool,
}

fn default_python() -> String {
    "python3.9".to_string()
}

impl Default for SubprocessConfig {
    fn default() -> Self {
        Self {
            python: default_python(),
            script: None,
            stage_via_file: false,
        }
    }
}

impl CompilerConfig {
    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_env_from<F>(
        &mut self,
        lookup: F,
    ) where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(lib) = non_empty(ENV_BRIDGE_LIB) {
            self.bridge.library = Some(PathBuf::from(lib));
        }
        if let Some(python) = non_empty(ENV_CPYTHON_EXE) {
            self.subprocess.python = python;
        }
        if let Some(script) = non_empty(ENV_KYC_SCRIPT) {
            self.subprocess.script = Some(PathBuf::from(script));
        }
    }
}

/// Get the user config directory
pub fn get_config_dir() -> Option<PathBuf> {
    // Try XDG config directory on Unix
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config).join("kython"));
    }

    // Fallback to ~/.config/kython
    if let Ok(home) = std::env::var("HOME") {
        return Some(PathBuf::from(home).join(".config").join("kython"));
    }

    // On Windows, try %APPDATA%
    if let Ok(appdata) = std::env::var("APPDATA") {
        return Some(PathBuf::from(appdata).join("kython"));
    }

    None
}

/// Get the user config file path (~/.config/kython/config.toml)
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.toml"))
}

/// Load a single config file, `None` if it does not exist
pub fn load_config_file(path: &Path) -> Result<Option<CompilerConfig>, ConfigError> {
    match read_layer(path)? {
        Some(table) => Ok(Some(toml::Value::Table(table).try_into()?)),
        None => Ok(None),
    }
}

fn read_layer(path: &Path) -> Result<Option<toml::Table>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    Ok(Some(toml::from_str(&content)?))
}

/// Merge `overlay` into `base`: tables merge key by key, any other value
/// (arrays included) replaces what was there.
fn merge_layer(
    base: &mut toml::Table,
    overlay: toml::Table,
) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(nested)) => {
                merge_layer(existing, nested);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Merge the user file and the project file without environment overrides
pub fn load_layered(
    user_config: Option<&Path>,
    project_dir: &Path,
) -> Result<CompilerConfig, ConfigError> {
    let mut merged = toml::Table::new();
    if let Some(layer) = user_config.map(read_layer).transpose()?.flatten() {
        merge_layer(&mut merged, layer);
    }
    if let Some(layer) = read_layer(&project_dir.join(PROJECT_CONFIG_FILE))? {
        merge_layer(&mut merged, layer);
    }

    Ok(toml::Value::Table(merged).try_into()?)
}

/// Resolve configuration for a project directory
///
/// The project file overrides the user file key by key; environment
/// overrides are applied last.
pub fn load_config(project_dir: &Path) -> Result<CompilerConfig, ConfigError> {
    let mut config = load_layered(get_config_path().as_deref(), project_dir)?;
    config.apply_env();
    Ok(config)
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ParseError(#[from] toml::de::Error),
}
