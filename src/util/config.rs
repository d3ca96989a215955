//! Tool configuration for crossport.
//!
//! Two locations are read:
//! - Global: `~/.crossport/config.toml` - user-wide defaults
//! - Project: `.crossport/config.toml` - project-specific overrides
//!
//! Project config takes precedence over global config, and command line
//! flags take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default per-library time budget for a vcpkg install, in seconds.
pub const DEFAULT_SECONDS_PER_LIBRARY: u64 = 180;

/// Default time budget for `<cc> --print-sysroot`, in seconds.
pub const DEFAULT_SYSROOT_TIMEOUT_SECS: u64 = 5;

/// Crossport configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Packaging engine settings
    pub vcpkg: VcpkgConfig,

    /// Default build selection
    pub build: BuildConfig,
}

/// Settings for driving vcpkg.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct VcpkgConfig {
    /// vcpkg root directory (containing the vcpkg binary)
    pub root: Option<PathBuf>,

    /// Binary cache directory (defaults to `<root>/archives`)
    pub binary_cache: Option<PathBuf>,

    /// Install time budget per external library, in seconds
    pub seconds_per_library: Option<u64>,

    /// Time budget for the cross compiler sysroot probe, in seconds
    pub sysroot_timeout_secs: Option<u64>,
}

/// Default target selection, used when the command line leaves a field unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub platform: Option<String>,
    pub compiler: Option<String>,
    pub libc: Option<String>,
    pub machine: Option<String>,
    pub mode: Option<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.vcpkg.root.is_some() {
            self.vcpkg.root = other.vcpkg.root;
        }
        if other.vcpkg.binary_cache.is_some() {
            self.vcpkg.binary_cache = other.vcpkg.binary_cache;
        }
        if other.vcpkg.seconds_per_library.is_some() {
            self.vcpkg.seconds_per_library = other.vcpkg.seconds_per_library;
        }
        if other.vcpkg.sysroot_timeout_secs.is_some() {
            self.vcpkg.sysroot_timeout_secs = other.vcpkg.sysroot_timeout_secs;
        }

        if other.build.platform.is_some() {
            self.build.platform = other.build.platform;
        }
        if other.build.compiler.is_some() {
            self.build.compiler = other.build.compiler;
        }
        if other.build.libc.is_some() {
            self.build.libc = other.build.libc;
        }
        if other.build.machine.is_some() {
            self.build.machine = other.build.machine;
        }
        if other.build.mode.is_some() {
            self.build.mode = other.build.mode;
        }
    }

    /// Install time budget per library.
    pub fn seconds_per_library(&self) -> u64 {
        self.vcpkg
            .seconds_per_library
            .unwrap_or(DEFAULT_SECONDS_PER_LIBRARY)
    }

    /// Sysroot probe time budget.
    pub fn sysroot_timeout_secs(&self) -> u64 {
        self.vcpkg
            .sysroot_timeout_secs
            .unwrap_or(DEFAULT_SYSROOT_TIMEOUT_SECS)
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.crossport/config.toml)
/// 2. Global config (~/.crossport/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        let global = Config::load_or_default(global_path);
        config.merge(global);
    }

    if project_path.exists() {
        let project = Config::load_or_default(project_path);
        config.merge(project);
    }

    config
}

/// Get the global crossport config directory (~/.crossport).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".crossport"))
}

/// Get the project config path (.crossport/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".crossport").join("config.toml")
}
