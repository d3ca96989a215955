//! The app catalog (`Crossport.toml`).
//!
//! Holds the module catalog, the external library version table, vendor
//! package tables, and every setting that shapes the vcpkg manifest and
//! overlay triplets. Parsed once and validated at load time.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::core::module::BuildModule;
use crate::resolver::errors::ResolveError;
use crate::util::diagnostic::ConfigParseError;
use crate::util::fs::read_to_string;

/// `[app]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppMeta {
    pub name: String,
    pub version: Option<String>,
    /// Build modes the app accepts; any mode is allowed when empty
    pub modes: Vec<String>,
}

/// `[vcpkg]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct VcpkgSettings {
    /// Pinned registry snapshot; a built-in default is used when absent
    pub baseline: Option<String>,

    pub cflags: Vec<String>,
    pub cxxflags: Vec<String>,

    /// Ports whose default features are disabled when cross building
    pub no_default_features: Vec<String>,

    /// Features to keep on ports listed in `no-default-features`
    pub no_default_features_add: BTreeMap<String, Vec<String>>,

    /// Extra link names that imply the display foundation is needed
    pub display_libs: Vec<String>,

    /// Per-port CMake configure options
    pub cmake_configure_options: BTreeMap<String, Vec<String>>,

    /// Native per-platform replacements, keyed by platform then port
    pub cmake_configure_options_platform: BTreeMap<String, BTreeMap<String, Vec<String>>>,

    /// Cross per-platform replacements, keyed by platform then port
    pub cmake_configure_options_cross: BTreeMap<String, BTreeMap<String, Vec<String>>>,

    /// Display foundation ports built from source when cross compiling linux
    pub cross_linux_extlibs: BTreeMap<String, String>,
    pub cross_linux_extlibs_features: BTreeMap<String, Vec<String>>,

    /// Local triplet and toolchain directory (defaults to `<root>/vcpkg`)
    pub local_dir: Option<PathBuf>,

    /// Project addon directory (defaults to `<root>/addon/vcpkg`)
    pub addon_dir: Option<PathBuf>,
}

/// Parsed `Crossport.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AppConfig {
    pub app: AppMeta,

    pub modules: BTreeMap<String, BuildModule>,

    /// Modules only built on request, via `--with`, or their `conditional-env`
    pub conditional_modules: BTreeMap<String, BuildModule>,

    /// Version table: library name to pinned version ("" = unpinned)
    pub extlibs: BTreeMap<String, String>,

    pub extlibs_features: BTreeMap<String, Vec<String>>,
    pub extlibs_features_platform: BTreeMap<String, BTreeMap<String, Vec<String>>>,

    pub extlibs_skip: Vec<String>,
    pub extlibs_skip_platform: BTreeMap<String, Vec<String>>,

    pub test_extlibs: Vec<String>,
    pub demo_extlibs: Vec<String>,

    /// Vendor tables: package manager to (library to vendor package name)
    pub packages: BTreeMap<String, BTreeMap<String, String>>,

    pub vcpkg: VcpkgSettings,
}

impl AppConfig {
    /// Load and validate an app catalog from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = read_to_string(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::parse(&name, &contents)
    }

    /// Parse and validate catalog text. `name` labels parse diagnostics.
    pub fn parse(name: &str, contents: &str) -> Result<Self> {
        let mut app: AppConfig = toml::from_str(contents)
            .map_err(|e| ConfigParseError::from_toml(name, contents, &e))?;
        app.validate()?;
        Ok(app)
    }

    /// Fill module names from their keys and check catalog invariants.
    pub fn validate(&mut self) -> Result<(), ResolveError> {
        for (name, module) in self
            .modules
            .iter_mut()
            .chain(self.conditional_modules.iter_mut())
        {
            module.name = name.clone();
            module.validate()?;
        }

        if let Some(clash) = self
            .conditional_modules
            .keys()
            .find(|name| self.modules.contains_key(*name))
        {
            return Err(ResolveError::ConditionalNameClash {
                module: clash.clone(),
            });
        }

        Ok(())
    }

    /// Regular and conditional modules in one catalog.
    pub fn merged_modules(&self) -> BTreeMap<String, BuildModule> {
        let mut merged = self.modules.clone();
        merged.extend(
            self.conditional_modules
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        merged
    }

    /// Whether any requested name refers to a conditional module.
    pub fn requests_conditional(&self, requested: &[String]) -> bool {
        requested
            .iter()
            .any(|name| self.conditional_modules.contains_key(name))
    }

    /// Conditional modules whose `conditional-env` variable is set to "1".
    pub fn conditionals_from_env<F>(&self, lookup: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.conditional_modules
            .iter()
            .filter(|(_, module)| {
                module
                    .conditional_env
                    .as_deref()
                    .and_then(&lookup)
                    .is_some_and(|value| value == "1")
            })
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Base features merged with the platform's features, in declaration order.
    pub fn features_for(&self, platform: &str, with_platform: bool) -> BTreeMap<String, Vec<String>> {
        let mut features = self.extlibs_features.clone();
        if with_platform {
            if let Some(extra) = self.extlibs_features_platform.get(platform) {
                for (name, list) in extra {
                    features
                        .entry(name.clone())
                        .or_default()
                        .extend(list.iter().cloned());
                }
            }
        }
        features
    }

    /// Skip list for a platform: global entries, then platform entries.
    pub fn skip_list(&self, platform: &str) -> Vec<String> {
        let mut skip = self.extlibs_skip.clone();
        if let Some(extra) = self.extlibs_skip_platform.get(platform) {
            skip.extend(extra.iter().cloned());
        }
        skip
    }
}
