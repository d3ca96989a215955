//! `vcpkg.json` generation.
//!
//! The manifest is rebuilt from scratch on every run. Entries are emitted in
//! sorted order so identical inputs produce identical files.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::app::AppConfig;
use crate::core::target::BuildTarget;
use crate::util::fs::write_string;

/// Registry snapshot used when the app does not pin one.
pub const DEFAULT_BASELINE: &str = "3a3285c4878c7f5a957202201ba41e6fdeba8db4";

/// A manifest dependency: a bare port name or a detailed record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dependency {
    Name(String),
    Detailed(DetailedDependency),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedDependency {
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,

    #[serde(
        rename = "default-features",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub default_features: Option<bool>,
}

impl Dependency {
    /// Bare form unless there are features or default features are disabled.
    pub fn new(name: &str, features: Vec<String>, default_features: bool) -> Self {
        if features.is_empty() && default_features {
            Dependency::Name(name.to_string())
        } else {
            Dependency::Detailed(DetailedDependency {
                name: name.to_string(),
                features,
                default_features: (!default_features).then_some(false),
            })
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Dependency::Name(name) => name,
            Dependency::Detailed(detail) => &detail.name,
        }
    }
}

/// A version pin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Override {
    pub name: String,
    pub version: String,
}

/// The manifest document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(rename = "builtin-baseline")]
    pub builtin_baseline: String,
    pub dependencies: Vec<Dependency>,
    pub overrides: Vec<Override>,
}

impl Manifest {
    pub fn new(baseline: impl Into<String>) -> Self {
        Manifest {
            builtin_baseline: baseline.into(),
            dependencies: Vec::new(),
            overrides: Vec::new(),
        }
    }

    /// Add one library, pinning its version when non-empty.
    pub fn add(&mut self, name: &str, version: &str, features: Vec<String>, default_features: bool) {
        self.dependencies
            .push(Dependency::new(name, features, default_features));
        if !version.is_empty() {
            self.overrides.push(Override {
                name: name.to_string(),
                version: version.to_string(),
            });
        }
    }

    /// Whether `name` is already a dependency.
    pub fn contains(&self, name: &str) -> bool {
        self.dependencies.iter().any(|dep| dep.name() == name)
    }

    /// Names of every dependency, in manifest order.
    pub fn dependency_names(&self) -> Vec<&str> {
        self.dependencies.iter().map(Dependency::name).collect()
    }

    pub fn to_json(&self) -> Result<String> {
        let mut json =
            serde_json::to_string_pretty(self).context("failed to serialize vcpkg manifest")?;
        json.push('\n');
        Ok(json)
    }

    /// Write to `path`, creating parent directories.
    pub fn write(&self, path: &Path) -> Result<()> {
        write_string(path, &self.to_json()?)?;
        tracing::info!("wrote vcpkg manifest at: {}", path.display());
        Ok(())
    }
}

/// Builds manifests for one app and target.
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    baseline: String,
    features: BTreeMap<String, Vec<String>>,
    skip: BTreeSet<String>,
    cross_building: bool,
    cross_linux: bool,
    no_default_features: BTreeSet<String>,
    no_default_features_add: BTreeMap<String, Vec<String>>,
    display_libs: BTreeMap<String, String>,
    display_features: BTreeMap<String, Vec<String>>,
}

impl ManifestBuilder {
    /// Capture the app's manifest settings for a target.
    ///
    /// Platform features are only applied to native builds. Disabling default
    /// features only applies to cross builds.
    pub fn new(app: &AppConfig, target: &BuildTarget) -> Self {
        let cross_building = target.is_cross_building();
        let settings = &app.vcpkg;

        let (no_default_features, no_default_features_add) = if cross_building {
            (
                settings.no_default_features.iter().cloned().collect(),
                settings.no_default_features_add.clone(),
            )
        } else {
            (BTreeSet::new(), BTreeMap::new())
        };

        ManifestBuilder {
            baseline: settings
                .baseline
                .clone()
                .unwrap_or_else(|| DEFAULT_BASELINE.to_string()),
            features: app.features_for(&target.platform, !cross_building),
            skip: app.skip_list(&target.platform).into_iter().collect(),
            cross_building,
            cross_linux: target.is_cross_linux(),
            no_default_features,
            no_default_features_add,
            display_libs: settings.cross_linux_extlibs.clone(),
            display_features: settings.cross_linux_extlibs_features.clone(),
        }
    }

    pub fn is_cross_building(&self) -> bool {
        self.cross_building
    }

    /// The full manifest for a resolved library set.
    ///
    /// `needs_display` adds the display foundation ports when cross building
    /// for linux.
    pub fn build(&self, libraries: &BTreeMap<String, String>, needs_display: bool) -> Manifest {
        let mut manifest = Manifest::new(&self.baseline);
        let mut pending = self.no_default_features.clone();

        for (name, version) in libraries {
            if self.skip.contains(name) {
                continue;
            }
            let features = self.features.get(name).cloned().unwrap_or_default();
            let default_features = !pending.remove(name);
            manifest.add(name, version, features, default_features);
        }

        if self.cross_linux && needs_display {
            for (name, version) in &self.display_libs {
                if manifest.contains(name) {
                    continue;
                }
                let features = self.display_features.get(name).cloned().unwrap_or_default();
                let default_features = !pending.remove(name);
                manifest.add(name, version, features, default_features);
            }
        }

        // Still pinned when only pulled in transitively.
        for name in pending {
            let mut features = self.features.get(&name).cloned().unwrap_or_default();
            if let Some(extra) = self.no_default_features_add.get(&name) {
                features.extend(extra.iter().cloned());
            }
            manifest.add(&name, "", features, false);
        }

        manifest
    }

    /// Phase-1 manifest: only the display foundation ports.
    pub fn foundation(&self) -> Manifest {
        let mut manifest = Manifest::new(&self.baseline);
        for (name, version) in &self.display_libs {
            let features = self.display_features.get(name).cloned().unwrap_or_default();
            let default_features = !self.no_default_features.contains(name);
            manifest.add(name, version, features, default_features);
        }
        manifest
    }

    /// Whether any display foundation port is configured.
    pub fn has_foundation(&self) -> bool {
        !self.display_libs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::host::HostInfo;
    use crate::core::target::{Libc, TargetRequest};
    use crate::test_support::fixtures::sample_app;

    fn target(machine: &str) -> BuildTarget {
        let host = HostInfo {
            machine: "x86_64".to_string(),
            libc: Libc::Gnu,
            platform: "linux".to_string(),
        };
        let request = TargetRequest {
            machine: Some(machine.to_string()),
            ..Default::default()
        };
        BuildTarget::resolve(&request, &host).unwrap()
    }

    fn libs(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_manifest_shape() {
        let app = sample_app();
        let builder = ManifestBuilder::new(&app, &target("x86_64"));
        let manifest = builder.build(&libs(&[("fmt", "12.1.0"), ("libusb", ""), ("zlib", "")]), false);

        let json: serde_json::Value = serde_json::from_str(&manifest.to_json().unwrap()).unwrap();
        assert_eq!(json["builtin-baseline"], DEFAULT_BASELINE);
        assert_eq!(json["dependencies"][0], "fmt");
        assert_eq!(
            json["dependencies"][1],
            serde_json::json!({"name": "libusb", "features": ["udev"]})
        );
        assert_eq!(json["dependencies"][2], "zlib");
        assert_eq!(
            json["overrides"],
            serde_json::json!([{"name": "fmt", "version": "12.1.0"}])
        );
    }

    #[test]
    fn test_cross_build_drops_platform_features_and_defaults() {
        let mut app = sample_app();
        app.vcpkg.no_default_features = vec!["libusb".to_string(), "sdl3".to_string()];
        app.vcpkg
            .no_default_features_add
            .insert("sdl3".to_string(), vec!["x11".to_string()]);

        let builder = ManifestBuilder::new(&app, &target("arm64"));
        assert!(builder.is_cross_building());
        let manifest = builder.build(&libs(&[("libusb", "")]), false);

        assert_eq!(
            manifest.dependencies,
            vec![
                Dependency::Detailed(DetailedDependency {
                    name: "libusb".to_string(),
                    features: vec![],
                    default_features: Some(false),
                }),
                Dependency::Detailed(DetailedDependency {
                    name: "sdl3".to_string(),
                    features: vec!["x11".to_string()],
                    default_features: Some(false),
                }),
            ]
        );
    }

    #[test]
    fn test_native_build_ignores_no_default_features() {
        let mut app = sample_app();
        app.vcpkg.no_default_features = vec!["sdl3".to_string()];
        let manifest = ManifestBuilder::new(&app, &target("x86_64")).build(&libs(&[("fmt", "")]), false);
        assert_eq!(manifest.dependency_names(), ["fmt"]);
    }

    #[test]
    fn test_skipped_library_is_left_out() {
        let mut app = sample_app();
        app.extlibs_skip = vec!["zlib".to_string()];
        let manifest =
            ManifestBuilder::new(&app, &target("x86_64")).build(&libs(&[("fmt", ""), ("zlib", "1.3")]), false);
        assert_eq!(manifest.dependency_names(), ["fmt"]);
        assert!(manifest.overrides.is_empty());
    }

    #[test]
    fn test_display_foundation_only_for_cross_linux() {
        let mut app = sample_app();
        app.vcpkg
            .cross_linux_extlibs
            .insert("libx11".to_string(), "1.8.10".to_string());
        app.vcpkg
            .cross_linux_extlibs_features
            .insert("libx11".to_string(), vec!["xcb".to_string()]);

        let native = ManifestBuilder::new(&app, &target("x86_64"));
        assert_eq!(native.build(&libs(&[("fmt", "")]), true).dependency_names(), ["fmt"]);

        let cross = ManifestBuilder::new(&app, &target("arm64"));
        assert_eq!(cross.build(&libs(&[("fmt", "")]), false).dependency_names(), ["fmt"]);
        let full = cross.build(&libs(&[("fmt", "")]), true);
        assert_eq!(full.dependency_names(), ["fmt", "libx11"]);
        assert_eq!(full.overrides[0].version, "1.8.10");

        let foundation = cross.foundation();
        assert_eq!(foundation.dependency_names(), ["libx11"]);
        assert_eq!(
            foundation.dependencies[0],
            Dependency::Detailed(DetailedDependency {
                name: "libx11".to_string(),
                features: vec!["xcb".to_string()],
                default_features: None,
            })
        );
    }

    #[test]
    fn test_display_foundation_is_unioned_once() {
        let mut app = sample_app();
        app.vcpkg
            .cross_linux_extlibs
            .insert("libx11".to_string(), "1.8.10".to_string());
        let cross = ManifestBuilder::new(&app, &target("arm64"));

        let full = cross.build(&libs(&[("libx11", "1.8.10")]), true);
        assert_eq!(full.dependency_names(), ["libx11"]);
        assert_eq!(full.overrides.len(), 1);

        app.vcpkg.no_default_features = vec!["libx11".to_string()];
        let cross = ManifestBuilder::new(&app, &target("arm64"));
        let full = cross.build(&libs(&[("fmt", "")]), true);
        assert_eq!(full.dependency_names(), ["fmt", "libx11"]);
        assert_eq!(
            full.dependencies[1],
            Dependency::Detailed(DetailedDependency {
                name: "libx11".to_string(),
                features: vec![],
                default_features: Some(false),
            })
        );
        assert_eq!(cross.foundation().dependencies.as_slice(), &full.dependencies[1..]);
    }

    #[test]
    fn test_app_baseline_and_write() {
        let mut app = sample_app();
        app.vcpkg.baseline = Some("abc123".to_string());
        let manifest = ManifestBuilder::new(&app, &target("x86_64")).build(&BTreeMap::new(), false);

        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("vcpkg").join("vcpkg.json");
        manifest.write(&path).unwrap();

        let written: Manifest =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.builtin_baseline, "abc123");
        assert!(written.dependencies.is_empty());
    }
}
