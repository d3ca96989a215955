//! External library mapping.
//!
//! Collects the third-party libraries a plan needs, pins them against the
//! app's version table, and maps them to distribution package names.

use std::collections::{BTreeMap, BTreeSet};

use crate::core::app::AppConfig;
use crate::ops::Warning;
use crate::resolver::BuildPlan;

/// Extra library groups to pull in.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtlibOptions {
    pub tests: bool,
    pub demo: bool,
}

/// The pinned library set for a build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalLibraries {
    /// Library name to version ("" when unpinned)
    pub libraries: BTreeMap<String, String>,
    pub warnings: Vec<Warning>,
}

impl ExternalLibraries {
    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.libraries.keys()
    }
}

/// Every `extlibs` and `<platform>-extlibs` entry of the plan's modules.
pub fn collect_extlibs(plan: &BuildPlan, platform: &str) -> BTreeSet<String> {
    let qualified = format!("{}-extlibs", platform);
    plan.modules()
        .values()
        .flat_map(|module| {
            module
                .extlibs
                .iter()
                .chain(module.list(&qualified).iter())
                .cloned()
        })
        .collect()
}

/// Keep the names present in the version table, with their versions.
///
/// Absent names are returned separately and only logged at debug level.
pub fn resolve_versions<'a, I>(
    names: I,
    versions: &BTreeMap<String, String>,
) -> (BTreeMap<String, String>, Vec<String>)
where
    I: IntoIterator<Item = &'a String>,
{
    let mut resolved = BTreeMap::new();
    let mut missing = Vec::new();
    for name in names {
        match versions.get(name) {
            Some(version) => {
                resolved.insert(name.clone(), version.clone());
            }
            None => {
                tracing::debug!("no version entry for external library `{}`, dropping it", name);
                missing.push(name.clone());
            }
        }
    }
    (resolved, missing)
}

/// Libraries for a plan: module extlibs, optional test/demo extlibs, minus
/// the platform's skip list.
pub fn gather(
    app: &AppConfig,
    plan: &BuildPlan,
    platform: &str,
    options: ExtlibOptions,
) -> ExternalLibraries {
    let mut names = collect_extlibs(plan, platform);
    if options.tests {
        names.extend(app.test_extlibs.iter().cloned());
    }
    if options.demo {
        names.extend(app.demo_extlibs.iter().cloned());
    }

    let (mut libraries, missing) = resolve_versions(&names, &app.extlibs);
    let mut warnings: Vec<Warning> = missing
        .into_iter()
        .map(|library| Warning::MissingVersionEntry { library })
        .collect();

    for skip in app.skip_list(platform) {
        if libraries.remove(&skip).is_some() {
            tracing::warn!("skipping library {}", skip);
            warnings.push(Warning::SkippedLibrary { library: skip });
        }
    }

    ExternalLibraries {
        libraries,
        warnings,
    }
}

/// Resolved libraries mapped to one package manager's names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VendorPackages {
    /// Vendor package name to version
    pub packages: BTreeMap<String, String>,
    /// Libraries without a vendor mapping
    pub missing: Vec<String>,
}

/// Map libraries through a vendor table. Unmapped libraries are reported,
/// not fatal.
pub fn map_to_vendor(
    resolved: &BTreeMap<String, String>,
    vendor_table: &BTreeMap<String, String>,
) -> VendorPackages {
    let mut mapped = VendorPackages::default();
    for (name, version) in resolved {
        match vendor_table.get(name) {
            Some(vendor) => {
                mapped.packages.insert(vendor.clone(), version.clone());
            }
            None => mapped.missing.push(name.clone()),
        }
    }
    mapped
}

/// Vendor packages for a manager, with a warning per unmapped library.
pub fn vendor_packages(
    app: &AppConfig,
    manager: &str,
    libraries: &BTreeMap<String, String>,
) -> (VendorPackages, Vec<Warning>) {
    let empty = BTreeMap::new();
    let table = app.packages.get(manager).unwrap_or(&empty);
    let mapped = map_to_vendor(libraries, table);
    let warnings = mapped
        .missing
        .iter()
        .map(|library| Warning::MissingVendorPackage {
            library: library.clone(),
            manager: manager.to_string(),
        })
        .collect();
    (mapped, warnings)
}
