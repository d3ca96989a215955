//! Build module records from the `[modules]` and `[conditional-modules]` tables.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::resolver::errors::ResolveError;

/// Suffixes accepted on platform-, compiler- or mode-qualified list keys
/// (`linux-libs`, `em-flags`, `linux-cross-libs`, `pkg-configs`, ...).
pub const QUALIFIED_SUFFIXES: &[&str] = &[
    "libs", "flags", "link", "defines", "extlibs", "depends", "configs",
];

/// A named build component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildModule {
    /// Module name, taken from the catalog key
    #[serde(skip)]
    pub name: String,

    /// Direct dependencies; replaced by the transitive closure on resolution
    #[serde(default)]
    pub depends: Vec<String>,

    /// Direct dependencies as declared, before closure and conditional merge
    #[serde(skip)]
    pub original_depends: Vec<String>,

    /// Dependencies only pulled in when already part of the build set
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditional_depends: Vec<String>,

    #[serde(default)]
    pub libs: Vec<String>,

    #[serde(default)]
    pub flags: Vec<String>,

    #[serde(default)]
    pub link: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub defines: Vec<String>,

    /// Third-party libraries this module needs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extlibs: Vec<String>,

    /// Platforms allowed to build this module (all when absent or empty)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platforms: Option<Vec<String>>,

    /// Environment variable enabling a conditional module when set to "1"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional_env: Option<String>,

    /// Documented environment switches and their defaults
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, i64>,

    /// Qualified list keys such as `linux-libs` or `em-link`
    #[serde(flatten)]
    pub qualified: BTreeMap<String, Vec<String>>,
}

impl BuildModule {
    /// Create an empty module with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        BuildModule {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder-style helper to set direct dependencies.
    pub fn with_depends<I, S>(mut self, depends: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends = depends.into_iter().map(Into::into).collect();
        self
    }

    /// Look up a list by key: a base key (`libs`) or a qualified one (`linux-libs`).
    pub fn list(&self, key: &str) -> &[String] {
        match key {
            "depends" => &self.depends,
            "conditional-depends" => &self.conditional_depends,
            "libs" => &self.libs,
            "flags" => &self.flags,
            "link" => &self.link,
            "defines" => &self.defines,
            "extlibs" => &self.extlibs,
            other => self
                .qualified
                .get(other)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
        }
    }

    /// Whether the module may be built on `platform`.
    pub fn supports_platform(&self, platform: &str) -> bool {
        match &self.platforms {
            Some(platforms) if !platforms.is_empty() => platforms.iter().any(|p| p == platform),
            _ => true,
        }
    }

    /// Reject qualified keys that do not end in a known list kind.
    pub fn validate(&self) -> Result<(), ResolveError> {
        for key in self.qualified.keys() {
            let known = key
                .rsplit_once('-')
                .map(|(_, suffix)| QUALIFIED_SUFFIXES.contains(&suffix))
                .unwrap_or(false);
            if !known {
                return Err(ResolveError::InvalidModuleKey {
                    module: self.name.clone(),
                    key: key.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_module_with_qualified_keys() {
        let module: BuildModule = toml::from_str(
            r#"
depends = ["util"]
libs = ["pthread"]
linux-libs = ["dl", "uuid"]
em-link = ["-sUSE_PTHREADS=1"]
conditional-env = "lua"
"#,
        )
        .unwrap();

        assert_eq!(module.depends, vec!["util"]);
        assert_eq!(module.list("linux-libs"), ["dl", "uuid"]);
        assert_eq!(module.list("em-link"), ["-sUSE_PTHREADS=1"]);
        assert!(module.list("windows-libs").is_empty());
        assert_eq!(module.conditional_env.as_deref(), Some("lua"));
        assert!(module.flags.is_empty());
    }

    #[test]
    fn test_validate_rejects_unknown_key() {
        let mut module: BuildModule = toml::from_str("linux-libz = [\"dl\"]\n").unwrap();
        module.name = "util".to_string();
        let err = module.validate().unwrap_err();
        assert!(matches!(
            err,
            ResolveError::InvalidModuleKey { ref key, .. } if key == "linux-libz"
        ));
    }

    #[test]
    fn test_non_list_value_fails_to_parse() {
        assert!(toml::from_str::<BuildModule>("linux-libs = 3\n").is_err());
    }

    #[test]
    fn test_supports_platform() {
        let mut module = BuildModule::new("py");
        assert!(module.supports_platform("windows"));

        module.platforms = Some(vec![]);
        assert!(module.supports_platform("windows"));

        module.platforms = Some(vec!["linux".to_string()]);
        assert!(module.supports_platform("linux"));
        assert!(!module.supports_platform("windows"));
    }
}
