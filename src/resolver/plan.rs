//! BuildPlan - the resolved module set and its build order.
//!
//! Created once per invocation by [`crate::resolver::resolve_plan`] and
//! read-only afterwards.

use std::collections::BTreeMap;

use crate::core::arch::is_musl_builtin;
use crate::core::module::BuildModule;
use crate::core::target::Libc;

/// Resolved modules plus a valid build order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildPlan {
    modules: BTreeMap<String, BuildModule>,
    order: Vec<String>,
}

impl BuildPlan {
    /// Assemble a plan from closed modules and their order.
    pub(crate) fn new(modules: BTreeMap<String, BuildModule>, order: Vec<String>) -> Self {
        BuildPlan { modules, order }
    }

    /// Module names, dependencies first.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn get(&self, name: &str) -> Option<&BuildModule> {
        self.modules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Modules keyed by name.
    pub fn modules(&self) -> &BTreeMap<String, BuildModule> {
        &self.modules
    }

    /// Modules in build order.
    pub fn iter_ordered(&self) -> impl Iterator<Item = &BuildModule> {
        self.order.iter().filter_map(|name| self.modules.get(name))
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Link libraries for a module.
    ///
    /// With `with_deps`, the libs of each closed dependency follow the
    /// module's own, nearest dependency first. Libraries built into musl are
    /// dropped for musl targets.
    pub fn module_libs(&self, name: &str, with_deps: bool, libc: Libc) -> Vec<String> {
        let Some(module) = self.modules.get(name) else {
            return Vec::new();
        };

        let mut libs = module.libs.clone();
        if with_deps {
            for dep in &module.depends {
                if let Some(dep_module) = self.modules.get(dep) {
                    libs.extend(dep_module.libs.iter().cloned());
                }
            }
        }

        if libc == Libc::Musl {
            libs.retain(|lib| !is_musl_builtin(lib));
        }
        libs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> BuildPlan {
        let mut util = BuildModule::new("util");
        util.libs = vec!["pthread".to_string(), "uuid".to_string()];
        let mut net = BuildModule::new("net").with_depends(["util"]);
        net.libs = vec!["ssl".to_string()];
        let mut http = BuildModule::new("http").with_depends(["net", "util"]);
        http.libs = vec!["curl".to_string()];

        let modules = [util, net, http]
            .into_iter()
            .map(|m| (m.name.clone(), m))
            .collect();
        BuildPlan::new(
            modules,
            vec!["util".to_string(), "net".to_string(), "http".to_string()],
        )
    }

    #[test]
    fn test_iter_ordered() {
        let plan = plan();
        let names: Vec<_> = plan.iter_ordered().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["util", "net", "http"]);
    }

    #[test]
    fn test_module_libs_with_deps() {
        let plan = plan();
        assert_eq!(plan.module_libs("http", false, Libc::Gnu), ["curl"]);
        assert_eq!(
            plan.module_libs("http", true, Libc::Gnu),
            ["curl", "ssl", "pthread", "uuid"]
        );
    }

    #[test]
    fn test_module_libs_drops_musl_builtins() {
        let plan = plan();
        assert_eq!(plan.module_libs("http", true, Libc::Musl), ["curl", "ssl", "uuid"]);
        assert!(plan.module_libs("missing", true, Libc::Gnu).is_empty());
    }
}
