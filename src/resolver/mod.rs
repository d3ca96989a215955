//! Module dependency resolution.
//!
//! Turns the app catalog plus a requested subset into a [`BuildPlan`]:
//! selection, platform filtering, ordering, then dependency closure. The
//! resolver is pure and deterministic - environment lookups are passed in.

pub mod errors;
pub mod modules;
pub mod plan;

pub use errors::ResolveError;
pub use plan::BuildPlan;

use crate::core::app::AppConfig;
use modules::{add_with_depends, compute_build_order, filter_by_platform, resolve_dependencies};

/// What to resolve.
#[derive(Debug, Clone, Default)]
pub struct PlanRequest {
    /// Requested modules; the whole regular catalog when empty
    pub modules: Vec<String>,
    /// Conditional modules to add (`--with`)
    pub conditionals: Vec<String>,
    /// Active target platform
    pub platform: String,
}

/// A resolved plan and the modules dropped for the platform.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub plan: BuildPlan,
    pub removed: Vec<String>,
}

/// Resolve a build plan.
///
/// `env` answers environment lookups for `conditional-env` switches.
pub fn resolve_plan<F>(app: &AppConfig, request: &PlanRequest, env: F) -> Result<Resolution, ResolveError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut conditionals = request.conditionals.clone();
    for name in app.conditionals_from_env(env) {
        if !conditionals.contains(&name) {
            conditionals.push(name);
        }
    }

    let merged = app.merged_modules();

    let mut selected = if request.modules.is_empty() {
        let mut all = app.modules.clone();
        for (name, module) in all.iter_mut() {
            module.name = name.clone();
        }
        all
    } else {
        let catalog = if app.requests_conditional(&request.modules) {
            &merged
        } else {
            &app.modules
        };
        modules::select_subset(catalog, &request.modules)?
    };

    for name in &conditionals {
        if !app.conditional_modules.contains_key(name) {
            return Err(ResolveError::UnknownConditional {
                module: name.clone(),
            });
        }
        add_with_depends(&merged, std::slice::from_ref(name), &mut selected)?;
    }

    let removed = filter_by_platform(&mut selected, &request.platform);
    for name in &removed {
        tracing::warn!(
            "module '{}' cannot compile on platform: {}",
            name,
            request.platform
        );
    }

    let order = compute_build_order(&selected)?;
    resolve_dependencies(&mut selected, &order);

    tracing::debug!("resolved {} modules", selected.len());
    Ok(Resolution {
        plan: BuildPlan::new(selected, order),
        removed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixtures::sample_app;

    fn request(modules: &[&str]) -> PlanRequest {
        PlanRequest {
            modules: modules.iter().map(|s| s.to_string()).collect(),
            conditionals: Vec::new(),
            platform: "linux".to_string(),
        }
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_end_to_end_http() {
        let app = sample_app();
        let resolution = resolve_plan(&app, &request(&["http"]), no_env).unwrap();
        let plan = resolution.plan;

        assert!(!plan.contains("core"));
        assert_eq!(plan.order(), ["util", "net", "http"]);
        assert_eq!(plan.get("http").unwrap().depends, ["net", "util"]);
    }

    #[test]
    fn test_full_catalog_excludes_conditionals() {
        let app = sample_app();
        let plan = resolve_plan(&app, &request(&[]), no_env).unwrap().plan;
        assert!(plan.contains("core"));
        assert!(!plan.contains("lua"));
    }

    #[test]
    fn test_conditional_by_request_with_and_env() {
        let app = sample_app();

        let plan = resolve_plan(&app, &request(&["lua"]), no_env).unwrap().plan;
        assert!(plan.contains("lua"));

        let mut with = request(&["net"]);
        with.conditionals = vec!["lua".to_string()];
        let plan = resolve_plan(&app, &with, no_env).unwrap().plan;
        assert!(plan.contains("lua"));
        // core is a conditional dependency of lua but not selected
        assert_eq!(plan.get("lua").unwrap().depends, ["util"]);

        let plan = resolve_plan(&app, &request(&["net"]), |var| {
            (var == "lua").then(|| "1".to_string())
        })
        .unwrap()
        .plan;
        assert!(plan.contains("lua"));
    }

    #[test]
    fn test_unknown_conditional() {
        let app = sample_app();
        let mut with = request(&[]);
        with.conditionals = vec!["nope".to_string()];
        assert_eq!(
            resolve_plan(&app, &with, no_env).unwrap_err(),
            ResolveError::UnknownConditional {
                module: "nope".to_string()
            }
        );
    }

    #[test]
    fn test_platform_filter_runs_before_ordering() {
        let app = sample_app();
        let mut req = request(&["util"]);
        req.platform = "web".to_string();
        let resolution = resolve_plan(&app, &req, no_env).unwrap();
        assert_eq!(resolution.removed, ["util"]);
        assert!(resolution.plan.is_empty());
    }

    #[test]
    fn test_platform_filter_leaves_dangling_reference() {
        let app = sample_app();
        let mut req = request(&["http"]);
        req.platform = "web".to_string();
        assert!(matches!(
            resolve_plan(&app, &req, no_env),
            Err(ResolveError::UnknownModule { ref module, .. }) if module == "util"
        ));
    }
}
