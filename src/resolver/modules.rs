//! Module selection, ordering and dependency closure.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::core::module::BuildModule;
use crate::resolver::errors::{similar_names, ResolveError};

/// Module table keyed by name.
pub type ModuleMap = BTreeMap<String, BuildModule>;

/// Select the requested modules and, recursively, their direct `depends`.
///
/// `conditional-depends` are not followed.
pub fn select_subset(catalog: &ModuleMap, requested: &[String]) -> Result<ModuleMap, ResolveError> {
    let mut selected = ModuleMap::new();
    add_with_depends(catalog, requested, &mut selected)?;
    Ok(selected)
}

/// Add `names` and their direct dependencies from `catalog` to `selected`.
pub fn add_with_depends(
    catalog: &ModuleMap,
    names: &[String],
    selected: &mut ModuleMap,
) -> Result<(), ResolveError> {
    let mut stack: Vec<(String, Option<String>)> =
        names.iter().rev().map(|n| (n.clone(), None)).collect();

    while let Some((name, required_by)) = stack.pop() {
        if selected.contains_key(&name) {
            continue;
        }
        let module = catalog.get(&name).ok_or_else(|| ResolveError::UnknownModule {
            suggestions: similar_names(&name, catalog.keys()),
            module: name.clone(),
            required_by: required_by.clone(),
        })?;

        let mut module = module.clone();
        module.name = name.clone();
        for dep in module.depends.iter().rev() {
            stack.push((dep.clone(), Some(name.clone())));
        }
        selected.insert(name, module);
    }

    Ok(())
}

/// Drop modules that cannot build on `platform`; returns the dropped names.
pub fn filter_by_platform(selected: &mut ModuleMap, platform: &str) -> Vec<String> {
    let removed: Vec<String> = selected
        .values()
        .filter(|m| !m.supports_platform(platform))
        .map(|m| m.name.clone())
        .collect();
    for name in &removed {
        selected.remove(name);
    }
    removed
}

/// Order modules so every module follows its direct dependencies.
///
/// Fixed-point scan over the (name-sorted) module set, bounded by
/// `|selected|²` passes. A dependency missing from the set is reported as
/// an unknown module rather than left to exhaust the bound.
pub fn compute_build_order(selected: &ModuleMap) -> Result<Vec<String>, ResolveError> {
    for (name, module) in selected {
        if let Some(missing) = module.depends.iter().find(|d| !selected.contains_key(*d)) {
            return Err(ResolveError::UnknownModule {
                module: missing.clone(),
                required_by: Some(name.clone()),
                suggestions: similar_names(missing, selected.keys()),
            });
        }
    }

    let max_passes = selected.len().saturating_mul(selected.len());
    let mut order: Vec<String> = Vec::with_capacity(selected.len());
    let mut placed: BTreeSet<&str> = BTreeSet::new();
    let mut passes = 0usize;

    while order.len() != selected.len() {
        let before = order.len();
        for (name, module) in selected {
            if placed.contains(name.as_str()) {
                continue;
            }
            if module.depends.iter().all(|d| placed.contains(d.as_str())) {
                placed.insert(name);
                order.push(name.clone());
            }
        }
        passes += 1;

        // A pass that places nothing can never make progress again.
        if passes > max_passes || order.len() == before {
            return Err(cycle_error(selected, order, &placed));
        }
    }

    tracing::debug!("module build order: {:?} ({} passes)", order, passes);
    Ok(order)
}

fn cycle_error(selected: &ModuleMap, order: Vec<String>, placed: &BTreeSet<&str>) -> ResolveError {
    let unresolved: BTreeMap<String, Vec<String>> = selected
        .iter()
        .filter(|(name, _)| !placed.contains(name.as_str()))
        .map(|(name, module)| {
            let waiting = module
                .depends
                .iter()
                .filter(|d| !placed.contains(d.as_str()))
                .cloned()
                .collect();
            (name.clone(), waiting)
        })
        .collect();

    let cycle = find_cycle(&unresolved);
    ResolveError::DependencyCycle {
        order,
        unresolved,
        cycle,
    }
}

/// Isolate one cycle among the unplaced modules for diagnostics.
fn find_cycle(unresolved: &BTreeMap<String, Vec<String>>) -> Vec<String> {
    let mut graph: DiGraph<&str, ()> = DiGraph::new();
    let mut nodes: HashMap<&str, NodeIndex> = HashMap::new();

    for name in unresolved.keys() {
        nodes.insert(name.as_str(), graph.add_node(name.as_str()));
    }
    for (name, deps) in unresolved {
        for dep in deps {
            if let (Some(&from), Some(&to)) = (nodes.get(name.as_str()), nodes.get(dep.as_str())) {
                graph.add_edge(from, to, ());
            }
        }
    }

    tarjan_scc(&graph)
        .into_iter()
        .find(|scc| {
            scc.len() > 1 || scc.first().is_some_and(|&n| graph.contains_edge(n, n))
        })
        .map(|scc| {
            let mut names: Vec<String> = scc.iter().map(|&n| graph[n].to_string()).collect();
            names.sort();
            names
        })
        .unwrap_or_default()
}

/// Close every module's `depends` over the selected set.
///
/// For each module in `order`: snapshot the declared list into
/// `original_depends`, add `conditional-depends` entries present in
/// `selected`, then extend breadth-first with the dependencies of each
/// dependency. The closed list is nearest-first, has no duplicates, and
/// never contains the module itself.
pub fn resolve_dependencies(selected: &mut ModuleMap, order: &[String]) {
    let direct: HashMap<String, Vec<String>> = selected
        .iter()
        .map(|(name, module)| {
            let mut deps = module.depends.clone();
            for cond in &module.conditional_depends {
                if selected.contains_key(cond) && !deps.contains(cond) {
                    deps.push(cond.clone());
                }
            }
            (name.clone(), deps)
        })
        .collect();

    for name in order {
        let closed = closure(name, &direct);
        if let Some(module) = selected.get_mut(name) {
            module.original_depends = module.depends.clone();
            module.depends = closed;
        }
    }
}

fn closure(name: &str, direct: &HashMap<String, Vec<String>>) -> Vec<String> {
    let mut closed: Vec<String> = Vec::new();
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    seen.insert(name);

    let mut queue: VecDeque<&str> = VecDeque::new();
    queue.push_back(name);

    while let Some(current) = queue.pop_front() {
        let Some(deps) = direct.get(current) else {
            continue;
        };
        for dep in deps {
            if seen.insert(dep.as_str()) {
                closed.push(dep.clone());
                queue.push_back(dep.as_str());
            }
        }
    }

    closed
}
