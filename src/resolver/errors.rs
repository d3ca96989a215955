//! Resolution error types and diagnostics.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Error while turning the module catalog into a build plan.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no such module: `{module}`")]
    UnknownModule {
        module: String,
        /// Module whose `depends` named it; `None` when requested directly
        required_by: Option<String>,
        suggestions: Vec<String>,
    },

    #[error("maximum iterations reached to get modules build order")]
    DependencyCycle {
        /// Partial order reached before giving up
        order: Vec<String>,
        /// Each unplaced module and its direct dependencies not yet placed
        unresolved: BTreeMap<String, Vec<String>>,
        /// One cycle among the unplaced modules, when one could be isolated
        cycle: Vec<String>,
    },

    #[error("conditional module shares a name with a module: `{module}`")]
    ConditionalNameClash { module: String },

    #[error("app does not have a conditional module named `{module}`")]
    UnknownConditional { module: String },

    #[error("module `{module}` has an unknown key `{key}`")]
    InvalidModuleKey { module: String, key: String },
}

impl ResolveError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ResolveError::UnknownModule {
                module,
                required_by,
                suggestions: similar,
            } => {
                let mut diag = Diagnostic::error(format!("no such module: `{}`", module));

                match required_by {
                    Some(parent) => {
                        diag = diag.with_context(format!("required by module `{}`", parent));
                    }
                    None => {
                        diag = diag.with_context("requested on the command line");
                    }
                }

                if !similar.is_empty() {
                    diag = diag.with_context(format!("did you mean: {}?", similar.join(", ")));
                }

                diag.with_suggestion(suggestions::UNKNOWN_MODULE)
            }

            ResolveError::DependencyCycle {
                order,
                unresolved,
                cycle,
            } => {
                let mut diag = Diagnostic::error("module order error: dependency cycle");

                diag = diag.with_context(format!(
                    "maximum module order completion: [{}]",
                    order.join(", ")
                ));

                for (module, missing) in unresolved {
                    diag = diag.with_context(format!(
                        "module[{}] waits on -> [{}]",
                        module,
                        missing.join(", ")
                    ));
                }

                if !cycle.is_empty() {
                    let mut path = cycle.clone();
                    path.push(cycle[0].clone());
                    diag = diag.with_context(format!("cycle: {}", path.join(" -> ")));
                }

                diag.with_suggestion("Break the cycle by removing or restructuring `depends`")
                    .with_suggestion("Check your app configuration")
            }

            ResolveError::ConditionalNameClash { module } => Diagnostic::error(format!(
                "conditional module `{}` shares a name with a module",
                module
            ))
            .with_suggestion("Rename one of the two modules in Crossport.toml"),

            ResolveError::UnknownConditional { module } => Diagnostic::error(format!(
                "app does not have a conditional module named `{}`",
                module
            ))
            .with_suggestion("Declare it under [conditional-modules] or drop `--with`"),

            ResolveError::InvalidModuleKey { module, key } => Diagnostic::error(format!(
                "module `{}` has an unknown key `{}`",
                module, key
            ))
            .with_context(
                "qualified keys must end in -libs, -flags, -link, -defines, -extlibs, -depends or -configs",
            )
            .with_suggestion("Check the key for typos"),
        }
    }
}

/// Catalog names close to `name`, for "did you mean" hints.
///
/// A candidate matches when one name is a prefix of the other, or when the
/// two are within a small edit distance (transpositions count as one edit).
pub fn similar_names<'a, I>(name: &str, candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let lower = name.to_lowercase();
    let max_edits = if lower.chars().count() <= 3 { 1 } else { 2 };
    candidates
        .into_iter()
        .filter(|candidate| {
            let other = candidate.to_lowercase();
            other != lower
                && (other.starts_with(&lower)
                    || lower.starts_with(&other)
                    || (lower.len() > 2 && other.contains(&lower))
                    || edit_distance(&lower, &other) <= max_edits)
        })
        .cloned()
        .collect()
}

/// Optimal string alignment distance between `a` and `b`.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let width = b.len() + 1;
    let mut d = vec![0usize; (a.len() + 1) * width];

    for i in 0..=a.len() {
        d[i * width] = i;
    }
    for j in 0..=b.len() {
        d[j] = j;
    }
    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            let mut best = (d[(i - 1) * width + j] + 1)
                .min(d[i * width + j - 1] + 1)
                .min(d[(i - 1) * width + j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                best = best.min(d[(i - 2) * width + j - 2] + 1);
            }
            d[i * width + j] = best;
        }
    }
    d[a.len() * width + b.len()]
}
