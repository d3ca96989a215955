//! User-friendly diagnostic messages.
//!
//! Every fatal error names the stage that failed, the offending input,
//! and what the user can do about it.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when no app catalog is found.
    pub const NO_CATALOG: &str = "help: Create a Crossport.toml at the project root";

    /// Suggestion when a module name is unknown.
    pub const UNKNOWN_MODULE: &str = "help: Run `crossport plan` to list the available modules";

    /// Suggestion when the packaging engine is missing.
    pub const DEPLOY_VCPKG: &str =
        "help: Clone and bootstrap vcpkg into .vcpkg/ or set VCPKG_ROOT / VCPKG_PATH";

    /// Suggestion when the engine install fails.
    pub const INSTALL_FAILED: &str = "help: Re-run with `--verbose` to see the vcpkg command line";
}

/// An error message with context lines and suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let label = if color { "\x1b[1;31merror\x1b[0m" } else { "error" };
        output.push_str(&format!("{}: {}\n", label, self.message));

        for ctx in &self.context {
            output.push_str(&format!("  → {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            output.push('\n');
            let help_prefix = if color {
                "\x1b[1;32mhelp\x1b[0m"
            } else {
                "help"
            };
            output.push_str(&format!("{}: consider:\n", help_prefix));
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// Syntax or schema error in `Crossport.toml`, rendered with the offending span.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("failed to parse app catalog: {message}")]
#[diagnostic(
    code(crossport::catalog::parse),
    help("Module entries accept list keys only (depends, libs, <platform>-libs, ...)")
)]
pub struct ConfigParseError {
    pub message: String,
    #[source_code]
    pub src: NamedSource<String>,
    #[label("here")]
    pub span: Option<SourceSpan>,
}

impl ConfigParseError {
    /// Build from a `toml` deserialization error and the source it came from.
    pub fn from_toml(name: &str, source: &str, err: &toml::de::Error) -> Self {
        ConfigParseError {
            message: err.message().to_string(),
            src: NamedSource::new(name, source.to_string()),
            span: err.span().map(SourceSpan::from),
        }
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}
