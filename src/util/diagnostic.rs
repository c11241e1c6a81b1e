//! User-friendly diagnostic messages.
//!
//! Every fatal error surfaced to the terminal should carry its root cause,
//! the manifest location involved, and at least one suggested fix.

use std::fmt;
use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when no manifest file is found.
    pub const NO_MANIFEST: &str = "help: Create a `service.yml` at the project root";

    /// Suggestion when a binding has no matching strategy.
    pub const UNSUPPORTED_BINDING: &str = "help: Run `stratus matrix` to see supported bindings";

    /// Suggestion when a component reference dangles.
    pub const DANGLING_REFERENCE: &str =
        "help: Check `binds[].to` and `triggers[].to` against the declared component names";

    /// Suggestion when schema validation rejects the manifest.
    pub const SCHEMA_INVALID: &str =
        "help: Run `stratus validate <manifest>` for the full violation list";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
    Help,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
            Severity::Help => write!(f, "help"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related location (file path)
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Error,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Warning,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
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

    /// Add a file location.
    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity_str = if color {
            match self.severity {
                Severity::Error => "\x1b[1;31merror\x1b[0m",
                Severity::Warning => "\x1b[1;33mwarning\x1b[0m",
                Severity::Note => "\x1b[1;36mnote\x1b[0m",
                Severity::Help => "\x1b[1;32mhelp\x1b[0m",
            }
        } else {
            match self.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
                Severity::Note => "note",
                Severity::Help => "help",
            }
        };

        output.push_str(&format!("{}: {}\n", severity_str, self.message));

        if let Some(ref path) = self.location {
            output.push_str(&format!("  --> {}\n", path.display()));
        }

        for ctx in &self.context {
            output.push_str(&format!("  -> {}\n", ctx));
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

/// Unsupported binding error with actionable help.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("unsupported binding from `{source_type}` to `{target_type}` via `{capability}`")]
#[diagnostic(
    code(stratus::bind::unsupported),
    help("Run `stratus matrix` to list every supported (source, capability) pair")
)]
pub struct UnsupportedBindingDiagnostic {
    pub source_type: String,
    pub target_type: String,
    pub capability: String,
}

/// Dangling component reference error.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("component `{component}` references unknown component `{target}`")]
#[diagnostic(
    code(stratus::manifest::dangling_reference),
    help("Declare `{target}` in the manifest or fix the `binds[].to` entry")
)]
pub struct DanglingReferenceDiagnostic {
    pub component: String,
    pub target: String,
}

/// Manifest not found error.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("no service manifest found")]
#[diagnostic(code(stratus::manifest::not_found))]
pub struct ManifestNotFoundDiagnostic {
    #[help]
    pub searched: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_includes_context_and_suggestions() {
        let diag = Diagnostic::error("binding failed")
            .with_context("source: api (compute)")
            .with_suggestion("Run `stratus matrix`");

        let out = diag.format(false);
        assert!(out.starts_with("error: binding failed"));
        assert!(out.contains("source: api (compute)"));
        assert!(out.contains("1. Run `stratus matrix`"));
    }

    #[test]
    fn warning_severity_renders_prefix() {
        let diag = Diagnostic::warning("duplicate matrix entry");
        assert!(diag.format(false).starts_with("warning: "));
    }
}
