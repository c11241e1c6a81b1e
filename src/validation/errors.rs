//! Validation error types and diagnostics.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// One structural schema violation, annotated with its location.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaViolation {
    /// JSON-pointer-style path to the offending value
    pub path: String,
    /// Human-readable description of the violation
    pub message: String,
    /// The offending value, when it exists in the tree
    pub value: Option<Value>,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// One cross-reference violation found by semantic validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceViolation {
    /// A `binds[].to` entry names a component that does not exist.
    DanglingBinding {
        component: String,
        component_index: usize,
        target: String,
        capability: String,
    },
    /// A `triggers[].to` entry names a component that does not exist.
    DanglingTrigger {
        component: String,
        component_index: usize,
        target: String,
        event_type: String,
    },
    /// Two components share the same name.
    DuplicateComponent {
        name: String,
        first_index: usize,
        duplicate_index: usize,
    },
    /// A governance suppression entry is missing or malformed.
    SuppressionField {
        index: usize,
        field: String,
        message: String,
    },
}

impl fmt::Display for ReferenceViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceViolation::DanglingBinding {
                component,
                component_index,
                target,
                capability,
            } => write!(
                f,
                "component `{}` (index {}) binds to unknown component `{}` via `{}`",
                component, component_index, target, capability
            ),
            ReferenceViolation::DanglingTrigger {
                component,
                component_index,
                target,
                event_type,
            } => write!(
                f,
                "component `{}` (index {}) subscribes to unknown component `{}` for `{}`",
                component, component_index, target, event_type
            ),
            ReferenceViolation::DuplicateComponent {
                name,
                first_index,
                duplicate_index,
            } => write!(
                f,
                "component name `{}` is declared more than once (indices {} and {})",
                name, first_index, duplicate_index
            ),
            ReferenceViolation::SuppressionField {
                index,
                field,
                message,
            } => write!(
                f,
                "governance.suppressions[{}].{}: {}",
                index, field, message
            ),
        }
    }
}

/// Terminal validation failure, tagged by the rejecting stage's kind.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest text is not well-formed.
    #[error("failed to parse manifest: {message}")]
    Parse { message: String },

    /// The manifest violates the master schema.
    #[error("manifest violates schema ({} violation(s))", violations.len())]
    Schema { violations: Vec<SchemaViolation> },

    /// Cross-references between manifest entries are broken.
    #[error("manifest has broken references ({} violation(s))", violations.len())]
    Reference { violations: Vec<ReferenceViolation> },
}

impl ManifestError {
    /// All violations as rendered strings, for the response's error list.
    pub fn render_list(&self) -> Vec<String> {
        match self {
            ManifestError::Parse { message } => vec![message.clone()],
            ManifestError::Schema { violations } => {
                violations.iter().map(ToString::to_string).collect()
            }
            ManifestError::Reference { violations } => {
                violations.iter().map(ToString::to_string).collect()
            }
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ManifestError::Parse { message } => {
                Diagnostic::error("manifest is not well-formed").with_context(message.clone())
            }
            ManifestError::Schema { violations } => {
                let mut diag = Diagnostic::error(format!(
                    "manifest violates schema ({} violation(s))",
                    violations.len()
                ));
                for violation in violations {
                    diag = diag.with_context(violation.to_string());
                }
                diag.with_suggestion(suggestions::SCHEMA_INVALID)
            }
            ManifestError::Reference { violations } => {
                let mut diag = Diagnostic::error(format!(
                    "manifest has broken references ({} violation(s))",
                    violations.len()
                ));
                for violation in violations {
                    diag = diag.with_context(violation.to_string());
                }
                diag.with_suggestion(suggestions::DANGLING_REFERENCE)
            }
        }
    }
}
