//! Compatibility report export.
//!
//! Renders the full binder matrix for documentation and introspection
//! tooling, as aligned text or JSON.

use anyhow::Result;
use serde::Serialize;

use super::matrix::BinderMatrix;
use super::strategy::CompatibilityEntry;

/// The exported compatibility report.
#[derive(Debug, Serialize)]
pub struct CompatibilityReport {
    pub entries: Vec<CompatibilityEntry>,
    /// Consistency warnings found while building the report
    pub warnings: Vec<String>,
}

impl CompatibilityReport {
    /// Build a report from a matrix, running the consistency check.
    pub fn from_matrix(matrix: &BinderMatrix) -> Self {
        let consistency = matrix.validate_matrix();
        CompatibilityReport {
            entries: matrix.full_compatibility_matrix(),
            warnings: consistency.warnings,
        }
    }

    /// Render as aligned text columns.
    pub fn format_text(&self) -> String {
        let mut out = String::new();
        let source_width = self.column_width(|e| &e.source_type, "SOURCE");
        let target_width = self.column_width(|e| &e.target_type, "TARGET");
        let capability_width = self.column_width(|e| &e.capability, "CAPABILITY/EVENT");

        out.push_str(&format!(
            "{:<source_width$}  {:<target_width$}  {:<capability_width$}  DESCRIPTION\n",
            "SOURCE", "TARGET", "CAPABILITY/EVENT"
        ));
        for entry in &self.entries {
            out.push_str(&format!(
                "{:<source_width$}  {:<target_width$}  {:<capability_width$}  {}\n",
                entry.source_type, entry.target_type, entry.capability, entry.description
            ));
        }

        for warning in &self.warnings {
            out.push_str(&format!("\nwarning: {}", warning));
        }
        out
    }

    /// Render as pretty-printed JSON.
    pub fn format_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn column_width(&self, field: impl Fn(&CompatibilityEntry) -> &str, header: &str) -> usize {
        self.entries
            .iter()
            .map(|e| field(e).len())
            .chain([header.len()])
            .max()
            .unwrap_or(header.len())
    }
}
