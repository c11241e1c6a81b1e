//! Compatibility matrix export.

use crate::binder::matrix::BinderMatrix;
use crate::binder::report::CompatibilityReport;

/// Build the compatibility report for the built-in strategies, optionally
/// filtered to one source component type.
pub fn matrix_report(source_type: Option<&str>) -> CompatibilityReport {
    let matrix = BinderMatrix::with_builtin_strategies();
    let mut report = CompatibilityReport::from_matrix(&matrix);

    if let Some(source_type) = source_type {
        report.entries.retain(|e| e.source_type == source_type);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unfiltered_report_covers_every_builtin_strategy() {
        let report = matrix_report(None);
        assert_eq!(report.entries.len(), 4);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn filter_keeps_only_matching_source_type() {
        let report = matrix_report(Some("database"));
        assert!(report.entries.is_empty());

        let report = matrix_report(Some("compute"));
        assert_eq!(report.entries.len(), 4);
    }
}
