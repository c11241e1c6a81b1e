//! The binder matrix: an ordered registry of binding and trigger strategies.
//!
//! Lookup is first-match: the first registered strategy whose `can_handle`
//! returns true wins. Later ports must not switch to best-match; registration
//! order is the documented tie-break. The matrix is populated once at
//! start-up and read-only afterwards.

use super::strategies::{
    ComputeToDatabaseStrategy, ComputeToQueueStrategy, ComputeToSecretStrategy,
    QueueMessageTriggerStrategy,
};
use super::strategy::{BinderStrategy, CompatibilityEntry, TriggerStrategy};

/// Result of a matrix consistency check.
#[derive(Debug, Default)]
pub struct MatrixReport {
    /// Structural problems (empty source/target/capability)
    pub errors: Vec<String>,
    /// Duplicate entries and missing descriptions
    pub warnings: Vec<String>,
}

impl MatrixReport {
    pub fn is_consistent(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Registry mapping (source type, capability) to a binding strategy and
/// (source type, target type, event type) to a trigger strategy.
pub struct BinderMatrix {
    binders: Vec<Box<dyn BinderStrategy>>,
    triggers: Vec<Box<dyn TriggerStrategy>>,
}

impl BinderMatrix {
    /// Create an empty matrix.
    pub fn new() -> Self {
        BinderMatrix {
            binders: Vec::new(),
            triggers: Vec::new(),
        }
    }

    /// Matrix with every built-in strategy registered.
    pub fn with_builtin_strategies() -> Self {
        let mut matrix = BinderMatrix::new();
        matrix.register_binding_strategy(Box::new(ComputeToDatabaseStrategy));
        matrix.register_binding_strategy(Box::new(ComputeToQueueStrategy));
        matrix.register_binding_strategy(Box::new(ComputeToSecretStrategy));
        matrix.register_trigger_strategy(Box::new(QueueMessageTriggerStrategy));
        matrix
    }

    /// Append a binding strategy. Registration order is the tie-break.
    pub fn register_binding_strategy(&mut self, strategy: Box<dyn BinderStrategy>) {
        tracing::debug!("registering binding strategy {}", strategy.name());
        self.binders.push(strategy);
    }

    /// Append a trigger strategy. Registration order is the tie-break.
    pub fn register_trigger_strategy(&mut self, strategy: Box<dyn TriggerStrategy>) {
        tracing::debug!("registering trigger strategy {}", strategy.name());
        self.triggers.push(strategy);
    }

    /// First registered binding strategy handling the pair, if any.
    ///
    /// Absence of a match is a normal outcome; the orchestration engine
    /// decides how to react.
    pub fn find_binding_strategy(
        &self,
        source_type: &str,
        capability: &str,
    ) -> Option<&dyn BinderStrategy> {
        self.binders
            .iter()
            .find(|s| s.can_handle(source_type, capability))
            .map(|s| s.as_ref())
    }

    /// First registered trigger strategy handling the triple, if any.
    pub fn find_trigger_strategy(
        &self,
        source_type: &str,
        target_type: &str,
        event_type: &str,
    ) -> Option<&dyn TriggerStrategy> {
        self.triggers
            .iter()
            .find(|s| s.can_handle(source_type, target_type, event_type))
            .map(|s| s.as_ref())
    }

    /// Every supported interaction for one source type.
    pub fn supported_bindings(&self, source_type: &str) -> Vec<CompatibilityEntry> {
        self.full_compatibility_matrix()
            .into_iter()
            .filter(|entry| entry.source_type == source_type)
            .collect()
    }

    /// Every interaction the matrix supports, bindings then triggers, in
    /// registration order.
    pub fn full_compatibility_matrix(&self) -> Vec<CompatibilityEntry> {
        let mut entries = Vec::new();
        for strategy in &self.binders {
            entries.extend(strategy.compatibility_matrix());
        }
        for strategy in &self.triggers {
            entries.extend(strategy.compatibility_matrix());
        }
        entries
    }

    /// Check matrix consistency.
    ///
    /// Empty source/target/capability fields are errors; duplicate entries
    /// and missing descriptions are warnings.
    pub fn validate_matrix(&self) -> MatrixReport {
        let mut report = MatrixReport::default();
        let mut seen: Vec<(String, String, String)> = Vec::new();

        for entry in self.full_compatibility_matrix() {
            if entry.source_type.is_empty()
                || entry.target_type.is_empty()
                || entry.capability.is_empty()
            {
                report.errors.push(format!(
                    "matrix entry has empty fields: source=`{}` target=`{}` capability=`{}`",
                    entry.source_type, entry.target_type, entry.capability
                ));
                continue;
            }

            let key = (
                entry.source_type.clone(),
                entry.target_type.clone(),
                entry.capability.clone(),
            );
            if seen.contains(&key) {
                report
                    .warnings
                    .push(format!("duplicate matrix entry: {}", entry));
            } else {
                seen.push(key);
            }

            if entry.description.is_empty() {
                report
                    .warnings
                    .push(format!("matrix entry missing description: {}", entry));
            }
        }

        report
    }
}

impl Default for BinderMatrix {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::capability::names;
    use crate::test_support::RecordingStrategy;

    #[test]
    fn builtin_matrix_finds_database_binding() {
        let matrix = BinderMatrix::with_builtin_strategies();
        let strategy = matrix
            .find_binding_strategy("compute", names::DATABASE_RDS)
            .unwrap();
        assert_eq!(strategy.name(), "compute-to-database");
    }

    #[test]
    fn lookup_misses_return_none_not_error() {
        let matrix = BinderMatrix::with_builtin_strategies();
        assert!(matrix
            .find_binding_strategy("database", names::QUEUE_SQS)
            .is_none());
        assert!(matrix
            .find_binding_strategy("compute", "cache:redis")
            .is_none());
    }

    #[test]
    fn first_registered_strategy_wins() {
        let first = RecordingStrategy::new("first", "compute", names::DATABASE_RDS);
        let second = RecordingStrategy::new("second", "compute", names::DATABASE_RDS);

        let mut matrix = BinderMatrix::new();
        matrix.register_binding_strategy(Box::new(first));
        matrix.register_binding_strategy(Box::new(second));

        let found = matrix
            .find_binding_strategy("compute", names::DATABASE_RDS)
            .unwrap();
        assert_eq!(found.name(), "first");
    }

    #[test]
    fn supported_bindings_filters_by_source_type() {
        let matrix = BinderMatrix::with_builtin_strategies();
        let compute = matrix.supported_bindings("compute");
        assert_eq!(compute.len(), 4); // three bindings plus one trigger
        assert!(matrix.supported_bindings("database").is_empty());
    }

    #[test]
    fn builtin_matrix_is_consistent() {
        let report = BinderMatrix::with_builtin_strategies().validate_matrix();
        assert!(report.is_consistent());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn duplicate_registration_is_warning_not_error() {
        let mut matrix = BinderMatrix::new();
        matrix.register_binding_strategy(Box::new(RecordingStrategy::new(
            "a",
            "compute",
            names::DATABASE_RDS,
        )));
        matrix.register_binding_strategy(Box::new(RecordingStrategy::new(
            "b",
            "compute",
            names::DATABASE_RDS,
        )));

        let report = matrix.validate_matrix();
        assert!(report.is_consistent());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("duplicate"));
    }
}
