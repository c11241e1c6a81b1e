//! The orchestration engine: one end-to-end resolution pass.
//!
//! Phase one synthesizes every component in manifest order, so a binding
//! may reference a capability registered by a later component. Phase two
//! first plans every binding and trigger (target lookup, strategy lookup)
//! and only then executes them, which keeps the pass all-or-nothing: an
//! unsupported binding anywhere means zero strategies run.

use std::collections::BTreeSet;
use std::time::Instant;

use thiserror::Error;

use crate::binder::matrix::BinderMatrix;
use crate::binder::strategy::{BindingContext, BindingOutcome, StrategyError};
use crate::config::layers::MaterializedLayers;
use crate::config::resolver::{resolve_with_layers, ConfigResolutionError, ResolvedConfig};
use crate::core::component::{BindingDirective, TriggerDirective};
use crate::core::context::{ComponentContext, ConfigBuilderContext};
use crate::core::manifest::ServiceManifest;
use crate::core::synth::{SynthesizedComponent, SynthesizerSet};
use crate::util::diagnostic::{suggestions, Diagnostic};

use super::result::{
    BindingKind, BindingRecord, ComponentRecord, OrchestrationResult,
};

/// Failure of an orchestration pass.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("component `{component}` failed config resolution")]
    Config {
        component: String,
        #[source]
        source: ConfigResolutionError,
    },

    #[error("{} component(s) failed config resolution", failures.len())]
    ConfigMultiple {
        failures: Vec<(String, ConfigResolutionError)>,
    },

    #[error("component `{component}` failed synthesis: {message}")]
    Synth { component: String, message: String },

    #[error("component name `{name}` is declared more than once")]
    DuplicateComponent { name: String },

    #[error("component `{component}` references unknown component `{target}`")]
    UnknownComponent { component: String, target: String },

    #[error("unsupported binding from `{source_type}` to `{target_type}` via `{capability}`")]
    UnsupportedBinding {
        source_type: String,
        target_type: String,
        capability: String,
    },

    #[error("unsupported trigger from `{target_type}` to `{source_type}` for `{event_type}`")]
    UnsupportedTrigger {
        source_type: String,
        target_type: String,
        event_type: String,
    },

    #[error("binding `{binding}` failed")]
    Strategy {
        binding: String,
        #[source]
        source: StrategyError,
    },

    #[error("binder matrix is inconsistent")]
    InconsistentMatrix { errors: Vec<String> },
}

impl OrchestrationError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            OrchestrationError::Config { component, source } => source
                .to_diagnostic()
                .with_context(format!("while resolving component `{}`", component)),

            OrchestrationError::ConfigMultiple { failures } => {
                let mut diag = Diagnostic::error(format!(
                    "{} component(s) failed config resolution",
                    failures.len()
                ));
                for (component, err) in failures {
                    diag = diag.with_context(format!("`{}`: {}", component, err));
                }
                diag
            }

            OrchestrationError::Synth { component, message } => {
                Diagnostic::error(format!("component `{}` failed synthesis", component))
                    .with_context(message.clone())
            }

            OrchestrationError::DuplicateComponent { name } => Diagnostic::error(format!(
                "component name `{}` is declared more than once",
                name
            ))
            .with_context("directives resolve names to the first occurrence only"),

            OrchestrationError::UnknownComponent { component, target } => {
                Diagnostic::error(format!(
                    "component `{}` references unknown component `{}`",
                    component, target
                ))
                .with_suggestion(suggestions::DANGLING_REFERENCE)
            }

            OrchestrationError::UnsupportedBinding {
                source_type,
                target_type,
                capability,
            } => Diagnostic::error(format!(
                "unsupported binding from `{}` to `{}` via `{}`",
                source_type, target_type, capability
            ))
            .with_suggestion(suggestions::UNSUPPORTED_BINDING),

            OrchestrationError::UnsupportedTrigger {
                source_type,
                target_type,
                event_type,
            } => Diagnostic::error(format!(
                "unsupported trigger: `{}` events from `{}` cannot invoke `{}`",
                event_type, target_type, source_type
            ))
            .with_suggestion(suggestions::UNSUPPORTED_BINDING),

            OrchestrationError::Strategy { binding, source } => source
                .to_diagnostic()
                .with_context(format!("while applying `{}`", binding)),

            OrchestrationError::InconsistentMatrix { errors } => {
                let mut diag = Diagnostic::error("binder matrix is inconsistent");
                for error in errors {
                    diag = diag.with_context(error.clone());
                }
                diag
            }
        }
    }
}

/// Knobs for one orchestration pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrchestrationOptions {
    /// Collect every component's config failure before reporting, instead
    /// of aborting on the first.
    pub keep_going: bool,
}

enum PlannedKind<'m> {
    Bind(&'m BindingDirective),
    Trigger(&'m TriggerDirective),
}

struct PlannedInteraction<'m> {
    source: usize,
    target: usize,
    kind: PlannedKind<'m>,
}

/// Drives one resolution pass over a hydrated manifest.
pub struct Orchestrator<'a> {
    matrix: &'a BinderMatrix,
    synthesizers: &'a SynthesizerSet,
}

impl<'a> Orchestrator<'a> {
    pub fn new(matrix: &'a BinderMatrix, synthesizers: &'a SynthesizerSet) -> Self {
        Orchestrator {
            matrix,
            synthesizers,
        }
    }

    /// Run the full pass: synthesize, plan interactions, execute, aggregate.
    pub fn run(
        &self,
        ctx: &ComponentContext,
        manifest: &ServiceManifest,
        layers: &MaterializedLayers,
        options: OrchestrationOptions,
    ) -> Result<OrchestrationResult, OrchestrationError> {
        let started = Instant::now();

        let consistency = self.matrix.validate_matrix();
        if !consistency.is_consistent() {
            return Err(OrchestrationError::InconsistentMatrix {
                errors: consistency.errors,
            });
        }
        let warnings = consistency.warnings;

        // Stage 4 rejects duplicate names; defend independently, since
        // target lookups resolve to the first occurrence only.
        let mut seen = BTreeSet::new();
        for spec in &manifest.components {
            if !seen.insert(spec.name.as_str()) {
                return Err(OrchestrationError::DuplicateComponent {
                    name: spec.name.clone(),
                });
            }
        }

        let (mut components, configs) = self.synthesize_all(ctx, manifest, layers, options)?;

        let planned = self.plan_interactions(manifest, &components)?;

        let mut bindings_applied = Vec::new();
        for interaction in planned {
            let record =
                self.execute_interaction(ctx, &interaction, manifest, &mut components)?;
            bindings_applied.push(record);
        }

        let component_records: Vec<ComponentRecord> = manifest
            .components
            .iter()
            .zip(components.iter())
            .zip(configs.iter())
            .map(|((spec, synthesized), config)| ComponentRecord {
                name: spec.name.clone(),
                component_type: spec.component_type.clone(),
                config: config.as_value().clone(),
                capabilities: synthesized.capabilities.clone(),
                environment: synthesized.environment.clone(),
            })
            .collect();

        let duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            "orchestration pass complete: {} component(s), {} binding(s), {}ms",
            component_records.len(),
            bindings_applied.len(),
            duration_ms
        );

        Ok(OrchestrationResult {
            service: manifest.service.clone(),
            environment: ctx.environment.clone(),
            compliance_framework: ctx.compliance_framework,
            manifest_digest: None,
            components_processed: component_records.len(),
            components: component_records,
            bindings_applied,
            warnings,
            duration_ms,
        })
    }

    /// Phase one: resolve config and synthesize every component, in
    /// manifest order.
    fn synthesize_all(
        &self,
        ctx: &ComponentContext,
        manifest: &ServiceManifest,
        layers: &MaterializedLayers,
        options: OrchestrationOptions,
    ) -> Result<(Vec<SynthesizedComponent>, Vec<ResolvedConfig>), OrchestrationError> {
        let mut components = Vec::new();
        let mut configs = Vec::new();
        let mut failures: Vec<(String, ConfigResolutionError)> = Vec::new();

        for spec in &manifest.components {
            let builder = ConfigBuilderContext::new(ctx, spec);
            let layer_set = layers.for_type(&spec.component_type);

            let config = match resolve_with_layers(&builder, &layer_set) {
                Ok(config) => config,
                Err(err) if options.keep_going => {
                    tracing::warn!("component {} failed config resolution", spec.name);
                    failures.push((spec.name.clone(), err));
                    continue;
                }
                Err(err) => {
                    return Err(OrchestrationError::Config {
                        component: spec.name.clone(),
                        source: err,
                    });
                }
            };

            let synthesizer = self
                .synthesizers
                .for_type(&spec.component_type)
                .ok_or_else(|| OrchestrationError::Synth {
                    component: spec.name.clone(),
                    message: format!(
                        "no synthesizer registered for type `{}`",
                        spec.component_type
                    ),
                })?;

            let capabilities = synthesizer.synth(ctx, spec, &config).map_err(|err| {
                OrchestrationError::Synth {
                    component: spec.name.clone(),
                    message: format!("{:#}", err),
                }
            })?;

            tracing::debug!(
                "synthesized {} ({}) exposing {} capability(ies)",
                spec.name,
                spec.component_type,
                capabilities.len()
            );

            let mut synthesized =
                SynthesizedComponent::new(spec.name.clone(), spec.component_type.clone());
            synthesized.capabilities = capabilities;
            components.push(synthesized);
            configs.push(config);
        }

        if !failures.is_empty() {
            return Err(OrchestrationError::ConfigMultiple { failures });
        }

        Ok((components, configs))
    }

    /// Phase two, planning half: resolve every directive's target and
    /// strategy before any strategy runs.
    fn plan_interactions<'m>(
        &self,
        manifest: &'m ServiceManifest,
        components: &[SynthesizedComponent],
    ) -> Result<Vec<PlannedInteraction<'m>>, OrchestrationError> {
        let index_of = |name: &str| components.iter().position(|c| c.name == name);
        let mut planned = Vec::new();

        for (source, spec) in manifest.components.iter().enumerate() {
            for directive in &spec.binds {
                // Stage 4 should have caught this; defend independently.
                let target = index_of(&directive.to).ok_or_else(|| {
                    OrchestrationError::UnknownComponent {
                        component: spec.name.clone(),
                        target: directive.to.clone(),
                    }
                })?;

                if self
                    .matrix
                    .find_binding_strategy(&spec.component_type, &directive.capability)
                    .is_none()
                {
                    return Err(OrchestrationError::UnsupportedBinding {
                        source_type: spec.component_type.clone(),
                        target_type: components[target].component_type.clone(),
                        capability: directive.capability.clone(),
                    });
                }

                planned.push(PlannedInteraction {
                    source,
                    target,
                    kind: PlannedKind::Bind(directive),
                });
            }

            for directive in &spec.triggers {
                let target = index_of(&directive.to).ok_or_else(|| {
                    OrchestrationError::UnknownComponent {
                        component: spec.name.clone(),
                        target: directive.to.clone(),
                    }
                })?;

                if self
                    .matrix
                    .find_trigger_strategy(
                        &spec.component_type,
                        &components[target].component_type,
                        &directive.event_type,
                    )
                    .is_none()
                {
                    return Err(OrchestrationError::UnsupportedTrigger {
                        source_type: spec.component_type.clone(),
                        target_type: components[target].component_type.clone(),
                        event_type: directive.event_type.clone(),
                    });
                }

                planned.push(PlannedInteraction {
                    source,
                    target,
                    kind: PlannedKind::Trigger(directive),
                });
            }
        }

        Ok(planned)
    }

    /// Phase two, execution half: run one planned interaction and fold its
    /// outcome into the source component.
    fn execute_interaction(
        &self,
        ctx: &ComponentContext,
        interaction: &PlannedInteraction<'_>,
        manifest: &ServiceManifest,
        components: &mut [SynthesizedComponent],
    ) -> Result<BindingRecord, OrchestrationError> {
        let source_spec = &manifest.components[interaction.source];
        // Strategies read the target and mutate the source; clone the
        // target's record to keep the borrow simple.
        let target = components[interaction.target].clone();

        let (kind, capability, access, outcome) = match &interaction.kind {
            PlannedKind::Bind(directive) => {
                let strategy = self
                    .matrix
                    .find_binding_strategy(&source_spec.component_type, &directive.capability)
                    .ok_or_else(|| OrchestrationError::UnsupportedBinding {
                        source_type: source_spec.component_type.clone(),
                        target_type: target.component_type.clone(),
                        capability: directive.capability.clone(),
                    })?;

                let binding_ctx = BindingContext::for_binding(ctx, directive);
                let outcome: BindingOutcome = strategy
                    .bind(
                        &components[interaction.source],
                        &target,
                        &directive.access,
                        &binding_ctx,
                    )
                    .map_err(|err| OrchestrationError::Strategy {
                        binding: format!("{} -> {}", source_spec.name, directive.to),
                        source: err,
                    })?;

                let access = directive.access.iter().map(ToString::to_string).collect();
                (
                    BindingKind::Binding,
                    directive.capability.clone(),
                    access,
                    outcome,
                )
            }
            PlannedKind::Trigger(directive) => {
                let strategy = self
                    .matrix
                    .find_trigger_strategy(
                        &source_spec.component_type,
                        &target.component_type,
                        &directive.event_type,
                    )
                    .ok_or_else(|| OrchestrationError::UnsupportedTrigger {
                        source_type: source_spec.component_type.clone(),
                        target_type: target.component_type.clone(),
                        event_type: directive.event_type.clone(),
                    })?;

                let binding_ctx = BindingContext::with_options(ctx, &directive.options);
                let outcome = strategy
                    .trigger(&components[interaction.source], &target, &binding_ctx)
                    .map_err(|err| OrchestrationError::Strategy {
                        binding: format!("{} <- {}", source_spec.name, directive.to),
                        source: err,
                    })?;

                (
                    BindingKind::Trigger,
                    directive.event_type.clone(),
                    Vec::new(),
                    outcome,
                )
            }
        };

        let source = &mut components[interaction.source];
        for (key, value) in &outcome.environment {
            source.environment.insert(key.clone(), value.clone());
        }

        tracing::debug!(
            "applied {} {} -> {} via {}",
            match kind {
                BindingKind::Binding => "binding",
                BindingKind::Trigger => "trigger",
            },
            source.name,
            target.name,
            capability
        );

        Ok(BindingRecord {
            kind,
            source: source.name.clone(),
            target: target.name.clone(),
            capability,
            access,
            statements: outcome.statements,
            environment: outcome.environment,
            hardening: outcome.hardening,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use serde_json::json;

    use super::*;
    use crate::config::layers::MaterializedLayers;
    use crate::core::capability::names;
    use crate::test_support::{minimal_context, RecordingStrategy};

    fn manifest(value: serde_json::Value) -> ServiceManifest {
        ServiceManifest::from_value(&value).unwrap()
    }

    fn run(
        manifest: &ServiceManifest,
        matrix: &BinderMatrix,
        options: OrchestrationOptions,
    ) -> Result<OrchestrationResult, OrchestrationError> {
        let ctx = minimal_context("dev");
        let synthesizers = SynthesizerSet::with_reference_synthesizers();
        Orchestrator::new(matrix, &synthesizers).run(
            &ctx,
            manifest,
            &MaterializedLayers::default(),
            options,
        )
    }

    #[test]
    fn compute_to_database_binding_injects_connection_env() {
        let manifest = manifest(json!({
            "service": "orders",
            "owner": "team-payments",
            "components": [
                {
                    "name": "api",
                    "type": "compute",
                    "binds": [{"to": "db", "capability": names::DATABASE_RDS, "access": ["read"]}]
                },
                {"name": "db", "type": "database"}
            ]
        }));

        let matrix = BinderMatrix::with_builtin_strategies();
        let result = run(&manifest, &matrix, OrchestrationOptions::default()).unwrap();

        assert_eq!(result.components_processed, 2);
        assert_eq!(result.bindings_applied.len(), 1);

        let api = result.component("api").unwrap();
        assert!(api.environment.contains_key("DB_HOST"));
        assert!(api.environment.contains_key("DB_PORT"));
        assert!(api.environment.contains_key("DB_NAME"));

        let record = &result.bindings_applied[0];
        assert_eq!(record.kind, BindingKind::Binding);
        assert_eq!(record.access, vec!["read"]);
        assert!(!record.statements.is_empty());
    }

    #[test]
    fn binding_order_is_independent_of_declaration_order() {
        // The source may be declared before the target it binds to.
        let manifest = manifest(json!({
            "service": "orders",
            "owner": "team-payments",
            "components": [
                {
                    "name": "worker",
                    "type": "compute",
                    "binds": [{"to": "jobs", "capability": names::QUEUE_SQS}]
                },
                {"name": "jobs", "type": "queue"}
            ]
        }));

        let matrix = BinderMatrix::with_builtin_strategies();
        let result = run(&manifest, &matrix, OrchestrationOptions::default()).unwrap();
        let worker = result.component("worker").unwrap();
        assert!(worker.environment.contains_key("QUEUE_URL"));
    }

    #[test]
    fn unsupported_binding_aborts_before_any_strategy_runs() {
        let manifest = manifest(json!({
            "service": "orders",
            "owner": "team-payments",
            "components": [
                {
                    "name": "api",
                    "type": "compute",
                    "binds": [
                        {"to": "db", "capability": names::DATABASE_RDS},
                        {"to": "jobs", "capability": names::QUEUE_SQS}
                    ]
                },
                {"name": "db", "type": "database"},
                {"name": "jobs", "type": "queue"}
            ]
        }));

        // Only the database binding is supported here.
        let recording = RecordingStrategy::new("db-only", "compute", names::DATABASE_RDS);
        let invocations = recording.invocations();
        let mut matrix = BinderMatrix::new();
        matrix.register_binding_strategy(Box::new(recording));

        let err = run(&manifest, &matrix, OrchestrationOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            OrchestrationError::UnsupportedBinding { ref capability, .. }
                if capability == names::QUEUE_SQS
        ));
        assert_eq!(invocations.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn duplicate_component_names_abort_before_synthesis() {
        let manifest = manifest(json!({
            "service": "orders",
            "owner": "team-payments",
            "components": [
                {"name": "db", "type": "database"},
                {"name": "api", "type": "compute", "binds": [
                    {"to": "db", "capability": names::DATABASE_RDS}
                ]},
                {"name": "db", "type": "database"}
            ]
        }));

        let matrix = BinderMatrix::with_builtin_strategies();
        let err = run(&manifest, &matrix, OrchestrationOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            OrchestrationError::DuplicateComponent { ref name } if name == "db"
        ));
    }

    #[test]
    fn first_registered_strategy_wins_for_duplicate_pairs() {
        let manifest = manifest(json!({
            "service": "orders",
            "owner": "team-payments",
            "components": [
                {
                    "name": "api",
                    "type": "compute",
                    "binds": [{"to": "db", "capability": names::DATABASE_RDS}]
                },
                {"name": "db", "type": "database"}
            ]
        }));

        let first = RecordingStrategy::new("first", "compute", names::DATABASE_RDS);
        let second = RecordingStrategy::new("second", "compute", names::DATABASE_RDS);
        let first_calls = first.invocations();
        let second_calls = second.invocations();
        let mut matrix = BinderMatrix::new();
        matrix.register_binding_strategy(Box::new(first));
        matrix.register_binding_strategy(Box::new(second));

        let result = run(&manifest, &matrix, OrchestrationOptions::default()).unwrap();
        assert_eq!(result.bindings_applied.len(), 1);
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unknown_binding_target_is_reported() {
        let manifest = manifest(json!({
            "service": "orders",
            "owner": "team-payments",
            "components": [
                {
                    "name": "api",
                    "type": "compute",
                    "binds": [{"to": "missing", "capability": names::DATABASE_RDS}]
                }
            ]
        }));

        let matrix = BinderMatrix::with_builtin_strategies();
        let err = run(&manifest, &matrix, OrchestrationOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            OrchestrationError::UnknownComponent { ref target, .. } if target == "missing"
        ));
    }

    #[test]
    fn first_config_failure_aborts_by_default() {
        let manifest = manifest(json!({
            "service": "orders",
            "owner": "team-payments",
            "components": [
                {"name": "a", "type": "topic"},
                {"name": "b", "type": "topic"}
            ]
        }));

        let matrix = BinderMatrix::with_builtin_strategies();
        let err = run(&manifest, &matrix, OrchestrationOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            OrchestrationError::Config { ref component, .. } if component == "a"
        ));
    }

    #[test]
    fn keep_going_collects_every_config_failure() {
        let manifest = manifest(json!({
            "service": "orders",
            "owner": "team-payments",
            "components": [
                {"name": "a", "type": "topic"},
                {"name": "api", "type": "compute"},
                {"name": "b", "type": "topic"}
            ]
        }));

        let matrix = BinderMatrix::with_builtin_strategies();
        let options = OrchestrationOptions { keep_going: true };
        match run(&manifest, &matrix, options).unwrap_err() {
            OrchestrationError::ConfigMultiple { failures } => {
                let names: Vec<&str> = failures.iter().map(|(n, _)| n.as_str()).collect();
                assert_eq!(names, vec!["a", "b"]);
            }
            other => panic!("expected ConfigMultiple, got {:?}", other),
        }
    }

    #[test]
    fn queue_trigger_attaches_event_source_env() {
        let manifest = manifest(json!({
            "service": "orders",
            "owner": "team-payments",
            "components": [
                {
                    "name": "worker",
                    "type": "compute",
                    "triggers": [{"to": "jobs", "eventType": "queue:message", "options": {"batchSize": 25}}]
                },
                {"name": "jobs", "type": "queue"}
            ]
        }));

        let matrix = BinderMatrix::with_builtin_strategies();
        let result = run(&manifest, &matrix, OrchestrationOptions::default()).unwrap();

        let worker = result.component("worker").unwrap();
        assert!(worker.environment.contains_key("EVENT_SOURCE_QUEUE_ARN"));
        assert_eq!(
            worker.environment.get("EVENT_SOURCE_BATCH_SIZE"),
            Some(&"25".to_owned())
        );
        assert_eq!(result.bindings_applied[0].kind, BindingKind::Trigger);
    }

    #[test]
    fn matrix_warnings_surface_in_result() {
        let manifest = manifest(json!({
            "service": "orders",
            "owner": "team-payments",
            "components": [{"name": "api", "type": "compute"}]
        }));

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

        let result = run(&manifest, &matrix, OrchestrationOptions::default()).unwrap();
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("duplicate"));
    }
}
