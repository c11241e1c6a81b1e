//! Shared fixtures for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crate::binder::strategy::{
    BinderStrategy, BindingContext, BindingOutcome, CompatibilityEntry, StrategyError,
};
use crate::config::resolver::ResolvedConfig;
use crate::core::component::{AccessLevel, ComponentSpec};
use crate::core::context::{ComplianceFramework, ComponentContext};
use crate::core::synth::SynthesizedComponent;

/// A context with fixed service/region/account values.
pub fn minimal_context(environment: &str) -> ComponentContext {
    ComponentContext {
        service_name: "orders".to_owned(),
        owner: "team-payments".to_owned(),
        environment: environment.to_owned(),
        compliance_framework: ComplianceFramework::Commercial,
        region: "us-east-1".to_owned(),
        account: "123456789012".to_owned(),
        tags: Default::default(),
    }
}

/// A resolved config wrapping the given tree directly.
pub fn resolved(component_type: &str, value: Value) -> ResolvedConfig {
    ResolvedConfig::new(component_type, value)
}

/// A component spec with the given inline config.
pub fn component_spec(name: &str, component_type: &str, config: Value) -> ComponentSpec {
    serde_json::from_value(serde_json::json!({
        "name": name,
        "type": component_type,
        "config": config,
    }))
    .unwrap()
}

/// A binding strategy that counts its invocations and grants nothing.
pub struct RecordingStrategy {
    name: &'static str,
    source_type: String,
    capability: String,
    invocations: Arc<AtomicUsize>,
}

impl RecordingStrategy {
    pub fn new(name: &'static str, source_type: &str, capability: &str) -> Self {
        RecordingStrategy {
            name,
            source_type: source_type.to_owned(),
            capability: capability.to_owned(),
            invocations: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Handle onto the invocation counter; clone before registering.
    pub fn invocations(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.invocations)
    }
}

impl BinderStrategy for RecordingStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    fn can_handle(&self, source_type: &str, capability: &str) -> bool {
        source_type == self.source_type && capability == self.capability
    }

    fn bind(
        &self,
        _source: &SynthesizedComponent,
        _target: &SynthesizedComponent,
        _access: &[AccessLevel],
        _ctx: &BindingContext<'_>,
    ) -> Result<BindingOutcome, StrategyError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        Ok(BindingOutcome::default())
    }

    fn compatibility_matrix(&self) -> Vec<CompatibilityEntry> {
        let target_type = self
            .capability
            .split(':')
            .next()
            .unwrap_or(&self.capability)
            .to_owned();
        vec![CompatibilityEntry {
            source_type: self.source_type.clone(),
            target_type,
            capability: self.capability.clone(),
            description: format!("test strategy {}", self.name),
        }]
    }
}
