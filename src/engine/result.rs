//! Orchestration result types.
//!
//! The result is plan-as-data: everything a plan/diff formatter needs to
//! produce human-readable or JSON output, with no live handles inside.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::binder::strategy::AuthorizationStatement;
use crate::core::capability::CapabilityMap;
use crate::core::context::ComplianceFramework;

/// Whether a record came from a binding or a trigger directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingKind {
    Binding,
    Trigger,
}

/// One applied binding or trigger.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingRecord {
    pub kind: BindingKind,
    pub source: String,
    pub target: String,
    /// Capability key for bindings, event type for triggers
    pub capability: String,
    pub access: Vec<String>,
    pub statements: Vec<AuthorizationStatement>,
    pub environment: BTreeMap<String, String>,
    pub hardening: Vec<String>,
}

/// One component after synthesis and binding application.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub component_type: String,
    /// The five-layer merged, schema-valid configuration
    pub config: Value,
    pub capabilities: CapabilityMap,
    /// Environment injected by bindings and triggers
    pub environment: BTreeMap<String, String>,
}

/// Aggregate outcome of one orchestration pass.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationResult {
    pub service: String,
    pub environment: String,
    pub compliance_framework: ComplianceFramework,
    /// SHA-256 of the manifest text, when known
    pub manifest_digest: Option<String>,
    pub components_processed: usize,
    pub components: Vec<ComponentRecord>,
    pub bindings_applied: Vec<BindingRecord>,
    /// Non-fatal findings accumulated across the pass
    pub warnings: Vec<String>,
    pub duration_ms: u64,
}

impl OrchestrationResult {
    /// Look up a component record by name.
    pub fn component(&self, name: &str) -> Option<&ComponentRecord> {
        self.components.iter().find(|c| c.name == name)
    }
}
