//! Service manifest schema and hydrated-manifest accessors.
//!
//! A `ServiceManifest` is built from the validation chain's output tree.
//! By the time it is deserialized, interpolation has already run and every
//! structural invariant has been checked, so deserialization failures here
//! indicate a pipeline bug rather than user error.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::component::ComponentSpec;
use crate::core::context::ComplianceFramework;

/// Environments the hydrate stage recognizes when a manifest declares none.
pub const DEFAULT_ENVIRONMENTS: &[&str] = &["dev", "qa", "staging", "prod"];

/// One declared target environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentSpec {
    /// Values substituted for `${env:KEY}` placeholders
    #[serde(default)]
    pub defaults: BTreeMap<String, Value>,
}

/// A governance suppression entry.
///
/// Field presence and date format are enforced by the semantic validation
/// stage; the struct itself stays permissive so stage ordering holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suppression {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub justification: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub expires_on: String,
}

/// Governance block of a manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Governance {
    #[serde(default)]
    pub suppressions: Vec<Suppression>,
}

/// A fully hydrated service manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceManifest {
    /// Service name (required)
    pub service: String,
    /// Owning team (required)
    pub owner: String,
    /// Governance posture; hydration fills `commercial` when absent
    #[serde(default)]
    pub compliance_framework: ComplianceFramework,
    /// Deployment region
    #[serde(default)]
    pub region: Option<String>,
    /// Account identifier
    #[serde(default)]
    pub account: Option<String>,
    /// Service-wide tags
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Declared target environments
    #[serde(default)]
    pub environments: BTreeMap<String, EnvironmentSpec>,
    /// Declared components, in manifest order
    #[serde(default)]
    pub components: Vec<ComponentSpec>,
    /// Governance suppressions
    #[serde(default)]
    pub governance: Governance,
}

impl ServiceManifest {
    /// Deserialize a hydrated manifest tree.
    pub fn from_value(value: &Value) -> Result<ServiceManifest> {
        serde_json::from_value(value.clone())
            .context("hydrated manifest failed to deserialize; validation pipeline bug")
    }

    /// Look up a component by name.
    pub fn component(&self, name: &str) -> Option<&ComponentSpec> {
        self.components.iter().find(|c| c.name == name)
    }

    /// All declared component names, in manifest order.
    pub fn component_names(&self) -> Vec<&str> {
        self.components.iter().map(|c| c.name.as_str()).collect()
    }
}
