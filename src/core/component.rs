//! Component declarations as they appear in a hydrated manifest.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Access level requested by a binding directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Read,
    Write,
    Admin,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Read => "read",
            AccessLevel::Write => "write",
            AccessLevel::Admin => "admin",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_access() -> Vec<AccessLevel> {
    vec![AccessLevel::Read]
}

/// A declared dependency from one component to another's capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingDirective {
    /// Name of the target component
    pub to: String,
    /// Capability key the target must expose (e.g. `database:rds`)
    pub capability: String,
    /// Requested access levels; defaults to `[read]`
    #[serde(default = "default_access")]
    pub access: Vec<AccessLevel>,
    /// Binding-scoped options (env prefix, hardening flags)
    #[serde(default)]
    pub options: BTreeMap<String, Value>,
}

/// A declared event subscription: the target component's events invoke
/// the declaring component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerDirective {
    /// Name of the event-source component
    pub to: String,
    /// Event kind (e.g. `queue:message`)
    pub event_type: String,
    /// Trigger-scoped options (batch size, filters)
    #[serde(default)]
    pub options: BTreeMap<String, Value>,
}

/// One named unit of infrastructure declared in a manifest.
///
/// Immutable after hydration; the config block may still contain arbitrary
/// nesting, which the precedence resolver merges and validates later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSpec {
    /// Unique name within the manifest
    pub name: String,
    /// Component kind (e.g. `compute`, `database`, `queue`, `secret`)
    #[serde(rename = "type")]
    pub component_type: String,
    /// Author-supplied partial configuration (precedence layer 4)
    #[serde(default = "empty_object")]
    pub config: Value,
    /// Declared capability bindings
    #[serde(default)]
    pub binds: Vec<BindingDirective>,
    /// Declared event triggers
    #[serde(default)]
    pub triggers: Vec<TriggerDirective>,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}
