//! Binding and trigger strategy contracts.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::component::{AccessLevel, BindingDirective};
use crate::core::context::{ComplianceFramework, ComponentContext};
use crate::core::synth::SynthesizedComponent;
use crate::util::diagnostic::Diagnostic;

/// One row of the exported compatibility matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompatibilityEntry {
    pub source_type: String,
    pub target_type: String,
    /// Capability key for bindings; event type for triggers
    pub capability: String,
    pub description: String,
}

/// One authorization statement granted by a strategy.
///
/// Statements are scoped to the specific target resource identifier;
/// wildcard resources appear only when a binding explicitly requests them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationStatement {
    pub effect: &'static str,
    pub actions: Vec<String>,
    pub resource: String,
}

impl AuthorizationStatement {
    pub fn allow(actions: Vec<String>, resource: impl Into<String>) -> Self {
        AuthorizationStatement {
            effect: "Allow",
            actions,
            resource: resource.into(),
        }
    }
}

/// Everything a strategy produces for one binding.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BindingOutcome {
    /// Permissions granted to the source, scoped to the target resource
    pub statements: Vec<AuthorizationStatement>,
    /// Environment variables injected into the source component
    pub environment: BTreeMap<String, String>,
    /// Hardening measures applied from binding options
    pub hardening: Vec<String>,
}

/// Binding-scoped slice of the resolution context.
///
/// Compliance-driven behavior arrives already resolved into `options` and
/// the components' configs; strategies never branch on the framework.
#[derive(Debug, Clone)]
pub struct BindingContext<'a> {
    pub region: &'a str,
    pub account: &'a str,
    pub environment: &'a str,
    pub compliance_framework: ComplianceFramework,
    pub options: &'a BTreeMap<String, Value>,
}

impl<'a> BindingContext<'a> {
    pub fn for_binding(ctx: &'a ComponentContext, directive: &'a BindingDirective) -> Self {
        BindingContext {
            region: &ctx.region,
            account: &ctx.account,
            environment: &ctx.environment,
            compliance_framework: ctx.compliance_framework,
            options: &directive.options,
        }
    }

    pub fn with_options(
        ctx: &'a ComponentContext,
        options: &'a BTreeMap<String, Value>,
    ) -> Self {
        BindingContext {
            region: &ctx.region,
            account: &ctx.account,
            environment: &ctx.environment,
            compliance_framework: ctx.compliance_framework,
            options,
        }
    }

    /// A boolean binding option, absent meaning false.
    pub fn option_bool(&self, key: &str) -> bool {
        self.options
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// A string binding option.
    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(Value::as_str)
    }
}

/// Error raised by a matched strategy's execution.
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("access level `{access}` is not valid for capability `{capability}`")]
    UnsupportedAccessLevel {
        strategy: String,
        access: AccessLevel,
        capability: String,
    },

    #[error("component `{component}` does not expose capability `{capability}`")]
    MissingCapability {
        component: String,
        capability: String,
    },

    #[error("capability `{capability}` on `{component}` is missing field `{field}`")]
    MissingCapabilityField {
        component: String,
        capability: String,
        field: String,
    },
}

impl StrategyError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            StrategyError::UnsupportedAccessLevel {
                strategy,
                access,
                capability,
            } => Diagnostic::error(format!(
                "access level `{}` is not valid for capability `{}`",
                access, capability
            ))
            .with_context(format!("strategy: {}", strategy))
            .with_suggestion("Use one of the access levels listed by `stratus matrix`"),

            StrategyError::MissingCapability {
                component,
                capability,
            } => Diagnostic::error(format!(
                "component `{}` does not expose capability `{}`",
                component, capability
            ))
            .with_suggestion(format!(
                "Check that `{}` has the component type this capability implies",
                component
            )),

            StrategyError::MissingCapabilityField {
                component,
                capability,
                field,
            } => Diagnostic::error(format!(
                "capability `{}` on `{}` is missing field `{}`",
                capability, component, field
            )),
        }
    }
}

/// Fulfils one (source-type, capability) family of bindings.
pub trait BinderStrategy: Send + Sync {
    /// Short strategy name for logs and error messages.
    fn name(&self) -> &'static str;

    /// Whether this strategy handles a (source type, capability) pair.
    fn can_handle(&self, source_type: &str, capability: &str) -> bool;

    /// Grant access and wire environment for one binding.
    fn bind(
        &self,
        source: &SynthesizedComponent,
        target: &SynthesizedComponent,
        access: &[AccessLevel],
        ctx: &BindingContext<'_>,
    ) -> Result<BindingOutcome, StrategyError>;

    /// The interactions this strategy supports, for the exported matrix.
    fn compatibility_matrix(&self) -> Vec<CompatibilityEntry>;
}

/// Fulfils one (source-type, target-type, event-type) family of triggers.
pub trait TriggerStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this strategy handles a (source, target, event) triple.
    fn can_handle(&self, source_type: &str, target_type: &str, event_type: &str) -> bool;

    /// Wire the target's events into the source component.
    fn trigger(
        &self,
        source: &SynthesizedComponent,
        target: &SynthesizedComponent,
        ctx: &BindingContext<'_>,
    ) -> Result<BindingOutcome, StrategyError>;

    /// The interactions this strategy supports, for the exported matrix.
    fn compatibility_matrix(&self) -> Vec<CompatibilityEntry>;
}

impl fmt::Display for CompatibilityEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} via {}",
            self.source_type, self.target_type, self.capability
        )
    }
}
