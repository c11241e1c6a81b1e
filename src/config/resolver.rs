//! Five-layer configuration precedence resolver.
//!
//! Layer order, highest precedence last:
//! 1. hardcoded component-type fallback
//! 2. platform-wide default
//! 3. compliance-framework default
//! 4. component-level manifest config
//! 5. policy override
//!
//! Both entry points - the async [`resolve`] that fetches layers 2/3/5 from
//! a [`PlatformConfigSource`] and the sync [`resolve_with_layers`] for
//! pre-materialized layers - funnel into one pure merge-and-validate path,
//! so identical inputs produce identical output.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::context::ConfigBuilderContext;
use crate::util::diagnostic::Diagnostic;

use super::layers::{ConfigLayers, ConfigSourceError, PlatformConfigSource};
use super::merge::merge_layers;
use super::schemas::{apply_schema_defaults, schema_for};

/// Error producing one component's concrete configuration.
#[derive(Debug, Error)]
pub enum ConfigResolutionError {
    #[error("component `{component}` has unknown type `{component_type}`")]
    UnknownComponentType {
        component: String,
        component_type: String,
    },

    #[error("component `{component}` is missing required fields after merge")]
    MissingRequiredFields {
        component: String,
        fields: Vec<String>,
    },

    #[error("component `{component}` config violates its schema")]
    SchemaViolations {
        component: String,
        violations: Vec<String>, // "path: message"
    },

    #[error("component `{component}` field `{field}` has invalid format")]
    InvalidFormat {
        component: String,
        field: String,
        value: String,
        expected: String,
    },

    #[error("component `{component}` config is internally inconsistent")]
    InconsistentFields { component: String, message: String },

    #[error("schema for `{component_type}` failed to compile: {message}")]
    SchemaCompile {
        component_type: String,
        message: String,
    },

    #[error(transparent)]
    Source(#[from] ConfigSourceError),
}

impl ConfigResolutionError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ConfigResolutionError::UnknownComponentType {
                component,
                component_type,
            } => Diagnostic::error(format!(
                "component `{}` has unknown type `{}`",
                component, component_type
            ))
            .with_suggestion("Use one of: compute, database, queue, secret"),

            ConfigResolutionError::MissingRequiredFields { component, fields } => {
                let mut diag = Diagnostic::error(format!(
                    "component `{}` is missing required configuration",
                    component
                ));
                for field in fields {
                    diag = diag.with_context(format!("missing field `{}`", field));
                }
                diag.with_suggestion(format!(
                    "Supply the field in `components[].config` for `{}`",
                    component
                ))
            }

            ConfigResolutionError::SchemaViolations {
                component,
                violations,
            } => {
                let mut diag = Diagnostic::error(format!(
                    "component `{}` config violates its schema",
                    component
                ));
                for violation in violations {
                    diag = diag.with_context(violation.clone());
                }
                diag
            }

            ConfigResolutionError::InvalidFormat {
                component,
                field,
                value,
                expected,
            } => Diagnostic::error(format!(
                "component `{}` field `{}` has invalid value `{}`",
                component, field, value
            ))
            .with_context(format!("expected {}", expected)),

            ConfigResolutionError::InconsistentFields { component, message } => {
                Diagnostic::error(format!(
                    "component `{}` config is internally inconsistent",
                    component
                ))
                .with_context(message.clone())
            }

            ConfigResolutionError::SchemaCompile {
                component_type,
                message,
            } => Diagnostic::error(format!(
                "internal schema for `{}` failed to compile",
                component_type
            ))
            .with_context(message.clone()),

            ConfigResolutionError::Source(err) => {
                Diagnostic::error(format!("configuration source failure: {}", err))
                    .with_suggestion("Check the configured `platform.config_service` endpoint")
            }
        }
    }
}

/// The concrete, schema-valid configuration for one component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedConfig {
    component_type: String,
    value: Value,
}

impl ResolvedConfig {
    pub fn new(component_type: impl Into<String>, value: Value) -> Self {
        ResolvedConfig {
            component_type: component_type.into(),
            value,
        }
    }

    pub fn component_type(&self) -> &str {
        &self.component_type
    }

    /// The full merged configuration tree.
    pub fn as_value(&self) -> &Value {
        &self.value
    }

    /// A value at a JSON-pointer path.
    pub fn pointer(&self, path: &str) -> Option<&Value> {
        self.value.pointer(path)
    }

    pub fn pointer_str(&self, path: &str) -> Option<&str> {
        self.pointer(path).and_then(Value::as_str)
    }

    pub fn pointer_u64(&self, path: &str) -> Option<u64> {
        self.pointer(path).and_then(Value::as_u64)
    }

    pub fn pointer_bool(&self, path: &str) -> Option<bool> {
        self.pointer(path).and_then(Value::as_bool)
    }
}

/// Resolve a component's configuration from pre-materialized layers.
pub fn resolve_with_layers(
    ctx: &ConfigBuilderContext<'_>,
    layers: &ConfigLayers,
) -> Result<ResolvedConfig, ConfigResolutionError> {
    let component = &ctx.spec.name;
    let component_type = &ctx.spec.component_type;

    let bundle = schema_for(component_type).ok_or_else(|| {
        ConfigResolutionError::UnknownComponentType {
            component: component.clone(),
            component_type: component_type.clone(),
        }
    })?;

    let mut merged = merge_layers(&[
        Some(&bundle.fallback),
        layers.platform.as_ref(),
        layers.compliance.as_ref(),
        Some(&ctx.spec.config),
        layers.policy.as_ref(),
    ]);

    apply_schema_defaults(&bundle.schema, &mut merged);

    check_required(&bundle.schema, &merged, component)?;
    check_schema(&bundle.schema, &merged, component, component_type)?;
    check_formats(&merged, component)?;
    check_consistency(&merged, component)?;

    tracing::debug!(
        "resolved config for {} ({}) against {} layers",
        component,
        component_type,
        5
    );
    Ok(ResolvedConfig::new(component_type.clone(), merged))
}

/// Resolve a component's configuration, fetching layers from a source.
pub async fn resolve(
    ctx: &ConfigBuilderContext<'_>,
    source: &dyn PlatformConfigSource,
) -> Result<ResolvedConfig, ConfigResolutionError> {
    let layers = source
        .layers_for(ctx.context.compliance_framework, &ctx.spec.component_type)
        .await?;
    resolve_with_layers(ctx, &layers)
}

fn check_required(
    schema: &Value,
    merged: &Value,
    component: &str,
) -> Result<(), ConfigResolutionError> {
    let Some(required) = schema.get("required").and_then(Value::as_array) else {
        return Ok(());
    };
    let missing: Vec<String> = required
        .iter()
        .filter_map(Value::as_str)
        .filter(|field| merged.get(field).is_none())
        .map(str::to_owned)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ConfigResolutionError::MissingRequiredFields {
            component: component.to_owned(),
            fields: missing,
        })
    }
}

fn check_schema(
    schema: &Value,
    merged: &Value,
    component: &str,
    component_type: &str,
) -> Result<(), ConfigResolutionError> {
    let validator = jsonschema::validator_for(schema).map_err(|err| {
        ConfigResolutionError::SchemaCompile {
            component_type: component_type.to_owned(),
            message: err.to_string(),
        }
    })?;

    let violations: Vec<String> = validator
        .iter_errors(merged)
        .map(|err| {
            let path = err.instance_path.to_string();
            let path = if path.is_empty() { "/".to_owned() } else { path };
            format!("{}: {}", path, err)
        })
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ConfigResolutionError::SchemaViolations {
            component: component.to_owned(),
            violations,
        })
    }
}

fn fqdn_regex() -> &'static Regex {
    static FQDN: OnceLock<Regex> = OnceLock::new();
    FQDN.get_or_init(|| {
        Regex::new(r"^(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}$")
            .unwrap_or_else(|_| unreachable!("static regex"))
    })
}

fn check_formats(merged: &Value, component: &str) -> Result<(), ConfigResolutionError> {
    if let Some(hostname) = merged.pointer("/endpoint/hostname").and_then(Value::as_str) {
        if !fqdn_regex().is_match(hostname) {
            return Err(ConfigResolutionError::InvalidFormat {
                component: component.to_owned(),
                field: "endpoint.hostname".to_owned(),
                value: hostname.to_owned(),
                expected: "a fully-qualified domain name".to_owned(),
            });
        }
    }
    Ok(())
}

fn check_consistency(merged: &Value, component: &str) -> Result<(), ConfigResolutionError> {
    let mode = merged.pointer("/alerting/mode").and_then(Value::as_str);
    if mode == Some("email") {
        let recipients = merged
            .pointer("/alerting/recipients")
            .and_then(Value::as_array)
            .map(Vec::len)
            .unwrap_or(0);
        if recipients == 0 {
            return Err(ConfigResolutionError::InconsistentFields {
                component: component.to_owned(),
                message: "alerting.mode is `email` but alerting.recipients is empty".to_owned(),
            });
        }
    }
    Ok(())
}
