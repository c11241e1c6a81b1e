//! Stage 2: structural validation against the master manifest schema.
//!
//! Collects every violation with a JSON-pointer path and the offending
//! value, rather than stopping at the first.

use serde_json::{json, Value};

use super::{ManifestError, SchemaViolation, StageOutcome, ValidationRequest, ValidationStage};

/// Required top-level fields, checked explicitly in addition to the schema.
const REQUIRED_TOP_LEVEL: &[&str] = &["service", "owner"];

/// Supplies the master manifest schema.
pub trait SchemaProvider {
    fn master_schema(&self) -> Value;
}

/// The embedded master schema.
pub struct DefaultSchemaProvider;

impl SchemaProvider for DefaultSchemaProvider {
    fn master_schema(&self) -> Value {
        master_schema()
    }
}

/// Validates the parsed tree against the registered master schema.
pub struct SchemaStage {
    schema: Value,
}

impl SchemaStage {
    pub fn new(provider: &dyn SchemaProvider) -> Self {
        SchemaStage {
            schema: provider.master_schema(),
        }
    }
}

impl ValidationStage for SchemaStage {
    fn name(&self) -> &'static str {
        "schema"
    }

    fn run(&self, _request: &ValidationRequest, data: Value) -> Result<StageOutcome, ManifestError> {
        let mut violations = Vec::new();

        for field in REQUIRED_TOP_LEVEL {
            if data.get(field).is_none() {
                violations.push(SchemaViolation {
                    path: format!("/{}", field),
                    message: format!("required field `{}` is missing", field),
                    value: None,
                });
            }
        }

        let validator =
            jsonschema::validator_for(&self.schema).map_err(|err| ManifestError::Schema {
                violations: vec![SchemaViolation {
                    path: "/".to_owned(),
                    message: format!("master schema failed to compile: {}", err),
                    value: None,
                }],
            })?;

        for err in validator.iter_errors(&data) {
            let path = err.instance_path.to_string();
            let path = if path.is_empty() { "/".to_owned() } else { path };
            let value = data.pointer(&path).cloned();
            let violation = SchemaViolation {
                path,
                message: err.to_string(),
                value,
            };
            // The explicit required-field check may already cover this one.
            if !violations.contains(&violation) {
                violations.push(violation);
            }
        }

        if violations.is_empty() {
            Ok(StageOutcome::clean(data))
        } else {
            Err(ManifestError::Schema { violations })
        }
    }
}

/// The master manifest schema.
///
/// Structural only: cross-references and config contents are checked by
/// later stages and by the per-type config schemas.
pub fn master_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "required": ["service", "owner"],
        "properties": {
            "service": {"type": "string", "minLength": 1},
            "owner": {"type": "string", "minLength": 1},
            "complianceFramework": {
                "enum": ["commercial", "fedramp-moderate", "fedramp-high"]
            },
            "region": {"type": "string"},
            "account": {"type": "string"},
            "tags": {"type": "object", "additionalProperties": {"type": "string"}},
            "environments": {
                "type": "object",
                "additionalProperties": {
                    "type": "object",
                    "properties": {
                        "defaults": {"type": "object"}
                    }
                }
            },
            "components": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["name", "type"],
                    "properties": {
                        "name": {"type": "string", "pattern": "^[a-z][a-z0-9-]*$"},
                        "type": {"type": "string", "minLength": 1},
                        "config": {"type": "object"},
                        "binds": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "required": ["to", "capability"],
                                "properties": {
                                    "to": {"type": "string"},
                                    "capability": {"type": "string"},
                                    "access": {
                                        "type": "array",
                                        "items": {"enum": ["read", "write", "admin"]}
                                    },
                                    "options": {"type": "object"}
                                }
                            }
                        },
                        "triggers": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "required": ["to", "eventType"],
                                "properties": {
                                    "to": {"type": "string"},
                                    "eventType": {"type": "string"},
                                    "options": {"type": "object"}
                                }
                            }
                        }
                    }
                }
            },
            "governance": {
                "type": "object",
                "properties": {
                    "suppressions": {
                        "type": "array",
                        "items": {"type": "object"}
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(data: Value) -> Result<StageOutcome, ManifestError> {
        SchemaStage::new(&DefaultSchemaProvider).run(&ValidationRequest::new("dev", ""), data)
    }

    #[test]
    fn accepts_well_formed_manifest() {
        let outcome = run(json!({
            "service": "orders",
            "owner": "team-payments",
            "components": [
                {"name": "api", "type": "compute", "binds": [
                    {"to": "db", "capability": "database:rds", "access": ["read"]}
                ]}
            ]
        }));
        assert!(outcome.is_ok());
    }

    #[test]
    fn missing_service_and_owner_both_reported() {
        match run(json!({"components": []})).unwrap_err() {
            ManifestError::Schema { violations } => {
                let paths: Vec<&str> = violations.iter().map(|v| v.path.as_str()).collect();
                assert!(paths.contains(&"/service"));
                assert!(paths.contains(&"/owner"));
            }
            other => panic!("expected Schema, got {:?}", other),
        }
    }

    #[test]
    fn violations_carry_paths_and_values() {
        let err = run(json!({
            "service": "orders",
            "owner": "team-payments",
            "components": [{"name": "Bad_Name", "type": "compute"}]
        }))
        .unwrap_err();

        match err {
            ManifestError::Schema { violations } => {
                let violation = violations
                    .iter()
                    .find(|v| v.path.contains("/components/0/name"))
                    .expect("violation for component name");
                assert_eq!(violation.value, Some(json!("Bad_Name")));
            }
            other => panic!("expected Schema, got {:?}", other),
        }
    }

    #[test]
    fn collects_multiple_violations_in_one_pass() {
        let err = run(json!({
            "service": "orders",
            "owner": "team-payments",
            "complianceFramework": "fedramp-low",
            "components": [{"name": "api"}]
        }))
        .unwrap_err();

        match err {
            ManifestError::Schema { violations } => {
                assert!(violations.len() >= 2, "violations: {:?}", violations);
            }
            other => panic!("expected Schema, got {:?}", other),
        }
    }
}
