//! Built-in component-type schemas, hardcoded fallbacks, and
//! compliance-framework default layers.
//!
//! The fallback is precedence layer 1: always present and conservative.
//! Compliance defaults are layer 3, selected by the active framework.
//! Schema-level `default` values fill keys still missing after all five
//! layers have merged.

use serde_json::{json, Value};

use crate::core::context::ComplianceFramework;

/// Component types the planner ships schemas for.
pub const KNOWN_TYPES: &[&str] = &["compute", "database", "queue", "secret"];

/// Schema and fallback for one component type.
pub struct ComponentTypeSchema {
    pub component_type: &'static str,
    /// JSON Schema the merged config must satisfy
    pub schema: Value,
    /// Precedence layer 1: hardcoded conservative default
    pub fallback: Value,
}

/// Look up the schema bundle for a component type.
pub fn schema_for(component_type: &str) -> Option<ComponentTypeSchema> {
    match component_type {
        "compute" => Some(compute_schema()),
        "database" => Some(database_schema()),
        "queue" => Some(queue_schema()),
        "secret" => Some(secret_schema()),
        _ => None,
    }
}

/// Built-in compliance-framework default layer for a component type.
///
/// Only hardened fields appear here; everything else flows from the
/// fallback, schema defaults, or the other layers.
pub fn builtin_compliance_defaults(
    framework: ComplianceFramework,
    component_type: &str,
) -> Option<Value> {
    let defaults = match (framework, component_type) {
        (ComplianceFramework::Commercial, "database") => json!({
            "backupRetentionDays": 7,
            "encryption": {"enabled": false}
        }),
        (ComplianceFramework::FedrampModerate, "database") => json!({
            "backupRetentionDays": 30,
            "encryption": {"enabled": true}
        }),
        (ComplianceFramework::FedrampHigh, "database") => json!({
            "backupRetentionDays": 90,
            "multiAz": true,
            "encryption": {"enabled": true}
        }),
        (ComplianceFramework::Commercial, "queue") => json!({
            "encryption": {"enabled": false}
        }),
        (ComplianceFramework::FedrampModerate | ComplianceFramework::FedrampHigh, "queue") => {
            json!({
                "encryption": {"enabled": true},
                "deadLetter": {"enabled": true}
            })
        }
        (ComplianceFramework::FedrampModerate, "compute") => json!({
            "logRetentionDays": 90,
            "tracing": true
        }),
        (ComplianceFramework::FedrampHigh, "compute") => json!({
            "logRetentionDays": 365,
            "tracing": true
        }),
        (ComplianceFramework::FedrampModerate | ComplianceFramework::FedrampHigh, "secret") => {
            json!({
                "rotationDays": 90
            })
        }
        _ => return None,
    };
    Some(defaults)
}

/// Fill schema-level `default` values for keys still missing after merge.
///
/// Recurses into object properties so nested defaults apply even when the
/// parent object is partially populated.
pub fn apply_schema_defaults(schema: &Value, value: &mut Value) {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return;
    };
    let Some(target) = value.as_object_mut() else {
        return;
    };

    for (key, prop_schema) in properties {
        if !target.contains_key(key) {
            if let Some(default) = prop_schema.get("default") {
                target.insert(key.clone(), default.clone());
            }
        }
        if let Some(slot) = target.get_mut(key) {
            if slot.is_object() {
                apply_schema_defaults(prop_schema, slot);
            }
        }
    }
}

fn compute_schema() -> ComponentTypeSchema {
    ComponentTypeSchema {
        component_type: "compute",
        schema: json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "type": "object",
            "required": ["runtime"],
            "properties": {
                "runtime": {"enum": ["node18", "python311", "go121"], "default": "node18"},
                "memoryMb": {"type": "integer", "minimum": 128, "default": 128},
                "timeoutSeconds": {"type": "integer", "minimum": 1, "default": 3},
                "logRetentionDays": {"type": "integer", "default": 30},
                "tracing": {"type": "boolean", "default": false},
                "environment": {"type": "object", "default": {}}
            }
        }),
        fallback: json!({
            "runtime": "node18",
            "memoryMb": 128,
            "timeoutSeconds": 3
        }),
    }
}

fn database_schema() -> ComponentTypeSchema {
    ComponentTypeSchema {
        component_type: "database",
        schema: json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "type": "object",
            "required": ["engine"],
            "properties": {
                "engine": {"enum": ["postgres", "mysql"], "default": "postgres"},
                "instanceClass": {"type": "string", "default": "db.t3.micro"},
                "allocatedStorageGb": {"type": "integer", "minimum": 5, "default": 20},
                "backupRetentionDays": {"type": "integer", "minimum": 0, "default": 7},
                "multiAz": {"type": "boolean", "default": false},
                "encryption": {
                    "type": "object",
                    "properties": {
                        "enabled": {"type": "boolean", "default": false},
                        "kmsKeyArn": {"type": "string"}
                    }
                },
                "endpoint": {
                    "type": "object",
                    "properties": {
                        "hostname": {"type": "string"},
                        "port": {"type": "integer", "default": 5432},
                        "dbName": {"type": "string"}
                    }
                },
                "alerting": {
                    "type": "object",
                    "properties": {
                        "mode": {"enum": ["none", "email"], "default": "none"},
                        "recipients": {"type": "array", "items": {"type": "string"}, "default": []}
                    }
                }
            }
        }),
        fallback: json!({
            "engine": "postgres",
            "instanceClass": "db.t3.micro",
            "allocatedStorageGb": 20,
            "backupRetentionDays": 7,
            "multiAz": false,
            "encryption": {},
            "endpoint": {},
            "alerting": {}
        }),
    }
}

fn queue_schema() -> ComponentTypeSchema {
    ComponentTypeSchema {
        component_type: "queue",
        schema: json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "type": "object",
            "properties": {
                "fifo": {"type": "boolean", "default": false},
                "visibilityTimeoutSeconds": {"type": "integer", "minimum": 0, "default": 30},
                "messageRetentionDays": {"type": "integer", "minimum": 1, "default": 4},
                "encryption": {
                    "type": "object",
                    "properties": {
                        "enabled": {"type": "boolean", "default": false}
                    }
                },
                "deadLetter": {
                    "type": "object",
                    "properties": {
                        "enabled": {"type": "boolean", "default": false},
                        "maxReceiveCount": {"type": "integer", "minimum": 1, "default": 5}
                    }
                }
            }
        }),
        fallback: json!({
            "fifo": false,
            "encryption": {},
            "deadLetter": {}
        }),
    }
}

fn secret_schema() -> ComponentTypeSchema {
    ComponentTypeSchema {
        component_type: "secret",
        schema: json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "type": "object",
            "properties": {
                "rotationDays": {"type": "integer", "minimum": 0, "default": 0},
                "kmsKeyArn": {"type": "string"}
            }
        }),
        fallback: json!({
            "rotationDays": 0
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_known_type_has_a_schema() {
        for component_type in KNOWN_TYPES {
            let bundle = schema_for(component_type).unwrap();
            assert_eq!(bundle.component_type, *component_type);
            assert!(bundle.fallback.is_object());
        }
    }

    #[test]
    fn unknown_type_has_no_schema() {
        assert!(schema_for("topic").is_none());
    }

    #[test]
    fn schema_defaults_fill_missing_keys_recursively() {
        let bundle = database_schema();
        let mut value = json!({"engine": "mysql", "endpoint": {"hostname": "db.example.com"}});
        apply_schema_defaults(&bundle.schema, &mut value);

        assert_eq!(value["engine"], "mysql");
        assert_eq!(value["instanceClass"], "db.t3.micro");
        assert_eq!(value["endpoint"]["port"], 5432);
        assert_eq!(value["endpoint"]["hostname"], "db.example.com");
        assert_eq!(value["alerting"]["mode"], "none");
    }

    #[test]
    fn frameworks_disagree_on_hardened_fields() {
        let commercial =
            builtin_compliance_defaults(ComplianceFramework::Commercial, "database").unwrap();
        let high =
            builtin_compliance_defaults(ComplianceFramework::FedrampHigh, "database").unwrap();
        assert_ne!(
            commercial["encryption"]["enabled"],
            high["encryption"]["enabled"]
        );
    }
}
