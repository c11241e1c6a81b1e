//! Capability contracts exposed by synthesized components.
//!
//! A capability is a named data contract (e.g. `database:rds`) a component
//! registers after its own synthesis. Binding strategies read the target
//! component's capability data to grant access and wire up environment
//! variables on the source.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Well-known capability keys.
pub mod names {
    pub const DATABASE_RDS: &str = "database:rds";
    pub const QUEUE_SQS: &str = "queue:sqs";
    pub const SECRET_SECRETSMANAGER: &str = "secret:secretsmanager";
    pub const COMPUTE_FUNCTION: &str = "compute:function";
}

/// Well-known event types.
pub mod events {
    pub const QUEUE_MESSAGE: &str = "queue:message";
}

/// Data payload of one exposed capability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityData {
    /// Identifier of the concrete resource backing this capability
    pub resource_arn: String,
    /// Capability-specific fields (endpoint host/port, queue URL, ...)
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

impl CapabilityData {
    pub fn new(resource_arn: impl Into<String>) -> Self {
        CapabilityData {
            resource_arn: resource_arn.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field insertion.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// A field as a string, if present and string-typed.
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// A field as an unsigned integer, if present and numeric.
    pub fn field_u64(&self, key: &str) -> Option<u64> {
        self.fields.get(key).and_then(Value::as_u64)
    }
}

/// All capabilities one component exposes, keyed by capability name.
pub type CapabilityMap = BTreeMap<String, CapabilityData>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_accessors_read_typed_values() {
        let cap = CapabilityData::new("arn:aws:rds:us-east-1:123:db:orders")
            .with_field("host", "orders.db.internal")
            .with_field("port", 5432);

        assert_eq!(cap.field_str("host"), Some("orders.db.internal"));
        assert_eq!(cap.field_u64("port"), Some(5432));
        assert_eq!(cap.field_str("missing"), None);
    }
}
