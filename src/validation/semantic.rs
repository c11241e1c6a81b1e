//! Stage 4: cross-reference checks over the hydrated tree.
//!
//! Component names must be unique within the manifest, every `binds[].to`
//! and `triggers[].to` must name a component declared in the same manifest,
//! and every governance suppression must carry a complete set of fields with
//! a parseable expiry date. All violations are collected before failing so
//! authors see the full list at once.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use serde_json::Value;

use super::{
    ManifestError, ReferenceViolation, StageOutcome, ValidationRequest, ValidationStage,
};

/// Fields every suppression entry must carry.
const SUPPRESSION_FIELDS: &[&str] = &["id", "justification", "owner", "expiresOn"];

/// Reference-checks the hydrated manifest.
pub struct SemanticStage;

impl ValidationStage for SemanticStage {
    fn name(&self) -> &'static str {
        "semantic"
    }

    fn run(&self, _request: &ValidationRequest, data: Value) -> Result<StageOutcome, ManifestError> {
        let mut violations = Vec::new();
        let mut warnings = Vec::new();

        let components = data
            .get("components")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        // Name -> first occurrence index; repeats are violations, since
        // every later name lookup resolves to the first occurrence only.
        let mut names: BTreeMap<&str, usize> = BTreeMap::new();
        for (index, component) in components.iter().enumerate() {
            if let Some(name) = component.get("name").and_then(Value::as_str) {
                match names.get(name) {
                    Some(&first_index) => {
                        violations.push(ReferenceViolation::DuplicateComponent {
                            name: name.to_owned(),
                            first_index,
                            duplicate_index: index,
                        });
                    }
                    None => {
                        names.insert(name, index);
                    }
                }
            }
        }

        for (index, component) in components.iter().enumerate() {
            let component_name = component
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("<unnamed>");

            for bind in component
                .get("binds")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
            {
                let target = bind.get("to").and_then(Value::as_str).unwrap_or_default();
                if !names.contains_key(target) {
                    violations.push(ReferenceViolation::DanglingBinding {
                        component: component_name.to_owned(),
                        component_index: index,
                        target: target.to_owned(),
                        capability: bind
                            .get("capability")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_owned(),
                    });
                }
            }

            for trigger in component
                .get("triggers")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
            {
                let target = trigger.get("to").and_then(Value::as_str).unwrap_or_default();
                if !names.contains_key(target) {
                    violations.push(ReferenceViolation::DanglingTrigger {
                        component: component_name.to_owned(),
                        component_index: index,
                        target: target.to_owned(),
                        event_type: trigger
                            .get("eventType")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_owned(),
                    });
                }
            }
        }

        check_suppressions(&data, &mut violations, &mut warnings);

        if violations.is_empty() {
            Ok(StageOutcome { data, warnings })
        } else {
            Err(ManifestError::Reference { violations })
        }
    }
}

fn check_suppressions(
    data: &Value,
    violations: &mut Vec<ReferenceViolation>,
    warnings: &mut Vec<String>,
) {
    let suppressions = data
        .pointer("/governance/suppressions")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    for (index, entry) in suppressions.iter().enumerate() {
        for field in SUPPRESSION_FIELDS {
            let present = entry
                .get(field)
                .and_then(Value::as_str)
                .map(|s| !s.is_empty())
                .unwrap_or(false);
            if !present {
                violations.push(ReferenceViolation::SuppressionField {
                    index,
                    field: (*field).to_owned(),
                    message: "missing or empty".to_owned(),
                });
            }
        }

        if let Some(expires_on) = entry.get("expiresOn").and_then(Value::as_str) {
            match parse_expiry(expires_on) {
                Some(date) => {
                    if date < Utc::now().date_naive() {
                        warnings.push(format!(
                            "governance.suppressions[{}] expired on {}",
                            index, date
                        ));
                    }
                }
                None => violations.push(ReferenceViolation::SuppressionField {
                    index,
                    field: "expiresOn".to_owned(),
                    message: format!("`{}` is not a parseable date", expires_on),
                }),
            }
        }
    }
}

fn parse_expiry(text: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    chrono::DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.date_naive())
}
