//! Stage 1: decode manifest text into a generic tree.

use serde_json::Value;

use super::{ManifestError, StageOutcome, ValidationRequest, ValidationStage};

/// Decodes YAML manifest text into a JSON tree.
pub struct ParseStage;

impl ValidationStage for ParseStage {
    fn name(&self) -> &'static str {
        "parsing"
    }

    fn run(&self, request: &ValidationRequest, _data: Value) -> Result<StageOutcome, ManifestError> {
        let tree: Value =
            serde_yaml::from_str(&request.text).map_err(|err| ManifestError::Parse {
                message: err.to_string(),
            })?;

        if tree.is_null() {
            return Err(ManifestError::Parse {
                message: "manifest is empty".to_owned(),
            });
        }

        Ok(StageOutcome::clean(tree))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str) -> Result<StageOutcome, ManifestError> {
        ParseStage.run(&ValidationRequest::new("dev", text), Value::Null)
    }

    #[test]
    fn parses_yaml_to_tree() {
        let outcome = run("service: orders\ncomponents:\n  - name: api\n    type: compute\n")
            .unwrap();
        assert_eq!(outcome.data["service"], "orders");
        assert_eq!(outcome.data["components"][0]["name"], "api");
    }

    #[test]
    fn malformed_yaml_preserves_cause_text() {
        let err = run("service: [unclosed").unwrap_err();
        match err {
            ManifestError::Parse { message } => assert!(!message.is_empty()),
            other => panic!("expected Parse, got {:?}", other),
        }
    }

    #[test]
    fn empty_manifest_is_a_parse_error() {
        assert!(matches!(run("").unwrap_err(), ManifestError::Parse { .. }));
    }
}
