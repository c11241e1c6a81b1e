//! Multi-stage manifest validation pipeline.
//!
//! An ordered chain of stages - Parse, Schema, Hydrate, Semantic - turns raw
//! manifest text into a hydrated, reference-checked tree or a terminal
//! failure tagged with the rejecting stage. Stages are pure
//! request-to-outcome functions; the driver owns short-circuiting and
//! warning concatenation.

pub mod errors;
pub mod hydrate;
pub mod parse;
pub mod schema;
pub mod semantic;

use std::path::PathBuf;

use serde_json::Value;

pub use errors::{ManifestError, ReferenceViolation, SchemaViolation};
pub use hydrate::HydrateStage;
pub use parse::ParseStage;
pub use schema::{DefaultSchemaProvider, SchemaProvider, SchemaStage};
pub use semantic::SemanticStage;

/// Input to one validation run.
#[derive(Debug, Clone)]
pub struct ValidationRequest {
    /// Path of the manifest, for diagnostics
    pub manifest_path: Option<PathBuf>,
    /// Active target environment for hydration
    pub environment: String,
    /// Raw manifest text
    pub text: String,
}

impl ValidationRequest {
    pub fn new(environment: impl Into<String>, text: impl Into<String>) -> Self {
        ValidationRequest {
            manifest_path: None,
            environment: environment.into(),
            text: text.into(),
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = Some(path.into());
        self
    }
}

/// Successful output of one stage.
#[derive(Debug)]
pub struct StageOutcome {
    /// The (possibly transformed) manifest tree
    pub data: Value,
    /// Non-fatal findings from this stage
    pub warnings: Vec<String>,
}

impl StageOutcome {
    pub fn clean(data: Value) -> Self {
        StageOutcome {
            data,
            warnings: Vec::new(),
        }
    }
}

/// One stage of the chain.
///
/// A stage consumes the previous stage's tree and either transforms it or
/// rejects the manifest. Stages never see each other; ordering and warning
/// accumulation belong to the pipeline.
pub trait ValidationStage {
    /// Stage name as reported in responses (e.g. `"parsing"`).
    fn name(&self) -> &'static str;

    /// Run the stage against the previous stage's output.
    fn run(&self, request: &ValidationRequest, data: Value) -> Result<StageOutcome, ManifestError>;
}

/// Final result of a pipeline run.
#[derive(Debug)]
pub struct ValidationResponse {
    /// Whether every stage accepted the manifest
    pub success: bool,
    /// The final tree, when successful
    pub data: Option<Value>,
    /// Warnings concatenated across all stages that ran
    pub warnings: Vec<String>,
    /// Rendered violation messages from the failing stage
    pub errors: Vec<String>,
    /// The typed failure, when unsuccessful
    pub failure: Option<ManifestError>,
    /// The last stage that ran
    pub stage: &'static str,
}

/// The ordered validation chain.
pub struct ValidationPipeline {
    stages: Vec<Box<dyn ValidationStage>>,
}

impl ValidationPipeline {
    /// Full four-stage chain used for deployment planning.
    pub fn full() -> Self {
        ValidationPipeline {
            stages: vec![
                Box::new(ParseStage),
                Box::new(SchemaStage::new(&DefaultSchemaProvider)),
                Box::new(HydrateStage::new()),
                Box::new(SemanticStage),
            ],
        }
    }

    /// Two-stage chain (Parse + Schema) for validation-only invocations.
    pub fn lightweight() -> Self {
        ValidationPipeline {
            stages: vec![
                Box::new(ParseStage),
                Box::new(SchemaStage::new(&DefaultSchemaProvider)),
            ],
        }
    }

    /// Chain with caller-supplied stages, in order.
    pub fn with_stages(stages: Vec<Box<dyn ValidationStage>>) -> Self {
        ValidationPipeline { stages }
    }

    /// Run every stage in order, short-circuiting on the first failure.
    pub fn run(&self, request: &ValidationRequest) -> ValidationResponse {
        let mut data = Value::Null;
        let mut warnings = Vec::new();
        let mut last_stage = "";

        for stage in &self.stages {
            last_stage = stage.name();
            tracing::debug!("running validation stage {}", last_stage);

            match stage.run(request, data) {
                Ok(outcome) => {
                    warnings.extend(outcome.warnings);
                    data = outcome.data;
                }
                Err(failure) => {
                    tracing::debug!("stage {} rejected the manifest", last_stage);
                    return ValidationResponse {
                        success: false,
                        data: None,
                        warnings,
                        errors: failure.render_list(),
                        failure: Some(failure),
                        stage: last_stage,
                    };
                }
            }
        }

        ValidationResponse {
            success: true,
            data: Some(data),
            warnings,
            errors: Vec::new(),
            failure: None,
            stage: last_stage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct WarnStage(&'static str, &'static str);

    impl ValidationStage for WarnStage {
        fn name(&self) -> &'static str {
            self.0
        }

        fn run(
            &self,
            _request: &ValidationRequest,
            data: Value,
        ) -> Result<StageOutcome, ManifestError> {
            Ok(StageOutcome {
                data,
                warnings: vec![self.1.to_owned()],
            })
        }
    }

    struct FailStage(&'static str);

    impl ValidationStage for FailStage {
        fn name(&self) -> &'static str {
            self.0
        }

        fn run(
            &self,
            _request: &ValidationRequest,
            _data: Value,
        ) -> Result<StageOutcome, ManifestError> {
            Err(ManifestError::Parse {
                message: "boom".into(),
            })
        }
    }

    #[test]
    fn warnings_concatenate_across_stages() {
        let pipeline = ValidationPipeline::with_stages(vec![
            Box::new(WarnStage("first", "one")),
            Box::new(WarnStage("second", "two")),
        ]);
        let response = pipeline.run(&ValidationRequest::new("dev", ""));
        assert!(response.success);
        assert_eq!(response.warnings, vec!["one", "two"]);
        assert_eq!(response.stage, "second");
    }

    #[test]
    fn failure_short_circuits_remaining_stages() {
        let pipeline = ValidationPipeline::with_stages(vec![
            Box::new(WarnStage("first", "kept")),
            Box::new(FailStage("second")),
            Box::new(WarnStage("third", "never runs")),
        ]);
        let response = pipeline.run(&ValidationRequest::new("dev", ""));
        assert!(!response.success);
        assert_eq!(response.stage, "second");
        // Warnings gathered before the failure survive.
        assert_eq!(response.warnings, vec!["kept"]);
        assert!(response.data.is_none());
    }

    #[test]
    fn full_chain_rejects_bad_yaml_at_parsing() {
        let pipeline = ValidationPipeline::full();
        let response = pipeline.run(&ValidationRequest::new("dev", "service: [unclosed"));
        assert!(!response.success);
        assert_eq!(response.stage, "parsing");
        assert!(matches!(
            response.failure,
            Some(ManifestError::Parse { .. })
        ));
    }

    #[test]
    fn full_chain_accepts_minimal_manifest() {
        let pipeline = ValidationPipeline::full();
        let response = pipeline.run(&ValidationRequest::new(
            "dev",
            "service: orders\nowner: team-payments\n",
        ));
        assert!(response.success, "errors: {:?}", response.errors);
        let data = response.data.unwrap();
        assert_eq!(data["complianceFramework"], "commercial");
    }

    #[test]
    fn lightweight_chain_stops_after_schema() {
        let pipeline = ValidationPipeline::lightweight();
        let response = pipeline.run(&ValidationRequest::new(
            "dev",
            "service: orders\nowner: team-payments\n",
        ));
        assert!(response.success);
        assert_eq!(response.stage, "schema");
        // No hydration ran, so no compliance framework was filled in.
        assert!(response.data.unwrap().get("complianceFramework").is_none());
    }
}
