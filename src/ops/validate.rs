//! Manifest validation without planning.

use std::path::PathBuf;

use anyhow::Result;

use crate::util::config::Config;
use crate::util::fs::read_manifest;
use crate::validation::{ValidationPipeline, ValidationRequest, ValidationResponse};

use super::plan::locate_manifest;

/// Options for the validate operation.
#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    /// Explicit manifest path; discovered by walking up when absent
    pub manifest_path: Option<PathBuf>,
    /// Target environment for hydration when running the full chain
    pub environment: Option<String>,
    /// Run the full four-stage chain instead of parse + schema
    pub full: bool,
}

/// Validation result plus the manifest it covered.
#[derive(Debug)]
pub struct ValidateOutput {
    pub manifest_path: PathBuf,
    pub response: ValidationResponse,
}

/// Run the validation chain against a manifest.
///
/// The default chain stops after structural (parse + schema) checks;
/// `full` also runs hydration and semantic reference checks, which need
/// a target environment.
pub fn validate(options: ValidateOptions) -> Result<ValidateOutput> {
    let manifest_path = locate_manifest(options.manifest_path)?;
    let project_dir = manifest_path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    // Same environment fallback chain as plan: flag, tool config, `dev`.
    let config = Config::load(&project_dir)?;
    let environment = options
        .environment
        .or_else(|| config.defaults.environment.clone())
        .unwrap_or_else(|| "dev".to_owned());
    let text = read_manifest(&manifest_path)?;
    let request = ValidationRequest::new(environment, text).with_path(&manifest_path);

    let pipeline = if options.full {
        ValidationPipeline::full()
    } else {
        ValidationPipeline::lightweight()
    };
    let response = pipeline.run(&request);

    Ok(ValidateOutput {
        manifest_path,
        response,
    })
}

/// Render a validation outcome as terminal text.
pub fn format_validation(output: &ValidateOutput) -> String {
    let response = &output.response;
    let mut out = String::new();

    if response.success {
        out.push_str(&format!(
            "{}: valid (checked through {} stage)\n",
            output.manifest_path.display(),
            response.stage
        ));
    } else {
        out.push_str(&format!(
            "{}: invalid (rejected at {} stage)\n",
            output.manifest_path.display(),
            response.stage
        ));
        for error in &response.errors {
            out.push_str(&format!("error: {}\n", error));
        }
    }

    for warning in &response.warnings {
        out.push_str(&format!("warning: {}\n", warning));
    }

    out
}
