//! Deployment planning: validation chain, layer fetch, orchestration.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use url::Url;

use crate::binder::matrix::BinderMatrix;
use crate::config::layers::{
    materialize_layers, HttpConfigSource, MaterializedLayers, PlatformConfigSource,
    StaticConfigSource,
};
use crate::core::context::ComponentContext;
use crate::core::manifest::ServiceManifest;
use crate::core::synth::SynthesizerSet;
use crate::engine::orchestrator::OrchestrationError;
use crate::engine::{OrchestrationOptions, OrchestrationResult, Orchestrator};
use crate::util::config::Config;
use crate::util::diagnostic::{
    DanglingReferenceDiagnostic, ManifestNotFoundDiagnostic, UnsupportedBindingDiagnostic,
};
use crate::util::fs::{find_manifest, read_manifest};
use crate::util::hash::sha256_hex;
use crate::validation::{ValidationPipeline, ValidationRequest};

/// Options for the plan operation.
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    /// Explicit manifest path; discovered by walking up when absent
    pub manifest_path: Option<PathBuf>,
    /// Target environment; tool config default, then `dev`, when absent
    pub environment: Option<String>,
    /// Configuration service base URL, overriding tool config
    pub config_service: Option<String>,
    /// Collect every component's config failure before reporting
    pub keep_going: bool,
}

/// A completed plan plus the manifest it was produced from.
#[derive(Debug)]
pub struct PlanOutput {
    pub manifest_path: PathBuf,
    pub result: OrchestrationResult,
}

/// Produce a deployment plan for the manifest.
pub fn plan(options: PlanOptions) -> Result<PlanOutput> {
    let manifest_path = locate_manifest(options.manifest_path.clone())?;
    let project_dir = manifest_path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let config = Config::load(&project_dir)?;
    let environment = options
        .environment
        .clone()
        .or_else(|| config.defaults.environment.clone())
        .unwrap_or_else(|| "dev".to_owned());

    let text = read_manifest(&manifest_path)?;
    let request =
        ValidationRequest::new(environment.clone(), text.clone()).with_path(&manifest_path);

    let response = ValidationPipeline::full().run(&request);
    if !response.success {
        bail!(
            "manifest rejected at {} stage:\n{}",
            response.stage,
            response.errors.join("\n")
        );
    }
    let mut warnings = response.warnings;
    let data = response
        .data
        .ok_or_else(|| anyhow!("validation succeeded without a manifest tree"))?;

    let manifest = ServiceManifest::from_value(&data)?;
    let ctx = build_context(&manifest, &environment, &config);

    let layers = fetch_layers(&manifest, &ctx, &config, options.config_service.as_deref())?;

    let matrix = BinderMatrix::with_builtin_strategies();
    let synthesizers = SynthesizerSet::with_reference_synthesizers();
    let orchestrator = Orchestrator::new(&matrix, &synthesizers);

    let mut result = orchestrator
        .run(
            &ctx,
            &manifest,
            &layers,
            OrchestrationOptions {
                keep_going: options.keep_going,
            },
        )
        .map_err(orchestration_error)?;

    warnings.append(&mut result.warnings);
    result.warnings = warnings;
    result.manifest_digest = Some(sha256_hex(&text));

    Ok(PlanOutput {
        manifest_path,
        result,
    })
}

/// Render a plan as terminal text.
pub fn format_plan(output: &PlanOutput) -> String {
    let result = &output.result;
    let mut out = String::new();

    out.push_str(&format!(
        "Plan for service `{}` (environment: {}, framework: {})\n",
        result.service, result.environment, result.compliance_framework
    ));
    out.push_str(&format!("manifest: {}\n", output.manifest_path.display()));
    if let Some(ref digest) = result.manifest_digest {
        out.push_str(&format!("digest: sha256:{}\n", digest));
    }

    out.push_str(&format!(
        "\n{} component(s):\n",
        result.components_processed
    ));
    for component in &result.components {
        out.push_str(&format!("  {} ({})\n", component.name, component.component_type));
        for (key, cap) in &component.capabilities {
            out.push_str(&format!("    exposes {} -> {}\n", key, cap.resource_arn));
        }
        for (key, value) in &component.environment {
            out.push_str(&format!("    env {}={}\n", key, value));
        }
    }

    out.push_str(&format!(
        "\n{} binding(s) applied:\n",
        result.bindings_applied.len()
    ));
    for record in &result.bindings_applied {
        out.push_str(&format!(
            "  {} -> {} via {}\n",
            record.source, record.target, record.capability
        ));
        for statement in &record.statements {
            out.push_str(&format!(
                "    {} {} on {}\n",
                statement.effect,
                statement.actions.join(", "),
                statement.resource
            ));
        }
        for hardening in &record.hardening {
            out.push_str(&format!("    hardening: {}\n", hardening));
        }
    }

    for warning in &result.warnings {
        out.push_str(&format!("\nwarning: {}", warning));
    }
    if !result.warnings.is_empty() {
        out.push('\n');
    }

    out.push_str(&format!("\ncompleted in {}ms\n", result.duration_ms));
    out
}

pub(crate) fn locate_manifest(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if !path.is_file() {
            bail!("manifest not found at {}", path.display());
        }
        return Ok(path);
    }

    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    find_manifest(&cwd).ok_or_else(|| {
        anyhow::Error::new(ManifestNotFoundDiagnostic {
            searched: Some(format!(
                "searched {} and its parents for service.yml",
                cwd.display()
            )),
        })
    })
}

/// Surface the strongest diagnostic available for an orchestration failure.
fn orchestration_error(err: OrchestrationError) -> anyhow::Error {
    match err {
        OrchestrationError::UnsupportedBinding {
            source_type,
            target_type,
            capability,
        } => anyhow::Error::new(UnsupportedBindingDiagnostic {
            source_type,
            target_type,
            capability,
        }),
        OrchestrationError::UnknownComponent { component, target } => {
            anyhow::Error::new(DanglingReferenceDiagnostic { component, target })
        }
        other => anyhow!("{}", other.to_diagnostic()),
    }
}

fn build_context(
    manifest: &ServiceManifest,
    environment: &str,
    config: &Config,
) -> ComponentContext {
    let region = manifest
        .region
        .clone()
        .or_else(|| config.defaults.region.clone())
        .unwrap_or_else(|| "us-east-1".to_owned());
    let account = manifest
        .account
        .clone()
        .or_else(|| config.defaults.account.clone())
        .unwrap_or_else(|| "000000000000".to_owned());

    ComponentContext {
        service_name: manifest.service.clone(),
        owner: manifest.owner.clone(),
        environment: environment.to_owned(),
        compliance_framework: manifest.compliance_framework,
        region,
        account,
        tags: manifest.tags.clone(),
    }
}

/// Fetch platform/compliance/policy layers for every component type up
/// front; the orchestration pass itself stays synchronous.
fn fetch_layers(
    manifest: &ServiceManifest,
    ctx: &ComponentContext,
    config: &Config,
    config_service: Option<&str>,
) -> Result<MaterializedLayers> {
    let component_types: BTreeSet<&str> = manifest
        .components
        .iter()
        .map(|c| c.component_type.as_str())
        .collect();

    let endpoint = config_service
        .map(str::to_owned)
        .or_else(|| config.platform.config_service.clone());

    let source: Box<dyn PlatformConfigSource> = match endpoint {
        Some(endpoint) => {
            let base = Url::parse(&endpoint)
                .with_context(|| format!("invalid configuration service URL `{}`", endpoint))?;
            tracing::info!("fetching configuration layers from {}", base);
            Box::new(HttpConfigSource::new(
                base,
                Duration::from_secs(config.platform.timeout_secs),
            )?)
        }
        None => Box::new(StaticConfigSource::with_builtin_compliance()),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime for layer fetch")?;
    let layers = runtime.block_on(materialize_layers(
        source.as_ref(),
        ctx.compliance_framework,
        component_types,
    ))?;

    Ok(layers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_manifest(dir: &std::path::Path, text: &str) -> PathBuf {
        let path = dir.join("service.yml");
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn plan_produces_bindings_and_digest() {
        let dir = TempDir::new().unwrap();
        let path = write_manifest(
            dir.path(),
            r#"
service: orders
owner: team-payments
components:
  - name: api
    type: compute
    binds:
      - to: db
        capability: "database:rds"
        access: [read]
  - name: db
    type: database
"#,
        );

        let output = plan(PlanOptions {
            manifest_path: Some(path),
            environment: Some("dev".into()),
            ..PlanOptions::default()
        })
        .unwrap();

        let result = &output.result;
        assert_eq!(result.components_processed, 2);
        assert_eq!(result.bindings_applied.len(), 1);
        assert_eq!(result.manifest_digest.as_ref().unwrap().len(), 64);

        let api = result.component("api").unwrap();
        assert!(api.environment.contains_key("DB_HOST"));
    }

    #[test]
    fn plan_rejects_invalid_manifest_with_stage_name() {
        let dir = TempDir::new().unwrap();
        let path = write_manifest(dir.path(), "owner: team-payments\n");

        let err = plan(PlanOptions {
            manifest_path: Some(path),
            environment: Some("dev".into()),
            ..PlanOptions::default()
        })
        .unwrap_err();

        assert!(err.to_string().contains("schema"), "error: {:#}", err);
    }

    #[test]
    fn plan_reports_missing_manifest_path() {
        let err = plan(PlanOptions {
            manifest_path: Some(PathBuf::from("/nonexistent/service.yml")),
            ..PlanOptions::default()
        })
        .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn format_includes_components_and_bindings() {
        let dir = TempDir::new().unwrap();
        let path = write_manifest(
            dir.path(),
            r#"
service: orders
owner: team-payments
components:
  - name: worker
    type: compute
    triggers:
      - to: jobs
        eventType: "queue:message"
  - name: jobs
    type: queue
"#,
        );

        let output = plan(PlanOptions {
            manifest_path: Some(path),
            environment: Some("dev".into()),
            ..PlanOptions::default()
        })
        .unwrap();

        let text = format_plan(&output);
        assert!(text.contains("Plan for service `orders`"));
        assert!(text.contains("worker (compute)"));
        assert!(text.contains("EVENT_SOURCE_QUEUE_ARN"));
        assert!(text.contains("digest: sha256:"));
    }
}
