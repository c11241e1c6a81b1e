//! Platform/policy configuration layer sources.
//!
//! Layers 2 (platform-wide default), 3 (compliance-framework default), and
//! 5 (policy override) may live outside the repository. The
//! `PlatformConfigSource` trait is the narrow seam through which they are
//! fetched; `StaticConfigSource` serves materialized layers synchronously
//! and `HttpConfigSource` fetches them from a configuration service.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::core::context::ComplianceFramework;

use super::schemas;

/// Error fetching a configuration layer from a source.
#[derive(Debug, Error)]
pub enum ConfigSourceError {
    #[error("configuration service request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("configuration service returned {status} for {path}")]
    Status { status: u16, path: String },

    #[error("configuration service returned a non-object layer for {path}")]
    NotAnObject { path: String },
}

/// The three externally sourced layers for one component type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigLayers {
    /// Layer 2: platform-wide default
    pub platform: Option<Value>,
    /// Layer 3: compliance-framework default
    pub compliance: Option<Value>,
    /// Layer 5: policy override
    pub policy: Option<Value>,
}

/// Source of platform, compliance, and policy configuration layers.
#[async_trait]
pub trait PlatformConfigSource: Send + Sync {
    /// Layer 2 for a component type, if the org defines one.
    async fn platform_defaults(
        &self,
        component_type: &str,
    ) -> Result<Option<Value>, ConfigSourceError>;

    /// Layer 3 for a framework and component type.
    async fn compliance_defaults(
        &self,
        framework: ComplianceFramework,
        component_type: &str,
    ) -> Result<Option<Value>, ConfigSourceError>;

    /// Layer 5 for a component type, if governance enforces one.
    async fn policy_overrides(
        &self,
        component_type: &str,
    ) -> Result<Option<Value>, ConfigSourceError>;

    /// Fetch all three layers for one component type.
    async fn layers_for(
        &self,
        framework: ComplianceFramework,
        component_type: &str,
    ) -> Result<ConfigLayers, ConfigSourceError> {
        Ok(ConfigLayers {
            platform: self.platform_defaults(component_type).await?,
            compliance: self.compliance_defaults(framework, component_type).await?,
            policy: self.policy_overrides(component_type).await?,
        })
    }
}

/// In-memory layer source with the built-in compliance defaults.
#[derive(Default)]
pub struct StaticConfigSource {
    platform: BTreeMap<String, Value>,
    compliance: BTreeMap<(ComplianceFramework, String), Value>,
    policy: BTreeMap<String, Value>,
    use_builtin_compliance: bool,
}

impl StaticConfigSource {
    /// Empty source: only hardcoded fallbacks and manifest config apply.
    pub fn empty() -> Self {
        StaticConfigSource::default()
    }

    /// Source serving the built-in compliance-framework defaults.
    pub fn with_builtin_compliance() -> Self {
        StaticConfigSource {
            use_builtin_compliance: true,
            ..StaticConfigSource::default()
        }
    }

    /// Set the platform-wide default layer for a component type.
    pub fn set_platform_default(&mut self, component_type: impl Into<String>, layer: Value) {
        self.platform.insert(component_type.into(), layer);
    }

    /// Set a compliance default layer, overriding any built-in one.
    pub fn set_compliance_default(
        &mut self,
        framework: ComplianceFramework,
        component_type: impl Into<String>,
        layer: Value,
    ) {
        self.compliance
            .insert((framework, component_type.into()), layer);
    }

    /// Set the policy override layer for a component type.
    pub fn set_policy_override(&mut self, component_type: impl Into<String>, layer: Value) {
        self.policy.insert(component_type.into(), layer);
    }
}

#[async_trait]
impl PlatformConfigSource for StaticConfigSource {
    async fn platform_defaults(
        &self,
        component_type: &str,
    ) -> Result<Option<Value>, ConfigSourceError> {
        Ok(self.platform.get(component_type).cloned())
    }

    async fn compliance_defaults(
        &self,
        framework: ComplianceFramework,
        component_type: &str,
    ) -> Result<Option<Value>, ConfigSourceError> {
        if let Some(layer) = self
            .compliance
            .get(&(framework, component_type.to_owned()))
        {
            return Ok(Some(layer.clone()));
        }
        if self.use_builtin_compliance {
            return Ok(schemas::builtin_compliance_defaults(
                framework,
                component_type,
            ));
        }
        Ok(None)
    }

    async fn policy_overrides(
        &self,
        component_type: &str,
    ) -> Result<Option<Value>, ConfigSourceError> {
        Ok(self.policy.get(component_type).cloned())
    }
}

/// Layer source backed by a configuration service.
///
/// Layers are fetched as JSON from:
/// - `GET {base}/platform/{type}`
/// - `GET {base}/compliance/{framework}/{type}`
/// - `GET {base}/policy/{type}`
///
/// A 404 means the layer is absent, which is a normal outcome.
pub struct HttpConfigSource {
    base: Url,
    client: reqwest::Client,
}

impl HttpConfigSource {
    pub fn new(base: Url, timeout: std::time::Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpConfigSource { base, client })
    }

    async fn fetch_layer(&self, path: &str) -> Result<Option<Value>, ConfigSourceError> {
        let url = self
            .base
            .join(path)
            .map_err(|_| ConfigSourceError::Status {
                status: 0,
                path: path.to_owned(),
            })?;

        tracing::debug!("fetching configuration layer from {}", url);
        let response = self.client.get(url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ConfigSourceError::Status {
                status: response.status().as_u16(),
                path: path.to_owned(),
            });
        }

        let layer: Value = response.json().await?;
        if !layer.is_object() {
            return Err(ConfigSourceError::NotAnObject {
                path: path.to_owned(),
            });
        }
        Ok(Some(layer))
    }
}

#[async_trait]
impl PlatformConfigSource for HttpConfigSource {
    async fn platform_defaults(
        &self,
        component_type: &str,
    ) -> Result<Option<Value>, ConfigSourceError> {
        self.fetch_layer(&format!("platform/{}", component_type))
            .await
    }

    async fn compliance_defaults(
        &self,
        framework: ComplianceFramework,
        component_type: &str,
    ) -> Result<Option<Value>, ConfigSourceError> {
        self.fetch_layer(&format!("compliance/{}/{}", framework, component_type))
            .await
    }

    async fn policy_overrides(
        &self,
        component_type: &str,
    ) -> Result<Option<Value>, ConfigSourceError> {
        self.fetch_layer(&format!("policy/{}", component_type)).await
    }
}

/// All layers for every component type in a manifest, fetched up front so
/// the orchestration pass itself stays synchronous.
#[derive(Debug, Clone, Default)]
pub struct MaterializedLayers {
    per_type: BTreeMap<String, ConfigLayers>,
}

impl MaterializedLayers {
    /// Layers for a component type; absent types resolve with empty layers.
    pub fn for_type(&self, component_type: &str) -> ConfigLayers {
        self.per_type
            .get(component_type)
            .cloned()
            .unwrap_or_default()
    }

    /// Insert layers for a component type.
    pub fn insert(&mut self, component_type: impl Into<String>, layers: ConfigLayers) {
        self.per_type.insert(component_type.into(), layers);
    }
}

/// Fetch layers for each component type from a source.
pub async fn materialize_layers(
    source: &dyn PlatformConfigSource,
    framework: ComplianceFramework,
    component_types: impl IntoIterator<Item = &str>,
) -> Result<MaterializedLayers, ConfigSourceError> {
    let mut materialized = MaterializedLayers::default();
    for component_type in component_types {
        let layers = source.layers_for(framework, component_type).await?;
        materialized.insert(component_type, layers);
    }
    Ok(materialized)
}
