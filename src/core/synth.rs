//! Component synthesis seam.
//!
//! The orchestration engine treats synthesis as an opaque black box: a
//! synthesizer consumes a resolved config and answers with the capabilities
//! the component exposes. Real cloud-resource construction lives behind this
//! trait in an external construct library; the `ReferenceSynthesizer` here
//! derives capability data purely from the resolved config so plans can be
//! produced without touching a cloud provider.

use std::collections::BTreeMap;

use anyhow::Result;

use crate::config::resolver::ResolvedConfig;
use crate::core::capability::{names, CapabilityData, CapabilityMap};
use crate::core::component::ComponentSpec;
use crate::core::context::ComponentContext;

/// A component after synthesis: its registered capabilities plus the
/// environment variables bindings have injected into it.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedComponent {
    pub name: String,
    pub component_type: String,
    pub capabilities: CapabilityMap,
    pub environment: BTreeMap<String, String>,
}

impl SynthesizedComponent {
    pub fn new(name: impl Into<String>, component_type: impl Into<String>) -> Self {
        SynthesizedComponent {
            name: name.into(),
            component_type: component_type.into(),
            capabilities: CapabilityMap::new(),
            environment: BTreeMap::new(),
        }
    }

    /// Capability data for a key, if this component exposes it.
    pub fn capability(&self, key: &str) -> Option<&CapabilityData> {
        self.capabilities.get(key)
    }
}

/// Synthesis for one component type.
pub trait ComponentSynthesizer: Send + Sync {
    /// The component type this synthesizer handles.
    fn component_type(&self) -> &str;

    /// Synthesize the component and report the capabilities it registers.
    fn synth(
        &self,
        ctx: &ComponentContext,
        spec: &ComponentSpec,
        config: &ResolvedConfig,
    ) -> Result<CapabilityMap>;
}

/// A collection of synthesizers keyed by component type.
pub struct SynthesizerSet {
    synthesizers: Vec<Box<dyn ComponentSynthesizer>>,
}

impl SynthesizerSet {
    /// Create a new empty set.
    pub fn new() -> Self {
        SynthesizerSet {
            synthesizers: Vec::new(),
        }
    }

    /// Create a set with reference synthesizers for every built-in type.
    pub fn with_reference_synthesizers() -> Self {
        let mut set = SynthesizerSet::new();
        for component_type in ["compute", "database", "queue", "secret"] {
            set.register(Box::new(ReferenceSynthesizer::for_type(component_type)));
        }
        set
    }

    /// Add a synthesizer to the set.
    pub fn register(&mut self, synthesizer: Box<dyn ComponentSynthesizer>) {
        self.synthesizers.push(synthesizer);
    }

    /// Find the synthesizer for a component type.
    pub fn for_type(&self, component_type: &str) -> Option<&dyn ComponentSynthesizer> {
        self.synthesizers
            .iter()
            .find(|s| s.component_type() == component_type)
            .map(|s| s.as_ref())
    }
}

impl Default for SynthesizerSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Derives capability data from the resolved config and context alone.
pub struct ReferenceSynthesizer {
    component_type: String,
}

impl ReferenceSynthesizer {
    pub fn for_type(component_type: impl Into<String>) -> Self {
        ReferenceSynthesizer {
            component_type: component_type.into(),
        }
    }
}

impl ComponentSynthesizer for ReferenceSynthesizer {
    fn component_type(&self) -> &str {
        &self.component_type
    }

    fn synth(
        &self,
        ctx: &ComponentContext,
        spec: &ComponentSpec,
        config: &ResolvedConfig,
    ) -> Result<CapabilityMap> {
        let mut capabilities = CapabilityMap::new();
        let qualified = format!("{}-{}", ctx.service_name, spec.name);

        match self.component_type.as_str() {
            "database" => {
                let host = config
                    .pointer_str("/endpoint/hostname")
                    .map(str::to_owned)
                    .unwrap_or_else(|| format!("{}.{}.rds.internal", qualified, ctx.region));
                let port = config.pointer_u64("/endpoint/port").unwrap_or(5432);
                let db_name = config
                    .pointer_str("/endpoint/dbName")
                    .unwrap_or(&spec.name)
                    .to_owned();

                let cap = CapabilityData::new(format!(
                    "arn:aws:rds:{}:{}:db:{}",
                    ctx.region, ctx.account, qualified
                ))
                .with_field("host", host)
                .with_field("port", port)
                .with_field("dbName", db_name)
                .with_field(
                    "secretArn",
                    format!(
                        "arn:aws:secretsmanager:{}:{}:secret:{}/credentials",
                        ctx.region, ctx.account, qualified
                    ),
                );
                capabilities.insert(names::DATABASE_RDS.to_owned(), cap);
            }
            "queue" => {
                let fifo = config.pointer_bool("/fifo").unwrap_or(false);
                let queue_name = if fifo {
                    format!("{}.fifo", qualified)
                } else {
                    qualified.clone()
                };

                let cap = CapabilityData::new(format!(
                    "arn:aws:sqs:{}:{}:{}",
                    ctx.region, ctx.account, queue_name
                ))
                .with_field("queueName", queue_name.clone())
                .with_field(
                    "queueUrl",
                    format!(
                        "https://sqs.{}.amazonaws.com/{}/{}",
                        ctx.region, ctx.account, queue_name
                    ),
                );
                capabilities.insert(names::QUEUE_SQS.to_owned(), cap);
            }
            "secret" => {
                let cap = CapabilityData::new(format!(
                    "arn:aws:secretsmanager:{}:{}:secret:{}",
                    ctx.region, ctx.account, qualified
                ));
                capabilities.insert(names::SECRET_SECRETSMANAGER.to_owned(), cap);
            }
            "compute" => {
                let cap = CapabilityData::new(format!(
                    "arn:aws:lambda:{}:{}:function:{}",
                    ctx.region, ctx.account, qualified
                ))
                .with_field(
                    "runtime",
                    config.pointer_str("/runtime").unwrap_or("node18").to_owned(),
                );
                capabilities.insert(names::COMPUTE_FUNCTION.to_owned(), cap);
            }
            other => {
                tracing::debug!("no reference capabilities for component type {}", other);
            }
        }

        Ok(capabilities)
    }
}
