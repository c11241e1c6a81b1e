//! Resolution context shared by every component in one pass.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::component::ComponentSpec;

/// Governance posture selecting a configuration default layer.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum ComplianceFramework {
    /// Standard commercial posture (default)
    #[default]
    Commercial,
    /// FedRAMP Moderate baseline
    FedrampModerate,
    /// FedRAMP High baseline
    FedrampHigh,
}

impl ComplianceFramework {
    /// Kebab-case name as it appears in manifests.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceFramework::Commercial => "commercial",
            ComplianceFramework::FedrampModerate => "fedramp-moderate",
            ComplianceFramework::FedrampHigh => "fedramp-high",
        }
    }
}

impl fmt::Display for ComplianceFramework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplianceFramework {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "commercial" => Ok(ComplianceFramework::Commercial),
            "fedramp-moderate" => Ok(ComplianceFramework::FedrampModerate),
            "fedramp-high" => Ok(ComplianceFramework::FedrampHigh),
            other => Err(format!("unknown compliance framework `{}`", other)),
        }
    }
}

/// Per-resolution environment, supplied once per manifest resolution and
/// shared read-only by all components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentContext {
    /// Service name from the manifest's `service` field
    pub service_name: String,
    /// Owning team from the manifest's `owner` field
    pub owner: String,
    /// Active target environment (e.g. `dev`, `prod`)
    pub environment: String,
    /// Governance posture for this resolution
    pub compliance_framework: ComplianceFramework,
    /// Deployment region
    pub region: String,
    /// Account identifier
    pub account: String,
    /// Service-wide tags propagated to every component
    pub tags: BTreeMap<String, String>,
}

/// Pairs the shared context with one component spec; scoped to a single
/// component's config resolution.
#[derive(Debug, Clone, Copy)]
pub struct ConfigBuilderContext<'a> {
    /// Shared resolution context
    pub context: &'a ComponentContext,
    /// The component being resolved
    pub spec: &'a ComponentSpec,
}

impl<'a> ConfigBuilderContext<'a> {
    pub fn new(context: &'a ComponentContext, spec: &'a ComponentSpec) -> Self {
        ConfigBuilderContext { context, spec }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framework_round_trips_through_serde() {
        let json = serde_json::to_string(&ComplianceFramework::FedrampModerate).unwrap();
        assert_eq!(json, "\"fedramp-moderate\"");
        let back: ComplianceFramework = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ComplianceFramework::FedrampModerate);
    }

    #[test]
    fn framework_defaults_to_commercial() {
        assert_eq!(
            ComplianceFramework::default(),
            ComplianceFramework::Commercial
        );
    }

    #[test]
    fn framework_rejects_unknown_name() {
        assert!("fedramp-low".parse::<ComplianceFramework>().is_err());
    }
}
