//! Compute-to-secret binding.
//!
//! Injects `{P}ARN` (prefix defaults to `SECRET_`) and grants read or write
//! against the specific secret. `admin` access is not a valid level for
//! secrets and fails strategy execution. The `enableKeyRotation` option
//! marks the binding hardened and exposes `{P}ROTATION_ENABLED=true`.

use crate::binder::strategy::{
    AuthorizationStatement, BinderStrategy, BindingContext, BindingOutcome, CompatibilityEntry,
    StrategyError,
};
use crate::core::capability::names;
use crate::core::component::AccessLevel;
use crate::core::synth::SynthesizedComponent;

pub struct ComputeToSecretStrategy;

impl BinderStrategy for ComputeToSecretStrategy {
    fn name(&self) -> &'static str {
        "compute-to-secret"
    }

    fn can_handle(&self, source_type: &str, capability: &str) -> bool {
        source_type == "compute" && capability == names::SECRET_SECRETSMANAGER
    }

    fn bind(
        &self,
        _source: &SynthesizedComponent,
        target: &SynthesizedComponent,
        access: &[AccessLevel],
        ctx: &BindingContext<'_>,
    ) -> Result<BindingOutcome, StrategyError> {
        let cap = target
            .capability(names::SECRET_SECRETSMANAGER)
            .ok_or_else(|| StrategyError::MissingCapability {
                component: target.name.clone(),
                capability: names::SECRET_SECRETSMANAGER.to_owned(),
            })?;

        let mut outcome = BindingOutcome::default();
        for level in access {
            let actions: &[&str] = match level {
                AccessLevel::Read => &[
                    "secretsmanager:GetSecretValue",
                    "secretsmanager:DescribeSecret",
                ],
                AccessLevel::Write => &["secretsmanager:PutSecretValue"],
                AccessLevel::Admin => {
                    return Err(StrategyError::UnsupportedAccessLevel {
                        strategy: self.name().to_owned(),
                        access: *level,
                        capability: names::SECRET_SECRETSMANAGER.to_owned(),
                    });
                }
            };
            outcome.statements.push(AuthorizationStatement::allow(
                actions.iter().map(|a| (*a).to_string()).collect(),
                cap.resource_arn.clone(),
            ));
        }

        let prefix = ctx.option_str("envPrefix").unwrap_or("SECRET_").to_owned();
        outcome
            .environment
            .insert(format!("{}ARN", prefix), cap.resource_arn.clone());

        if ctx.option_bool("enableKeyRotation") {
            outcome
                .environment
                .insert(format!("{}ROTATION_ENABLED", prefix), "true".to_owned());
            outcome.hardening.push("enableKeyRotation".to_owned());
        }

        Ok(outcome)
    }

    fn compatibility_matrix(&self) -> Vec<CompatibilityEntry> {
        vec![CompatibilityEntry {
            source_type: "compute".to_owned(),
            target_type: "secret".to_owned(),
            capability: names::SECRET_SECRETSMANAGER.to_owned(),
            description: "Give a compute component access to a managed secret".to_owned(),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::capability::CapabilityData;
    use std::collections::BTreeMap;

    fn secret() -> SynthesizedComponent {
        let mut component = SynthesizedComponent::new("api-key", "secret");
        component.capabilities.insert(
            names::SECRET_SECRETSMANAGER.to_owned(),
            CapabilityData::new("arn:aws:secretsmanager:us-east-1:123:secret:orders-api-key"),
        );
        component
    }

    fn ctx<'a>(options: &'a BTreeMap<String, serde_json::Value>) -> BindingContext<'a> {
        BindingContext {
            region: "us-east-1",
            account: "123",
            environment: "dev",
            compliance_framework: Default::default(),
            options,
        }
    }

    #[test]
    fn admin_access_is_rejected() {
        let options = BTreeMap::new();
        let source = SynthesizedComponent::new("api", "compute");
        let err = ComputeToSecretStrategy
            .bind(&source, &secret(), &[AccessLevel::Admin], &ctx(&options))
            .unwrap_err();
        assert!(matches!(err, StrategyError::UnsupportedAccessLevel { .. }));
    }

    #[test]
    fn read_access_injects_arn() {
        let options = BTreeMap::new();
        let source = SynthesizedComponent::new("api", "compute");
        let outcome = ComputeToSecretStrategy
            .bind(&source, &secret(), &[AccessLevel::Read], &ctx(&options))
            .unwrap();

        assert_eq!(
            outcome.environment.get("SECRET_ARN").map(String::as_str),
            Some("arn:aws:secretsmanager:us-east-1:123:secret:orders-api-key")
        );
    }

    #[test]
    fn key_rotation_option_is_recorded_as_hardening() {
        let mut options = BTreeMap::new();
        options.insert("enableKeyRotation".to_owned(), serde_json::json!(true));
        let source = SynthesizedComponent::new("api", "compute");
        let outcome = ComputeToSecretStrategy
            .bind(&source, &secret(), &[AccessLevel::Read], &ctx(&options))
            .unwrap();
        assert_eq!(outcome.hardening, vec!["enableKeyRotation"]);
        assert!(outcome.environment.contains_key("SECRET_ROTATION_ENABLED"));
    }
}
