//! Compute-to-database binding.
//!
//! Environment variables injected into the source (prefix defaults to `DB_`,
//! overridable via the `envPrefix` option):
//! `{P}HOST`, `{P}PORT`, `{P}NAME`, `{P}RESOURCE_ARN`, `{P}SECRET_ARN`,
//! plus `{P}SSL_MODE=require` when `requireSecureAccess` is set.

use crate::binder::strategy::{
    AuthorizationStatement, BinderStrategy, BindingContext, BindingOutcome, CompatibilityEntry,
    StrategyError,
};
use crate::core::capability::names;
use crate::core::component::AccessLevel;
use crate::core::synth::SynthesizedComponent;

pub struct ComputeToDatabaseStrategy;

impl ComputeToDatabaseStrategy {
    fn actions_for(&self, access: AccessLevel) -> Vec<String> {
        let actions: &[&str] = match access {
            AccessLevel::Read => &["db:Connect", "db:Select"],
            AccessLevel::Write => &["db:Connect", "db:Insert", "db:Update", "db:Delete"],
            AccessLevel::Admin => &["db:Connect", "db:Administer"],
        };
        actions.iter().map(|a| (*a).to_string()).collect()
    }
}

impl BinderStrategy for ComputeToDatabaseStrategy {
    fn name(&self) -> &'static str {
        "compute-to-database"
    }

    fn can_handle(&self, source_type: &str, capability: &str) -> bool {
        source_type == "compute" && capability == names::DATABASE_RDS
    }

    fn bind(
        &self,
        _source: &SynthesizedComponent,
        target: &SynthesizedComponent,
        access: &[AccessLevel],
        ctx: &BindingContext<'_>,
    ) -> Result<BindingOutcome, StrategyError> {
        let cap = target.capability(names::DATABASE_RDS).ok_or_else(|| {
            StrategyError::MissingCapability {
                component: target.name.clone(),
                capability: names::DATABASE_RDS.to_owned(),
            }
        })?;

        let host = cap
            .field_str("host")
            .ok_or_else(|| StrategyError::MissingCapabilityField {
                component: target.name.clone(),
                capability: names::DATABASE_RDS.to_owned(),
                field: "host".to_owned(),
            })?;
        let port = cap
            .field_u64("port")
            .ok_or_else(|| StrategyError::MissingCapabilityField {
                component: target.name.clone(),
                capability: names::DATABASE_RDS.to_owned(),
                field: "port".to_owned(),
            })?;
        let db_name = cap
            .field_str("dbName")
            .ok_or_else(|| StrategyError::MissingCapabilityField {
                component: target.name.clone(),
                capability: names::DATABASE_RDS.to_owned(),
                field: "dbName".to_owned(),
            })?;

        let mut outcome = BindingOutcome::default();
        for level in access {
            outcome.statements.push(AuthorizationStatement::allow(
                self.actions_for(*level),
                cap.resource_arn.clone(),
            ));
        }
        if let Some(secret_arn) = cap.field_str("secretArn") {
            outcome.statements.push(AuthorizationStatement::allow(
                vec!["secretsmanager:GetSecretValue".to_owned()],
                secret_arn.to_owned(),
            ));
        }

        let prefix = ctx.option_str("envPrefix").unwrap_or("DB_").to_owned();
        outcome
            .environment
            .insert(format!("{}HOST", prefix), host.to_owned());
        outcome
            .environment
            .insert(format!("{}PORT", prefix), port.to_string());
        outcome
            .environment
            .insert(format!("{}NAME", prefix), db_name.to_owned());
        outcome.environment.insert(
            format!("{}RESOURCE_ARN", prefix),
            cap.resource_arn.clone(),
        );
        if let Some(secret_arn) = cap.field_str("secretArn") {
            outcome
                .environment
                .insert(format!("{}SECRET_ARN", prefix), secret_arn.to_owned());
        }

        if ctx.option_bool("requireSecureAccess") {
            outcome
                .environment
                .insert(format!("{}SSL_MODE", prefix), "require".to_owned());
            outcome.hardening.push("requireSecureAccess".to_owned());
        }

        Ok(outcome)
    }

    fn compatibility_matrix(&self) -> Vec<CompatibilityEntry> {
        vec![CompatibilityEntry {
            source_type: "compute".to_owned(),
            target_type: "database".to_owned(),
            capability: names::DATABASE_RDS.to_owned(),
            description: "Connect a compute component to a relational database".to_owned(),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::capability::CapabilityData;
    use std::collections::BTreeMap;

    fn target() -> SynthesizedComponent {
        let mut component = SynthesizedComponent::new("db", "database");
        component.capabilities.insert(
            names::DATABASE_RDS.to_owned(),
            CapabilityData::new("arn:aws:rds:us-east-1:123:db:orders-db")
                .with_field("host", "orders-db.us-east-1.rds.internal")
                .with_field("port", 5432)
                .with_field("dbName", "db")
                .with_field("secretArn", "arn:aws:secretsmanager:us-east-1:123:secret:x"),
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
    fn read_access_grants_scoped_read_actions_only() {
        let options = BTreeMap::new();
        let source = SynthesizedComponent::new("api", "compute");
        let outcome = ComputeToDatabaseStrategy
            .bind(&source, &target(), &[AccessLevel::Read], &ctx(&options))
            .unwrap();

        let db_statement = &outcome.statements[0];
        assert_eq!(db_statement.resource, "arn:aws:rds:us-east-1:123:db:orders-db");
        assert!(db_statement.actions.contains(&"db:Select".to_owned()));
        assert!(!db_statement.actions.contains(&"db:Insert".to_owned()));
    }

    #[test]
    fn injects_host_port_name_triple() {
        let options = BTreeMap::new();
        let source = SynthesizedComponent::new("api", "compute");
        let outcome = ComputeToDatabaseStrategy
            .bind(&source, &target(), &[AccessLevel::Read], &ctx(&options))
            .unwrap();

        assert_eq!(
            outcome.environment.get("DB_HOST").map(String::as_str),
            Some("orders-db.us-east-1.rds.internal")
        );
        assert_eq!(
            outcome.environment.get("DB_PORT").map(String::as_str),
            Some("5432")
        );
        assert_eq!(
            outcome.environment.get("DB_NAME").map(String::as_str),
            Some("db")
        );
    }

    #[test]
    fn env_prefix_option_renames_variables() {
        let mut options = BTreeMap::new();
        options.insert("envPrefix".to_owned(), serde_json::json!("ORDERS_"));
        let source = SynthesizedComponent::new("api", "compute");
        let outcome = ComputeToDatabaseStrategy
            .bind(&source, &target(), &[AccessLevel::Read], &ctx(&options))
            .unwrap();

        assert!(outcome.environment.contains_key("ORDERS_HOST"));
        assert!(!outcome.environment.contains_key("DB_HOST"));
    }

    #[test]
    fn secure_access_option_sets_ssl_mode() {
        let mut options = BTreeMap::new();
        options.insert("requireSecureAccess".to_owned(), serde_json::json!(true));
        let source = SynthesizedComponent::new("api", "compute");
        let outcome = ComputeToDatabaseStrategy
            .bind(&source, &target(), &[AccessLevel::Read], &ctx(&options))
            .unwrap();

        assert_eq!(
            outcome.environment.get("DB_SSL_MODE").map(String::as_str),
            Some("require")
        );
        assert_eq!(outcome.hardening, vec!["requireSecureAccess"]);
    }

    #[test]
    fn missing_capability_is_an_error() {
        let options = BTreeMap::new();
        let source = SynthesizedComponent::new("api", "compute");
        let bare = SynthesizedComponent::new("db", "database");
        let err = ComputeToDatabaseStrategy
            .bind(&source, &bare, &[AccessLevel::Read], &ctx(&options))
            .unwrap_err();
        assert!(matches!(err, StrategyError::MissingCapability { .. }));
    }
}
