//! Compute-to-queue binding and the queue-message trigger.
//!
//! Binding environment (prefix defaults to `QUEUE_`, overridable via
//! `envPrefix`): `{P}URL`, `{P}NAME`, `{P}ARN`, plus `{P}REQUIRE_TLS=true`
//! when `requireSecureAccess` is set.
//!
//! The trigger wires a queue's messages into a compute handler and injects
//! `EVENT_SOURCE_QUEUE_ARN` and `EVENT_SOURCE_BATCH_SIZE` into the handler.

use serde_json::Value;

use crate::binder::strategy::{
    AuthorizationStatement, BinderStrategy, BindingContext, BindingOutcome, CompatibilityEntry,
    StrategyError, TriggerStrategy,
};
use crate::core::capability::{events, names, CapabilityData};
use crate::core::component::AccessLevel;
use crate::core::synth::SynthesizedComponent;

fn queue_capability<'a>(
    target: &'a SynthesizedComponent,
) -> Result<&'a CapabilityData, StrategyError> {
    target
        .capability(names::QUEUE_SQS)
        .ok_or_else(|| StrategyError::MissingCapability {
            component: target.name.clone(),
            capability: names::QUEUE_SQS.to_owned(),
        })
}

pub struct ComputeToQueueStrategy;

impl ComputeToQueueStrategy {
    fn actions_for(&self, access: AccessLevel) -> Vec<String> {
        let actions: &[&str] = match access {
            AccessLevel::Read => &["sqs:ReceiveMessage", "sqs:GetQueueAttributes"],
            AccessLevel::Write => &["sqs:SendMessage", "sqs:GetQueueAttributes"],
            AccessLevel::Admin => &["sqs:PurgeQueue", "sqs:SetQueueAttributes"],
        };
        actions.iter().map(|a| (*a).to_string()).collect()
    }
}

impl BinderStrategy for ComputeToQueueStrategy {
    fn name(&self) -> &'static str {
        "compute-to-queue"
    }

    fn can_handle(&self, source_type: &str, capability: &str) -> bool {
        source_type == "compute" && capability == names::QUEUE_SQS
    }

    fn bind(
        &self,
        _source: &SynthesizedComponent,
        target: &SynthesizedComponent,
        access: &[AccessLevel],
        ctx: &BindingContext<'_>,
    ) -> Result<BindingOutcome, StrategyError> {
        let cap = queue_capability(target)?;

        let mut outcome = BindingOutcome::default();
        for level in access {
            outcome.statements.push(AuthorizationStatement::allow(
                self.actions_for(*level),
                cap.resource_arn.clone(),
            ));
        }

        let prefix = ctx.option_str("envPrefix").unwrap_or("QUEUE_").to_owned();
        if let Some(url) = cap.field_str("queueUrl") {
            outcome
                .environment
                .insert(format!("{}URL", prefix), url.to_owned());
        }
        if let Some(name) = cap.field_str("queueName") {
            outcome
                .environment
                .insert(format!("{}NAME", prefix), name.to_owned());
        }
        outcome
            .environment
            .insert(format!("{}ARN", prefix), cap.resource_arn.clone());

        if ctx.option_bool("requireSecureAccess") {
            outcome
                .environment
                .insert(format!("{}REQUIRE_TLS", prefix), "true".to_owned());
            outcome.hardening.push("requireSecureAccess".to_owned());
        }

        Ok(outcome)
    }

    fn compatibility_matrix(&self) -> Vec<CompatibilityEntry> {
        vec![CompatibilityEntry {
            source_type: "compute".to_owned(),
            target_type: "queue".to_owned(),
            capability: names::QUEUE_SQS.to_owned(),
            description: "Let a compute component publish to or consume a queue".to_owned(),
        }]
    }
}

/// Queue messages invoke a compute handler.
pub struct QueueMessageTriggerStrategy;

impl TriggerStrategy for QueueMessageTriggerStrategy {
    fn name(&self) -> &'static str {
        "queue-message-trigger"
    }

    fn can_handle(&self, source_type: &str, target_type: &str, event_type: &str) -> bool {
        source_type == "compute" && target_type == "queue" && event_type == events::QUEUE_MESSAGE
    }

    fn trigger(
        &self,
        _source: &SynthesizedComponent,
        target: &SynthesizedComponent,
        ctx: &BindingContext<'_>,
    ) -> Result<BindingOutcome, StrategyError> {
        let cap = queue_capability(target)?;

        let batch_size = ctx
            .options
            .get("batchSize")
            .and_then(Value::as_u64)
            .unwrap_or(10);

        let mut outcome = BindingOutcome::default();
        outcome.statements.push(AuthorizationStatement::allow(
            vec![
                "sqs:ReceiveMessage".to_owned(),
                "sqs:DeleteMessage".to_owned(),
                "sqs:GetQueueAttributes".to_owned(),
            ],
            cap.resource_arn.clone(),
        ));
        outcome
            .environment
            .insert("EVENT_SOURCE_QUEUE_ARN".to_owned(), cap.resource_arn.clone());
        outcome.environment.insert(
            "EVENT_SOURCE_BATCH_SIZE".to_owned(),
            batch_size.to_string(),
        );

        Ok(outcome)
    }

    fn compatibility_matrix(&self) -> Vec<CompatibilityEntry> {
        vec![CompatibilityEntry {
            source_type: "compute".to_owned(),
            target_type: "queue".to_owned(),
            capability: events::QUEUE_MESSAGE.to_owned(),
            description: "Invoke a compute component for each queue message".to_owned(),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn queue() -> SynthesizedComponent {
        let mut component = SynthesizedComponent::new("jobs", "queue");
        component.capabilities.insert(
            names::QUEUE_SQS.to_owned(),
            CapabilityData::new("arn:aws:sqs:us-east-1:123:orders-jobs")
                .with_field("queueName", "orders-jobs")
                .with_field("queueUrl", "https://sqs.us-east-1.amazonaws.com/123/orders-jobs"),
        );
        component
    }

    fn ctx<'a>(options: &'a BTreeMap<String, Value>) -> BindingContext<'a> {
        BindingContext {
            region: "us-east-1",
            account: "123",
            environment: "dev",
            compliance_framework: Default::default(),
            options,
        }
    }

    #[test]
    fn write_access_grants_send_not_receive() {
        let options = BTreeMap::new();
        let source = SynthesizedComponent::new("api", "compute");
        let outcome = ComputeToQueueStrategy
            .bind(&source, &queue(), &[AccessLevel::Write], &ctx(&options))
            .unwrap();

        let statement = &outcome.statements[0];
        assert!(statement.actions.contains(&"sqs:SendMessage".to_owned()));
        assert!(!statement.actions.contains(&"sqs:ReceiveMessage".to_owned()));
        assert_eq!(statement.resource, "arn:aws:sqs:us-east-1:123:orders-jobs");
    }

    #[test]
    fn trigger_wires_event_source_environment() {
        let mut options = BTreeMap::new();
        options.insert("batchSize".to_owned(), serde_json::json!(25));
        let handler = SynthesizedComponent::new("worker", "compute");
        let outcome = QueueMessageTriggerStrategy
            .trigger(&handler, &queue(), &ctx(&options))
            .unwrap();

        assert_eq!(
            outcome
                .environment
                .get("EVENT_SOURCE_BATCH_SIZE")
                .map(String::as_str),
            Some("25")
        );
        assert!(outcome
            .environment
            .contains_key("EVENT_SOURCE_QUEUE_ARN"));
    }

    #[test]
    fn trigger_only_handles_queue_message_events() {
        assert!(QueueMessageTriggerStrategy.can_handle("compute", "queue", "queue:message"));
        assert!(!QueueMessageTriggerStrategy.can_handle("compute", "queue", "queue:purged"));
        assert!(!QueueMessageTriggerStrategy.can_handle("database", "queue", "queue:message"));
    }
}
