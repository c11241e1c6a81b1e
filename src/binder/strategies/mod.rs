//! Built-in binding and trigger strategies.
//!
//! One file per (source-kind, capability) pair. Strategies never inspect
//! global compliance state; framework-driven behavior reaches them already
//! resolved into binding options and component configs.

pub mod database;
pub mod queue;
pub mod secret;

pub use database::ComputeToDatabaseStrategy;
pub use queue::{ComputeToQueueStrategy, QueueMessageTriggerStrategy};
pub use secret::ComputeToSecretStrategy;
