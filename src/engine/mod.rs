//! Sequential orchestration engine.

pub mod orchestrator;
pub mod result;

pub use orchestrator::{OrchestrationError, OrchestrationOptions, Orchestrator};
pub use result::{BindingKind, BindingRecord, ComponentRecord, OrchestrationResult};
