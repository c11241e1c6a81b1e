//! Stratus - a compliance-aware service manifest resolver and deployment
//! planner
//!
//! This crate provides the core library functionality for stratus,
//! including manifest validation, configuration layering, capability
//! binding, and orchestration.

pub mod binder;
pub mod config;
pub mod core;
pub mod engine;
pub mod ops;
pub mod util;
pub mod validation;

/// Shared fixtures for stratus unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests.
#[cfg(test)]
pub mod test_support;

pub use core::{
    component::ComponentSpec, context::ComplianceFramework, context::ComponentContext,
    manifest::ServiceManifest, synth::SynthesizedComponent,
};

pub use binder::BinderMatrix;
pub use engine::{OrchestrationResult, Orchestrator};
pub use util::config::Config;
