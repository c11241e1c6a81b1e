//! Core data structures for stratus.
//!
//! This module contains the foundational types used throughout the planner:
//! - Component and binding declarations
//! - The per-resolution context and compliance framework
//! - Capability contracts
//! - The hydrated service manifest
//! - The component synthesis seam

pub mod capability;
pub mod component;
pub mod context;
pub mod manifest;
pub mod synth;

pub use capability::{CapabilityData, CapabilityMap};
pub use component::{AccessLevel, BindingDirective, ComponentSpec, TriggerDirective};
pub use context::{ComplianceFramework, ComponentContext, ConfigBuilderContext};
pub use manifest::{ServiceManifest, DEFAULT_ENVIRONMENTS};
pub use synth::{ComponentSynthesizer, SynthesizedComponent, SynthesizerSet};
