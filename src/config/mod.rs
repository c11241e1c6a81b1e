//! Configuration precedence resolution.
//!
//! Turns partial, environment- and compliance-framework-specific overrides
//! into one concrete, schema-valid configuration per component.

pub mod layers;
pub mod merge;
pub mod resolver;
pub mod schemas;

pub use layers::{
    materialize_layers, ConfigLayers, ConfigSourceError, HttpConfigSource, MaterializedLayers,
    PlatformConfigSource, StaticConfigSource,
};
pub use merge::deep_merge;
pub use resolver::{resolve, resolve_with_layers, ConfigResolutionError, ResolvedConfig};
