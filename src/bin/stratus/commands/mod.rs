//! Command implementations.

pub mod completions;
pub mod matrix;
pub mod plan;
pub mod validate;
