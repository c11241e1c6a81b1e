//! High-level operations.
//!
//! This module contains the implementation of stratus commands.

pub mod matrix;
pub mod plan;
pub mod validate;

pub use matrix::matrix_report;
pub use plan::{format_plan, plan, PlanOptions, PlanOutput};
pub use validate::{format_validation, validate, ValidateOptions, ValidateOutput};
