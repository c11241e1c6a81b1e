//! Capability-based binder matrix and strategy dispatch.

pub mod matrix;
pub mod report;
pub mod strategies;
pub mod strategy;

pub use matrix::{BinderMatrix, MatrixReport};
pub use report::CompatibilityReport;
pub use strategy::{
    AuthorizationStatement, BinderStrategy, BindingContext, BindingOutcome, CompatibilityEntry,
    StrategyError, TriggerStrategy,
};
