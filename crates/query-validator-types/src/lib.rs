//! Shared types for the query-validator workspace.
//!
//! This crate holds the values that cross the validator boundary:
//! - [`ChainType`] - the closed chain selector and its raw-integer conversion
//! - [`ParameterContextBuilder`] / [`ParameterContext`] - placeholder values
//! - [`ValidationOutcome`] / [`ErrorKind`] - the single result of a call

pub mod chain;
pub mod env_utils;
pub mod outcome;
pub mod parameters;

pub use chain::{ChainType, InvalidChainSelector, UnknownChainName};
pub use outcome::{ErrorKind, Status, ValidationOutcome};
pub use parameters::{ParameterContext, ParameterContextBuilder};
