//! Query Validator
//!
//! Validates what a daemon is about to run before it reaches an execution
//! engine:
//!
//! - **SQL queries**: grammar, placeholders and chain rules for SUI, EVM and APTOS
//! - **Render queries**: chain-independent queries that must yield named fields
//! - **AssemblyScript bytecode**: module structure, host imports and size ceilings
//!
//! Each call returns one [`ValidationOutcome`]. See [`boundary`] for the
//! raw-selector entry points used by host processes.

#![allow(clippy::result_large_err)]

pub mod boundary;

pub use query_validator_core::{
    validate_assembly_script_bytecode, validate_sql, validate_sql_renders, ChainRules, ChainType,
    ErrorKind, GrammarDialect, ParameterContext, ParameterContextBuilder, Position, Registry,
    Status, ValidateError, ValidationLimits, ValidationOutcome,
};
