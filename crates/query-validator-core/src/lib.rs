//! Query Validator Core
//!
//! Chain-aware validation engine for daemon queries and modules.
//!
//! Every entry point is a pure, synchronous function of its inputs and the
//! immutable [`Registry`]; the same inputs always produce the same
//! [`ValidationOutcome`].
//!
//! # Core Modules
//!
//! - [`registry`]: per-chain dialect, schema, functions and bytecode policy
//! - [`sql`]: SQL parsing, placeholder resolution and semantic checks
//! - [`render`]: render query field and directive checks
//! - [`bytecode`]: AssemblyScript module checks
//! - [`reporter`]: mapping of [`ValidateError`] onto outcomes
//!
//! # Example
//!
//! ```
//! use query_validator_core::{validate_sql, ChainType, ParameterContextBuilder};
//!
//! let params = ParameterContextBuilder::new().with("min_height", "100").build();
//! let outcome = validate_sql(
//!     ChainType::Evm,
//!     "SELECT * FROM blocks WHERE height > ${min_height}",
//!     &params,
//! );
//! assert!(outcome.is_pass());
//! ```

#![allow(clippy::result_large_err)]

pub mod bytecode;
pub mod errors;
pub mod limits;
pub mod registry;
pub mod render;
pub mod reporter;
pub mod sql;

pub use bytecode::{BytecodeValidator, ModuleSummary};
pub use errors::{LimitBound, Position, RuleScope, ValidateError};
pub use limits::ValidationLimits;
pub use query_validator_types::{
    ChainType, ErrorKind, ParameterContext, ParameterContextBuilder, Status, ValidationOutcome,
};
pub use registry::{BytecodePolicy, ChainRules, DialectRules, GrammarDialect, Registry, TableDef};
pub use render::RenderValidator;
pub use sql::SqlValidator;

use tracing::debug;

impl Registry {
    /// Validate a daemon SQL query for `chain`.
    pub fn validate_sql(
        &self,
        chain: ChainType,
        query: &str,
        params: &ParameterContext,
    ) -> ValidationOutcome {
        debug!(chain = %chain, bytes = query.len(), params = params.len(), "validating SQL query");
        let result =
            SqlValidator::new(&self.rules_for(chain).sql, self.limits()).validate(query, params);
        reporter::report(result)
    }

    /// Validate a render query. Render rules do not depend on the chain.
    pub fn validate_sql_renders(&self, query: &str, params: &ParameterContext) -> ValidationOutcome {
        debug!(bytes = query.len(), params = params.len(), "validating render query");
        let result =
            RenderValidator::new(self.render_rules(), self.limits()).validate(query, params);
        reporter::report(result)
    }

    /// Validate a compiled AssemblyScript module for `chain`.
    pub fn validate_assembly_script_bytecode(
        &self,
        chain: ChainType,
        bytes: &[u8],
    ) -> ValidationOutcome {
        debug!(chain = %chain, bytes = bytes.len(), "validating AssemblyScript bytecode");
        reporter::report(bytecode::validate_module(self, chain, bytes))
    }
}

/// [`Registry::validate_sql`] on the global registry.
pub fn validate_sql(chain: ChainType, query: &str, params: &ParameterContext) -> ValidationOutcome {
    Registry::global().validate_sql(chain, query, params)
}

/// [`Registry::validate_sql_renders`] on the global registry.
pub fn validate_sql_renders(query: &str, params: &ParameterContext) -> ValidationOutcome {
    Registry::global().validate_sql_renders(query, params)
}

/// [`Registry::validate_assembly_script_bytecode`] on the global registry.
pub fn validate_assembly_script_bytecode(chain: ChainType, bytes: &[u8]) -> ValidationOutcome {
    Registry::global().validate_assembly_script_bytecode(chain, bytes)
}
