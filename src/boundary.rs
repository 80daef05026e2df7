//! Entry points for host processes.
//!
//! Chains arrive as raw selectors (`0` = SUI, `1` = EVM, `2` = APTOS) and are
//! checked here; the engine below only ever sees a [`ChainType`]. Each call
//! returns an [`OwnedOutcome`] that the caller gives back through
//! [`release_outcome`]. No panic crosses this module: a panic inside the
//! engine becomes a fail outcome.
//!
//! ```
//! use query_validator::boundary::{
//!     append_parameter, create_parameter_context, release_outcome, validate_sql,
//! };
//!
//! let mut params = create_parameter_context();
//! append_parameter(&mut params, "min_height", "100");
//!
//! let outcome = validate_sql(1, "SELECT * FROM blocks WHERE height > ${min_height}", params);
//! assert!(outcome.is_pass());
//! release_outcome(outcome);
//! ```

use query_validator_core::{
    validate_assembly_script_bytecode as engine_validate_bytecode,
    validate_sql as engine_validate_sql, validate_sql_renders as engine_validate_renders,
    ChainType, ErrorKind, ParameterContextBuilder, Status, ValidateError, ValidationOutcome,
};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{error, trace};

/// A validation outcome owned by the caller until [`release_outcome`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedOutcome {
    outcome: ValidationOutcome,
}

impl OwnedOutcome {
    fn new(outcome: ValidationOutcome) -> Self {
        Self { outcome }
    }

    pub fn status(&self) -> Status {
        self.outcome.status()
    }

    pub fn is_pass(&self) -> bool {
        self.outcome.is_pass()
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        self.outcome.kind()
    }

    /// Diagnostic text; empty on pass.
    pub fn message(&self) -> &str {
        self.outcome.message()
    }

    pub fn outcome(&self) -> &ValidationOutcome {
        &self.outcome
    }

    pub fn into_outcome(self) -> ValidationOutcome {
        self.outcome
    }
}

fn panic_detail(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

/// Run `operation`, turning a panic into a fail outcome of `kind`.
fn guarded<F>(name: &'static str, kind: ErrorKind, operation: F) -> OwnedOutcome
where
    F: FnOnce() -> ValidationOutcome,
{
    match panic::catch_unwind(AssertUnwindSafe(operation)) {
        Ok(outcome) => OwnedOutcome::new(outcome),
        Err(payload) => {
            let detail = panic_detail(payload.as_ref());
            error!(operation = name, detail, "validator panicked");
            OwnedOutcome::new(ValidationOutcome::fail(
                kind,
                format!("{}: internal validator error: {}", kind, detail),
            ))
        }
    }
}

fn select_chain(raw: u8) -> Result<ChainType, ValidationOutcome> {
    ChainType::try_from(raw).map_err(|invalid| ValidateError::InvalidChainSelector(invalid.0).into())
}

/// Validate a daemon SQL query. Consumes the parameter bag.
pub fn validate_sql(chain: u8, query: &str, parameters: ParameterContextBuilder) -> OwnedOutcome {
    guarded("validate_sql", ErrorKind::SyntaxError, move || {
        let chain = match select_chain(chain) {
            Ok(chain) => chain,
            Err(outcome) => return outcome,
        };
        engine_validate_sql(chain, query, &parameters.build())
    })
}

/// Validate a render query. Consumes the parameter bag.
pub fn validate_sql_renders(query: &str, parameters: ParameterContextBuilder) -> OwnedOutcome {
    guarded("validate_sql_renders", ErrorKind::SyntaxError, move || {
        engine_validate_renders(query, &parameters.build())
    })
}

/// Validate a compiled AssemblyScript module.
pub fn validate_assembly_script_bytecode(chain: u8, bytes: &[u8]) -> OwnedOutcome {
    guarded(
        "validate_assembly_script_bytecode",
        ErrorKind::BytecodeFormatError,
        move || {
            let chain = match select_chain(chain) {
                Ok(chain) => chain,
                Err(outcome) => return outcome,
            };
            engine_validate_bytecode(chain, bytes)
        },
    )
}

/// Give an outcome back. Taking it by value makes a second release a
/// compile error.
pub fn release_outcome(outcome: OwnedOutcome) {
    trace!(status = ?outcome.status(), "released outcome");
    drop(outcome);
}

/// Start an empty parameter bag.
pub fn create_parameter_context() -> ParameterContextBuilder {
    ParameterContextBuilder::new()
}

/// Append one `key = value` pair; later values win on lookup.
pub fn append_parameter(context: &mut ParameterContextBuilder, key: &str, value: &str) {
    context.append(key, value);
}
