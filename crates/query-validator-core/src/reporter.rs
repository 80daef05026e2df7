//! Maps engine results onto [`ValidationOutcome`].

use crate::errors::ValidateError;
use query_validator_types::ValidationOutcome;
use tracing::debug;

impl From<ValidateError> for ValidationOutcome {
    fn from(err: ValidateError) -> Self {
        ValidationOutcome::fail(err.kind(), err.to_string())
    }
}

/// Pass with an empty message, or fail with the error's kind and text.
pub fn report(result: Result<(), ValidateError>) -> ValidationOutcome {
    match result {
        Ok(()) => ValidationOutcome::pass(),
        Err(err) => {
            debug!(kind = %err.kind(), code = %err.kind().code(), "validation failed: {}", err);
            err.into()
        }
    }
}
