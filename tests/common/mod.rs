#![allow(dead_code)]
//! Shared test utilities for integration tests.
//!
//! - `wasm`: hand-encoded WebAssembly modules
//! - assertion helpers for validation outcomes

pub mod wasm;

pub use wasm::ModuleBuilder;

use query_validator::{ErrorKind, ValidationOutcome};

/// Assert that an outcome passed, showing the diagnostic otherwise.
pub fn assert_pass(outcome: &ValidationOutcome, context: &str) {
    assert!(
        outcome.is_pass(),
        "{} should pass but failed: {}",
        context,
        outcome.message()
    );
    assert!(outcome.message().is_empty());
}

/// Assert that an outcome failed with `kind` and return its message.
pub fn assert_fail<'a>(outcome: &'a ValidationOutcome, kind: ErrorKind, context: &str) -> &'a str {
    assert!(outcome.is_fail(), "{} should fail but passed", context);
    assert_eq!(
        outcome.kind(),
        Some(kind),
        "{} failed with the wrong kind: {}",
        context,
        outcome.message()
    );
    assert!(!outcome.message().is_empty(), "{}: empty diagnostic", context);
    outcome.message()
}

/// Assert that a failure message mentions `expected_text`.
pub fn assert_message_contains(outcome: &ValidationOutcome, expected_text: &str) {
    assert!(
        outcome.message().contains(expected_text),
        "expected message to contain '{}', got: {}",
        expected_text,
        outcome.message()
    );
}
