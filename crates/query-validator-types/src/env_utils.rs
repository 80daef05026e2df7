//! Environment variable parsing for validator limits.
//!
//! ```
//! use query_validator_types::env_utils::{env_limit_or, env_var};
//!
//! let max_bytes: u64 = env_limit_or("QUERY_VALIDATOR_MAX_QUERY_BYTES", 65_536);
//! let custom: Option<u64> = env_var("SOME_UNSET_VARIABLE");
//! assert!(max_bytes > 0);
//! assert_eq!(custom, None);
//! ```

use std::str::FromStr;

/// Parse an environment variable into a type that implements `FromStr`.
///
/// Returns `None` if the variable is not set or cannot be parsed.
pub fn env_var<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Parse a positive limit. Zero, unset and unparsable values yield `default`.
pub fn env_limit_or(key: &str, default: u64) -> u64 {
    match env_var::<u64>(key) {
        Some(0) | None => default,
        Some(value) => value,
    }
}
