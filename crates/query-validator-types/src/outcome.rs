//! Pass/fail result of a single validation call.
//!
//! # Error Taxonomy
//!
//! | Group | Kinds | Codes |
//! |-------|-------|-------|
//! | Text | SyntaxError, UnresolvedParameter | E101-E102 |
//! | Rules | ChainRuleViolation, RenderAmbiguity | E201-E202 |
//! | Bytecode | BytecodeFormatError, ResourceLimitExceeded | E301-E302 |
//! | Boundary | InvalidChainSelector | E401 |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// E101: Tokenizer or grammar mismatch
    SyntaxError,
    /// E102: Placeholder with no value in the parameter context
    UnresolvedParameter,
    /// E201: Construct not permitted by the chain's rules
    ChainRuleViolation,
    /// E202: Render output fields are duplicated, unnamed or unresolved
    RenderAmbiguity,
    /// E301: Byte sequence is not a well-formed module
    BytecodeFormatError,
    /// E302: Declared size exceeds a configured ceiling
    ResourceLimitExceeded,
    /// E401: Raw chain selector outside the known values
    InvalidChainSelector,
}

impl ErrorKind {
    /// Numeric code, grouped by hundreds.
    pub fn numeric_code(&self) -> u16 {
        match self {
            ErrorKind::SyntaxError => 101,
            ErrorKind::UnresolvedParameter => 102,
            ErrorKind::ChainRuleViolation => 201,
            ErrorKind::RenderAmbiguity => 202,
            ErrorKind::BytecodeFormatError => 301,
            ErrorKind::ResourceLimitExceeded => 302,
            ErrorKind::InvalidChainSelector => 401,
        }
    }

    /// Code string like `E101`.
    pub fn code(&self) -> String {
        format!("E{}", self.numeric_code())
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::UnresolvedParameter => "UnresolvedParameter",
            ErrorKind::ChainRuleViolation => "ChainRuleViolation",
            ErrorKind::RenderAmbiguity => "RenderAmbiguity",
            ErrorKind::BytecodeFormatError => "BytecodeFormatError",
            ErrorKind::ResourceLimitExceeded => "ResourceLimitExceeded",
            ErrorKind::InvalidChainSelector => "InvalidChainSelector",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pass,
    Fail,
}

/// Outcome of exactly one validation call.
///
/// The outcome owns its diagnostic text; on pass the message is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kind: Option<ErrorKind>,
    message: String,
}

impl ValidationOutcome {
    pub fn pass() -> Self {
        Self {
            status: Status::Pass,
            kind: None,
            message: String::new(),
        }
    }

    pub fn fail(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            status: Status::Fail,
            kind: Some(kind),
            message: message.into(),
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_pass(&self) -> bool {
        self.status == Status::Pass
    }

    pub fn is_fail(&self) -> bool {
        self.status == Status::Fail
    }

    /// Failure category; `None` on pass.
    pub fn kind(&self) -> Option<ErrorKind> {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Status::Pass => f.write_str("pass"),
            Status::Fail => write!(f, "fail: {}", self.message),
        }
    }
}
