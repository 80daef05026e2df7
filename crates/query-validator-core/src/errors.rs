//! Structured validation errors.
//!
//! Every failure the engine can detect is one variant of [`ValidateError`].
//! Each variant maps to exactly one [`ErrorKind`] and renders as
//! `<Kind>: <detail>`, where the detail names the offending construct and,
//! for text input, where it sits in the query.

use query_validator_types::{ChainType, ErrorKind};
use serde::Serialize;
use std::fmt;

/// 1-based line/column in the submitted query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Position {
    pub line: u64,
    pub column: u64,
}

impl Position {
    pub const START: Position = Position { line: 1, column: 1 };

    pub fn new(line: u64, column: u64) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Which rule set produced a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleScope {
    Chain(ChainType),
    Render,
}

impl fmt::Display for RuleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleScope::Chain(chain) => write!(f, "{}", chain),
            RuleScope::Render => f.write_str("the render dialect"),
        }
    }
}

/// Whether a size came from the initial or the maximum limit of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitBound {
    Initial,
    Maximum,
}

impl fmt::Display for LimitBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitBound::Initial => f.write_str("initial"),
            LimitBound::Maximum => f.write_str("maximum"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidateError {
    /// Query is empty, blank or only comments.
    EmptyQuery,

    /// sqlparser rejected the text.
    Syntax { message: String, position: Position },

    /// `${` not closed or not followed by a valid name.
    MalformedPlaceholder { text: String, position: Position },

    /// `{{` not closed or not followed by a valid field name.
    MalformedDirective { text: String, position: Position },

    UnresolvedParameter {
        key: String,
        position: Option<Position>,
    },

    MultipleStatements { count: usize, scope: RuleScope },

    /// Anything but a read-only query (INSERT, CREATE, ...).
    UnsupportedStatement { statement: String, scope: RuleScope },

    ReservedKeyword {
        keyword: String,
        scope: RuleScope,
        position: Option<Position>,
    },

    UnknownTable {
        table: String,
        chain: ChainType,
        position: Option<Position>,
    },

    UnknownQualifier {
        qualifier: String,
        chain: ChainType,
        position: Option<Position>,
    },

    UnknownColumn {
        column: String,
        chain: ChainType,
        position: Option<Position>,
    },

    FunctionNotAllowed {
        function: String,
        scope: RuleScope,
        position: Option<Position>,
    },

    /// The query reads no chain table, so it would match every transaction.
    NoChainTable { chain: ChainType },

    ImportNotAllowed { import: String, chain: ChainType },

    DuplicateRenderField {
        field: String,
        position: Option<Position>,
    },

    UnnamedRenderField { index: usize },

    WildcardRenderField { position: Option<Position> },

    UnknownRenderField { field: String, position: Position },

    EmptyBytecode,

    BadMagic { header: String },

    UnsupportedVersion { version: String },

    MalformedModule { offset: usize, message: String },

    MissingExport {
        name: &'static str,
        expected: &'static str,
    },

    QueryTooLarge { limit: u64, actual: u64 },

    ExpressionTooDeep { limit: u64, position: Position },

    MemoryLimitExceeded {
        index: usize,
        bound: LimitBound,
        limit: u64,
        declared: u64,
        chain: ChainType,
    },

    TableLimitExceeded {
        index: usize,
        bound: LimitBound,
        limit: u64,
        declared: u64,
        chain: ChainType,
    },

    InvalidChainSelector(u8),
}

impl ValidateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ValidateError::EmptyQuery
            | ValidateError::Syntax { .. }
            | ValidateError::MalformedPlaceholder { .. }
            | ValidateError::MalformedDirective { .. } => ErrorKind::SyntaxError,

            ValidateError::UnresolvedParameter { .. } => ErrorKind::UnresolvedParameter,

            ValidateError::MultipleStatements { .. }
            | ValidateError::UnsupportedStatement { .. }
            | ValidateError::ReservedKeyword { .. }
            | ValidateError::UnknownTable { .. }
            | ValidateError::UnknownQualifier { .. }
            | ValidateError::UnknownColumn { .. }
            | ValidateError::FunctionNotAllowed { .. }
            | ValidateError::NoChainTable { .. }
            | ValidateError::ImportNotAllowed { .. } => ErrorKind::ChainRuleViolation,

            ValidateError::DuplicateRenderField { .. }
            | ValidateError::UnnamedRenderField { .. }
            | ValidateError::WildcardRenderField { .. }
            | ValidateError::UnknownRenderField { .. } => ErrorKind::RenderAmbiguity,

            ValidateError::EmptyBytecode
            | ValidateError::BadMagic { .. }
            | ValidateError::UnsupportedVersion { .. }
            | ValidateError::MalformedModule { .. }
            | ValidateError::MissingExport { .. } => ErrorKind::BytecodeFormatError,

            ValidateError::QueryTooLarge { .. }
            | ValidateError::ExpressionTooDeep { .. }
            | ValidateError::MemoryLimitExceeded { .. }
            | ValidateError::TableLimitExceeded { .. } => ErrorKind::ResourceLimitExceeded,

            ValidateError::InvalidChainSelector(_) => ErrorKind::InvalidChainSelector,
        }
    }

    /// Position in the query text, for variants that carry one.
    pub fn position(&self) -> Option<Position> {
        match self {
            ValidateError::EmptyQuery => Some(Position::START),
            ValidateError::Syntax { position, .. }
            | ValidateError::MalformedPlaceholder { position, .. }
            | ValidateError::MalformedDirective { position, .. }
            | ValidateError::UnknownRenderField { position, .. }
            | ValidateError::ExpressionTooDeep { position, .. } => Some(*position),
            ValidateError::UnresolvedParameter { position, .. }
            | ValidateError::ReservedKeyword { position, .. }
            | ValidateError::UnknownTable { position, .. }
            | ValidateError::UnknownQualifier { position, .. }
            | ValidateError::UnknownColumn { position, .. }
            | ValidateError::FunctionNotAllowed { position, .. }
            | ValidateError::DuplicateRenderField { position, .. }
            | ValidateError::WildcardRenderField { position } => *position,
            _ => None,
        }
    }
}

/// Appends ` at line L, column C` when a position is known.
struct At(Option<Position>);

impl fmt::Display for At {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(position) => write!(f, " at {}", position),
            None => Ok(()),
        }
    }
}

impl fmt::Display for ValidateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.kind())?;
        match self {
            ValidateError::EmptyQuery => write!(
                f,
                "empty query, expected a SELECT statement at {}",
                Position::START
            ),
            ValidateError::Syntax { message, position } => {
                write!(f, "{} at {}", message, position)
            }
            ValidateError::MalformedPlaceholder { text, position } => write!(
                f,
                "malformed parameter placeholder `{}` at {} (expected `${{name}}`)",
                text, position
            ),
            ValidateError::MalformedDirective { text, position } => write!(
                f,
                "malformed render directive `{}` at {} (expected `{{{{field}}}}`)",
                text, position
            ),
            ValidateError::UnresolvedParameter { key, position } => write!(
                f,
                "parameter `{}` is not present in the parameter context{}",
                key,
                At(*position)
            ),
            ValidateError::MultipleStatements { count, scope } => write!(
                f,
                "{} statements found, {} accepts exactly one",
                count, scope
            ),
            ValidateError::UnsupportedStatement { statement, scope } => write!(
                f,
                "`{}` statements are not allowed on {}, only read-only SELECT queries are accepted",
                statement, scope
            ),
            ValidateError::ReservedKeyword {
                keyword,
                scope,
                position,
            } => write!(
                f,
                "`{}` is a reserved keyword on {} and cannot be used as an identifier{}",
                keyword,
                scope,
                At(*position)
            ),
            ValidateError::UnknownTable {
                table,
                chain,
                position,
            } => write!(
                f,
                "unknown table `{}` on {}{}",
                table,
                chain,
                At(*position)
            ),
            ValidateError::UnknownQualifier {
                qualifier,
                chain,
                position,
            } => write!(
                f,
                "`{}` does not name a table, alias or CTE of this query on {}{}",
                qualifier,
                chain,
                At(*position)
            ),
            ValidateError::UnknownColumn {
                column,
                chain,
                position,
            } => write!(
                f,
                "unknown column `{}` on {}{}",
                column,
                chain,
                At(*position)
            ),
            ValidateError::FunctionNotAllowed {
                function,
                scope,
                position,
            } => write!(
                f,
                "function `{}` is not allowed on {}{}",
                function,
                scope,
                At(*position)
            ),
            ValidateError::NoChainTable { chain } => write!(
                f,
                "query reads no {} table and would match every transaction",
                chain
            ),
            ValidateError::ImportNotAllowed { import, chain } => write!(
                f,
                "import `{}` is not allowed on {}",
                import, chain
            ),
            ValidateError::DuplicateRenderField { field, position } => write!(
                f,
                "duplicate render field `{}`{}",
                field,
                At(*position)
            ),
            ValidateError::UnnamedRenderField { index } => write!(
                f,
                "render field #{} has no name, give it an alias with AS",
                index
            ),
            ValidateError::WildcardRenderField { position } => write!(
                f,
                "wildcard projection in a render query{}, output fields must be named",
                At(*position)
            ),
            ValidateError::UnknownRenderField { field, position } => write!(
                f,
                "render directive `{{{{{}}}}}` at {} does not match any output field",
                field, position
            ),
            ValidateError::EmptyBytecode => f.write_str("empty bytecode buffer"),
            ValidateError::BadMagic { header } => write!(
                f,
                "not a WebAssembly module (header bytes 0x{})",
                header
            ),
            ValidateError::UnsupportedVersion { version } => write!(
                f,
                "unsupported WebAssembly binary version 0x{}",
                version
            ),
            ValidateError::MalformedModule { offset, message } => write!(
                f,
                "malformed module at byte offset {}: {}",
                offset, message
            ),
            ValidateError::MissingExport { name, expected } => write!(
                f,
                "module does not export {} `{}` required by the AssemblyScript runtime",
                expected, name
            ),
            ValidateError::QueryTooLarge { limit, actual } => write!(
                f,
                "query is {} bytes, limit is {} bytes",
                actual, limit
            ),
            ValidateError::ExpressionTooDeep { limit, position } => write!(
                f,
                "operator chain at {} nests deeper than the limit of {} levels",
                position, limit
            ),
            ValidateError::MemoryLimitExceeded {
                index,
                bound,
                limit,
                declared,
                chain,
            } => write!(
                f,
                "memory {} declares {} {} pages, {} limit is {} pages",
                index, bound, declared, chain, limit
            ),
            ValidateError::TableLimitExceeded {
                index,
                bound,
                limit,
                declared,
                chain,
            } => write!(
                f,
                "table {} declares {} {} elements, {} limit is {} elements",
                index, bound, declared, chain, limit
            ),
            ValidateError::InvalidChainSelector(raw) => write!(
                f,
                "invalid chain selector {} (expected 0 = SUI, 1 = EVM or 2 = APTOS)",
                raw
            ),
        }
    }
}

impl std::error::Error for ValidateError {}
