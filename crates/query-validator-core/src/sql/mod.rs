//! SQL query validation.
//!
//! A query passes through four stages, failing fast at the first error:
//!
//! 1. size guard against [`ValidationLimits::max_query_bytes`] and operator
//!    chain depth guard against [`ValidationLimits::max_expression_depth`]
//! 2. placeholder lowering and parsing with the chain's dialect, then the
//!    single read-only statement policy
//! 3. placeholder resolution from the [`ParameterContext`]
//! 4. semantic checks ([`analyzer`])

pub(crate) mod analyzer;
pub(crate) mod depth;
pub(crate) mod placeholders;
pub(crate) mod position;

use crate::errors::{Position, ValidateError};
use crate::limits::ValidationLimits;
use crate::registry::DialectRules;
use query_validator_types::ParameterContext;
use sqlparser::ast::Statement;
use sqlparser::parser::{Parser, ParserError};
use tracing::trace;

/// A statement that passed every SQL stage.
#[derive(Debug, Clone)]
pub(crate) struct PreparedQuery {
    pub statement: Statement,
    /// Lowered source text; positions match the submitted query.
    pub source: String,
}

/// Validates queries against one set of dialect rules.
#[derive(Debug, Clone, Copy)]
pub struct SqlValidator<'r> {
    rules: &'r DialectRules,
    limits: &'r ValidationLimits,
}

impl<'r> SqlValidator<'r> {
    pub fn new(rules: &'r DialectRules, limits: &'r ValidationLimits) -> Self {
        Self { rules, limits }
    }

    pub fn validate(&self, query: &str, params: &ParameterContext) -> Result<(), ValidateError> {
        self.prepare(query, params).map(|_| ())
    }

    pub(crate) fn prepare(
        &self,
        query: &str,
        params: &ParameterContext,
    ) -> Result<PreparedQuery, ValidateError> {
        let actual = query.len() as u64;
        if actual > self.limits.max_query_bytes {
            return Err(ValidateError::QueryTooLarge {
                limit: self.limits.max_query_bytes,
                actual,
            });
        }

        depth::check_operator_depth(query, self.limits.max_expression_depth)?;

        let lowered = placeholders::lower(query)?;
        trace!(placeholders = lowered.sites.len(), "lowered placeholders");

        let mut statement = self.parse_single(&lowered.text)?;
        trace!("parsed single query statement");

        placeholders::resolve(&mut statement, params, &lowered.sites)?;
        trace!("resolved placeholders");

        analyzer::check(&statement, self.rules, &lowered.text)?;
        trace!(scope = %self.rules.scope, "semantic checks passed");

        Ok(PreparedQuery {
            statement,
            source: lowered.text,
        })
    }

    fn parse_single(&self, text: &str) -> Result<Statement, ValidateError> {
        if position::is_blank(text) {
            return Err(ValidateError::EmptyQuery);
        }

        let dialect = self.rules.dialect.parser_dialect();
        let mut statements =
            Parser::parse_sql(dialect.as_ref(), text).map_err(|err| syntax_error(err, text))?;

        match statements.len() {
            0 => return Err(ValidateError::EmptyQuery),
            1 => {}
            count => {
                return Err(ValidateError::MultipleStatements {
                    count,
                    scope: self.rules.scope,
                })
            }
        }

        let statement = statements.remove(0);
        match statement {
            Statement::Query(_) => Ok(statement),
            other => Err(ValidateError::UnsupportedStatement {
                statement: statement_keyword(&other),
                scope: self.rules.scope,
            }),
        }
    }
}

/// Leading keyword of a statement, e.g. `INSERT`.
fn statement_keyword(statement: &Statement) -> String {
    statement
        .to_string()
        .split_whitespace()
        .next()
        .unwrap_or("statement")
        .to_ascii_uppercase()
}

fn syntax_error(err: ParserError, text: &str) -> ValidateError {
    let raw = match err {
        ParserError::TokenizerError(message) | ParserError::ParserError(message) => message,
        ParserError::RecursionLimitExceeded => {
            return ValidateError::Syntax {
                message: "query nesting exceeds the parser recursion limit".to_string(),
                position: Position::START,
            }
        }
    };
    let (message, position) = position::split_location(&raw);
    ValidateError::Syntax {
        message,
        position: position.unwrap_or_else(|| position::end_of(text)),
    }
}
