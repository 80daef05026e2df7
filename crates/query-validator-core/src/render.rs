//! Render query validation.
//!
//! Render queries shape arbitrary row sets into named output fields, so they
//! are chain-independent: the generic dialect, the common function set and
//! the shared reserved words, with no schema check. On top of the SQL stages
//! the outermost select list must yield unique, named fields, and every
//! `{{ field }}` directive inside a string literal must name one of them.

use crate::errors::ValidateError;
use crate::limits::ValidationLimits;
use crate::registry::DialectRules;
use crate::sql::placeholders::is_identifier;
use crate::sql::position::{self, position_at, segments, SegmentKind};
use crate::sql::SqlValidator;
use query_validator_types::ParameterContext;
use sqlparser::ast::{Expr, Select, SelectItem, SetExpr, Statement};
use std::collections::BTreeSet;
use tracing::trace;

#[derive(Debug, Clone, Copy)]
pub struct RenderValidator<'r> {
    rules: &'r DialectRules,
    limits: &'r ValidationLimits,
}

impl<'r> RenderValidator<'r> {
    pub fn new(rules: &'r DialectRules, limits: &'r ValidationLimits) -> Self {
        Self { rules, limits }
    }

    pub fn validate(&self, query: &str, params: &ParameterContext) -> Result<(), ValidateError> {
        let prepared = SqlValidator::new(self.rules, self.limits).prepare(query, params)?;
        let fields = output_fields(&prepared.statement, &prepared.source)?;
        trace!(fields = ?fields, "render fields");
        check_directives(&prepared.source, &fields)
    }
}

/// Left-most select of the outermost query.
fn outermost_select(statement: &Statement) -> Option<&Select> {
    fn leftmost(body: &SetExpr) -> Option<&Select> {
        match body {
            SetExpr::Select(select) => Some(select),
            SetExpr::Query(query) => leftmost(&query.body),
            SetExpr::SetOperation { left, .. } => leftmost(left),
            _ => None,
        }
    }
    match statement {
        Statement::Query(query) => leftmost(&query.body),
        _ => None,
    }
}

/// Lowercased output field names, in projection order.
fn output_fields(statement: &Statement, source: &str) -> Result<Vec<String>, ValidateError> {
    let Some(select) = outermost_select(statement) else {
        return Err(ValidateError::UnnamedRenderField { index: 1 });
    };

    let mut fields: Vec<String> = Vec::with_capacity(select.projection.len());
    for (index, item) in select.projection.iter().enumerate() {
        let name = match item {
            SelectItem::ExprWithAlias { alias, .. } => alias.value.clone(),
            SelectItem::UnnamedExpr(Expr::Identifier(ident)) => ident.value.clone(),
            SelectItem::UnnamedExpr(Expr::CompoundIdentifier(parts)) => match parts.last() {
                Some(last) => last.value.clone(),
                None => return Err(ValidateError::UnnamedRenderField { index: index + 1 }),
            },
            SelectItem::UnnamedExpr(_) => {
                return Err(ValidateError::UnnamedRenderField { index: index + 1 })
            }
            SelectItem::QualifiedWildcard(name, _) => {
                let position = name
                    .0
                    .first()
                    .and_then(|qualifier| position::locate(source, &qualifier.value));
                return Err(ValidateError::WildcardRenderField { position });
            }
            SelectItem::Wildcard(_) => {
                return Err(ValidateError::WildcardRenderField {
                    position: position::locate_symbol(source, '*'),
                })
            }
        };

        let key = name.to_ascii_lowercase();
        let earlier = fields.iter().filter(|field| **field == key).count();
        if earlier > 0 {
            let occurrences = position::locate_all(source, &name);
            let position = occurrences
                .get(earlier)
                .or_else(|| occurrences.last())
                .copied();
            return Err(ValidateError::DuplicateRenderField {
                field: name,
                position,
            });
        }
        fields.push(key);
    }
    Ok(fields)
}

/// Check `{{ field }}` directives inside string literals.
fn check_directives(source: &str, fields: &[String]) -> Result<(), ValidateError> {
    let known: BTreeSet<&str> = fields.iter().map(String::as_str).collect();

    for segment in segments(source) {
        if segment.kind != SegmentKind::Literal {
            continue;
        }
        let text = segment.text;
        let mut cursor = 0;
        while let Some(found) = text[cursor..].find("{{") {
            let open = cursor + found;
            let position = position_at(&segment, open);
            let body_start = open + 2;

            let Some(close) = text[body_start..].find("}}") else {
                return Err(ValidateError::MalformedDirective {
                    text: text[open..].trim_end_matches('\'').to_string(),
                    position,
                });
            };
            let body = &text[body_start..body_start + close];
            let name = body.trim();
            if !is_identifier(name) {
                return Err(ValidateError::MalformedDirective {
                    text: text[open..body_start + close + 2].to_string(),
                    position,
                });
            }
            if !known.contains(name.to_ascii_lowercase().as_str()) {
                return Err(ValidateError::UnknownRenderField {
                    field: name.to_string(),
                    position,
                });
            }
            cursor = body_start + close + 2;
        }
    }
    Ok(())
}
