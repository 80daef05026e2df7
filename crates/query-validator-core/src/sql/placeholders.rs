//! `${name}` placeholders: lowering before parsing, resolution after.
//!
//! Outside string literals a placeholder is rewritten to sqlparser's `$name`
//! placeholder token, padded with spaces to its original width so every
//! later line/column stays valid. After parsing, each placeholder value in
//! the AST is replaced by a literal built from the parameter context.
//! Inside string literals `${name}` is substituted textually.

use crate::errors::{Position, ValidateError};
use crate::sql::position::{position_at, segments, Segment, SegmentKind};
use query_validator_types::ParameterContext;
use sqlparser::ast::{visit_expressions_mut, Expr, Statement, Value};
use std::ops::ControlFlow;

/// A placeholder occurrence in the submitted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlaceholderSite {
    pub name: String,
    pub position: Position,
    pub in_literal: bool,
}

/// Query text with placeholders lowered, plus where they were.
#[derive(Debug, Clone)]
pub(crate) struct LoweredQuery {
    pub text: String,
    pub sites: Vec<PlaceholderSite>,
}

pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Shortened excerpt for diagnostics.
fn excerpt(text: &str) -> String {
    let line = text.lines().next().unwrap_or("");
    line.chars().take(24).collect()
}

pub(crate) fn lower(query: &str) -> Result<LoweredQuery, ValidateError> {
    let mut text = String::with_capacity(query.len());
    let mut sites = Vec::new();

    for segment in segments(query) {
        match segment.kind {
            SegmentKind::Code => lower_code(&segment, &mut text, &mut sites)?,
            SegmentKind::Literal => {
                sites.extend(literal_sites(&segment));
                text.push_str(segment.text);
            }
            SegmentKind::QuotedIdent | SegmentKind::Comment => text.push_str(segment.text),
        }
    }

    Ok(LoweredQuery { text, sites })
}

fn lower_code(
    segment: &Segment<'_>,
    out: &mut String,
    sites: &mut Vec<PlaceholderSite>,
) -> Result<(), ValidateError> {
    let source = segment.text;
    let mut cursor = 0;

    while let Some(found) = source[cursor..].find("${") {
        let open = cursor + found;
        out.push_str(&source[cursor..open]);
        let position = position_at(segment, open);
        let body_start = open + 2;

        let Some(close) = source[body_start..].find('}') else {
            return Err(ValidateError::MalformedPlaceholder {
                text: excerpt(&source[open..]),
                position,
            });
        };
        let body = &source[body_start..body_start + close];
        let name = body.trim();
        if body.contains('\n') || !is_identifier(name) {
            return Err(ValidateError::MalformedPlaceholder {
                text: excerpt(&source[open..=body_start + close]),
                position,
            });
        }

        // `${` + body + `}` becomes `$name` plus padding.
        let width = body.chars().count() + 3;
        out.push('$');
        out.push_str(name);
        out.extend(std::iter::repeat(' ').take(width - name.len() - 1));

        sites.push(PlaceholderSite {
            name: name.to_string(),
            position,
            in_literal: false,
        });
        cursor = body_start + close + 1;
    }

    out.push_str(&source[cursor..]);
    Ok(())
}

fn literal_sites(segment: &Segment<'_>) -> Vec<PlaceholderSite> {
    let mut sites = Vec::new();
    let mut cursor = 0;
    while let Some(found) = segment.text[cursor..].find("${") {
        let open = cursor + found;
        let body_start = open + 2;
        match segment.text[body_start..].find('}') {
            Some(close) => {
                let name = segment.text[body_start..body_start + close].trim();
                if is_identifier(name) {
                    sites.push(PlaceholderSite {
                        name: name.to_string(),
                        position: position_at(segment, open),
                        in_literal: true,
                    });
                }
                cursor = body_start + close + 1;
            }
            None => break,
        }
    }
    sites
}

/// Key a parsed placeholder refers to (`$min_height` -> `min_height`).
fn placeholder_key(raw: &str) -> &str {
    let key = raw.trim_start_matches(['$', ':', '@']);
    if key.is_empty() {
        raw
    } else {
        key
    }
}

fn is_number(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (digits, None),
    };
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    all_digits(whole) && fraction.map_or(true, all_digits)
}

/// Literal with the type the value text suggests.
pub(crate) fn literal_for(value: &str) -> Value {
    let trimmed = value.trim();
    if is_number(trimmed) {
        Value::Number(trimmed.to_string(), false)
    } else if trimmed.eq_ignore_ascii_case("true") {
        Value::Boolean(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Value::Boolean(false)
    } else {
        Value::SingleQuotedString(value.to_string())
    }
}

/// Text of any quoted string literal.
fn string_text_mut(value: &mut Value) -> Option<&mut String> {
    match value {
        Value::SingleQuotedString(text)
        | Value::DoubleQuotedString(text)
        | Value::TripleSingleQuotedString(text)
        | Value::TripleDoubleQuotedString(text)
        | Value::EscapedStringLiteral(text)
        | Value::UnicodeStringLiteral(text)
        | Value::NationalStringLiteral(text)
        | Value::SingleQuotedByteStringLiteral(text)
        | Value::DoubleQuotedByteStringLiteral(text)
        | Value::TripleSingleQuotedByteStringLiteral(text)
        | Value::TripleDoubleQuotedByteStringLiteral(text)
        | Value::SingleQuotedRawStringLiteral(text)
        | Value::DoubleQuotedRawStringLiteral(text)
        | Value::TripleSingleQuotedRawStringLiteral(text)
        | Value::TripleDoubleQuotedRawStringLiteral(text) => Some(text),
        Value::DollarQuotedString(quoted) => Some(&mut quoted.value),
        _ => None,
    }
}

/// Replace `${name}` inside a literal value. Returns the first missing key.
fn substitute(text: &str, params: &ParameterContext) -> Result<String, String> {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    while let Some(found) = text[cursor..].find("${") {
        let open = cursor + found;
        let body_start = open + 2;
        let Some(close) = text[body_start..].find('}') else {
            break;
        };
        let end = body_start + close + 1;
        let name = text[body_start..end - 1].trim();
        out.push_str(&text[cursor..open]);
        if is_identifier(name) {
            let value = params.lookup(name).ok_or_else(|| name.to_string())?;
            out.push_str(value);
        } else {
            out.push_str(&text[open..end]);
        }
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    Ok(out)
}

fn unresolved(key: &str, sites: &[PlaceholderSite], in_literal: bool) -> ValidateError {
    let position = sites
        .iter()
        .find(|site| site.name == key && site.in_literal == in_literal)
        .or_else(|| sites.iter().find(|site| site.name == key))
        .map(|site| site.position);
    ValidateError::UnresolvedParameter {
        key: key.to_string(),
        position,
    }
}

/// Substitute every placeholder in `statement`, depth-first, left to right.
pub(crate) fn resolve(
    statement: &mut Statement,
    params: &ParameterContext,
    sites: &[PlaceholderSite],
) -> Result<(), ValidateError> {
    let flow = visit_expressions_mut(statement, |expr| {
        let replacement = match expr {
            Expr::Value(Value::Placeholder(raw)) => {
                let key = placeholder_key(raw);
                match params.lookup(key) {
                    Some(value) => Some(Expr::Value(literal_for(value))),
                    None => return ControlFlow::Break(unresolved(key, sites, false)),
                }
            }
            Expr::Value(value) => {
                if let Some(text) = string_text_mut(value).filter(|text| text.contains("${")) {
                    match substitute(text, params) {
                        Ok(substituted) => *text = substituted,
                        Err(key) => return ControlFlow::Break(unresolved(&key, sites, true)),
                    }
                }
                None
            }
            _ => None,
        };
        if let Some(replacement) = replacement {
            *expr = replacement;
        }
        ControlFlow::Continue(())
    });

    if let ControlFlow::Break(err) = flow {
        return Err(err);
    }

    // Sites the walk never reached, e.g. literals outside expressions.
    match sites.iter().find(|site| !params.contains(&site.name)) {
        Some(site) => Err(ValidateError::UnresolvedParameter {
            key: site.name.clone(),
            position: Some(site.position),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use query_validator_types::ParameterContextBuilder;

    #[test]
    fn lowering_preserves_width() {
        let query = "SELECT * FROM blocks WHERE height > ${min_height} AND 1 = 1";
        let lowered = lower(query).unwrap();
        assert_eq!(
            lowered.text,
            "SELECT * FROM blocks WHERE height > $min_height   AND 1 = 1"
        );
        assert_eq!(lowered.text.len(), query.len());
        assert_eq!(lowered.sites.len(), 1);
        assert_eq!(lowered.sites[0].name, "min_height");
        assert_eq!(lowered.sites[0].position, Position::new(1, 37));
    }

    #[test]
    fn lowering_trims_inner_whitespace() {
        let lowered = lower("SELECT ${ a }").unwrap();
        assert_eq!(lowered.text, "SELECT $a    ");
        assert_eq!(lowered.sites[0].name, "a");
    }

    #[test]
    fn literals_are_left_alone() {
        let lowered = lower("SELECT 'id-${suffix}' FROM t").unwrap();
        assert_eq!(lowered.text, "SELECT 'id-${suffix}' FROM t");
        assert!(lowered.sites[0].in_literal);
        assert_eq!(lowered.sites[0].position, Position::new(1, 12));
    }

    #[test]
    fn unclosed_placeholder_is_malformed() {
        let err = lower("SELECT ${oops FROM t").unwrap_err();
        assert!(matches!(
            err,
            ValidateError::MalformedPlaceholder { position, .. } if position == Position::new(1, 8)
        ));
    }

    #[test]
    fn invalid_name_is_malformed() {
        assert!(lower("SELECT ${1abc}").is_err());
        assert!(lower("SELECT ${}").is_err());
        assert!(lower("SELECT ${a-b}").is_err());
    }

    #[test]
    fn literal_typing() {
        assert_eq!(literal_for("100"), Value::Number("100".into(), false));
        assert_eq!(literal_for("-2.5"), Value::Number("-2.5".into(), false));
        assert_eq!(literal_for("TRUE"), Value::Boolean(true));
        assert_eq!(literal_for("false"), Value::Boolean(false));
        assert_eq!(literal_for("0x1f"), Value::SingleQuotedString("0x1f".into()));
        assert_eq!(literal_for("1."), Value::SingleQuotedString("1.".into()));
    }

    #[test]
    fn substitute_inside_literal() {
        let params = ParameterContextBuilder::new().with("name", "bob").build();
        assert_eq!(substitute("hi ${name}!", &params).unwrap(), "hi bob!");
        assert_eq!(substitute("${missing}", &params).unwrap_err(), "missing");
        assert_eq!(substitute("${ not valid }", &params).unwrap(), "${ not valid }");
    }
}
