//! Operator chain depth guard, run on the raw text before parsing.
//!
//! sqlparser builds left-associative chains (`a + b + c`, `x AND y AND z`,
//! `q1 UNION q2 UNION q3`) in a loop, so its recursion limit never sees
//! them, but the resulting tree is as deep as the chain is long and every
//! later walk recurses once per level. Each parenthesis level keeps its own
//! count; the guard fails once the counts along the open levels sum past
//! [`ValidationLimits::max_expression_depth`](crate::ValidationLimits).
//!
//! The count is coarse: every operator token counts, even ones
//! that do not deepen the tree, such as the `=` inside each `AND` term.

use crate::errors::{Position, ValidateError};
use crate::sql::position::{is_word_char, segments, SegmentKind};

/// Keywords that start a new operand list at the current level.
const CLAUSE_KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "GROUP", "HAVING", "ORDER", "LIMIT", "OFFSET", "JOIN", "ON",
    "WITH", "QUALIFY", "WINDOW", "THEN", "ELSE", "WHEN", "END",
];

/// Binary keyword operators.
const OPERATOR_KEYWORDS: &[&str] = &[
    "AND", "OR", "XOR", "IS", "NOT", "LIKE", "ILIKE", "SIMILAR", "IN", "BETWEEN", "COLLATE",
    "AT", "DIV",
];

const SET_OPERATORS: &[&str] = &["UNION", "EXCEPT", "INTERSECT"];

fn is_operator_char(c: char) -> bool {
    matches!(
        c,
        '+' | '-' | '*' | '/' | '%' | '|' | '=' | '<' | '>' | '!' | '&' | '^' | '#' | '~' | ':'
            | '@' | '?'
    )
}

#[derive(Debug, Default, Clone, Copy)]
struct Level {
    /// Set operations seen at this level; clause keywords do not clear them.
    base: u64,
    current: u64,
}

#[derive(Debug)]
struct DepthScan {
    levels: Vec<Level>,
    total: u64,
    limit: u64,
}

impl DepthScan {
    fn new(limit: u64) -> Self {
        Self {
            levels: vec![Level::default()],
            total: 0,
            limit,
        }
    }

    fn level(&mut self) -> &mut Level {
        if self.levels.is_empty() {
            self.levels.push(Level::default());
        }
        let last = self.levels.len() - 1;
        &mut self.levels[last]
    }

    fn check(&self, position: Position) -> Result<(), ValidateError> {
        if self.total > self.limit {
            return Err(ValidateError::ExpressionTooDeep {
                limit: self.limit,
                position,
            });
        }
        Ok(())
    }

    fn operator(&mut self, position: Position) -> Result<(), ValidateError> {
        self.level().current += 1;
        self.total += 1;
        self.check(position)
    }

    fn set_operator(&mut self, position: Position) -> Result<(), ValidateError> {
        self.reset();
        self.level().base += 1;
        self.total += 1;
        self.check(position)
    }

    fn reset(&mut self) {
        let level = self.level();
        let cleared = std::mem::take(&mut level.current);
        self.total -= cleared;
    }

    fn open(&mut self) {
        self.levels.push(Level::default());
    }

    fn close(&mut self) {
        if self.levels.len() > 1 {
            if let Some(level) = self.levels.pop() {
                self.total -= level.base + level.current;
            }
        }
    }

    fn word(&mut self, word: &str, position: Position) -> Result<(), ValidateError> {
        let matches = |list: &[&str]| list.iter().any(|k| k.eq_ignore_ascii_case(word));
        if matches(SET_OPERATORS) {
            self.set_operator(position)
        } else if matches(OPERATOR_KEYWORDS) {
            self.operator(position)
        } else {
            if matches(CLAUSE_KEYWORDS) {
                self.reset();
            }
            Ok(())
        }
    }
}

/// Fail when an operator chain would nest deeper than `limit`.
pub(crate) fn check_operator_depth(text: &str, limit: u64) -> Result<(), ValidateError> {
    let mut scan = DepthScan::new(limit);

    for segment in segments(text) {
        if segment.kind != SegmentKind::Code {
            continue;
        }
        let mut word: Option<(usize, Position)> = None;
        let mut in_operator = false;

        for (offset, c, position) in segment.chars() {
            if is_word_char(c) {
                if word.is_none() {
                    word = Some((offset, position));
                }
                in_operator = false;
                continue;
            }
            if let Some((start, at)) = word.take() {
                scan.word(&segment.text[start..offset], at)?;
            }

            if is_operator_char(c) {
                if !in_operator {
                    scan.operator(position)?;
                }
                in_operator = true;
                continue;
            }
            in_operator = false;

            match c {
                '(' => scan.open(),
                '[' => {
                    scan.operator(position)?;
                    scan.open();
                }
                ')' | ']' => scan.close(),
                ',' => scan.reset(),
                _ => {}
            }
        }
        if let Some((start, at)) = word {
            scan.word(&segment.text[start..], at)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depth_error(text: &str, limit: u64) -> Option<Position> {
        match check_operator_depth(text, limit) {
            Ok(()) => None,
            Err(ValidateError::ExpressionTooDeep { position, .. }) => Some(position),
            Err(other) => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn long_arithmetic_chain_is_rejected_at_the_first_excess_operator() {
        let text = format!("SELECT 1{}", "+1".repeat(10));
        assert_eq!(depth_error(&text, 10), None);
        let text = format!("SELECT 1{}", "+1".repeat(11));
        assert_eq!(depth_error(&text, 10), Some(Position::new(1, 29)));
    }

    #[test]
    fn commas_and_clauses_start_new_counts() {
        let text = "SELECT a + b + c, d + e + f FROM t WHERE x = 1 AND y = 2";
        assert_eq!(depth_error(text, 3), None);
        assert!(depth_error(text, 2).is_some());
    }

    #[test]
    fn nested_levels_add_up() {
        assert_eq!(depth_error("SELECT (a + (b + (c + d)))", 3), None);
        assert!(depth_error("SELECT a + (b + (c + (d + e)))", 3).is_some());
        // Closed groups give their count back.
        assert_eq!(depth_error("SELECT (a + b + c) + (d + e)", 3), None);
    }

    #[test]
    fn set_operations_survive_clause_keywords() {
        let text = "SELECT 1 UNION SELECT 2 UNION SELECT 3 UNION SELECT 4";
        assert_eq!(depth_error(text, 3), None);
        assert!(depth_error(text, 2).is_some());
    }

    #[test]
    fn literals_and_comments_are_not_counted() {
        let text = "SELECT '+++---' -- + + + +\nFROM t /* AND AND AND */";
        assert_eq!(depth_error(text, 0), None);
    }

    #[test]
    fn multi_character_operators_count_once() {
        assert_eq!(depth_error("SELECT a || b <> c", 2), None);
        assert_eq!(depth_error("SELECT a::int", 1), None);
    }
}
