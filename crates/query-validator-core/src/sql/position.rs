//! Source text scanning: literal/comment segmentation and identifier lookup.
//!
//! sqlparser identifiers carry no source span, so diagnostics locate the
//! offending word in the query text. Positions are 1-based and count
//! characters, matching the locations sqlparser reports in its own errors.

use crate::errors::Position;
use sqlparser::keywords::ALL_KEYWORDS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SegmentKind {
    Code,
    /// String literal with its quotes: `'..'`, `E'..'` body or `$tag$..$tag$`.
    Literal,
    /// Double-quoted or backtick-quoted identifier, quotes included.
    QuotedIdent,
    Comment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Segment<'a> {
    pub kind: SegmentKind,
    pub text: &'a str,
    pub start: Position,
}

impl<'a> Segment<'a> {
    /// Iterate `(byte offset, char, position)` over the segment.
    pub fn chars(&self) -> impl Iterator<Item = (usize, char, Position)> + '_ {
        let mut position = self.start;
        self.text.char_indices().map(move |(offset, c)| {
            let here = position;
            position = step(position, c);
            (offset, c, here)
        })
    }

    /// Identifier text of a quoted identifier segment.
    fn unquoted(&self) -> &'a str {
        let inner = self.text.get(1..).unwrap_or("");
        inner
            .strip_suffix(|c: char| c == '"' || c == '`')
            .unwrap_or(inner)
    }
}

fn step(mut position: Position, c: char) -> Position {
    if c == '\n' {
        position.line += 1;
        position.column = 1;
    } else {
        position.column += 1;
    }
    position
}

/// Position just past the last character of `text`.
pub(crate) fn end_of(text: &str) -> Position {
    text.chars().fold(Position::START, step)
}

/// Position of the character at byte `offset` inside `segment`.
pub(crate) fn position_at(segment: &Segment<'_>, offset: usize) -> Position {
    segment
        .text
        .get(..offset)
        .map(|prefix| prefix.chars().fold(segment.start, step))
        .unwrap_or(segment.start)
}

#[derive(Clone, Copy)]
enum State {
    Code,
    Literal,
    /// `E'..'`: backslash escapes the next character.
    EscapedLiteral,
    Quoted(char),
    LineComment,
    BlockComment,
}

fn push_segment<'a>(
    out: &mut Vec<Segment<'a>>,
    text: &'a str,
    state: State,
    from: usize,
    to: usize,
    start: Position,
) {
    if from >= to {
        return;
    }
    let kind = match state {
        State::Code => SegmentKind::Code,
        State::Literal | State::EscapedLiteral => SegmentKind::Literal,
        State::Quoted(_) => SegmentKind::QuotedIdent,
        State::LineComment | State::BlockComment => SegmentKind::Comment,
    };
    out.push(Segment {
        kind,
        text: &text[from..to],
        start,
    });
}

/// Opening delimiter of a dollar-quoted string starting at char `i`, e.g.
/// `$$` or `$body$`.
fn dollar_delimiter(chars: &[(usize, char)], i: usize, text: &str) -> Option<String> {
    let follows_word = i > 0 && {
        let prev = chars[i - 1].1;
        is_word_char(prev) || prev == '$'
    };
    if follows_word {
        return None;
    }
    let tag_len = chars[i + 1..]
        .iter()
        .take_while(|(_, c)| is_word_char(*c))
        .count();
    let close = chars.get(i + 1 + tag_len)?;
    if close.1 != '$' {
        return None;
    }
    let from = chars[i].0;
    Some(text[from..=close.0].to_string())
}

/// Split query text into code, literal, quoted-identifier and comment runs.
///
/// Unterminated literals and comments run to the end of the text; the parser
/// reports those as syntax errors.
pub(crate) fn segments(text: &str) -> Vec<Segment<'_>> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut out = Vec::new();
    let mut state = State::Code;
    let mut start_byte = 0;
    let mut start_pos = Position::START;
    let mut pos = Position::START;
    let mut i = 0;

    while i < chars.len() {
        let (byte, c) = chars[i];
        let next = chars.get(i + 1).map(|(_, n)| *n);
        let byte_after = |k: usize| chars.get(k).map(|(b, _)| *b).unwrap_or(text.len());

        match state {
            State::Code => {
                if c == '$' {
                    if let Some(delimiter) = dollar_delimiter(&chars, i, text) {
                        let body = byte + delimiter.len();
                        let end = text[body..]
                            .find(&delimiter)
                            .map_or(text.len(), |found| body + found + delimiter.len());
                        push_segment(&mut out, text, state, start_byte, byte, start_pos);
                        push_segment(&mut out, text, State::Literal, byte, end, pos);
                        pos = text[byte..end].chars().fold(pos, step);
                        i = chars.partition_point(|(b, _)| *b < end);
                        start_byte = end;
                        start_pos = pos;
                        continue;
                    }
                }
                let escaped = i > 0
                    && matches!(chars[i - 1].1, 'e' | 'E')
                    && (i < 2 || !is_word_char(chars[i - 2].1));
                let opened = match (c, next) {
                    ('\'', _) if escaped => Some((State::EscapedLiteral, 1)),
                    ('\'', _) => Some((State::Literal, 1)),
                    ('"', _) | ('`', _) => Some((State::Quoted(c), 1)),
                    ('-', Some('-')) => Some((State::LineComment, 2)),
                    ('/', Some('*')) => Some((State::BlockComment, 2)),
                    _ => None,
                };
                if let Some((opened, width)) = opened {
                    push_segment(&mut out, text, state, start_byte, byte, start_pos);
                    start_byte = byte;
                    start_pos = pos;
                    state = opened;
                    for _ in 0..width {
                        pos = step(pos, chars[i].1);
                        i += 1;
                    }
                    continue;
                }
            }
            State::EscapedLiteral if c == '\\' => {
                pos = step(pos, c);
                i += 1;
                if let Some(&(_, escaped)) = chars.get(i) {
                    pos = step(pos, escaped);
                    i += 1;
                }
                continue;
            }
            State::Literal | State::EscapedLiteral | State::Quoted(_) => {
                let closes = match state {
                    State::Quoted(q) => c == q,
                    _ => c == '\'',
                };
                if closes {
                    let end = byte_after(i + 1);
                    push_segment(&mut out, text, state, start_byte, end, start_pos);
                    pos = step(pos, c);
                    i += 1;
                    start_byte = end;
                    start_pos = pos;
                    state = State::Code;
                    continue;
                }
            }
            State::LineComment => {
                if c == '\n' {
                    push_segment(&mut out, text, state, start_byte, byte, start_pos);
                    start_byte = byte;
                    start_pos = pos;
                    state = State::Code;
                    continue;
                }
            }
            State::BlockComment => {
                if c == '*' && next == Some('/') {
                    let end = byte_after(i + 2);
                    push_segment(&mut out, text, state, start_byte, end, start_pos);
                    pos = step(step(pos, '*'), '/');
                    i += 2;
                    start_byte = end;
                    start_pos = pos;
                    state = State::Code;
                    continue;
                }
            }
        }

        pos = step(pos, c);
        i += 1;
    }
    push_segment(&mut out, text, state, start_byte, text.len(), start_pos);
    out
}

/// True when the text holds nothing but whitespace and comments.
pub(crate) fn is_blank(text: &str) -> bool {
    segments(text).iter().all(|segment| match segment.kind {
        SegmentKind::Comment => true,
        SegmentKind::Code => segment.text.trim().is_empty(),
        _ => false,
    })
}

pub(crate) fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// How an identifier occurrence is used, judged from the tokens around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Role {
    /// Column, qualifier, function or window reference.
    Reference,
    /// Table name, CTE name or alias being introduced.
    Declaration,
    /// Column named in a join `USING (..)` list.
    JoinColumn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Word {
        text: &'a str,
        quoted: bool,
        position: Position,
    },
    Symbol(char),
    /// Literals, numbers and placeholders.
    Value,
}

impl Token<'_> {
    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Token::Word { text, quoted: false, .. } if text.eq_ignore_ascii_case(keyword))
    }

    fn is_any_keyword(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|keyword| self.is_keyword(keyword))
    }

    /// Unquoted word sqlparser treats as a keyword.
    fn is_sql_keyword(&self) -> bool {
        match self {
            Token::Word {
                text,
                quoted: false,
                ..
            } => ALL_KEYWORDS
                .binary_search(&text.to_ascii_uppercase().as_str())
                .is_ok(),
            _ => false,
        }
    }
}

fn tokens(text: &str) -> Vec<Token<'_>> {
    let mut out = Vec::new();
    for segment in segments(text) {
        match segment.kind {
            SegmentKind::Code => {
                let source = segment.text;
                let mut word: Option<(usize, Position, bool)> = None;
                let mut prev = ' ';
                for (offset, c, position) in segment.chars() {
                    if is_word_char(c) {
                        if word.is_none() {
                            word = Some((offset, position, prev == '$' || c.is_ascii_digit()));
                        }
                    } else {
                        if let Some((start, position, value)) = word.take() {
                            out.push(code_word(&source[start..offset], position, value));
                        }
                        if !c.is_whitespace() && c != '$' {
                            out.push(Token::Symbol(c));
                        }
                    }
                    prev = c;
                }
                if let Some((start, position, value)) = word {
                    out.push(code_word(&source[start..], position, value));
                }
            }
            SegmentKind::QuotedIdent => out.push(Token::Word {
                text: segment.unquoted(),
                quoted: true,
                position: segment.start,
            }),
            SegmentKind::Literal => out.push(Token::Value),
            SegmentKind::Comment => {}
        }
    }
    out
}

fn code_word(text: &str, position: Position, value: bool) -> Token<'_> {
    if value {
        Token::Value
    } else {
        Token::Word {
            text,
            quoted: false,
            position,
        }
    }
}

/// Keywords after which a clause no longer lists tables.
const CLAUSE_KEYWORDS: &[&str] = &[
    "SELECT", "WHERE", "GROUP", "HAVING", "ORDER", "LIMIT", "OFFSET", "ON", "USING", "UNION",
    "EXCEPT", "INTERSECT", "WINDOW", "QUALIFY",
];

/// Role of the word at `index`, given the tokens before and after it.
fn classify(tokens: &[Token<'_>], index: usize, in_from: bool) -> Role {
    // The first part of a dotted name decides for every part.
    let mut first = index;
    while first >= 2
        && tokens[first - 1] == Token::Symbol('.')
        && matches!(tokens[first - 2], Token::Word { .. })
    {
        first -= 2;
    }
    let Some(prev) = first.checked_sub(1).map(|i| tokens[i]) else {
        return Role::Reference;
    };

    let introduces_block = matches!(
        (tokens.get(index + 1), tokens.get(index + 2)),
        (Some(next), Some(Token::Symbol('('))) if next.is_keyword("AS")
    );
    if introduces_block
        || prev.is_any_keyword(&["AS", "FROM", "JOIN", "WITH", "RECURSIVE", "WINDOW"])
        || prev == Token::Symbol(')')
        || (in_from && prev == Token::Symbol(','))
    {
        return Role::Declaration;
    }
    match prev {
        Token::Word { .. } if !prev.is_sql_keyword() => Role::Declaration,
        _ => Role::Reference,
    }
}

/// Every occurrence of `word` as an identifier, in source order, with its role.
///
/// Unquoted words match case-insensitively; quoted identifiers must match
/// exactly. String literals, comments and `$name` placeholders are skipped.
pub(crate) fn occurrences(text: &str, word: &str) -> Vec<(Position, Role)> {
    let tokens = tokens(text);
    let mut found = Vec::new();
    // One entry per open parenthesis: whether that level is in a FROM list.
    let mut from_levels = vec![false];
    let mut in_using = false;

    for (index, token) in tokens.iter().enumerate() {
        match *token {
            Token::Symbol('(') => {
                in_using = index > 0 && tokens[index - 1].is_keyword("USING");
                from_levels.push(false);
            }
            Token::Symbol(')') => {
                in_using = false;
                if from_levels.len() > 1 {
                    from_levels.pop();
                }
            }
            Token::Word {
                text,
                quoted,
                position,
            } => {
                let in_from = from_levels.last().copied().unwrap_or(false);
                let matches = if quoted {
                    text == word
                } else {
                    text.eq_ignore_ascii_case(word)
                };
                if matches {
                    let role = if in_using {
                        Role::JoinColumn
                    } else {
                        classify(&tokens, index, in_from)
                    };
                    found.push((position, role));
                }
                if let Some(level) = from_levels.last_mut() {
                    if token.is_any_keyword(&["FROM", "JOIN"]) {
                        *level = true;
                    } else if token.is_any_keyword(CLAUSE_KEYWORDS) {
                        *level = false;
                    }
                }
            }
            _ => {}
        }
    }
    found
}

/// Position of the `index`-th occurrence of `word` used in `role`, falling
/// back to the first occurrence of any kind.
pub(crate) fn locate_nth(text: &str, word: &str, role: Role, index: usize) -> Option<Position> {
    let all = occurrences(text, word);
    all.iter()
        .filter(|(_, r)| *r == role)
        .nth(index)
        .or_else(|| all.first())
        .map(|(position, _)| *position)
}

/// Every position where `word` occurs as an identifier, in source order.
pub(crate) fn locate_all(text: &str, word: &str) -> Vec<Position> {
    occurrences(text, word)
        .into_iter()
        .map(|(position, _)| position)
        .collect()
}

/// First position where `word` occurs as an identifier.
pub(crate) fn locate(text: &str, word: &str) -> Option<Position> {
    locate_all(text, word).into_iter().next()
}

/// First position of `symbol` outside literals and comments.
pub(crate) fn locate_symbol(text: &str, symbol: char) -> Option<Position> {
    segments(text)
        .into_iter()
        .filter(|segment| segment.kind == SegmentKind::Code)
        .find_map(|segment| {
            segment
                .chars()
                .find(|(_, c, _)| *c == symbol)
                .map(|(_, _, position)| position)
        })
}

/// Split sqlparser's ` at Line: L, Column: C` suffix off an error message.
pub(crate) fn split_location(message: &str) -> (String, Option<Position>) {
    const MARKER: &str = " at Line: ";
    let Some(index) = message.rfind(MARKER) else {
        return (message.to_string(), None);
    };
    let location = &message[index + MARKER.len()..];
    let parsed = location.split_once(", Column: ").and_then(|(line, column)| {
        let line = line.trim().parse::<u64>().ok()?;
        let column = column.trim().parse::<u64>().ok()?;
        (line > 0 && column > 0).then(|| Position::new(line, column))
    });
    match parsed {
        Some(position) => (message[..index].to_string(), Some(position)),
        None => (message.to_string(), None),
    }
}
