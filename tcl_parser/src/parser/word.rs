//! Word contents and substitutions
//!
//! Every function here starts at the cursor position, emits the tokens for
//! one construct into the state, and leaves the cursor just past it.
//! Unclosed constructs fail at the end of the cursor window; nested cursors
//! share their parent's end, so the reported offset is the end of the
//! outermost window.

use super::chars::{is_command_end, is_space, name_length};
use super::cursor::Cursor;
use super::error::{ParseErrorKind, ParseResult};
use super::log_failure;
use super::script;
use crate::config::compile_time::parser::MAX_VARIABLE_NAME_LENGTH;
use crate::state::ParseState;
use crate::tokens::TokenType;

/// Where a run of substitution tokens stops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TextMode {
    /// Unquoted word: whitespace or a command terminator
    Bare { nested: bool },
    /// Inside double quotes: an unescaped `"`
    Quoted,
    /// Inside `(...)` of an array variable: `)`
    ArrayIndex,
}

impl TextMode {
    fn stops_at(&self, cur: &Cursor<'_>, state: &ParseState) -> bool {
        let Some(byte) = cur.peek() else {
            return true;
        };
        match *self {
            TextMode::Bare { nested } => {
                is_space(byte)
                    || is_command_end(byte, nested)
                    || is_line_continuation(cur, state)
            }
            TextMode::Quoted => byte == b'"',
            TextMode::ArrayIndex => byte == b')',
        }
    }
}

/// Backslash-newline, which separates words when backslashes are substituted
pub(crate) fn is_line_continuation(cur: &Cursor<'_>, state: &ParseState) -> bool {
    state.substitution_flags.substitute_backslashes
        && cur.peek() == Some(b'\\')
        && cur.peek_at(1) == Some(b'\n')
}

/// Emit `Text`, `BackslashSequence`, `VariableScalar` and
/// `CommandSubstitution` tokens until `mode` says the run is over
pub(crate) fn parse_tokens(
    cur: &mut Cursor<'_>,
    state: &mut ParseState,
    mode: TextMode,
) -> ParseResult<()> {
    let buffer = cur.buffer();
    let flags = state.substitution_flags;
    let mut text_start: Option<usize> = None;

    while !mode.stops_at(cur, state) {
        let Some(byte) = cur.peek() else { break };
        if !flags.triggers(byte) {
            text_start.get_or_insert(cur.pos());
            cur.bump();
            continue;
        }

        if let Some(start) = text_start.take() {
            state.push_token(buffer, TokenType::Text, start, cur.pos() - start);
        }
        match byte {
            b'$' => parse_variable_at(cur, state)?,
            b'[' => parse_command_substitution_at(cur, state)?,
            _ => parse_backslash_at(cur, state)?,
        }
    }

    if let Some(start) = text_start {
        state.push_token(buffer, TokenType::Text, start, cur.pos() - start);
    }
    Ok(())
}

pub(crate) fn parse_backslash_at(cur: &mut Cursor<'_>, state: &mut ParseState) -> ParseResult<()> {
    let buffer = cur.buffer();
    let start = cur.pos();
    let Some(escape) = state.escapes().decode(cur.rest()) else {
        return Err(state.fail(ParseErrorKind::DanglingBackslash, start, buffer));
    };
    let read = escape.read.min(cur.remaining());
    state.push_token(buffer, TokenType::BackslashSequence, start, read);
    cur.advance(read);
    Ok(())
}

/// `$name`, `$name(index)`, `${name}`, or a lone `$` as text
pub(crate) fn parse_variable_at(cur: &mut Cursor<'_>, state: &mut ParseState) -> ParseResult<()> {
    let buffer = cur.buffer();
    let start = cur.pos();

    if cur.peek_at(1) == Some(b'{') {
        return parse_braced_variable_at(cur, state);
    }

    let name_len = name_length(
        &buffer[start + 1..cur.end()],
        state.engine_flags.unicode_identifiers,
    );
    if name_len == 0 && cur.peek_at(1) != Some(b'(') {
        state.push_token(buffer, TokenType::Text, start, 1);
        cur.advance(1);
        return Ok(());
    }

    let variable = state.push_token(buffer, TokenType::VariableScalar, start, 0);
    cur.advance(1);
    parse_name_and_index(cur, state, name_len)?;
    state.close_token(variable, cur.pos());
    Ok(())
}

fn parse_name_and_index(
    cur: &mut Cursor<'_>,
    state: &mut ParseState,
    name_len: usize,
) -> ParseResult<()> {
    let buffer = cur.buffer();
    if name_len > 0 {
        check_name_length(cur, state, name_len)?;
        state.push_token(buffer, TokenType::Text, cur.pos(), name_len);
        cur.advance(name_len);
    }
    if cur.peek() == Some(b'(') {
        parse_array_index_at(cur, state)?;
    }
    Ok(())
}

fn check_name_length(cur: &Cursor<'_>, state: &mut ParseState, length: usize) -> ParseResult<()> {
    if length > MAX_VARIABLE_NAME_LENGTH {
        return Err(state.fail(
            ParseErrorKind::VariableNameTooLong {
                length,
                max: MAX_VARIABLE_NAME_LENGTH,
            },
            cur.pos(),
            cur.buffer(),
        ));
    }
    Ok(())
}

fn parse_braced_variable_at(cur: &mut Cursor<'_>, state: &mut ParseState) -> ParseResult<()> {
    let buffer = cur.buffer();
    let start = cur.pos();
    let variable = state.push_token(buffer, TokenType::VariableScalar, start, 0);
    cur.advance(2);

    let name_start = cur.pos();
    while let Some(byte) = cur.peek() {
        if byte == b'}' {
            break;
        }
        cur.bump();
    }
    if cur.is_at_end() {
        return Err(state.fail(ParseErrorKind::MissingVariableBrace, cur.end(), buffer));
    }

    let name_len = cur.pos() - name_start;
    if name_len == 0 {
        return Err(state.fail(ParseErrorKind::EmptyVariableName, name_start, buffer));
    }
    cur.set_pos(name_start);
    check_name_length(cur, state, name_len)?;
    state.push_token(buffer, TokenType::Text, name_start, name_len);
    cur.advance(name_len + 1);
    state.close_token(variable, cur.pos());
    Ok(())
}

/// `(index)` following a variable name
pub(crate) fn parse_array_index_at(cur: &mut Cursor<'_>, state: &mut ParseState) -> ParseResult<()> {
    let buffer = cur.buffer();
    let open = cur.pos();
    state.enter(buffer, open)?;

    let index = state.push_token(buffer, TokenType::VariableArrayIndex, open, 0);
    state.push_token(buffer, TokenType::Separator, open, 1);
    cur.advance(1);

    let content_start = cur.pos();
    parse_tokens(cur, state, TextMode::ArrayIndex)?;
    if cur.peek() != Some(b')') {
        return Err(state.fail(ParseErrorKind::MissingCloseIndex, cur.end(), buffer));
    }
    if cur.pos() == content_start {
        return Err(state.fail(ParseErrorKind::EmptyArrayIndex, content_start, buffer));
    }

    state.push_token(buffer, TokenType::Separator, cur.pos(), 1);
    cur.advance(1);
    state.close_token(index, cur.pos());
    state.leave();
    Ok(())
}

/// `[script]`; the nested script stops at the first unnested `]`
pub(crate) fn parse_command_substitution_at(
    cur: &mut Cursor<'_>,
    state: &mut ParseState,
) -> ParseResult<()> {
    let buffer = cur.buffer();
    let open = cur.pos();
    state.enter(buffer, open)?;

    let substitution = state.push_token(buffer, TokenType::CommandSubstitution, open, 0);
    state.push_token(buffer, TokenType::Separator, open, 1);
    cur.advance(1);

    let mut inner = cur.narrow(cur.pos(), cur.remaining());
    script::parse_script_body(&mut inner, state, true, true, false)?;
    cur.set_pos(inner.pos());

    if cur.peek() != Some(b']') {
        return Err(state.fail(ParseErrorKind::MissingCloseBracket, cur.end(), buffer));
    }
    state.push_token(buffer, TokenType::Separator, cur.pos(), 1);
    cur.advance(1);
    state.close_token(substitution, cur.pos());
    state.leave();
    Ok(())
}

/// `{...}` as a single `Text` token including the braces
pub(crate) fn parse_braces_at(cur: &mut Cursor<'_>, state: &mut ParseState) -> ParseResult<()> {
    let buffer = cur.buffer();
    let open = cur.pos();
    state.enter(buffer, open)?;
    cur.advance(1);

    let mut level = 1usize;
    while level > 0 {
        match cur.bump() {
            Some('{') => level += 1,
            Some('}') => level -= 1,
            Some('\\') => {
                cur.bump();
            }
            Some(_) => {}
            None => {
                let kind = if comment_has_brace(&buffer[open + 1..cur.end()]) {
                    ParseErrorKind::MissingCloseBraceComment
                } else {
                    ParseErrorKind::MissingCloseBrace
                };
                return Err(state.fail(kind, cur.end(), buffer));
            }
        }
    }

    state.push_token(buffer, TokenType::Text, open, cur.pos() - open);
    state.leave();
    Ok(())
}

/// Whether a line of the body looks like a comment holding a brace
fn comment_has_brace(body: &str) -> bool {
    body.lines().any(|line| {
        line.trim_start().starts_with('#') && line.contains(|c| c == '{' || c == '}')
    })
}

/// `"..."`: separator, contents, separator; the caller owns the word token
pub(crate) fn parse_quoted_at(cur: &mut Cursor<'_>, state: &mut ParseState) -> ParseResult<()> {
    let buffer = cur.buffer();
    let open = cur.pos();
    state.enter(buffer, open)?;

    state.push_token(buffer, TokenType::Separator, open, 1);
    cur.advance(1);
    parse_tokens(cur, state, TextMode::Quoted)?;
    if cur.peek() != Some(b'"') {
        return Err(state.fail(ParseErrorKind::MissingCloseQuote, cur.end(), buffer));
    }
    state.push_token(buffer, TokenType::Separator, cur.pos(), 1);
    cur.advance(1);
    state.leave();
    Ok(())
}

/// Name without a leading `$`, optionally followed by an array index
pub(crate) fn parse_name_only_at(cur: &mut Cursor<'_>, state: &mut ParseState) -> ParseResult<()> {
    let buffer = cur.buffer();
    let start = cur.pos();
    let name_len = name_length(cur.rest(), state.engine_flags.unicode_identifiers);
    if name_len == 0 && cur.peek() != Some(b'(') {
        return Err(state.fail(ParseErrorKind::EmptyVariableName, start, buffer));
    }

    let variable = state.push_token(buffer, TokenType::VariableNameOnly, start, 0);
    parse_name_and_index(cur, state, name_len)?;
    state.close_token(variable, cur.pos());
    Ok(())
}

// ----------------------------------------------------------------------------
// Standalone entry points
// ----------------------------------------------------------------------------

type ConstructParser = fn(&mut Cursor<'_>, &mut ParseState) -> ParseResult<()>;

fn run_construct(
    buffer: &str,
    start: usize,
    length: usize,
    state: &mut ParseState,
    opener: Option<u8>,
    parse: ConstructParser,
) -> ParseResult<usize> {
    state.ensure_clean()?;
    let line = state.current_line;
    state.begin(start, line);

    let mut cur = Cursor::new(buffer, start, length);
    if let Some(opener) = opener {
        if cur.peek() != Some(opener) {
            return Err(state.fail(
                ParseErrorKind::Expected {
                    expected: char::from(opener),
                },
                start,
                buffer,
            ));
        }
    }
    parse(&mut cur, state)?;
    Ok(cur.pos() - start)
}

fn logged(result: ParseResult<usize>, state: &ParseState) -> ParseResult<usize> {
    if let Err(error) = &result {
        log_failure(error, state.file_name.as_deref());
    }
    result
}

/// Parse the braced construct at `start`; returns the bytes consumed
pub fn parse_braces(
    buffer: &str,
    start: usize,
    length: usize,
    state: &mut ParseState,
) -> ParseResult<usize> {
    let result = run_construct(buffer, start, length, state, Some(b'{'), parse_braces_at);
    logged(result, state)
}

/// Parse the quoted string at `start` into a `Word`; returns the bytes
/// consumed
pub fn parse_quoted_string(
    buffer: &str,
    start: usize,
    length: usize,
    state: &mut ParseState,
) -> ParseResult<usize> {
    fn quoted_word(cur: &mut Cursor<'_>, state: &mut ParseState) -> ParseResult<()> {
        let word = state.push_token(cur.buffer(), TokenType::Word, cur.pos(), 0);
        parse_quoted_at(cur, state)?;
        state.close_token(word, cur.pos());
        Ok(())
    }

    let result = run_construct(buffer, start, length, state, Some(b'"'), quoted_word);
    logged(result, state)
}

/// Parse a variable reference at `start`; returns the bytes consumed
///
/// With `name_only` the reference has no leading `$` and produces a
/// `VariableNameOnly` token. Otherwise it must start with `$`.
pub fn parse_variable_name(
    buffer: &str,
    start: usize,
    length: usize,
    state: &mut ParseState,
    name_only: bool,
) -> ParseResult<usize> {
    let result = if name_only {
        run_construct(buffer, start, length, state, None, parse_name_only_at)
    } else {
        run_construct(buffer, start, length, state, Some(b'$'), parse_variable_at)
    };
    logged(result, state)
}
