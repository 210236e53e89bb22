//! Single-command parsing
//!
//! A command is a run of words separated by whitespace and ended by `;`, a
//! newline, the window end, or `]` when parsing inside a command
//! substitution. Leading whitespace and comments are skipped first and
//! recorded on the state.

use super::chars::{is_command_end, is_space};
use super::cursor::Cursor;
use super::error::{ParseErrorKind, ParseResult};
use super::word::{self, is_line_continuation, TextMode};
use super::log_failure;
use crate::logging::codes;
use crate::state::ParseState;
use crate::tokens::{SyntaxClass, TokenType};

/// Skip whitespace, newlines and comments before a command
///
/// No tokens are emitted. The span of the leading comments is recorded in
/// `comment_start`/`comment_length`.
pub(crate) fn skip_leading(cur: &mut Cursor<'_>, state: &mut ParseState, nested: bool) {
    loop {
        match cur.peek() {
            Some(b'\n') => cur.advance(1),
            Some(byte) if is_space(byte) => cur.advance(1),
            Some(b'\\') if is_line_continuation(cur, state) => cur.advance(2),
            Some(b'#') if state.engine_flags.allow_comments => skip_comment(cur, state),
            _ => break,
        }
        if nested && cur.peek() == Some(b']') {
            break;
        }
    }
}

fn skip_comment(cur: &mut Cursor<'_>, state: &mut ParseState) {
    let start = cur.pos();
    let continuation = state.engine_flags.comment_continuation;

    while let Some(ch) = cur.bump() {
        match ch {
            '\n' => break,
            '\\' if continuation => {
                cur.bump();
            }
            _ => {}
        }
    }

    let comment_start = *state.comment_start.get_or_insert(start);
    state.comment_length = cur.pos() - comment_start;
}

/// Parse the words of one command; the cursor is at its first word
///
/// Returns the number of words. The terminator, if present, is consumed and
/// emitted as a `Separator`; a nested `]` is left for the caller.
pub(crate) fn parse_command_body(
    cur: &mut Cursor<'_>,
    state: &mut ParseState,
    nested: bool,
    allow_empty: bool,
) -> ParseResult<usize> {
    let buffer = cur.buffer();
    let command_start = cur.pos();
    state.command_start = Some(command_start);
    state.current_line = state.line_at(buffer, command_start);

    let words = parse_words(cur, state, nested)?;

    state.command_words = words;
    state.command_length = cur.pos() - command_start;
    if words == 0 && !allow_empty {
        return Err(state.fail(ParseErrorKind::EmptyCommand, command_start, buffer));
    }
    Ok(words)
}

fn parse_words(cur: &mut Cursor<'_>, state: &mut ParseState, nested: bool) -> ParseResult<usize> {
    let buffer = cur.buffer();
    let mut words = 0;

    while let Some(byte) = cur.peek() {
        if is_command_end(byte, nested) {
            if byte != b']' {
                state.terminator = Some(cur.pos());
                state.push_token(buffer, TokenType::Separator, cur.pos(), 1);
                cur.advance(1);
            }
            break;
        }

        if is_space(byte) || is_line_continuation(cur, state) {
            let start = cur.pos();
            skip_separators(cur, state);
            state.push_token(buffer, TokenType::Separator, start, cur.pos() - start);
            continue;
        }

        let index = state.token_count();
        parse_word(cur, state, nested)?;
        if state.syntax {
            let first = buffer.as_bytes().get(state.tokens()[index].start).copied();
            state.set_syntax(index, SyntaxClass::for_word(words, first));
        }
        words += 1;
    }

    Ok(words)
}

fn skip_separators(cur: &mut Cursor<'_>, state: &ParseState) {
    loop {
        match cur.peek() {
            Some(byte) if is_space(byte) => cur.advance(1),
            Some(b'\\') if is_line_continuation(cur, state) => cur.advance(2),
            _ => break,
        }
    }
}

/// One word: braced, quoted, or bare
pub(crate) fn parse_word(cur: &mut Cursor<'_>, state: &mut ParseState, nested: bool) -> ParseResult<()> {
    let buffer = cur.buffer();
    let word = state.push_token(buffer, TokenType::Word, cur.pos(), 0);

    match cur.peek() {
        Some(b'{') => {
            word::parse_braces_at(cur, state)?;
            after_close(cur, state, nested, ParseErrorKind::ExtraAfterCloseBrace)?;
        }
        Some(b'"') => {
            word::parse_quoted_at(cur, state)?;
            after_close(cur, state, nested, ParseErrorKind::ExtraAfterCloseQuote)?;
        }
        _ => word::parse_tokens(cur, state, TextMode::Bare { nested })?,
    }

    state.close_token(word, cur.pos());
    Ok(())
}

/// Characters directly after a closing brace or quote
///
/// Strict parsing rejects them; otherwise they continue the word.
fn after_close(
    cur: &mut Cursor<'_>,
    state: &mut ParseState,
    nested: bool,
    kind: ParseErrorKind,
) -> ParseResult<()> {
    let Some(byte) = cur.peek() else {
        return Ok(());
    };
    if is_space(byte) || is_command_end(byte, nested) || is_line_continuation(cur, state) {
        return Ok(());
    }
    if state.strict {
        return Err(state.fail(kind, cur.pos(), cur.buffer()));
    }
    word::parse_tokens(cur, state, TextMode::Bare { nested })
}

/// Parse one command from `buffer[start..start + length]`
///
/// Tokens for the command's words and its terminator are appended to the
/// state. With `allow_empty` unset, a command with no words fails.
pub fn parse_command(
    buffer: &str,
    start: usize,
    length: usize,
    nested: bool,
    state: &mut ParseState,
    allow_empty: bool,
) -> ParseResult<()> {
    let result = run_command(buffer, start, length, nested, state, allow_empty);
    match &result {
        Ok(()) => {
            log_success!(
                codes::success::COMMAND_PARSED,
                "Command parsed",
                "words" => state.command_words,
                "tokens" => state.token_count()
            );
        }
        Err(error) => log_failure(error, state.file_name.as_deref()),
    }
    result
}

fn run_command(
    buffer: &str,
    start: usize,
    length: usize,
    nested: bool,
    state: &mut ParseState,
    allow_empty: bool,
) -> ParseResult<()> {
    state.ensure_clean()?;
    let line = state.current_line;
    state.begin(start, line);
    state.check_ready(buffer, start, false)?;

    let mut cur = Cursor::new(buffer, start, length);
    skip_leading(&mut cur, state, nested);
    parse_command_body(&mut cur, state, nested, allow_empty)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::error::ParseError;
    use crate::state::EngineFlags;
    use crate::tokens::Token;
    use assert_matches::assert_matches;

    fn kinds(tokens: &[Token]) -> Vec<TokenType> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_command() {
        let text = "set a 1;puts";
        let mut state = ParseState::default();
        parse_command(text, 0, text.len(), false, &mut state, false).unwrap();

        assert_eq!(
            kinds(state.tokens()),
            vec![
                TokenType::Word,
                TokenType::Text,
                TokenType::Separator,
                TokenType::Word,
                TokenType::Text,
                TokenType::Separator,
                TokenType::Word,
                TokenType::Text,
                TokenType::Separator,
            ]
        );
        assert_eq!(state.command_words, 3);
        assert_eq!(state.command_start, Some(0));
        assert_eq!(state.command_length, 8);
        assert_eq!(state.terminator, Some(7));
    }

    #[test]
    fn test_leading_comment_is_recorded() {
        let text = "  # note \\\n more\n# two\nputs x";
        let mut state = ParseState::default();
        parse_command(text, 0, text.len(), false, &mut state, false).unwrap();

        assert_eq!(state.comment_start, Some(2));
        assert_eq!(&text[2..2 + state.comment_length], "# note \\\n more\n# two\n");
        assert_eq!(state.command_start, Some(text.len() - 6));
        assert_eq!(state.command_words, 2);
    }

    #[test]
    fn test_comments_disabled() {
        let text = "# a";
        let flags = EngineFlags {
            allow_comments: false,
            ..EngineFlags::default()
        };
        let mut state = ParseState::new(flags, Default::default());
        parse_command(text, 0, text.len(), false, &mut state, false).unwrap();

        assert_eq!(state.command_words, 2);
        assert_eq!(state.comment_start, None);
    }

    #[test]
    fn test_line_continuation_separates_words() {
        let text = "a \\\n   b";
        let mut state = ParseState::default();
        parse_command(text, 0, text.len(), false, &mut state, false).unwrap();

        assert_eq!(state.command_words, 2);
        assert_eq!(state.tokens()[2].kind, TokenType::Separator);
        assert_eq!(state.tokens()[2].text(text), " \\\n   ");
        assert_eq!(state.tokens()[3].line, 2);
    }

    #[test]
    fn test_nested_stops_before_bracket() {
        let text = "b c] d";
        let mut state = ParseState::default();
        parse_command(text, 0, text.len(), true, &mut state, false).unwrap();

        assert_eq!(state.command_words, 2);
        assert_eq!(state.command_length, 3);
        assert_eq!(state.terminator, None);
    }

    #[test]
    fn test_empty_command() {
        let text = "   ;";
        let mut state = ParseState::default();
        assert_matches!(
            parse_command(text, 0, text.len(), false, &mut state, false),
            Err(ParseError {
                kind: ParseErrorKind::EmptyCommand,
                offset: 3,
                ..
            })
        );

        let mut state = ParseState::default();
        parse_command(text, 0, text.len(), false, &mut state, true).unwrap();
        assert_eq!(state.command_words, 0);
    }

    #[test]
    fn test_extra_characters_after_close() {
        let text = "puts {a}b";
        let mut state = ParseState::default();
        state.strict = true;
        assert_matches!(
            parse_command(text, 0, text.len(), false, &mut state, false),
            Err(ParseError {
                kind: ParseErrorKind::ExtraAfterCloseBrace,
                offset: 8,
                ..
            })
        );

        let text = "puts \"a\"b";
        let mut state = ParseState::default();
        parse_command(text, 0, text.len(), false, &mut state, false).unwrap();

        let word = &state.tokens()[3];
        assert_eq!(word.kind, TokenType::Word);
        assert_eq!(word.text(text), "\"a\"b");
        assert_eq!(state.command_words, 2);
    }

    #[test]
    fn test_existing_error_blocks_parse() {
        let mut state = ParseState::default();
        assert!(parse_command("{", 0, 1, false, &mut state, false).is_err());
        assert!(parse_command("a", 0, 1, false, &mut state, false).is_err());

        state.reset();
        assert!(parse_command("a", 0, 1, false, &mut state, false).is_ok());
    }

    #[test]
    fn test_syntax_classes_on_words() {
        let text = "puts \"a\" {b} $c [d]";
        let mut state = ParseState::default();
        state.syntax = true;
        parse_command(text, 0, text.len(), false, &mut state, false).unwrap();

        let classes: Vec<_> = state
            .tokens()
            .iter()
            .filter(|t| t.kind == TokenType::Word)
            .map(|t| t.syntax.map(|c| c.to_string()))
            .collect();
        assert_eq!(
            classes,
            vec![
                Some("CommandName/Plain".to_string()),
                Some("Argument/StringLiteral".to_string()),
                Some("Argument/Block".to_string()),
                Some("Argument/Variable".to_string()),
                Some("Argument/Command".to_string()),
                Some("CommandName/Plain".to_string()),
            ]
        );
    }
}
