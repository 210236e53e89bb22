//! Expression parsing
//!
//! Operator-precedence grammar over the same cursor and substitution code
//! as scripts. Tokens come out flat in source order; whitespace produces no
//! tokens.
//!
//! Binding, loosest first:
//!
//! | Level | Operators                     |
//! |-------|-------------------------------|
//! | 0     | `?:` (right)                  |
//! | 1     | `\|\|`                        |
//! | 2     | `^^`                          |
//! | 3     | `&&`                          |
//! | 4     | `=>`                          |
//! | 5     | `<=>`                         |
//! | 6     | `\|`                          |
//! | 7     | `^`                           |
//! | 8     | `&`                           |
//! | 9     | `->`                          |
//! | 10    | `<->`                         |
//! | 11    | `in ni`                       |
//! | 12    | `== != eq ne`                 |
//! | 13    | `< > <= >= lt gt le ge`       |
//! | 14    | `<< >> <<< >>>`               |
//! | 15    | `+ -`                         |
//! | 16    | `* / %`                       |
//! | 17    | `**` (right)                  |
//!
//! Unary `- + ! ~` bind tighter than every binary operator.

use super::chars::{is_identifier_char, is_space, name_length};
use super::cursor::Cursor;
use super::error::{ParseErrorKind, ParseResult};
use super::log_failure;
use super::word;
use crate::config::compile_time::expression::MAX_FUNCTION_ARGUMENTS;
use crate::logging::codes;
use crate::state::ParseState;
use crate::tokens::TokenType;

/// Binary operators, longest spelling first so the first match is the
/// maximal munch
const BINARY_OPERATORS: &[(&str, u8)] = &[
    ("<<<", 14),
    (">>>", 14),
    ("<=>", 5),
    ("<->", 10),
    ("||", 1),
    ("^^", 2),
    ("&&", 3),
    ("=>", 4),
    ("->", 9),
    ("==", 12),
    ("!=", 12),
    ("<=", 13),
    (">=", 13),
    ("<<", 14),
    (">>", 14),
    ("**", 17),
    ("in", 11),
    ("ni", 11),
    ("eq", 12),
    ("ne", 12),
    ("lt", 13),
    ("gt", 13),
    ("le", 13),
    ("ge", 13),
    ("|", 6),
    ("^", 7),
    ("&", 8),
    ("<", 13),
    (">", 13),
    ("+", 15),
    ("-", 15),
    ("*", 16),
    ("/", 16),
    ("%", 16),
];

const RIGHT_ASSOCIATIVE: &str = "**";

const LITERAL_WORDS: &[&str] = &["true", "false", "yes", "no", "on", "off", "inf", "nan"];

fn skip_whitespace(cur: &mut Cursor<'_>) {
    loop {
        match cur.peek() {
            Some(b'\n') => cur.advance(1),
            Some(byte) if is_space(byte) => cur.advance(1),
            Some(b'\\') if cur.peek_at(1) == Some(b'\n') => cur.advance(2),
            _ => break,
        }
    }
}

fn peek_binary_operator(cur: &Cursor<'_>) -> Option<(&'static str, u8)> {
    let rest = cur.rest();
    BINARY_OPERATORS.iter().copied().find(|(op, _)| {
        if !rest.starts_with(op) {
            return false;
        }
        let is_word = op.as_bytes()[0].is_ascii_alphabetic();
        !(is_word && rest.as_bytes().get(op.len()).is_some_and(|&b| is_identifier_char(b)))
    })
}

fn emit_operator(cur: &mut Cursor<'_>, state: &mut ParseState, length: usize) {
    state.push_token(cur.buffer(), TokenType::Operator, cur.pos(), length);
    cur.advance(length);
}

fn parse_ternary(cur: &mut Cursor<'_>, state: &mut ParseState) -> ParseResult<()> {
    let buffer = cur.buffer();
    state.enter_expression(buffer, cur.pos())?;

    parse_binary(cur, state, 1)?;
    skip_whitespace(cur);
    if cur.peek() == Some(b'?') {
        emit_operator(cur, state, 1);
        parse_ternary(cur, state)?;
        skip_whitespace(cur);
        if cur.peek() != Some(b':') {
            return Err(state.fail(ParseErrorKind::MissingColon, cur.pos(), buffer));
        }
        emit_operator(cur, state, 1);
        parse_ternary(cur, state)?;
    }

    state.leave_expression();
    Ok(())
}

fn parse_binary(cur: &mut Cursor<'_>, state: &mut ParseState, min_level: u8) -> ParseResult<()> {
    parse_unary(cur, state)?;

    loop {
        skip_whitespace(cur);
        let Some((op, level)) = peek_binary_operator(cur) else {
            break;
        };
        if level < min_level {
            break;
        }

        let opener = cur.pos();
        emit_operator(cur, state, op.len());
        if op == RIGHT_ASSOCIATIVE {
            state.enter_expression(cur.buffer(), opener)?;
            parse_binary(cur, state, level)?;
            state.leave_expression();
        } else {
            parse_binary(cur, state, level + 1)?;
        }
    }
    Ok(())
}

fn parse_unary(cur: &mut Cursor<'_>, state: &mut ParseState) -> ParseResult<()> {
    skip_whitespace(cur);
    match cur.peek() {
        Some(b'-' | b'+' | b'!' | b'~') => {
            let opener = cur.pos();
            state.enter_expression(cur.buffer(), opener)?;
            emit_operator(cur, state, 1);
            parse_unary(cur, state)?;
            state.leave_expression();
            Ok(())
        }
        _ => parse_primary(cur, state),
    }
}

fn parse_primary(cur: &mut Cursor<'_>, state: &mut ParseState) -> ParseResult<()> {
    let buffer = cur.buffer();
    let start = cur.pos();
    let flags = state.substitution_flags;

    let Some(byte) = cur.peek() else {
        return Err(state.fail(ParseErrorKind::MissingOperand, start, buffer));
    };

    match byte {
        b'(' => parse_parenthesis(cur, state),
        b'$' if flags.substitute_variables => {
            if cur.peek_at(1) != Some(b'{')
                && cur.peek_at(1) != Some(b'(')
                && name_length(&buffer[start + 1..cur.end()], state.engine_flags.unicode_identifiers)
                    == 0
            {
                return Err(state.fail(ParseErrorKind::UnexpectedCharacter { ch: '$' }, start, buffer));
            }
            wrap_operand(cur, state, word::parse_variable_at)
        }
        b'[' if flags.substitute_commands => wrap_operand(cur, state, word::parse_command_substitution_at),
        b'"' => wrap_operand(cur, state, word::parse_quoted_at),
        b'{' => wrap_operand(cur, state, word::parse_braces_at),
        b'0'..=b'9' => parse_number(cur, state),
        b'.' if cur.peek_at(1).is_some_and(|b| b.is_ascii_digit()) => parse_number(cur, state),
        b if b.is_ascii_alphabetic() || b == b'_' => parse_identifier(cur, state),
        b':' if cur.peek_at(1) == Some(b':') => parse_identifier(cur, state),
        b')' | b',' | b':' | b'?' => Err(state.fail(ParseErrorKind::MissingOperand, start, buffer)),
        _ if peek_binary_operator(cur).is_some() => {
            Err(state.fail(ParseErrorKind::MissingOperand, start, buffer))
        }
        _ => {
            let ch = cur.peek_char().unwrap_or(char::from(byte));
            Err(state.fail(ParseErrorKind::UnexpectedCharacter { ch }, start, buffer))
        }
    }
}

fn wrap_operand(
    cur: &mut Cursor<'_>,
    state: &mut ParseState,
    inner: fn(&mut Cursor<'_>, &mut ParseState) -> ParseResult<()>,
) -> ParseResult<()> {
    let operand = state.push_token(cur.buffer(), TokenType::Operand, cur.pos(), 0);
    inner(cur, state)?;
    state.close_token(operand, cur.pos());
    Ok(())
}

fn parse_parenthesis(cur: &mut Cursor<'_>, state: &mut ParseState) -> ParseResult<()> {
    let buffer = cur.buffer();
    let open = cur.pos();
    state.enter_expression(buffer, open)?;

    let group = state.push_token(buffer, TokenType::Parenthesis, open, 0);
    state.push_token(buffer, TokenType::Separator, open, 1);
    cur.advance(1);

    parse_ternary(cur, state)?;
    skip_whitespace(cur);
    if cur.peek() != Some(b')') {
        return Err(state.fail(ParseErrorKind::MissingCloseParen, cur.pos(), buffer));
    }
    state.push_token(buffer, TokenType::Separator, cur.pos(), 1);
    cur.advance(1);
    state.close_token(group, cur.pos());

    state.leave_expression();
    Ok(())
}

/// Byte length of a numeric literal, or `None` when the prefix or exponent
/// has no digits
fn scan_number(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let digits_from = |from: usize, radix: u32| {
        bytes[from..]
            .iter()
            .take_while(|&&b| (b as char).is_digit(radix))
            .count()
    };

    if bytes.len() > 1 && bytes[0] == b'0' {
        let radix = match bytes[1] {
            b'x' | b'X' => Some(16),
            b'o' | b'O' => Some(8),
            b'b' | b'B' => Some(2),
            b'd' | b'D' => Some(10),
            _ => None,
        };
        if let Some(radix) = radix {
            let count = digits_from(2, radix);
            return (count > 0).then_some(2 + count);
        }
    }

    let mut length = digits_from(0, 10);
    if bytes.get(length) == Some(&b'.') {
        length += 1 + digits_from(length + 1, 10);
    }
    if matches!(bytes.get(length), Some(b'e' | b'E')) {
        let mut exponent = length + 1;
        if matches!(bytes.get(exponent), Some(b'+' | b'-')) {
            exponent += 1;
        }
        let count = digits_from(exponent, 10);
        if count == 0 {
            return None;
        }
        length = exponent + count;
    }
    Some(length)
}

fn parse_number(cur: &mut Cursor<'_>, state: &mut ParseState) -> ParseResult<()> {
    let buffer = cur.buffer();
    let start = cur.pos();
    let rest = cur.rest();

    let scanned = scan_number(rest);
    let trailing = scanned.map_or(true, |length| {
        rest.as_bytes().get(length).is_some_and(|&b| is_identifier_char(b))
    });
    if trailing {
        let run = scanned.unwrap_or(0)
            + rest.as_bytes()[scanned.unwrap_or(0)..]
                .iter()
                .take_while(|&&b| is_identifier_char(b) || b == b'.')
                .count();
        let literal = rest[..run].to_string();
        return Err(state.fail(ParseErrorKind::MalformedNumber { literal }, start, buffer));
    }

    let length = scanned.unwrap_or(0);
    state.push_token(buffer, TokenType::Operand, start, length);
    cur.advance(length);
    Ok(())
}

fn parse_identifier(cur: &mut Cursor<'_>, state: &mut ParseState) -> ParseResult<()> {
    let buffer = cur.buffer();
    let start = cur.pos();
    let length = name_length(cur.rest(), false);
    let name = &buffer[start..start + length];

    let mut lookahead = *cur;
    lookahead.advance(length);
    skip_whitespace(&mut lookahead);
    if lookahead.peek() == Some(b'(') {
        return parse_function_call(cur, state, length);
    }

    if LITERAL_WORDS.iter().any(|word| word.eq_ignore_ascii_case(name)) {
        state.push_token(buffer, TokenType::Operand, start, length);
        cur.advance(length);
        return Ok(());
    }

    Err(state.fail(
        ParseErrorKind::InvalidBareword {
            word: name.to_string(),
        },
        start,
        buffer,
    ))
}

fn parse_function_call(
    cur: &mut Cursor<'_>,
    state: &mut ParseState,
    name_len: usize,
) -> ParseResult<()> {
    let buffer = cur.buffer();
    let start = cur.pos();
    state.enter_expression(buffer, start)?;

    let call = state.push_token(buffer, TokenType::FunctionCall, start, 0);
    state.push_token(buffer, TokenType::Text, start, name_len);
    cur.advance(name_len);
    skip_whitespace(cur);
    state.push_token(buffer, TokenType::Separator, cur.pos(), 1);
    cur.advance(1);

    skip_whitespace(cur);
    if cur.peek() != Some(b')') {
        let mut arguments = 0;
        loop {
            if arguments == MAX_FUNCTION_ARGUMENTS {
                return Err(state.fail(
                    ParseErrorKind::TooManyArguments {
                        max: MAX_FUNCTION_ARGUMENTS,
                    },
                    cur.pos(),
                    buffer,
                ));
            }
            parse_ternary(cur, state)?;
            arguments += 1;

            skip_whitespace(cur);
            match cur.peek() {
                Some(b',') => {
                    state.push_token(buffer, TokenType::Separator, cur.pos(), 1);
                    cur.advance(1);
                }
                Some(b')') => break,
                _ => return Err(state.fail(ParseErrorKind::MissingCloseParen, cur.pos(), buffer)),
            }
        }
    }

    state.push_token(buffer, TokenType::Separator, cur.pos(), 1);
    cur.advance(1);
    state.close_token(call, cur.pos());

    state.leave_expression();
    Ok(())
}

/// Parse `buffer[start..start + length]` as one expression
///
/// Tokens are appended to the state. `no_ready` skips the token budget
/// check.
pub fn parse_expression(
    buffer: &str,
    start: usize,
    length: usize,
    state: &mut ParseState,
    no_ready: bool,
) -> ParseResult<()> {
    let first = state.token_count();
    let result = run_expression(buffer, start, length, state, no_ready);
    match &result {
        Ok(()) => {
            log_success!(
                codes::success::EXPRESSION_PARSED,
                "Expression parsed",
                "tokens" => state.token_count() - first
            );
        }
        Err(error) => log_failure(error, state.file_name.as_deref()),
    }
    result
}

fn run_expression(
    buffer: &str,
    start: usize,
    length: usize,
    state: &mut ParseState,
    no_ready: bool,
) -> ParseResult<()> {
    state.ensure_clean()?;
    let line = state.current_line;
    state.begin(start, line);
    state.check_ready(buffer, start, no_ready)?;

    let mut cur = Cursor::new(buffer, start, length);
    skip_whitespace(&mut cur);
    if cur.is_at_end() {
        return Err(state.fail(ParseErrorKind::EmptyExpression, start, buffer));
    }

    parse_ternary(&mut cur, state)?;
    skip_whitespace(&mut cur);
    if !cur.is_at_end() {
        return Err(state.fail(ParseErrorKind::ExtraTokens, cur.pos(), buffer));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::error::ParseError;
    use assert_matches::assert_matches;

    fn parse(text: &str) -> Vec<(TokenType, String, usize)> {
        let mut state = ParseState::default();
        parse_expression(text, 0, text.len(), &mut state, false).unwrap();
        state
            .tokens()
            .iter()
            .map(|t| (t.kind, t.text(text).to_string(), t.components))
            .collect()
    }

    fn fail(text: &str) -> ParseError {
        let mut state = ParseState::default();
        parse_expression(text, 0, text.len(), &mut state, false).unwrap_err()
    }

    fn op(text: &str) -> (TokenType, String, usize) {
        (TokenType::Operator, text.to_string(), 0)
    }

    fn leaf(kind: TokenType, text: &str) -> (TokenType, String, usize) {
        (kind, text.to_string(), 0)
    }

    #[test]
    fn test_variable_plus_literal() {
        assert_eq!(
            parse("$x + 1"),
            vec![
                (TokenType::Operand, "$x".to_string(), 2),
                (TokenType::VariableScalar, "$x".to_string(), 1),
                leaf(TokenType::Text, "x"),
                op("+"),
                leaf(TokenType::Operand, "1"),
            ]
        );
    }

    #[test]
    fn test_maximal_munch() {
        let kinds = parse("1<<<2 <=> 3 ** -4");
        let operators: Vec<_> = kinds
            .iter()
            .filter(|(k, _, _)| *k == TokenType::Operator)
            .map(|(_, t, _)| t.as_str())
            .collect();

        assert_eq!(operators, vec!["<<<", "<=>", "**", "-"]);
    }

    #[test]
    fn test_word_operators_need_a_boundary() {
        assert_eq!(parse("$a eq {b}")[3], op("eq"));
        assert_matches!(
            fail("1 inx 2").kind,
            ParseErrorKind::ExtraTokens
        );
    }

    #[test]
    fn test_ternary_and_parentheses() {
        let tokens = parse("($a > 1) ? \"yes\" : [f]");

        assert_eq!(tokens[0].0, TokenType::Parenthesis);
        assert_eq!(tokens[0].1, "($a > 1)");
        assert_eq!(tokens[1], leaf(TokenType::Separator, "("));
        assert!(tokens.contains(&op("?")));
        assert!(tokens.contains(&op(":")));
        assert!(tokens
            .iter()
            .any(|(k, t, _)| *k == TokenType::Operand && t == "\"yes\""));
        assert!(tokens
            .iter()
            .any(|(k, t, _)| *k == TokenType::CommandSubstitution && t == "[f]"));
    }

    #[test]
    fn test_function_call() {
        let tokens = parse("max (1, ::tcl::mathfunc::abs(-2)) + min()");

        assert_eq!(tokens[0].0, TokenType::FunctionCall);
        assert_eq!(tokens[0].1, "max (1, ::tcl::mathfunc::abs(-2))");
        assert_eq!(tokens[1], leaf(TokenType::Text, "max"));
        assert_eq!(tokens[2], leaf(TokenType::Separator, "("));
        assert_eq!(tokens[4], leaf(TokenType::Separator, ","));
        assert_eq!(tokens[5].1, "::tcl::mathfunc::abs(-2)");
        assert!(tokens.contains(&(TokenType::FunctionCall, "min()".to_string(), 3)));
    }

    #[test]
    fn test_literals() {
        for literal in ["0x1F", "0o17", "0b101", "0d99", "017", "1.5", ".5", "2e10", "1.5E-3", "True", "off", "Inf", "NaN"] {
            assert_eq!(parse(literal), vec![leaf(TokenType::Operand, literal)], "{}", literal);
        }
    }

    #[test]
    fn test_malformed_numbers() {
        assert_matches!(
            fail("0x").kind,
            ParseErrorKind::MalformedNumber { literal } if literal == "0x"
        );
        assert_matches!(
            fail("12abc + 1").kind,
            ParseErrorKind::MalformedNumber { literal } if literal == "12abc"
        );
        assert_matches!(fail("1e").kind, ParseErrorKind::MalformedNumber { .. });
    }

    #[test]
    fn test_failures() {
        assert_matches!(fail("   "), ParseError { kind: ParseErrorKind::EmptyExpression, offset: 0, .. });
        assert_matches!(fail("1 +"), ParseError { kind: ParseErrorKind::MissingOperand, offset: 3, .. });
        assert_matches!(fail("* 2"), ParseError { kind: ParseErrorKind::MissingOperand, offset: 0, .. });
        assert_matches!(fail("(1 + 2"), ParseError { kind: ParseErrorKind::MissingCloseParen, offset: 6, .. });
        assert_matches!(fail("$a ? 1"), ParseError { kind: ParseErrorKind::MissingColon, offset: 6, .. });
        assert_matches!(fail("1 2"), ParseError { kind: ParseErrorKind::ExtraTokens, offset: 2, .. });
        assert_matches!(fail("abc"), ParseError { kind: ParseErrorKind::InvalidBareword { .. }, .. });
        assert_matches!(fail("1 + @"), ParseError { kind: ParseErrorKind::UnexpectedCharacter { ch: '@' }, offset: 4, .. });
        assert_matches!(fail("$ + 1"), ParseError { kind: ParseErrorKind::UnexpectedCharacter { ch: '$' }, .. });
        assert_matches!(fail("f(1,)"), ParseError { kind: ParseErrorKind::MissingOperand, offset: 4, .. });
    }

    #[test]
    fn test_nesting_limit() {
        let depth = crate::config::compile_time::expression::MAX_EXPRESSION_DEPTH;
        let text = format!("{}1{}", "(".repeat(depth + 1), ")".repeat(depth + 1));

        assert_matches!(fail(&text).kind, ParseErrorKind::NestingTooDeep { .. });
    }

    #[test]
    fn test_unary_chain_fails_at_innermost_operator() {
        let depth = crate::config::compile_time::expression::MAX_EXPRESSION_DEPTH;
        let text = format!("{}1", "-".repeat(depth * 50));
        let error = fail(&text);

        assert_matches!(error.kind, ParseErrorKind::NestingTooDeep { max } if max == depth);
        assert_eq!(error.offset, depth - 1);
    }

    #[test]
    fn test_window_offsets_are_absolute() {
        let buffer = "if {$a > 2} then";
        let mut state = ParseState::default();
        parse_expression(buffer, 4, 6, &mut state, false).unwrap();

        assert_eq!(state.tokens()[0].start, 4);
        assert_eq!(state.tokens().last().map(|t| t.text(buffer)), Some("2"));
    }
}
