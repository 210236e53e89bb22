//! Script parsing
//!
//! A script is parsed command by command into one `SimpleScript` wrapper.
//! Whitespace, blank lines and comments between commands become `Separator`
//! tokens so the wrapper's leaves cover the window without gaps.

use super::command::{parse_command_body, skip_leading};
use super::cursor::Cursor;
use super::error::ParseResult;
use super::log_failure;
use crate::logging::codes;
use crate::state::{EngineFlags, ParseState, SubstitutionFlags};
use crate::tokens::{Token, TokenType};

/// Options of a script parse
#[derive(Debug, Clone)]
pub struct ScriptOptions<'a> {
    /// Used in diagnostics only
    pub file_name: Option<&'a str>,
    /// Line number of the first byte of the window
    pub current_line: u32,
    pub engine_flags: EngineFlags,
    pub substitution_flags: SubstitutionFlags,
    /// Stop at the first `]` in command position
    pub nested: bool,
    /// Skip the token budget check
    pub no_ready: bool,
    /// Tolerate input ending inside an open construct and classify tokens
    pub syntax: bool,
    /// Reject characters directly after a closing brace or quote
    pub strict: bool,
}

impl Default for ScriptOptions<'_> {
    fn default() -> Self {
        Self {
            file_name: None,
            current_line: 1,
            engine_flags: EngineFlags::default(),
            substitution_flags: SubstitutionFlags::default(),
            nested: false,
            no_ready: false,
            syntax: false,
            strict: false,
        }
    }
}

impl<'a> ScriptOptions<'a> {
    pub fn with_file_name(mut self, file_name: &'a str) -> Self {
        self.file_name = Some(file_name);
        self
    }
}

/// Parse `buffer[start..start + length]` as a script
///
/// Returns the tokens appended by this call, beginning with the
/// `SimpleScript` wrapper.
pub fn parse_script<'s>(
    buffer: &str,
    start: usize,
    length: usize,
    options: &ScriptOptions<'_>,
    state: &'s mut ParseState,
) -> ParseResult<&'s [Token]> {
    let first = state.token_count();
    let result = run_script(buffer, start, length, options, state);

    match &result {
        Ok(()) => {
            log_success!(
                codes::success::SCRIPT_PARSED,
                "Script parsed",
                "commands" => state.command_count,
                "tokens" => state.token_count() - first,
                "incomplete" => state.incomplete
            );
        }
        Err(error) => log_failure(error, options.file_name),
    }

    result.map(move |()| &state.tokens()[first..])
}

fn run_script(
    buffer: &str,
    start: usize,
    length: usize,
    options: &ScriptOptions<'_>,
    state: &mut ParseState,
) -> ParseResult<()> {
    state.ensure_clean()?;
    state.engine_flags = options.engine_flags;
    state.substitution_flags = options.substitution_flags;
    state.file_name = options.file_name.map(str::to_string);
    state.strict = options.strict;
    state.syntax = options.syntax;
    state.command_count = 0;
    state.begin(start, options.current_line);
    state.check_ready(buffer, start, options.no_ready)?;

    let mut cur = Cursor::new(buffer, start, length);
    parse_script_body(&mut cur, state, options.nested, options.no_ready, options.syntax)
}

/// Parse commands until the window ends or, when `nested`, a `]` is reached
///
/// With `tolerate_incomplete`, a command that runs off the end of the window
/// inside an open construct is dropped, the state is marked incomplete, and
/// the wrapper is closed over the complete commands.
pub(crate) fn parse_script_body(
    cur: &mut Cursor<'_>,
    state: &mut ParseState,
    nested: bool,
    no_ready: bool,
    tolerate_incomplete: bool,
) -> ParseResult<()> {
    let buffer = cur.buffer();
    let wrapper = state.push_token(buffer, TokenType::SimpleScript, cur.pos(), 0);

    loop {
        let gap = cur.pos();
        state.clear_command();
        skip_leading(cur, state, nested);
        if cur.pos() > gap {
            state.push_token(buffer, TokenType::Separator, gap, cur.pos() - gap);
        }
        if cur.is_at_end() || (nested && cur.peek() == Some(b']')) {
            break;
        }
        state.check_ready(buffer, cur.pos(), no_ready)?;

        let mark = state.token_count();
        let command_start = cur.pos();
        match parse_command_body(cur, state, nested, true) {
            Ok(0) => {}
            Ok(_) => state.command_count += 1,
            Err(error) if tolerate_incomplete && error.is_incomplete() => {
                state.truncate_tokens(mark);
                state.take_error();
                state.reset_depth();
                state.incomplete = true;
                cur.set_pos(command_start);
                break;
            }
            Err(error) => return Err(error),
        }
    }

    state.close_token(wrapper, cur.pos());
    Ok(())
}

/// Whether the window holds only complete commands
///
/// Input that ends inside a brace, quote, bracket, array index or after a
/// trailing backslash is incomplete; other failures still count as complete.
pub fn is_complete(
    buffer: &str,
    start: usize,
    length: usize,
    engine_flags: EngineFlags,
    substitution_flags: SubstitutionFlags,
) -> bool {
    let mut state = ParseState::new(engine_flags, substitution_flags);
    let mut cur = Cursor::new(buffer, start, length);
    let _ = parse_script_body(&mut cur, &mut state, false, true, false);
    !state.incomplete
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::compile_time::parser::MAX_PARSE_DEPTH;
    use crate::parser::error::{ParseError, ParseErrorKind};
    use crate::parser::expression::parse_expression;
    use crate::roundtrip::{filter_for_round_trip, render};
    use crate::tokens::TokenList;
    use assert_matches::assert_matches;

    fn parse(text: &str) -> TokenList {
        let mut state = ParseState::default();
        parse_script(text, 0, text.len(), &ScriptOptions::default(), &mut state)
            .unwrap()
            .to_vec()
            .into()
    }

    fn round_trip(text: &str) -> String {
        let tokens = parse(text);
        render(text, &filter_for_round_trip(&tokens))
    }

    #[test]
    fn test_wrapper_spans_window() {
        let text = "\n# c\nset a 1\n\nputs $a\n";
        let mut state = ParseState::default();
        let tokens =
            parse_script(text, 0, text.len(), &ScriptOptions::default(), &mut state).unwrap();

        assert_eq!(tokens[0].kind, TokenType::SimpleScript);
        assert_eq!(tokens[0].length, text.len());
        assert_eq!(tokens[0].components, tokens.len() - 1);
        assert_eq!(tokens[1].kind, TokenType::Separator);
        assert_eq!(tokens[1].text(text), "\n# c\n");
        assert_eq!(state.command_count, 2);
    }

    #[test]
    fn test_round_trip_reproduces_source() {
        let scripts = [
            "set a 1",
            "  proc f {x} {\n  return [expr {$x + 1}]\n}\nf 2;  # tail comment\n",
            "puts \"a $b(c[d]) \\t e\"\n",
            "set x ${weird name}; set y $::ns::v(1)",
            "a \\\n  b ;; c\n",
            "lappend l [list [a] [b \"c]\"]]",
            "puts {a}b \"c\"d",
            "$ x$ [] {}",
        ];
        for script in scripts {
            assert_eq!(round_trip(script), script, "script {:?}", script);
        }
    }

    #[test]
    fn test_reparse_is_identical() {
        let text = "if {$a} {puts [b $c]}\nset d \"e\"";
        assert_eq!(parse(text), parse(text));
    }

    #[test]
    fn test_braced_word_is_single_text() {
        let text = "{$x [y]}";
        let tokens = parse(text);

        assert_eq!(tokens[1].kind, TokenType::Word);
        assert_eq!(tokens[1].components, 1);
        assert_eq!(tokens[2].kind, TokenType::Text);
        assert_eq!(tokens[2].text(text), text);
    }

    #[test]
    fn test_quoted_variable_word() {
        let text = "\"$x\"";
        let tokens = parse(text);
        let word = &tokens[1];

        assert_eq!(word.kind, TokenType::Word);
        let variables: Vec<_> = tokens[2..2 + word.components]
            .iter()
            .filter(|t| t.kind == TokenType::VariableScalar)
            .collect();
        assert_eq!(variables.len(), 1);
        assert_eq!(variables[0].text(text), "$x");
    }

    #[test]
    fn test_nested_command_substitution() {
        let text = "[a [b]]";
        let tokens = parse(text);
        let outer = tokens
            .iter()
            .position(|t| t.kind == TokenType::CommandSubstitution)
            .unwrap();

        assert_eq!(tokens[outer].text(text), "[a [b]]");
        let inner: Vec<_> = tokens[outer + 1..=outer + tokens[outer].components]
            .iter()
            .filter(|t| t.kind == TokenType::CommandSubstitution)
            .collect();
        assert_eq!(inner.len(), 1);
        assert_eq!(inner[0].text(text), "[b]");
        assert_eq!(tokens[outer + 1].kind, TokenType::Separator);
        assert_eq!(tokens[outer + 2].kind, TokenType::SimpleScript);
        assert_eq!(tokens[outer + 2].text(text), "a [b]");
    }

    #[test]
    fn test_window_independence() {
        let alone = parse("puts hi");
        let buffer = "xx; puts hi ;yy";
        let mut state = ParseState::default();
        let windowed =
            parse_script(buffer, 4, 7, &ScriptOptions::default(), &mut state).unwrap();

        assert_eq!(alone.len(), windowed.len());
        for (a, w) in alone.iter().zip(windowed) {
            assert_eq!(a.kind, w.kind);
            assert_eq!(a.start + 4, w.start);
            assert_eq!(a.length, w.length);
            assert_eq!(a.components, w.components);
        }
    }

    #[test]
    fn test_unclosed_brace_offset() {
        let mut state = ParseState::default();
        let result = parse_script("{abc", 0, 4, &ScriptOptions::default(), &mut state);

        assert_matches!(
            result,
            Err(ParseError {
                kind: ParseErrorKind::MissingCloseBrace,
                offset: 4,
                line: 1,
            })
        );
        assert!(state.incomplete);
        assert!(state.has_error());
    }

    #[test]
    fn test_unclosed_bracket_reports_outer_window_end() {
        let text = "puts [a \"b\" [c]";
        let mut state = ParseState::default();

        assert_matches!(
            parse_script(text, 0, text.len(), &ScriptOptions::default(), &mut state),
            Err(ParseError {
                kind: ParseErrorKind::MissingCloseBracket,
                offset,
                ..
            }) if offset == text.len()
        );
    }

    #[test]
    fn test_lines_follow_current_line() {
        let text = "a\nb\n\nc";
        let options = ScriptOptions {
            current_line: 10,
            ..ScriptOptions::default()
        };
        let mut state = ParseState::default();
        let tokens = parse_script(text, 0, text.len(), &options, &mut state).unwrap();
        let lines: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == TokenType::Word)
            .map(|t| t.line)
            .collect();

        assert_eq!(lines, vec![10, 11, 13]);
        assert_eq!(state.current_line, 13);
    }

    #[test]
    fn test_syntax_mode_tolerates_trailing_open_construct() {
        let text = "set a 1\nputs {abc";
        let options = ScriptOptions {
            syntax: true,
            ..ScriptOptions::default()
        };
        let mut state = ParseState::default();
        let tokens = parse_script(text, 0, text.len(), &options, &mut state).unwrap();

        assert_eq!(tokens[0].text(text), "set a 1\n");
        assert!(tokens.iter().all(|t| t.end() <= 8));
        assert!(tokens
            .iter()
            .filter(|t| t.kind == TokenType::Word)
            .all(|t| t.syntax.is_some()));
        assert!(state.incomplete);
        assert!(!state.has_error());
        assert_eq!(state.command_count, 1);
    }

    #[test]
    fn test_syntax_mode_keeps_other_failures() {
        let text = "puts {a}b";
        let options = ScriptOptions {
            syntax: true,
            strict: true,
            ..ScriptOptions::default()
        };
        let mut state = ParseState::default();

        assert_matches!(
            parse_script(text, 0, text.len(), &options, &mut state),
            Err(ParseError {
                kind: ParseErrorKind::ExtraAfterCloseBrace,
                ..
            })
        );
    }

    #[test]
    fn test_nested_option_stops_at_bracket() {
        let text = "a b] c";
        let options = ScriptOptions {
            nested: true,
            ..ScriptOptions::default()
        };
        let mut state = ParseState::default();
        let tokens = parse_script(text, 0, text.len(), &options, &mut state).unwrap();

        assert_eq!(tokens[0].text(text), "a b");
    }

    #[test]
    fn test_successive_parses_append() {
        let mut state = ParseState::default();
        let first = parse_script("a", 0, 1, &ScriptOptions::default(), &mut state)
            .unwrap()
            .len();
        let second = parse_script("b c", 0, 3, &ScriptOptions::default(), &mut state)
            .unwrap()
            .to_vec();

        assert_eq!(second[0].kind, TokenType::SimpleScript);
        assert_eq!(state.token_count(), first + second.len());
    }

    #[test]
    fn test_is_complete() {
        let flags = (EngineFlags::default(), SubstitutionFlags::default());
        let check = |text: &str| is_complete(text, 0, text.len(), flags.0, flags.1);

        assert!(check("set a {b c}\n"));
        assert!(check("puts {a}b"));
        assert!(!check("proc f {} {\n"));
        assert!(!check("puts \"abc"));
        assert!(!check("set a [b"));
        assert!(!check("puts a\\"));
        assert!(check("# {\n"));
    }

    fn nesting_failure(text: &str) -> ParseError {
        let mut state = ParseState::default();
        let error = parse_script(text, 0, text.len(), &ScriptOptions::default(), &mut state)
            .unwrap_err();
        assert_eq!(state.error(), Some(&error));
        assert!(!state.incomplete);
        error
    }

    #[test]
    fn test_nested_brackets_fail_at_innermost_opener() {
        let levels = MAX_PARSE_DEPTH * 50;
        let text = format!("{}{}", "[".repeat(levels), "]".repeat(levels));
        let error = nesting_failure(&text);

        assert_matches!(error.kind, ParseErrorKind::NestingTooDeep { max } if max == MAX_PARSE_DEPTH);
        assert_eq!(error.offset, MAX_PARSE_DEPTH);
    }

    #[test]
    fn test_alternating_quotes_and_brackets_fail_at_innermost_opener() {
        let text = format!("puts {}", "\"[".repeat(MAX_PARSE_DEPTH * 50));
        let error = nesting_failure(&text);

        assert_matches!(error.kind, ParseErrorKind::NestingTooDeep { .. });
        assert_eq!(error.offset, 5 + MAX_PARSE_DEPTH);
        assert!(matches!(text.as_bytes()[error.offset], b'"' | b'['));
    }

    #[test]
    fn test_nested_array_indices_fail_at_innermost_paren() {
        let text = format!("set x {}", "$a(".repeat(MAX_PARSE_DEPTH * 50));
        let error = nesting_failure(&text);

        assert_matches!(error.kind, ParseErrorKind::NestingTooDeep { .. });
        assert_eq!(error.offset, 6 + 3 * MAX_PARSE_DEPTH + 2);
        assert_eq!(text.as_bytes()[error.offset], b'(');
    }

    #[test]
    fn test_depth_within_limit_parses() {
        let levels = MAX_PARSE_DEPTH - 1;
        let text = format!("{}{}", "[".repeat(levels), "]".repeat(levels));

        assert_eq!(round_trip(&text), text);
    }

    #[test]
    fn test_token_budget_stops_between_commands() {
        let text = "a b\nc d\ne f";
        let mut state = ParseState::default().with_token_budget(3);

        assert_matches!(
            parse_script(text, 0, text.len(), &ScriptOptions::default(), &mut state),
            Err(ParseError {
                kind: ParseErrorKind::NotReady { max: 3, .. },
                offset: 4,
                ..
            })
        );
        assert!(state.not_ready);
        assert_eq!(state.command_count, 1);
    }

    #[test]
    fn test_no_ready_bypasses_token_budget() {
        let text = "a b\nc d\ne f";
        let options = ScriptOptions {
            no_ready: true,
            ..ScriptOptions::default()
        };
        let mut state = ParseState::default().with_token_budget(3);
        parse_script(text, 0, text.len(), &options, &mut state).unwrap();

        assert!(!state.not_ready);
        assert_eq!(state.command_count, 3);
        assert!(state.token_count() > 3);
    }

    #[test]
    fn test_expression_checks_budget_on_entry() {
        let options = ScriptOptions {
            no_ready: true,
            ..ScriptOptions::default()
        };

        let mut state = ParseState::default().with_token_budget(3);
        parse_script("a b c", 0, 5, &options, &mut state).unwrap();
        assert_matches!(
            parse_expression("1 + 2", 0, 5, &mut state, false),
            Err(ParseError {
                kind: ParseErrorKind::NotReady { .. },
                offset: 0,
                ..
            })
        );
        assert!(state.not_ready);

        let mut state = ParseState::default().with_token_budget(3);
        parse_script("a b c", 0, 5, &options, &mut state).unwrap();
        assert!(parse_expression("1 + 2", 0, 5, &mut state, true).is_ok());
    }
}
