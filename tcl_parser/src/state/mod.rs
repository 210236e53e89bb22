//! Reusable parse state
//!
//! A [`ParseState`] carries the caller's configuration, the growing token
//! sequence, the first failure, and per-command diagnostics. Nested parses
//! (command substitution, array indices, quoted words) write into the same
//! state, so one state must not be shared between concurrent parses.

pub mod flags;

pub use flags::{EngineFlags, SubstitutionFlags};

use crate::config::compile_time::{expression, parser};
use crate::parser::backslash::{EscapeTable, TclEscapes};
use crate::parser::error::{ParseError, ParseErrorKind, ParseResult};
use crate::tokens::{dump_tokens, SyntaxClass, Token, TokenList, TokenType};
use serde::Serialize;
use std::fmt::Write;
use std::sync::Arc;

/// Incremental offset-to-line mapping for a single parse
///
/// Tokens are mostly pushed in increasing offset order, so lines are counted
/// forward from the last lookup. A backwards lookup recounts from the base.
#[derive(Debug, Clone, Copy, Default)]
struct LineTracker {
    base_offset: usize,
    base_line: u32,
    offset: usize,
    line: u32,
}

impl LineTracker {
    fn new(base_offset: usize, base_line: u32) -> Self {
        Self {
            base_offset,
            base_line,
            offset: base_offset,
            line: base_line,
        }
    }

    fn line_at(&mut self, buffer: &str, offset: usize) -> u32 {
        let offset = offset.min(buffer.len());
        if offset < self.offset {
            if offset < self.base_offset {
                return self.base_line;
            }
            self.offset = self.base_offset;
            self.line = self.base_line;
        }
        let newlines = buffer.as_bytes()[self.offset..offset]
            .iter()
            .filter(|&&b| b == b'\n')
            .count();
        self.line += newlines as u32;
        self.offset = offset;
        self.line
    }
}

#[derive(Debug, Clone)]
pub struct ParseState {
    pub engine_flags: EngineFlags,
    pub substitution_flags: SubstitutionFlags,
    escapes: Arc<dyn EscapeTable>,

    /// Name used in diagnostics only
    pub file_name: Option<String>,
    /// Line number of the first byte of the parsed window
    pub first_line: u32,
    /// Line of the command most recently parsed
    pub current_line: u32,

    // Per-command diagnostics
    pub comment_start: Option<usize>,
    pub comment_length: usize,
    pub command_start: Option<usize>,
    pub command_length: usize,
    pub command_words: usize,
    pub command_count: usize,
    pub terminator: Option<usize>,

    /// Input ended inside an open construct
    pub incomplete: bool,
    /// Token budget was exhausted
    pub not_ready: bool,

    tokens: TokenList,
    error: Option<ParseError>,
    depth: usize,
    expression_depth: usize,
    token_budget: usize,
    lines: LineTracker,
    pub(crate) strict: bool,
    pub(crate) syntax: bool,
}

impl ParseState {
    pub fn new(engine_flags: EngineFlags, substitution_flags: SubstitutionFlags) -> Self {
        Self {
            engine_flags,
            substitution_flags,
            escapes: Arc::new(TclEscapes),
            file_name: None,
            first_line: 1,
            current_line: 1,
            comment_start: None,
            comment_length: 0,
            command_start: None,
            command_length: 0,
            command_words: 0,
            command_count: 0,
            terminator: None,
            incomplete: false,
            not_ready: false,
            tokens: TokenList::with_capacity(parser::INITIAL_TOKEN_CAPACITY),
            error: None,
            depth: 0,
            expression_depth: 0,
            token_budget: parser::MAX_TOKEN_COUNT,
            lines: LineTracker::new(0, 1),
            strict: false,
            syntax: false,
        }
    }

    /// Replace the backslash escape table
    pub fn with_escape_table(mut self, escapes: Arc<dyn EscapeTable>) -> Self {
        self.escapes = escapes;
        self
    }

    /// Lower the token count past which parses without `no_ready` fail
    pub fn with_token_budget(mut self, max_tokens: usize) -> Self {
        self.token_budget = max_tokens.min(parser::MAX_TOKEN_COUNT);
        self
    }

    pub fn escapes(&self) -> &dyn EscapeTable {
        self.escapes.as_ref()
    }

    /// Modes for command parses; script parses take them from their options
    pub fn set_modes(&mut self, strict: bool, syntax: bool) {
        self.strict = strict;
        self.syntax = syntax;
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn is_syntax(&self) -> bool {
        self.syntax
    }

    /// Clear tokens, failure and per-parse fields; flags and token capacity
    /// are kept
    pub fn reset(&mut self) {
        self.tokens.clear();
        self.error = None;
        self.file_name = None;
        self.first_line = 1;
        self.current_line = 1;
        self.command_count = 0;
        self.incomplete = false;
        self.not_ready = false;
        self.strict = false;
        self.syntax = false;
        self.clear_command();
        self.depth = 0;
        self.expression_depth = 0;
        self.lines = LineTracker::new(0, 1);
    }

    /// Prepare for a parse of the window starting at `start` on `line`
    pub(crate) fn begin(&mut self, start: usize, line: u32) {
        let line = line.max(1);
        self.first_line = line;
        self.current_line = line;
        self.incomplete = false;
        self.depth = 0;
        self.expression_depth = 0;
        self.clear_command();
        self.lines = LineTracker::new(start, line);
    }

    pub(crate) fn clear_command(&mut self) {
        self.comment_start = None;
        self.comment_length = 0;
        self.command_start = None;
        self.command_length = 0;
        self.command_words = 0;
        self.terminator = None;
    }

    // ------------------------------------------------------------------
    // Tokens
    // ------------------------------------------------------------------

    pub fn tokens(&self) -> &TokenList {
        &self.tokens
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Take the accumulated tokens, leaving an empty list behind
    pub fn take_tokens(&mut self) -> TokenList {
        std::mem::take(&mut self.tokens)
    }

    pub(crate) fn line_at(&mut self, buffer: &str, offset: usize) -> u32 {
        self.lines.line_at(buffer, offset)
    }

    /// Append a token; in syntax mode substitution tokens are classified
    pub(crate) fn push_token(
        &mut self,
        buffer: &str,
        kind: TokenType,
        start: usize,
        length: usize,
    ) -> usize {
        let line = self.line_at(buffer, start);
        let mut token = Token::new(kind, start, length, line);
        if self.syntax {
            token.syntax = SyntaxClass::for_kind(kind);
        }
        self.tokens.push(token)
    }

    pub(crate) fn close_token(&mut self, index: usize, end: usize) {
        self.tokens.close(index, end);
    }

    pub(crate) fn set_syntax(&mut self, index: usize, class: SyntaxClass) {
        if let Some(token) = self.tokens.get_mut(index) {
            token.syntax = Some(class);
        }
    }

    pub(crate) fn truncate_tokens(&mut self, len: usize) {
        self.tokens.truncate(len);
    }

    // ------------------------------------------------------------------
    // Failure
    // ------------------------------------------------------------------

    pub fn error(&self) -> Option<&ParseError> {
        self.error.as_ref()
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn take_error(&mut self) -> Option<ParseError> {
        self.error.take()
    }

    /// Record a failure; only the first one is kept
    pub(crate) fn fail(&mut self, kind: ParseErrorKind, offset: usize, buffer: &str) -> ParseError {
        let line = self.line_at(buffer, offset);
        let error = ParseError::new(kind, offset, line);
        if error.is_incomplete() {
            self.incomplete = true;
        }
        if self.error.is_none() {
            self.error = Some(error.clone());
        }
        error
    }

    /// Refuse to start when a previous failure has not been cleared
    pub(crate) fn ensure_clean(&self) -> ParseResult<()> {
        match &self.error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    // ------------------------------------------------------------------
    // Limits
    // ------------------------------------------------------------------

    pub(crate) fn enter(&mut self, buffer: &str, offset: usize) -> ParseResult<()> {
        if self.depth >= parser::MAX_PARSE_DEPTH {
            return Err(self.fail(
                ParseErrorKind::NestingTooDeep {
                    max: parser::MAX_PARSE_DEPTH,
                },
                offset,
                buffer,
            ));
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Drop nesting left open by an abandoned construct
    pub(crate) fn reset_depth(&mut self) {
        self.depth = 0;
        self.expression_depth = 0;
    }

    pub(crate) fn enter_expression(&mut self, buffer: &str, offset: usize) -> ParseResult<()> {
        if self.expression_depth >= expression::MAX_EXPRESSION_DEPTH {
            return Err(self.fail(
                ParseErrorKind::NestingTooDeep {
                    max: expression::MAX_EXPRESSION_DEPTH,
                },
                offset,
                buffer,
            ));
        }
        self.expression_depth += 1;
        Ok(())
    }

    pub(crate) fn leave_expression(&mut self) {
        self.expression_depth = self.expression_depth.saturating_sub(1);
    }

    /// Token budget check, skipped with `no_ready`
    pub(crate) fn check_ready(&mut self, buffer: &str, offset: usize, no_ready: bool) -> ParseResult<()> {
        if no_ready || self.tokens.len() <= self.token_budget {
            return Ok(());
        }
        self.not_ready = true;
        Err(self.fail(
            ParseErrorKind::NotReady {
                tokens: self.tokens.len(),
                max: self.token_budget,
            },
            offset,
            buffer,
        ))
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    /// Deterministic listing of the state fields followed by every token
    pub fn dump(&self, buffer: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "FileName {}",
            self.file_name.as_deref().unwrap_or("<none>")
        );
        let _ = writeln!(out, "CurrentLine {}", self.current_line);
        let _ = writeln!(out, "EngineFlags {:?}", self.engine_flags);
        let _ = writeln!(out, "SubstitutionFlags {:?}", self.substitution_flags);
        let _ = writeln!(out, "CommentStart {}", fmt_offset(self.comment_start));
        let _ = writeln!(out, "CommentLength {}", self.comment_length);
        let _ = writeln!(out, "CommandStart {}", fmt_offset(self.command_start));
        let _ = writeln!(out, "CommandLength {}", self.command_length);
        let _ = writeln!(out, "CommandWords {}", self.command_words);
        let _ = writeln!(out, "Commands {}", self.command_count);
        let _ = writeln!(out, "Terminator {}", fmt_offset(self.terminator));
        let _ = writeln!(out, "Incomplete {}", self.incomplete);
        let _ = writeln!(out, "NotReady {}", self.not_ready);
        match &self.error {
            Some(error) => {
                let _ = writeln!(
                    out,
                    "Error \"{}\" Offset {} Line {}",
                    error, error.offset, error.line
                );
            }
            None => out.push_str("Error <none>\n"),
        }
        let _ = writeln!(out, "Tokens {}", self.tokens.len());
        out.push_str(&dump_tokens(buffer, &self.tokens));
        out
    }

    /// Serializable view of the state with token texts resolved
    pub fn snapshot<'a>(&'a self, buffer: &'a str) -> StateSnapshot<'a> {
        StateSnapshot {
            file_name: self.file_name.as_deref(),
            current_line: self.current_line,
            engine_flags: self.engine_flags,
            substitution_flags: self.substitution_flags,
            comment_start: self.comment_start,
            comment_length: self.comment_length,
            command_start: self.command_start,
            command_length: self.command_length,
            command_words: self.command_words,
            command_count: self.command_count,
            terminator: self.terminator,
            incomplete: self.incomplete,
            not_ready: self.not_ready,
            error: self.error.as_ref(),
            tokens: self
                .tokens
                .iter()
                .map(|token| TokenView {
                    token: *token,
                    text: buffer.get(token.start..token.end()).unwrap_or(""),
                })
                .collect(),
        }
    }
}

impl Default for ParseState {
    fn default() -> Self {
        Self::new(EngineFlags::default(), SubstitutionFlags::default())
    }
}

fn fmt_offset(offset: Option<usize>) -> String {
    offset.map_or_else(|| "-".to_string(), |o| o.to_string())
}

/// A token together with the text it spans
#[derive(Debug, Serialize)]
pub struct TokenView<'a> {
    #[serde(flatten)]
    pub token: Token,
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
pub struct StateSnapshot<'a> {
    pub file_name: Option<&'a str>,
    pub current_line: u32,
    pub engine_flags: EngineFlags,
    pub substitution_flags: SubstitutionFlags,
    pub comment_start: Option<usize>,
    pub comment_length: usize,
    pub command_start: Option<usize>,
    pub command_length: usize,
    pub command_words: usize,
    pub command_count: usize,
    pub terminator: Option<usize>,
    pub incomplete: bool,
    pub not_ready: bool,
    pub error: Option<&'a ParseError>,
    pub tokens: Vec<TokenView<'a>>,
}
