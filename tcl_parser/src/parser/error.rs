//! Parse failures with error code mapping
//!
//! A failure is a `(kind, offset, line)` triple. The message text of each
//! kind is stable; callers that need to react programmatically match on
//! [`ParseErrorKind`] or use [`ParseError::error_code`].

use crate::logging::{codes, Code};
use serde::Serialize;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("missing close-brace")]
    MissingCloseBrace,

    #[error("missing close-brace: possible unbalanced brace in comment")]
    MissingCloseBraceComment,

    #[error("missing \"")]
    MissingCloseQuote,

    #[error("missing close-bracket")]
    MissingCloseBracket,

    #[error("missing )")]
    MissingCloseIndex,

    #[error("missing close-brace for variable name")]
    MissingVariableBrace,

    #[error("extra characters after close-brace")]
    ExtraAfterCloseBrace,

    #[error("extra characters after close-quote")]
    ExtraAfterCloseQuote,

    #[error("dangling backslash")]
    DanglingBackslash,

    #[error("empty variable name")]
    EmptyVariableName,

    #[error("empty array index")]
    EmptyArrayIndex,

    #[error("variable name too long ({length} > {max})")]
    VariableNameTooLong { length: usize, max: usize },

    #[error("no command found")]
    EmptyCommand,

    #[error("empty expression")]
    EmptyExpression,

    #[error("missing operand")]
    MissingOperand,

    #[error("missing close-parenthesis")]
    MissingCloseParen,

    #[error("missing colon from ternary conditional")]
    MissingColon,

    #[error("extra tokens at end of expression")]
    ExtraTokens,

    #[error("invalid bareword \"{word}\"")]
    InvalidBareword { word: String },

    #[error("malformed number \"{literal}\"")]
    MalformedNumber { literal: String },

    #[error("unexpected character '{ch}'")]
    UnexpectedCharacter { ch: char },

    #[error("expected '{expected}'")]
    Expected { expected: char },

    #[error("too many arguments to math function (max {max})")]
    TooManyArguments { max: usize },

    #[error("too many nested levels (max {max})")]
    NestingTooDeep { max: usize },

    #[error("parser not ready ({tokens} tokens, max {max})")]
    NotReady { tokens: usize, max: usize },
}

impl ParseErrorKind {
    pub fn error_code(&self) -> Code {
        match self {
            Self::MissingCloseBrace | Self::MissingCloseBraceComment => {
                codes::delimiter::MISSING_CLOSE_BRACE
            }
            Self::MissingCloseQuote => codes::delimiter::MISSING_CLOSE_QUOTE,
            Self::MissingCloseBracket => codes::delimiter::MISSING_CLOSE_BRACKET,
            Self::MissingCloseIndex => codes::delimiter::MISSING_CLOSE_INDEX,
            Self::MissingVariableBrace => codes::delimiter::MISSING_VARIABLE_BRACE,
            Self::ExtraAfterCloseBrace => codes::delimiter::EXTRA_AFTER_CLOSE_BRACE,
            Self::ExtraAfterCloseQuote => codes::delimiter::EXTRA_AFTER_CLOSE_QUOTE,
            Self::DanglingBackslash => codes::substitution::DANGLING_BACKSLASH,
            Self::EmptyVariableName => codes::substitution::EMPTY_VARIABLE_NAME,
            Self::EmptyArrayIndex => codes::substitution::EMPTY_ARRAY_INDEX,
            Self::VariableNameTooLong { .. } => codes::substitution::VARIABLE_NAME_TOO_LONG,
            Self::EmptyCommand => codes::substitution::EMPTY_COMMAND,
            Self::EmptyExpression => codes::expression::EMPTY_EXPRESSION,
            Self::MissingOperand => codes::expression::MISSING_OPERAND,
            Self::MissingCloseParen => codes::expression::MISSING_CLOSE_PAREN,
            Self::MissingColon => codes::expression::MISSING_COLON,
            Self::ExtraTokens => codes::expression::EXTRA_TOKENS,
            Self::InvalidBareword { .. } => codes::expression::INVALID_BAREWORD,
            Self::MalformedNumber { .. } => codes::expression::MALFORMED_NUMBER,
            Self::UnexpectedCharacter { .. } | Self::Expected { .. } => {
                codes::expression::UNEXPECTED_CHARACTER
            }
            Self::TooManyArguments { .. } => codes::expression::TOO_MANY_ARGUMENTS,
            Self::NestingTooDeep { .. } => codes::resource::NESTING_TOO_DEEP,
            Self::NotReady { .. } => codes::resource::NOT_READY,
        }
    }

    /// Failures caused by input ending inside an open construct
    pub fn is_incomplete(&self) -> bool {
        matches!(
            self,
            Self::MissingCloseBrace
                | Self::MissingCloseBraceComment
                | Self::MissingCloseQuote
                | Self::MissingCloseBracket
                | Self::MissingCloseIndex
                | Self::MissingVariableBrace
                | Self::DanglingBackslash
        )
    }
}

/// A parse failure at an absolute buffer offset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// Absolute byte offset where the failure was detected
    pub offset: usize,
    /// Source line of `offset`
    pub line: u32,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, offset: usize, line: u32) -> Self {
        Self { kind, offset, line }
    }

    pub fn error_code(&self) -> Code {
        self.kind.error_code()
    }

    pub fn is_incomplete(&self) -> bool {
        self.kind.is_incomplete()
    }

    pub fn severity(&self) -> &'static str {
        codes::get_severity(self.error_code().as_str()).as_str()
    }

    pub fn category(&self) -> &'static str {
        codes::get_category(self.error_code().as_str())
    }

    pub fn is_recoverable(&self) -> bool {
        codes::is_recoverable(self.error_code().as_str())
    }

    pub fn description(&self) -> &'static str {
        codes::get_description(self.error_code().as_str())
    }

    pub fn requires_halt(&self) -> bool {
        codes::requires_halt(self.error_code().as_str())
    }

    pub fn recommended_action(&self) -> &'static str {
        codes::get_action(self.error_code().as_str())
    }

    /// Message followed by the recommended action
    pub fn enhanced_message(&self) -> String {
        format!("{} ({})", self, self.recommended_action())
    }
}
