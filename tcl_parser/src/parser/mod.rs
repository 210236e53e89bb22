//! Script, command, word and expression parsers
//!
//! Every entry point takes a buffer plus an absolute `(start, length)`
//! window and appends tokens to a [`ParseState`](crate::state::ParseState).
//! Offsets in tokens and errors always index the whole buffer, never the
//! window.

pub mod backslash;
pub mod chars;
pub mod command;
pub mod cursor;
pub mod error;
pub mod expression;
pub mod script;
pub mod word;

pub use backslash::{parse_backslash, Escape, EscapeTable, TclEscapes};
pub use command::parse_command;
pub use cursor::Cursor;
pub use error::{ParseError, ParseErrorKind, ParseResult};
pub use expression::parse_expression;
pub use script::{is_complete, parse_script, ScriptOptions};
pub use word::{parse_braces, parse_quoted_string, parse_variable_name};

/// Failures are logged once, by the public operation that returns them
pub(crate) fn log_failure(error: &ParseError, file_name: Option<&str>) {
    log_error!(
        error.error_code(),
        &error.to_string(),
        at = (error.offset, error.line),
        "file" => file_name.unwrap_or("<input>"),
        "severity" => error.severity()
    );
}
