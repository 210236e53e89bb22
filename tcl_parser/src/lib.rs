//! Flat-token parser for Tcl-family scripts, commands and expressions
//!
//! Parsing appends [`Token`]s to a caller-owned [`ParseState`]. The token
//! list is a pre-order flattening of the parse tree: each token carries the
//! number of tokens in its subtree, and every offset indexes the original
//! buffer. [`filter_for_round_trip`] selects the tokens whose spans rebuild
//! the source exactly.

#[macro_use]
pub mod logging;

pub mod config;
pub mod file_processor;
pub mod parser;
pub mod roundtrip;
pub mod state;
pub mod tokens;
pub mod utils;

pub use parser::{
    is_complete, parse_backslash, parse_braces, parse_command, parse_expression,
    parse_quoted_string, parse_script, parse_variable_name, ParseError, ParseErrorKind,
    ParseResult, ScriptOptions,
};
pub use roundtrip::{filter_for_round_trip, render};
pub use state::{EngineFlags, ParseState, SubstitutionFlags};
pub use tokens::{Token, TokenList, TokenType};
