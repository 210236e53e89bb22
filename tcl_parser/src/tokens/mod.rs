//! Flat token model shared by every parse
//!
//! A parse produces one ordered sequence of [`Token`] records. Each record is
//! a typed `(start, length)` span into the caller's buffer plus a
//! `components` count: the number of immediately following records that are
//! its descendants. The sequence is therefore a pre-order flattening of a
//! tree with no child pointers, and a subtree is skipped by jumping
//! `components + 1` entries.
//!
//! ## Key Components
//!
//! - **[`TokenType`]** - closed set of script and expression token kinds
//! - **[`Token`]** - the span record
//! - **[`SyntaxClass`]** - optional highlighting classification
//! - **[`TokenList`]** - append-only sequence with tree navigation and a
//!   deterministic textual dump
//!
//! ## Layout
//!
//! | Source            | Tokens                                                        |
//! |-------------------|---------------------------------------------------------------|
//! | `{a $b}`          | `Word` > `Text` (braces included)                             |
//! | `"a $b"`          | `Word` > `Separator`, `Text`, `VariableScalar` > `Text`, `Separator` |
//! | `[cmd]`           | `CommandSubstitution` > `Separator`, `SimpleScript` > ..., `Separator` |
//! | `$a(i)`           | `VariableScalar` > `Text`, `VariableArrayIndex` > `Separator`, `Text`, `Separator` |
//!
//! Tokens never own text; use [`Token::text`] with the parsed buffer.

pub mod token;
pub mod token_list;

pub use token::{SyntaxClass, SyntaxKind, Token, TokenType, WordRole};
pub use token_list::{dump_tokens, Children, TokenList};
