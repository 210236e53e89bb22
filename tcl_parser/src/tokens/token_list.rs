//! Append-only token sequence

use super::token::{Token, TokenType};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::ops::Deref;

/// Pre-order token sequence owned by a parse state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenList {
    tokens: Vec<Token>,
}

impl TokenList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tokens: Vec::with_capacity(capacity),
        }
    }

    /// Append a token and return its index
    pub fn push(&mut self, token: Token) -> usize {
        self.tokens.push(token);
        self.tokens.len() - 1
    }

    /// Close the composite at `index`: it ends at `end` and owns every
    /// token appended after it
    pub fn close(&mut self, index: usize, end: usize) {
        let descendants = self.tokens.len() - index - 1;
        let token = &mut self.tokens[index];
        token.length = end.saturating_sub(token.start);
        token.components = descendants;
    }

    /// Drop tokens from `len` onwards
    pub fn truncate(&mut self, len: usize) {
        self.tokens.truncate(len);
    }

    /// Remove all tokens, keeping the allocation
    pub fn clear(&mut self) {
        self.tokens.clear();
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Token> {
        self.tokens.get_mut(index)
    }

    pub fn capacity(&self) -> usize {
        self.tokens.capacity()
    }

    pub fn as_slice(&self) -> &[Token] {
        &self.tokens
    }

    pub fn into_vec(self) -> Vec<Token> {
        self.tokens
    }

    /// Indices of the direct children of the token at `index`
    pub fn children(&self, index: usize) -> Children<'_> {
        Children::new(&self.tokens, index)
    }

    /// Deterministic multi-line listing, one token per line
    pub fn dump(&self, buffer: &str) -> String {
        dump_tokens(buffer, &self.tokens)
    }
}

impl Deref for TokenList {
    type Target = [Token];

    fn deref(&self) -> &[Token] {
        &self.tokens
    }
}

impl From<Vec<Token>> for TokenList {
    fn from(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }
}

impl Extend<Token> for TokenList {
    fn extend<I: IntoIterator<Item = Token>>(&mut self, iter: I) {
        self.tokens.extend(iter);
    }
}

impl<'a> IntoIterator for &'a TokenList {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

/// Iterator over direct children, skipping each child's own subtree
pub struct Children<'a> {
    tokens: &'a [Token],
    next: usize,
    end: usize,
}

impl<'a> Children<'a> {
    /// Children of `tokens[parent]`; an out-of-range parent has none
    pub fn new(tokens: &'a [Token], parent: usize) -> Self {
        let (next, end) = match tokens.get(parent) {
            Some(token) => (parent + 1, (parent + 1 + token.components).min(tokens.len())),
            None => (0, 0),
        };
        Self { tokens, next, end }
    }
}

impl<'a> Iterator for Children<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.next >= self.end {
            return None;
        }
        let index = self.next;
        self.next += self.tokens[index].components + 1;
        Some(index)
    }
}

/// Render tokens as `Type X Start N Length N Components N Line N Text "..."`
///
/// Control characters and quotes in the text are escaped so each token
/// stays on one line.
pub fn dump_tokens(buffer: &str, tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        let text = buffer.get(token.start..token.end()).unwrap_or("");
        let _ = write!(
            out,
            "Type {} Start {} Length {} Components {} Line {} Text \"{}\"",
            token.kind,
            token.start,
            token.length,
            token.components,
            token.line,
            text.escape_default()
        );
        if let Some(class) = token.syntax {
            let _ = write!(out, " Syntax {}", class);
        }
        out.push('\n');
    }
    out
}

/// Count tokens of `kind` in a slice
pub fn count_kind(tokens: &[Token], kind: TokenType) -> usize {
    tokens.iter().filter(|t| t.kind == kind).count()
}
