//! Token record and token kinds

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of token produced by the script and expression parsers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenType {
    /// Literal run of characters, or a braced word including its braces
    Text,
    /// Backslash escape, spanning the whole sequence consumed
    BackslashSequence,
    /// `$name`, `$name(index)` or `${name}`
    VariableScalar,
    /// Variable reference parsed without a leading `$`
    VariableNameOnly,
    /// `(index)` of an array variable
    VariableArrayIndex,
    /// `[script]`
    CommandSubstitution,
    /// One argument of a command
    Word,
    /// Whitespace, terminators, and delimiters of composite tokens
    Separator,
    /// Wrapper spanning a whole parsed script
    SimpleScript,

    // Expression vocabulary
    Operator,
    Operand,
    FunctionCall,
    Parenthesis,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Text => "Text",
            TokenType::BackslashSequence => "BackslashSequence",
            TokenType::VariableScalar => "VariableScalar",
            TokenType::VariableNameOnly => "VariableNameOnly",
            TokenType::VariableArrayIndex => "VariableArrayIndex",
            TokenType::CommandSubstitution => "CommandSubstitution",
            TokenType::Word => "Word",
            TokenType::Separator => "Separator",
            TokenType::SimpleScript => "SimpleScript",
            TokenType::Operator => "Operator",
            TokenType::Operand => "Operand",
            TokenType::FunctionCall => "FunctionCall",
            TokenType::Parenthesis => "Parenthesis",
        }
    }

    /// Variable tokens whose own span already covers their descendants
    pub fn is_variable(&self) -> bool {
        matches!(self, TokenType::VariableScalar | TokenType::VariableNameOnly)
    }

    /// Kinds that perform a substitution at evaluation time
    pub fn is_substitution(&self) -> bool {
        matches!(
            self,
            TokenType::BackslashSequence
                | TokenType::VariableScalar
                | TokenType::VariableNameOnly
                | TokenType::CommandSubstitution
        )
    }

    pub fn is_expression_kind(&self) -> bool {
        matches!(
            self,
            TokenType::Operator | TokenType::Operand | TokenType::FunctionCall | TokenType::Parenthesis
        )
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of a word within its command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WordRole {
    CommandName,
    Argument,
}

/// Highlighting category of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyntaxKind {
    Plain,
    StringLiteral,
    Block,
    Variable,
    Command,
    Backslash,
}

/// Classification attached to tokens when parsing in syntax mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyntaxClass {
    pub role: Option<WordRole>,
    pub kind: SyntaxKind,
}

impl SyntaxClass {
    /// Classification of a word from its position and first byte
    pub fn for_word(word_index: usize, first: Option<u8>) -> Self {
        let role = if word_index == 0 {
            WordRole::CommandName
        } else {
            WordRole::Argument
        };
        let kind = match first {
            Some(b'"') => SyntaxKind::StringLiteral,
            Some(b'{') => SyntaxKind::Block,
            Some(b'$') => SyntaxKind::Variable,
            Some(b'[') => SyntaxKind::Command,
            _ => SyntaxKind::Plain,
        };
        Self {
            role: Some(role),
            kind,
        }
    }

    /// Classification of a non-word token, if its kind has one
    pub fn for_kind(kind: TokenType) -> Option<Self> {
        let kind = match kind {
            TokenType::BackslashSequence => SyntaxKind::Backslash,
            TokenType::CommandSubstitution => SyntaxKind::Command,
            TokenType::VariableScalar | TokenType::VariableNameOnly => SyntaxKind::Variable,
            _ => return None,
        };
        Some(Self { role: None, kind })
    }
}

impl fmt::Display for SyntaxClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.role {
            Some(role) => write!(f, "{:?}/{:?}", role, self.kind),
            None => write!(f, "{:?}", self.kind),
        }
    }
}

/// A typed span of the parsed buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenType,
    /// Absolute byte offset into the parsed buffer
    pub start: usize,
    /// Bytes covered, delimiters included
    pub length: usize,
    /// Number of following tokens that are descendants of this one
    pub components: usize,
    /// Source line of `start`
    pub line: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub syntax: Option<SyntaxClass>,
}

impl Token {
    pub fn new(kind: TokenType, start: usize, length: usize, line: u32) -> Self {
        Self {
            kind,
            start,
            length,
            components: 0,
            line,
            syntax: None,
        }
    }

    /// Offset one past the last byte covered
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    pub fn is_leaf(&self) -> bool {
        self.components == 0
    }

    pub fn contains(&self, other: &Token) -> bool {
        other.start >= self.start && other.end() <= self.end()
    }

    /// Source text of this token
    ///
    /// Panics if `buffer` is not the buffer the token was parsed from.
    pub fn text<'a>(&self, buffer: &'a str) -> &'a str {
        &buffer[self.start..self.end()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_text_and_bounds() {
        let buffer = "set a {b c}";
        let token = Token::new(TokenType::Text, 6, 5, 1);

        assert_eq!(token.text(buffer), "{b c}");
        assert_eq!(token.end(), 11);
        assert!(token.is_leaf());
        assert!(token.contains(&Token::new(TokenType::Text, 7, 1, 1)));
        assert!(!token.contains(&Token::new(TokenType::Text, 4, 3, 1)));
    }

    #[test]
    fn test_kind_predicates() {
        assert!(TokenType::VariableNameOnly.is_variable());
        assert!(!TokenType::VariableArrayIndex.is_variable());
        assert!(TokenType::CommandSubstitution.is_substitution());
        assert!(!TokenType::Text.is_substitution());
        assert!(TokenType::FunctionCall.is_expression_kind());
        assert_eq!(TokenType::SimpleScript.to_string(), "SimpleScript");
    }

    #[test]
    fn test_word_classification() {
        let name = SyntaxClass::for_word(0, Some(b'p'));
        assert_eq!(name.role, Some(WordRole::CommandName));
        assert_eq!(name.kind, SyntaxKind::Plain);

        let block = SyntaxClass::for_word(2, Some(b'{'));
        assert_eq!(block.role, Some(WordRole::Argument));
        assert_eq!(block.kind, SyntaxKind::Block);
        assert_eq!(block.to_string(), "Argument/Block");

        assert_eq!(SyntaxClass::for_kind(TokenType::Separator), None);
        assert_eq!(
            SyntaxClass::for_kind(TokenType::BackslashSequence).map(|c| c.kind),
            Some(SyntaxKind::Backslash)
        );
    }
}
