//! Round-trip token selection
//!
//! [`filter_for_round_trip`] picks the tokens whose spans, concatenated in
//! order, reproduce the parsed source exactly. Variable references are kept
//! whole; every other composite is replaced by its children.

use crate::logging::codes;
use crate::tokens::{Token, TokenList, TokenType};

/// Select the minimal token subsequence that covers the source once
///
/// Single left-to-right pass:
/// - variable references are emitted and their subtrees skipped
/// - other composites (components > 0, not separators) are dropped and
///   their children visited
/// - leaves and separators are emitted
pub fn filter_for_round_trip(tokens: &[Token]) -> TokenList {
    let mut selected = TokenList::with_capacity(tokens.len());
    let mut index = 0;

    while let Some(token) = tokens.get(index) {
        match token.kind {
            TokenType::VariableScalar | TokenType::VariableNameOnly => {
                selected.push(*token);
                index += token.components + 1;
            }
            TokenType::Separator => {
                selected.push(*token);
                index += 1;
            }
            _ if token.components > 0 => index += 1,
            _ => {
                selected.push(*token);
                index += 1;
            }
        }
    }

    log_success!(
        codes::success::ROUND_TRIP_FILTERED,
        "Round-trip tokens selected",
        "input" => tokens.len(),
        "selected" => selected.len()
    );
    selected
}

/// Concatenate the source text of `tokens`
pub fn render(buffer: &str, tokens: &[Token]) -> String {
    tokens.iter().map(|token| token.text(buffer)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_script, ScriptOptions};
    use crate::state::ParseState;

    fn filtered(text: &str) -> TokenList {
        let mut state = ParseState::default();
        let tokens = parse_script(text, 0, text.len(), &ScriptOptions::default(), &mut state)
            .unwrap()
            .to_vec();
        filter_for_round_trip(&tokens)
    }

    #[test]
    fn test_variables_are_kept_whole() {
        let text = "puts $a(x$y)";
        let tokens = filtered(text);

        let variables: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind.is_variable())
            .map(|t| t.text(text))
            .collect();
        assert_eq!(variables, vec!["$a(x$y)"]);
        assert_eq!(render(text, &tokens), text);
    }

    #[test]
    fn test_composites_are_dropped() {
        let text = "a [b \"c\"] {d}\n";
        let tokens = filtered(text);

        assert!(tokens.iter().all(|t| t.kind == TokenType::Separator
            || t.kind.is_variable()
            || t.components == 0));
        assert!(!tokens.iter().any(|t| t.kind == TokenType::Word));
        assert_eq!(render(text, &tokens), text);
    }

    #[test]
    fn test_spans_are_contiguous() {
        let text = "\n  # lead\nset x \\\n  ${y}; set z [list \"$x\\n\" {q}]\n";
        let tokens = filtered(text);

        let mut end = 0;
        for token in tokens.iter().filter(|t| t.length > 0) {
            assert_eq!(token.start, end, "gap before {:?}", token);
            end = token.end();
        }
        assert_eq!(end, text.len());
    }

    #[test]
    fn test_hand_built_sequence() {
        let buffer = "$v x";
        let tokens = vec![
            Token {
                components: 2,
                ..Token::new(TokenType::Word, 0, 2, 1)
            },
            Token {
                components: 1,
                ..Token::new(TokenType::VariableScalar, 0, 2, 1)
            },
            Token::new(TokenType::Text, 1, 1, 1),
            Token::new(TokenType::Separator, 2, 1, 1),
            Token {
                components: 1,
                ..Token::new(TokenType::Word, 3, 1, 1)
            },
            Token::new(TokenType::Text, 3, 1, 1),
        ];

        let selected = filter_for_round_trip(&tokens);
        let kinds: Vec<_> = selected.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![TokenType::VariableScalar, TokenType::Separator, TokenType::Text]
        );
        assert_eq!(render(buffer, &selected), buffer);
    }
}
