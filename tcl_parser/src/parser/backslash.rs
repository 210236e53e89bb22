//! Backslash escape decoding
//!
//! The parser only needs to know how many bytes an escape consumes; the
//! substituted character is reported for callers that evaluate tokens.
//! Tables are pluggable through [`EscapeTable`]; [`TclEscapes`] is the
//! standard one.

use super::chars::{hex_value, is_octal_digit};
use std::fmt;

/// A decoded escape sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Escape {
    /// Bytes consumed, the backslash included
    pub read: usize,
    pub value: char,
}

pub trait EscapeTable: fmt::Debug + Send + Sync {
    /// Decode the escape at the start of `text`, which begins with `\`.
    /// Returns `None` when nothing follows the backslash.
    fn decode(&self, text: &str) -> Option<Escape>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TclEscapes;

impl TclEscapes {
    fn hex(digits: &[u8], max_digits: usize, limit: u32) -> (usize, u32) {
        let mut value = 0u32;
        let mut count = 0;
        for &byte in digits.iter().take(max_digits) {
            let Some(digit) = hex_value(byte) else { break };
            let next = value * 16 + digit;
            if next > limit {
                break;
            }
            value = next;
            count += 1;
        }
        (count, value)
    }
}

impl EscapeTable for TclEscapes {
    fn decode(&self, text: &str) -> Option<Escape> {
        let rest = text.strip_prefix('\\')?;
        let ch = rest.chars().next()?;
        let bytes = rest.as_bytes();

        let simple = |value: char| Some(Escape { read: 2, value });

        match ch {
            'a' => simple('\x07'),
            'b' => simple('\x08'),
            'f' => simple('\x0c'),
            'n' => simple('\n'),
            'r' => simple('\r'),
            't' => simple('\t'),
            'v' => simple('\x0b'),
            '\n' => {
                let blanks = bytes[1..]
                    .iter()
                    .take_while(|&&b| b == b' ' || b == b'\t')
                    .count();
                Some(Escape {
                    read: 2 + blanks,
                    value: ' ',
                })
            }
            'x' | 'u' | 'U' => {
                let (max_digits, limit) = match ch {
                    'x' => (2, 0xff),
                    'u' => (4, 0xffff),
                    _ => (8, 0x10ffff),
                };
                let (count, value) = Self::hex(&bytes[1..], max_digits, limit);
                if count == 0 {
                    return simple(ch);
                }
                Some(Escape {
                    read: 2 + count,
                    value: char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER),
                })
            }
            '0'..='7' => {
                let count = bytes.iter().take(3).take_while(|&&b| is_octal_digit(b)).count();
                let value = bytes[..count]
                    .iter()
                    .fold(0u32, |acc, &b| acc * 8 + u32::from(b - b'0'));
                Some(Escape {
                    read: 1 + count,
                    value: char::from((value & 0xff) as u8),
                })
            }
            other => Some(Escape {
                read: 1 + other.len_utf8(),
                value: other,
            }),
        }
    }
}

/// Decode the escape at `buffer[start..start + length]` with the standard
/// table; `None` for a dangling backslash or a window not starting with `\`
pub fn parse_backslash(buffer: &str, start: usize, length: usize) -> Option<Escape> {
    let window = buffer.get(start..start.checked_add(length)?)?;
    TclEscapes.decode(window)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(text: &str) -> Escape {
        TclEscapes.decode(text).unwrap()
    }

    #[test]
    fn test_single_character_escapes() {
        assert_eq!(decode("\\n"), Escape { read: 2, value: '\n' });
        assert_eq!(decode("\\a"), Escape { read: 2, value: '\x07' });
        assert_eq!(decode("\\\\"), Escape { read: 2, value: '\\' });
        assert_eq!(decode("\\{"), Escape { read: 2, value: '{' });
        assert_eq!(decode("\\é"), Escape { read: 3, value: 'é' });
    }

    #[test]
    fn test_numeric_escapes() {
        assert_eq!(decode("\\x41z"), Escape { read: 4, value: 'A' });
        assert_eq!(decode("\\x414"), Escape { read: 4, value: 'A' });
        assert_eq!(decode("\\xg"), Escape { read: 2, value: 'x' });
        assert_eq!(decode("\\u00e9"), Escape { read: 6, value: 'é' });
        assert_eq!(decode("\\U1F600"), Escape { read: 7, value: '😀' });
        assert_eq!(decode("\\ud800").value, char::REPLACEMENT_CHARACTER);
        assert_eq!(decode("\\101"), Escape { read: 4, value: 'A' });
        assert_eq!(decode("\\777").value, '\u{ff}');
        assert_eq!(decode("\\08"), Escape { read: 2, value: '\0' });
    }

    #[test]
    fn test_unicode_escape_stops_at_max_code_point() {
        let escape = decode("\\U00110000");
        assert_eq!(escape.read, 9);
        assert_eq!(escape.value, '\u{11000}');
    }

    #[test]
    fn test_line_continuation() {
        assert_eq!(decode("\\\n  \tx"), Escape { read: 5, value: ' ' });
    }

    #[test]
    fn test_dangling_backslash() {
        assert_eq!(TclEscapes.decode("\\"), None);
        assert_eq!(parse_backslash("ab\\", 2, 1), None);
        assert_eq!(parse_backslash("a\\tb", 1, 3).map(|e| e.read), Some(2));
        assert_eq!(parse_backslash("a", 0, 5), None);
    }
}
