//! Character classes of the command language

/// Word-separating whitespace (newline excluded; it ends a command)
pub fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | 0x0b | 0x0c)
}

pub fn is_command_end(byte: u8, nested: bool) -> bool {
    byte == b'\n' || byte == b';' || (nested && byte == b']')
}

pub fn is_name_char(ch: char, unicode: bool) -> bool {
    ch == '_'
        || if unicode {
            ch.is_alphanumeric()
        } else {
            ch.is_ascii_alphanumeric()
        }
}

/// Byte length of the variable name at the start of `text`
///
/// A name is a run of name characters and namespace separators (two or
/// more colons). A single colon ends the name.
pub fn name_length(text: &str, unicode: bool) -> usize {
    let bytes = text.as_bytes();
    let mut length = 0;

    while length < text.len() {
        if bytes[length] == b':' {
            let colons = bytes[length..].iter().take_while(|&&b| b == b':').count();
            if colons < 2 {
                break;
            }
            length += colons;
            continue;
        }
        match text[length..].chars().next() {
            Some(ch) if is_name_char(ch, unicode) => length += ch.len_utf8(),
            _ => break,
        }
    }

    length
}

/// Characters that continue an identifier in expressions
pub fn is_identifier_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

pub fn is_octal_digit(byte: u8) -> bool {
    matches!(byte, b'0'..=b'7')
}

pub fn hex_value(byte: u8) -> Option<u32> {
    (byte as char).to_digit(16)
}
