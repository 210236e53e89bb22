//! Bounded view over a buffer window
//!
//! Nested parses narrow the parent cursor instead of copying text, so every
//! offset a cursor reports is absolute within the original buffer.

#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    buffer: &'a str,
    start: usize,
    end: usize,
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Cursor over `buffer[start..start + length]`
    ///
    /// Panics when the window leaves the buffer or splits a character.
    pub fn new(buffer: &'a str, start: usize, length: usize) -> Self {
        let end = start
            .checked_add(length)
            .filter(|&end| end <= buffer.len())
            .unwrap_or_else(|| {
                panic!(
                    "window {}+{} outside buffer of {} bytes",
                    start,
                    length,
                    buffer.len()
                )
            });
        assert!(
            buffer.is_char_boundary(start) && buffer.is_char_boundary(end),
            "window {}..{} is not on character boundaries",
            start,
            end
        );
        Self {
            buffer,
            start,
            end,
            pos: start,
        }
    }

    /// Sub-cursor over `[start, start + length)` of the remaining window
    ///
    /// Panics when the range is not inside `[pos, end]`.
    pub fn narrow(&self, start: usize, length: usize) -> Self {
        assert!(
            start >= self.pos && start.saturating_add(length) <= self.end,
            "window {}+{} is not inside {}..{}",
            start,
            length,
            self.pos,
            self.end
        );
        Self::new(self.buffer, start, length)
    }

    pub fn buffer(&self) -> &'a str {
        self.buffer
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.end
    }

    pub fn remaining(&self) -> usize {
        self.end - self.pos
    }

    pub fn peek(&self) -> Option<u8> {
        self.peek_at(0)
    }

    /// Byte `ahead` positions past the cursor, if still in the window
    pub fn peek_at(&self, ahead: usize) -> Option<u8> {
        let index = self.pos + ahead;
        if index < self.end {
            Some(self.buffer.as_bytes()[index])
        } else {
            None
        }
    }

    pub fn peek_char(&self) -> Option<char> {
        self.buffer[self.pos..self.end].chars().next()
    }

    /// Advance by `count` bytes, stopping at the window end
    pub fn advance(&mut self, count: usize) {
        self.pos = (self.pos + count).min(self.end);
    }

    /// Advance past the current character
    pub fn bump(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    pub fn set_pos(&mut self, pos: usize) {
        debug_assert!(pos >= self.start && pos <= self.end);
        self.pos = pos.clamp(self.start, self.end);
    }

    /// Text between `from` and the cursor
    pub fn slice_from(&self, from: usize) -> &'a str {
        &self.buffer[from..self.pos]
    }

    pub fn rest(&self) -> &'a str {
        &self.buffer[self.pos..self.end]
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peek_respects_window() {
        let cursor = Cursor::new("xxputs hixx", 2, 7);

        assert_eq!(cursor.peek(), Some(b'p'));
        assert_eq!(cursor.peek_at(6), Some(b'i'));
        assert_eq!(cursor.peek_at(7), None);
        assert_eq!(cursor.rest(), "puts hi");
    }

    #[test]
    fn test_bump_steps_whole_characters() {
        let mut cursor = Cursor::new("é$", 0, 3);

        assert_eq!(cursor.bump(), Some('é'));
        assert_eq!(cursor.pos(), 2);
        assert_eq!(cursor.bump(), Some('$'));
        assert_eq!(cursor.bump(), None);
        assert!(cursor.is_at_end());
    }

    #[test]
    fn test_narrow_shares_offsets() {
        let mut cursor = Cursor::new("a [b c] d", 0, 9);
        cursor.advance(3);
        let inner = cursor.narrow(3, 3);

        assert_eq!(inner.rest(), "b c");
        assert_eq!(inner.start(), 3);
        assert_eq!(inner.end(), 6);
    }

    #[test]
    #[should_panic]
    fn test_window_outside_buffer_panics() {
        Cursor::new("abc", 2, 5);
    }

    #[test]
    #[should_panic]
    fn test_window_inside_character_panics() {
        Cursor::new("é", 1, 1);
    }

    #[test]
    #[should_panic]
    fn test_narrow_before_position_panics() {
        let mut cursor = Cursor::new("abcdef", 0, 6);
        cursor.advance(3);
        cursor.narrow(1, 2);
    }
}
