//! Offset to line/column mapping and cargo-style error excerpts

use std::fmt;

/// A resolved location in source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// Byte offset from the start of the buffer
    pub offset: usize,
    /// Line number (1-based, shifted by the map's first line)
    pub line: u32,
    /// Column number in characters (1-based)
    pub column: u32,
}

impl Position {
    pub fn new(offset: usize, line: u32, column: u32) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Line index over a borrowed buffer
///
/// `first_line` is the line number of offset 0, so a script embedded at line
/// 40 of a larger file reports lines relative to that file.
#[derive(Debug, Clone)]
pub struct SourceMap<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
    first_line: u32,
}

impl<'a> SourceMap<'a> {
    pub fn new(source: &'a str) -> Self {
        Self::with_first_line(source, 1)
    }

    pub fn with_first_line(source: &'a str, first_line: u32) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(offset, _)| offset + 1),
        );
        Self {
            source,
            line_starts,
            first_line: first_line.max(1),
        }
    }

    fn line_index(&self, offset: usize) -> usize {
        self.line_starts
            .binary_search(&offset)
            .unwrap_or_else(|i| i - 1)
    }

    /// Line and column of a byte offset; offsets past the end clamp to it
    pub fn position_at(&self, offset: usize) -> Position {
        let offset = offset.min(self.source.len());
        let index = self.line_index(offset);
        let line_start = self.line_starts[index];
        let column = self
            .source
            .get(line_start..offset)
            .map(|prefix| prefix.chars().count())
            .unwrap_or(offset - line_start);

        Position::new(
            offset,
            self.first_line + index as u32,
            column as u32 + 1,
        )
    }

    /// Text of a line, by the same numbering `position_at` reports
    pub fn get_line(&self, line: u32) -> Option<&'a str> {
        let index = line.checked_sub(self.first_line)? as usize;
        let start = *self.line_starts.get(index)?;
        let end = self
            .line_starts
            .get(index + 1)
            .map(|next| next - 1)
            .unwrap_or(self.source.len());

        Some(self.source[start..end].trim_end_matches('\r'))
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Format a diagnostic with the offending line and a caret
    pub fn format_error(&self, file_name: Option<&str>, offset: usize, message: &str) -> String {
        let position = self.position_at(offset);
        let mut result = String::new();

        result.push_str(&format!("error: {}\n", message));
        result.push_str(&format!(
            "  --> {}:{}\n",
            file_name.unwrap_or("<script>"),
            position
        ));

        if let Some(line) = self.get_line(position.line) {
            let line_num = position.line.to_string();
            let padding = " ".repeat(line_num.len());

            result.push_str(&format!("{} |\n", padding));
            result.push_str(&format!("{} | {}\n", line_num, line));
            result.push_str(&format!(
                "{} | {}^\n",
                padding,
                " ".repeat(position.column as usize - 1)
            ));
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_at() {
        let map = SourceMap::new("set a 1\nputs $a\n");

        assert_eq!(map.position_at(0), Position::new(0, 1, 1));
        assert_eq!(map.position_at(8), Position::new(8, 2, 1));
        assert_eq!(map.position_at(13), Position::new(13, 2, 6));
        assert_eq!(map.line_count(), 3);
    }

    #[test]
    fn test_first_line_offset() {
        let map = SourceMap::with_first_line("a\nb", 40);

        assert_eq!(map.position_at(2).line, 41);
        assert_eq!(map.get_line(41), Some("b"));
        assert_eq!(map.get_line(1), None);
    }

    #[test]
    fn test_columns_count_characters() {
        let map = SourceMap::new("é $x");
        assert_eq!(map.position_at(3).column, 3);
    }

    #[test]
    fn test_offset_past_end_clamps() {
        let map = SourceMap::new("{abc");
        assert_eq!(map.position_at(99), Position::new(4, 1, 5));
    }

    #[test]
    fn test_format_error() {
        let map = SourceMap::new("puts {abc");
        let formatted = map.format_error(Some("t.tcl"), 9, "missing close-brace");

        assert!(formatted.starts_with("error: missing close-brace\n"));
        assert!(formatted.contains("--> t.tcl:1:10"));
        assert!(formatted.contains("1 | puts {abc"));
        assert!(formatted.ends_with("  |          ^\n"));
    }
}
