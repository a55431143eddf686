use crate::language::span::Position;

/// Holds the program text and resolves byte offsets to 1-indexed line/column
/// positions for diagnostics.
pub struct SourceBuffer {
    text: String,
    line_starts: Vec<usize>,
}

impl SourceBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        for (offset, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(offset + 1);
            }
        }
        Self { text, line_starts }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Line/column of a byte offset, both 1-indexed. Offsets past the end of
    /// the text clamp to the final position instead of failing.
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.text.len());
        let line_index = match self.line_starts.binary_search(&offset) {
            Ok(index) => index,
            Err(index) => index - 1,
        };
        let column = offset - self.line_starts[line_index] + 1;
        Position::new(line_index as u32 + 1, column as u32)
    }

    /// Two-line diagnostic snippet: the source line, then a caret under the
    /// offending column.
    pub fn snippet(&self, offset: usize) -> String {
        let position = self.position(offset);
        let line = self.line_text(position.line).unwrap_or("");
        let caret_indent = " ".repeat(position.column as usize - 1);
        format!("{line}\n{caret_indent}^")
    }

    fn line_text(&self, line: u32) -> Option<&str> {
        let index = line.checked_sub(1)? as usize;
        let start = *self.line_starts.get(index)?;
        let end = self
            .line_starts
            .get(index + 1)
            .map(|next| next - 1)
            .unwrap_or(self.text.len());
        let slice = &self.text[start..end];
        Some(slice.strip_suffix('\r').unwrap_or(slice))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_are_one_indexed() {
        let buffer = SourceBuffer::new("abc\ndef\n");
        assert_eq!(buffer.position(0), Position::new(1, 1));
        assert_eq!(buffer.position(2), Position::new(1, 3));
        assert_eq!(buffer.position(4), Position::new(2, 1));
        assert_eq!(buffer.position(6), Position::new(2, 3));
    }

    #[test]
    fn out_of_range_offset_clamps() {
        let buffer = SourceBuffer::new("abc");
        assert_eq!(buffer.position(999), Position::new(1, 4));
    }

    #[test]
    fn snippet_points_at_column() {
        let buffer = SourceBuffer::new("variable x = y;\n");
        assert_eq!(buffer.snippet(13), "variable x = y;\n             ^");
    }

    #[test]
    fn snippet_on_empty_source() {
        let buffer = SourceBuffer::new("");
        assert_eq!(buffer.snippet(0), "\n^");
    }
}
