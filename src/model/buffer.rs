use ropey::Rope;
use unicode_width::UnicodeWidthChar;

use super::cursor::CursorState;
use crate::msg::Direction;

/// Every char ropey treats as a line break besides `\n`.
const LINE_BREAKS: &[char] = &['\r', '\u{000B}', '\u{000C}', '\u{0085}', '\u{2028}', '\u{2029}'];

/// Viewport state for scroll tracking.
#[derive(Debug, Clone)]
pub struct Viewport {
    pub top_line: usize,
    /// First visible column (char offset) of every line.
    pub left_col: usize,
    pub height: u16,
    /// Visible columns, in terminal cells.
    pub width: u16,
    pub scroll_off: u16,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            top_line: 0,
            left_col: 0,
            height: 15,
            width: 80,
            scroll_off: 1,
        }
    }
}

fn display_width(chars: impl Iterator<Item = char>) -> usize {
    chars.map(|ch| ch.width().unwrap_or(0)).sum()
}

/// An editable text field backed by a Rope.
///
/// A single-line buffer drops newlines; a buffer with a char limit drops
/// insertions once the limit is reached.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    rope: Rope,
    pub cursor: CursorState,
    pub viewport: Viewport,
    multiline: bool,
    char_limit: Option<usize>,
}

impl TextBuffer {
    /// A one-line input field.
    pub fn single_line() -> Self {
        Self {
            rope: Rope::new(),
            cursor: CursorState::default(),
            viewport: Viewport {
                height: 1,
                scroll_off: 0,
                ..Viewport::default()
            },
            multiline: false,
            char_limit: None,
        }
    }

    /// A multi-line text area holding at most `char_limit` characters.
    pub fn multi_line(char_limit: usize) -> Self {
        Self {
            rope: Rope::new(),
            cursor: CursorState::default(),
            viewport: Viewport::default(),
            multiline: true,
            char_limit: Some(char_limit),
        }
    }

    pub fn with_width(mut self, width: u16) -> Self {
        self.viewport.width = width;
        self
    }

    /// Replace the whole content, truncating to the char limit, and park
    /// the cursor at the start. All line breaks become `\n`.
    pub fn set_text(&mut self, text: &str) {
        let mut text = text.replace("\r\n", "\n").replace(LINE_BREAKS, "\n");
        if !self.multiline {
            text = text.replace('\n', " ");
        }
        if let Some(limit) = self.char_limit
            && text.chars().count() > limit
        {
            text = text.chars().take(limit).collect();
        }

        self.rope = Rope::from_str(&text);
        self.cursor = CursorState::default();
        self.viewport.top_line = 0;
        self.viewport.left_col = 0;
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Total number of lines in the buffer.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Get the text of a specific line (without trailing newline).
    pub fn line_text(&self, idx: usize) -> Option<String> {
        if idx >= self.rope.len_lines() {
            return None;
        }
        let line = self.rope.line(idx);
        let mut s: String = line.chunks().collect();
        if s.ends_with('\n') {
            s.pop();
        }
        Some(s)
    }

    /// The part of a line right of the horizontal scroll offset.
    pub fn visible_line(&self, idx: usize) -> Option<String> {
        self.line_text(idx)
            .map(|l| l.chars().skip(self.viewport.left_col).collect())
    }

    /// Cells between the left edge of the viewport and the cursor.
    pub fn cursor_display_x(&self) -> usize {
        let line = self.line_text(self.cursor.row).unwrap_or_default();
        display_width(
            line.chars()
                .skip(self.viewport.left_col)
                .take(self.cursor.col.saturating_sub(self.viewport.left_col)),
        )
    }

    fn line_len(&self, idx: usize) -> usize {
        self.line_text(idx).map(|l| l.chars().count()).unwrap_or(0)
    }

    fn at_limit(&self) -> bool {
        self.char_limit
            .is_some_and(|limit| self.rope.len_chars() >= limit)
    }

    /// Insert a character at the cursor position.
    pub fn insert_char(&mut self, ch: char) {
        if ch == '\n' || LINE_BREAKS.contains(&ch) {
            self.insert_newline();
            return;
        }
        if ch.is_control() || self.at_limit() {
            return;
        }

        let idx = self.cursor_char_offset();
        self.rope.insert_char(idx, ch);
        self.cursor.col += 1;
        self.cursor.desired_col = self.cursor.col;
        self.scroll_to_cursor();
    }

    /// Insert a newline at the cursor position.
    pub fn insert_newline(&mut self) {
        if !self.multiline || self.at_limit() {
            return;
        }

        let idx = self.cursor_char_offset();
        self.rope.insert_char(idx, '\n');
        self.cursor.move_to(self.cursor.row + 1, 0);
        self.scroll_to_cursor();
    }

    /// Delete the character before the cursor (backspace).
    pub fn delete_char_before(&mut self) {
        if self.cursor.col == 0 && self.cursor.row == 0 {
            return;
        }

        let idx = self.cursor_char_offset();
        if self.cursor.col == 0 {
            // Join with previous line
            let prev_line_len = self.line_len(self.cursor.row - 1);
            self.rope.remove(idx - 1..idx);
            self.cursor.move_to(self.cursor.row - 1, prev_line_len);
        } else {
            self.rope.remove(idx - 1..idx);
            self.cursor.move_to(self.cursor.row, self.cursor.col - 1);
        }
        self.scroll_to_cursor();
    }

    /// Delete the character under the cursor.
    pub fn delete_char_at(&mut self) {
        let idx = self.cursor_char_offset();
        if idx < self.rope.len_chars() {
            self.rope.remove(idx..idx + 1);
        }
        self.scroll_to_cursor();
    }

    pub fn move_cursor(&mut self, dir: Direction) {
        let last_row = self.rope.len_lines().saturating_sub(1);
        match dir {
            Direction::Left => {
                if self.cursor.col > 0 {
                    self.cursor.move_to(self.cursor.row, self.cursor.col - 1);
                } else if self.cursor.row > 0 {
                    let row = self.cursor.row - 1;
                    self.cursor.move_to(row, self.line_len(row));
                }
            }
            Direction::Right => {
                if self.cursor.col < self.line_len(self.cursor.row) {
                    self.cursor.move_to(self.cursor.row, self.cursor.col + 1);
                } else if self.cursor.row < last_row {
                    self.cursor.move_to(self.cursor.row + 1, 0);
                }
            }
            Direction::Up => {
                if self.cursor.row > 0 {
                    self.cursor.row -= 1;
                    self.cursor.col = self.cursor.desired_col.min(self.line_len(self.cursor.row));
                }
            }
            Direction::Down => {
                if self.cursor.row < last_row {
                    self.cursor.row += 1;
                    self.cursor.col = self.cursor.desired_col.min(self.line_len(self.cursor.row));
                }
            }
            Direction::LineStart => self.cursor.move_to(self.cursor.row, 0),
            Direction::LineEnd => {
                let len = self.line_len(self.cursor.row);
                self.cursor.move_to(self.cursor.row, len);
            }
        }
        self.scroll_to_cursor();
    }

    /// Move the cursor past the last character.
    pub fn cursor_to_end(&mut self) {
        let row = self.rope.len_lines().saturating_sub(1);
        self.cursor.move_to(row, self.line_len(row));
        self.scroll_to_cursor();
    }

    /// Compute the char offset in the rope for the current cursor position.
    fn cursor_char_offset(&self) -> usize {
        let line_start = self.rope.line_to_char(self.cursor.row);
        line_start + self.cursor.col
    }

    /// Ensure the viewport keeps the cursor visible.
    pub fn scroll_to_cursor(&mut self) {
        let off = self.viewport.scroll_off as usize;
        let height = (self.viewport.height as usize).max(1);

        if self.cursor.row < self.viewport.top_line + off {
            self.viewport.top_line = self.cursor.row.saturating_sub(off);
        }
        if self.cursor.row + off >= self.viewport.top_line + height {
            self.viewport.top_line = (self.cursor.row + off + 1).saturating_sub(height);
        }

        // Horizontal: the cursor needs one free cell of its own.
        let width = (self.viewport.width as usize).max(1);
        if self.cursor.col < self.viewport.left_col {
            self.viewport.left_col = self.cursor.col;
        }
        let line: Vec<char> = self
            .line_text(self.cursor.row)
            .unwrap_or_default()
            .chars()
            .collect();
        let col = self.cursor.col.min(line.len());
        while self.viewport.left_col < col
            && display_width(line[self.viewport.left_col..col].iter().copied()) >= width
        {
            self.viewport.left_col += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(buffer: &mut TextBuffer, text: &str) {
        for ch in text.chars() {
            buffer.insert_char(ch);
        }
    }

    #[test]
    fn single_line_ignores_newlines() {
        let mut name = TextBuffer::single_line();
        typed(&mut name, "Gro\nceries");
        assert_eq!(name.text(), "Groceries");

        name.set_text("two\nlines");
        assert_eq!(name.text(), "two lines");
    }

    #[test]
    fn all_line_breaks_are_normalized() {
        let mut body = TextBuffer::multi_line(100);
        body.set_text("a\rb\u{2028}c\u{85}d\r\ne");
        assert_eq!(body.text(), "a\nb\nc\nd\ne");
        assert_eq!(body.line_count(), 5);

        let mut name = TextBuffer::single_line();
        name.set_text("x\ry\u{2029}z");
        assert_eq!(name.text(), "x y z");
        assert_eq!(name.line_count(), 1);

        for ch in ['\r', '\u{2028}', '\u{0B}', '\u{85}'] {
            name.insert_char(ch);
        }
        assert_eq!(name.line_count(), 1);
        assert_eq!(name.text(), "x y z");
    }

    #[test]
    fn long_line_scrolls_horizontally() {
        let mut body = TextBuffer::multi_line(1000).with_width(10);
        typed(&mut body, "0123456789abcdef");
        assert_eq!(body.viewport.left_col, 7);
        assert_eq!(body.visible_line(0).unwrap(), "789abcdef");
        assert_eq!(body.cursor_display_x(), 9);

        body.move_cursor(Direction::LineStart);
        assert_eq!(body.viewport.left_col, 0);
        assert_eq!(body.cursor_display_x(), 0);
    }

    #[test]
    fn cursor_position_counts_cells() {
        let mut name = TextBuffer::single_line();
        typed(&mut name, "日本a");
        assert_eq!(name.cursor_display_x(), 5);
        name.move_cursor(Direction::Left);
        assert_eq!(name.cursor_display_x(), 4);
    }

    #[test]
    fn wide_chars_scroll_by_cells() {
        let mut name = TextBuffer::single_line().with_width(5);
        typed(&mut name, "日本語");
        assert!(name.cursor_display_x() < 5);
        assert_eq!(name.visible_line(0).unwrap(), "本語");
    }

    #[test]
    fn multi_line_tracks_rows() {
        let mut body = TextBuffer::multi_line(100);
        typed(&mut body, "milk\neggs");
        assert_eq!(body.text(), "milk\neggs");
        assert_eq!(body.line_count(), 2);
        assert_eq!(body.cursor, CursorState { row: 1, col: 4, desired_col: 4 });
    }

    #[test]
    fn backspace_joins_lines() {
        let mut body = TextBuffer::multi_line(100);
        typed(&mut body, "ab\ncd");
        body.move_cursor(Direction::LineStart);
        body.delete_char_before();
        assert_eq!(body.text(), "abcd");
        assert_eq!((body.cursor.row, body.cursor.col), (0, 2));

        body.cursor.move_to(0, 0);
        body.delete_char_before();
        assert_eq!(body.text(), "abcd");
    }

    #[test]
    fn char_limit_drops_excess_input() {
        let mut body = TextBuffer::multi_line(3);
        typed(&mut body, "abcdef");
        assert_eq!(body.text(), "abc");
        body.insert_newline();
        assert_eq!(body.text(), "abc");

        body.set_text("0123456789");
        assert_eq!(body.text(), "012");
        assert_eq!(body.text().chars().count(), 3);
    }

    #[test]
    fn multibyte_input_uses_char_offsets() {
        let mut name = TextBuffer::single_line();
        typed(&mut name, "café");
        name.move_cursor(Direction::Left);
        name.insert_char('!');
        assert_eq!(name.text(), "caf!é");
        name.move_cursor(Direction::LineEnd);
        name.delete_char_before();
        assert_eq!(name.text(), "caf!");
    }

    #[test]
    fn delete_removes_under_cursor() {
        let mut body = TextBuffer::multi_line(100);
        body.set_text("ab\nc");
        body.move_cursor(Direction::LineEnd);
        body.delete_char_at();
        assert_eq!(body.text(), "abc");
        body.cursor_to_end();
        body.delete_char_at();
        assert_eq!(body.text(), "abc");
    }

    #[test]
    fn vertical_movement_keeps_desired_column() {
        let mut body = TextBuffer::multi_line(100);
        body.set_text("long line\nab\nanother line");
        body.move_cursor(Direction::LineEnd);
        body.move_cursor(Direction::Down);
        assert_eq!((body.cursor.row, body.cursor.col), (1, 2));
        body.move_cursor(Direction::Down);
        assert_eq!((body.cursor.row, body.cursor.col), (2, 9));
    }

    #[test]
    fn cursor_to_end_scrolls_viewport() {
        let mut body = TextBuffer::multi_line(1000);
        body.set_text(&"line\n".repeat(30));
        body.cursor_to_end();
        assert_eq!(body.cursor.row, 30);
        assert!(body.viewport.top_line > 0);
        assert!(body.cursor.row < body.viewport.top_line + body.viewport.height as usize);
    }
}
