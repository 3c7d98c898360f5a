use ratatui::layout::Rect;
use std::cmp;

/// Line-based text buffer behind every form input. Columns count chars, not bytes.
#[derive(Debug, Clone)]
pub struct Editor {
    pub lines: Vec<String>,
    pub cursor_line: usize,
    pub cursor_col: usize,
    pub scroll_offset: usize,      // Vertical scroll (line offset)
    pub scroll_col: usize,         // Horizontal scroll (column offset)
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    pub fn new() -> Self {
        Self {
            lines: vec![String::new()],
            cursor_line: 0,
            cursor_col: 0,
            scroll_offset: 0,
            scroll_col: 0,
        }
    }

    /// Build an editor holding `content` with the cursor at its end
    pub fn from_string(content: &str) -> Self {
        let lines: Vec<String> = content.split('\n').map(|s| s.to_string()).collect();
        let cursor_line = lines.len().saturating_sub(1);
        let cursor_col = lines.last().map(|l| l.chars().count()).unwrap_or(0);
        Self {
            lines,
            cursor_line,
            cursor_col,
            scroll_offset: 0,
            scroll_col: 0,
        }
    }

    fn ensure_cursor_valid(&mut self) {
        if self.lines.is_empty() {
            self.lines.push(String::new());
        }
        if self.cursor_line >= self.lines.len() {
            self.cursor_line = self.lines.len() - 1;
        }
        let len = self.current_line_len();
        if self.cursor_col > len {
            self.cursor_col = len;
        }
    }

    fn current_line_len(&self) -> usize {
        self.lines.get(self.cursor_line).map(|l| l.chars().count()).unwrap_or(0)
    }

    pub fn insert_char(&mut self, ch: char) {
        if ch == '\n' {
            self.insert_newline();
            return;
        }
        self.ensure_cursor_valid();
        let col = self.cursor_col;
        if let Some(line) = self.lines.get_mut(self.cursor_line) {
            let mut chars: Vec<char> = line.chars().collect();
            chars.insert(col, ch);
            *line = chars.into_iter().collect();
            self.cursor_col += 1;
        }
    }

    /// Backspace: remove the char before the cursor, joining lines at column 0
    pub fn delete_char(&mut self) {
        self.ensure_cursor_valid();
        if self.cursor_col > 0 {
            let col = self.cursor_col;
            if let Some(line) = self.lines.get_mut(self.cursor_line) {
                let mut chars: Vec<char> = line.chars().collect();
                chars.remove(col - 1);
                *line = chars.into_iter().collect();
                self.cursor_col -= 1;
            }
        } else if self.cursor_line > 0 {
            let current = self.lines.remove(self.cursor_line);
            self.cursor_line -= 1;
            if let Some(prev) = self.lines.get_mut(self.cursor_line) {
                self.cursor_col = prev.chars().count();
                prev.push_str(&current);
            }
        }
    }

    /// Delete key: remove the char under the cursor, joining the next line at line end
    pub fn delete_forward(&mut self) {
        self.ensure_cursor_valid();
        let len = self.current_line_len();
        if self.cursor_col < len {
            let col = self.cursor_col;
            if let Some(line) = self.lines.get_mut(self.cursor_line) {
                let mut chars: Vec<char> = line.chars().collect();
                chars.remove(col);
                *line = chars.into_iter().collect();
            }
        } else if self.cursor_line + 1 < self.lines.len() {
            let next = self.lines.remove(self.cursor_line + 1);
            if let Some(line) = self.lines.get_mut(self.cursor_line) {
                line.push_str(&next);
            }
        }
    }

    pub fn insert_newline(&mut self) {
        self.ensure_cursor_valid();
        let col = self.cursor_col;
        if let Some(line) = self.lines.get_mut(self.cursor_line) {
            let mut chars: Vec<char> = line.chars().collect();
            let remainder: String = chars.split_off(col).into_iter().collect();
            *line = chars.into_iter().collect();
            self.lines.insert(self.cursor_line + 1, remainder);
            self.cursor_line += 1;
            self.cursor_col = 0;
        }
    }

    pub fn move_cursor_up(&mut self) {
        if self.cursor_line > 0 {
            self.cursor_line -= 1;
            self.cursor_col = cmp::min(self.cursor_col, self.current_line_len());
        }
    }

    pub fn move_cursor_down(&mut self) {
        if self.cursor_line < self.lines.len().saturating_sub(1) {
            self.cursor_line += 1;
            self.cursor_col = cmp::min(self.cursor_col, self.current_line_len());
        }
    }

    pub fn move_cursor_left(&mut self) {
        if self.cursor_col > 0 {
            self.cursor_col -= 1;
        } else if self.cursor_line > 0 {
            self.cursor_line -= 1;
            self.cursor_col = self.current_line_len();
        }
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor_col < self.current_line_len() {
            self.cursor_col += 1;
        } else if self.cursor_line < self.lines.len().saturating_sub(1) {
            self.cursor_line += 1;
            self.cursor_col = 0;
        }
    }

    pub fn move_cursor_home(&mut self) {
        self.cursor_col = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor_col = self.current_line_len();
    }

    /// Lines inside the viewport, cut to its width after horizontal scroll
    pub fn get_visible_lines(&self, viewport_height: usize, viewport_width: usize) -> (usize, Vec<String>) {
        let start = cmp::min(self.scroll_offset, self.lines.len());
        let end = cmp::min(start + viewport_height, self.lines.len());
        let effective_width = viewport_width.saturating_sub(2);

        let visible = self.lines[start..end]
            .iter()
            .map(|line| line.chars().skip(self.scroll_col).take(effective_width).collect())
            .collect();

        (start, visible)
    }

    pub fn update_scroll(&mut self, viewport_height: usize) {
        let viewport_height = viewport_height.max(1);
        if self.cursor_line < self.scroll_offset {
            self.scroll_offset = self.cursor_line;
        } else if self.cursor_line >= self.scroll_offset + viewport_height {
            self.scroll_offset = self.cursor_line + 1 - viewport_height;
        }
    }

    /// `viewport_width` includes the two border columns
    pub fn update_horizontal_scroll(&mut self, viewport_width: usize) {
        let effective_width = viewport_width.saturating_sub(2).max(1);
        if self.cursor_col < self.scroll_col {
            self.scroll_col = self.cursor_col;
        } else if self.cursor_col >= self.scroll_col + effective_width {
            self.scroll_col = self.cursor_col + 1 - effective_width;
        }
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Terminal position of the cursor inside a bordered `area`, if visible
    pub fn get_cursor_screen_pos(&self, area: Rect, viewport_height: usize) -> Option<(u16, u16)> {
        if self.cursor_line < self.scroll_offset || self.cursor_line >= self.scroll_offset + viewport_height {
            return None;
        }
        let line_y = (self.cursor_line - self.scroll_offset) as u16;
        if line_y >= area.height.saturating_sub(2) {
            return None;
        }

        let line = self.lines.get(self.cursor_line)?;
        let col = cmp::min(self.cursor_col, line.chars().count());
        let visible_col = col.checked_sub(self.scroll_col)?;
        if visible_col >= area.width.saturating_sub(2) as usize {
            return None;
        }

        Some((area.x + 1 + visible_col as u16, area.y + 1 + line_y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn typed(text: &str) -> Editor {
        let mut editor = Editor::new();
        for ch in text.chars() {
            editor.insert_char(ch);
        }
        editor
    }

    #[test]
    fn typing_and_newlines_build_lines() {
        let editor = typed("Ruby,\nRails");
        assert_eq!(editor.lines, vec!["Ruby,", "Rails"]);
        assert_eq!(editor.text(), "Ruby,\nRails");
        assert_eq!((editor.cursor_line, editor.cursor_col), (1, 5));
    }

    #[test]
    fn backspace_joins_lines_at_column_zero() {
        let mut editor = typed("ab\ncd");
        editor.move_cursor_home();
        editor.delete_char();
        assert_eq!(editor.text(), "abcd");
        assert_eq!((editor.cursor_line, editor.cursor_col), (0, 2));
    }

    #[test]
    fn multibyte_characters_are_edited_by_char() {
        let mut editor = Editor::from_string("日本語");
        editor.move_cursor_left();
        editor.delete_char();
        assert_eq!(editor.text(), "日語");
        editor.delete_forward();
        assert_eq!(editor.text(), "日");
    }

    #[test]
    fn trailing_newline_survives_reopening() {
        let editor = Editor::from_string("Intro\n");
        assert_eq!(editor.lines, vec!["Intro", ""]);
        assert_eq!(editor.text(), "Intro\n");
        assert_eq!((editor.cursor_line, editor.cursor_col), (1, 0));
        assert_eq!(Editor::from_string("").lines, vec![""]);
    }

    #[test]
    fn scroll_follows_cursor() {
        let mut editor = Editor::from_string("1\n2\n3\n4\n5");
        editor.update_scroll(2);
        assert_eq!(editor.scroll_offset, 3);
        for _ in 0..4 {
            editor.move_cursor_up();
        }
        editor.update_scroll(2);
        assert_eq!(editor.scroll_offset, 0);
    }
}
