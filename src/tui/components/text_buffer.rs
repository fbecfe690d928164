//! Multi-line text buffer with a byte-offset cursor.
//!
//! Shared by `CommandInput` and the code editor in `EditableContent`. Lines
//! are never soft-wrapped here; the cursor position is reported as a
//! (line, display column) pair measured with `unicode-width`.

use unicode_width::UnicodeWidthStr;

use crate::tui::event::TuiEvent;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct TextBuffer {
    text: String,
    /// Byte offset into `text`, always on a char boundary.
    cursor: usize,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer holding `text` with the cursor at the end.
    pub fn with_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.len();
        Self { text, cursor }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Take the contents, leaving the buffer empty.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }

    pub fn line_count(&self) -> usize {
        self.text.split('\n').count()
    }

    /// Text of the cursor's line up to the cursor.
    pub fn line_before_cursor(&self) -> &str {
        &self.text[self.line_start()..self.cursor]
    }

    /// Zero-based (line, display column) of the cursor.
    pub fn cursor_position(&self) -> (usize, usize) {
        let before = &self.text[..self.cursor];
        let line = before.matches('\n').count();
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        (line, before[line_start..].width())
    }

    /// Apply an editing event. Returns true if text or cursor changed.
    pub fn apply(&mut self, event: &TuiEvent) -> bool {
        match event {
            TuiEvent::InputChar(c) => {
                self.insert_str(c.encode_utf8(&mut [0; 4]));
                true
            }
            TuiEvent::Newline => {
                self.insert_str("\n");
                true
            }
            TuiEvent::Paste(text) => {
                self.insert_str(&text.replace("\r\n", "\n").replace('\r', "\n"));
                true
            }
            TuiEvent::Backspace => {
                if self.cursor == 0 {
                    return false;
                }
                let prev = prev_char_boundary(&self.text, self.cursor);
                self.text.drain(prev..self.cursor);
                self.cursor = prev;
                true
            }
            TuiEvent::Delete => {
                if self.cursor >= self.text.len() {
                    return false;
                }
                let next = next_char_boundary(&self.text, self.cursor);
                self.text.drain(self.cursor..next);
                true
            }
            TuiEvent::CursorLeft => {
                self.move_to(prev_char_boundary(&self.text, self.cursor))
            }
            TuiEvent::CursorRight => {
                self.move_to(next_char_boundary(&self.text, self.cursor))
            }
            TuiEvent::CursorHome => self.move_to(self.line_start()),
            TuiEvent::CursorEnd => self.move_to(self.line_end()),
            TuiEvent::CursorUp => self.move_vertically(-1),
            TuiEvent::CursorDown => self.move_vertically(1),
            _ => false,
        }
    }

    fn insert_str(&mut self, s: &str) {
        self.text.insert_str(self.cursor, s);
        self.cursor += s.len();
    }

    fn move_to(&mut self, pos: usize) -> bool {
        let changed = pos != self.cursor;
        self.cursor = pos;
        changed
    }

    fn line_start(&self) -> usize {
        self.text[..self.cursor]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(0)
    }

    fn line_end(&self) -> usize {
        self.text[self.cursor..]
            .find('\n')
            .map(|i| self.cursor + i)
            .unwrap_or(self.text.len())
    }

    /// Move one logical line up or down, keeping the display column when possible.
    fn move_vertically(&mut self, direction: i32) -> bool {
        let (line, column) = self.cursor_position();
        let target = match direction {
            d if d < 0 && line > 0 => line - 1,
            d if d > 0 && line + 1 < self.line_count() => line + 1,
            _ => return false,
        };

        let mut offset = 0;
        for (i, text) in self.text.split('\n').enumerate() {
            if i == target {
                let mut pos = offset;
                let mut width = 0;
                for (byte, ch) in text.char_indices() {
                    let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
                    if width + w > column {
                        break;
                    }
                    width += w;
                    pos = offset + byte + ch.len_utf8();
                }
                return self.move_to(pos);
            }
            offset += text.len() + 1;
        }
        false
    }
}

fn prev_char_boundary(text: &str, pos: usize) -> usize {
    text[..pos]
        .char_indices()
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .char_indices()
        .nth(1)
        .map(|(i, _)| pos + i)
        .unwrap_or(text.len())
}
