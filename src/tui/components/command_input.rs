//! # CommandInput Component
//!
//! Multi-line input at the bottom of the chat page.
//!
//! - Enter submits (blank input is ignored)
//! - Ctrl+J / Shift+Enter inserts a newline
//! - Long lines soft-wrap with `textwrap`
//! - Grows with its wrapped content up to [`MAX_VISIBLE_LINES`], then
//!   scrolls to keep the cursor row visible
//!
//! The buffer is internal state; the parent only sees
//! [`CommandInputEvent::Submit`].

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Paragraph};
use unicode_width::UnicodeWidthStr;

use crate::tui::component::{Component, EventHandler};
use crate::tui::components::code_output::wrap_options;
use crate::tui::components::text_buffer::TextBuffer;
use crate::tui::event::TuiEvent;

/// Most content lines shown before the input scrolls.
pub const MAX_VISIBLE_LINES: u16 = 5;
/// Top + bottom border.
const VERTICAL_OVERHEAD: u16 = 2;
/// Left + right border.
const HORIZONTAL_OVERHEAD: u16 = 2;

#[derive(Debug, Clone, PartialEq)]
pub enum CommandInputEvent {
    Submit(String),
    ContentChanged,
}

#[derive(Debug, Default)]
pub struct CommandInput {
    pub buffer: TextBuffer,
    pub focused: bool,
    scroll_offset: u16,
}

impl CommandInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Height for the current content wrapped to `width`, clamped to
    /// `[1, MAX_VISIBLE_LINES]` content rows plus borders.
    pub fn calculate_height(&self, width: u16) -> u16 {
        let rows = u16::try_from(self.wrapped_lines(width).len()).unwrap_or(u16::MAX);
        rows.clamp(1, MAX_VISIBLE_LINES) + VERTICAL_OVERHEAD
    }

    /// Buffer split into display rows for an input `width` columns wide.
    fn wrapped_lines(&self, width: u16) -> Vec<String> {
        let inner = inner_width(width);
        self.buffer
            .as_str()
            .split('\n')
            .flat_map(|line| wrap_line(line, inner))
            .collect()
    }

    /// Zero-based (row, column) of the cursor among the wrapped rows.
    fn cursor_row_col(&self, width: u16) -> (u16, u16) {
        let inner = inner_width(width);
        let (line, _) = self.buffer.cursor_position();
        let rows_above: usize = self
            .buffer
            .as_str()
            .split('\n')
            .take(line)
            .map(|l| wrap_line(l, inner).len())
            .sum();

        let prefix = self.buffer.line_before_cursor();
        let segments = wrap_line(prefix, inner);
        // Wrapping trims spaces at row ends, so locate the last row in the
        // prefix itself to keep typed trailing spaces in the column.
        let last = segments.last().map_or("", String::as_str);
        let trimmed = prefix.trim_end_matches(' ');
        let last_start = if trimmed.ends_with(last) {
            trimmed.len() - last.len()
        } else {
            0
        };
        let row = rows_above + segments.len().saturating_sub(1);
        let column = prefix[last_start..].width();
        (
            u16::try_from(row).unwrap_or(u16::MAX),
            u16::try_from(column).unwrap_or(u16::MAX),
        )
    }

    fn update_scroll_offset(&mut self, visible: u16, width: u16) {
        let (row, _) = self.cursor_row_col(width);
        if row < self.scroll_offset {
            self.scroll_offset = row;
        } else if visible > 0 && row >= self.scroll_offset.saturating_add(visible) {
            self.scroll_offset = row + 1 - visible;
        }
    }
}

fn inner_width(width: u16) -> usize {
    width.saturating_sub(HORIZONTAL_OVERHEAD).max(1) as usize
}

/// One logical line as display rows; an empty line still takes a row.
fn wrap_line(line: &str, width: usize) -> Vec<String> {
    if line.is_empty() {
        return vec![String::new()];
    }
    textwrap::wrap(line, wrap_options(width))
        .into_iter()
        .map(|l| l.into_owned())
        .collect()
}

impl Component for CommandInput {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let visible = area.height.saturating_sub(VERTICAL_OVERHEAD);
        self.update_scroll_offset(visible, area.width);

        let border_style = if self.focused {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title(" Message (Enter to send, Ctrl+J for newline) ");

        let lines: Vec<Line> = self
            .wrapped_lines(area.width)
            .into_iter()
            .map(Line::from)
            .collect();
        let input = Paragraph::new(lines)
            .block(block)
            .scroll((self.scroll_offset, 0))
            .style(Style::default().fg(Color::White));
        frame.render_widget(input, area);

        if self.focused {
            let (row, column) = self.cursor_row_col(area.width);
            let x = area.x + 1 + column.min(area.width.saturating_sub(3));
            let y = area.y + 1 + row.saturating_sub(self.scroll_offset);
            frame.set_cursor_position((x, y.min(area.bottom().saturating_sub(2))));
        }
    }
}

impl EventHandler for CommandInput {
    type Event = CommandInputEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<CommandInputEvent> {
        match event {
            TuiEvent::Enter => {
                if self.buffer.is_blank() {
                    return None;
                }
                self.scroll_offset = 0;
                Some(CommandInputEvent::Submit(self.buffer.take()))
            }
            other => self
                .buffer
                .apply(other)
                .then_some(CommandInputEvent::ContentChanged),
        }
    }
}
