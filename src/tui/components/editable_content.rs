//! # EditableContent Component
//!
//! Wraps a highlighted code body with in-place editing.
//!
//! ```text
//!  not editing                      editing
//!  ┌────────────────────────┐       ┌────────────────────────┐
//!  │ print("hi")            │  e →  │ print("hi")█           │
//!  │ [e] Edit  [d] Delete   │       │ [Ctrl+S] Accept [Esc] Reject
//!  └────────────────────────┘  ← Esc/Ctrl+S ─────────────────┘
//! ```
//!
//! Edits are only committed upward: the component emits
//! [`EditEvent::Accept`] and its owner decides what to do with the text.
//! Nothing is editable while the message is streaming.
//!
//! Follows the persistent state + transient wrapper pattern:
//! - `EditableContentState` lives in the owning `CodeMessageState`
//! - `EditableContent` (events) and `EditableContentView` (drawing) are
//!   created on demand with borrowed state and props

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Paragraph, Widget};

use crate::tui::component::EventHandler;
use crate::tui::components::text_buffer::TextBuffer;
use crate::tui::event::TuiEvent;
use crate::tui::highlight::highlight;

#[derive(Debug, Default)]
pub struct EditableContentState {
    pub editing: bool,
    pub buffer: TextBuffer,
}

impl EditableContentState {
    pub fn start_editing(&mut self, content: &str) {
        self.buffer = TextBuffer::with_text(content);
        self.editing = true;
    }

    fn stop_editing(&mut self) -> String {
        self.editing = false;
        self.buffer.take()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditEvent {
    /// The user committed the edited text.
    Accept(String),
    /// The user rejected the edit; content is unchanged.
    Cancel,
    /// The user asked to delete the whole message.
    Delete,
}

/// Event side of the wrapper.
pub struct EditableContent<'a> {
    pub state: &'a mut EditableContentState,
    /// Current committed content, copied into the buffer when editing starts.
    pub content: &'a str,
    pub is_streaming: bool,
}

impl<'a> EventHandler for EditableContent<'a> {
    type Event = EditEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<EditEvent> {
        if self.is_streaming {
            return None;
        }

        if !self.state.editing {
            return match event {
                TuiEvent::InputChar('e') => {
                    self.state.start_editing(self.content);
                    None
                }
                TuiEvent::InputChar('d') => Some(EditEvent::Delete),
                _ => None,
            };
        }

        match event {
            TuiEvent::Accept => Some(EditEvent::Accept(self.state.stop_editing())),
            TuiEvent::Escape => {
                self.state.stop_editing();
                Some(EditEvent::Cancel)
            }
            TuiEvent::Enter => {
                self.state.buffer.apply(&TuiEvent::Newline);
                None
            }
            other => {
                self.state.buffer.apply(other);
                None
            }
        }
    }
}

/// Drawing side of the wrapper.
pub struct EditableContentView<'a> {
    pub state: &'a EditableContentState,
    pub content: &'a str,
    pub language: &'a str,
    pub is_streaming: bool,
}

impl<'a> EditableContentView<'a> {
    /// Code lines (at least one) plus the hint line when not streaming.
    pub fn calculate_height(&self) -> u16 {
        let body = if self.state.editing {
            self.state.buffer.line_count()
        } else {
            self.content.lines().count()
        };
        let hint = if self.is_streaming { 0 } else { 1 };
        u16::try_from(body.max(1))
            .unwrap_or(u16::MAX)
            .saturating_add(hint)
    }

    fn hint(&self) -> Line<'static> {
        let key = Style::new().fg(Color::Cyan);
        let label = Style::new().fg(Color::DarkGray);
        if self.state.editing {
            Line::from(vec![
                Span::styled("[Ctrl+S]", key),
                Span::styled(" Accept  ", label),
                Span::styled("[Esc]", key),
                Span::styled(" Reject", label),
            ])
        } else {
            Line::from(vec![
                Span::styled("[e]", key),
                Span::styled(" Edit  ", label),
                Span::styled("[d]", key),
                Span::styled(" Delete", label),
            ])
        }
    }
}

impl<'a> Widget for EditableContentView<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let mut text: Text<'static> = if self.state.editing {
            let style = Style::new().fg(Color::White);
            self.state
                .buffer
                .as_str()
                .split('\n')
                .map(|l| Line::from(Span::styled(l.replace('\t', "    "), style)))
                .collect::<Vec<_>>()
                .into()
        } else {
            highlight(self.content, self.language)
        };
        if text.lines.is_empty() {
            text.lines.push(Line::default());
        }
        if !self.is_streaming {
            text.lines.push(self.hint());
        }
        Paragraph::new(text).render(area, buf);

        if self.state.editing {
            let (line, column) = self.state.buffer.cursor_position();
            let x = area.x + (column as u16).min(area.width.saturating_sub(1));
            let y = area.y + line as u16;
            if y < area.bottom() {
                buf[(x, y)].set_style(Style::new().add_modifier(Modifier::REVERSED));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(state: &mut EditableContentState, event: TuiEvent, streaming: bool) -> Option<EditEvent> {
        EditableContent {
            state,
            content: "print(1)",
            is_streaming: streaming,
        }
        .handle_event(&event)
    }

    #[test]
    fn edit_then_accept_emits_new_content() {
        let mut state = EditableContentState::default();
        assert_eq!(handle(&mut state, TuiEvent::InputChar('e'), false), None);
        assert!(state.editing);
        handle(&mut state, TuiEvent::Backspace, false);
        handle(&mut state, TuiEvent::Backspace, false);
        for c in "2)".chars() {
            handle(&mut state, TuiEvent::InputChar(c), false);
        }
        assert_eq!(
            handle(&mut state, TuiEvent::Accept, false),
            Some(EditEvent::Accept("print(2)".into()))
        );
        assert!(!state.editing);
    }

    #[test]
    fn escape_rejects_edit() {
        let mut state = EditableContentState::default();
        handle(&mut state, TuiEvent::InputChar('e'), false);
        handle(&mut state, TuiEvent::InputChar('x'), false);
        assert_eq!(handle(&mut state, TuiEvent::Escape, false), Some(EditEvent::Cancel));
        assert!(!state.editing);
    }

    #[test]
    fn letters_while_editing_are_text() {
        let mut state = EditableContentState::default();
        handle(&mut state, TuiEvent::InputChar('e'), false);
        assert_eq!(handle(&mut state, TuiEvent::InputChar('d'), false), None);
        assert_eq!(state.buffer.as_str(), "print(1)d");
    }

    #[test]
    fn d_requests_delete() {
        let mut state = EditableContentState::default();
        assert_eq!(handle(&mut state, TuiEvent::InputChar('d'), false), Some(EditEvent::Delete));
    }

    #[test]
    fn streaming_ignores_everything() {
        let mut state = EditableContentState::default();
        assert_eq!(handle(&mut state, TuiEvent::InputChar('e'), true), None);
        assert!(!state.editing);
        assert_eq!(handle(&mut state, TuiEvent::InputChar('d'), true), None);
    }

    #[test]
    fn height_includes_hint_unless_streaming() {
        let state = EditableContentState::default();
        let view = |is_streaming| EditableContentView {
            state: &state,
            content: "a\nb",
            language: "sh",
            is_streaming,
        };
        assert_eq!(view(false).calculate_height(), 3);
        assert_eq!(view(true).calculate_height(), 2);
    }

    #[test]
    fn renders_hint_and_code() {
        let state = EditableContentState::default();
        let area = Rect::new(0, 0, 30, 2);
        let mut buf = Buffer::empty(area);
        EditableContentView {
            state: &state,
            content: "echo hi",
            language: "sh",
            is_streaming: false,
        }
        .render(area, &mut buf);
        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("echo hi"));
        assert!(text.contains("[e] Edit"));
    }
}
