//! # SideBar Component
//!
//! Left-hand list of saved chats, newest first.
//!
//! Keys while focused: Up/Down select, Enter opens, `n` starts a new chat,
//! `d` twice deletes the selected chat.
//!
//! Follows the persistent state + transient wrapper pattern:
//! - `SideBarState` lives in `TuiState`
//! - `SideBar` is created each frame with borrowed state

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, List, ListItem, ListState, Padding, Paragraph};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::core::chats::ChatHeadline;
use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

pub struct SideBarState {
    pub chats: Vec<ChatHeadline>,
    pub selected: usize,
    pub confirm_delete: bool,
    pub list_state: ListState,
}

impl SideBarState {
    pub fn new(chats: Vec<ChatHeadline>) -> Self {
        let mut state = Self {
            chats: Vec::new(),
            selected: 0,
            confirm_delete: false,
            list_state: ListState::default(),
        };
        state.set_chats(chats);
        state
    }

    /// Replace the list (after a save or delete), keeping the selection in range.
    pub fn set_chats(&mut self, chats: Vec<ChatHeadline>) {
        self.chats = chats;
        if self.chats.is_empty() {
            self.selected = 0;
            self.list_state.select(None);
        } else {
            self.selected = self.selected.min(self.chats.len() - 1);
            self.list_state.select(Some(self.selected));
        }
    }

    fn select(&mut self, index: usize) {
        self.selected = index;
        self.list_state.select(Some(index));
    }
}

/// Events emitted by the side bar.
#[derive(Debug, Clone, PartialEq)]
pub enum SideBarEvent {
    Open(String),
    CreateNew,
    Delete(String),
}

/// Transient wrapper for the side bar.
pub struct SideBar<'a> {
    pub state: &'a mut SideBarState,
    /// Id of the chat currently open, marked in the list.
    pub current_chat_id: Option<&'a str>,
    pub focused: bool,
}

impl<'a> EventHandler for SideBar<'a> {
    type Event = SideBarEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<SideBarEvent> {
        let state = &mut *self.state;
        if !matches!(event, TuiEvent::InputChar('d')) {
            state.confirm_delete = false;
        }

        match event {
            TuiEvent::CursorUp => {
                if !state.chats.is_empty() {
                    state.select(state.selected.saturating_sub(1));
                }
                None
            }
            TuiEvent::CursorDown => {
                if !state.chats.is_empty() {
                    state.select((state.selected + 1).min(state.chats.len() - 1));
                }
                None
            }
            TuiEvent::Enter => state
                .chats
                .get(state.selected)
                .map(|chat| SideBarEvent::Open(chat.id.clone())),
            TuiEvent::InputChar('n') => Some(SideBarEvent::CreateNew),
            TuiEvent::InputChar('d') => {
                let id = state.chats.get(state.selected)?.id.clone();
                if state.confirm_delete {
                    state.confirm_delete = false;
                    Some(SideBarEvent::Delete(id))
                } else {
                    state.confirm_delete = true;
                    None
                }
            }
            _ => None,
        }
    }
}

impl<'a> Component for SideBar<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let help = if self.state.confirm_delete {
            " d again to delete "
        } else {
            " n new  d del "
        };
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title(" Chats ")
            .title_bottom(Line::from(help).centered())
            .padding(Padding::horizontal(1));

        if self.state.chats.is_empty() {
            let empty = Paragraph::new("No saved chats.")
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            frame.render_widget(empty, area);
            return;
        }

        let inner_width = block.inner(area).width as usize;
        let items: Vec<ListItem> = self
            .state
            .chats
            .iter()
            .enumerate()
            .map(|(i, chat)| {
                let is_current = self.current_chat_id == Some(chat.id.as_str());
                let marker = if is_current { "● " } else { "  " };
                let title_width = inner_width.saturating_sub(marker.width());
                let meta = format!(
                    "  {} · {} groups",
                    format_timestamp(chat.last_modified),
                    chat.group_count
                );

                let style = if self.focused && i == self.state.selected {
                    let fg = if self.state.confirm_delete {
                        Color::Red
                    } else {
                        Color::White
                    };
                    Style::default()
                        .fg(fg)
                        .add_modifier(Modifier::BOLD | Modifier::REVERSED)
                } else {
                    Style::default().fg(Color::Gray)
                };

                ListItem::new(vec![
                    Line::from(vec![
                        Span::styled(marker, Style::default().fg(Color::Green)),
                        Span::styled(truncate_str(&chat.title, title_width), style),
                    ]),
                    Line::styled(
                        truncate_str(&meta, inner_width),
                        Style::default().fg(Color::DarkGray),
                    ),
                ])
            })
            .collect();

        frame.render_stateful_widget(List::new(items).block(block), area, &mut self.state.list_state);
    }
}

/// Format a Unix timestamp as "Jan 15" style date.
fn format_timestamp(ts: i64) -> String {
    use chrono::{DateTime, Local, Utc};
    let dt: DateTime<Local> = DateTime::<Utc>::from_timestamp(ts, 0)
        .unwrap_or_default()
        .with_timezone(&Local);
    dt.format("%b %d").to_string()
}

/// Truncate to `max_width` display columns, ending in "…" when cut.
fn truncate_str(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    if max_width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut width = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if width + w > max_width - 1 {
            break;
        }
        width += w;
        out.push(ch);
    }
    out.push('…');
    out
}
