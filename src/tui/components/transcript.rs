//! # Transcript Component
//!
//! Scrollable view of a chat's message groups.
//!
//! ## Responsibilities
//!
//! - Lay out every message (text and code) into a `tui-scrollview` canvas
//! - Keep one `CodeMessageState` per code message (fold + editor), created
//!   the first time the message is seen
//! - Move a selection between code messages and route keys to the selected one
//! - Follow the bottom while the page's auto-scroll flag is on; a manual
//!   scroll-up clears the flag, scrolling back to the bottom sets it again
//!
//! `Transcript` is a transient component (created each frame) that wraps
//! `&'a mut TranscriptState` plus props.

use std::collections::{HashMap, HashSet};

use ratatui::Frame;
use ratatui::layout::{Alignment, Position, Rect, Size};
use ratatui::style::{Color, Style};
use ratatui::widgets::Paragraph;
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::core::chat::{Chat, CodeMessage, GroupId, Message, MessageId};
use crate::core::store::ChatStore;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::code_message::{
    CodeMessageActions, CodeMessageEvent, CodeMessageState, CodeMessageView, Controls,
};
use crate::tui::components::text_message::TextMessageView;
use crate::tui::event::TuiEvent;

/// Rows scrolled per mouse wheel notch.
const MOUSE_SCROLL_ROWS: u16 = 3;

/// The selected code message, snapshotted so the store can be borrowed mutably.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedCode {
    pub group_id: GroupId,
    pub message_id: MessageId,
    pub content: String,
    pub is_streaming: bool,
}

/// Persistent transcript state. Lives in `TuiState`.
#[derive(Default)]
pub struct TranscriptState {
    pub scroll_state: ScrollViewState,
    /// Fold/editor state per code message id.
    pub code_states: HashMap<MessageId, CodeMessageState>,
    pub selected: Option<(GroupId, MessageId)>,
    /// Last rendered (message id, top row, height), in display order.
    layout: Vec<(MessageId, u16, u16)>,
    viewport_height: u16,
}

impl TranscriptState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create state for newly seen code messages and drop state of removed ones.
    pub fn sync(&mut self, chat: &Chat, store: &dyn ChatStore) {
        let mut seen = HashSet::new();
        for (_, message) in code_messages(chat) {
            seen.insert(message.to_string());
            if !self.code_states.contains_key(message) {
                self.code_states
                    .insert(message.to_string(), CodeMessageState::mount(store));
            }
        }
        self.code_states.retain(|id, _| seen.contains(id));
        if let Some((_, m)) = &self.selected
            && !seen.contains(m)
        {
            self.selected = None;
        }
    }

    /// Whether the selected code message has its editor open.
    pub fn is_editing(&self) -> bool {
        self.selected
            .as_ref()
            .and_then(|(_, m)| self.code_states.get(m))
            .is_some_and(|s| s.editor.editing)
    }

    /// Snapshot of the selected code message, if any.
    pub fn selected_code(
        &self,
        chat: &Chat,
        is_streaming: impl Fn(&str, &str) -> bool,
    ) -> Option<SelectedCode> {
        let (g, m) = self.selected.as_ref()?;
        let code = chat.code_message(g, m)?;
        Some(SelectedCode {
            group_id: g.clone(),
            message_id: m.clone(),
            content: code.content.clone(),
            is_streaming: is_streaming(g, m),
        })
    }

    /// Move the selection to the previous (`-1`) or next (`1`) code message.
    pub fn move_selection(&mut self, chat: &Chat, direction: i32) {
        let keys: Vec<(&str, &str)> = code_messages(chat).collect();
        if keys.is_empty() {
            self.selected = None;
            return;
        }
        let current = self.selected.as_ref().and_then(|(g, m)| {
            keys.iter()
                .position(|(kg, km)| *kg == g.as_str() && *km == m.as_str())
        });
        let next = match (current, direction < 0) {
            (None, _) => keys.len() - 1,
            (Some(i), true) => i.saturating_sub(1),
            (Some(i), false) => (i + 1).min(keys.len() - 1),
        };
        let (g, m) = keys[next];
        self.selected = Some((g.to_string(), m.to_string()));
        self.scroll_to_selected();
    }

    /// Route a key to the selected code message.
    pub fn handle_code_event(
        &mut self,
        event: &TuiEvent,
        target: SelectedCode,
        store: &mut dyn ChatStore,
    ) -> Option<CodeMessageEvent> {
        let state = self.code_states.get_mut(&target.message_id)?;
        let event = CodeMessageActions {
            group_id: &target.group_id,
            message_id: &target.message_id,
            content: &target.content,
            is_streaming: target.is_streaming,
            state,
            store,
        }
        .handle_event(event)?;
        if event == CodeMessageEvent::Deleted {
            self.selected = None;
        }
        Some(event)
    }

    /// Wheel and page scrolling. Returns true if the event was consumed.
    pub fn handle_scroll(&mut self, event: &TuiEvent, auto_scrolling: &mut bool) -> bool {
        match event {
            TuiEvent::MouseScrollUp => {
                for _ in 0..MOUSE_SCROLL_ROWS {
                    self.scroll_state.scroll_up();
                }
                *auto_scrolling = false;
            }
            TuiEvent::ScrollPageUp => {
                self.scroll_state.scroll_page_up();
                *auto_scrolling = false;
            }
            TuiEvent::MouseScrollDown => {
                for _ in 0..MOUSE_SCROLL_ROWS {
                    self.scroll_state.scroll_down();
                }
                self.repin_if_at_bottom(auto_scrolling);
            }
            TuiEvent::ScrollPageDown => {
                self.scroll_state.scroll_page_down();
                self.repin_if_at_bottom(auto_scrolling);
            }
            _ => return false,
        }
        true
    }

    fn total_height(&self) -> u16 {
        self.layout
            .last()
            .map(|(_, top, height)| top + height)
            .unwrap_or(0)
    }

    fn max_offset(&self) -> u16 {
        self.total_height().saturating_sub(self.viewport_height)
    }

    fn clamp_scroll(&mut self) {
        let max_y = self.max_offset();
        let current = self.scroll_state.offset();
        if current.y > max_y {
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// Re-engage following once the user has scrolled back to the bottom.
    fn repin_if_at_bottom(&mut self, auto_scrolling: &mut bool) {
        let max_y = self.max_offset();
        let current = self.scroll_state.offset();
        if current.y >= max_y {
            *auto_scrolling = true;
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// Scroll so the selected message is visible, aligning its top edge if
    /// it is taller than the viewport.
    fn scroll_to_selected(&mut self) {
        let Some((_, selected)) = &self.selected else {
            return;
        };
        let Some(&(_, top, height)) = self.layout.iter().find(|(id, _, _)| id == selected) else {
            return;
        };
        let offset = self.scroll_state.offset().y;
        let bottom = top + height;
        if top < offset || height > self.viewport_height {
            self.scroll_state.set_offset(Position { x: 0, y: top });
        } else if bottom > offset + self.viewport_height {
            self.scroll_state.set_offset(Position {
                x: 0,
                y: bottom.saturating_sub(self.viewport_height),
            });
        }
    }
}

/// (group id, message id) of every code message in display order.
fn code_messages(chat: &Chat) -> impl Iterator<Item = (&str, &str)> {
    chat.message_groups.iter().flat_map(|g| {
        g.messages.iter().filter_map(move |m| match m {
            Message::Code(c) => Some((g.id.as_str(), c.id.as_str())),
            Message::Text(_) => None,
        })
    })
}

/// Scrollable chat view. Created fresh each frame.
pub struct Transcript<'a> {
    pub state: &'a mut TranscriptState,
    pub chat: &'a Chat,
    pub store: &'a dyn ChatStore,
    pub running: &'a HashSet<(GroupId, MessageId)>,
    /// Page-owned auto-scroll flag.
    pub auto_scrolling: &'a mut bool,
    pub focused: bool,
    pub spinner_frame: usize,
}

impl<'a> Transcript<'a> {
    fn is_streaming(&self, group_id: &str, message_id: &str) -> bool {
        self.running
            .contains(&(group_id.to_string(), message_id.to_string()))
    }

    /// View for one code message. Used for both measuring and drawing so the
    /// two always agree on height.
    fn code_view<'s>(
        &'s self,
        group_id: &str,
        code: &'s CodeMessage,
        fallback: &'s CodeMessageState,
        is_selected: bool,
    ) -> CodeMessageView<'s> {
        let state = self.state.code_states.get(&code.id).unwrap_or(fallback);
        let is_streaming = self.is_streaming(group_id, &code.id);
        let controls = Controls::resolve(
            state.folded,
            is_streaming,
            self.store.is_viable_for_running_code(group_id, &code.id),
            self.store.always_execute_code(),
        );
        CodeMessageView {
            message: code,
            state,
            is_streaming,
            controls,
            is_selected,
            spinner_frame: self.spinner_frame,
        }
    }
}

impl<'a> Component for Transcript<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        self.state.viewport_height = area.height;

        if self.chat.is_empty() {
            self.state.layout.clear();
            let hint = Paragraph::new("No messages yet. Type below and press Enter.")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center);
            frame.render_widget(hint, area);
            return;
        }

        let content_width = area.width.saturating_sub(1); // -1 for scrollbar safe area
        let default_state = CodeMessageState::default();

        // 1. Measure
        let mut layout = Vec::new();
        let mut y: u16 = 0;
        for group in &self.chat.message_groups {
            for message in &group.messages {
                let height = match message {
                    Message::Text(text) => TextMessageView::calculate_height(text, content_width),
                    Message::Code(code) => self
                        .code_view(&group.id, code, &default_state, false)
                        .calculate_height(content_width),
                };
                layout.push((message.id().to_string(), y, height));
                y = y.saturating_add(height);
            }
        }
        self.state.layout = layout;

        // 2. Scroll position
        if *self.auto_scrolling {
            self.state.scroll_state.scroll_to_bottom();
        } else {
            self.state.clamp_scroll();
        }

        // 3. Draw
        let mut scroll_view = ScrollView::new(Size::new(content_width, y))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Automatic)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        let selected = self.state.selected.as_ref().map(|(_, m)| m.as_str());
        let mut rows = self.state.layout.iter();
        for group in &self.chat.message_groups {
            for message in &group.messages {
                let Some(&(_, top, height)) = rows.next() else {
                    break;
                };
                let rect = Rect::new(0, top, content_width, height);
                let is_selected = self.focused && selected == Some(message.id());
                match message {
                    Message::Text(text) => {
                        scroll_view.render_widget(
                            TextMessageView::new(text, group.role, is_selected),
                            rect,
                        );
                    }
                    Message::Code(code) => {
                        scroll_view.render_widget(
                            self.code_view(&group.id, code, &default_state, is_selected),
                            rect,
                        );
                    }
                }
            }
        }

        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chat::{MessageGroup, Role};
    use crate::test_support::RecordingStore;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn chat_with(n_code: usize) -> Chat {
        let mut chat = Chat::new("c");
        let mut messages = vec![Message::text("intro")];
        for i in 0..n_code {
            messages.push(Message::code("sh", format!("echo {i}")));
        }
        chat.message_groups.push(MessageGroup::new(Role::User, messages));
        chat
    }

    fn draw(state: &mut TranscriptState, chat: &Chat, auto: &mut bool, height: u16) -> String {
        let store = RecordingStore::viable();
        let running = HashSet::new();
        let mut terminal = Terminal::new(TestBackend::new(50, height)).unwrap();
        terminal
            .draw(|f| {
                Transcript {
                    state: &mut *state,
                    chat,
                    store: &store,
                    running: &running,
                    auto_scrolling: &mut *auto,
                    focused: true,
                    spinner_frame: 0,
                }
                .render(f, f.area());
            })
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn sync_mounts_and_prunes_code_states() {
        let mut chat = chat_with(2);
        let mut state = TranscriptState::new();
        let store = RecordingStore {
            always_execute_code: true,
            ..Default::default()
        };
        state.sync(&chat, &store);
        assert_eq!(state.code_states.len(), 2);
        assert!(state.code_states.values().all(|s| s.folded));

        let (g, m) = {
            let (g, m) = code_messages(&chat).next().unwrap();
            (g.to_string(), m.to_string())
        };
        chat.remove_message(&g, &m);
        state.sync(&chat, &store);
        assert_eq!(state.code_states.len(), 1);
        assert!(!state.code_states.contains_key(&m));
    }

    #[test]
    fn selection_walks_code_messages_only() {
        let chat = chat_with(2);
        let mut state = TranscriptState::new();
        state.move_selection(&chat, -1);
        let last = state.selected.clone().unwrap();
        state.move_selection(&chat, -1);
        let first = state.selected.clone().unwrap();
        assert_ne!(first, last);
        state.move_selection(&chat, -1);
        assert_eq!(state.selected.clone().unwrap(), first);
        state.move_selection(&chat, 1);
        assert_eq!(state.selected.unwrap(), last);
    }

    #[test]
    fn selected_code_snapshots_content() {
        let chat = chat_with(1);
        let mut state = TranscriptState::new();
        state.move_selection(&chat, 1);
        let target = state.selected_code(&chat, |_, _| true).unwrap();
        assert_eq!(target.content, "echo 0");
        assert!(target.is_streaming);
    }

    #[test]
    fn scroll_up_clears_auto_scroll() {
        let mut state = TranscriptState::new();
        let mut auto = true;
        assert!(state.handle_scroll(&TuiEvent::MouseScrollUp, &mut auto));
        assert!(!auto);
        auto = true;
        assert!(state.handle_scroll(&TuiEvent::ScrollPageUp, &mut auto));
        assert!(!auto);
        assert!(!state.handle_scroll(&TuiEvent::InputChar('x'), &mut auto));
        assert!(!state.handle_scroll(&TuiEvent::CursorEnd, &mut auto));
    }

    #[test]
    fn scrolling_down_to_bottom_repins() {
        let chat = chat_with(6);
        let mut state = TranscriptState::new();
        let mut auto = false;
        draw(&mut state, &chat, &mut auto, 10);
        for _ in 0..200 {
            state.handle_scroll(&TuiEvent::MouseScrollDown, &mut auto);
        }
        assert!(auto);
    }

    #[test]
    fn auto_scrolling_shows_latest_message() {
        let chat = chat_with(6);
        let mut state = TranscriptState::new();
        let store = RecordingStore::viable();
        state.sync(&chat, &store);
        let mut auto = true;
        let text = draw(&mut state, &chat, &mut auto, 10);
        assert!(text.contains("echo 5"));
        assert!(!text.contains("intro"));
    }

    #[test]
    fn without_auto_scrolling_top_stays_visible() {
        let chat = chat_with(6);
        let mut state = TranscriptState::new();
        let mut auto = false;
        let text = draw(&mut state, &chat, &mut auto, 10);
        assert!(text.contains("intro"));
    }

    #[test]
    fn empty_chat_shows_hint() {
        let chat = Chat::new("empty");
        let mut state = TranscriptState::new();
        let mut auto = false;
        let text = draw(&mut state, &chat, &mut auto, 5);
        assert!(text.contains("No messages yet"));
    }
}
