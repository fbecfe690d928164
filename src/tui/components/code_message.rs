//! # CodeMessage Component
//!
//! A code message inside a transcript group.
//!
//! **Folded**:
//!   `╭─ python ─────────────────╮`
//!   `│ Check the code         ▼ │`
//!   `╰──────────────────────────╯`
//!
//! **Unfolded** (run controls only when eligible, outputs in arrival order):
//!   `╭─ python ─────────────────╮`
//!   `│ Hide the code          ▲ │`
//!   `│ Code:                    │`
//!   `│ print("hi")              │`
//!   `│ [e] Edit  [d] Delete     │`
//!   `│ [r] Run  [a] Always Run  │`
//!   `│ ┆ stdout                 │`
//!   `│ ┆ hi                     │`
//!   `╰──────────────────────────╯`
//!
//! While a run streams into the message the header reads `⠋ Working ...` and
//! the run controls disappear.
//!
//! The component never touches the chat directly. Commands go through the
//! injected [`ChatStore`]; their results come back as changed chat data on
//! the next frame.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Widget};

use log::debug;

use crate::core::chat::CodeMessage;
use crate::core::store::ChatStore;
use crate::tui::component::EventHandler;
use crate::tui::components::code_output::CodeOutput;
use crate::tui::components::editable_content::{
    EditEvent, EditableContent, EditableContentState, EditableContentView,
};
use crate::tui::event::TuiEvent;

/// Horizontal padding (per side) inside the bordered view.
const CONTENT_PAD_H: u16 = 1;
/// Total horizontal overhead: borders (2) + padding (2 × CONTENT_PAD_H).
const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Top + bottom border.
const VERTICAL_OVERHEAD: u16 = 2;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Per-message presentation state, kept in TUI state keyed by message id.
#[derive(Debug, Default)]
pub struct CodeMessageState {
    pub folded: bool,
    pub editor: EditableContentState,
}

impl CodeMessageState {
    /// State for a message shown for the first time. Starts folded when the
    /// "always execute code" preference is already on.
    pub fn mount(store: &dyn ChatStore) -> Self {
        Self {
            folded: store.always_execute_code(),
            editor: EditableContentState::default(),
        }
    }
}

/// Which run affordances are offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controls {
    pub run: bool,
    pub always_run: bool,
}

impl Controls {
    pub fn resolve(
        folded: bool,
        is_streaming: bool,
        is_viable: bool,
        always_execute_code: bool,
    ) -> Self {
        let run = !folded && !is_streaming && is_viable;
        Self {
            run,
            always_run: run && !always_execute_code,
        }
    }

    fn any(&self) -> bool {
        self.run || self.always_run
    }
}

// ─── Rendering ───────────────────────────────────────────────────────

pub struct CodeMessageView<'a> {
    pub message: &'a CodeMessage,
    pub state: &'a CodeMessageState,
    pub is_streaming: bool,
    pub controls: Controls,
    pub is_selected: bool,
    pub spinner_frame: usize,
}

impl<'a> CodeMessageView<'a> {
    fn editable(&self) -> EditableContentView<'_> {
        EditableContentView {
            state: &self.state.editor,
            content: &self.message.content,
            language: &self.message.language,
            is_streaming: self.is_streaming,
        }
    }

    pub fn calculate_height(&self, width: u16) -> u16 {
        let inner_width = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if inner_width == 0 {
            return 1;
        }
        let mut height = VERTICAL_OVERHEAD + 1;
        if !self.state.folded {
            height = height
                .saturating_add(1)
                .saturating_add(self.editable().calculate_height());
            if self.controls.any() {
                height = height.saturating_add(1);
            }
            height = self
                .message
                .outputs
                .iter()
                .map(|o| CodeOutput::calculate_height(o, inner_width))
                .fold(height, u16::saturating_add);
        }
        height
    }

    fn header(&self) -> Line<'static> {
        let arrow = if self.state.folded { "▼" } else { "▲" };
        let text = if self.is_streaming {
            let frame = SPINNER[self.spinner_frame % SPINNER.len()];
            format!("{frame} Working ...")
        } else if self.state.folded {
            String::from("Check the code")
        } else {
            String::from("Hide the code")
        };
        Line::from(vec![
            Span::styled(text, Style::new().fg(Color::White)),
            Span::raw(" "),
            Span::styled(arrow, Style::new().fg(Color::DarkGray)),
        ])
    }

    fn controls_line(&self) -> Line<'static> {
        let key = Style::new().fg(Color::Green).add_modifier(Modifier::BOLD);
        let label = Style::new().fg(Color::Green);
        let mut spans = Vec::new();
        if self.controls.run {
            spans.push(Span::styled("[r]", key));
            spans.push(Span::styled(" Run", label));
        }
        if self.controls.always_run {
            spans.push(Span::styled("  [a]", key));
            spans.push(Span::styled(" Always Run", label.add_modifier(Modifier::DIM)));
        }
        Line::from(spans)
    }
}

impl<'a> Widget for CodeMessageView<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let border_style = if self.is_selected {
            Style::new().fg(Color::Cyan)
        } else {
            Style::new().fg(Color::DarkGray)
        };
        let block = Block::bordered()
            .title(format!(" {} ", self.message.language))
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title_style(border_style)
            .padding(Padding::horizontal(CONTENT_PAD_H));
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let mut y = inner.y;
        let mut next_row = |height: u16| {
            let rect = Rect::new(inner.x, y, inner.width, height).intersection(inner);
            y = y.saturating_add(height);
            rect
        };

        Paragraph::new(self.header()).render(next_row(1), buf);
        if self.state.folded {
            return;
        }

        Paragraph::new(Line::styled("Code:", Style::new().fg(Color::DarkGray)))
            .render(next_row(1), buf);
        let editable = self.editable();
        let editable_height = editable.calculate_height();
        editable.render(next_row(editable_height), buf);

        if self.controls.any() {
            Paragraph::new(self.controls_line()).render(next_row(1), buf);
        }

        for output in &self.message.outputs {
            let height = CodeOutput::calculate_height(output, inner.width);
            CodeOutput::new(output, self.is_streaming).render(next_row(height), buf);
        }
    }
}

// ─── Commands ────────────────────────────────────────────────────────

/// What a handled key did, for the owner to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum CodeMessageEvent {
    Toggled,
    RunRequested,
    Edited,
    Deleted,
}

/// Event side of the component. Created per key press with the message's
/// ids, its current content, and the store to command.
pub struct CodeMessageActions<'a> {
    pub group_id: &'a str,
    pub message_id: &'a str,
    pub content: &'a str,
    pub is_streaming: bool,
    pub state: &'a mut CodeMessageState,
    pub store: &'a mut dyn ChatStore,
}

impl<'a> CodeMessageActions<'a> {
    pub fn controls(&self) -> Controls {
        Controls::resolve(
            self.state.folded,
            self.is_streaming,
            self.store
                .is_viable_for_running_code(self.group_id, self.message_id),
            self.store.always_execute_code(),
        )
    }

    pub fn toggle_fold(&mut self) {
        self.state.folded = !self.state.folded;
    }

    /// Run, if the run control is offered.
    pub fn run(&mut self) -> bool {
        if !self.controls().run {
            return false;
        }
        self.store.do_run(self.group_id, self.message_id);
        true
    }

    /// Turn on "always run" and run, if that control is offered.
    pub fn always_run(&mut self) -> bool {
        if !self.controls().always_run {
            return false;
        }
        self.store.enable_auto_code_execution();
        self.store.do_run(self.group_id, self.message_id);
        true
    }

    pub fn accept_edit(&mut self, content: String) {
        self.store
            .edit_message_content(self.group_id, self.message_id, content);
    }

    pub fn delete(&mut self) {
        self.store
            .remove_message_from_group(self.group_id, self.message_id);
    }
}

impl<'a> EventHandler for CodeMessageActions<'a> {
    type Event = CodeMessageEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<CodeMessageEvent> {
        // An open editor owns the keyboard.
        if !self.state.editor.editing {
            match event {
                TuiEvent::InputChar(' ') | TuiEvent::Enter => {
                    self.toggle_fold();
                    return Some(CodeMessageEvent::Toggled);
                }
                TuiEvent::InputChar('r') => {
                    return self.run().then_some(CodeMessageEvent::RunRequested);
                }
                TuiEvent::InputChar('a') => {
                    return self.always_run().then_some(CodeMessageEvent::RunRequested);
                }
                _ => {}
            }
        }

        // The editor is only on screen when unfolded.
        if self.state.folded {
            return None;
        }
        let edit_event = EditableContent {
            state: &mut self.state.editor,
            content: self.content,
            is_streaming: self.is_streaming,
        }
        .handle_event(event)?;

        debug!("Code message {} edit event: {:?}", self.message_id, edit_event);
        match edit_event {
            EditEvent::Accept(content) => {
                self.accept_edit(content);
                Some(CodeMessageEvent::Edited)
            }
            EditEvent::Cancel => None,
            EditEvent::Delete => {
                self.delete();
                Some(CodeMessageEvent::Deleted)
            }
        }
    }
}
