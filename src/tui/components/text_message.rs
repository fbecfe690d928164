use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Widget};

use crate::core::chat::{Role, TextMessage};
use crate::tui::components::code_output::wrap_options;

/// Horizontal padding (per side) between the border and text content.
const CONTENT_PAD_H: u16 = 1;
/// Total horizontal space consumed by borders (1 left + 1 right) and padding.
const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Total vertical space consumed by borders (1 top + 1 bottom).
const VERTICAL_OVERHEAD: u16 = 2;

/// A stateless component that renders one prose message with role-based styling.
///
/// Created fresh each frame. Text is pre-wrapped with `textwrap` so
/// [`calculate_height`](Self::calculate_height) matches the rendered height
/// and the transcript can lay out its scroll canvas without drawing.
#[derive(Clone, Copy)]
pub struct TextMessageView<'a> {
    pub message: &'a TextMessage,
    pub role: Role,
    pub is_selected: bool,
}

impl<'a> TextMessageView<'a> {
    pub fn new(message: &'a TextMessage, role: Role, is_selected: bool) -> Self {
        Self {
            message,
            role,
            is_selected,
        }
    }

    pub fn calculate_height(message: &TextMessage, width: u16) -> u16 {
        let content_width = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if content_width == 0 {
            // Too narrow for borders + padding; still occupy a row.
            return 1;
        }
        u16::try_from(wrapped(&message.content, content_width).len())
            .unwrap_or(u16::MAX)
            .max(1)
            .saturating_add(VERTICAL_OVERHEAD)
    }
}

fn wrapped(content: &str, width: u16) -> Vec<String> {
    let content = content.trim();
    if content.is_empty() {
        return Vec::new();
    }
    textwrap::wrap(content, wrap_options(width as usize))
        .into_iter()
        .map(|l| l.into_owned())
        .collect()
}

impl<'a> Widget for TextMessageView<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (label, style) = match self.role {
            Role::User => ("you", Style::default().fg(Color::Green)),
            Role::Assistant => ("assistant", Style::default().fg(Color::Blue)),
        };
        let border_style = if self.is_selected {
            Style::default().fg(Color::Cyan)
        } else {
            style.add_modifier(Modifier::DIM)
        };

        let block = Block::bordered()
            .title(label)
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title_style(border_style)
            .padding(Padding::horizontal(CONTENT_PAD_H));
        let inner_area = block.inner(area);
        block.render(area, buf);

        let lines = wrapped(&self.message.content, inner_area.width);
        Paragraph::new(lines.join("\n")).style(style).render(inner_area, buf);
    }
}
