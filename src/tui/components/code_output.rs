//! # CodeOutput Component
//!
//! Renders one [`OutputRecord`] of a code message:
//!
//! ```text
//! ┆ stdout
//! ┆ hello
//! ┆ world
//! ```
//!
//! Stateless and created per frame. Lines are pre-wrapped with `textwrap` so
//! [`CodeOutput::calculate_height`] always matches what `render` draws.
//! Payloads longer than [`MAX_OUTPUT_LINES`] display lines end in a
//! `… +N more lines` tail.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget};

use crate::core::chat::{OutputKind, OutputRecord};

/// Gutter drawn left of every output line.
const GUTTER: &str = "┆ ";
const GUTTER_WIDTH: u16 = 2;
/// Display lines per record, tail included.
pub const MAX_OUTPUT_LINES: usize = 200;

pub struct CodeOutput<'a> {
    pub output: &'a OutputRecord,
    /// Payload may still grow; drawn with a trailing cursor.
    pub is_streaming: bool,
}

impl<'a> CodeOutput<'a> {
    pub fn new(output: &'a OutputRecord, is_streaming: bool) -> Self {
        Self {
            output,
            is_streaming,
        }
    }

    /// Label line plus wrapped payload lines.
    pub fn calculate_height(output: &OutputRecord, width: u16) -> u16 {
        let payload = payload_lines(&output.payload, width);
        let rows = payload.body.len() + usize::from(payload.hidden.is_some());
        u16::try_from(rows).unwrap_or(u16::MAX).saturating_add(1)
    }

    fn style(kind: OutputKind) -> Style {
        match kind {
            OutputKind::Stdout => Style::new().fg(Color::White),
            OutputKind::Stderr => Style::new().fg(Color::Yellow),
            OutputKind::Result => Style::new().fg(Color::Green),
            OutputKind::Error => Style::new().fg(Color::Red),
        }
    }
}

impl<'a> Widget for CodeOutput<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let style = Self::style(self.output.kind);
        let gutter = Span::styled(GUTTER, Style::new().fg(Color::DarkGray));

        let mut lines = vec![Line::from(vec![
            gutter.clone(),
            Span::styled(
                self.output.kind.label(),
                style.add_modifier(Modifier::DIM | Modifier::ITALIC),
            ),
        ])];
        let payload = payload_lines(&self.output.payload, area.width);
        let last = payload.body.len().saturating_sub(1);
        for (i, text) in payload.body.into_iter().enumerate() {
            let mut spans = vec![gutter.clone(), Span::styled(text, style)];
            if self.is_streaming && i == last && payload.hidden.is_none() {
                spans.push(Span::styled("▌", style.add_modifier(Modifier::DIM)));
            }
            lines.push(Line::from(spans));
        }
        if let Some(hidden) = payload.hidden {
            lines.push(Line::from(vec![
                gutter,
                Span::styled(
                    format!("… +{hidden} more lines"),
                    Style::new().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                ),
            ]));
        }

        Paragraph::new(lines).render(area, buf);
    }
}

struct PayloadLines {
    body: Vec<String>,
    /// Source lines left out after the cap.
    hidden: Option<usize>,
}

/// Payload split into display lines that fit `width` after the gutter,
/// capped at [`MAX_OUTPUT_LINES`].
fn payload_lines(payload: &str, width: u16) -> PayloadLines {
    let content_width = width.saturating_sub(GUTTER_WIDTH).max(1) as usize;
    let payload = payload.trim_end_matches('\n');
    if payload.is_empty() {
        return PayloadLines {
            body: vec![String::new()],
            hidden: None,
        };
    }

    let source: Vec<&str> = payload.lines().collect();
    let mut body: Vec<(usize, String)> = Vec::new();
    for (index, line) in source.iter().enumerate() {
        let line = line.replace('\t', "    ");
        if line.is_empty() {
            body.push((index, String::new()));
        } else {
            body.extend(
                textwrap::wrap(&line, wrap_options(content_width))
                    .into_iter()
                    .map(|l| (index, l.into_owned())),
            );
        }
        if body.len() > MAX_OUTPUT_LINES {
            break;
        }
    }

    if body.len() <= MAX_OUTPUT_LINES {
        return PayloadLines {
            body: body.into_iter().map(|(_, l)| l).collect(),
            hidden: None,
        };
    }
    body.truncate(MAX_OUTPUT_LINES - 1);
    let shown = body.last().map_or(0, |(index, _)| index + 1);
    PayloadLines {
        body: body.into_iter().map(|(_, l)| l).collect(),
        hidden: Some(source.len() - shown),
    }
}

/// Greedy wrapping, so a prefix of a line wraps the same way as the line.
pub(crate) fn wrap_options(width: usize) -> textwrap::Options<'static> {
    textwrap::Options::new(width)
        .break_words(true)
        .word_separator(textwrap::WordSeparator::AsciiSpace)
        .wrap_algorithm(textwrap::WrapAlgorithm::FirstFit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_to_string(output: &OutputRecord, width: u16) -> String {
        let height = CodeOutput::calculate_height(output, width);
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        CodeOutput::new(output, false).render(area, &mut buf);
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn height_counts_label_and_lines() {
        let output = OutputRecord::new(OutputKind::Stdout, "one\ntwo\n");
        assert_eq!(CodeOutput::calculate_height(&output, 40), 3);
    }

    #[test]
    fn long_lines_wrap() {
        let output = OutputRecord::new(OutputKind::Stdout, "x".repeat(25));
        // 10 columns minus the gutter leaves 8 per line: 8 + 8 + 8 + 1
        assert_eq!(CodeOutput::calculate_height(&output, 10), 1 + 4);
    }

    #[test]
    fn empty_payload_keeps_one_line() {
        let output = OutputRecord::new(OutputKind::Result, "");
        assert_eq!(CodeOutput::calculate_height(&output, 40), 2);
    }

    #[test]
    fn huge_payload_is_capped_with_tail() {
        let payload: String = (1..=70_000).map(|n| format!("{n}\n")).collect();
        let output = OutputRecord::new(OutputKind::Stdout, payload);
        assert_eq!(
            CodeOutput::calculate_height(&output, 40),
            1 + MAX_OUTPUT_LINES as u16
        );

        let lines = payload_lines(&output.payload, 40);
        assert_eq!(lines.body.len(), MAX_OUTPUT_LINES - 1);
        assert_eq!(lines.hidden, Some(70_000 - (MAX_OUTPUT_LINES - 1)));
    }

    #[test]
    fn capped_output_renders_tail() {
        let payload: String = (1..=500).map(|n| format!("line {n}\n")).collect();
        let output = OutputRecord::new(OutputKind::Stdout, payload);
        let text = render_to_string(&output, 40);
        assert!(text.contains("line 1"));
        assert!(text.contains(&format!("… +{} more lines", 500 - (MAX_OUTPUT_LINES - 1))));
        assert!(!text.contains("line 500"));
    }

    #[test]
    fn renders_label_and_payload() {
        let output = OutputRecord::new(OutputKind::Error, "Process exited with 1");
        let text = render_to_string(&output, 40);
        assert!(text.contains("error"));
        assert!(text.contains("Process exited with 1"));
    }

    #[test]
    fn kinds_get_distinct_colors() {
        assert_eq!(CodeOutput::style(OutputKind::Error).fg, Some(Color::Red));
        assert_eq!(CodeOutput::style(OutputKind::Stderr).fg, Some(Color::Yellow));
        assert_ne!(
            CodeOutput::style(OutputKind::Stdout),
            CodeOutput::style(OutputKind::Result)
        );
    }
}
