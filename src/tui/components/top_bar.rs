//! # TopBar Component
//!
//! One-line status bar above the transcript.
//!
//! ```text
//! codeconsole │ Fix the parser │ Running 1 │ project: ~/work/demo │ ● always run
//! ```
//!
//! Stateless: every field is a prop copied from `App` or the project
//! manager each frame. Segments are dropped from the right when the
//! terminal is too narrow.

use std::path::PathBuf;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::tui::component::Component;

pub struct TopBar {
    pub chat_title: String,
    pub status_message: String,
    pub project_dir: Option<PathBuf>,
    pub always_execute_code: bool,
}

impl TopBar {
    pub fn new(
        chat_title: String,
        status_message: String,
        project_dir: Option<PathBuf>,
        always_execute_code: bool,
    ) -> Self {
        Self {
            chat_title,
            status_message,
            project_dir,
            always_execute_code,
        }
    }

    fn segments(&self) -> Vec<Span<'static>> {
        let separator = || Span::styled(" │ ", Style::default().fg(Color::DarkGray));
        let mut spans = vec![Span::styled(
            "codeconsole",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )];

        spans.push(separator());
        spans.push(Span::raw(self.chat_title.clone()));

        if !self.status_message.is_empty() {
            spans.push(separator());
            spans.push(Span::styled(
                self.status_message.clone(),
                Style::default().fg(Color::Yellow),
            ));
        }

        let project = match &self.project_dir {
            Some(dir) => format!("project: {}", dir.display()),
            None => String::from("no project"),
        };
        spans.push(separator());
        spans.push(Span::styled(project, Style::default().fg(Color::Gray)));

        if self.always_execute_code {
            spans.push(separator());
            spans.push(Span::styled("● always run", Style::default().fg(Color::Green)));
        }
        spans
    }
}

impl Component for TopBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let mut spans = self.segments();
        // Drop trailing segment pairs until the line fits.
        while spans.len() > 1 && Line::from(spans.clone()).width() > area.width as usize {
            spans.truncate(spans.len() - 2);
        }
        frame.render_widget(Line::from(spans), area);
    }
}
