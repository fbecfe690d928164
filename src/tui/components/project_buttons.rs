//! # ProjectButtons Component
//!
//! "New Project" / "Open Project" triggers plus their confirmation dialogs.
//!
//! The triggers are a hint line (`[Ctrl+N] New Project  [Ctrl+O] Open
//! Project`). All decisions are delegated to [`ProjectFileManager`]; this
//! component only maps keys onto it and draws whichever dialog the manager
//! reports as visible.
//!
//! While a dialog is visible it captures every key: `y`/Enter confirms,
//! `n`/Esc cancels, anything else is swallowed.

use std::path::PathBuf;

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Clear, Padding, Paragraph, Wrap};

use crate::core::project::{ProjectFileManager, ProjectFs};
use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

pub const NEW_PROJECT_DIALOG_TITLE: &str =
    "This folder already contains a project, do you want to open it instead?";
pub const OPEN_PROJECT_DIALOG_TITLE: &str =
    "There is no project in this directory, do you want to create one there instead?";

#[derive(Debug, Clone, PartialEq)]
pub enum ProjectEvent {
    /// A project became active.
    Switched(PathBuf),
    /// A dialog was dismissed without switching.
    Cancelled,
}

pub struct ProjectButtons<'a, F: ProjectFs> {
    pub manager: &'a mut ProjectFileManager<F>,
}

impl<'a, F: ProjectFs> ProjectButtons<'a, F> {
    pub fn new(manager: &'a mut ProjectFileManager<F>) -> Self {
        Self { manager }
    }

    pub fn dialog_visible(&self) -> bool {
        self.manager.new_project_dialog_visible() || self.manager.open_project_dialog_visible()
    }

    fn dialog_title(&self) -> Option<&'static str> {
        if self.manager.new_project_dialog_visible() {
            Some(NEW_PROJECT_DIALOG_TITLE)
        } else if self.manager.open_project_dialog_visible() {
            Some(OPEN_PROJECT_DIALOG_TITLE)
        } else {
            None
        }
    }

    /// Draw the visible dialog, if any, centered over `area`.
    pub fn render_dialog(&self, frame: &mut Frame, area: Rect) {
        let Some(title) = self.dialog_title() else {
            return;
        };
        let dialog = centered_rect(60, 30, area);
        frame.render_widget(Clear, dialog);

        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Project ")
            .padding(Padding::uniform(1));

        let key = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
        let text = vec![
            Line::from(title),
            Line::default(),
            Line::from(vec![
                Span::styled("[y] Yes", key),
                Span::raw("    "),
                Span::styled("[n] No", key),
            ])
            .alignment(Alignment::Center),
        ];
        frame.render_widget(
            Paragraph::new(text).wrap(Wrap { trim: true }).block(block),
            dialog,
        );
    }

    fn switched(&self, before: &Option<PathBuf>) -> Option<ProjectEvent> {
        match &self.manager.current_project {
            Some(dir) if Some(dir) != before.as_ref() => Some(ProjectEvent::Switched(dir.clone())),
            _ => None,
        }
    }
}

impl<'a, F: ProjectFs> EventHandler for ProjectButtons<'a, F> {
    type Event = ProjectEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<ProjectEvent> {
        let before = self.manager.current_project.clone();

        if self.dialog_visible() {
            return match event {
                TuiEvent::InputChar('y') | TuiEvent::InputChar('Y') | TuiEvent::Enter => {
                    self.manager.open_project_confirmation();
                    self.switched(&before)
                }
                TuiEvent::InputChar('n') | TuiEvent::InputChar('N') | TuiEvent::Escape => {
                    self.manager.reset_is_project_flag();
                    Some(ProjectEvent::Cancelled)
                }
                _ => None,
            };
        }

        match event {
            TuiEvent::NewProject => {
                self.manager.new_project();
                self.switched(&before)
            }
            TuiEvent::OpenProject => {
                self.manager.open_project();
                self.switched(&before)
            }
            _ => None,
        }
    }
}

impl<'a, F: ProjectFs> Component for ProjectButtons<'a, F> {
    /// Draws the trigger hint line. The dialog is drawn separately with
    /// [`render_dialog`](Self::render_dialog) so it can overlay the whole screen.
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let key = Style::default().fg(Color::Cyan);
        let label = Style::default().fg(Color::DarkGray);
        let line = Line::from(vec![
            Span::styled("[Ctrl+N]", key),
            Span::styled(" New Project  ", label),
            Span::styled("[Ctrl+O]", key),
            Span::styled(" Open Project  ", label),
            Span::styled("[Tab]", key),
            Span::styled(" Focus  ", label),
            Span::styled("[Ctrl+T]", key),
            Span::styled(" New Chat  ", label),
            Span::styled("[Ctrl+C]", key),
            Span::styled(" Quit", label),
        ]);
        frame.render_widget(line, area);
    }
}

/// Compute a centered rect using percentage of the outer rect.
fn centered_rect(percent_x: u16, percent_y: u16, outer: Rect) -> Rect {
    let [_, center_v, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(outer);
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(center_v);
    center
}
