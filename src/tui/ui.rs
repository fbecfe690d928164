use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};

use crate::core::project::{ProjectFileManager, ProjectFs};
use crate::core::state::App;
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::{ChatPage, ProjectButtons};

/// Draw one frame: the chat page, the project hint line under it, and the
/// project confirmation dialog on top of everything when one is open.
pub fn draw_ui<F: ProjectFs>(
    frame: &mut Frame,
    app: &mut App,
    tui: &mut TuiState,
    projects: &mut ProjectFileManager<F>,
    spinner_frame: usize,
) {
    use Constraint::{Length, Min};
    let area = frame.area();
    let [page_area, hint_area] = Layout::vertical([Min(0), Length(1)]).areas(area);

    let project_dir = projects.current_project.clone();
    ChatPage {
        state: &mut tui.page,
        app,
        project_dir: project_dir.as_deref(),
        spinner_frame,
    }
    .render(frame, page_area);

    let mut buttons = ProjectButtons::new(projects);
    buttons.render(frame, hint_area);
    buttons.render_dialog(frame, area);
}
