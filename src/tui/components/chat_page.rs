//! # ChatPage Component
//!
//! The page shown at `/chats/<id>`.
//!
//! ```text
//! ┌ TopBar ─────────────────────────────────────────────┐
//! ├ SideBar ──┬ Transcript ─────────────────────────────┤
//! │           │                                         │
//! │           ├ CommandInput ───────────────────────────┤
//! └───────────┴─────────────────────────────────────────┘
//! ```
//!
//! The page owns the auto-scroll flag. It starts off, turns on with every
//! successful submit, and is lent to the transcript by `&mut` so the
//! transcript can drop it when the user scrolls up by hand.
//!
//! Key routing:
//! - Tab cycles focus: input → transcript → side bar (skipped while hidden)
//! - Mouse wheel and PageUp/PageDown always scroll the transcript
//! - End in the transcript jumps back to following the bottom
//! - Everything else goes to the focused pane

use std::path::Path;

use log::{debug, info};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};

use crate::core::action::Action;
use crate::core::chat::new_id;
use crate::core::router::{Router, chat_path};
use crate::core::state::App;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::code_message::CodeMessageEvent;
use crate::tui::components::command_input::{CommandInput, CommandInputEvent};
use crate::tui::components::side_bar::{SideBar, SideBarEvent, SideBarState};
use crate::tui::components::top_bar::TopBar;
use crate::tui::components::transcript::{Transcript, TranscriptState};
use crate::tui::event::TuiEvent;

/// Side bar width in columns, when the terminal is wide enough for it.
const SIDE_BAR_WIDTH: u16 = 30;
/// Narrower terminals hide the side bar.
const MIN_WIDTH_FOR_SIDE_BAR: u16 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Input,
    Transcript,
    SideBar,
}

impl Focus {
    pub fn next(self, side_bar_visible: bool) -> Self {
        match self {
            Focus::Input => Focus::Transcript,
            Focus::Transcript if side_bar_visible => Focus::SideBar,
            Focus::Transcript | Focus::SideBar => Focus::Input,
        }
    }
}

pub struct ChatPageState {
    pub auto_scrolling: bool,
    pub focus: Focus,
    pub transcript: TranscriptState,
    pub command_input: CommandInput,
    pub side_bar: SideBarState,
    /// Whether the last render had room for the side bar.
    pub side_bar_visible: bool,
}

impl ChatPageState {
    pub fn new(side_bar: SideBarState) -> Self {
        Self {
            auto_scrolling: false,
            focus: Focus::Input,
            transcript: TranscriptState::new(),
            command_input: CommandInput::new(),
            side_bar,
            side_bar_visible: true,
        }
    }

    /// Record the layout decision; focus leaves a side bar that went away.
    fn set_side_bar_visible(&mut self, visible: bool) {
        self.side_bar_visible = visible;
        if !visible && self.focus == Focus::SideBar {
            self.focus = Focus::Input;
        }
    }

    /// Called whenever the page is (re)entered. Gives the location a chat id
    /// when it has none, navigating at most once. Returns true if it navigated.
    pub fn mount(&mut self, router: &mut dyn Router) -> bool {
        self.auto_scrolling = false;
        self.transcript = TranscriptState::new();
        if router.chat_id().is_some() {
            return false;
        }
        let path = chat_path(&new_id());
        info!("No chat id in location, navigating to {path}");
        router.navigate(&path);
        true
    }

    /// A submit went through: follow the transcript to the bottom again.
    pub fn on_input_submitted(&mut self) {
        self.auto_scrolling = true;
    }
}

/// What the page could not handle itself.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatPageEvent {
    Submitted,
    Code(CodeMessageEvent),
    OpenChat(String),
    NewChat,
    DeleteChat(String),
}

/// Transient wrapper, created per frame and per event.
pub struct ChatPage<'a> {
    pub state: &'a mut ChatPageState,
    pub app: &'a mut App,
    pub project_dir: Option<&'a Path>,
    pub spinner_frame: usize,
}

impl<'a> ChatPage<'a> {
    fn handle_transcript_event(&mut self, event: &TuiEvent) -> Option<ChatPageEvent> {
        let transcript = &mut self.state.transcript;
        transcript.sync(&self.app.chat, &*self.app);

        if !transcript.is_editing() {
            match event {
                TuiEvent::CursorUp => {
                    transcript.move_selection(&self.app.chat, -1);
                    self.state.auto_scrolling = false;
                    return None;
                }
                TuiEvent::CursorDown => {
                    transcript.move_selection(&self.app.chat, 1);
                    return None;
                }
                TuiEvent::CursorEnd => {
                    self.state.auto_scrolling = true;
                    return None;
                }
                TuiEvent::Escape => {
                    self.state.focus = Focus::Input;
                    return None;
                }
                _ => {}
            }
        }

        let app = &*self.app;
        let target = transcript.selected_code(&app.chat, |g, m| app.is_streaming(g, m))?;
        let code_event = transcript.handle_code_event(event, target, &mut *self.app)?;
        debug!("Transcript code event: {code_event:?}");
        Some(ChatPageEvent::Code(code_event))
    }
}

impl<'a> EventHandler for ChatPage<'a> {
    type Event = ChatPageEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<ChatPageEvent> {
        if self
            .state
            .transcript
            .handle_scroll(event, &mut self.state.auto_scrolling)
        {
            return None;
        }

        if matches!(event, TuiEvent::FocusNext) && !self.state.transcript.is_editing() {
            self.state.focus = self.state.focus.next(self.state.side_bar_visible);
            return None;
        }

        match self.state.focus {
            Focus::Input => match self.state.command_input.handle_event(event)? {
                CommandInputEvent::Submit(text) => {
                    self.app.dispatch(Action::Submit(text));
                    self.state.on_input_submitted();
                    Some(ChatPageEvent::Submitted)
                }
                CommandInputEvent::ContentChanged => None,
            },
            Focus::Transcript => self.handle_transcript_event(event),
            Focus::SideBar if !self.state.side_bar_visible => None,
            Focus::SideBar => {
                let event = SideBar {
                    state: &mut self.state.side_bar,
                    current_chat_id: Some(self.app.chat.id.as_str()),
                    focused: true,
                }
                .handle_event(event)?;
                Some(match event {
                    SideBarEvent::Open(id) => ChatPageEvent::OpenChat(id),
                    SideBarEvent::CreateNew => ChatPageEvent::NewChat,
                    SideBarEvent::Delete(id) => ChatPageEvent::DeleteChat(id),
                })
            }
        }
    }
}

impl<'a> Component for ChatPage<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        use Constraint::{Length, Min};

        let [top_area, body_area] = Layout::vertical([Length(1), Min(0)]).areas(area);
        let (side_area, main_area) = if body_area.width >= MIN_WIDTH_FOR_SIDE_BAR {
            let [side, main] =
                Layout::horizontal([Length(SIDE_BAR_WIDTH), Min(0)]).areas(body_area);
            (Some(side), main)
        } else {
            (None, body_area)
        };
        self.state.set_side_bar_visible(side_area.is_some());

        self.state.command_input.focused = self.state.focus == Focus::Input;
        let input_height = self.state.command_input.calculate_height(main_area.width);
        let [transcript_area, input_area] =
            Layout::vertical([Min(0), Length(input_height)]).areas(main_area);

        TopBar::new(
            self.app.chat.title.clone(),
            self.app.status_message.clone(),
            self.project_dir.map(Path::to_path_buf),
            self.app.always_execute_code,
        )
        .render(frame, top_area);

        if let Some(side_area) = side_area {
            SideBar {
                state: &mut self.state.side_bar,
                current_chat_id: Some(self.app.chat.id.as_str()),
                focused: self.state.focus == Focus::SideBar,
            }
            .render(frame, side_area);
        }

        let app = &*self.app;
        self.state.transcript.sync(&app.chat, app);
        Transcript {
            state: &mut self.state.transcript,
            chat: &app.chat,
            store: app,
            running: &app.running,
            auto_scrolling: &mut self.state.auto_scrolling,
            focused: self.state.focus == Focus::Transcript,
            spinner_frame: self.spinner_frame,
        }
        .render(frame, transcript_area);

        self.state.command_input.render(frame, input_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chat::Message;
    use crate::core::chats::ChatHeadline;
    use crate::core::router::HistoryRouter;
    use crate::core::store::ChatStore;
    use crate::test_support::{app_with_code, test_app};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn page_state() -> ChatPageState {
        ChatPageState::new(SideBarState::new(Vec::new()))
    }

    fn press(state: &mut ChatPageState, app: &mut App, event: TuiEvent) -> Option<ChatPageEvent> {
        ChatPage {
            state,
            app,
            project_dir: None,
            spinner_frame: 0,
        }
        .handle_event(&event)
    }

    fn type_str(state: &mut ChatPageState, app: &mut App, s: &str) {
        for c in s.chars() {
            press(state, app, TuiEvent::InputChar(c));
        }
    }

    #[test]
    fn mount_without_id_navigates_once() {
        let mut router = HistoryRouter::default();
        let mut state = page_state();
        assert!(state.mount(&mut router));
        assert!(router.chat_id().is_some());
        assert!(!state.mount(&mut router));
        assert_eq!(router.history().len(), 2);
    }

    #[test]
    fn mount_with_id_does_not_navigate() {
        let mut router = HistoryRouter::new("/chats/abc");
        let mut state = page_state();
        assert!(!state.mount(&mut router));
        assert_eq!(router.history(), ["/chats/abc".to_string()]);
    }

    #[test]
    fn auto_scrolling_starts_off_and_turns_on_after_submit() {
        let mut app = test_app();
        let mut state = page_state();
        assert!(!state.auto_scrolling);

        type_str(&mut state, &mut app, "hello");
        assert_eq!(press(&mut state, &mut app, TuiEvent::Enter), Some(ChatPageEvent::Submitted));
        assert!(state.auto_scrolling);
        assert_eq!(app.chat.message_count(), 1);
    }

    #[test]
    fn blank_submit_leaves_auto_scrolling_off() {
        let mut app = test_app();
        let mut state = page_state();
        assert_eq!(press(&mut state, &mut app, TuiEvent::Enter), None);
        assert!(!state.auto_scrolling);
    }

    #[test]
    fn scroll_up_clears_auto_scrolling_from_any_focus() {
        let mut app = test_app();
        let mut state = page_state();
        state.auto_scrolling = true;
        press(&mut state, &mut app, TuiEvent::MouseScrollUp);
        assert!(!state.auto_scrolling);
        assert_eq!(state.focus, Focus::Input);
    }

    #[test]
    fn tab_cycles_focus() {
        let mut app = test_app();
        let mut state = page_state();
        press(&mut state, &mut app, TuiEvent::FocusNext);
        assert_eq!(state.focus, Focus::Transcript);
        press(&mut state, &mut app, TuiEvent::FocusNext);
        assert_eq!(state.focus, Focus::SideBar);
        press(&mut state, &mut app, TuiEvent::FocusNext);
        assert_eq!(state.focus, Focus::Input);
    }

    fn draw(state: &mut ChatPageState, app: &mut App, width: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, 30)).unwrap();
        terminal
            .draw(|f| {
                ChatPage {
                    state: &mut *state,
                    app: &mut *app,
                    project_dir: None,
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
    fn narrow_terminal_skips_hidden_side_bar_in_focus_cycle() {
        let mut app = test_app();
        let mut state = page_state();
        let text = draw(&mut state, &mut app, 60);
        assert!(!text.contains("Chats"));
        assert!(!state.side_bar_visible);

        press(&mut state, &mut app, TuiEvent::FocusNext);
        assert_eq!(state.focus, Focus::Transcript);
        press(&mut state, &mut app, TuiEvent::FocusNext);
        assert_eq!(state.focus, Focus::Input);
    }

    #[test]
    fn shrinking_moves_focus_off_side_bar_and_ignores_its_keys() {
        let mut app = test_app();
        let mut state = ChatPageState::new(SideBarState::new(vec![ChatHeadline {
            id: String::from("saved"),
            title: String::from("Saved"),
            last_modified: 0,
            group_count: 1,
        }]));
        state.focus = Focus::SideBar;
        draw(&mut state, &mut app, 60);
        assert_eq!(state.focus, Focus::Input);

        state.focus = Focus::SideBar;
        assert_eq!(press(&mut state, &mut app, TuiEvent::InputChar('d')), None);
        assert_eq!(press(&mut state, &mut app, TuiEvent::InputChar('d')), None);
    }

    #[test]
    fn transcript_keys_run_selected_code() {
        let (mut app, g, m) = app_with_code("python", "print(1)");
        let mut state = page_state();
        state.focus = Focus::Transcript;
        press(&mut state, &mut app, TuiEvent::CursorUp);
        assert_eq!(state.transcript.selected, Some((g.clone(), m.clone())));

        assert_eq!(
            press(&mut state, &mut app, TuiEvent::InputChar('r')),
            Some(ChatPageEvent::Code(CodeMessageEvent::RunRequested))
        );
        assert!(app.is_streaming(&g, &m));
        assert_eq!(app.take_effects().len(), 1);
    }

    #[test]
    fn transcript_delete_removes_message() {
        let (mut app, g, m) = app_with_code("sh", "echo hi");
        let mut state = page_state();
        state.focus = Focus::Transcript;
        press(&mut state, &mut app, TuiEvent::CursorUp);
        press(&mut state, &mut app, TuiEvent::InputChar('d'));
        assert!(app.chat.code_message(&g, &m).is_none());
        assert_eq!(state.transcript.selected, None);
    }

    #[test]
    fn code_mounted_after_always_run_starts_folded() {
        let mut app = test_app();
        app.enable_auto_code_execution();
        app.take_effects();
        let mut state = page_state();
        type_str(&mut state, &mut app, "```sh\necho hi\n```");
        press(&mut state, &mut app, TuiEvent::Enter);

        let code_id = app.chat.message_groups[0]
            .messages
            .iter()
            .find_map(|m| match m {
                Message::Code(c) => Some(c.id.clone()),
                Message::Text(_) => None,
            })
            .unwrap();
        state.transcript.sync(&app.chat, &app);
        assert!(state.transcript.code_states[&code_id].folded);
    }

    #[test]
    fn renders_all_panes() {
        let (mut app, _, _) = app_with_code("python", "print('visible')");
        app.chat.title = String::from("Demo chat");
        let mut state = page_state();
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal
            .draw(|f| {
                ChatPage {
                    state: &mut state,
                    app: &mut app,
                    project_dir: Some(Path::new("/work/demo")),
                    spinner_frame: 0,
                }
                .render(f, f.area());
            })
            .unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("Demo chat"));
        assert!(text.contains("Chats"));
        assert!(text.contains("visible"));
        assert!(text.contains("Enter to send"));
    }
}
