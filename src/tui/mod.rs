//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! and turns keyboard events into store operations on `App`.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Loop
//!
//! Each iteration:
//! 1. Apply pending router navigation (load the addressed chat, remount the page)
//! 2. Draw if something changed
//! 3. Poll and drain terminal events; project dialogs see keys first
//! 4. Drain actions sent by background run tasks
//! 5. Execute queued [`Effect`]s (spawn runs, save the chat, quit)
//!
//! ## Redraw Strategy
//!
//! While any run is streaming the loop redraws every ~80ms so the spinner
//! moves; otherwise it sleeps up to 500ms and only redraws on events.

mod component;
mod components;
mod event;
mod highlight;
mod ui;

use log::{debug, info, warn};
use std::io::stdout;
use std::path::{Path, PathBuf};
use std::sync::{Arc, mpsc};
use std::time::Duration;

use crossterm::cursor::{SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;

use crate::core::action::{Action, Effect};
use crate::core::chat::{Chat, OutputKind, new_id};
use crate::core::chats;
use crate::core::config::ResolvedConfig;
use crate::core::project::{LocalProjectFs, ProjectFileManager};
use crate::core::router::{CHATS_PREFIX, HistoryRouter, Router, chat_path, parse_chat_id};
use crate::core::runner::{CodeRunner, ProcessRunner, RunChunk, RunRequest};
use crate::core::state::App;
use crate::tui::component::EventHandler;
use crate::tui::components::{
    ChatPage, ChatPageEvent, ChatPageState, ProjectButtons, ProjectEvent, SideBarState,
};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    pub page: ChatPageState,
}

impl TuiState {
    pub fn new(side_bar: SideBarState) -> Self {
        Self {
            page: ChatPageState::new(side_bar),
        }
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // Keyboard enhancement lets Shift+Enter through; terminals without it ignore the request
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, keyboard enhancement)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste,
        );
    }
}

/// Everything the loop needs to execute effects.
struct Services {
    runner: Arc<dyn CodeRunner>,
    run_timeout: Duration,
    chats_dir: Option<PathBuf>,
    tx: mpsc::Sender<Action>,
}

/// Run the terminal UI until the user quits. `initial_chat` opens that chat;
/// otherwise a fresh chat id is generated on mount.
pub fn run(config: ResolvedConfig, initial_chat: Option<String>) -> std::io::Result<()> {
    let chats_dir = match chats::chats_dir() {
        Ok(dir) => Some(dir),
        Err(e) => {
            warn!("Chat persistence disabled: {}", e);
            None
        }
    };

    let (tx, rx) = mpsc::channel();
    let services = Services {
        runner: Arc::new(ProcessRunner::new(config.interpreters.clone())),
        run_timeout: Duration::from_secs(config.run_timeout_secs),
        chats_dir,
        tx,
    };

    let mut app = App::from_config(Chat::new(String::new()), &config);
    let mut tui = TuiState::new(SideBarState::new(saved_chats(services.chats_dir.as_deref())));
    let initial_chat = initial_chat.filter(|id| {
        let valid = chats::is_valid_chat_id(id);
        if !valid {
            warn!("Ignoring invalid chat id {:?}", id);
        }
        valid
    });
    let mut router = HistoryRouter::new(match initial_chat {
        Some(id) => chat_path(&id),
        None => CHATS_PREFIX.to_string(),
    });
    let mut projects = ProjectFileManager::new(LocalProjectFs, config.project_dir.clone());

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    let start_time = std::time::Instant::now();
    let mut needs_redraw = true;

    loop {
        if apply_navigation(&mut router, &mut app, &mut tui, &services) {
            needs_redraw = true;
        }

        let animating = !app.running.is_empty();
        if animating {
            needs_redraw = true;
        }

        if needs_redraw {
            let spinner_frame = (start_time.elapsed().as_secs_f32() * 12.0) as usize;
            terminal.draw(|f| ui::draw_ui(f, &mut app, &mut tui, &mut projects, spinner_frame))?;
            needs_redraw = false;
        }

        let timeout = if animating {
            Duration::from_millis(80)
        } else {
            Duration::from_millis(500)
        };
        let first_event = poll_event_timeout(timeout);
        if first_event.is_some() {
            needs_redraw = true;
        }

        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            match event {
                TuiEvent::Resize => continue,
                TuiEvent::ForceQuit => {
                    app.dispatch(Action::Quit);
                    continue;
                }
                TuiEvent::NewChat => {
                    router.navigate(CHATS_PREFIX);
                    continue;
                }
                _ => {}
            }

            // Project triggers, and any key while a project dialog is open
            let mut buttons = ProjectButtons::new(&mut projects);
            if buttons.dialog_visible()
                || matches!(event, TuiEvent::NewProject | TuiEvent::OpenProject)
            {
                match buttons.handle_event(&event) {
                    Some(ProjectEvent::Switched(dir)) => {
                        app.status_message = format!("Project: {}", dir.display());
                    }
                    Some(ProjectEvent::Cancelled) | None => {}
                }
                continue;
            }

            let project_dir = projects.current_project.clone();
            let page_event = ChatPage {
                state: &mut tui.page,
                app: &mut app,
                project_dir: project_dir.as_deref(),
                spinner_frame: 0,
            }
            .handle_event(&event);

            match page_event {
                Some(ChatPageEvent::OpenChat(id)) => router.navigate(&chat_path(&id)),
                Some(ChatPageEvent::NewChat) => router.navigate(CHATS_PREFIX),
                Some(ChatPageEvent::DeleteChat(id)) => {
                    delete_chat(&id, &mut app, &mut tui, &mut router, &services)
                }
                Some(ChatPageEvent::Submitted) | Some(ChatPageEvent::Code(_)) | None => {}
            }
        }

        // Actions from background runs
        while let Ok(action) = rx.try_recv() {
            needs_redraw = true;
            debug!("Event loop received: {:?}", action);
            app.dispatch(action);
        }

        if execute_effects(&mut app, &mut tui, &services) {
            break;
        }
    }

    save_chat(&app, &mut tui, services.chats_dir.as_deref());

    ratatui::restore();
    Ok(())
}

/// Follow router navigation: load the addressed chat and remount the page.
/// Returns true if anything changed.
fn apply_navigation(
    router: &mut HistoryRouter,
    app: &mut App,
    tui: &mut TuiState,
    services: &Services,
) -> bool {
    let mut changed = false;
    while let Some(path) = router.take_navigation() {
        changed = true;
        if let Some(id) = parse_chat_id(&path)
            && id != app.chat.id
        {
            save_chat(app, tui, services.chats_dir.as_deref());
            let chat = chats::load_or_new(services.chats_dir.as_deref(), id);
            app.dispatch(Action::LoadChat(chat));
        }
        // Navigates again (to a fresh id) when the path has none.
        tui.page.mount(router);
    }
    changed
}

/// Run queued effects. Returns true when the app should quit.
fn execute_effects(app: &mut App, tui: &mut TuiState, services: &Services) -> bool {
    let mut quit = false;
    for effect in app.take_effects() {
        match effect {
            Effect::SpawnRuns(requests) => {
                for request in requests {
                    spawn_run(request, services);
                }
            }
            Effect::SaveChat => save_chat(app, tui, services.chats_dir.as_deref()),
            Effect::Quit => quit = true,
            Effect::None => {}
        }
    }
    quit
}

fn saved_chats(dir: Option<&Path>) -> Vec<chats::ChatHeadline> {
    let Some(dir) = dir else {
        return Vec::new();
    };
    match chats::load_index(dir) {
        Ok(index) => index.chats,
        Err(e) => {
            warn!("Failed to read chat index: {}", e);
            Vec::new()
        }
    }
}

fn save_chat(app: &App, tui: &mut TuiState, dir: Option<&Path>) {
    let Some(dir) = dir else {
        return;
    };
    if let Err(e) = chats::save_chat(dir, &app.chat) {
        warn!("Failed to save chat {}: {}", app.chat.id, e);
        return;
    }
    tui.page.side_bar.set_chats(saved_chats(Some(dir)));
}

fn delete_chat(
    id: &str,
    app: &mut App,
    tui: &mut TuiState,
    router: &mut HistoryRouter,
    services: &Services,
) {
    let dir = services.chats_dir.as_deref();
    if let Some(dir) = dir
        && let Err(e) = chats::delete_chat(dir, id)
    {
        warn!("Failed to delete chat {}: {}", id, e);
        app.status_message = format!("Delete failed: {}", e);
        return;
    }
    tui.page.side_bar.set_chats(saved_chats(dir));

    // The open chat is gone: move to a fresh one without saving it back.
    if app.chat.id == id {
        let fresh = Chat::new(new_id());
        let path = chat_path(&fresh.id);
        app.dispatch(Action::LoadChat(fresh));
        router.navigate(&path);
    }
    app.status_message = String::from("Chat deleted");
}

/// Spawn a run on the tokio runtime. Its actions arrive on `services.tx`.
fn spawn_run(request: RunRequest, services: &Services) {
    info!(
        "Spawning {} run for {}/{}",
        request.language, request.group_id, request.message_id
    );
    tokio::spawn(drive_run(
        services.runner.clone(),
        request,
        services.run_timeout,
        services.tx.clone(),
    ));
}

/// Execute one run and forward its chunks as `OutputReceived` actions.
///
/// `RunFinished` is sent only after every chunk sender is gone, so a failure
/// or timeout output always lands before it.
async fn drive_run(
    runner: Arc<dyn CodeRunner>,
    request: RunRequest,
    timeout: Duration,
    tx: mpsc::Sender<Action>,
) {
    let (chunk_tx, mut chunk_rx) = tokio::sync::mpsc::channel::<RunChunk>(100);

    let run_request = request.clone();
    let execute = async move {
        let outcome =
            tokio::time::timeout(timeout, runner.run(&run_request, chunk_tx.clone())).await;
        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(_) => Some(format!("Run timed out after {}s", timeout.as_secs())),
        };
        if let Some(message) = failure {
            warn!("Run {} failed: {}", run_request.message_id, message);
            let chunk = RunChunk::Output {
                kind: OutputKind::Error,
                payload: message,
            };
            if chunk_tx.send(chunk).await.is_err() {
                warn!("Failed to report run failure: forwarder gone");
            }
        }
    };

    let forward = async {
        let mut forwarded = 0usize;
        while let Some(chunk) = chunk_rx.recv().await {
            let RunChunk::Output { kind, payload } = chunk;
            forwarded += 1;
            let action = Action::OutputReceived {
                group_id: request.group_id.clone(),
                message_id: request.message_id.clone(),
                kind,
                payload,
            };
            if tx.send(action).is_err() {
                warn!("Failed to forward run output: receiver dropped");
                return;
            }
        }
        info!(
            "Run {} closed after {} chunks",
            request.message_id, forwarded
        );
    };

    futures::future::join(execute, forward).await;

    let finished = Action::RunFinished {
        group_id: request.group_id,
        message_id: request.message_id,
    };
    if tx.send(finished).is_err() {
        warn!("Failed to send RunFinished: receiver dropped");
    }
}
