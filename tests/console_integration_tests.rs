use std::collections::HashSet;

use codeconsole::core::action::{Action, Effect};
use codeconsole::core::chat::{Chat, Message, OutputKind};
use codeconsole::core::chats;
use codeconsole::core::config::{CliOverrides, CodeConsoleConfig, default_interpreters, resolve};
use codeconsole::core::project::{LocalProjectFs, PROJECT_MARKER, ProjectFileManager};
use codeconsole::core::router::{HistoryRouter, Router, chat_path};
use codeconsole::core::runner::{CodeRunner, ProcessRunner, RunChunk, RunRequest};
use codeconsole::core::state::App;
use codeconsole::core::store::ChatStore;
use tempfile::TempDir;
use tokio::sync::mpsc;

// ============================================================================
// Helper Functions
// ============================================================================

fn app() -> App {
    let languages: HashSet<String> = default_interpreters().into_keys().collect();
    App::new(Chat::new("integration"), languages)
}

/// The (group, message) ids of the first code message in the chat.
fn first_code(app: &App) -> (String, String) {
    app.chat
        .message_groups
        .iter()
        .find_map(|g| {
            g.messages.iter().find_map(|m| match m {
                Message::Code(c) => Some((g.id.clone(), c.id.clone())),
                Message::Text(_) => None,
            })
        })
        .expect("chat has a code message")
}

/// Run a request to completion and feed its chunks back through the store.
fn run_through_store(app: &mut App, request: &RunRequest) {
    let interpreters = default_interpreters();
    let (tx, mut rx) = mpsc::channel::<RunChunk>(64);
    tokio_test::block_on(async {
        ProcessRunner::new(interpreters).run(request, tx).await.unwrap();
    });
    while let Ok(RunChunk::Output { kind, payload }) = rx.try_recv() {
        app.dispatch(Action::OutputReceived {
            group_id: request.group_id.clone(),
            message_id: request.message_id.clone(),
            kind,
            payload,
        });
    }
    app.dispatch(Action::RunFinished {
        group_id: request.group_id.clone(),
        message_id: request.message_id.clone(),
    });
}

// ============================================================================
// Store
// ============================================================================

#[test]
fn submitted_code_block_runs_and_collects_output() {
    let mut app = app();
    app.dispatch(Action::Submit("try this\n```sh\necho hello\necho again\n```".into()));
    assert_eq!(app.take_effects(), vec![Effect::SaveChat]);

    let (g, m) = first_code(&app);
    assert!(app.is_viable_for_running_code(&g, &m));
    app.do_run(&g, &m);
    assert!(!app.is_viable_for_running_code(&g, &m));

    let request = match app.take_effects().pop() {
        Some(Effect::SpawnRuns(mut requests)) => requests.remove(0),
        other => panic!("expected SpawnRuns, got {other:?}"),
    };
    run_through_store(&mut app, &request);

    let outputs = &app.chat.code_message(&g, &m).unwrap().outputs;
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].kind, OutputKind::Stdout);
    assert_eq!(outputs[0].payload, "hello\nagain\n");
    assert!(app.is_viable_for_running_code(&g, &m));
}

#[test]
fn always_run_spawns_runs_for_new_submissions() {
    let mut app = app();
    app.enable_auto_code_execution();
    app.dispatch(Action::Submit("```python\nprint(1)\n```".into()));
    match app.take_effects().as_slice() {
        [Effect::SpawnRuns(requests)] => assert_eq!(requests[0].language, "python"),
        other => panic!("expected one SpawnRuns, got {other:?}"),
    }
}

#[test]
fn edit_and_delete_through_store_contract() {
    let mut app = app();
    app.dispatch(Action::Submit("```sh\necho a\n```".into()));
    let (g, m) = first_code(&app);

    let store: &mut dyn ChatStore = &mut app;
    store.edit_message_content(&g, &m, "echo b".into());
    store.remove_message_from_group(&g, &m);

    assert!(app.chat.code_message(&g, &m).is_none());
    assert!(app.chat.group(&g).is_none());
}

// ============================================================================
// Router, persistence, projects
// ============================================================================

#[test]
fn saved_chat_is_listed_and_reloaded_by_path() {
    let dir = TempDir::new().unwrap();
    let mut app = app();
    app.dispatch(Action::Submit("hello there".into()));
    chats::save_chat(dir.path(), &app.chat).unwrap();

    let index = chats::load_index(dir.path()).unwrap();
    assert_eq!(index.chats.len(), 1);
    assert_eq!(index.chats[0].title, "hello there");

    let mut router = HistoryRouter::default();
    router.navigate(&chat_path(&index.chats[0].id));
    let id = router.chat_id().unwrap().to_string();
    let reloaded = chats::load_or_new(Some(dir.path()), &id);
    assert_eq!(reloaded, app.chat);
}

#[test]
fn deleting_last_message_does_not_come_back_from_disk() {
    let dir = TempDir::new().unwrap();
    let mut app = app();
    app.dispatch(Action::Submit("```sh\necho a\n```".into()));
    app.take_effects();
    chats::save_chat(dir.path(), &app.chat).unwrap();

    let (g, m) = first_code(&app);
    app.remove_message_from_group(&g, &m);
    assert_eq!(app.take_effects(), vec![Effect::SaveChat]);
    chats::save_chat(dir.path(), &app.chat).unwrap();

    let reloaded = chats::load_or_new(Some(dir.path()), &app.chat.id);
    assert_eq!(reloaded.message_count(), 0);
    assert!(chats::load_index(dir.path()).unwrap().chats.is_empty());
}

#[test]
fn open_project_flow_on_disk() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().to_path_buf();
    let mut projects = ProjectFileManager::new(LocalProjectFs, dir.clone());

    projects.open_project();
    assert!(projects.open_project_dialog_visible());
    projects.open_project_confirmation();
    assert!(!projects.open_project_dialog_visible());
    assert!(dir.join(PROJECT_MARKER).is_dir());

    projects.new_project();
    assert!(projects.new_project_dialog_visible());
    projects.reset_is_project_flag();
    assert!(!projects.new_project_dialog_visible());
}

#[test]
fn cli_overrides_win_over_file_config() {
    let mut file = CodeConsoleConfig::default();
    file.general.always_execute_code = Some(false);
    let cli = CliOverrides {
        always_execute_code: true,
        project_dir: Some("/tmp".into()),
        log_level: Some("warn".into()),
    };
    let resolved = resolve(&file, &cli);
    assert!(resolved.always_execute_code);
    assert_eq!(resolved.project_dir, std::path::PathBuf::from("/tmp"));
    assert_eq!(resolved.log_level, "warn");
}
