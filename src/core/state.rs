//! # Application State
//!
//! Core business state for codeconsole. Domain logic only; presentation state
//! (fold flags, scroll offsets, editor buffers) lives in the `tui` module.
//!
//! ```text
//! App
//! ├── chat: Chat                        // the open conversation
//! ├── always_execute_code: bool         // session-only preference
//! ├── runnable_languages: HashSet       // languages the runner can execute
//! ├── running: HashSet<(group, msg)>    // runs in flight
//! ├── status_message: String            // top bar text
//! └── pending_effects: Vec<Effect>      // queued for the TUI loop
//! ```
//!
//! `App` is the concrete [`ChatStore`]. Every store operation becomes an
//! [`Action`] fed through [`update`]; the resulting [`Effect`] is queued and
//! drained by the event loop, which performs the actual I/O.

use std::collections::HashSet;

use log::debug;

use crate::core::action::{Action, Effect, update};
use crate::core::chat::{Chat, GroupId, MessageId};
use crate::core::config::ResolvedConfig;
use crate::core::store::ChatStore;

pub struct App {
    pub chat: Chat,
    pub always_execute_code: bool,
    pub runnable_languages: HashSet<String>,
    pub running: HashSet<(GroupId, MessageId)>,
    pub status_message: String,
    pending_effects: Vec<Effect>,
}

impl App {
    pub fn new(chat: Chat, runnable_languages: HashSet<String>) -> Self {
        Self {
            chat,
            always_execute_code: false,
            runnable_languages,
            running: HashSet::new(),
            status_message: String::from("Ready"),
            pending_effects: Vec::new(),
        }
    }

    pub fn from_config(chat: Chat, config: &ResolvedConfig) -> Self {
        let mut app = Self::new(chat, config.interpreters.keys().cloned().collect());
        app.always_execute_code = config.always_execute_code;
        app
    }

    /// True while a run for this message is in flight.
    pub fn is_streaming(&self, group_id: &str, message_id: &str) -> bool {
        self.running
            .contains(&(group_id.to_string(), message_id.to_string()))
    }

    /// Run an action through the reducer and queue its effect.
    pub fn dispatch(&mut self, action: Action) {
        let effect = update(self, action);
        if effect != Effect::None {
            self.pending_effects.push(effect);
        }
    }

    /// Drain queued effects for the event loop.
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.pending_effects)
    }
}

impl ChatStore for App {
    fn always_execute_code(&self) -> bool {
        self.always_execute_code
    }

    fn is_viable_for_running_code(&self, group_id: &str, message_id: &str) -> bool {
        let Some(code) = self.chat.code_message(group_id, message_id) else {
            return false;
        };
        self.runnable_languages
            .contains(&code.language.to_lowercase())
            && !self.is_streaming(group_id, message_id)
    }

    fn edit_message_content(&mut self, group_id: &str, message_id: &str, content: String) {
        debug!("store: edit_message_content({group_id}, {message_id})");
        self.dispatch(Action::EditMessageContent {
            group_id: group_id.to_string(),
            message_id: message_id.to_string(),
            content,
        });
    }

    fn remove_message_from_group(&mut self, group_id: &str, message_id: &str) {
        debug!("store: remove_message_from_group({group_id}, {message_id})");
        self.dispatch(Action::RemoveMessage {
            group_id: group_id.to_string(),
            message_id: message_id.to_string(),
        });
    }

    fn do_run(&mut self, group_id: &str, message_id: &str) {
        debug!("store: do_run({group_id}, {message_id})");
        self.dispatch(Action::RunCode {
            group_id: group_id.to_string(),
            message_id: message_id.to_string(),
        });
    }

    fn enable_auto_code_execution(&mut self) {
        debug!("store: enable_auto_code_execution");
        self.dispatch(Action::EnableAutoCodeExecution);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chat::OutputKind;
    use crate::test_support::{app_with_code, test_app};

    #[test]
    fn test_app_new_defaults() {
        let app = test_app();
        assert_eq!(app.status_message, "Ready");
        assert!(!app.always_execute_code);
        assert!(app.running.is_empty());
    }

    #[test]
    fn viable_when_language_supported_and_idle() {
        let (app, g, m) = app_with_code("python", "print(1)");
        assert!(app.is_viable_for_running_code(&g, &m));
    }

    #[test]
    fn not_viable_for_unknown_language() {
        let (app, g, m) = app_with_code("cobol", "DISPLAY 'HI'.");
        assert!(!app.is_viable_for_running_code(&g, &m));
    }

    #[test]
    fn not_viable_while_running() {
        let (mut app, g, m) = app_with_code("python", "print(1)");
        app.do_run(&g, &m);
        assert!(app.is_streaming(&g, &m));
        assert!(!app.is_viable_for_running_code(&g, &m));
    }

    #[test]
    fn not_viable_for_missing_message() {
        let (app, g, _) = app_with_code("python", "print(1)");
        assert!(!app.is_viable_for_running_code(&g, "nope"));
    }

    #[test]
    fn do_run_queues_spawn_effect() {
        let (mut app, g, m) = app_with_code("python", "print(1)");
        app.do_run(&g, &m);
        let effects = app.take_effects();
        assert_eq!(effects.len(), 1);
        match &effects[0] {
            Effect::SpawnRuns(requests) => {
                assert_eq!(requests.len(), 1);
                assert_eq!(requests[0].group_id, g);
                assert_eq!(requests[0].message_id, m);
                assert_eq!(requests[0].code, "print(1)");
            }
            other => panic!("expected SpawnRuns, got {other:?}"),
        }
        assert!(app.take_effects().is_empty());
    }

    #[test]
    fn enable_auto_code_execution_sets_preference() {
        let mut app = test_app();
        app.enable_auto_code_execution();
        assert!(app.always_execute_code());
    }

    #[test]
    fn edit_then_remove_through_store() {
        let (mut app, g, m) = app_with_code("sh", "echo a");
        app.edit_message_content(&g, &m, "echo b".into());
        assert_eq!(app.chat.code_message(&g, &m).unwrap().content, "echo b");

        app.remove_message_from_group(&g, &m);
        assert!(app.chat.code_message(&g, &m).is_none());
    }

    #[test]
    fn outputs_after_run_finish_are_appended_in_order() {
        let (mut app, g, m) = app_with_code("sh", "echo a");
        app.do_run(&g, &m);
        app.dispatch(Action::OutputReceived {
            group_id: g.clone(),
            message_id: m.clone(),
            kind: OutputKind::Stdout,
            payload: "a\n".into(),
        });
        app.dispatch(Action::OutputReceived {
            group_id: g.clone(),
            message_id: m.clone(),
            kind: OutputKind::Stderr,
            payload: "warn\n".into(),
        });
        app.dispatch(Action::RunFinished {
            group_id: g.clone(),
            message_id: m.clone(),
        });
        let outputs = &app.chat.code_message(&g, &m).unwrap().outputs;
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].kind, OutputKind::Stdout);
        assert_eq!(outputs[1].kind, OutputKind::Stderr);
        assert!(!app.is_streaming(&g, &m));
    }
}
