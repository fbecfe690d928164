//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::HashSet;

use crate::core::chat::{Chat, GroupId, Message, MessageGroup, MessageId, Role};
use crate::core::state::App;
use crate::core::store::ChatStore;

/// Creates a test App that can run python and shell code.
pub fn test_app() -> App {
    let languages: HashSet<String> = ["python", "sh", "bash"]
        .into_iter()
        .map(String::from)
        .collect();
    App::new(Chat::new("test-chat"), languages)
}

/// A test App holding one assistant group with a single code message.
pub fn app_with_code(language: &str, code: &str) -> (App, GroupId, MessageId) {
    let mut app = test_app();
    let message = Message::code(language, code);
    let message_id = message.id().to_string();
    let group = MessageGroup::new(Role::Assistant, vec![message]);
    let group_id = group.id.clone();
    app.chat.message_groups.push(group);
    (app, group_id, message_id)
}

/// A store call, as seen by [`RecordingStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Edit { group_id: String, message_id: String, content: String },
    Remove { group_id: String, message_id: String },
    Run { group_id: String, message_id: String },
    EnableAuto,
}

/// Fake store that records every mutating call in order.
#[derive(Debug, Default)]
pub struct RecordingStore {
    pub always_execute_code: bool,
    pub viable: bool,
    pub calls: Vec<StoreCall>,
}

impl RecordingStore {
    pub fn viable() -> Self {
        Self {
            viable: true,
            ..Default::default()
        }
    }
}

impl ChatStore for RecordingStore {
    fn always_execute_code(&self) -> bool {
        self.always_execute_code
    }

    fn is_viable_for_running_code(&self, _group_id: &str, _message_id: &str) -> bool {
        self.viable
    }

    fn edit_message_content(&mut self, group_id: &str, message_id: &str, content: String) {
        self.calls.push(StoreCall::Edit {
            group_id: group_id.into(),
            message_id: message_id.into(),
            content,
        });
    }

    fn remove_message_from_group(&mut self, group_id: &str, message_id: &str) {
        self.calls.push(StoreCall::Remove {
            group_id: group_id.into(),
            message_id: message_id.into(),
        });
    }

    fn do_run(&mut self, group_id: &str, message_id: &str) {
        self.calls.push(StoreCall::Run {
            group_id: group_id.into(),
            message_id: message_id.into(),
        });
    }

    fn enable_auto_code_execution(&mut self) {
        self.always_execute_code = true;
        self.calls.push(StoreCall::EnableAuto);
    }
}
