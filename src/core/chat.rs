//! # Chat Data Model
//!
//! ```text
//! Chat
//! ├── id: String                 // addressable as /chats/<id>
//! ├── title: String
//! ├── last_modified: i64         // unix seconds
//! └── message_groups: Vec<MessageGroup>
//!     ├── id, role
//!     └── messages: Vec<Message>
//!         ├── Text { id, content }
//!         └── Code { id, language, content, outputs: Vec<OutputRecord> }
//! ```
//!
//! Outputs are append-only. Nothing here knows about rendering.

use serde::{Deserialize, Serialize};

pub type GroupId = String;
pub type MessageId = String;

/// Generate a new UUID v4 identifier.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Stdout,
    Stderr,
    Result,
    Error,
}

impl OutputKind {
    pub fn label(&self) -> &'static str {
        match self {
            OutputKind::Stdout => "stdout",
            OutputKind::Stderr => "stderr",
            OutputKind::Result => "result",
            OutputKind::Error => "error",
        }
    }
}

/// One unit of execution result attached to a code message.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OutputRecord {
    pub id: String,
    pub kind: OutputKind,
    pub payload: String,
}

impl OutputRecord {
    pub fn new(kind: OutputKind, payload: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            kind,
            payload: payload.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TextMessage {
    pub id: MessageId,
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CodeMessage {
    pub id: MessageId,
    pub language: String,
    pub content: String,
    #[serde(default)]
    pub outputs: Vec<OutputRecord>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    Text(TextMessage),
    Code(CodeMessage),
}

impl Message {
    pub fn id(&self) -> &str {
        match self {
            Message::Text(m) => &m.id,
            Message::Code(m) => &m.id,
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Message::Text(TextMessage {
            id: new_id(),
            content: content.into(),
        })
    }

    pub fn code(language: impl Into<String>, content: impl Into<String>) -> Self {
        Message::Code(CodeMessage {
            id: new_id(),
            language: language.into(),
            content: content.into(),
            outputs: Vec::new(),
        })
    }
}

/// An ordered bundle of messages representing one turn.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MessageGroup {
    pub id: GroupId,
    pub role: Role,
    pub messages: Vec<Message>,
}

impl MessageGroup {
    pub fn new(role: Role, messages: Vec<Message>) -> Self {
        Self {
            id: new_id(),
            role,
            messages,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Chat {
    pub id: String,
    pub title: String,
    pub last_modified: i64,
    pub message_groups: Vec<MessageGroup>,
}

impl Chat {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::from("New chat"),
            last_modified: chrono::Utc::now().timestamp(),
            message_groups: Vec::new(),
        }
    }

    pub fn group(&self, group_id: &str) -> Option<&MessageGroup> {
        self.message_groups.iter().find(|g| g.id == group_id)
    }

    pub fn code_message(&self, group_id: &str, message_id: &str) -> Option<&CodeMessage> {
        self.group(group_id)?
            .messages
            .iter()
            .find_map(|m| match m {
                Message::Code(code) if code.id == message_id => Some(code),
                _ => None,
            })
    }

    pub fn code_message_mut(
        &mut self,
        group_id: &str,
        message_id: &str,
    ) -> Option<&mut CodeMessage> {
        self.message_groups
            .iter_mut()
            .find(|g| g.id == group_id)?
            .messages
            .iter_mut()
            .find_map(|m| match m {
                Message::Code(code) if code.id == message_id => Some(code),
                _ => None,
            })
    }

    /// Replace a message's content. Returns false if the message is gone.
    pub fn set_content(&mut self, group_id: &str, message_id: &str, content: String) -> bool {
        let Some(group) = self.message_groups.iter_mut().find(|g| g.id == group_id) else {
            return false;
        };
        match group.messages.iter_mut().find(|m| m.id() == message_id) {
            Some(Message::Text(text)) => text.content = content,
            Some(Message::Code(code)) => code.content = content,
            None => return false,
        }
        true
    }

    /// Remove a message from its group. An emptied group is removed as well.
    pub fn remove_message(&mut self, group_id: &str, message_id: &str) -> bool {
        let Some(pos) = self.message_groups.iter().position(|g| g.id == group_id) else {
            return false;
        };
        let group = &mut self.message_groups[pos];
        let before = group.messages.len();
        group.messages.retain(|m| m.id() != message_id);
        let removed = group.messages.len() != before;
        if group.messages.is_empty() {
            self.message_groups.remove(pos);
        }
        removed
    }

    /// Append an output record, preserving arrival order.
    pub fn append_output(&mut self, group_id: &str, message_id: &str, output: OutputRecord) -> bool {
        match self.code_message_mut(group_id, message_id) {
            Some(code) => {
                code.outputs.push(output);
                true
            }
            None => false,
        }
    }

    pub fn message_count(&self) -> usize {
        self.message_groups.iter().map(|g| g.messages.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.message_count() == 0
    }
}
