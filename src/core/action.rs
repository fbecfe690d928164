//! # Actions
//!
//! Everything that can happen to a chat becomes an `Action`.
//! User presses `r` on a code message? That's `Action::RunCode { .. }`.
//! The interpreter prints a line? That's `Action::OutputReceived { .. }`.
//!
//! `update()` mutates the state and returns an [`Effect`] describing any I/O
//! the caller must perform. No I/O happens here.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```

use log::{debug, info, warn};
use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag, TagEnd};

use crate::core::chat::{Chat, GroupId, Message, MessageGroup, MessageId, OutputKind, OutputRecord, Role};
use crate::core::runner::RunRequest;
use crate::core::state::App;
use crate::core::store::ChatStore;

/// Max chars of the first submission used as the chat title.
const MAX_TITLE_CHARS: usize = 60;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Command input submitted text. Fenced code blocks become code messages.
    Submit(String),
    EditMessageContent {
        group_id: GroupId,
        message_id: MessageId,
        content: String,
    },
    RemoveMessage {
        group_id: GroupId,
        message_id: MessageId,
    },
    RunCode {
        group_id: GroupId,
        message_id: MessageId,
    },
    EnableAutoCodeExecution,
    OutputReceived {
        group_id: GroupId,
        message_id: MessageId,
        kind: OutputKind,
        payload: String,
    },
    RunFinished {
        group_id: GroupId,
        message_id: MessageId,
    },
    /// Replace the open chat (navigation to a saved or fresh chat).
    LoadChat(Chat),
    Quit,
}

/// Side effects requested by `update()`, executed by the TUI loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    SpawnRuns(Vec<RunRequest>),
    SaveChat,
    Quit,
}

pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::Submit(text) => {
            let Some(group) = build_user_group(&text) else {
                return Effect::None;
            };
            if app.chat.is_empty() {
                app.chat.title = derive_title(&text);
            }
            let code_ids: Vec<MessageId> = group
                .messages
                .iter()
                .filter(|m| matches!(m, Message::Code(_)))
                .map(|m| m.id().to_string())
                .collect();
            let group_id = group.id.clone();
            debug!(
                "Submit: group {} with {} messages ({} code)",
                group_id,
                group.messages.len(),
                code_ids.len()
            );
            app.chat.message_groups.push(group);
            touch(&mut app.chat);

            if app.always_execute_code {
                let requests: Vec<RunRequest> = code_ids
                    .iter()
                    .filter_map(|message_id| start_run(app, &group_id, message_id))
                    .collect();
                if !requests.is_empty() {
                    return Effect::SpawnRuns(requests);
                }
            }
            Effect::SaveChat
        }
        Action::EditMessageContent {
            group_id,
            message_id,
            content,
        } => {
            if app.chat.set_content(&group_id, &message_id, content) {
                touch(&mut app.chat);
                Effect::SaveChat
            } else {
                warn!("Edit ignored: message {message_id} not found in group {group_id}");
                Effect::None
            }
        }
        Action::RemoveMessage {
            group_id,
            message_id,
        } => {
            if app.chat.remove_message(&group_id, &message_id) {
                touch(&mut app.chat);
                app.status_message = String::from("Message deleted");
                Effect::SaveChat
            } else {
                warn!("Remove ignored: message {message_id} not found in group {group_id}");
                Effect::None
            }
        }
        Action::RunCode {
            group_id,
            message_id,
        } => match start_run(app, &group_id, &message_id) {
            Some(request) => Effect::SpawnRuns(vec![request]),
            None => Effect::None,
        },
        Action::EnableAutoCodeExecution => {
            app.always_execute_code = true;
            app.status_message = String::from("Always run enabled");
            info!("Auto code execution enabled for this session");
            Effect::None
        }
        Action::OutputReceived {
            group_id,
            message_id,
            kind,
            payload,
        } => {
            let streaming = app.is_streaming(&group_id, &message_id);
            let Some(code) = app.chat.code_message_mut(&group_id, &message_id) else {
                debug!("Dropping output for missing message {message_id}");
                return Effect::None;
            };
            // Consecutive chunks of one stream extend the record still being streamed.
            match code.outputs.last_mut() {
                Some(last) if streaming && last.kind == kind && kind != OutputKind::Error => {
                    last.payload.push_str(&payload);
                }
                _ => code.outputs.push(OutputRecord::new(kind, payload)),
            }
            Effect::None
        }
        Action::RunFinished {
            group_id,
            message_id,
        } => {
            app.running.remove(&(group_id.clone(), message_id.clone()));
            debug!("Run finished for {group_id}/{message_id}");
            // The run may belong to a chat the user has since left.
            if app.chat.code_message(&group_id, &message_id).is_none() {
                return Effect::None;
            }
            app.status_message = String::from("Run finished");
            touch(&mut app.chat);
            Effect::SaveChat
        }
        Action::LoadChat(chat) => {
            // Runs stay in `running` until their RunFinished arrives, even
            // when they belong to another chat.
            info!("Loading chat {} ({} runs in flight)", chat.id, app.running.len());
            app.chat = chat;
            app.status_message = String::from("Ready");
            Effect::None
        }
        Action::Quit => Effect::Quit,
    }
}

/// Mark a run as in flight and build its request, if the message may run.
fn start_run(app: &mut App, group_id: &str, message_id: &str) -> Option<RunRequest> {
    if !app.is_viable_for_running_code(group_id, message_id) {
        debug!("Run ignored: {group_id}/{message_id} is not viable");
        return None;
    }
    let code = app.chat.code_message(group_id, message_id)?;
    let request = RunRequest {
        group_id: group_id.to_string(),
        message_id: message_id.to_string(),
        language: code.language.to_lowercase(),
        code: code.content.clone(),
    };
    app.running
        .insert((group_id.to_string(), message_id.to_string()));
    app.status_message = format!("Running {}...", request.language);
    Some(request)
}

fn touch(chat: &mut Chat) {
    chat.last_modified = chrono::Utc::now().timestamp();
}

/// Split submitted text into a user group: prose becomes text messages,
/// fenced code blocks become code messages. Returns `None` for blank input.
pub fn build_user_group(text: &str) -> Option<MessageGroup> {
    if text.trim().is_empty() {
        return None;
    }

    let mut messages = Vec::new();
    let mut prose_start = 0;
    let mut fence: Option<(String, String)> = None;

    for (event, range) in Parser::new(text).into_offset_iter() {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(lang))) => {
                push_prose(&mut messages, &text[prose_start..range.start]);
                fence = Some((lang.trim().to_string(), String::new()));
            }
            Event::Text(chunk) => {
                if let Some((_, body)) = fence.as_mut() {
                    body.push_str(&chunk);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((lang, body)) = fence.take() {
                    messages.push(Message::code(lang, body.trim_end_matches('\n')));
                    prose_start = range.end;
                }
            }
            _ => {}
        }
    }
    push_prose(&mut messages, &text[prose_start..]);

    Some(MessageGroup::new(Role::User, messages))
}

fn push_prose(messages: &mut Vec<Message>, prose: &str) {
    let prose = prose.trim();
    if !prose.is_empty() {
        messages.push(Message::text(prose));
    }
}

/// First line of the submission, truncated for the side bar.
pub fn derive_title(text: &str) -> String {
    let first_line = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with("```"))
        .unwrap_or("Untitled");
    if first_line.chars().count() > MAX_TITLE_CHARS {
        let truncated: String = first_line.chars().take(MAX_TITLE_CHARS - 3).collect();
        format!("{truncated}...")
    } else {
        first_line.to_string()
    }
}
