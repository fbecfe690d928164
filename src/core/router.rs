//! # Router
//!
//! Navigation between chats. Paths look like `/chats/<id>`; `/chats` with no
//! id is valid and means "no chat selected yet".

use log::debug;

/// Location of the chat page without a chat selected.
pub const CHATS_PREFIX: &str = "/chats";

pub trait Router {
    /// The `chat_id` path parameter of the current location, if any.
    fn chat_id(&self) -> Option<&str>;

    /// Move to a new location.
    fn navigate(&mut self, path: &str);
}

/// Path for a chat id.
pub fn chat_path(chat_id: &str) -> String {
    format!("{CHATS_PREFIX}/{chat_id}")
}

/// Extract the chat id from a path, if it has a non-empty one.
pub fn parse_chat_id(path: &str) -> Option<&str> {
    let rest = path.strip_prefix(CHATS_PREFIX)?.strip_prefix('/')?;
    let id = rest.trim_end_matches('/');
    (!id.is_empty() && !id.contains('/')).then_some(id)
}

/// In-memory router keeping a navigation history.
pub struct HistoryRouter {
    history: Vec<String>,
    /// Set by `navigate`, cleared by `take_navigation`.
    changed: bool,
}

impl HistoryRouter {
    pub fn new(initial_path: impl Into<String>) -> Self {
        Self {
            history: vec![initial_path.into()],
            changed: true,
        }
    }

    pub fn current_path(&self) -> &str {
        self.history.last().map(String::as_str).unwrap_or(CHATS_PREFIX)
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Returns the new path once after each navigation.
    pub fn take_navigation(&mut self) -> Option<String> {
        if std::mem::take(&mut self.changed) {
            Some(self.current_path().to_string())
        } else {
            None
        }
    }
}

impl Default for HistoryRouter {
    fn default() -> Self {
        Self::new(CHATS_PREFIX)
    }
}

impl Router for HistoryRouter {
    fn chat_id(&self) -> Option<&str> {
        parse_chat_id(self.current_path())
    }

    fn navigate(&mut self, path: &str) {
        debug!("navigate: {} -> {}", self.current_path(), path);
        self.history.push(path.to_string());
        self.changed = true;
    }
}
