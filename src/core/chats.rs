//! # Chat Persistence
//!
//! Save/load chats under `~/.codeconsole/chats/`.
//!
//! One JSON file per chat (`<id>.json`) plus an index (`chats.json`) so the
//! side bar can list chats without opening every file. Writes go through a
//! `.tmp` file and `rename()`.
//!
//! Every function takes the chats directory explicitly; [`chats_dir`] gives
//! the default location.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::core::chat::Chat;

const INDEX_FILE: &str = "chats.json";
/// Id whose chat file would collide with [`INDEX_FILE`].
const INDEX_ID: &str = "chats";

/// Side bar entry for a saved chat.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ChatHeadline {
    pub id: String,
    pub title: String,
    pub last_modified: i64,
    pub group_count: usize,
}

impl ChatHeadline {
    pub fn from_chat(chat: &Chat) -> Self {
        Self {
            id: chat.id.clone(),
            title: chat.title.clone(),
            last_modified: chat.last_modified,
            group_count: chat.message_groups.len(),
        }
    }
}

/// Headlines of every saved chat, most recently modified first.
#[derive(Serialize, Deserialize, Default, Debug)]
pub struct ChatIndex {
    pub chats: Vec<ChatHeadline>,
}

/// Returns `~/.codeconsole/chats/`, creating it if needed.
pub fn chats_dir() -> io::Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no home directory"))?;
    let dir = home.join(".codeconsole").join("chats");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Ids name files in the chats directory: ASCII letters, digits, `-` and
/// `_` only, and never the index's name.
pub fn is_valid_chat_id(id: &str) -> bool {
    !id.is_empty()
        && id != INDEX_ID
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn chat_file(dir: &Path, id: &str) -> io::Result<PathBuf> {
    if !is_valid_chat_id(id) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid chat id: {id:?}"),
        ));
    }
    Ok(dir.join(format!("{id}.json")))
}

fn atomic_write_json<T: Serialize>(path: &Path, data: &T) -> io::Result<()> {
    let tmp_path = path.with_extension("tmp");
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, path)
}

/// Write a chat and refresh its index entry. An empty chat is never written;
/// if an earlier save of it exists, that save is deleted.
pub fn save_chat(dir: &Path, chat: &Chat) -> io::Result<()> {
    let path = chat_file(dir, &chat.id)?;
    if chat.is_empty() {
        if path.exists() {
            debug!("Chat {} emptied, removing saved copy", chat.id);
            return delete_chat(dir, &chat.id);
        }
        return Ok(());
    }
    atomic_write_json(&path, chat)?;

    let mut index = load_index(dir).unwrap_or_default();
    index.chats.retain(|c| c.id != chat.id);
    index.chats.push(ChatHeadline::from_chat(chat));
    index
        .chats
        .sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
    atomic_write_json(&dir.join(INDEX_FILE), &index)?;
    debug!("Chat saved: {}", chat.id);
    Ok(())
}

pub fn load_chat(dir: &Path, id: &str) -> io::Result<Chat> {
    let json = fs::read_to_string(chat_file(dir, id)?)?;
    serde_json::from_str(&json).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Delete a chat file and drop it from the index.
pub fn delete_chat(dir: &Path, id: &str) -> io::Result<()> {
    let path = chat_file(dir, id)?;
    if path.exists() {
        fs::remove_file(path)?;
    }
    let mut index = load_index(dir).unwrap_or_default();
    index.chats.retain(|c| c.id != id);
    atomic_write_json(&dir.join(INDEX_FILE), &index)
}

pub fn load_index(dir: &Path) -> io::Result<ChatIndex> {
    let path = dir.join(INDEX_FILE);
    if !path.exists() {
        return Ok(ChatIndex::default());
    }
    let json = fs::read_to_string(path)?;
    serde_json::from_str(&json).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Load a saved chat, or start a fresh one with the given id.
pub fn load_or_new(dir: Option<&Path>, id: &str) -> Chat {
    let Some(dir) = dir else {
        return Chat::new(id);
    };
    match load_chat(dir, id) {
        Ok(chat) => chat,
        Err(e) if e.kind() == io::ErrorKind::NotFound => Chat::new(id),
        Err(e) => {
            warn!("Failed to load chat {}: {}", id, e);
            Chat::new(id)
        }
    }
}
