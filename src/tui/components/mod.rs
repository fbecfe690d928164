//! # TUI Components
//!
//! All UI components for the terminal interface.
//!
//! ## Component Architecture
//!
//! Components in this directory follow two patterns:
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! Display-only widgets that receive all data as fields:
//! - `TopBar`: one-line status bar
//! - `TextMessageView`: a prose message
//! - `CodeOutput`: one output record of a code run
//!
//! ### Stateful Components (Persistent State + Transient Wrapper)
//!
//! The state struct lives in `TuiState`; a wrapper borrowing it (plus props)
//! is created each frame or per event:
//! - `CodeMessageState` / `CodeMessageView` + `CodeMessageActions`
//! - `EditableContentState` / `EditableContentView` + `EditableContent`
//! - `TranscriptState` / `Transcript`
//! - `SideBarState` / `SideBar`
//! - `ChatPageState` / `ChatPage`
//! - `ProjectFileManager` (core) / `ProjectButtons`
//!
//! `CommandInput` owns its buffer directly.
//!
//! ## Store Access
//!
//! Components that issue commands take a `&mut dyn ChatStore` prop. None of
//! them reach for global state, so tests inject a recording fake.
//!
//! ## Module Structure
//!
//! ```text
//! components/
//! ├── mod.rs              (this file)
//! ├── chat_page.rs        (page layout, focus, auto-scroll flag)
//! ├── top_bar.rs          (status line)
//! ├── side_bar.rs         (saved chats)
//! ├── transcript.rs       (scrollable message groups)
//! ├── text_message.rs     (prose message)
//! ├── code_message.rs     (fold, run controls, outputs)
//! ├── editable_content.rs (highlighted code with in-place editing)
//! ├── code_output.rs      (one output record)
//! ├── command_input.rs    (multi-line input)
//! ├── text_buffer.rs      (shared editing buffer)
//! └── project_buttons.rs  (new/open project + confirmation dialogs)
//! ```

pub mod chat_page;
pub mod code_message;
pub mod code_output;
pub mod command_input;
pub mod editable_content;
pub mod project_buttons;
pub mod side_bar;
pub mod text_buffer;
pub mod text_message;
pub mod top_bar;
pub mod transcript;

pub use chat_page::{ChatPage, ChatPageEvent, ChatPageState};
pub use project_buttons::{ProjectButtons, ProjectEvent};
pub use side_bar::SideBarState;
