//! # Core Application Logic
//!
//! Business logic of codeconsole. Knows nothing about any specific UI
//! technology.
//!
//! ```text
//!                    ┌──────────────────────────┐
//!                    │          CORE            │
//!                    │                          │
//!                    │  • chat (data model)     │
//!                    │  • store (ChatStore)     │
//!                    │  • action + update()     │
//!                    │  • project, router       │
//!                    └────────────┬─────────────┘
//!                                 │ Effects
//!                                 ▼
//!                    ┌──────────────────────────┐
//!                    │   TUI (ratatui) loop     │
//!                    │  runs code, saves chats  │
//!                    └──────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`chat`]: chats, message groups, messages, outputs
//! - [`store`]: the `ChatStore` trait components talk to
//! - [`state`]: the `App` struct, the concrete store
//! - [`action`]: the `Action` enum and the `update()` reducer
//! - [`runner`]: executes code messages and streams their output
//! - [`router`]: `/chats/<id>` navigation
//! - [`project`]: new/open project decisions
//! - [`chats`]: chat persistence
//! - [`config`]: settings resolution

pub mod action;
pub mod chat;
pub mod chats;
pub mod config;
pub mod project;
pub mod router;
pub mod runner;
pub mod state;
pub mod store;
