//! # Chat Store Contract
//!
//! The operations a code message may invoke on the shared store. Components
//! receive a `&mut dyn ChatStore` instead of reaching for a global, so any
//! implementation (the real [`App`](crate::core::state::App) or a recording
//! fake in tests) can be injected.
//!
//! All mutating operations are fire-and-forget: failures surface later as
//! changed state (an error output, unchanged content), never as a return value.

pub trait ChatStore {
    /// Session-wide "always execute code" preference.
    fn always_execute_code(&self) -> bool;

    /// Whether the code message may be run right now. Derived, never stored.
    fn is_viable_for_running_code(&self, group_id: &str, message_id: &str) -> bool;

    /// Replace a message's content. No validation happens here.
    fn edit_message_content(&mut self, group_id: &str, message_id: &str, content: String);

    /// Remove a message from its group.
    fn remove_message_from_group(&mut self, group_id: &str, message_id: &str);

    /// Request a run of the code message.
    fn do_run(&mut self, group_id: &str, message_id: &str);

    /// Turn on the "always execute code" preference for the rest of the session.
    fn enable_auto_code_execution(&mut self);
}
