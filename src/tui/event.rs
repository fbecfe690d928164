use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseEventKind};
use log::{debug, warn};

/// TUI-specific input events. Components decide what each one means for them.
#[derive(Debug, Clone, PartialEq)]
pub enum TuiEvent {
    /// Ctrl+C, quits from anywhere.
    ForceQuit,
    Escape,
    Enter,
    /// Ctrl+J (Shift+Enter in terminals with keyboard enhancement).
    Newline,
    /// Ctrl+S, accepts an in-place edit.
    Accept,
    /// Tab, moves focus to the next pane.
    FocusNext,
    /// Ctrl+T
    NewChat,
    /// Ctrl+N
    NewProject,
    /// Ctrl+O
    OpenProject,

    InputChar(char),
    Paste(String), // Bracketed paste - preserves newlines
    Backspace,
    Delete,
    CursorLeft,
    CursorRight,
    CursorUp,
    CursorDown,
    CursorHome,
    CursorEnd,
    ScrollPageUp,
    ScrollPageDown,
    MouseScrollUp,
    MouseScrollDown,
    Resize,
}

/// Poll for an event, blocking up to `timeout`.
pub fn poll_event_timeout(timeout: Duration) -> Option<TuiEvent> {
    match event::poll(timeout) {
        Ok(true) => {}
        Ok(false) => return None,
        Err(e) => {
            warn!("Event poll failed: {e}");
            return None;
        }
    }
    match event::read() {
        Ok(event) => translate(event),
        Err(e) => {
            warn!("Event read failed: {e}");
            None
        }
    }
}

/// Poll for an event without blocking (returns immediately)
pub fn poll_event_immediate() -> Option<TuiEvent> {
    poll_event_timeout(Duration::ZERO)
}

fn translate(event: Event) -> Option<TuiEvent> {
    match event {
        Event::Key(key) => {
            // Keyboard enhancement also reports releases
            if key.kind == KeyEventKind::Release {
                return None;
            }
            debug!("Key event: {:?} with modifiers {:?}", key.code, key.modifiers);
            let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
            match key.code {
                KeyCode::Char('c') if ctrl => Some(TuiEvent::ForceQuit),
                KeyCode::Char('j') if ctrl => Some(TuiEvent::Newline),
                KeyCode::Char('s') if ctrl => Some(TuiEvent::Accept),
                KeyCode::Char('t') if ctrl => Some(TuiEvent::NewChat),
                KeyCode::Char('n') if ctrl => Some(TuiEvent::NewProject),
                KeyCode::Char('o') if ctrl => Some(TuiEvent::OpenProject),
                KeyCode::Char(_) if ctrl => None,
                KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => {
                    Some(TuiEvent::Newline)
                }
                KeyCode::Char(c) => Some(TuiEvent::InputChar(c)),
                KeyCode::Enter => Some(TuiEvent::Enter),
                KeyCode::Esc => Some(TuiEvent::Escape),
                KeyCode::Tab => Some(TuiEvent::FocusNext),
                KeyCode::Backspace => Some(TuiEvent::Backspace),
                KeyCode::Delete => Some(TuiEvent::Delete),
                KeyCode::Left => Some(TuiEvent::CursorLeft),
                KeyCode::Right => Some(TuiEvent::CursorRight),
                KeyCode::Up => Some(TuiEvent::CursorUp),
                KeyCode::Down => Some(TuiEvent::CursorDown),
                KeyCode::Home => Some(TuiEvent::CursorHome),
                KeyCode::End => Some(TuiEvent::CursorEnd),
                KeyCode::PageUp => Some(TuiEvent::ScrollPageUp),
                KeyCode::PageDown => Some(TuiEvent::ScrollPageDown),
                _ => None,
            }
        }
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::ScrollUp => Some(TuiEvent::MouseScrollUp),
            MouseEventKind::ScrollDown => Some(TuiEvent::MouseScrollDown),
            _ => None,
        },
        Event::Paste(data) => Some(TuiEvent::Paste(data)),
        Event::Resize(..) => Some(TuiEvent::Resize),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEvent;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn control_shortcuts() {
        assert_eq!(
            translate(key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(TuiEvent::ForceQuit)
        );
        assert_eq!(
            translate(key(KeyCode::Char('s'), KeyModifiers::CONTROL)),
            Some(TuiEvent::Accept)
        );
        assert_eq!(
            translate(key(KeyCode::Char('j'), KeyModifiers::CONTROL)),
            Some(TuiEvent::Newline)
        );
        assert_eq!(translate(key(KeyCode::Char('x'), KeyModifiers::CONTROL)), None);
    }

    #[test]
    fn plain_keys() {
        assert_eq!(
            translate(key(KeyCode::Char('r'), KeyModifiers::NONE)),
            Some(TuiEvent::InputChar('r'))
        );
        assert_eq!(
            translate(key(KeyCode::Char('R'), KeyModifiers::SHIFT)),
            Some(TuiEvent::InputChar('R'))
        );
        assert_eq!(translate(key(KeyCode::Enter, KeyModifiers::NONE)), Some(TuiEvent::Enter));
        assert_eq!(
            translate(key(KeyCode::Enter, KeyModifiers::SHIFT)),
            Some(TuiEvent::Newline)
        );
        assert_eq!(translate(key(KeyCode::Tab, KeyModifiers::NONE)), Some(TuiEvent::FocusNext));
    }

    #[test]
    fn key_release_is_ignored() {
        let mut release = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert_eq!(translate(Event::Key(release)), None);
    }
}
