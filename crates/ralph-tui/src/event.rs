//! Keyboard input mapping for the Ralph TUI.
//!
//! Translates crossterm key events into [`AppEvent`]s. Which screen an
//! event applies to is decided later by the navigation reducer.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Application-level input events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// Move selection or focus up
    NavigateUp,
    /// Move selection or focus down
    NavigateDown,
    /// Previous tab (`h`, left arrow)
    NavigateLeft,
    /// Next tab (`l`, right arrow)
    NavigateRight,
    /// Tab key
    NextTab,
    /// Shift+Tab
    PrevTab,
    /// Digit key, 1-based
    JumpTab(u8),
    /// Enter
    Select,
    /// Space
    Toggle,
    /// Escape: close, then go back
    Cancel,
    /// Show help overlay
    ShowHelp,
    /// Re-poll immediately
    Refresh,
    /// Request application quit
    Quit,
    /// Force quit (Ctrl+C)
    ForceQuit,
    /// Screen-specific letter command (`d`, `n`, `e`, `f`, `s`, `y`, ...)
    Command(char),
    /// Character typed into a text field
    TextInput(char),
    /// Backspace in a text field
    Backspace,
    /// No action needed
    None,
}

/// Converts key events to app events.
#[derive(Debug, Default)]
pub struct InputHandler {
    /// Whether a text field currently has focus
    text_mode: bool,
}

impl InputHandler {
    pub fn new() -> Self {
        Self { text_mode: false }
    }

    /// Set whether a text field has focus.
    pub fn set_text_mode(&mut self, active: bool) {
        self.text_mode = active;
    }

    pub fn is_text_mode(&self) -> bool {
        self.text_mode
    }

    /// Handle a key event and return the corresponding app event.
    pub fn handle_key(&mut self, key: KeyEvent) -> AppEvent {
        if key.kind == KeyEventKind::Release {
            return AppEvent::None;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return AppEvent::ForceQuit;
        }

        if key.code == KeyCode::Esc {
            return AppEvent::Cancel;
        }

        if self.text_mode {
            return self.handle_text_input(key);
        }

        self.handle_normal_mode(key)
    }

    /// Every printable character is text; only structural keys navigate.
    fn handle_text_input(&self, key: KeyEvent) -> AppEvent {
        match key.code {
            KeyCode::Char(c) => AppEvent::TextInput(c),
            KeyCode::Backspace => AppEvent::Backspace,
            KeyCode::Enter => AppEvent::Select,
            KeyCode::Up => AppEvent::NavigateUp,
            KeyCode::Down => AppEvent::NavigateDown,
            KeyCode::Left => AppEvent::NavigateLeft,
            KeyCode::Right => AppEvent::NavigateRight,
            KeyCode::Tab => tab_event(key),
            KeyCode::BackTab => AppEvent::PrevTab,
            _ => AppEvent::None,
        }
    }

    fn handle_normal_mode(&self, key: KeyEvent) -> AppEvent {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => AppEvent::Quit,
            KeyCode::Char('?') => AppEvent::ShowHelp,
            KeyCode::Char('r') | KeyCode::Char('R') => AppEvent::Refresh,

            KeyCode::Up | KeyCode::Char('k') => AppEvent::NavigateUp,
            KeyCode::Down | KeyCode::Char('j') => AppEvent::NavigateDown,
            KeyCode::Left | KeyCode::Char('h') => AppEvent::NavigateLeft,
            KeyCode::Right | KeyCode::Char('l') => AppEvent::NavigateRight,

            KeyCode::Tab => tab_event(key),
            KeyCode::BackTab => AppEvent::PrevTab,

            KeyCode::Char(c @ '1'..='9') => AppEvent::JumpTab(c as u8 - b'0'),

            KeyCode::Enter => AppEvent::Select,
            KeyCode::Char(' ') => AppEvent::Toggle,

            KeyCode::Char(c) => AppEvent::Command(c),
            _ => AppEvent::None,
        }
    }
}

fn tab_event(key: KeyEvent) -> AppEvent {
    if key.modifiers.contains(KeyModifiers::SHIFT) {
        AppEvent::PrevTab
    } else {
        AppEvent::NextTab
    }
}
