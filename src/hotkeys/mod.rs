//! Hotkey system
//!
//! Maps key presses to timeline actions, independent of any windowing
//! toolkit. The host translates its native key events into [`Key`] and
//! [`Modifiers`] and hands the resulting [`HotkeyAction`] to
//! `TimelineEditor::apply_hotkey`.
//!
//! # Adding New Hotkeys
//!
//! 1. Add a variant to `HotkeyAction`
//! 2. Add the key binding in `handle_hotkey()`
//! 3. Handle the action in `TimelineEditor::apply_hotkey`

/// A pressed key, reduced to what the bindings care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    /// A printable character as produced by the keyboard layout
    Character(String),
    Delete,
    Backspace,
    Escape,
    ArrowUp,
    ArrowDown,
    Other,
}

impl Key {
    pub fn character(c: impl Into<String>) -> Self {
        Key::Character(c.into())
    }

    fn is_char(&self, expected: &str) -> bool {
        matches!(self, Key::Character(c) if c.eq_ignore_ascii_case(expected))
    }
}

/// Modifier keys held during a press.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub fn command() -> Self {
        Self {
            ctrl: true,
            ..Self::default()
        }
    }

    pub fn alt() -> Self {
        Self {
            alt: true,
            ..Self::default()
        }
    }

    /// Ctrl on Linux/Windows, Cmd on macOS.
    fn is_command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Semantic actions, decoupled from the keys that trigger them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyAction {
    /// Zoom in on the timeline (increase pixels per second)
    TimelineZoomIn,
    /// Zoom out on the timeline (decrease pixels per second)
    TimelineZoomOut,
    /// Toggle playback.
    PlayPause,
    /// Split the selected clip at the playhead.
    SplitAtPlayhead,
    DeleteSelection,
    CopySelection,
    /// Paste the clipboard clip at the playhead.
    Paste,
    /// Move the selected clip to the nearest free lane above.
    MoveClipUp,
    /// Move the selected clip to the nearest free lane below.
    MoveClipDown,
    /// Abort the active drag or resize.
    CancelGesture,
}

/// Context information that affects which hotkeys are active.
#[derive(Debug, Clone, Default)]
pub struct HotkeyContext {
    /// Whether a clip is selected
    pub has_selection: bool,
    /// Whether the clipboard holds a clip
    pub has_clipboard: bool,
    /// Whether a drag or resize is in progress
    pub gesture_active: bool,
    /// Whether an input field has focus (suppresses every hotkey)
    pub input_focused: bool,
}

/// Result of processing a key event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotkeyResult {
    /// A hotkey action was matched and should be executed
    Action(HotkeyAction),
    /// No matching hotkey for this key/context combination
    NoMatch,
    /// Hotkey would match but is suppressed (e.g., input field focused)
    Suppressed,
}

/// Maps a key press to an action, considering the current context.
pub fn handle_hotkey(key: &Key, modifiers: Modifiers, context: &HotkeyContext) -> HotkeyResult {
    if context.input_focused {
        return HotkeyResult::Suppressed;
    }

    // Global
    if !modifiers.is_command() {
        match key {
            Key::Character(c) if c == "+" || c == "=" => return HotkeyResult::Action(HotkeyAction::TimelineZoomIn),
            Key::Character(c) if c == "-" => return HotkeyResult::Action(HotkeyAction::TimelineZoomOut),
            Key::Character(c) if c == " " => return HotkeyResult::Action(HotkeyAction::PlayPause),
            _ => {}
        }
    }

    if context.gesture_active && *key == Key::Escape {
        return HotkeyResult::Action(HotkeyAction::CancelGesture);
    }

    if modifiers.is_command() && key.is_char("v") && context.has_clipboard {
        return HotkeyResult::Action(HotkeyAction::Paste);
    }

    // Selection
    if context.has_selection {
        if modifiers.is_command() {
            if key.is_char("c") {
                return HotkeyResult::Action(HotkeyAction::CopySelection);
            }
        } else if modifiers.alt {
            match key {
                Key::ArrowUp => return HotkeyResult::Action(HotkeyAction::MoveClipUp),
                Key::ArrowDown => return HotkeyResult::Action(HotkeyAction::MoveClipDown),
                _ => {}
            }
        } else {
            match key {
                Key::Delete | Key::Backspace => return HotkeyResult::Action(HotkeyAction::DeleteSelection),
                k if k.is_char("s") => return HotkeyResult::Action(HotkeyAction::SplitAtPlayhead),
                _ => {}
            }
        }
    }

    HotkeyResult::NoMatch
}
