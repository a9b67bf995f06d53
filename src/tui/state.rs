//! TUI state algebra: pure types, zero effects.
//!
//! These types define the whole panel state space. The transition function
//! and the rendering layer both program against them.
//!
//! Screen variants carry per-screen transient state (focus, field text,
//! picker cursor). Shared data (the log, the link status) lives in App.

use crossterm::event::KeyEvent;

use crate::error::CapabilityUnsupported;
use crate::input::{InputKind, SHORTCUTS};
use crate::logbook::{LogBook, LogEntry};
use crate::session::SessionEvent;
use crate::types::{PortEntry, SessionState};

// ============================================================================
// APP EVENTS
// ============================================================================

/// Everything the event loop can receive from its channel.
///
/// Two producers feed a single mpsc channel:
/// - the key reader thread sends `Key`
/// - the session (event-loop thread and its reader thread) sends `Session`
#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Session(SessionEvent),
}

// ============================================================================
// APPLICATION STATE
// ============================================================================

/// Whether the host can do serial I/O at all. Decided once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    Supported,
    Unsupported { reason: String },
}

/// Top-level TUI model.
#[derive(Debug)]
pub struct App {
    pub screen: Screen,
    pub log: LogBook,
    /// Mirror of the session state, refreshed after every event.
    pub link: SessionState,
    pub port: Option<String>,
    pub capability: Capability,
    /// Pre-selected in the port picker when listed.
    pub preferred_port: Option<String>,
    pub should_quit: bool,
}

/// Read-only view of App handed to the transition function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    pub link: SessionState,
    pub supported: bool,
}

// ============================================================================
// SCREENS
// ============================================================================

/// Which control has the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Letter,
    Word,
    Manual,
    /// Letter shortcut grid; `index` into [`SHORTCUTS`].
    Shortcuts { index: usize },
}

impl Focus {
    /// Input kind behind a text field. None for the shortcut grid.
    pub fn kind(self) -> Option<InputKind> {
        match self {
            Focus::Letter => Some(InputKind::Letter),
            Focus::Word => Some(InputKind::Word),
            Focus::Manual => Some(InputKind::Manual),
            Focus::Shortcuts { .. } => None,
        }
    }

    /// Shortcut letter under the cursor, if the grid has focus.
    pub fn shortcut(self) -> Option<char> {
        match self {
            Focus::Shortcuts { index } => SHORTCUTS.get(index).copied(),
            _ => None,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Focus::Letter => Focus::Word,
            Focus::Word => Focus::Manual,
            Focus::Manual => Focus::Shortcuts { index: 0 },
            Focus::Shortcuts { .. } => Focus::Letter,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Focus::Letter => Focus::Shortcuts { index: 0 },
            Focus::Word => Focus::Letter,
            Focus::Manual => Focus::Word,
            Focus::Shortcuts { .. } => Focus::Manual,
        }
    }
}

/// Text of the three input fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inputs {
    pub letter: String,
    pub word: String,
    pub manual: String,
}

impl Inputs {
    pub fn get(&self, kind: InputKind) -> &str {
        match kind {
            InputKind::Letter => &self.letter,
            InputKind::Word => &self.word,
            InputKind::Manual => &self.manual,
        }
    }

    pub fn get_mut(&mut self, kind: InputKind) -> &mut String {
        match kind {
            InputKind::Letter => &mut self.letter,
            InputKind::Word => &mut self.word,
            InputKind::Manual => &mut self.manual,
        }
    }
}

/// The main control panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Panel {
    pub focus: Focus,
    pub inputs: Inputs,
}

/// The current TUI screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Fields, shortcuts, log.
    Panel(Panel),

    /// Operator picks a port to connect to. Carries the panel to return to.
    PortPicker {
        ports: Vec<PortEntry>,
        cursor: usize,
        panel: Panel,
    },
}

/// Default screen is an empty panel (placeholder during transitions).
impl Default for Screen {
    fn default() -> Self {
        Screen::Panel(Panel::default())
    }
}

impl Screen {
    /// The panel this screen shows or returns to.
    pub fn into_panel(self) -> Panel {
        match self {
            Screen::Panel(panel) => panel,
            Screen::PortPicker { panel, .. } => panel,
        }
    }
}

// ============================================================================
// ACTIONS
// ============================================================================

/// Semantic user action, decoupled from raw key events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Printable character.
    Char(char),
    Backspace,
    /// Enter: send the focused field, pick the port.
    Submit,
    NextField,
    PrevField,
    Left,
    Right,
    Up,
    Down,
    /// Esc: leave the picker.
    Back,
    /// The connect / disconnect control.
    ToggleConnection,
    ClearLog,
    Quit,
}

// ============================================================================
// TRANSITIONS
// ============================================================================

/// Result of a pure state transition.
#[derive(Debug, PartialEq)]
pub enum Transition {
    /// Render this screen (may be the same or a different screen).
    Screen(Screen),
    /// Quit the application.
    Quit,
    /// Show this screen, then run the effect.
    Effect(Screen, Effect),
}

/// Side effect requested by a pure transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Hand a validated line to the session.
    Send(String),
    /// Log a rejected input.
    Reject(String),
    /// List ports and show the picker.
    OpenPicker,
    /// Re-list ports while the picker is open.
    RefreshPorts,
    Connect { port: String },
    /// Operator left the picker without choosing.
    CancelPicker,
    Disconnect,
    ClearLog,
}

// ============================================================================
// CONSTRUCTORS
// ============================================================================

impl App {
    /// Fresh panel with exactly one startup log entry: a hint when serial
    /// is available, the reason otherwise.
    pub fn new(capability: Capability, log_capacity: usize) -> Self {
        let mut log = LogBook::with_capacity(log_capacity);
        match &capability {
            Capability::Supported => {
                log.push(LogEntry::info("Press Ctrl+O to connect to a serial port"));
            }
            Capability::Unsupported { reason } => {
                let err = CapabilityUnsupported {
                    reason: reason.clone(),
                };
                log.push(LogEntry::error(err.to_string()));
            }
        }

        App {
            screen: Screen::default(),
            log,
            link: SessionState::Disconnected,
            port: None,
            capability,
            preferred_port: None,
            should_quit: false,
        }
    }

    pub fn with_preferred_port(mut self, port: Option<String>) -> Self {
        self.preferred_port = port;
        self
    }

    pub fn context(&self) -> Context {
        Context {
            link: self.link,
            supported: self.capability == Capability::Supported,
        }
    }

    /// Refresh the link mirror from the session.
    pub fn sync(&mut self, link: SessionState, port: Option<&str>) {
        self.link = link;
        self.port = port.map(str::to_string);
    }

    /// Picker cursor start: the preferred port if listed, else the top.
    pub fn preferred_index(&self, ports: &[PortEntry]) -> usize {
        self.preferred_port
            .as_deref()
            .and_then(|name| ports.iter().position(|p| p.name == name))
            .unwrap_or(0)
    }
}

// ============================================================================
// TESTS
// ============================================================================
