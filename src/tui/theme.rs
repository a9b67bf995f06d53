//! TUI color semantics and style constants.
//!
//! Color semantics:
//! - Green: success, live link
//! - Red: errors, rejected input
//! - White: informational log entries
//! - Cyan: interactive elements (keybinding hints, focused control)
//! - Dim: timestamps, idle controls

use ratatui::style::{Color, Modifier, Style};

use crate::logbook::Severity;

// ============================================================================
// SEMANTIC STYLES
// ============================================================================

pub const STYLE_SUCCESS: Style = Style::new().fg(Color::Green);

pub const STYLE_ERROR: Style = Style::new().fg(Color::Red);

pub const STYLE_INFO: Style = Style::new().fg(Color::White);

/// Interactive element, keybinding hint.
pub const STYLE_INTERACTIVE: Style = Style::new().fg(Color::Cyan);

/// De-emphasized metadata.
pub const STYLE_DIM: Style = Style::new().fg(Color::DarkGray);

// ============================================================================
// UI ELEMENT STYLES
// ============================================================================

/// Title bar / header.
pub const STYLE_TITLE: Style = Style::new().fg(Color::White).add_modifier(Modifier::BOLD);

/// Cursor row in the port picker, selected shortcut key.
pub const STYLE_CURSOR: Style = Style::new().add_modifier(Modifier::REVERSED);

/// Border of the control that has the keyboard.
pub const STYLE_FOCUSED: Style = Style::new().fg(Color::Cyan).add_modifier(Modifier::BOLD);

/// Link status badges.
pub const STYLE_CONNECTED: Style = Style::new().fg(Color::Green).add_modifier(Modifier::BOLD);
pub const STYLE_DISCONNECTED: Style = Style::new().fg(Color::DarkGray);

/// Footer / help line.
pub const STYLE_HELP: Style = Style::new().fg(Color::DarkGray);

/// Log line color for a severity.
pub fn severity_style(severity: Severity) -> Style {
    match severity {
        Severity::Info => STYLE_INFO,
        Severity::Success => STYLE_SUCCESS,
        Severity::Error => STYLE_ERROR,
    }
}

// ============================================================================
// TESTS
// ============================================================================
