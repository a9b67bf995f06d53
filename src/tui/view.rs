//! Pure rendering: map App state to ratatui widget trees.
//!
//! The panel and the port picker share the title and help bars. Widget
//! builders are pure (state in, widgets out); the only effect is
//! Frame::render_widget() which writes to the terminal buffer.

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Wrap};
use ratatui::Frame;

use crate::input::{InputKind, SHORTCUTS};
use crate::logbook::LogBook;
use crate::session::BAUD_RATE;
use crate::types::{PortEntry, SessionState};

use super::state::{App, Capability, Focus, Panel, Screen};
use super::theme;
use super::update::SHORTCUT_ROW;

/// Width of the controls column.
const CONTROLS_WIDTH: u16 = 44;

// ============================================================================
// DISPATCH
// ============================================================================

/// Render the current screen to the terminal frame.
pub fn render(app: &App, frame: &mut Frame) {
    let chunks = Layout::vertical([
        Constraint::Length(1), // title
        Constraint::Min(0),    // content
        Constraint::Length(1), // help
    ])
    .split(frame.area());

    frame.render_widget(render_title(app), chunks[0]);
    frame.render_widget(render_help(app), chunks[2]);

    let content = Layout::horizontal([Constraint::Length(CONTROLS_WIDTH), Constraint::Min(0)])
        .split(chunks[1]);

    match &app.screen {
        Screen::Panel(panel) => render_controls(panel, frame, content[0]),
        Screen::PortPicker { ports, cursor, .. } => {
            render_picker(ports, *cursor, frame, content[0])
        }
    }
    render_log(&app.log, frame, content[1]);
}

// ============================================================================
// SHARED LAYOUT
// ============================================================================

/// App name plus link status.
fn render_title(app: &App) -> Paragraph<'static> {
    let status = match (&app.capability, app.link, app.port.as_deref()) {
        (Capability::Unsupported { .. }, _, _) => {
            Span::styled("✕ Serial unavailable", theme::STYLE_ERROR)
        }
        (_, SessionState::Connected, Some(port)) => Span::styled(
            format!("● Connected {} @ {}", port, BAUD_RATE),
            theme::STYLE_CONNECTED,
        ),
        (_, SessionState::Connecting, _) => Span::styled("◌ Connecting...", theme::STYLE_DIM),
        _ => Span::styled("○ Disconnected", theme::STYLE_DISCONNECTED),
    };

    Paragraph::new(Line::from(vec![
        Span::styled("serial-panel", theme::STYLE_TITLE),
        Span::raw("  "),
        status,
    ]))
}

/// Keybindings for the current screen.
fn render_help(app: &App) -> Paragraph<'static> {
    let help_text = match &app.screen {
        Screen::PortPicker { .. } => "[j/k] move  [Enter] connect  [r] refresh  [Esc] cancel",
        Screen::Panel(_) => match (&app.capability, app.link.is_connected()) {
            (Capability::Unsupported { .. }, _) => {
                "[Tab] next field  [^L] clear log  [^Q] quit"
            }
            (_, true) => {
                "[Tab] next field  [Enter] send  [^O] disconnect  [^L] clear log  [^Q] quit"
            }
            (_, false) => {
                "[Tab] next field  [Enter] send  [^O] connect  [^L] clear log  [^Q] quit"
            }
        },
    };

    Paragraph::new(Span::styled(help_text, theme::STYLE_HELP))
}

fn bordered(title: String, focused: bool) -> Block<'static> {
    let style = if focused {
        theme::STYLE_FOCUSED
    } else {
        theme::STYLE_DIM
    };
    Block::bordered().title(title).border_style(style)
}

// ============================================================================
// SCREEN: PANEL
// ============================================================================

fn render_controls(panel: &Panel, frame: &mut Frame, area: Rect) {
    let chunks = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(4), // two shortcut rows
        Constraint::Min(0),
    ])
    .split(area);

    let fields = [
        (Focus::Letter, InputKind::Letter),
        (Focus::Word, InputKind::Word),
        (Focus::Manual, InputKind::Manual),
    ];
    for (i, (focus, kind)) in fields.into_iter().enumerate() {
        let focused = panel.focus == focus;
        frame.render_widget(render_field(kind, panel.inputs.get(kind), focused), chunks[i]);
    }

    let selected = match panel.focus {
        Focus::Shortcuts { index } => Some(index),
        _ => None,
    };
    frame.render_widget(render_shortcuts(selected), chunks[3]);
}

fn render_field(kind: InputKind, text: &str, focused: bool) -> Paragraph<'static> {
    let mut spans = vec![Span::raw(text.to_string())];
    if focused {
        spans.push(Span::styled("_", theme::STYLE_INTERACTIVE));
    }
    Paragraph::new(Line::from(spans)).block(bordered(format!(" {} ", kind.label()), focused))
}

/// A-Z in two rows. `selected` is highlighted when the grid has focus.
fn render_shortcuts(selected: Option<usize>) -> Paragraph<'static> {
    let lines: Vec<Line> = SHORTCUTS
        .chunks(SHORTCUT_ROW)
        .enumerate()
        .map(|(row, letters)| {
            let spans: Vec<Span> = letters
                .iter()
                .enumerate()
                .map(|(col, letter)| {
                    let index = row * SHORTCUT_ROW + col;
                    let text = format!(" {} ", letter);
                    if selected == Some(index) {
                        Span::styled(text, theme::STYLE_CURSOR)
                    } else {
                        Span::styled(text, theme::STYLE_INTERACTIVE)
                    }
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    Paragraph::new(lines).block(bordered(" Shortcuts ".to_string(), selected.is_some()))
}

// ============================================================================
// SCREEN: PORT PICKER
// ============================================================================

fn render_picker(ports: &[PortEntry], cursor: usize, frame: &mut Frame, area: Rect) {
    let block = bordered(" Select port ".to_string(), true);

    let mut lines: Vec<Line> = ports
        .iter()
        .enumerate()
        .map(|(i, port)| {
            if i == cursor {
                Line::from(format!("> {}", port.label())).style(theme::STYLE_CURSOR)
            } else {
                Line::from(format!("  {}", port.label()))
            }
        })
        .collect();

    if ports.is_empty() {
        lines.push(Line::from(Span::styled(
            "No serial ports found.",
            theme::STYLE_DIM,
        )));
    }

    // Keep the cursor row visible
    let visible_height = area.height.saturating_sub(2) as usize;
    let scroll_offset = if visible_height > 0 && cursor >= visible_height {
        cursor - visible_height + 1
    } else {
        0
    };

    let list = Paragraph::new(lines)
        .block(block)
        .scroll((scroll_offset as u16, 0));
    frame.render_widget(list, area);
}

// ============================================================================
// LOG
// ============================================================================

fn render_log(log: &LogBook, frame: &mut Frame, area: Rect) {
    let block = bordered(format!(" Log ({}) ", log.len()), false);

    let lines: Vec<Line> = if log.is_empty() {
        vec![Line::from(Span::styled("No messages yet...", theme::STYLE_DIM))]
    } else {
        log.iter()
            .map(|entry| {
                Line::from(vec![
                    Span::styled(entry.time(), theme::STYLE_DIM),
                    Span::raw("  "),
                    Span::styled(entry.message.clone(), theme::severity_style(entry.severity)),
                ])
            })
            .collect()
    };

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

// ============================================================================
// TESTS
// ============================================================================
