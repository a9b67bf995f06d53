//! Pure state transitions: (Screen, Action) -> Transition.
//!
//! This is the core logic of the panel. Fully testable without a terminal
//! or a serial port. Unhandled actions return the current screen unchanged.

use crate::input::{validate, SHORTCUTS};
use crate::logbook::LogEntry;
use crate::session::SessionEvent;
use crate::types::PortEntry;

use super::state::{Action, App, Context, Effect, Focus, Panel, Screen, Transition};

/// Shortcut grid width; Up/Down move by one row.
pub const SHORTCUT_ROW: usize = 13;

/// Pure state transition function.
pub fn update(screen: Screen, action: &Action, ctx: &Context) -> Transition {
    match screen {
        Screen::Panel(panel) => update_panel(panel, action, ctx),
        Screen::PortPicker {
            ports,
            cursor,
            panel,
        } => update_picker(ports, cursor, panel, action),
    }
}

// ============================================================================
// PER-SCREEN HANDLERS
// ============================================================================

fn update_panel(mut panel: Panel, action: &Action, ctx: &Context) -> Transition {
    match action {
        Action::Quit => Transition::Quit,
        Action::ToggleConnection => {
            if !ctx.supported {
                // Connect control is disabled
                Transition::Screen(Screen::Panel(panel))
            } else if ctx.link.is_connected() {
                Transition::Effect(Screen::Panel(panel), Effect::Disconnect)
            } else {
                Transition::Effect(Screen::Panel(panel), Effect::OpenPicker)
            }
        }
        Action::ClearLog => Transition::Effect(Screen::Panel(panel), Effect::ClearLog),
        Action::NextField => {
            panel.focus = panel.focus.next();
            Transition::Screen(Screen::Panel(panel))
        }
        Action::PrevField => {
            panel.focus = panel.focus.prev();
            Transition::Screen(Screen::Panel(panel))
        }
        Action::Submit => submit(panel),
        _ => match panel.focus {
            Focus::Shortcuts { index } => {
                let index = move_shortcut(index, action);
                if *action == Action::Char(' ') {
                    return submit(panel);
                }
                panel.focus = Focus::Shortcuts { index };
                Transition::Screen(Screen::Panel(panel))
            }
            focus => {
                if let Some(kind) = focus.kind() {
                    let field = panel.inputs.get_mut(kind);
                    match action {
                        Action::Char(c) => field.push(*c),
                        Action::Backspace => {
                            field.pop();
                        }
                        _ => {}
                    }
                }
                Transition::Screen(Screen::Panel(panel))
            }
        },
    }
}

/// Enter on the panel: validate the focused field or fire the shortcut.
///
/// A valid field is cleared; an invalid one keeps its text.
fn submit(mut panel: Panel) -> Transition {
    if let Some(letter) = panel.focus.shortcut() {
        return Transition::Effect(Screen::Panel(panel), Effect::Send(letter.to_string()));
    }

    let Some(kind) = panel.focus.kind() else {
        return Transition::Screen(Screen::Panel(panel));
    };

    match validate(kind, panel.inputs.get(kind)) {
        Ok(line) => {
            panel.inputs.get_mut(kind).clear();
            Transition::Effect(Screen::Panel(panel), Effect::Send(line))
        }
        Err(e) => Transition::Effect(Screen::Panel(panel), Effect::Reject(e.to_string())),
    }
}

/// Cursor movement inside the shortcut grid. Typing a letter jumps to it.
fn move_shortcut(index: usize, action: &Action) -> usize {
    let last = SHORTCUTS.len() - 1;
    match action {
        Action::Left => index.saturating_sub(1),
        Action::Right => (index + 1).min(last),
        Action::Up => index.saturating_sub(SHORTCUT_ROW),
        Action::Down => (index + SHORTCUT_ROW).min(last),
        Action::Char(c) => {
            let upper = c.to_ascii_uppercase();
            SHORTCUTS.iter().position(|&s| s == upper).unwrap_or(index)
        }
        _ => index,
    }
}

/// Picker: move, pick, refresh, or back out.
fn update_picker(
    ports: Vec<PortEntry>,
    cursor: usize,
    panel: Panel,
    action: &Action,
) -> Transition {
    let len = ports.len();

    match action {
        Action::Up | Action::Char('k') => Transition::Screen(Screen::PortPicker {
            ports,
            cursor: cursor.saturating_sub(1),
            panel,
        }),
        Action::Down | Action::Char('j') => {
            let cursor = if len == 0 { 0 } else { (cursor + 1).min(len - 1) };
            Transition::Screen(Screen::PortPicker {
                ports,
                cursor,
                panel,
            })
        }
        Action::Submit => match ports.get(cursor) {
            Some(port) => {
                let port = port.name.clone();
                Transition::Effect(Screen::Panel(panel), Effect::Connect { port })
            }
            None => Transition::Screen(Screen::PortPicker {
                ports,
                cursor,
                panel,
            }),
        },
        Action::Char('r') => Transition::Effect(
            Screen::PortPicker {
                ports,
                cursor,
                panel,
            },
            Effect::RefreshPorts,
        ),
        Action::Back | Action::ToggleConnection => {
            Transition::Effect(Screen::Panel(panel), Effect::CancelPicker)
        }
        Action::Quit => Transition::Quit,
        _ => Transition::Screen(Screen::PortPicker {
            ports,
            cursor,
            panel,
        }),
    }
}

// ============================================================================
// SESSION EVENTS
// ============================================================================

/// Turn a session notification into exactly one log entry.
///
/// `ReadStopped` is routed back to the session by the event loop and
/// never reaches the log directly.
pub fn handle_session_event(app: &mut App, event: SessionEvent) {
    let entry = match event {
        SessionEvent::Connected { port } => LogEntry::success(format!("Connected to {}", port)),
        SessionEvent::Disconnected => LogEntry::info("Disconnected"),
        SessionEvent::Sent { line } => LogEntry::success(format!("Sent: {}", line)),
        SessionEvent::Failed { message } => LogEntry::error(message),
        SessionEvent::ReadStopped { .. } => return,
    };
    app.log.push(entry);
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logbook::Severity;
    use crate::tui::state::{Capability, Inputs};
    use crate::types::SessionState;

    fn disconnected() -> Context {
        Context {
            link: SessionState::Disconnected,
            supported: true,
        }
    }

    fn connected() -> Context {
        Context {
            link: SessionState::Connected,
            supported: true,
        }
    }

    fn panel_with(focus: Focus, inputs: Inputs) -> Screen {
        Screen::Panel(Panel { focus, inputs })
    }

    fn typed(focus: Focus, text: &str) -> Screen {
        let mut screen = panel_with(focus, Inputs::default());
        for c in text.chars() {
            match update(screen, &Action::Char(c), &disconnected()) {
                Transition::Screen(s) => screen = s,
                other => panic!("typing produced {:?}", other),
            }
        }
        screen
    }

    fn picker(n: usize, cursor: usize) -> Screen {
        Screen::PortPicker {
            ports: (0..n).map(|i| PortEntry::named(format!("/dev/ttyACM{}", i))).collect(),
            cursor,
            panel: Panel::default(),
        }
    }

    // -- Connection control --

    #[test]
    fn toggle_opens_picker_when_disconnected() {
        let result = update(Screen::default(), &Action::ToggleConnection, &disconnected());
        assert_eq!(result, Transition::Effect(Screen::default(), Effect::OpenPicker));
    }

    #[test]
    fn toggle_disconnects_when_connected() {
        let result = update(Screen::default(), &Action::ToggleConnection, &connected());
        assert_eq!(result, Transition::Effect(Screen::default(), Effect::Disconnect));
    }

    #[test]
    fn toggle_is_disabled_without_capability() {
        let ctx = Context {
            link: SessionState::Disconnected,
            supported: false,
        };
        let result = update(Screen::default(), &Action::ToggleConnection, &ctx);
        assert_eq!(result, Transition::Screen(Screen::default()));
    }

    #[test]
    fn quit_from_panel() {
        assert_eq!(
            update(Screen::default(), &Action::Quit, &disconnected()),
            Transition::Quit
        );
    }

    // -- Fields --

    #[test]
    fn typing_fills_focused_field_only() {
        let screen = typed(Focus::Word, "hi");
        match screen {
            Screen::Panel(panel) => {
                assert_eq!(panel.inputs.word, "hi");
                assert!(panel.inputs.letter.is_empty());
                assert!(panel.inputs.manual.is_empty());
            }
            other => panic!("Expected Panel, got {:?}", other),
        }
    }

    #[test]
    fn backspace_removes_last_char() {
        let screen = typed(Focus::Manual, "ab");
        match update(screen, &Action::Backspace, &disconnected()) {
            Transition::Screen(Screen::Panel(panel)) => assert_eq!(panel.inputs.manual, "a"),
            other => panic!("Expected Panel, got {:?}", other),
        }
    }

    #[test]
    fn letter_a_is_sent_as_uppercase_and_field_cleared() {
        let screen = typed(Focus::Letter, "a");
        let result = update(screen, &Action::Submit, &connected());
        assert_eq!(
            result,
            Transition::Effect(
                panel_with(Focus::Letter, Inputs::default()),
                Effect::Send("A".into())
            )
        );
    }

    #[test]
    fn word_with_digit_is_rejected_and_kept() {
        let screen = typed(Focus::Word, "hello1");
        let result = update(screen, &Action::Submit, &connected());
        match result {
            Transition::Effect(Screen::Panel(panel), Effect::Reject(message)) => {
                assert_eq!(panel.inputs.word, "hello1");
                assert_eq!(message, "English letters only (A-Z)!");
            }
            other => panic!("Expected Reject, got {:?}", other),
        }
    }

    #[test]
    fn submit_does_not_check_connection() {
        // The session reports NotConnected; the panel only validates
        let screen = typed(Focus::Manual, " led on ");
        let result = update(screen, &Action::Submit, &disconnected());
        assert!(matches!(
            result,
            Transition::Effect(_, Effect::Send(ref line)) if line == "led on"
        ));
    }

    #[test]
    fn empty_letter_is_rejected() {
        let result = update(Screen::default(), &Action::Submit, &connected());
        assert_eq!(
            result,
            Transition::Effect(Screen::default(), Effect::Reject("Enter a letter first!".into()))
        );
    }

    #[test]
    fn tab_moves_focus() {
        let result = update(Screen::default(), &Action::NextField, &disconnected());
        assert_eq!(
            result,
            Transition::Screen(panel_with(Focus::Word, Inputs::default()))
        );
    }

    // -- Shortcuts --

    #[test]
    fn shortcut_enter_sends_label() {
        let screen = panel_with(Focus::Shortcuts { index: 7 }, Inputs::default());
        let result = update(screen.clone(), &Action::Submit, &connected());
        assert_eq!(result, Transition::Effect(screen, Effect::Send("H".into())));
    }

    #[test]
    fn shortcut_space_sends_label() {
        let screen = panel_with(Focus::Shortcuts { index: 0 }, Inputs::default());
        let result = update(screen.clone(), &Action::Char(' '), &connected());
        assert_eq!(result, Transition::Effect(screen, Effect::Send("A".into())));
    }

    #[test]
    fn shortcut_cursor_moves_and_clamps() {
        assert_eq!(move_shortcut(0, &Action::Left), 0);
        assert_eq!(move_shortcut(0, &Action::Right), 1);
        assert_eq!(move_shortcut(25, &Action::Right), 25);
        assert_eq!(move_shortcut(2, &Action::Down), 15);
        assert_eq!(move_shortcut(20, &Action::Down), 25);
        assert_eq!(move_shortcut(15, &Action::Up), 2);
        assert_eq!(move_shortcut(3, &Action::Up), 0);
    }

    #[test]
    fn typing_in_shortcuts_jumps_to_letter() {
        assert_eq!(move_shortcut(0, &Action::Char('q')), 16);
        assert_eq!(move_shortcut(4, &Action::Char('7')), 4);
    }

    // -- Picker --

    #[test]
    fn picker_cursor_clamps() {
        match update(picker(2, 1), &Action::Down, &disconnected()) {
            Transition::Screen(Screen::PortPicker { cursor, .. }) => assert_eq!(cursor, 1),
            other => panic!("Expected PortPicker, got {:?}", other),
        }
        match update(picker(2, 0), &Action::Char('k'), &disconnected()) {
            Transition::Screen(Screen::PortPicker { cursor, .. }) => assert_eq!(cursor, 0),
            other => panic!("Expected PortPicker, got {:?}", other),
        }
    }

    #[test]
    fn picker_enter_connects_to_port_under_cursor() {
        let result = update(picker(3, 2), &Action::Submit, &disconnected());
        assert_eq!(
            result,
            Transition::Effect(
                Screen::default(),
                Effect::Connect {
                    port: "/dev/ttyACM2".into()
                }
            )
        );
    }

    #[test]
    fn picker_enter_on_empty_list_stays() {
        let result = update(picker(0, 0), &Action::Submit, &disconnected());
        assert_eq!(result, Transition::Screen(picker(0, 0)));
    }

    #[test]
    fn picker_escape_cancels() {
        let result = update(picker(2, 0), &Action::Back, &disconnected());
        assert_eq!(result, Transition::Effect(Screen::default(), Effect::CancelPicker));
    }

    #[test]
    fn picker_r_refreshes() {
        let result = update(picker(1, 0), &Action::Char('r'), &disconnected());
        assert_eq!(result, Transition::Effect(picker(1, 0), Effect::RefreshPorts));
    }

    // -- Session events --

    #[test]
    fn each_session_event_logs_once() {
        let mut app = App::new(Capability::Supported, 50);
        app.log.clear();

        handle_session_event(&mut app, SessionEvent::Connected { port: "COM3".into() });
        handle_session_event(&mut app, SessionEvent::Sent { line: "A".into() });
        handle_session_event(&mut app, SessionEvent::Failed { message: "boom".into() });
        handle_session_event(&mut app, SessionEvent::Disconnected);

        let got: Vec<(Severity, &str)> = app
            .log
            .iter()
            .map(|e| (e.severity, e.message.as_str()))
            .collect();
        assert_eq!(
            got,
            vec![
                (Severity::Info, "Disconnected"),
                (Severity::Error, "boom"),
                (Severity::Success, "Sent: A"),
                (Severity::Success, "Connected to COM3"),
            ]
        );
    }

    #[test]
    fn read_stopped_is_not_logged() {
        let mut app = App::new(Capability::Supported, 50);
        let before = app.log.len();
        handle_session_event(
            &mut app,
            SessionEvent::ReadStopped {
                connection: 1,
                error: crate::error::ReadError::EndOfStream,
            },
        );
        assert_eq!(app.log.len(), before);
    }
}
