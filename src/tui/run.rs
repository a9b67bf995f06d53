//! TUI effects boundary: event loop, terminal lifecycle, key mapping.
//!
//! This is the only module with side effects. It wires the pure layers
//! (state, update, view) to the real terminal via crossterm and ratatui,
//! and owns the serial `Session`.
//!
//! Architecture: producers feed a single mpsc channel.
//! - Key reader thread: forwards crossterm key events
//! - Session: connect/send/disconnect outcomes, reader stops
//! The event loop consumes from the channel, dispatching to pure handlers.

use std::io;
use std::sync::{mpsc, Arc};
use std::thread;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::ConnectError;
use crate::logbook::LogEntry;
use crate::session::{Session, SessionEvent, SessionObserver};
use crate::transport::PortBackend;

use super::state::{Action, App, AppEvent, Capability, Effect, Screen, Transition};
use super::update::{handle_session_event, update};
use super::view::render;

// ============================================================================
// KEY MAPPING
// ============================================================================

/// Map a crossterm key event to a semantic Action.
///
/// Returns None for keys that don't map to any action.
pub fn map_key(key: KeyEvent) -> Option<Action> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    // AltGr arrives as Ctrl+Alt on Windows and types a character
    let shortcut = key.modifiers.contains(KeyModifiers::CONTROL)
        && !key.modifiers.contains(KeyModifiers::ALT);
    if shortcut {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') => Some(Action::Quit),
            KeyCode::Char('o') => Some(Action::ToggleConnection),
            KeyCode::Char('l') => Some(Action::ClearLog),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Enter => Some(Action::Submit),
        KeyCode::Esc => Some(Action::Back),
        KeyCode::Tab => Some(Action::NextField),
        KeyCode::BackTab => Some(Action::PrevField),
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Left => Some(Action::Left),
        KeyCode::Right => Some(Action::Right),
        KeyCode::Up => Some(Action::Up),
        KeyCode::Down => Some(Action::Down),
        KeyCode::Char(c) => Some(Action::Char(c)),
        _ => None,
    }
}

// ============================================================================
// TERMINAL LIFECYCLE
// ============================================================================

fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(io::stdout());
    Terminal::new(backend)
}

fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

/// Install a panic hook that restores the terminal before printing the panic.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Best-effort terminal restoration
        let _ = restore_terminal();
        original_hook(panic_info);
    }));
}

// ============================================================================
// BACKGROUND THREADS
// ============================================================================

/// Spawn a thread that reads crossterm events and forwards key events to the channel.
fn spawn_key_reader(tx: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::read() {
            Ok(Event::Key(key)) => {
                if tx.send(AppEvent::Key(key)).is_err() {
                    break; // receiver dropped, TUI is shutting down
                }
            }
            Ok(_) => {} // ignore mouse, resize, etc.
            Err(_) => break,
        }
    });
}

/// Session notifications join the key events on the same channel.
impl SessionObserver for mpsc::Sender<AppEvent> {
    fn notify(&self, event: SessionEvent) {
        let _ = self.send(AppEvent::Session(event));
    }
}

// ============================================================================
// EVENT LOOP
// ============================================================================

/// Run the control panel until the operator quits.
///
/// Any live connection is closed before the terminal is restored.
pub fn run(config: &Config, backend: Box<dyn PortBackend>) -> io::Result<()> {
    let (tx, rx) = mpsc::channel::<AppEvent>();
    let mut session = Session::new(backend, Arc::new(tx.clone()), config.session_options());
    let mut app = startup(&session, config);

    install_panic_hook();
    let mut terminal = setup_terminal()?;
    spawn_key_reader(tx);

    let result = event_loop(&mut terminal, &mut app, &mut session, &rx);

    if let Err(e) = session.disconnect() {
        debug!("{}", e);
    }
    restore_terminal()?;
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    session: &mut Session,
    rx: &mpsc::Receiver<AppEvent>,
) -> io::Result<()> {
    loop {
        terminal.draw(|frame| render(app, frame))?;

        if app.should_quit {
            return Ok(());
        }

        // Block on next event from any producer
        let Ok(event) = rx.recv() else {
            return Ok(()); // all senders dropped
        };
        dispatch(app, session, event);
    }
}

/// Probe the host once and build the initial panel.
fn startup(session: &Session, config: &Config) -> App {
    let capability = match session.probe() {
        Ok(ports) => {
            info!(ports = ports.len(), "serial ports available");
            Capability::Supported
        }
        Err(e) => {
            warn!("{}", e);
            Capability::Unsupported { reason: e.reason }
        }
    };

    App::new(capability, config.panel.log_capacity)
        .with_preferred_port(config.panel.preferred_port.clone())
}

/// Apply one channel event, then refresh the link mirror.
fn dispatch(app: &mut App, session: &mut Session, event: AppEvent) {
    match event {
        AppEvent::Key(key) => {
            if let Some(action) = map_key(key) {
                apply_action(app, session, action);
            }
        }
        AppEvent::Session(SessionEvent::ReadStopped { connection, error }) => {
            session.handle_read_stopped(connection, error);
        }
        AppEvent::Session(event) => handle_session_event(app, event),
    }
    app.sync(session.state(), session.port_name());
}

fn apply_action(app: &mut App, session: &mut Session, action: Action) {
    let ctx = app.context();
    let screen = std::mem::take(&mut app.screen);

    match update(screen, &action, &ctx) {
        Transition::Screen(new_screen) => {
            app.screen = new_screen;
        }
        Transition::Quit => {
            app.should_quit = true;
        }
        Transition::Effect(new_screen, effect) => {
            app.screen = new_screen;
            handle_effect(effect, app, session);
        }
    }
}

// ============================================================================
// EFFECT HANDLING
// ============================================================================

/// Handle a side effect requested by a pure transition.
///
/// Session outcomes come back as events on the channel; only effects the
/// session does not report are logged here.
fn handle_effect(effect: Effect, app: &mut App, session: &mut Session) {
    match effect {
        Effect::Send(line) => {
            let _ = session.send(&line);
        }
        Effect::Reject(message) => {
            debug!(%message, "input rejected");
            app.log.push(LogEntry::error(message));
        }
        Effect::OpenPicker | Effect::RefreshPorts => match session.available_ports() {
            Ok(ports) => {
                debug!(ports = ports.len(), "showing port picker");
                let cursor = app.preferred_index(&ports);
                let panel = std::mem::take(&mut app.screen).into_panel();
                app.screen = Screen::PortPicker {
                    ports,
                    cursor,
                    panel,
                };
            }
            Err(e) => {
                warn!("{}", e);
                app.log.push(LogEntry::error(e.to_string()));
            }
        },
        Effect::Connect { port } => {
            let _ = session.connect(&port);
        }
        Effect::CancelPicker => {
            app.log.push(LogEntry::error(ConnectError::Cancelled.to_string()));
        }
        Effect::Disconnect => {
            if let Err(e) = session.disconnect() {
                debug!("{}", e);
            }
        }
        Effect::ClearLog => app.log.clear(),
    }
}

// ============================================================================
// TESTS
// ============================================================================
