//! Serial session: the single live connection and its lifecycle.
//!
//! `Session` is an owned value held by whoever drives the panel. It moves
//! `Disconnected -> Connecting -> Connected -> Disconnected`; the handles of
//! a live link sit in a `Connection` that exists iff the state is
//! `Connected`.
//!
//! Threads:
//! - caller thread: `connect`, `send`, `disconnect`
//! - one reader thread per connection: drains and discards incoming text,
//!   stops on cancel, end of stream, or error
//!
//! Notifications go out through [`SessionObserver`], so the session knows
//! nothing about how they are rendered.

use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use crate::codec::{frame_line, TextDecoder};
use crate::error::{
    CapabilityUnsupported, ConnectError, DisconnectError, ReadError, SendError, TeardownFailure,
};
use crate::transport::{OpenPort, PortBackend, PortHandle};
use crate::types::{PortEntry, SessionState};

/// Fixed line rate of the link.
pub const BAUD_RATE: u32 = 9600;

const READ_BUFFER: usize = 1024;

// ============================================================================
// NOTIFICATIONS
// ============================================================================

/// Something the operator should hear about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A port was opened and the reader is running.
    Connected { port: String },
    /// A live connection was torn down.
    Disconnected,
    /// A line went out on the wire (without its terminator).
    Sent { line: String },
    /// Any failure, already phrased for the log.
    Failed { message: String },
    /// The reader of `connection` stopped on its own. The owner of the
    /// session must hand this back through [`Session::handle_read_stopped`].
    ReadStopped { connection: u64, error: ReadError },
}

/// Receiver of session notifications.
///
/// Called from the caller's thread and from reader threads.
pub trait SessionObserver: Send + Sync {
    fn notify(&self, event: SessionEvent);
}

/// Observer that drops everything. The headless CLI reads results instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl SessionObserver for NullObserver {
    fn notify(&self, _event: SessionEvent) {}
}

// ============================================================================
// OPTIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Upper bound of one blocking read; how long cancellation may take.
    pub read_timeout: Duration,
    /// Tear the link down after a write failure or a reader stop.
    pub disconnect_on_error: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_millis(100),
            disconnect_on_error: true,
        }
    }
}

// ============================================================================
// CONNECTION
// ============================================================================

/// Handles of one live link.
struct Connection {
    id: u64,
    port: String,
    writer: Option<Box<dyn Write + Send>>,
    handle: Option<Box<dyn PortHandle>>,
    reader: Option<JoinHandle<()>>,
    cancel: Arc<AtomicBool>,
}

impl Connection {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "writer closed"))?;
        writer.write_all(&frame_line(line))?;
        writer.flush()
    }

    /// Cancel the reader, close the writer, close the port.
    ///
    /// Every step runs even if an earlier one failed. Safe to call twice.
    fn shutdown(&mut self) -> Vec<TeardownFailure> {
        let mut failures = Vec::new();

        self.cancel.store(true, Ordering::SeqCst);
        if let Some(reader) = self.reader.take() {
            if reader.join().is_err() {
                failures.push(TeardownFailure::Reader);
            }
        }

        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                failures.push(TeardownFailure::Writer(e.to_string()));
            }
        }

        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.close() {
                failures.push(TeardownFailure::Port(e.to_string()));
            }
        }

        for failure in &failures {
            warn!(port = %self.port, connection = self.id, "teardown step failed: {}", failure);
        }
        failures
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ============================================================================
// SESSION
// ============================================================================

pub struct Session {
    backend: Box<dyn PortBackend>,
    observer: Arc<dyn SessionObserver>,
    options: SessionOptions,
    state: SessionState,
    connection: Option<Connection>,
    next_id: u64,
}

impl Session {
    pub fn new(
        backend: Box<dyn PortBackend>,
        observer: Arc<dyn SessionObserver>,
        options: SessionOptions,
    ) -> Self {
        Self {
            backend,
            observer,
            options,
            state: SessionState::Disconnected,
            connection: None,
            next_id: 1,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Name of the connected port.
    pub fn port_name(&self) -> Option<&str> {
        self.connection.as_ref().map(|c| c.port.as_str())
    }

    /// One-time host capability check.
    pub fn probe(&self) -> Result<Vec<PortEntry>, CapabilityUnsupported> {
        self.backend.available_ports()
    }

    /// Ports to offer in the picker.
    pub fn available_ports(&self) -> Result<Vec<PortEntry>, ConnectError> {
        self.backend
            .available_ports()
            .map_err(|e| ConnectError::Enumerate { reason: e.reason })
    }

    /// Open `port` at [`BAUD_RATE`] and start the reader.
    ///
    /// Rejected with `AlreadyConnected` unless the session is
    /// `Disconnected`. On failure nothing is retained.
    pub fn connect(&mut self, port: &str) -> Result<(), ConnectError> {
        if self.state != SessionState::Disconnected {
            let err = ConnectError::AlreadyConnected {
                port: self.port_name().unwrap_or(port).to_string(),
            };
            return Err(self.fail_connect(err));
        }

        self.state = SessionState::Connecting;
        debug!(port, baud = BAUD_RATE, "opening port");

        let opened = match self.backend.open(port, BAUD_RATE, self.options.read_timeout) {
            Ok(opened) => opened,
            Err(err) => {
                self.state = SessionState::Disconnected;
                return Err(self.fail_connect(err));
            }
        };

        let id = self.next_id;
        self.next_id += 1;

        match self.start(id, port, opened) {
            Ok(connection) => {
                self.connection = Some(connection);
                self.state = SessionState::Connected;
                info!(port, connection = id, baud = BAUD_RATE, "connected");
                self.observer.notify(SessionEvent::Connected {
                    port: port.to_string(),
                });
                Ok(())
            }
            Err(err) => {
                self.state = SessionState::Disconnected;
                Err(self.fail_connect(err))
            }
        }
    }

    /// Tear down the live connection, if any.
    ///
    /// Always ends `Disconnected`. Teardown step failures are logged and
    /// returned, never fatal. Without a live connection this is a silent
    /// no-op.
    pub fn disconnect(&mut self) -> Result<(), DisconnectError> {
        let failures = match self.connection.take() {
            Some(mut connection) => {
                let failures = connection.shutdown();
                info!(port = %connection.port, connection = connection.id, "disconnected");
                self.state = SessionState::Disconnected;
                self.observer.notify(SessionEvent::Disconnected);
                failures
            }
            None => {
                self.state = SessionState::Disconnected;
                Vec::new()
            }
        };

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DisconnectError { failures })
        }
    }

    /// Write `line` plus one newline. No validation happens here.
    pub fn send(&mut self, line: &str) -> Result<(), SendError> {
        let Some(connection) = self.connection.as_mut() else {
            let err = SendError::NotConnected;
            debug!(line, "send while disconnected");
            self.observer.notify(SessionEvent::Failed {
                message: err.to_string(),
            });
            return Err(err);
        };

        match connection.write_line(line) {
            Ok(()) => {
                debug!(line, connection = connection.id, "sent");
                self.observer.notify(SessionEvent::Sent {
                    line: line.to_string(),
                });
                Ok(())
            }
            Err(e) => {
                let err = SendError::WriteFailed(e.to_string());
                warn!(connection = connection.id, "write failed: {}", e);
                self.observer.notify(SessionEvent::Failed {
                    message: err.to_string(),
                });
                if self.options.disconnect_on_error {
                    let _ = self.disconnect();
                }
                Err(err)
            }
        }
    }

    /// React to a `ReadStopped` notification.
    ///
    /// Stops from readers of earlier connections are ignored.
    pub fn handle_read_stopped(&mut self, connection: u64, error: ReadError) {
        let live = self.connection.as_ref().is_some_and(|c| c.id == connection);
        if !live {
            debug!(connection, "ignoring stop from a closed reader");
            return;
        }

        warn!(connection, "reader stopped: {}", error);
        self.observer.notify(SessionEvent::Failed {
            message: error.to_string(),
        });
        if self.options.disconnect_on_error {
            let _ = self.disconnect();
        }
    }

    fn start(&self, id: u64, port: &str, opened: OpenPort) -> Result<Connection, ConnectError> {
        let OpenPort {
            reader,
            writer,
            handle,
        } = opened;
        let cancel = Arc::new(AtomicBool::new(false));

        let mut connection = Connection {
            id,
            port: port.to_string(),
            writer: Some(writer),
            handle: Some(handle),
            reader: None,
            cancel: cancel.clone(),
        };

        // On spawn failure `connection` drops here and closes the port
        let reader = spawn_reader(id, reader, cancel, self.observer.clone())
            .map_err(|e| ConnectError::Spawn {
                reason: e.to_string(),
            })?;
        connection.reader = Some(reader);
        Ok(connection)
    }

    fn fail_connect(&self, err: ConnectError) -> ConnectError {
        warn!("{}", err);
        self.observer.notify(SessionEvent::Failed {
            message: err.to_string(),
        });
        err
    }
}

// ============================================================================
// READER
// ============================================================================

fn spawn_reader(
    id: u64,
    mut reader: Box<dyn Read + Send>,
    cancel: Arc<AtomicBool>,
    observer: Arc<dyn SessionObserver>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("serial-reader-{id}"))
        .spawn(move || {
            let mut decoder = TextDecoder::new();
            let mut buf = [0u8; READ_BUFFER];

            let stopped = loop {
                if cancel.load(Ordering::SeqCst) {
                    break None;
                }
                match reader.read(&mut buf) {
                    Ok(0) => break Some(ReadError::EndOfStream),
                    Ok(n) => {
                        // Device responses are not surfaced
                        let text = decoder.decode(&buf[..n]);
                        trace!(connection = id, bytes = n, text = %text.escape_debug(), "discarded");
                    }
                    Err(e)
                        if matches!(
                            e.kind(),
                            io::ErrorKind::TimedOut
                                | io::ErrorKind::WouldBlock
                                | io::ErrorKind::Interrupted
                        ) =>
                    {
                        continue;
                    }
                    Err(e) => break Some(ReadError::Io(e.to_string())),
                }
            };

            // A stop racing with a deliberate cancel is not news
            if let Some(error) = stopped {
                if !cancel.load(Ordering::SeqCst) {
                    observer.notify(SessionEvent::ReadStopped {
                        connection: id,
                        error,
                    });
                }
            }
            debug!(connection = id, "reader exited");
        })
}

// ============================================================================
// TESTS
// ============================================================================
