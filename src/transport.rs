//! Transport seam between the session and the operating system.
//!
//! A backend enumerates ports and opens one, handing back three independent
//! handles: a reader (moved into the reader thread), a writer (kept by the
//! session for `send`), and the port itself (closed last on disconnect).
//!
//! - `SystemBackend`: real serial ports through the `serialport` crate
//! - `memory::MemoryBackend` (tests): in-process wire with fault injection

use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::{
    ClearBuffer, DataBits, FlowControl, Parity, SerialPort, SerialPortType, StopBits,
};

use crate::error::{CapabilityUnsupported, ConnectError};
use crate::types::{PortEntry, PortKind};

// ============================================================================
// SEAM
// ============================================================================

/// An opened port, split into the handles the session needs.
pub struct OpenPort {
    pub reader: Box<dyn Read + Send>,
    pub writer: Box<dyn Write + Send>,
    pub handle: Box<dyn PortHandle>,
}

/// The underlying port, closed as the last teardown step.
pub trait PortHandle: Send {
    fn close(self: Box<Self>) -> io::Result<()>;
}

/// Source of serial ports.
pub trait PortBackend {
    /// Enumerate ports. An error means the host has no serial capability.
    fn available_ports(&self) -> Result<Vec<PortEntry>, CapabilityUnsupported>;

    /// Open `port` at `baud_rate`, 8N1, no flow control.
    ///
    /// `read_timeout` bounds each blocking read so the reader can notice
    /// cancellation.
    fn open(
        &self,
        port: &str,
        baud_rate: u32,
        read_timeout: Duration,
    ) -> Result<OpenPort, ConnectError>;
}

// ============================================================================
// SYSTEM BACKEND
// ============================================================================

/// Real serial ports.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBackend;

impl PortBackend for SystemBackend {
    fn available_ports(&self) -> Result<Vec<PortEntry>, CapabilityUnsupported> {
        let ports = serialport::available_ports().map_err(|e| CapabilityUnsupported {
            reason: e.description,
        })?;

        Ok(ports
            .into_iter()
            .map(|info| PortEntry {
                name: info.port_name,
                kind: port_kind(info.port_type),
            })
            .collect())
    }

    fn open(
        &self,
        port: &str,
        baud_rate: u32,
        read_timeout: Duration,
    ) -> Result<OpenPort, ConnectError> {
        let serial = serialport::new(port, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(read_timeout)
            .open()
            .map_err(|e| open_error(port, e))?;

        let reader = serial.try_clone().map_err(|e| open_error(port, e))?;
        let writer = serial.try_clone().map_err(|e| open_error(port, e))?;

        Ok(OpenPort {
            reader: Box::new(reader),
            writer: Box::new(writer),
            handle: Box::new(SystemHandle(serial)),
        })
    }
}

struct SystemHandle(Box<dyn SerialPort>);

impl PortHandle for SystemHandle {
    fn close(self: Box<Self>) -> io::Result<()> {
        // Unread input is discarded; the descriptor closes on drop
        self.0.clear(ClearBuffer::Input).map_err(io::Error::from)
    }
}

fn port_kind(port_type: SerialPortType) -> PortKind {
    match port_type {
        SerialPortType::UsbPort(usb) => PortKind::Usb {
            vid: usb.vid,
            pid: usb.pid,
            manufacturer: usb.manufacturer,
            product: usb.product,
        },
        SerialPortType::PciPort => PortKind::Pci,
        SerialPortType::BluetoothPort => PortKind::Bluetooth,
        SerialPortType::Unknown => PortKind::Unknown,
    }
}

/// Classify a `serialport` open failure.
fn open_error(port: &str, err: serialport::Error) -> ConnectError {
    match err.kind {
        serialport::ErrorKind::NoDevice => ConnectError::NotFound {
            port: port.to_string(),
        },
        serialport::ErrorKind::Io(io::ErrorKind::NotFound) => ConnectError::NotFound {
            port: port.to_string(),
        },
        serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied) => {
            ConnectError::PermissionDenied {
                port: port.to_string(),
                reason: err.description,
            }
        }
        _ => ConnectError::Open {
            port: port.to_string(),
            reason: err.description,
        },
    }
}

// ============================================================================
// IN-MEMORY BACKEND (tests)
// ============================================================================

#[cfg(test)]
pub(crate) mod memory {
    //! A fake wire: writes land in a shared buffer, reads come from a
    //! channel the test feeds.

    use std::io::{self, Read, Write};
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::{OpenPort, PortBackend, PortHandle};
    use crate::error::{CapabilityUnsupported, ConnectError};
    use crate::types::PortEntry;

    pub type Chunk = io::Result<Vec<u8>>;

    /// Cloneable handle: every clone observes the same wire.
    #[derive(Clone, Default)]
    pub struct MemoryBackend {
        pub ports: Vec<PortEntry>,
        pub unsupported: bool,
        pub open_error: Arc<Mutex<Option<ConnectError>>>,
        /// Bytes written by the session.
        pub wire: Arc<Mutex<Vec<u8>>>,
        pub fail_writes: Arc<AtomicBool>,
        pub port_closed: Arc<AtomicBool>,
        /// Closing the port reports an error (the port still counts as closed).
        pub fail_close: Arc<AtomicBool>,
        pub opened_baud: Arc<AtomicU32>,
        feed: Arc<Mutex<Option<Sender<Chunk>>>>,
    }

    impl MemoryBackend {
        pub fn with_ports(names: &[&str]) -> Self {
            MemoryBackend {
                ports: names.iter().map(|n| PortEntry::named(*n)).collect(),
                ..Default::default()
            }
        }

        pub fn unsupported() -> Self {
            MemoryBackend {
                unsupported: true,
                ..Default::default()
            }
        }

        pub fn written(&self) -> Vec<u8> {
            self.wire.lock().unwrap().clone()
        }

        /// Push bytes (or an error) to the session's reader.
        pub fn feed(&self, chunk: Chunk) {
            if let Some(tx) = self.feed.lock().unwrap().as_ref() {
                let _ = tx.send(chunk);
            }
        }

        /// Drop the sending side: the reader sees end of stream.
        pub fn hang_up(&self) {
            self.feed.lock().unwrap().take();
        }
    }

    impl PortBackend for MemoryBackend {
        fn available_ports(&self) -> Result<Vec<PortEntry>, CapabilityUnsupported> {
            if self.unsupported {
                return Err(CapabilityUnsupported {
                    reason: "no serial subsystem".into(),
                });
            }
            Ok(self.ports.clone())
        }

        fn open(
            &self,
            _port: &str,
            baud_rate: u32,
            read_timeout: Duration,
        ) -> Result<OpenPort, ConnectError> {
            if let Some(err) = self.open_error.lock().unwrap().clone() {
                return Err(err);
            }
            self.opened_baud.store(baud_rate, Ordering::SeqCst);
            self.port_closed.store(false, Ordering::SeqCst);

            let (tx, rx) = mpsc::channel();
            *self.feed.lock().unwrap() = Some(tx);

            Ok(OpenPort {
                reader: Box::new(ChannelReader {
                    rx,
                    timeout: read_timeout,
                }),
                writer: Box::new(SharedWriter {
                    wire: self.wire.clone(),
                    fail: self.fail_writes.clone(),
                }),
                handle: Box::new(MemoryHandle {
                    closed: self.port_closed.clone(),
                    fail: self.fail_close.clone(),
                }),
            })
        }
    }

    struct ChannelReader {
        rx: Receiver<Chunk>,
        timeout: Duration,
    }

    impl Read for ChannelReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.rx.recv_timeout(self.timeout) {
                Ok(Ok(bytes)) => {
                    let n = bytes.len().min(buf.len());
                    buf[..n].copy_from_slice(&bytes[..n]);
                    Ok(n)
                }
                Ok(Err(e)) => Err(e),
                Err(RecvTimeoutError::Timeout) => {
                    Err(io::Error::new(io::ErrorKind::TimedOut, "no data"))
                }
                Err(RecvTimeoutError::Disconnected) => Ok(0),
            }
        }
    }

    struct SharedWriter {
        wire: Arc<Mutex<Vec<u8>>>,
        fail: Arc<AtomicBool>,
    }

    impl Write for SharedWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"));
            }
            self.wire.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"));
            }
            Ok(())
        }
    }

    struct MemoryHandle {
        closed: Arc<AtomicBool>,
        fail: Arc<AtomicBool>,
    }

    impl PortHandle for MemoryHandle {
        fn close(self: Box<Self>) -> io::Result<()> {
            self.closed.store(true, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(io::Error::other("port busy"));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sp_error(kind: serialport::ErrorKind) -> serialport::Error {
        serialport::Error::new(kind, "boom")
    }

    #[test]
    fn no_device_maps_to_not_found() {
        let err = open_error("/dev/ttyUSB9", sp_error(serialport::ErrorKind::NoDevice));
        assert_eq!(
            err,
            ConnectError::NotFound {
                port: "/dev/ttyUSB9".into()
            }
        );
    }

    #[test]
    fn permission_denied_keeps_reason() {
        let err = open_error(
            "/dev/ttyACM0",
            sp_error(serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied)),
        );
        assert_eq!(
            err,
            ConnectError::PermissionDenied {
                port: "/dev/ttyACM0".into(),
                reason: "boom".into(),
            }
        );
    }

    #[test]
    fn other_failures_are_open_errors() {
        let err = open_error("COM3", sp_error(serialport::ErrorKind::InvalidInput));
        assert!(matches!(err, ConnectError::Open { .. }));
    }

    #[test]
    fn usb_port_type_keeps_ids() {
        let kind = port_kind(SerialPortType::UsbPort(serialport::UsbPortInfo {
            vid: 0x2341,
            pid: 0x0043,
            serial_number: None,
            manufacturer: Some("Arduino".into()),
            product: None,
        }));
        assert_eq!(
            kind,
            PortKind::Usb {
                vid: 0x2341,
                pid: 0x0043,
                manufacturer: Some("Arduino".into()),
                product: None,
            }
        );
    }
}
