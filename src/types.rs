//! Domain types for serial-panel.
//!
//! Plain data shared by the session, the panel and the CLI.

use serde::Serialize;

// ============================================================================
// SESSION
// ============================================================================

/// Lifecycle of the single serial session.
///
/// `Connecting` only exists while `Session::connect` runs; callers on the
/// event loop never observe it between events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl SessionState {
    pub fn is_connected(self) -> bool {
        self == SessionState::Connected
    }
}

// ============================================================================
// PORTS
// ============================================================================

/// Physical kind of a serial port, as reported by the OS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PortKind {
    Usb {
        vid: u16,
        pid: u16,
        #[serde(skip_serializing_if = "Option::is_none")]
        manufacturer: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        product: Option<String>,
    },
    Pci,
    Bluetooth,
    Unknown,
}

/// A port the operator can pick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortEntry {
    /// OS path or name (`/dev/ttyACM0`, `COM3`).
    pub name: String,
    #[serde(flatten)]
    pub kind: PortKind,
}

impl PortEntry {
    /// Port with no hardware details, mostly useful for `--port` and tests.
    pub fn named(name: impl Into<String>) -> Self {
        PortEntry {
            name: name.into(),
            kind: PortKind::Unknown,
        }
    }

    /// One-line description for lists: name plus product when known.
    pub fn label(&self) -> String {
        match &self.kind {
            PortKind::Usb {
                vid,
                pid,
                product,
                manufacturer,
            } => {
                let desc = product
                    .as_deref()
                    .or(manufacturer.as_deref())
                    .unwrap_or("USB serial");
                format!("{}  {} ({:04x}:{:04x})", self.name, desc, vid, pid)
            }
            PortKind::Pci => format!("{}  PCI", self.name),
            PortKind::Bluetooth => format!("{}  Bluetooth", self.name),
            PortKind::Unknown => self.name.clone(),
        }
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable pretty output.
    #[default]
    Human,
    /// Machine-readable JSON.
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_disconnected() {
        assert_eq!(SessionState::default(), SessionState::Disconnected);
        assert!(!SessionState::Connecting.is_connected());
        assert!(SessionState::Connected.is_connected());
    }

    #[test]
    fn usb_label_prefers_product() {
        let entry = PortEntry {
            name: "/dev/ttyACM0".into(),
            kind: PortKind::Usb {
                vid: 0x2341,
                pid: 0x0043,
                manufacturer: Some("Arduino".into()),
                product: Some("Uno R3".into()),
            },
        };
        assert_eq!(entry.label(), "/dev/ttyACM0  Uno R3 (2341:0043)");
    }

    #[test]
    fn unknown_label_is_just_the_name() {
        assert_eq!(PortEntry::named("COM3").label(), "COM3");
    }
}
