//! Port list formatting for the `ports` command.
//!
//! Pure functions: (ports, OutputFormat) -> String.

use crate::types::{OutputFormat, PortEntry, PortKind};

pub fn format_ports(ports: &[PortEntry], format: OutputFormat) -> String {
    match format {
        OutputFormat::Human => format_human(ports),
        OutputFormat::Json => format_json(ports),
    }
}

// ============================================================================
// HUMAN FORMAT
// ============================================================================

fn format_human(ports: &[PortEntry]) -> String {
    if ports.is_empty() {
        return "No serial ports found.\n".to_string();
    }

    let mut out = String::new();
    out.push_str("=== Serial Ports ===\n");
    for port in ports {
        out.push_str(&format!("  {}\n", port.name));
        match &port.kind {
            PortKind::Usb {
                vid,
                pid,
                manufacturer,
                product,
            } => {
                out.push_str(&format!("    └─ USB {:04x}:{:04x}", vid, pid));
                if let Some(m) = manufacturer {
                    out.push_str(&format!("  {}", m));
                }
                if let Some(p) = product {
                    out.push_str(&format!("  {}", p));
                }
                out.push('\n');
            }
            PortKind::Pci => out.push_str("    └─ PCI\n"),
            PortKind::Bluetooth => out.push_str("    └─ Bluetooth\n"),
            PortKind::Unknown => {}
        }
    }
    out.push('\n');
    out.push_str(&format!("Total: {}\n", ports.len()));
    out
}

// ============================================================================
// JSON FORMAT
// ============================================================================

fn format_json(ports: &[PortEntry]) -> String {
    serde_json::to_string_pretty(ports).unwrap_or_else(|e| {
        // Plain data with string keys; serialization cannot fail
        panic!("Failed to serialize ports to JSON: {}", e)
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn arduino() -> PortEntry {
        PortEntry {
            name: "/dev/ttyACM0".into(),
            kind: PortKind::Usb {
                vid: 0x2341,
                pid: 0x0043,
                manufacturer: Some("Arduino".into()),
                product: None,
            },
        }
    }

    #[test]
    fn human_lists_each_port() {
        let out = format_ports(&[arduino(), PortEntry::named("/dev/ttyS0")], OutputFormat::Human);
        assert!(out.contains("/dev/ttyACM0"));
        assert!(out.contains("USB 2341:0043  Arduino"));
        assert!(out.contains("/dev/ttyS0"));
        assert!(out.contains("Total: 2"));
    }

    #[test]
    fn human_empty_says_so() {
        assert_eq!(format_ports(&[], OutputFormat::Human), "No serial ports found.\n");
    }

    #[test]
    fn json_is_tagged_and_flat() {
        let out = format_ports(&[arduino()], OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["name"], "/dev/ttyACM0");
        assert_eq!(value[0]["type"], "usb");
        assert_eq!(value[0]["vid"], 0x2341);
        assert!(value[0].get("product").is_none());
    }

    #[test]
    fn json_empty_is_an_empty_array() {
        assert_eq!(format_ports(&[], OutputFormat::Json), "[]");
    }
}
