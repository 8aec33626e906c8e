//! Text rendering of the dashboard. Everything here is derived from
//! [`DashboardState`]; nothing is stored.

use std::fmt;

use crate::host::DeviceHandle;
use crate::state::{DashboardState, DeviceEntry};

pub const UNSUPPORTED_TITLE: &str = "Bluetooth Not Supported";
pub const UNSUPPORTED_HINT: &str =
    "No usable Bluetooth adapter was found. Check that the Bluetooth service is running and an adapter is present.";
pub const EMPTY_HINT: &str = "No devices yet. Type `scan` to open the device picker and add your first device.";

/// Connected / disconnected pill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusBadge {
    pub connected: bool,
}

impl fmt::Display for StatusBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.connected {
            f.write_str("[● Connected]")
        } else {
            f.write_str("[○ Disconnected]")
        }
    }
}

/// The single action a device card offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionButton {
    Disconnect,
    Connect { loading: bool },
    NotSupported,
}

impl ActionButton {
    pub fn for_entry<D: DeviceHandle>(entry: &DeviceEntry<D>) -> Self {
        if entry.is_connected() {
            ActionButton::Disconnect
        } else if !entry.has_gatt() {
            ActionButton::NotSupported
        } else {
            ActionButton::Connect {
                loading: entry.is_loading(),
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActionButton::Disconnect => "Disconnect",
            ActionButton::Connect { loading: false } => "Connect",
            ActionButton::Connect { loading: true } => "Connecting…",
            ActionButton::NotSupported => "Not Supported",
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(
            self,
            ActionButton::Disconnect | ActionButton::Connect { loading: false }
        )
    }
}

impl fmt::Display for ActionButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_enabled() {
            write!(f, "< {} >", self.label())
        } else {
            write!(f, "( {} )", self.label())
        }
    }
}

pub struct DeviceCard<'a, D> {
    entry: &'a DeviceEntry<D>,
}

impl<'a, D: DeviceHandle> DeviceCard<'a, D> {
    pub fn new(entry: &'a DeviceEntry<D>) -> Self {
        Self { entry }
    }
}

impl<D: DeviceHandle> fmt::Display for DeviceCard<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entry = self.entry;
        let name = entry.device().name();

        writeln!(
            f,
            "{}  {}",
            entry.display_name(),
            StatusBadge {
                connected: entry.is_connected()
            }
        )?;
        writeln!(f, "  {}", entry.id())?;
        writeln!(f, "  Device Name   {}", name.as_deref().unwrap_or("N/A"))?;
        writeln!(
            f,
            "  GATT Support  {}",
            if entry.has_gatt() { "Yes" } else { "No" }
        )?;
        write!(f, "  {}", ActionButton::for_entry(entry))
    }
}

/// Dismissable error notification.
pub struct ErrorBanner<'a>(pub &'a str);

impl fmt::Display for ErrorBanner<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "⚠ {}  (type `dismiss` to close)", self.0)
    }
}

/// Render the whole dashboard. Cards are numbered from 1 so the console can
/// address them.
pub fn render<D: DeviceHandle>(state: &DashboardState<D>) -> String {
    if !state.is_supported() {
        return format!("{}\n{}\n", UNSUPPORTED_TITLE, UNSUPPORTED_HINT);
    }

    let mut out = String::new();

    if let Some(error) = state.error() {
        out.push_str(&format!("{}\n\n", ErrorBanner(error)));
    }

    if state.is_scanning() {
        out.push_str("Scanning…\n\n");
    }

    if state.devices().is_empty() {
        out.push_str(EMPTY_HINT);
        out.push('\n');
        return out;
    }

    for (index, entry) in state.devices().iter().enumerate() {
        out.push_str(&format!("#{} {}\n\n", index + 1, DeviceCard::new(entry)));
    }
    out.push_str("+ Add another device with `scan`\n");

    out
}
