//! Dashboard state and the transitions that move it.
//!
//! Every transition is a plain method on [`DashboardState`]; none of them
//! touch the host. Transitions addressed to an id that is not listed are
//! ignored, so late results for removed devices fall on the floor.

use crate::common::UNKNOWN_DEVICE_NAME;
use crate::host::{DeviceHandle, DeviceId};
use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// One listed device and what we last learned about it.
#[derive(Debug, Clone)]
pub struct DeviceEntry<D> {
    device: D,
    connected: bool,
    loading: bool,
}

impl<D: DeviceHandle> DeviceEntry<D> {
    fn new(device: D, connected: bool) -> Self {
        Self {
            device,
            connected,
            loading: false,
        }
    }

    #[inline]
    pub fn id(&self) -> DeviceId {
        self.device.id()
    }

    #[inline]
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Name of the device, or a placeholder if it has none.
    pub fn display_name(&self) -> String {
        self.device
            .name()
            .unwrap_or_else(|| UNKNOWN_DEVICE_NAME.to_string())
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    #[inline]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[inline]
    pub fn has_gatt(&self) -> bool {
        self.device.gatt().is_some()
    }

    pub fn state(&self) -> ConnectionState {
        if self.loading {
            ConnectionState::Connecting
        } else if self.connected {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashboardState<D> {
    supported: bool,
    scanning: bool,
    devices: Vec<DeviceEntry<D>>,
    error: Option<String>,
}

impl<D: DeviceHandle> DashboardState<D> {
    pub fn new(supported: bool) -> Self {
        Self {
            supported,
            scanning: false,
            devices: Vec::new(),
            error: None,
        }
    }

    #[inline]
    pub fn is_supported(&self) -> bool {
        self.supported
    }

    #[inline]
    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    #[inline]
    pub fn devices(&self) -> &[DeviceEntry<D>] {
        &self.devices
    }

    pub fn device(&self, id: &DeviceId) -> Option<&DeviceEntry<D>> {
        self.devices.iter().find(|entry| entry.id() == *id)
    }

    fn device_mut(&mut self, id: &DeviceId) -> Option<&mut DeviceEntry<D>> {
        self.devices.iter_mut().find(|entry| entry.id() == *id)
    }

    pub fn contains(&self, id: &DeviceId) -> bool {
        self.device(id).is_some()
    }

    /// Connected flag of `id`; unlisted devices count as disconnected.
    pub fn is_connected(&self, id: &DeviceId) -> bool {
        self.device(id).map_or(false, DeviceEntry::is_connected)
    }

    /// Loading flag of `id`; unlisted devices are never loading.
    pub fn is_loading(&self, id: &DeviceId) -> bool {
        self.device(id).map_or(false, DeviceEntry::is_loading)
    }

    #[inline]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn scan_started(&mut self) {
        self.error = None;
        self.scanning = true;
    }

    pub fn scan_finished(&mut self) {
        self.scanning = false;
    }

    /// Append a freshly selected device.
    ///
    /// A device whose id is already listed is rejected: the list stays as it
    /// is and the error slot names the device.
    pub fn add_device(&mut self, device: D, connected: bool) -> Result<(), Error> {
        if self.contains(&device.id()) {
            let name = device
                .name()
                .unwrap_or_else(|| UNKNOWN_DEVICE_NAME.to_string());
            let err = Error::Duplicate(name);
            self.error = Some(err.to_string());
            return Err(err);
        }

        self.devices.push(DeviceEntry::new(device, connected));
        Ok(())
    }

    /// Mark a connect as in flight. Returns `false` if `id` is unlisted or
    /// already connecting.
    pub fn begin_connect(&mut self, id: &DeviceId) -> bool {
        match self.device_mut(id) {
            Some(entry) if !entry.loading => {
                entry.loading = true;
                self.error = None;
                true
            }
            _ => false,
        }
    }

    pub fn connect_succeeded(&mut self, id: &DeviceId) {
        if let Some(entry) = self.device_mut(id) {
            entry.loading = false;
            entry.connected = true;
        }
    }

    pub fn connect_failed(&mut self, id: &DeviceId, message: impl Into<String>) {
        if let Some(entry) = self.device_mut(id) {
            entry.loading = false;
            entry.connected = false;
        }
        self.error = Some(message.into());
    }

    /// Record a disconnect, user initiated or reported by the host.
    pub fn mark_disconnected(&mut self, id: &DeviceId) {
        if let Some(entry) = self.device_mut(id) {
            entry.connected = false;
        }
    }

    /// Drop `id` from the list together with its flags.
    pub fn remove_device(&mut self, id: &DeviceId) -> Option<D> {
        let index = self.devices.iter().position(|entry| entry.id() == *id)?;
        Some(self.devices.remove(index).device)
    }
}
