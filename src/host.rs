//! The seam between the dashboard and whatever Bluetooth stack hosts it.
//!
//! The host owns the radio, the adapter and the device chooser. The
//! dashboard only ever sees three things through these traits: whether the
//! capability is there at all, a way to ask the user for one device, and
//! per-device handles that can connect, disconnect and report
//! server-initiated disconnects.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use futures::Stream;
use uuid::Uuid;

use crate::common::services::{BATTERY_SERVICE, DEVICE_INFORMATION};
use crate::Result;

/// Stable identity of a device as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for DeviceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Options passed to [`BluetoothHost::request_device`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDeviceOptions {
    /// Offer every discoverable device instead of filtering.
    pub accept_all_devices: bool,
    /// Services the caller may want to use later. These never filter the
    /// candidates.
    pub optional_services: Vec<Uuid>,
}

impl Default for RequestDeviceOptions {
    fn default() -> Self {
        Self {
            accept_all_devices: true,
            optional_services: vec![BATTERY_SERVICE, DEVICE_INFORMATION],
        }
    }
}

/// Fires once per server-initiated disconnect of a device.
pub type DisconnectStream = Pin<Box<dyn Stream<Item = ()> + Send>>;

/// Entry point of the host Bluetooth capability.
pub trait BluetoothHost: Send + Sync {
    type Device: DeviceHandle;

    /// Whether the host exposes a usable Bluetooth capability. Absence is
    /// reported as `false`, never as an error.
    fn is_available(&self) -> impl Future<Output = bool> + Send;

    /// Show the host's device chooser and resolve with the selected device.
    ///
    /// Dismissing the chooser fails with [`Error::Cancelled`](crate::Error::Cancelled).
    fn request_device(
        &self,
        options: &RequestDeviceOptions,
    ) -> impl Future<Output = Result<Self::Device>> + Send;
}

/// A host-owned device. Clones refer to the same device.
pub trait DeviceHandle: Clone + Send + Sync + 'static {
    type Gatt: GattServer;

    fn id(&self) -> DeviceId;

    fn name(&self) -> Option<String>;

    /// GATT server of the device, if it has one.
    fn gatt(&self) -> Option<&Self::Gatt>;

    /// Subscribe to server-initiated disconnects of this device.
    fn disconnections(&self) -> impl Future<Output = Result<DisconnectStream>> + Send;
}

pub trait GattServer: Send + Sync {
    fn is_connected(&self) -> impl Future<Output = bool> + Send;

    fn connect(&self) -> impl Future<Output = Result<()>> + Send;

    fn disconnect(&self) -> impl Future<Output = Result<()>> + Send;
}
