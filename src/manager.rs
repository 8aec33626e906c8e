//! Drives the dashboard: runs user actions against the host and folds the
//! outcomes into [`DashboardState`].
//!
//! Every action takes `&mut self`, so the manager is the single writer of
//! the state. Server-initiated disconnects arrive from background listener
//! tasks over a channel and are applied by [`DeviceManager::next_event`] or
//! [`DeviceManager::process_pending_events`] under the same discipline.

use std::collections::HashMap;

use futures::StreamExt;
use stream_cancel::{Trigger, Valved};
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

use crate::error::ErrorKind;
use crate::host::{BluetoothHost, DeviceHandle, DeviceId, GattServer};
use crate::state::DashboardState;
use crate::{service, Error};

/// Name used in connection messages for devices without one.
const FALLBACK_NAME: &str = "Device";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagerEvent {
    /// The host reported that the GATT server of a device went away.
    GattServerDisconnected(DeviceId),
}

/// Outcome of a scan as seen by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Added(DeviceId),
    Duplicate(DeviceId),
    Cancelled,
    Failed,
}

pub struct DeviceManager<H: BluetoothHost> {
    host: H,
    state: DashboardState<H::Device>,
    event_sender: UnboundedSender<ManagerEvent>,
    event_receiver: UnboundedReceiver<ManagerEvent>,
    /// Dropping a trigger stops the disconnect listener of that device
    listeners: HashMap<DeviceId, Trigger>,
}

impl<H: BluetoothHost> DeviceManager<H> {
    /// Probe the host once and start with an empty dashboard.
    pub async fn new(host: H) -> Self {
        let supported = service::is_bluetooth_supported(&host).await;
        if !supported {
            log::warn!("Bluetooth is not supported on this system");
        }

        let (event_sender, event_receiver) = mpsc::unbounded_channel();

        Self {
            host,
            state: DashboardState::new(supported),
            event_sender,
            event_receiver,
            listeners: HashMap::new(),
        }
    }

    #[inline]
    pub fn state(&self) -> &DashboardState<H::Device> {
        &self.state
    }

    #[inline]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Let the user pick a device and add it to the list.
    pub async fn scan(&mut self) -> ScanOutcome {
        self.state.scan_started();
        let outcome = self.add_selected_device().await;
        self.state.scan_finished();
        outcome
    }

    async fn add_selected_device(&mut self) -> ScanOutcome {
        let device = match service::request_device(&self.host).await {
            Ok(device) => device,
            Err(e) if e.is_cancelled() => return ScanOutcome::Cancelled,
            Err(e) => {
                log::warn!("Scan failed: {}", e);
                self.state.set_error(e.to_string());
                return ScanOutcome::Failed;
            }
        };

        let id = device.id();
        let connected = match device.gatt() {
            Some(gatt) => gatt.is_connected().await,
            None => false,
        };

        if let Err(e) = self.state.add_device(device.clone(), connected) {
            log::debug!("Rejected {}: {}", id, e);
            return ScanOutcome::Duplicate(id);
        }

        log::info!("Added {} (connected: {})", id, connected);
        self.listen_for_disconnects(device).await;

        ScanOutcome::Added(id)
    }

    async fn listen_for_disconnects(&mut self, device: H::Device) {
        let id = device.id();
        let stream = match device.disconnections().await {
            Ok(stream) => stream,
            Err(e) => {
                log::warn!("Cannot watch {} for disconnects: {}", id, e);
                return;
            }
        };

        let (trigger, mut stream) = Valved::new(stream);
        self.listeners.insert(id.clone(), trigger);

        let sender = self.event_sender.clone();
        tokio::spawn(async move {
            while stream.next().await.is_some() {
                log::debug!("GATT server of {} disconnected", id);
                if sender
                    .send(ManagerEvent::GattServerDisconnected(id.clone()))
                    .is_err()
                {
                    break;
                }
            }
        });
    }

    /// Connect to a listed device. Returns whether the device ended up
    /// connected.
    pub async fn connect(&mut self, id: &DeviceId) -> bool {
        let Some(entry) = self.state.device(id) else {
            log::debug!("Ignoring connect for unknown device {}", id);
            return false;
        };
        if entry.is_connected() {
            log::debug!("{} is already connected", id);
            return true;
        }
        let device = entry.device().clone();

        if !self.state.begin_connect(id) {
            log::debug!("Connect to {} already in progress", id);
            return false;
        }

        match service::connect_device(&device).await {
            Ok(()) => {
                self.state.connect_succeeded(id);
                true
            }
            Err(e) => {
                log::warn!("Connection to {} failed: {}", id, e);
                let name = device.name().unwrap_or_else(|| FALLBACK_NAME.to_string());
                self.state.connect_failed(id, connect_failure_message(&name, &e));
                false
            }
        }
    }

    /// Disconnect from a listed device. The device is marked disconnected
    /// whatever the host says.
    pub async fn disconnect(&mut self, id: &DeviceId) {
        let Some(entry) = self.state.device(id) else {
            return;
        };
        let device = entry.device().clone();

        service::disconnect_device(&device).await;
        self.state.mark_disconnected(id);
    }

    /// Forget a device. The host is not told to unpair it.
    pub fn remove(&mut self, id: &DeviceId) -> Option<H::Device> {
        self.listeners.remove(id);
        let removed = self.state.remove_device(id);
        if removed.is_some() {
            log::info!("Removed {}", id);
        }
        removed
    }

    pub fn dismiss_error(&mut self) {
        self.state.clear_error();
    }

    /// Wait for the next host notification and apply it.
    pub async fn next_event(&mut self) -> Option<ManagerEvent> {
        let event = self.event_receiver.recv().await?;
        self.apply(&event);
        Some(event)
    }

    /// Apply every notification that already arrived, without waiting.
    pub fn process_pending_events(&mut self) -> Vec<ManagerEvent> {
        let mut applied = Vec::new();
        loop {
            match self.event_receiver.try_recv() {
                Ok(event) => {
                    self.apply(&event);
                    applied.push(event);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        applied
    }

    fn apply(&mut self, event: &ManagerEvent) {
        match event {
            ManagerEvent::GattServerDisconnected(id) => self.state.mark_disconnected(id),
        }
    }
}

/// Text shown to the user when connecting to `name` failed.
pub fn connect_failure_message(name: &str, err: &Error) -> String {
    match err.kind() {
        ErrorKind::Blocked => format!(
            "Could not connect to {}: the Bluetooth stack blocked this device type for security.",
            name
        ),
        _ => format!("Connection failed for {}: {}", name, err),
    }
}
