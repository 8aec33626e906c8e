//! Host binding on top of `btleplug`.
//!
//! The picker of a browser is played by a short discovery scan on the
//! configured adapter followed by a [`DevicePicker`] choosing among the
//! devices that turned up.

use btleplug::api::{Central, CentralEvent, Manager as _};
use btleplug::platform::{Adapter, Manager, PeripheralId};
use futures::StreamExt;
use stream_cancel::{Trigger, Valved};
use tokio::sync::broadcast::{self, Sender};

pub use device::{BtleDevice, BtleGatt};
pub use scanner::{ScanConfig, DEFAULT_SCAN_TIMEOUT};

use crate::host::{BluetoothHost, RequestDeviceOptions};
use crate::picker::DevicePicker;
use crate::{Error, Result};

mod device;
mod scanner;

pub(crate) struct Session {
    pub(crate) _manager: Manager,
    pub(crate) adapter: Adapter,
    /// Peripherals whose link went down, fed from the adapter event stream
    disconnects: Sender<PeripheralId>,
    _event_pump: Trigger,
}

impl Session {
    async fn open(adapter_index: usize) -> Result<Self> {
        let manager = Manager::new().await?;
        let mut adapters = manager.adapters().await?;

        if adapter_index >= adapters.len() {
            return Err(Error::Unavailable);
        }

        let adapter = adapters.swap_remove(adapter_index);

        log::trace!("Using adapter: {:?}", adapter);

        let (disconnects, _) = broadcast::channel(16);
        let (trigger, mut events) = Valved::new(adapter.events().await?);

        let sender = disconnects.clone();
        tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let CentralEvent::DeviceDisconnected(peripheral_id) = event {
                    log::trace!("Device disconnected: {:?}", peripheral_id);
                    sender.send(peripheral_id).ok();
                }
            }
            log::debug!("Adapter event stream closed.");
        });

        Ok(Self {
            _manager: manager,
            adapter,
            disconnects,
            _event_pump: trigger,
        })
    }
}

/// [`BluetoothHost`] backed by the system Bluetooth stack.
pub struct BtleHost<P> {
    session: Option<Session>,
    config: ScanConfig,
    picker: P,
}

impl<P: DevicePicker> BtleHost<P> {
    /// Open the configured adapter. A missing stack or adapter does not fail
    /// here; the host then reports itself as unavailable.
    pub async fn new(config: ScanConfig, picker: P) -> Self {
        let session = match Session::open(config.adapter_index).await {
            Ok(session) => Some(session),
            Err(e) => {
                log::warn!("Bluetooth is unavailable: {}", e);
                None
            }
        };

        Self {
            session,
            config,
            picker,
        }
    }
}

impl<P: DevicePicker> BluetoothHost for BtleHost<P> {
    type Device = BtleDevice;

    async fn is_available(&self) -> bool {
        self.session.is_some()
    }

    async fn request_device(&self, options: &RequestDeviceOptions) -> Result<BtleDevice> {
        let session = self.session.as_ref().ok_or(Error::Unavailable)?;

        let found = scanner::discover(session, &self.config, options).await?;
        let candidates = found
            .iter()
            .map(|(_, candidate)| candidate.clone())
            .collect::<Vec<_>>();

        let index = self
            .picker
            .pick(&candidates)
            .await
            .ok_or(Error::Cancelled)?;
        let (peripheral, candidate) = found.into_iter().nth(index).ok_or(Error::Cancelled)?;

        Ok(BtleDevice::new(
            peripheral,
            candidate,
            session.disconnects.clone(),
        ))
    }
}
