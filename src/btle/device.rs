use btleplug::api::{BDAddr, Peripheral as _};
use btleplug::platform::{Peripheral, PeripheralId};
use futures::StreamExt;
use tokio::sync::broadcast::Sender;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;

use crate::host::{DeviceHandle, DeviceId, DisconnectStream, GattServer};
use crate::picker::Candidate;
use crate::Result;

/// A device chosen through [`BtleHost`](super::BtleHost).
#[derive(Debug, Clone)]
pub struct BtleDevice {
    id: DeviceId,
    name: Option<String>,
    gatt: BtleGatt,
    disconnects: Sender<PeripheralId>,
}

impl BtleDevice {
    pub(crate) fn new(
        peripheral: Peripheral,
        candidate: Candidate,
        disconnects: Sender<PeripheralId>,
    ) -> Self {
        Self {
            id: candidate.id,
            name: candidate.name,
            gatt: BtleGatt { peripheral },
            disconnects,
        }
    }
}

impl DeviceHandle for BtleDevice {
    type Gatt = BtleGatt;

    fn id(&self) -> DeviceId {
        self.id.clone()
    }

    fn name(&self) -> Option<String> {
        self.name.clone()
    }

    /// Every btleplug peripheral can be connected to.
    fn gatt(&self) -> Option<&BtleGatt> {
        Some(&self.gatt)
    }

    async fn disconnections(&self) -> Result<DisconnectStream> {
        let peripheral_id = self.gatt.peripheral.id();
        let gatt = self.gatt.clone();
        let receiver = self.disconnects.subscribe();

        Ok(Box::pin(BroadcastStream::new(receiver).filter_map(
            move |event| {
                let delivery = classify(&event, &peripheral_id);
                let gatt = gatt.clone();
                async move {
                    match delivery {
                        Delivery::Ours => Some(()),
                        Delivery::Other => None,
                        // Our event may be among the skipped ones; ask the link.
                        Delivery::Lagged => (!gatt.is_connected().await).then_some(()),
                    }
                }
            },
        )))
    }
}

#[derive(Debug, Clone)]
pub struct BtleGatt {
    peripheral: Peripheral,
}

impl GattServer for BtleGatt {
    async fn is_connected(&self) -> bool {
        self.peripheral.is_connected().await.unwrap_or(false)
    }

    async fn connect(&self) -> Result<()> {
        self.peripheral.connect().await?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.peripheral.disconnect().await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Ours,
    Other,
    Lagged,
}

fn classify<T: PartialEq>(event: &Result<T, BroadcastStreamRecvError>, own: &T) -> Delivery {
    match event {
        Ok(id) if id == own => Delivery::Ours,
        Ok(_) => Delivery::Other,
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            log::debug!("Disconnect listener lagged by {} events", skipped);
            Delivery::Lagged
        }
    }
}

/// Some platforms hide the hardware address; fall back to the opaque
/// peripheral id there so ids stay unique.
pub(crate) fn device_id(peripheral: &Peripheral) -> DeviceId {
    let address = peripheral.address();
    if address == BDAddr::from([0u8; 6]) {
        DeviceId::new(format!("{:?}", peripheral.id()))
    } else {
        DeviceId::new(address.to_string())
    }
}
