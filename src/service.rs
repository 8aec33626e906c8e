//! Thin wrappers over the host capability. Each one maps a single host call
//! onto the crate's error taxonomy and nothing more.

use crate::host::{BluetoothHost, DeviceHandle, GattServer, RequestDeviceOptions};
use crate::{Error, Result};

/// Whether Bluetooth can be used at all.
pub async fn is_bluetooth_supported<H: BluetoothHost>(host: &H) -> bool {
    host.is_available().await
}

/// Ask the user to pick one device, offering everything the host can see.
pub async fn request_device<H: BluetoothHost>(host: &H) -> Result<H::Device> {
    if !host.is_available().await {
        return Err(Error::Unavailable);
    }

    let options = RequestDeviceOptions::default();
    log::debug!("Requesting device with {:?}", options);

    match host.request_device(&options).await {
        Ok(device) => {
            log::info!("Selected device {}", device.id());
            Ok(device)
        }
        Err(e) if e.is_cancelled() => {
            log::debug!("Device selection was cancelled");
            Err(Error::Cancelled)
        }
        Err(e) => Err(e),
    }
}

/// Connect to the GATT server of `device`.
pub async fn connect_device<D: DeviceHandle>(device: &D) -> Result<()> {
    let gatt = device.gatt().ok_or(Error::GattUnsupported)?;

    log::debug!("Connecting to {}", device.id());
    gatt.connect().await?;
    log::info!("Connected to {}", device.id());

    Ok(())
}

/// Disconnect from `device` if it is connected. Failures are only logged.
pub async fn disconnect_device<D: DeviceHandle>(device: &D) {
    let Some(gatt) = device.gatt() else {
        return;
    };

    if !gatt.is_connected().await {
        return;
    }

    match gatt.disconnect().await {
        Ok(()) => log::info!("Disconnected from {}", device.id()),
        Err(e) => log::warn!("Disconnect from {} failed: {}", device.id(), e),
    }
}
