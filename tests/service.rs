mod common;

use bleuscan::common::services::{BATTERY_SERVICE, DEVICE_INFORMATION};
use bleuscan::service::{connect_device, disconnect_device, is_bluetooth_supported, request_device};
use bleuscan::{DeviceHandle, Error, ErrorKind, GattServer};
use common::{ConnectFailure, FakeDevice, FakeHost};

#[tokio::test]
async fn support_follows_host() {
    assert!(is_bluetooth_supported(&FakeHost::new()).await);
    assert!(!is_bluetooth_supported(&FakeHost::unavailable()).await);
}

#[tokio::test]
async fn request_offers_all_devices_with_optional_services() {
    let host = FakeHost::new();
    host.select(&FakeDevice::new("AA:BB", Some("Sensor")));

    let device = request_device(&host).await.unwrap();
    assert_eq!(device.id().as_str(), "AA:BB");

    let requests = host.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].accept_all_devices);
    assert_eq!(
        requests[0].optional_services,
        vec![BATTERY_SERVICE, DEVICE_INFORMATION]
    );
}

#[tokio::test]
async fn dismissed_picker_is_cancelled() {
    let host = FakeHost::new();

    let err = request_device(&host).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert!(err.to_string().contains("cancelled"));
}

#[tokio::test]
async fn request_on_unavailable_host_fails_without_asking() {
    let host = FakeHost::unavailable();

    let err = request_device(&host).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unavailable);
    assert!(host.requests().is_empty());
}

#[tokio::test]
async fn other_request_errors_pass_through() {
    let host = FakeHost::new();
    host.answer(Err(Error::Host("adapter is powered off".into())));

    let err = request_device(&host).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Other);
    assert_eq!(err.to_string(), "adapter is powered off");
}

#[tokio::test]
async fn connect_requires_gatt() {
    let device = FakeDevice::new("CC:DD", None).without_gatt();

    let err = connect_device(&device).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::GattUnsupported);
}

#[tokio::test]
async fn connect_reports_blocked_devices() {
    let device = FakeDevice::new("AA:BB", Some("Keyboard"));
    device.fake_gatt().fail_connect(ConnectFailure::Blocked);

    let err = connect_device(&device).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Blocked);
    assert!(!device.fake_gatt().is_connected().await);
}

#[tokio::test]
async fn connect_then_disconnect() {
    let device = FakeDevice::new("AA:BB", Some("Sensor"));

    connect_device(&device).await.unwrap();
    assert!(device.fake_gatt().is_connected().await);

    disconnect_device(&device).await;
    assert!(!device.fake_gatt().is_connected().await);
    assert_eq!(device.fake_gatt().disconnect_calls(), 1);
}

#[tokio::test]
async fn disconnect_swallows_failures() {
    let device = FakeDevice::new("AA:BB", Some("Sensor"));
    device.fake_gatt().set_connected(true);
    device.fake_gatt().fail_disconnect();

    disconnect_device(&device).await;
    assert_eq!(device.fake_gatt().disconnect_calls(), 1);
}

#[tokio::test]
async fn disconnect_without_gatt_is_a_no_op() {
    let device = FakeDevice::new("CC:DD", None).without_gatt();
    disconnect_device(&device).await;
}
