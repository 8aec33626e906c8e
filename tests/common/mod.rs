#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bleuscan::host::DisconnectStream;
use bleuscan::{
    BluetoothHost, DeviceHandle, DeviceId, Error, GattServer, RequestDeviceOptions, Result,
};
use futures::StreamExt;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

pub const EVENT_TIMEOUT: Duration = Duration::from_secs(1);

/// In-memory host. Each `request_device` pops the next queued answer; an
/// empty queue behaves like a dismissed picker.
pub struct FakeHost {
    available: bool,
    answers: Mutex<VecDeque<Result<FakeDevice>>>,
    requests: Mutex<Vec<RequestDeviceOptions>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            available: true,
            answers: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn answer(&self, answer: Result<FakeDevice>) {
        self.answers.lock().unwrap().push_back(answer);
    }

    pub fn select(&self, device: &FakeDevice) {
        self.answer(Ok(device.clone()));
    }

    pub fn requests(&self) -> Vec<RequestDeviceOptions> {
        self.requests.lock().unwrap().clone()
    }
}

impl BluetoothHost for FakeHost {
    type Device = FakeDevice;

    async fn is_available(&self) -> bool {
        self.available
    }

    async fn request_device(&self, options: &RequestDeviceOptions) -> Result<FakeDevice> {
        self.requests.lock().unwrap().push(options.clone());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(Error::Cancelled))
    }
}

#[derive(Debug, Clone)]
pub struct FakeDevice {
    id: DeviceId,
    name: Option<String>,
    gatt: Option<FakeGatt>,
    disconnects: broadcast::Sender<()>,
}

impl FakeDevice {
    pub fn new(id: &str, name: Option<&str>) -> Self {
        let (disconnects, _) = broadcast::channel(8);
        Self {
            id: id.into(),
            name: name.map(str::to_string),
            gatt: Some(FakeGatt::default()),
            disconnects,
        }
    }

    pub fn without_gatt(mut self) -> Self {
        self.gatt = None;
        self
    }

    pub fn fake_gatt(&self) -> &FakeGatt {
        self.gatt.as_ref().expect("device has no GATT server")
    }

    /// Simulate the peer dropping the link.
    pub fn server_disconnect(&self) {
        if let Some(gatt) = &self.gatt {
            gatt.inner.connected.store(false, Ordering::SeqCst);
        }
        self.disconnects.send(()).ok();
    }
}

impl DeviceHandle for FakeDevice {
    type Gatt = FakeGatt;

    fn id(&self) -> DeviceId {
        self.id.clone()
    }

    fn name(&self) -> Option<String> {
        self.name.clone()
    }

    fn gatt(&self) -> Option<&FakeGatt> {
        self.gatt.as_ref()
    }

    async fn disconnections(&self) -> Result<DisconnectStream> {
        let receiver = self.disconnects.subscribe();
        Ok(Box::pin(
            BroadcastStream::new(receiver).filter_map(|event| async move { event.ok() }),
        ))
    }
}

#[derive(Debug, Clone)]
pub enum ConnectFailure {
    Blocked,
    Other(&'static str),
}

#[derive(Debug, Default)]
struct GattState {
    connected: AtomicBool,
    disconnect_fails: AtomicBool,
    connect_failure: Mutex<Option<ConnectFailure>>,
    connect_calls: AtomicUsize,
    disconnect_calls: AtomicUsize,
}

#[derive(Debug, Clone, Default)]
pub struct FakeGatt {
    inner: Arc<GattState>,
}

impl FakeGatt {
    pub fn set_connected(&self, connected: bool) {
        self.inner.connected.store(connected, Ordering::SeqCst);
    }

    pub fn fail_connect(&self, failure: ConnectFailure) {
        *self.inner.connect_failure.lock().unwrap() = Some(failure);
    }

    pub fn fail_disconnect(&self) {
        self.inner.disconnect_fails.store(true, Ordering::SeqCst);
    }

    pub fn connect_calls(&self) -> usize {
        self.inner.connect_calls.load(Ordering::SeqCst)
    }

    pub fn disconnect_calls(&self) -> usize {
        self.inner.disconnect_calls.load(Ordering::SeqCst)
    }
}

impl GattServer for FakeGatt {
    async fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    async fn connect(&self) -> Result<()> {
        self.inner.connect_calls.fetch_add(1, Ordering::SeqCst);
        match self.inner.connect_failure.lock().unwrap().clone() {
            Some(ConnectFailure::Blocked) => Err(Error::Blocked("Unsupported device.".into())),
            Some(ConnectFailure::Other(message)) => Err(Error::Host(message.into())),
            None => {
                self.inner.connected.store(true, Ordering::SeqCst);
                Ok(())
            }
        }
    }

    async fn disconnect(&self) -> Result<()> {
        self.inner.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.disconnect_fails.load(Ordering::SeqCst) {
            return Err(Error::Host("link already gone".into()));
        }
        self.inner.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}
