use std::collections::HashSet;
use std::time::Duration;

use btleplug::api::{BDAddr, Central, CentralEvent, Peripheral as _, ScanFilter};
use btleplug::platform::{Peripheral, PeripheralId};
use futures::StreamExt;
use tokio::time::{timeout_at, Instant};

use super::device::device_id;
use super::Session;
use crate::host::RequestDeviceOptions;
use crate::picker::Candidate;
use crate::Result;

/// How long a scan runs when no timeout is configured.
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Default)]
pub struct ScanConfig {
    /// Index of the Bluetooth adapter to use. The first found adapter is used by default.
    pub(crate) adapter_index: usize,
    /// Filters the found devices based on device address.
    address_filter: Option<Box<dyn Fn(BDAddr) -> bool + Send + Sync>>,
    /// Filters the found devices based on local name.
    name_filter: Option<Box<dyn Fn(&str) -> bool + Send + Sync>>,
    /// Maximum results before the scan is stopped.
    max_results: Option<usize>,
    /// The scan is stopped when timeout duration is reached.
    timeout: Option<Duration>,
}

impl ScanConfig {
    /// Index of bluetooth adapter to use
    pub fn adapter_index(mut self, index: usize) -> Self {
        self.adapter_index = index;
        self
    }

    /// Filter scanned devices based on the device address
    pub fn filter_by_address(
        mut self,
        func: impl Fn(BDAddr) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.address_filter = Some(Box::new(func));
        self
    }

    /// Filter scanned devices based on the device name
    pub fn filter_by_name(mut self, func: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.name_filter = Some(Box::new(func));
        self
    }

    /// Stop the scan after given number of matches
    pub fn stop_after_matches(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    /// Stop the scan after the first match
    pub fn stop_after_first_match(self) -> Self {
        self.stop_after_matches(1)
    }

    /// Stop the scan after given duration
    pub fn stop_after_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Require that the scanned devices have a name
    pub fn require_name(self) -> Self {
        if self.name_filter.is_none() {
            self.filter_by_name(|name| !name.is_empty())
        } else {
            self
        }
    }

    fn scan_timeout(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_SCAN_TIMEOUT)
    }
}

/// One bounded discovery run that collects picker candidates.
struct ScanContext<'a> {
    session: &'a Session,
    config: &'a ScanConfig,
    /// Set of devices that have been filtered and will be ignored
    filtered: HashSet<PeripheralId>,
    /// Devices that matched the filters, in discovery order
    matched: Vec<(Peripheral, Candidate)>,
}

/// Scan for devices and return everything the user may choose from.
pub(crate) async fn discover(
    session: &Session,
    config: &ScanConfig,
    options: &RequestDeviceOptions,
) -> Result<Vec<(Peripheral, Candidate)>> {
    let mut ctx = ScanContext {
        session,
        config,
        filtered: HashSet::new(),
        matched: Vec::new(),
    };

    let filter = scan_filter(options);
    let mut events = session.adapter.events().await?;

    log::info!("Starting the scan");
    session.adapter.start_scan(filter).await?;

    let deadline = Instant::now() + config.scan_timeout();

    loop {
        let event = match timeout_at(deadline, events.next()).await {
            Ok(Some(event)) => event,
            Ok(None) => break,
            Err(_) => {
                log::info!("Scan timeout reached.");
                break;
            }
        };

        match event {
            CentralEvent::DeviceDiscovered(peripheral_id)
            | CentralEvent::DeviceUpdated(peripheral_id) => {
                ctx.on_device_seen(&peripheral_id).await;
            }
            _ => {}
        }

        if ctx.max_results_reached() {
            log::info!("Scanner stop condition reached.");
            break;
        }
    }

    if let Err(e) = session.adapter.stop_scan().await {
        log::warn!("Failed to stop the scan: {}", e);
    }

    // Devices the adapter already knew about may never produce a discovery
    // event while scanning.
    if !ctx.max_results_reached() {
        for peripheral in session.adapter.peripherals().await? {
            ctx.apply_filter(peripheral).await;
        }
    }

    log::info!("Scan finished with {} candidates", ctx.matched.len());

    Ok(ctx.matched)
}

/// Devices are only narrowed down by service when the caller opts out of
/// accepting all devices.
fn scan_filter(options: &RequestDeviceOptions) -> ScanFilter {
    if options.accept_all_devices {
        ScanFilter::default()
    } else {
        ScanFilter {
            services: options.optional_services.clone(),
        }
    }
}

impl ScanContext<'_> {
    fn max_results_reached(&self) -> bool {
        self.config
            .max_results
            .filter(|max_results| self.matched.len() >= *max_results)
            .is_some()
    }

    async fn on_device_seen(&mut self, peripheral_id: &PeripheralId) {
        if let Ok(peripheral) = self.session.adapter.peripheral(peripheral_id).await {
            log::trace!("Device seen: {:?}", peripheral);

            self.apply_filter(peripheral).await;
        }
    }

    async fn apply_filter(&mut self, peripheral: Peripheral) {
        if self.filtered.contains(&peripheral.id()) || self.max_results_reached() {
            return;
        }

        match self.passes_filters(&peripheral).await {
            Some(true) => self.add_peripheral(peripheral).await,
            Some(false) => {
                self.filtered.insert(peripheral.id());
            }
            None => {
                // Could not yet check all of the filters
            }
        }
    }

    async fn add_peripheral(&mut self, peripheral: Peripheral) {
        self.filtered.insert(peripheral.id());

        let props = peripheral.properties().await.ok().flatten();
        let candidate = Candidate {
            id: device_id(&peripheral),
            name: props.as_ref().and_then(|props| props.local_name.clone()),
            rssi: props.and_then(|props| props.rssi),
        };

        log::info!("Found device: {}", candidate);

        self.matched.push((peripheral, candidate));
    }

    /// Checks the configured address and name filters. `None` means the
    /// name is not known yet.
    async fn passes_filters(&self, peripheral: &Peripheral) -> Option<bool> {
        let mut passed = true;

        if let Some(filter_by_addr) = self.config.address_filter.as_ref() {
            passed &= filter_by_addr(peripheral.address());
        }

        if let Some(filter_by_name) = self.config.name_filter.as_ref() {
            passed &= match peripheral.properties().await {
                Ok(Some(props)) => props.local_name.map(|name| filter_by_name(&name)),
                _ => None,
            }?;
        }

        Some(passed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeout_applies() {
        assert_eq!(ScanConfig::default().scan_timeout(), DEFAULT_SCAN_TIMEOUT);
        assert_eq!(
            ScanConfig::default()
                .stop_after_timeout(Duration::from_secs(2))
                .scan_timeout(),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn optional_services_do_not_filter_by_default() {
        let mut options = RequestDeviceOptions::default();
        assert!(scan_filter(&options).services.is_empty());

        options.accept_all_devices = false;
        assert_eq!(scan_filter(&options).services, options.optional_services);
    }

    #[test]
    fn adapter_and_address_filter() {
        let wanted = BDAddr::from([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
        let config = ScanConfig::default()
            .adapter_index(1)
            .filter_by_address(move |addr| addr == wanted);
        let filter = config.address_filter.as_ref().unwrap();

        assert_eq!(config.adapter_index, 1);
        assert!(filter(wanted));
        assert!(!filter(BDAddr::from([0u8; 6])));
    }

    #[test]
    fn require_name_keeps_existing_filter() {
        let config = ScanConfig::default()
            .filter_by_name(|name| name == "Sensor")
            .require_name();
        let filter = config.name_filter.as_ref().unwrap();

        assert!(filter("Sensor"));
        assert!(!filter("Other"));
    }

    #[test]
    fn require_name_rejects_empty_names() {
        let config = ScanConfig::default().require_name();
        let filter = config.name_filter.as_ref().unwrap();

        assert!(!filter(""));
        assert!(filter("Sensor"));
    }
}
