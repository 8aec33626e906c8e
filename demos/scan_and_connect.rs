use std::time::Duration;

use bleuscan::btle::{BtleHost, ScanConfig};
use bleuscan::picker::pick_with;
use bleuscan::{view, DeviceManager, ScanOutcome};

/// Picks the strongest named device nearby, connects to it and prints the
/// dashboard.
#[tokio::main]
async fn main() {
    pretty_env_logger::init();

    let config = ScanConfig::default()
        .require_name()
        .stop_after_timeout(Duration::from_secs(10));

    let picker = pick_with(|candidates| {
        candidates
            .iter()
            .enumerate()
            .max_by_key(|(_, candidate)| candidate.rssi.unwrap_or(i16::MIN))
            .map(|(index, _)| index)
    });

    let host = BtleHost::new(config, picker).await;
    let mut manager = DeviceManager::new(host).await;

    match manager.scan().await {
        ScanOutcome::Added(id) => {
            manager.connect(&id).await;
        }
        ScanOutcome::Cancelled => println!("Nothing found."),
        _ => {}
    }

    print!("{}", view::render(manager.state()));
}
