//! Discover, connect to and manage Bluetooth Low Energy devices.
//!
//! The crate keeps a small dashboard of devices the user picked: which ones
//! are connected, which are being connected to, and the last error worth
//! showing. The Bluetooth stack itself stays behind the [`BluetoothHost`]
//! trait; [`btle::BtleHost`] implements it on top of `btleplug`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bleuscan::btle::{BtleHost, ScanConfig};
//! use bleuscan::picker::FirstCandidate;
//! use bleuscan::{DeviceManager, ScanOutcome};
//!
//! #[tokio::main]
//! async fn main() {
//!     pretty_env_logger::init();
//!
//!     let config = ScanConfig::default().require_name().stop_after_first_match();
//!     let host = BtleHost::new(config, FirstCandidate).await;
//!     let mut manager = DeviceManager::new(host).await;
//!
//!     if let ScanOutcome::Added(id) = manager.scan().await {
//!         manager.connect(&id).await;
//!     }
//!
//!     print!("{}", bleuscan::view::render(manager.state()));
//! }
//!```

#![warn(clippy::all, future_incompatible, nonstandard_style, rust_2018_idioms)]

pub use error::{Error, ErrorKind, Result};
pub use host::{BluetoothHost, DeviceHandle, DeviceId, GattServer, RequestDeviceOptions};
pub use manager::{DeviceManager, ManagerEvent, ScanOutcome};
pub use state::{ConnectionState, DashboardState, DeviceEntry};

mod error;
mod manager;
mod state;

pub mod btle;
pub mod common;
pub mod host;
pub mod picker;
pub mod service;
pub mod view;
