use std::fmt;
use std::future::{self, Future};

use crate::host::DeviceId;

/// A discovered device as presented to the user for selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub id: DeviceId,
    pub name: Option<String>,
    /// Signal strength
    pub rssi: Option<i16>,
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({})",
            self.name.as_deref().unwrap_or(crate::common::UNKNOWN_DEVICE_NAME),
            self.id
        )?;
        if let Some(rssi) = self.rssi {
            write!(f, " {} dBm", rssi)?;
        }
        Ok(())
    }
}

/// The device chooser. Returns the index of the chosen candidate, or `None`
/// when the user dismisses it.
pub trait DevicePicker: Send + Sync {
    fn pick(&self, candidates: &[Candidate]) -> impl Future<Output = Option<usize>> + Send;
}

/// Picks the first candidate without asking. Combine with a name or address
/// filter in the scan config to target a specific device.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstCandidate;

impl DevicePicker for FirstCandidate {
    fn pick(&self, candidates: &[Candidate]) -> impl Future<Output = Option<usize>> + Send {
        future::ready((!candidates.is_empty()).then_some(0))
    }
}

/// Picker backed by a synchronous closure.
#[derive(Clone, Copy)]
pub struct PickWith<F>(F);

/// Use `func` as a picker.
pub fn pick_with<F>(func: F) -> PickWith<F>
where
    F: Fn(&[Candidate]) -> Option<usize> + Send + Sync,
{
    PickWith(func)
}

impl<F> DevicePicker for PickWith<F>
where
    F: Fn(&[Candidate]) -> Option<usize> + Send + Sync,
{
    fn pick(&self, candidates: &[Candidate]) -> impl Future<Output = Option<usize>> + Send {
        future::ready((self.0)(candidates))
    }
}
