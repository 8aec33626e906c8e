use thiserror::Error;

/// Coarse classification of an [`Error`], used by the dashboard to decide
/// what the user gets to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No usable Bluetooth capability on this system.
    Unavailable,
    /// The picker was dismissed or had nothing to offer.
    Cancelled,
    /// The device has no GATT server to connect to.
    GattUnsupported,
    /// The host stack refused the connection by policy.
    Blocked,
    /// A device with the same id is already listed.
    Duplicate,
    /// Anything else the host reported.
    Other,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Bluetooth is not available on this system.")]
    Unavailable,

    #[error("User cancelled device selection.")]
    Cancelled,

    #[error("GATT connection is not supported by this device.")]
    GattUnsupported,

    #[error("connection blocked by the Bluetooth stack: {0}")]
    Blocked(String),

    #[error("Device \"{0}\" is already in your list.")]
    Duplicate(String),

    #[error(transparent)]
    Btle(btleplug::Error),

    #[error("{0}")]
    Host(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Unavailable => ErrorKind::Unavailable,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::GattUnsupported => ErrorKind::GattUnsupported,
            Error::Blocked(_) => ErrorKind::Blocked,
            Error::Duplicate(_) => ErrorKind::Duplicate,
            Error::Btle(_) | Error::Host(_) => ErrorKind::Other,
        }
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.kind() == ErrorKind::Cancelled
    }
}

impl From<btleplug::Error> for Error {
    fn from(err: btleplug::Error) -> Self {
        match err {
            btleplug::Error::PermissionDenied => Error::Blocked(err.to_string()),
            err => Error::Btle(err),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
