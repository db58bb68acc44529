//! Unified error types for the cooler session engine.
//!
//! Every failure funnels into [`Error`], which carries enough context for a
//! human-readable message and maps onto a machine-checkable [`ErrorKind`].
//! Callers see both through `CoolerEvent::Error`.

use core::fmt;

use crate::gatt::uuids::Role;
use crate::gatt::{CharHandle, DescHandle, GattStatus, ScanFailure};

// ---------------------------------------------------------------------------
// Error kind (machine-checkable)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No BLE adapter, or the radio is off.
    TransportUnavailable,
    /// Bluetooth permissions are missing.
    PermissionDenied,
    /// The scan ran out of time (or failed) without a matching device.
    DeviceNotFound,
    /// The physical link reported a non-zero status.
    ConnectionFailed,
    /// Service discovery completed with an error status.
    DiscoveryFailed,
    /// The cooler service is absent. Fatal.
    ServiceNotFound,
    /// A CCCD write failed. The queue still advances.
    DescriptorWriteFailed,
    /// A characteristic read failed. The queue still advances.
    ReadFailed,
    /// A characteristic write completed with an error status.
    WriteFailed,
    /// A command was issued outside `Ready` or against an unbound role.
    NotConnected,
    /// Wi-Fi credentials exceed the wire limits.
    PayloadTooLarge,
    /// A command argument was rejected before encoding.
    InvalidInput,
    /// An operation queue or channel was full.
    QueueFull,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::TransportUnavailable => "transport unavailable",
            Self::PermissionDenied => "permission denied",
            Self::DeviceNotFound => "device not found",
            Self::ConnectionFailed => "connection failed",
            Self::DiscoveryFailed => "discovery failed",
            Self::ServiceNotFound => "service not found",
            Self::DescriptorWriteFailed => "descriptor write failed",
            Self::ReadFailed => "read failed",
            Self::WriteFailed => "write failed",
            Self::NotConnected => "not connected",
            Self::PayloadTooLarge => "payload too large",
            Self::InvalidInput => "invalid input",
            Self::QueueFull => "queue full",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Wire errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireError {
    /// A variable-length field exceeds its wire limit.
    PayloadTooLarge {
        field: &'static str,
        len: usize,
        max: usize,
    },
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PayloadTooLarge { field, len, max } => {
                write!(f, "{field} is {len} bytes, limit is {max}")
            }
        }
    }
}

impl std::error::Error for WireError {}

impl From<WireError> for Error {
    fn from(e: WireError) -> Self {
        Self::Wire(e)
    }
}

// ---------------------------------------------------------------------------
// Transport errors (synchronous rejection by the port)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Adapter missing or disabled.
    Unavailable,
    /// Missing runtime permission.
    PermissionDenied,
    /// No link to issue the request on.
    NotConnected,
    /// The stack refused the request (another one is outstanding).
    Busy,
    /// Any other platform failure.
    Io,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "Bluetooth adapter unavailable"),
            Self::PermissionDenied => write!(f, "missing Bluetooth permissions"),
            Self::NotConnected => write!(f, "no active link"),
            Self::Busy => write!(f, "transport busy"),
            Self::Io => write!(f, "transport I/O error"),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<TransportError> for ScanFailure {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Unavailable => Self::AdapterUnavailable,
            TransportError::PermissionDenied => Self::PermissionDenied,
            TransportError::NotConnected | TransportError::Busy | TransportError::Io => {
                Self::Platform(-1)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level session error
// ---------------------------------------------------------------------------

/// Every failure the session reports to its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    Scan(ScanFailure),
    ConnectTimeout { device_name: String, secs: u32 },
    /// The cooler was found but its link never came up.
    LinkTimeout { device_name: String, secs: u32 },
    Connection { status: GattStatus },
    Discovery { status: GattStatus },
    ServiceNotFound,
    DescriptorWrite { handle: DescHandle, status: GattStatus },
    SubscribeRejected { role: Option<Role>, handle: CharHandle, cause: TransportError },
    Read { role: Option<Role>, handle: CharHandle, status: GattStatus },
    Write { role: Option<Role>, handle: CharHandle, status: GattStatus },
    WriteRejected { role: Role, cause: TransportError },
    NotConnected { role: Option<Role> },
    Wire(WireError),
    InvalidInput(&'static str),
    QueueFull(&'static str),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Scan(ScanFailure::AdapterUnavailable) => ErrorKind::TransportUnavailable,
            Self::Scan(ScanFailure::PermissionDenied) => ErrorKind::PermissionDenied,
            Self::Scan(ScanFailure::Platform(_))
            | Self::ConnectTimeout { .. }
            | Self::LinkTimeout { .. } => ErrorKind::DeviceNotFound,
            Self::Connection { .. } => ErrorKind::ConnectionFailed,
            Self::Discovery { .. } => ErrorKind::DiscoveryFailed,
            Self::ServiceNotFound => ErrorKind::ServiceNotFound,
            Self::DescriptorWrite { .. } | Self::SubscribeRejected { .. } => {
                ErrorKind::DescriptorWriteFailed
            }
            Self::Read { .. } => ErrorKind::ReadFailed,
            Self::Write { .. } | Self::WriteRejected { .. } => ErrorKind::WriteFailed,
            Self::NotConnected { .. } => ErrorKind::NotConnected,
            Self::Wire(WireError::PayloadTooLarge { .. }) => ErrorKind::PayloadTooLarge,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::QueueFull(_) => ErrorKind::QueueFull,
        }
    }
}

fn role_label(role: Option<Role>) -> &'static str {
    role.map_or("unbound", Role::name)
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scan(ScanFailure::AdapterUnavailable) => {
                write!(f, "Bluetooth adapter unavailable or disabled")
            }
            Self::Scan(ScanFailure::PermissionDenied) => write!(f, "Missing Bluetooth permissions"),
            Self::Scan(ScanFailure::Platform(code)) => write!(f, "Scan failed: {code}"),
            Self::ConnectTimeout { device_name, secs } => {
                write!(f, "No {device_name} device found within {secs}s")
            }
            Self::LinkTimeout { device_name, secs } => {
                write!(f, "Found {device_name} but could not connect within {secs}s")
            }
            Self::Connection { status } => write!(f, "Connection error: {status}"),
            Self::Discovery { status } => write!(f, "Service discovery failed: {status}"),
            Self::ServiceNotFound => write!(f, "Cooler service not found"),
            Self::DescriptorWrite { handle, status } => {
                write!(f, "Descriptor write failed on {handle}: {status}")
            }
            Self::SubscribeRejected {
                role,
                handle,
                cause,
            } => write!(
                f,
                "Notifications for {} ({handle}) rejected: {cause}",
                role_label(*role)
            ),
            Self::Read {
                role,
                handle,
                status,
            } => write!(f, "Read of {} ({handle}) failed: {status}", role_label(*role)),
            Self::Write {
                role,
                handle,
                status,
            } => write!(f, "Write of {} ({handle}) failed: {status}", role_label(*role)),
            Self::WriteRejected { role, cause } => write!(f, "Write of {role} rejected: {cause}"),
            Self::NotConnected { role: None } => write!(f, "Not connected"),
            Self::NotConnected { role: Some(role) } => {
                write!(f, "Not connected ({role} unavailable)")
            }
            Self::Wire(e) => write!(f, "Credentials too long: {e}"),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {msg}"),
            Self::QueueFull(which) => write!(f, "{which} queue full"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Wire(e) => Some(e),
            Self::WriteRejected { cause, .. } | Self::SubscribeRejected { cause, .. } => {
                Some(cause)
            }
            _ => None,
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
