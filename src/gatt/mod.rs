//! GATT plumbing: everything between the raw transport and the session FSM.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        GATT layer                            │
//! │                                                              │
//! │  TransportEvent ──▶ bindings (handle → Role) ──▶ codec       │
//! │                                                  │           │
//! │  sequencer (read queue · CCCD write queue)       ▼           │
//! │        │                                   Reading (typed)   │
//! │        ▼                                                     │
//! │  TransportRequest ──▶ GattTransport port                     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The value types here are transport-neutral: a handle is whatever opaque
//! number the platform stack hands out for a characteristic or descriptor.

pub mod bindings;
pub mod codec;
pub mod sequencer;
pub mod uuids;

use core::fmt;

// ───────────────────────────────────────────────────────────────
// Handles
// ───────────────────────────────────────────────────────────────

/// Opaque transport handle for a discovered characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CharHandle(pub u16);

/// Opaque transport handle for a discovered descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DescHandle(pub u16);

/// Opaque reference to a peripheral reported by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeripheralId(pub u64);

impl fmt::Display for CharHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "char#{:04x}", self.0)
    }
}

impl fmt::Display for DescHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "desc#{:04x}", self.0)
    }
}

impl fmt::Display for PeripheralId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peripheral#{:x}", self.0)
    }
}

// ───────────────────────────────────────────────────────────────
// Status codes
// ───────────────────────────────────────────────────────────────

/// ATT/GATT status byte attached to every completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GattStatus(pub u8);

impl GattStatus {
    pub const SUCCESS: Self = Self(0x00);
    /// Generic stack error; also used for requests the transport rejected
    /// before they reached the air.
    pub const LOCAL_FAILURE: Self = Self(0x85);

    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }
}

impl fmt::Display for GattStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

/// How a characteristic write is acknowledged on the air.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteType {
    WithResponse,
    WithoutResponse,
}

// ───────────────────────────────────────────────────────────────
// Discovery results
// ───────────────────────────────────────────────────────────────

/// One descriptor attached to a discovered characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveredDescriptor {
    pub uuid: u128,
    pub handle: DescHandle,
}

/// One characteristic found during service discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredCharacteristic {
    pub uuid: u128,
    pub handle: CharHandle,
    /// Every descriptor the peripheral listed for this characteristic.
    pub descriptors: Vec<DiscoveredDescriptor>,
}

impl DiscoveredCharacteristic {
    pub fn descriptor(&self, uuid: u128) -> Option<DescHandle> {
        self.descriptors
            .iter()
            .find(|d| d.uuid == uuid)
            .map(|d| d.handle)
    }
}

/// One primary service found during service discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredService {
    pub uuid: u128,
    pub characteristics: Vec<DiscoveredCharacteristic>,
}

impl DiscoveredService {
    pub fn characteristic(&self, uuid: u128) -> Option<&DiscoveredCharacteristic> {
        self.characteristics.iter().find(|c| c.uuid == uuid)
    }
}

// ───────────────────────────────────────────────────────────────
// Inbound transport events
// ───────────────────────────────────────────────────────────────

/// Why a scan could not run or was aborted by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanFailure {
    /// No adapter, or the radio is off.
    AdapterUnavailable,
    /// Runtime Bluetooth permissions were not granted.
    PermissionDenied,
    /// Platform-specific scanner error code.
    Platform(i32),
}

/// Everything the transport reports asynchronously.
///
/// Completion events (`CharacteristicRead`, `DescriptorWritten`,
/// `CharacteristicWritten`) answer a request issued earlier through the
/// `GattTransport` port; `CharacteristicChanged` is an unsolicited
/// notification.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    ScanResult {
        peripheral: PeripheralId,
        name: Option<String>,
    },
    ScanFailed(ScanFailure),
    ConnectionStateChanged {
        status: GattStatus,
        connected: bool,
    },
    ServicesDiscovered {
        status: GattStatus,
        services: Vec<DiscoveredService>,
    },
    CharacteristicRead {
        handle: CharHandle,
        status: GattStatus,
        value: Vec<u8>,
    },
    DescriptorWritten {
        handle: DescHandle,
        status: GattStatus,
    },
    CharacteristicWritten {
        handle: CharHandle,
        status: GattStatus,
    },
    CharacteristicChanged {
        handle: CharHandle,
        value: Vec<u8>,
    },
}

// ───────────────────────────────────────────────────────────────
// Outbound transport requests
// ───────────────────────────────────────────────────────────────

/// A transport call produced by a state handler.
///
/// State handlers never touch the transport; they append requests to the
/// session context and the service performs them in order afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportRequest {
    StartScan,
    StopScan,
    Connect(PeripheralId),
    Disconnect,
    DiscoverServices,
    EnableNotifications(CharHandle),
    Read(CharHandle),
    WriteDescriptor(DescHandle, [u8; 2]),
}
