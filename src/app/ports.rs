//! Port traits: the hexagonal boundary between the session engine and
//! the outside world.
//!
//! ```text
//!   BLE stack ──▶ GattTransport ──▶ CoolerService ──▶ EventSink ──▶ caller
//! ```
//!
//! The platform BLE stack implements [`GattTransport`]; whoever consumes
//! caller events implements [`EventSink`]. The
//! [`CoolerService`](super::service::CoolerService) consumes both via
//! generics, so the session logic never touches a radio.
//!
//! ## Transport contract
//!
//! - Every call is fire-and-forget. `Ok(())` means the request was
//!   accepted; its outcome arrives later as a
//!   [`TransportEvent`](crate::gatt::TransportEvent) fed back into the
//!   session. `Err` means it was rejected on the spot and no completion
//!   will follow.
//! - Reads and descriptor writes are never issued while another request
//!   of the same class is outstanding.
//! - After [`GattTransport::disconnect`] the transport delivers no further
//!   events for that link.

use crate::error::TransportError;
use crate::gatt::{CharHandle, DescHandle, PeripheralId, WriteType};

// ───────────────────────────────────────────────────────────────
// Transport port (driven adapter: domain → BLE stack)
// ───────────────────────────────────────────────────────────────

/// The BLE central operations the session needs.
pub trait GattTransport {
    /// Start scanning. `name_hint` is the device name the session is
    /// looking for; the transport may use it as a platform-side filter.
    fn start_scan(&mut self, name_hint: &str) -> Result<(), TransportError>;

    fn stop_scan(&mut self) -> Result<(), TransportError>;

    /// Open a link. Answered by `ConnectionStateChanged`.
    fn connect(&mut self, peripheral: PeripheralId) -> Result<(), TransportError>;

    /// Close the current link. No completion event.
    fn disconnect(&mut self) -> Result<(), TransportError>;

    /// Answered by `ServicesDiscovered`.
    fn discover_services(&mut self) -> Result<(), TransportError>;

    /// Answered by `CharacteristicRead`.
    fn read_characteristic(&mut self, handle: CharHandle) -> Result<(), TransportError>;

    /// Answered by `CharacteristicWritten` when `write_type` is
    /// [`WriteType::WithResponse`].
    fn write_characteristic(
        &mut self,
        handle: CharHandle,
        value: &[u8],
        write_type: WriteType,
    ) -> Result<(), TransportError>;

    /// Answered by `DescriptorWritten`.
    fn write_descriptor(&mut self, handle: DescHandle, value: &[u8]) -> Result<(), TransportError>;

    /// Route `CharacteristicChanged` for `handle` to the session.
    /// Local to the stack; the peripheral side is the CCCD write.
    fn enable_notifications(&mut self, handle: CharHandle) -> Result<(), TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → caller)
// ───────────────────────────────────────────────────────────────

/// The session emits [`CoolerEvent`](super::events::CoolerEvent)s through
/// this port, in production order.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::CoolerEvent);
}

impl EventSink for Vec<super::events::CoolerEvent> {
    fn emit(&mut self, event: &super::events::CoolerEvent) {
        self.push(event.clone());
    }
}
