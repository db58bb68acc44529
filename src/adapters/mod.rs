//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements    | Connects to                    |
//! |--------------|---------------|--------------------------------|
//! | `log_sink`   | EventSink     | `log` facade                   |
//! | `sim_cooler` | GattTransport | In-process simulated cooler    |
//!
//! A platform BLE central (BlueZ, CoreBluetooth, Android) implements
//! `GattTransport` the same way `sim_cooler` does: accept the call, then
//! post the completion through a `SessionHandle`.

pub mod log_sink;
pub mod sim_cooler;
