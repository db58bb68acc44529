//! XTrailCooler session engine.
//!
//! Drives one BLE GATT session with an XTrailCooler battery cooler:
//! scan, connect, discover, subscribe to telemetry, mirror parameters and
//! write commands. The engine is transport-neutral; a platform BLE stack
//! plugs in through [`app::ports::GattTransport`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod aggregate;
pub mod app;
pub mod config;
pub mod error;
pub mod fsm;
pub mod gatt;
pub mod model;

pub use app::channels::SessionHandle;
pub use app::commands::{CoolerCommand, ParamsUpdate};
pub use app::events::CoolerEvent;
pub use config::SessionConfig;
pub use error::{Error, ErrorKind};
