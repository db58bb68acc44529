//! Application core: the session engine behind port traits.
//!
//! This module contains the caller-facing surface of the cooler client:
//! commands in, events out, the [`service::CoolerService`] that owns the
//! session, and the actor that serializes access to it. All interaction
//! with the BLE stack happens through the **port traits** defined in
//! [`ports`], keeping this layer testable without a radio.

pub mod actor;
pub mod channels;
pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
