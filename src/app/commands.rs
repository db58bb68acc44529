//! Inbound commands to the session engine.
//!
//! These represent actions requested by the caller (UI, CLI, tests) that
//! the [`CoolerService`](super::service::CoolerService) interprets and acts
//! upon.

use serde::{Deserialize, Serialize};

use crate::model::CommandBits;

/// Commands a caller can send into the session engine.
#[derive(Debug, Clone, PartialEq)]
pub enum CoolerCommand {
    /// Scan for the cooler and connect. Tears down any current session first.
    Connect,

    /// Tear the session down.
    Disconnect,

    /// Write the command bitmask.
    SendCommand(CommandBits),

    /// Write the inside temperature setpoint (°C).
    UpdateSetpoint(f32),

    /// Write the control hysteresis (°C).
    UpdateHysteresis(f32),

    /// Write the hot-side cut-out temperature (°C).
    UpdateHotCut(f32),

    /// Write the hot-side resume temperature (°C).
    UpdateHotResume(f32),

    /// Write the fan run-on time. Clamped to `0..=65535` seconds.
    UpdateFanRunOn(i32),

    /// Write several parameters in one go.
    ApplyParams(ParamsUpdate),

    /// Provision the cooler's Wi-Fi.
    WriteWifiCredentials { ssid: String, password: String },
}

/// A batch of optional parameter writes.
///
/// Present fields are written in declaration order; absent ones are
/// skipped. A field that fails is reported and the rest still go out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamsUpdate {
    pub setpoint_c: Option<f32>,
    pub hysteresis_c: Option<f32>,
    pub hot_cut_c: Option<f32>,
    pub hot_resume_c: Option<f32>,
    pub fan_run_on_secs: Option<i32>,
}

impl ParamsUpdate {
    pub fn is_empty(&self) -> bool {
        self.setpoint_c.is_none()
            && self.hysteresis_c.is_none()
            && self.hot_cut_c.is_none()
            && self.hot_resume_c.is_none()
            && self.fan_run_on_secs.is_none()
    }
}
