//! Snapshot aggregation.
//!
//! Telemetry fields arrive independently (reads and notifications in any
//! order). [`TelemetryAggregator`] holds them until all three have been seen
//! and only then produces [`Telemetry`]. [`ParamsAggregator`] produces a
//! snapshot on every field update.

use crate::gatt::codec::Reading;
use crate::model::{CoolerParams, StateBits, Telemetry};

/// Result of feeding one decoded reading to [`Aggregators::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    Telemetry(Telemetry),
    Params(CoolerParams),
    DeviceInfo(String),
    /// Telemetry field stored, snapshot still incomplete.
    Pending,
}

// ---------------------------------------------------------------------------
// Telemetry
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct TelemetryAggregator {
    inside_temp_c: Option<f32>,
    hot_temp_c: Option<f32>,
    state: Option<StateBits>,
}

impl TelemetryAggregator {
    pub fn set_inside_temp(&mut self, value: f32) -> Option<Telemetry> {
        self.inside_temp_c = Some(value);
        self.snapshot()
    }

    pub fn set_hot_temp(&mut self, value: f32) -> Option<Telemetry> {
        self.hot_temp_c = Some(value);
        self.snapshot()
    }

    pub fn set_state_bits(&mut self, bits: u16) -> Option<Telemetry> {
        self.state = Some(StateBits(bits));
        self.snapshot()
    }

    /// The current snapshot, once every field has been observed.
    pub fn snapshot(&self) -> Option<Telemetry> {
        Some(Telemetry {
            inside_temp_c: self.inside_temp_c?,
            hot_temp_c: self.hot_temp_c?,
            state: self.state?,
        })
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ParamsAggregator {
    params: CoolerParams,
}

impl ParamsAggregator {
    /// Apply a parameter reading. `None` for non-parameter readings.
    pub fn apply(&mut self, reading: &Reading) -> Option<CoolerParams> {
        let p = &mut self.params;
        match *reading {
            Reading::Setpoint(v) => p.setpoint_c = v,
            Reading::Hysteresis(v) => p.hysteresis_c = v,
            Reading::HotCut(v) => p.hot_cut_c = v,
            Reading::HotResume(v) => p.hot_resume_c = v,
            Reading::FanRunOn(secs) => p.fan_run_on_secs = secs,
            _ => return None,
        }
        Some(*p)
    }

    pub fn current(&self) -> CoolerParams {
        self.params
    }

    pub fn reset(&mut self) {
        self.params = CoolerParams::default();
    }
}

// ---------------------------------------------------------------------------
// Both, routed by reading
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct Aggregators {
    pub telemetry: TelemetryAggregator,
    pub params: ParamsAggregator,
}

impl Aggregators {
    pub fn apply(&mut self, reading: Reading) -> Update {
        let telemetry = match reading {
            Reading::InsideTemp(v) => self.telemetry.set_inside_temp(v),
            Reading::HotTemp(v) => self.telemetry.set_hot_temp(v),
            Reading::StateBits(bits) => self.telemetry.set_state_bits(bits),
            Reading::DeviceInfo(text) => return Update::DeviceInfo(text),
            ref other => {
                return self
                    .params
                    .apply(other)
                    .map_or(Update::Pending, Update::Params);
            }
        };
        telemetry.map_or(Update::Pending, Update::Telemetry)
    }

    pub fn reset(&mut self) {
        self.telemetry.reset();
        self.params.reset();
    }
}
