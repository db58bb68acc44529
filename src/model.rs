//! Domain value types mirrored from the cooler.

use core::fmt;
use core::ops::BitOr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// State bits
// ---------------------------------------------------------------------------

/// Output and alarm bitfield reported by the controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateBits(pub u16);

impl StateBits {
    pub const PELLET1_ACTIVE: u16 = 1 << 0;
    pub const PELLET2_ACTIVE: u16 = 1 << 1;
    pub const HOT_FAN_ACTIVE: u16 = 1 << 2;
    pub const SENSOR_ALARM: u16 = 1 << 8;
    pub const OVERHEAT_ALARM: u16 = 1 << 9;
    pub const SUPPLY_ALARM: u16 = 1 << 10;

    const ALARMS: [(u16, &'static str); 3] = [
        (Self::SENSOR_ALARM, "Sensor fault"),
        (Self::OVERHEAT_ALARM, "Overheat"),
        (Self::SUPPLY_ALARM, "Supply"),
    ];

    fn has(self, mask: u16) -> bool {
        self.0 & mask != 0
    }

    pub fn pellet1_active(self) -> bool {
        self.has(Self::PELLET1_ACTIVE)
    }

    pub fn pellet2_active(self) -> bool {
        self.has(Self::PELLET2_ACTIVE)
    }

    pub fn hot_fan_active(self) -> bool {
        self.has(Self::HOT_FAN_ACTIVE)
    }

    pub fn sensor_alarm(self) -> bool {
        self.has(Self::SENSOR_ALARM)
    }

    pub fn overheat_alarm(self) -> bool {
        self.has(Self::OVERHEAT_ALARM)
    }

    pub fn supply_alarm(self) -> bool {
        self.has(Self::SUPPLY_ALARM)
    }

    /// Labels of every raised alarm, in bit order.
    pub fn active_alarms(self) -> impl Iterator<Item = &'static str> {
        Self::ALARMS
            .into_iter()
            .filter(move |(mask, _)| self.has(*mask))
            .map(|(_, label)| label)
    }
}

// ---------------------------------------------------------------------------
// Telemetry
// ---------------------------------------------------------------------------

/// A complete telemetry snapshot.
///
/// Only built once all three source fields have been observed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    pub inside_temp_c: f32,
    pub hot_temp_c: f32,
    pub state: StateBits,
}

impl fmt::Display for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let on_off = |on: bool| if on { "ON" } else { "OFF" };
        write!(
            f,
            "inside {:.1}\u{00b0}C | hot {:.1}\u{00b0}C | P1 {} | P2 {} | Fan {} | alarms: ",
            self.inside_temp_c,
            self.hot_temp_c,
            on_off(self.state.pellet1_active()),
            on_off(self.state.pellet2_active()),
            on_off(self.state.hot_fan_active()),
        )?;
        let mut alarms = self.state.active_alarms().peekable();
        if alarms.peek().is_none() {
            return f.write_str("none");
        }
        for (i, alarm) in alarms.enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(alarm)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Parameter set mirrored from the controller.
///
/// Fields not yet read default to zero, so an all-zero snapshot right after
/// connecting may be incomplete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CoolerParams {
    pub setpoint_c: f32,
    pub hysteresis_c: f32,
    pub hot_cut_c: f32,
    pub hot_resume_c: f32,
    pub fan_run_on_secs: u16,
}

// ---------------------------------------------------------------------------
// Command bitmask
// ---------------------------------------------------------------------------

/// Bitmask written to the command characteristic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandBits(u8);

impl CommandBits {
    pub const NONE: Self = Self(0);
    pub const FORCE_PELLET1: Self = Self(1 << 0);
    pub const FORCE_PELLET2: Self = Self(1 << 1);
    pub const FORCE_FANS: Self = Self(1 << 2);
    pub const CLEAR_ALARMS: Self = Self(1 << 7);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for CommandBits {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}
