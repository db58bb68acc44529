//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing cooler events through the `log`
//! facade. Whatever logger the binary installs decides where they end up.

use log::{info, warn};

use crate::app::events::CoolerEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`CoolerEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink {
    emitted: u32,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events logged so far.
    pub fn emitted(&self) -> u32 {
        self.emitted
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &CoolerEvent) {
        self.emitted = self.emitted.wrapping_add(1);
        match event {
            CoolerEvent::ConnectionStateChanged(up) => {
                info!("LINK  | {}", if *up { "connected" } else { "disconnected" });
            }
            CoolerEvent::TelemetryUpdated(t) => {
                info!("TELEM | {}", t);
            }
            CoolerEvent::ParametersUpdated(p) => {
                info!(
                    "PARAM | setpoint={:.1}\u{00b0}C hyst={:.1}\u{00b0}C \
                     hot_cut={:.1}\u{00b0}C hot_resume={:.1}\u{00b0}C fan_run_on={}s",
                    p.setpoint_c, p.hysteresis_c, p.hot_cut_c, p.hot_resume_c, p.fan_run_on_secs,
                );
            }
            CoolerEvent::DeviceInfo(text) => {
                info!("INFO  | {}", text);
            }
            CoolerEvent::Error { kind, message } => {
                warn!("ERROR | {} | {}", kind, message);
            }
        }
    }
}
