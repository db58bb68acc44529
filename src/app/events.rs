//! Outbound caller events.
//!
//! The [`CoolerService`](super::service::CoolerService) emits these through
//! the [`EventSink`](super::ports::EventSink) port in the order the session
//! produced them. Adapters on the other side decide where they go: a log,
//! a UI thread, or the actor's outbound channel.

use crate::error::{Error, ErrorKind};
use crate::model::{CoolerParams, Telemetry};

/// Structured events emitted by the session engine.
#[derive(Debug, Clone, PartialEq)]
pub enum CoolerEvent {
    /// The physical link came up (`true`) or the session was torn down.
    ConnectionStateChanged(bool),

    /// A complete telemetry snapshot.
    TelemetryUpdated(Telemetry),

    /// A parameter changed. Unseen fields are still zero.
    ParametersUpdated(CoolerParams),

    /// Device information text, once per read.
    DeviceInfo(String),

    /// Something failed. `kind` is stable; `message` is for humans.
    Error { kind: ErrorKind, message: String },
}

impl CoolerEvent {
    pub fn from_error(error: &Error) -> Self {
        Self::Error {
            kind: error.kind(),
            message: error.to_string(),
        }
    }

    /// The error kind, if this is an error event.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Error { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
