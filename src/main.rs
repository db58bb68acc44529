//! XTrailCooler demo: runs one session against the simulated cooler.
//!
//! ```text
//! ┌──────────────┐  CoolerCommand   ┌────────────────┐  GattTransport  ┌─────────────────┐
//! │ main thread  │────────────────▶│ session thread │───────────────▶│ SimulatedCooler │
//! │ LogEventSink │◀────────────────│ CoolerService  │◀───────────────│ (posts events)  │
//! └──────────────┘   CoolerEvent    └────────────────┘ TransportEvent  └─────────────────┘
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use xtrailcooler::adapters::log_sink::LogEventSink;
use xtrailcooler::adapters::sim_cooler::SimulatedCooler;
use xtrailcooler::app::actor;
use xtrailcooler::app::ports::EventSink;
use xtrailcooler::model::{StateBits, Telemetry};
use xtrailcooler::{CoolerCommand, CoolerEvent, SessionConfig, SessionHandle};

/// Drive an XTrailCooler session against a simulated cooler
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON session configuration (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Setpoint (°C) to write once the parameters have been read
    #[arg(short, long)]
    setpoint: Option<f32>,

    /// How long to run the session
    #[arg(short, long, default_value_t = 5)]
    duration_secs: u64,
}

fn load_config(path: Option<&PathBuf>) -> Result<SessionConfig> {
    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config = SessionConfig::from_json(&text)
        .with_context(|| format!("Invalid config file: {}", path.display()))?;
    Ok(config)
}

/// Sensor readings that drift a little on every call.
fn drifting_telemetry(step: u32) -> Telemetry {
    let wobble = (step % 10) as f32 / 10.0;
    let mut bits = StateBits::PELLET1_ACTIVE | StateBits::HOT_FAN_ACTIVE;
    if step % 4 == 0 {
        bits |= StateBits::PELLET2_ACTIVE;
    }
    Telemetry {
        inside_temp_c: 4.0 + wobble,
        hot_temp_c: 37.5 + 2.0 * wobble,
        state: StateBits(bits),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = load_config(args.config.as_ref())?;
    info!(
        "looking for {:?} (timeout {}s, tick {}ms)",
        config.device_name, config.connect_timeout_secs, config.tick_interval_ms
    );

    let session = SessionHandle::new();
    let cooler = SimulatedCooler::new(config.device_name.clone(), &session);
    let worker = actor::spawn(config, cooler.clone(), &session)
        .context("Failed to spawn session thread")?;

    session.send(CoolerCommand::Connect)?;

    let mut sink = LogEventSink::new();
    let mut setpoint = args.setpoint;
    let mut step = 0u32;
    let deadline = Instant::now() + Duration::from_secs(args.duration_secs);
    let mut next_push = Instant::now();

    while Instant::now() < deadline {
        if let Some(event) = session.next_event_within(Duration::from_millis(100)) {
            sink.emit(&event);
            if matches!(event, CoolerEvent::ParametersUpdated(_)) {
                if let Some(celsius) = setpoint.take() {
                    info!("writing setpoint {:.1}\u{00b0}C", celsius);
                    session.send(CoolerCommand::UpdateSetpoint(celsius))?;
                }
            }
        }

        if cooler.is_connected() && Instant::now() >= next_push {
            cooler.push_telemetry(drifting_telemetry(step));
            step = step.wrapping_add(1);
            next_push = Instant::now() + Duration::from_millis(500);
        }
    }

    session.send(CoolerCommand::Disconnect)?;
    session.shutdown()?;
    if worker.join().is_err() {
        warn!("session thread panicked");
    }
    while let Some(event) = session.try_next_event() {
        sink.emit(&event);
    }
    info!("done, {} events", sink.emitted());
    Ok(())
}
