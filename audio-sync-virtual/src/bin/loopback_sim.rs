//! Runs a simulated capture → playback session and prints the diagnostics.
//!
//! ```text
//! loopback-sim [config.json]
//! loopback-sim audio-sync-virtual/config/drifting_clocks.json
//! ```
//! With no argument the defaults are used. Set `RUST_LOG=debug` for session
//! events.

use std::process::ExitCode;

use audio_sync_core::SyncError;
use audio_sync_virtual::{LoopbackSimulation, SimulationConfig};

fn load_config() -> Result<SimulationConfig, SyncError> {
    match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .map_err(|e| SyncError::InvalidConfigFile(format!("{}: {}", path, e)))?;
            SimulationConfig::from_json(&json)
        }
        None => Ok(SimulationConfig::default()),
    }
}

fn run() -> Result<(), SyncError> {
    let config = load_config()?;
    log::info!(
        "Simulating {:.1}s: capture skew {}, playback skew {}, target latency {}s",
        config.duration_secs,
        config.capture_skew,
        config.playback_skew,
        config.playback.target_latency_secs
    );

    let mut sim = LoopbackSimulation::new(config)?;
    let report = sim.run()?;

    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| SyncError::Device(format!("failed to serialize report: {}", e)))?;
    println!("{}", json);
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
