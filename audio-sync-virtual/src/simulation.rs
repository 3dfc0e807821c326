//! Tick-driven capture → framer → jitter buffer → sink loop on virtual devices.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use audio_sync_core::models::audio_models::{CaptureDiagnostics, PlaybackDiagnostics};
use audio_sync_core::models::config::{CaptureConfiguration, PlaybackConfiguration};
use audio_sync_core::models::error::SyncError;
use audio_sync_core::session::capture_framer::CaptureFramer;
use audio_sync_core::session::jitter_buffer::PlaybackJitterBuffer;
use audio_sync_core::traits::clock::Clock;

use crate::capture_device::VirtualCaptureDevice;
use crate::clock::ManualClock;
use crate::playback_sink::VirtualPlaybackSink;
use crate::signal::Signal;

/// Everything needed to run one simulated loopback session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub capture: CaptureConfiguration,
    pub playback: PlaybackConfiguration,

    /// Channels recorded by the virtual capture device (default: 1).
    pub channels: u16,

    /// Length of the capture device's loop buffer in seconds (default: 1.0).
    pub device_buffer_secs: f64,

    /// Capture clock relative to nominal (default: 1.0).
    pub capture_skew: f64,

    /// Playback clock relative to nominal (default: 1.0).
    pub playback_skew: f64,

    /// Host tick period in milliseconds (default: 10).
    pub tick_ms: u32,

    /// Simulated run length in seconds (default: 10.0).
    pub duration_secs: f64,

    /// Interval between progress log lines in seconds (default: 1.0).
    pub report_interval_secs: f64,

    pub signal: Signal,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            capture: CaptureConfiguration::default(),
            playback: PlaybackConfiguration::default(),
            channels: 1,
            device_buffer_secs: 1.0,
            capture_skew: 1.0,
            playback_skew: 1.0,
            tick_ms: 10,
            duration_secs: 10.0,
            report_interval_secs: 1.0,
            signal: Signal::default(),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.capture.validate()?;
        self.playback.validate()?;
        if self.channels == 0 {
            return Err("channel count must be positive".into());
        }
        if self.tick_ms == 0 {
            return Err("tick period must be positive".into());
        }
        for (name, value) in [
            ("device buffer", self.device_buffer_secs),
            ("capture skew", self.capture_skew),
            ("playback skew", self.playback_skew),
            ("duration", self.duration_secs),
            ("report interval", self.report_interval_secs),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{} must be positive: {}", name, value));
            }
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, SyncError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SyncError::InvalidConfigFile(e.to_string()))?;
        config.validate().map_err(SyncError::Configuration)?;
        Ok(config)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms as u64)
    }
}

/// Outcome of a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    pub simulated_secs: f64,
    pub ticks: u64,
    pub capture_overruns: u64,
    pub final_latency_secs: f32,
    pub final_playback_rate: f32,
    pub capture: CaptureDiagnostics,
    pub playback: PlaybackDiagnostics,
}

/// Owns a virtual capture device, a virtual sink and the two sessions
/// between them, all on one [`ManualClock`].
pub struct LoopbackSimulation {
    config: SimulationConfig,
    clock: ManualClock,
    device: VirtualCaptureDevice,
    sink: VirtualPlaybackSink,
    framer: CaptureFramer<VirtualCaptureDevice, ManualClock>,
    jitter: PlaybackJitterBuffer<VirtualPlaybackSink, ManualClock>,
    ticks: u64,
    capture_overruns: u64,
}

impl LoopbackSimulation {
    /// Build the devices and start capturing.
    pub fn new(config: SimulationConfig) -> Result<Self, SyncError> {
        Self::with_sink(config, VirtualPlaybackSink::new())
    }

    /// Like [`new`](Self::new), playing into a caller-supplied sink.
    pub fn with_sink(config: SimulationConfig, sink: VirtualPlaybackSink) -> Result<Self, SyncError> {
        config.validate().map_err(SyncError::Configuration)?;

        let clock = ManualClock::new();
        let device = VirtualCaptureDevice::new("virtual-capture", config.channels, config.device_buffer_secs)
            .with_signal(config.signal)
            .with_clock_skew(config.capture_skew);
        let sink = sink.with_clock_skew(config.playback_skew);

        let mut framer = CaptureFramer::new(device.clone(), clock.clone());
        framer.start(config.capture.clone())?;
        let jitter = PlaybackJitterBuffer::new(sink.clone(), clock.clone(), config.playback.clone())?;

        Ok(Self {
            config,
            clock,
            device,
            sink,
            framer,
            jitter,
            ticks: 0,
            capture_overruns: 0,
        })
    }

    /// Advance simulated time by one tick and drive both sessions.
    pub fn step(&mut self) -> Result<(), SyncError> {
        let tick = self.config.tick();
        self.clock.advance(tick);
        self.device.advance(tick);
        self.sink.advance(tick);
        self.ticks += 1;

        match self.framer.on_tick() {
            Ok(frames) => {
                for frame in &frames {
                    self.jitter.feed(frame);
                }
            }
            Err(e) if e.is_recoverable() => {
                log::warn!("{}", e);
                self.capture_overruns += 1;
            }
            Err(e) => return Err(e),
        }
        self.jitter.on_tick();
        Ok(())
    }

    /// Run for the configured duration, logging progress.
    pub fn run(&mut self) -> Result<SimulationReport, SyncError> {
        let tick_secs = self.config.tick().as_secs_f64();
        let total_ticks = (self.config.duration_secs / tick_secs).round() as u64;
        let report_every = ((self.config.report_interval_secs / tick_secs).round() as u64).max(1);

        for _ in 0..total_ticks {
            self.step()?;
            if self.ticks % report_every == 0 {
                log::info!(
                    "t={:.2}s status={:?} latency={:.4}s rate={:.5} buffered={:.3}s",
                    self.clock_secs(),
                    self.jitter.status(),
                    self.jitter.latency_secs(),
                    self.jitter.playback_rate(),
                    self.jitter.buffered_secs()
                );
            }
        }
        Ok(self.report())
    }

    pub fn report(&self) -> SimulationReport {
        SimulationReport {
            simulated_secs: self.clock_secs(),
            ticks: self.ticks,
            capture_overruns: self.capture_overruns,
            final_latency_secs: self.jitter.latency_secs(),
            final_playback_rate: self.jitter.playback_rate(),
            capture: self.framer.diagnostics(),
            playback: self.jitter.diagnostics(),
        }
    }

    pub fn device(&self) -> &VirtualCaptureDevice {
        &self.device
    }

    pub fn sink(&self) -> &VirtualPlaybackSink {
        &self.sink
    }

    pub fn framer(&self) -> &CaptureFramer<VirtualCaptureDevice, ManualClock> {
        &self.framer
    }

    pub fn jitter(&self) -> &PlaybackJitterBuffer<VirtualPlaybackSink, ManualClock> {
        &self.jitter
    }

    pub fn jitter_mut(&mut self) -> &mut PlaybackJitterBuffer<VirtualPlaybackSink, ManualClock> {
        &mut self.jitter
    }

    fn clock_secs(&self) -> f64 {
        self.clock.now().as_secs_f64()
    }
}
