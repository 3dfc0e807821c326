use std::sync::Arc;
use std::thread;
use std::time::Duration;

use approx::assert_abs_diff_eq;
use parking_lot::Mutex;

use audio_sync_core::{
    CaptureConfiguration, CaptureFramer, CaptureSource, ChannelDelegate, PlaybackConfiguration,
    PlaybackJitterBuffer, PlaybackSink, SharedFramer, SharedJitterBuffer, StopReason, SyncError,
    SyncEvent,
};
use audio_sync_virtual::{
    LoopbackSimulation, ManualClock, Signal, SimulationConfig, VirtualCaptureDevice,
    VirtualPlaybackSink,
};

fn capture_1khz() -> CaptureConfiguration {
    CaptureConfiguration {
        sample_rate: 1000,
        frame_duration_ms: 10,
        volume_multiplier: 1.0,
    }
}

fn assert_consecutive(samples: &[f32], first: f32) {
    assert_eq!(samples.first().copied(), Some(first));
    for (i, pair) in samples.windows(2).enumerate() {
        assert_eq!(pair[1] - pair[0], 1.0, "gap after sample {}: {:?}", i, pair);
    }
}

#[test]
fn capture_is_lossless_across_many_wraps() {
    let clock = ManualClock::new();
    let device = VirtualCaptureDevice::new("mic", 1, 0.05).with_signal(Signal::Ramp);
    let mut framer = CaptureFramer::new(device.clone(), clock.clone());
    framer.start(capture_1khz()).unwrap();

    let mut collected = Vec::new();
    for _ in 0..200 {
        let tick = Duration::from_millis(7);
        clock.advance(tick);
        device.advance(tick);
        for frame in framer.on_tick().unwrap() {
            assert_eq!(frame.samples.len(), 10);
            collected.extend(frame.samples);
        }
    }

    let recorded = device.samples_recorded() as usize;
    assert!(recorded >= 1390);
    assert_eq!(collected.len(), recorded / 10 * 10);
    assert_eq!(framer.pending_samples(), recorded % 10);
    assert_consecutive(&collected, 0.0);
    assert!(framer.diagnostics().wraparounds >= 27);
}

#[test]
fn stereo_capture_keeps_interleaving() {
    let clock = ManualClock::new();
    let device = VirtualCaptureDevice::new("mic", 2, 0.1).with_signal(Signal::Ramp);
    let mut framer = CaptureFramer::new(device.clone(), clock.clone());
    framer.start(capture_1khz()).unwrap();

    let mut collected = Vec::new();
    for _ in 0..50 {
        clock.advance(Duration::from_millis(13));
        device.advance(Duration::from_millis(13));
        for frame in framer.on_tick().unwrap() {
            assert_eq!(frame.channel_count, 2);
            assert_eq!(frame.frame_count(), 10);
            collected.extend(frame.samples);
        }
    }
    assert_consecutive(&collected, 0.0);
}

#[test]
fn stalled_host_reports_overrun_and_recovers() {
    let clock = ManualClock::new();
    let device = VirtualCaptureDevice::new("mic", 1, 0.1).with_signal(Signal::Ramp);
    let mut framer = CaptureFramer::new(device.clone(), clock.clone());
    framer.start(capture_1khz()).unwrap();
    let limit = framer.max_poll_interval().unwrap();
    assert!(limit > Duration::from_millis(90) && limit < Duration::from_millis(100));

    clock.advance(Duration::from_millis(250));
    device.advance(Duration::from_millis(250));
    let err = framer.on_tick().unwrap_err();
    assert!(matches!(err, SyncError::CaptureOverrun { .. }));
    assert!(err.is_recoverable());

    clock.advance(Duration::from_millis(20));
    device.advance(Duration::from_millis(20));
    let frames = framer.on_tick().unwrap();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].samples[0], 250.0);
    assert_eq!(framer.diagnostics().overruns, 1);
}

#[test]
fn fast_device_clock_overrun_is_reported() {
    let clock = ManualClock::new();
    let device = VirtualCaptureDevice::new("mic", 1, 0.1)
        .with_signal(Signal::Ramp)
        .with_clock_skew(1.05);
    let mut framer = CaptureFramer::new(device.clone(), clock.clone());
    framer.start(capture_1khz()).unwrap();

    clock.advance(Duration::from_millis(97));
    device.advance(Duration::from_millis(97));
    assert_eq!(device.samples_recorded(), 101);
    let err = framer.on_tick().unwrap_err();
    assert!(matches!(err, SyncError::CaptureOverrun { .. }));

    clock.advance(Duration::from_millis(20));
    device.advance(Duration::from_millis(20));
    let frames = framer.on_tick().unwrap();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].samples[0], 101.0);
}

#[test]
fn default_start_fits_bounded_device() {
    let clock = ManualClock::new();
    let device = VirtualCaptureDevice::new("usb", 1, 0.5).with_rate_range(8000, 44100);
    let mut framer = CaptureFramer::new(device.clone(), clock.clone());

    let err = framer.start(CaptureConfiguration::default()).unwrap_err();
    assert!(matches!(err, SyncError::UnsupportedSampleRate { requested: 48000, .. }));

    framer.start_default(20).unwrap();
    assert_eq!(device.sample_rate(), 44100);
    assert_eq!(framer.frame_len(), Some(882));

    clock.advance(Duration::from_millis(50));
    device.advance(Duration::from_millis(50));
    assert_eq!(framer.on_tick().unwrap().len(), 2);
}

#[test]
fn unplugged_device_is_replaced() {
    let clock = ManualClock::new();
    let device = VirtualCaptureDevice::new("usb", 1, 0.1).with_signal(Signal::Ramp);
    let mut framer = CaptureFramer::new(device.clone(), clock.clone());
    framer.start(capture_1khz()).unwrap();

    device.set_connected(false);
    clock.advance(Duration::from_millis(300));
    assert!(framer.on_tick().unwrap().is_empty());
    let retry = CaptureConfiguration {
        frame_duration_ms: 20,
        ..capture_1khz()
    };
    assert_eq!(framer.start(retry), Err(SyncError::DeviceNotAvailable));
    assert!(!framer.is_recording());

    let builtin = VirtualCaptureDevice::new("builtin", 1, 0.1).with_signal(Signal::Ramp);
    framer.replace_source(builtin.clone());
    framer.start(capture_1khz()).unwrap();
    clock.advance(Duration::from_millis(50));
    builtin.advance(Duration::from_millis(50));
    let frames = framer.on_tick().unwrap();
    assert_eq!(frames.len(), 5);
    let samples: Vec<f32> = frames.iter().flat_map(|f| f.samples.iter().copied()).collect();
    assert_consecutive(&samples, 0.0);
}

#[test]
fn latency_converges_to_target() {
    let mut sim = LoopbackSimulation::new(SimulationConfig::default()).unwrap();
    let report = sim.run().unwrap();

    assert_eq!(report.playback.starts, 1);
    assert_eq!(report.playback.underruns, 0);
    assert_eq!(report.playback.stale_resets, 0);
    assert_abs_diff_eq!(report.final_latency_secs, 0.25, epsilon = 0.03);
    assert_abs_diff_eq!(report.final_playback_rate, 1.0, epsilon = 0.02);
}

#[test]
fn fast_capture_clock_is_absorbed_by_rate() {
    let mut sim = LoopbackSimulation::new(SimulationConfig {
        capture_skew: 1.002,
        duration_secs: 20.0,
        ..Default::default()
    })
    .unwrap();
    let report = sim.run().unwrap();

    assert_eq!(report.playback.underruns, 0);
    assert_eq!(report.playback.overflows, 0);
    assert_abs_diff_eq!(report.final_latency_secs, 0.25, epsilon = 0.03);
    assert_abs_diff_eq!(report.final_playback_rate, 1.002, epsilon = 0.012);
}

#[test]
fn fast_playback_clock_is_absorbed_by_rate() {
    let mut sim = LoopbackSimulation::new(SimulationConfig {
        playback_skew: 1.003,
        duration_secs: 20.0,
        ..Default::default()
    })
    .unwrap();
    let report = sim.run().unwrap();

    assert_eq!(report.playback.underruns, 0);
    assert_abs_diff_eq!(report.final_latency_secs, 0.25, epsilon = 0.03);
    assert!(report.final_playback_rate < 1.01);
    assert!(report.final_playback_rate > 0.98);
}

#[test]
fn playback_is_gapless_once_started() {
    let sink = VirtualPlaybackSink::new().recording();
    let mut sim = LoopbackSimulation::with_sink(
        SimulationConfig {
            duration_secs: 5.0,
            signal: Signal::Ramp,
            ..Default::default()
        },
        sink,
    )
    .unwrap();
    let report = sim.run().unwrap();
    assert_eq!(report.playback.underruns, 0);

    let played = sim.sink().played();
    assert!(played.len() > 48000 * 4);
    // playback begins one 20 ms frame behind the 13th frame
    assert_consecutive(&played, 12.0 * 960.0);
}

#[test]
fn starved_sink_underruns_and_rebuffers() {
    let mut sim = LoopbackSimulation::new(SimulationConfig {
        playback_skew: 1.5,
        duration_secs: 5.0,
        ..Default::default()
    })
    .unwrap();
    let report = sim.run().unwrap();

    // the controller can only slow down by 15%, not 33%
    assert!(report.playback.underruns > 0);
    assert!(report.playback.starts > 1);
}

#[test]
fn capture_stop_goes_stale() {
    let mut sim = LoopbackSimulation::new(SimulationConfig {
        playback: PlaybackConfiguration {
            frame_lifetime_secs: 0.1,
            ..Default::default()
        },
        ..Default::default()
    })
    .unwrap();
    for _ in 0..100 {
        sim.step().unwrap();
    }
    assert!(sim.jitter().is_playing());

    // buffered audio outlasts the lifetime; staleness has to catch it
    let mut device = sim.device().clone();
    device.stop();
    for _ in 0..15 {
        sim.step().unwrap();
    }
    assert!(!sim.jitter().is_playing());
    assert_eq!(sim.report().playback.stale_resets, 1);
    assert_eq!(sim.report().playback.underruns, 0);
}

#[test]
fn events_carry_frames_between_sessions() {
    let clock = ManualClock::new();
    let device = VirtualCaptureDevice::new("mic", 1, 1.0).with_signal(Signal::Ramp);
    let sink = VirtualPlaybackSink::new();

    let (capture_events, capture_rx) = ChannelDelegate::channel();
    let (playback_events, playback_rx) = ChannelDelegate::channel();

    let mut framer = CaptureFramer::new(device.clone(), clock.clone());
    framer.set_delegate(Arc::new(capture_events));
    framer.start(CaptureConfiguration::default()).unwrap();

    let mut jitter =
        PlaybackJitterBuffer::new(sink.clone(), clock.clone(), PlaybackConfiguration::default())
            .unwrap();
    jitter.set_delegate(Arc::new(playback_events));

    let mut other_capture_events = Vec::new();
    for _ in 0..40 {
        let tick = Duration::from_millis(10);
        clock.advance(tick);
        device.advance(tick);
        sink.advance(tick);

        framer.on_tick().unwrap();
        for event in capture_rx.try_iter() {
            match event {
                SyncEvent::FrameCollected(frame) => jitter.feed(&frame),
                other => other_capture_events.push(other),
            }
        }
        jitter.on_tick();
    }
    framer.stop();
    other_capture_events.extend(capture_rx.try_iter());

    assert!(jitter.is_playing());
    assert!(matches!(
        other_capture_events.first(),
        Some(SyncEvent::RecordingStarted(f)) if f.sample_rate == 48000 && f.frame_len == 960
    ));
    assert_eq!(other_capture_events.last(), Some(&SyncEvent::RecordingStopped));

    let playback: Vec<SyncEvent> = playback_rx.try_iter().collect();
    assert!(matches!(playback[0], SyncEvent::PlaybackReinitialized(_)));
    assert_eq!(playback[1], SyncEvent::PlaybackStarted);
    assert_eq!(playback.len(), 2);
}

#[test]
fn capture_restart_at_new_rate_rebuffers_playback() {
    let clock = ManualClock::new();
    let device = VirtualCaptureDevice::new("mic", 1, 1.0);
    let sink = VirtualPlaybackSink::new();
    let (events, rx) = ChannelDelegate::channel();

    let mut framer = CaptureFramer::new(device.clone(), clock.clone());
    framer.start(CaptureConfiguration::default()).unwrap();
    let mut jitter =
        PlaybackJitterBuffer::new(sink.clone(), clock.clone(), PlaybackConfiguration::default())
            .unwrap();
    jitter.set_delegate(Arc::new(events));

    let run = |ticks: usize,
                   framer: &mut CaptureFramer<VirtualCaptureDevice, ManualClock>,
                   jitter: &mut PlaybackJitterBuffer<VirtualPlaybackSink, ManualClock>| {
        for _ in 0..ticks {
            let tick = Duration::from_millis(10);
            clock.advance(tick);
            device.advance(tick);
            sink.advance(tick);
            for frame in framer.on_tick().unwrap() {
                jitter.feed(&frame);
            }
            jitter.on_tick();
        }
    };

    run(40, &mut framer, &mut jitter);
    assert!(jitter.is_playing());
    assert_eq!(jitter.format().map(|f| f.sample_rate), Some(48000));

    framer
        .start(CaptureConfiguration {
            sample_rate: 16000,
            ..Default::default()
        })
        .unwrap();
    run(4, &mut framer, &mut jitter);
    assert!(jitter.is_buffering());
    assert_eq!(jitter.format().map(|f| f.sample_rate), Some(16000));
    assert_eq!(sink.total_capacity_samples(), 48000);

    run(30, &mut framer, &mut jitter);
    assert!(jitter.is_playing());

    let stops: Vec<StopReason> = rx
        .try_iter()
        .filter_map(|e| match e {
            SyncEvent::PlaybackStopped(reason) => Some(reason),
            _ => None,
        })
        .collect();
    assert_eq!(stops, vec![StopReason::Reset]);
}

#[test]
fn shared_sessions_across_threads() {
    let clock = ManualClock::new();
    let device = VirtualCaptureDevice::new("mic", 1, 1.0).with_signal(Signal::Ramp);
    let (events, rx) = ChannelDelegate::channel();

    let framer: SharedFramer<VirtualCaptureDevice, ManualClock> =
        Arc::new(Mutex::new(CaptureFramer::new(device.clone(), clock.clone())));
    {
        let mut framer = framer.lock();
        framer.set_delegate(Arc::new(events));
        framer.start(CaptureConfiguration::default()).unwrap();
    }
    let jitter: SharedJitterBuffer<VirtualPlaybackSink, ManualClock> = Arc::new(Mutex::new(
        PlaybackJitterBuffer::new(VirtualPlaybackSink::new(), clock, PlaybackConfiguration::default())
            .unwrap(),
    ));

    let capture = {
        let framer = Arc::clone(&framer);
        thread::spawn(move || {
            for _ in 0..50 {
                device.push_samples(&[0.0; 960]);
                framer.lock().on_tick().unwrap();
            }
            framer.lock().stop();
        })
    };

    let playback = {
        let jitter = Arc::clone(&jitter);
        thread::spawn(move || {
            for event in rx.iter() {
                match event {
                    SyncEvent::FrameCollected(frame) => jitter.lock().feed(&frame),
                    SyncEvent::RecordingStopped => break,
                    _ => {}
                }
                jitter.lock().on_tick();
            }
        })
    };

    capture.join().unwrap();
    playback.join().unwrap();

    let jitter = jitter.lock();
    assert_eq!(jitter.diagnostics().frames_fed, 50);
    assert!(jitter.is_playing());
}
