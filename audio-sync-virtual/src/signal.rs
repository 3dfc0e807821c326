use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

/// What a [`VirtualCaptureDevice`](crate::VirtualCaptureDevice) records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Signal {
    Silence,
    /// Same tone on every channel.
    Sine { frequency: f32, amplitude: f32 },
    /// Each interleaved sample holds its own absolute index. Makes dropped,
    /// duplicated or reordered samples easy to spot.
    Ramp,
}

impl Default for Signal {
    fn default() -> Self {
        Self::Sine {
            frequency: 440.0,
            amplitude: 0.5,
        }
    }
}

impl Signal {
    /// Render `frames` frames starting at absolute frame `first_frame`.
    pub fn render(&self, first_frame: u64, frames: usize, channels: u16, sample_rate: u32) -> Vec<f32> {
        let channels = channels as usize;
        let mut out = Vec::with_capacity(frames * channels);
        for n in 0..frames as u64 {
            let frame = first_frame + n;
            for ch in 0..channels as u64 {
                let sample = match *self {
                    Signal::Silence => 0.0,
                    Signal::Sine {
                        frequency,
                        amplitude,
                    } => {
                        let phase = TAU * frequency as f64 * frame as f64 / sample_rate.max(1) as f64;
                        (phase.sin() * amplitude as f64) as f32
                    }
                    Signal::Ramp => (frame * channels as u64 + ch) as f32,
                };
                out.push(sample);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_counts_interleaved_samples() {
        let samples = Signal::Ramp.render(3, 2, 2, 48000);
        assert_eq!(samples, vec![6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn sine_starts_at_zero_and_stays_in_amplitude() {
        let samples = Signal::Sine {
            frequency: 1000.0,
            amplitude: 0.25,
        }
        .render(0, 480, 1, 48000);
        assert_eq!(samples[0], 0.0);
        assert!(samples.iter().all(|s| s.abs() <= 0.25 + 1e-6));
    }

    #[test]
    fn deserializes_from_tagged_json() {
        let signal: Signal = serde_json::from_str(r#"{ "kind": "ramp" }"#).unwrap();
        assert_eq!(signal, Signal::Ramp);
    }
}
