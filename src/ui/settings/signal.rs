use crate::dsp::transform::TransformConfig;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::Duration;

const SAMPLE_RATE_RANGE: RangeInclusive<u32> = 8_000..=192_000;
const FFT_SIZE_RANGE: RangeInclusive<usize> = 64..=16_384;
const FRAMES_PER_SECOND_RANGE: RangeInclusive<u32> = 1..=240;
// Brings unit-amplitude bins into the range the ribbon's pixel scale expects.
const DEFAULT_GAIN: f32 = 1_000.0;

/// Demo signal feeding the transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalSettings {
    pub sample_rate: u32,
    pub fft_size: usize,
    pub frames_per_second: u32,
    pub gain: f32,
}

impl Default for SignalSettings {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            fft_size: 512,
            frames_per_second: 30,
            gain: DEFAULT_GAIN,
        }
    }
}

impl SignalSettings {
    pub fn sanitize(&mut self) {
        self.sample_rate = self
            .sample_rate
            .clamp(*SAMPLE_RATE_RANGE.start(), *SAMPLE_RATE_RANGE.end());
        self.fft_size = self
            .fft_size
            .clamp(*FFT_SIZE_RANGE.start(), *FFT_SIZE_RANGE.end())
            .next_power_of_two();
        self.frames_per_second = self
            .frames_per_second
            .clamp(*FRAMES_PER_SECOND_RANGE.start(), *FRAMES_PER_SECOND_RANGE.end());
        if !self.gain.is_finite() || self.gain < 0.0 {
            self.gain = DEFAULT_GAIN;
        }
    }

    /// One magnitude frame per block: the hop equals the window.
    pub fn transform_config(&self) -> TransformConfig {
        TransformConfig {
            sample_rate: self.sample_rate as f32,
            fft_size: self.fft_size,
            hop_size: self.fft_size,
            gain: self.gain,
        }
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.frames_per_second.max(1)))
    }
}
