//! Magnitude transform feeding the band history.
//!
//! Produces frames of exactly `fft_size` magnitudes. Only the lower half carries
//! spectral content; the upper half mirrors it so consumers can rely on the
//! "first half meaningful" contract without knowing the transform.

use super::{AudioBlock, AudioProcessor, ProcessorUpdate};
use crate::util::audio::{DEFAULT_SAMPLE_RATE, apply_window, hann_window, mixdown_into_deque};
use realfft::{RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex32;
use std::collections::VecDeque;
use std::sync::Arc;

const FFT_SIZE_RANGE: std::ops::RangeInclusive<usize> = 64..=16_384;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformConfig {
    pub sample_rate: f32,
    pub fft_size: usize,
    /// Samples advanced between frames.
    pub hop_size: usize,
    /// Linear gain applied to every magnitude.
    pub gain: f32,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            fft_size: 512,
            hop_size: 512,
            gain: 1.0,
        }
    }
}

impl TransformConfig {
    fn normalized(mut self) -> Self {
        self.sample_rate = self.sample_rate.max(1.0);
        self.fft_size = self
            .fft_size
            .clamp(*FFT_SIZE_RANGE.start(), *FFT_SIZE_RANGE.end())
            .next_power_of_two();
        self.hop_size = self.hop_size.clamp(1, self.fft_size);
        self.gain = if self.gain.is_finite() { self.gain.max(0.0) } else { 1.0 };
        self
    }
}

#[derive(Clone)]
pub struct MagnitudeTransform {
    cfg: TransformConfig,
    fft: Arc<dyn RealToComplex<f32>>,
    window: Vec<f32>,
    // Amplitude normalisation: a full-scale sine lands near 1.0 in its bin.
    norm: f32,
    pending: VecDeque<f32>,
    buf: Vec<f32>,
    spectrum: Vec<Complex32>,
    scratch: Vec<Complex32>,
}

impl std::fmt::Debug for MagnitudeTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MagnitudeTransform")
            .field("cfg", &self.cfg)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl MagnitudeTransform {
    pub fn new(config: TransformConfig) -> Self {
        let cfg = config.normalized();
        let fft = RealFftPlanner::<f32>::new().plan_fft_forward(cfg.fft_size);
        let window = hann_window(cfg.fft_size);
        let window_sum: f32 = window.iter().sum();
        Self {
            norm: if window_sum > f32::EPSILON { 2.0 / window_sum } else { 0.0 },
            scratch: vec![Complex32::default(); fft.get_scratch_len()],
            spectrum: fft.make_output_vec(),
            buf: vec![0.0; cfg.fft_size],
            pending: VecDeque::with_capacity(cfg.fft_size * 2),
            window,
            fft,
            cfg,
        }
    }

    pub fn config(&self) -> TransformConfig {
        self.cfg
    }

    /// Length of every emitted frame.
    pub fn frame_len(&self) -> usize {
        self.cfg.fft_size
    }

    fn compute_frame(&mut self) -> Option<Vec<f32>> {
        let n = self.cfg.fft_size;
        let (head, tail) = self.pending.as_slices();
        let split = head.len().min(n);
        self.buf[..split].copy_from_slice(&head[..split]);
        self.buf[split..].copy_from_slice(&tail[..n - split]);
        apply_window(&mut self.buf, &self.window);

        if let Err(err) =
            self.fft
                .process_with_scratch(&mut self.buf, &mut self.spectrum, &mut self.scratch)
        {
            tracing::warn!("[transform] fft failed: {err}");
            return None;
        }

        let half = n / 2;
        let scale = self.norm * self.cfg.gain;
        let mut frame = vec![0.0; n];
        for (i, c) in self.spectrum.iter().take(half).enumerate() {
            frame[i] = c.norm() * scale;
        }
        let (lower, upper) = frame.split_at_mut(half);
        for (dst, src) in upper.iter_mut().zip(lower.iter().rev()) {
            *dst = *src;
        }
        Some(frame)
    }
}

impl AudioProcessor for MagnitudeTransform {
    /// Every frame completed by the block, oldest first.
    type Output = Vec<Vec<f32>>;

    fn process_block(&mut self, block: &AudioBlock<'_>) -> ProcessorUpdate<Self::Output> {
        if block.frame_count() == 0 {
            return ProcessorUpdate::None;
        }
        mixdown_into_deque(&mut self.pending, block.samples, block.channels.max(1));

        let mut frames = Vec::new();
        while self.pending.len() >= self.cfg.fft_size {
            if let Some(frame) = self.compute_frame() {
                frames.push(frame);
            }
            self.pending.drain(..self.cfg.hop_size);
        }

        if frames.is_empty() {
            ProcessorUpdate::None
        } else {
            ProcessorUpdate::Snapshot(frames)
        }
    }
}
