//! Synthesised demo upstream.
//!
//! A background thread renders one block of drifting tones per tick, runs it
//! through [`MagnitudeTransform`] and posts each magnitude frame to the UI. The
//! channel is bounded; when the UI falls behind frames are dropped rather than
//! queued, and the thread exits once every receiver is gone.

use crate::dsp::transform::{MagnitudeTransform, TransformConfig};
use crate::dsp::{AudioBlock, AudioProcessor, ProcessorUpdate};
use crate::util::audio::lerp;
use anyhow::{Context, Result};
use async_channel::{Receiver as AsyncReceiver, Sender as AsyncSender, TrySendError};
use std::f32::consts::TAU;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const CHANNEL_CAPACITY: usize = 8;
const DROP_REPORT_INTERVAL: Duration = Duration::from_secs(5);
// Each band's tone is this much quieter than the one below it.
const BAND_ATTENUATION: f32 = 2.3;
const BASE_AMPLITUDE: f32 = 0.8;

#[derive(Debug, Clone, Copy)]
struct Tone {
    low_hz: f32,
    high_hz: f32,
    amplitude: f32,
    drift_rate: f32,
    swell_rate: f32,
    // All phases are kept in [0, TAU) so they advance at any run length.
    drift_phase: f32,
    swell_phase: f32,
    phase: f32,
}

impl Tone {
    fn next(&mut self, dt: f32) -> f32 {
        let drift = 0.5 + 0.5 * self.drift_phase.sin();
        let swell = 0.5 + 0.5 * self.swell_phase.sin();
        let freq = lerp(self.low_hz, self.high_hz, drift);
        self.drift_phase = advance(self.drift_phase, self.drift_rate * dt);
        self.swell_phase = advance(self.swell_phase, self.swell_rate * dt);
        self.phase = advance(self.phase, freq * dt);
        self.amplitude * swell * self.phase.sin()
    }
}

fn advance(phase: f32, cycles: f32) -> f32 {
    (phase + TAU * cycles).rem_euclid(TAU)
}

/// Sum of one slowly drifting, swelling tone per band.
#[derive(Debug, Clone)]
pub struct DemoSignal {
    sample_rate: f32,
    tones: Vec<Tone>,
}

impl DemoSignal {
    pub fn new(sample_rate: f32, bands: usize) -> Self {
        let sample_rate = sample_rate.max(1.0);
        let bands = bands.max(1);
        let band_hz = sample_rate / 2.0 / bands as f32;
        let tones = (0..bands)
            .map(|b| {
                let center = band_hz * (b as f32 + 0.5);
                let k = b as f32;
                Tone {
                    low_hz: center - band_hz * 0.3,
                    high_hz: center + band_hz * 0.3,
                    amplitude: BASE_AMPLITUDE / BAND_ATTENUATION.powi(b as i32),
                    drift_rate: 0.05 + 0.03 * k,
                    swell_rate: 0.4 + 0.17 * k,
                    drift_phase: k * 1.3,
                    swell_phase: k * 1.3,
                    phase: 0.0,
                }
            })
            .collect();
        Self { sample_rate, tones }
    }

    /// Overwrites `out` with the next `out.len()` mono samples.
    pub fn fill(&mut self, out: &mut [f32]) {
        let dt = 1.0 / self.sample_rate;
        for sample in out.iter_mut() {
            *sample = self.tones.iter_mut().map(|tone| tone.next(dt)).sum();
        }
    }
}

/// Running demo upstream. Dropping it does not stop the thread; dropping every
/// receiver clone does.
#[derive(Debug, Clone)]
pub struct SignalHandle {
    receiver: Arc<AsyncReceiver<Vec<f32>>>,
    frame_len: usize,
}

impl SignalHandle {
    pub fn receiver(&self) -> Arc<AsyncReceiver<Vec<f32>>> {
        Arc::clone(&self.receiver)
    }

    /// Length of every magnitude frame the thread sends.
    pub fn frame_len(&self) -> usize {
        self.frame_len
    }
}

pub fn spawn(config: TransformConfig, bands: usize, interval: Duration) -> Result<SignalHandle> {
    let transform = MagnitudeTransform::new(config);
    let frame_len = transform.frame_len();
    let signal = DemoSignal::new(transform.config().sample_rate, bands);
    let (sender, receiver) = async_channel::bounded(CHANNEL_CAPACITY);

    thread::Builder::new()
        .name("ribbonmeter-signal".into())
        .spawn(move || signal_loop(sender, signal, transform, interval))
        .context("failed to spawn signal thread")?;
    info!(
        "[signal] started: {frame_len}-point frames every {:.1} ms",
        interval.as_secs_f64() * 1e3
    );

    Ok(SignalHandle {
        receiver: Arc::new(receiver),
        frame_len,
    })
}

fn signal_loop(
    sender: AsyncSender<Vec<f32>>,
    mut signal: DemoSignal,
    mut transform: MagnitudeTransform,
    interval: Duration,
) {
    let mut block = vec![0.0; transform.config().hop_size];
    let mut deadline = Instant::now();
    let mut dropped = 0u64;
    let mut last_report = Instant::now();

    'run: loop {
        signal.fill(&mut block);
        let audio = AudioBlock::new(&block, 1);
        if let ProcessorUpdate::Snapshot(frames) = transform.process_block(&audio) {
            for frame in frames {
                match sender.try_send(frame) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => dropped += 1,
                    Err(TrySendError::Closed(_)) => break 'run,
                }
            }
        }

        if dropped > 0 && last_report.elapsed() >= DROP_REPORT_INTERVAL {
            warn!("[signal] UI behind; dropped {dropped} frames");
            dropped = 0;
            last_report = Instant::now();
        }

        deadline += interval;
        let now = Instant::now();
        match deadline.checked_duration_since(now) {
            Some(wait) => thread::sleep(wait),
            // Fell behind; don't try to catch up.
            None => deadline = now,
        }
    }

    debug!("[signal] receiver closed; stopping");
}
