// Default sample rate (Hz) for the demo signal and transform. Settings can
// override it; this is the fallback during init.
pub const DEFAULT_SAMPLE_RATE: f32 = 48_000.0;

#[inline(always)]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

pub fn mixdown_into_deque(
    buffer: &mut std::collections::VecDeque<f32>,
    samples: &[f32],
    channels: usize,
) {
    if channels == 0 || samples.is_empty() {
        return;
    }

    if channels == 1 {
        buffer.extend(samples);
        return;
    }

    let frame_count = samples.len() / channels;
    buffer.reserve(frame_count);

    let inv = 1.0 / channels as f32;
    for frame in samples.chunks_exact(channels) {
        let sum: f32 = frame.iter().sum();
        buffer.push_back(sum * inv);
    }
}

// Periodic Hann window of `len` coefficients.
pub fn hann_window(len: usize) -> Vec<f32> {
    (0..len)
        .map(|n| {
            let phase = (n as f32) * core::f32::consts::TAU / (len as f32);
            0.5 * (1.0 - phase.cos())
        })
        .collect()
}

#[inline]
pub fn apply_window(buffer: &mut [f32], window: &[f32]) {
    debug_assert_eq!(buffer.len(), window.len());
    for (sample, coeff) in buffer.iter_mut().zip(window.iter()) {
        *sample *= *coeff;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[test]
    fn mixdown_averages_interleaved_frames() {
        let mut buf = VecDeque::new();
        mixdown_into_deque(&mut buf, &[1.0, 3.0, -1.0, 1.0, 0.5], 2);
        assert_eq!(buf, VecDeque::from(vec![2.0, 0.0]));
    }

    #[test]
    fn hann_window_is_zero_at_edge_and_one_at_centre() {
        let w = hann_window(8);
        assert_eq!(w.len(), 8);
        assert!(w[0].abs() < 1e-6);
        assert!((w[4] - 1.0).abs() < 1e-6);
    }
}
