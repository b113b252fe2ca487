//! Per-band rolling magnitude history fed by a raw magnitude transform.

/// Default number of rainbow bands.
pub const DEFAULT_BAND_COUNT: usize = 6;
/// Default number of history slots kept per band.
pub const DEFAULT_HISTORY_LENGTH: usize = 256;

// scale(0) ~= -0.5 and |scale(5)| ~= 32 for six bands.
const SCALE_BASE: f32 = 0.5;
const SCALE_GROWTH: f32 = 2.3;

/// Fixed band layout. Built once, read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct BandConfig {
    scale: Vec<f32>,
}

impl BandConfig {
    pub fn new(count: usize) -> Self {
        let count = count.max(1);
        let denom = (count - 1).max(1) as f32;
        let scale = (0..count)
            .map(|i| {
                let phase = core::f32::consts::PI * i as f32 / denom;
                -phase.cos() * SCALE_BASE * SCALE_GROWTH.powi(i as i32)
            })
            .collect();
        Self { scale }
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.scale.len()
    }

    #[inline]
    pub fn scale(&self) -> &[f32] {
        &self.scale
    }
}

impl Default for BandConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BAND_COUNT)
    }
}

/// `count` rows of `len` slots each, stored as a ring with a shared head.
///
/// Rows always read oldest-first. The only mutation is [`BandHistory::update`]
/// (or its lower-level [`BandHistory::push_frame`]), which drops the oldest
/// slot of every row and appends one value per band.
#[derive(Debug, Clone)]
pub struct BandHistory {
    bands: BandConfig,
    len: usize,
    values: Vec<f32>,
    // Physical index of the oldest slot.
    head: usize,
    frames: u64,
    scratch: Vec<f32>,
}

impl BandHistory {
    pub fn new(bands: BandConfig, len: usize) -> Self {
        let len = len.max(1);
        let count = bands.count();
        Self {
            values: vec![0.0; count * len],
            scratch: vec![0.0; count],
            bands,
            len,
            head: 0,
            frames: 0,
        }
    }

    #[cfg(test)]
    pub fn bands(&self) -> &BandConfig {
        &self.bands
    }

    #[inline]
    pub fn band_count(&self) -> usize {
        self.bands.count()
    }

    /// Number of slots per band (`H`).
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Total frames ingested since construction.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Reduces one magnitude frame to a scalar per band and appends it.
    ///
    /// Only the lower half of `magnitudes` is used. It is split into
    /// `band_count` equal groups; leftover samples are ignored.
    pub fn update(&mut self, magnitudes: &[f32]) {
        let scope = &magnitudes[..magnitudes.len() / 2];
        let per_band = scope.len() / self.bands.count();
        let mut scratch = std::mem::take(&mut self.scratch);
        for (band, (out, &scale)) in scratch.iter_mut().zip(self.bands.scale()).enumerate() {
            let accumulator: f32 = if per_band == 0 {
                0.0
            } else {
                scope[band * per_band..(band + 1) * per_band].iter().sum()
            };
            *out = accumulator * scale;
        }
        self.push_frame(&scratch);
        self.scratch = scratch;
    }

    /// Shifts every row left by one slot and writes `frame[band]` at the end.
    /// Missing entries are written as zero.
    pub fn push_frame(&mut self, frame: &[f32]) {
        let slot = self.head;
        for band in 0..self.bands.count() {
            self.values[band * self.len + slot] = frame.get(band).copied().unwrap_or(0.0);
        }
        self.head = (self.head + 1) % self.len;
        self.frames = self.frames.saturating_add(1);
    }

    /// Value of `band` at logical `slot` (0 = oldest, `len - 1` = newest).
    #[cfg(test)]
    pub fn value(&self, band: usize, slot: usize) -> f32 {
        debug_assert!(band < self.bands.count() && slot < self.len);
        self.values[band * self.len + (self.head + slot) % self.len]
    }

    /// Iterates a band's row oldest-first.
    pub fn row(&self, band: usize) -> impl Iterator<Item = f32> + '_ {
        let row = &self.values[band * self.len..(band + 1) * self.len];
        let (newer, older) = row.split_at(self.head);
        older.iter().chain(newer).copied()
    }
}

impl Default for BandHistory {
    fn default() -> Self {
        Self::new(BandConfig::default(), DEFAULT_HISTORY_LENGTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_history(count: usize, len: usize) -> BandHistory {
        let mut h = BandHistory::new(BandConfig::new(count), len);
        h.bands.scale = vec![1.0; count];
        h
    }

    fn rows(h: &BandHistory) -> Vec<Vec<f32>> {
        (0..h.band_count()).map(|b| h.row(b).collect()).collect()
    }

    #[test]
    fn scale_curve_matches_reference_points() {
        let cfg = BandConfig::new(6);
        let s = cfg.scale();
        assert!((s[0] + 0.5).abs() < 1e-6, "got {}", s[0]);
        assert!((s[5].abs() - 32.0).abs() < 0.5, "got {}", s[5]);
        assert!(s[5] > 0.0);
        let mid: Vec<f32> = s[1..5].iter().map(|v| v.abs()).collect();
        assert!(mid.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn single_band_scale_is_finite() {
        let cfg = BandConfig::new(1);
        assert_eq!(cfg.count(), 1);
        assert!((cfg.scale()[0] + 0.5).abs() < 1e-6);
        assert_eq!(BandConfig::new(0).count(), 1);
    }

    #[test]
    fn concrete_two_band_scenario() {
        let mut h = unit_history(2, 4);
        // Lower half sums [k, 0] for k = 1..=4; upper half is ignored noise.
        for k in 1..=4 {
            h.update(&[k as f32, 0.0, 99.0, 99.0]);
        }
        assert_eq!(rows(&h), vec![vec![1.0, 2.0, 3.0, 4.0], vec![0.0; 4]]);
    }

    #[test]
    fn rows_hold_most_recent_values_right_aligned() {
        for &(count, len) in &[(1, 1), (2, 3), (3, 5), (6, 8)] {
            let mut h = unit_history(count, len);
            for k in 1..=(len + 3) {
                // One sample per band in the lower half, summing to k * (band + 1).
                let mut frame: Vec<f32> = (0..count).map(|b| (k * (b + 1)) as f32).collect();
                frame.extend(std::iter::repeat_n(0.0, count));
                h.update(&frame);

                let kept = k.min(len);
                for band in 0..count {
                    let row: Vec<f32> = h.row(band).collect();
                    let zeros = len - kept;
                    assert!(row[..zeros].iter().all(|&v| v == 0.0));
                    let expected: Vec<f32> = (k + 1 - kept..=k)
                        .map(|i| (i * (band + 1)) as f32)
                        .collect();
                    assert_eq!(&row[zeros..], &expected[..], "count={count} len={len} k={k}");
                }
            }
        }
    }

    #[test]
    fn remainder_samples_are_dropped() {
        let mut h = unit_history(2, 2);
        // Lower half has 5 samples: groups [1,2] and [3,4]; 5 is dropped.
        h.update(&[1.0, 2.0, 3.0, 4.0, 5.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(h.value(0, 1), 3.0);
        assert_eq!(h.value(1, 1), 7.0);
    }

    #[test]
    fn short_input_leaves_bands_at_zero() {
        let mut h = unit_history(6, 4);
        h.update(&[]);
        h.update(&[5.0]);
        h.update(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]);
        assert_eq!(h.frames(), 3);
        for band in 0..6 {
            assert!(h.row(band).all(|v| v == 0.0), "band {band}");
        }
    }

    #[test]
    fn update_applies_band_scale() {
        let mut h = BandHistory::new(BandConfig::new(6), 4);
        let frame = vec![1.0; 24];
        h.update(&frame);
        let scale = h.bands().scale().to_vec();
        for band in 0..6 {
            assert!((h.value(band, 3) - 2.0 * scale[band]).abs() < 1e-5);
        }
    }

    #[test]
    fn row_reads_oldest_first_after_wrap() {
        let mut h = unit_history(1, 5);
        for k in 0..12 {
            h.push_frame(&[k as f32]);
        }
        assert_eq!(h.row(0).collect::<Vec<_>>(), vec![7.0, 8.0, 9.0, 10.0, 11.0]);
        assert_eq!(h.value(0, 0), 7.0);
        assert_eq!(h.value(0, 4), 11.0);
    }
}
