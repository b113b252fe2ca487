use super::palette::ColorSetting;
use crate::dsp::history::{DEFAULT_BAND_COUNT, DEFAULT_HISTORY_LENGTH};
use crate::ui::render::ribbon::{DEFAULT_OVERLAP, DEFAULT_PIXEL_SCALE, RibbonStyle};
use crate::ui::render::sprite::{DEFAULT_FRAME_COUNT, DEFAULT_FRAME_INTERVAL, SpriteSheet};
use crate::ui::theme;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const BAND_COUNT_RANGE: RangeInclusive<usize> = 1..=16;
pub const HISTORY_LENGTH_RANGE: RangeInclusive<usize> = 8..=2048;
const OVERLAP_MAX: u32 = 256;
const FRAME_COUNT_RANGE: RangeInclusive<usize> = 1..=64;
const FRAME_INTERVAL_MS_RANGE: RangeInclusive<u64> = 16..=5_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RibbonSettings {
    pub bands: usize,
    pub history_length: usize,
    pub pixel_scale: f32,
    pub overlap: u32,
    pub background: ColorSetting,
}

impl Default for RibbonSettings {
    fn default() -> Self {
        Self {
            bands: DEFAULT_BAND_COUNT,
            history_length: DEFAULT_HISTORY_LENGTH,
            pixel_scale: DEFAULT_PIXEL_SCALE,
            overlap: DEFAULT_OVERLAP,
            background: theme::RIBBON_BACKGROUND.into(),
        }
    }
}

impl RibbonSettings {
    pub fn sanitize(&mut self) {
        self.bands = self
            .bands
            .clamp(*BAND_COUNT_RANGE.start(), *BAND_COUNT_RANGE.end());
        self.history_length = self
            .history_length
            .clamp(*HISTORY_LENGTH_RANGE.start(), *HISTORY_LENGTH_RANGE.end());
        if !self.pixel_scale.is_finite() {
            self.pixel_scale = DEFAULT_PIXEL_SCALE;
        }
        self.overlap = self.overlap.min(OVERLAP_MAX);
    }

    pub fn style(&self) -> RibbonStyle {
        RibbonStyle {
            background: self.background.into(),
            pixel_scale: self.pixel_scale,
            overlap: self.overlap,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpriteSettings {
    /// PNG with frames stacked top to bottom; `None` uses the built-in sprite.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet: Option<PathBuf>,
    pub frame_count: usize,
    pub frame_interval_ms: u64,
}

impl Default for SpriteSettings {
    fn default() -> Self {
        Self {
            sheet: None,
            frame_count: DEFAULT_FRAME_COUNT,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL.as_millis() as u64,
        }
    }
}

impl SpriteSettings {
    pub fn sanitize(&mut self) {
        self.frame_count = self
            .frame_count
            .clamp(*FRAME_COUNT_RANGE.start(), *FRAME_COUNT_RANGE.end());
        self.frame_interval_ms = self
            .frame_interval_ms
            .clamp(*FRAME_INTERVAL_MS_RANGE.start(), *FRAME_INTERVAL_MS_RANGE.end());
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// The configured sheet, or the built-in sprite when none is set or it fails to load.
    pub fn load_sheet(&self) -> SpriteSheet {
        let Some(path) = &self.sheet else {
            return SpriteSheet::builtin();
        };
        SpriteSheet::load(path, self.frame_count).unwrap_or_else(|err| {
            warn!("[sprite] {err:#}; using built-in sprite");
            SpriteSheet::builtin()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_clamps_into_range() {
        let mut s = RibbonSettings {
            bands: 0,
            history_length: 1_000_000,
            pixel_scale: f32::NAN,
            overlap: 9_999,
            ..RibbonSettings::default()
        };
        s.sanitize();
        assert_eq!(s.bands, 1);
        assert_eq!(s.history_length, 2048);
        assert_eq!(s.pixel_scale, DEFAULT_PIXEL_SCALE);
        assert_eq!(s.overlap, OVERLAP_MAX);

        let mut sprite = SpriteSettings {
            sheet: None,
            frame_count: 0,
            frame_interval_ms: 1,
        };
        sprite.sanitize();
        assert_eq!(sprite.frame_count, 1);
        assert_eq!(sprite.frame_interval(), Duration::from_millis(16));
    }

    #[test]
    fn unreadable_sheet_falls_back_to_builtin() {
        let sprite = SpriteSettings {
            sheet: Some(PathBuf::from("/nonexistent/cat.png")),
            ..SpriteSettings::default()
        }
        .load_sheet();
        assert_eq!(sprite.frame_count(), DEFAULT_FRAME_COUNT);
        assert_eq!(sprite.size(), SpriteSheet::builtin().size());
    }
}
