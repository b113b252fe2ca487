// Ribbon geometry: history slots to screen-space polylines.

use crate::dsp::history::BandHistory;
use tiny_skia::{Path, PathBuilder, Point};

/// Screen layout for one surface size. Cheap to recompute every paint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RibbonLayout {
    pub width: u32,
    pub height: u32,
    /// Horizontal advance per history slot, floored to whole pixels.
    pub px_per_frame: u32,
    pub sprite_width: u32,
    pub sprite_height: u32,
    pub pixel_scale: f32,
}

impl RibbonLayout {
    pub fn new(
        (width, height): (u32, u32),
        (sprite_width, sprite_height): (u32, u32),
        overlap: u32,
        history_len: usize,
        pixel_scale: f32,
    ) -> Self {
        Self {
            width,
            height,
            px_per_frame: px_per_frame(width, sprite_width, overlap, history_len),
            sprite_width,
            sprite_height,
            pixel_scale,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Y coordinate of `band`'s zero line.
    pub fn baseline(&self, band: usize, band_count: usize) -> f32 {
        let sprite_h = self.sprite_height as f32;
        let top_of_sprite = self.height as f32 / 2.0 - sprite_h / 2.0;
        sprite_h / (band_count + 1) as f32 * (band as f32 + 0.5) + top_of_sprite
    }

    /// Stroke width of a single band, in whole pixels.
    pub fn pen_width(&self, band_count: usize) -> f32 {
        let bands = u32::try_from(band_count.max(1)).unwrap_or(u32::MAX);
        (self.sprite_height / bands).max(1) as f32
    }

    /// Top-left corner of the sprite: right-aligned, vertically centred.
    pub fn sprite_origin(&self) -> (i32, i32) {
        (
            self.width as i32 - self.sprite_width as i32,
            (self.height as i32 - self.sprite_height as i32) / 2,
        )
    }
}

/// `(surface_width - sprite_width + overlap) / history_len`, floored, never negative.
pub fn px_per_frame(surface_width: u32, sprite_width: u32, overlap: u32, history_len: usize) -> u32 {
    if history_len == 0 {
        return 0;
    }
    let span = i64::from(surface_width) - i64::from(sprite_width) + i64::from(overlap);
    (span.max(0) / history_len as i64) as u32
}

/// Rebuilds one polyline per band into `out`, reusing its allocations.
pub fn build_polylines(history: &BandHistory, layout: &RibbonLayout, out: &mut Vec<Vec<Point>>) {
    let (bands, len) = (history.band_count(), history.len());
    out.resize_with(bands, Vec::new);
    let step = layout.px_per_frame as f32;
    for (band, line) in out.iter_mut().enumerate() {
        let y = layout.baseline(band, bands);
        line.clear();
        line.reserve(len);
        line.extend(
            history
                .row(band)
                .enumerate()
                .map(|(x, v)| Point::from_xy(x as f32 * step, y + v * layout.pixel_scale)),
        );
    }
}

/// Open path through `pts`. `None` for fewer than two points.
pub fn polyline_path(pts: &[Point]) -> Option<Path> {
    let (first, rest) = pts.split_first()?;
    if rest.is_empty() {
        return None;
    }
    let mut pb = PathBuilder::new();
    pb.move_to(first.x, first.y);
    for p in rest {
        pb.line_to(p.x, p.y);
    }
    pb.finish()
}
