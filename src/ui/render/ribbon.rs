//! Cached ribbon rasteriser.
//!
//! The ribbon is kept in an off-screen pixmap the size of the target. While the
//! target size is unchanged each new history frame only scrolls that pixmap left
//! and strokes the newest segment of every band, so steady-state cost does not
//! grow with the history length.

use super::geometry::{RibbonLayout, build_polylines, polyline_path};
use super::sprite::SpriteSheet;
use crate::dsp::history::BandHistory;
use crate::ui::theme;
use std::time::Instant;
use tiny_skia::{
    LineCap, LineJoin, Paint, Pixmap, PixmapMut, PixmapPaint, PixmapRef, Point,
    PremultipliedColorU8, Stroke, Transform,
};
use tracing::trace;

pub const DEFAULT_PIXEL_SCALE: f32 = 0.02;
pub const DEFAULT_OVERLAP: u32 = 13;

/// What a paint did to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPass {
    /// Degenerate surface; nothing drawn.
    Skipped,
    FullRebuild,
    Incremental { frames: usize, shift: u32 },
    /// Cache reused untouched.
    Recomposite,
}

#[derive(Debug, Clone)]
pub struct RibbonStyle {
    pub background: iced::Color,
    pub pixel_scale: f32,
    pub overlap: u32,
}

impl Default for RibbonStyle {
    fn default() -> Self {
        Self {
            background: theme::RIBBON_BACKGROUND,
            pixel_scale: DEFAULT_PIXEL_SCALE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

#[derive(Debug)]
struct RenderCache {
    pixmap: Pixmap,
}

impl RenderCache {
    fn matches(&self, width: u32, height: u32) -> bool {
        self.pixmap.width() == width && self.pixmap.height() == height
    }
}

#[derive(Debug)]
pub struct RibbonRenderer {
    background: tiny_skia::Color,
    pens: Vec<Paint<'static>>,
    pixel_scale: f32,
    overlap: u32,
    sprite: SpriteSheet,
    sprite_frame: usize,
    cache: Option<RenderCache>,
    polylines: Vec<Vec<Point>>,
    last_pass: Option<RenderPass>,
}

impl RibbonRenderer {
    pub fn new(band_count: usize, style: RibbonStyle, sprite: SpriteSheet) -> Self {
        let pens = theme::band_colors(band_count)
            .into_iter()
            .map(|color| {
                let mut paint = Paint::default();
                paint.set_color(theme::to_skia(color));
                paint.anti_alias = true;
                paint
            })
            .collect();
        Self {
            // The cache is opaque so the scroll never blends.
            background: theme::to_skia(iced::Color {
                a: 1.0,
                ..style.background
            }),
            pens,
            pixel_scale: style.pixel_scale,
            overlap: style.overlap,
            sprite,
            sprite_frame: 0,
            cache: None,
            polylines: Vec::new(),
            last_pass: None,
        }
    }

    #[cfg(test)]
    pub fn sprite(&self) -> &SpriteSheet {
        &self.sprite
    }

    pub fn set_sprite_frame(&mut self, frame: usize) {
        self.sprite_frame = frame;
    }

    /// Forces the next paint to rebuild from scratch.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    #[cfg(test)]
    pub fn last_pass(&self) -> Option<RenderPass> {
        self.last_pass
    }

    /// The cached ribbon without the sprite overlay.
    #[cfg(test)]
    pub fn cache(&self) -> Option<PixmapRef<'_>> {
        self.cache.as_ref().map(|c| c.pixmap.as_ref())
    }

    /// Paints the ribbon; `is_new_frame` means the history advanced by one slot
    /// since the previous paint.
    pub fn render(
        &mut self,
        target: &mut PixmapMut<'_>,
        history: &BandHistory,
        is_new_frame: bool,
    ) -> RenderPass {
        self.render_pending(target, history, usize::from(is_new_frame))
    }

    /// Paints the ribbon after `frames` history updates since the previous paint.
    pub fn render_pending(
        &mut self,
        target: &mut PixmapMut<'_>,
        history: &BandHistory,
        frames: usize,
    ) -> RenderPass {
        let started = Instant::now();
        let layout = RibbonLayout::new(
            (target.width(), target.height()),
            self.sprite.size(),
            self.overlap,
            history.len(),
            self.pixel_scale,
        );
        if layout.is_empty() {
            self.cache = None;
            self.last_pass = Some(RenderPass::Skipped);
            return RenderPass::Skipped;
        }

        build_polylines(history, &layout, &mut self.polylines);

        let (width, height) = (layout.width, layout.height);
        let shift = frames as u64 * u64::from(layout.px_per_frame);
        let pass = match self.cache.as_mut() {
            Some(cache) if cache.matches(width, height) && frames == 0 => RenderPass::Recomposite,
            Some(cache)
                if cache.matches(width, height)
                    && frames < history.len()
                    && shift < u64::from(width) =>
            {
                let shift = shift as u32;
                scroll_left(&mut cache.pixmap, shift as usize, self.background);
                stroke_tails(
                    &mut cache.pixmap,
                    &self.polylines,
                    &self.pens,
                    &layout,
                    frames + 1,
                );
                RenderPass::Incremental { frames, shift }
            }
            _ => self.rebuild(&layout),
        };

        if let Some(cache) = &self.cache {
            target.draw_pixmap(
                0,
                0,
                cache.pixmap.as_ref(),
                &PixmapPaint::default(),
                Transform::identity(),
                None,
            );
        }
        if let Some(frame) = self.sprite.frame(self.sprite_frame) {
            let (x, y) = layout.sprite_origin();
            target.draw_pixmap(x, y, frame, &PixmapPaint::default(), Transform::identity(), None);
        }

        trace!(
            "[ribbon] frame {}: {pass:?} in {:?}",
            history.frames(),
            started.elapsed()
        );
        self.last_pass = Some(pass);
        pass
    }

    fn rebuild(&mut self, layout: &RibbonLayout) -> RenderPass {
        let Some(mut pixmap) = Pixmap::new(layout.width, layout.height) else {
            self.cache = None;
            return RenderPass::Skipped;
        };
        pixmap.fill(self.background);
        stroke_tails(&mut pixmap, &self.polylines, &self.pens, layout, usize::MAX);
        self.cache = Some(RenderCache { pixmap });
        RenderPass::FullRebuild
    }
}

/// Strokes the last `points` points of every band, farthest band first.
fn stroke_tails(
    pixmap: &mut Pixmap,
    polylines: &[Vec<Point>],
    pens: &[Paint<'static>],
    layout: &RibbonLayout,
    points: usize,
) {
    let stroke = Stroke {
        width: layout.pen_width(polylines.len()),
        line_cap: LineCap::Butt,
        line_join: LineJoin::Bevel,
        ..Stroke::default()
    };
    for (band, line) in polylines.iter().enumerate().rev() {
        let pen = &pens[band % pens.len()];
        let tail = &line[line.len().saturating_sub(points)..];
        if let Some(path) = polyline_path(tail) {
            pixmap.stroke_path(&path, pen, &stroke, Transform::identity(), None);
        }
    }
}

/// Moves every row `shift` pixels left and fills the exposed strip with `fill`.
fn scroll_left(pixmap: &mut Pixmap, shift: usize, fill: tiny_skia::Color) {
    let width = pixmap.width() as usize;
    if shift == 0 || width == 0 {
        return;
    }
    let shift = shift.min(width);
    let fill: PremultipliedColorU8 = fill.premultiply().to_color_u8();
    for row in pixmap.pixels_mut().chunks_exact_mut(width) {
        row.copy_within(shift.., 0);
        row[width - shift..].fill(fill);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::history::BandConfig;

    const W: u32 = 300;
    const H: u32 = 80;

    fn renderer(bands: usize) -> RibbonRenderer {
        RibbonRenderer::new(bands, RibbonStyle::default(), SpriteSheet::builtin())
    }

    fn history(bands: usize, len: usize) -> BandHistory {
        BandHistory::new(BandConfig::new(bands), len)
    }

    // Small deterministic wobble, a few pixels at most.
    fn frame_values(bands: usize, k: usize) -> Vec<f32> {
        (0..bands)
            .map(|b| (((k * 7 + b * 3) % 11) as f32 - 5.0) * 20.0)
            .collect()
    }

    fn paint(r: &mut RibbonRenderer, h: &BandHistory, size: (u32, u32), frames: usize) -> (RenderPass, Pixmap) {
        let mut target = Pixmap::new(size.0, size.1).unwrap();
        let pass = r.render_pending(&mut target.as_mut(), h, frames);
        (pass, target)
    }

    #[test]
    fn first_paint_rebuilds_then_scrolls() {
        let mut r = renderer(6);
        let mut h = history(6, 32);
        assert_eq!(paint(&mut r, &h, (W, H), 0).0, RenderPass::FullRebuild);

        h.push_frame(&frame_values(6, 1));
        let ppf = (W - 34 + 13) / 32;
        assert_eq!(
            paint(&mut r, &h, (W, H), 1).0,
            RenderPass::Incremental { frames: 1, shift: ppf }
        );
        assert_eq!(paint(&mut r, &h, (W, H), 0).0, RenderPass::Recomposite);
        assert_eq!(r.last_pass(), Some(RenderPass::Recomposite));
    }

    #[test]
    fn repaint_without_new_frame_is_bit_identical() {
        let mut r = renderer(6);
        let mut h = history(6, 32);
        for k in 0..10 {
            h.push_frame(&frame_values(6, k));
        }
        paint(&mut r, &h, (W, H), 0);
        r.set_sprite_frame(2);

        let mut target = Pixmap::new(W, H).unwrap();
        r.render(&mut target.as_mut(), &h, false);
        let first = target.clone();
        r.render(&mut target.as_mut(), &h, false);
        assert_eq!(first.data(), target.data());

        let (_, fresh) = paint(&mut r, &h, (W, H), 0);
        assert_eq!(first.data(), fresh.data());
    }

    #[test]
    fn resize_forces_full_rebuild() {
        let mut r = renderer(6);
        let mut h = history(6, 32);
        paint(&mut r, &h, (W, H), 0);
        h.push_frame(&frame_values(6, 0));
        assert_eq!(paint(&mut r, &h, (W + 40, H), 1).0, RenderPass::FullRebuild);
        assert_eq!(paint(&mut r, &h, (W + 40, H), 0).0, RenderPass::Recomposite);
        assert_eq!(paint(&mut r, &h, (W + 40, H + 1), 0).0, RenderPass::FullRebuild);
        assert_eq!(r.cache().map(|c| (c.width(), c.height())), Some((W + 40, H + 1)));

        r.invalidate();
        assert_eq!(paint(&mut r, &h, (W + 40, H + 1), 0).0, RenderPass::FullRebuild);
    }

    #[test]
    fn stale_window_falls_back_to_rebuild() {
        let mut r = renderer(2);
        let h = history(2, 8);
        paint(&mut r, &h, (W, H), 0);
        assert_eq!(paint(&mut r, &h, (W, H), 8).0, RenderPass::FullRebuild);
    }

    #[test]
    fn narrow_surface_degenerates_to_zero_shift() {
        let mut r = renderer(6);
        let mut h = history(6, 256);
        // (40 - 34 + 13) / 256 floors to zero.
        paint(&mut r, &h, (40, 30), 0);
        h.push_frame(&frame_values(6, 3));
        assert_eq!(
            paint(&mut r, &h, (40, 30), 1).0,
            RenderPass::Incremental { frames: 1, shift: 0 }
        );
    }

    #[test]
    fn incremental_scroll_matches_full_rebuild() {
        let bands = 6;
        let len = 32;
        let mut incremental = renderer(bands);
        let mut h = history(bands, len);
        paint(&mut incremental, &h, (W, H), 0);
        for k in 0..len {
            h.push_frame(&frame_values(bands, k));
            let (pass, _) = paint(&mut incremental, &h, (W, H), 1);
            assert!(matches!(pass, RenderPass::Incremental { frames: 1, .. }));
        }

        let mut full = renderer(bands);
        assert_eq!(paint(&mut full, &h, (W, H), 0).0, RenderPass::FullRebuild);

        let (a, b) = (incremental.cache().unwrap(), full.cache().unwrap());
        let layout = RibbonLayout::new((W, H), (34, 21), DEFAULT_OVERLAP, len, DEFAULT_PIXEL_SCALE);
        let mut lines = Vec::new();
        build_polylines(&h, &layout, &mut lines);

        // Sample each band at segment midpoints away from crossings with nearer bands.
        let mut checked = 0;
        for (band, line) in lines.iter().enumerate() {
            for seg in line.windows(2).skip(1) {
                let (x, y) = ((seg[0].x + seg[1].x) / 2.0, (seg[0].y + seg[1].y) / 2.0);
                let covered_by_nearer = lines[..band].iter().any(|other| {
                    other.iter().any(|p| (p.x - x).abs() <= 2.0 * layout.px_per_frame as f32 && (p.y - y).abs() < 3.0)
                });
                if covered_by_nearer {
                    continue;
                }
                let (px, py) = (x.round() as u32, y.round() as u32);
                let (pa, pb) = (a.pixel(px, py).unwrap(), b.pixel(px, py).unwrap());
                let diff = [
                    pa.red().abs_diff(pb.red()),
                    pa.green().abs_diff(pb.green()),
                    pa.blue().abs_diff(pb.blue()),
                ];
                assert!(
                    diff.iter().all(|&d| d <= 8),
                    "band {band} at ({px},{py}): {pa:?} vs {pb:?}"
                );
                checked += 1;
            }
        }
        // Band 0 is never occluded, so at least its segments were compared.
        assert!(checked >= len - 2, "only {checked} samples compared");
    }

    #[test]
    fn incremental_cost_touches_only_new_segment() {
        let mut r = renderer(2);
        let mut h = history(2, 16);
        paint(&mut r, &h, (W, H), 0);
        let before = r.cache().unwrap().to_owned();

        h.push_frame(&[0.0, 0.0]);
        let (pass, _) = paint(&mut r, &h, (W, H), 1);
        let RenderPass::Incremental { shift, .. } = pass else {
            panic!("expected incremental pass, got {pass:?}");
        };
        let after = r.cache().unwrap();
        // Everything left of the new segment is the old buffer moved left.
        let w = W as usize;
        let shift = shift as usize;
        let untouched = (h.len() - 2) * shift - 6;
        for y in 0..H as usize {
            let old = &before.pixels()[y * w + shift..y * w + shift + untouched];
            let new = &after.pixels()[y * w..y * w + untouched];
            assert_eq!(old, new, "row {y}");
        }
    }

    #[test]
    fn sprite_is_drawn_on_top_every_paint() {
        let mut r = renderer(6);
        let h = history(6, 32);
        let (_, target) = paint(&mut r, &h, (W, H), 0);
        let (sx, sy) = (W - 34, (H - 21) / 2);
        let sprite = r.sprite().frame(0).unwrap().to_owned();
        let (fx, fy) = (0..34)
            .flat_map(|x| (0..21).map(move |y| (x, y)))
            .find(|&(x, y)| sprite.pixel(x, y).is_some_and(|p| p.alpha() == 255))
            .unwrap();
        assert_eq!(target.pixel(sx + fx, sy + fy), sprite.pixel(fx, fy));

        let (pass, again) = paint(&mut r, &h, (W, H), 0);
        assert_eq!(pass, RenderPass::Recomposite);
        assert_eq!(again.pixel(sx + fx, sy + fy), sprite.pixel(fx, fy));
    }

    #[test]
    fn background_fills_gap_after_scroll() {
        let mut r = renderer(1);
        let mut h = history(1, 4);
        paint(&mut r, &h, (W, H), 0);
        h.push_frame(&[0.0]);
        paint(&mut r, &h, (W, H), 1);
        let bg = theme::to_skia(theme::RIBBON_BACKGROUND).premultiply().to_color_u8();
        let cache = r.cache().unwrap();
        assert_eq!(cache.pixel(W - 1, 0), Some(bg));
        assert_eq!(cache.pixel(0, H - 1), Some(bg));
    }
}
