//! Animated sprite drawn over the ribbon's leading edge.

use anyhow::{Context, Result, bail};
use std::path::Path as FsPath;
use std::time::Duration;
use tiny_skia::{
    BlendMode, Color, FillRule, Paint, Path, PathBuilder, Pixmap, PixmapPaint, PixmapRef, Rect,
    Transform,
};

pub const DEFAULT_SPRITE_WIDTH: u32 = 34;
pub const DEFAULT_SPRITE_HEIGHT: u32 = 21;
pub const DEFAULT_FRAME_COUNT: usize = 6;
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(150);

/// Equal-sized animation frames.
#[derive(Debug, Clone)]
pub struct SpriteSheet {
    frames: Vec<Pixmap>,
    width: u32,
    height: u32,
}

impl SpriteSheet {
    /// Loads a PNG whose frames are stacked top to bottom.
    pub fn load(path: &FsPath, frame_count: usize) -> Result<Self> {
        let sheet = Pixmap::load_png(path)
            .with_context(|| format!("failed to decode sprite sheet {}", path.display()))?;
        let Some(sprite) = Self::from_sheet(&sheet, frame_count) else {
            bail!(
                "sprite sheet {} ({}x{}) cannot hold {frame_count} frames",
                path.display(),
                sheet.width(),
                sheet.height()
            );
        };
        Ok(sprite)
    }

    /// Slices a vertical strip into `frame_count` frames of `height / frame_count` rows.
    pub fn from_sheet(sheet: &Pixmap, frame_count: usize) -> Option<Self> {
        let frame_count = u32::try_from(frame_count).ok().filter(|&n| n > 0)?;
        let (width, height) = (sheet.width(), sheet.height() / frame_count);
        let copy = PixmapPaint {
            blend_mode: BlendMode::Source,
            ..PixmapPaint::default()
        };
        let frames = (0..frame_count)
            .map(|i| {
                let mut frame = Pixmap::new(width, height)?;
                let offset = i32::try_from(i * height).ok()?;
                frame.draw_pixmap(0, -offset, sheet.as_ref(), &copy, Transform::identity(), None);
                Some(frame)
            })
            .collect::<Option<Vec<_>>>()?;
        Some(Self {
            frames,
            width,
            height,
        })
    }

    /// Procedurally drawn default: a small pastry-bodied cat with paddling legs.
    pub fn builtin() -> Self {
        let (width, height) = (DEFAULT_SPRITE_WIDTH, DEFAULT_SPRITE_HEIGHT);
        let frames = (0..DEFAULT_FRAME_COUNT)
            .filter_map(|i| draw_builtin_frame(width, height, i))
            .collect::<Vec<_>>();
        // Pixmap::new only fails for zero sizes, which the constants rule out.
        debug_assert_eq!(frames.len(), DEFAULT_FRAME_COUNT);
        Self {
            frames,
            width,
            height,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Frame `index`, wrapped into range.
    pub fn frame(&self, index: usize) -> Option<PixmapRef<'_>> {
        let n = self.frames.len();
        (n > 0).then(|| self.frames[index % n].as_ref())
    }
}

impl Default for SpriteSheet {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Free-running frame counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteCycler {
    frame: usize,
    frame_count: usize,
}

impl SpriteCycler {
    pub fn new(frame_count: usize) -> Self {
        Self {
            frame: 0,
            frame_count: frame_count.max(1),
        }
    }

    pub fn tick(&mut self) -> usize {
        self.frame = (self.frame + 1) % self.frame_count;
        self.frame
    }

    #[cfg(test)]
    pub fn frame(&self) -> usize {
        self.frame
    }
}

fn draw_builtin_frame(width: u32, height: u32, index: usize) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(width, height)?;
    let (w, h) = (width as f32, height as f32);
    // Bob one pixel on alternate frames, legs swing on a 3-step cycle.
    let bob = if index % 2 == 0 { 0.0 } else { 1.0 };
    let swing = [-1.5, 0.0, 1.5][index % 3];

    let fill = |pixmap: &mut Pixmap, path: &Path, color: Color| {
        let mut paint = Paint::default();
        paint.set_color(color);
        paint.anti_alias = true;
        pixmap.fill_path(path, &paint, FillRule::Winding, Transform::identity(), None);
    };

    let outline = Color::from_rgba8(20, 20, 20, 255);
    let legs = [w * 0.22, w * 0.38, w * 0.58, w * 0.72];
    for (i, x) in legs.iter().enumerate() {
        let dx = if i % 2 == 0 { swing } else { -swing };
        if let Some(rect) = Rect::from_xywh(x + dx, h * 0.72 + bob, 3.0, h * 0.22) {
            fill(&mut pixmap, &PathBuilder::from_rect(rect), outline);
        }
    }

    if let Some(rect) = Rect::from_xywh(w * 0.12 - swing, h * 0.38 + bob, w * 0.12, 3.0) {
        fill(&mut pixmap, &PathBuilder::from_rect(rect), outline);
    }

    let body_w = w * 0.62;
    let body_h = h * 0.72;
    if let Some(rect) = Rect::from_xywh(w * 0.18, h * 0.06 + bob, body_w, body_h) {
        fill(&mut pixmap, &rounded_rect(rect, 3.0), outline);
    }
    if let Some(rect) = Rect::from_xywh(w * 0.18 + 1.5, h * 0.06 + bob + 1.5, body_w - 3.0, body_h - 3.0)
    {
        fill(&mut pixmap, &rounded_rect(rect, 2.5), Color::from_rgba8(250, 204, 153, 255));
    }
    if let Some(rect) = Rect::from_xywh(w * 0.18 + 4.0, h * 0.06 + bob + 4.0, body_w - 8.0, body_h - 8.0)
    {
        fill(&mut pixmap, &rounded_rect(rect, 2.0), Color::from_rgba8(255, 153, 255, 255));
    }

    let head_x = w * 0.78;
    let head_y = h * 0.5 + bob;
    if let Some(circle) = PathBuilder::from_circle(head_x, head_y, h * 0.3) {
        fill(&mut pixmap, &circle, outline);
    }
    if let Some(circle) = PathBuilder::from_circle(head_x, head_y, h * 0.3 - 1.5) {
        fill(&mut pixmap, &circle, Color::from_rgba8(153, 153, 153, 255));
    }
    for ex in [head_x - 2.5, head_x + 2.5] {
        if let Some(eye) = PathBuilder::from_circle(ex, head_y - 1.0, 1.0) {
            fill(&mut pixmap, &eye, outline);
        }
    }

    Some(pixmap)
}

fn rounded_rect(rect: Rect, radius: f32) -> Path {
    let (x, y, w, h) = (rect.x(), rect.y(), rect.width(), rect.height());
    let radius = radius.min(w / 2.0).min(h / 2.0);
    let mut pb = PathBuilder::new();
    pb.move_to(x + radius, y);
    pb.line_to(x + w - radius, y);
    pb.quad_to(x + w, y, x + w, y + radius);
    pb.line_to(x + w, y + h - radius);
    pb.quad_to(x + w, y + h, x + w - radius, y + h);
    pb.line_to(x + radius, y + h);
    pb.quad_to(x, y + h, x, y + h - radius);
    pb.line_to(x, y + radius);
    pb.quad_to(x, y, x + radius, y);
    pb.close();
    pb.finish().unwrap_or_else(|| PathBuilder::from_rect(rect))
}
