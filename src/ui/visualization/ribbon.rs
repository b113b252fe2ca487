use crate::dsp::history::{BandConfig, BandHistory};
use crate::ui::render::ribbon::{RenderPass, RibbonRenderer, RibbonStyle};
use crate::ui::render::sprite::{SpriteCycler, SpriteSheet};
use iced::widget::{Space, image, responsive};
use iced::{ContentFit, Element, Length, Size};
use std::cell::{Cell, RefCell};
use tiny_skia::Pixmap;
use tracing::trace;

/// View-model for the ribbon: band history, sprite clock and the cached renderer.
///
/// `view` runs with `&self`, so the renderer sits behind a `RefCell` and the
/// number of history updates since the last paint behind a `Cell`.
#[derive(Debug)]
pub struct RibbonState {
    history: BandHistory,
    cycler: SpriteCycler,
    renderer: RefCell<RibbonRenderer>,
    pending: Cell<usize>,
}

impl RibbonState {
    pub fn new(bands: usize, history_len: usize, style: RibbonStyle, sprite: SpriteSheet) -> Self {
        let config = BandConfig::new(bands);
        let cycler = SpriteCycler::new(sprite.frame_count());
        Self {
            renderer: RefCell::new(RibbonRenderer::new(config.count(), style, sprite)),
            history: BandHistory::new(config, history_len),
            cycler,
            pending: Cell::new(0),
        }
    }

    #[cfg(test)]
    pub fn sprite_frame(&self) -> usize {
        self.cycler.frame()
    }

    #[cfg(test)]
    pub fn pending_frames(&self) -> usize {
        self.pending.get()
    }

    pub fn push_magnitudes(&mut self, magnitudes: &[f32]) {
        self.history.update(magnitudes);
        self.pending.set(self.pending.get().saturating_add(1));
    }

    pub fn tick_sprite(&mut self) {
        let frame = self.cycler.tick();
        self.renderer.get_mut().set_sprite_frame(frame);
    }

    #[cfg(test)]
    pub fn last_pass(&self) -> Option<RenderPass> {
        self.renderer.borrow().last_pass()
    }

    /// Drops the cached ribbon; the next paint rebuilds it.
    pub fn invalidate(&mut self) {
        self.renderer.get_mut().invalidate();
    }

    /// Rasterises one frame at `width` x `height`. `None` for an empty surface,
    /// in which case pending history updates are kept for the next paint.
    pub fn paint(&self, width: u32, height: u32) -> Option<Pixmap> {
        let mut pixmap = Pixmap::new(width, height)?;
        let mut renderer = self.renderer.borrow_mut();
        let mut target = pixmap.as_mut();
        let pass = match self.pending.take() {
            frames @ (0 | 1) => renderer.render(&mut target, &self.history, frames == 1),
            frames => renderer.render_pending(&mut target, &self.history, frames),
        };
        if matches!(pass, RenderPass::FullRebuild) {
            trace!("[ribbon] rebuilt at {width}x{height}");
        }
        Some(pixmap)
    }
}

pub fn widget<'a, Message: 'a>(state: &'a RibbonState) -> Element<'a, Message> {
    responsive(move |size: Size| {
        let (width, height) = (size.width.floor() as u32, size.height.floor() as u32);
        match state.paint(width, height) {
            Some(pixmap) => image(image::Handle::from_rgba(width, height, pixmap.take()))
                .width(Length::Fill)
                .height(Length::Fill)
                .content_fit(ContentFit::Fill)
                .filter_method(image::FilterMethod::Nearest)
                .into(),
            None => Space::new().width(Length::Fill).height(Length::Fill).into(),
        }
    })
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> RibbonState {
        RibbonState::new(6, 16, RibbonStyle::default(), SpriteSheet::builtin())
    }

    #[test]
    fn pending_frames_flow_into_next_paint() {
        let mut s = state();
        assert!(s.paint(200, 60).is_some());
        assert_eq!(s.last_pass(), Some(RenderPass::FullRebuild));

        s.push_magnitudes(&[1.0; 512]);
        s.push_magnitudes(&[1.0; 512]);
        assert_eq!(s.pending_frames(), 2);
        s.paint(200, 60);
        assert!(matches!(
            s.last_pass(),
            Some(RenderPass::Incremental { frames: 2, .. })
        ));
        assert_eq!(s.pending_frames(), 0);

        s.paint(200, 60);
        assert_eq!(s.last_pass(), Some(RenderPass::Recomposite));
    }

    #[test]
    fn zero_sized_paint_keeps_pending_frames() {
        let mut s = state();
        s.push_magnitudes(&[0.5; 64]);
        assert!(s.paint(0, 40).is_none());
        assert_eq!(s.pending_frames(), 1);
        assert_eq!(s.last_pass(), None);
    }

    #[test]
    fn invalidate_forces_rebuild_at_same_size() {
        let mut s = state();
        s.paint(200, 60);
        s.push_magnitudes(&[1.0; 512]);
        s.invalidate();
        s.paint(200, 60);
        assert_eq!(s.last_pass(), Some(RenderPass::FullRebuild));
        assert_eq!(s.pending_frames(), 0);
    }

    #[test]
    fn sprite_ticks_wrap() {
        let mut s = state();
        for _ in 0..6 {
            s.tick_sprite();
        }
        assert_eq!(s.sprite_frame(), 0);
        s.tick_sprite();
        assert_eq!(s.sprite_frame(), 1);
    }
}
