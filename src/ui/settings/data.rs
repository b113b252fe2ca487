use serde::{Deserialize, Serialize};

use super::{
    ribbon::{RibbonSettings, SpriteSettings},
    signal::SignalSettings,
};

const WINDOW_MIN_SIZE: f32 = 120.0;
const WINDOW_MAX_SIZE: f32 = 8_192.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct UiSettings {
    pub ribbon: RibbonSettings,
    pub sprite: SpriteSettings,
    pub signal: SignalSettings,
    pub window: WindowSettings,
}

impl UiSettings {
    pub fn sanitize(&mut self) {
        self.ribbon.sanitize();
        self.sprite.sanitize();
        self.signal.sanitize();
        self.window.sanitize();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub width: f32,
    pub height: f32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 200.0,
        }
    }
}

impl WindowSettings {
    pub fn sanitize(&mut self) {
        let clamp = |v: f32, fallback: f32| {
            if v.is_finite() {
                v.clamp(WINDOW_MIN_SIZE, WINDOW_MAX_SIZE)
            } else {
                fallback
            }
        };
        let defaults = Self::default();
        self.width = clamp(self.width, defaults.width);
        self.height = clamp(self.height, defaults.height);
    }

    pub fn size(&self) -> iced::Size {
        iced::Size::new(self.width, self.height)
    }
}
