//! Ribbon colours and the window theme.
//!
//! Colours are authored as `iced::Color` (that is what the settings file stores)
//! and converted to `tiny_skia::Color` at the rasteriser boundary.

use iced::theme::palette::{self, Extended};
use iced::{Color, Theme};

/// Deep blue behind the ribbon.
pub const RIBBON_BACKGROUND: Color = Color::from_rgb8(0x0f, 0x43, 0x73);

const TEXT_PRIMARY: Color = Color::from_rgba(0.902, 0.910, 0.925, 1.0);
const TEXT_DARK: Color = Color::from_rgba(0.10, 0.10, 0.10, 1.0);
const ACCENT_PRIMARY: Color = Color::from_rgba(0.157, 0.157, 0.157, 1.0);
const ACCENT_SUCCESS: Color = Color::from_rgba(0.478, 0.557, 0.502, 1.0);
const ACCENT_DANGER: Color = Color::from_rgba(0.557, 0.478, 0.478, 1.0);

// Rainbow stripes are fully saturated and bright.
const BAND_SATURATION: f32 = 1.0;
const BAND_VALUE: f32 = 1.0;

pub fn theme(background: Color) -> Theme {
    Theme::custom_with_fn(
        "Ribbonmeter".to_string(),
        palette(background),
        Extended::generate,
    )
}

fn palette(background: Color) -> palette::Palette {
    let text = if palette::is_dark(background) {
        TEXT_PRIMARY
    } else {
        TEXT_DARK
    };

    palette::Palette {
        background,
        text,
        primary: ACCENT_PRIMARY,
        success: ACCENT_SUCCESS,
        warning: ACCENT_SUCCESS,
        danger: ACCENT_DANGER,
    }
}

/// HSV to RGB with hue in degrees.
pub fn hsv_to_color(hue: f32, saturation: f32, value: f32) -> Color {
    let h = hue.rem_euclid(360.0);
    let c = value * saturation;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = value - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    Color::from_rgb(r + m, g + m, b + m)
}

/// One colour per band, spaced evenly around the hue wheel starting at red.
pub fn band_colors(count: usize) -> Vec<Color> {
    let count = count.max(1);
    (0..count)
        .map(|i| hsv_to_color(360.0 * i as f32 / count as f32, BAND_SATURATION, BAND_VALUE))
        .collect()
}

/// Converts to the rasteriser's colour type, clamping out-of-range channels.
#[inline]
pub fn to_skia(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba(
        color.r.clamp(0.0, 1.0),
        color.g.clamp(0.0, 1.0),
        color.b.clamp(0.0, 1.0),
        color.a.clamp(0.0, 1.0),
    )
    .unwrap_or(tiny_skia::Color::BLACK)
}

/// Compares two colors for approximate equality.
#[cfg(test)]
pub fn colors_equal(a: Color, b: Color) -> bool {
    const EPSILON: f32 = 1e-4;
    (a.r - b.r).abs() <= EPSILON
        && (a.g - b.g).abs() <= EPSILON
        && (a.b - b.b).abs() <= EPSILON
        && (a.a - b.a).abs() <= EPSILON
}
