use iced::Color;
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Colour persisted as a `#rrggbb[aa]` string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorSetting(Color);

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RgbaComponents {
    r: f32,
    g: f32,
    b: f32,
    #[serde(default = "opaque")]
    a: f32,
}

fn opaque() -> f32 {
    1.0
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColorSettingRepr {
    Hex(String),
    Components(RgbaComponents),
}

impl Serialize for ColorSetting {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for ColorSetting {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match ColorSettingRepr::deserialize(deserializer)? {
            ColorSettingRepr::Hex(value) => value
                .parse::<Color>()
                .map(ColorSetting)
                .map_err(de::Error::custom),
            ColorSettingRepr::Components(RgbaComponents { r, g, b, a }) => {
                Ok(ColorSetting(Color::from_rgba(r, g, b, a)))
            }
        }
    }
}

impl From<Color> for ColorSetting {
    fn from(color: Color) -> Self {
        Self(color)
    }
}
impl From<ColorSetting> for Color {
    fn from(ColorSetting(color): ColorSetting) -> Self {
        color
    }
}
