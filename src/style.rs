//! Text styling shared by every layer of a composition.
//!
//! Style is process-wide rather than per-layer: one font, one fill color,
//! one outline color, one uppercase flag and one size percentage apply to
//! all layers until export.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// Fonts offered by the studio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontKey {
    #[default]
    Impact,
    Anton,
    Bebas,
    Poppins,
}

impl FontKey {
    /// Parse a font key. Unknown keys fall back to Impact.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "anton" => FontKey::Anton,
            "bebas" => FontKey::Bebas,
            "poppins" => FontKey::Poppins,
            _ => FontKey::Impact,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FontKey::Impact => "impact",
            FontKey::Anton => "anton",
            FontKey::Bebas => "bebas",
            FontKey::Poppins => "poppins",
        }
    }

    /// Font file the rendering backend should load.
    pub fn file_name(self) -> &'static str {
        match self {
            FontKey::Impact => "Impact.ttf",
            FontKey::Anton => "Anton-Regular.ttf",
            FontKey::Bebas => "BebasNeue-Regular.ttf",
            FontKey::Poppins => "Poppins-SemiBold.ttf",
        }
    }

    /// Font family stack for preview surfaces that select fonts by family.
    pub fn family(self) -> &'static str {
        match self {
            FontKey::Impact => "\"Impact\", \"Anton\", sans-serif",
            FontKey::Anton => "\"Anton\", sans-serif",
            FontKey::Bebas => "\"Bebas Neue\", sans-serif",
            FontKey::Poppins => "\"Poppins\", sans-serif",
        }
    }

    /// Every font, in menu order.
    pub fn all() -> &'static [FontKey] {
        &[
            FontKey::Impact,
            FontKey::Anton,
            FontKey::Bebas,
            FontKey::Poppins,
        ]
    }
}

/// 8-bit RGB color, written as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    /// Parse `#rgb` or `#rrggbb` (the `#` is optional, case-insensitive).
    pub fn parse_hex(value: &str) -> Option<Rgb> {
        let value = value.trim();
        let hex = value.strip_prefix('#').unwrap_or(value);
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return None,
        };
        let channel = |i: usize| u8::from_str_radix(expanded.get(i..i + 2)?, 16).ok();
        Some(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Parse a hex color, substituting `fallback` for anything invalid.
    pub fn parse_or(value: &str, fallback: Rgb) -> Rgb {
        Rgb::parse_hex(value).unwrap_or(fallback)
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Rgb {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Rgb::parse_hex(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid color '{}'", raw)))
    }
}

/// Raster output format tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutputFormat {
    Png,
    #[default]
    Jpeg,
}

impl OutputFormat {
    /// Parse a format tag (`png`, `jpg`, `jpeg`, any case).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "png" => Some(OutputFormat::Png),
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }

    pub fn image_format(self) -> image::ImageFormat {
        match self {
            OutputFormat::Png => image::ImageFormat::Png,
            OutputFormat::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

/// Size percentages the studio slider offers.
pub const SIZE_PCT_RANGE: RangeInclusive<f64> = 4.0..=30.0;

/// Styling applied to every text layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleSettings {
    pub font: FontKey,
    pub fill: Rgb,
    pub outline: Rgb,
    pub uppercase: bool,
    /// Text size as a percentage; see [`crate::layout::font_size`].
    pub size_pct: f64,
}

impl Default for StyleSettings {
    fn default() -> Self {
        Self {
            font: FontKey::Impact,
            fill: Rgb::WHITE,
            outline: Rgb::BLACK,
            uppercase: true,
            size_pct: 10.0,
        }
    }
}

impl StyleSettings {
    /// Apply the uppercase transform if enabled.
    pub fn transform_text(&self, text: &str) -> String {
        if self.uppercase {
            text.to_uppercase()
        } else {
            text.to_string()
        }
    }
}
