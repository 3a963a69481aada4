// SPDX-License-Identifier: GPL-3.0-only

//! Frame styling: colors, presets and custom styles

use crate::errors::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// An opaque sRGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(0xff, 0xff, 0xff);
    pub const BLACK: Rgb = Rgb::new(0x00, 0x00, 0x00);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from a `0xRRGGBB` value
    pub const fn from_u32(rgb: u32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xff) as u8,
            g: ((rgb >> 8) & 0xff) as u8,
            b: (rgb & 0xff) as u8,
        }
    }

    /// Parse `#rrggbb`, `rrggbb` or the `#rgb` shorthand
    pub fn from_hex(hex: &str) -> Result<Self, ParseError> {
        let digits = hex.trim();
        let digits = digits.strip_prefix('#').unwrap_or(digits);
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ParseError::Color(hex.to_string()));
        }

        let value = match digits.len() {
            6 => u32::from_str_radix(digits, 16).map_err(|_| ParseError::Color(hex.to_string()))?,
            3 => {
                let expanded: String = digits.chars().flat_map(|c| [c, c]).collect();
                u32::from_str_radix(&expanded, 16)
                    .map_err(|_| ParseError::Color(hex.to_string()))?
            }
            _ => return Err(ParseError::Color(hex.to_string())),
        };

        Ok(Self::from_u32(value))
    }

    /// Perceptual brightness (Rec. 709 weights), 0.0 - 255.0
    pub fn luma(&self) -> f32 {
        0.2126 * self.r as f32 + 0.7152 * self.g as f32 + 0.0722 * self.b as f32
    }

    /// Blend `self` over `base` with the given opacity
    pub fn over(&self, base: Rgb, alpha: f32) -> Rgb {
        let alpha = alpha.clamp(0.0, 1.0);
        let mix = |top: u8, bottom: u8| -> u8 {
            (top as f32 * alpha + bottom as f32 * (1.0 - alpha)).round() as u8
        };
        Rgb::new(mix(self.r, base.r), mix(self.g, base.g), mix(self.b, base.b))
    }

    pub fn to_rgba(self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, 255])
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Rgb {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_string()
    }
}

/// Text color used when a preset does not name one
pub const DEFAULT_TEXT: Rgb = Rgb::from_u32(0x6b7280);

/// Which side of the luma threshold a background falls on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Light background, dark border and text
    DarkOnLight,
    /// Dark background, light border and text
    LightOnDark,
    /// The background could not be parsed
    Fallback,
}

/// Border and text colors that stay readable on a given background
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContrastStyle {
    pub tone: Tone,
    pub border: Rgb,
    pub text: Rgb,
}

/// Pick border/text colors for a background given as a hex string
pub fn contrast_style(hex: &str) -> ContrastStyle {
    match Rgb::from_hex(hex) {
        Ok(color) => contrast_for(color),
        Err(e) => {
            warn!(error = %e, "Cannot derive contrast colors, using fallback");
            ContrastStyle {
                tone: Tone::Fallback,
                border: DEFAULT_TEXT,
                text: DEFAULT_TEXT,
            }
        }
    }
}

/// Pick border/text colors for a parsed background
pub fn contrast_for(background: Rgb) -> ContrastStyle {
    if background.luma() > 128.0 {
        ContrastStyle {
            tone: Tone::DarkOnLight,
            border: Rgb::from_u32(0x374151),
            text: Rgb::from_u32(0x4b5563),
        }
    } else {
        ContrastStyle {
            tone: Tone::LightOnDark,
            border: Rgb::from_u32(0xd1d5db),
            text: Rgb::from_u32(0x9ca3af),
        }
    }
}

/// Built-in frame presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetId {
    #[default]
    White,
    Black,
    Pink,
    Blue,
    Purple,
    Green,
}

/// Colors of a preset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetPalette {
    pub background: Rgb,
    pub border: Rgb,
    pub text: Option<Rgb>,
}

impl PresetId {
    /// All presets in display order; the first one is the session default
    pub const ALL: [PresetId; 6] = [
        PresetId::White,
        PresetId::Black,
        PresetId::Pink,
        PresetId::Blue,
        PresetId::Purple,
        PresetId::Green,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            PresetId::White => "White",
            PresetId::Black => "Black",
            PresetId::Pink => "Pink",
            PresetId::Blue => "Blue",
            PresetId::Purple => "Purple",
            PresetId::Green => "Green",
        }
    }

    pub fn palette(&self) -> PresetPalette {
        let (background, border, text) = match self {
            PresetId::White => (0xffffff, 0x1f2937, 0x6b7280),
            PresetId::Black => (0x000000, 0xd1d5db, 0x9ca3af),
            PresetId::Pink => (0xfce7f3, 0xf472b6, 0xdb2777),
            PresetId::Blue => (0xdbeafe, 0x60a5fa, 0x2563eb),
            PresetId::Purple => (0xf3e8ff, 0xc084fc, 0x9333ea),
            PresetId::Green => (0xdcfce7, 0x4ade80, 0x16a34a),
        };
        PresetPalette {
            background: Rgb::from_u32(background),
            border: Rgb::from_u32(border),
            text: Some(Rgb::from_u32(text)),
        }
    }

    /// Next preset in display order, wrapping around
    pub fn next(&self) -> PresetId {
        let index = Self::ALL.iter().position(|p| p == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

impl FromStr for PresetId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.display_name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|p| p.display_name()).collect();
                ParseError::Preset {
                    name: s.to_string(),
                    expected: names.join(", "),
                }
            })
    }
}

/// Explicit colors derived from a user-chosen base color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomStyle {
    pub background: Rgb,
    pub border: Rgb,
    pub text: Rgb,
}

impl CustomStyle {
    pub fn from_base(base: Rgb) -> Self {
        let contrast = contrast_for(base);
        Self {
            background: base,
            border: contrast.border,
            text: contrast.text,
        }
    }
}

/// Style of the frame: a named preset or a custom color set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FrameStyle {
    Preset { preset: PresetId },
    Custom(CustomStyle),
}

impl Default for FrameStyle {
    fn default() -> Self {
        FrameStyle::Preset {
            preset: PresetId::ALL[0],
        }
    }
}

/// Concrete colors a renderer needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColors {
    pub background: Rgb,
    pub border: Rgb,
    pub text: Rgb,
}

impl FrameStyle {
    pub fn custom(base: Rgb) -> Self {
        FrameStyle::Custom(CustomStyle::from_base(base))
    }

    pub fn colors(&self) -> ResolvedColors {
        match self {
            FrameStyle::Preset { preset } => {
                let palette = preset.palette();
                ResolvedColors {
                    background: palette.background,
                    border: palette.border,
                    text: palette.text.unwrap_or(DEFAULT_TEXT),
                }
            }
            FrameStyle::Custom(custom) => ResolvedColors {
                background: custom.background,
                border: custom.border,
                text: custom.text,
            },
        }
    }

    pub fn name(&self) -> String {
        match self {
            FrameStyle::Preset { preset } => preset.display_name().to_string(),
            FrameStyle::Custom(custom) => format!("Custom {}", custom.background),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contrast_white_is_dark_on_light() {
        let style = contrast_style("#FFFFFF");
        assert_eq!(style.tone, Tone::DarkOnLight);
        assert_eq!(style.border, Rgb::from_u32(0x374151));
        assert_eq!(style.text, Rgb::from_u32(0x4b5563));
    }

    #[test]
    fn test_contrast_black_is_light_on_dark() {
        let style = contrast_style("#000000");
        assert_eq!(style.tone, Tone::LightOnDark);
        assert_eq!(style.border, Rgb::from_u32(0xd1d5db));
    }

    #[test]
    fn test_contrast_threshold_is_exclusive() {
        // Gray 128 has luma exactly 128.0 and is treated as dark
        assert_eq!(contrast_for(Rgb::new(128, 128, 128)).tone, Tone::LightOnDark);
        assert_eq!(contrast_for(Rgb::new(129, 129, 129)).tone, Tone::DarkOnLight);
    }

    #[test]
    fn test_contrast_fallback_on_garbage() {
        let style = contrast_style("not a color");
        assert_eq!(style.tone, Tone::Fallback);
        assert_eq!(style.text, DEFAULT_TEXT);
    }

    #[test]
    fn test_hex_parsing() {
        assert_eq!(Rgb::from_hex("#1f2937").unwrap(), Rgb::new(0x1f, 0x29, 0x37));
        assert_eq!(Rgb::from_hex("ABCDEF").unwrap(), Rgb::new(0xab, 0xcd, 0xef));
        assert_eq!(Rgb::from_hex("#fa0").unwrap(), Rgb::new(0xff, 0xaa, 0x00));
        assert_eq!(Rgb::from_hex("#12345"), Err(ParseError::Color("#12345".to_string())));
        assert!(Rgb::from_hex("#+12345").is_err());
        assert_eq!(Rgb::new(1, 2, 255).to_string(), "#0102ff");
    }

    #[test]
    fn test_default_style_is_first_preset() {
        assert_eq!(
            FrameStyle::default(),
            FrameStyle::Preset {
                preset: PresetId::White
            }
        );
    }

    #[test]
    fn test_custom_style_from_base() {
        let style = FrameStyle::custom(Rgb::from_u32(0x111111));
        let colors = style.colors();
        assert_eq!(colors.background, Rgb::from_u32(0x111111));
        assert_eq!(colors.text, Rgb::from_u32(0x9ca3af));
    }

    #[test]
    fn test_style_serde_tagging() {
        let json = serde_json::to_string(&FrameStyle::default()).unwrap();
        assert_eq!(json, r##"{"type":"preset","preset":"white"}"##);

        let custom: FrameStyle = serde_json::from_str(
            r##"{"type":"custom","background":"#000000","border":"#d1d5db","text":"#9ca3af"}"##,
        )
        .unwrap();
        assert_eq!(custom, FrameStyle::custom(Rgb::BLACK));
    }

    #[test]
    fn test_preset_lookup_and_cycle() {
        assert_eq!("purple".parse::<PresetId>().unwrap(), PresetId::Purple);
        let err = "magenta".parse::<PresetId>().unwrap_err();
        assert!(matches!(err, ParseError::Preset { ref name, .. } if name == "magenta"));
        assert!(err.to_string().contains("White"));
        assert_eq!(PresetId::Green.next(), PresetId::White);
    }
}
