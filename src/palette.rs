//! Background palette: the selectable background specifications

use crate::error::{ClientError, Result};
use image::Rgba;
use serde::{Deserialize, Serialize};

/// Named colors offered by the fixed palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NamedColor {
    White,
    Black,
    Red,
    Green,
    Blue,
}

impl NamedColor {
    /// Opaque RGBA value for this color
    #[must_use]
    pub fn rgba(self) -> Rgba<u8> {
        match self {
            Self::White => Rgba([255, 255, 255, 255]),
            Self::Black => Rgba([0, 0, 0, 255]),
            Self::Red => Rgba([255, 0, 0, 255]),
            Self::Green => Rgba([0, 255, 0, 255]),
            Self::Blue => Rgba([0, 0, 255, 255]),
        }
    }
}

impl std::fmt::Display for NamedColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::White => write!(f, "white"),
            Self::Black => write!(f, "black"),
            Self::Red => write!(f, "red"),
            Self::Green => write!(f, "green"),
            Self::Blue => write!(f, "blue"),
        }
    }
}

/// A background specification for compositing
///
/// `Transparent` keeps the processed image's alpha channel; the other
/// variants flatten it over a solid color at download time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackgroundSpec {
    /// Keep the alpha channel as-is
    Transparent,
    /// One of the fixed palette colors
    Named(NamedColor),
    /// Arbitrary `#rrggbb` (or `#rgb`) color
    Custom(String),
}

impl Default for BackgroundSpec {
    fn default() -> Self {
        Self::Transparent
    }
}

impl std::fmt::Display for BackgroundSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transparent => write!(f, "transparent"),
            Self::Named(color) => write!(f, "{color}"),
            Self::Custom(hex) => write!(f, "{hex}"),
        }
    }
}

impl std::str::FromStr for BackgroundSpec {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "transparent" | "none" => Ok(Self::Transparent),
            "white" => Ok(Self::Named(NamedColor::White)),
            "black" => Ok(Self::Named(NamedColor::Black)),
            "red" => Ok(Self::Named(NamedColor::Red)),
            "green" => Ok(Self::Named(NamedColor::Green)),
            "blue" => Ok(Self::Named(NamedColor::Blue)),
            hex if hex.starts_with('#') => {
                parse_hex_color(hex)?;
                Ok(Self::Custom(hex.to_string()))
            },
            other => Err(ClientError::invalid_config(format!(
                "Unknown background '{other}' (expected transparent, white, black, red, green, blue, or #rrggbb)"
            ))),
        }
    }
}

impl BackgroundSpec {
    /// Resolve to a fill color, or `None` for a transparent background
    ///
    /// # Errors
    /// - `Export` if a `Custom` value is not a parseable hex color
    pub fn fill_color(&self) -> Result<Option<Rgba<u8>>> {
        match self {
            Self::Transparent => Ok(None),
            Self::Named(color) => Ok(Some(color.rgba())),
            Self::Custom(hex) => parse_hex_color(hex).map(Some),
        }
    }
}

/// Parse a `#rrggbb` or `#rgb` hex string into an opaque RGBA value
fn parse_hex_color(hex: &str) -> Result<Rgba<u8>> {
    let invalid = || ClientError::export(format!("Invalid hex color '{hex}'"));
    let digits = hex.strip_prefix('#').ok_or_else(invalid)?;
    let expanded = match digits.len() {
        6 => digits.to_string(),
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        _ => return Err(invalid()),
    };
    let channel = |range: std::ops::Range<usize>| -> Result<u8> {
        expanded
            .get(range)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .ok_or_else(invalid)
    };
    Ok(Rgba([channel(0..2)?, channel(2..4)?, channel(4..6)?, 255]))
}

/// The fixed, ordered palette plus one mutable custom slot
#[derive(Debug, Clone)]
pub struct BackgroundPalette {
    custom: String,
}

/// Fixed palette entries, in display order
const FIXED_ENTRIES: [BackgroundSpec; 6] = [
    BackgroundSpec::Transparent,
    BackgroundSpec::Named(NamedColor::White),
    BackgroundSpec::Named(NamedColor::Black),
    BackgroundSpec::Named(NamedColor::Red),
    BackgroundSpec::Named(NamedColor::Green),
    BackgroundSpec::Named(NamedColor::Blue),
];

impl Default for BackgroundPalette {
    fn default() -> Self {
        Self {
            custom: "#ffffff".to_string(),
        }
    }
}

impl BackgroundPalette {
    /// All selectable entries: the fixed set followed by the custom slot
    #[must_use]
    pub fn entries(&self) -> Vec<BackgroundSpec> {
        let mut entries = FIXED_ENTRIES.to_vec();
        entries.push(BackgroundSpec::Custom(self.custom.clone()));
        entries
    }

    /// Current custom hex value
    #[must_use]
    pub fn custom(&self) -> &str {
        &self.custom
    }

    /// Replace the custom slot
    ///
    /// # Errors
    /// - `Export` if the value is not a parseable hex color
    pub fn set_custom<S: Into<String>>(&mut self, hex: S) -> Result<()> {
        let hex = hex.into();
        parse_hex_color(&hex)?;
        self.custom = hex;
        Ok(())
    }
}
