//! Colour parsing and the visual styles carried by marker records.

use log::warn;
use thiserror::Error;

use crate::geometry::Point;

/// An RGBA colour with eight bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgba {
    /// Red channel.
    pub red: u8,
    /// Green channel.
    pub green: u8,
    /// Blue channel.
    pub blue: u8,
    /// Alpha channel; `255` is opaque.
    pub alpha: u8,
}

/// Errors returned by [`Rgba::from_hex`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ColorParseError {
    /// The input did not contain six or eight hex digits.
    #[error("colour '{input}' must have 6 or 8 hex digits after '#'")]
    InvalidLength {
        /// Original input.
        input: String,
    },
    /// The input contained a character outside `0-9a-fA-F`.
    #[error("colour '{input}' contains a non-hex digit")]
    InvalidDigit {
        /// Original input.
        input: String,
    },
}

impl Rgba {
    /// Opaque black.
    pub const BLACK: Self = Self::opaque(0x00, 0x00, 0x00);

    /// Fill used for teardrop markers without an explicit colour or seed.
    pub const TEARDROP_DEFAULT: Self = Self::opaque(0x59, 0x81, 0xD8);

    /// Construct an opaque colour.
    #[must_use]
    pub const fn opaque(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha: u8::MAX,
        }
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA`. The leading `#` is optional and
    /// surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ColorParseError`] when the digit count or a digit is invalid.
    ///
    /// # Examples
    /// ```
    /// use cartosync_core::Rgba;
    ///
    /// let colour = Rgba::from_hex("#5981D8")?;
    /// assert_eq!(colour, Rgba::opaque(0x59, 0x81, 0xD8));
    /// let translucent = Rgba::from_hex("00000080")?;
    /// assert_eq!(translucent.alpha, 0x80);
    /// # Ok::<(), cartosync_core::ColorParseError>(())
    /// ```
    pub fn from_hex(input: &str) -> Result<Self, ColorParseError> {
        let trimmed = input.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if digits.len() != 6 && digits.len() != 8 {
            return Err(ColorParseError::InvalidLength {
                input: input.to_owned(),
            });
        }
        let channels: Option<Vec<u8>> = digits.as_bytes().chunks(2).map(hex_pair).collect();
        match channels.as_deref() {
            Some(&[red, green, blue]) => Ok(Self::opaque(red, green, blue)),
            Some(&[red, green, blue, alpha]) => Ok(Self {
                red,
                green,
                blue,
                alpha,
            }),
            _ => Err(ColorParseError::InvalidDigit {
                input: input.to_owned(),
            }),
        }
    }

    /// Parse an optional colour, substituting `default` when it is absent or
    /// invalid. Invalid input is logged against `field`.
    #[must_use]
    pub fn parse_or(input: Option<&str>, default: Self, field: &str) -> Self {
        input.map_or(default, |raw| match Self::from_hex(raw) {
            Ok(colour) => colour,
            Err(err) => {
                warn!("{field}: {err}; using default");
                default
            }
        })
    }

    /// Pack the colour as `0xRRGGBBAA`.
    #[must_use]
    pub fn to_u32(self) -> u32 {
        (u32::from(self.red) << 24)
            | (u32::from(self.green) << 16)
            | (u32::from(self.blue) << 8)
            | u32::from(self.alpha)
    }
}

fn hex_pair(pair: &[u8]) -> Option<u8> {
    let mut value: u32 = 0;
    for byte in pair {
        value = value * 16 + char::from(*byte).to_digit(16)?;
    }
    u8::try_from(value).ok()
}

/// Which built-in presentation a marker uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MarkerStyle {
    /// Image plus optional text label.
    #[default]
    Custom,
    /// Standard coloured pin.
    Pin,
    /// Teardrop badge with a label and fill.
    Teardrop,
}

impl MarkerStyle {
    /// Lowercase name used in logs and serialized records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Custom => "custom",
            Self::Pin => "pin",
            Self::Teardrop => "teardrop",
        }
    }
}

/// Colour choices for [`MarkerStyle::Pin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PinColor {
    /// Red pin.
    #[default]
    Red,
    /// Green pin.
    Green,
    /// Purple pin.
    Purple,
}

/// Text presentation for custom marker labels.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct TextStyle {
    /// Text colour as `#RRGGBB[AA]`.
    pub color: Option<String>,
    /// Font size in points.
    pub font_size: Option<f64>,
    /// Font weight name, for example `"bold"`.
    pub font_weight: Option<String>,
    /// Maximum number of lines; `0` means unlimited.
    pub number_of_lines: Option<u32>,
    /// Padding around the text.
    pub padding: Option<Point>,
    /// Background colour as `#RRGGBB[AA]`.
    pub background_color: Option<String>,
}

impl TextStyle {
    /// Text colour with black as the fallback.
    #[must_use]
    pub fn text_color(&self) -> Rgba {
        Rgba::parse_or(self.color.as_deref(), Rgba::BLACK, "textStyle.color")
    }
}

/// Resolved fill for a teardrop marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeardropFill {
    /// A concrete colour, either explicit or the documented default.
    Solid(Rgba),
    /// Colour derived by the host from a stable seed string.
    Seeded(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("#FF0000", Rgba::opaque(0xFF, 0, 0))]
    #[case("00ff00", Rgba::opaque(0, 0xFF, 0))]
    #[case("  #0000FF  ", Rgba::opaque(0, 0, 0xFF))]
    #[case("#11223344", Rgba { red: 0x11, green: 0x22, blue: 0x33, alpha: 0x44 })]
    fn parses_hex(#[case] input: &str, #[case] expected: Rgba) {
        assert_eq!(Rgba::from_hex(input), Ok(expected));
    }

    #[rstest]
    #[case("#FFF")]
    #[case("")]
    #[case("#1234567")]
    fn rejects_bad_length(#[case] input: &str) {
        assert!(matches!(
            Rgba::from_hex(input),
            Err(ColorParseError::InvalidLength { .. })
        ));
    }

    #[rstest]
    fn rejects_bad_digit() {
        assert!(matches!(
            Rgba::from_hex("#GG0000"),
            Err(ColorParseError::InvalidDigit { .. })
        ));
    }

    #[rstest]
    #[case(None)]
    #[case(Some("not a colour"))]
    fn parse_or_falls_back(#[case] input: Option<&str>) {
        assert_eq!(
            Rgba::parse_or(input, Rgba::TEARDROP_DEFAULT, "test"),
            Rgba::TEARDROP_DEFAULT
        );
    }

    #[rstest]
    fn packs_channels() {
        assert_eq!(Rgba::TEARDROP_DEFAULT.to_u32(), 0x5981_D8FF);
    }

    #[rstest]
    fn text_colour_defaults_to_black() {
        assert_eq!(TextStyle::default().text_color(), Rgba::BLACK);
    }
}
