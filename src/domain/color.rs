//! Parsing and normalisation of `"R, G, B"` color triples.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

const CHANNEL_MAX: f64 = 255.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ColorError {
    #[error("expected three comma-separated values, found {parts}")]
    MalformedTriple { parts: usize },
    #[error("`{value}` is not a number")]
    NotANumber { value: String },
    #[error("{value} is outside 0-255")]
    OutOfRange { value: f64 },
}

/// A validated RGB triple. Channels keep the precision they were given.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RgbTriple {
    channels: [f64; 3],
}

impl RgbTriple {
    /// Split `raw` on commas and validate each channel.
    pub fn parse(raw: &str) -> Result<Self, ColorError> {
        let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(ColorError::MalformedTriple { parts: parts.len() });
        }

        let mut channels = [0.0; 3];
        for (slot, part) in channels.iter_mut().zip(&parts) {
            *slot = parse_channel(part)?;
        }

        Ok(Self { channels })
    }

    pub fn channels(&self) -> [f64; 3] {
        self.channels
    }

    /// Nearest 8-bit color.
    pub fn to_rgb8(&self) -> Rgb8 {
        let [r, g, b] = self.channels.map(quantize);
        Rgb8 { r, g, b }
    }

    /// `#RRGGBB` with uppercase digits.
    pub fn to_hex(&self) -> String {
        self.to_rgb8().to_hex()
    }
}

impl FromStr for RgbTriple {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RgbTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.channels;
        write!(f, "{r}, {g}, {b}")
    }
}

fn parse_channel(part: &str) -> Result<f64, ColorError> {
    let value: f64 = part.parse().map_err(|_| ColorError::NotANumber {
        value: part.to_string(),
    })?;
    if !value.is_finite() {
        return Err(ColorError::NotANumber {
            value: part.to_string(),
        });
    }
    if !(0.0..=CHANNEL_MAX).contains(&value) {
        return Err(ColorError::OutOfRange { value });
    }
    // Folds -0 into 0 so the canonical form never prints a sign.
    Ok(value + 0.0)
}

fn quantize(channel: f64) -> u8 {
    channel.clamp(0.0, CHANNEL_MAX).round() as u8
}

/// An 8-bit color as emitted into markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from floating point channels, clamping and rounding each one.
    pub fn from_channels(r: f64, g: f64, b: f64) -> Self {
        Self::new(quantize(r), quantize(g), quantize(b))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Linear interpolation per channel; `t` is clamped to `[0, 1]`.
    pub fn lerp(self, other: Rgb8, t: f64) -> Rgb8 {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| {
            let a = f64::from(a);
            let b = f64::from(b);
            a + (b - a) * t
        };
        Rgb8::from_channels(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
        )
    }

    /// Fully saturated, full value hue. `fraction` spans the circle over `[0, 1]`.
    pub fn from_hue(fraction: f64) -> Rgb8 {
        let sector_pos = fraction * 6.0;
        let x = 1.0 - ((sector_pos % 2.0) - 1.0).abs();
        let (r, g, b) = if sector_pos < 1.0 {
            (1.0, x, 0.0)
        } else if sector_pos < 2.0 {
            (x, 1.0, 0.0)
        } else if sector_pos < 3.0 {
            (0.0, 1.0, x)
        } else if sector_pos < 4.0 {
            (0.0, x, 1.0)
        } else if sector_pos < 5.0 {
            (x, 0.0, 1.0)
        } else {
            (1.0, 0.0, x)
        };
        Rgb8::from_channels(r * CHANNEL_MAX, g * CHANNEL_MAX, b * CHANNEL_MAX)
    }
}

impl fmt::Display for Rgb8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
