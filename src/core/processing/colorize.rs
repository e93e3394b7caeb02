//! Palette styling for display and quick-look export.
//!
//! A [`VisParams`] maps a numeric display range onto a palette. Rendering goes
//! through a precomputed 256-entry lookup table: every defined value is
//! clamped to `[min, max]`, quantized to 8 bits and looked up, so the
//! per-pixel cost is one division and one table read.
use serde::{Deserialize, Serialize};

use crate::core::raster::Band;
use crate::error::{Error, Result};

/// RGB color with components in 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `RRGGBB`, `#RRGGBB` or a basic color name.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let named = match s.to_ascii_lowercase().as_str() {
            "black" => Some(Self::BLACK),
            "white" => Some(Self::WHITE),
            "red" => Some(Self::new(255, 0, 0)),
            "green" => Some(Self::new(0, 128, 0)),
            "blue" => Some(Self::new(0, 0, 255)),
            "yellow" => Some(Self::new(255, 255, 0)),
            "orange" => Some(Self::new(255, 165, 0)),
            "brown" => Some(Self::new(165, 42, 42)),
            "gray" | "grey" => Some(Self::new(128, 128, 128)),
            _ => None,
        };
        if let Some(c) = named {
            return Ok(c);
        }
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::invalid_argument("palette", s));
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
        match (channel(0), channel(2), channel(4)) {
            (Ok(r), Ok(g), Ok(b)) => Ok(Self::new(r, g, b)),
            _ => Err(Error::invalid_argument("palette", s)),
        }
    }

    fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round().clamp(0.0, 255.0) as u8;
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

/// Display styling: palette stretched linearly over `[min, max]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawVisParams")]
pub struct VisParams {
    palette: Vec<String>,
    min: f64,
    max: f64,
    #[serde(skip)]
    colors: Vec<Rgb>,
}

#[derive(Deserialize)]
struct RawVisParams {
    palette: PaletteSpec,
    min: f64,
    max: f64,
}

/// Palette as a list of colors or one comma-separated string.
#[derive(Deserialize)]
#[serde(untagged)]
enum PaletteSpec {
    List(Vec<String>),
    Joined(String),
}

impl TryFrom<RawVisParams> for VisParams {
    type Error = Error;

    fn try_from(raw: RawVisParams) -> Result<Self> {
        let palette = match raw.palette {
            PaletteSpec::List(list) => list,
            PaletteSpec::Joined(s) => split_palette(&s),
        };
        Self::new(&palette, raw.min, raw.max)
    }
}

fn split_palette(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

impl VisParams {
    pub fn new<S: AsRef<str>>(palette: &[S], min: f64, max: f64) -> Result<Self> {
        if palette.is_empty() {
            return Err(Error::invalid_argument("palette", "empty"));
        }
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(Error::invalid_argument("range", format!("[{min}, {max}]")));
        }
        let colors = palette
            .iter()
            .map(|c| Rgb::parse(c.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            palette: palette.iter().map(|c| c.as_ref().trim().to_string()).collect(),
            min,
            max,
            colors,
        })
    }

    /// Parse a comma-separated palette such as `"FF0000, 000000, 00FF00"`.
    pub fn from_palette_str(palette: &str, min: f64, max: f64) -> Result<Self> {
        Self::new(&split_palette(palette), min, max)
    }

    /// Red (loss) / black (no change) / green (gain) over [-0.3, 0.3].
    pub fn difference() -> Self {
        Self::builtin(
            &[("FF0000", Rgb::new(255, 0, 0)), ("000000", Rgb::BLACK), ("00FF00", Rgb::new(0, 255, 0))],
            -0.3,
            0.3,
        )
    }

    /// Yellow to green over [0, 1], for vegetation masks.
    pub fn vegetation() -> Self {
        Self::builtin(
            &[("yellow", Rgb::new(255, 255, 0)), ("green", Rgb::new(0, 128, 0))],
            0.0,
            1.0,
        )
    }

    fn builtin(entries: &[(&str, Rgb)], min: f64, max: f64) -> Self {
        Self {
            palette: entries.iter().map(|(name, _)| name.to_string()).collect(),
            min,
            max,
            colors: entries.iter().map(|(_, c)| *c).collect(),
        }
    }

    pub fn palette(&self) -> &[String] {
        &self.palette
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Color of `t` in [0, 1] along the palette.
    fn color_at(&self, t: f64) -> Rgb {
        let n = self.colors.len();
        if n == 1 {
            return self.colors[0];
        }
        let pos = t.clamp(0.0, 1.0) * (n - 1) as f64;
        let i = (pos.floor() as usize).min(n - 2);
        self.colors[i].lerp(self.colors[i + 1], pos - i as f64)
    }

    fn lut(&self) -> [Rgb; 256] {
        let mut lut = [Rgb::BLACK; 256];
        for (i, entry) in lut.iter_mut().enumerate() {
            *entry = self.color_at(i as f64 / 255.0);
        }
        lut
    }
}

/// Render `band` as interleaved RGB bytes; undefined pixels get `nodata`.
pub fn colorize_band(band: &Band, style: &VisParams, nodata: Rgb) -> Vec<u8> {
    let lut = style.lut();
    let span = style.max - style.min;
    let mut rgb = Vec::with_capacity(band.data.len() * 3);
    for v in band.data.iter() {
        let c = match v {
            Some(v) if v.is_finite() => {
                let t = ((v - style.min) / span).clamp(0.0, 1.0);
                lut[(t * 255.0).round() as usize]
            }
            _ => nodata,
        };
        rgb.extend_from_slice(&[c.r, c.g, c.b]);
    }
    rgb
}
