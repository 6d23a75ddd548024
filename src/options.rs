use clap::ValueEnum;
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// PDF points per page unit. Layout works in the "px" unit of the classic
/// browser PDF writers, where one px is 4/3 pt, so an A4 page is
/// 446.46 x 631.42 units.
pub const PT_PER_UNIT: f64 = 96.0 / 72.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    Legal,
    A3,
}

impl PageSize {
    pub fn dimensions_pt(self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::A3 => (841.89, 1190.55),
        }
    }

    /// page size in layout units
    pub fn dimensions(self) -> (f64, f64) {
        let (w, h) = self.dimensions_pt();
        (w / PT_PER_UNIT, h / PT_PER_UNIT)
    }
}

/// uniform page margin, applied to all four sides
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum MarginPreset {
    #[default]
    #[value(name = "no-margin", alias = "none")]
    None,
    #[value(name = "low-margin", alias = "low")]
    Low,
    #[value(name = "medium-margin", alias = "medium")]
    Medium,
    #[value(name = "big-margin", alias = "big")]
    Big,
}

impl MarginPreset {
    /// margin in layout units
    pub fn pixels(self) -> f64 {
        match self {
            MarginPreset::None => 0.0,
            MarginPreset::Low => 10.0,
            MarginPreset::Medium => 30.0,
            MarginPreset::Big => 70.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MarginPreset::None => "No Margin",
            MarginPreset::Low => "Low Margin",
            MarginPreset::Medium => "Medium Margin",
            MarginPreset::Big => "Big Margin",
        }
    }
}

impl fmt::Display for MarginPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 8-bit RGB colour, written as `#rrggbb`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Rgb {
        Rgb { r, g, b }
    }

    /// components scaled to 0.0..=1.0, as used by the PDF `rg` operator
    pub fn unit_components(self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Rgb::WHITE
    }
}

impl FromStr for Rgb {
    type Err = ConfigError;

    /// accepts `#rrggbb`, `rrggbb` and the `#rgb` shorthand
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidColour(s.to_string());
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        // from_str_radix alone would let a leading '+' through
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());
        match hex.len() {
            6 => Ok(Rgb::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => {
                // #abc expands to #aabbcc
                let short = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
                Ok(Rgb::new(short(0)?, short(1)?, short(2)?))
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// settings for one conversion run; fixed for its whole duration
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConvertOptions {
    pub margin: MarginPreset,
    pub background: Rgb,
    pub page_size: PageSize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_dimensions() {
        let (w, h) = PageSize::A4.dimensions_pt();
        assert!((w - 595.28).abs() < 0.01);
        assert!((h - 841.89).abs() < 0.01);

        let (w, h) = PageSize::Letter.dimensions_pt();
        assert!((w - 612.0).abs() < 0.01);
        assert!((h - 792.0).abs() < 0.01);

        let (w, h) = PageSize::Legal.dimensions_pt();
        assert!((w - 612.0).abs() < 0.01);
        assert!((h - 1008.0).abs() < 0.01);

        let (w, h) = PageSize::A3.dimensions_pt();
        assert!((w - 841.89).abs() < 0.01);
        assert!((h - 1190.55).abs() < 0.01);
    }

    #[test]
    fn a4_in_layout_units() {
        let (w, h) = PageSize::A4.dimensions();
        assert!((w - 446.46).abs() < 0.01);
        assert!((h - 631.4175).abs() < 0.01);
    }

    #[test]
    fn page_size_portrait_orientation() {
        for ps in [PageSize::A4, PageSize::Letter, PageSize::Legal, PageSize::A3] {
            let (w, h) = ps.dimensions();
            assert!(h > w);
        }
    }

    #[test]
    fn margin_table() {
        assert_eq!(MarginPreset::None.pixels(), 0.0);
        assert_eq!(MarginPreset::Low.pixels(), 10.0);
        assert_eq!(MarginPreset::Medium.pixels(), 30.0);
        assert_eq!(MarginPreset::Big.pixels(), 70.0);
        assert_eq!(MarginPreset::default(), MarginPreset::None);
    }

    #[test]
    fn margin_labels_are_distinct() {
        let labels: Vec<_> = MarginPreset::value_variants()
            .iter()
            .map(|m| m.label())
            .collect();
        let mut deduped = labels.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), labels.len());
    }

    #[test]
    fn margin_cli_names_and_aliases() {
        assert_eq!(
            MarginPreset::from_str("medium-margin", true).unwrap(),
            MarginPreset::Medium
        );
        assert_eq!(MarginPreset::from_str("big", true).unwrap(), MarginPreset::Big);
        assert!(MarginPreset::from_str("huge", true).is_err());
    }

    #[test]
    fn rgb_parse_long_form() {
        assert_eq!("#ffffff".parse::<Rgb>().unwrap(), Rgb::WHITE);
        assert_eq!("#1a2B3c".parse::<Rgb>().unwrap(), Rgb::new(0x1a, 0x2b, 0x3c));
        assert_eq!("000000".parse::<Rgb>().unwrap(), Rgb::new(0, 0, 0));
    }

    #[test]
    fn rgb_parse_shorthand() {
        assert_eq!("#f80".parse::<Rgb>().unwrap(), Rgb::new(0xff, 0x88, 0x00));
    }

    #[test]
    fn rgb_parse_errors() {
        for bad in [
            "", "#", "#ffff", "#gggggg", "#ff ff f", "#ffé", "#+f+f+f", "+1+2+3", "-1-2-3",
        ] {
            assert!(bad.parse::<Rgb>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn rgb_display_roundtrips_lowercase() {
        let c = Rgb::new(0xAB, 0x01, 0xFF);
        assert_eq!(c.to_string(), "#ab01ff");
    }

    #[test]
    fn rgb_unit_components() {
        let (r, g, b) = Rgb::new(255, 0, 51).unit_components();
        assert_eq!(r, 1.0);
        assert_eq!(g, 0.0);
        assert!((b - 0.2).abs() < 1e-6);
    }
}
