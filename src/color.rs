use image::Rgba;
use ratatui::style::Color;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Flake colour, written in configs as `#rrggbb`, `#rgb` or a basic name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticleColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ParticleColor {
    pub const WHITE: ParticleColor = ParticleColor::new(255, 255, 255);
    /// Flake shadow colour (`#555`)
    pub const SHADOW: ParticleColor = ParticleColor::new(0x55, 0x55, 0x55);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_terminal(self) -> Color {
        Color::Rgb(self.r, self.g, self.b)
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, 255])
    }

    pub fn from_rgba(px: Rgba<u8>) -> Self {
        Self::new(px[0], px[1], px[2])
    }
}

impl Default for ParticleColor {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for ParticleColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for ParticleColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            if !hex.is_ascii() {
                return Err(format!("Invalid hex colour: {}", s));
            }
            let digit = |i: usize, len: usize| {
                u8::from_str_radix(&hex[i..i + len], 16)
                    .map_err(|_| format!("Invalid hex colour: {}", s))
            };
            return match hex.len() {
                6 => Ok(Self::new(digit(0, 2)?, digit(2, 2)?, digit(4, 2)?)),
                // #rgb expands each nibble: #abc == #aabbcc
                3 => Ok(Self::new(digit(0, 1)? * 17, digit(1, 1)? * 17, digit(2, 1)? * 17)),
                _ => Err(format!("Invalid hex colour: {}", s)),
            };
        }

        match s.to_lowercase().as_str() {
            "white" => Ok(Self::WHITE),
            "snow" => Ok(Self::new(255, 250, 250)),
            "silver" => Ok(Self::new(192, 192, 192)),
            "gray" | "grey" => Ok(Self::new(128, 128, 128)),
            "lightblue" => Ok(Self::new(173, 216, 230)),
            "skyblue" => Ok(Self::new(135, 206, 235)),
            _ => Err(format!("Unknown colour: {}", s)),
        }
    }
}

impl Serialize for ParticleColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ParticleColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_long_hex() {
        let c: ParticleColor = "#1e90ff".parse().unwrap();
        assert_eq!(c, ParticleColor::new(0x1e, 0x90, 0xff));
    }

    #[test]
    fn test_parse_short_hex() {
        let c: ParticleColor = "#555".parse().unwrap();
        assert_eq!(c, ParticleColor::SHADOW);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("White".parse::<ParticleColor>().unwrap(), ParticleColor::WHITE);
        assert!("chartreuse-ish".parse::<ParticleColor>().is_err());
        assert!("#12".parse::<ParticleColor>().is_err());
        assert!("#gggggg".parse::<ParticleColor>().is_err());
    }

    #[test]
    fn test_display_is_lowercase_hex() {
        assert_eq!(ParticleColor::new(255, 0, 10).to_string(), "#ff000a");
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&ParticleColor::WHITE).unwrap();
        assert_eq!(json, "\"#ffffff\"");
        let back: ParticleColor = serde_json::from_str("\"#abc\"").unwrap();
        assert_eq!(back, ParticleColor::new(0xaa, 0xbb, 0xcc));
    }
}
