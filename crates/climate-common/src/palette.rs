//! Colour palettes used for index visualization.

use serde::{Deserialize, Serialize};

use crate::error::{CommonError, CommonResult};

/// A colour stored as a validated hex string: "#RRGGBB" or "#RRGGBBAA".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(String);

impl Color {
    /// Parse a hex colour. The leading '#' is optional on input and always present on output.
    pub fn from_hex(s: &str) -> CommonResult<Self> {
        let digits = s.trim().trim_start_matches('#');
        let valid_len = digits.len() == 6 || digits.len() == 8;
        if !valid_len || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CommonError::InvalidColor(s.to_string()));
        }
        Ok(Self(format!("#{}", digits.to_ascii_lowercase())))
    }

    /// The normalized hex string.
    pub fn hex(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Color {
    type Error = CommonError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.0
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An ordered sequence of at least two colour stops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Palette(Vec<Color>);

impl Palette {
    pub fn new(stops: Vec<Color>) -> CommonResult<Self> {
        if stops.len() < 2 {
            return Err(CommonError::PaletteTooShort(stops.len()));
        }
        Ok(Self(stops))
    }

    /// Build a palette from hex strings.
    pub fn from_hex<S: AsRef<str>>(stops: &[S]) -> CommonResult<Self> {
        let colors = stops
            .iter()
            .map(|s| Color::from_hex(s.as_ref()))
            .collect::<CommonResult<Vec<_>>>()?;
        Self::new(colors)
    }

    pub fn stops(&self) -> &[Color] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Stops as plain hex strings, the form the compute service expects.
    pub fn to_hex_strings(&self) -> Vec<String> {
        self.0.iter().map(|c| c.hex().to_string()).collect()
    }
}

impl TryFrom<Vec<String>> for Palette {
    type Error = CommonError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        Palette::from_hex(&value)
    }
}

impl From<Palette> for Vec<String> {
    fn from(palette: Palette) -> Self {
        palette.0.into_iter().map(String::from).collect()
    }
}

/// Sequential blues, the fallback palette for custom indices.
pub fn default_palette() -> Palette {
    Palette(vec![
        Color("#deebf7".to_string()),
        Color("#9ecae1".to_string()),
        Color("#3182bd".to_string()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_normalizes_hex() {
        let c = Color::from_hex("B2182B").unwrap();
        assert_eq!(c.hex(), "#b2182b");
    }

    #[test]
    fn test_color_with_alpha() {
        let c = Color::from_hex("#00000080").unwrap();
        assert_eq!(c.hex(), "#00000080");
    }

    #[test]
    fn test_color_rejects_garbage() {
        assert!(Color::from_hex("#12345").is_err());
        assert!(Color::from_hex("#gggggg").is_err());
        assert!(Color::from_hex("blue").is_err());
    }

    #[test]
    fn test_palette_requires_two_stops() {
        let err = Palette::from_hex(&["#ffffff"]).unwrap_err();
        assert!(matches!(err, CommonError::PaletteTooShort(1)));
        assert!(Palette::from_hex(&["#ffffff", "#000000"]).is_ok());
    }

    #[test]
    fn test_palette_serde_as_string_list() {
        let palette = Palette::from_hex(&["#deebf7", "#3182bd"]).unwrap();
        let json = serde_json::to_string(&palette).unwrap();
        assert_eq!(json, r##"["#deebf7","#3182bd"]"##);

        let short: Result<Palette, _> = serde_json::from_str(r##"["#deebf7"]"##);
        assert!(short.is_err());
    }
}
