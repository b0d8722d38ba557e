//! CSS colours.
//!
//! Relationship colours and the configured background are free-form CSS
//! strings in the serialized model. [`Color`] parses them with the `color`
//! crate and writes them back as `#rrggbb` with a separate opacity, which
//! every SVG consumer (the PNG rasteriser included) understands.

use std::{fmt, str::FromStr};

use color::{AlphaColor, DynamicColor, Rgba8, Srgb};

/// A parsed CSS colour.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Color {
    color: DynamicColor,
}

impl Color {
    /// Parses a CSS colour such as `"#10b981"`, `"rgb(255, 0, 0)"` or `"red"`.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata_core::color::Color;
    ///
    /// let green = Color::new("#10b981").unwrap();
    /// assert_eq!(green.to_string(), "#10b981");
    /// assert!(Color::new("not-a-color").is_err());
    /// ```
    pub fn new(css: &str) -> Result<Self, String> {
        DynamicColor::from_str(css)
            .map(|color| Self { color })
            .map_err(|err| format!("invalid color `{css}`: {err}"))
    }

    /// An opaque sRGB colour.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            color: DynamicColor::from_alpha_color(AlphaColor::<Srgb>::from_rgb8(r, g, b)),
        }
    }

    fn rgba8(self) -> Rgba8 {
        self.color.to_alpha_color::<Srgb>().to_rgba8()
    }

    /// Opacity in `[0, 1]`.
    pub fn alpha(self) -> f32 {
        self.color.components[3]
    }

    /// A fragment usable inside an SVG `id`: the hex digits, plus the 8-bit
    /// alpha when the colour is translucent.
    ///
    /// ```
    /// # use strata_core::color::Color;
    /// assert_eq!(Color::new("#94A3B8").unwrap().id_fragment(), "94a3b8");
    /// assert_eq!(Color::new("rgba(0, 0, 0, 0)").unwrap().id_fragment(), "000000_00");
    /// ```
    pub fn id_fragment(self) -> String {
        let Rgba8 { r, g, b, a } = self.rgba8();
        if a == u8::MAX {
            format!("{r:02x}{g:02x}{b:02x}")
        } else {
            format!("{r:02x}{g:02x}{b:02x}_{a:02x}")
        }
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Writes `#rrggbb`; opacity is emitted separately via [`Color::alpha`].
impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Rgba8 { r, g, b, .. } = self.rgba8();
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_and_functional_forms() {
        assert_eq!(Color::new("red").unwrap().to_string(), "#ff0000");
        assert_eq!(Color::new("rgb(16, 185, 129)").unwrap().to_string(), "#10b981");
        assert_eq!("#F59E0B".parse::<Color>().unwrap().to_string(), "#f59e0b");
    }

    #[test]
    fn test_alpha() {
        assert!((Color::new("#10b981").unwrap().alpha() - 1.0).abs() < 0.001);
        assert!((Color::new("rgba(0, 0, 0, 0.25)").unwrap().alpha() - 0.25).abs() < 0.001);
    }

    #[test]
    fn test_from_rgb8_matches_parsed_hex() {
        let built = Color::from_rgb8(0x94, 0xa3, 0xb8);
        let parsed = Color::new("#94a3b8").unwrap();

        assert_eq!(built.to_string(), parsed.to_string());
        assert_eq!(built.id_fragment(), parsed.id_fragment());
    }

    #[test]
    fn test_id_fragment_is_id_safe() {
        for css in ["#3b82f6", "hsl(120 50% 50% / 0.3)", "rebeccapurple"] {
            let fragment = Color::new(css).unwrap().id_fragment();
            assert!(fragment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'), "{css}");
        }
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(Color::new("").is_err());
        assert!(Color::new("#12").is_err());
        assert!(Color::new("chartreuse-ish").is_err());
    }
}
