//! Class colors and their conversions.
//!
//! Colors only matter for visualising a layout; they never influence the
//! exported cube.

use std::fmt;
use std::str::FromStr;

use image::RgbImage;
use rand::Rng;

use crate::error::HsiError;
use crate::layout::ImageLayout;

/// An 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl Rgb {
    /// Pure white, used for the background class.
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    /// Pure black, used for pixels without a known class.
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    /// Create a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Convert HSV to RGB.
    ///
    /// # Arguments
    /// * `h` - Hue in degrees (0-360)
    /// * `s` - Saturation (0.0-1.0)
    /// * `v` - Value/brightness (0.0-1.0)
    pub fn from_hsv(h: f32, s: f32, v: f32) -> Self {
        let h = h.rem_euclid(360.0);
        let c = v * s;
        let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
        let m = v - c;

        let (r, g, b) = if h < 60.0 {
            (c, x, 0.0)
        } else if h < 120.0 {
            (x, c, 0.0)
        } else if h < 180.0 {
            (0.0, c, x)
        } else if h < 240.0 {
            (0.0, x, c)
        } else if h < 300.0 {
            (x, 0.0, c)
        } else {
            (c, 0.0, x)
        };

        let to_u8 = |channel: f32| ((channel + m).clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(to_u8(r), to_u8(g), to_u8(b))
    }

    /// Well separated color for the `index`-th class (golden-angle hue steps).
    pub fn palette(index: usize) -> Self {
        let hue = (index as f32 * 137.508) % 360.0;
        Self::from_hsv(hue, 0.65, 0.9)
    }

    /// A saturated color with a random hue.
    pub fn random() -> Self {
        let hue = rand::thread_rng().gen_range(0.0..360.0);
        Self::from_hsv(hue, 0.65, 0.9)
    }

    /// Channels as an array, e.g. for `image::Rgb`.
    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Lowercase `#rrggbb` form, as stored in project files.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = HsiError;

    /// Parse `#rrggbb` (the leading `#` is optional, case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(HsiError::invalid_format(format!(
                "Invalid color '{s}': expected #RRGGBB"
            )));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|_| HsiError::invalid_format(format!("Invalid color '{s}'")))
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

/// Colors index-aligned with the current spectrum list.
///
/// Ephemeral: rebuilt from the spectra whenever the view needs it and never
/// persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassColorMap {
    colors: Vec<Rgb>,
}

impl ClassColorMap {
    /// Create a color map from explicit colors.
    pub fn new(colors: Vec<Rgb>) -> Self {
        Self { colors }
    }

    /// Collect the representative color of each spectrum, in order.
    pub fn from_spectra(spectra: &[crate::spectrum::SpectrumModel]) -> Self {
        Self::new(spectra.iter().map(|s| s.color()).collect())
    }

    /// Number of colors.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Whether the map has no colors.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Color of `class_index`, if one is defined.
    pub fn color_for(&self, class_index: i32) -> Option<Rgb> {
        usize::try_from(class_index)
            .ok()
            .and_then(|i| self.colors.get(i))
            .copied()
    }

    /// Paint the active node of `layout` with the class colors.
    ///
    /// Pixels whose class has no color (including the sub-layout marker) are
    /// painted black; a single warning reports how many there were.
    pub fn render_rgb(&self, layout: &ImageLayout) -> RgbImage {
        let width = layout.width();
        let height = layout.height();
        let mut unknown = 0usize;
        let image = RgbImage::from_fn(width, height, |x, y| {
            let color = self
                .color_for(layout.class_at_pixel(x, y))
                .unwrap_or_else(|| {
                    unknown += 1;
                    Rgb::BLACK
                });
            image::Rgb(color.to_array())
        });
        if unknown > 0 {
            log::warn!(
                "Invalid colors: {} colors provided, {} pixels have no matching class color",
                self.colors.len(),
                unknown
            );
        }
        image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsv_primaries() {
        assert_eq!(Rgb::from_hsv(0.0, 1.0, 1.0), Rgb::new(255, 0, 0));
        assert_eq!(Rgb::from_hsv(120.0, 1.0, 1.0), Rgb::new(0, 255, 0));
        assert_eq!(Rgb::from_hsv(240.0, 1.0, 1.0), Rgb::new(0, 0, 255));
    }

    #[test]
    fn test_hex_round_trip() {
        let color = Rgb::new(0x12, 0xab, 0xff);
        assert_eq!(color.to_hex(), "#12abff");
        assert_eq!("#12ABFF".parse::<Rgb>().unwrap(), color);
        assert_eq!("12abff".parse::<Rgb>().unwrap(), color);
    }

    #[test]
    fn test_hex_rejects_garbage() {
        assert!("#12ab".parse::<Rgb>().is_err());
        assert!("#zzzzzz".parse::<Rgb>().is_err());
    }

    #[test]
    fn test_color_for_negative_index() {
        let map = ClassColorMap::new(vec![Rgb::WHITE]);
        assert_eq!(map.color_for(0), Some(Rgb::WHITE));
        assert_eq!(map.color_for(-1), None);
        assert_eq!(map.color_for(1), None);
    }

    #[test]
    fn test_render_rgb_marks_unknown_classes_black() {
        let mut layout = ImageLayout::new(4, 2);
        layout.add_layout_primitive(0.5, 0.0, 0.5, 1.0, 1);
        layout.render();

        let map = ClassColorMap::new(vec![Rgb::WHITE]);
        let image = map.render_rgb(&layout);
        assert_eq!(image.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(image.get_pixel(3, 1).0, [0, 0, 0]);
    }
}
