//! Color palette and dimming for switch LEDs and display labels.
//!
//! Colors are plain [`Rgb888`] values. A [`ColorValue`] is either one
//! color or a list of segment colors (used for labels split into several
//! colored areas, e.g. a switch controlling two effect slots).

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use heapless::Vec;

/// Maximum number of segments in a multi-segment [`ColorValue`].
pub const MAX_COLOR_SEGMENTS: usize = 4;

pub const WHITE: Rgb888 = Rgb888::new(255, 255, 255);
pub const YELLOW: Rgb888 = Rgb888::new(255, 255, 0);
pub const DARK_YELLOW: Rgb888 = Rgb888::new(130, 130, 0);
pub const ORANGE: Rgb888 = Rgb888::new(255, 125, 0);
pub const RED: Rgb888 = Rgb888::new(255, 0, 0);
pub const LIGHT_RED: Rgb888 = Rgb888::new(255, 100, 100);
pub const PINK: Rgb888 = Rgb888::new(255, 125, 70);
pub const PURPLE: Rgb888 = Rgb888::new(180, 0, 120);
pub const DARK_PURPLE: Rgb888 = Rgb888::new(100, 0, 65);
pub const LIGHT_GREEN: Rgb888 = Rgb888::new(100, 255, 100);
pub const GREEN: Rgb888 = Rgb888::new(0, 255, 0);
pub const DARK_GREEN: Rgb888 = Rgb888::new(73, 110, 41);
pub const TURQUOISE: Rgb888 = Rgb888::new(64, 242, 208);
pub const BLUE: Rgb888 = Rgb888::new(0, 0, 255);
pub const LIGHT_BLUE: Rgb888 = Rgb888::new(100, 100, 255);
pub const DARK_BLUE: Rgb888 = Rgb888::new(0, 0, 120);
pub const GRAY: Rgb888 = Rgb888::new(190, 190, 190);
pub const DARK_GRAY: Rgb888 = Rgb888::new(50, 50, 50);
pub const BLACK: Rgb888 = Rgb888::new(0, 0, 0);

/// Default background color for display labels.
pub const DEFAULT_LABEL_COLOR: Rgb888 = DARK_GRAY;

/// Default color for switch LEDs.
pub const DEFAULT_SWITCH_COLOR: Rgb888 = WHITE;

/// A single color or an ordered list of segment colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorValue {
    Single(Rgb888),
    Segments(Vec<Rgb888, MAX_COLOR_SEGMENTS>),
}

impl Default for ColorValue {
    fn default() -> Self {
        ColorValue::Single(DEFAULT_SWITCH_COLOR)
    }
}

impl From<Rgb888> for ColorValue {
    fn from(color: Rgb888) -> Self {
        ColorValue::Single(color)
    }
}

impl ColorValue {
    /// Build a multi-segment color. Segments beyond
    /// [`MAX_COLOR_SEGMENTS`] are dropped.
    pub fn segments(colors: &[Rgb888]) -> Self {
        let mut segments = Vec::new();
        for &c in colors.iter().take(MAX_COLOR_SEGMENTS) {
            // Cannot fail, the iterator is bounded by the capacity.
            let _ = segments.push(c);
        }
        ColorValue::Segments(segments)
    }

    /// First (or only) color, used where a surface can show just one.
    pub fn primary(&self) -> Rgb888 {
        match self {
            ColorValue::Single(c) => *c,
            ColorValue::Segments(s) => s.first().copied().unwrap_or(BLACK),
        }
    }

    /// Dim every channel of every segment by `factor`.
    pub fn dim(&self, factor: f32) -> Self {
        match self {
            ColorValue::Single(c) => ColorValue::Single(dim_color(*c, factor)),
            ColorValue::Segments(s) => {
                ColorValue::Segments(s.iter().map(|&c| dim_color(c, factor)).collect())
            }
        }
    }
}

/// Scale each channel linearly by `factor`, truncating towards zero.
///
/// Channels are clamped to `0..=255`, so factors above 1 saturate
/// instead of wrapping.
pub fn dim_color(color: Rgb888, factor: f32) -> Rgb888 {
    Rgb888::new(
        scale_channel(color.r(), factor),
        scale_channel(color.g(), factor),
        scale_channel(color.b(), factor),
    )
}

fn scale_channel(channel: u8, factor: f32) -> u8 {
    // `as` truncates and saturates for f32 -> u8.
    (channel as f32 * factor) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dim_single_truncates() {
        let c = dim_color(Rgb888::new(255, 125, 3), 0.2);
        // 51.0, 25.0, 0.6
        assert_eq!(c, Rgb888::new(51, 25, 0));
    }

    #[test]
    fn dim_by_one_is_identity() {
        assert_eq!(dim_color(PURPLE, 1.0), PURPLE);
    }

    #[test]
    fn dim_by_zero_is_black() {
        assert_eq!(dim_color(WHITE, 0.0), BLACK);
    }

    #[test]
    fn dim_above_one_saturates() {
        assert_eq!(dim_color(Rgb888::new(200, 10, 0), 2.0), Rgb888::new(255, 20, 0));
    }

    #[test]
    fn dim_color_value_single() {
        let c = ColorValue::Single(Rgb888::new(100, 50, 25)).dim(0.5);
        assert_eq!(c, ColorValue::Single(Rgb888::new(50, 25, 12)));
    }

    #[test]
    fn dim_color_value_segments_independently() {
        let c = ColorValue::segments(&[Rgb888::new(10, 20, 30), Rgb888::new(255, 0, 99)]).dim(0.3);
        assert_eq!(
            c,
            ColorValue::segments(&[Rgb888::new(3, 6, 9), Rgb888::new(76, 0, 29)])
        );
    }

    #[test]
    fn segments_are_capped() {
        let c = ColorValue::segments(&[RED, GREEN, BLUE, WHITE, BLACK]);
        match c {
            ColorValue::Segments(s) => assert_eq!(s.len(), MAX_COLOR_SEGMENTS),
            ColorValue::Single(_) => panic!("expected segments"),
        }
    }

    #[test]
    fn primary_color() {
        assert_eq!(ColorValue::Single(RED).primary(), RED);
        assert_eq!(ColorValue::segments(&[GREEN, RED]).primary(), GREEN);
        assert_eq!(ColorValue::segments(&[]).primary(), BLACK);
    }
}
