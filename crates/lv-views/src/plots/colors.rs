//! Color utilities for plots

use egui::Color32;

/// Category palette, cycled when a dimension has more categories
const PALETTE: &[Color32] = &[
    Color32::from_rgb(0x1f, 0x77, 0xb4), // Blue
    Color32::from_rgb(0x2c, 0xa0, 0x2c), // Green
    Color32::from_rgb(0xff, 0x7f, 0x0e), // Orange
];

/// Neutral color for elements without a category
pub const NEUTRAL: Color32 = Color32::from_rgb(105, 179, 162);

/// Get a categorical color from the palette
pub fn categorical_color(index: usize) -> Color32 {
    PALETTE[index % PALETTE.len()]
}

/// Convert an RGBA quadruple from a config file
pub fn color_from_rgba(rgba: [u8; 4]) -> Color32 {
    Color32::from_rgba_unmultiplied(rgba[0], rgba[1], rgba[2], rgba[3])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_cycles() {
        assert_eq!(categorical_color(0), Color32::from_rgb(31, 119, 180));
        assert_eq!(categorical_color(3), categorical_color(0));
        assert_eq!(color_from_rgba([1, 2, 3, 255]), Color32::from_rgb(1, 2, 3));
    }
}
