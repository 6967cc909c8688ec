//! Normalized rectangles and the primitives built from them.

use std::ops::Range;

/// Axis-aligned rectangle in the unit square of its parent layout.
///
/// Coordinates are fractions of the parent's width and height, so a shape
/// keeps its meaning when the parent is resized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutComponentShape {
    left_x: f64,
    top_y: f64,
    width: f64,
    height: f64,
}

impl LayoutComponentShape {
    /// Create a shape from its left/top corner and extent.
    pub fn new(left_x: f64, top_y: f64, width: f64, height: f64) -> Self {
        Self {
            left_x,
            top_y,
            width,
            height,
        }
    }

    /// Left edge
    pub fn left_x(&self) -> f64 {
        self.left_x
    }

    /// Top edge
    pub fn top_y(&self) -> f64 {
        self.top_y
    }

    /// Horizontal extent
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Vertical extent
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Whether the normalized point lies inside the shape, edges included.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left_x
            && x <= self.left_x + self.width
            && y >= self.top_y
            && y <= self.top_y + self.height
    }

    /// Pixel columns and rows covered in a `layout_width` x `layout_height` map.
    ///
    /// Edges are truncated to whole pixels and clamped to the map. Two shapes
    /// that share an edge value never leave a gap or overlap between them.
    pub fn pixel_bounds(&self, layout_width: u32, layout_height: u32) -> (Range<u32>, Range<u32>) {
        let columns = to_pixel(self.left_x, layout_width)
            ..to_pixel(self.left_x + self.width, layout_width);
        let rows =
            to_pixel(self.top_y, layout_height)..to_pixel(self.top_y + self.height, layout_height);
        (columns, rows)
    }
}

/// Absorbs accumulated rounding, e.g. ten additions of 0.1 land on 0.9999999999999999.
const PIXEL_EPSILON: f64 = 1e-6;

fn to_pixel(normalized: f64, dimension: u32) -> u32 {
    // Float-to-int `as` casts saturate and map NaN to 0.
    let pixel = (normalized * f64::from(dimension) + PIXEL_EPSILON).floor() as i64;
    pixel.clamp(0, i64::from(dimension)) as u32
}

/// A region of a layout that belongs entirely to one spectral class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutPrimitive {
    /// Covered region
    pub shape: LayoutComponentShape,
    /// Spectral class index (>= 0)
    pub class_index: i32,
}

impl LayoutPrimitive {
    /// Pair a shape with a class.
    pub fn new(shape: LayoutComponentShape, class_index: i32) -> Self {
        Self { shape, class_index }
    }
}
