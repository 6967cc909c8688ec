//! Arena-stored layout nodes and how they paint into a class map.

use slotmap::new_key_type;

use crate::constants::{DEFAULT_CLASS_INDEX, SUB_LAYOUT_CLASS_INDEX};

use super::shape::{LayoutComponentShape, LayoutPrimitive};

new_key_type! {
    /// Handle of a layout node inside an [`ImageLayout`](super::ImageLayout).
    pub struct NodeId;
}

/// Per-pixel classification produced by the raster generators.
///
/// Stored at the resolution it was generated at and nearest-resampled when
/// the node is rendered at another size.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PixelFill {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) classes: Vec<i32>,
}

impl PixelFill {
    fn sample(&self, x: u32, y: u32, width: u32, height: u32) -> i32 {
        let source_x = nearest(x, width, self.width);
        let source_y = nearest(y, height, self.height);
        self.classes[(source_y as usize) * (self.width as usize) + source_x as usize]
    }
}

/// Maps `index` in a `target` sized axis onto a `source` sized axis.
pub(crate) fn nearest(index: u32, target: u32, source: u32) -> u32 {
    if target == source {
        return index;
    }
    let scaled = u64::from(index) * u64::from(source) / u64::from(target.max(1));
    (scaled as u32).min(source.saturating_sub(1))
}

/// One node of the layout tree.
#[derive(Debug, Clone)]
pub(crate) struct LayoutNode {
    pub(crate) width: u32,
    pub(crate) height: u32,
    /// Painted in order; later primitives win on overlap.
    pub(crate) primitives: Vec<LayoutPrimitive>,
    pub(crate) sub_layouts: Vec<(LayoutComponentShape, NodeId)>,
    pub(crate) pixel_fill: Option<PixelFill>,
    pub(crate) class_map: Vec<i32>,
}

impl LayoutNode {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            primitives: Vec::new(),
            sub_layouts: Vec::new(),
            pixel_fill: None,
            class_map: vec![DEFAULT_CLASS_INDEX; num_pixels(width, height)],
        }
    }

    pub(crate) fn num_pixels(&self) -> usize {
        num_pixels(self.width, self.height)
    }

    pub(crate) fn map_index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + x as usize
    }

    /// Base classes plus primitives, before any sub-layout is painted.
    pub(crate) fn paint_base(&self) -> Vec<i32> {
        let mut map = match &self.pixel_fill {
            Some(fill) if !fill.classes.is_empty() => {
                let mut map = Vec::with_capacity(self.num_pixels());
                for y in 0..self.height {
                    for x in 0..self.width {
                        map.push(fill.sample(x, y, self.width, self.height));
                    }
                }
                map
            }
            _ => vec![DEFAULT_CLASS_INDEX; self.num_pixels()],
        };
        for primitive in &self.primitives {
            self.fill_region(&mut map, &primitive.shape, |_, _| primitive.class_index);
        }
        map
    }

    /// The node's own class map, with sub-layout regions marked as such.
    pub(crate) fn paint(&self) -> Vec<i32> {
        let mut map = self.paint_base();
        for (shape, _) in &self.sub_layouts {
            self.fill_region(&mut map, shape, |_, _| SUB_LAYOUT_CLASS_INDEX);
        }
        map
    }

    /// Fill `shape`'s pixels, passing region-relative coordinates to `class_at`.
    pub(crate) fn fill_region(
        &self,
        map: &mut [i32],
        shape: &LayoutComponentShape,
        mut class_at: impl FnMut(u32, u32) -> i32,
    ) {
        let (columns, rows) = shape.pixel_bounds(self.width, self.height);
        for y in rows.clone() {
            for x in columns.clone() {
                let index = self.map_index(x, y);
                map[index] = class_at(x - columns.start, y - rows.start);
            }
        }
    }
}

pub(crate) fn num_pixels(width: u32, height: u32) -> usize {
    (width as usize) * (height as usize)
}
