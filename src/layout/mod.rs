//! Spatial layout of spectral classes.
//!
//! This module provides:
//! - `ImageLayout`: a recursive, arena-backed pixel-to-class mapping
//! - `LayoutComponentShape` / `LayoutPrimitive`: normalized building blocks
//! - Procedural generators (stripes, grid, random blobs, image-derived)
//!
//! ## Sub-layouts
//!
//! A sub-layout is an independently sized layout nested in a region of its
//! parent. `ImageLayout::render` marks such regions with
//! [`SUB_LAYOUT_CLASS_INDEX`](crate::constants::SUB_LAYOUT_CLASS_INDEX);
//! `ImageLayout::render_composited` paints the nested content instead.
//!
//! ```rust,ignore
//! use hsigen::layout::ImageLayout;
//!
//! let mut layout = ImageLayout::new(200, 100);
//! layout.generate_horizontal_stripes_layout(3, 0.0);
//! layout.add_sub_layout(0.5, 0.5, 0.5, 0.5);
//! layout.zoom_in_to_sub_layout(0.75, 0.75);
//! layout.generate_random_layout(3, 40);
//! layout.zoom_out_to_root();
//! let classes = layout.render_composited();
//! ```

mod engine;
mod generate;
mod node;
mod shape;

use std::path::Path;

use image::DynamicImage;

use crate::error::Result;

pub use engine::{ImageLayout, LayoutView};
pub use generate::{appropriate_shape_size, intensity_class};
pub use node::NodeId;
pub use shape::{LayoutComponentShape, LayoutPrimitive};

/// Load an image to use with `ImageLayout::generate_layout_from_image`.
pub fn load_layout_image(path: &Path) -> Result<DynamicImage> {
    let image = image::open(path)?;
    log::debug!(
        "Loaded layout image {:?} ({}x{})",
        path,
        image.width(),
        image.height()
    );
    Ok(image)
}
