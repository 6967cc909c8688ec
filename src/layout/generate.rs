//! Procedural layout generators.
//!
//! Every generator resets the active node, fills it, and renders. Stripe and
//! grid generators emit primitives, so their output rescales with the image;
//! the random and image generators produce a per-pixel fill.

use image::DynamicImage;
use image::imageops::FilterType;
use rand::Rng;

use crate::constants::{DEFAULT_CLASS_INDEX, DEFAULT_MAX_PRIMITIVE_SIZE};

use super::engine::ImageLayout;
use super::node::PixelFill;

/// Returns the stripe/square size to use for `num_classes` classes.
///
/// A requested size in `(0, 1]` is used as is. Anything else selects the
/// default size, shrunk if needed so every class fits at least once.
pub fn appropriate_shape_size(requested: f64, num_classes: usize) -> f64 {
    if requested > 0.0 && requested <= 1.0 {
        return requested;
    }
    let fitted = 1.0 / num_classes.max(1) as f64;
    DEFAULT_MAX_PRIMITIVE_SIZE.min(fitted)
}

/// True while a fill fraction has not reached the end of the unit interval.
fn remaining(filled: f64) -> bool {
    1.0 - filled > f64::EPSILON
}

fn class_of(counter: usize, num_classes: usize) -> i32 {
    i32::try_from(counter % num_classes).unwrap_or(i32::MAX)
}

impl ImageLayout {
    fn check_num_classes(num_classes: usize, generator: &str) -> bool {
        if num_classes == 0 {
            log::warn!("{generator} layout needs at least one class; layout unchanged");
            return false;
        }
        true
    }

    /// Full-width stripes from top to bottom, cycling through the classes.
    ///
    /// `stripe_size` is a fraction of the height; `0` or an out-of-range value
    /// picks [`appropriate_shape_size`].
    pub fn generate_horizontal_stripes_layout(&mut self, num_classes: usize, stripe_size: f64) {
        if !Self::check_num_classes(num_classes, "Horizontal stripe") {
            return;
        }
        self.reset_layout();
        let stripe_height = appropriate_shape_size(stripe_size, num_classes);
        let mut stripe_counter = 0;
        let mut height_filled = 0.0;
        while remaining(height_filled) {
            let class_index = class_of(stripe_counter, num_classes);
            self.add_layout_primitive(0.0, height_filled, 1.0, stripe_height, class_index);
            height_filled += stripe_height;
            stripe_counter += 1;
        }
        log::info!(
            "Generated {} horizontal stripes for {} classes",
            stripe_counter,
            num_classes
        );
        self.render();
    }

    /// Full-height stripes from left to right, cycling through the classes.
    pub fn generate_vertical_stripes_layout(&mut self, num_classes: usize, stripe_size: f64) {
        if !Self::check_num_classes(num_classes, "Vertical stripe") {
            return;
        }
        self.reset_layout();
        let stripe_width = appropriate_shape_size(stripe_size, num_classes);
        let mut stripe_counter = 0;
        let mut width_filled = 0.0;
        while remaining(width_filled) {
            let class_index = class_of(stripe_counter, num_classes);
            self.add_layout_primitive(width_filled, 0.0, stripe_width, 1.0, class_index);
            width_filled += stripe_width;
            stripe_counter += 1;
        }
        log::info!(
            "Generated {} vertical stripes for {} classes",
            stripe_counter,
            num_classes
        );
        self.render();
    }

    /// Square tiles, row by row.
    ///
    /// Each row starts `num_classes / 2` classes further along than the one
    /// above it, which gives a diagonal, brick-like offset rather than a
    /// plain checkerboard.
    pub fn generate_grid_layout(&mut self, num_classes: usize, square_size: f64) {
        if !Self::check_num_classes(num_classes, "Grid") {
            return;
        }
        self.reset_layout();
        let square_size = appropriate_shape_size(square_size, num_classes);
        let mut row_counter = 0;
        let mut height_filled = 0.0;
        let mut num_squares = 0usize;
        while remaining(height_filled) {
            let mut col_counter = row_counter;
            let mut width_filled = 0.0;
            while remaining(width_filled) {
                let class_index = class_of(col_counter, num_classes);
                self.add_layout_primitive(
                    width_filled,
                    height_filled,
                    square_size,
                    square_size,
                    class_index,
                );
                width_filled += square_size;
                col_counter += 1;
                num_squares += 1;
            }
            height_filled += square_size;
            row_counter += num_classes / 2;
        }
        log::info!("Generated {} grid squares for {} classes", num_squares, num_classes);
        self.render();
    }

    /// Random connected blobs of up to `blob_size` pixels, each a uniformly
    /// random class, until every pixel is assigned.
    ///
    /// A blob grows from a random unassigned pixel by repeatedly picking one
    /// of its edge pixels and claiming a random unassigned 4-neighbour. A
    /// `blob_size` of 1 (or 0) gives per-pixel noise.
    pub fn generate_random_layout(&mut self, num_classes: usize, blob_size: usize) {
        if !Self::check_num_classes(num_classes, "Random") {
            return;
        }
        self.reset_layout();
        let width = self.width();
        let height = self.height();
        let classes = random_blobs(&mut self.rng, width, height, num_classes, blob_size.max(1));
        self.active_node_mut().pixel_fill = Some(PixelFill {
            width,
            height,
            classes,
        });
        log::info!(
            "Generated {}x{} random layout (blob size {}, {} classes)",
            width,
            height,
            blob_size,
            num_classes
        );
        self.render();
    }

    /// Classes from an image's brightness.
    ///
    /// The image is scaled to the active node's size and converted to
    /// grayscale; the 0-255 range is split into `num_classes` equal bins and
    /// each pixel gets its bin index.
    pub fn generate_layout_from_image(&mut self, num_classes: usize, image: &DynamicImage) {
        if !Self::check_num_classes(num_classes, "Image") {
            return;
        }
        self.reset_layout();
        let width = self.width();
        let height = self.height();
        if width == 0 || height == 0 || image.width() == 0 || image.height() == 0 {
            log::warn!(
                "Cannot map a {}x{} image onto a {}x{} layout",
                image.width(),
                image.height(),
                width,
                height
            );
            self.render();
            return;
        }

        let gray = image::imageops::resize(&image.to_luma8(), width, height, FilterType::Triangle);
        let classes = gray
            .pixels()
            .map(|pixel| intensity_class(pixel[0], num_classes))
            .collect();
        self.active_node_mut().pixel_fill = Some(PixelFill {
            width,
            height,
            classes,
        });
        log::info!(
            "Generated {}x{} layout from {}x{} image ({} classes)",
            width,
            height,
            image.width(),
            image.height(),
            num_classes
        );
        self.render();
    }
}

/// Equal-width intensity bin of `gray` among `num_classes` bins.
pub fn intensity_class(gray: u8, num_classes: usize) -> i32 {
    class_of(usize::from(gray) * num_classes / 256, num_classes)
}

/// Tracks unassigned pixels with O(1) random pick and removal.
struct Unfilled {
    pending: Vec<usize>,
    /// Position of each pixel in `pending`, `usize::MAX` once filled.
    slot: Vec<usize>,
}

impl Unfilled {
    fn new(num_pixels: usize) -> Self {
        Self {
            pending: (0..num_pixels).collect(),
            slot: (0..num_pixels).collect(),
        }
    }

    fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn contains(&self, pixel: usize) -> bool {
        self.slot[pixel] != usize::MAX
    }

    fn pick(&self, rng: &mut impl Rng) -> usize {
        self.pending[rng.gen_range(0..self.pending.len())]
    }

    fn remove(&mut self, pixel: usize) {
        let position = self.slot[pixel];
        self.pending.swap_remove(position);
        if let Some(&moved) = self.pending.get(position) {
            self.slot[moved] = position;
        }
        self.slot[pixel] = usize::MAX;
    }
}

fn random_blobs(
    rng: &mut impl Rng,
    width: u32,
    height: u32,
    num_classes: usize,
    blob_size: usize,
) -> Vec<i32> {
    let width = width as usize;
    let height = height as usize;
    let mut classes = vec![DEFAULT_CLASS_INDEX; width * height];
    let mut unfilled = Unfilled::new(width * height);

    let neighbors = |pixel: usize| {
        let (row, col) = (pixel / width, pixel % width);
        [
            (col > 0).then(|| pixel - 1),
            (col + 1 < width).then(|| pixel + 1),
            (row > 0).then(|| pixel - width),
            (row + 1 < height).then(|| pixel + width),
        ]
    };

    let mut candidates = Vec::with_capacity(4);
    while !unfilled.is_empty() {
        let class_index = class_of(rng.gen_range(0..num_classes), num_classes);
        let start = unfilled.pick(&mut *rng);
        unfilled.remove(start);
        classes[start] = class_index;

        let mut edge_pixels = vec![start];
        let mut blob_pixels = 1;
        while blob_pixels < blob_size && !unfilled.is_empty() && !edge_pixels.is_empty() {
            let edge_index = rng.gen_range(0..edge_pixels.len());
            candidates.clear();
            candidates.extend(
                neighbors(edge_pixels[edge_index])
                    .into_iter()
                    .flatten()
                    .filter(|&p| unfilled.contains(p)),
            );
            if candidates.is_empty() {
                // Fully enclosed; it can never grow the blob again.
                edge_pixels.swap_remove(edge_index);
                continue;
            }
            let next = candidates[rng.gen_range(0..candidates.len())];
            unfilled.remove(next);
            classes[next] = class_index;
            edge_pixels.push(next);
            blob_pixels += 1;
        }
    }
    classes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_appropriate_shape_size() {
        assert_eq!(appropriate_shape_size(0.25, 3), 0.25);
        assert_eq!(appropriate_shape_size(1.0, 3), 1.0);
        assert_eq!(appropriate_shape_size(0.0, 3), 0.1);
        assert_eq!(appropriate_shape_size(1.5, 20), 0.05);
        assert_eq!(appropriate_shape_size(-1.0, 4), 0.1);
    }

    #[test]
    fn test_horizontal_stripes_follow_rows() {
        let mut layout = ImageLayout::new(10, 100);
        layout.generate_horizontal_stripes_layout(3, 0.1);

        assert_eq!(layout.primitives().len(), 10);
        for y in 0..100 {
            let expected = ((y / 10) % 3) as i32;
            for x in 0..10 {
                assert_eq!(layout.class_at_pixel(x, y), expected, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_horizontal_stripes_cover_every_class() {
        let mut layout = ImageLayout::new(20, 50);
        layout.generate_horizontal_stripes_layout(4, 0.2);
        let seen: HashSet<i32> = layout.class_map().iter().copied().collect();
        assert_eq!(seen, (0..4).collect());
    }

    #[test]
    fn test_vertical_stripes_follow_columns() {
        let mut layout = ImageLayout::new(40, 5);
        layout.generate_vertical_stripes_layout(2, 0.25);

        assert_eq!(layout.primitives().len(), 4);
        for x in 0..40 {
            let expected = ((x / 10) % 2) as i32;
            assert_eq!(layout.class_at_pixel(x, 4), expected, "column {x}");
        }
    }

    #[test]
    fn test_default_stripe_size_fits_many_classes() {
        let mut layout = ImageLayout::new(10, 40);
        layout.generate_horizontal_stripes_layout(20, 0.0);
        let seen: HashSet<i32> = layout.class_map().iter().copied().collect();
        assert_eq!(seen.len(), 20);
    }

    #[test]
    fn test_grid_rows_shift_by_half_the_classes() {
        // Intentional: rows advance by num_classes / 2, not by one.
        let mut layout = ImageLayout::new(4, 4);
        layout.generate_grid_layout(4, 0.25);

        #[rustfmt::skip]
        let expected = vec![
            0, 1, 2, 3,
            2, 3, 0, 1,
            0, 1, 2, 3,
            2, 3, 0, 1,
        ];
        assert_eq!(layout.class_map(), expected.as_slice());
    }

    #[test]
    fn test_grid_with_one_class_is_uniform() {
        let mut layout = ImageLayout::new(8, 8);
        layout.generate_grid_layout(1, 0.5);
        assert!(layout.class_map().iter().all(|&c| c == 0));
    }

    #[test]
    fn test_zero_classes_leave_layout_unchanged() {
        let mut layout = ImageLayout::new(4, 4);
        layout.add_layout_primitive(0.0, 0.0, 1.0, 1.0, 1);
        layout.generate_grid_layout(0, 0.5);
        layout.generate_random_layout(0, 3);
        assert_eq!(layout.primitives().len(), 1);
    }

    #[test]
    fn test_random_layout_assigns_valid_classes() {
        let mut layout = ImageLayout::with_seed(30, 20, 7);
        layout.generate_random_layout(5, 25);
        assert_eq!(layout.class_map().len(), 600);
        assert!(layout.class_map().iter().all(|&c| (0..5).contains(&c)));
    }

    #[test]
    fn test_random_layout_is_reproducible_with_seed() {
        let mut first = ImageLayout::with_seed(16, 16, 42);
        let mut second = ImageLayout::with_seed(16, 16, 42);
        first.generate_random_layout(3, 10);
        second.generate_random_layout(3, 10);
        assert_eq!(first.class_map(), second.class_map());
    }

    #[test]
    fn test_single_blob_fills_image() {
        // With one blob as large as the image, every pixel shares one class.
        let mut layout = ImageLayout::with_seed(12, 9, 1);
        layout.generate_random_layout(6, 12 * 9);
        let first = layout.class_map()[0];
        assert!(layout.class_map().iter().all(|&c| c == first));
    }

    #[test]
    fn test_random_layout_survives_resize() {
        let mut layout = ImageLayout::with_seed(10, 10, 9);
        layout.generate_random_layout(4, 5);
        layout.set_image_size(20, 20);
        assert_eq!(layout.class_map().len(), 400);
        assert_eq!(layout.class_at_pixel(0, 0), layout.class_at_pixel(1, 1));
    }

    #[test]
    fn test_intensity_bins() {
        assert_eq!(intensity_class(0, 4), 0);
        assert_eq!(intensity_class(63, 4), 0);
        assert_eq!(intensity_class(64, 4), 1);
        assert_eq!(intensity_class(255, 4), 3);
        assert_eq!(intensity_class(255, 1), 0);
    }

    #[test]
    fn test_layout_from_image_buckets_brightness() {
        let source = image::GrayImage::from_fn(8, 8, |x, _| {
            if x < 4 { image::Luma([10]) } else { image::Luma([250]) }
        });
        let mut layout = ImageLayout::new(8, 8);
        layout.generate_layout_from_image(2, &DynamicImage::ImageLuma8(source));

        assert_eq!(layout.class_at_pixel(0, 0), 0);
        assert_eq!(layout.class_at_pixel(7, 7), 1);
    }

    #[test]
    fn test_generators_target_focused_sub_layout() {
        let mut layout = ImageLayout::new(20, 20);
        layout.add_sub_layout(0.0, 0.0, 0.5, 0.5);
        assert!(layout.zoom_in_to_sub_layout(0.2, 0.2));
        layout.generate_vertical_stripes_layout(2, 0.5);

        assert_eq!(layout.primitives().len(), 2);
        assert_eq!(layout.root().sub_layouts().count(), 1);
        assert!(layout.root().primitives().is_empty());
    }
}
