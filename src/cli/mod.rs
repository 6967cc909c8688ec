//! Command handlers for the hsigen binary.

pub mod export;
pub mod init;
pub mod preview;

pub use export::ExportArgs;
pub use init::InitArgs;
pub use preview::PreviewArgs;

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use hsigen::config::GeneratorConfig;
use hsigen::constants::DEFAULT_MAX_PRIMITIVE_SIZE;
use hsigen::error::{HsiError, Result};
use hsigen::layout::{self, ImageLayout};

/// Procedural layout to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LayoutKind {
    /// Full-width horizontal stripes
    Horizontal,
    /// Full-height vertical stripes
    Vertical,
    /// Diagonal-offset grid of squares
    Grid,
    /// Random connected blobs
    Random,
    /// Grayscale intensity buckets of an image (requires --image)
    Image,
}

/// Layout options shared by `preview` and `export`.
#[derive(Debug, Clone, Args)]
pub struct LayoutArgs {
    /// Layout generator
    #[arg(short, long, value_enum, default_value_t = LayoutKind::Horizontal)]
    pub layout: LayoutKind,

    /// Source image for the `image` layout
    #[arg(long, value_name = "FILE")]
    pub image: Option<PathBuf>,

    /// Stripe width or grid square size as a fraction of the image (0 = fit)
    #[arg(long, default_value_t = DEFAULT_MAX_PRIMITIVE_SIZE)]
    pub size: f64,

    /// Maximum blob size in pixels for the `random` layout (1 = per-pixel noise)
    #[arg(long, default_value_t = 100)]
    pub blob: usize,

    /// Layout width in pixels (defaults to the config value)
    #[arg(long)]
    pub width: Option<u32>,

    /// Layout height in pixels (defaults to the config value)
    #[arg(long)]
    pub height: Option<u32>,

    /// Seed for the `random` layout (defaults to the config value)
    #[arg(long)]
    pub seed: Option<u64>,
}

impl LayoutArgs {
    /// Generate the requested layout for `num_classes` classes.
    pub fn build(&self, num_classes: usize, config: &GeneratorConfig) -> Result<ImageLayout> {
        let width = self.width.unwrap_or(config.preferences.image_width);
        let height = self.height.unwrap_or(config.preferences.image_height);
        let mut layout = match self.seed.or(config.preferences.seed) {
            Some(seed) => ImageLayout::with_seed(width, height, seed),
            None => ImageLayout::new(width, height),
        };

        match self.layout {
            LayoutKind::Horizontal => layout.generate_horizontal_stripes_layout(num_classes, self.size),
            LayoutKind::Vertical => layout.generate_vertical_stripes_layout(num_classes, self.size),
            LayoutKind::Grid => layout.generate_grid_layout(num_classes, self.size),
            LayoutKind::Random => layout.generate_random_layout(num_classes, self.blob),
            LayoutKind::Image => {
                let path = self.image.as_deref().ok_or_else(|| {
                    HsiError::invalid_format("The image layout requires --image <FILE>")
                })?;
                let image = layout::load_layout_image(path)?;
                layout.generate_layout_from_image(num_classes, &image);
            }
        }
        Ok(layout)
    }
}
