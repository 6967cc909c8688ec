//! Global constants for the HSI generator

/// Smallest number of spectral bands an exported cube may have
pub const MIN_NUM_BANDS: usize = 1;

/// Largest number of spectral bands an exported cube may have
pub const MAX_NUM_BANDS: usize = 10_000;

/// Smallest accepted image width or height (pixels)
pub const MIN_IMAGE_DIMENSION: u32 = 1;

/// Largest accepted image width or height (pixels)
pub const MAX_IMAGE_DIMENSION: u32 = 10_000;

/// Default number of spectral bands for new projects
pub const DEFAULT_NUM_BANDS: usize = 100;

/// Default layout width
pub const DEFAULT_IMAGE_WIDTH: u32 = 200;

/// Default layout height
pub const DEFAULT_IMAGE_HEIGHT: u32 = 200;

/// Class index of pixels not covered by any primitive.
pub const DEFAULT_CLASS_INDEX: i32 = 0;

/// Reserved class value painted over sub-layout regions by `ImageLayout::render`.
pub const SUB_LAYOUT_CLASS_INDEX: i32 = -1;

/// Upper bound for the automatically chosen stripe/square size (fraction of the image).
pub const DEFAULT_MAX_PRIMITIVE_SIZE: f64 = 0.1;

/// Name given to spectra created without one
pub const DEFAULT_SPECTRUM_NAME: &str = "New Spectrum";

/// Name of the first spectrum in a fresh project
pub const BACKGROUND_SPECTRUM_NAME: &str = "Background";
