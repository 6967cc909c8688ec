//! Error types for export, project and configuration operations.
//!
//! Only consequential, user-triggered operations (exporting a cube, reading or
//! writing files) report errors. Interactive edits such as peak or layout
//! changes log a warning and leave the model untouched instead.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HsiError>;

/// Flat classification of [`HsiError`] for callers that only need to branch
/// on the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No spectrum was available to export
    NoSpectra,
    /// Band count outside the supported range
    InvalidBandCount,
    /// Image width or height outside the supported range
    InvalidImageSize,
    /// A rendered pixel refers to a class with no spectrum
    InvalidClassIndex,
    /// A file could not be opened or created
    FileOpenFailed,
    /// Any other I/O failure
    Io,
    /// Malformed document, configuration or image
    InvalidFormat,
}

/// Errors that can occur while exporting or persisting generator data.
#[derive(Error, Debug)]
pub enum HsiError {
    /// The spectrum list was empty
    #[error("Could not save file: at least one spectrum must be available.")]
    NoSpectra,

    /// Requested band count outside `[min, max]`
    #[error("Invalid number of spectral bands {bands}: must be between {min} and {max}.")]
    InvalidBandCount {
        /// The rejected band count
        bands: usize,
        /// Smallest accepted value
        min: usize,
        /// Largest accepted value
        max: usize,
    },

    /// Layout dimensions outside `[min, max]`
    #[error(
        "Invalid image dimensions {width}x{height}: width and height must be between {min} and {max}."
    )]
    InvalidImageSize {
        /// Layout width in pixels
        width: u32,
        /// Layout height in pixels
        height: u32,
        /// Smallest accepted dimension
        min: u32,
        /// Largest accepted dimension
        max: u32,
    },

    /// A pixel's class index has no matching spectrum
    #[error(
        "Pixel ({x}, {y}) has class index {class_index}, but only {num_classes} spectra are defined."
    )]
    InvalidClassIndex {
        /// Offending class index
        class_index: i32,
        /// Number of available spectra
        num_classes: usize,
        /// Pixel column
        x: u32,
        /// Pixel row
        y: u32,
    },

    /// A file could not be opened for reading or writing
    #[error("Could not open file {path:?}: {source}")]
    FileOpenFailed {
        /// Path that failed to open
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// XML parsing or serialization error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image decoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// NumPy array writing error
    #[error("NumPy write error: {0}")]
    Npy(#[from] ndarray_npy::WriteNpyError),

    /// Invalid document structure or content
    #[error("Invalid format: {message}")]
    InvalidFormat {
        /// Description of the format error
        message: String,
    },
}

impl HsiError {
    /// Create an invalid format error with a message.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Create a file-open error for `path`.
    pub fn file_open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileOpenFailed {
            path: path.into(),
            source,
        }
    }

    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoSpectra => ErrorKind::NoSpectra,
            Self::InvalidBandCount { .. } => ErrorKind::InvalidBandCount,
            Self::InvalidImageSize { .. } => ErrorKind::InvalidImageSize,
            Self::InvalidClassIndex { .. } => ErrorKind::InvalidClassIndex,
            Self::FileOpenFailed { .. } => ErrorKind::FileOpenFailed,
            Self::Io(_) | Self::Npy(_) => ErrorKind::Io,
            Self::Xml(_) | Self::Json(_) | Self::Image(_) | Self::InvalidFormat { .. } => {
                ErrorKind::InvalidFormat
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(HsiError::NoSpectra.kind(), ErrorKind::NoSpectra);
        assert_eq!(
            HsiError::invalid_format("bad root").kind(),
            ErrorKind::InvalidFormat
        );
        let err = HsiError::file_open(
            "/nowhere/cube.bsq",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert_eq!(err.kind(), ErrorKind::FileOpenFailed);
    }

    #[test]
    fn test_messages_name_the_limits() {
        let err = HsiError::InvalidBandCount {
            bands: 0,
            min: 1,
            max: 10_000,
        };
        let message = err.to_string();
        assert!(message.contains("between 1 and 10000"), "got: {message}");
    }
}
