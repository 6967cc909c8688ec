//! hsigen - Synthetic Hyperspectral Data Generator
//!
//! Builds labelled hyperspectral test cubes from two ingredients:
//! - spectral classes, each a sum of Gaussian peaks ([`spectrum`])
//! - a recursive pixel-to-class layout ([`layout`])
//!
//! [`export::CubeExporter`] samples every class at the requested band count
//! and writes the cube band by band, together with an ENVI-style header.
//! Class definitions are persisted as XML through [`project`].

pub mod color;
pub mod config;
pub mod constants;
pub mod error;
pub mod export;
pub mod layout;
pub mod project;
pub mod spectrum;

pub use error::{ErrorKind, HsiError, Result};
pub use export::CubeExporter;
pub use layout::ImageLayout;
pub use project::{Project, ProjectSerializer};
pub use spectrum::SpectrumModel;
