//! Hyperspectral cube export.
//!
//! Combines the per-class spectra with a rendered layout into a
//! band-sequential (BSQ) cube of little-endian 32-bit floats, plus a text
//! header describing it. The cube can also be produced as an
//! `ndarray::Array3` or written as a NumPy `.npy` file.

mod header;

pub use header::EnviHeader;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use ndarray::Array3;
use web_time::Instant;

use crate::constants::{MAX_IMAGE_DIMENSION, MAX_NUM_BANDS, MIN_IMAGE_DIMENSION, MIN_NUM_BANDS};
use crate::error::{HsiError, Result};
use crate::layout::ImageLayout;
use crate::spectrum::SpectrumModel;

/// Size of one exported value in bytes.
pub const BYTES_PER_VALUE: usize = std::mem::size_of::<f32>();

/// What a successful [`CubeExporter::save`] wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    /// Binary cube file
    pub data_path: PathBuf,
    /// Companion header file
    pub header_path: PathBuf,
    /// Size of the binary cube
    pub bytes_written: u64,
}

/// Writes a hyperspectral cube from spectra and a class map.
///
/// Every precondition is checked before the first byte is written:
/// at least one spectrum, a band count in
/// `[MIN_NUM_BANDS, MAX_NUM_BANDS]`, image dimensions in
/// `[MIN_IMAGE_DIMENSION, MAX_IMAGE_DIMENSION]`, and a spectrum for every
/// class index in the map.
#[derive(Debug, Clone, Copy)]
pub struct CubeExporter<'a> {
    spectra: &'a [SpectrumModel],
    width: u32,
    height: u32,
    class_map: &'a [i32],
    num_bands: usize,
}

impl<'a> CubeExporter<'a> {
    /// Export the rendered class map of the layout's root node.
    ///
    /// Sub-layout regions still carry the sub-layout marker and are rejected
    /// as invalid classes; use [`from_class_map`](Self::from_class_map) with
    /// [`ImageLayout::render_composited`] to export nested content.
    pub fn new(spectra: &'a [SpectrumModel], layout: &'a ImageLayout, num_bands: usize) -> Self {
        let root = layout.root();
        Self::from_class_map(spectra, root.width(), root.height(), root.class_map(), num_bands)
    }

    /// Export an explicit row-major class map.
    pub fn from_class_map(
        spectra: &'a [SpectrumModel],
        width: u32,
        height: u32,
        class_map: &'a [i32],
        num_bands: usize,
    ) -> Self {
        Self {
            spectra,
            width,
            height,
            class_map,
            num_bands,
        }
    }

    /// Check every precondition without writing anything.
    pub fn validate(&self) -> Result<()> {
        if self.spectra.is_empty() {
            return Err(HsiError::NoSpectra);
        }
        if !(MIN_NUM_BANDS..=MAX_NUM_BANDS).contains(&self.num_bands) {
            return Err(HsiError::InvalidBandCount {
                bands: self.num_bands,
                min: MIN_NUM_BANDS,
                max: MAX_NUM_BANDS,
            });
        }
        let valid_dimension = |d: u32| (MIN_IMAGE_DIMENSION..=MAX_IMAGE_DIMENSION).contains(&d);
        if !valid_dimension(self.width) || !valid_dimension(self.height) {
            return Err(HsiError::InvalidImageSize {
                width: self.width,
                height: self.height,
                min: MIN_IMAGE_DIMENSION,
                max: MAX_IMAGE_DIMENSION,
            });
        }
        let expected = (self.width as usize) * (self.height as usize);
        if self.class_map.len() != expected {
            return Err(HsiError::invalid_format(format!(
                "Class map has {} entries but the image has {} pixels; render the layout first",
                self.class_map.len(),
                expected
            )));
        }
        if let Some(index) = self
            .class_map
            .iter()
            .position(|&class| self.class_index(class).is_none())
        {
            return Err(self.invalid_class(index));
        }
        Ok(())
    }

    fn class_index(&self, class: i32) -> Option<usize> {
        usize::try_from(class)
            .ok()
            .filter(|&index| index < self.spectra.len())
    }

    fn invalid_class(&self, pixel: usize) -> HsiError {
        let width = self.width as usize;
        HsiError::InvalidClassIndex {
            class_index: self.class_map[pixel],
            num_classes: self.spectra.len(),
            x: (pixel % width) as u32,
            y: (pixel / width) as u32,
        }
    }

    /// Sample every spectrum once at the export resolution.
    fn signatures(&self) -> Result<Vec<Vec<f32>>> {
        self.spectra
            .iter()
            .map(|spectrum| {
                let values = spectrum.generate_spectrum(self.num_bands)?;
                Ok(values.into_iter().map(|v| v as f32).collect())
            })
            .collect()
    }

    /// Header describing the exported cube.
    pub fn header(&self) -> EnviHeader {
        EnviHeader::for_cube(self.width, self.height, self.num_bands)
    }

    /// Stream the cube in band, row, column order.
    ///
    /// On error the writer may hold a partial cube that must be discarded.
    /// Returns the number of bytes written.
    pub fn write_cube<W: Write>(&self, writer: &mut W) -> Result<u64> {
        self.validate()?;
        let signatures = self.signatures()?;
        let mut bytes_written = 0u64;
        for band in 0..self.num_bands {
            for (pixel, &class) in self.class_map.iter().enumerate() {
                let index = self
                    .class_index(class)
                    .ok_or_else(|| self.invalid_class(pixel))?;
                writer.write_all(&signatures[index][band].to_le_bytes())?;
                bytes_written += BYTES_PER_VALUE as u64;
            }
        }
        writer.flush()?;
        Ok(bytes_written)
    }

    /// The cube as an array of shape `(bands, height, width)`.
    pub fn to_array(&self) -> Result<Array3<f32>> {
        self.validate()?;
        let signatures = self.signatures()?;
        let (width, height) = (self.width as usize, self.height as usize);
        let mut cube = Array3::<f32>::zeros((self.num_bands, height, width));
        for ((band, row, col), value) in cube.indexed_iter_mut() {
            let class = self.class_map[row * width + col];
            let index = self
                .class_index(class)
                .ok_or_else(|| self.invalid_class(row * width + col))?;
            *value = signatures[index][band];
        }
        Ok(cube)
    }

    /// Write the cube to `data_path` and its header next to it.
    ///
    /// Both files are first written under a `.partial` name and only moved
    /// into place once complete, so a failed export never leaves a
    /// half-written cube behind and leaves existing files as they were.
    /// A data path that would share its name with the header (`cube.hdr`)
    /// is rejected before anything is written.
    pub fn save(&self, data_path: &Path) -> Result<ExportSummary> {
        self.validate()?;
        let header_path = EnviHeader::path_for(data_path);
        if header_path == data_path {
            return Err(HsiError::invalid_format(format!(
                "Cube path {:?} collides with its header; use another extension",
                data_path
            )));
        }
        let start = Instant::now();
        let partial_data = with_suffix(data_path, PARTIAL_SUFFIX);
        let partial_header = with_suffix(&header_path, PARTIAL_SUFFIX);

        let result = self
            .write_partials(&partial_data, &partial_header)
            .and_then(|bytes| {
                publish(&[
                    (partial_data.as_path(), data_path),
                    (partial_header.as_path(), header_path.as_path()),
                ])?;
                Ok(bytes)
            });
        let bytes_written = match result {
            Ok(bytes) => bytes,
            Err(e) => {
                for path in [&partial_data, &partial_header] {
                    if path.exists() {
                        if let Err(remove_error) = std::fs::remove_file(path) {
                            log::warn!("Failed to remove {:?}: {}", path, remove_error);
                        }
                    }
                }
                log::error!("Export to {:?} failed: {}", data_path, e);
                return Err(e);
            }
        };

        log::info!(
            "Exported {}x{}x{} cube to {:?} ({} bytes) in {:?}",
            self.width,
            self.height,
            self.num_bands,
            data_path,
            bytes_written,
            start.elapsed()
        );
        Ok(ExportSummary {
            data_path: data_path.to_path_buf(),
            header_path,
            bytes_written,
        })
    }

    fn write_partials(&self, data_path: &Path, header_path: &Path) -> Result<u64> {
        let file = File::create(data_path).map_err(|e| HsiError::file_open(data_path, e))?;
        let mut writer = BufWriter::new(file);
        let bytes = self.write_cube(&mut writer)?;

        let mut header_file =
            File::create(header_path).map_err(|e| HsiError::file_open(header_path, e))?;
        header_file.write_all(self.header().to_string().as_bytes())?;
        Ok(bytes)
    }

    /// Write the cube as a NumPy `.npy` file of shape `(bands, height, width)`.
    pub fn save_npy(&self, path: &Path) -> Result<()> {
        let cube = self.to_array()?;
        ndarray_npy::write_npy(path, &cube)?;
        log::info!("Exported cube {:?} to {:?}", cube.shape(), path);
        Ok(())
    }
}

const PARTIAL_SUFFIX: &str = ".partial";
const PREVIOUS_SUFFIX: &str = ".previous";

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(suffix);
    path.with_file_name(name)
}

/// Move every `(from, to)` pair into place as one unit.
///
/// Files already at a target are set aside under a `.previous` name. If any
/// move fails, the targets moved so far are rolled back and the set-aside
/// files restored.
fn publish(moves: &[(&Path, &Path)]) -> Result<()> {
    let mut published: Vec<(&Path, Option<PathBuf>)> = Vec::new();
    let mut failure = None;
    for &(from, to) in moves {
        let backup = to.exists().then(|| with_suffix(to, PREVIOUS_SUFFIX));
        if let Some(backup) = &backup {
            if let Err(e) = std::fs::rename(to, backup) {
                failure = Some(e);
                break;
            }
        }
        if let Err(e) = std::fs::rename(from, to) {
            if let Some(backup) = &backup {
                restore(backup, to);
            }
            failure = Some(e);
            break;
        }
        published.push((to, backup));
    }

    match failure {
        None => {
            for backup in published.into_iter().filter_map(|(_, backup)| backup) {
                if let Err(e) = std::fs::remove_file(&backup) {
                    log::warn!("Failed to remove {:?}: {}", backup, e);
                }
            }
            Ok(())
        }
        Some(e) => {
            for (to, backup) in published.into_iter().rev() {
                match backup {
                    Some(backup) => restore(&backup, to),
                    None => {
                        if let Err(remove_error) = std::fs::remove_file(to) {
                            log::warn!("Failed to roll back {:?}: {}", to, remove_error);
                        }
                    }
                }
            }
            Err(e.into())
        }
    }
}

fn restore(backup: &Path, to: &Path) {
    if let Err(e) = std::fs::rename(backup, to) {
        log::warn!("Failed to restore {:?} from {:?}: {}", to, backup, e);
    }
}
