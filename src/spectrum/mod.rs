//! Peak-based spectral class definitions.
//!
//! A spectrum is stored as a list of Gaussian peaks rather than sampled
//! values, so it can be generated at any spectral resolution. The peaks are
//! the only authoritative state: [`SpectrumModel::generate_spectrum`] is a
//! pure function of them.

mod peak;

pub use peak::{PeakDistribution, PeakUpdate};

use crate::color::Rgb;
use crate::constants::{DEFAULT_SPECTRUM_NAME, MAX_NUM_BANDS, MIN_NUM_BANDS};
use crate::error::{HsiError, Result};

/// A named, colored spectral class built from Gaussian peaks.
///
/// Cloning duplicates the peaks; the clone is an independent class.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumModel {
    name: String,
    color: Rgb,
    peaks: Vec<PeakDistribution>,
}

impl Default for SpectrumModel {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectrumModel {
    /// Create an empty spectrum named "New Spectrum" with a random color.
    pub fn new() -> Self {
        Self::with_name(DEFAULT_SPECTRUM_NAME)
    }

    /// Create an empty spectrum with a random color.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self::with_name_and_color(name, Rgb::random())
    }

    /// Create an empty spectrum with a fixed name and color.
    pub fn with_name_and_color(name: impl Into<String>, color: Rgb) -> Self {
        Self {
            name: name.into(),
            color,
            peaks: Vec::new(),
        }
    }

    /// Class name shown to the user.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the class.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Representative color of the class.
    pub fn color(&self) -> Rgb {
        self.color
    }

    /// Change the representative color.
    pub fn set_color(&mut self, color: Rgb) {
        self.color = color;
    }

    /// Peaks in insertion (display) order.
    pub fn peaks(&self) -> &[PeakDistribution] {
        &self.peaks
    }

    /// Number of peaks.
    pub fn num_peaks(&self) -> usize {
        self.peaks.len()
    }

    /// True if the spectrum currently has no peaks.
    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    /// Append a peak.
    ///
    /// Each field must lie in `[0, 1]`; a field outside that range keeps the
    /// zero default while the valid fields are still applied. The peak is
    /// always added.
    pub fn add_peak(&mut self, position: f64, amplitude: f64, width: f64) -> PeakUpdate {
        let mut peak = PeakDistribution::default();
        let update = peak.apply(position, amplitude, width);
        if !update.all_applied() {
            log::warn!(
                "Spectrum '{}': ignored out-of-range peak fields {:?}",
                self.name,
                update.rejected_fields()
            );
        }
        self.peaks.push(peak);
        update
    }

    /// Edit the peak at `index` in place with the same per-field rule as
    /// [`add_peak`](Self::add_peak).
    ///
    /// Returns `None` (and logs a warning) when `index` is out of range.
    pub fn update_peak(
        &mut self,
        index: usize,
        position: f64,
        amplitude: f64,
        width: f64,
    ) -> Option<PeakUpdate> {
        let num_peaks = self.peaks.len();
        let Some(peak) = self.peaks.get_mut(index) else {
            log::warn!(
                "Peak index {} is out of range: spectrum '{}' has {} peaks",
                index,
                self.name,
                num_peaks
            );
            return None;
        };
        let update = peak.apply(position, amplitude, width);
        if !update.all_applied() {
            log::warn!(
                "Spectrum '{}': ignored out-of-range fields {:?} for peak {}",
                self.name,
                update.rejected_fields(),
                index
            );
        }
        Some(update)
    }

    /// Remove the peak at `index`, returning it.
    ///
    /// Returns `None` (and logs a warning) when `index` is out of range.
    pub fn delete_peak(&mut self, index: usize) -> Option<PeakDistribution> {
        if index >= self.peaks.len() {
            log::warn!(
                "Peak index {} is out of range: spectrum '{}' has {} peaks",
                index,
                self.name,
                self.peaks.len()
            );
            return None;
        }
        Some(self.peaks.remove(index))
    }

    /// Remove all peaks, leaving a flat zero spectrum.
    pub fn reset(&mut self) {
        self.peaks.clear();
    }

    /// Sample the spectrum at `num_bands` evenly spaced positions.
    ///
    /// Band `b` is evaluated at `x = b / num_bands`. The peak contributions
    /// are summed; only if some band exceeds 1.0 is the whole curve divided
    /// by its maximum.
    pub fn generate_spectrum(&self, num_bands: usize) -> Result<Vec<f64>> {
        if num_bands < MIN_NUM_BANDS {
            return Err(HsiError::InvalidBandCount {
                bands: num_bands,
                min: MIN_NUM_BANDS,
                max: MAX_NUM_BANDS,
            });
        }

        let mut spectrum: Vec<f64> = (0..num_bands)
            .map(|band| {
                let x = band as f64 / num_bands as f64;
                self.peaks.iter().map(|peak| peak.value_at(x)).sum()
            })
            .collect();

        let max_value = spectrum.iter().copied().fold(0.0, f64::max);
        if max_value > 1.0 {
            for value in &mut spectrum {
                *value /= max_value;
            }
        }
        Ok(spectrum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_empty_spectrum_is_flat_zero() {
        let spectrum = SpectrumModel::new();
        assert_eq!(spectrum.generate_spectrum(8).unwrap(), vec![0.0; 8]);
    }

    #[test]
    fn test_zero_bands_rejected() {
        let err = SpectrumModel::new().generate_spectrum(0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidBandCount);
    }

    #[test]
    fn test_peak_height_independent_of_width() {
        // Band 25 of 100 sits exactly at x = 0.25.
        for width in [0.001, 0.05, 0.5] {
            let mut spectrum = SpectrumModel::new();
            spectrum.add_peak(0.25, 0.6, width);
            let values = spectrum.generate_spectrum(100).unwrap();
            assert!(
                (values[25] - 0.6).abs() < 1e-9,
                "width {width}: got {}",
                values[25]
            );
        }
    }

    #[test]
    fn test_peak_between_bands() {
        // With 10 bands, x = 0.333 falls between band 3 (0.3) and band 4 (0.4).
        let (position, amplitude, width) = (0.333, 0.6, 0.05);
        let mut spectrum = SpectrumModel::new();
        spectrum.add_peak(position, amplitude, width);
        let values = spectrum.generate_spectrum(10).unwrap();

        let offset: f64 = 0.3 - position;
        let expected = amplitude * (-(offset * offset) / (2.0 * width)).exp();
        assert!(
            (values[3] - expected).abs() < 1e-9,
            "band 3: expected {expected}, got {}",
            values[3]
        );
        assert!(values[3] < amplitude);
        let max_band = values
            .iter()
            .enumerate()
            .fold(0, |best, (band, &v)| if v > values[best] { band } else { best });
        assert_eq!(max_band, 3);
    }

    #[test]
    fn test_no_normalization_without_clipping() {
        let mut spectrum = SpectrumModel::new();
        spectrum.add_peak(0.2, 0.4, 0.01);
        spectrum.add_peak(0.7, 0.5, 0.02);
        let values = spectrum.generate_spectrum(50).unwrap();

        let expected: Vec<f64> = (0..50)
            .map(|band| {
                let x = band as f64 / 50.0;
                spectrum.peaks().iter().map(|p| p.value_at(x)).sum()
            })
            .collect();
        assert_eq!(values, expected);
    }

    #[test]
    fn test_clipping_normalizes_to_one() {
        let mut spectrum = SpectrumModel::new();
        spectrum.add_peak(0.5, 1.0, 0.1);
        spectrum.add_peak(0.5, 1.0, 0.2);
        let values = spectrum.generate_spectrum(10).unwrap();

        let max = values.iter().copied().fold(0.0, f64::max);
        assert_eq!(max, 1.0);
        // Band 5 is the center of both peaks and therefore the maximum.
        assert_eq!(values[5], 1.0);
        assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_add_peak_rejects_out_of_range_position() {
        let mut spectrum = SpectrumModel::new();
        let update = spectrum.add_peak(1.5, 0.5, 0.5);

        assert!(!update.position);
        assert!(update.amplitude && update.width);
        assert_eq!(spectrum.peaks()[0], PeakDistribution::new(0.0, 0.5, 0.5));
    }

    #[test]
    fn test_update_peak_keeps_rejected_fields() {
        let mut spectrum = SpectrumModel::new();
        spectrum.add_peak(0.3, 0.3, 0.3);
        let update = spectrum.update_peak(0, 0.6, 2.0, 0.1).unwrap();

        assert!(update.position && !update.amplitude && update.width);
        assert_eq!(spectrum.peaks()[0], PeakDistribution::new(0.6, 0.3, 0.1));
    }

    #[test]
    fn test_out_of_range_index_is_noop() {
        let mut spectrum = SpectrumModel::new();
        spectrum.add_peak(0.3, 0.3, 0.3);
        let before = spectrum.clone();

        assert!(spectrum.update_peak(3, 0.1, 0.1, 0.1).is_none());
        assert!(spectrum.delete_peak(1).is_none());
        assert_eq!(spectrum, before);
    }

    #[test]
    fn test_delete_and_reset() {
        let mut spectrum = SpectrumModel::new();
        spectrum.add_peak(0.1, 0.1, 0.1);
        spectrum.add_peak(0.2, 0.2, 0.2);

        let removed = spectrum.delete_peak(0).unwrap();
        assert_eq!(removed.position, 0.1);
        assert_eq!(spectrum.num_peaks(), 1);

        spectrum.reset();
        assert!(spectrum.is_empty());
    }

    #[test]
    fn test_clone_is_independent() {
        let mut original = SpectrumModel::with_name_and_color("Grass", Rgb::new(0, 200, 0));
        original.add_peak(0.5, 0.5, 0.05);
        let mut copy = original.clone();
        copy.add_peak(0.9, 0.2, 0.05);

        assert_eq!(original.num_peaks(), 1);
        assert_eq!(copy.num_peaks(), 2);
        assert_eq!(copy.name(), "Grass");
    }
}
