//! Gaussian peak descriptors.

/// One Gaussian basis function of a spectrum.
///
/// All fields are normalized to `[0, 1]`. The default peak is all zeros,
/// which contributes nothing to the spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PeakDistribution {
    /// Mean of the Gaussian, as a fraction of the spectral range
    pub position: f64,
    /// Height of the peak at its own center (before clip normalization)
    pub amplitude: f64,
    /// Variance of the Gaussian; sharp peaks have a small width
    pub width: f64,
}

impl PeakDistribution {
    /// Create a peak without validating the fields.
    pub fn new(position: f64, amplitude: f64, width: f64) -> Self {
        Self {
            position,
            amplitude,
            width,
        }
    }

    /// Apply the in-range fields of a requested edit, keeping the rest.
    ///
    /// Out-of-range (or NaN) values are ignored field by field.
    pub fn apply(&mut self, position: f64, amplitude: f64, width: f64) -> PeakUpdate {
        let mut update = PeakUpdate::default();
        if is_normalized(position) {
            self.position = position;
            update.position = true;
        }
        if is_normalized(amplitude) {
            self.amplitude = amplitude;
            update.amplitude = true;
        }
        if is_normalized(width) {
            self.width = width;
            update.width = true;
        }
        update
    }

    /// Contribution of this peak at normalized position `x`.
    pub fn value_at(&self, x: f64) -> f64 {
        self.amplitude * relative_gaussian(x, self.position, self.width)
    }
}

/// Which fields of a peak edit were accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PeakUpdate {
    /// `position` was in range and applied
    pub position: bool,
    /// `amplitude` was in range and applied
    pub amplitude: bool,
    /// `width` was in range and applied
    pub width: bool,
}

impl PeakUpdate {
    /// Every requested field was applied.
    pub fn all_applied(&self) -> bool {
        self.position && self.amplitude && self.width
    }

    /// Names of the rejected fields, for log messages.
    pub fn rejected_fields(&self) -> Vec<&'static str> {
        [
            (self.position, "position"),
            (self.amplitude, "amplitude"),
            (self.width, "width"),
        ]
        .into_iter()
        .filter_map(|(applied, name)| (!applied).then_some(name))
        .collect()
    }
}

fn is_normalized(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

/// Gaussian probability density at `x`.
///
/// See <https://en.wikipedia.org/wiki/Normal_distribution>.
fn normal_distribution(x: f64, mean: f64, variance: f64) -> f64 {
    let scale = 1.0 / (2.0 * std::f64::consts::PI * variance).sqrt();
    let offset = x - mean;
    scale * (-(offset * offset) / (2.0 * variance)).exp()
}

/// Gaussian density divided by its own peak value, capped at 1.
///
/// A zero-width peak is a spike: 1 exactly at its mean, 0 elsewhere.
fn relative_gaussian(x: f64, mean: f64, variance: f64) -> f64 {
    if variance <= 0.0 {
        return if x == mean { 1.0 } else { 0.0 };
    }
    let peak = normal_distribution(mean, mean, variance);
    (normal_distribution(x, mean, variance) / peak).min(1.0)
}
