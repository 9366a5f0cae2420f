//! Frequency grid shared by every impedance calculation.

use thiserror::Error;

use crate::math::Scalar;

/// Errors raised while building a [`FrequencyGrid`].
#[derive(Debug, Error)]
pub enum FrequencyError {
    /// The grid would contain no points.
    #[error("frequency grid must contain at least one point")]
    Empty,
    /// A frequency was zero or negative.
    #[error("all frequencies must be positive, got {0} Hz")]
    NonPositive(Scalar),
    /// Decade bounds were inverted.
    #[error("fmax exponent ({fmax}) must not be smaller than fmin exponent ({fmin})")]
    InvertedRange {
        /// Minimum decade exponent.
        fmin: i32,
        /// Maximum decade exponent.
        fmax: i32,
    },
    /// The decade step exponent was not positive.
    #[error("fstep exponent must be positive, got {0}")]
    NonPositiveStep(Scalar),
    /// A spacing bound was invalid.
    #[error("spacing bounds must be positive and ordered, got [{start}, {stop}]")]
    InvalidBounds {
        /// Lower bound in Hz.
        start: Scalar,
        /// Upper bound in Hz.
        stop: Scalar,
    },
}

/// Ordered, strictly positive frequency axis in hertz.
///
/// Immutable after construction; every per-frequency array produced by the
/// engine is index-aligned with this grid.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyGrid {
    freq_hz: Vec<Scalar>,
}

impl FrequencyGrid {
    /// Builds a grid from an explicit list of frequencies in Hz.
    ///
    /// The list is sorted ascending; zero or negative entries are rejected.
    pub fn from_list(freq_hz: impl Into<Vec<Scalar>>) -> Result<Self, FrequencyError> {
        let mut freq_hz = freq_hz.into();
        if freq_hz.is_empty() {
            return Err(FrequencyError::Empty);
        }
        if let Some(&bad) = freq_hz.iter().find(|f| !(**f > 0.0)) {
            return Err(FrequencyError::NonPositive(bad));
        }
        freq_hz.sort_by(|a, b| a.partial_cmp(b).expect("frequencies are finite"));
        Ok(Self { freq_hz })
    }

    /// Builds `n` logarithmically spaced points between `start_hz` and
    /// `stop_hz` (both inclusive, both > 0).
    pub fn logspace(start_hz: Scalar, stop_hz: Scalar, n: usize) -> Result<Self, FrequencyError> {
        if !(start_hz > 0.0 && stop_hz > 0.0 && start_hz <= stop_hz) {
            return Err(FrequencyError::InvalidBounds {
                start: start_hz,
                stop: stop_hz,
            });
        }
        Self::from_list(crate::sweep::logspace(start_hz, stop_hz, n))
    }

    /// Builds the decade-expansion grid of the transmission-line wall codes:
    /// for every decade in `10^fmin .. 10^fmax`, points are laid out with
    /// spacing `10^(decade + 1 - fstep)`.
    ///
    /// A larger `fstep` therefore yields *more* points per decade
    /// (`fstep = 2` ⇒ ~90 points, `fstep = 3` ⇒ ~900 points).
    pub fn from_decades(fmin: i32, fmax: i32, fstep: Scalar) -> Result<Self, FrequencyError> {
        if fmax < fmin {
            return Err(FrequencyError::InvertedRange { fmin, fmax });
        }
        if fstep <= 0.0 {
            return Err(FrequencyError::NonPositiveStep(fstep));
        }

        let mut freq_hz = Vec::new();
        for p in 1..=(fmax - fmin) {
            let decade = Scalar::from(fmin - 1 + p);
            let start = (1.0 + 10f64.powf(1.0 - fstep)) * 10f64.powf(decade);
            let stop = 10f64.powf(decade + 1.0);
            let step = 10f64.powf(decade - (fstep - 1.0));
            let mut v = start;
            while v < stop + step {
                freq_hz.push(v);
                v += step;
            }
        }
        Self::from_list(freq_hz)
    }

    /// Number of grid points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.freq_hz.len()
    }

    /// True when the grid has no points (unreachable for constructed grids).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.freq_hz.is_empty()
    }

    /// Frequencies in Hz, ascending.
    #[must_use]
    pub fn as_slice(&self) -> &[Scalar] {
        &self.freq_hz
    }

    /// Iterator over the frequencies in Hz.
    pub fn iter(&self) -> impl Iterator<Item = Scalar> + '_ {
        self.freq_hz.iter().copied()
    }
}
