//! Frequency spacing and impedance post-processing helpers.

use num_complex::Complex;

use crate::math::Scalar;

/// Generates `n` linearly spaced samples in [start, stop].
#[must_use]
pub fn linspace(start: Scalar, stop: Scalar, n: usize) -> Vec<Scalar> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n as Scalar - 1.0);
            (0..n).map(|i| start + step * i as Scalar).collect()
        }
    }
}

/// Generates `n` logarithmically spaced samples between `start` and `stop`.
/// Requires start > 0 and stop > 0.
#[must_use]
pub fn logspace(start: Scalar, stop: Scalar, n: usize) -> Vec<Scalar> {
    assert!(start > 0.0 && stop > 0.0);
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let log_start = start.log10();
            let log_stop = stop.log10();
            let step = (log_stop - log_start) / (n as Scalar - 1.0);
            (0..n)
                .map(|i| 10f64.powf(log_start + step * i as Scalar))
                .collect()
        }
    }
}

/// Magnitude of a complex sequence.
#[must_use]
pub fn mag<'a>(values: impl IntoIterator<Item = &'a Complex<Scalar>>) -> Vec<Scalar> {
    values.into_iter().map(|v| v.norm()).collect()
}

/// Magnitude in dB (20·log10(|x|)), clamping very small values.
#[must_use]
pub fn mag_db<'a>(values: impl IntoIterator<Item = &'a Complex<Scalar>>) -> Vec<Scalar> {
    const MIN: Scalar = 1e-300;
    values
        .into_iter()
        .map(|v| 20.0 * (v.norm().max(MIN)).log10())
        .collect()
}

/// Phase in radians of a complex sequence.
#[must_use]
pub fn phase_rad<'a>(values: impl IntoIterator<Item = &'a Complex<Scalar>>) -> Vec<Scalar> {
    values.into_iter().map(|v| v.arg()).collect()
}

/// Phase in degrees of a complex sequence.
#[must_use]
pub fn phase_deg<'a>(values: impl IntoIterator<Item = &'a Complex<Scalar>>) -> Vec<Scalar> {
    values.into_iter().map(|v| v.arg().to_degrees()).collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn linspace_basic() {
        let v = linspace(0.0, 1.0, 5);
        assert_eq!(v, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn logspace_endpoints() {
        let v = logspace(1.0e3, 1.0e9, 4);
        assert_relative_eq!(v[0], 1.0e3, max_relative = 1.0e-12);
        assert_relative_eq!(v[3], 1.0e9, max_relative = 1.0e-12);
    }

    #[test]
    fn mag_phase_roundtrip() {
        let x = vec![Complex::new(1.0, 0.0), Complex::new(0.0, 1.0)];
        let m = mag(&x);
        let p = phase_deg(&x);
        assert_relative_eq!(m[0], 1.0, max_relative = 1.0e-12);
        assert_relative_eq!(m[1], 1.0, max_relative = 1.0e-12);
        assert_relative_eq!(p[0], 0.0, epsilon = 1.0e-12);
        assert_relative_eq!(p[1], 90.0, max_relative = 1.0e-12);
    }
}
