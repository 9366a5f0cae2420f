//! Shared numerical primitives anchored on `nalgebra`.

use nalgebra::DVector;
use num_complex::Complex;

/// Primary scalar type used across the crate.
pub type Scalar = f64;
/// Primary complex scalar type used for phasors and impedances.
pub type CScalar = Complex<Scalar>;
/// Per-frequency real array (one entry per frequency-grid point).
pub type RVector = DVector<Scalar>;
/// Per-frequency complex array (one entry per frequency-grid point).
pub type CVector = DVector<CScalar>;

/// Imaginary unit as a complex scalar.
pub const J: CScalar = Complex::new(0.0, 1.0);

/// Imaginary part magnitude beyond which `tan_stable` saturates.
/// `Complex::tan` divides by `cos(2x) + cosh(2y)`; cosh overflows near
/// 2y ≈ 710 and the quotient degenerates to NaN.
const TAN_SATURATION_IM: Scalar = 200.0;

/// Complex tangent that saturates to ±j for large imaginary parts.
///
/// tan(x + jy) → ±j as y → ±∞, which is the value the loaded-line recursion
/// needs for electrically thick layers.
#[must_use]
pub fn tan_stable(z: CScalar) -> CScalar {
    if z.im.abs() > TAN_SATURATION_IM {
        Complex::new(0.0, z.im.signum())
    } else {
        z.tan()
    }
}

/// Reciprocal with a defined-zero result for non-finite denominators.
///
/// Replaces the blanket NaN→0 rewrite of ad-hoc implementations with an
/// explicit branch on the known overflow case.
#[inline]
#[must_use]
pub fn safe_recip(x: Scalar) -> Scalar {
    if x.is_finite() && x != 0.0 {
        1.0 / x
    } else if x.is_infinite() {
        0.0
    } else {
        // x == 0 or NaN: the callers treat a vanished correction as absent.
        0.0
    }
}

/// Divides a complex value by a real reduction factor, mapping division by a
/// non-finite factor to exactly zero.
#[inline]
#[must_use]
pub fn reduce(value: CScalar, reduction: Scalar) -> CScalar {
    if reduction.is_finite() {
        value / reduction
    } else {
        Complex::new(0.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn tan_stable_matches_library_for_moderate_arguments() {
        let z = Complex::new(0.3, -1.2);
        let t = tan_stable(z);
        let reference = z.tan();
        assert_relative_eq!(t.re, reference.re, max_relative = 1.0e-12);
        assert_relative_eq!(t.im, reference.im, max_relative = 1.0e-12);
    }

    #[test]
    fn tan_stable_saturates_for_thick_layers() {
        let t = tan_stable(Complex::new(485.0, -485.0));
        assert_relative_eq!(t.re, 0.0);
        assert_relative_eq!(t.im, -1.0);
        assert!(t.re.is_finite() && t.im.is_finite());
    }

    #[test]
    fn safe_recip_zeroes_overflowed_denominators() {
        assert_relative_eq!(safe_recip(2.0), 0.5);
        assert_eq!(safe_recip(Scalar::INFINITY), 0.0);
        assert_eq!(safe_recip(Scalar::NAN), 0.0);
    }

    #[test]
    fn reduce_defines_infinite_division_as_zero() {
        let z = Complex::new(3.0, -4.0);
        assert_eq!(reduce(z, Scalar::INFINITY), Complex::new(0.0, 0.0));
        assert_relative_eq!(reduce(z, 2.0).re, 1.5);
    }
}
