//! Modified Bessel functions and overflow-safe space-charge products.
//!
//! The space-charge impedances multiply modified Bessel functions whose
//! factors overflow double precision long before their product does
//! (I₀(x) ≈ 10³⁰⁴ at x ≈ 700 while I₀(x)·K₀(x) ≈ 1/(2x)). The safe product
//! helpers branch on a fixed argument threshold and substitute the
//! asymptotic limit above it, so they are total and always finite.
//!
//! Real-argument I₀/I₁/K₀/K₁ use the rational approximations of
//! Abramowitz & Stegun §9.8 (about 7 significant digits). The complex-argument
//! I₀ needed by the wall recursion combines the power series with the
//! large-argument expansion e^z/√(2πz)·(1 + 1/(8z) + 9/(128z²)); it is
//! intended for Re z ≥ 0 and loses accuracy close to the imaginary axis,
//! where only its magnitude is consumed.

use num_complex::Complex;

use crate::math::{CScalar, Scalar};

/// Argument threshold above which Bessel factors are replaced by their
/// asymptotic behavior (conservative: I₀ overflows near 700).
pub const MAX_BESSEL_ARG: Scalar = 500.0;

/// Magnitude cap for directly evaluated products; larger values are treated
/// as overflowed and replaced by zero.
const MAX_PRODUCT_MAGNITUDE: Scalar = 1.0e200;

/// Crossover radius between the power series and the asymptotic expansion
/// of the complex I₀.
const COMPLEX_SERIES_RADIUS: Scalar = 30.0;

/// Bessel order selector for the space-charge products.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BesselOrder {
    /// Order 0 (longitudinal space charge: I₀, K₀).
    Zero,
    /// Order 1 (transverse space charge: I₁, K₁).
    One,
}

/// Modified Bessel function of the first kind, order 0.
#[must_use]
pub fn i0(x: Scalar) -> Scalar {
    let ax = x.abs();
    if ax < 3.75 {
        let t = (x / 3.75) * (x / 3.75);
        1.0 + t
            * (3.515_622_9
                + t * (3.089_942_4
                    + t * (1.206_749_2
                        + t * (0.265_973_2 + t * (0.036_076_8 + t * 0.004_581_3)))))
    } else {
        let t = 3.75 / ax;
        (ax.exp() / ax.sqrt())
            * (0.398_942_28
                + t * (0.013_285_92
                    + t * (0.002_253_19
                        + t * (-0.001_575_65
                            + t * (0.009_162_81
                                + t * (-0.020_577_06
                                    + t * (0.026_355_37
                                        + t * (-0.016_476_33 + t * 0.003_923_77))))))))
    }
}

/// Modified Bessel function of the first kind, order 1.
#[must_use]
pub fn i1(x: Scalar) -> Scalar {
    let ax = x.abs();
    let value = if ax < 3.75 {
        let t = (x / 3.75) * (x / 3.75);
        ax * (0.5
            + t * (0.878_905_94
                + t * (0.514_988_69
                    + t * (0.150_849_34
                        + t * (0.026_587_33 + t * (0.003_015_32 + t * 0.000_324_11))))))
    } else {
        let t = 3.75 / ax;
        let poly = 0.398_942_28
            + t * (-0.039_880_24
                + t * (-0.003_620_18
                    + t * (0.001_638_01
                        + t * (-0.010_315_55
                            + t * (0.022_829_67
                                + t * (-0.028_953_12
                                    + t * (0.017_876_54 + t * -0.004_200_59)))))));
        (ax.exp() / ax.sqrt()) * poly
    };
    if x < 0.0 {
        -value
    } else {
        value
    }
}

/// Modified Bessel function of the second kind, order 0.
///
/// Diverges to +∞ at x = 0; callers with potentially vanishing arguments go
/// through the safe product helpers.
#[must_use]
pub fn k0(x: Scalar) -> Scalar {
    if x <= 0.0 {
        return Scalar::INFINITY;
    }
    if x <= 2.0 {
        let y = x * x / 4.0;
        -(x / 2.0).ln() * i0(x)
            + (-0.577_215_66
                + y * (0.422_784_2
                    + y * (0.230_697_56
                        + y * (0.034_885_9
                            + y * (0.002_626_98 + y * (0.000_107_5 + y * 0.000_007_4))))))
    } else {
        let t = 2.0 / x;
        ((-x).exp() / x.sqrt())
            * (1.253_314_14
                + t * (-0.078_323_58
                    + t * (0.021_895_68
                        + t * (-0.010_624_46
                            + t * (0.005_878_72 + t * (-0.002_515_4 + t * 0.000_532_08))))))
    }
}

/// Modified Bessel function of the second kind, order 1.
#[must_use]
pub fn k1(x: Scalar) -> Scalar {
    if x <= 0.0 {
        return Scalar::INFINITY;
    }
    if x <= 2.0 {
        let y = x * x / 4.0;
        (x / 2.0).ln() * i1(x)
            + (1.0 / x)
                * (1.0
                    + y * (0.154_431_44
                        + y * (-0.672_785_79
                            + y * (-0.181_568_97
                                + y * (-0.019_194_02
                                    + y * (-0.001_104_04 + y * -0.000_046_86))))))
    } else {
        let t = 2.0 / x;
        ((-x).exp() / x.sqrt())
            * (1.253_314_14
                + t * (0.234_986_19
                    + t * (-0.036_556_2
                        + t * (0.015_042_68
                            + t * (-0.007_803_53 + t * (0.003_256_14 + t * -0.000_682_45))))))
    }
}

/// Modified Bessel function of the first kind, order 0, complex argument.
///
/// Non-finite inputs yield an infinite magnitude so that reciprocal-style
/// corrections collapse to zero downstream.
#[must_use]
pub fn i0_complex(z: CScalar) -> CScalar {
    if !z.re.is_finite() || !z.im.is_finite() {
        return Complex::new(Scalar::INFINITY, 0.0);
    }
    let r = z.norm();
    if r <= COMPLEX_SERIES_RADIUS {
        // Power series: Σ (z²/4)^m / (m!)²
        let q = z * z * 0.25;
        let mut term = Complex::new(1.0, 0.0);
        let mut sum = term;
        for m in 1..200 {
            let m = f64::from(m);
            term = term * q / (m * m);
            sum += term;
            if term.norm() <= 1.0e-17 * sum.norm() {
                break;
            }
        }
        sum
    } else {
        // e^z/√(2πz) with the first two correction terms.
        let inv = 1.0 / z;
        let corr = 1.0 + 0.125 * inv + (9.0 / 128.0) * inv * inv;
        z.exp() / (2.0 * std::f64::consts::PI * z).sqrt() * corr
    }
}

/// Overflow-safe I·K product with equal arguments (direct space charge).
///
/// Below [`MAX_BESSEL_ARG`] the factors are evaluated directly and any
/// non-finite or overlarge product is replaced by 0; at or above it the
/// asymptotic tail 1/(2a) is returned. Continuous across the threshold.
#[must_use]
pub fn safe_product_direct(a: Scalar, order: BesselOrder) -> Scalar {
    if a.is_nan() {
        return 0.0;
    }
    if a < MAX_BESSEL_ARG {
        let product = match order {
            BesselOrder::Zero => i0(a) * k0(a),
            BesselOrder::One => i1(a) * k1(a),
        };
        if product.is_finite() && product.abs() < MAX_PRODUCT_MAGNITUDE {
            product
        } else {
            0.0
        }
    } else {
        1.0 / (2.0 * a)
    }
}

/// Overflow-safe I²·(−K/I) product with two arguments (indirect space
/// charge): `I(a0)²·(−K(a1)/I(a1))`.
///
/// Above the threshold the true value is exponentially negligible and 0 is
/// returned.
#[must_use]
pub fn safe_product_indirect(a0: Scalar, a1: Scalar, order: BesselOrder) -> Scalar {
    if a0.is_nan() || a1.is_nan() {
        return 0.0;
    }
    if a0 < MAX_BESSEL_ARG && a1 < MAX_BESSEL_ARG {
        let product = match order {
            BesselOrder::Zero => i0(a0).powi(2) * (-k0(a1) / i0(a1)),
            BesselOrder::One => i1(a0).powi(2) * (-k1(a1) / i1(a1)),
        };
        if product.is_finite() && product.abs() < MAX_PRODUCT_MAGNITUDE {
            product
        } else {
            0.0
        }
    } else {
        0.0
    }
}
