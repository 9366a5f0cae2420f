//! Baseline physical constants and frequency helpers.
//!
//! ## Accuracy
//!
//! Constants marked "exact" have zero uncertainty by SI definition (2019
//! revision). Measured constants (ε₀, μ₀, Z₀) are provided with 11-12
//! significant figures, suitable for engineering applications.
//!
//! ## References
//!
//! Physical constants are based on CODATA recommended values:
//! - NIST Reference on Constants, Units, and Uncertainty: <https://physics.nist.gov/cuu/Constants/>
//! - Mohr, P. J., Newell, D. B., Taylor, B. N., & Tiesinga, E. (2019). CODATA Recommended Values of the Fundamental Physical Constants: 2018.

use std::f64::consts::PI;

/// Vacuum permittivity ε₀ in farads per meter (F/m).
pub const VACUUM_PERMITTIVITY: f64 = 8.854_187_812_8e-12;
/// Vacuum permeability μ₀ in henries per meter (H/m).
pub const VACUUM_PERMEABILITY: f64 = 1.256_637_062_12e-6;
/// Speed of light in vacuum _c_ in meters per second (m/s).
/// Exact value by SI definition (2019): 299,792,458 m/s.
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;
/// Characteristic impedance of free space Z₀ in ohms (Ω).
/// Derived from Z₀ = √(μ₀/ε₀) ≈ 376.730313668 Ω.
pub const FREE_SPACE_IMPEDANCE: f64 = 376.730_313_668;
/// Proton mass energy equivalent in MeV.
/// CODATA 2018: 938.27208816 MeV.
pub const PROTON_MASS_MEV: f64 = 938.272_088_16;

/// Returns the angular frequency corresponding to a linear frequency `hz`.
#[inline]
#[must_use]
pub fn angular_frequency(hz: f64) -> f64 {
    2.0 * PI * hz
}

/// Returns the beam wave number k = 2πf/(βc) for a frequency in hertz and a
/// relativistic beta.
#[inline]
#[must_use]
pub fn beam_wave_number(hz: f64, betarel: f64) -> f64 {
    2.0 * PI * hz / (betarel * SPEED_OF_LIGHT)
}

/// Returns the free-space wavelength in meters for a given frequency in hertz.
#[inline]
#[must_use]
pub fn wavelength_from_frequency(hz: f64) -> f64 {
    SPEED_OF_LIGHT / hz
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn wavelength_matches_reference() {
        let freq = 1.0e9;
        let lambda = wavelength_from_frequency(freq);
        assert_relative_eq!(lambda, 0.299_792_458, max_relative = 1.0e-9);
    }

    #[test]
    fn free_space_impedance_is_consistent() {
        let z0 = (VACUUM_PERMEABILITY / VACUUM_PERMITTIVITY).sqrt();
        assert_relative_eq!(z0, FREE_SPACE_IMPEDANCE, max_relative = 1.0e-9);
    }

    #[test]
    fn wave_number_at_unit_beta() {
        let k = beam_wave_number(SPEED_OF_LIGHT, 1.0);
        assert_relative_eq!(k, 2.0 * PI, max_relative = 1.0e-12);
    }
}
