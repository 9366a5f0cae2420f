//! Relativistic beam kinematics.
//!
//! A [`Beam`] keeps beta, gamma, momentum and kinetic energy mutually
//! consistent. Each kinematic variable has its own constructor; there is no
//! priority resolution between overlapping inputs, and invalid values are
//! rejected instead of silently retained.
//!
//! Relations (m = rest mass energy in MeV):
//!
//! ```text
//! γ = 1 / √(1 - β²)        p = γ·m·β        E_kin = (γ - 1)·m
//! ```

use thiserror::Error;

use crate::constants::PROTON_MASS_MEV;
use crate::math::Scalar;

/// Default transverse test-beam offset in meters.
pub const DEFAULT_TEST_BEAM_SHIFT_M: Scalar = 1.0e-3;

/// Errors raised while building a [`Beam`].
#[derive(Debug, Error)]
pub enum BeamError {
    /// Relativistic beta outside (0, 1].
    #[error("relativistic beta must lie in (0, 1], got {0}")]
    BetaOutOfRange(Scalar),
    /// Lorentz gamma outside [1, ∞].
    #[error("relativistic gamma must lie in [1, inf], got {0}")]
    GammaOutOfRange(Scalar),
    /// Kinetic energy was not positive.
    #[error("kinetic energy must be positive, got {0} MeV")]
    NonPositiveEnergy(Scalar),
    /// Momentum was not positive.
    #[error("momentum must be positive, got {0} MeV/c")]
    NonPositiveMomentum(Scalar),
    /// Rest mass was not positive.
    #[error("rest mass energy must be positive, got {0} MeV/c^2")]
    NonPositiveMass(Scalar),
    /// Test-beam offset was negative.
    #[error("test beam shift must be non-negative, got {0} m")]
    NegativeShift(Scalar),
}

/// Relativistic particle beam used for impedance calculations.
///
/// The ultra-relativistic limit (β = 1, γ = ∞) is a valid state and the
/// default; space-charge contributions vanish there.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Beam {
    betarel: Scalar,
    gammarel: Scalar,
    p_mev_c: Scalar,
    ekin_mev: Scalar,
    mass_mev_c2: Scalar,
    test_beam_shift_m: Scalar,
}

impl Beam {
    /// Ultra-relativistic proton beam (β = 1, γ = ∞).
    #[must_use]
    pub fn ultra_relativistic() -> Self {
        Self {
            betarel: 1.0,
            gammarel: Scalar::INFINITY,
            p_mev_c: Scalar::INFINITY,
            ekin_mev: Scalar::INFINITY,
            mass_mev_c2: PROTON_MASS_MEV,
            test_beam_shift_m: DEFAULT_TEST_BEAM_SHIFT_M,
        }
    }

    /// Proton beam defined by its Lorentz gamma (∞ permitted).
    pub fn from_gamma(gammarel: Scalar) -> Result<Self, BeamError> {
        Self::from_gamma_with_mass(gammarel, PROTON_MASS_MEV)
    }

    /// Beam defined by Lorentz gamma and rest mass energy in MeV.
    pub fn from_gamma_with_mass(gammarel: Scalar, mass_mev_c2: Scalar) -> Result<Self, BeamError> {
        check_mass(mass_mev_c2)?;
        if gammarel.is_nan() || gammarel < 1.0 {
            return Err(BeamError::GammaOutOfRange(gammarel));
        }
        if gammarel.is_infinite() {
            return Ok(Self {
                mass_mev_c2,
                ..Self::ultra_relativistic()
            });
        }
        let betarel = (1.0 - 1.0 / (gammarel * gammarel)).sqrt();
        Ok(Self::from_consistent(betarel, gammarel, mass_mev_c2))
    }

    /// Proton beam defined by its relativistic beta in (0, 1].
    pub fn from_beta(betarel: Scalar) -> Result<Self, BeamError> {
        Self::from_beta_with_mass(betarel, PROTON_MASS_MEV)
    }

    /// Beam defined by relativistic beta and rest mass energy in MeV.
    pub fn from_beta_with_mass(betarel: Scalar, mass_mev_c2: Scalar) -> Result<Self, BeamError> {
        check_mass(mass_mev_c2)?;
        if !(betarel > 0.0 && betarel <= 1.0) {
            return Err(BeamError::BetaOutOfRange(betarel));
        }
        let gammarel = 1.0 / (1.0 - betarel * betarel).sqrt();
        if gammarel.is_infinite() {
            return Ok(Self {
                mass_mev_c2,
                ..Self::ultra_relativistic()
            });
        }
        Ok(Self::from_consistent(betarel, gammarel, mass_mev_c2))
    }

    /// Proton beam defined by its kinetic energy in MeV.
    pub fn from_kinetic_energy_mev(ekin_mev: Scalar) -> Result<Self, BeamError> {
        Self::from_kinetic_energy_with_mass(ekin_mev, PROTON_MASS_MEV)
    }

    /// Beam defined by kinetic energy and rest mass energy, both in MeV.
    pub fn from_kinetic_energy_with_mass(
        ekin_mev: Scalar,
        mass_mev_c2: Scalar,
    ) -> Result<Self, BeamError> {
        check_mass(mass_mev_c2)?;
        if !(ekin_mev > 0.0) {
            return Err(BeamError::NonPositiveEnergy(ekin_mev));
        }
        Self::from_gamma_with_mass(1.0 + ekin_mev / mass_mev_c2, mass_mev_c2)
    }

    /// Proton beam defined by its momentum in MeV/c.
    pub fn from_momentum_mev_c(p_mev_c: Scalar) -> Result<Self, BeamError> {
        Self::from_momentum_with_mass(p_mev_c, PROTON_MASS_MEV)
    }

    /// Beam defined by momentum in MeV/c and rest mass energy in MeV.
    pub fn from_momentum_with_mass(
        p_mev_c: Scalar,
        mass_mev_c2: Scalar,
    ) -> Result<Self, BeamError> {
        check_mass(mass_mev_c2)?;
        if !(p_mev_c > 0.0) {
            return Err(BeamError::NonPositiveMomentum(p_mev_c));
        }
        // E_tot² = (pc)² + (mc²)² ⇒ γ = E_tot / m
        let etot = (p_mev_c * p_mev_c + mass_mev_c2 * mass_mev_c2).sqrt();
        Self::from_gamma_with_mass(etot / mass_mev_c2, mass_mev_c2)
    }

    /// Replaces the transverse test-beam offset (meters, ≥ 0).
    pub fn with_test_beam_shift(mut self, shift_m: Scalar) -> Result<Self, BeamError> {
        if !(shift_m >= 0.0) {
            return Err(BeamError::NegativeShift(shift_m));
        }
        self.test_beam_shift_m = shift_m;
        Ok(self)
    }

    fn from_consistent(betarel: Scalar, gammarel: Scalar, mass_mev_c2: Scalar) -> Self {
        Self {
            betarel,
            gammarel,
            p_mev_c: gammarel * mass_mev_c2 * betarel,
            ekin_mev: mass_mev_c2 * (gammarel - 1.0),
            mass_mev_c2,
            test_beam_shift_m: DEFAULT_TEST_BEAM_SHIFT_M,
        }
    }

    /// Relativistic beta (v/c), in (0, 1].
    #[must_use]
    pub fn betarel(&self) -> Scalar {
        self.betarel
    }

    /// Lorentz gamma factor, in [1, ∞].
    #[must_use]
    pub fn gammarel(&self) -> Scalar {
        self.gammarel
    }

    /// Momentum in MeV/c.
    #[must_use]
    pub fn momentum_mev_c(&self) -> Scalar {
        self.p_mev_c
    }

    /// Kinetic energy in MeV.
    #[must_use]
    pub fn kinetic_energy_mev(&self) -> Scalar {
        self.ekin_mev
    }

    /// Rest mass energy in MeV/c².
    #[must_use]
    pub fn mass_mev_c2(&self) -> Scalar {
        self.mass_mev_c2
    }

    /// Transverse test-beam offset in meters.
    #[must_use]
    pub fn test_beam_shift(&self) -> Scalar {
        self.test_beam_shift_m
    }

    /// True in the ultra-relativistic limit (γ = ∞).
    #[must_use]
    pub fn is_ultra_relativistic(&self) -> bool {
        self.gammarel.is_infinite()
    }
}

impl Default for Beam {
    fn default() -> Self {
        Self::ultra_relativistic()
    }
}

fn check_mass(mass_mev_c2: Scalar) -> Result<(), BeamError> {
    if mass_mev_c2 > 0.0 && mass_mev_c2.is_finite() {
        Ok(())
    } else {
        Err(BeamError::NonPositiveMass(mass_mev_c2))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn gamma_and_beta_constructors_agree() {
        let by_gamma = Beam::from_gamma(7460.52).expect("valid gamma");
        let by_beta = Beam::from_beta(by_gamma.betarel()).expect("valid beta");
        assert_relative_eq!(by_beta.gammarel(), 7460.52, max_relative = 1.0e-6);
        assert!(by_gamma.betarel() < 1.0);
        assert!(by_gamma.betarel() > 0.999_999);
    }

    #[test]
    fn kinetic_energy_roundtrip() {
        // LHC-like 7 TeV protons
        let beam = Beam::from_kinetic_energy_mev(7.0e6).expect("valid energy");
        assert_relative_eq!(
            beam.kinetic_energy_mev(),
            7.0e6,
            max_relative = 1.0e-12
        );
        assert_relative_eq!(
            beam.gammarel(),
            1.0 + 7.0e6 / PROTON_MASS_MEV,
            max_relative = 1.0e-12
        );
    }

    #[test]
    fn momentum_constructor_matches_relation() {
        let beam = Beam::from_momentum_mev_c(1.0e4).expect("valid momentum");
        let p = beam.gammarel() * beam.mass_mev_c2() * beam.betarel();
        assert_relative_eq!(p, 1.0e4, max_relative = 1.0e-9);
    }

    #[test]
    fn ultra_relativistic_limit_is_default() {
        let beam = Beam::default();
        assert!(beam.is_ultra_relativistic());
        assert_relative_eq!(beam.betarel(), 1.0);
        // beta = 1 exactly also maps to the limit
        let unit = Beam::from_beta(1.0).expect("beta of one");
        assert!(unit.is_ultra_relativistic());
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        assert!(matches!(Beam::from_beta(0.0), Err(BeamError::BetaOutOfRange(_))));
        assert!(matches!(Beam::from_beta(1.5), Err(BeamError::BetaOutOfRange(_))));
        assert!(matches!(Beam::from_gamma(0.5), Err(BeamError::GammaOutOfRange(_))));
        assert!(matches!(
            Beam::from_kinetic_energy_mev(-1.0),
            Err(BeamError::NonPositiveEnergy(_))
        ));
        assert!(matches!(
            Beam::default().with_test_beam_shift(-1.0e-3),
            Err(BeamError::NegativeShift(_))
        ));
    }
}
