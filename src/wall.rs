//! Transmission-line wall impedance engine.
//!
//! [`TlWall`] folds a multi-layer chamber wall into effective surface
//! impedances by the classical loaded-line recursion, then derives the full
//! set of coupling-impedance quantities: longitudinal/transverse wall
//! impedance, dipolar/quadrupolar projections, surface forms, direct and
//! indirect space charge, and the combined totals.
//!
//! Every per-frequency array is index-aligned with the engine's
//! [`FrequencyGrid`]. Base quantities are computed once and memoized in
//! write-once cells; repeated retrieval returns bit-identical arrays.

use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::f64::consts::PI;

use log::{debug, trace};
use num_complex::Complex;
use thiserror::Error;

use crate::beam::Beam;
use crate::bessel::{self, BesselOrder, MAX_BESSEL_ARG};
use crate::chamber::{Chamber, ChamberShape};
use crate::constants::{
    angular_frequency, beam_wave_number, FREE_SPACE_IMPEDANCE, SPEED_OF_LIGHT,
    VACUUM_PERMEABILITY, VACUUM_PERMITTIVITY,
};
use crate::frequencies::FrequencyGrid;
use crate::layer::{Boundary, LayerKind, Thickness};
use crate::math::{reduce, safe_recip, tan_stable, CScalar, CVector, RVector, Scalar, J};

/// Default accuracy factor, kept for interface compatibility.
pub const DEFAULT_ACCURACY_FACTOR: Scalar = 0.3;

/// Construction-time validation failures. Fatal and never retried.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// The chamber has no wall layer before the boundary.
    #[error("chamber must have at least one wall layer before the boundary")]
    EmptyLayerStack,
    /// The accuracy factor was zero or negative.
    #[error("accuracy factor must be positive, got {0}")]
    NonPositiveAccuracyFactor(Scalar),
}

/// Failure while computing one derived quantity; other quantities remain
/// independently computable.
#[derive(Debug, Error)]
#[error("failed to compute {quantity}: {source}")]
pub struct CalculationError {
    quantity: &'static str,
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl CalculationError {
    /// Name of the quantity whose computation failed.
    #[must_use]
    pub fn quantity(&self) -> &'static str {
        self.quantity
    }
}

/// Internal faults surfaced through [`CalculationError`].
#[derive(Debug, Error)]
enum WallFault {
    #[error("layer {index} resolves {actual} surface-impedance points for a grid of {expected}")]
    GridMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },
}

/// Transmission-line wall impedance calculator.
///
/// Construction validates the collaborators, writes the frequency grid into
/// every layer and precomputes the finite-beam-size reduction factor.
/// The engine is immutable afterwards; results are memoized per quantity.
///
/// The `OnceCell` caches make the engine `!Sync`: share it across threads
/// only behind external synchronization.
#[derive(Debug)]
pub struct TlWall {
    chamber: Chamber,
    beam: Beam,
    frequencies: FrequencyGrid,
    /// Validated but mathematically inert; reserved for a future
    /// longitudinal correction mode.
    accuracy_factor: Scalar,
    reduction: RVector,
    zlong: OnceCell<CVector>,
    ztrans: OnceCell<CVector>,
    zlong_dsc: OnceCell<CVector>,
    zlong_isc: OnceCell<CVector>,
    ztrans_dsc: OnceCell<CVector>,
    ztrans_isc: OnceCell<CVector>,
}

impl TlWall {
    /// Builds an engine with the default accuracy factor.
    pub fn new(
        chamber: Chamber,
        beam: Beam,
        frequencies: FrequencyGrid,
    ) -> Result<Self, ConfigurationError> {
        Self::with_accuracy_factor(chamber, beam, frequencies, DEFAULT_ACCURACY_FACTOR)
    }

    /// Builds an engine with an explicit accuracy factor (> 0).
    ///
    /// The factor is validated and stored but does not enter any current
    /// computation.
    pub fn with_accuracy_factor(
        mut chamber: Chamber,
        beam: Beam,
        frequencies: FrequencyGrid,
        accuracy_factor: Scalar,
    ) -> Result<Self, ConfigurationError> {
        if chamber.layers().is_empty() {
            return Err(ConfigurationError::EmptyLayerStack);
        }
        if !(accuracy_factor > 0.0) {
            return Err(ConfigurationError::NonPositiveAccuracyFactor(accuracy_factor));
        }

        chamber.set_frequency_grid(&frequencies);

        // Finite-beam-size de-rating: I0(2πf·r/(βcγ))², squared per point.
        // Overflow to +∞ is expected at low energy and high frequency; the
        // later division treats a non-finite factor as an exact zero result.
        let radius = chamber.pipe_radius();
        let betarel = beam.betarel();
        let gammarel = beam.gammarel();
        let reduction = RVector::from_iterator(
            frequencies.len(),
            frequencies.iter().map(|f| {
                let arg = if gammarel.is_infinite() {
                    0.0
                } else {
                    angular_frequency(f) * radius / (betarel * SPEED_OF_LIGHT * gammarel)
                };
                bessel::i0(arg).powi(2)
            }),
        );

        debug!(
            "wall engine for '{}': {} layers, {} frequency points, gamma {:.6e}",
            chamber.component_name(),
            chamber.layers().len(),
            frequencies.len(),
            gammarel,
        );

        Ok(Self {
            chamber,
            beam,
            frequencies,
            accuracy_factor,
            reduction,
            zlong: OnceCell::new(),
            ztrans: OnceCell::new(),
            zlong_dsc: OnceCell::new(),
            zlong_isc: OnceCell::new(),
            ztrans_dsc: OnceCell::new(),
            ztrans_isc: OnceCell::new(),
        })
    }

    /// Chamber under analysis.
    #[must_use]
    pub fn chamber(&self) -> &Chamber {
        &self.chamber
    }

    /// Beam under analysis.
    #[must_use]
    pub fn beam(&self) -> &Beam {
        &self.beam
    }

    /// Shared frequency grid.
    #[must_use]
    pub fn frequencies(&self) -> &FrequencyGrid {
        &self.frequencies
    }

    /// Stored accuracy factor (inert, see [`TlWall::with_accuracy_factor`]).
    #[must_use]
    pub fn accuracy_factor(&self) -> Scalar {
        self.accuracy_factor
    }

    // =======================================================================
    // Wall impedances
    // =======================================================================

    /// Longitudinal wall impedance ZLong(f) in Ω.
    pub fn zlong(&self) -> Result<CVector, CalculationError> {
        self.cached(&self.zlong, "ZLong", |s| s.calc_zlong())
    }

    /// Transverse wall impedance ZTrans(f) in Ω/m.
    pub fn ztrans(&self) -> Result<CVector, CalculationError> {
        self.cached(&self.ztrans, "ZTrans", |s| s.calc_ztrans())
    }

    /// Horizontal dipolar impedance: ZTrans·driv_x·β_x.
    pub fn zdip_x(&self) -> Result<CVector, CalculationError> {
        let factor = self.chamber.yokoya().driv_x * self.chamber.beta_x();
        Ok(&self.ztrans()? * Complex::new(factor, 0.0))
    }

    /// Vertical dipolar impedance: ZTrans·driv_y·β_y.
    pub fn zdip_y(&self) -> Result<CVector, CalculationError> {
        let factor = self.chamber.yokoya().driv_y * self.chamber.beta_y();
        Ok(&self.ztrans()? * Complex::new(factor, 0.0))
    }

    /// Horizontal quadrupolar impedance.
    ///
    /// Non-circular chambers use the detuning factor; circular chambers use
    /// the nonzero formula ZLong·k/(2γ²), k = 2πf/(βc).
    pub fn zquad_x(&self) -> Result<CVector, CalculationError> {
        self.zquad(self.chamber.yokoya().det_x, self.chamber.beta_x())
    }

    /// Vertical quadrupolar impedance (see [`TlWall::zquad_x`]).
    pub fn zquad_y(&self) -> Result<CVector, CalculationError> {
        self.zquad(self.chamber.yokoya().det_y, self.chamber.beta_y())
    }

    fn zquad(&self, det: Scalar, beta_fn: Scalar) -> Result<CVector, CalculationError> {
        match self.chamber.shape() {
            ChamberShape::NonCircular => Ok(&self.ztrans()? * Complex::new(det * beta_fn, 0.0)),
            ChamberShape::Circular => {
                let zlong = self.zlong()?;
                let gammarel = self.beam.gammarel();
                let betarel = self.beam.betarel();
                Ok(CVector::from_iterator(
                    zlong.len(),
                    self.frequencies.iter().zip(zlong.iter()).map(|(f, z)| {
                        let k = beam_wave_number(f, betarel);
                        *z * (k / (2.0 * gammarel * gammarel))
                    }),
                ))
            }
        }
    }

    /// Longitudinal surface impedance: ZLong·2πr.
    pub fn zlong_surf(&self) -> Result<CVector, CalculationError> {
        let factor = 2.0 * PI * self.chamber.pipe_radius();
        Ok(&self.zlong()? * Complex::new(factor, 0.0))
    }

    /// Transverse surface impedance: ZTrans·2π²f·r³/(βc).
    pub fn ztrans_surf(&self) -> Result<CVector, CalculationError> {
        let ztrans = self.ztrans()?;
        let radius = self.chamber.pipe_radius();
        let betarel = self.beam.betarel();
        Ok(CVector::from_iterator(
            ztrans.len(),
            self.frequencies.iter().zip(ztrans.iter()).map(|(f, z)| {
                *z * (2.0 * PI * PI * f * radius.powi(3) / (betarel * SPEED_OF_LIGHT))
            }),
        ))
    }

    // =======================================================================
    // Space-charge impedances
    // =======================================================================

    /// Longitudinal direct space charge (zero in the ultra-relativistic
    /// limit).
    pub fn zlong_dsc(&self) -> Result<CVector, CalculationError> {
        self.cached(&self.zlong_dsc, "ZLongDSC", |s| Ok(s.calc_zlong_space_charge(false)))
    }

    /// Longitudinal indirect space charge (image currents in the wall).
    pub fn zlong_isc(&self) -> Result<CVector, CalculationError> {
        self.cached(&self.zlong_isc, "ZLongISC", |s| Ok(s.calc_zlong_space_charge(true)))
    }

    /// Transverse direct space charge.
    pub fn ztrans_dsc(&self) -> Result<CVector, CalculationError> {
        self.cached(&self.ztrans_dsc, "ZTransDSC", |s| Ok(s.calc_ztrans_dsc()))
    }

    /// Transverse indirect space charge, with an on-axis closed form for a
    /// vanishing test-beam offset.
    pub fn ztrans_isc(&self) -> Result<CVector, CalculationError> {
        self.cached(&self.ztrans_isc, "ZTransISC", |s| Ok(s.calc_ztrans_isc()))
    }

    /// Dipolar direct space charge: ZTransDSC·(driv_x+driv_y)/2.
    pub fn zdip_dsc(&self) -> Result<CVector, CalculationError> {
        let yokoya = self.chamber.yokoya();
        let avg = (yokoya.driv_x + yokoya.driv_y) / 2.0;
        Ok(&self.ztrans_dsc()? * Complex::new(avg, 0.0))
    }

    /// Dipolar indirect space charge: ZTransISC·(driv_x+driv_y)/2.
    pub fn zdip_isc(&self) -> Result<CVector, CalculationError> {
        let yokoya = self.chamber.yokoya();
        let avg = (yokoya.driv_x + yokoya.driv_y) / 2.0;
        Ok(&self.ztrans_isc()? * Complex::new(avg, 0.0))
    }

    /// Quadrupolar direct space charge (zero for circular chambers).
    pub fn zquad_dsc(&self) -> Result<CVector, CalculationError> {
        match self.chamber.shape() {
            ChamberShape::Circular => Ok(self.zeros()),
            ChamberShape::NonCircular => {
                let yokoya = self.chamber.yokoya();
                let avg = (yokoya.det_x + yokoya.det_y) / 2.0;
                Ok(&self.ztrans_dsc()? * Complex::new(avg, 0.0))
            }
        }
    }

    /// Quadrupolar indirect space charge (equals ZTransISC for circular
    /// chambers).
    pub fn zquad_isc(&self) -> Result<CVector, CalculationError> {
        match self.chamber.shape() {
            ChamberShape::Circular => self.ztrans_isc(),
            ChamberShape::NonCircular => {
                let yokoya = self.chamber.yokoya();
                let avg = (yokoya.det_x + yokoya.det_y) / 2.0;
                Ok(&self.ztrans_isc()? * Complex::new(avg, 0.0))
            }
        }
    }

    // =======================================================================
    // Totals (wall + indirect space charge)
    // =======================================================================

    /// ZLong + ZLongISC.
    pub fn zlong_total(&self) -> Result<CVector, CalculationError> {
        Ok(self.zlong()? + self.zlong_isc()?)
    }

    /// ZTrans + ZTransISC.
    pub fn ztrans_total(&self) -> Result<CVector, CalculationError> {
        Ok(self.ztrans()? + self.ztrans_isc()?)
    }

    /// (ZTrans + ZTransISC)·driv_x·β_x.
    pub fn zdip_x_total(&self) -> Result<CVector, CalculationError> {
        let factor = self.chamber.yokoya().driv_x * self.chamber.beta_x();
        Ok(&self.ztrans_total()? * Complex::new(factor, 0.0))
    }

    /// (ZTrans + ZTransISC)·driv_y·β_y.
    pub fn zdip_y_total(&self) -> Result<CVector, CalculationError> {
        let factor = self.chamber.yokoya().driv_y * self.chamber.beta_y();
        Ok(&self.ztrans_total()? * Complex::new(factor, 0.0))
    }

    /// Total horizontal quadrupolar impedance.
    pub fn zquad_x_total(&self) -> Result<CVector, CalculationError> {
        match self.chamber.shape() {
            ChamberShape::Circular => Ok(self.zquad_x()?
                + &self.ztrans_isc()? * Complex::new(self.chamber.beta_x(), 0.0)),
            ChamberShape::NonCircular => {
                let factor = self.chamber.yokoya().det_x * self.chamber.beta_x();
                Ok(&self.ztrans_total()? * Complex::new(factor, 0.0))
            }
        }
    }

    /// Total vertical quadrupolar impedance.
    pub fn zquad_y_total(&self) -> Result<CVector, CalculationError> {
        match self.chamber.shape() {
            ChamberShape::Circular => Ok(self.zquad_y()?
                + &self.ztrans_isc()? * Complex::new(self.chamber.beta_y(), 0.0)),
            ChamberShape::NonCircular => {
                let factor = self.chamber.yokoya().det_y * self.chamber.beta_y();
                Ok(&self.ztrans_total()? * Complex::new(factor, 0.0))
            }
        }
    }

    /// All named impedance arrays as one mapping.
    pub fn all_impedances(&self) -> Result<BTreeMap<&'static str, CVector>, CalculationError> {
        let mut map = BTreeMap::new();
        map.insert("ZLong", self.zlong()?);
        map.insert("ZTrans", self.ztrans()?);
        map.insert("ZDipX", self.zdip_x()?);
        map.insert("ZDipY", self.zdip_y()?);
        map.insert("ZQuadX", self.zquad_x()?);
        map.insert("ZQuadY", self.zquad_y()?);
        map.insert("ZLongSurf", self.zlong_surf()?);
        map.insert("ZTransSurf", self.ztrans_surf()?);
        map.insert("ZLongDSC", self.zlong_dsc()?);
        map.insert("ZLongISC", self.zlong_isc()?);
        map.insert("ZTransDSC", self.ztrans_dsc()?);
        map.insert("ZTransISC", self.ztrans_isc()?);
        map.insert("ZDipDSC", self.zdip_dsc()?);
        map.insert("ZDipISC", self.zdip_isc()?);
        map.insert("ZQuadDSC", self.zquad_dsc()?);
        map.insert("ZQuadISC", self.zquad_isc()?);
        map.insert("ZLongTotal", self.zlong_total()?);
        map.insert("ZTransTotal", self.ztrans_total()?);
        map.insert("ZDipXTotal", self.zdip_x_total()?);
        map.insert("ZDipYTotal", self.zdip_y_total()?);
        map.insert("ZQuadXTotal", self.zquad_x_total()?);
        map.insert("ZQuadYTotal", self.zquad_y_total()?);
        Ok(map)
    }

    // =======================================================================
    // Effective surface impedance recursion
    // =======================================================================

    fn calc_zlong(&self) -> Result<CVector, WallFault> {
        self.check_alignment()?;
        let n = self.frequencies.len();
        let length = self.chamber.pipe_length();
        let radius = self.chamber.pipe_radius();
        Ok(CVector::from_iterator(
            n,
            (0..n).map(|i| {
                let zlong = self.kzeff_at(i) * (length / (2.0 * PI * radius));
                reduce(zlong, self.reduction[i])
            }),
        ))
    }

    fn calc_ztrans(&self) -> Result<CVector, WallFault> {
        self.check_alignment()?;
        let n = self.frequencies.len();
        let length = self.chamber.pipe_length();
        let radius = self.chamber.pipe_radius();
        let betarel = self.beam.betarel();
        let freq = self.frequencies.as_slice();
        Ok(CVector::from_iterator(
            n,
            (0..n).map(|i| {
                let f = freq[i];
                let zlongin = self.kzeffin_at(i) * (length / (2.0 * PI * radius));
                let k_wave = 2.0 * PI * f * (VACUUM_PERMITTIVITY * VACUUM_PERMEABILITY).sqrt()
                    / betarel;
                let ztrans = match self.chamber.boundary() {
                    // No inductive bypass behind an ideal conductor.
                    Boundary::PerfectConductor => {
                        zlongin * (2.0 / (radius * radius * k_wave))
                    }
                    boundary => {
                        let mu_b = match boundary {
                            Boundary::Vacuum => Complex::new(VACUUM_PERMEABILITY, 0.0),
                            Boundary::Conductor(layer) => layer.mu()[i],
                            Boundary::PerfectConductor => unreachable!(),
                        };
                        let inductance =
                            VACUUM_PERMEABILITY * mu_b / (VACUUM_PERMEABILITY + mu_b);
                        let zind = J * f * inductance * length;
                        let bypass = zind / (zlongin + zind);
                        zlongin * bypass * (2.0 / (radius * radius * k_wave))
                    }
                };
                reduce(ztrans, self.reduction[i])
            }),
        ))
    }

    /// Effective surface impedance seen from the beam, boundary first, then
    /// the remaining layers outer→inner (longitudinal branch, with the
    /// finite-beam-size Scil corrections).
    fn kzeff_at(&self, i: usize) -> CScalar {
        let f = self.frequencies.as_slice()[i];
        let radius = self.chamber.pipe_radius();
        let betarel = self.beam.betarel();
        let gammarel = self.beam.gammarel();

        let mut kzeff = self.boundary_kzeff(i);

        for layer in self.chamber.layers().iter().rev() {
            let (kz, kprop) = match layer.kind() {
                LayerKind::Conductor => (layer.kz()[i], layer.kprop()[i]),
                LayerKind::Vacuum => (
                    Complex::new(FREE_SPACE_IMPEDANCE, 0.0),
                    Complex::new(angular_frequency(f) / SPEED_OF_LIGHT, 0.0),
                ),
                LayerKind::PerfectConductor => {
                    // An ideal shell shorts everything outside it.
                    kzeff = Complex::new(0.0, 0.0);
                    continue;
                }
            };

            match layer.thickness() {
                Thickness::Infinite => {
                    let scil = safe_recip(bessel::i0_complex(J * kprop * radius).norm());
                    // The half-space swallows the outer stack entirely.
                    kzeff = kz * (1.0 - scil);
                }
                Thickness::Finite(t) => {
                    let scil = safe_recip(
                        bessel::i0_complex(J * kprop * radius).norm()
                            * bessel::i0_complex(J * kprop * (t * gammarel * betarel)).norm(),
                    );
                    let kz = kz * (1.0 - scil);
                    let tan = tan_stable(kprop * t);
                    kzeff = kz * (kzeff + J * kz * tan) / (kz + J * kzeff * tan);
                }
            }
        }
        kzeff
    }

    /// Inner effective surface impedance (transverse branch, no Scil
    /// corrections).
    fn kzeffin_at(&self, i: usize) -> CScalar {
        let f = self.frequencies.as_slice()[i];

        let mut kzeffin = match self.chamber.boundary() {
            Boundary::PerfectConductor => Complex::new(0.0, 0.0),
            Boundary::Vacuum => Complex::new(FREE_SPACE_IMPEDANCE, 0.0),
            Boundary::Conductor(layer) => layer.kz()[i],
        };

        for layer in self.chamber.layers().iter().rev() {
            let (kz, kprop) = match layer.kind() {
                LayerKind::Conductor => (layer.kz()[i], layer.kprop()[i]),
                LayerKind::Vacuum => (
                    Complex::new(FREE_SPACE_IMPEDANCE, 0.0),
                    Complex::new(angular_frequency(f) / SPEED_OF_LIGHT, 0.0),
                ),
                LayerKind::PerfectConductor => {
                    kzeffin = Complex::new(0.0, 0.0);
                    continue;
                }
            };

            match layer.thickness() {
                Thickness::Infinite => kzeffin = kz,
                Thickness::Finite(t) => {
                    let tan = tan_stable(kprop * t);
                    kzeffin = kz * (kzeffin + J * kz * tan) / (kz + J * kzeffin * tan);
                }
            }
        }
        kzeffin
    }

    /// Longitudinal recursion base case at the boundary.
    fn boundary_kzeff(&self, i: usize) -> CScalar {
        match self.chamber.boundary() {
            Boundary::PerfectConductor => Complex::new(0.0, 0.0),
            Boundary::Vacuum => {
                let f = self.frequencies.as_slice()[i];
                let radius = self.chamber.pipe_radius();
                let betarel = self.beam.betarel();
                let gammarel = self.beam.gammarel();
                let kprop = angular_frequency(f) / SPEED_OF_LIGHT;

                let mut scil = safe_recip(bessel::i0(kprop * radius));
                // The image-field correction vanishes in the
                // ultra-relativistic limit.
                if gammarel.is_finite() {
                    let arg = kprop * radius / (betarel * gammarel);
                    scil -= (bessel::k0(arg) * (1.0 - betarel) / (gammarel * gammarel)).abs();
                }
                Complex::new(FREE_SPACE_IMPEDANCE * (1.0 - scil), 0.0)
            }
            Boundary::Conductor(layer) => layer.kz()[i],
        }
    }

    // =======================================================================
    // Space-charge internals
    // =======================================================================

    /// Longitudinal space charge; `indirect` selects the wall-image term.
    fn calc_zlong_space_charge(&self, indirect: bool) -> CVector {
        let gammarel = self.beam.gammarel();
        if gammarel.is_infinite() {
            return self.zeros();
        }
        let betarel = self.beam.betarel();
        let shift = self.beam.test_beam_shift();
        let radius = self.chamber.pipe_radius();
        let length = self.chamber.pipe_length();
        let gbc = gammarel * betarel * SPEED_OF_LIGHT;

        CVector::from_iterator(
            self.frequencies.len(),
            self.frequencies.iter().map(|f| {
                let k = beam_wave_number(f, betarel);
                let a0 = k * shift / gammarel;
                let product = if indirect {
                    bessel::safe_product_indirect(a0, k * radius / gammarel, BesselOrder::Zero)
                } else {
                    bessel::safe_product_direct(a0, BesselOrder::Zero)
                };
                -J * (f * length * product / (VACUUM_PERMITTIVITY * gbc * gbc))
            }),
        )
    }

    fn calc_ztrans_dsc(&self) -> CVector {
        let gammarel = self.beam.gammarel();
        let shift = self.beam.test_beam_shift();
        // Zero in the ultra-relativistic limit; the on-axis direct term is
        // singular (1/shift²) and defined to zero as well.
        if gammarel.is_infinite() || shift == 0.0 {
            return self.zeros();
        }
        let betarel = self.beam.betarel();
        let length = self.chamber.pipe_length();

        CVector::from_iterator(
            self.frequencies.len(),
            self.frequencies.iter().map(|f| {
                let k = beam_wave_number(f, betarel);
                let a0 = k * shift / gammarel;
                let product =
                    bessel::safe_product_direct(a0, BesselOrder::One) / (shift * shift);
                -J * (FREE_SPACE_IMPEDANCE * length * product
                    / (PI * gammarel * gammarel * betarel))
            }),
        )
    }

    fn calc_ztrans_isc(&self) -> CVector {
        let gammarel = self.beam.gammarel();
        if gammarel.is_infinite() {
            return self.zeros();
        }
        let betarel = self.beam.betarel();
        let shift = self.beam.test_beam_shift();
        let radius = self.chamber.pipe_radius();
        let length = self.chamber.pipe_length();

        CVector::from_iterator(
            self.frequencies.len(),
            self.frequencies.iter().map(|f| {
                let k = beam_wave_number(f, betarel);
                let a1 = k * radius / gammarel;
                if shift == 0.0 {
                    // On-axis closed form, free of the 1/shift² singularity.
                    let ratio = if a1 < MAX_BESSEL_ARG {
                        let r = bessel::k1(a1) / bessel::i1(a1);
                        if r.is_finite() {
                            r
                        } else {
                            0.0
                        }
                    } else {
                        0.0
                    };
                    let term = k * k / (2.0 * gammarel * gammarel) * ratio;
                    J * (FREE_SPACE_IMPEDANCE * length * term
                        / (2.0 * PI * gammarel * gammarel * betarel))
                } else {
                    let a0 = k * shift / gammarel;
                    let product = bessel::safe_product_indirect(a0, a1, BesselOrder::One)
                        / (shift * shift);
                    -J * (FREE_SPACE_IMPEDANCE * length * product
                        / (PI * gammarel * gammarel * betarel))
                }
            }),
        )
    }

    // =======================================================================
    // Plumbing
    // =======================================================================

    fn cached(
        &self,
        cell: &OnceCell<CVector>,
        quantity: &'static str,
        compute: impl FnOnce(&Self) -> Result<CVector, WallFault>,
    ) -> Result<CVector, CalculationError> {
        if let Some(value) = cell.get() {
            return Ok(value.clone());
        }
        let value = compute(self).map_err(|fault| CalculationError {
            quantity,
            source: Box::new(fault),
        })?;
        trace!("{quantity} computed over {} frequency points", value.len());
        Ok(cell.get_or_init(|| value).clone())
    }

    fn zeros(&self) -> CVector {
        CVector::from_element(self.frequencies.len(), Complex::new(0.0, 0.0))
    }

    fn check_alignment(&self) -> Result<(), WallFault> {
        let expected = self.frequencies.len();
        for (index, layer) in self.chamber.layers().iter().enumerate() {
            if layer.kind() == LayerKind::Conductor && layer.kz().len() != expected {
                return Err(WallFault::GridMismatch {
                    index,
                    expected,
                    actual: layer.kz().len(),
                });
            }
        }
        if let Boundary::Conductor(layer) = self.chamber.boundary() {
            if layer.kz().len() != expected {
                return Err(WallFault::GridMismatch {
                    index: self.chamber.layers().len(),
                    expected,
                    actual: layer.kz().len(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::layer::Layer;
    use crate::chamber::YokoyaFactors;

    const COPPER_SIGMA: Scalar = 5.96e7;

    fn copper_layer() -> Layer {
        Layer::conductor(Thickness::finite(1.0e-3).expect("thickness"), COPPER_SIGMA)
            .expect("layer")
    }

    fn copper_chamber(boundary: Boundary) -> Chamber {
        Chamber::circular(0.022, 1.0)
            .expect("chamber")
            .with_layers(vec![copper_layer()], boundary)
    }

    fn lhc_beam() -> Beam {
        Beam::from_gamma(7460.52).expect("beam")
    }

    fn grid() -> FrequencyGrid {
        FrequencyGrid::logspace(1.0e3, 1.0e9, 30).expect("grid")
    }

    #[test]
    fn perfect_conductor_boundary_base_case_is_zero() {
        let wall = TlWall::new(
            copper_chamber(Boundary::PerfectConductor),
            lhc_beam(),
            grid(),
        )
        .expect("engine");
        for i in 0..wall.frequencies().len() {
            let base = wall.boundary_kzeff(i);
            assert_eq!(base, Complex::new(0.0, 0.0));
        }
    }

    #[test]
    fn construction_rejects_invalid_configuration() {
        let empty = Chamber::circular(0.022, 1.0).expect("chamber");
        assert!(matches!(
            TlWall::new(empty, lhc_beam(), grid()),
            Err(ConfigurationError::EmptyLayerStack)
        ));
        assert!(matches!(
            TlWall::with_accuracy_factor(
                copper_chamber(Boundary::Vacuum),
                lhc_beam(),
                grid(),
                0.0
            ),
            Err(ConfigurationError::NonPositiveAccuracyFactor(_))
        ));
    }

    #[test]
    fn infinite_gamma_zeroes_all_space_charge() {
        let wall = TlWall::new(
            copper_chamber(Boundary::Vacuum),
            Beam::ultra_relativistic(),
            grid(),
        )
        .expect("engine");
        for quantity in [
            wall.zlong_dsc().expect("ZLongDSC"),
            wall.zlong_isc().expect("ZLongISC"),
            wall.ztrans_dsc().expect("ZTransDSC"),
            wall.ztrans_isc().expect("ZTransISC"),
        ] {
            assert!(quantity.iter().all(|z| *z == Complex::new(0.0, 0.0)));
        }
    }

    #[test]
    fn zlong_retrieval_is_idempotent() {
        let wall =
            TlWall::new(copper_chamber(Boundary::Vacuum), lhc_beam(), grid()).expect("engine");
        let first = wall.zlong().expect("ZLong");
        let second = wall.zlong().expect("ZLong");
        assert_eq!(first, second);
    }

    #[test]
    fn copper_chamber_has_positive_resistive_wall_impedance() {
        let wall =
            TlWall::new(copper_chamber(Boundary::Vacuum), lhc_beam(), grid()).expect("engine");
        let zlong = wall.zlong().expect("ZLong");
        for (f, z) in wall.frequencies().iter().zip(zlong.iter()) {
            assert!(
                z.re > 0.0,
                "Re(ZLong) = {} at {f} Hz should be positive",
                z.re
            );
        }
    }

    #[test]
    fn elliptical_dipolar_identity() {
        let yokoya = YokoyaFactors {
            driv_x: 0.411_5,
            driv_y: 0.822_9,
            det_x: -0.411_4,
            det_y: 0.411_4,
        };
        let chamber = Chamber::non_circular(0.022, 1.0, yokoya)
            .expect("chamber")
            .with_beta_functions(85.0, 92.0)
            .expect("optics")
            .with_layers(vec![copper_layer()], Boundary::Vacuum);
        let wall = TlWall::new(chamber, lhc_beam(), grid()).expect("engine");

        let ztrans = wall.ztrans().expect("ZTrans");
        let zdip_x = wall.zdip_x().expect("ZDipX");
        let expected = &ztrans * Complex::new(yokoya.driv_x * 85.0, 0.0);
        assert_eq!(zdip_x, expected);
    }

    #[test]
    fn infinite_outer_layer_short_circuits_the_boundary() {
        let layers = || {
            vec![
                copper_layer(),
                Layer::conductor(Thickness::Infinite, 1.45e6).expect("steel"),
            ]
        };
        let vacuum = Chamber::circular(0.022, 1.0)
            .expect("chamber")
            .with_layers(layers(), Boundary::Vacuum);
        let pec = Chamber::circular(0.022, 1.0)
            .expect("chamber")
            .with_layers(layers(), Boundary::PerfectConductor);

        let wall_vacuum = TlWall::new(vacuum, lhc_beam(), grid()).expect("engine");
        let wall_pec = TlWall::new(pec, lhc_beam(), grid()).expect("engine");
        assert_eq!(
            wall_vacuum.zlong().expect("ZLong"),
            wall_pec.zlong().expect("ZLong")
        );
    }

    #[test]
    fn circular_quadrupolar_uses_wall_formula() {
        let beam = Beam::from_gamma(5.0).expect("beam");
        let wall = TlWall::new(copper_chamber(Boundary::Vacuum), beam, grid()).expect("engine");
        let zlong = wall.zlong().expect("ZLong");
        let zquad_x = wall.zquad_x().expect("ZQuadX");
        let gammarel = wall.beam().gammarel();
        for ((f, z), q) in wall.frequencies().iter().zip(zlong.iter()).zip(zquad_x.iter()) {
            let k = beam_wave_number(f, wall.beam().betarel());
            let expected = *z * (k / (2.0 * gammarel * gammarel));
            assert_relative_eq!(q.re, expected.re, max_relative = 1.0e-12);
            assert_relative_eq!(q.im, expected.im, max_relative = 1.0e-12);
        }
        // Quadrupolar and dipolar differ for the circular wall formula.
        assert_ne!(zquad_x, wall.zdip_x().expect("ZDipX"));
    }

    #[test]
    fn aggregate_mapping_contains_every_quantity() {
        let wall = TlWall::new(
            copper_chamber(Boundary::Vacuum),
            Beam::from_gamma(1.5)
                .expect("beam")
                .with_test_beam_shift(2.0e-3)
                .expect("shift"),
            grid(),
        )
        .expect("engine");
        let map = wall.all_impedances().expect("aggregate");
        assert_eq!(map.len(), 22);
        let n = wall.frequencies().len();
        for (name, values) in &map {
            assert_eq!(values.len(), n, "{name} has the wrong length");
            assert!(
                values.iter().all(|z| z.re.is_finite() && z.im.is_finite()),
                "{name} contains non-finite entries"
            );
        }
    }
}
