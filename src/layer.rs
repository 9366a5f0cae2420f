//! Material layers of the chamber wall.
//!
//! A [`Layer`] is one annular shell of the wall, innermost first. Conductor
//! layers resolve a per-frequency surface impedance KZ(f), propagation
//! constant kprop(f) and permeability μ(f) once the shared frequency grid is
//! written into them; vacuum and perfect-conductor layers are handled by
//! dedicated branches of the recursion and carry no arrays.
//!
//! The conductor model is the thick-wall skin-effect formula with the
//! displacement-current term retained:
//!
//! ```text
//! σ_PM = √((2πf·ε)² + σ²)
//! δ    = √(2 / (2πf·μ·σ + j·μ·ε·(2πf)²))
//! δ_M  = √(2 / (2πf·μ·σ − j·μ·ε·(2πf)²))
//! KZ   = (1 + j) / (σ_PM·δ_M)        kprop = (1 − j) / δ
//! ```

use num_complex::Complex;
use thiserror::Error;

use crate::constants::{VACUUM_PERMEABILITY, VACUUM_PERMITTIVITY};
use crate::frequencies::FrequencyGrid;
use crate::math::{CScalar, Scalar, J};

/// Errors raised while building a [`Layer`].
#[derive(Debug, Error)]
pub enum LayerError {
    /// Finite thickness was zero or negative.
    #[error("layer thickness must be positive, got {0} m")]
    NonPositiveThickness(Scalar),
    /// Conductivity was negative.
    #[error("DC conductivity must be non-negative, got {0} S/m")]
    NegativeConductivity(Scalar),
    /// Relative permittivity was not positive.
    #[error("relative permittivity must be positive, got {0}")]
    NonPositivePermittivity(Scalar),
    /// Relative permeability was not positive.
    #[error("relative permeability must be positive, got {0}")]
    NonPositivePermeability(Scalar),
    /// A measured surface-impedance table was empty.
    #[error("measured surface impedance table must contain at least one point")]
    EmptyImpedanceTable,
    /// Frequency and impedance columns of a measured table differ in length.
    #[error("measured surface impedance table has {freqs} frequencies but {values} values")]
    MismatchedImpedanceTable {
        /// Number of frequency points supplied.
        freqs: usize,
        /// Number of impedance values supplied.
        values: usize,
    },
    /// A measured table frequency was not positive.
    #[error("measured table frequencies must be positive, got {0} Hz")]
    NonPositiveTableFrequency(Scalar),
}

/// Radial extent of a layer.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Thickness {
    /// Finite thickness in meters (> 0).
    Finite(Scalar),
    /// Infinitely thick layer; short-circuits the wall recursion.
    Infinite,
}

impl Thickness {
    /// Validated finite thickness in meters.
    pub fn finite(meters: Scalar) -> Result<Self, LayerError> {
        if meters > 0.0 && meters.is_finite() {
            Ok(Self::Finite(meters))
        } else {
            Err(LayerError::NonPositiveThickness(meters))
        }
    }

    /// True for the infinite sentinel.
    #[must_use]
    pub fn is_infinite(&self) -> bool {
        matches!(self, Self::Infinite)
    }
}

/// Electromagnetic class of a layer.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    /// Lossy conductor with a resolved surface impedance.
    Conductor,
    /// Field-free gap; the recursion uses KZ = Z₀ and kprop = 2πf/c.
    Vacuum,
    /// Ideal conductor; shorts the recursion to zero.
    PerfectConductor,
}

/// Measured surface-impedance points, interpolated onto the working grid.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
struct ImpedanceTable {
    freq_hz: Vec<Scalar>,
    kz: Vec<CScalar>,
}

/// One annular shell of the chamber wall.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    kind: LayerKind,
    thickness: Thickness,
    sigma_dc: Scalar,
    epsr: Scalar,
    mur: Scalar,
    measured_kz: Option<ImpedanceTable>,
    freq_hz: Vec<Scalar>,
    kz: Vec<CScalar>,
    kprop: Vec<CScalar>,
    mu: Vec<CScalar>,
}

impl Layer {
    /// Conductor layer with DC conductivity `sigma_dc` in S/m.
    ///
    /// Relative permittivity and permeability default to 1; use
    /// [`Layer::with_relative_permittivity`] / [`Layer::with_relative_permeability`]
    /// to change them.
    pub fn conductor(thickness: Thickness, sigma_dc: Scalar) -> Result<Self, LayerError> {
        if !(sigma_dc >= 0.0) || !sigma_dc.is_finite() {
            return Err(LayerError::NegativeConductivity(sigma_dc));
        }
        Ok(Self {
            kind: LayerKind::Conductor,
            thickness,
            sigma_dc,
            epsr: 1.0,
            mur: 1.0,
            measured_kz: None,
            freq_hz: Vec::new(),
            kz: Vec::new(),
            kprop: Vec::new(),
            mu: Vec::new(),
        })
    }

    /// Vacuum gap of the given thickness.
    #[must_use]
    pub fn vacuum(thickness: Thickness) -> Self {
        Self {
            kind: LayerKind::Vacuum,
            thickness,
            sigma_dc: 0.0,
            epsr: 1.0,
            mur: 1.0,
            measured_kz: None,
            freq_hz: Vec::new(),
            kz: Vec::new(),
            kprop: Vec::new(),
            mu: Vec::new(),
        }
    }

    /// Perfect-conductor shell; its thickness is irrelevant to the recursion.
    #[must_use]
    pub fn perfect_conductor() -> Self {
        Self {
            kind: LayerKind::PerfectConductor,
            thickness: Thickness::Infinite,
            sigma_dc: 0.0,
            epsr: 1.0,
            mur: 1.0,
            measured_kz: None,
            freq_hz: Vec::new(),
            kz: Vec::new(),
            kprop: Vec::new(),
            mu: Vec::new(),
        }
    }

    /// Sets the relative permittivity ε_r (> 0).
    pub fn with_relative_permittivity(mut self, epsr: Scalar) -> Result<Self, LayerError> {
        if !(epsr > 0.0) || !epsr.is_finite() {
            return Err(LayerError::NonPositivePermittivity(epsr));
        }
        self.epsr = epsr;
        Ok(self)
    }

    /// Sets the relative permeability μ_r (> 0).
    pub fn with_relative_permeability(mut self, mur: Scalar) -> Result<Self, LayerError> {
        if !(mur > 0.0) || !mur.is_finite() {
            return Err(LayerError::NonPositivePermeability(mur));
        }
        self.mur = mur;
        Ok(self)
    }

    /// Attaches a measured surface-impedance table.
    ///
    /// The points are interpolated (real and imaginary parts separately,
    /// clamped at the ends) onto the working grid when the grid is written,
    /// overriding the skin-effect KZ. kprop and μ still follow the material
    /// constants.
    pub fn with_measured_surface_impedance(
        mut self,
        freq_hz: Vec<Scalar>,
        kz: Vec<CScalar>,
    ) -> Result<Self, LayerError> {
        if freq_hz.is_empty() {
            return Err(LayerError::EmptyImpedanceTable);
        }
        if freq_hz.len() != kz.len() {
            return Err(LayerError::MismatchedImpedanceTable {
                freqs: freq_hz.len(),
                values: kz.len(),
            });
        }
        if let Some(&bad) = freq_hz.iter().find(|f| !(**f > 0.0)) {
            return Err(LayerError::NonPositiveTableFrequency(bad));
        }
        let mut points: Vec<(Scalar, CScalar)> = freq_hz.into_iter().zip(kz).collect();
        points.sort_by(|a, b| a.0.partial_cmp(&b.0).expect("table frequencies are finite"));
        let (freq_hz, kz) = points.into_iter().unzip();
        self.measured_kz = Some(ImpedanceTable { freq_hz, kz });
        Ok(self)
    }

    /// Electromagnetic class of this layer.
    #[must_use]
    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    /// Radial extent of this layer.
    #[must_use]
    pub fn thickness(&self) -> Thickness {
        self.thickness
    }

    /// DC conductivity in S/m.
    #[must_use]
    pub fn sigma_dc(&self) -> Scalar {
        self.sigma_dc
    }

    /// Writes the shared frequency grid into the layer and resolves the
    /// per-frequency arrays. Called once by the engine at construction;
    /// a previously resolved grid is overwritten.
    pub(crate) fn set_frequency_grid(&mut self, grid: &FrequencyGrid) {
        self.freq_hz = grid.as_slice().to_vec();
        if self.kind != LayerKind::Conductor {
            self.kz.clear();
            self.kprop.clear();
            self.mu.clear();
            return;
        }

        let eps = VACUUM_PERMITTIVITY * self.epsr;
        let mu = VACUUM_PERMEABILITY * self.mur;
        let sigma = self.sigma_dc;
        let n = self.freq_hz.len();

        self.kprop = Vec::with_capacity(n);
        self.kz = Vec::with_capacity(n);
        self.mu = vec![Complex::new(mu, 0.0); n];

        for &f in &self.freq_hz {
            let omega = crate::constants::angular_frequency(f);
            let loss = omega * mu * sigma;
            let disp = mu * eps * omega * omega;
            let delta = (2.0 / Complex::new(loss, disp)).sqrt();
            let delta_m = (2.0 / Complex::new(loss, -disp)).sqrt();
            let sigma_pm = ((omega * eps).powi(2) + sigma * sigma).sqrt();
            self.kprop.push((1.0 - J) / delta);
            self.kz.push((1.0 + J) / (sigma_pm * delta_m));
        }

        if let Some(table) = &self.measured_kz {
            self.kz = interp_complex(&self.freq_hz, &table.freq_hz, &table.kz);
        }
    }

    /// Surface impedance KZ(f) aligned to the grid (empty until the grid is
    /// written; non-empty only for conductor layers).
    #[must_use]
    pub fn kz(&self) -> &[CScalar] {
        &self.kz
    }

    /// Propagation constant kprop(f) aligned to the grid.
    #[must_use]
    pub fn kprop(&self) -> &[CScalar] {
        &self.kprop
    }

    /// Permeability μ(f) in H/m aligned to the grid.
    #[must_use]
    pub fn mu(&self) -> &[CScalar] {
        &self.mu
    }
}

/// Outermost termination of the layer stack.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Boundary {
    /// Open vacuum outside the wall.
    Vacuum,
    /// Ideal conductor backing; disables the inductive bypass.
    PerfectConductor,
    /// Conductive half-space described by a layer (its thickness is ignored).
    Conductor(Layer),
}

impl Boundary {
    /// Writes the shared frequency grid into a conductor boundary.
    pub(crate) fn set_frequency_grid(&mut self, grid: &FrequencyGrid) {
        if let Self::Conductor(layer) = self {
            layer.set_frequency_grid(grid);
        }
    }
}

/// Piecewise-linear interpolation of complex samples, clamped at the ends.
fn interp_complex(x: &[Scalar], xp: &[Scalar], fp: &[CScalar]) -> Vec<CScalar> {
    x.iter()
        .map(|&xi| {
            if xi <= xp[0] {
                return fp[0];
            }
            if xi >= xp[xp.len() - 1] {
                return fp[fp.len() - 1];
            }
            let idx = xp.partition_point(|&p| p < xi);
            let (x0, x1) = (xp[idx - 1], xp[idx]);
            let t = (xi - x0) / (x1 - x0);
            fp[idx - 1] + (fp[idx] - fp[idx - 1]) * t
        })
        .collect()
}
