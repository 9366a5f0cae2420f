//! Convenience re-exports for building wall-impedance calculations.

pub use crate::beam::{Beam, BeamError};
pub use crate::bessel::{
    safe_product_direct, safe_product_indirect, BesselOrder, MAX_BESSEL_ARG,
};
pub use crate::chamber::{Chamber, ChamberError, ChamberShape, YokoyaFactors};
pub use crate::constants::*;
pub use crate::errors::TlwallError;
pub use crate::frequencies::{FrequencyGrid, FrequencyError};
pub use crate::layer::{Boundary, Layer, LayerError, LayerKind, Thickness};
pub use crate::math::{CScalar, CVector, RVector, Scalar};
pub use crate::sweep::{linspace, logspace, mag, mag_db, phase_deg, phase_rad};
pub use crate::wall::{
    CalculationError, ConfigurationError, TlWall, DEFAULT_ACCURACY_FACTOR,
};
