//! Shared error types used across submodules.

use thiserror::Error;

use crate::beam::BeamError;
use crate::chamber::ChamberError;
use crate::frequencies::FrequencyError;
use crate::layer::LayerError;
use crate::wall::{CalculationError, ConfigurationError};

/// Top-level error type for the crate.
#[derive(Debug, Error)]
pub enum TlwallError {
    /// Wraps frequency-grid construction errors.
    #[error(transparent)]
    Frequency(#[from] FrequencyError),
    /// Wraps beam-kinematics validation errors.
    #[error(transparent)]
    Beam(#[from] BeamError),
    /// Wraps layer validation errors.
    #[error(transparent)]
    Layer(#[from] LayerError),
    /// Wraps chamber validation errors.
    #[error(transparent)]
    Chamber(#[from] ChamberError),
    /// Wraps engine construction errors.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// Wraps per-quantity calculation errors.
    #[error(transparent)]
    Calculation(#[from] CalculationError),
}
