#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![warn(clippy::all, clippy::cargo, clippy::nursery, missing_docs)]
#![doc = include_str!("../README.md")]

/// Fundamental physical constants used throughout the library.
pub mod constants;
/// Shared numerical primitives (scalar/complex aliases, hardened helpers).
pub mod math;
/// Frequency grid shared by every impedance calculation.
pub mod frequencies;
/// Relativistic beam kinematics.
pub mod beam;
/// Material layers and wall boundaries.
pub mod layer;
/// Vacuum chamber geometry and layer stack.
pub mod chamber;
/// Modified Bessel functions and overflow-safe space-charge products.
pub mod bessel;
/// The transmission-line wall impedance engine.
pub mod wall;
/// Frequency spacing and post-processing helpers.
pub mod sweep;
/// Error types shared between submodules.
pub mod errors;

/// Common exports for downstream crates.
pub mod prelude;
