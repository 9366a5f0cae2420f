//! Vacuum chamber geometry and layer stack.

use thiserror::Error;

use crate::frequencies::FrequencyGrid;
use crate::layer::{Boundary, Layer};
use crate::math::Scalar;

/// Errors raised while building a [`Chamber`].
#[derive(Debug, Error)]
pub enum ChamberError {
    /// A geometric dimension was zero or negative.
    #[error("{name} must be positive, got {value} m")]
    NonPositiveDimension {
        /// Which dimension failed validation.
        name: &'static str,
        /// The offending value.
        value: Scalar,
    },
    /// A beta function was zero or negative.
    #[error("{name} must be positive, got {value} m")]
    NonPositiveBeta {
        /// Which beta function failed validation.
        name: &'static str,
        /// The offending value.
        value: Scalar,
    },
}

/// Cross-section discriminant.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChamberShape {
    /// Circular cross-section; geometric correction factors are trivial.
    Circular,
    /// Any non-circular cross-section with resolved correction factors.
    NonCircular,
}

/// Resolved Yokoya correction factors relating a non-circular cross-section
/// to the circular reference case.
///
/// Deriving these from chamber dimensions (table lookup/interpolation) is a
/// concern of the geometry front end; the engine consumes resolved scalars.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YokoyaFactors {
    /// Horizontal driving (dipolar) factor.
    pub driv_x: Scalar,
    /// Vertical driving (dipolar) factor.
    pub driv_y: Scalar,
    /// Horizontal detuning (quadrupolar) factor.
    pub det_x: Scalar,
    /// Vertical detuning (quadrupolar) factor.
    pub det_y: Scalar,
}

impl YokoyaFactors {
    /// Factors of the circular reference case: driving 1, detuning 0.
    pub const CIRCULAR: Self = Self {
        driv_x: 1.0,
        driv_y: 1.0,
        det_x: 0.0,
        det_y: 0.0,
    };
}

/// Vacuum chamber: geometry, optics, correction factors and wall layers.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Chamber {
    pipe_radius_m: Scalar,
    pipe_length_m: Scalar,
    beta_x: Scalar,
    beta_y: Scalar,
    shape: ChamberShape,
    yokoya: YokoyaFactors,
    layers: Vec<Layer>,
    boundary: Boundary,
    component_name: String,
}

impl Chamber {
    /// Circular chamber with the given pipe radius and length (meters).
    ///
    /// Starts with an empty layer stack and a vacuum boundary; attach the
    /// wall with [`Chamber::with_layers`].
    pub fn circular(pipe_radius_m: Scalar, pipe_length_m: Scalar) -> Result<Self, ChamberError> {
        Self::build(
            pipe_radius_m,
            pipe_length_m,
            ChamberShape::Circular,
            YokoyaFactors::CIRCULAR,
        )
    }

    /// Non-circular chamber with an equivalent pipe radius and resolved
    /// Yokoya factors.
    pub fn non_circular(
        pipe_radius_m: Scalar,
        pipe_length_m: Scalar,
        yokoya: YokoyaFactors,
    ) -> Result<Self, ChamberError> {
        Self::build(pipe_radius_m, pipe_length_m, ChamberShape::NonCircular, yokoya)
    }

    fn build(
        pipe_radius_m: Scalar,
        pipe_length_m: Scalar,
        shape: ChamberShape,
        yokoya: YokoyaFactors,
    ) -> Result<Self, ChamberError> {
        if !(pipe_radius_m > 0.0) || !pipe_radius_m.is_finite() {
            return Err(ChamberError::NonPositiveDimension {
                name: "pipe radius",
                value: pipe_radius_m,
            });
        }
        if !(pipe_length_m > 0.0) || !pipe_length_m.is_finite() {
            return Err(ChamberError::NonPositiveDimension {
                name: "pipe length",
                value: pipe_length_m,
            });
        }
        Ok(Self {
            pipe_radius_m,
            pipe_length_m,
            beta_x: 1.0,
            beta_y: 1.0,
            shape,
            yokoya,
            layers: Vec::new(),
            boundary: Boundary::Vacuum,
            component_name: String::from("el"),
        })
    }

    /// Attaches the wall layers (innermost first) and the outer boundary.
    #[must_use]
    pub fn with_layers(mut self, layers: Vec<Layer>, boundary: Boundary) -> Self {
        self.layers = layers;
        self.boundary = boundary;
        self
    }

    /// Sets the horizontal and vertical beta functions (meters, > 0).
    pub fn with_beta_functions(mut self, beta_x: Scalar, beta_y: Scalar) -> Result<Self, ChamberError> {
        if !(beta_x > 0.0) || !beta_x.is_finite() {
            return Err(ChamberError::NonPositiveBeta {
                name: "beta_x",
                value: beta_x,
            });
        }
        if !(beta_y > 0.0) || !beta_y.is_finite() {
            return Err(ChamberError::NonPositiveBeta {
                name: "beta_y",
                value: beta_y,
            });
        }
        self.beta_x = beta_x;
        self.beta_y = beta_y;
        Ok(self)
    }

    /// Sets the component name used in logs and summaries.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.component_name = name.into();
        self
    }

    /// Pipe radius in meters.
    #[must_use]
    pub fn pipe_radius(&self) -> Scalar {
        self.pipe_radius_m
    }

    /// Pipe length in meters.
    #[must_use]
    pub fn pipe_length(&self) -> Scalar {
        self.pipe_length_m
    }

    /// Horizontal beta function in meters.
    #[must_use]
    pub fn beta_x(&self) -> Scalar {
        self.beta_x
    }

    /// Vertical beta function in meters.
    #[must_use]
    pub fn beta_y(&self) -> Scalar {
        self.beta_y
    }

    /// Cross-section discriminant.
    #[must_use]
    pub fn shape(&self) -> ChamberShape {
        self.shape
    }

    /// Resolved Yokoya correction factors.
    #[must_use]
    pub fn yokoya(&self) -> YokoyaFactors {
        self.yokoya
    }

    /// Wall layers, innermost first (boundary excluded).
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Outer boundary terminating the stack.
    #[must_use]
    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    /// Component name.
    #[must_use]
    pub fn component_name(&self) -> &str {
        &self.component_name
    }

    /// Writes the shared frequency grid into every layer and a conductor
    /// boundary. Called once by the engine at construction.
    pub(crate) fn set_frequency_grid(&mut self, grid: &FrequencyGrid) {
        for layer in &mut self.layers {
            layer.set_frequency_grid(grid);
        }
        self.boundary.set_frequency_grid(grid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::Thickness;

    #[test]
    fn circular_chamber_has_trivial_factors() {
        let chamber = Chamber::circular(0.022, 1.0).expect("valid chamber");
        assert_eq!(chamber.shape(), ChamberShape::Circular);
        assert_eq!(chamber.yokoya(), YokoyaFactors::CIRCULAR);
        assert!(chamber.layers().is_empty());
    }

    #[test]
    fn dimension_validation() {
        assert!(matches!(
            Chamber::circular(0.0, 1.0),
            Err(ChamberError::NonPositiveDimension { name: "pipe radius", .. })
        ));
        assert!(matches!(
            Chamber::circular(0.02, -1.0),
            Err(ChamberError::NonPositiveDimension { name: "pipe length", .. })
        ));
        assert!(matches!(
            Chamber::circular(0.02, 1.0)
                .expect("chamber")
                .with_beta_functions(0.0, 1.0),
            Err(ChamberError::NonPositiveBeta { name: "beta_x", .. })
        ));
    }

    #[test]
    fn layers_and_boundary_are_attached() {
        let copper = Layer::conductor(Thickness::finite(1.0e-3).expect("thickness"), 5.96e7)
            .expect("layer");
        let chamber = Chamber::circular(0.022, 1.0)
            .expect("chamber")
            .with_layers(vec![copper], Boundary::PerfectConductor);
        assert_eq!(chamber.layers().len(), 1);
        assert!(matches!(chamber.boundary(), Boundary::PerfectConductor));
    }
}
