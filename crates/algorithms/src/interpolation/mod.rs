//! Spatial interpolation of regression residuals
//!
//! Building blocks for local kriging at scattered target locations:
//! - KdTree: nearest-neighbor search over the known coordinates
//! - Variogram: empirical variogram computation and model fitting
//! - Ordinary Kriging: BLUE geostatistical interpolation
//! - Universal Kriging: kriging with linear drift
//! - Engine: per-neighborhood variogram fit plus kriging of one target
//! - Local Regression Kriging: any regressor + locally kriged residuals

pub mod engine;
pub mod kdtree;
pub mod kriging;
mod local_regression_kriging;
pub mod universal_kriging;
pub mod variogram;

pub use engine::{KrigingMethod, PointKriging};
pub use kdtree::{KdTree, NearestResult};
pub use kriging::{ordinary_kriging_point, PointEstimate};
pub use local_regression_kriging::{
    LocalPrediction, LocalRegressionKriging, LocalRegressionKrigingParams,
};
pub use localkrige_core::Coordinate;
pub use universal_kriging::universal_kriging_point;
pub use variogram::{
    empirical_variogram, fit_best_variogram, fit_local_variogram, fit_variogram,
    EmpiricalVariogram, FittedVariogram, VariogramModel, VariogramParams,
};

/// A sample point with x, y coordinates and a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

impl SamplePoint {
    pub fn new(x: f64, y: f64, value: f64) -> Self {
        Self { x, y, value }
    }

    /// Squared Euclidean distance to another point
    #[inline]
    pub fn dist_sq(&self, other_x: f64, other_y: f64) -> f64 {
        let dx = self.x - other_x;
        let dy = self.y - other_y;
        dx * dx + dy * dy
    }

    /// Euclidean distance to another point
    #[inline]
    pub fn dist(&self, other_x: f64, other_y: f64) -> f64 {
        self.dist_sq(other_x, other_y).sqrt()
    }
}
