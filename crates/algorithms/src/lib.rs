//! # LocalKrige Algorithms
//!
//! Regression models and local kriging of their residuals.
//!
//! ## Modules
//!
//! - **regression**: the [`Regressor`](regression::Regressor) trait plus
//!   OLS and mean baselines
//! - **interpolation**: k-d tree, variograms, ordinary/universal kriging and
//!   the [`LocalRegressionKriging`](interpolation::LocalRegressionKriging)
//!   estimator

pub mod interpolation;
pub(crate) mod linalg;
mod maybe_rayon;
pub mod regression;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::interpolation::{
        KrigingMethod, LocalPrediction, LocalRegressionKriging, LocalRegressionKrigingParams,
        PointEstimate, VariogramModel,
    };
    pub use crate::regression::{LinearRegression, MeanRegressor, Regressor};
    pub use localkrige_core::prelude::*;
}
