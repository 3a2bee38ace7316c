//! Base regression models
//!
//! The local kriging estimator is generic over any [`Regressor`]: a model
//! that can be fitted to a design matrix and then predict from one.
//! - `LinearRegression`: ordinary least squares with an intercept
//! - `MeanRegressor`: constant prediction of the training mean

mod linear;
mod mean;

pub use linear::LinearRegression;
pub use mean::MeanRegressor;

use localkrige_core::Result;
use ndarray::{Array1, ArrayView1, ArrayView2};

/// A trainable regression model.
///
/// Features are shaped `(n_samples, n_features)`. Implementations must
/// accept repeated `fit` calls, each one replacing the previous state, and
/// a `fit` that returns an error must leave the model as it was.
pub trait Regressor {
    /// Train on `features` / `targets`.
    fn fit(&mut self, features: ArrayView2<f64>, targets: ArrayView1<f64>) -> Result<()>;

    /// Predict one value per feature row.
    fn predict(&self, features: ArrayView2<f64>) -> Result<Array1<f64>>;
}

impl<R: Regressor + ?Sized> Regressor for Box<R> {
    fn fit(&mut self, features: ArrayView2<f64>, targets: ArrayView1<f64>) -> Result<()> {
        (**self).fit(features, targets)
    }

    fn predict(&self, features: ArrayView2<f64>) -> Result<Array1<f64>> {
        (**self).predict(features)
    }
}

impl<R: Regressor + ?Sized> Regressor for &mut R {
    fn fit(&mut self, features: ArrayView2<f64>, targets: ArrayView1<f64>) -> Result<()> {
        (**self).fit(features, targets)
    }

    fn predict(&self, features: ArrayView2<f64>) -> Result<Array1<f64>> {
        (**self).predict(features)
    }
}
