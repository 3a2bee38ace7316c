use localkrige_core::{Error, Result};
use ndarray::{Array1, ArrayView1, ArrayView2};

use super::Regressor;

/// Predicts the mean of the training targets for every row.
///
/// With this base model local regression kriging reduces to plain local
/// kriging of the de-meaned field.
#[derive(Debug, Clone, Default)]
pub struct MeanRegressor {
    mean: Option<f64>,
}

impl MeanRegressor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Training mean, `None` before `fit`.
    pub fn mean(&self) -> Option<f64> {
        self.mean
    }
}

impl Regressor for MeanRegressor {
    fn fit(&mut self, features: ArrayView2<f64>, targets: ArrayView1<f64>) -> Result<()> {
        if features.nrows() != targets.len() {
            return Err(Error::DimensionMismatch {
                what: "feature rows",
                expected: targets.len(),
                actual: features.nrows(),
            });
        }
        let mean = targets
            .mean()
            .ok_or_else(|| Error::Algorithm("Mean of an empty target vector".into()))?;
        self.mean = Some(mean);
        Ok(())
    }

    fn predict(&self, features: ArrayView2<f64>) -> Result<Array1<f64>> {
        let mean = self.mean.ok_or(Error::NotTrained)?;
        Ok(Array1::from_elem(features.nrows(), mean))
    }
}
