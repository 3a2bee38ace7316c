//! Ordinary least squares regression
//!
//! Fits z = β₀ + Σ βⱼ·xⱼ by solving the normal equations
//! (XᵀX)β = Xᵀz on mean-centered features, then recovering the
//! intercept from the means. Centering keeps the system well conditioned
//! when features carry large offsets (elevations, projected coordinates).

use localkrige_core::{Error, Result};
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};

use super::Regressor;
use crate::linalg::solve_dense;

#[derive(Debug, Clone)]
struct OlsFit {
    intercept: f64,
    coefficients: Array1<f64>,
}

/// Linear regression with an intercept term.
#[derive(Debug, Clone, Default)]
pub struct LinearRegression {
    fit: Option<OlsFit>,
}

impl LinearRegression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slope per feature, `None` before `fit`.
    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.fit.as_ref().map(|f| &f.coefficients)
    }

    /// β₀, `None` before `fit`.
    pub fn intercept(&self) -> Option<f64> {
        self.fit.as_ref().map(|f| f.intercept)
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, features: ArrayView2<f64>, targets: ArrayView1<f64>) -> Result<()> {
        let (n, p) = features.dim();
        if n != targets.len() {
            return Err(Error::DimensionMismatch {
                what: "feature rows",
                expected: targets.len(),
                actual: n,
            });
        }
        if n < p + 1 {
            return Err(Error::Algorithm(format!(
                "OLS with {} features requires at least {} samples, got {}",
                p,
                p + 1,
                n
            )));
        }

        let x_mean = features
            .mean_axis(Axis(0))
            .ok_or_else(|| Error::Algorithm("OLS: empty design matrix".into()))?;
        let z_mean = targets.sum() / n as f64;

        let coefficients = if p == 0 {
            Array1::zeros(0)
        } else {
            let centered = &features - &x_mean;
            let zc = &targets - z_mean;

            // Normal equations on centered data
            let xtx = centered.t().dot(&centered);
            let xtz = centered.t().dot(&zc);

            let mut mat: Vec<f64> = xtx.iter().copied().collect();
            let mut rhs = xtz.to_vec();
            Array1::from(solve_dense(p, &mut mat, &mut rhs, "OLS")?)
        };

        let intercept = z_mean - x_mean.dot(&coefficients);
        self.fit = Some(OlsFit {
            intercept,
            coefficients,
        });
        Ok(())
    }

    fn predict(&self, features: ArrayView2<f64>) -> Result<Array1<f64>> {
        let fit = self.fit.as_ref().ok_or(Error::NotTrained)?;
        if features.ncols() != fit.coefficients.len() {
            return Err(Error::DimensionMismatch {
                what: "feature columns",
                expected: fit.coefficients.len(),
                actual: features.ncols(),
            });
        }
        Ok(features.dot(&fit.coefficients) + fit.intercept)
    }
}
