//! Point kriging engine
//!
//! Takes the parallel `xs`, `ys`, `zs` sequences of one neighborhood,
//! fits a variogram of the requested model to them, and kriges a single
//! target location. The kriging flavour is a closed set resolved once,
//! when the engine is built.

use std::fmt;
use std::str::FromStr;

use localkrige_core::{Error, Result};
use serde::{Deserialize, Serialize};

use super::kriging::{ordinary_kriging_point, PointEstimate};
use super::universal_kriging::{self, universal_kriging_point};
use super::variogram::{fit_local_variogram, FittedVariogram, VariogramModel};
use super::SamplePoint;

/// Kriging flavour used for the residual correction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KrigingMethod {
    /// Constant unknown mean within the neighborhood
    #[default]
    Ordinary,
    /// Linear drift {1, x, y} within the neighborhood
    Universal,
}

impl KrigingMethod {
    pub fn name(self) -> &'static str {
        match self {
            KrigingMethod::Ordinary => "ordinary",
            KrigingMethod::Universal => "universal",
        }
    }

    /// Smallest neighborhood the method can solve.
    pub fn min_points(self) -> usize {
        match self {
            KrigingMethod::Ordinary => 2,
            KrigingMethod::Universal => universal_kriging::MIN_POINTS,
        }
    }
}

impl fmt::Display for KrigingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KrigingMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ordinary" => Ok(KrigingMethod::Ordinary),
            "universal" => Ok(KrigingMethod::Universal),
            _ => Err(Error::Configuration(format!(
                "unknown kriging method '{}'; expected 'ordinary' or 'universal'",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone)]
enum Field {
    /// Every sample carries the same value; nothing to fit.
    Constant(f64),
    Fitted(FittedVariogram),
}

/// A kriging engine bound to one neighborhood.
#[derive(Debug, Clone)]
pub struct PointKriging {
    method: KrigingMethod,
    points: Vec<SamplePoint>,
    field: Field,
}

impl PointKriging {
    /// Fit `variogram_model` to the samples `(xs[i], ys[i], zs[i])`.
    ///
    /// # Errors
    /// - `DimensionMismatch` if the three slices differ in length
    /// - `Algorithm` if there are fewer samples than `method.min_points()`
    ///   or the variogram cannot be fitted
    pub fn new(
        method: KrigingMethod,
        xs: &[f64],
        ys: &[f64],
        zs: &[f64],
        variogram_model: VariogramModel,
    ) -> Result<Self> {
        for (what, len) in [("kriging ys", ys.len()), ("kriging zs", zs.len())] {
            if len != xs.len() {
                return Err(Error::DimensionMismatch {
                    what,
                    expected: xs.len(),
                    actual: len,
                });
            }
        }
        if xs.len() < method.min_points() {
            return Err(Error::Algorithm(format!(
                "{} kriging requires at least {} points, got {}",
                method,
                method.min_points(),
                xs.len()
            )));
        }

        let points: Vec<SamplePoint> = xs
            .iter()
            .zip(ys)
            .zip(zs)
            .map(|((&x, &y), &z)| SamplePoint::new(x, y, z))
            .collect();

        let first = zs[0];
        let field = if zs.iter().all(|&z| z == first) {
            Field::Constant(first)
        } else {
            Field::Fitted(fit_local_variogram(&points, variogram_model)?)
        };

        Ok(Self {
            method,
            points,
            field,
        })
    }

    /// Kriging flavour this engine was built for.
    pub fn method(&self) -> KrigingMethod {
        self.method
    }

    /// The fitted variogram, or `None` when the samples were constant.
    pub fn variogram(&self) -> Option<&FittedVariogram> {
        match &self.field {
            Field::Constant(_) => None,
            Field::Fitted(v) => Some(v),
        }
    }

    /// Krige the value at (x, y).
    pub fn execute_point(&self, x: f64, y: f64) -> Result<PointEstimate> {
        let variogram = match &self.field {
            Field::Constant(value) => {
                return Ok(PointEstimate {
                    estimate: *value,
                    variance: 0.0,
                });
            }
            Field::Fitted(v) => v,
        };

        match self.method {
            KrigingMethod::Ordinary => ordinary_kriging_point(&self.points, variogram, x, y),
            KrigingMethod::Universal => universal_kriging_point(&self.points, variogram, x, y),
        }
    }
}
