//! Variogram computation and model fitting
//!
//! Computes the empirical (experimental) variogram from sample points and
//! fits theoretical models (linear, spherical, exponential, Gaussian,
//! hole-effect). Prerequisite for kriging interpolation.
//!
//! The semivariance γ(h) measures spatial dissimilarity as a function of
//! separation distance h:
//! ```text
//! γ(h) = (1/2N(h)) Σ [z(xᵢ) - z(xⱼ)]²   for all pairs with |xᵢ-xⱼ| ∈ h±Δh/2
//! ```
//!
//! Reference:
//! Matheron, G. (1963). Principles of geostatistics. Economic Geology.
//! Cressie, N. (1993). Statistics for Spatial Data. Wiley.

use std::fmt;
use std::str::FromStr;

use localkrige_core::{Error, Result};
use serde::{Deserialize, Serialize};

use super::SamplePoint;

/// Number of lag bins used when fitting a variogram to one kriging
/// neighborhood.
pub const LOCAL_LAGS: usize = 6;

/// Empirical variogram: semivariance values at discrete lag distances.
#[derive(Debug, Clone)]
pub struct EmpiricalVariogram {
    /// Lag distances (bin centers)
    pub lags: Vec<f64>,
    /// Semivariance values γ(h) at each lag
    pub semivariance: Vec<f64>,
    /// Number of point pairs contributing to each lag bin
    pub pair_counts: Vec<usize>,
}

/// Theoretical variogram model type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VariogramModel {
    /// Linear model: γ(h) = c₀ + c·(h/a), unbounded
    Linear,
    /// Spherical model: γ(h) = c₀ + c·[1.5(h/a) - 0.5(h/a)³] for h ≤ a; c₀+c for h > a
    Spherical,
    /// Exponential model: γ(h) = c₀ + c·[1 - exp(-3h/a)]
    Exponential,
    /// Gaussian model: γ(h) = c₀ + c·[1 - exp(-3h²/a²)]
    Gaussian,
    /// Hole-effect model: γ(h) = c₀ + c·[1 - (1 - 3h/a)·exp(-3h/a)]
    HoleEffect,
}

impl VariogramModel {
    /// Every supported model, in identifier order.
    pub const ALL: [VariogramModel; 5] = [
        VariogramModel::Linear,
        VariogramModel::Spherical,
        VariogramModel::Exponential,
        VariogramModel::Gaussian,
        VariogramModel::HoleEffect,
    ];

    /// Identifier accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            VariogramModel::Linear => "linear",
            VariogramModel::Spherical => "spherical",
            VariogramModel::Exponential => "exponential",
            VariogramModel::Gaussian => "gaussian",
            VariogramModel::HoleEffect => "hole-effect",
        }
    }
}

impl fmt::Display for VariogramModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VariogramModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase();
        VariogramModel::ALL
            .into_iter()
            .find(|m| m.name() == key)
            .ok_or_else(|| {
                Error::Configuration(format!(
                    "unknown variogram model '{}'; expected one of linear, spherical, \
                     exponential, gaussian, hole-effect",
                    s
                ))
            })
    }
}

/// Fitted variogram model parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedVariogram {
    /// Model type
    pub model: VariogramModel,
    /// Nugget (c₀): semivariance at h → 0 (measurement error + micro-scale variation)
    pub nugget: f64,
    /// Sill (c₀ + c): semivariance at which the model levels off.
    /// For the linear model, the semivariance reached at h = range.
    pub sill: f64,
    /// Range (a): distance at which semivariance reaches ~95% of sill
    pub range: f64,
    /// Partial sill (c = sill - nugget)
    pub partial_sill: f64,
    /// Residual sum of squares from fitting (lower = better)
    pub rss: f64,
}

impl FittedVariogram {
    /// Evaluate the fitted variogram model at distance h
    pub fn evaluate(&self, h: f64) -> f64 {
        if h < 1e-15 {
            return 0.0;
        }

        let c0 = self.nugget;
        let c = self.partial_sill;
        let a = self.range;

        match self.model {
            VariogramModel::Linear => c0 + c * h / a,
            VariogramModel::Spherical => {
                if h >= a {
                    c0 + c
                } else {
                    let hr = h / a;
                    c0 + c * (1.5 * hr - 0.5 * hr * hr * hr)
                }
            }
            VariogramModel::Exponential => c0 + c * (1.0 - (-3.0 * h / a).exp()),
            VariogramModel::Gaussian => c0 + c * (1.0 - (-3.0 * h * h / (a * a)).exp()),
            VariogramModel::HoleEffect => {
                let hr = 3.0 * h / a;
                c0 + c * (1.0 - (1.0 - hr) * (-hr).exp())
            }
        }
    }
}

/// Parameters for empirical variogram computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariogramParams {
    /// Number of lag bins (default 15)
    pub n_lags: usize,
    /// Maximum lag distance. If None, auto-computed as half the max pairwise distance.
    pub max_lag: Option<f64>,
    /// Lag tolerance as fraction of bin width (default 1.0 = full bin)
    pub lag_tolerance: f64,
}

impl Default for VariogramParams {
    fn default() -> Self {
        Self {
            n_lags: 15,
            max_lag: None,
            lag_tolerance: 1.0,
        }
    }
}

fn max_pairwise_distance(points: &[SamplePoint]) -> f64 {
    let mut max_dist = 0.0_f64;
    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            max_dist = max_dist.max(points[i].dist(points[j].x, points[j].y));
        }
    }
    max_dist
}

/// Compute the empirical (experimental) variogram from sample points.
///
/// # Arguments
/// * `points`: Sample points with (x, y, value)
/// * `params`: Variogram parameters (number of lags, max distance)
///
/// # Returns
/// [`EmpiricalVariogram`] with lag distances, semivariance, and pair counts.
pub fn empirical_variogram(
    points: &[SamplePoint],
    params: VariogramParams,
) -> Result<EmpiricalVariogram> {
    let n = points.len();
    if n < 2 {
        return Err(Error::Algorithm("Need at least 2 points for variogram".into()));
    }
    if params.n_lags == 0 {
        return Err(Error::InvalidParameter {
            name: "n_lags",
            value: "0".into(),
            reason: "must be at least 1".into(),
        });
    }

    // Convention: max lag = half of max distance
    let max_lag = params
        .max_lag
        .unwrap_or_else(|| max_pairwise_distance(points) / 2.0);

    if max_lag <= 0.0 || !max_lag.is_finite() {
        return Err(Error::Algorithm("Max lag must be positive".into()));
    }

    let bin_width = max_lag / params.n_lags as f64;
    let half_tol = bin_width * params.lag_tolerance / 2.0 + 1e-12 * bin_width;

    let lags: Vec<f64> = (0..params.n_lags)
        .map(|k| (k as f64 + 0.5) * bin_width)
        .collect();
    let mut semivariance = vec![0.0_f64; params.n_lags];
    let mut pair_counts = vec![0_usize; params.n_lags];

    for i in 0..n {
        for j in (i + 1)..n {
            let d = points[i].dist(points[j].x, points[j].y);
            if d > max_lag {
                continue;
            }
            let dz = points[i].value - points[j].value;

            // The pair at exactly max_lag belongs to the last bin
            let bin = ((d / bin_width) as usize).min(params.n_lags - 1);
            if (d - lags[bin]).abs() <= half_tol {
                semivariance[bin] += dz * dz;
                pair_counts[bin] += 1;
            }
        }
    }

    // Average: γ(h) = (1/2N) Σ (zᵢ - zⱼ)²
    for k in 0..params.n_lags {
        if pair_counts[k] > 0 {
            semivariance[k] /= 2.0 * pair_counts[k] as f64;
        } else {
            semivariance[k] = f64::NAN;
        }
    }

    Ok(EmpiricalVariogram {
        lags,
        semivariance,
        pair_counts,
    })
}

/// Fit a theoretical variogram model to an empirical variogram.
///
/// Uses least squares weighted by pair count, with a grid search over
/// (nugget, sill, range) for robust fitting.
///
/// # Arguments
/// * `empirical`: Empirical variogram to fit
/// * `model`: Model type to fit
/// * `min_valid_lags`: Minimum number of non-empty lag bins required
///
/// # Returns
/// [`FittedVariogram`] with nugget, sill, range, and goodness of fit.
pub fn fit_variogram(
    empirical: &EmpiricalVariogram,
    model: VariogramModel,
    min_valid_lags: usize,
) -> Result<FittedVariogram> {
    let valid: Vec<(f64, f64, usize)> = empirical
        .lags
        .iter()
        .zip(empirical.semivariance.iter())
        .zip(empirical.pair_counts.iter())
        .filter(|((_, sv), cnt)| !sv.is_nan() && **cnt > 0)
        .map(|((&lag, &sv), &cnt)| (lag, sv, cnt))
        .collect();

    if valid.len() < min_valid_lags.max(1) {
        return Err(Error::Algorithm(format!(
            "Need at least {} valid lag bins to fit variogram, got {}",
            min_valid_lags.max(1),
            valid.len()
        )));
    }

    let max_lag = valid.last().map(|(l, _, _)| *l).unwrap_or(1.0);
    let max_sv = valid.iter().map(|(_, sv, _)| *sv).fold(0.0_f64, f64::max);

    if max_sv <= 0.0 {
        return Err(Error::Algorithm("All semivariance values are zero".into()));
    }

    // Grid search for best (nugget, sill, range)
    let n_nugget = 10;
    let n_sill = 10;
    let n_range = 20;

    let mut best_rss = f64::MAX;
    let mut best_nugget = 0.0;
    let mut best_sill = max_sv;
    let mut best_range = max_lag;

    for in_ in 0..=n_nugget {
        let nugget = max_sv * in_ as f64 / (2.0 * n_nugget as f64);
        for is in 1..=n_sill {
            let sill = max_sv * is as f64 / n_sill as f64;
            if sill <= nugget {
                continue;
            }
            for ir in 1..=n_range {
                let range = max_lag * 2.0 * ir as f64 / n_range as f64;

                let trial = FittedVariogram {
                    model,
                    nugget,
                    sill,
                    range,
                    partial_sill: sill - nugget,
                    rss: 0.0,
                };

                let rss: f64 = valid
                    .iter()
                    .map(|&(lag, sv, cnt)| {
                        let residual = sv - trial.evaluate(lag);
                        cnt as f64 * residual * residual
                    })
                    .sum();

                if rss < best_rss {
                    best_rss = rss;
                    best_nugget = nugget;
                    best_sill = sill;
                    best_range = range;
                }
            }
        }
    }

    Ok(FittedVariogram {
        model,
        nugget: best_nugget,
        sill: best_sill,
        range: best_range,
        partial_sill: best_sill - best_nugget,
        rss: best_rss,
    })
}

/// Fit every model and return the best one (lowest RSS).
pub fn fit_best_variogram(empirical: &EmpiricalVariogram) -> Result<FittedVariogram> {
    let mut best: Option<FittedVariogram> = None;
    for model in VariogramModel::ALL {
        if let Ok(fitted) = fit_variogram(empirical, model, 3)
            && best.as_ref().is_none_or(|b| fitted.rss < b.rss)
        {
            best = Some(fitted);
        }
    }

    best.ok_or_else(|| Error::Algorithm("Could not fit any variogram model".into()))
}

/// Fit `model` to the handful of points in one kriging neighborhood.
///
/// Uses [`LOCAL_LAGS`] bins spanning the full pairwise distance range and
/// accepts a single populated bin, since small neighborhoods rarely
/// produce more distinct separations.
pub fn fit_local_variogram(
    points: &[SamplePoint],
    model: VariogramModel,
) -> Result<FittedVariogram> {
    if points.len() < 2 {
        return Err(Error::Algorithm(
            "Need at least 2 points for a local variogram".into(),
        ));
    }
    let extent = max_pairwise_distance(points);
    if extent <= 0.0 {
        return Err(Error::Algorithm(
            "Local variogram: all neighbors share one location".into(),
        ));
    }

    let emp = empirical_variogram(
        points,
        VariogramParams {
            n_lags: LOCAL_LAGS,
            max_lag: Some(extent),
            lag_tolerance: 1.0,
        },
    )?;
    fit_variogram(&emp, model, 1)
}
