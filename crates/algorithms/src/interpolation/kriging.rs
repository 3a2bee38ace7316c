//! Ordinary Kriging at a single target location
//!
//! Best Linear Unbiased Estimator (BLUE) for spatial data. Uses a fitted
//! variogram model to compute optimal interpolation weights that minimize
//! estimation variance while satisfying an unbiasedness constraint.
//!
//! The kriging system for n sample points:
//! ```text
//! [γ(x₁,x₁) ... γ(x₁,xₙ) 1] [w₁]   [γ(x₁,x₀)]
//! [   ...     ...    ...    .]  [. ] = [   ...    ]
//! [γ(xₙ,x₁) ... γ(xₙ,xₙ) 1] [wₙ]   [γ(xₙ,x₀)]
//! [  1       ...    1       0] [μ ]   [    1     ]
//! ```
//! where γ is the semivariance from the fitted variogram, x₀ is the
//! target location, and μ is the Lagrange multiplier ensuring Σwᵢ = 1.
//!
//! Reference:
//! Matheron, G. (1963). Principles of geostatistics. Economic Geology.
//! Cressie, N. (1993). Statistics for Spatial Data. Wiley.

use localkrige_core::{Error, Result};
use serde::{Deserialize, Serialize};

use super::variogram::FittedVariogram;
use super::SamplePoint;
use crate::linalg::solve_dense;

/// Targets closer than this to a sample take the sample value exactly.
pub(crate) const SNAP_DISTANCE: f64 = 1e-12;

/// Kriged value at one location
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointEstimate {
    /// Interpolated value
    pub estimate: f64,
    /// Kriging variance (estimation uncertainty), clamped to be non-negative
    pub variance: f64,
}

/// Exact estimate from a sample that coincides with (x0, y0), if any.
pub(crate) fn snap_to_sample(points: &[SamplePoint], x0: f64, y0: f64) -> Option<PointEstimate> {
    points
        .iter()
        .find(|pt| pt.dist(x0, y0) < SNAP_DISTANCE)
        .map(|pt| PointEstimate {
            estimate: pt.value,
            variance: 0.0,
        })
}

/// Fill the upper-left `k × k` block of a row-major `m × m` matrix with
/// pairwise semivariances.
pub(crate) fn fill_variogram_block(
    points: &[SamplePoint],
    variogram: &FittedVariogram,
    m: usize,
    mat: &mut [f64],
) {
    let k = points.len();
    for i in 0..k {
        for j in (i + 1)..k {
            let h = points[i].dist(points[j].x, points[j].y);
            let g = variogram.evaluate(h);
            mat[i * m + j] = g;
            mat[j * m + i] = g;
        }
        // γ(0) = 0 by convention
        mat[i * m + i] = 0.0;
    }
}

/// Divide the upper-left `k × k` semivariance block of a row-major `m × m`
/// matrix, and the matching right-hand side `gamma0`, by their largest
/// entry.
///
/// Kriging weights are unchanged by this. Lagrange and drift multipliers
/// come out divided by the returned factor, so the kriging variance must
/// be multiplied back by it.
pub(crate) fn normalize_semivariances(
    mat: &mut [f64],
    m: usize,
    k: usize,
    gamma0: &mut [f64],
) -> f64 {
    let block_max = (0..k)
        .flat_map(|i| (0..k).map(move |j| i * m + j))
        .fold(0.0_f64, |acc, idx| acc.max(mat[idx].abs()));
    let scale = gamma0.iter().fold(block_max, |acc, g| acc.max(g.abs()));
    if scale <= 0.0 || !scale.is_finite() {
        return 1.0;
    }

    for i in 0..k {
        for j in 0..k {
            mat[i * m + j] /= scale;
        }
    }
    for g in gamma0.iter_mut() {
        *g /= scale;
    }
    scale
}

/// Perform Ordinary Kriging at one target location.
///
/// All `points` take part in the system; neighbor selection is the
/// caller's job.
///
/// # Errors
/// - If fewer than 2 points are provided
/// - If the kriging system is singular
pub fn ordinary_kriging_point(
    points: &[SamplePoint],
    variogram: &FittedVariogram,
    x0: f64,
    y0: f64,
) -> Result<PointEstimate> {
    let k = points.len();
    if k < 2 {
        return Err(Error::Algorithm(
            "Kriging requires at least 2 sample points".into(),
        ));
    }

    if let Some(exact) = snap_to_sample(points, x0, y0) {
        return Ok(exact);
    }

    // Build kriging system (k+1) × (k+1)
    let m = k + 1;
    let mut mat = vec![0.0_f64; m * m];
    let mut rhs = vec![0.0_f64; m];

    fill_variogram_block(points, variogram, m, &mut mat);
    let mut gamma0: Vec<f64> = points
        .iter()
        .map(|pt| variogram.evaluate(pt.dist(x0, y0)))
        .collect();
    let scale = normalize_semivariances(&mut mat, m, k, &mut gamma0);

    for i in 0..k {
        // Lagrange constraint column and row
        mat[i * m + k] = 1.0;
        mat[k * m + i] = 1.0;
    }
    rhs[..k].copy_from_slice(&gamma0);
    rhs[k] = 1.0;

    let solution = solve_dense(m, &mut mat, &mut rhs, "Kriging")?;

    // z₀ = Σ wᵢ · zᵢ
    let estimate: f64 = (0..k).map(|i| solution[i] * points[i].value).sum();

    // σ² = Σ wᵢ·γ(xᵢ,x₀) + μ
    let variance = solution[k] + (0..k).map(|i| solution[i] * gamma0[i]).sum::<f64>();

    Ok(PointEstimate {
        estimate,
        variance: (variance * scale).max(0.0),
    })
}
