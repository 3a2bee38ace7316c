//! Universal Kriging (UK) at a single target location
//!
//! Extends Ordinary Kriging by incorporating a polynomial drift model
//! (spatial trend) into the kriging system. The trend is modeled as a
//! linear combination of spatial coordinate functions (monomials).
//!
//! The UK system for n sample points with p drift functions:
//! ```text
//! [γ(xᵢ,xⱼ) | fₖ(xᵢ)] [wᵢ]   [γ(xᵢ,x₀)]
//! [-----------+--------] [  ] = [----------]
//! [fₖ(xᵢ)ᵀ  |    0   ] [μₖ]   [fₖ(x₀)   ]
//! ```
//! where fₖ are the linear drift functions {1, x, y}.
//!
//! Reference:
//! Matheron, G. (1969). Le Krigeage Universel. Cahiers du CMMM.
//! Cressie, N. (1993). Statistics for Spatial Data. Wiley.

use localkrige_core::{Error, Result};

use super::kriging::{
    fill_variogram_block, normalize_semivariances, snap_to_sample, PointEstimate,
};
use super::variogram::FittedVariogram;
use super::SamplePoint;
use crate::linalg::solve_dense;

/// Number of drift functions in the linear trend {1, x, y}
pub const DRIFT_TERMS: usize = 3;

/// Smallest neighborhood that can determine the drift and its weights.
pub const MIN_POINTS: usize = DRIFT_TERMS + 1;

/// Drift basis values at (dx, dy).
#[inline]
fn drift_values(dx: f64, dy: f64) -> [f64; DRIFT_TERMS] {
    [1.0, dx, dy]
}

/// Perform Universal Kriging with a linear drift at one target location.
///
/// # Errors
/// - If fewer than [`MIN_POINTS`] points are provided
/// - If the UK system is singular (e.g. collinear samples)
pub fn universal_kriging_point(
    points: &[SamplePoint],
    variogram: &FittedVariogram,
    x0: f64,
    y0: f64,
) -> Result<PointEstimate> {
    let k = points.len();
    let p = DRIFT_TERMS;

    if k < MIN_POINTS {
        return Err(Error::Algorithm(format!(
            "Universal Kriging with linear drift requires at least {} points, got {}",
            MIN_POINTS, k
        )));
    }

    if let Some(exact) = snap_to_sample(points, x0, y0) {
        return Ok(exact);
    }

    // Build UK system: (k + p) × (k + p)
    let m = k + p;
    let mut mat = vec![0.0_f64; m * m];
    let mut rhs = vec![0.0_f64; m];

    fill_variogram_block(points, variogram, m, &mut mat);
    let mut gamma0: Vec<f64> = points
        .iter()
        .map(|pt| variogram.evaluate(pt.dist(x0, y0)))
        .collect();
    let scale = normalize_semivariances(&mut mat, m, k, &mut gamma0);

    // Drift monomials are taken relative to the target. The span of the
    // basis is unchanged, and the block stays well scaled for projected
    // coordinates in the millions.
    for (i, pt) in points.iter().enumerate() {
        let fvals = drift_values(pt.x - x0, pt.y - y0);
        for (l, fv) in fvals.iter().enumerate() {
            mat[i * m + k + l] = *fv;
            mat[(k + l) * m + i] = *fv;
        }
    }
    // Lower-right (p × p) is already zero

    rhs[..k].copy_from_slice(&gamma0);
    let f0 = drift_values(0.0, 0.0);
    rhs[k..].copy_from_slice(&f0);

    let solution = solve_dense(m, &mut mat, &mut rhs, "UK")?;

    let estimate: f64 = (0..k).map(|i| solution[i] * points[i].value).sum();

    let variance = (0..k).map(|i| solution[i] * gamma0[i]).sum::<f64>()
        + (0..p).map(|l| solution[k + l] * f0[l]).sum::<f64>();

    Ok(PointEstimate {
        estimate,
        variance: (variance * scale).max(0.0),
    })
}
