//! Dense linear solves for the small systems used by kriging and OLS
//!
//! Kriging neighborhoods are typically 4–32 points, so the systems are
//! tiny and a straightforward Gaussian elimination beats pulling in a
//! full linear algebra backend.

use localkrige_core::{Error, Result};

/// Relative pivot tolerance. A pivot smaller than this times the largest
/// absolute matrix entry marks the system as singular.
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Solve `A·x = b` using Gaussian elimination with partial pivoting.
///
/// `mat` is row-major `n × n` and `rhs` has length `n`; both are used as
/// scratch space. `what` names the system in the error message.
pub(crate) fn solve_dense(
    n: usize,
    mat: &mut [f64],
    rhs: &mut [f64],
    what: &str,
) -> Result<Vec<f64>> {
    debug_assert_eq!(mat.len(), n * n);
    debug_assert_eq!(rhs.len(), n);

    let scale = mat.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    if scale == 0.0 || !scale.is_finite() {
        return Err(Error::Algorithm(format!("{}: singular matrix", what)));
    }
    let tolerance = PIVOT_TOLERANCE * scale;

    // Forward elimination
    for col in 0..n {
        let mut max_val = mat[col * n + col].abs();
        let mut max_row = col;
        for row in (col + 1)..n {
            let val = mat[row * n + col].abs();
            if val > max_val {
                max_val = val;
                max_row = row;
            }
        }

        if max_val < tolerance {
            return Err(Error::Algorithm(format!("{}: singular matrix", what)));
        }

        if max_row != col {
            for j in 0..n {
                mat.swap(col * n + j, max_row * n + j);
            }
            rhs.swap(col, max_row);
        }

        let pivot = mat[col * n + col];
        for row in (col + 1)..n {
            let factor = mat[row * n + col] / pivot;
            mat[row * n + col] = 0.0;
            for j in (col + 1)..n {
                mat[row * n + j] -= factor * mat[col * n + j];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    // Back substitution
    let mut x = vec![0.0_f64; n];
    for col in (0..n).rev() {
        let mut sum = rhs[col];
        for j in (col + 1)..n {
            sum -= mat[col * n + j] * x[j];
        }
        x[col] = sum / mat[col * n + col];
    }

    Ok(x)
}
