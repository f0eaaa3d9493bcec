//! Dense linear algebra helpers.

use crate::error::{ModelError, Result};
use ndarray::{Array1, Array2};

/// Pivots at or below this fraction of their diagonal entry count as zero.
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Cholesky factor `L` of a symmetric positive definite matrix (`A = L Lᵀ`).
///
/// # Errors
/// [`ModelError::SingularMatrix`] if a pivot is not strictly positive,
/// [`ModelError::DimensionMismatch`] if `a` is not square.
pub fn cholesky(a: &Array2<f64>) -> Result<Array2<f64>> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(ModelError::DimensionMismatch {
            expected: n,
            actual: a.ncols(),
        });
    }

    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| l[[i, k]] * l[[j, k]]).sum();
            if i == j {
                let pivot = a[[i, i]] - sum;
                if pivot <= PIVOT_TOLERANCE * a[[i, i]].abs() || !pivot.is_finite() {
                    return Err(ModelError::SingularMatrix);
                }
                l[[i, i]] = pivot.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }
    Ok(l)
}

/// Solve `A x = b` for symmetric positive definite `A`.
pub fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let n = a.nrows();
    if b.len() != n {
        return Err(ModelError::DimensionMismatch {
            expected: n,
            actual: b.len(),
        });
    }
    let l = cholesky(a)?;

    // Forward substitution: L z = b
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let sum: f64 = (0..i).map(|k| l[[i, k]] * z[k]).sum();
        z[i] = (b[i] - sum) / l[[i, i]];
    }

    // Back substitution: Lᵀ x = z
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let sum: f64 = (i + 1..n).map(|k| l[[k, i]] * x[k]).sum();
        x[i] = (z[i] - sum) / l[[i, i]];
    }
    Ok(x)
}
