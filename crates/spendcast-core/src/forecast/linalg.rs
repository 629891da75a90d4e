//! Small dense solvers for the model's normal equations

use crate::error::{Error, Result};

/// Solve `(XᵀX + diag(penalties)) β = Xᵀy` for β
///
/// `rows` are the design matrix rows; every row must have `penalties.len()`
/// columns.
pub(crate) fn ridge_regression(rows: &[Vec<f64>], y: &[f64], penalties: &[f64]) -> Result<Vec<f64>> {
    let p = penalties.len();
    let mut gram = vec![0.0; p * p];
    let mut rhs = vec![0.0; p];

    for (row, &target) in rows.iter().zip(y) {
        debug_assert_eq!(row.len(), p);
        for i in 0..p {
            let xi = row[i];
            if xi == 0.0 {
                continue;
            }
            rhs[i] += xi * target;
            for j in 0..=i {
                gram[i * p + j] += xi * row[j];
            }
        }
    }

    for i in 0..p {
        gram[i * p + i] += penalties[i];
        for j in 0..i {
            gram[j * p + i] = gram[i * p + j];
        }
    }

    cholesky_solve(gram, rhs, p)
}

/// Solve `A x = b` for symmetric positive-definite `A` (row-major, `p × p`)
pub(crate) fn cholesky_solve(a: Vec<f64>, b: Vec<f64>, p: usize) -> Result<Vec<f64>> {
    let mut l = vec![0.0; p * p];

    for j in 0..p {
        let mut diag = a[j * p + j];
        for k in 0..j {
            diag -= l[j * p + k] * l[j * p + k];
        }
        if !diag.is_finite() || diag <= 0.0 {
            return Err(Error::ModelFit(format!(
                "Normal equations are not positive definite (pivot {} = {})",
                j, diag
            )));
        }
        let diag = diag.sqrt();
        l[j * p + j] = diag;

        for i in (j + 1)..p {
            let mut sum = a[i * p + j];
            for k in 0..j {
                sum -= l[i * p + k] * l[j * p + k];
            }
            l[i * p + j] = sum / diag;
        }
    }

    // L z = b
    let mut z = b;
    for i in 0..p {
        let mut sum = z[i];
        for k in 0..i {
            sum -= l[i * p + k] * z[k];
        }
        z[i] = sum / l[i * p + i];
    }

    // Lᵀ x = z
    let mut x = z;
    for i in (0..p).rev() {
        let mut sum = x[i];
        for k in (i + 1)..p {
            sum -= l[k * p + i] * x[k];
        }
        x[i] = sum / l[i * p + i];
    }

    if x.iter().any(|v| !v.is_finite()) {
        return Err(Error::ModelFit("Solution has non-finite coefficients".into()));
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cholesky_solve_2x2() {
        // [4 2; 2 3] x = [2; 1] -> x = [0.5, 0]
        let x = cholesky_solve(vec![4.0, 2.0, 2.0, 3.0], vec![2.0, 1.0], 2).unwrap();
        assert!((x[0] - 0.5).abs() < 1e-12);
        assert!(x[1].abs() < 1e-12);
    }

    #[test]
    fn test_cholesky_rejects_indefinite() {
        let err = cholesky_solve(vec![1.0, 2.0, 2.0, 1.0], vec![1.0, 1.0], 2).unwrap_err();
        assert!(matches!(err, Error::ModelFit(_)));
    }

    #[test]
    fn test_ridge_recovers_line() {
        let rows: Vec<Vec<f64>> = (0..5).map(|i| vec![1.0, i as f64]).collect();
        let y: Vec<f64> = (0..5).map(|i| 2.0 + 3.0 * i as f64).collect();
        let beta = ridge_regression(&rows, &y, &[1e-10, 1e-10]).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-6);
        assert!((beta[1] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_ridge_handles_collinear_columns() {
        // Two identical columns: the penalty splits the weight between them
        let rows: Vec<Vec<f64>> = (0..4).map(|_| vec![1.0, 1.0]).collect();
        let y = vec![6.0; 4];
        let beta = ridge_regression(&rows, &y, &[1e-6, 1e-6]).unwrap();
        assert!((beta[0] + beta[1] - 6.0).abs() < 1e-4);
        assert!((beta[0] - beta[1]).abs() < 1e-4);
    }
}
