//! Matrix utility functions.

use faer::{Mat, Side};
use thiserror::Error;

/// Failures of the dense linear-algebra helpers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LinalgError {
    #[error("symmetric eigendecomposition did not converge: {0}")]
    EigenNoConvergence(String),

    #[error("{quantity} is not finite")]
    NonFinite { quantity: String },
}

/// Detect columns that are constant (zero variance).
pub fn detect_constant_columns(x: &Mat<f64>, tolerance: f64) -> Vec<bool> {
    let n_cols = x.ncols();
    let n_rows = x.nrows();

    if n_rows == 0 {
        return vec![true; n_cols];
    }

    let mut constant = vec![false; n_cols];

    for j in 0..n_cols {
        let first = x[(0, j)];
        let all_same = (1..n_rows).all(|i| (x[(i, j)] - first).abs() < tolerance);
        constant[j] = all_same;
    }

    constant
}

/// Center a matrix by subtracting column means.
pub fn center_columns(x: &Mat<f64>) -> (Mat<f64>, Vec<f64>) {
    let n_rows = x.nrows();
    let n_cols = x.ncols();

    let mut means = vec![0.0; n_cols];
    let mut centered = Mat::zeros(n_rows, n_cols);

    for j in 0..n_cols {
        let sum: f64 = (0..n_rows).map(|i| x[(i, j)]).sum();
        means[j] = sum / n_rows as f64;

        for i in 0..n_rows {
            centered[(i, j)] = x[(i, j)] - means[j];
        }
    }

    (centered, means)
}

/// Euclidean norm of every column.
pub fn column_norms(x: &Mat<f64>) -> Vec<f64> {
    (0..x.ncols())
        .map(|j| (0..x.nrows()).map(|i| x[(i, j)].powi(2)).sum::<f64>().sqrt())
        .collect()
}

/// Cross-product matrix X'X.
pub fn cross_product(x: &Mat<f64>) -> Mat<f64> {
    let xt = x.transpose().to_owned();
    &xt * x
}

/// Correlation matrix of already centered columns.
///
/// Every column must have a nonzero norm.
pub fn correlation_from_centered(centered: &Mat<f64>) -> Mat<f64> {
    let norms = column_norms(centered);
    let xtx = cross_product(centered);
    Mat::from_fn(xtx.nrows(), xtx.ncols(), |i, j| {
        xtx[(i, j)] / (norms[i] * norms[j])
    })
}

/// Symmetric eigendecomposition with eigenvalues in ascending order.
#[derive(Debug, Clone)]
pub struct SymmetricEigen {
    /// Eigenvalues, ascending.
    pub values: Vec<f64>,
    /// Eigenvectors stored column-wise, matching `values`.
    pub vectors: Mat<f64>,
}

/// Eigendecomposition of a symmetric matrix.
pub fn symmetric_eigen(a: &Mat<f64>) -> Result<SymmetricEigen, LinalgError> {
    let n = a.nrows();
    let eigen = a
        .self_adjoint_eigen(Side::Lower)
        .map_err(|err| LinalgError::EigenNoConvergence(format!("{err:?}")))?;

    let diag = eigen.S().column_vector();
    let basis = eigen.U();

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&lhs, &rhs| diag[lhs].total_cmp(&diag[rhs]));

    let values = order.iter().map(|&k| diag[k]).collect();
    let vectors = Mat::from_fn(n, n, |i, j| basis[(i, order[j])]);

    Ok(SymmetricEigen { values, vectors })
}

/// Moore-Penrose pseudo-inverse of a symmetric positive semi-definite matrix.
#[derive(Debug, Clone)]
pub struct SymmetricPinv {
    /// The generalized inverse.
    pub inverse: Mat<f64>,
    /// Number of eigenvalues kept above the cutoff.
    pub rank: usize,
}

/// Pseudo-inverse of a symmetric matrix.
///
/// Eigenvalues whose magnitude is at most `rel_tolerance` times the largest
/// magnitude are treated as zero. For symmetric input this matches an
/// SVD-based pseudo-inverse.
pub fn symmetric_pinv(a: &Mat<f64>, rel_tolerance: f64) -> Result<SymmetricPinv, LinalgError> {
    symmetric_pinv_with_scale(a, rel_tolerance, 0.0)
}

/// Pseudo-inverse of a symmetric matrix with an external magnitude floor.
///
/// The cutoff is `rel_tolerance * max(largest |eigenvalue|, scale)`. A
/// relative cutoff alone never zeroes a 1 x 1 matrix, so callers that know the
/// magnitude the entries would have without cancellation pass it as `scale`.
pub fn symmetric_pinv_with_scale(
    a: &Mat<f64>,
    rel_tolerance: f64,
    scale: f64,
) -> Result<SymmetricPinv, LinalgError> {
    let n = a.nrows();
    if n == 0 {
        return Ok(SymmetricPinv {
            inverse: Mat::zeros(0, 0),
            rank: 0,
        });
    }

    let eigen = symmetric_eigen(a)?;
    let largest = eigen.values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let cutoff = rel_tolerance * largest.max(scale);

    let kept: Vec<usize> = (0..n)
        .filter(|&k| largest > 0.0 && eigen.values[k].abs() > cutoff)
        .collect();

    let u = &eigen.vectors;
    let inverse = Mat::from_fn(n, n, |i, j| {
        kept.iter()
            .map(|&k| u[(i, k)] * u[(j, k)] / eigen.values[k])
            .sum()
    });

    Ok(SymmetricPinv {
        inverse,
        rank: kept.len(),
    })
}

/// Orthonormal basis (m x (m-1)) for the null space of a nonzero row vector.
///
/// c'c has rank one, so every eigenvector except the one paired with the
/// largest eigenvalue is orthogonal to c.
pub fn row_null_space(c: &[f64]) -> Result<Mat<f64>, LinalgError> {
    let m = c.len();
    if m <= 1 {
        return Ok(Mat::zeros(m, 0));
    }

    let ctc = Mat::from_fn(m, m, |i, j| c[i] * c[j]);
    let eigen = symmetric_eigen(&ctc)?;

    // ascending order, so the last column spans c itself
    Ok(Mat::from_fn(m, m - 1, |i, j| eigen.vectors[(i, j)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_detect_constant_columns() {
        let mut x = Mat::zeros(5, 3);
        for i in 0..5 {
            x[(i, 0)] = 1.0;
            x[(i, 1)] = i as f64;
            x[(i, 2)] = 2.0;
        }

        let constant = detect_constant_columns(&x, 1e-10);
        assert!(constant[0]);
        assert!(!constant[1]);
        assert!(constant[2]);
    }

    #[test]
    fn test_detect_constant_columns_empty() {
        let x = Mat::<f64>::zeros(0, 3);
        let constant = detect_constant_columns(&x, 1e-10);
        assert_eq!(constant.len(), 3);
        assert!(constant.iter().all(|&c| c));
    }

    #[test]
    fn test_center_columns() {
        let x = Mat::from_fn(4, 2, |i, j| (i + 1) as f64 * if j == 0 { 1.0 } else { 10.0 });

        let (centered, means) = center_columns(&x);

        assert_abs_diff_eq!(means[0], 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(means[1], 25.0, epsilon = 1e-12);

        for j in 0..2 {
            let sum: f64 = (0..4).map(|i| centered[(i, j)]).sum();
            assert_abs_diff_eq!(sum, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_correlation_has_unit_diagonal() {
        let x = Mat::from_fn(20, 3, |i, j| ((i * (j + 2)) as f64 * 0.3).sin());
        let (centered, _) = center_columns(&x);
        let corr = correlation_from_centered(&centered);

        for j in 0..3 {
            assert_abs_diff_eq!(corr[(j, j)], 1.0, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(corr[(0, 1)], corr[(1, 0)], epsilon = 1e-12);
    }

    #[test]
    fn test_symmetric_pinv_matches_inverse_for_full_rank() {
        let mut a = Mat::zeros(2, 2);
        a[(0, 0)] = 4.0;
        a[(0, 1)] = 1.0;
        a[(1, 0)] = 1.0;
        a[(1, 1)] = 3.0;

        let pinv = symmetric_pinv(&a, 1e-12).expect("eigendecomposition should succeed");
        assert_eq!(pinv.rank, 2);

        // det = 11
        assert_abs_diff_eq!(pinv.inverse[(0, 0)], 3.0 / 11.0, epsilon = 1e-12);
        assert_abs_diff_eq!(pinv.inverse[(0, 1)], -1.0 / 11.0, epsilon = 1e-12);
        assert_abs_diff_eq!(pinv.inverse[(1, 1)], 4.0 / 11.0, epsilon = 1e-12);
    }

    #[test]
    fn test_symmetric_pinv_rank_deficient() {
        // [[1, 1], [1, 1]] has pseudo-inverse [[1, 1], [1, 1]] / 4
        let a = Mat::from_fn(2, 2, |_, _| 1.0);
        let pinv = symmetric_pinv(&a, 1e-12).expect("eigendecomposition should succeed");

        assert_eq!(pinv.rank, 1);
        for i in 0..2 {
            for j in 0..2 {
                assert_abs_diff_eq!(pinv.inverse[(i, j)], 0.25, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_symmetric_pinv_zero_matrix() {
        let a = Mat::<f64>::zeros(3, 3);
        let pinv = symmetric_pinv(&a, 1e-12).expect("eigendecomposition should succeed");
        assert_eq!(pinv.rank, 0);
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(pinv.inverse[(i, j)], 0.0);
            }
        }
    }

    #[test]
    fn test_symmetric_pinv_scale_floor_zeroes_cancellation() {
        let mut a = Mat::zeros(1, 1);
        a[(0, 0)] = 1e-17;

        let relative = symmetric_pinv(&a, 1e-12).expect("eigendecomposition should succeed");
        assert_eq!(relative.rank, 1);

        let floored =
            symmetric_pinv_with_scale(&a, 1e-12, 1.0).expect("eigendecomposition should succeed");
        assert_eq!(floored.rank, 0);
        assert_eq!(floored.inverse[(0, 0)], 0.0);
    }

    #[test]
    fn test_row_null_space_is_orthonormal_and_orthogonal_to_row() {
        let c = [1.0, -2.0, 0.5, 3.0];
        let basis = row_null_space(&c).expect("eigendecomposition should succeed");

        assert_eq!(basis.nrows(), 4);
        assert_eq!(basis.ncols(), 3);

        for j in 0..3 {
            let dot: f64 = (0..4).map(|i| c[i] * basis[(i, j)]).sum();
            assert_abs_diff_eq!(dot, 0.0, epsilon = 1e-10);

            for k in 0..3 {
                let gram: f64 = (0..4).map(|i| basis[(i, j)] * basis[(i, k)]).sum();
                let expected = if j == k { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(gram, expected, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_row_null_space_single_entry_is_empty() {
        let basis = row_null_space(&[2.0]).expect("trivial");
        assert_eq!(basis.nrows(), 1);
        assert_eq!(basis.ncols(), 0);
    }
}
