//! Variance Inflation Factor (VIF) for individual regressors.

use crate::core::{DesignMatrix, RegressorVifResult, VifError, VifOptions};
use crate::utils::{
    center_columns, correlation_from_centered, detect_constant_columns, symmetric_eigen,
    symmetric_pinv, LinalgError,
};
use faer::Mat;
use log::{debug, warn};

/// Loadings below this fraction of the largest one are left out when naming
/// the columns of a linear dependency.
const DEPENDENCY_LOADING_FRACTION: f64 = 1e-3;

/// Compute the Variance Inflation Factor of every regressor.
///
/// For regressor j:
///
/// VIF_j = 1 / (1 - R²_j)
///
/// where R²_j comes from regressing x_j on all other regressors plus an
/// intercept. The intercept is handled by centering, and the VIFs are read
/// off the diagonal of the inverse correlation matrix.
///
/// # Interpretation
/// - VIF = 1: No correlation with other regressors
/// - VIF > 5: Moderate multicollinearity (some sources say > 10)
/// - VIF > 10: High multicollinearity
///
/// # Errors
/// - `InsufficientObservations` with fewer than two rows.
/// - `ConstantColumn` when a regressor has zero variance.
/// - `SingularMatrix` when a regressor is an exact linear combination of the
///   others and the intercept. The VIF is infinite there; it is reported as an
///   error naming the dependent regressors rather than as `f64::INFINITY`.
pub fn regressor_vifs(
    design: &DesignMatrix,
    options: &VifOptions,
) -> Result<RegressorVifResult, VifError> {
    options.validate()?;

    let n = design.n_rows();
    let p = design.n_cols();
    let names = design.names();

    if n < 2 {
        return Err(VifError::InsufficientObservations { needed: 2, got: n });
    }
    if n < p + 2 {
        warn!("VIF with {n} observations and {p} regressors is close to degenerate");
    }

    let constant = detect_constant_columns(design.data(), options.constant_tolerance);
    if let Some(j) = constant.iter().position(|&c| c) {
        return Err(VifError::ConstantColumn {
            name: names[j].clone(),
        });
    }

    if p == 1 {
        return Ok(RegressorVifResult::new(vec![(names[0].clone(), 1.0)]));
    }

    let (centered, _) = center_columns(design.data());
    let corr = correlation_from_centered(&centered);
    let eigen = symmetric_eigen(&corr)?;

    let largest = eigen.values[p - 1];
    let cutoff = options.singular_tolerance * largest;
    let null_directions: Vec<usize> = (0..p).filter(|&k| eigen.values[k] <= cutoff).collect();

    if !null_directions.is_empty() {
        let regressors = dependent_columns(&eigen.vectors, &null_directions, names);
        debug!(
            "correlation matrix has {} null direction(s) among {p} regressors",
            null_directions.len()
        );
        return Err(VifError::SingularMatrix { regressors });
    }

    // diag(R⁻¹)_j = Σ_k U_jk² / λ_k
    let mut entries = Vec::with_capacity(p);
    for j in 0..p {
        let vif: f64 = (0..p)
            .map(|k| eigen.vectors[(j, k)].powi(2) / eigen.values[k])
            .sum();
        if !vif.is_finite() {
            return Err(LinalgError::NonFinite {
                quantity: format!("VIF of '{}'", names[j]),
            }
            .into());
        }
        // rounding can leave the diagonal a hair below one
        entries.push((names[j].clone(), if vif < 1.0 { 1.0 } else { vif }));
    }

    Ok(RegressorVifResult::new(entries))
}

/// Compute the VIF of a single regressor.
///
/// Regresses column `index` on every other non-constant column plus an
/// intercept through a generalized inverse, so collinearity among the other
/// columns does not prevent the computation. Other columns with zero variance
/// carry no information and are ignored.
///
/// # Errors
/// - `ConstantColumn` when column `index` has zero variance.
/// - `SingularMatrix` when column `index` lies in the span of the others
///   (R² reaches one).
pub fn regressor_vif(
    design: &DesignMatrix,
    index: usize,
    options: &VifOptions,
) -> Result<f64, VifError> {
    options.validate()?;

    let n = design.n_rows();
    let names = design.names();

    if index >= design.n_cols() {
        return Err(VifError::UnknownColumn {
            name: format!("#{index}"),
        });
    }
    if n < 2 {
        return Err(VifError::InsufficientObservations { needed: 2, got: n });
    }

    let constant = detect_constant_columns(design.data(), options.constant_tolerance);
    if constant[index] {
        return Err(VifError::ConstantColumn {
            name: names[index].clone(),
        });
    }

    let others: Vec<usize> = (0..design.n_cols())
        .filter(|&k| k != index && !constant[k])
        .collect();
    if others.is_empty() {
        return Ok(1.0);
    }

    // target first, then the others
    let mut order = Vec::with_capacity(others.len() + 1);
    order.push(index);
    order.extend_from_slice(&others);

    let subset = Mat::from_fn(n, order.len(), |i, k| design.data()[(i, order[k])]);
    let (centered, _) = center_columns(&subset);
    let corr = correlation_from_centered(&centered);

    let m = others.len();
    let r_oo = Mat::from_fn(m, m, |a, b| corr[(a + 1, b + 1)]);
    let r_o: Vec<f64> = (0..m).map(|a| corr[(a + 1, 0)]).collect();

    let pinv = symmetric_pinv(&r_oo, options.pinv_tolerance)?;
    if pinv.rank < m {
        debug!(
            "regressors other than '{}' have rank {} of {m}",
            names[index], pinv.rank
        );
    }

    // standardized regression coefficients of the target on the others
    let beta: Vec<f64> = (0..m)
        .map(|a| (0..m).map(|b| pinv.inverse[(a, b)] * r_o[b]).sum())
        .collect();
    let r_squared: f64 = (0..m).map(|a| r_o[a] * beta[a]).sum();
    let unexplained = 1.0 - r_squared;

    if !unexplained.is_finite() {
        return Err(LinalgError::NonFinite {
            quantity: format!("R² of '{}' on the other regressors", names[index]),
        }
        .into());
    }
    if unexplained <= options.singular_tolerance {
        let largest = beta.iter().fold(0.0_f64, |acc, b| acc.max(b.abs()));
        let mut regressors = vec![names[index].clone()];
        regressors.extend(
            (0..m)
                .filter(|&a| beta[a].abs() > DEPENDENCY_LOADING_FRACTION * largest)
                .map(|a| names[others[a]].clone()),
        );
        return Err(VifError::SingularMatrix { regressors });
    }

    let vif = 1.0 / unexplained;
    Ok(if vif < 1.0 { 1.0 } else { vif })
}

/// Names of the columns that load on the null directions of the correlation
/// matrix.
fn dependent_columns(
    vectors: &Mat<f64>,
    null_directions: &[usize],
    names: &[String],
) -> Vec<String> {
    let p = vectors.nrows();
    let mut involved = vec![false; p];

    for &k in null_directions {
        let largest = (0..p).fold(0.0_f64, |acc, j| acc.max(vectors[(j, k)].abs()));
        for j in 0..p {
            if vectors[(j, k)].abs() > DEPENDENCY_LOADING_FRACTION * largest {
                involved[j] = true;
            }
        }
    }

    (0..p)
        .filter(|&j| involved[j])
        .map(|j| names[j].clone())
        .collect()
}
