//! Contrast VIF as a ratio of contrast variances.

use crate::contrast::ContrastVector;
use crate::core::{ContrastVif, DesignMatrix, VifError, VifOptions};
use crate::utils::{
    center_columns, column_norms, detect_constant_columns, symmetric_eigen, LinalgError,
};
use faer::Mat;
use log::debug;

/// Contrast VIF from the closed-form variance ratio.
///
/// Constant columns are removed and every remaining column is centered and
/// scaled to unit norm, so X'X is the correlation matrix R. Then
///
/// VIF = c R⁻¹ c' / c (R∘I)⁻¹ c'
///
/// i.e. the contrast variance under the observed design over the variance
/// with all between-regressor correlations set to zero.
///
/// The weights apply to the standardized regressors. For a single-column
/// contrast this equals the regressor VIF. For other contrasts it also counts
/// the correlation among the contrast's own regressors, so it can differ a lot
/// from the effective regressor method: two regressors correlated at 0.9 give
/// `x1 - x2` a ratio of 10 while its effective regressor may be uncorrelated
/// with everything else.
///
/// Only meaningful when each regressor is a condition-versus-baseline effect
/// (or a parametric modulator with more than two levels).
///
/// # Errors
/// - `InvalidContrast` when the contrast was built for a design with a
///   different number of columns.
/// - `DegenerateContrast` when the contrast weights a constant column.
/// - `SingularMatrix` when R cannot be inverted exactly.
pub fn variance_ratio_vif(
    design: &DesignMatrix,
    label: &str,
    contrast: &ContrastVector,
    options: &VifOptions,
) -> Result<ContrastVif, VifError> {
    options.validate()?;

    let n = design.n_rows();
    if n < 2 {
        return Err(VifError::InsufficientObservations { needed: 2, got: n });
    }
    contrast.check_matches(design)?;

    let names = design.names();
    let constant = detect_constant_columns(design.data(), options.constant_tolerance);
    if let Some(j) = contrast.involved().into_iter().find(|&j| constant[j]) {
        return Err(VifError::DegenerateContrast {
            contrast: contrast.description().to_string(),
            reason: format!("contrast weights the constant column '{}'", names[j]),
        });
    }

    let keep: Vec<usize> = (0..design.n_cols()).filter(|&j| !constant[j]).collect();
    let p = keep.len();
    let c = contrast.select(&keep);

    let raw = Mat::from_fn(n, p, |i, k| design.data()[(i, keep[k])]);
    let (centered, _) = center_columns(&raw);
    let norms = column_norms(&centered);
    let scaled = Mat::from_fn(n, p, |i, k| centered[(i, k)] / norms[k]);

    let xtx = &scaled.transpose().to_owned() * &scaled;
    let eigen = symmetric_eigen(&xtx)?;

    let largest = eigen.values[p - 1];
    if eigen.values[0] <= options.singular_tolerance * largest {
        let null_vector: Vec<f64> = (0..p).map(|k| eigen.vectors[(k, 0)].abs()).collect();
        let top = null_vector.iter().cloned().fold(0.0_f64, f64::max);
        let regressors = (0..p)
            .filter(|&k| null_vector[k] > 1e-3 * top)
            .map(|k| names[keep[k]].clone())
            .collect();
        return Err(VifError::SingularMatrix { regressors });
    }

    // c R⁻¹ c' = Σ_k (u_k · c)² / λ_k
    let true_variance: f64 = (0..p)
        .map(|k| {
            let proj: f64 = (0..p).map(|a| eigen.vectors[(a, k)] * c[a]).sum();
            proj * proj / eigen.values[k]
        })
        .sum();
    let best_variance: f64 = (0..p).map(|a| c[a] * c[a] / xtx[(a, a)]).sum();

    let vif = true_variance / best_variance;
    if !vif.is_finite() {
        return Err(LinalgError::NonFinite {
            quantity: format!("variance ratio of '{label}'"),
        }
        .into());
    }
    debug!("contrast '{label}' variance-ratio VIF = {vif}");

    Ok(ContrastVif {
        label: label.to_string(),
        vif,
        n_involved: contrast.involved().len(),
    })
}
