//! Contrast VIF through an effective regressor.
//!
//! The contrast-involved regressors X (n x m) are re-expressed in a new basis:
//! one column whose coefficient is exactly the contrast estimate c'β (the
//! effective regressor) and m - 1 columns spanning the rest of the column
//! space of X (the orthogonal complement). Regressors with a zero contrast
//! weight are carried over unchanged as nuisance regressors. Since the new
//! columns are an exact re-basis and nothing is orthogonalized away, the VIF
//! of the effective regressor in the reduced design is the VIF of the
//! contrast.
//!
//! With Q = (X'X)⁺, N an orthonormal basis of null(c) and F1 = (cQc')⁺:
//!
//! ```text
//! con3      = (I - c' F1 c Q) N
//! F3        = (con3' Q con3)⁺
//! effective = X Q c' F1
//! orth      = X Q con3 F3
//! ```

use crate::contrast::{ContrastSpec, ContrastVector};
use crate::core::{ContrastVif, DesignMatrix, VifError, VifOptions};
use crate::diagnostics::vif::regressor_vif;
use crate::utils::{
    center_columns, cross_product, detect_constant_columns, row_null_space, symmetric_pinv,
    symmetric_pinv_with_scale,
};
use faer::{Col, Mat};
use log::{debug, warn};
use std::collections::HashSet;

/// Name of the effective regressor column in a reduced design.
pub const EFFECTIVE_REGRESSOR: &str = "effective_regressor";

/// Prefix of the orthogonal complement columns (`orth_proj0`, `orth_proj1`, ...).
pub const ORTHOGONAL_PREFIX: &str = "orth_proj";

/// Reduced design produced for one contrast.
///
/// Column 0 is the effective regressor, followed by the orthogonal complement
/// columns and then the nuisance regressors in their original order.
#[derive(Debug, Clone)]
pub struct ReducedDesign {
    design: DesignMatrix,
    n_involved: usize,
    n_orthogonal: usize,
    involved_rank: usize,
    dropped_constant: Vec<String>,
}

impl ReducedDesign {
    /// The reduced design matrix.
    pub fn design(&self) -> &DesignMatrix {
        &self.design
    }

    /// The effective regressor column.
    pub fn effective_regressor(&self) -> Col<f64> {
        self.design.column(0)
    }

    /// The orthogonal complement columns.
    pub fn orthogonal_complement(&self) -> Mat<f64> {
        let data = self.design.data();
        Mat::from_fn(data.nrows(), self.n_orthogonal, |i, k| data[(i, k + 1)])
    }

    /// Names of the nuisance regressors, in original order.
    pub fn nuisance_names(&self) -> &[String] {
        &self.design.names()[1 + self.n_orthogonal..]
    }

    /// Number of regressors with a nonzero contrast weight.
    pub fn n_involved(&self) -> usize {
        self.n_involved
    }

    /// Numerical rank of X'X for the contrast-involved regressors.
    pub fn involved_rank(&self) -> usize {
        self.involved_rank
    }

    /// Constant columns removed before the rotation.
    pub fn dropped_constant(&self) -> &[String] {
        &self.dropped_constant
    }
}

/// Builds reduced designs and contrast VIFs by the effective regressor method.
///
/// # Example
///
/// ```rust
/// use contrast_vif::diagnostics::ContrastProjector;
/// use contrast_vif::{ContrastVector, DesignMatrix, VifOptions};
///
/// let design = DesignMatrix::from_columns(vec![
///     ("go", vec![0.0, 1.0, 0.8, 0.1, 0.0, 0.9, 0.2, 0.4]),
///     ("nogo", vec![0.1, 0.9, 0.6, 0.3, 0.2, 0.7, 0.1, 0.6]),
///     ("drift", vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7]),
/// ])?;
///
/// let projector = ContrastProjector::new(VifOptions::default());
/// let contrast = ContrastVector::parse("go - nogo", &design)?;
/// let result = projector.contrast_vif(&design, "go_vs_nogo", &contrast)?;
///
/// assert!(result.vif >= 1.0);
/// # Ok::<(), contrast_vif::VifError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ContrastProjector {
    options: VifOptions,
}

/// Contrast-involved block after centering, with its generalized inverse.
struct InvolvedBlock {
    x: Mat<f64>,
    c: Vec<f64>,
    q: Mat<f64>,
    rank: usize,
}

impl ContrastProjector {
    /// Create a projector with the given options.
    pub fn new(options: VifOptions) -> Self {
        Self { options }
    }

    /// Options in use.
    pub fn options(&self) -> &VifOptions {
        &self.options
    }

    /// Build the reduced design for `contrast`.
    pub fn project(
        &self,
        design: &DesignMatrix,
        contrast: &ContrastVector,
    ) -> Result<ReducedDesign, VifError> {
        self.project_inner(design, contrast, None)
    }

    /// Build the reduced design using a caller-supplied basis for the null
    /// space of the contrast.
    ///
    /// `null_basis` has one row per contrast-involved regressor (in column
    /// order) and one column fewer. Its columns must be orthonormal and
    /// orthogonal to the nonzero contrast weights. The contrast VIF does not
    /// depend on which such basis is used.
    pub fn project_with_null_basis(
        &self,
        design: &DesignMatrix,
        contrast: &ContrastVector,
        null_basis: &Mat<f64>,
    ) -> Result<ReducedDesign, VifError> {
        self.project_inner(design, contrast, Some(null_basis))
    }

    /// VIF of `contrast`, reported under `label`.
    pub fn contrast_vif(
        &self,
        design: &DesignMatrix,
        label: &str,
        contrast: &ContrastVector,
    ) -> Result<ContrastVif, VifError> {
        let reduced = self.project(design, contrast)?;
        self.vif_of_reduced(label, contrast, &reduced)
    }

    /// VIF of a contrast given as an expression or weights.
    pub fn contrast_vif_spec(
        &self,
        design: &DesignMatrix,
        label: &str,
        spec: &ContrastSpec,
    ) -> Result<ContrastVif, VifError> {
        let contrast = spec.resolve(design)?;
        self.contrast_vif(design, label, &contrast)
    }

    /// VIF of the effective regressor in an already reduced design.
    pub fn vif_of_reduced(
        &self,
        label: &str,
        contrast: &ContrastVector,
        reduced: &ReducedDesign,
    ) -> Result<ContrastVif, VifError> {
        let degenerate = |reason: String| VifError::DegenerateContrast {
            contrast: contrast.description().to_string(),
            reason,
        };

        let vif = match regressor_vif(&reduced.design, 0, &self.options) {
            Ok(vif) => vif,
            Err(VifError::SingularMatrix { regressors }) => {
                let others: Vec<&str> = regressors
                    .iter()
                    .skip(1)
                    .map(String::as_str)
                    .collect();
                return Err(degenerate(format!(
                    "effective regressor lies in the span of {}",
                    others.join(", ")
                )));
            }
            Err(VifError::ConstantColumn { .. }) => {
                return Err(degenerate(
                    "effective regressor has zero variance".to_string(),
                ))
            }
            Err(err) => return Err(err),
        };

        debug!("contrast '{label}' VIF = {vif}");

        Ok(ContrastVif {
            label: label.to_string(),
            vif,
            n_involved: reduced.n_involved,
        })
    }

    fn project_inner(
        &self,
        design: &DesignMatrix,
        contrast: &ContrastVector,
        null_basis: Option<&Mat<f64>>,
    ) -> Result<ReducedDesign, VifError> {
        self.options.validate()?;

        let n = design.n_rows();
        if n < 2 {
            return Err(VifError::InsufficientObservations { needed: 2, got: n });
        }
        contrast.check_matches(design)?;

        let degenerate = |reason: String| VifError::DegenerateContrast {
            contrast: contrast.description().to_string(),
            reason,
        };

        let names = design.names();
        let constant = detect_constant_columns(design.data(), self.options.constant_tolerance);
        if let Some(j) = contrast.involved().into_iter().find(|&j| constant[j]) {
            return Err(degenerate(format!(
                "contrast weights the constant column '{}'",
                names[j]
            )));
        }

        let dropped_constant: Vec<String> = (0..design.n_cols())
            .filter(|&j| constant[j])
            .map(|j| names[j].clone())
            .collect();
        if !dropped_constant.is_empty() {
            debug!("dropping constant columns {dropped_constant:?}");
        }

        let involved = contrast.involved();
        let nuisance: Vec<usize> = contrast
            .nuisance()
            .into_iter()
            .filter(|&j| !constant[j])
            .collect();
        let m = involved.len();

        debug!(
            "contrast '{}': {m} involved, {} nuisance regressors",
            contrast.description(),
            nuisance.len()
        );

        let block = self.involved_block(design, contrast, &involved)?;
        let InvolvedBlock { x, c, q, rank } = &block;

        // c Q, a row of length m
        let cq: Vec<f64> = (0..m)
            .map(|b| (0..m).map(|a| c[a] * q[(a, b)]).sum())
            .collect();
        let cqc: f64 = (0..m).map(|a| cq[a] * c[a]).sum();

        // c must lie in the row space of X: c Q X'X == c
        let xtx = cross_product(x);
        let c_norm = c.iter().map(|w| w * w).sum::<f64>().sqrt();
        let residual = (0..m)
            .map(|b| {
                let projected: f64 = (0..m).map(|a| cq[a] * xtx[(a, b)]).sum();
                (c[b] - projected).powi(2)
            })
            .sum::<f64>()
            .sqrt();
        let estimability_tolerance = self.options.singular_tolerance.sqrt();

        if !(cqc.is_finite() && cqc > 0.0) || residual > estimability_tolerance * c_norm {
            return Err(degenerate(
                "contrast is not in the row space of its regressors".to_string(),
            ));
        }
        let f1 = 1.0 / cqc;

        // effective = X Q c' F1
        let w_eff: Vec<f64> = cq.iter().map(|v| v * f1).collect();
        let effective = Col::from_fn(n, |i| (0..m).map(|a| x[(i, a)] * w_eff[a]).sum());

        let orth = if m > 1 {
            let basis = match null_basis {
                Some(basis) => {
                    self.check_null_basis(contrast, c, basis)?;
                    basis.clone()
                }
                None => row_null_space(c)?,
            };
            orthogonal_complement(x, c, q, &cq, f1, &basis, self.options.pinv_tolerance)?
        } else {
            Mat::zeros(n, 0)
        };

        let n_orthogonal = orth.ncols();
        let n_cols = 1 + n_orthogonal + nuisance.len();
        let data = Mat::from_fn(n, n_cols, |i, k| {
            if k == 0 {
                effective[i]
            } else if k <= n_orthogonal {
                orth[(i, k - 1)]
            } else {
                design.data()[(i, nuisance[k - 1 - n_orthogonal])]
            }
        });

        let nuisance_names: Vec<String> = nuisance.iter().map(|&j| names[j].clone()).collect();
        let mut taken: HashSet<String> = nuisance_names.iter().cloned().collect();
        let mut reduced_names = Vec::with_capacity(n_cols);
        reduced_names.push(unique_name(EFFECTIVE_REGRESSOR, &mut taken));
        for k in 0..n_orthogonal {
            reduced_names.push(unique_name(&format!("{ORTHOGONAL_PREFIX}{k}"), &mut taken));
        }
        reduced_names.extend(nuisance_names);

        Ok(ReducedDesign {
            design: DesignMatrix::new(reduced_names, data)?,
            n_involved: m,
            n_orthogonal,
            involved_rank: *rank,
            dropped_constant,
        })
    }

    /// Center the involved columns and compute Q = (X'X)⁺.
    fn involved_block(
        &self,
        design: &DesignMatrix,
        contrast: &ContrastVector,
        involved: &[usize],
    ) -> Result<InvolvedBlock, VifError> {
        let n = design.n_rows();
        let m = involved.len();

        let raw = Mat::from_fn(n, m, |i, a| design.data()[(i, involved[a])]);
        let (x, _) = center_columns(&raw);
        let c = contrast.select(involved);

        let pinv = symmetric_pinv(&cross_product(&x), self.options.pinv_tolerance)?;
        if pinv.rank < m {
            warn!(
                "contrast '{}': involved regressors have rank {} of {m}",
                contrast.description(),
                pinv.rank
            );
        }

        Ok(InvolvedBlock {
            x,
            c,
            q: pinv.inverse,
            rank: pinv.rank,
        })
    }

    fn check_null_basis(
        &self,
        contrast: &ContrastVector,
        c: &[f64],
        basis: &Mat<f64>,
    ) -> Result<(), VifError> {
        let m = c.len();
        let invalid = |reason: String| VifError::InvalidContrast {
            contrast: contrast.description().to_string(),
            reason,
        };

        if basis.nrows() != m || basis.ncols() != m - 1 {
            return Err(invalid(format!(
                "null-space basis must be {m} x {}, got {} x {}",
                m - 1,
                basis.nrows(),
                basis.ncols()
            )));
        }

        let c_norm = c.iter().map(|w| w * w).sum::<f64>().sqrt();
        let tolerance = self.options.singular_tolerance.sqrt();
        for j in 0..m - 1 {
            let dot: f64 = (0..m).map(|a| c[a] * basis[(a, j)]).sum();
            if dot.abs() > tolerance * c_norm {
                return Err(invalid(format!(
                    "null-space basis column {j} is not orthogonal to the contrast"
                )));
            }
            for k in 0..m - 1 {
                let gram: f64 = (0..m).map(|a| basis[(a, j)] * basis[(a, k)]).sum();
                let expected = if j == k { 1.0 } else { 0.0 };
                if (gram - expected).abs() > tolerance {
                    return Err(invalid("null-space basis is not orthonormal".to_string()));
                }
            }
        }

        Ok(())
    }
}

/// orth = X Q con3 F3 with con3 = (I - c' F1 c Q) N and F3 = (con3' Q con3)⁺.
fn orthogonal_complement(
    x: &Mat<f64>,
    c: &[f64],
    q: &Mat<f64>,
    cq: &[f64],
    f1: f64,
    null_basis: &Mat<f64>,
    pinv_tolerance: f64,
) -> Result<Mat<f64>, VifError> {
    let m = c.len();
    let k = null_basis.ncols();

    // drop from each null-space direction its component along the contrast
    let con3 = Mat::from_fn(m, k, |a, j| {
        let along: f64 = (0..m).map(|b| cq[b] * null_basis[(b, j)]).sum();
        null_basis[(a, j)] - c[a] * f1 * along
    });

    let q_con3 = q * &con3;
    let con3t = con3.transpose().to_owned();
    let gram = &con3t * &q_con3;

    // magnitude of con3' Q con3 without cancellation, so directions that Q
    // annihilates are dropped instead of inverted
    let q_trace: f64 = (0..m).map(|a| q[(a, a)]).sum();
    let con3_norm = (0..k)
        .map(|j| (0..m).map(|a| con3[(a, j)].powi(2)).sum::<f64>())
        .fold(0.0_f64, f64::max);
    let f3 = symmetric_pinv_with_scale(&gram, pinv_tolerance, q_trace * con3_norm)?;
    if f3.rank < k {
        debug!("orthogonal complement has rank {} of {k}", f3.rank);
    }

    let weights = &q_con3 * &f3.inverse;
    Ok(x * &weights)
}

fn unique_name(base: &str, taken: &mut HashSet<String>) -> String {
    let mut name = base.to_string();
    while taken.contains(&name) {
        name.push('_');
    }
    taken.insert(name.clone());
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::vif::regressor_vifs;
    use approx::assert_relative_eq;

    fn wavy_design() -> DesignMatrix {
        DesignMatrix::new(
            vec!["a", "b", "c", "d"],
            Mat::from_fn(60, 4, |i, j| {
                let t = i as f64;
                match j {
                    0 => (t * 0.31).sin() + 0.4 * (t * 0.07).cos(),
                    1 => (t * 0.31).sin() + 0.6 * (t * 0.13).sin(),
                    2 => (t * 0.05).cos() + 0.2 * (t * 0.31).sin(),
                    _ => (t * 0.19).sin(),
                }
            }),
        )
        .expect("valid design")
    }

    #[test]
    fn test_reduced_layout() {
        let design = wavy_design();
        let contrast = ContrastVector::parse("a - b + c", &design).expect("valid contrast");
        let reduced = ContrastProjector::default()
            .project(&design, &contrast)
            .expect("estimable contrast");

        assert_eq!(
            reduced.design().names(),
            &["effective_regressor", "orth_proj0", "orth_proj1", "d"]
        );
        assert_eq!(reduced.n_involved(), 3);
        assert_eq!(reduced.involved_rank(), 3);
        assert_eq!(reduced.nuisance_names(), &["d".to_string()]);
    }

    #[test]
    fn test_effective_regressor_orthogonal_to_complement() {
        let design = wavy_design();
        let contrast = ContrastVector::parse("a - b + c", &design).expect("valid contrast");
        let reduced = ContrastProjector::default()
            .project(&design, &contrast)
            .expect("estimable contrast");

        let eff = reduced.effective_regressor();
        let orth = reduced.orthogonal_complement();
        for k in 0..orth.ncols() {
            let dot: f64 = (0..eff.nrows()).map(|i| eff[i] * orth[(i, k)]).sum();
            assert!(dot.abs() < 1e-8, "dot with orth_proj{k} = {dot}");
        }
    }

    #[test]
    fn test_effective_coefficient_is_contrast_estimate() {
        // regress y = X beta on the reduced design; the effective regressor's
        // coefficient must equal c'beta
        let design = wavy_design();
        let contrast = ContrastVector::parse("2*a - b", &design).expect("valid contrast");
        let reduced = ContrastProjector::default()
            .project(&design, &contrast)
            .expect("estimable contrast");

        let (xc, _) = center_columns(&Mat::from_fn(60, 2, |i, j| design.data()[(i, j)]));
        let beta = [1.5, -0.5];
        let y = Col::from_fn(60, |i| xc[(i, 0)] * beta[0] + xc[(i, 1)] * beta[1]);

        // effective and orth are orthogonal, so the coefficient is a simple projection
        let eff = reduced.effective_regressor();
        let num: f64 = (0..60).map(|i| eff[i] * y[i]).sum();
        let den: f64 = (0..60).map(|i| eff[i] * eff[i]).sum();

        assert_relative_eq!(num / den, 2.0 * 1.5 + 0.5, epsilon = 1e-8);
    }

    #[test]
    fn test_single_column_contrast_matches_regressor_vif() {
        let design = wavy_design();
        let opts = VifOptions::default();
        let regressor = regressor_vifs(&design, &opts).expect("non-degenerate");

        let projector = ContrastProjector::new(opts);
        for (j, name) in design.names().iter().enumerate() {
            let contrast = ContrastVector::parse(name, &design).expect("valid contrast");
            let result = projector
                .contrast_vif(&design, name, &contrast)
                .expect("estimable contrast");
            assert_relative_eq!(result.vif, regressor.values()[j], max_relative = 1e-8);
            assert_eq!(result.n_involved, 1);
        }
    }

    #[test]
    fn test_name_clash_with_nuisance_column() {
        let design = DesignMatrix::new(
            vec!["x", "y", "orth_proj0"],
            Mat::from_fn(20, 3, |i, j| ((i * (j + 1)) as f64 * 0.4).sin()),
        )
        .expect("valid design");
        let contrast = ContrastVector::parse("x - y", &design).expect("valid contrast");
        let reduced = ContrastProjector::default()
            .project(&design, &contrast)
            .expect("estimable contrast");

        assert_eq!(
            reduced.design().names(),
            &["effective_regressor", "orth_proj0_", "orth_proj0"]
        );
    }

    #[test]
    fn test_constant_column_in_contrast_is_degenerate() {
        let design = DesignMatrix::new(
            vec!["x", "intercept"],
            Mat::from_fn(10, 2, |i, j| if j == 0 { i as f64 } else { 1.0 }),
        )
        .expect("valid design");
        let contrast = ContrastVector::parse("x - intercept", &design).expect("valid contrast");

        let err = ContrastProjector::default()
            .project(&design, &contrast)
            .unwrap_err();
        assert!(err.is_degenerate());
    }

    #[test]
    fn test_bad_null_basis_rejected() {
        let design = wavy_design();
        let contrast = ContrastVector::parse("a - b", &design).expect("valid contrast");

        let mut basis = Mat::zeros(2, 1);
        basis[(0, 0)] = 1.0;

        let err = ContrastProjector::default()
            .project_with_null_basis(&design, &contrast, &basis)
            .unwrap_err();
        assert!(err.is_invalid_contrast());
    }
}
