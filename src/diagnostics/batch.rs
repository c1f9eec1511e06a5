//! VIFs for a collection of named contrasts.

use super::contrast::ContrastProjector;
use super::variance_ratio::variance_ratio_vif;
use crate::contrast::ContrastSpec;
use crate::core::{
    BatchPolicy, ContrastVif, ContrastVifMethod, ContrastVifTable, DesignMatrix, VifError,
    VifOptions,
};
use log::warn;
use std::collections::HashSet;

/// VIF of one contrast, using the estimator selected in `options.method`.
pub fn contrast_vif(
    design: &DesignMatrix,
    label: &str,
    spec: impl Into<ContrastSpec>,
    options: &VifOptions,
) -> Result<ContrastVif, VifError> {
    let contrast = spec.into().resolve(design)?;
    match options.method {
        ContrastVifMethod::EffectiveRegressor => {
            ContrastProjector::new(options.clone()).contrast_vif(design, label, &contrast)
        }
        ContrastVifMethod::VarianceRatio => variance_ratio_vif(design, label, &contrast, options),
    }
}

/// VIFs of every `(label, contrast)` pair, over the same design.
///
/// Rows keep the caller's order. Each contrast is computed independently.
/// Under `BatchPolicy::AbortOnError` the first failure is returned as
/// `ContrastFailed` carrying its label; under `BatchPolicy::CollectPartial`
/// failures are recorded in the table next to the successful rows.
///
/// # Example
///
/// ```rust
/// use contrast_vif::{contrast_vifs, DesignMatrix, VifOptions};
///
/// let design = DesignMatrix::from_columns(vec![
///     ("go", vec![0.0, 1.0, 0.8, 0.1, 0.0, 0.9, 0.2, 0.4]),
///     ("nogo", vec![0.1, 0.9, 0.6, 0.3, 0.2, 0.7, 0.1, 0.6]),
///     ("drift", vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7]),
/// ])?;
///
/// let table = contrast_vifs(
///     &design,
///     [("go_vs_nogo", "go - nogo"), ("task", ".5*go + .5*nogo")],
///     &VifOptions::default(),
/// )?;
///
/// assert_eq!(table.labels(), vec!["go_vs_nogo", "task"]);
/// # Ok::<(), contrast_vif::VifError>(())
/// ```
pub fn contrast_vifs<L, S, I>(
    design: &DesignMatrix,
    contrasts: I,
    options: &VifOptions,
) -> Result<ContrastVifTable, VifError>
where
    L: Into<String>,
    S: Into<ContrastSpec>,
    I: IntoIterator<Item = (L, S)>,
{
    options.validate()?;

    let mut table = ContrastVifTable::new();
    let mut seen = HashSet::new();

    for (label, spec) in contrasts {
        let label: String = label.into();
        let spec: ContrastSpec = spec.into();

        let outcome = if seen.insert(label.clone()) {
            contrast_vif(design, &label, spec, options)
        } else {
            Err(VifError::InvalidContrast {
                contrast: spec.to_string(),
                reason: format!("duplicate contrast label '{label}'"),
            })
        };

        match (outcome, options.batch_policy) {
            (Ok(row), _) => table.push(row),
            (Err(err), BatchPolicy::AbortOnError) => return Err(err.labeled(&label)),
            (Err(err), BatchPolicy::CollectPartial) => {
                warn!("contrast '{label}' failed: {err}");
                table.push_failure(&label, err);
            }
        }
    }

    Ok(table)
}
