//! Collinearity diagnostics for regressors and contrasts.
//!
//! - **Regressor VIF**: classical 1 / (1 - R²) per design column
//! - **Contrast VIF**: VIF of a linear combination of coefficients, through an
//!   effective regressor
//! - **Variance ratio**: closed-form contrast VIF on standardized regressors
//! - **Batch**: named contrasts over one design
//!
//! # Example
//!
//! ```rust,ignore
//! use contrast_vif::diagnostics::{contrast_vifs, regressor_vifs};
//!
//! let regressors = regressor_vifs(&design, &options)?;
//! let contrasts = contrast_vifs(&design, [("go_vs_nogo", "go - nogo")], &options)?;
//!
//! let collinear = regressors.high_vif_regressors(5.0);
//! ```

mod batch;
mod contrast;
mod variance_ratio;
mod vif;

pub use batch::{contrast_vif, contrast_vifs};
pub use contrast::{ContrastProjector, ReducedDesign, EFFECTIVE_REGRESSOR, ORTHOGONAL_PREFIX};
pub use variance_ratio::variance_ratio_vif;
pub use vif::{regressor_vif, regressor_vifs};
