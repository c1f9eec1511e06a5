//! Variance inflation factors for regressors and linear contrasts.
//!
//! The classical VIF tells how much collinearity inflates the variance of a
//! single coefficient. Analyses usually test combinations of coefficients
//! instead (a difference between two conditions, an average across them), and
//! the VIF of such a contrast can be far from the VIFs of the regressors it is
//! built from. This crate computes both.
//!
//! # Example
//!
//! ```rust,ignore
//! use contrast_vif::prelude::*;
//!
//! let design = DesignMatrix::from_columns(vec![
//!     ("go", go),
//!     ("go_derivative", go_derivative),
//!     ("nogo", nogo),
//!     ("nogo_derivative", nogo_derivative),
//! ])?;
//!
//! let options = VifOptions::default();
//!
//! // Per-regressor VIFs
//! let regressors = regressor_vifs(&design, &options)?;
//! println!("{regressors}");
//!
//! // Contrast VIFs
//! let contrasts = contrast_vifs(
//!     &design,
//!     [("go_vs_nogo", "go - nogo"), ("task", ".5*go + .5*nogo")],
//!     &options,
//! )?;
//! println!("{contrasts}");
//! ```

pub mod contrast;
pub mod core;
pub mod diagnostics;
pub mod utils;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::contrast::{parse_contrast, ContrastSpec, ContrastVector};
    pub use crate::core::{
        BatchPolicy, ContrastVif, ContrastVifMethod, ContrastVifTable, DesignMatrix,
        OptionsError, RegressorVifResult, VifError, VifOptions, VifOptionsBuilder,
    };
    pub use crate::diagnostics::{
        contrast_vif, contrast_vifs, regressor_vif, regressor_vifs, variance_ratio_vif,
        ContrastProjector, ReducedDesign,
    };
}

pub use crate::contrast::{ContrastSpec, ContrastVector};
pub use crate::core::{
    BatchPolicy, ContrastVif, ContrastVifMethod, ContrastVifTable, DesignMatrix, OptionsError,
    RegressorVifResult, VifError, VifOptions, VifOptionsBuilder,
};
pub use crate::diagnostics::{contrast_vif, contrast_vifs, regressor_vifs, ContrastProjector};
