//! Contrast specifications and their resolution into weight vectors.
//!
//! A contrast is written as a linear expression over design column names:
//!
//! ```rust
//! use contrast_vif::{ContrastVector, DesignMatrix};
//!
//! let design = DesignMatrix::from_columns(vec![
//!     ("go", vec![0.0, 1.0, 0.0, 1.0]),
//!     ("nogo", vec![1.0, 0.0, 0.0, 1.0]),
//!     ("drift", vec![0.0, 0.1, 0.2, 0.3]),
//! ])?;
//!
//! let c = ContrastVector::parse(".5*go + .5*nogo", &design)?;
//! assert_eq!(c.weights(), &[0.5, 0.5, 0.0]);
//! # Ok::<(), contrast_vif::VifError>(())
//! ```

mod expression;
mod vector;

pub use expression::{parse_contrast, MAX_NESTING_DEPTH};
pub use vector::{ContrastSpec, ContrastVector};
