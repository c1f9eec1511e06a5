//! Core types: design matrix, options, results and errors.

mod design;
mod error;
mod options;
mod result;

pub use design::DesignMatrix;
pub use error::VifError;
pub use options::{BatchPolicy, ContrastVifMethod, OptionsError, VifOptions, VifOptionsBuilder};
pub use result::{ContrastVif, ContrastVifTable, RegressorVifResult};
