//! Shared linear-algebra helpers.

mod matrix;

pub use matrix::{
    center_columns, column_norms, correlation_from_centered, cross_product,
    detect_constant_columns, row_null_space, symmetric_eigen, symmetric_pinv,
    symmetric_pinv_with_scale, LinalgError, SymmetricEigen, SymmetricPinv,
};
