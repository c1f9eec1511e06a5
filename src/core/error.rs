//! Error type shared by every VIF computation.

use super::options::OptionsError;
use crate::utils::LinalgError;
use thiserror::Error;

/// Errors that can occur while computing regressor or contrast VIFs.
#[derive(Debug, Clone, Error)]
pub enum VifError {
    #[error("dimension mismatch: column '{name}' has {got} rows, expected {expected}")]
    DimensionMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("design matrix has no columns")]
    EmptyDesign,

    #[error("insufficient observations: need at least {needed}, got {got}")]
    InsufficientObservations { needed: usize, got: usize },

    #[error("expected {expected} column names, got {got}")]
    NameCountMismatch { expected: usize, got: usize },

    #[error("column '{name}' has a non-finite value ({value}) in row {row}")]
    NonFiniteValue { name: String, row: usize, value: f64 },

    #[error("duplicate column name '{name}'")]
    DuplicateColumn { name: String },

    #[error("unknown column '{name}' in contrast")]
    UnknownColumn { name: String },

    #[error("invalid contrast '{contrast}': {reason}")]
    InvalidContrast { contrast: String, reason: String },

    #[error("column '{name}' is constant (zero variance)")]
    ConstantColumn { name: String },

    #[error("cross-product matrix is singular: {} are linearly dependent", .regressors.join(", "))]
    SingularMatrix { regressors: Vec<String> },

    #[error("contrast '{contrast}' is not estimable: {reason}")]
    DegenerateContrast { contrast: String, reason: String },

    #[error("contrast '{label}' failed: {source}")]
    ContrastFailed {
        label: String,
        #[source]
        source: Box<VifError>,
    },

    #[error("invalid options: {0}")]
    InvalidOptions(#[from] OptionsError),

    #[error("numerical error: {0}")]
    NumericalError(#[from] LinalgError),
}

impl VifError {
    /// Row-count mismatches, empty matrices and too few observations.
    pub fn is_dimension_error(&self) -> bool {
        match self {
            Self::DimensionMismatch { .. }
            | Self::EmptyDesign
            | Self::InsufficientObservations { .. }
            | Self::NameCountMismatch { .. } => true,
            Self::ContrastFailed { source, .. } => source.is_dimension_error(),
            _ => false,
        }
    }

    /// A design value is NaN or infinite.
    pub fn is_non_finite(&self) -> bool {
        match self {
            Self::NonFiniteValue { .. } => true,
            Self::ContrastFailed { source, .. } => source.is_non_finite(),
            _ => false,
        }
    }

    /// Unknown names, malformed expressions and all-zero contrasts.
    pub fn is_invalid_contrast(&self) -> bool {
        match self {
            Self::UnknownColumn { .. } | Self::InvalidContrast { .. } => true,
            Self::ContrastFailed { source, .. } => source.is_invalid_contrast(),
            _ => false,
        }
    }

    /// A cross-product matrix that needed an exact inverse was singular.
    pub fn is_singular(&self) -> bool {
        match self {
            Self::SingularMatrix { .. } | Self::ConstantColumn { .. } => true,
            Self::ContrastFailed { source, .. } => source.is_singular(),
            _ => false,
        }
    }

    /// The contrast direction is not estimable from the design.
    pub fn is_degenerate(&self) -> bool {
        match self {
            Self::DegenerateContrast { .. } => true,
            Self::ContrastFailed { source, .. } => source.is_degenerate(),
            _ => false,
        }
    }

    /// Label of the failing contrast when raised from a batch.
    pub fn contrast_label(&self) -> Option<&str> {
        match self {
            Self::ContrastFailed { label, .. } => Some(label),
            _ => None,
        }
    }

    pub(crate) fn labeled(self, label: &str) -> Self {
        Self::ContrastFailed {
            label: label.to_string(),
            source: Box::new(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singular_message_lists_regressors() {
        let err = VifError::SingularMatrix {
            regressors: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "cross-product matrix is singular: a, b are linearly dependent"
        );
        assert!(err.is_singular());
        assert!(!err.is_degenerate());
    }

    #[test]
    fn test_labeled_error_keeps_classification() {
        let err = VifError::UnknownColumn {
            name: "stop".to_string(),
        }
        .labeled("go_vs_stop");

        assert_eq!(err.contrast_label(), Some("go_vs_stop"));
        assert!(err.is_invalid_contrast());
        assert!(!err.is_dimension_error());
        assert!(err.to_string().contains("go_vs_stop"));
    }

    #[test]
    fn test_linalg_error_converts_with_question_mark() {
        fn pseudo_inverse_of_nan() -> Result<(), VifError> {
            let a = faer::Mat::from_fn(2, 2, |_, _| f64::NAN);
            crate::utils::symmetric_pinv(&a, 1e-12)?;
            Err(LinalgError::NonFinite {
                quantity: "test".to_string(),
            }
            .into())
        }

        let err = pseudo_inverse_of_nan().unwrap_err();
        assert!(matches!(err, VifError::NumericalError(_)));
        assert!(err.to_string().starts_with("numerical error: "));
    }

    #[test]
    fn test_non_finite_value_names_column_and_row() {
        let err = VifError::NonFiniteValue {
            name: "drift".to_string(),
            row: 7,
            value: f64::NAN,
        };
        assert_eq!(
            err.to_string(),
            "column 'drift' has a non-finite value (NaN) in row 7"
        );
        assert!(err.is_non_finite());
        assert!(err.labeled("d").is_non_finite());
    }
}
