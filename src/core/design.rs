//! Design matrix with named columns.

use super::error::VifError;
use crate::utils::detect_constant_columns;
use faer::{Col, Mat};
use std::collections::HashSet;

/// A design matrix: ordered, uniquely named numeric columns of equal length.
///
/// No intercept column is required; every VIF computation adds its own
/// implicit intercept.
///
/// # Example
///
/// ```rust
/// use contrast_vif::DesignMatrix;
///
/// let design = DesignMatrix::from_columns(vec![
///     ("go", vec![0.0, 1.0, 0.5, 0.2]),
///     ("nogo", vec![1.0, 0.0, 0.3, 0.9]),
/// ])?;
///
/// assert_eq!(design.n_cols(), 2);
/// assert_eq!(design.column_index("nogo"), Some(1));
/// # Ok::<(), contrast_vif::VifError>(())
/// ```
#[derive(Debug, Clone)]
pub struct DesignMatrix {
    names: Vec<String>,
    data: Mat<f64>,
}

impl DesignMatrix {
    /// Wrap a matrix, naming its columns in order.
    ///
    /// Every value must be finite; a NaN or infinity is reported with its
    /// column and row.
    pub fn new<S: Into<String>>(names: Vec<S>, data: Mat<f64>) -> Result<Self, VifError> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();

        if data.ncols() == 0 {
            return Err(VifError::EmptyDesign);
        }
        if names.len() != data.ncols() {
            return Err(VifError::NameCountMismatch {
                expected: data.ncols(),
                got: names.len(),
            });
        }
        if data.nrows() == 0 {
            return Err(VifError::InsufficientObservations { needed: 1, got: 0 });
        }

        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(VifError::DuplicateColumn { name: name.clone() });
            }
        }

        for (j, name) in names.iter().enumerate() {
            if let Some(row) = (0..data.nrows()).find(|&i| !data[(i, j)].is_finite()) {
                return Err(VifError::NonFiniteValue {
                    name: name.clone(),
                    row,
                    value: data[(row, j)],
                });
            }
        }

        Ok(Self { names, data })
    }

    /// Build a design matrix from `(name, values)` pairs.
    ///
    /// Every column must have as many values as the first one.
    pub fn from_columns<S, I>(columns: I) -> Result<Self, VifError>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, Vec<f64>)>,
    {
        let columns: Vec<(String, Vec<f64>)> = columns
            .into_iter()
            .map(|(name, values)| (name.into(), values))
            .collect();

        let Some((_, first)) = columns.first() else {
            return Err(VifError::EmptyDesign);
        };
        let n_rows = first.len();

        for (name, values) in &columns {
            if values.len() != n_rows {
                return Err(VifError::DimensionMismatch {
                    name: name.clone(),
                    expected: n_rows,
                    got: values.len(),
                });
            }
        }

        let data = Mat::from_fn(n_rows, columns.len(), |i, j| columns[j].1[i]);
        let names = columns.into_iter().map(|(name, _)| name).collect();

        Self::new(names, data)
    }

    /// Column names, in column order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Underlying numeric matrix (rows = observations).
    pub fn data(&self) -> &Mat<f64> {
        &self.data
    }

    /// Number of observations.
    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of regressors.
    pub fn n_cols(&self) -> usize {
        self.data.ncols()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Copy of column `j`.
    pub fn column(&self, j: usize) -> Col<f64> {
        Col::from_fn(self.n_rows(), |i| self.data[(i, j)])
    }

    /// Copy of the column with the given name.
    pub fn column_by_name(&self, name: &str) -> Option<Col<f64>> {
        self.column_index(name).map(|j| self.column(j))
    }

    /// New design holding only the given columns, in the given order.
    pub fn select(&self, indices: &[usize]) -> Result<Self, VifError> {
        let data = Mat::from_fn(self.n_rows(), indices.len(), |i, k| {
            self.data[(i, indices[k])]
        });
        let names = indices.iter().map(|&j| self.names[j].clone()).collect();
        Self::new(names, data)
    }

    /// Indices of zero-variance columns.
    pub fn constant_columns(&self, tolerance: f64) -> Vec<usize> {
        detect_constant_columns(&self.data, tolerance)
            .into_iter()
            .enumerate()
            .filter(|(_, constant)| *constant)
            .map(|(j, _)| j)
            .collect()
    }

    /// Drop zero-variance columns (e.g. an explicit intercept).
    pub fn without_constant_columns(&self, tolerance: f64) -> Result<Self, VifError> {
        let constant = detect_constant_columns(&self.data, tolerance);
        let keep: Vec<usize> = (0..self.n_cols()).filter(|&j| !constant[j]).collect();
        self.select(&keep)
    }
}
