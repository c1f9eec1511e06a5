//! Contrast vectors aligned to a design matrix.

use super::expression::parse_contrast;
use crate::core::{DesignMatrix, VifError};
use std::fmt;

/// A contrast as supplied by the caller: an expression over column names or
/// raw weights in column order.
#[derive(Debug, Clone, PartialEq)]
pub enum ContrastSpec {
    /// e.g. `"go - nogo"` or `".5*go + .5*nogo"`.
    Expression(String),
    /// One weight per design column.
    Weights(Vec<f64>),
}

impl ContrastSpec {
    /// Resolve against a design's column names.
    pub fn resolve(&self, design: &DesignMatrix) -> Result<ContrastVector, VifError> {
        match self {
            Self::Expression(expr) => ContrastVector::parse(expr, design),
            Self::Weights(weights) => ContrastVector::new(design, weights.clone()),
        }
    }
}

impl From<&str> for ContrastSpec {
    fn from(expr: &str) -> Self {
        Self::Expression(expr.to_string())
    }
}

impl From<String> for ContrastSpec {
    fn from(expr: String) -> Self {
        Self::Expression(expr)
    }
}

impl From<Vec<f64>> for ContrastSpec {
    fn from(weights: Vec<f64>) -> Self {
        Self::Weights(weights)
    }
}

impl fmt::Display for ContrastSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expression(expr) => f.write_str(expr),
            Self::Weights(weights) => write!(f, "{weights:?}"),
        }
    }
}

/// One coefficient per design column; zero for columns the contrast ignores.
///
/// Always has at least one nonzero coefficient.
#[derive(Debug, Clone, PartialEq)]
pub struct ContrastVector {
    weights: Vec<f64>,
    description: String,
}

impl ContrastVector {
    /// Build from weights in column order.
    pub fn new(design: &DesignMatrix, weights: Vec<f64>) -> Result<Self, VifError> {
        let description = describe(design.names(), &weights);
        let invalid = |reason: String| VifError::InvalidContrast {
            contrast: description.clone(),
            reason,
        };

        if weights.len() != design.n_cols() {
            return Err(invalid(format!(
                "expected {} weights, got {}",
                design.n_cols(),
                weights.len()
            )));
        }
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(invalid("weights must be finite".to_string()));
        }
        if weights.iter().all(|&w| w == 0.0) {
            return Err(invalid(
                "contrast evaluates to the all-zero vector".to_string(),
            ));
        }

        Ok(Self {
            weights,
            description,
        })
    }

    /// Parse an expression such as `"go - nogo"`.
    pub fn parse(expression: &str, design: &DesignMatrix) -> Result<Self, VifError> {
        let weights = parse_contrast(expression, design.names())?;
        Ok(Self {
            weights,
            description: expression.trim().to_string(),
        })
    }

    /// Build from `(column, weight)` pairs; unnamed columns get zero.
    pub fn from_named(design: &DesignMatrix, named: &[(&str, f64)]) -> Result<Self, VifError> {
        let mut weights = vec![0.0; design.n_cols()];
        for &(name, weight) in named {
            let j = design
                .column_index(name)
                .ok_or_else(|| VifError::UnknownColumn {
                    name: name.to_string(),
                })?;
            weights[j] += weight;
        }
        Self::new(design, weights)
    }

    /// Weights in column order.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Indices of columns with a nonzero weight.
    pub fn involved(&self) -> Vec<usize> {
        (0..self.weights.len())
            .filter(|&j| self.weights[j] != 0.0)
            .collect()
    }

    /// Indices of columns with a zero weight.
    pub fn nuisance(&self) -> Vec<usize> {
        (0..self.weights.len())
            .filter(|&j| self.weights[j] == 0.0)
            .collect()
    }

    /// The contrast multiplied by a nonzero, finite scalar.
    ///
    /// Fails with `InvalidContrast` for `k == 0`, a non-finite `k`, or a
    /// product that overflows or underflows every weight to zero.
    pub fn scaled(&self, k: f64) -> Result<Self, VifError> {
        let description = format!("{k} * ({})", self.description);
        let invalid = |reason: String| VifError::InvalidContrast {
            contrast: description.clone(),
            reason,
        };

        if !k.is_finite() || k == 0.0 {
            return Err(invalid(format!("scale factor must be finite and nonzero, got {k}")));
        }
        let weights: Vec<f64> = self.weights.iter().map(|w| w * k).collect();
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(invalid("weights must be finite".to_string()));
        }
        if weights.iter().all(|&w| w == 0.0) {
            return Err(invalid(
                "contrast evaluates to the all-zero vector".to_string(),
            ));
        }

        Ok(Self {
            weights,
            description,
        })
    }

    /// Check that the contrast has one weight per column of `design`.
    pub(crate) fn check_matches(&self, design: &DesignMatrix) -> Result<(), VifError> {
        if self.weights.len() != design.n_cols() {
            return Err(VifError::InvalidContrast {
                contrast: self.description.clone(),
                reason: format!(
                    "contrast has {} weights but the design has {} columns",
                    self.weights.len(),
                    design.n_cols()
                ),
            });
        }
        Ok(())
    }

    /// Human-readable form used in error messages.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Restrict to a subset of columns, e.g. after dropping constant columns.
    pub(crate) fn select(&self, indices: &[usize]) -> Vec<f64> {
        indices.iter().map(|&j| self.weights[j]).collect()
    }
}

fn describe(names: &[String], weights: &[f64]) -> String {
    let terms: Vec<String> = names
        .iter()
        .zip(weights)
        .filter(|(_, &w)| w != 0.0)
        .map(|(name, w)| format!("{w}*{name}"))
        .collect();
    if terms.is_empty() {
        "0".to_string()
    } else {
        terms.join(" + ")
    }
}
