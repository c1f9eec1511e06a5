//! VIF options and configuration.

use thiserror::Error;

/// Estimator used for contrast VIFs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContrastVifMethod {
    /// Rotate the contrast-involved regressors into an effective regressor
    /// plus its orthogonal complement, then take the effective regressor's VIF
    /// (default).
    #[default]
    EffectiveRegressor,
    /// Ratio of the contrast variance under the observed design to the
    /// variance with between-regressor correlations set to zero:
    ///
    /// c(X'X)⁻¹c' / c(X'X∘I)⁻¹c'
    ///
    /// computed on centered, unit-norm columns.
    VarianceRatio,
}

/// What a batch does when one contrast fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchPolicy {
    /// Stop at the first failing contrast and report its label (default).
    #[default]
    AbortOnError,
    /// Keep going; successful rows are returned next to the labeled failures.
    CollectPartial,
}

/// Configuration options for VIF computations.
#[derive(Debug, Clone)]
pub struct VifOptions {
    /// Tolerance for detecting zero-variance columns (default: 1e-10).
    pub constant_tolerance: f64,
    /// Relative eigenvalue floor under which the correlation matrix counts as
    /// singular and R² counts as one (default: 1e-10).
    pub singular_tolerance: f64,
    /// Relative cutoff for pseudo-inverse eigenvalues (default: 1e-12).
    pub pinv_tolerance: f64,
    /// Contrast VIF estimator (default: EffectiveRegressor).
    pub method: ContrastVifMethod,
    /// Failure policy for batches (default: AbortOnError).
    pub batch_policy: BatchPolicy,
}

impl Default for VifOptions {
    fn default() -> Self {
        Self {
            constant_tolerance: 1e-10,
            singular_tolerance: 1e-10,
            pinv_tolerance: 1e-12,
            method: ContrastVifMethod::EffectiveRegressor,
            batch_policy: BatchPolicy::AbortOnError,
        }
    }
}

/// Errors that can occur when validating VIF options.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptionsError {
    #[error("constant_tolerance must be positive and finite, got {0}")]
    InvalidConstantTolerance(f64),
    #[error("singular_tolerance must be in (0, 1), got {0}")]
    InvalidSingularTolerance(f64),
    #[error("pinv_tolerance must be in (0, 1), got {0}")]
    InvalidPinvTolerance(f64),
}

impl VifOptions {
    /// Create a new builder for VIF options.
    pub fn builder() -> VifOptionsBuilder {
        VifOptionsBuilder::default()
    }

    /// Default options using the variance-ratio estimator.
    pub fn variance_ratio() -> Self {
        Self {
            method: ContrastVifMethod::VarianceRatio,
            ..Default::default()
        }
    }

    /// Validate the options and return an error if invalid.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if !(self.constant_tolerance.is_finite() && self.constant_tolerance > 0.0) {
            return Err(OptionsError::InvalidConstantTolerance(
                self.constant_tolerance,
            ));
        }
        if !(self.singular_tolerance > 0.0 && self.singular_tolerance < 1.0) {
            return Err(OptionsError::InvalidSingularTolerance(
                self.singular_tolerance,
            ));
        }
        if !(self.pinv_tolerance > 0.0 && self.pinv_tolerance < 1.0) {
            return Err(OptionsError::InvalidPinvTolerance(self.pinv_tolerance));
        }
        Ok(())
    }
}

/// Builder for `VifOptions`.
#[derive(Debug, Clone, Default)]
pub struct VifOptionsBuilder {
    options: VifOptions,
}

impl VifOptionsBuilder {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tolerance used to detect constant columns.
    pub fn constant_tolerance(mut self, tolerance: f64) -> Self {
        self.options.constant_tolerance = tolerance;
        self
    }

    /// Set the relative eigenvalue floor for singularity detection.
    pub fn singular_tolerance(mut self, tolerance: f64) -> Self {
        self.options.singular_tolerance = tolerance;
        self
    }

    /// Set the relative cutoff for pseudo-inverses.
    pub fn pinv_tolerance(mut self, tolerance: f64) -> Self {
        self.options.pinv_tolerance = tolerance;
        self
    }

    /// Set the contrast VIF estimator.
    pub fn method(mut self, method: ContrastVifMethod) -> Self {
        self.options.method = method;
        self
    }

    /// Set the batch failure policy.
    pub fn batch_policy(mut self, policy: BatchPolicy) -> Self {
        self.options.batch_policy = policy;
        self
    }

    /// Build the options, validating them.
    pub fn build(self) -> Result<VifOptions, OptionsError> {
        self.options.validate()?;
        Ok(self.options)
    }

    /// Build the options without validation.
    pub fn build_unchecked(self) -> VifOptions {
        self.options
    }
}
