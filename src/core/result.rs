//! VIF result tables.

use super::error::VifError;
use std::fmt;

/// Per-regressor VIFs, in design-matrix column order.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressorVifResult {
    entries: Vec<(String, f64)>,
}

impl RegressorVifResult {
    pub(crate) fn new(entries: Vec<(String, f64)>) -> Self {
        Self { entries }
    }

    /// `(name, vif)` pairs in column order.
    pub fn entries(&self) -> &[(String, f64)] {
        &self.entries
    }

    /// VIF of the named regressor.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, vif)| *vif)
    }

    /// VIF values in column order.
    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|(_, vif)| *vif).collect()
    }

    /// Number of regressors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no regressor was reported.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of regressors whose VIF exceeds `threshold`.
    ///
    /// Common thresholds are 5 and 10.
    pub fn high_vif_regressors(&self, threshold: f64) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, vif)| *vif > threshold)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// VIF of one named contrast.
#[derive(Debug, Clone, PartialEq)]
pub struct ContrastVif {
    /// Contrast label.
    pub label: String,
    /// Variance inflation factor of the contrast estimate.
    pub vif: f64,
    /// Number of regressors with a nonzero contrast weight.
    pub n_involved: usize,
}

/// Contrast VIFs keyed by label, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct ContrastVifTable {
    rows: Vec<ContrastVif>,
    failures: Vec<(String, VifError)>,
}

impl ContrastVifTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, row: ContrastVif) {
        self.rows.push(row);
    }

    pub(crate) fn push_failure(&mut self, label: &str, err: VifError) {
        self.failures.push((label.to_string(), err));
    }

    /// Rows in the caller's order.
    pub fn rows(&self) -> &[ContrastVif] {
        &self.rows
    }

    /// VIF of the contrast with the given label.
    pub fn get(&self, label: &str) -> Option<f64> {
        self.rows.iter().find(|r| r.label == label).map(|r| r.vif)
    }

    /// Labels in the caller's order.
    pub fn labels(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.label.as_str()).collect()
    }

    /// Contrasts that failed under `BatchPolicy::CollectPartial`, as
    /// `(label, error)` pairs.
    pub fn failures(&self) -> &[(String, VifError)] {
        &self.failures
    }

    /// Error recorded for the contrast with the given label.
    pub fn failure(&self, label: &str) -> Option<&VifError> {
        self.failures
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, err)| err)
    }

    /// Number of successful rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when no contrast succeeded.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn write_table<'a>(
    f: &mut fmt::Formatter<'_>,
    header: &str,
    rows: impl Iterator<Item = (&'a str, f64)> + Clone,
) -> fmt::Result {
    let width = rows
        .clone()
        .map(|(name, _)| name.len())
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0);

    writeln!(f, "{header:<width$}  VIF")?;
    for (name, vif) in rows {
        writeln!(f, "{name:<width$}  {vif:.4}")?;
    }
    Ok(())
}

impl fmt::Display for RegressorVifResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_table(
            f,
            "regressor",
            self.entries.iter().map(|(name, vif)| (name.as_str(), *vif)),
        )
    }
}

impl fmt::Display for ContrastVifTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_table(
            f,
            "contrast",
            self.rows.iter().map(|r| (r.label.as_str(), r.vif)),
        )?;
        for (label, err) in &self.failures {
            writeln!(f, "{label}: failed ({err})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_high_vif_regressors() {
        let result = RegressorVifResult::new(vec![
            ("a".to_string(), 1.2),
            ("b".to_string(), 12.0),
            ("c".to_string(), 6.5),
        ]);

        assert_eq!(result.high_vif_regressors(5.0), vec!["b", "c"]);
        assert_eq!(result.high_vif_regressors(10.0), vec!["b"]);
        assert_eq!(result.get("c"), Some(6.5));
        assert_eq!(result.get("missing"), None);
    }

    #[test]
    fn test_table_preserves_insertion_order() {
        let mut table = ContrastVifTable::new();
        for (label, vif) in [("z", 2.0), ("a", 1.0), ("m", 3.0)] {
            table.push(ContrastVif {
                label: label.to_string(),
                vif,
                n_involved: 2,
            });
        }

        assert_eq!(table.labels(), vec!["z", "a", "m"]);
        assert_eq!(table.get("m"), Some(3.0));
    }

    #[test]
    fn test_failures_keep_error_kind() {
        let mut table = ContrastVifTable::new();
        table.push_failure(
            "diff",
            VifError::DegenerateContrast {
                contrast: "x - x_copy".to_string(),
                reason: "not estimable".to_string(),
            },
        );

        let err = table.failure("diff").expect("recorded");
        assert!(err.is_degenerate());
        assert!(table.failure("other").is_none());
        assert!(table.to_string().contains("diff: failed (contrast 'x - x_copy'"));
    }

    #[test]
    fn test_display_renders_rows() {
        let result = RegressorVifResult::new(vec![("go".to_string(), 10.1234567)]);
        let text = result.to_string();
        assert!(text.starts_with("regressor  VIF"));
        assert!(text.contains("go         10.1235"));
    }
}
