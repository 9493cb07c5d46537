use serde::Serialize;

use crate::core::Frame;
use crate::evaluation::EvalError;
use crate::metrics::DistanceMetric;

/// Balance of one covariate between a treatment group and the rest:
/// the distance under the supplied weights and under uniform weights.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceEntry {
    pub covariate: String,
    pub weighted: f64,
    pub unweighted: f64,
}

/// Covariate-balance rows for one treatment level (that level vs. the rest).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceGroup {
    pub treatment_value: f64,
    pub entries: Vec<BalanceEntry>,
}

/// The "table 1" of an evaluation: per treatment level, per covariate, the
/// weighted and unweighted distribution distance between the group assigned
/// that level and everyone else.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CovariateBalance {
    /// Name of the distance metric the distances were computed with.
    pub metric: String,
    /// Groups in ascending treatment-value order. With exactly two treatment
    /// levels only the maximal (treated) level is kept; the dropped table is
    /// its mirror image.
    pub groups: Vec<BalanceGroup>,
}

impl CovariateBalance {
    pub fn group(&self, treatment_value: f64) -> Option<&BalanceGroup> {
        self.groups
            .iter()
            .find(|g| g.treatment_value == treatment_value)
    }

    /// Total number of (level, covariate) rows.
    pub fn n_entries(&self) -> usize {
        self.groups.iter().map(|g| g.entries.len()).sum()
    }
}

/// Distance between the samples assigned `group_level` and the rest, for one
/// covariate column.
fn distance_for_single_covariate(
    x: &[f64],
    w: &[f64],
    a: &[f64],
    group_level: f64,
    metric: &DistanceMetric,
) -> f64 {
    let mut x_group = Vec::new();
    let mut w_group = Vec::new();
    let mut x_rest = Vec::new();
    let mut w_rest = Vec::new();
    for i in 0..x.len() {
        if a[i] == group_level {
            x_group.push(x[i]);
            w_group.push(w[i]);
        } else {
            x_rest.push(x[i]);
            w_rest.push(w[i]);
        }
    }
    metric.evaluate(&x_group, &x_rest, &w_group, &w_rest)
}

/// Calculates the covariate-balance table for weighted treatment groups.
///
/// For every sorted distinct treatment level, and every covariate column of
/// `x` independently, computes the one-vs-rest distance twice: once with the
/// supplied balancing weights `w` and once with uniform weights (the
/// unweighted baseline). With exactly two levels, the two per-level tables
/// are numerically identical, so only the maximal level is retained.
pub fn calculate_covariate_balance(
    x: &Frame,
    a: &[f64],
    w: &[f64],
    metric: &DistanceMetric,
) -> Result<CovariateBalance, EvalError> {
    let n = x.n_rows();
    if a.len() != n {
        return Err(EvalError::LengthMismatch {
            name: "treatment assignment",
            expected: n,
            got: a.len(),
        });
    }
    if w.len() != n {
        return Err(EvalError::LengthMismatch {
            name: "sample weights",
            expected: n,
            got: w.len(),
        });
    }

    let mut treatment_values: Vec<f64> = a.to_vec();
    treatment_values.sort_by(f64::total_cmp);
    treatment_values.dedup();

    let uniform = vec![1.0; n];
    let mut groups = Vec::with_capacity(treatment_values.len());
    for &treatment_value in &treatment_values {
        let entries = x
            .iter_columns()
            .map(|(name, column)| BalanceEntry {
                covariate: name.to_string(),
                weighted: distance_for_single_covariate(column, w, a, treatment_value, metric),
                unweighted: distance_for_single_covariate(
                    column,
                    &uniform,
                    a,
                    treatment_value,
                    metric,
                ),
            })
            .collect();
        groups.push(BalanceGroup {
            treatment_value,
            entries,
        });
    }

    if treatment_values.len() == 2 {
        // One-vs-rest with two levels is symmetric; keep the treated group
        // (maximal treatment value).
        groups.remove(0);
    }

    Ok(CovariateBalance {
        metric: metric.name().to_string(),
        groups,
    })
}

/// Name-based convenience over [`calculate_covariate_balance`] for the
/// built-in distance metrics.
pub fn calculate_covariate_balance_by_name(
    x: &Frame,
    a: &[f64],
    w: &[f64],
    metric: &str,
) -> Result<CovariateBalance, EvalError> {
    let metric = DistanceMetric::from_name(metric)
        .ok_or_else(|| EvalError::UnknownDistanceMetric(metric.to_owned()))?;
    calculate_covariate_balance(x, a, w, &metric)
}
