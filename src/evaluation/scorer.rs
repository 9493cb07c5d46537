use serde::Serialize;

use crate::metrics::{MetricInput, MetricSet, ScoreValue};

/// What one metric produced on one fold: a value, or an explicit marker that
/// the metric was undefined there, with the captured failure reason.
///
/// Undefined entries read as NaN through the scalar accessors, so a
/// degenerate fold degrades the output instead of aborting the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MetricOutcome {
    Value(ScoreValue),
    Undefined(String),
}

impl MetricOutcome {
    #[inline]
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            MetricOutcome::Value(v) => v.as_scalar(),
            MetricOutcome::Undefined(_) => Some(f64::NAN),
        }
    }

    #[inline]
    pub fn is_undefined(&self) -> bool {
        matches!(self, MetricOutcome::Undefined(_))
    }
}

/// Named metric outcomes for a single fold and phase, in evaluation order.
///
/// Produced once by the scorer and never recomputed.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ScoreRow {
    entries: Vec<(String, MetricOutcome)>,
}

impl ScoreRow {
    pub(crate) fn push<N: Into<String>>(&mut self, metric: N, outcome: MetricOutcome) {
        self.entries.push((metric.into(), outcome));
    }

    pub fn get(&self, metric: &str) -> Option<&MetricOutcome> {
        self.entries
            .iter()
            .find(|(name, _)| name == metric)
            .map(|(_, outcome)| outcome)
    }

    /// Scalar view of a metric: its value, NaN if it was undefined, `None` if
    /// it is absent or vector-valued.
    pub fn scalar(&self, metric: &str) -> Option<f64> {
        self.get(metric).and_then(MetricOutcome::as_scalar)
    }

    pub fn metric_names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetricOutcome)> {
        self.entries
            .iter()
            .map(|(name, outcome)| (name.as_str(), outcome))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Warnings captured while scoring: one `(metric, reason)` pair per
    /// undefined entry.
    pub fn warnings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().filter_map(|(name, outcome)| match outcome {
            MetricOutcome::Undefined(reason) => Some((name.as_str(), reason.as_str())),
            MetricOutcome::Value(_) => None,
        })
    }

    /// Whether every entry reads as a scalar (undefined entries count as NaN
    /// scalars). Rows with curve or matrix values are mixed.
    pub fn is_numeric(&self) -> bool {
        self.entries
            .iter()
            .all(|(_, outcome)| outcome.as_scalar().is_some())
    }
}

/// Scores a binary prediction against true labels.
///
/// Score metrics (hinge, brier, ROC, PR, average precision) consume
/// `y_pred_proba`; label metrics consume `y_pred`. A metric whose required
/// input is `None` is skipped without complaint. A metric that fails on the
/// fold is recorded as [`MetricOutcome::Undefined`] and scoring continues.
///
/// `numeric_only` picks the default metric set when `metrics` is not given
/// and is ignored otherwise.
pub fn score_binary_prediction(
    y_true: &[f64],
    y_pred_proba: Option<&[f64]>,
    y_pred: Option<&[f64]>,
    sample_weight: Option<&[f64]>,
    metrics: Option<&MetricSet>,
    numeric_only: bool,
) -> ScoreRow {
    let default;
    let metrics = match metrics {
        Some(m) => m,
        None => {
            default = MetricSet::binary_default(numeric_only);
            &default
        }
    };

    let mut row = ScoreRow::default();
    for spec in metrics.iter() {
        let prediction = match spec.input() {
            MetricInput::Score => y_pred_proba,
            MetricInput::Label => y_pred,
        };
        let Some(prediction) = prediction else {
            continue;
        };
        let outcome = match spec.evaluate(y_true, prediction, sample_weight) {
            Ok(value) => MetricOutcome::Value(value),
            Err(reason) => MetricOutcome::Undefined(reason.to_string()),
        };
        row.push(spec.name(), outcome);
    }
    row
}

/// Scores a continuous prediction against true values, with the same
/// catch-and-NaN policy as [`score_binary_prediction`] and a single
/// prediction vector for every metric.
pub fn score_regression_prediction(
    y_true: &[f64],
    y_pred: &[f64],
    sample_weight: Option<&[f64]>,
    metrics: Option<&MetricSet>,
) -> ScoreRow {
    let default;
    let metrics = match metrics {
        Some(m) => m,
        None => {
            default = MetricSet::regression();
            &default
        }
    };

    let mut row = ScoreRow::default();
    for spec in metrics.iter() {
        let outcome = match spec.evaluate(y_true, y_pred, sample_weight) {
            Ok(value) => MetricOutcome::Value(value),
            Err(reason) => MetricOutcome::Undefined(reason.to_string()),
        };
        row.push(spec.name(), outcome);
    }
    row
}
