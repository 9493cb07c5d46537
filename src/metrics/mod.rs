mod classification;
mod distance;
mod registry;
mod regression;

pub use registry::{
    DistanceFn, DistanceMetric, MetricFn, MetricInput, MetricKind, MetricSet, MetricSpec,
};

pub mod binary {
    pub use super::classification::{
        accuracy, avg_precision, brier, confusion_matrix, f1, hinge, matthews, pr_curve,
        precision, recall, roc_auc, roc_curve, zero_one_loss,
    };
}

pub mod continuous {
    pub use super::regression::{
        explained_variance, mean_absolute_error, mean_squared_error, mean_squared_log_error,
        median_absolute_error, r2,
    };
}

pub use distance::{weighted_ks2samp, weighted_standardized_mean_difference};

use serde::Serialize;
use thiserror::Error;

/// Why a metric could not be evaluated on a fold.
///
/// Degenerate folds (for example, single-class true labels handed to ROC-AUC)
/// are expected during cross-validation; the scorer absorbs these into a
/// NaN result rather than aborting the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetricError {
    #[error("degenerate input: {0}")]
    Degenerate(String),

    #[error("length mismatch: {expected} true values but {got} predictions")]
    LengthMismatch { expected: usize, got: usize },

    #[error("sample_weight has {got} entries, expected {expected}")]
    WeightLengthMismatch { expected: usize, got: usize },
}

/// What a metric produced for one fold.
///
/// The shape is declared per metric at registry-definition time
/// ([`MetricKind`]), never inferred from the runtime value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ScoreValue {
    Scalar(f64),
    /// Square matrix over the sorted distinct labels (confusion matrix).
    Matrix(Vec<Vec<f64>>),
    /// Curve triple (ROC, precision-recall).
    Curve(Curve),
}

impl ScoreValue {
    #[inline]
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            ScoreValue::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn is_scalar(&self) -> bool {
        matches!(self, ScoreValue::Scalar(_))
    }
}

/// Two coordinate vectors plus the decision thresholds that generated them.
///
/// Axis meaning follows the producing metric: ROC stores (fpr, tpr),
/// precision-recall stores (precision, recall). `thresholds` may be one entry
/// shorter than the coordinates when a terminal point is appended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Curve {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    pub thresholds: Vec<f64>,
}

pub(crate) fn check_lengths(
    y_true: &[f64],
    y_pred: &[f64],
    sample_weight: Option<&[f64]>,
) -> Result<(), MetricError> {
    if y_true.len() != y_pred.len() {
        return Err(MetricError::LengthMismatch {
            expected: y_true.len(),
            got: y_pred.len(),
        });
    }
    if let Some(w) = sample_weight {
        if w.len() != y_true.len() {
            return Err(MetricError::WeightLengthMismatch {
                expected: y_true.len(),
                got: w.len(),
            });
        }
    }
    Ok(())
}

/// Weighted mean; `None` weights mean uniform.
pub(crate) fn weighted_mean(values: impl Iterator<Item = (f64, f64)>) -> f64 {
    let mut sum = 0.0;
    let mut total = 0.0;
    for (v, w) in values {
        sum += v * w;
        total += w;
    }
    if total > 0.0 { sum / total } else { f64::NAN }
}

#[inline]
pub(crate) fn weight_at(sample_weight: Option<&[f64]>, i: usize) -> f64 {
    sample_weight.map_or(1.0, |w| w[i])
}
