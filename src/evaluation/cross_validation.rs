use std::collections::BTreeMap;

use crate::core::{Fold, Frame, Phase, take};
use crate::evaluation::aggregate::{EvaluatedMetrics, combine_fold_scores};
use crate::evaluation::error::EvalError;
use crate::evaluation::predictions::{FoldPrediction, FoldScore, score_fold};
use crate::metrics::MetricSet;

fn check_population_lengths(x: &Frame, a: &[f64], y: &[f64]) -> Result<(), EvalError> {
    let n = x.n_rows();
    if a.len() != n {
        return Err(EvalError::LengthMismatch {
            name: "treatment assignment",
            expected: n,
            got: a.len(),
        });
    }
    if y.len() != n {
        return Err(EvalError::LengthMismatch {
            name: "outcome",
            expected: n,
            got: y.len(),
        });
    }
    Ok(())
}

fn check_fold_indices(cv: &[Fold], phase: Phase, n_samples: usize) -> Result<(), EvalError> {
    for (fold, split) in cv.iter().enumerate() {
        if let Some(&index) = split.indices(phase).iter().find(|&&i| i >= n_samples) {
            return Err(EvalError::FoldIndexOutOfBounds {
                fold,
                phase,
                index,
                n_samples,
            });
        }
    }
    Ok(())
}

/// Scores a full cross-validation run and stacks the per-fold results.
///
/// `predictions` holds, per phase, one prediction per fold in fold order;
/// each is scored against the slice of `(x, a, y)` that `cv`'s matching
/// split assigns to that phase. A phase missing from `predictions` is simply
/// absent from the output (single-phase runs are routine); a phase with the
/// wrong number of predictions is an error.
pub fn score_cv(
    predictions: &BTreeMap<Phase, Vec<FoldPrediction>>,
    x: &Frame,
    a: &[f64],
    y: &[f64],
    cv: &[Fold],
    metrics: Option<&MetricSet>,
) -> Result<EvaluatedMetrics, EvalError> {
    check_population_lengths(x, a, y)?;

    let mut scores: BTreeMap<Phase, Vec<FoldScore>> = BTreeMap::new();
    for (&phase, fold_predictions) in predictions {
        if fold_predictions.len() != cv.len() {
            return Err(EvalError::PredictionCountMismatch {
                phase,
                n_predictions: fold_predictions.len(),
                n_folds: cv.len(),
            });
        }
        check_fold_indices(cv, phase, x.n_rows())?;

        let mut phase_scores = Vec::with_capacity(cv.len());
        for (split, prediction) in cv.iter().zip(fold_predictions) {
            let indices = split.indices(phase);
            let x_fold = x.select_rows(indices);
            let a_fold = take(a, indices);
            let y_fold = take(y, indices);
            phase_scores.push(score_fold(prediction, &x_fold, &a_fold, &y_fold, metrics)?);
        }
        scores.insert(phase, phase_scores);
    }

    combine_fold_scores(scores)
}
