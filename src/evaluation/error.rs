use thiserror::Error;

use crate::core::Phase;

/// Structural failures that abort an evaluation.
///
/// Degenerate metrics never surface here; those degrade to NaN inside the
/// score row (see [`crate::evaluation::ScoreRow::warnings`]). Everything in
/// this enum is a caller-contract or configuration violation for which no
/// partial result is returned.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("unknown distance metric {0:?}; built-in metrics are smd, abs_smd, ks")]
    UnknownDistanceMetric(String),

    #[error("{name} has {got} entries, expected {expected}")]
    LengthMismatch {
        name: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("fold {fold}: {phase} index {index} is out of bounds for {n_samples} samples")]
    FoldIndexOutOfBounds {
        fold: usize,
        phase: Phase,
        index: usize,
        n_samples: usize,
    },

    #[error("{phase} has {n_predictions} fold predictions but {n_folds} folds were supplied")]
    PredictionCountMismatch {
        phase: Phase,
        n_predictions: usize,
        n_folds: usize,
    },

    #[error("no fold scores to combine")]
    EmptyScores,

    #[error("prediction kinds differ across folds: expected {expected}, got {got}")]
    MixedPredictionKinds {
        expected: &'static str,
        got: &'static str,
    },

    #[error("score tables disagree across folds of phase {phase}: {detail}")]
    InconsistentScores { phase: Phase, detail: String },

    #[error("treatment arm {0} has no prediction column")]
    MissingTreatmentArm(f64),

    #[error("no fitted model to derive a results variant from")]
    NoFittedModel,

    #[error("plot {0:?} is not supported by these results")]
    UnsupportedPlot(String),

    #[error("no predictions for phase {0}")]
    MissingPhase(Phase),

    #[error("binary outcome predictions carry no event probabilities")]
    MissingEventProbability,

    #[error(transparent)]
    Metric(#[from] crate::metrics::MetricError),
}
