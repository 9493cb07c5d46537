use serde::Serialize;

use crate::core::Frame;
use crate::evaluation::balance::{CovariateBalance, calculate_covariate_balance};
use crate::evaluation::error::EvalError;
use crate::evaluation::scorer::{
    ScoreRow, score_binary_prediction, score_regression_prediction,
};
use crate::metrics::{DistanceMetric, MetricSet};

/// Treatment-value-indexed prediction matrix: one column of per-sample
/// predictions per treatment arm.
///
/// This is the canonical representation for multi-arm predictions; the
/// per-assignment vectors the scorers consume are derived from it by lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreatmentMatrix {
    arms: Vec<(f64, Vec<f64>)>,
}

impl TreatmentMatrix {
    /// Builds a matrix from `(treatment value, prediction column)` pairs,
    /// sorted by treatment value.
    ///
    /// # Panics
    /// Panics on ragged or duplicate columns; a malformed prediction matrix
    /// is a programming error at the call site.
    pub fn new(mut arms: Vec<(f64, Vec<f64>)>) -> Self {
        if let Some(n) = arms.first().map(|(_, col)| col.len()) {
            for (value, col) in &arms {
                assert_eq!(col.len(), n, "arm {value} has {} rows, expected {n}", col.len());
            }
        }
        arms.sort_by(|(a, _), (b, _)| a.total_cmp(b));
        for pair in arms.windows(2) {
            assert_ne!(pair[0].0, pair[1].0, "duplicate treatment arm {}", pair[0].0);
        }
        Self { arms }
    }

    pub fn arm(&self, treatment_value: f64) -> Option<&[f64]> {
        self.arms
            .iter()
            .find(|(value, _)| *value == treatment_value)
            .map(|(_, col)| col.as_slice())
    }

    pub fn treatment_values(&self) -> impl Iterator<Item = f64> {
        self.arms.iter().map(|(value, _)| *value)
    }

    pub fn n_rows(&self) -> usize {
        self.arms.first().map_or(0, |(_, col)| col.len())
    }

    /// Per-sample lookup: element `i` comes from the arm named by
    /// `assignment[i]`.
    pub fn by_assignment(&self, assignment: &[f64]) -> Result<Vec<f64>, EvalError> {
        if assignment.len() != self.n_rows() {
            return Err(EvalError::LengthMismatch {
                name: "treatment assignment",
                expected: self.n_rows(),
                got: assignment.len(),
            });
        }
        assignment
            .iter()
            .enumerate()
            .map(|(i, &value)| {
                self.arm(value)
                    .map(|col| col[i])
                    .ok_or(EvalError::MissingTreatmentArm(value))
            })
            .collect()
    }
}

/// Prediction scores plus the covariate-balance table produced when scoring
/// a weight or propensity fold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightFoldScore {
    pub prediction_scores: ScoreRow,
    pub covariate_balance: CovariateBalance,
}

/// Weight-model predictions on one fold slice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightFoldPrediction {
    /// Balancing weight each sample received for its actual assignment.
    pub weight_by_assignment: Vec<f64>,
    /// Weight each sample would receive for the treated arm; doubles as the
    /// continuous score for treatment-assignment classification metrics.
    pub weight_for_treated: Vec<f64>,
    /// Predicted treatment-assignment label per sample.
    pub assignment_pred: Vec<f64>,
}

impl WeightFoldPrediction {
    pub fn new(
        weight_by_assignment: Vec<f64>,
        weight_for_treated: Vec<f64>,
        assignment_pred: Vec<f64>,
    ) -> Self {
        Self {
            weight_by_assignment,
            weight_for_treated,
            assignment_pred,
        }
    }

    /// Canonical construction from a treatment-value-indexed weight matrix:
    /// by-assignment weights come from per-sample lookup, for-treated weights
    /// from the maximal assigned treatment value's arm.
    pub fn from_weight_matrix(
        weights: &TreatmentMatrix,
        assignment: &[f64],
        assignment_pred: Vec<f64>,
    ) -> Result<Self, EvalError> {
        let weight_by_assignment = weights.by_assignment(assignment)?;
        let treated = assignment
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let weight_for_treated = weights
            .arm(treated)
            .ok_or(EvalError::MissingTreatmentArm(treated))?
            .to_vec();
        Ok(Self::new(
            weight_by_assignment,
            weight_for_treated,
            assignment_pred,
        ))
    }

    /// Scores the fold: binary classification of the true assignment (scored
    /// by the for-treated weight and the predicted label) plus the covariate
    /// balance achieved by the by-assignment weights.
    pub fn calculate_metrics(
        &self,
        x: &Frame,
        a_true: &[f64],
        metrics: Option<&MetricSet>,
    ) -> Result<WeightFoldScore, EvalError> {
        let prediction_scores = score_binary_prediction(
            a_true,
            Some(&self.weight_for_treated),
            Some(&self.assignment_pred),
            None,
            metrics,
            true,
        );
        let covariate_balance = calculate_covariate_balance(
            x,
            a_true,
            &self.weight_by_assignment,
            &DistanceMetric::default(),
        )?;
        Ok(WeightFoldScore {
            prediction_scores,
            covariate_balance,
        })
    }
}

/// Propensity-model predictions on one fold slice: a weight prediction plus
/// propensity diagnostics consumed by plotting collaborators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropensityFoldPrediction {
    pub weight: WeightFoldPrediction,
    /// Probability of the treated arm per sample.
    pub propensity: Vec<f64>,
    /// Probability of each sample's actual assignment.
    pub propensity_by_assignment: Vec<f64>,
}

impl PropensityFoldPrediction {
    pub fn new(
        weight: WeightFoldPrediction,
        propensity: Vec<f64>,
        propensity_by_assignment: Vec<f64>,
    ) -> Self {
        Self {
            weight,
            propensity,
            propensity_by_assignment,
        }
    }

    /// Canonical construction from weight and propensity matrices.
    pub fn from_matrices(
        weights: &TreatmentMatrix,
        propensities: &TreatmentMatrix,
        assignment: &[f64],
        assignment_pred: Vec<f64>,
    ) -> Result<Self, EvalError> {
        let weight = WeightFoldPrediction::from_weight_matrix(weights, assignment, assignment_pred)?;
        let treated = assignment
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let propensity = propensities
            .arm(treated)
            .ok_or(EvalError::MissingTreatmentArm(treated))?
            .to_vec();
        let propensity_by_assignment = propensities.by_assignment(assignment)?;
        Ok(Self::new(weight, propensity, propensity_by_assignment))
    }

    /// Same scoring shape as a weight prediction; the propensity fields are
    /// diagnostics for plotting, not additional metrics.
    pub fn calculate_metrics(
        &self,
        x: &Frame,
        a_true: &[f64],
        metrics: Option<&MetricSet>,
    ) -> Result<WeightFoldScore, EvalError> {
        self.weight.calculate_metrics(x, a_true, metrics)
    }
}

/// Outcome-model predictions on one fold slice: a predicted outcome per
/// treatment arm, and for binary outcomes optionally the per-arm event
/// probabilities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeFoldPrediction {
    pub prediction: TreatmentMatrix,
    pub event_probability: Option<TreatmentMatrix>,
    pub is_binary_outcome: bool,
}

impl OutcomeFoldPrediction {
    pub fn continuous(prediction: TreatmentMatrix) -> Self {
        Self {
            prediction,
            event_probability: None,
            is_binary_outcome: false,
        }
    }

    pub fn binary(prediction: TreatmentMatrix, event_probability: Option<TreatmentMatrix>) -> Self {
        Self {
            prediction,
            event_probability,
            is_binary_outcome: true,
        }
    }

    /// Scores the factual prediction: sample `i` takes arm `a_true[i]`'s
    /// prediction at `i`, compared against the observed outcome. Binary
    /// outcomes go through the classification scorer with the factual event
    /// probability as the continuous input; continuous outcomes go through
    /// the regression scorer.
    pub fn calculate_metrics(
        &self,
        a_true: &[f64],
        y_true: &[f64],
        metrics: Option<&MetricSet>,
    ) -> Result<ScoreRow, EvalError> {
        let factual = self.prediction.by_assignment(a_true)?;
        if self.is_binary_outcome {
            let factual_proba = match &self.event_probability {
                Some(proba) => Some(proba.by_assignment(a_true)?),
                None => None,
            };
            Ok(score_binary_prediction(
                y_true,
                factual_proba.as_deref(),
                Some(&factual),
                None,
                metrics,
                true,
            ))
        } else {
            Ok(score_regression_prediction(y_true, &factual, None, metrics))
        }
    }
}

/// One fold's predictions, tagged by the kind of estimator that produced
/// them. The closed set makes `score_fold` dispatch exhaustively; a new
/// estimator kind is a compile-time obligation, not a runtime surprise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FoldPrediction {
    Weight(WeightFoldPrediction),
    Propensity(PropensityFoldPrediction),
    Outcome(OutcomeFoldPrediction),
}

impl FoldPrediction {
    pub fn kind(&self) -> &'static str {
        match self {
            FoldPrediction::Weight(_) => "weight",
            FoldPrediction::Propensity(_) => "propensity",
            FoldPrediction::Outcome(_) => "outcome",
        }
    }
}

/// What scoring one fold produced: a plain score row for outcome models, or
/// the score/balance pair for weight and propensity models.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FoldScore {
    Prediction(ScoreRow),
    WeightBalance(WeightFoldScore),
}

impl FoldScore {
    pub fn kind(&self) -> &'static str {
        match self {
            FoldScore::Prediction(_) => "prediction",
            FoldScore::WeightBalance(_) => "weight-balance",
        }
    }
}

/// Scores one fold's predictions against the ground truth it was sliced
/// from, dispatching on the prediction kind.
pub fn score_fold(
    prediction: &FoldPrediction,
    x: &Frame,
    a_true: &[f64],
    y_true: &[f64],
    metrics: Option<&MetricSet>,
) -> Result<FoldScore, EvalError> {
    match prediction {
        FoldPrediction::Weight(weight) => weight
            .calculate_metrics(x, a_true, metrics)
            .map(FoldScore::WeightBalance),
        FoldPrediction::Propensity(propensity) => propensity
            .calculate_metrics(x, a_true, metrics)
            .map(FoldScore::WeightBalance),
        FoldPrediction::Outcome(outcome) => outcome
            .calculate_metrics(a_true, y_true, metrics)
            .map(FoldScore::Prediction),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(n: usize) -> Frame {
        Frame::new(vec![(
            "x0".into(),
            (0..n).map(|i| i as f64).collect(),
        )])
    }

    #[test]
    fn matrix_lookup_by_assignment() {
        let m = TreatmentMatrix::new(vec![
            (1.0, vec![10.0, 11.0, 12.0]),
            (0.0, vec![0.0, 1.0, 2.0]),
        ]);
        assert_eq!(m.treatment_values().collect::<Vec<_>>(), vec![0.0, 1.0]);
        assert_eq!(
            m.by_assignment(&[0.0, 1.0, 0.0]).unwrap(),
            vec![0.0, 11.0, 2.0]
        );
    }

    #[test]
    fn matrix_missing_arm_is_fatal() {
        let m = TreatmentMatrix::new(vec![(0.0, vec![1.0, 2.0])]);
        let err = m.by_assignment(&[0.0, 2.0]).unwrap_err();
        assert!(matches!(err, EvalError::MissingTreatmentArm(v) if v == 2.0));
    }

    #[test]
    fn weight_prediction_from_matrix_extracts_both_vectors() {
        let weights = TreatmentMatrix::new(vec![
            (0.0, vec![1.5, 1.2, 2.0, 1.1]),
            (1.0, vec![3.0, 2.5, 1.8, 4.0]),
        ]);
        let a = [0.0, 1.0, 1.0, 0.0];
        let p = WeightFoldPrediction::from_weight_matrix(&weights, &a, vec![0.0, 1.0, 1.0, 0.0])
            .unwrap();
        assert_eq!(p.weight_by_assignment, vec![1.5, 2.5, 1.8, 1.1]);
        assert_eq!(p.weight_for_treated, vec![3.0, 2.5, 1.8, 4.0]);
    }

    #[test]
    fn weight_fold_scores_pair_metrics_with_balance() {
        let a = [0.0, 0.0, 1.0, 1.0];
        let p = WeightFoldPrediction::new(
            vec![1.0, 1.0, 1.0, 1.0],
            vec![0.1, 0.2, 0.8, 0.9],
            vec![0.0, 0.0, 1.0, 1.0],
        );
        let score = p.calculate_metrics(&frame(4), &a, None).unwrap();
        assert!((score.prediction_scores.scalar("roc_auc").unwrap() - 1.0).abs() < 1e-12);
        assert!((score.prediction_scores.scalar("accuracy").unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(score.covariate_balance.groups.len(), 1);
        assert_eq!(score.covariate_balance.groups[0].entries.len(), 1);
    }

    #[test]
    fn propensity_construction_and_scoring_shape() {
        let weights = TreatmentMatrix::new(vec![
            (0.0, vec![1.25, 1.33, 5.0, 2.0]),
            (1.0, vec![5.0, 4.0, 1.25, 2.0]),
        ]);
        let propensities = TreatmentMatrix::new(vec![
            (0.0, vec![0.8, 0.75, 0.2, 0.5]),
            (1.0, vec![0.2, 0.25, 0.8, 0.5]),
        ]);
        let a = [0.0, 0.0, 1.0, 1.0];
        let p = PropensityFoldPrediction::from_matrices(
            &weights,
            &propensities,
            &a,
            vec![0.0, 0.0, 1.0, 0.0],
        )
        .unwrap();
        assert_eq!(p.propensity, vec![0.2, 0.25, 0.8, 0.5]);
        assert_eq!(p.propensity_by_assignment, vec![0.8, 0.75, 0.8, 0.5]);

        let score = p.calculate_metrics(&frame(4), &a, None).unwrap();
        assert!(score.prediction_scores.get("roc_auc").is_some());
    }

    #[test]
    fn outcome_factual_lookup_picks_the_assigned_arm() {
        let prediction = TreatmentMatrix::new(vec![
            (0.0, vec![1.0, 2.0, 3.0, 4.0]),
            (1.0, vec![5.0, 6.0, 7.0, 8.0]),
        ]);
        let outcome = OutcomeFoldPrediction::continuous(prediction);
        let a = [1.0, 0.0, 1.0, 0.0];
        // Factual predictions: [5, 2, 7, 4]; truth equal -> perfect scores.
        let y = [5.0, 2.0, 7.0, 4.0];
        let row = outcome.calculate_metrics(&a, &y, None).unwrap();
        assert_eq!(row.scalar("mae").unwrap(), 0.0);
        assert!((row.scalar("r2").unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn binary_outcome_routes_to_classification_metrics() {
        let prediction = TreatmentMatrix::new(vec![
            (0.0, vec![0.0, 0.0, 1.0, 1.0]),
            (1.0, vec![1.0, 0.0, 1.0, 0.0]),
        ]);
        let proba = TreatmentMatrix::new(vec![
            (0.0, vec![0.1, 0.2, 0.9, 0.8]),
            (1.0, vec![0.9, 0.3, 0.7, 0.4]),
        ]);
        let outcome = OutcomeFoldPrediction::binary(prediction, Some(proba));
        let a = [0.0, 0.0, 1.0, 1.0];
        let y = [0.0, 0.0, 1.0, 0.0];
        let row = outcome.calculate_metrics(&a, &y, None).unwrap();
        assert!(row.get("accuracy").is_some());
        assert!(row.get("brier").is_some());
        assert!(row.get("mae").is_none());
    }

    #[test]
    fn binary_outcome_without_probabilities_skips_score_metrics() {
        let prediction = TreatmentMatrix::new(vec![(0.0, vec![0.0, 1.0])]);
        let outcome = OutcomeFoldPrediction::binary(prediction, None);
        let row = outcome
            .calculate_metrics(&[0.0, 0.0], &[0.0, 1.0], None)
            .unwrap();
        assert!(row.get("accuracy").is_some());
        assert!(row.get("roc_auc").is_none());
    }

    #[test]
    fn score_fold_dispatches_by_variant() {
        let a = [0.0, 0.0, 1.0, 1.0];
        let y = [1.0, 2.0, 3.0, 4.0];
        let x = frame(4);

        let weight = FoldPrediction::Weight(WeightFoldPrediction::new(
            vec![1.0; 4],
            vec![0.2, 0.3, 0.7, 0.8],
            vec![0.0, 0.0, 1.0, 1.0],
        ));
        assert!(matches!(
            score_fold(&weight, &x, &a, &y, None).unwrap(),
            FoldScore::WeightBalance(_)
        ));

        let outcome = FoldPrediction::Outcome(OutcomeFoldPrediction::continuous(
            TreatmentMatrix::new(vec![
                (0.0, vec![1.0, 2.0, 3.0, 4.0]),
                (1.0, vec![1.0, 2.0, 3.0, 4.0]),
            ]),
        ));
        assert!(matches!(
            score_fold(&outcome, &x, &a, &y, None).unwrap(),
            FoldScore::Prediction(_)
        ));
    }
}
