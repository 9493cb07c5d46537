use serde::Serialize;

use crate::evaluation::error::EvalError;
use crate::evaluation::predictions::{
    OutcomeFoldPrediction, PropensityFoldPrediction, WeightFoldPrediction,
};
use crate::metrics::Curve;

/// Paired per-fold vectors backing a scatter or distribution plot. The
/// meaning of `score` and `truth` follows the plot the pair was extracted
/// for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredFold {
    pub fold: usize,
    pub score: Vec<f64>,
    pub truth: Vec<f64>,
}

/// A per-fold curve with its summary area. Degenerate folds (single-class
/// truth) keep their curve but carry a NaN area.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoldCurve {
    pub fold: usize,
    pub curve: Curve,
    pub area: f64,
}

/// Capability: the prediction carries a per-sample balancing score whose
/// distribution across treatment groups is worth plotting.
pub trait WeightPlotSource {
    fn distribution_score(&self) -> &[f64];
}

impl WeightPlotSource for WeightFoldPrediction {
    fn distribution_score(&self) -> &[f64] {
        &self.weight_by_assignment
    }
}

impl WeightPlotSource for PropensityFoldPrediction {
    fn distribution_score(&self) -> &[f64] {
        &self.propensity
    }
}

/// Capability: the prediction scores a binary target with a continuous
/// probability, supporting ROC, precision-recall, and calibration plots.
///
/// Given the fold's true assignment and outcome, yields the
/// (probability, binary truth) pair those plots consume.
pub trait ClassificationPlotSource {
    fn proba_and_truth(
        &self,
        a_true: &[f64],
        y_true: &[f64],
    ) -> Result<(Vec<f64>, Vec<f64>), EvalError>;
}

impl ClassificationPlotSource for PropensityFoldPrediction {
    /// Propensity diagnostics classify the treatment assignment itself.
    fn proba_and_truth(
        &self,
        a_true: &[f64],
        _y_true: &[f64],
    ) -> Result<(Vec<f64>, Vec<f64>), EvalError> {
        Ok((self.propensity.clone(), a_true.to_vec()))
    }
}

impl ClassificationPlotSource for OutcomeFoldPrediction {
    /// Binary outcome diagnostics classify the observed outcome with the
    /// factual event probability.
    fn proba_and_truth(
        &self,
        a_true: &[f64],
        y_true: &[f64],
    ) -> Result<(Vec<f64>, Vec<f64>), EvalError> {
        let proba = self
            .event_probability
            .as_ref()
            .ok_or(EvalError::MissingEventProbability)?
            .by_assignment(a_true)?;
        Ok((proba, y_true.to_vec()))
    }
}

/// Capability: the prediction estimates a continuous outcome, supporting
/// accuracy, residual, and common-support plots.
pub trait ContinuousPlotSource {
    /// Factual prediction per sample: the assigned arm's estimate.
    fn factual_prediction(&self, a_true: &[f64]) -> Result<Vec<f64>, EvalError>;

    /// Per-arm prediction columns for the common-support plot.
    fn arm_predictions(&self) -> &crate::evaluation::predictions::TreatmentMatrix;
}

impl ContinuousPlotSource for OutcomeFoldPrediction {
    fn factual_prediction(&self, a_true: &[f64]) -> Result<Vec<f64>, EvalError> {
        self.prediction.by_assignment(a_true)
    }

    fn arm_predictions(&self) -> &crate::evaluation::predictions::TreatmentMatrix {
        &self.prediction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::predictions::TreatmentMatrix;

    #[test]
    fn weight_and_propensity_expose_different_distribution_scores() {
        let weight = WeightFoldPrediction::new(
            vec![1.5, 2.0],
            vec![0.4, 0.6],
            vec![0.0, 1.0],
        );
        assert_eq!(weight.distribution_score(), &[1.5, 2.0]);

        let propensity = PropensityFoldPrediction::new(weight, vec![0.4, 0.6], vec![0.6, 0.6]);
        assert_eq!(propensity.distribution_score(), &[0.4, 0.6]);
    }

    #[test]
    fn outcome_classification_source_requires_event_probabilities() {
        let prediction = TreatmentMatrix::new(vec![(0.0, vec![0.0, 1.0])]);
        let outcome = OutcomeFoldPrediction::binary(prediction, None);
        let err = outcome
            .proba_and_truth(&[0.0, 0.0], &[0.0, 1.0])
            .unwrap_err();
        assert!(matches!(err, EvalError::MissingEventProbability));
    }

    #[test]
    fn outcome_classification_source_extracts_factual_probabilities() {
        let prediction = TreatmentMatrix::new(vec![
            (0.0, vec![0.0, 1.0]),
            (1.0, vec![1.0, 0.0]),
        ]);
        let proba = TreatmentMatrix::new(vec![
            (0.0, vec![0.1, 0.9]),
            (1.0, vec![0.8, 0.2]),
        ]);
        let outcome = OutcomeFoldPrediction::binary(prediction, Some(proba));
        let (p, y) = outcome.proba_and_truth(&[1.0, 0.0], &[1.0, 1.0]).unwrap();
        assert_eq!(p, vec![0.8, 0.9]);
        assert_eq!(y, vec![1.0, 1.0]);
    }
}
