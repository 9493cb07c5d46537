//! Typed bundling of a finished evaluation: the aggregated metrics, the
//! fitted models, the raw fold predictions, and the data they were computed
//! from, wrapped in a variant that knows which diagnostic plots apply.

mod extractors;

pub use extractors::{ClassificationPlotSource, ContinuousPlotSource, FoldCurve, ScoredFold,
    WeightPlotSource};

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::{Fold, Frame, Phase, take};
use crate::evaluation::aggregate::EvaluatedMetrics;
use crate::evaluation::balance::CovariateBalance;
use crate::evaluation::error::EvalError;
use crate::evaluation::predictions::{FoldPrediction, TreatmentMatrix};
use crate::metrics::binary;

/// Canonical plot names, shared between the result variants and callers
/// requesting plot data by name.
pub mod plots {
    pub const WEIGHT_DISTRIBUTION: &str = "weight_distribution";
    pub const COVARIATE_BALANCE_LOVE: &str = "covariate_balance_love";
    pub const COVARIATE_BALANCE_SLOPE: &str = "covariate_balance_slope";
    pub const ROC_CURVE: &str = "roc_curve";
    pub const PR_CURVE: &str = "pr_curve";
    pub const CALIBRATION: &str = "calibration";
    pub const CONTINUOUS_ACCURACY: &str = "continuous_accuracy";
    pub const RESIDUALS: &str = "residuals";
    pub const COMMON_SUPPORT: &str = "common_support";

    pub(super) const WEIGHT: &[&str] = &[
        COVARIATE_BALANCE_LOVE,
        COVARIATE_BALANCE_SLOPE,
        WEIGHT_DISTRIBUTION,
    ];
    pub(super) const PROPENSITY: &[&str] = &[
        COVARIATE_BALANCE_LOVE,
        COVARIATE_BALANCE_SLOPE,
        WEIGHT_DISTRIBUTION,
        ROC_CURVE,
        PR_CURVE,
        CALIBRATION,
    ];
    pub(super) const BINARY_OUTCOME: &[&str] = &[ROC_CURVE, PR_CURVE, CALIBRATION];
    pub(super) const CONTINUOUS_OUTCOME: &[&str] =
        &[CONTINUOUS_ACCURACY, RESIDUALS, COMMON_SUPPORT];
}

/// What a fitted causal model estimates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EstimatorKind {
    Weight,
    Propensity,
    IndividualOutcome,
}

/// Implemented by fitted model handles so results can be typed by what the
/// model estimates without inspecting the model itself.
pub trait FittedEstimator {
    fn kind(&self) -> EstimatorKind;
}

/// How the evaluation refit its models: once on the whole population, once
/// per fold, or once per (phase, fold) cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Models<M> {
    Single(M),
    PerFold(Vec<M>),
    ByPhase(BTreeMap<Phase, Vec<M>>),
}

impl<M> Models<M> {
    /// Any one model, used to read properties shared by all of them.
    pub fn first(&self) -> Option<&M> {
        match self {
            Models::Single(model) => Some(model),
            Models::PerFold(models) => models.first(),
            Models::ByPhase(by_phase) => by_phase.values().flatten().next(),
        }
    }
}

/// Everything a finished evaluation produced and consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationData<M> {
    pub evaluated_metrics: EvaluatedMetrics,
    pub models: Models<M>,
    pub predictions: BTreeMap<Phase, Vec<FoldPrediction>>,
    pub cv: Vec<Fold>,
    pub x: Frame,
    pub a: Vec<f64>,
    pub y: Vec<f64>,
}

impl<M> EvaluationData<M> {
    /// The phase's folds with their sliced ground truth, in fold order.
    fn phase_folds(
        &self,
        phase: Phase,
    ) -> Result<Vec<(usize, &FoldPrediction, Vec<f64>, Vec<f64>)>, EvalError> {
        let predictions = self
            .predictions
            .get(&phase)
            .ok_or(EvalError::MissingPhase(phase))?;
        if predictions.len() != self.cv.len() {
            return Err(EvalError::PredictionCountMismatch {
                phase,
                n_predictions: predictions.len(),
                n_folds: self.cv.len(),
            });
        }
        Ok(self
            .cv
            .iter()
            .zip(predictions)
            .enumerate()
            .map(|(fold, (split, prediction))| {
                let indices = split.indices(phase);
                (fold, prediction, take(&self.a, indices), take(&self.y, indices))
            })
            .collect())
    }
}

/// Data extracted for one named plot, ready for a rendering front end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PlotData {
    /// Per fold: balancing score vs. true treatment assignment.
    WeightDistribution(Vec<ScoredFold>),
    /// Per-fold covariate balance tables for the phase.
    CovariateBalance(Vec<CovariateBalance>),
    /// Per-fold ROC or precision-recall curves with their areas.
    Curves(Vec<FoldCurve>),
    /// Per fold: predicted probability vs. binary truth.
    Calibration(Vec<ScoredFold>),
    /// Per fold: factual prediction vs. observed outcome.
    ContinuousAccuracy(Vec<ScoredFold>),
    /// Per fold: factual prediction vs. residual (observed minus predicted).
    Residuals(Vec<ScoredFold>),
    /// Per-fold prediction columns for every treatment arm.
    CommonSupport(Vec<TreatmentMatrix>),
}

/// A finished evaluation typed by the kind of model it evaluated. The
/// variant fixes which plots [`Self::get_data_for_plot`] will serve.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationResults<M> {
    Weight(EvaluationData<M>),
    Propensity(EvaluationData<M>),
    BinaryOutcome(EvaluationData<M>),
    ContinuousOutcome(EvaluationData<M>),
}

impl<M: FittedEstimator> EvaluationResults<M> {
    /// Wraps evaluation output in the variant matching the fitted model.
    /// Outcome models split further on whether any fold predicted a binary
    /// outcome.
    pub fn make(data: EvaluationData<M>) -> Result<Self, EvalError> {
        let kind = data
            .models
            .first()
            .ok_or(EvalError::NoFittedModel)?
            .kind();
        Ok(match kind {
            EstimatorKind::Weight => EvaluationResults::Weight(data),
            EstimatorKind::Propensity => EvaluationResults::Propensity(data),
            EstimatorKind::IndividualOutcome => {
                let is_binary = data
                    .predictions
                    .values()
                    .flatten()
                    .any(|p| matches!(p, FoldPrediction::Outcome(o) if o.is_binary_outcome));
                if is_binary {
                    EvaluationResults::BinaryOutcome(data)
                } else {
                    EvaluationResults::ContinuousOutcome(data)
                }
            }
        })
    }
}

impl<M> EvaluationResults<M> {
    pub fn data(&self) -> &EvaluationData<M> {
        match self {
            EvaluationResults::Weight(data)
            | EvaluationResults::Propensity(data)
            | EvaluationResults::BinaryOutcome(data)
            | EvaluationResults::ContinuousOutcome(data) => data,
        }
    }

    /// The plot names this variant can serve, in presentation order.
    pub fn all_plot_names(&self) -> &'static [&'static str] {
        match self {
            EvaluationResults::Weight(_) => plots::WEIGHT,
            EvaluationResults::Propensity(_) => plots::PROPENSITY,
            EvaluationResults::BinaryOutcome(_) => plots::BINARY_OUTCOME,
            EvaluationResults::ContinuousOutcome(_) => plots::CONTINUOUS_OUTCOME,
        }
    }

    /// Extracts the data behind one named plot for one phase.
    ///
    /// Names outside [`Self::all_plot_names`] are rejected; a phase with no
    /// predictions is an error even for supported names.
    pub fn get_data_for_plot(&self, name: &str, phase: Phase) -> Result<PlotData, EvalError> {
        if !self.all_plot_names().contains(&name) {
            return Err(EvalError::UnsupportedPlot(name.to_owned()));
        }
        let data = self.data();
        match name {
            plots::WEIGHT_DISTRIBUTION => weight_distribution(data, phase),
            plots::COVARIATE_BALANCE_LOVE | plots::COVARIATE_BALANCE_SLOPE => {
                covariate_balance(data, phase)
            }
            plots::ROC_CURVE => classification_curves(data, phase, CurveKind::Roc),
            plots::PR_CURVE => classification_curves(data, phase, CurveKind::PrecisionRecall),
            plots::CALIBRATION => calibration(data, phase),
            plots::CONTINUOUS_ACCURACY => continuous_pairs(data, phase, ContinuousPlot::Accuracy),
            plots::RESIDUALS => continuous_pairs(data, phase, ContinuousPlot::Residuals),
            plots::COMMON_SUPPORT => common_support(data, phase),
            _ => Err(EvalError::UnsupportedPlot(name.to_owned())),
        }
    }
}

fn weight_distribution<M>(data: &EvaluationData<M>, phase: Phase) -> Result<PlotData, EvalError> {
    let mut folds = Vec::new();
    for (fold, prediction, a_fold, _) in data.phase_folds(phase)? {
        let score = match prediction {
            FoldPrediction::Weight(w) => w.distribution_score(),
            FoldPrediction::Propensity(p) => p.distribution_score(),
            other => {
                return Err(EvalError::MixedPredictionKinds {
                    expected: "weight",
                    got: other.kind(),
                });
            }
        };
        folds.push(ScoredFold {
            fold,
            score: score.to_vec(),
            truth: a_fold,
        });
    }
    Ok(PlotData::WeightDistribution(folds))
}

fn covariate_balance<M>(data: &EvaluationData<M>, phase: Phase) -> Result<PlotData, EvalError> {
    if !data.predictions.contains_key(&phase) {
        return Err(EvalError::MissingPhase(phase));
    }
    let frame = data
        .evaluated_metrics
        .covariate_balance()
        .ok_or(EvalError::MixedPredictionKinds {
            expected: "weight-balance",
            got: "prediction",
        })?;
    let tables = frame
        .tables_for_phase(phase)
        .into_iter()
        .cloned()
        .collect();
    Ok(PlotData::CovariateBalance(tables))
}

enum CurveKind {
    Roc,
    PrecisionRecall,
}

fn proba_and_truth(
    prediction: &FoldPrediction,
    a_fold: &[f64],
    y_fold: &[f64],
) -> Result<(Vec<f64>, Vec<f64>), EvalError> {
    match prediction {
        FoldPrediction::Propensity(p) => p.proba_and_truth(a_fold, y_fold),
        FoldPrediction::Outcome(o) => o.proba_and_truth(a_fold, y_fold),
        other => Err(EvalError::MixedPredictionKinds {
            expected: "propensity",
            got: other.kind(),
        }),
    }
}

fn classification_curves<M>(
    data: &EvaluationData<M>,
    phase: Phase,
    kind: CurveKind,
) -> Result<PlotData, EvalError> {
    let mut curves = Vec::new();
    for (fold, prediction, a_fold, y_fold) in data.phase_folds(phase)? {
        let (proba, truth) = proba_and_truth(prediction, &a_fold, &y_fold)?;
        let (curve, area) = match kind {
            CurveKind::Roc => (
                binary::roc_curve(&truth, &proba, None)?,
                binary::roc_auc(&truth, &proba, None).unwrap_or(f64::NAN),
            ),
            CurveKind::PrecisionRecall => (
                binary::pr_curve(&truth, &proba, None)?,
                binary::avg_precision(&truth, &proba, None).unwrap_or(f64::NAN),
            ),
        };
        curves.push(FoldCurve { fold, curve, area });
    }
    Ok(PlotData::Curves(curves))
}

fn calibration<M>(data: &EvaluationData<M>, phase: Phase) -> Result<PlotData, EvalError> {
    let mut folds = Vec::new();
    for (fold, prediction, a_fold, y_fold) in data.phase_folds(phase)? {
        let (score, truth) = proba_and_truth(prediction, &a_fold, &y_fold)?;
        folds.push(ScoredFold { fold, score, truth });
    }
    Ok(PlotData::Calibration(folds))
}

enum ContinuousPlot {
    Accuracy,
    Residuals,
}

fn continuous_pairs<M>(
    data: &EvaluationData<M>,
    phase: Phase,
    plot: ContinuousPlot,
) -> Result<PlotData, EvalError> {
    let mut folds = Vec::new();
    for (fold, prediction, a_fold, y_fold) in data.phase_folds(phase)? {
        let FoldPrediction::Outcome(outcome) = prediction else {
            return Err(EvalError::MixedPredictionKinds {
                expected: "outcome",
                got: prediction.kind(),
            });
        };
        let predicted = outcome.factual_prediction(&a_fold)?;
        let truth = match plot {
            ContinuousPlot::Accuracy => y_fold,
            ContinuousPlot::Residuals => y_fold
                .iter()
                .zip(&predicted)
                .map(|(y, p)| y - p)
                .collect(),
        };
        folds.push(ScoredFold {
            fold,
            score: predicted,
            truth,
        });
    }
    Ok(match plot {
        ContinuousPlot::Accuracy => PlotData::ContinuousAccuracy(folds),
        ContinuousPlot::Residuals => PlotData::Residuals(folds),
    })
}

fn common_support<M>(data: &EvaluationData<M>, phase: Phase) -> Result<PlotData, EvalError> {
    let mut matrices = Vec::new();
    for (_, prediction, _, _) in data.phase_folds(phase)? {
        let FoldPrediction::Outcome(outcome) = prediction else {
            return Err(EvalError::MixedPredictionKinds {
                expected: "outcome",
                got: prediction.kind(),
            });
        };
        matrices.push(outcome.arm_predictions().clone());
    }
    Ok(PlotData::CommonSupport(matrices))
}
