use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::{Fold, Frame, Phase};
use crate::evaluation::{
    FoldPrediction, OutcomeFoldPrediction, PropensityFoldPrediction, TreatmentMatrix,
    WeightFoldPrediction,
};

/// A confounded synthetic cohort: the first covariate drives both the
/// treatment probability and the outcome, so unweighted groups are
/// imbalanced by construction.
#[derive(Debug, Clone)]
pub struct SyntheticPopulation {
    pub x: Frame,
    pub a: Vec<f64>,
    pub y: Vec<f64>,
    /// The true probability of treatment per sample.
    pub propensity: Vec<f64>,
}

/// Samples a population of `n_samples` rows and `n_covariates` uniform
/// covariates named `x0..`, reproducible from `seed`.
///
/// # Panics
/// Panics if `n_covariates` is zero; the cohort needs at least the
/// confounding covariate.
pub fn synthetic_population(
    n_samples: usize,
    n_covariates: usize,
    seed: u64,
) -> SyntheticPopulation {
    assert!(n_covariates > 0, "at least one covariate is required");
    let mut rng = StdRng::seed_from_u64(seed);
    let columns: Vec<(String, Vec<f64>)> = (0..n_covariates)
        .map(|j| {
            let column = (0..n_samples).map(|_| rng.random::<f64>()).collect();
            (format!("x{j}"), column)
        })
        .collect();
    let x = Frame::new(columns);

    let x0 = x.column("x0").map(<[f64]>::to_vec).unwrap_or_default();
    let propensity: Vec<f64> = x0.iter().map(|&v| 0.2 + 0.6 * v).collect();
    let a: Vec<f64> = propensity
        .iter()
        .map(|&p| if rng.random::<f64>() < p { 1.0 } else { 0.0 })
        .collect();
    let y: Vec<f64> = x0
        .iter()
        .zip(&a)
        .map(|(&v, &t)| 2.0 * t + v + 0.1 * rng.random::<f64>())
        .collect();

    SyntheticPopulation {
        x,
        a,
        y,
        propensity,
    }
}

/// Round-robin k-fold splits over `n_samples` rows: row `i` validates in
/// fold `i % k` and trains everywhere else.
pub fn k_folds(n_samples: usize, k: usize) -> Vec<Fold> {
    (0..k)
        .map(|fold| {
            let (valid, train) = (0..n_samples).partition(|i| i % k == fold);
            Fold::new(train, valid)
        })
        .collect()
}

fn inverse_probability_weights(propensity: &[f64]) -> TreatmentMatrix {
    let for_control = propensity.iter().map(|p| 1.0 / (1.0 - p)).collect();
    let for_treated = propensity.iter().map(|p| 1.0 / p).collect();
    TreatmentMatrix::new(vec![(0.0, for_control), (1.0, for_treated)])
}

fn propensity_matrix(propensity: &[f64]) -> TreatmentMatrix {
    let for_control = propensity.iter().map(|p| 1.0 - p).collect();
    TreatmentMatrix::new(vec![(0.0, for_control), (1.0, propensity.to_vec())])
}

fn threshold_labels(propensity: &[f64]) -> Vec<f64> {
    propensity
        .iter()
        .map(|&p| if p >= 0.5 { 1.0 } else { 0.0 })
        .collect()
}

/// Inverse-probability weights derived from the true propensities of one
/// fold slice.
///
/// # Panics
/// Panics if `propensity` and `a` differ in length.
pub fn oracle_weight_prediction(propensity: &[f64], a: &[f64]) -> FoldPrediction {
    let weights = inverse_probability_weights(propensity);
    let prediction =
        WeightFoldPrediction::from_weight_matrix(&weights, a, threshold_labels(propensity))
            .unwrap();
    FoldPrediction::Weight(prediction)
}

/// A propensity prediction that reports the true treatment probabilities.
///
/// # Panics
/// Panics if `propensity` and `a` differ in length.
pub fn oracle_propensity_prediction(propensity: &[f64], a: &[f64]) -> FoldPrediction {
    let weights = inverse_probability_weights(propensity);
    let propensities = propensity_matrix(propensity);
    let prediction = PropensityFoldPrediction::from_matrices(
        &weights,
        &propensities,
        a,
        threshold_labels(propensity),
    )
    .unwrap();
    FoldPrediction::Propensity(prediction)
}

/// A continuous outcome prediction matching the population's noiseless
/// response surface: `x0` under control, `x0 + 2` under treatment.
pub fn oracle_outcome_prediction(x0: &[f64]) -> FoldPrediction {
    let control = x0.to_vec();
    let treated = x0.iter().map(|v| v + 2.0).collect();
    FoldPrediction::Outcome(OutcomeFoldPrediction::continuous(TreatmentMatrix::new(
        vec![(0.0, control), (1.0, treated)],
    )))
}

/// Builds the per-phase fold predictions a cross-validation scorer expects,
/// applying `predict` to each fold slice of the population.
pub fn phase_predictions(
    population: &SyntheticPopulation,
    cv: &[Fold],
    predict: impl Fn(&SyntheticPopulation, &[usize]) -> FoldPrediction,
) -> BTreeMap<Phase, Vec<FoldPrediction>> {
    [Phase::Train, Phase::Valid]
        .into_iter()
        .map(|phase| {
            let predictions = cv
                .iter()
                .map(|fold| predict(population, fold.indices(phase)))
                .collect();
            (phase, predictions)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::take;
    use crate::evaluation::{EvaluatedMetrics, score_cv};

    #[test]
    fn population_is_reproducible_and_confounded() {
        let first = synthetic_population(200, 3, 7);
        let second = synthetic_population(200, 3, 7);
        assert_eq!(first.a, second.a);
        assert_eq!(first.y, second.y);
        assert_eq!(first.x.n_rows(), 200);
        assert_eq!(first.x.n_columns(), 3);

        // Treated samples have systematically larger x0.
        let x0 = first.x.column("x0").unwrap();
        let mean = |pred: &dyn Fn(usize) -> bool| {
            let values: Vec<f64> = (0..200).filter(|&i| pred(i)).map(|i| x0[i]).collect();
            values.iter().sum::<f64>() / values.len() as f64
        };
        let treated_mean = mean(&|i| first.a[i] == 1.0);
        let control_mean = mean(&|i| first.a[i] == 0.0);
        assert!(treated_mean > control_mean);
    }

    #[test]
    fn k_folds_partition_every_row_once() {
        let cv = k_folds(10, 3);
        assert_eq!(cv.len(), 3);
        let mut all_valid: Vec<usize> = cv.iter().flat_map(|f| f.valid.clone()).collect();
        all_valid.sort_unstable();
        assert_eq!(all_valid, (0..10).collect::<Vec<_>>());
        for fold in &cv {
            assert_eq!(fold.train.len() + fold.valid.len(), 10);
        }
    }

    #[test]
    fn oracle_propensity_scores_a_full_run() {
        let population = synthetic_population(300, 4, 11);
        let cv = k_folds(300, 3);
        let predictions = phase_predictions(&population, &cv, |pop, indices| {
            oracle_propensity_prediction(&take(&pop.propensity, indices), &take(&pop.a, indices))
        });

        let combined = score_cv(
            &predictions,
            &population.x,
            &population.a,
            &population.y,
            &cv,
            None,
        )
        .unwrap();
        let EvaluatedMetrics::WeightBalance {
            prediction_scores,
            covariate_balance,
        } = combined
        else {
            panic!("expected paired frames");
        };
        assert_eq!(prediction_scores.n_rows(), 6);
        assert_eq!(covariate_balance.n_tables(), 6);
        // The continuous score for assignment classification is the
        // for-treated weight 1/p, which ranks likely-treated samples lowest,
        // so the AUC sits below chance by the same margin the propensity
        // itself sits above it.
        for auc in prediction_scores.scalar_column("roc_auc").unwrap() {
            assert!(auc.is_finite() && auc < 0.5, "auc = {auc}");
        }
    }

    #[test]
    fn for_treated_weight_inverts_the_propensity_ranking() {
        let population = synthetic_population(300, 2, 11);
        let weights: Vec<f64> = population.propensity.iter().map(|p| 1.0 / p).collect();
        let auc_p =
            crate::metrics::binary::roc_auc(&population.a, &population.propensity, None).unwrap();
        let auc_w = crate::metrics::binary::roc_auc(&population.a, &weights, None).unwrap();
        assert!(auc_p > 0.5, "auc_p = {auc_p}");
        // 1/p is strictly decreasing in p, so the AUCs mirror around 0.5.
        assert!((auc_p + auc_w - 1.0).abs() < 1e-12);
    }

    #[test]
    fn oracle_outcome_tracks_the_response_surface() {
        let population = synthetic_population(120, 2, 3);
        let cv = k_folds(120, 2);
        let predictions = phase_predictions(&population, &cv, |pop, indices| {
            let x0 = pop.x.column("x0").unwrap();
            oracle_outcome_prediction(&take(x0, indices))
        });

        let combined = score_cv(
            &predictions,
            &population.x,
            &population.a,
            &population.y,
            &cv,
            None,
        )
        .unwrap();
        let EvaluatedMetrics::Prediction(frame) = combined else {
            panic!("expected a single score frame");
        };
        // Only the 0.1-scale noise separates prediction from truth.
        for mae in frame.scalar_column("mae").unwrap() {
            assert!(mae < 0.11, "mae = {mae}");
        }
    }
}
