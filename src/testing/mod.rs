//! Deterministic fixtures for exercising evaluations end to end: a seeded
//! synthetic population with known propensities, oracle fold predictions
//! derived from it, and simple cross-validation splitters.

mod fixtures;

pub use fixtures::{
    SyntheticPopulation, k_folds, oracle_outcome_prediction, oracle_propensity_prediction,
    oracle_weight_prediction, phase_predictions, synthetic_population,
};
