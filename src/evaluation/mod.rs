mod aggregate;
mod balance;
mod cross_validation;
mod error;
mod predictions;
pub mod results;
mod scorer;

pub use aggregate::{
    BalanceFrame, BalanceFrameRow, EvaluatedMetrics, ScoreFrame, ScoreFrameRow,
    combine_fold_scores,
};
pub use balance::{
    BalanceEntry, BalanceGroup, CovariateBalance, calculate_covariate_balance,
    calculate_covariate_balance_by_name,
};
pub use cross_validation::score_cv;
pub use error::EvalError;
pub use predictions::{
    FoldPrediction, FoldScore, OutcomeFoldPrediction, PropensityFoldPrediction, TreatmentMatrix,
    WeightFoldPrediction, WeightFoldScore, score_fold,
};
pub use scorer::{MetricOutcome, ScoreRow, score_binary_prediction, score_regression_prediction};
