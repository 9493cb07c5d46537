use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::Phase;
use crate::evaluation::balance::{BalanceEntry, CovariateBalance};
use crate::evaluation::error::EvalError;
use crate::evaluation::predictions::FoldScore;
use crate::evaluation::scorer::ScoreRow;

/// One stacked row of aggregated prediction scores: the fold's score row
/// labeled by its origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreFrameRow {
    pub phase: Phase,
    pub fold: usize,
    pub scores: ScoreRow,
}

/// Prediction scores stacked across folds and phases, keyed (phase, fold).
///
/// Rows appear phase-major (train before valid), fold position within each
/// phase ascending; the fold label is the 0-based position in the input
/// sequence, which is an observable contract for plot alignment.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ScoreFrame {
    rows: Vec<ScoreFrameRow>,
}

impl ScoreFrame {
    pub fn rows(&self) -> &[ScoreFrameRow] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, phase: Phase, fold: usize) -> Option<&ScoreRow> {
        self.rows
            .iter()
            .find(|r| r.phase == phase && r.fold == fold)
            .map(|r| &r.scores)
    }

    pub fn phases(&self) -> Vec<Phase> {
        let mut phases: Vec<Phase> = self.rows.iter().map(|r| r.phase).collect();
        phases.dedup();
        phases
    }

    /// Scalar values of one metric across all (phase, fold) rows, in row
    /// order. `None` if any row lacks the metric or holds a vector value.
    pub fn scalar_column(&self, metric: &str) -> Option<Vec<f64>> {
        self.rows.iter().map(|r| r.scores.scalar(metric)).collect()
    }
}

/// One stacked covariate-balance table labeled by its origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceFrameRow {
    pub phase: Phase,
    pub fold: usize,
    pub balance: CovariateBalance,
}

/// Covariate-balance tables stacked across folds and phases, keyed
/// (phase, fold, treatment level, covariate).
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BalanceFrame {
    rows: Vec<BalanceFrameRow>,
}

impl BalanceFrame {
    pub fn rows(&self) -> &[BalanceFrameRow] {
        &self.rows
    }

    /// Number of stacked tables (one per phase x fold).
    pub fn n_tables(&self) -> usize {
        self.rows.len()
    }

    pub fn table(&self, phase: Phase, fold: usize) -> Option<&CovariateBalance> {
        self.rows
            .iter()
            .find(|r| r.phase == phase && r.fold == fold)
            .map(|r| &r.balance)
    }

    /// Tables of one phase in fold order, for per-fold plotting.
    pub fn tables_for_phase(&self, phase: Phase) -> Vec<&CovariateBalance> {
        self.rows
            .iter()
            .filter(|r| r.phase == phase)
            .map(|r| &r.balance)
            .collect()
    }

    /// Flattened view: every (phase, fold, treatment level, covariate) entry.
    pub fn entries(&self) -> impl Iterator<Item = (Phase, usize, f64, &BalanceEntry)> {
        self.rows.iter().flat_map(|row| {
            row.balance.groups.iter().flat_map(move |group| {
                group
                    .entries
                    .iter()
                    .map(move |entry| (row.phase, row.fold, group.treatment_value, entry))
            })
        })
    }

    pub fn n_entries(&self) -> usize {
        self.entries().count()
    }
}

/// Aggregated output of a cross-validated evaluation.
///
/// Outcome models yield a single score frame; weight and propensity models
/// yield a frame pair, prediction scores and covariate balance stacked
/// independently.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum EvaluatedMetrics {
    Prediction(ScoreFrame),
    WeightBalance {
        prediction_scores: ScoreFrame,
        covariate_balance: BalanceFrame,
    },
}

impl EvaluatedMetrics {
    /// The prediction-score frame, common to both shapes.
    pub fn prediction_scores(&self) -> &ScoreFrame {
        match self {
            EvaluatedMetrics::Prediction(frame) => frame,
            EvaluatedMetrics::WeightBalance {
                prediction_scores, ..
            } => prediction_scores,
        }
    }

    pub fn covariate_balance(&self) -> Option<&BalanceFrame> {
        match self {
            EvaluatedMetrics::Prediction(_) => None,
            EvaluatedMetrics::WeightBalance {
                covariate_balance, ..
            } => Some(covariate_balance),
        }
    }
}

/// Checks that every fold of a phase produced the same metric columns.
fn check_consistent_columns(phase: Phase, rows: &[&ScoreRow]) -> Result<(), EvalError> {
    let Some(first) = rows.first() else {
        return Ok(());
    };
    let expected = first.metric_names();
    for (fold, row) in rows.iter().enumerate().skip(1) {
        let got = row.metric_names();
        if got != expected {
            return Err(EvalError::InconsistentScores {
                phase,
                detail: format!("fold 0 has columns {expected:?}, fold {fold} has {got:?}"),
            });
        }
    }
    Ok(())
}

fn stack_score_rows(
    scores: BTreeMap<Phase, Vec<ScoreRow>>,
) -> Result<ScoreFrame, EvalError> {
    let mut frame = ScoreFrame::default();
    for (phase, fold_rows) in scores {
        let refs: Vec<&ScoreRow> = fold_rows.iter().collect();
        check_consistent_columns(phase, &refs)?;
        for (fold, scores) in fold_rows.into_iter().enumerate() {
            frame.rows.push(ScoreFrameRow {
                phase,
                fold,
                scores,
            });
        }
    }
    Ok(frame)
}

fn stack_balance_tables(balances: BTreeMap<Phase, Vec<CovariateBalance>>) -> BalanceFrame {
    let mut frame = BalanceFrame::default();
    for (phase, fold_tables) in balances {
        for (fold, balance) in fold_tables.into_iter().enumerate() {
            frame.rows.push(BalanceFrameRow {
                phase,
                fold,
                balance,
            });
        }
    }
    frame
}

/// Combines per-fold, per-phase fold scores into the aggregated structure.
///
/// Within each phase, fold tables stack along a new fold axis labeled by
/// position; phases then stack in `Phase` order. All folds must have produced
/// the same kind of score (mixing outcome scores with weight/balance pairs is
/// a caller error), and within a phase every fold must carry identical metric
/// columns.
pub fn combine_fold_scores(
    scores: BTreeMap<Phase, Vec<FoldScore>>,
) -> Result<EvaluatedMetrics, EvalError> {
    let first_kind = scores
        .values()
        .flat_map(|fold_scores| fold_scores.iter())
        .map(FoldScore::kind)
        .next()
        .ok_or(EvalError::EmptyScores)?;
    for fold_score in scores.values().flatten() {
        if fold_score.kind() != first_kind {
            return Err(EvalError::MixedPredictionKinds {
                expected: first_kind,
                got: fold_score.kind(),
            });
        }
    }

    match first_kind {
        "prediction" => {
            let rows = scores
                .into_iter()
                .map(|(phase, fold_scores)| {
                    let rows = fold_scores
                        .into_iter()
                        .map(|s| match s {
                            FoldScore::Prediction(row) => row,
                            FoldScore::WeightBalance(_) => unreachable!("kinds checked above"),
                        })
                        .collect();
                    (phase, rows)
                })
                .collect();
            Ok(EvaluatedMetrics::Prediction(stack_score_rows(rows)?))
        }
        _ => {
            let mut score_rows: BTreeMap<Phase, Vec<ScoreRow>> = BTreeMap::new();
            let mut balance_tables: BTreeMap<Phase, Vec<CovariateBalance>> = BTreeMap::new();
            for (phase, fold_scores) in scores {
                for fold_score in fold_scores {
                    match fold_score {
                        FoldScore::WeightBalance(pair) => {
                            score_rows
                                .entry(phase)
                                .or_default()
                                .push(pair.prediction_scores);
                            balance_tables
                                .entry(phase)
                                .or_default()
                                .push(pair.covariate_balance);
                        }
                        FoldScore::Prediction(_) => unreachable!("kinds checked above"),
                    }
                }
            }
            Ok(EvaluatedMetrics::WeightBalance {
                prediction_scores: stack_score_rows(score_rows)?,
                covariate_balance: stack_balance_tables(balance_tables),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::predictions::WeightFoldScore;
    use crate::evaluation::scorer::MetricOutcome;
    use crate::metrics::ScoreValue;

    fn score_row(pairs: &[(&str, f64)]) -> ScoreRow {
        let mut row = ScoreRow::default();
        for (name, value) in pairs {
            row.push(*name, MetricOutcome::Value(ScoreValue::Scalar(*value)));
        }
        row
    }

    fn balance(covariates: usize) -> CovariateBalance {
        CovariateBalance {
            metric: "abs_smd".into(),
            groups: vec![crate::evaluation::balance::BalanceGroup {
                treatment_value: 1.0,
                entries: (0..covariates)
                    .map(|i| BalanceEntry {
                        covariate: format!("x{i}"),
                        weighted: 0.1,
                        unweighted: 0.3,
                    })
                    .collect(),
            }],
        }
    }

    #[test]
    fn stacking_labels_rows_by_phase_and_fold_position() {
        let t0 = score_row(&[("accuracy", 0.9)]);
        let t1 = score_row(&[("accuracy", 0.8)]);
        let v0 = score_row(&[("accuracy", 0.7)]);
        let v1 = score_row(&[("accuracy", 0.6)]);

        let combined = combine_fold_scores(BTreeMap::from([
            (
                Phase::Train,
                vec![FoldScore::Prediction(t0), FoldScore::Prediction(t1.clone())],
            ),
            (
                Phase::Valid,
                vec![FoldScore::Prediction(v0), FoldScore::Prediction(v1)],
            ),
        ]))
        .unwrap();

        let EvaluatedMetrics::Prediction(frame) = combined else {
            panic!("expected a single score frame");
        };
        assert_eq!(frame.n_rows(), 4);
        // Row from t1 is labeled (train, 1).
        assert_eq!(frame.row(Phase::Train, 1), Some(&t1));
        assert_eq!(
            frame.scalar_column("accuracy"),
            Some(vec![0.9, 0.8, 0.7, 0.6])
        );
        // Train rows come before valid rows.
        assert_eq!(frame.phases(), vec![Phase::Train, Phase::Valid]);
    }

    #[test]
    fn single_fold_single_phase_round_trips() {
        let t0 = score_row(&[("accuracy", 0.9), ("f1", 0.8)]);
        let combined = combine_fold_scores(BTreeMap::from([(
            Phase::Train,
            vec![FoldScore::Prediction(t0.clone())],
        )]))
        .unwrap();

        let EvaluatedMetrics::Prediction(frame) = combined else {
            panic!("expected a single score frame");
        };
        assert_eq!(frame.n_rows(), 1);
        let row = &frame.rows()[0];
        assert_eq!((row.phase, row.fold), (Phase::Train, 0));
        assert_eq!(row.scores, t0);
    }

    #[test]
    fn inconsistent_columns_within_a_phase_are_fatal() {
        let t0 = score_row(&[("accuracy", 0.9)]);
        let t1 = score_row(&[("f1", 0.8)]);
        let err = combine_fold_scores(BTreeMap::from([(
            Phase::Train,
            vec![FoldScore::Prediction(t0), FoldScore::Prediction(t1)],
        )]))
        .unwrap_err();
        assert!(matches!(err, EvalError::InconsistentScores { .. }));
    }

    #[test]
    fn mixed_fold_score_kinds_are_fatal() {
        let prediction = FoldScore::Prediction(score_row(&[("accuracy", 1.0)]));
        let pair = FoldScore::WeightBalance(WeightFoldScore {
            prediction_scores: score_row(&[("accuracy", 1.0)]),
            covariate_balance: balance(2),
        });
        let err = combine_fold_scores(BTreeMap::from([(
            Phase::Train,
            vec![prediction, pair],
        )]))
        .unwrap_err();
        assert!(matches!(err, EvalError::MixedPredictionKinds { .. }));
    }

    #[test]
    fn empty_input_is_fatal() {
        let err = combine_fold_scores(BTreeMap::new()).unwrap_err();
        assert!(matches!(err, EvalError::EmptyScores));
    }

    #[test]
    fn score_frame_serializes_with_row_labels() {
        let combined = combine_fold_scores(BTreeMap::from([(
            Phase::Train,
            vec![FoldScore::Prediction(score_row(&[("accuracy", 0.9)]))],
        )]))
        .unwrap();
        let EvaluatedMetrics::Prediction(frame) = combined else {
            panic!("expected a single score frame");
        };

        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["rows"][0]["phase"], "train");
        assert_eq!(json["rows"][0]["fold"], 0);
        assert_eq!(json["rows"][0]["scores"]["entries"][0][0], "accuracy");
    }

    #[test]
    fn weight_scores_stack_into_paired_frames() {
        let make_pair = |acc: f64| {
            FoldScore::WeightBalance(WeightFoldScore {
                prediction_scores: score_row(&[("accuracy", acc)]),
                covariate_balance: balance(5),
            })
        };
        let combined = combine_fold_scores(BTreeMap::from([
            (Phase::Train, vec![make_pair(0.9), make_pair(0.8)]),
            (Phase::Valid, vec![make_pair(0.7), make_pair(0.6)]),
        ]))
        .unwrap();

        let EvaluatedMetrics::WeightBalance {
            prediction_scores,
            covariate_balance,
        } = combined
        else {
            panic!("expected paired frames");
        };
        assert_eq!(prediction_scores.n_rows(), 4);
        assert_eq!(covariate_balance.n_tables(), 4);
        assert_eq!(covariate_balance.n_entries(), 20);
        assert!(covariate_balance.table(Phase::Valid, 1).is_some());
        assert_eq!(covariate_balance.tables_for_phase(Phase::Train).len(), 2);
    }
}
