use crate::metrics::{Curve, MetricError, check_lengths, weight_at, weighted_mean};

/// Positive class for binary metrics, matching the scikit-learn default.
/// Treatment assignment and binary outcomes are 0/1-coded in this crate.
const POS_LABEL: f64 = 1.0;

/// Weighted fraction of exact label matches.
pub fn accuracy(
    y_true: &[f64],
    y_pred: &[f64],
    sample_weight: Option<&[f64]>,
) -> Result<f64, MetricError> {
    check_lengths(y_true, y_pred, sample_weight)?;
    if y_true.is_empty() {
        return Err(MetricError::Degenerate("no samples".into()));
    }
    Ok(weighted_mean((0..y_true.len()).map(|i| {
        let hit = if y_true[i] == y_pred[i] { 1.0 } else { 0.0 };
        (hit, weight_at(sample_weight, i))
    })))
}

/// `1 - accuracy`, the normalized zero-one loss.
pub fn zero_one_loss(
    y_true: &[f64],
    y_pred: &[f64],
    sample_weight: Option<&[f64]>,
) -> Result<f64, MetricError> {
    accuracy(y_true, y_pred, sample_weight).map(|acc| 1.0 - acc)
}

/// Weighted binary confusion counts for the positive label.
fn binary_counts(
    y_true: &[f64],
    y_pred: &[f64],
    sample_weight: Option<&[f64]>,
) -> (f64, f64, f64, f64) {
    let (mut tp, mut fp, mut tn, mut fn_) = (0.0, 0.0, 0.0, 0.0);
    for i in 0..y_true.len() {
        let w = weight_at(sample_weight, i);
        match (y_true[i] == POS_LABEL, y_pred[i] == POS_LABEL) {
            (true, true) => tp += w,
            (false, true) => fp += w,
            (false, false) => tn += w,
            (true, false) => fn_ += w,
        }
    }
    (tp, fp, tn, fn_)
}

/// Weighted precision for the positive label. An empty predicted-positive
/// group scores 0, as scikit-learn's `zero_division` default does.
pub fn precision(
    y_true: &[f64],
    y_pred: &[f64],
    sample_weight: Option<&[f64]>,
) -> Result<f64, MetricError> {
    check_lengths(y_true, y_pred, sample_weight)?;
    let (tp, fp, _, _) = binary_counts(y_true, y_pred, sample_weight);
    if tp + fp <= 0.0 {
        return Ok(0.0);
    }
    Ok(tp / (tp + fp))
}

/// Weighted recall for the positive label; 0 when no true positives exist.
pub fn recall(
    y_true: &[f64],
    y_pred: &[f64],
    sample_weight: Option<&[f64]>,
) -> Result<f64, MetricError> {
    check_lengths(y_true, y_pred, sample_weight)?;
    let (tp, _, _, fn_) = binary_counts(y_true, y_pred, sample_weight);
    if tp + fn_ <= 0.0 {
        return Ok(0.0);
    }
    Ok(tp / (tp + fn_))
}

/// Harmonic mean of precision and recall; 0 when both are 0.
pub fn f1(
    y_true: &[f64],
    y_pred: &[f64],
    sample_weight: Option<&[f64]>,
) -> Result<f64, MetricError> {
    let p = precision(y_true, y_pred, sample_weight)?;
    let r = recall(y_true, y_pred, sample_weight)?;
    if p + r <= 0.0 {
        return Ok(0.0);
    }
    Ok(2.0 * p * r / (p + r))
}

/// Weighted Matthews correlation coefficient; 0 when any marginal is empty
/// (the scikit-learn convention for the undefined denominator).
pub fn matthews(
    y_true: &[f64],
    y_pred: &[f64],
    sample_weight: Option<&[f64]>,
) -> Result<f64, MetricError> {
    check_lengths(y_true, y_pred, sample_weight)?;
    let (tp, fp, tn, fn_) = binary_counts(y_true, y_pred, sample_weight);
    let denom = ((tp + fp) * (tp + fn_) * (tn + fp) * (tn + fn_)).sqrt();
    if denom <= 0.0 {
        return Ok(0.0);
    }
    Ok((tp * tn - fp * fn_) / denom)
}

/// Weighted hinge loss over the signed margin, labels mapped to -1/+1 around
/// the positive label.
pub fn hinge(
    y_true: &[f64],
    decision: &[f64],
    sample_weight: Option<&[f64]>,
) -> Result<f64, MetricError> {
    check_lengths(y_true, decision, sample_weight)?;
    if y_true.is_empty() {
        return Err(MetricError::Degenerate("no samples".into()));
    }
    Ok(weighted_mean((0..y_true.len()).map(|i| {
        let sign = if y_true[i] == POS_LABEL { 1.0 } else { -1.0 };
        let loss = (1.0 - sign * decision[i]).max(0.0);
        (loss, weight_at(sample_weight, i))
    })))
}

/// Weighted Brier score: mean squared distance between the predicted
/// probability and the positive-label indicator.
pub fn brier(
    y_true: &[f64],
    y_proba: &[f64],
    sample_weight: Option<&[f64]>,
) -> Result<f64, MetricError> {
    check_lengths(y_true, y_proba, sample_weight)?;
    if y_true.is_empty() {
        return Err(MetricError::Degenerate("no samples".into()));
    }
    if y_proba.iter().any(|&p| !(0.0..=1.0).contains(&p)) {
        return Err(MetricError::Degenerate(
            "probabilities outside the [0, 1] interval".into(),
        ));
    }
    Ok(weighted_mean((0..y_true.len()).map(|i| {
        let target = if y_true[i] == POS_LABEL { 1.0 } else { 0.0 };
        let err = y_proba[i] - target;
        (err * err, weight_at(sample_weight, i))
    })))
}

/// Total positive and negative weight for the fixed positive label.
fn class_weights(y_true: &[f64], sample_weight: Option<&[f64]>) -> (f64, f64) {
    let mut pos = 0.0;
    let mut neg = 0.0;
    for i in 0..y_true.len() {
        let w = weight_at(sample_weight, i);
        if y_true[i] == POS_LABEL {
            pos += w;
        } else {
            neg += w;
        }
    }
    (pos, neg)
}

/// Indices sorted by score, ascending.
fn argsort_by_score(scores: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&i, &j| scores[i].total_cmp(&scores[j]));
    order
}

/// Weighted area under the ROC curve via the rank formulation.
///
/// Errors when only one class carries weight, which is where scikit-learn
/// raises its `ValueError` for constant true labels.
pub fn roc_auc(
    y_true: &[f64],
    y_score: &[f64],
    sample_weight: Option<&[f64]>,
) -> Result<f64, MetricError> {
    check_lengths(y_true, y_score, sample_weight)?;
    let (pos_w, neg_w) = class_weights(y_true, sample_weight);
    if pos_w <= 0.0 || neg_w <= 0.0 {
        return Err(MetricError::Degenerate(
            "only one class present in y_true; ROC AUC is not defined".into(),
        ));
    }

    let order = argsort_by_score(y_score);
    let mut auc_sum = 0.0;
    let mut cum_neg = 0.0;
    let mut i = 0;
    while i < order.len() {
        // Walk one tie group of equal scores.
        let mut group_pos = 0.0;
        let mut group_neg = 0.0;
        let score = y_score[order[i]];
        while i < order.len() && y_score[order[i]] == score {
            let idx = order[i];
            let w = weight_at(sample_weight, idx);
            if y_true[idx] == POS_LABEL {
                group_pos += w;
            } else {
                group_neg += w;
            }
            i += 1;
        }
        auc_sum += group_pos * (cum_neg + 0.5 * group_neg);
        cum_neg += group_neg;
    }
    Ok(auc_sum / (pos_w * neg_w))
}

/// ROC curve: (fpr, tpr) per distinct threshold, descending thresholds, with
/// the conventional (0, 0) starting point.
pub fn roc_curve(
    y_true: &[f64],
    y_score: &[f64],
    sample_weight: Option<&[f64]>,
) -> Result<Curve, MetricError> {
    check_lengths(y_true, y_score, sample_weight)?;
    if y_true.is_empty() {
        return Err(MetricError::Degenerate("no samples".into()));
    }
    let (pos_w, neg_w) = class_weights(y_true, sample_weight);

    let mut order = argsort_by_score(y_score);
    order.reverse();

    let mut xs = vec![0.0];
    let mut ys = vec![0.0];
    let mut thresholds = vec![y_score[order[0]] + 1.0];
    let mut tp = 0.0;
    let mut fp = 0.0;
    let mut i = 0;
    while i < order.len() {
        let score = y_score[order[i]];
        while i < order.len() && y_score[order[i]] == score {
            let idx = order[i];
            let w = weight_at(sample_weight, idx);
            if y_true[idx] == POS_LABEL {
                tp += w;
            } else {
                fp += w;
            }
            i += 1;
        }
        xs.push(fp / neg_w);
        ys.push(tp / pos_w);
        thresholds.push(score);
    }
    Ok(Curve { xs, ys, thresholds })
}

/// Precision-recall curve: (precision, recall) per ascending threshold, with
/// the terminal (1, 0) point appended and no matching threshold for it.
pub fn pr_curve(
    y_true: &[f64],
    y_score: &[f64],
    sample_weight: Option<&[f64]>,
) -> Result<Curve, MetricError> {
    check_lengths(y_true, y_score, sample_weight)?;
    if y_true.is_empty() {
        return Err(MetricError::Degenerate("no samples".into()));
    }
    let (pos_w, _) = class_weights(y_true, sample_weight);

    // Predicted positive means score >= threshold, so walk descending and
    // reverse at the end to present ascending thresholds.
    let mut order = argsort_by_score(y_score);
    order.reverse();

    let mut precisions = Vec::new();
    let mut recalls = Vec::new();
    let mut thresholds = Vec::new();
    let mut tp = 0.0;
    let mut pred_pos = 0.0;
    let mut i = 0;
    while i < order.len() {
        let score = y_score[order[i]];
        while i < order.len() && y_score[order[i]] == score {
            let idx = order[i];
            let w = weight_at(sample_weight, idx);
            if y_true[idx] == POS_LABEL {
                tp += w;
            }
            pred_pos += w;
            i += 1;
        }
        precisions.push(if pred_pos > 0.0 { tp / pred_pos } else { 1.0 });
        recalls.push(if pos_w > 0.0 { tp / pos_w } else { f64::NAN });
        thresholds.push(score);
    }
    precisions.reverse();
    recalls.reverse();
    thresholds.reverse();
    precisions.push(1.0);
    recalls.push(0.0);
    Ok(Curve {
        xs: precisions,
        ys: recalls,
        thresholds,
    })
}

/// Weighted average precision: step-wise area under the precision-recall
/// curve. Zero positive weight scores 0.
pub fn avg_precision(
    y_true: &[f64],
    y_score: &[f64],
    sample_weight: Option<&[f64]>,
) -> Result<f64, MetricError> {
    check_lengths(y_true, y_score, sample_weight)?;
    let (pos_w, _) = class_weights(y_true, sample_weight);
    if pos_w <= 0.0 {
        return Ok(0.0);
    }
    let curve = pr_curve(y_true, y_score, sample_weight)?;
    // Walk recall from high to low; xs are precisions, ys are recalls.
    let mut ap = 0.0;
    for i in (1..curve.ys.len()).rev() {
        ap += (curve.ys[i - 1] - curve.ys[i]) * curve.xs[i - 1];
    }
    Ok(ap)
}

/// Weighted confusion matrix over the sorted distinct labels of both inputs.
pub fn confusion_matrix(
    y_true: &[f64],
    y_pred: &[f64],
    sample_weight: Option<&[f64]>,
) -> Result<Vec<Vec<f64>>, MetricError> {
    check_lengths(y_true, y_pred, sample_weight)?;
    if y_true.is_empty() {
        return Err(MetricError::Degenerate("no samples".into()));
    }
    let mut labels: Vec<f64> = y_true.iter().chain(y_pred.iter()).copied().collect();
    labels.sort_by(f64::total_cmp);
    labels.dedup();

    let k = labels.len();
    let mut matrix = vec![vec![0.0; k]; k];
    for i in 0..y_true.len() {
        // Labels are the sorted union of both inputs, so lookup cannot miss.
        let row = labels.partition_point(|&l| l.total_cmp(&y_true[i]).is_lt());
        let col = labels.partition_point(|&l| l.total_cmp(&y_pred[i]).is_lt());
        matrix[row][col] += weight_at(sample_weight, i);
    }
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    #[test]
    fn accuracy_counts_weighted_matches() {
        let t = [0.0, 1.0, 1.0, 0.0];
        let p = [0.0, 1.0, 0.0, 1.0];
        assert!((accuracy(&t, &p, None).unwrap() - 0.5).abs() < TOL);
        let w = [1.0, 3.0, 1.0, 1.0];
        assert!((accuracy(&t, &p, Some(&w)).unwrap() - 4.0 / 6.0).abs() < TOL);
        assert!((zero_one_loss(&t, &p, None).unwrap() - 0.5).abs() < TOL);
    }

    #[test]
    fn precision_recall_f1_on_mixed_predictions() {
        let t = [1.0, 1.0, 0.0, 0.0];
        let p = [1.0, 0.0, 1.0, 0.0];
        assert!((precision(&t, &p, None).unwrap() - 0.5).abs() < TOL);
        assert!((recall(&t, &p, None).unwrap() - 0.5).abs() < TOL);
        assert!((f1(&t, &p, None).unwrap() - 0.5).abs() < TOL);
    }

    #[test]
    fn empty_positive_groups_score_zero_not_error() {
        let t = [0.0, 0.0, 0.0];
        let p = [0.0, 1.0, 0.0];
        assert_eq!(precision(&t, &p, None).unwrap(), 0.0);
        assert_eq!(recall(&t, &p, None).unwrap(), 0.0);
        assert_eq!(f1(&t, &p, None).unwrap(), 0.0);
        assert_eq!(matthews(&t, &p, None).unwrap(), 0.0);
    }

    #[test]
    fn perfect_separation_gives_auc_one() {
        let t = [0.0, 0.0, 1.0, 1.0];
        let s = [0.1, 0.2, 0.8, 0.9];
        assert!((roc_auc(&t, &s, None).unwrap() - 1.0).abs() < TOL);
    }

    #[test]
    fn reversed_scores_give_auc_zero_and_ties_half() {
        let t = [0.0, 1.0];
        assert!((roc_auc(&t, &[0.9, 0.1], None).unwrap()).abs() < TOL);
        assert!((roc_auc(&t, &[0.5, 0.5], None).unwrap() - 0.5).abs() < TOL);
    }

    #[test]
    fn auc_single_class_is_degenerate() {
        let err = roc_auc(&[0.0, 0.0], &[0.1, 0.9], None).unwrap_err();
        assert!(matches!(err, MetricError::Degenerate(_)));
    }

    #[test]
    fn auc_respects_weights() {
        // Duplicating a sample equals doubling its weight.
        let t = [0.0, 1.0, 1.0];
        let s = [0.6, 0.4, 0.4];
        let dup = roc_auc(&t, &s, None).unwrap();
        let weighted = roc_auc(&[0.0, 1.0], &[0.6, 0.4], Some(&[1.0, 2.0])).unwrap();
        assert!((dup - weighted).abs() < TOL);
    }

    #[test]
    fn roc_curve_starts_at_origin_and_ends_at_one_one() {
        let t = [0.0, 0.0, 1.0, 1.0];
        let s = [0.1, 0.4, 0.35, 0.8];
        let c = roc_curve(&t, &s, None).unwrap();
        assert_eq!((c.xs[0], c.ys[0]), (0.0, 0.0));
        assert_eq!(
            (*c.xs.last().unwrap(), *c.ys.last().unwrap()),
            (1.0, 1.0)
        );
        assert_eq!(c.xs.len(), c.thresholds.len());
        assert!(c.thresholds[0] > c.thresholds[1]);
    }

    #[test]
    fn pr_curve_terminates_at_precision_one_recall_zero() {
        let t = [0.0, 1.0, 1.0];
        let s = [0.2, 0.7, 0.9];
        let c = pr_curve(&t, &s, None).unwrap();
        assert_eq!(*c.xs.last().unwrap(), 1.0);
        assert_eq!(*c.ys.last().unwrap(), 0.0);
        assert_eq!(c.thresholds.len(), c.xs.len() - 1);
    }

    #[test]
    fn avg_precision_is_one_for_perfect_ranking() {
        let t = [0.0, 0.0, 1.0, 1.0];
        let s = [0.1, 0.2, 0.8, 0.9];
        assert!((avg_precision(&t, &s, None).unwrap() - 1.0).abs() < TOL);
    }

    #[test]
    fn brier_zero_for_certain_correct_probabilities() {
        let t = [0.0, 1.0];
        assert!((brier(&t, &[0.0, 1.0], None).unwrap()).abs() < TOL);
        assert!((brier(&t, &[0.5, 0.5], None).unwrap() - 0.25).abs() < TOL);
        assert!(brier(&t, &[0.5, 1.5], None).is_err());
    }

    #[test]
    fn hinge_zero_beyond_margin() {
        let t = [1.0, 0.0];
        let d = [2.0, -2.0];
        assert!((hinge(&t, &d, None).unwrap()).abs() < TOL);
        let d = [0.0, 0.0];
        assert!((hinge(&t, &d, None).unwrap() - 1.0).abs() < TOL);
    }

    #[test]
    fn matthews_is_one_for_perfect_and_minus_one_for_inverted() {
        let t = [1.0, 1.0, 0.0, 0.0];
        assert!((matthews(&t, &[1.0, 1.0, 0.0, 0.0], None).unwrap() - 1.0).abs() < TOL);
        assert!((matthews(&t, &[0.0, 0.0, 1.0, 1.0], None).unwrap() + 1.0).abs() < TOL);
    }

    #[test]
    fn confusion_matrix_orders_labels_ascending() {
        let t = [1.0, 0.0, 1.0, 1.0];
        let p = [1.0, 1.0, 0.0, 1.0];
        let m = confusion_matrix(&t, &p, None).unwrap();
        assert_eq!(m, vec![vec![0.0, 1.0], vec![1.0, 2.0]]);
    }

    #[test]
    fn length_mismatch_is_reported() {
        let err = accuracy(&[1.0, 0.0], &[1.0], None).unwrap_err();
        assert!(matches!(err, MetricError::LengthMismatch { .. }));
        let err = accuracy(&[1.0, 0.0], &[1.0, 0.0], Some(&[1.0])).unwrap_err();
        assert!(matches!(err, MetricError::WeightLengthMismatch { .. }));
    }
}
