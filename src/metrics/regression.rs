use crate::metrics::{MetricError, check_lengths, weight_at, weighted_mean};

fn check_nonempty(y_true: &[f64]) -> Result<(), MetricError> {
    if y_true.is_empty() {
        return Err(MetricError::Degenerate("no samples".into()));
    }
    Ok(())
}

/// Weighted mean of the residuals around the weighted mean, i.e. the
/// weighted population variance of `values - other`.
fn weighted_variance(values: impl Iterator<Item = (f64, f64)> + Clone) -> f64 {
    let mean = weighted_mean(values.clone());
    weighted_mean(values.map(|(v, w)| {
        let d = v - mean;
        (d * d, w)
    }))
}

/// Explained variance: `1 - Var(y - y_pred) / Var(y)`, weighted.
pub fn explained_variance(
    y_true: &[f64],
    y_pred: &[f64],
    sample_weight: Option<&[f64]>,
) -> Result<f64, MetricError> {
    check_lengths(y_true, y_pred, sample_weight)?;
    check_nonempty(y_true)?;
    let var_y =
        weighted_variance((0..y_true.len()).map(|i| (y_true[i], weight_at(sample_weight, i))));
    if !(var_y > 0.0) {
        return Err(MetricError::Degenerate(
            "true values have zero variance".into(),
        ));
    }
    let var_err = weighted_variance(
        (0..y_true.len()).map(|i| (y_true[i] - y_pred[i], weight_at(sample_weight, i))),
    );
    Ok(1.0 - var_err / var_y)
}

/// Weighted mean absolute error.
pub fn mean_absolute_error(
    y_true: &[f64],
    y_pred: &[f64],
    sample_weight: Option<&[f64]>,
) -> Result<f64, MetricError> {
    check_lengths(y_true, y_pred, sample_weight)?;
    check_nonempty(y_true)?;
    Ok(weighted_mean((0..y_true.len()).map(|i| {
        ((y_true[i] - y_pred[i]).abs(), weight_at(sample_weight, i))
    })))
}

/// Weighted mean squared error.
pub fn mean_squared_error(
    y_true: &[f64],
    y_pred: &[f64],
    sample_weight: Option<&[f64]>,
) -> Result<f64, MetricError> {
    check_lengths(y_true, y_pred, sample_weight)?;
    check_nonempty(y_true)?;
    Ok(weighted_mean((0..y_true.len()).map(|i| {
        let d = y_true[i] - y_pred[i];
        (d * d, weight_at(sample_weight, i))
    })))
}

/// Weighted mean squared logarithmic error. Negative inputs are a
/// degenerate condition, as in scikit-learn.
pub fn mean_squared_log_error(
    y_true: &[f64],
    y_pred: &[f64],
    sample_weight: Option<&[f64]>,
) -> Result<f64, MetricError> {
    check_lengths(y_true, y_pred, sample_weight)?;
    check_nonempty(y_true)?;
    if y_true.iter().chain(y_pred.iter()).any(|&v| v < 0.0) {
        return Err(MetricError::Degenerate(
            "mean squared logarithmic error cannot be used with negative values".into(),
        ));
    }
    Ok(weighted_mean((0..y_true.len()).map(|i| {
        let d = y_true[i].ln_1p() - y_pred[i].ln_1p();
        (d * d, weight_at(sample_weight, i))
    })))
}

/// Median absolute error. The weight argument is accepted but ignored, which
/// keeps the metric-function signature uniform across the registry.
pub fn median_absolute_error(
    y_true: &[f64],
    y_pred: &[f64],
    _sample_weight: Option<&[f64]>,
) -> Result<f64, MetricError> {
    check_lengths(y_true, y_pred, None)?;
    check_nonempty(y_true)?;
    let mut abs_errors: Vec<f64> = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).abs())
        .collect();
    abs_errors.sort_by(f64::total_cmp);
    let n = abs_errors.len();
    if n % 2 == 1 {
        Ok(abs_errors[n / 2])
    } else {
        Ok((abs_errors[n / 2 - 1] + abs_errors[n / 2]) / 2.0)
    }
}

/// Weighted coefficient of determination.
pub fn r2(
    y_true: &[f64],
    y_pred: &[f64],
    sample_weight: Option<&[f64]>,
) -> Result<f64, MetricError> {
    check_lengths(y_true, y_pred, sample_weight)?;
    check_nonempty(y_true)?;
    let mean =
        weighted_mean((0..y_true.len()).map(|i| (y_true[i], weight_at(sample_weight, i))));
    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for i in 0..y_true.len() {
        let w = weight_at(sample_weight, i);
        let res = y_true[i] - y_pred[i];
        let tot = y_true[i] - mean;
        ss_res += w * res * res;
        ss_tot += w * tot * tot;
    }
    if !(ss_tot > 0.0) {
        return Err(MetricError::Degenerate(
            "true values have zero variance; R^2 is not defined".into(),
        ));
    }
    Ok(1.0 - ss_res / ss_tot)
}
