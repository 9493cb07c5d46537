//! Weighted two-sample distribution distances used for covariate balance.
//!
//! Every function follows the `(x, y, wx, wy) -> f64` contract: compare the
//! sample `x` weighted by `wx` against the sample `y` weighted by `wy`.
//! Degenerate inputs (empty groups, zero total weight, zero pooled variance)
//! yield NaN rather than an error; the balance table carries NaN through.

fn weighted_mean(values: &[f64], weights: &[f64]) -> f64 {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return f64::NAN;
    }
    values
        .iter()
        .zip(weights)
        .map(|(v, w)| v * w)
        .sum::<f64>()
        / total
}

fn weighted_variance(values: &[f64], weights: &[f64]) -> f64 {
    let mean = weighted_mean(values, weights);
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return f64::NAN;
    }
    values
        .iter()
        .zip(weights)
        .map(|(v, w)| w * (v - mean) * (v - mean))
        .sum::<f64>()
        / total
}

/// Weighted standardized mean difference between two samples.
///
/// Difference of weighted means over the pooled weighted standard deviation
/// `sqrt((var(x) + var(y)) / 2)`. Symmetric up to sign under swapping the
/// samples.
pub fn weighted_standardized_mean_difference(
    x: &[f64],
    y: &[f64],
    wx: &[f64],
    wy: &[f64],
) -> f64 {
    let numerator = weighted_mean(x, wx) - weighted_mean(y, wy);
    let pooled = ((weighted_variance(x, wx) + weighted_variance(y, wy)) / 2.0).sqrt();
    if pooled > 0.0 {
        numerator / pooled
    } else {
        f64::NAN
    }
}

/// Weighted two-sample Kolmogorov-Smirnov statistic: the largest gap between
/// the weighted empirical CDFs, evaluated over the combined support.
pub fn weighted_ks2samp(x: &[f64], y: &[f64], wx: &[f64], wy: &[f64]) -> f64 {
    let total_x: f64 = wx.iter().sum();
    let total_y: f64 = wy.iter().sum();
    if x.is_empty() || y.is_empty() || total_x <= 0.0 || total_y <= 0.0 {
        return f64::NAN;
    }

    let sorted = |values: &[f64], weights: &[f64]| {
        let mut order: Vec<usize> = (0..values.len()).collect();
        order.sort_by(|&i, &j| values[i].total_cmp(&values[j]));
        order
            .into_iter()
            .map(|i| (values[i], weights[i]))
            .collect::<Vec<_>>()
    };
    let xs = sorted(x, wx);
    let ys = sorted(y, wy);

    let mut xi = 0;
    let mut yi = 0;
    let mut cum_x = 0.0;
    let mut cum_y = 0.0;
    let mut d = 0.0;
    while xi < xs.len() || yi < ys.len() {
        let t = match (xs.get(xi), ys.get(yi)) {
            (Some(&(vx, _)), Some(&(vy, _))) => vx.min(vy),
            (Some(&(vx, _)), None) => vx,
            (None, Some(&(vy, _))) => vy,
            (None, None) => break,
        };
        while xi < xs.len() && xs[xi].0 <= t {
            cum_x += xs[xi].1;
            xi += 1;
        }
        while yi < ys.len() && ys[yi].0 <= t {
            cum_y += ys[yi].1;
            yi += 1;
        }
        let gap = (cum_x / total_x - cum_y / total_y).abs();
        if gap > d {
            d = gap;
        }
    }
    d
}
