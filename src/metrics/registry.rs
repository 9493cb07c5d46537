use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::metrics::{MetricError, ScoreValue, classification, distance, regression};

/// Output shape a metric declares when it is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetricKind {
    Scalar,
    Vector,
}

/// Which prediction vector a binary-classification metric consumes.
///
/// Score metrics receive the continuous output (probability or decision
/// function); label metrics receive the discrete class prediction. This
/// routing is fixed per metric, not decided at call time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetricInput {
    Score,
    Label,
}

/// `(y_true, prediction, sample_weight) -> value`; weight may be `None`.
pub type MetricFn =
    Arc<dyn Fn(&[f64], &[f64], Option<&[f64]>) -> Result<ScoreValue, MetricError> + Send + Sync>;

/// One named metric with its declared output kind and input routing.
#[derive(Clone)]
pub struct MetricSpec {
    name: String,
    kind: MetricKind,
    input: MetricInput,
    func: MetricFn,
}

impl MetricSpec {
    pub fn new<N: Into<String>>(name: N, kind: MetricKind, input: MetricInput, func: MetricFn) -> Self {
        Self {
            name: name.into(),
            kind,
            input,
            func,
        }
    }

    /// Convenience constructor for plain scalar metrics.
    pub fn scalar<N: Into<String>>(
        name: N,
        input: MetricInput,
        func: fn(&[f64], &[f64], Option<&[f64]>) -> Result<f64, MetricError>,
    ) -> Self {
        Self::new(
            name,
            MetricKind::Scalar,
            input,
            Arc::new(move |t, p, w| func(t, p, w).map(ScoreValue::Scalar)),
        )
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    #[inline]
    pub fn input(&self) -> MetricInput {
        self.input
    }

    pub fn evaluate(
        &self,
        y_true: &[f64],
        prediction: &[f64],
        sample_weight: Option<&[f64]>,
    ) -> Result<ScoreValue, MetricError> {
        (self.func)(y_true, prediction, sample_weight)
    }
}

impl fmt::Debug for MetricSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricSpec")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("input", &self.input)
            .finish_non_exhaustive()
    }
}

/// Ordered collection of metrics to evaluate on a fold.
///
/// Defaults cover the scikit-learn sets the evaluation was designed around;
/// callers may extend a set or build one from scratch with custom callables.
#[derive(Debug, Clone, Default)]
pub struct MetricSet {
    specs: Vec<MetricSpec>,
}

impl MetricSet {
    pub fn from_specs(specs: Vec<MetricSpec>) -> Self {
        Self { specs }
    }

    /// Scalar-valued binary-classification metrics.
    pub fn numeric_classification() -> Self {
        use MetricInput::{Label, Score};
        Self::from_specs(vec![
            MetricSpec::scalar("accuracy", Label, classification::accuracy),
            MetricSpec::scalar("precision", Label, classification::precision),
            MetricSpec::scalar("recall", Label, classification::recall),
            MetricSpec::scalar("f1", Label, classification::f1),
            MetricSpec::scalar("roc_auc", Score, classification::roc_auc),
            MetricSpec::scalar("avg_precision", Score, classification::avg_precision),
            MetricSpec::scalar("hinge", Score, classification::hinge),
            MetricSpec::scalar("matthews", Label, classification::matthews),
            MetricSpec::scalar("0_1", Label, classification::zero_one_loss),
            MetricSpec::scalar("brier", Score, classification::brier),
        ])
    }

    /// Vector-valued binary-classification metrics (curves, confusion matrix).
    pub fn nonnumeric_classification() -> Self {
        use MetricInput::{Label, Score};
        Self::from_specs(vec![
            MetricSpec::new(
                "confusion_matrix",
                MetricKind::Vector,
                Label,
                Arc::new(|t, p, w| {
                    classification::confusion_matrix(t, p, w).map(ScoreValue::Matrix)
                }),
            ),
            MetricSpec::new(
                "roc_curve",
                MetricKind::Vector,
                Score,
                Arc::new(|t, p, w| classification::roc_curve(t, p, w).map(ScoreValue::Curve)),
            ),
            MetricSpec::new(
                "pr_curve",
                MetricKind::Vector,
                Score,
                Arc::new(|t, p, w| classification::pr_curve(t, p, w).map(ScoreValue::Curve)),
            ),
        ])
    }

    /// Union of the numeric and non-numeric classification sets.
    pub fn classification() -> Self {
        let mut set = Self::numeric_classification();
        set.specs.extend(Self::nonnumeric_classification().specs);
        set
    }

    /// Default set for a binary task, numeric-only or full.
    pub fn binary_default(numeric_only: bool) -> Self {
        if numeric_only {
            Self::numeric_classification()
        } else {
            Self::classification()
        }
    }

    /// Regression metrics. All scalar; the input routing field is unused for
    /// regression scoring, which has a single prediction vector.
    pub fn regression() -> Self {
        use MetricInput::Label;
        Self::from_specs(vec![
            MetricSpec::scalar("expvar", Label, regression::explained_variance),
            MetricSpec::scalar("mae", Label, regression::mean_absolute_error),
            MetricSpec::scalar("mse", Label, regression::mean_squared_error),
            MetricSpec::scalar("msle", Label, regression::mean_squared_log_error),
            MetricSpec::scalar("mdae", Label, regression::median_absolute_error),
            MetricSpec::scalar("r2", Label, regression::r2),
        ])
    }

    /// Appends a metric, builder style.
    pub fn with_metric(mut self, spec: MetricSpec) -> Self {
        self.specs.push(spec);
        self
    }

    /// Keeps only the named metrics, in the set's order.
    pub fn select(mut self, names: &[&str]) -> Self {
        self.specs.retain(|s| names.contains(&s.name()));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricSpec> {
        self.specs.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.specs.iter().map(MetricSpec::name).collect()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

/// `(x, y, wx, wy) -> distance` between two weighted samples.
pub type DistanceFn = Arc<dyn Fn(&[f64], &[f64], &[f64], &[f64]) -> f64 + Send + Sync>;

/// Registry of covariate-balance distances: a built-in name or any callable
/// with the weighted two-sample contract.
#[derive(Clone)]
pub enum DistanceMetric {
    /// Weighted standardized mean difference, signed.
    Smd,
    /// Absolute weighted standardized mean difference (the default).
    AbsSmd,
    /// Weighted two-sample Kolmogorov-Smirnov statistic.
    Ks,
    Custom { name: String, func: DistanceFn },
}

impl DistanceMetric {
    /// Looks up a built-in distance by registry key.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "smd" => Some(Self::Smd),
            "abs_smd" => Some(Self::AbsSmd),
            "ks" => Some(Self::Ks),
            _ => None,
        }
    }

    pub fn custom<N: Into<String>>(name: N, func: DistanceFn) -> Self {
        Self::Custom {
            name: name.into(),
            func,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Smd => "smd",
            Self::AbsSmd => "abs_smd",
            Self::Ks => "ks",
            Self::Custom { name, .. } => name,
        }
    }

    pub fn evaluate(&self, x: &[f64], y: &[f64], wx: &[f64], wy: &[f64]) -> f64 {
        match self {
            Self::Smd => distance::weighted_standardized_mean_difference(x, y, wx, wy),
            Self::AbsSmd => distance::weighted_standardized_mean_difference(x, y, wx, wy).abs(),
            Self::Ks => distance::weighted_ks2samp(x, y, wx, wy),
            Self::Custom { func, .. } => func(x, y, wx, wy),
        }
    }
}

impl Default for DistanceMetric {
    fn default() -> Self {
        Self::AbsSmd
    }
}

impl fmt::Debug for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DistanceMetric").field(&self.name()).finish()
    }
}
