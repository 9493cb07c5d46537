use serde::Serialize;
use strum_macros::{Display, EnumString};

/// One cross-validation split: disjoint train/validation row indices over the
/// sample population.
///
/// Folds are produced once by the caller's splitter and never mutated; every
/// downstream computation for a fold borrows the same index sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fold {
    pub train: Vec<usize>,
    pub valid: Vec<usize>,
}

impl Fold {
    pub fn new(train: Vec<usize>, valid: Vec<usize>) -> Self {
        Self { train, valid }
    }

    /// Indices belonging to the given phase.
    #[inline]
    pub fn indices(&self, phase: Phase) -> &[usize] {
        match phase {
            Phase::Train => &self.train,
            Phase::Valid => &self.valid,
        }
    }
}

/// Which half of a [`Fold`] a computation runs on.
///
/// The `Ord` impl fixes the stacking order of aggregated output
/// (train rows before valid rows).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, Serialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Train,
    Valid,
}
