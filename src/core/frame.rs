use serde::Serialize;

/// Named columns of equal length, the covariate matrix handed to evaluation.
///
/// Columns are `f64`; categorical covariates are expected to be encoded by the
/// caller before evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl Frame {
    /// Builds a frame from `(name, column)` pairs.
    ///
    /// # Panics
    /// Panics if columns differ in length or names repeat; a malformed
    /// covariate matrix is a programming error at the call site, not a
    /// recoverable condition.
    pub fn new(columns: Vec<(String, Vec<f64>)>) -> Self {
        let mut names = Vec::with_capacity(columns.len());
        let mut data = Vec::with_capacity(columns.len());
        let mut n_rows = None;
        for (name, column) in columns {
            let len = column.len();
            match n_rows {
                None => n_rows = Some(len),
                Some(expected) => assert_eq!(
                    expected, len,
                    "column {name} has {len} rows, expected {expected}"
                ),
            }
            assert!(!names.contains(&name), "duplicate column name {name}");
            names.push(name);
            data.push(column);
        }
        Self {
            names,
            columns: data,
        }
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    #[inline]
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        let pos = self.names.iter().position(|n| n == name)?;
        Some(&self.columns[pos])
    }

    /// Iterates `(name, column)` pairs in insertion order.
    pub fn iter_columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter().map(Vec::as_slice))
    }

    /// New frame holding only the given rows, in the given order.
    ///
    /// Callers guarantee indices are in bounds; fold indices are validated
    /// once at the evaluation entry point.
    pub fn select_rows(&self, indices: &[usize]) -> Frame {
        let columns = self
            .columns
            .iter()
            .map(|col| indices.iter().map(|&i| col[i]).collect())
            .collect();
        Frame {
            names: self.names.clone(),
            columns,
        }
    }
}

/// Slices a vector by row indices, the series counterpart of
/// [`Frame::select_rows`].
#[inline]
pub(crate) fn take(values: &[f64], indices: &[usize]) -> Vec<f64> {
    indices.iter().map(|&i| values[i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Frame {
        Frame::new(vec![
            ("x0".into(), vec![1.0, 2.0, 3.0, 4.0]),
            ("x1".into(), vec![0.5, 0.6, 0.7, 0.8]),
        ])
    }

    #[test]
    fn shape_and_lookup() {
        let f = frame();
        assert_eq!(f.n_rows(), 4);
        assert_eq!(f.n_columns(), 2);
        assert_eq!(f.column("x1").unwrap(), &[0.5, 0.6, 0.7, 0.8]);
        assert!(f.column("x2").is_none());
    }

    #[test]
    fn select_rows_keeps_order_given() {
        let f = frame().select_rows(&[2, 0]);
        assert_eq!(f.n_rows(), 2);
        assert_eq!(f.column("x0").unwrap(), &[3.0, 1.0]);
        assert_eq!(f.column("x1").unwrap(), &[0.7, 0.5]);
    }

    #[test]
    #[should_panic]
    fn ragged_columns_panic() {
        Frame::new(vec![
            ("a".into(), vec![1.0]),
            ("b".into(), vec![1.0, 2.0]),
        ]);
    }

    #[test]
    fn take_slices_series() {
        assert_eq!(take(&[10.0, 20.0, 30.0], &[2, 1]), vec![30.0, 20.0]);
    }
}
