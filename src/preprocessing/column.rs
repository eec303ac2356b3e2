//! Raw condition data: levels, columns and tag-keyed condition sets.

use crate::error::{ConditionError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// A single categorical value.
///
/// Integers sort before labels; within a variant the natural order applies.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    /// Integer-coded category (flags, codes).
    Int(i64),
    /// Named category.
    Label(String),
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Int(v) => write!(f, "{}", v),
            Level::Label(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<i64> for Level {
    fn from(v: i64) -> Self {
        Level::Int(v)
    }
}

impl From<i32> for Level {
    fn from(v: i32) -> Self {
        Level::Int(v as i64)
    }
}

impl From<bool> for Level {
    fn from(v: bool) -> Self {
        Level::Int(v as i64)
    }
}

impl From<&str> for Level {
    fn from(s: &str) -> Self {
        Level::Label(s.to_string())
    }
}

impl From<String> for Level {
    fn from(s: String) -> Self {
        Level::Label(s)
    }
}

/// A column of raw observations for one condition.
///
/// Rows are observations. Numeric columns may carry several components per row
/// (Dirichlet gamma vectors); level columns always carry one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RawColumn {
    /// Real-valued data, shape `(n_rows, n_components)`.
    Numeric(Array2<f64>),
    /// Categorical data, one level per row.
    Levels(Vec<Level>),
}

impl RawColumn {
    /// Build a single-component numeric column.
    pub fn scalar(values: &[f64]) -> Self {
        RawColumn::Numeric(Array2::from_shape_fn((values.len(), 1), |(i, _)| values[i]))
    }

    /// Build a level column from anything convertible to [`Level`].
    pub fn levels<I, L>(values: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Level>,
    {
        RawColumn::Levels(values.into_iter().map(Into::into).collect())
    }

    /// Number of observations.
    pub fn n_rows(&self) -> usize {
        match self {
            RawColumn::Numeric(m) => m.nrows(),
            RawColumn::Levels(v) => v.len(),
        }
    }

    /// Number of components per observation.
    pub fn n_components(&self) -> usize {
        match self {
            RawColumn::Numeric(m) => m.ncols(),
            RawColumn::Levels(_) => 1,
        }
    }

    /// Short name of the column kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            RawColumn::Numeric(_) => "numeric column",
            RawColumn::Levels(_) => "level column",
        }
    }

    /// View the column as a real matrix.
    ///
    /// Integer levels convert to a one-component matrix; labels cannot.
    pub fn to_matrix(&self) -> Result<Cow<'_, Array2<f64>>> {
        match self {
            RawColumn::Numeric(m) => Ok(Cow::Borrowed(m)),
            RawColumn::Levels(levels) => {
                let mut values = Vec::with_capacity(levels.len());
                for level in levels {
                    match level {
                        Level::Int(v) => values.push(*v as f64),
                        Level::Label(_) => {
                            return Err(ConditionError::SchemaMismatch {
                                expected: "numeric values".to_string(),
                                got: format!("label {}", level),
                            })
                        }
                    }
                }
                Ok(Cow::Owned(Array2::from_shape_vec((values.len(), 1), values).map_err(
                    |e| ConditionError::NumericalError(e.to_string()),
                )?))
            }
        }
    }

    /// View the column as levels.
    ///
    /// A one-component numeric column converts when every value is integral.
    pub fn to_levels(&self) -> Result<Cow<'_, [Level]>> {
        match self {
            RawColumn::Levels(levels) => Ok(Cow::Borrowed(levels)),
            RawColumn::Numeric(m) => {
                if m.ncols() != 1 {
                    return Err(ConditionError::FeatureMismatch {
                        expected_features: 1,
                        got_features: m.ncols(),
                    });
                }
                m.column(0)
                    .iter()
                    .map(|&v| {
                        if v.is_finite() && v.fract() == 0.0 {
                            Ok(Level::Int(v as i64))
                        } else {
                            Err(ConditionError::SchemaMismatch {
                                expected: "integral values".to_string(),
                                got: v.to_string(),
                            })
                        }
                    })
                    .collect::<Result<Vec<_>>>()
                    .map(Cow::Owned)
            }
        }
    }
}

/// Raw condition data keyed by tag, aligned by row across tags.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConditionSet {
    columns: BTreeMap<String, RawColumn>,
}

impl ConditionSet {
    /// Create an empty condition set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a column, returning the one it replaces.
    pub fn insert(&mut self, tag: impl Into<String>, column: RawColumn) -> Option<RawColumn> {
        self.columns.insert(tag.into(), column)
    }

    /// Builder-style insert.
    pub fn with(mut self, tag: impl Into<String>, column: RawColumn) -> Self {
        self.insert(tag, column);
        self
    }

    pub fn get(&self, tag: &str) -> Option<&RawColumn> {
        self.columns.get(tag)
    }

    /// Look up a column, failing with [`ConditionError::MissingColumn`].
    pub fn require(&self, tag: &str) -> Result<&RawColumn> {
        self.columns
            .get(tag)
            .ok_or_else(|| ConditionError::MissingColumn(tag.to_string()))
    }

    pub fn remove(&mut self, tag: &str) -> Option<RawColumn> {
        self.columns.remove(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.columns.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawColumn)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, RawColumn)> for ConditionSet {
    fn from_iter<T: IntoIterator<Item = (String, RawColumn)>>(iter: T) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_level_ordering() {
        let mut levels = vec![Level::from("b"), Level::from(3), Level::from("a"), Level::from(-1)];
        levels.sort();
        assert_eq!(
            levels,
            vec![Level::Int(-1), Level::Int(3), Level::from("a"), Level::from("b")]
        );
    }

    #[test]
    fn test_scalar_column_shape() {
        let col = RawColumn::scalar(&[1.0, 2.0, 3.0]);
        assert_eq!(col.n_rows(), 3);
        assert_eq!(col.n_components(), 1);
    }

    #[test]
    fn test_numeric_to_levels() {
        let col = RawColumn::Numeric(array![[0.0], [1.0], [0.0]]);
        let levels = col.to_levels().unwrap();
        assert_eq!(&*levels, &[Level::Int(0), Level::Int(1), Level::Int(0)]);
    }

    #[test]
    fn test_fractional_numeric_to_levels_fails() {
        let col = RawColumn::scalar(&[0.5]);
        assert!(matches!(
            col.to_levels(),
            Err(ConditionError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_multi_component_to_levels_fails() {
        let col = RawColumn::Numeric(array![[0.0, 1.0]]);
        assert!(matches!(
            col.to_levels(),
            Err(ConditionError::FeatureMismatch { .. })
        ));
    }

    #[test]
    fn test_int_levels_to_matrix() {
        let col = RawColumn::levels([true, false]);
        let m = col.to_matrix().unwrap();
        assert_eq!(*m, array![[1.0], [0.0]]);
    }

    #[test]
    fn test_label_levels_to_matrix_fails() {
        let col = RawColumn::levels(["low"]);
        assert!(col.to_matrix().is_err());
    }

    #[test]
    fn test_condition_set_require() {
        let set = ConditionSet::new().with("months", RawColumn::scalar(&[1.0]));
        assert!(set.require("months").is_ok());
        assert!(matches!(
            set.require("weekdays"),
            Err(ConditionError::MissingColumn(tag)) if tag == "weekdays"
        ));
    }
}
