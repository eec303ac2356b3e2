//! One-hot encoding for categorical conditions.
//!
//! Transforms levels (integer flags or labels) to one-hot rows. The category set is
//! learned from the data and kept sorted, so column `i` of the output always means
//! the `i`-th smallest level seen at fit time.

use crate::error::{ConditionError, Result};
use crate::preprocessing::column::{Level, RawColumn};
use crate::preprocessing::traits::{
    check_components, check_encoded_width, FittedTransformer, Transformer,
};
use ndarray::Array2;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One-hot encoder for categorical conditions.
///
/// # Example
/// ```ignore
/// use conditioner_rs::preprocessing::{CategoricalEncoder, RawColumn, Transformer};
///
/// // is_weekend flags
/// let data = RawColumn::levels([0i64, 1, 0]);
///
/// let fitted = CategoricalEncoder::new().fit(&data)?;
///
/// // [[1, 0], [0, 1], [1, 0]]
/// let encoded = fitted.transform(&data)?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct CategoricalEncoder;

impl CategoricalEncoder {
    /// Create a new CategoricalEncoder with default settings.
    pub fn new() -> Self {
        Self
    }
}

/// Serializable parameters for a fitted CategoricalEncoder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoricalEncoderParams {
    /// Sorted distinct levels seen during fit.
    pub categories: Vec<Level>,
}

/// Fitted CategoricalEncoder ready for inference.
#[derive(Clone, Debug)]
pub struct FittedCategoricalEncoder {
    /// Sorted distinct levels.
    categories: Vec<Level>,
}

impl FittedCategoricalEncoder {
    /// Get the categories learned during fit, in output column order.
    pub fn categories(&self) -> &[Level] {
        &self.categories
    }

    fn position(&self, level: &Level) -> Option<usize> {
        self.categories.binary_search(level).ok()
    }
}

impl Transformer for CategoricalEncoder {
    type Params = CategoricalEncoderParams;
    type Fitted = FittedCategoricalEncoder;

    fn fit(&self, data: &RawColumn) -> Result<Self::Fitted> {
        let levels = data.to_levels()?;

        if levels.is_empty() {
            return Err(ConditionError::EmptyData(
                "Cannot fit CategoricalEncoder on empty data".to_string(),
            ));
        }

        let categories: Vec<Level> = levels
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        tracing::debug!(categories = categories.len(), "fitted categorical encoder");

        Ok(FittedCategoricalEncoder { categories })
    }
}

impl FittedTransformer for FittedCategoricalEncoder {
    type Params = CategoricalEncoderParams;

    fn transform(&self, data: &RawColumn) -> Result<Array2<f64>> {
        check_components(data, 1)?;
        let levels = data.to_levels()?;

        let mut result = Array2::zeros((levels.len(), self.categories.len()));
        for (row, level) in levels.iter().enumerate() {
            let idx = self
                .position(level)
                .ok_or_else(|| ConditionError::UnknownCategory {
                    level: level.to_string(),
                    context: format!("row {}", row),
                })?;
            result[[row, idx]] = 1.0;
        }
        Ok(result)
    }

    fn inverse_transform(&self, data: &Array2<f64>) -> Result<RawColumn> {
        check_encoded_width(data, self.categories.len())?;

        let mut levels = Vec::with_capacity(data.nrows());
        for (row, values) in data.rows().into_iter().enumerate() {
            let best = values
                .iter()
                .enumerate()
                .filter(|&(_, &v)| v > 0.0)
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(i, _)| i);
            match best {
                Some(idx) => levels.push(self.categories[idx].clone()),
                None => {
                    return Err(ConditionError::InvalidParameter(format!(
                        "row {} has no active category",
                        row
                    )))
                }
            }
        }
        Ok(RawColumn::Levels(levels))
    }

    /// Levels uniform over the learned categories.
    fn sample_raw<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<RawColumn> {
        (0..n)
            .map(|_| {
                self.categories
                    .choose(rng)
                    .cloned()
                    .ok_or_else(|| ConditionError::EmptyData("no categories to sample".to_string()))
            })
            .collect::<Result<Vec<_>>>()
            .map(RawColumn::Levels)
    }

    fn extract_params(&self) -> Self::Params {
        CategoricalEncoderParams {
            categories: self.categories.clone(),
        }
    }

    fn from_params(mut params: Self::Params) -> Result<Self> {
        params.categories.sort();
        params.categories.dedup();
        Ok(FittedCategoricalEncoder {
            categories: params.categories,
        })
    }

    fn n_features_in(&self) -> usize {
        1
    }

    fn n_features_out(&self) -> usize {
        self.categories.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn is_weekend() -> FittedCategoricalEncoder {
        let data = RawColumn::Numeric(array![[0.0], [1.0], [0.0]]);
        CategoricalEncoder::new().fit(&data).unwrap()
    }

    #[test]
    fn test_categorical_learns_sorted_categories() {
        let fitted = is_weekend();
        assert_eq!(fitted.categories(), &[Level::Int(0), Level::Int(1)]);
        assert_eq!(fitted.n_features_out(), 2);
    }

    #[test]
    fn test_categorical_transform_one_hot() {
        let out = is_weekend()
            .transform(&RawColumn::Numeric(array![[1.0]]))
            .unwrap();
        assert_eq!(out, array![[0.0, 1.0]]);
    }

    #[test]
    fn test_categorical_transform_labels() {
        let data = RawColumn::levels(["rain", "sun", "fog", "sun"]);
        let fitted = CategoricalEncoder::new().fit(&data).unwrap();
        let out = fitted.transform(&data).unwrap();

        // fog, rain, sun
        assert_eq!(
            out,
            array![
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
                [1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0]
            ]
        );
    }

    #[test]
    fn test_categorical_unknown_is_error() {
        let result = is_weekend().transform(&RawColumn::levels([2i64]));
        assert!(matches!(
            result,
            Err(ConditionError::UnknownCategory { .. })
        ));
    }

    #[test]
    fn test_categorical_unknown_label_is_error() {
        let fitted = CategoricalEncoder::new()
            .fit(&RawColumn::levels(["rain", "sun"]))
            .unwrap();
        let Err(ConditionError::UnknownCategory { level, context }) =
            fitted.transform(&RawColumn::levels(["sun", "hail"]))
        else {
            panic!("expected UnknownCategory");
        };
        assert!(level.contains("hail"));
        assert_eq!(context, "row 1");
    }

    #[test]
    fn test_categorical_inverse_transform() {
        let fitted = is_weekend();
        let raw = fitted
            .inverse_transform(&array![[0.2, 0.8], [0.9, 0.1]])
            .unwrap();
        assert_eq!(raw, RawColumn::levels([1i64, 0]));
    }

    #[test]
    fn test_categorical_inverse_rejects_empty_row() {
        let result = is_weekend().inverse_transform(&array![[0.0, 0.0]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_categorical_empty_data() {
        let result = CategoricalEncoder::new().fit(&RawColumn::Levels(vec![]));
        assert!(matches!(result, Err(ConditionError::EmptyData(_))));
    }

    #[test]
    fn test_categorical_sample_only_known_levels() {
        let fitted = is_weekend();
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        let RawColumn::Levels(sample) = fitted.sample_raw(3, &mut rng).unwrap() else {
            panic!("expected level column");
        };
        assert_eq!(sample.len(), 3);
        assert!(sample
            .iter()
            .all(|l| *l == Level::Int(0) || *l == Level::Int(1)));
    }

    #[test]
    fn test_categorical_params_round_trip() {
        let fitted = is_weekend();
        let restored = FittedCategoricalEncoder::from_params(fitted.extract_params()).unwrap();
        assert_eq!(restored.categories(), fitted.categories());
    }
}
