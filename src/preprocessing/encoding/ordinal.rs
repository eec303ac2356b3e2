//! Ordinal encoding for ranked categorical conditions.
//!
//! Maps each level to its rank in a caller-declared ascending order
//! (e.g. `["low", "mid", "high"]` → 0, 1, 2). The order is never inferred from
//! the data: sorting labels alphabetically would rank "high" below "low".

use crate::error::{ConditionError, Result};
use crate::preprocessing::column::{Level, RawColumn};
use crate::preprocessing::traits::{
    check_components, check_encoded_width, FittedTransformer, Transformer,
};
use ndarray::Array2;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Ordinal encoder for ranked categories.
///
/// # Example
/// ```ignore
/// use conditioner_rs::preprocessing::{OrdinalEncoder, RawColumn, Transformer};
///
/// let encoder = OrdinalEncoder::new(vec!["low".into(), "mid".into(), "high".into()])?;
/// let fitted = encoder.fit(&RawColumn::levels(["mid", "low", "high"]))?;
///
/// // [[1], [0], [2]]
/// let encoded = fitted.transform(&RawColumn::levels(["mid", "low", "high"]))?;
/// ```
#[derive(Clone, Debug)]
pub struct OrdinalEncoder {
    /// Categories in ascending order.
    categories: Vec<Level>,
}

impl OrdinalEncoder {
    /// Create an encoder over `categories`, given in ascending order.
    pub fn new(categories: Vec<Level>) -> Result<Self> {
        validate_categories(&categories)?;
        Ok(Self { categories })
    }
}

fn validate_categories(categories: &[Level]) -> Result<()> {
    if categories.is_empty() {
        return Err(ConditionError::InvalidParameter(
            "OrdinalEncoder needs at least one category".to_string(),
        ));
    }
    let mut seen = std::collections::HashSet::new();
    for level in categories {
        if !seen.insert(level) {
            return Err(ConditionError::InvalidParameter(format!(
                "OrdinalEncoder category {} is declared twice",
                level
            )));
        }
    }
    Ok(())
}

/// Serializable parameters for a fitted OrdinalEncoder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrdinalEncoderParams {
    /// Categories in ascending order.
    pub categories: Vec<Level>,
}

/// Fitted OrdinalEncoder ready for inference.
#[derive(Clone, Debug)]
pub struct FittedOrdinalEncoder {
    categories: Vec<Level>,
    /// Mapping from level to rank.
    ranks: HashMap<Level, usize>,
}

impl FittedOrdinalEncoder {
    /// Categories in ascending order.
    pub fn categories(&self) -> &[Level] {
        &self.categories
    }

    /// Rank of a level, if declared.
    pub fn rank(&self, level: &Level) -> Option<usize> {
        self.ranks.get(level).copied()
    }
}

impl Transformer for OrdinalEncoder {
    type Params = OrdinalEncoderParams;
    type Fitted = FittedOrdinalEncoder;

    fn fit(&self, data: &RawColumn) -> Result<Self::Fitted> {
        check_components(data, 1)?;
        let levels = data.to_levels()?;

        if levels.is_empty() {
            return Err(ConditionError::EmptyData(
                "Cannot fit OrdinalEncoder on empty data".to_string(),
            ));
        }

        let fitted = FittedOrdinalEncoder::from_params(OrdinalEncoderParams {
            categories: self.categories.clone(),
        })?;

        // Data must stay inside the declared order.
        if let Some((row, level)) = levels
            .iter()
            .enumerate()
            .find(|(_, l)| fitted.rank(l).is_none())
        {
            return Err(ConditionError::UnknownCategory {
                level: level.to_string(),
                context: format!("row {} of ordinal fit data", row),
            });
        }

        Ok(fitted)
    }
}

impl FittedTransformer for FittedOrdinalEncoder {
    type Params = OrdinalEncoderParams;

    fn transform(&self, data: &RawColumn) -> Result<Array2<f64>> {
        check_components(data, 1)?;
        let levels = data.to_levels()?;

        let mut result = Array2::zeros((levels.len(), 1));
        for (row, level) in levels.iter().enumerate() {
            let rank = self
                .rank(level)
                .ok_or_else(|| ConditionError::UnknownCategory {
                    level: level.to_string(),
                    context: format!("row {}", row),
                })?;
            result[[row, 0]] = rank as f64;
        }
        Ok(result)
    }

    fn inverse_transform(&self, data: &Array2<f64>) -> Result<RawColumn> {
        check_encoded_width(data, 1)?;
        let top = (self.categories.len() - 1) as f64;

        data.column(0)
            .iter()
            .map(|&v| {
                if !v.is_finite() {
                    return Err(ConditionError::NumericalError(format!(
                        "cannot decode ordinal rank {}",
                        v
                    )));
                }
                let rank = v.round().clamp(0.0, top) as usize;
                Ok(self.categories[rank].clone())
            })
            .collect::<Result<Vec<_>>>()
            .map(RawColumn::Levels)
    }

    /// Levels uniform over the declared categories.
    fn sample_raw<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<RawColumn> {
        let levels = (0..n)
            .filter_map(|_| self.categories.choose(rng).cloned())
            .collect();
        Ok(RawColumn::Levels(levels))
    }

    fn extract_params(&self) -> Self::Params {
        OrdinalEncoderParams {
            categories: self.categories.clone(),
        }
    }

    fn from_params(params: Self::Params) -> Result<Self> {
        validate_categories(&params.categories)?;
        let ranks = params
            .categories
            .iter()
            .enumerate()
            .map(|(rank, level)| (level.clone(), rank))
            .collect();
        Ok(FittedOrdinalEncoder {
            categories: params.categories,
            ranks,
        })
    }

    fn n_features_in(&self) -> usize {
        1
    }

    fn n_features_out(&self) -> usize {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn precipitation() -> FittedOrdinalEncoder {
        OrdinalEncoder::new(vec!["low".into(), "mid".into(), "high".into()])
            .unwrap()
            .fit(&RawColumn::levels(["high", "low", "mid", "low"]))
            .unwrap()
    }

    #[test]
    fn test_ordinal_uses_declared_order() {
        let out = precipitation()
            .transform(&RawColumn::levels(["mid", "low", "high"]))
            .unwrap();
        assert_eq!(out, array![[1.0], [0.0], [2.0]]);
    }

    #[test]
    fn test_ordinal_fit_rejects_undeclared_level() {
        let result = OrdinalEncoder::new(vec!["low".into(), "high".into()])
            .unwrap()
            .fit(&RawColumn::levels(["low", "extreme"]));
        assert!(matches!(
            result,
            Err(ConditionError::UnknownCategory { .. })
        ));
    }

    #[test]
    fn test_ordinal_transform_unknown_is_error() {
        let result = precipitation().transform(&RawColumn::levels(["low", "storm"]));
        assert!(matches!(
            result,
            Err(ConditionError::UnknownCategory { context, .. }) if context == "row 1"
        ));
    }

    #[test]
    fn test_ordinal_inverse_rounds_and_clamps() {
        let raw = precipitation()
            .inverse_transform(&array![[0.2], [1.4], [5.0], [-2.0]])
            .unwrap();
        assert_eq!(raw, RawColumn::levels(["low", "mid", "high", "low"]));
    }

    #[test]
    fn test_ordinal_duplicate_categories() {
        let result = OrdinalEncoder::new(vec!["low".into(), "low".into()]);
        assert!(matches!(result, Err(ConditionError::InvalidParameter(_))));
    }

    #[test]
    fn test_ordinal_empty_categories() {
        assert!(OrdinalEncoder::new(vec![]).is_err());
    }

    #[test]
    fn test_ordinal_sample_declared_levels() {
        let fitted = precipitation();
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let RawColumn::Levels(sample) = fitted.sample_raw(50, &mut rng).unwrap() else {
            panic!("expected level column");
        };
        assert_eq!(sample.len(), 50);
        assert!(sample.iter().all(|l| fitted.rank(l).is_some()));
    }

    #[test]
    fn test_ordinal_params_round_trip() {
        let fitted = precipitation();
        let restored = FittedOrdinalEncoder::from_params(fitted.extract_params()).unwrap();
        assert_eq!(restored.rank(&"high".into()), Some(2));
    }
}
