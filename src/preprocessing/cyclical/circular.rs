//! Circular encoding for cyclical calendar fields.
//!
//! Integer values in `[min, max]` are placed on the unit circle:
//! ```text
//! angle = 2π · (value - min) / (max - min + 1)
//! encoded = [cos(angle), sin(angle)]
//! ```
//!
//! The period is `max - min + 1`, so `max` and `min` are neighbours on the circle
//! (December sits next to January). Decoding reads the angle back with `atan2`,
//! reduces it modulo 2π, rounds to the nearest integer and wraps `max + 1` onto
//! `min`.

use crate::error::{ConditionError, Result};
use crate::preprocessing::column::RawColumn;
use crate::preprocessing::traits::{
    check_components, check_encoded_width, FittedTransformer, Transformer,
};
use ndarray::Array2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Serializable parameters for a fitted CircularEncoder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CircularEncoderParams {
    /// Smallest value of the cycle.
    pub min: i64,
    /// Largest value of the cycle.
    pub max: i64,
}

/// Circular encoder (unfitted).
///
/// Bounds may be declared up front; undeclared bounds are taken from the data
/// at fit time.
#[derive(Clone, Debug, Default)]
pub struct CircularEncoder {
    min: Option<i64>,
    max: Option<i64>,
}

impl CircularEncoder {
    /// Create an encoder that learns its bounds from the data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an encoder over the inclusive cycle `[min, max]`.
    pub fn with_bounds(min: i64, max: i64) -> Result<Self> {
        if max < min {
            return Err(ConditionError::InvalidParameter(format!(
                "circular bounds must satisfy min <= max, got [{}, {}]",
                min, max
            )));
        }
        Ok(Self {
            min: Some(min),
            max: Some(max),
        })
    }
}

impl Transformer for CircularEncoder {
    type Params = CircularEncoderParams;
    type Fitted = FittedCircularEncoder;

    fn fit(&self, data: &RawColumn) -> Result<Self::Fitted> {
        check_components(data, 1)?;
        let values = data.to_matrix()?;

        if values.iter().any(|v| !v.is_finite()) {
            return Err(ConditionError::InvalidParameter(
                "CircularEncoder expects finite values".to_string(),
            ));
        }

        let (min, max) = match (self.min, self.max) {
            (Some(min), Some(max)) => (min, max),
            (min, max) => {
                if values.is_empty() {
                    return Err(ConditionError::EmptyData(
                        "Cannot infer circular bounds from empty data".to_string(),
                    ));
                }
                let lo = values.iter().fold(f64::INFINITY, |a, &b| a.min(b));
                let hi = values.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
                (
                    min.unwrap_or(lo.floor() as i64),
                    max.unwrap_or(hi.ceil() as i64),
                )
            }
        };

        FittedCircularEncoder::from_params(CircularEncoderParams { min, max })
    }
}

/// Fitted CircularEncoder ready for inference.
#[derive(Clone, Debug)]
pub struct FittedCircularEncoder {
    min: i64,
    max: i64,
}

impl FittedCircularEncoder {
    pub fn min(&self) -> i64 {
        self.min
    }

    pub fn max(&self) -> i64 {
        self.max
    }

    /// Number of distinct positions on the cycle.
    pub fn period(&self) -> i64 {
        self.max - self.min + 1
    }

    fn angle(&self, value: f64) -> f64 {
        (value - self.min as f64) / self.period() as f64 * TAU
    }

    fn decode(&self, cos: f64, sin: f64) -> f64 {
        let angle = sin.atan2(cos).rem_euclid(TAU);
        let position = (angle / TAU * self.period() as f64).round() as i64;
        (self.min + position.rem_euclid(self.period())) as f64
    }
}

impl FittedTransformer for FittedCircularEncoder {
    type Params = CircularEncoderParams;

    fn transform(&self, data: &RawColumn) -> Result<Array2<f64>> {
        check_components(data, 1)?;
        let values = data.to_matrix()?;

        let mut out = Array2::zeros((values.nrows(), 2));
        for (i, &v) in values.column(0).iter().enumerate() {
            let angle = self.angle(v);
            out[[i, 0]] = angle.cos();
            out[[i, 1]] = angle.sin();
        }
        Ok(out)
    }

    fn inverse_transform(&self, data: &Array2<f64>) -> Result<RawColumn> {
        check_encoded_width(data, 2)?;
        let values: Vec<f64> = data
            .rows()
            .into_iter()
            .map(|row| self.decode(row[0], row[1]))
            .collect();
        Ok(RawColumn::scalar(&values))
    }

    /// Integers uniform over `[min, max]` inclusive.
    fn sample_raw<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<RawColumn> {
        let values: Vec<f64> = (0..n)
            .map(|_| rng.gen_range(self.min..=self.max) as f64)
            .collect();
        Ok(RawColumn::scalar(&values))
    }

    fn extract_params(&self) -> Self::Params {
        CircularEncoderParams {
            min: self.min,
            max: self.max,
        }
    }

    fn from_params(params: Self::Params) -> Result<Self> {
        if params.max < params.min {
            return Err(ConditionError::InvalidParameter(format!(
                "circular bounds must satisfy min <= max, got [{}, {}]",
                params.min, params.max
            )));
        }
        Ok(Self {
            min: params.min,
            max: params.max,
        })
    }

    fn n_features_in(&self) -> usize {
        1
    }

    fn n_features_out(&self) -> usize {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn months() -> FittedCircularEncoder {
        CircularEncoder::with_bounds(1, 12)
            .unwrap()
            .fit(&RawColumn::scalar(&[1.0]))
            .unwrap()
    }

    #[test]
    fn test_circular_min_maps_to_angle_zero() {
        let out = months().transform(&RawColumn::scalar(&[1.0])).unwrap();
        assert!((out[[0, 0]] - 1.0).abs() < 1e-12);
        assert!(out[[0, 1]].abs() < 1e-12);
    }

    #[test]
    fn test_circular_quarter_turn() {
        // 4 is a quarter of the way around a 12-month cycle starting at 1.
        let out = months().transform(&RawColumn::scalar(&[4.0])).unwrap();
        assert!(out[[0, 0]].abs() < 1e-12);
        assert!((out[[0, 1]] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_circular_unit_norm() {
        let values: Vec<f64> = (1..=12).map(f64::from).collect();
        let out = months().transform(&RawColumn::scalar(&values)).unwrap();
        for row in out.rows() {
            assert!((row[0].powi(2) + row[1].powi(2) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_circular_inverse_round_trip() {
        let fitted = months();
        let values: Vec<f64> = (1..=12).map(f64::from).collect();
        let encoded = fitted.transform(&RawColumn::scalar(&values)).unwrap();
        let decoded = fitted.inverse_transform(&encoded).unwrap();
        assert_eq!(decoded, RawColumn::scalar(&values));
    }

    #[test]
    fn test_circular_wraps_max_plus_one() {
        let fitted = months();
        let encoded = fitted.transform(&RawColumn::scalar(&[13.0])).unwrap();
        let decoded = fitted.inverse_transform(&encoded).unwrap();
        assert_eq!(decoded, RawColumn::scalar(&[1.0]));
    }

    #[test]
    fn test_circular_learns_bounds_from_data() {
        let fitted = CircularEncoder::new()
            .fit(&RawColumn::scalar(&[0.0, 3.0, 6.0]))
            .unwrap();
        assert_eq!((fitted.min(), fitted.max()), (0, 6));
        assert_eq!(fitted.period(), 7);
    }

    #[test]
    fn test_circular_accepts_integer_levels() {
        let fitted = months();
        let from_levels = fitted.transform(&RawColumn::levels([7i64])).unwrap();
        let from_numeric = fitted.transform(&RawColumn::scalar(&[7.0])).unwrap();
        assert_eq!(from_levels, from_numeric);
    }

    #[test]
    fn test_circular_rejects_wide_input() {
        let result = months().transform(&RawColumn::Numeric(array![[1.0, 2.0]]));
        assert!(matches!(result, Err(ConditionError::FeatureMismatch { .. })));
    }

    #[test]
    fn test_circular_inverse_rejects_wrong_width() {
        let result = months().inverse_transform(&array![[1.0, 0.0, 0.0]]);
        assert!(matches!(result, Err(ConditionError::FeatureMismatch { .. })));
    }

    #[test]
    fn test_circular_invalid_bounds() {
        assert!(CircularEncoder::with_bounds(5, 2).is_err());
    }

    #[test]
    fn test_circular_sample_is_inclusive() {
        let fitted = CircularEncoder::with_bounds(0, 2)
            .unwrap()
            .fit(&RawColumn::scalar(&[0.0]))
            .unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let sample = fitted.sample_raw(300, &mut rng).unwrap();
        let m = sample.to_matrix().unwrap();

        for target in [0.0, 1.0, 2.0] {
            assert!(m.iter().any(|&v| v == target), "never drew {}", target);
        }
        assert!(m.iter().all(|&v| (0.0..=2.0).contains(&v)));
    }
}
