//! Min-max scaling for continuous conditions.
//!
//! Transforms each component to the target range (default [-1, 1]):
//! ```text
//! X_scaled = clip((X - X_min) / (X_max - X_min) * (max - min) + min, min, max)
//! ```
//!
//! Inputs outside the fitted range are clamped rather than rejected, so weather
//! extremes never produce conditions the generative model has not seen. The
//! inverse clamps to the fitted data range for the same reason.
//!
//! # Example
//! ```ignore
//! use conditioner_rs::preprocessing::{ContinuousScaler, RawColumn, Transformer};
//!
//! let scaler = ContinuousScaler::new().with_range(-1.0, 1.0);
//! let fitted = scaler.fit(&RawColumn::scalar(&[2.0, 4.0, 6.0]))?;
//! let scaled = fitted.transform(&RawColumn::scalar(&[4.0]))?; // [[0.0]]
//! ```

use crate::error::{ConditionError, Result};
use crate::preprocessing::column::RawColumn;
use crate::preprocessing::traits::{
    check_components, check_encoded_width, FittedTransformer, Transformer,
};
use ndarray::{Array2, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Configuration for ContinuousScaler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContinuousScalerConfig {
    /// Minimum value of the target range.
    pub min: f64,
    /// Maximum value of the target range.
    pub max: f64,
}

impl Default for ContinuousScalerConfig {
    fn default() -> Self {
        Self { min: -1.0, max: 1.0 }
    }
}

/// Serializable parameters for a fitted ContinuousScaler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContinuousScalerParams {
    /// Configuration options.
    pub config: ContinuousScalerConfig,
    /// Minimum of each component.
    pub data_min: Vec<f64>,
    /// Maximum of each component.
    pub data_max: Vec<f64>,
    /// Scale factor for each component: (max - min) / (data_max - data_min).
    pub scale: Vec<f64>,
}

/// ContinuousScaler transformer (unfitted).
#[derive(Clone, Debug, Default)]
pub struct ContinuousScaler {
    config: ContinuousScalerConfig,
}

impl ContinuousScaler {
    /// Create a new ContinuousScaler with the default range [-1, 1].
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target range for scaling.
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        assert!(max > min, "max must be greater than min");
        self.config.min = min;
        self.config.max = max;
        self
    }
}

impl Transformer for ContinuousScaler {
    type Params = ContinuousScalerParams;
    type Fitted = FittedContinuousScaler;

    fn fit(&self, data: &RawColumn) -> Result<Self::Fitted> {
        let data = data.to_matrix()?;
        let (rows, cols) = data.dim();

        if rows == 0 {
            return Err(ConditionError::EmptyData(
                "Cannot fit ContinuousScaler on empty data".to_string(),
            ));
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(ConditionError::InvalidParameter(
                "ContinuousScaler expects finite values".to_string(),
            ));
        }

        let data_min: Vec<f64> = data
            .axis_iter(Axis(1))
            .map(|c| c.fold(f64::INFINITY, |a, &b| a.min(b)))
            .collect();
        let data_max: Vec<f64> = data
            .axis_iter(Axis(1))
            .map(|c| c.fold(f64::NEG_INFINITY, |a, &b| a.max(b)))
            .collect();

        let target_range = self.config.max - self.config.min;
        let scale = data_min
            .iter()
            .zip(data_max.iter())
            .map(|(&min, &max)| {
                let range = max - min;
                if range == 0.0 {
                    1.0 // Constant component: scale by 1 to avoid division by zero
                } else {
                    target_range / range
                }
            })
            .collect();

        tracing::debug!(components = cols, rows, "fitted continuous scaler");

        Ok(FittedContinuousScaler {
            config: self.config.clone(),
            data_min,
            data_max,
            scale,
        })
    }
}

/// Fitted ContinuousScaler ready for inference.
#[derive(Clone, Debug)]
pub struct FittedContinuousScaler {
    config: ContinuousScalerConfig,
    data_min: Vec<f64>,
    data_max: Vec<f64>,
    scale: Vec<f64>,
}

impl FittedContinuousScaler {
    /// Minimum seen during fit, per component.
    pub fn data_min(&self) -> &[f64] {
        &self.data_min
    }

    /// Maximum seen during fit, per component.
    pub fn data_max(&self) -> &[f64] {
        &self.data_max
    }

    /// Scale factor per component.
    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    /// Target range of the encoding.
    pub fn feature_range(&self) -> (f64, f64) {
        (self.config.min, self.config.max)
    }
}

impl FittedTransformer for FittedContinuousScaler {
    type Params = ContinuousScalerParams;

    fn transform(&self, data: &RawColumn) -> Result<Array2<f64>> {
        check_components(data, self.n_features_in())?;
        let data = data.to_matrix()?;
        let (lo, hi) = self.feature_range();

        let mut clipped = 0usize;
        let mut out = data.into_owned();
        for mut row in out.rows_mut() {
            for (j, v) in row.iter_mut().enumerate() {
                let scaled = (*v - self.data_min[j]) * self.scale[j] + lo;
                if scaled < lo || scaled > hi {
                    clipped += 1;
                }
                *v = scaled.clamp(lo, hi);
            }
        }
        if clipped > 0 {
            tracing::warn!(clipped, "clamped continuous inputs outside the fitted range");
        }
        Ok(out)
    }

    fn inverse_transform(&self, data: &Array2<f64>) -> Result<RawColumn> {
        check_encoded_width(data, self.n_features_out())?;
        let lo = self.config.min;

        let mut out = data.clone();
        for mut row in out.rows_mut() {
            for (j, v) in row.iter_mut().enumerate() {
                let raw = (*v - lo) / self.scale[j] + self.data_min[j];
                *v = raw.clamp(self.data_min[j], self.data_max[j]);
            }
        }
        Ok(RawColumn::Numeric(out))
    }

    /// Uniform in the encoded range, mapped back through the inverse.
    fn sample_raw<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<RawColumn> {
        let (lo, hi) = self.feature_range();
        let encoded = Array2::from_shape_fn((n, self.n_features_out()), |_| rng.gen_range(lo..hi));
        self.inverse_transform(&encoded)
    }

    fn extract_params(&self) -> Self::Params {
        ContinuousScalerParams {
            config: self.config.clone(),
            data_min: self.data_min.clone(),
            data_max: self.data_max.clone(),
            scale: self.scale.clone(),
        }
    }

    fn from_params(params: Self::Params) -> Result<Self> {
        let n = params.data_min.len();
        if params.data_max.len() != n || params.scale.len() != n {
            return Err(ConditionError::Serialization(
                "ContinuousScaler parameter lengths disagree".to_string(),
            ));
        }
        Ok(Self {
            config: params.config,
            data_min: params.data_min,
            data_max: params.data_max,
            scale: params.scale,
        })
    }

    fn n_features_in(&self) -> usize {
        self.data_min.len()
    }

    fn n_features_out(&self) -> usize {
        self.data_min.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn create_test_data() -> RawColumn {
        // [[0, 1], [0, 1], [1, 3]]
        RawColumn::Numeric(array![[0.0, 1.0], [0.0, 1.0], [1.0, 3.0]])
    }

    #[test]
    fn test_continuous_scaler_fit() {
        let fitted = ContinuousScaler::new().fit(&create_test_data()).unwrap();

        assert_eq!(fitted.data_min(), &[0.0, 1.0]);
        assert_eq!(fitted.data_max(), &[1.0, 3.0]);
        // Scale: 2 / (1 - 0) = 2, 2 / (3 - 1) = 1
        assert!((fitted.scale()[0] - 2.0).abs() < 1e-12);
        assert!((fitted.scale()[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_continuous_scaler_transform() {
        let data = create_test_data();
        let fitted = ContinuousScaler::new().fit(&data).unwrap();
        let out = fitted.transform(&data).unwrap();

        assert_eq!(out, array![[-1.0, -1.0], [-1.0, -1.0], [1.0, 1.0]]);
    }

    #[test]
    fn test_continuous_scaler_clips_out_of_range() {
        let fitted = ContinuousScaler::new()
            .fit(&RawColumn::scalar(&[10.0, 20.0]))
            .unwrap();
        let out = fitted.transform(&RawColumn::scalar(&[0.0, 15.0, 45.0])).unwrap();

        assert_eq!(out.column(0).to_vec(), vec![-1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_continuous_scaler_inverse_transform() {
        let data = create_test_data();
        let fitted = ContinuousScaler::new().fit(&data).unwrap();
        let recovered = fitted
            .inverse_transform(&fitted.transform(&data).unwrap())
            .unwrap();

        let RawColumn::Numeric(recovered) = recovered else {
            panic!("expected numeric column");
        };
        let RawColumn::Numeric(original) = data else {
            unreachable!()
        };
        for (o, r) in original.iter().zip(recovered.iter()) {
            assert!((o - r).abs() < 1e-12, "Expected {}, got {}", o, r);
        }
    }

    #[test]
    fn test_continuous_scaler_inverse_clips_to_data_range() {
        let fitted = ContinuousScaler::new()
            .fit(&RawColumn::scalar(&[10.0, 20.0]))
            .unwrap();
        let raw = fitted.inverse_transform(&array![[-3.0], [3.0]]).unwrap();
        assert_eq!(raw, RawColumn::Numeric(array![[10.0], [20.0]]));
    }

    #[test]
    fn test_continuous_scaler_custom_range() {
        let data = RawColumn::scalar(&[0.0, 5.0, 10.0]);
        let fitted = ContinuousScaler::new().with_range(0.0, 1.0).fit(&data).unwrap();
        let out = fitted.transform(&data).unwrap();
        assert_eq!(out.column(0).to_vec(), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_continuous_scaler_feature_mismatch() {
        let fitted = ContinuousScaler::new().fit(&create_test_data()).unwrap();
        let result = fitted.transform(&RawColumn::scalar(&[1.0]));

        assert!(matches!(
            result,
            Err(ConditionError::FeatureMismatch {
                expected_features: 2,
                got_features: 1
            })
        ));
    }

    #[test]
    fn test_continuous_scaler_empty_data() {
        let result = ContinuousScaler::new().fit(&RawColumn::scalar(&[]));
        assert!(matches!(result, Err(ConditionError::EmptyData(_))));
    }

    #[test]
    fn test_continuous_scaler_rejects_nan() {
        let result = ContinuousScaler::new().fit(&RawColumn::scalar(&[1.0, f64::NAN]));
        assert!(result.is_err());
    }

    #[test]
    fn test_continuous_scaler_zero_range() {
        let data = RawColumn::scalar(&[5.0, 5.0]);
        let fitted = ContinuousScaler::new().fit(&data).unwrap();
        let out = fitted.transform(&data).unwrap();
        assert!(out.iter().all(|&v| (v + 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_continuous_scaler_sample_within_data_range() {
        let fitted = ContinuousScaler::new()
            .fit(&RawColumn::scalar(&[-4.0, 12.0, 30.0]))
            .unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let sample = fitted.sample_raw(200, &mut rng).unwrap();

        let m = sample.to_matrix().unwrap();
        assert_eq!(m.dim(), (200, 1));
        assert!(m.iter().all(|&v| (-4.0..=30.0).contains(&v)));
        // Uniform in encoded space covers both halves of the range.
        assert!(m.iter().any(|&v| v < 13.0));
        assert!(m.iter().any(|&v| v > 13.0));
    }

    #[test]
    fn test_continuous_scaler_params_round_trip() {
        let data = create_test_data();
        let fitted = ContinuousScaler::new().fit(&data).unwrap();
        let restored = FittedContinuousScaler::from_params(fitted.extract_params()).unwrap();
        assert_eq!(
            fitted.transform(&data).unwrap(),
            restored.transform(&data).unwrap()
        );
    }

    #[test]
    fn test_continuous_scaler_save_load_file() {
        let data = create_test_data();
        let fitted = ContinuousScaler::new().fit(&data).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("continuous.bin");
        fitted.save_to_file(&path).unwrap();
        let loaded = FittedContinuousScaler::load_from_file(&path).unwrap();

        assert_eq!(loaded.n_features_in(), 2);
        assert_eq!(
            fitted.transform(&data).unwrap(),
            loaded.transform(&data).unwrap()
        );
    }
}
