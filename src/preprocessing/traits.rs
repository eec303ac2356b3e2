//! Core traits for condition transformers.
//!
//! This module defines the two central traits:
//! - [`Transformer`]: Used during fitting; has hyperparameters and can learn from data.
//! - [`FittedTransformer`]: After fitting; encodes, decodes, samples and serializes.

use crate::error::{ConditionError, Result};
use crate::preprocessing::column::RawColumn;
use crate::serialization::SerializableParams;
use ndarray::Array2;
use rand::Rng;

/// Trait for unfitted transformers with hyperparameters.
///
/// A transformer learns parameters from a raw column and can then encode new
/// columns into a fixed-width real matrix using those learned parameters.
///
/// # Example
/// ```ignore
/// use conditioner_rs::preprocessing::{ContinuousEncoder, RawColumn, Transformer};
///
/// let encoder = ContinuousEncoder::new();
/// let fitted = encoder.fit(&RawColumn::scalar(&[4.0, 9.0, 21.0]))?;
/// let encoded = fitted.transform(&RawColumn::scalar(&[9.0]))?;
/// ```
pub trait Transformer: Clone {
    /// Serializable representation of learned parameters.
    type Params: SerializableParams;
    /// The fitted transformer type ready for inference.
    type Fitted: FittedTransformer<Params = Self::Params>;

    /// Fit the transformer to a raw column.
    ///
    /// # Errors
    /// Returns [`ConditionError`] if:
    /// - Data is empty
    /// - Data contains values the transformer cannot represent
    /// - The column kind is incompatible with the transformer
    fn fit(&self, data: &RawColumn) -> Result<Self::Fitted>;

    /// Fit the transformer and encode the same column in one step.
    fn fit_transform(&self, data: &RawColumn) -> Result<Array2<f64>> {
        self.fit(data)?.transform(data)
    }
}

/// Trait for fitted transformers ready for inference.
///
/// # Guarantees
/// - `extract_params()` + `from_params()` is a round-trip.
/// - `transform` output always has `n_features_out()` columns.
pub trait FittedTransformer: Clone {
    /// Serializable representation of learned parameters.
    type Params: SerializableParams;

    /// Encode raw values using learned parameters.
    ///
    /// # Errors
    /// Returns [`ConditionError`] if the column shape or kind doesn't match what
    /// was fitted, or if it holds values outside the learned categories.
    fn transform(&self, data: &RawColumn) -> Result<Array2<f64>>;

    /// Encode raw values, drawing any randomness from `rng`.
    ///
    /// Deterministic transformers ignore the generator.
    fn transform_with_rng<R: Rng + ?Sized>(
        &self,
        data: &RawColumn,
        _rng: &mut R,
    ) -> Result<Array2<f64>> {
        self.transform(data)
    }

    /// Map encoded rows back to raw values.
    fn inverse_transform(&self, data: &Array2<f64>) -> Result<RawColumn>;

    /// Draw `n` raw values from the support of this transformer.
    ///
    /// The result is in raw space; pass it through [`FittedTransformer::transform`]
    /// to obtain encoded conditions.
    fn sample_raw<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<RawColumn>;

    /// Extract learned parameters as a serializable representation.
    fn extract_params(&self) -> Self::Params;

    /// Reconstruct a fitted transformer from parameters.
    fn from_params(params: Self::Params) -> Result<Self>
    where
        Self: Sized;

    /// Number of raw components per row seen during fit.
    fn n_features_in(&self) -> usize;

    /// Width of the encoded output.
    fn n_features_out(&self) -> usize;

    /// Save the fitted transformer to a file.
    fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let bytes = self
            .extract_params()
            .to_bytes()
            .map_err(|e| ConditionError::Serialization(e.to_string()))?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Load a fitted transformer from a file.
    fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self>
    where
        Self: Sized,
    {
        let bytes = std::fs::read(path)?;
        let params = Self::Params::from_bytes(&bytes)
            .map_err(|e| ConditionError::Serialization(e.to_string()))?;
        Self::from_params(params)
    }
}

/// Check that an encoded matrix has the width a transformer produces.
pub(crate) fn check_encoded_width(data: &Array2<f64>, expected: usize) -> Result<()> {
    if data.ncols() != expected {
        return Err(ConditionError::FeatureMismatch {
            expected_features: expected,
            got_features: data.ncols(),
        });
    }
    Ok(())
}

/// Check that a raw column has the number of components seen during fit.
pub(crate) fn check_components(data: &RawColumn, expected: usize) -> Result<()> {
    if data.n_components() != expected {
        return Err(ConditionError::FeatureMismatch {
            expected_features: expected,
            got_features: data.n_components(),
        });
    }
    Ok(())
}
