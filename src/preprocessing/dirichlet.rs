//! Encoders for Dirichlet (gamma posterior) user embeddings.
//!
//! A user embedding is a vector of gamma parameters, one per topic. Unlike the
//! other encoders this is not a plain invertible map: the representation is
//! re-derived from the gamma values with one of four styles.
//!
//! | Style    | Output                                                     | Width |
//! |----------|------------------------------------------------------------|-------|
//! | `sample` | one Gamma(γ, 1) draw per topic, renormalised to a simplex  | K     |
//! | `embed`  | `γ / Σγ` plus total mass min-max scaled to [0, 1]           | K + 1 |
//! | `mean`   | `γ / Σγ`                                                   | K     |
//! | `scaled` | `(γ - γ_min) / (γ_max - γ_min + ε)` per topic              | K     |
//!
//! `sample` is stochastic; the other styles are deterministic.

use crate::error::{ConditionError, Result};
use crate::preprocessing::column::RawColumn;
use crate::preprocessing::traits::{
    check_components, check_encoded_width, FittedTransformer, Transformer,
};
use ndarray::{Array2, Axis};
use rand::Rng;
use rand_distr::{Dirichlet, Distribution, Gamma};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const EPS: f64 = 1e-6;

/// How gamma parameters are turned into an encoded row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirichletStyle {
    /// Draw from the posterior and renormalise.
    #[default]
    Sample,
    /// Proportions plus a normalised total mass column.
    Embed,
    /// Posterior mean proportions.
    Mean,
    /// Per-topic min-max scaling of the raw gamma values.
    Scaled,
}

impl DirichletStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            DirichletStyle::Sample => "sample",
            DirichletStyle::Embed => "embed",
            DirichletStyle::Mean => "mean",
            DirichletStyle::Scaled => "scaled",
        }
    }
}

impl fmt::Display for DirichletStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DirichletStyle {
    type Err = ConditionError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sample" => Ok(DirichletStyle::Sample),
            "embed" => Ok(DirichletStyle::Embed),
            "mean" => Ok(DirichletStyle::Mean),
            "scaled" => Ok(DirichletStyle::Scaled),
            other => Err(ConditionError::InvalidParameter(format!(
                "unknown Dirichlet transform style '{}'",
                other
            ))),
        }
    }
}

/// Dirichlet encoder (unfitted).
///
/// `min_length` and `max_length` bound the total document length drawn when
/// sampling synthetic users.
#[derive(Clone, Debug)]
pub struct DirichletEncoder {
    style: DirichletStyle,
    min_length: f64,
    max_length: f64,
}

impl DirichletEncoder {
    pub fn new(min_length: f64, max_length: f64) -> Result<Self> {
        if !(min_length.is_finite() && max_length.is_finite())
            || min_length <= 0.0
            || max_length < min_length
        {
            return Err(ConditionError::InvalidParameter(format!(
                "document length bounds must satisfy 0 < min <= max, got [{}, {}]",
                min_length, max_length
            )));
        }
        Ok(Self {
            style: DirichletStyle::default(),
            min_length,
            max_length,
        })
    }

    /// Set the transform style.
    pub fn with_style(mut self, style: DirichletStyle) -> Self {
        self.style = style;
        self
    }
}

/// Serializable parameters for a fitted DirichletEncoder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DirichletEncoderParams {
    pub style: DirichletStyle,
    pub min_length: f64,
    pub max_length: f64,
    /// Per-topic minimum gamma.
    pub gamma_min: Vec<f64>,
    /// Per-topic maximum gamma.
    pub gamma_max: Vec<f64>,
    /// Smallest row total seen during fit.
    pub total_min: f64,
    /// Largest row total seen during fit.
    pub total_max: f64,
}

impl Transformer for DirichletEncoder {
    type Params = DirichletEncoderParams;
    type Fitted = FittedDirichletEncoder;

    fn fit(&self, data: &RawColumn) -> Result<Self::Fitted> {
        let gammas = data.to_matrix()?;
        let (rows, topics) = gammas.dim();

        if rows == 0 || topics == 0 {
            return Err(ConditionError::EmptyData(
                "Cannot fit DirichletEncoder on empty data".to_string(),
            ));
        }
        if gammas.iter().any(|&g| !g.is_finite() || g <= 0.0) {
            return Err(ConditionError::InvalidParameter(
                "gamma parameters must be finite and positive".to_string(),
            ));
        }

        let gamma_min = gammas
            .axis_iter(Axis(1))
            .map(|c| c.fold(f64::INFINITY, |a, &b| a.min(b)))
            .collect();
        let gamma_max = gammas
            .axis_iter(Axis(1))
            .map(|c| c.fold(f64::NEG_INFINITY, |a, &b| a.max(b)))
            .collect();
        let totals = gammas.sum_axis(Axis(1));
        let total_min = totals.fold(f64::INFINITY, |a, &b| a.min(b));
        let total_max = totals.fold(f64::NEG_INFINITY, |a, &b| a.max(b));

        tracing::debug!(topics, rows, style = %self.style, "fitted dirichlet encoder");

        Ok(FittedDirichletEncoder {
            style: self.style,
            min_length: self.min_length,
            max_length: self.max_length,
            gamma_min,
            gamma_max,
            total_min,
            total_max,
        })
    }
}

/// Fitted DirichletEncoder ready for inference.
#[derive(Clone, Debug)]
pub struct FittedDirichletEncoder {
    style: DirichletStyle,
    min_length: f64,
    max_length: f64,
    gamma_min: Vec<f64>,
    gamma_max: Vec<f64>,
    total_min: f64,
    total_max: f64,
}

impl FittedDirichletEncoder {
    pub fn style(&self) -> DirichletStyle {
        self.style
    }

    /// Switch the transform style. Changes the output width for `embed`.
    pub fn set_style(&mut self, style: DirichletStyle) {
        self.style = style;
    }

    /// Number of topics.
    pub fn n_topics(&self) -> usize {
        self.gamma_min.len()
    }

    /// Bounds for the sampled document length.
    pub fn length_bounds(&self) -> (f64, f64) {
        (self.min_length, self.max_length)
    }

    fn proportions(gammas: &Array2<f64>) -> Result<Array2<f64>> {
        let totals = gammas.sum_axis(Axis(1));
        if totals.iter().any(|&t| t <= 0.0 || !t.is_finite()) {
            return Err(ConditionError::NumericalError(
                "gamma rows must have a positive finite total".to_string(),
            ));
        }
        Ok(gammas / &totals.insert_axis(Axis(1)))
    }

    /// One Dirichlet(γ) draw per row.
    ///
    /// For tiny γ every Gamma(γ, 1) draw in a row can underflow to zero; such rows
    /// fall back to their mean proportions `γ / Σγ`.
    fn draw_posterior<R: Rng + ?Sized>(gammas: &Array2<f64>, rng: &mut R) -> Result<Array2<f64>> {
        let mut draws = Array2::zeros(gammas.dim());
        for ((i, j), &g) in gammas.indexed_iter() {
            let gamma = Gamma::new(g, 1.0)
                .map_err(|e| ConditionError::NumericalError(format!("gamma({}): {}", g, e)))?;
            draws[[i, j]] = gamma.sample(rng);
        }

        let mut underflowed = 0usize;
        for (mut draw, gamma) in draws.rows_mut().into_iter().zip(gammas.rows()) {
            let total = draw.sum();
            if total > 0.0 && total.is_finite() {
                continue;
            }
            draw.assign(&gamma);
            underflowed += 1;
        }
        if underflowed > 0 {
            tracing::debug!(rows = underflowed, "gamma draws underflowed, using mean proportions");
        }
        Self::proportions(&draws)
    }
}

impl FittedTransformer for FittedDirichletEncoder {
    type Params = DirichletEncoderParams;

    /// Uses the thread-local generator for the `sample` style.
    fn transform(&self, data: &RawColumn) -> Result<Array2<f64>> {
        self.transform_with_rng(data, &mut rand::thread_rng())
    }

    fn transform_with_rng<R: Rng + ?Sized>(
        &self,
        data: &RawColumn,
        rng: &mut R,
    ) -> Result<Array2<f64>> {
        check_components(data, self.n_features_in())?;
        let gammas = data.to_matrix()?;

        match self.style {
            DirichletStyle::Sample => Self::draw_posterior(&gammas, rng),
            DirichletStyle::Mean => Self::proportions(&gammas),
            DirichletStyle::Embed => {
                let topics = self.n_topics();
                let mut out = Array2::zeros((gammas.nrows(), topics + 1));
                out.slice_mut(ndarray::s![.., ..topics])
                    .assign(&Self::proportions(&gammas)?);
                let span = self.total_max - self.total_min + EPS;
                for (i, total) in gammas.sum_axis(Axis(1)).iter().enumerate() {
                    out[[i, topics]] = (total - self.total_min) / span;
                }
                Ok(out)
            }
            DirichletStyle::Scaled => {
                let mut out = gammas.into_owned();
                for mut row in out.rows_mut() {
                    for (j, v) in row.iter_mut().enumerate() {
                        *v = (*v - self.gamma_min[j]) / (self.gamma_max[j] - self.gamma_min[j] + EPS);
                    }
                }
                Ok(out)
            }
        }
    }

    /// `embed` and `scaled` recover gamma values; `mean` and `sample` only carry
    /// proportions, which are returned as-is.
    fn inverse_transform(&self, data: &Array2<f64>) -> Result<RawColumn> {
        check_encoded_width(data, self.n_features_out())?;
        let topics = self.n_topics();

        let gammas = match self.style {
            DirichletStyle::Sample | DirichletStyle::Mean => data.clone(),
            DirichletStyle::Embed => {
                let span = self.total_max - self.total_min + EPS;
                let mut out = data.slice(ndarray::s![.., ..topics]).to_owned();
                for (mut row, encoded) in out.rows_mut().into_iter().zip(data.rows()) {
                    let total = encoded[topics] * span + self.total_min;
                    row.mapv_inplace(|p| p * total);
                }
                out
            }
            DirichletStyle::Scaled => {
                let mut out = data.clone();
                for mut row in out.rows_mut() {
                    for (j, v) in row.iter_mut().enumerate() {
                        *v = *v * (self.gamma_max[j] - self.gamma_min[j] + EPS) + self.gamma_min[j];
                    }
                }
                out
            }
        };
        Ok(RawColumn::Numeric(gammas))
    }

    /// A document length uniform in the length bounds times a flat Dirichlet draw.
    fn sample_raw<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<RawColumn> {
        let topics = self.n_topics();
        let mut out = Array2::zeros((n, topics));

        let flat = if topics > 1 {
            Some(
                Dirichlet::new(&vec![1.0; topics])
                    .map_err(|e| ConditionError::NumericalError(e.to_string()))?,
            )
        } else {
            None
        };

        for mut row in out.rows_mut() {
            let length = rng.gen_range(self.min_length..=self.max_length);
            match &flat {
                Some(dist) => {
                    let draw: Vec<f64> = dist.sample(rng);
                    for (v, p) in row.iter_mut().zip(draw) {
                        *v = p * length;
                    }
                }
                None => row[0] = length,
            }
        }
        Ok(RawColumn::Numeric(out))
    }

    fn extract_params(&self) -> Self::Params {
        DirichletEncoderParams {
            style: self.style,
            min_length: self.min_length,
            max_length: self.max_length,
            gamma_min: self.gamma_min.clone(),
            gamma_max: self.gamma_max.clone(),
            total_min: self.total_min,
            total_max: self.total_max,
        }
    }

    fn from_params(params: Self::Params) -> Result<Self> {
        if params.gamma_min.len() != params.gamma_max.len() || params.gamma_min.is_empty() {
            return Err(ConditionError::Serialization(
                "DirichletEncoder parameter lengths disagree".to_string(),
            ));
        }
        Ok(Self {
            style: params.style,
            min_length: params.min_length,
            max_length: params.max_length,
            gamma_min: params.gamma_min,
            gamma_max: params.gamma_max,
            total_min: params.total_min,
            total_max: params.total_max,
        })
    }

    fn n_features_in(&self) -> usize {
        self.n_topics()
    }

    fn n_features_out(&self) -> usize {
        match self.style {
            DirichletStyle::Embed => self.n_topics() + 1,
            _ => self.n_topics(),
        }
    }
}
