//! Enum dispatch over the per-type transformers.

use crate::conditioner::VariableType;
use crate::error::Result;
use crate::preprocessing::{
    CategoricalEncoder, CategoricalEncoderParams, CircularEncoder, CircularEncoderParams,
    ContinuousScaler, ContinuousScalerParams, DirichletEncoder, DirichletEncoderParams,
    FittedCategoricalEncoder, FittedCircularEncoder, FittedContinuousScaler,
    FittedDirichletEncoder, FittedOrdinalEncoder, FittedTransformer, OrdinalEncoder,
    OrdinalEncoderParams, RawColumn, Transformer,
};
use ndarray::Array2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// An unfitted transformer for one condition.
#[derive(Clone, Debug)]
pub enum ConditionStep {
    Circular(CircularEncoder),
    Categorical(CategoricalEncoder),
    Continuous(ContinuousScaler),
    Ordinal(OrdinalEncoder),
    Dirichlet(DirichletEncoder),
}

impl ConditionStep {
    pub fn fit(&self, data: &RawColumn) -> Result<FittedConditionStep> {
        Ok(match self {
            ConditionStep::Circular(t) => FittedConditionStep::Circular(t.fit(data)?),
            ConditionStep::Categorical(t) => FittedConditionStep::Categorical(t.fit(data)?),
            ConditionStep::Continuous(t) => FittedConditionStep::Continuous(t.fit(data)?),
            ConditionStep::Ordinal(t) => FittedConditionStep::Ordinal(t.fit(data)?),
            ConditionStep::Dirichlet(t) => FittedConditionStep::Dirichlet(t.fit(data)?),
        })
    }
}

/// A fitted transformer for one condition.
#[derive(Clone, Debug)]
pub enum FittedConditionStep {
    Circular(FittedCircularEncoder),
    Categorical(FittedCategoricalEncoder),
    Continuous(FittedContinuousScaler),
    Ordinal(FittedOrdinalEncoder),
    Dirichlet(FittedDirichletEncoder),
}

impl FittedConditionStep {
    pub fn transform(&self, data: &RawColumn) -> Result<Array2<f64>> {
        match self {
            FittedConditionStep::Circular(t) => t.transform(data),
            FittedConditionStep::Categorical(t) => t.transform(data),
            FittedConditionStep::Continuous(t) => t.transform(data),
            FittedConditionStep::Ordinal(t) => t.transform(data),
            FittedConditionStep::Dirichlet(t) => t.transform(data),
        }
    }

    pub fn transform_with_rng<R: Rng + ?Sized>(
        &self,
        data: &RawColumn,
        rng: &mut R,
    ) -> Result<Array2<f64>> {
        match self {
            FittedConditionStep::Circular(t) => t.transform_with_rng(data, rng),
            FittedConditionStep::Categorical(t) => t.transform_with_rng(data, rng),
            FittedConditionStep::Continuous(t) => t.transform_with_rng(data, rng),
            FittedConditionStep::Ordinal(t) => t.transform_with_rng(data, rng),
            FittedConditionStep::Dirichlet(t) => t.transform_with_rng(data, rng),
        }
    }

    pub fn inverse_transform(&self, data: &Array2<f64>) -> Result<RawColumn> {
        match self {
            FittedConditionStep::Circular(t) => t.inverse_transform(data),
            FittedConditionStep::Categorical(t) => t.inverse_transform(data),
            FittedConditionStep::Continuous(t) => t.inverse_transform(data),
            FittedConditionStep::Ordinal(t) => t.inverse_transform(data),
            FittedConditionStep::Dirichlet(t) => t.inverse_transform(data),
        }
    }

    pub fn sample_raw<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<RawColumn> {
        match self {
            FittedConditionStep::Circular(t) => t.sample_raw(n, rng),
            FittedConditionStep::Categorical(t) => t.sample_raw(n, rng),
            FittedConditionStep::Continuous(t) => t.sample_raw(n, rng),
            FittedConditionStep::Ordinal(t) => t.sample_raw(n, rng),
            FittedConditionStep::Dirichlet(t) => t.sample_raw(n, rng),
        }
    }

    pub fn step_name(&self) -> &'static str {
        match self {
            FittedConditionStep::Circular(_) => "CircularEncoder",
            FittedConditionStep::Categorical(_) => "CategoricalEncoder",
            FittedConditionStep::Continuous(_) => "ContinuousScaler",
            FittedConditionStep::Ordinal(_) => "OrdinalEncoder",
            FittedConditionStep::Dirichlet(_) => "DirichletEncoder",
        }
    }

    pub fn n_features_out(&self) -> usize {
        match self {
            FittedConditionStep::Circular(t) => t.n_features_out(),
            FittedConditionStep::Categorical(t) => t.n_features_out(),
            FittedConditionStep::Continuous(t) => t.n_features_out(),
            FittedConditionStep::Ordinal(t) => t.n_features_out(),
            FittedConditionStep::Dirichlet(t) => t.n_features_out(),
        }
    }

    pub fn as_dirichlet_mut(&mut self) -> Option<&mut FittedDirichletEncoder> {
        match self {
            FittedConditionStep::Dirichlet(t) => Some(t),
            _ => None,
        }
    }

    pub fn extract_params(&self) -> StepParams {
        match self {
            FittedConditionStep::Circular(t) => StepParams::Circular(t.extract_params()),
            FittedConditionStep::Categorical(t) => StepParams::Categorical(t.extract_params()),
            FittedConditionStep::Continuous(t) => StepParams::Continuous(t.extract_params()),
            FittedConditionStep::Ordinal(t) => StepParams::Ordinal(t.extract_params()),
            FittedConditionStep::Dirichlet(t) => StepParams::Dirichlet(t.extract_params()),
        }
    }

    pub fn from_params(params: StepParams) -> Result<Self> {
        Ok(match params {
            StepParams::Circular(p) => {
                FittedConditionStep::Circular(FittedCircularEncoder::from_params(p)?)
            }
            StepParams::Categorical(p) => {
                FittedConditionStep::Categorical(FittedCategoricalEncoder::from_params(p)?)
            }
            StepParams::Continuous(p) => {
                FittedConditionStep::Continuous(FittedContinuousScaler::from_params(p)?)
            }
            StepParams::Ordinal(p) => {
                FittedConditionStep::Ordinal(FittedOrdinalEncoder::from_params(p)?)
            }
            StepParams::Dirichlet(p) => {
                FittedConditionStep::Dirichlet(FittedDirichletEncoder::from_params(p)?)
            }
        })
    }
}

/// Serializable learned state of one step.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum StepParams {
    Circular(CircularEncoderParams),
    Categorical(CategoricalEncoderParams),
    Continuous(ContinuousScalerParams),
    Ordinal(OrdinalEncoderParams),
    Dirichlet(DirichletEncoderParams),
}

impl StepParams {
    /// Variable type this step encodes.
    pub fn variable_type(&self) -> VariableType {
        match self {
            StepParams::Circular(_) => VariableType::Circular,
            StepParams::Categorical(_) => VariableType::Categorical,
            StepParams::Continuous(_) => VariableType::Continuous,
            StepParams::Ordinal(_) => VariableType::Ordinal,
            StepParams::Dirichlet(_) => VariableType::Dirichlet,
        }
    }
}
