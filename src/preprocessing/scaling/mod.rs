//! Scaling for continuous conditions.
//!
//! - [`ContinuousScaler`]: min-max scaling to [-1, 1] with clipping

mod continuous;

pub use continuous::{
    ContinuousScaler, ContinuousScalerConfig, ContinuousScalerParams, FittedContinuousScaler,
};
