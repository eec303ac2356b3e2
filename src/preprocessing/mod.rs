//! Per-type condition transformers.
//!
//! Every supported variable type has an unfitted transformer (hyperparameters,
//! declared support) and a fitted counterpart (learned state) following the
//! [`Transformer`] / [`FittedTransformer`] split.
//!
//! # Available Transformers
//!
//! - [`CircularEncoder`]: cyclical integers to `[cos, sin]` (width 2)
//! - [`CategoricalEncoder`]: one-hot over the levels seen at fit (width = levels)
//! - [`ContinuousScaler`]: min-max to [-1, 1] with clipping (width 1 per component)
//! - [`OrdinalEncoder`]: rank in a declared ascending order (width 1)
//! - [`DirichletEncoder`]: gamma posterior embeddings (width = topics, +1 for `embed`)
//!
//! Each fitted transformer can also draw raw values from its support
//! ([`FittedTransformer::sample_raw`]); encoding those samples gives synthetic
//! conditions.
//!
//! # Example
//!
//! ```ignore
//! use conditioner_rs::preprocessing::{ContinuousScaler, FittedTransformer, RawColumn, Transformer};
//!
//! let fitted = ContinuousScaler::new().fit(&RawColumn::scalar(&[3.0, 9.0, 27.0]))?;
//! let scaled = fitted.transform(&RawColumn::scalar(&[15.0]))?;
//!
//! fitted.save_to_file("temp_min.bin")?;
//! ```

pub mod column;
pub mod cyclical;
pub mod dirichlet;
pub mod encoding;
pub mod scaling;
pub mod traits;

pub use column::{ConditionSet, Level, RawColumn};
pub use cyclical::{CircularEncoder, CircularEncoderParams, FittedCircularEncoder};
pub use dirichlet::{
    DirichletEncoder, DirichletEncoderParams, DirichletStyle, FittedDirichletEncoder,
};
pub use encoding::{
    CategoricalEncoder, CategoricalEncoderParams, FittedCategoricalEncoder, FittedOrdinalEncoder,
    OrdinalEncoder, OrdinalEncoderParams,
};
pub use scaling::{
    ContinuousScaler, ContinuousScalerConfig, ContinuousScalerParams, FittedContinuousScaler,
};
pub use traits::{FittedTransformer, Transformer};
