//! Categorical condition encoders.
//!
//! # Available Encoders
//!
//! ## CategoricalEncoder
//! One-hot encoding over the levels seen at fit time (flags such as `is_weekend`).
//!
//! ```ignore
//! // Input: [[0], [1], [0]]
//! // Output: [[1,0], [0,1], [1,0]]
//! ```
//!
//! ## OrdinalEncoder
//! Maps levels to their rank in a declared ascending order (precipitation level).

mod one_hot;
mod ordinal;

pub use one_hot::{CategoricalEncoder, CategoricalEncoderParams, FittedCategoricalEncoder};
pub use ordinal::{FittedOrdinalEncoder, OrdinalEncoder, OrdinalEncoderParams};

