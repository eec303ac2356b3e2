//! # conditioner-rs
//!
//! Encodes heterogeneous covariates (calendar features, weather, user
//! embeddings) into a single real-valued conditioning matrix for a conditional
//! generative model, and samples synthetic conditions from the learned supports.
//!
//! ## Core Design Principles
//!
//! - **Fit / Fitted Split**: every transformer learns from data into a separate
//!   fitted type that owns only the state needed to encode, decode and sample.
//! - **Closed Dispatch**: variable types are an enum, not strings; an unknown type
//!   or tag is rejected when parsed.
//! - **Explicit Randomness**: every random operation takes an `rand::Rng`; there is
//!   no process-wide seed.
//! - **Versioned Persistence**: a conditioner is saved as one bincode blob carrying
//!   its declarations, learned parameters and a format version.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use conditioner_rs::assembly::{prepare_conditions, AssemblyContext};
//! use conditioner_rs::conditioner::Conditioner;
//!
//! let ctx = AssemblyContext::new().with_dates(&dates);
//! let (declarations, data) = prepare_conditions(&["months", "is_weekend"], &ctx)?;
//!
//! let conditioner = Conditioner::new(declarations, &data)?;
//! let encoded = conditioner.transform(&data)?;          // (n_days, 4)
//!
//! let (synthetic, raw) = conditioner.get_random_conditions_seeded(16, Some(42))?;
//! conditioner.save("models/run_1")?;
//! ```
//!
//! ## Module Structure
//!
//! - `preprocessing`: Per-type transformers and raw column types
//! - `conditioner`: Declarations, the fitted conditioner and its persistence
//! - `assembly`: Building declarations and data from named tags
//! - `config`: JSON configuration of an assembly run
//! - `serialization`: Byte encoding of learned parameters
//! - `error`: The crate error type

/// Building condition declarations and data from named tags.
pub mod assembly;

/// Declaring, fitting and persisting a set of condition transformers.
pub mod conditioner;

/// JSON configuration for condition assembly.
pub mod config;

/// Error type and result alias.
pub mod error;

/// Per-type condition transformers.
pub mod preprocessing;

/// Byte encoding of learned parameters.
pub mod serialization;

pub use assembly::{
    build_conditioner, prepare_conditions, AssemblyContext, ConditionTag, UserEncoder,
    UserEncoderFactory,
};
pub use conditioner::{ConditionDeclaration, ConditionKind, Conditioner, Support, VariableType};
pub use config::{ConditionsConfig, UserEmbeddingConfig};
pub use error::{ConditionError, Result};
pub use preprocessing::{ConditionSet, DirichletStyle, Level, RawColumn};
