//! Declaring, fitting and persisting a set of condition transformers.
//!
//! A [`Conditioner`] owns one fitted transformer per declared tag and encodes a
//! [`ConditionSet`](crate::preprocessing::ConditionSet) into a single matrix by
//! concatenating the per-tag encodings in declaration order.

mod conditioner;
mod declaration;
mod step;

pub use conditioner::{Conditioner, ConditionerParams, CONDITIONER_FILE, FORMAT_VERSION};
pub use declaration::{ConditionDeclaration, ConditionKind, Support, VariableType};
pub use step::{ConditionStep, FittedConditionStep, StepParams};
