//! Encoders for cyclical conditions (month, weekday).

mod circular;

pub use circular::{CircularEncoder, CircularEncoderParams, FittedCircularEncoder};
