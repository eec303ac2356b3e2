//! Serialization of fitted transformer parameters.
//!
//! Fitted transformers expose their learned state as plain parameter structs
//! (`Vec<f64>`, category lists, scalars). This module turns those structs into
//! bytes and back, independently of the transformer that produced them.

use std::error::Error;

/// A trait for parameter representations that can be serialized to and from bytes.
///
/// Implementors should contain only plain data, never RNG handles or views.
pub trait SerializableParams: Sized {
    /// The error type returned during (de)serialization.
    type Error: Error + Send + Sync + 'static;

    /// Serialize the parameters into a byte buffer.
    fn to_bytes(&self) -> Result<Vec<u8>, Self::Error>;

    /// Deserialize the parameters from a byte buffer.
    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error>;
}

impl<T> SerializableParams for T
where
    T: serde::Serialize + for<'de> serde::Deserialize<'de>,
{
    type Error = bincode::Error;

    fn to_bytes(&self) -> Result<Vec<u8>, Self::Error> {
        bincode::serialize(self)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error> {
        bincode::deserialize(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Bounds {
        low: Vec<f64>,
        high: Vec<f64>,
    }

    #[test]
    fn test_params_bytes_round_trip() {
        let params = Bounds {
            low: vec![-3.5, 0.0],
            high: vec![12.0, 7.25],
        };
        let bytes = params.to_bytes().unwrap();
        assert_eq!(Bounds::from_bytes(&bytes).unwrap(), params);
    }

    #[test]
    fn test_params_from_truncated_bytes() {
        let params = Bounds {
            low: vec![1.0],
            high: vec![2.0],
        };
        let bytes = params.to_bytes().unwrap();
        assert!(Bounds::from_bytes(&bytes[..bytes.len() - 3]).is_err());
    }
}
