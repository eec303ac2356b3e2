//! Condition declarations: tag, variable type and typed support.

use crate::conditioner::step::ConditionStep;
use crate::error::{ConditionError, Result};
use crate::preprocessing::{
    CategoricalEncoder, CircularEncoder, ContinuousScaler, DirichletEncoder, DirichletStyle, Level,
    OrdinalEncoder,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The five supported variable types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableType {
    Circular,
    Categorical,
    Continuous,
    Ordinal,
    Dirichlet,
}

impl VariableType {
    /// Short name used in declaration bundles.
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableType::Circular => "circ",
            VariableType::Categorical => "cat",
            VariableType::Continuous => "cont",
            VariableType::Ordinal => "ord",
            VariableType::Dirichlet => "dir",
        }
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VariableType {
    type Err = ConditionError;

    /// Accepts both the short (`circ`) and long (`circular`) names.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "circ" | "circular" => Ok(VariableType::Circular),
            "cat" | "categorical" => Ok(VariableType::Categorical),
            "cont" | "continuous" => Ok(VariableType::Continuous),
            "ord" | "ordinal" => Ok(VariableType::Ordinal),
            "dir" | "dirichlet" => Ok(VariableType::Dirichlet),
            other => Err(ConditionError::UnknownType(other.to_string())),
        }
    }
}

/// Untyped support descriptor, as found in declaration bundles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Support {
    /// A list of levels (cycle values, categories, ordered ranks).
    Levels(Vec<Level>),
    /// A closed real interval (value range, document length bounds).
    Interval { low: f64, high: f64 },
}

/// Variable type together with its typed support.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ConditionKind {
    /// Cyclical integers in `[min, max]`.
    Circular { min: i64, max: i64 },
    /// Unordered categories. The encoder learns its levels from the data;
    /// `levels` records the declared domain.
    Categorical { levels: Vec<Level> },
    /// Real values. The scaler learns its range from the data; `low`/`high`
    /// record the declared range.
    Continuous { low: f64, high: f64 },
    /// Ranked categories in ascending order.
    Ordinal { categories: Vec<Level> },
    /// Gamma posterior vectors; bounds on the sampled document length.
    Dirichlet { min_length: f64, max_length: f64 },
}

impl ConditionKind {
    pub fn variable_type(&self) -> VariableType {
        match self {
            ConditionKind::Circular { .. } => VariableType::Circular,
            ConditionKind::Categorical { .. } => VariableType::Categorical,
            ConditionKind::Continuous { .. } => VariableType::Continuous,
            ConditionKind::Ordinal { .. } => VariableType::Ordinal,
            ConditionKind::Dirichlet { .. } => VariableType::Dirichlet,
        }
    }

    /// Parse a type name and attach its support.
    ///
    /// # Errors
    /// [`ConditionError::UnknownType`] for unrecognised names,
    /// [`ConditionError::InvalidSupport`] when the support does not fit the type.
    pub fn parse(type_name: &str, support: Support) -> Result<Self> {
        Self::from_support(type_name.parse()?, support)
    }

    /// Attach an untyped support to a variable type.
    pub fn from_support(ty: VariableType, support: Support) -> Result<Self> {
        let invalid = |message: String| ConditionError::InvalidSupport {
            kind: ty.as_str(),
            message,
        };

        match (ty, support) {
            (VariableType::Circular, Support::Levels(levels)) => {
                let mut values = Vec::with_capacity(levels.len());
                for level in &levels {
                    match level {
                        Level::Int(v) => values.push(*v),
                        Level::Label(_) => {
                            return Err(invalid(format!("cycle value {} is not an integer", level)))
                        }
                    }
                }
                match (values.iter().min(), values.iter().max()) {
                    (Some(&min), Some(&max)) => Ok(ConditionKind::Circular { min, max }),
                    _ => Err(invalid("empty cycle".to_string())),
                }
            }
            (VariableType::Circular, Support::Interval { low, high }) => {
                if low.fract() != 0.0 || high.fract() != 0.0 || high < low {
                    return Err(invalid(format!("[{}, {}] is not an integer cycle", low, high)));
                }
                Ok(ConditionKind::Circular {
                    min: low as i64,
                    max: high as i64,
                })
            }
            (VariableType::Categorical, Support::Levels(levels)) => {
                Ok(ConditionKind::Categorical { levels })
            }
            (VariableType::Continuous, Support::Interval { low, high }) => {
                if !(low <= high) {
                    return Err(invalid(format!("[{}, {}] is not a range", low, high)));
                }
                Ok(ConditionKind::Continuous { low, high })
            }
            (VariableType::Ordinal, Support::Levels(categories)) => {
                if categories.is_empty() {
                    return Err(invalid("no categories declared".to_string()));
                }
                Ok(ConditionKind::Ordinal { categories })
            }
            (VariableType::Dirichlet, Support::Interval { low, high }) => {
                Ok(ConditionKind::Dirichlet {
                    min_length: low,
                    max_length: high,
                })
            }
            (_, Support::Levels(_)) => Err(invalid("expected an interval".to_string())),
            (_, Support::Interval { .. }) => Err(invalid("expected a list of levels".to_string())),
        }
    }

    /// Build the unfitted transformer for this kind.
    pub(crate) fn step(&self, dirichlet_style: DirichletStyle) -> Result<ConditionStep> {
        Ok(match self {
            ConditionKind::Circular { min, max } => {
                ConditionStep::Circular(CircularEncoder::with_bounds(*min, *max)?)
            }
            ConditionKind::Categorical { .. } => {
                ConditionStep::Categorical(CategoricalEncoder::new())
            }
            ConditionKind::Continuous { .. } => ConditionStep::Continuous(ContinuousScaler::new()),
            ConditionKind::Ordinal { categories } => {
                ConditionStep::Ordinal(OrdinalEncoder::new(categories.clone())?)
            }
            ConditionKind::Dirichlet {
                min_length,
                max_length,
            } => ConditionStep::Dirichlet(
                DirichletEncoder::new(*min_length, *max_length)?.with_style(dirichlet_style),
            ),
        })
    }
}

/// One declared condition variable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConditionDeclaration {
    /// Unique tag; also the key of the raw column in a condition set.
    pub tag: String,
    pub kind: ConditionKind,
}

impl ConditionDeclaration {
    pub fn new(tag: impl Into<String>, kind: ConditionKind) -> Self {
        Self {
            tag: tag.into(),
            kind,
        }
    }

    pub fn variable_type(&self) -> VariableType {
        self.kind.variable_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_type_names() {
        for (name, ty) in [
            ("circ", VariableType::Circular),
            ("circular", VariableType::Circular),
            ("cat", VariableType::Categorical),
            ("cont", VariableType::Continuous),
            ("ord", VariableType::Ordinal),
            ("dirichlet", VariableType::Dirichlet),
        ] {
            assert_eq!(name.parse::<VariableType>().unwrap(), ty);
        }
    }

    #[test]
    fn test_unknown_type_name() {
        let result = "spline".parse::<VariableType>();
        assert!(matches!(result, Err(ConditionError::UnknownType(name)) if name == "spline"));
    }

    #[test]
    fn test_parse_circular_from_observed_values() {
        let kind = ConditionKind::parse(
            "circ",
            Support::Levels(vec![3.into(), 1.into(), 12.into()]),
        )
        .unwrap();
        assert_eq!(kind, ConditionKind::Circular { min: 1, max: 12 });
    }

    #[test]
    fn test_parse_circular_rejects_labels() {
        let result = ConditionKind::parse("circ", Support::Levels(vec!["jan".into()]));
        assert!(matches!(result, Err(ConditionError::InvalidSupport { .. })));
    }

    #[test]
    fn test_parse_continuous_interval() {
        let kind = ConditionKind::parse(
            "cont",
            Support::Interval {
                low: -4.5,
                high: 31.0,
            },
        )
        .unwrap();
        assert_eq!(kind.variable_type(), VariableType::Continuous);
    }

    #[test]
    fn test_parse_mismatched_support() {
        let result = ConditionKind::parse("ord", Support::Interval { low: 0.0, high: 1.0 });
        assert!(matches!(result, Err(ConditionError::InvalidSupport { .. })));
    }

    #[test]
    fn test_parse_unknown_type() {
        let result = ConditionKind::parse("hyper", Support::Levels(vec![]));
        assert!(matches!(result, Err(ConditionError::UnknownType(_))));
    }

    #[test]
    fn test_declaration_type() {
        let decl = ConditionDeclaration::new(
            "is_weekend",
            ConditionKind::Categorical {
                levels: vec![0.into(), 1.into()],
            },
        );
        assert_eq!(decl.variable_type(), VariableType::Categorical);
        assert_eq!(decl.tag, "is_weekend");
    }
}
