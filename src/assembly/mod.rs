//! Assembling condition declarations and raw data from named tags.
//!
//! [`prepare_conditions`] turns a list of tags such as `["months", "temperature"]`
//! into declarations plus a [`ConditionSet`] ready for
//! [`Conditioner::new`](crate::conditioner::Conditioner::new). Each tag pulls
//! what it needs from an [`AssemblyContext`]:
//!
//! | Tag             | Needs                                   | Declares                      |
//! |-----------------|-----------------------------------------|-------------------------------|
//! | `months`        | dates                                   | `months` (circular)           |
//! | `weekdays`      | dates                                   | `weekdays` (circular)         |
//! | `is_weekend`    | dates                                   | `is_weekend` (categorical)    |
//! | `temperature`   | dates, dataset path                     | `temp_min`, `temp_max_delta`  |
//! | `precipitation` | dates, dataset path                     | `precipitation_level` (ord)   |
//! | `users`         | observations, dataset path, user config | `users` (dirichlet)           |

pub mod calendar;
pub mod users;
pub mod weather;

use crate::conditioner::{ConditionDeclaration, Conditioner};
use crate::config::{ConditionsConfig, UserEmbeddingConfig};
use crate::error::{ConditionError, Result};
use crate::preprocessing::{ConditionSet, RawColumn};
use chrono::NaiveDate;
use ndarray::Array3;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

pub use users::{find_matching_model, UserEncoder, UserEncoderFactory};

/// Recognised condition tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConditionTag {
    Months,
    Weekdays,
    IsWeekend,
    Temperature,
    Precipitation,
    Users,
}

impl ConditionTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionTag::Months => "months",
            ConditionTag::Weekdays => "weekdays",
            ConditionTag::IsWeekend => "is_weekend",
            ConditionTag::Temperature => "temperature",
            ConditionTag::Precipitation => "precipitation",
            ConditionTag::Users => "users",
        }
    }
}

impl fmt::Display for ConditionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConditionTag {
    type Err = ConditionError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "months" => Ok(ConditionTag::Months),
            "weekdays" => Ok(ConditionTag::Weekdays),
            "is_weekend" => Ok(ConditionTag::IsWeekend),
            "temperature" => Ok(ConditionTag::Temperature),
            "precipitation" => Ok(ConditionTag::Precipitation),
            "users" => Ok(ConditionTag::Users),
            other => Err(ConditionError::UnknownTag(other.to_string())),
        }
    }
}

/// Inputs available to condition assembly. Every field is optional; a tag that
/// needs an absent input fails with [`ConditionError::MissingArgument`].
#[derive(Clone, Default)]
pub struct AssemblyContext<'a> {
    dates: Option<&'a [NaiveDate]>,
    dataset_path: Option<&'a Path>,
    data: Option<&'a Array3<f64>>,
    user_embedding: Option<&'a UserEmbeddingConfig>,
    descriptor: Option<&'a Value>,
    user_factory: Option<&'a dyn UserEncoderFactory>,
}

impl<'a> AssemblyContext<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// One date per observation row.
    pub fn with_dates(mut self, dates: &'a [NaiveDate]) -> Self {
        self.dates = Some(dates);
        self
    }

    pub fn with_dataset_path(mut self, path: &'a Path) -> Self {
        self.dataset_path = Some(path);
        self
    }

    /// Observation tensor shaped `(users, days, features)`.
    pub fn with_data(mut self, data: &'a Array3<f64>) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_user_embedding(mut self, config: &'a UserEmbeddingConfig) -> Self {
        self.user_embedding = Some(config);
        self
    }

    /// Descriptor identifying the training configuration of a user model.
    pub fn with_descriptor(mut self, descriptor: &'a Value) -> Self {
        self.descriptor = Some(descriptor);
        self
    }

    pub fn with_user_factory(mut self, factory: &'a dyn UserEncoderFactory) -> Self {
        self.user_factory = Some(factory);
        self
    }

    /// Fill the dataset path and user config from `config` where unset.
    pub fn or_config(mut self, config: &'a ConditionsConfig) -> Self {
        if self.dataset_path.is_none() {
            self.dataset_path = config.dataset_path.as_deref();
        }
        if self.user_embedding.is_none() {
            self.user_embedding = config.user_embedding.as_ref();
        }
        self
    }

    fn dates(&self) -> Result<&'a [NaiveDate]> {
        match self.dates {
            Some(dates) if dates.is_empty() => {
                Err(ConditionError::EmptyData("no dates provided".to_string()))
            }
            Some(dates) => Ok(dates),
            None => Err(ConditionError::MissingArgument("dates")),
        }
    }

    fn dataset_path(&self) -> Result<&'a Path> {
        self.dataset_path
            .ok_or(ConditionError::MissingArgument("dataset path"))
    }
}

impl fmt::Debug for AssemblyContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssemblyContext")
            .field("dates", &self.dates.map(|d| d.len()))
            .field("dataset_path", &self.dataset_path)
            .field("data", &self.data.map(|d| d.dim()))
            .field("user_embedding", &self.user_embedding)
            .field("descriptor", &self.descriptor)
            .field("user_factory", &self.user_factory.is_some())
            .finish()
    }
}

/// Build declarations and raw columns for each tag, in order.
///
/// # Errors
/// - [`ConditionError::UnknownTag`] for unrecognised tags
/// - [`ConditionError::MissingArgument`] when a tag's inputs are absent
/// - I/O, CSV and user model errors from the underlying sources
pub fn prepare_conditions<S: AsRef<str>>(
    tags: &[S],
    ctx: &AssemblyContext<'_>,
) -> Result<(Vec<ConditionDeclaration>, ConditionSet)> {
    let tags = tags
        .iter()
        .map(|t| t.as_ref().parse())
        .collect::<Result<Vec<ConditionTag>>>()?;

    let mut declarations = Vec::new();
    let mut set = ConditionSet::new();
    let mut push = |(declaration, column): (ConditionDeclaration, RawColumn)| {
        set.insert(declaration.tag.clone(), column);
        declarations.push(declaration);
    };

    for tag in tags {
        debug!(tag = %tag, "assembling condition");
        match tag {
            ConditionTag::Months => push(calendar::months(ctx.dates()?)?),
            ConditionTag::Weekdays => push(calendar::weekdays(ctx.dates()?)?),
            ConditionTag::IsWeekend => push(calendar::is_weekend(ctx.dates()?)?),
            ConditionTag::Temperature => {
                let path = ctx.dataset_path()?;
                for condition in weather::temperature(path, ctx.dates()?)? {
                    push(condition);
                }
            }
            ConditionTag::Precipitation => {
                let path = ctx.dataset_path()?;
                push(weather::precipitation(path, ctx.dates()?)?);
            }
            ConditionTag::Users => {
                let path = ctx.dataset_path()?;
                let config = ctx
                    .user_embedding
                    .ok_or(ConditionError::MissingArgument("user embedding config"))?;
                let data = ctx
                    .data
                    .ok_or(ConditionError::MissingArgument("observation data"))?;
                let descriptor = ctx
                    .descriptor
                    .ok_or(ConditionError::MissingArgument("config descriptor"))?;
                let factory = ctx
                    .user_factory
                    .ok_or(ConditionError::MissingArgument("user encoder factory"))?;
                push(users::users(data, path, config, descriptor, factory)?);
            }
        }
    }

    Ok((declarations, set))
}

/// Assemble the configured tags and fit a conditioner on them.
///
/// Returns the fitted conditioner with the raw data it was fitted on.
pub fn build_conditioner(
    config: &ConditionsConfig,
    ctx: &AssemblyContext<'_>,
) -> Result<(Conditioner, ConditionSet)> {
    let ctx = ctx.clone().or_config(config);
    let (declarations, data) = prepare_conditions(&config.tags, &ctx)?;
    let mut conditioner = Conditioner::empty().with_dirichlet_style(config.dirichlet_style);
    conditioner.init_transformers(declarations, &data)?;
    Ok((conditioner, data))
}
