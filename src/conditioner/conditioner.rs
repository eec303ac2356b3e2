//! The conditioner: an ordered set of fitted per-condition transformers.

use crate::conditioner::declaration::{ConditionDeclaration, ConditionKind};
use crate::conditioner::step::{FittedConditionStep, StepParams};
use crate::error::{ConditionError, Result};
use crate::preprocessing::{ConditionSet, DirichletStyle, RawColumn};
use crate::serialization::SerializableParams;
use ndarray::{concatenate, s, Array2, ArrayView2, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name of the persisted conditioner inside its directory.
pub const CONDITIONER_FILE: &str = "conditioner.bin";

/// Version written into every persisted conditioner.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Clone, Debug)]
struct ConditionEntry {
    declaration: ConditionDeclaration,
    step: FittedConditionStep,
}

/// Serializable state of a fitted [`Conditioner`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConditionerParams {
    pub version: u32,
    pub dirichlet_style: DirichletStyle,
    pub entries: Vec<(ConditionDeclaration, StepParams)>,
}

/// Encodes heterogeneous condition variables into one real-valued matrix.
///
/// Conditions are kept in declaration order; the encoded matrix is the
/// column-wise concatenation of each transformer's output in that order, so
/// [`Conditioner::cond_dim`] is always the sum of the transformer widths.
///
/// # Example
/// ```ignore
/// use conditioner_rs::conditioner::{ConditionDeclaration, ConditionKind, Conditioner};
/// use conditioner_rs::preprocessing::{ConditionSet, RawColumn};
///
/// let data = ConditionSet::new()
///     .with("months", RawColumn::levels([1, 6, 12]))
///     .with("is_weekend", RawColumn::levels([0, 1, 0]));
/// let decls = vec![
///     ConditionDeclaration::new("months", ConditionKind::Circular { min: 1, max: 12 }),
///     ConditionDeclaration::new("is_weekend", ConditionKind::Categorical { levels: vec![0.into(), 1.into()] }),
/// ];
/// let conditioner = Conditioner::new(decls, &data)?;
/// assert_eq!(conditioner.cond_dim(), 4);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Conditioner {
    entries: Vec<ConditionEntry>,
    dirichlet_style: DirichletStyle,
}

impl Conditioner {
    /// Declare and fit every condition in `declarations` against `data`.
    pub fn new(declarations: Vec<ConditionDeclaration>, data: &ConditionSet) -> Result<Self> {
        let mut conditioner = Self::empty();
        conditioner.init_transformers(declarations, data)?;
        Ok(conditioner)
    }

    /// A conditioner with no conditions.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Style used by Dirichlet conditions declared after this call.
    pub fn with_dirichlet_style(mut self, style: DirichletStyle) -> Self {
        self.dirichlet_style = style;
        self
    }

    /// Fit and register a batch of declarations.
    ///
    /// Either every declaration is registered or none is. All declared columns
    /// must share one row count.
    pub fn init_transformers(
        &mut self,
        declarations: Vec<ConditionDeclaration>,
        data: &ConditionSet,
    ) -> Result<()> {
        let mut n_rows = None;
        for declaration in &declarations {
            let column = data.require(&declaration.tag)?;
            let expected = *n_rows.get_or_insert(column.n_rows());
            if column.n_rows() != expected {
                return Err(ConditionError::RowMismatch {
                    tag: declaration.tag.clone(),
                    expected,
                    got: column.n_rows(),
                });
            }
        }

        let mut staged = self.clone();
        for declaration in declarations {
            let column = data.require(&declaration.tag)?;
            staged.add_condition(declaration.tag, declaration.kind, column)?;
        }
        *self = staged;
        Ok(())
    }

    /// Fit a transformer for `tag` on `data` and append it.
    ///
    /// # Errors
    /// - [`ConditionError::DuplicateTag`] if `tag` is already declared
    /// - any error the transformer raises while fitting
    pub fn add_condition(
        &mut self,
        tag: impl Into<String>,
        kind: ConditionKind,
        data: &RawColumn,
    ) -> Result<()> {
        let tag = tag.into();
        if self.entries.iter().any(|e| e.declaration.tag == tag) {
            return Err(ConditionError::DuplicateTag(tag));
        }

        let step = kind.step(self.dirichlet_style)?.fit(data)?;
        debug!(
            tag = %tag,
            kind = %kind.variable_type(),
            width = step.n_features_out(),
            "fitted condition"
        );

        self.entries.push(ConditionEntry {
            declaration: ConditionDeclaration::new(tag, kind),
            step,
        });
        Ok(())
    }

    /// Width of the encoded condition vector.
    pub fn cond_dim(&self) -> usize {
        self.entries.iter().map(|e| e.step.n_features_out()).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True once at least one condition has been fitted.
    pub fn is_ready(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn dirichlet_style(&self) -> DirichletStyle {
        self.dirichlet_style
    }

    pub fn declarations(&self) -> impl Iterator<Item = &ConditionDeclaration> {
        self.entries.iter().map(|e| &e.declaration)
    }

    /// Tags in declaration order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.declaration.tag.as_str())
    }

    pub fn step(&self, tag: &str) -> Option<&FittedConditionStep> {
        self.entries
            .iter()
            .find(|e| e.declaration.tag == tag)
            .map(|e| &e.step)
    }

    /// Transformer name and output width per tag, in declaration order.
    pub fn step_names(&self) -> Vec<(&str, &'static str, usize)> {
        self.entries
            .iter()
            .map(|e| {
                (
                    e.declaration.tag.as_str(),
                    e.step.step_name(),
                    e.step.n_features_out(),
                )
            })
            .collect()
    }

    /// Change the style of an already fitted Dirichlet condition.
    pub fn set_dirichlet_style(&mut self, tag: &str, style: DirichletStyle) -> Result<()> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.declaration.tag == tag)
            .ok_or_else(|| ConditionError::UnknownTag(tag.to_string()))?;
        let encoder = entry.step.as_dirichlet_mut().ok_or_else(|| {
            ConditionError::InvalidParameter(format!("condition '{}' is not a Dirichlet", tag))
        })?;
        encoder.set_style(style);
        Ok(())
    }

    /// Encode every declared condition and concatenate the results.
    ///
    /// Stochastic encodings draw from the thread-local generator; use
    /// [`Conditioner::transform_with_rng`] for reproducible output.
    pub fn transform(&self, data: &ConditionSet) -> Result<Array2<f64>> {
        self.transform_with_rng(data, &mut rand::thread_rng())
    }

    /// Encode every declared condition, drawing randomness from `rng`.
    ///
    /// Columns in `data` that are not declared are ignored.
    ///
    /// # Errors
    /// - [`ConditionError::EmptyData`] if no condition is declared
    /// - [`ConditionError::MissingColumn`] if a declared tag is absent
    /// - [`ConditionError::RowMismatch`] if columns differ in row count
    pub fn transform_with_rng<R: Rng + ?Sized>(
        &self,
        data: &ConditionSet,
        rng: &mut R,
    ) -> Result<Array2<f64>> {
        if self.entries.is_empty() {
            return Err(ConditionError::EmptyData(
                "conditioner has no conditions".to_string(),
            ));
        }

        let mut n_rows = None;
        let mut blocks = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let tag = &entry.declaration.tag;
            let column = data.require(tag)?;
            let expected = *n_rows.get_or_insert(column.n_rows());
            if column.n_rows() != expected {
                return Err(ConditionError::RowMismatch {
                    tag: tag.clone(),
                    expected,
                    got: column.n_rows(),
                });
            }
            blocks.push(entry.step.transform_with_rng(column, rng)?);
        }

        let views: Vec<ArrayView2<f64>> = blocks.iter().map(|b| b.view()).collect();
        concatenate(Axis(1), &views).map_err(|e| ConditionError::NumericalError(e.to_string()))
    }

    /// Split an encoded matrix by condition and decode each block.
    pub fn inverse_transform(&self, encoded: &Array2<f64>) -> Result<ConditionSet> {
        let expected = self.cond_dim();
        if encoded.ncols() != expected {
            return Err(ConditionError::FeatureMismatch {
                expected_features: expected,
                got_features: encoded.ncols(),
            });
        }

        let mut out = ConditionSet::new();
        let mut offset = 0;
        for entry in &self.entries {
            let width = entry.step.n_features_out();
            let block = encoded.slice(s![.., offset..offset + width]).to_owned();
            out.insert(entry.declaration.tag.clone(), entry.step.inverse_transform(&block)?);
            offset += width;
        }
        Ok(out)
    }

    /// Draw `n` synthetic raw conditions from each support and encode them.
    ///
    /// Returns the encoded matrix `(n, cond_dim)` together with the raw values.
    pub fn get_random_conditions<R: Rng + ?Sized>(
        &self,
        n: usize,
        rng: &mut R,
    ) -> Result<(Array2<f64>, ConditionSet)> {
        let mut raw = ConditionSet::new();
        for entry in &self.entries {
            raw.insert(entry.declaration.tag.clone(), entry.step.sample_raw(n, rng)?);
        }
        let encoded = self.transform_with_rng(&raw, rng)?;
        Ok((encoded, raw))
    }

    /// [`Conditioner::get_random_conditions`] with a ChaCha20 generator built
    /// from `seed`, or from OS entropy when `seed` is `None`.
    pub fn get_random_conditions_seeded(
        &self,
        n: usize,
        seed: Option<u64>,
    ) -> Result<(Array2<f64>, ConditionSet)> {
        let mut rng = match seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_entropy(),
        };
        self.get_random_conditions(n, &mut rng)
    }

    pub fn extract_params(&self) -> ConditionerParams {
        ConditionerParams {
            version: FORMAT_VERSION,
            dirichlet_style: self.dirichlet_style,
            entries: self
                .entries
                .iter()
                .map(|e| (e.declaration.clone(), e.step.extract_params()))
                .collect(),
        }
    }

    pub fn from_params(params: ConditionerParams) -> Result<Self> {
        if params.version != FORMAT_VERSION {
            return Err(ConditionError::IncompatibleFormat {
                expected: FORMAT_VERSION,
                found: params.version,
            });
        }

        let entries = params
            .entries
            .into_iter()
            .map(|(declaration, step)| {
                if declaration.variable_type() != step.variable_type() {
                    return Err(ConditionError::Serialization(format!(
                        "condition '{}' is declared {} but stores {} parameters",
                        declaration.tag,
                        declaration.variable_type(),
                        step.variable_type()
                    )));
                }
                Ok(ConditionEntry {
                    declaration,
                    step: FittedConditionStep::from_params(step)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            entries,
            dirichlet_style: params.dirichlet_style,
        })
    }

    /// Persist to `<dir>/conditioner.bin`, creating `dir` if needed.
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(CONDITIONER_FILE);

        let bytes = self.extract_params().to_bytes()?;
        std::fs::write(&path, bytes)?;

        info!(
            path = %path.display(),
            conditions = self.len(),
            cond_dim = self.cond_dim(),
            "saved conditioner"
        );
        Ok(path)
    }

    /// Restore a conditioner written by [`Conditioner::save`].
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let path = dir.as_ref().join(CONDITIONER_FILE);
        let bytes = std::fs::read(&path)?;
        let conditioner = Self::from_params(ConditionerParams::from_bytes(&bytes)?)?;

        info!(
            path = %path.display(),
            conditions = conditioner.len(),
            cond_dim = conditioner.cond_dim(),
            "loaded conditioner"
        );
        Ok(conditioner)
    }
}
