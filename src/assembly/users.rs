//! User embedding condition backed by a pluggable topic model.
//!
//! Trained models live under `<dataset>/user_encoding_models/model_<n>/`, each
//! with a `user_config_dict.json` holding the configuration descriptor it was
//! trained for and a `user_gamma.bin` holding the per-user gamma matrix. A model
//! whose descriptor equals the requested one is reused instead of retrained.

use crate::conditioner::{ConditionDeclaration, ConditionKind};
use crate::config::UserEmbeddingConfig;
use crate::error::{ConditionError, Result};
use crate::preprocessing::RawColumn;
use ndarray::{Array2, Array3, Axis};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::info;

pub const USER_MODELS_DIR: &str = "user_encoding_models";
pub const USER_CONFIG_FILE: &str = "user_config_dict.json";
pub const USER_GAMMA_FILE: &str = "user_gamma.bin";

/// A model that embeds each user's observations as topic gamma parameters.
pub trait UserEncoder {
    /// Train on a `(users, days, features)` tensor.
    fn fit(&mut self, data: &Array3<f64>, fit_config: &Value) -> Result<()>;

    /// Gamma parameters, one row per user.
    fn transform(&self, data: &Array3<f64>) -> Result<Array2<f64>>;

    /// Longest document length seen during training.
    fn max_doc_length(&self) -> f64;

    /// Persist the model into `dir`.
    fn save(&self, dir: &Path) -> Result<()>;
}

/// Creates and restores [`UserEncoder`]s.
pub trait UserEncoderFactory {
    fn create(&self, model_config: &Value) -> Result<Box<dyn UserEncoder>>;

    fn load(&self, dir: &Path) -> Result<Box<dyn UserEncoder>>;
}

/// Find a model directory under `base_dir` whose stored descriptor equals
/// `descriptor`. Directories are searched recursively in name order.
pub fn find_matching_model(base_dir: &Path, descriptor: &Value) -> Result<Option<PathBuf>> {
    if !base_dir.is_dir() {
        return Ok(None);
    }

    let config_path = base_dir.join(USER_CONFIG_FILE);
    if config_path.is_file() {
        let stored: Value = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;
        if &stored == descriptor {
            return Ok(Some(base_dir.to_path_buf()));
        }
    }

    let mut subdirs = Vec::new();
    for entry in std::fs::read_dir(base_dir)? {
        let path = entry?.path();
        if path.is_dir() {
            subdirs.push(path);
        }
    }
    subdirs.sort();

    for dir in subdirs {
        if let Some(found) = find_matching_model(&dir, descriptor)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

/// `model_<n>` one past the highest existing index, so removed models never
/// cause an existing directory to be reused.
fn next_model_dir(base_dir: &Path) -> Result<PathBuf> {
    let mut highest = 0u64;
    for entry in std::fs::read_dir(base_dir)? {
        let name = entry?.file_name();
        let index = name
            .to_str()
            .and_then(|n| n.strip_prefix("model_"))
            .and_then(|n| n.parse::<u64>().ok());
        if let Some(index) = index {
            highest = highest.max(index);
        }
    }
    Ok(base_dir.join(format!("model_{}", highest + 1)))
}

fn read_gamma(dir: &Path) -> Result<Array2<f64>> {
    let bytes = std::fs::read(dir.join(USER_GAMMA_FILE))?;
    Ok(bincode::deserialize(&bytes)?)
}

fn write_gamma(dir: &Path, gamma: &Array2<f64>) -> Result<()> {
    std::fs::write(dir.join(USER_GAMMA_FILE), bincode::serialize(gamma)?)?;
    Ok(())
}

/// Dirichlet `users` condition: each user's gamma row repeated once per day.
pub fn users(
    data: &Array3<f64>,
    dataset_path: &Path,
    config: &UserEmbeddingConfig,
    descriptor: &Value,
    factory: &dyn UserEncoderFactory,
) -> Result<(ConditionDeclaration, RawColumn)> {
    let (n_users, n_days, _) = data.dim();
    let base_dir = dataset_path.join(USER_MODELS_DIR);

    let (model, gamma) = match find_matching_model(&base_dir, descriptor)? {
        Some(dir) => {
            info!(dir = %dir.display(), "reusing matching user model");
            (factory.load(&dir)?, read_gamma(&dir)?)
        }
        None => {
            std::fs::create_dir_all(&base_dir)?;
            let dir = next_model_dir(&base_dir)?;
            info!(dir = %dir.display(), "no matching user model, training a new one");

            let mut model = factory.create(&config.model)?;
            model.fit(data, &config.fit)?;
            let gamma = model.transform(data)?;

            std::fs::create_dir_all(&dir)?;
            model.save(&dir)?;
            std::fs::write(
                dir.join(USER_CONFIG_FILE),
                serde_json::to_string_pretty(descriptor)?,
            )?;
            write_gamma(&dir, &gamma)?;
            (model, gamma)
        }
    };

    if gamma.nrows() != n_users {
        return Err(ConditionError::UserModel(format!(
            "gamma matrix has {} rows for {} users",
            gamma.nrows(),
            n_users
        )));
    }

    let rows: Vec<usize> = (0..n_users)
        .flat_map(|u| std::iter::repeat(u).take(n_days))
        .collect();
    let column = RawColumn::Numeric(gamma.select(Axis(0), &rows));

    let kind = ConditionKind::Dirichlet {
        min_length: config.doc_topic_prior()?,
        max_length: model.max_doc_length(),
    };
    Ok((ConditionDeclaration::new("users", kind), column))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use ndarray::{array, Array3};
    use serde_json::json;
    use std::cell::Cell;

    /// Gamma = per-user feature totals over days, plus one.
    #[derive(Clone, Default)]
    pub(crate) struct SumEncoder {
        max_len: f64,
    }

    impl UserEncoder for SumEncoder {
        fn fit(&mut self, data: &Array3<f64>, _fit_config: &Value) -> Result<()> {
            self.max_len = data
                .sum_axis(Axis(2))
                .sum_axis(Axis(1))
                .iter()
                .copied()
                .fold(0.0, f64::max);
            Ok(())
        }

        fn transform(&self, data: &Array3<f64>) -> Result<Array2<f64>> {
            Ok(data.sum_axis(Axis(1)) + 1.0)
        }

        fn max_doc_length(&self) -> f64 {
            self.max_len
        }

        fn save(&self, dir: &Path) -> Result<()> {
            std::fs::write(dir.join("max_len.txt"), self.max_len.to_string())?;
            Ok(())
        }
    }

    #[derive(Default)]
    pub(crate) struct SumFactory {
        pub(crate) created: Cell<usize>,
        pub(crate) loaded: Cell<usize>,
    }

    impl UserEncoderFactory for SumFactory {
        fn create(&self, _model_config: &Value) -> Result<Box<dyn UserEncoder>> {
            self.created.set(self.created.get() + 1);
            Ok(Box::new(SumEncoder::default()))
        }

        fn load(&self, dir: &Path) -> Result<Box<dyn UserEncoder>> {
            self.loaded.set(self.loaded.get() + 1);
            let text = std::fs::read_to_string(dir.join("max_len.txt"))?;
            let max_len = text
                .parse()
                .map_err(|_| ConditionError::UserModel(format!("bad max_len '{}'", text)))?;
            Ok(Box::new(SumEncoder { max_len }))
        }
    }

    pub(crate) fn observations() -> Array3<f64> {
        // 2 users, 3 days, 2 features
        array![
            [[1.0, 0.0], [2.0, 1.0], [0.0, 1.0]],
            [[0.0, 3.0], [1.0, 1.0], [4.0, 0.0]]
        ]
    }

    pub(crate) fn user_config() -> UserEmbeddingConfig {
        UserEmbeddingConfig::new(
            json!({"num_topics": 2}),
            json!({"lda": {"doc_topic_prior": 0.5}}),
        )
    }

    #[test]
    fn test_trains_and_repeats_rows_per_day() {
        let dir = tempfile::tempdir().unwrap();
        let factory = SumFactory::default();
        let descriptor = json!({"dataset": "toy", "topics": 2});

        let (decl, column) = users(
            &observations(),
            dir.path(),
            &user_config(),
            &descriptor,
            &factory,
        )
        .unwrap();

        assert_eq!(factory.created.get(), 1);
        assert_eq!(decl.tag, "users");
        assert_eq!(
            decl.kind,
            ConditionKind::Dirichlet {
                min_length: 0.5,
                max_length: 9.0
            }
        );
        assert_eq!(
            column,
            RawColumn::Numeric(array![
                [4.0, 3.0],
                [4.0, 3.0],
                [4.0, 3.0],
                [6.0, 5.0],
                [6.0, 5.0],
                [6.0, 5.0]
            ])
        );

        let model_dir = dir.path().join(USER_MODELS_DIR).join("model_1");
        assert!(model_dir.join(USER_CONFIG_FILE).is_file());
        assert!(model_dir.join(USER_GAMMA_FILE).is_file());
    }

    #[test]
    fn test_reuses_matching_model() {
        let dir = tempfile::tempdir().unwrap();
        let factory = SumFactory::default();
        let descriptor = json!({"dataset": "toy"});

        let first = users(&observations(), dir.path(), &user_config(), &descriptor, &factory)
            .unwrap();
        let second = users(&observations(), dir.path(), &user_config(), &descriptor, &factory)
            .unwrap();

        assert_eq!(factory.created.get(), 1);
        assert_eq!(factory.loaded.get(), 1);
        assert_eq!(first, second);
    }

    #[test]
    fn test_new_descriptor_gets_next_model_dir() {
        let dir = tempfile::tempdir().unwrap();
        let factory = SumFactory::default();

        users(&observations(), dir.path(), &user_config(), &json!({"v": 1}), &factory).unwrap();
        users(&observations(), dir.path(), &user_config(), &json!({"v": 2}), &factory).unwrap();

        let base = dir.path().join(USER_MODELS_DIR);
        assert_eq!(factory.created.get(), 2);
        assert!(base.join("model_2").join(USER_CONFIG_FILE).is_file());
        assert_eq!(
            find_matching_model(&base, &json!({"v": 2})).unwrap(),
            Some(base.join("model_2"))
        );
    }

    #[test]
    fn test_next_model_dir_skips_past_gaps() {
        let dir = tempfile::tempdir().unwrap();
        let factory = SumFactory::default();
        let base = dir.path().join(USER_MODELS_DIR);

        users(&observations(), dir.path(), &user_config(), &json!({"v": 1}), &factory).unwrap();
        users(&observations(), dir.path(), &user_config(), &json!({"v": 2}), &factory).unwrap();
        std::fs::remove_dir_all(base.join("model_1")).unwrap();
        std::fs::create_dir_all(base.join("scratch")).unwrap();

        users(&observations(), dir.path(), &user_config(), &json!({"v": 3}), &factory).unwrap();

        assert_eq!(factory.created.get(), 3);
        assert_eq!(
            find_matching_model(&base, &json!({"v": 2})).unwrap(),
            Some(base.join("model_2"))
        );
        assert_eq!(
            find_matching_model(&base, &json!({"v": 3})).unwrap(),
            Some(base.join("model_3"))
        );
    }

    #[test]
    fn test_find_matching_model_without_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let found = find_matching_model(&dir.path().join("absent"), &json!({})).unwrap();
        assert_eq!(found, None);
    }
}
