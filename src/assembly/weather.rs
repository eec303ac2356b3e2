//! Daily weather conditions read from the dataset directory.

use crate::conditioner::{ConditionDeclaration, ConditionKind};
use crate::error::{ConditionError, Result};
use crate::preprocessing::{Level, RawColumn};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

pub const TEMPERATURE_FILE: &str = "spain_temp_daily.csv";
pub const PRECIPITATION_FILE: &str = "spain_prec_daily.csv";

#[derive(Debug, Clone, Deserialize)]
struct TemperatureRow {
    date: NaiveDate,
    temp_min: f64,
    temp_max_delta: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct PrecipitationRow {
    date: NaiveDate,
    prec_total: f64,
    label: String,
}

trait Dated {
    fn date(&self) -> NaiveDate;
}

impl Dated for TemperatureRow {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for PrecipitationRow {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Read a daily CSV and return its rows for `dates`, in that order.
fn select_rows<T>(path: &Path, dates: &[NaiveDate]) -> Result<Vec<T>>
where
    T: DeserializeOwned + Dated + Clone,
{
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| ConditionError::Csv {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let mut by_date = HashMap::new();
    for result in reader.deserialize::<T>() {
        let row = result.map_err(|e| ConditionError::Csv {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        by_date.insert(row.date(), row);
    }
    debug!(path = %path.display(), rows = by_date.len(), "read daily file");

    dates
        .iter()
        .map(|date| {
            by_date
                .get(date)
                .cloned()
                .ok_or_else(|| ConditionError::MissingDate {
                    date: date.to_string(),
                    path: path.to_path_buf(),
                })
        })
        .collect()
}

/// Minimum daily temperature and daily max-min spread, both continuous over
/// their observed ranges.
pub fn temperature(
    dataset_path: &Path,
    dates: &[NaiveDate],
) -> Result<Vec<(ConditionDeclaration, RawColumn)>> {
    let rows: Vec<TemperatureRow> = select_rows(&dataset_path.join(TEMPERATURE_FILE), dates)?;

    let temp_min: Vec<f64> = rows.iter().map(|r| r.temp_min).collect();
    let temp_max_delta: Vec<f64> = rows.iter().map(|r| r.temp_max_delta).collect();

    Ok(vec![
        continuous("temp_min", &temp_min),
        continuous("temp_max_delta", &temp_max_delta),
    ])
}

fn continuous(tag: &str, values: &[f64]) -> (ConditionDeclaration, RawColumn) {
    let low = values.iter().copied().fold(f64::INFINITY, f64::min);
    let high = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (
        ConditionDeclaration::new(tag, ConditionKind::Continuous { low, high }),
        RawColumn::scalar(values),
    )
}

/// Daily precipitation label, ordinal with categories ranked by the lowest
/// precipitation total each label was observed with.
pub fn precipitation(
    dataset_path: &Path,
    dates: &[NaiveDate],
) -> Result<(ConditionDeclaration, RawColumn)> {
    let rows: Vec<PrecipitationRow> =
        select_rows(&dataset_path.join(PRECIPITATION_FILE), dates)?;

    let mut lowest: HashMap<&str, f64> = HashMap::new();
    for row in &rows {
        let entry = lowest.entry(row.label.as_str()).or_insert(row.prec_total);
        *entry = entry.min(row.prec_total);
    }
    let mut ranked: Vec<(&str, f64)> = lowest.into_iter().collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));

    let categories: Vec<Level> = ranked.into_iter().map(|(label, _)| label.into()).collect();
    let column = RawColumn::levels(rows.iter().map(|r| r.label.as_str()));

    Ok((
        ConditionDeclaration::new("precipitation_level", ConditionKind::Ordinal { categories }),
        column,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn write_dataset() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(TEMPERATURE_FILE),
            "date,temp_min,temp_max_delta\n\
             2024-01-01,2.5,8.0\n\
             2024-01-02,-1.0,10.5\n\
             2024-01-03,4.0,6.0\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join(PRECIPITATION_FILE),
            "date,prec_total,label\n\
             2024-01-01,12.0,heavy\n\
             2024-01-02,0.0,dry\n\
             2024-01-03,3.5,light\n\
             2024-01-04,0.2,dry\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_temperature_follows_requested_dates() {
        let dir = write_dataset();
        let dates = [ymd(2024, 1, 3), ymd(2024, 1, 1)];
        let conditions = temperature(dir.path(), &dates).unwrap();

        assert_eq!(conditions.len(), 2);
        let (decl, column) = &conditions[0];
        assert_eq!(decl.tag, "temp_min");
        assert_eq!(
            decl.kind,
            ConditionKind::Continuous {
                low: 2.5,
                high: 4.0
            }
        );
        assert_eq!(column, &RawColumn::scalar(&[4.0, 2.5]));

        let (decl, column) = &conditions[1];
        assert_eq!(decl.tag, "temp_max_delta");
        assert_eq!(column, &RawColumn::scalar(&[6.0, 8.0]));
    }

    #[test]
    fn test_precipitation_ranks_labels_by_total() {
        let dir = write_dataset();
        let dates = [ymd(2024, 1, 1), ymd(2024, 1, 2), ymd(2024, 1, 3), ymd(2024, 1, 4)];
        let (decl, column) = precipitation(dir.path(), &dates).unwrap();

        assert_eq!(decl.tag, "precipitation_level");
        assert_eq!(
            decl.kind,
            ConditionKind::Ordinal {
                categories: vec!["dry".into(), "light".into(), "heavy".into()]
            }
        );
        // rows stay aligned with the dates
        assert_eq!(column, RawColumn::levels(["heavy", "dry", "light", "dry"]));
    }

    #[test]
    fn test_missing_date() {
        let dir = write_dataset();
        let result = temperature(dir.path(), &[ymd(2023, 12, 31)]);
        assert!(matches!(
            result,
            Err(ConditionError::MissingDate { date, .. }) if date == "2023-12-31"
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = precipitation(dir.path(), &[ymd(2024, 1, 1)]);
        assert!(matches!(result, Err(ConditionError::Csv { .. })));
    }

    #[test]
    fn test_malformed_row() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(TEMPERATURE_FILE),
            "date,temp_min,temp_max_delta\n2024-01-01,cold,8.0\n",
        )
        .unwrap();
        let result = temperature(dir.path(), &[ymd(2024, 1, 1)]);
        assert!(matches!(result, Err(ConditionError::Csv { .. })));
    }
}
