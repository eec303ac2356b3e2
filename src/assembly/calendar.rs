//! Calendar conditions derived from the observation dates.

use crate::conditioner::{ConditionDeclaration, ConditionKind, Support, VariableType};
use crate::error::Result;
use crate::preprocessing::{Level, RawColumn};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;

/// Month of year (1-12), circular over the observed months.
pub fn months(dates: &[NaiveDate]) -> Result<(ConditionDeclaration, RawColumn)> {
    let values: Vec<i64> = dates.iter().map(|d| i64::from(d.month())).collect();
    circular("months", values)
}

/// Day of week with Monday = 0, circular over the observed weekdays.
pub fn weekdays(dates: &[NaiveDate]) -> Result<(ConditionDeclaration, RawColumn)> {
    let values: Vec<i64> = dates
        .iter()
        .map(|d| i64::from(d.weekday().num_days_from_monday()))
        .collect();
    circular("weekdays", values)
}

/// Saturday and Sunday as level 1, other days as level 0.
pub fn is_weekend(dates: &[NaiveDate]) -> Result<(ConditionDeclaration, RawColumn)> {
    let column = RawColumn::levels(
        dates
            .iter()
            .map(|d| i64::from(d.weekday().num_days_from_monday() >= 5)),
    );
    let declaration = ConditionDeclaration::new(
        "is_weekend",
        ConditionKind::Categorical {
            levels: vec![Level::Int(0), Level::Int(1)],
        },
    );
    Ok((declaration, column))
}

fn circular(tag: &str, values: Vec<i64>) -> Result<(ConditionDeclaration, RawColumn)> {
    let observed: BTreeSet<i64> = values.iter().copied().collect();
    let kind = ConditionKind::from_support(
        VariableType::Circular,
        Support::Levels(observed.into_iter().map(Level::Int).collect()),
    )?;
    Ok((
        ConditionDeclaration::new(tag, kind),
        RawColumn::levels(values),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // 2024-03-01 is a Friday
    fn dates() -> Vec<NaiveDate> {
        vec![ymd(2024, 3, 1), ymd(2024, 3, 2), ymd(2024, 3, 3), ymd(2024, 11, 4)]
    }

    #[test]
    fn test_months() {
        let (decl, column) = months(&dates()).unwrap();
        assert_eq!(decl.tag, "months");
        assert_eq!(decl.kind, ConditionKind::Circular { min: 3, max: 11 });
        assert_eq!(column, RawColumn::levels([3, 3, 3, 11]));
    }

    #[test]
    fn test_weekdays_monday_is_zero() {
        let (decl, column) = weekdays(&dates()).unwrap();
        assert_eq!(decl.kind, ConditionKind::Circular { min: 0, max: 6 });
        assert_eq!(column, RawColumn::levels([4, 5, 6, 0]));
    }

    #[test]
    fn test_is_weekend() {
        let (decl, column) = is_weekend(&dates()).unwrap();
        assert_eq!(
            decl.kind,
            ConditionKind::Categorical {
                levels: vec![Level::Int(0), Level::Int(1)]
            }
        );
        assert_eq!(column, RawColumn::levels([0, 1, 1, 0]));
    }
}
