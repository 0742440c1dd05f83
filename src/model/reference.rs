use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::helpers::time::api_date;

/// Assignment of a variable to an owner
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariablenRef {
    #[serde(rename = "tacsCode")]
    pub code: String,
    #[serde(rename = "gueltigAb", with = "api_date")]
    pub valid_from: NaiveDate,
    #[serde(rename = "gueltigBis", default, with = "api_date::option")]
    pub valid_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NutzniesserRef {
    #[serde(rename = "nutzniesserCode")]
    pub code: String,
    #[serde(rename = "gueltigAb", with = "api_date")]
    pub valid_from: NaiveDate,
    #[serde(rename = "gueltigBis", default, with = "api_date::option")]
    pub valid_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatistikCodeRef {
    #[serde(rename = "statistikCode")]
    pub code: String,
    #[serde(rename = "gueltigAb", with = "api_date")]
    pub valid_from: NaiveDate,
    #[serde(rename = "gueltigBis", default, with = "api_date::option")]
    pub valid_to: Option<NaiveDate>,
}

/// Validity interval shared by every assignment
pub trait Validity {
    fn valid_from(&self) -> NaiveDate;
    fn valid_to(&self) -> Option<NaiveDate>;

    /// `valid_from <= valid_to` whenever an end is set
    fn has_consistent_validity(&self) -> bool {
        self.valid_to().map_or(true, |to| self.valid_from() <= to)
    }

    fn is_valid_on(&self, day: NaiveDate) -> bool {
        self.valid_from() <= day && self.valid_to().map_or(true, |to| day <= to)
    }
}

macro_rules! impl_validity {
    ($($ty:ty),*) => {
        $(impl Validity for $ty {
            fn valid_from(&self) -> NaiveDate {
                self.valid_from
            }
            fn valid_to(&self) -> Option<NaiveDate> {
                self.valid_to
            }
        })*
    };
}

impl_validity!(VariablenRef, NutzniesserRef, StatistikCodeRef);
impl_validity!(crate::model::catalog::Nutzniesser, crate::model::catalog::StatistikCodeImport);

#[cfg(test)]
mod test {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn open_ended_interval_is_valid_forever() {
        let r = VariablenRef { code: "V".into(), valid_from: date(2016, 1, 1), valid_to: None };
        assert!(r.has_consistent_validity());
        assert!(r.is_valid_on(date(2099, 12, 31)));
        assert!(!r.is_valid_on(date(2015, 12, 31)));
    }

    #[test]
    fn inverted_interval_is_flagged_not_rewritten() {
        let r = NutzniesserRef {
            code: "N".into(),
            valid_from: date(2017, 1, 1),
            valid_to: Some(date(2016, 1, 1)),
        };
        assert!(!r.has_consistent_validity());
        assert_eq!(r.valid_to, Some(date(2016, 1, 1)));
    }
}
