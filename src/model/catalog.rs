use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::helpers::time::api_date;

/// tacs variable, keyed by its tacs code
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    #[serde(rename = "tacsCode")]
    pub code: String,
    // the API spells it without the second 'n'
    #[serde(default, alias = "bezeichung")]
    pub bezeichnung: Option<String>,
    #[serde(default)]
    pub beschreibung_methodisch: Option<String>,
    #[serde(default)]
    pub sortier_nummer: i32,
}

/// Beneficiary that services can be booked on
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Nutzniesser {
    #[serde(rename = "nutzniesserCode")]
    pub code: String,
    #[serde(default)]
    pub bezeichnung: Option<String>,
    #[serde(rename = "gueltigAb", with = "api_date")]
    pub valid_from: NaiveDate,
    /// `None` means valid until further notice
    #[serde(rename = "gueltigBis", default, with = "api_date::option")]
    pub valid_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatistikCodeImport {
    #[serde(rename = "statistikCode")]
    pub code: String,
    #[serde(default)]
    pub bezeichnung: Option<String>,
    #[serde(rename = "gueltigAb", with = "api_date")]
    pub valid_from: NaiveDate,
    #[serde(rename = "gueltigBis", default, with = "api_date::option")]
    pub valid_to: Option<NaiveDate>,
}

/// Personnel category (group, type) from the tacs catalog
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Personalkategorie {
    #[serde(rename = "tacsCode")]
    pub code: String,
    #[serde(default)]
    pub bezeichnung: Option<String>,
    #[serde(default)]
    pub sortier_nummer: i32,
}
