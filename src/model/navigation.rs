use serde::{Deserialize, Serialize};

/// ================================
/// Navigation nodes
///
/// Nodes only carry links to the next traversal level.
/// `Organisation` is the one exception that is also dispatched as a catalog.
/// ================================

/// Entry point of the API (`GET /api/v1`)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationRoot {
    #[serde(default)]
    pub statistik_code_url: Option<String>,
    #[serde(default)]
    pub nutzniesser_url: Option<String>,
    #[serde(default)]
    pub organisation_url: Option<String>,
    #[serde(default)]
    pub variablen_url: Option<String>,
    #[serde(default)]
    pub personalkategorie_url: Option<String>,
    #[serde(default)]
    pub anstellung_link: Option<String>,
    #[serde(default)]
    pub mappings_url: Option<String>,
    #[serde(default)]
    pub massnahmen_url: Option<String>,
}

/// Organisation created by the tenant's super user
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Organisation {
    #[serde(rename = "organisationId")]
    pub id: String,
    #[serde(default)]
    pub bezeichnung: Option<String>,
    /// variables staff of this organisation may record on
    #[serde(default)]
    pub variablen_set_url: Option<String>,
    #[serde(default)]
    pub personalkategorie_url: Option<String>,
    #[serde(default)]
    pub statistik_code_url: Option<String>,
    #[serde(default)]
    pub nutzniesser_url: Option<String>,
}

/// Links for one personnel category within an organisation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalkategorieNav {
    #[serde(rename = "personalkategorieId")]
    pub id: String,
    #[serde(default)]
    pub variablen_url: Option<String>,
    #[serde(default)]
    pub nutzniesser_url: Option<String>,
    #[serde(default)]
    pub statistik_code_url: Option<String>,
}

/// Links for one employment (personnel number + employment number)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Anstellung {
    #[serde(rename = "anstellungsId")]
    pub id: String,
    #[serde(default)]
    pub variablen_url: Option<String>,
    #[serde(default)]
    pub nutzniesser_url: Option<String>,
    #[serde(default)]
    pub statistik_code_url: Option<String>,
}

/// The three assignment links every owner node carries.
#[derive(Debug, Clone, Copy)]
pub struct RefLinks<'a> {
    pub variablen: Option<&'a str>,
    pub nutzniesser: Option<&'a str>,
    pub statistik_code: Option<&'a str>,
}

pub trait HasRefLinks {
    fn ref_links(&self) -> RefLinks<'_>;
}

impl HasRefLinks for Organisation {
    fn ref_links(&self) -> RefLinks<'_> {
        RefLinks {
            variablen: self.variablen_set_url.as_deref(),
            nutzniesser: self.nutzniesser_url.as_deref(),
            statistik_code: self.statistik_code_url.as_deref(),
        }
    }
}

impl HasRefLinks for PersonalkategorieNav {
    fn ref_links(&self) -> RefLinks<'_> {
        RefLinks {
            variablen: self.variablen_url.as_deref(),
            nutzniesser: self.nutzniesser_url.as_deref(),
            statistik_code: self.statistik_code_url.as_deref(),
        }
    }
}

impl HasRefLinks for Anstellung {
    fn ref_links(&self) -> RefLinks<'_> {
        RefLinks {
            variablen: self.variablen_url.as_deref(),
            nutzniesser: self.nutzniesser_url.as_deref(),
            statistik_code: self.statistik_code_url.as_deref(),
        }
    }
}
