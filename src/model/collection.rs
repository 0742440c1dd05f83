use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::model::catalog::{Nutzniesser, Personalkategorie, StatistikCodeImport, Variable};
use crate::model::navigation::Organisation;
use crate::model::reference::{NutzniesserRef, StatistikCodeRef, Validity, VariablenRef};

/// Anything that carries a stable code within its type.
pub trait Coded {
    fn code(&self) -> &str;
}

macro_rules! impl_coded {
    ($($ty:ty),*) => {
        $(impl Coded for $ty {
            fn code(&self) -> &str {
                &self.code
            }
        })*
    };
}

impl_coded!(
    Variable,
    Nutzniesser,
    StatistikCodeImport,
    Personalkategorie,
    VariablenRef,
    NutzniesserRef,
    StatistikCodeRef
);

impl Coded for Organisation {
    fn code(&self) -> &str {
        &self.id
    }
}

/// Every collection the engine may hand to a sink.
/// Navigation-only nodes have no variant on purpose.
#[derive(Debug, Clone, PartialEq)]
pub enum Collection {
    StatistikCodes(Vec<StatistikCodeImport>),
    Nutzniesser(Vec<Nutzniesser>),
    Variablen(Vec<Variable>),
    Organisationen(Vec<Organisation>),
    Personalkategorien(Vec<Personalkategorie>),
    VariablenRefs(Vec<VariablenRef>),
    NutzniesserRefs(Vec<NutzniesserRef>),
    StatistikCodeRefs(Vec<StatistikCodeRef>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    StatistikCodes,
    Nutzniesser,
    Variablen,
    Organisationen,
    Personalkategorien,
    VariablenRefs,
    NutzniesserRefs,
    StatistikCodeRefs,
}

impl CollectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::StatistikCodes => "statistik_codes",
            CollectionKind::Nutzniesser => "nutzniesser",
            CollectionKind::Variablen => "variablen",
            CollectionKind::Organisationen => "organisationen",
            CollectionKind::Personalkategorien => "personalkategorien",
            CollectionKind::VariablenRefs => "variablen_refs",
            CollectionKind::NutzniesserRefs => "nutzniesser_refs",
            CollectionKind::StatistikCodeRefs => "statistik_code_refs",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn records_of<T: Coded + Serialize>(items: &[T]) -> serde_json::Result<Vec<(String, Value)>> {
    items
        .iter()
        .map(|item| Ok((item.code().to_owned(), serde_json::to_value(item)?)))
        .collect()
}

fn duplicates_of<T: Coded>(items: &[T]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for item in items {
        if !seen.insert(item.code()) {
            duplicates.push(item.code().to_owned());
        }
    }
    duplicates
}

fn inconsistent_of<T: Coded + Validity>(items: &[T]) -> Vec<String> {
    items
        .iter()
        .filter(|item| !item.has_consistent_validity())
        .map(|item| item.code().to_owned())
        .collect()
}

/// Expands `$body` once per variant with `$items` bound to the inner vec.
macro_rules! each_variant {
    ($self:expr, $items:ident => $body:expr) => {
        match $self {
            Collection::StatistikCodes($items) => $body,
            Collection::Nutzniesser($items) => $body,
            Collection::Variablen($items) => $body,
            Collection::Organisationen($items) => $body,
            Collection::Personalkategorien($items) => $body,
            Collection::VariablenRefs($items) => $body,
            Collection::NutzniesserRefs($items) => $body,
            Collection::StatistikCodeRefs($items) => $body,
        }
    };
}

impl Collection {
    pub fn kind(&self) -> CollectionKind {
        match self {
            Collection::StatistikCodes(_) => CollectionKind::StatistikCodes,
            Collection::Nutzniesser(_) => CollectionKind::Nutzniesser,
            Collection::Variablen(_) => CollectionKind::Variablen,
            Collection::Organisationen(_) => CollectionKind::Organisationen,
            Collection::Personalkategorien(_) => CollectionKind::Personalkategorien,
            Collection::VariablenRefs(_) => CollectionKind::VariablenRefs,
            Collection::NutzniesserRefs(_) => CollectionKind::NutzniesserRefs,
            Collection::StatistikCodeRefs(_) => CollectionKind::StatistikCodeRefs,
        }
    }

    pub fn len(&self) -> usize {
        each_variant!(self, items => items.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn codes(&self) -> Vec<&str> {
        each_variant!(self, items => items.iter().map(|i| i.code()).collect())
    }

    /// `(code, json)` pairs, in arrival order
    pub fn records(&self) -> serde_json::Result<Vec<(String, Value)>> {
        each_variant!(self, items => records_of(items))
    }

    pub fn duplicate_codes(&self) -> Vec<String> {
        each_variant!(self, items => duplicates_of(items))
    }

    /// Codes whose validity interval ends before it starts.
    pub fn inconsistent_validity(&self) -> Vec<String> {
        match self {
            Collection::StatistikCodes(items) => inconsistent_of(items),
            Collection::Nutzniesser(items) => inconsistent_of(items),
            Collection::VariablenRefs(items) => inconsistent_of(items),
            Collection::NutzniesserRefs(items) => inconsistent_of(items),
            Collection::StatistikCodeRefs(items) => inconsistent_of(items),
            Collection::Variablen(_)
            | Collection::Organisationen(_)
            | Collection::Personalkategorien(_) => Vec::new(),
        }
    }
}

/// Partition key a collection is written under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OwnerKey {
    /// tenant-wide catalogs
    Tenant,
    Organisation(String),
    OrganisationPersonalkategorie {
        organisation: String,
        personalkategorie: String,
    },
    Anstellung(String),
}

impl OwnerKey {
    /// organisation or employment id
    pub fn owner(&self) -> Option<&str> {
        match self {
            OwnerKey::Tenant => None,
            OwnerKey::Organisation(id) | OwnerKey::Anstellung(id) => Some(id),
            OwnerKey::OrganisationPersonalkategorie { organisation, .. } => Some(organisation),
        }
    }

    /// personnel category id, when applicable
    pub fn sub_owner(&self) -> Option<&str> {
        match self {
            OwnerKey::OrganisationPersonalkategorie { personalkategorie, .. } => {
                Some(personalkategorie)
            }
            _ => None,
        }
    }
}

impl fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnerKey::Tenant => f.write_str("tenant"),
            OwnerKey::Organisation(id) => write!(f, "organisation:{}", id),
            OwnerKey::OrganisationPersonalkategorie { organisation, personalkategorie } => {
                write!(f, "organisation:{}/personalkategorie:{}", organisation, personalkategorie)
            }
            OwnerKey::Anstellung(id) => write!(f, "anstellung:{}", id),
        }
    }
}

/// One unit of sink work: a collection and the key it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub owner: OwnerKey,
    pub collection: Collection,
}

impl Batch {
    pub fn new(owner: OwnerKey, collection: Collection) -> Self {
        Self { owner, collection }
    }
}
