//! Shapes of the resource graph. The graph is fixed: a root document, tenant catalogs,
//! organisations with personnel categories, and employments, each owner carrying links
//! to its variable, beneficiary and statistic-code assignments.

pub mod catalog;
pub mod collection;
pub mod navigation;
pub mod reference;

pub use catalog::{Nutzniesser, Personalkategorie, StatistikCodeImport, Variable};
pub use collection::{Batch, Coded, Collection, CollectionKind, OwnerKey};
pub use navigation::{
    Anstellung, HasRefLinks, NavigationRoot, Organisation, PersonalkategorieNav, RefLinks,
};
pub use reference::{NutzniesserRef, StatistikCodeRef, Validity, VariablenRef};
