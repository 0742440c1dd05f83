use serde::Serialize;
use tracing::warn;

/// Resources the root links to whose shape the API does not document yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionPoint {
    /// cross-catalog mappings, depend on variables
    Mappings,
    Massnahmen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionOutcome {
    NotSupported,
}

impl ExtensionPoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtensionPoint::Mappings => "mappings",
            ExtensionPoint::Massnahmen => "massnahmen",
        }
    }

    /// Nothing is fetched; the schema is unknown.
    pub fn invoke(&self, link: &str) -> ExtensionOutcome {
        warn!(extension = self.as_str(), link, "extension point not yet supported, skipping");
        ExtensionOutcome::NotSupported
    }
}
