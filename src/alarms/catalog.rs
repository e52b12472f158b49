//! Built-in selection catalog
//!
//! Loads the default clusters, operators, alarm types and administrative columns from
//! catalog.json (embedded at compile time). These are the values used whenever a caller
//! leaves a selection empty, and the columns removed from every cleaned table.
//!
//! Everything here only seeds defaults: `PipelineConfig` owns its own copy, so a config
//! file or a test can replace any list without touching the embedded file.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Embedded catalog.json content
const CATALOG_JSON: &str = include_str!("../../catalog.json");

/// Built-in catalog, parsed lazily on first access
pub static BUILTIN_CATALOG: Lazy<Catalog> = Lazy::new(|| {
    Catalog::from_json(CATALOG_JSON).unwrap_or_else(|e| {
        tracing::error!("Failed to load catalog.json: {}", e);
        Catalog::default()
    })
});

/// Known values for each selection dimension plus the drop list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub clusters: Vec<String>,
    pub operators: Vec<String>,
    pub alarms: Vec<String>,
    pub administrative_columns: Vec<String>,
}

impl Catalog {
    /// Load a catalog from JSON string
    pub fn from_json(json: &str) -> Result<Self, String> {
        let catalog: Catalog = serde_json::from_str(json)
            .map_err(|e| format!("Failed to parse catalog JSON: {}", e))?;

        tracing::debug!(
            clusters = catalog.clusters.len(),
            operators = catalog.operators.len(),
            alarms = catalog.alarms.len(),
            administrative_columns = catalog.administrative_columns.len(),
            "Catalog loaded"
        );

        Ok(catalog)
    }

    /// The built-in catalog (clone of the embedded one)
    pub fn builtin() -> Self {
        BUILTIN_CATALOG.clone()
    }
}
