//! Alarm export handling
//!
//! Structure:
//! - `catalog.rs`: built-in clusters / operators / alarms / drop list
//! - `criteria.rs`: caller selection and catalog substitution
//! - `source.rs`: reading raw exports from paths or buffers
//! - `sink.rs`: writing cleaned tables and images
//! - `timestamp.rs`: day-first OpenTime parsing
//! - `error.rs`: error types

pub mod catalog;
pub mod criteria;
pub mod error;
pub mod sink;
pub mod source;
pub mod timestamp;

// Re-exports for convenience
pub use catalog::{Catalog, BUILTIN_CATALOG};
pub use criteria::{ResolvedCriteria, SelectionCriteria};
pub use error::{AlarmError, RenderStage, Result};
pub use sink::{write_clean_table, write_image};
pub use source::{read_raw_table, SourceFormat, TableSource};
pub use timestamp::parse_day_first;
