//! Alarm Snapshot Library
//!
//! Filters a daily network alarm export down to the open alarms for selected operators,
//! alarm types and clusters, and renders the result as a PNG table.
//!
//! Module organization:
//! - `alarms`: catalog, selection criteria, source/sink adapters, errors
//! - `pipeline`: the staged alarm filter
//! - `render`: table layout, SVG composition, PNG encoding
//! - `config`: JSON configuration with defaults

pub mod alarms;
pub mod config;
pub mod pipeline;
pub mod render;

pub use alarms::{AlarmError, Result, SelectionCriteria, TableSource};
pub use config::AppConfig;
pub use pipeline::{AlarmFilterPipeline, CleanedTable, FilterStage, PipelineOutcome};
pub use render::{RenderedTable, TableImageRenderer};
