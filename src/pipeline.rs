//! Alarm filtering pipeline
//!
//! Narrows a raw alarm export down to the open alarms a cluster team has to act on.
//!
//! The pipeline:
//! 1. Keeps alarms opened on the processing date (OpenTime parsed day first)
//! 2. Keeps the selected clusters
//! 3. Keeps the selected operators (SourceInput)
//! 4. Keeps alarms that are not cleared yet (ClearedDateTime is null)
//! 5. Keeps the selected alarm types (EventName)
//! 6. Sorts by ClusterIncharge, ClusterEngineer (stable)
//! 7. Drops the administrative columns
//!
//! A stage that leaves no rows ends the run with `PipelineOutcome::NoData`; later
//! stages never run. The processing date is always passed in by the caller.

use crate::alarms::error::{AlarmError, Result};
use crate::alarms::timestamp::{parse_day_first, NORMALIZED_FORMAT};
use crate::alarms::{ResolvedCriteria, SelectionCriteria};
use crate::config::PipelineConfig;
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::HashSet;
use std::fmt;

/// Column names the pipeline reads
pub mod columns {
    pub const OPEN_TIME: &str = "OpenTime";
    pub const CLUSTER: &str = "Cluster";
    pub const SOURCE_INPUT: &str = "SourceInput";
    pub const CLEARED_DATE_TIME: &str = "ClearedDateTime";
    pub const EVENT_NAME: &str = "EventName";
    pub const CLUSTER_INCHARGE: &str = "ClusterIncharge";
    pub const CLUSTER_ENGINEER: &str = "ClusterEngineer";

    /// Must all be present before filtering starts
    pub const REQUIRED: [&str; 7] = [
        OPEN_TIME,
        CLUSTER,
        SOURCE_INPUT,
        CLEARED_DATE_TIME,
        EVENT_NAME,
        CLUSTER_INCHARGE,
        CLUSTER_ENGINEER,
    ];

    /// Sort key, in priority order
    pub const SORT_KEYS: [&str; 2] = [CLUSTER_INCHARGE, CLUSTER_ENGINEER];
}

/// Row filters, in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterStage {
    OpenDate,
    Cluster,
    Operator,
    Uncleared,
    Alarm,
}

impl FilterStage {
    pub const ORDER: [FilterStage; 5] = [
        FilterStage::OpenDate,
        FilterStage::Cluster,
        FilterStage::Operator,
        FilterStage::Uncleared,
        FilterStage::Alarm,
    ];

    /// Message shown when this stage leaves nothing
    pub fn empty_message(&self) -> &'static str {
        match self {
            FilterStage::OpenDate => "No data found for the processing date.",
            FilterStage::Cluster => "No data found after filtering by clusters.",
            FilterStage::Operator => "No data found after filtering by operators.",
            FilterStage::Uncleared => "No uncleared alarms found.",
            FilterStage::Alarm => "No data found after filtering by alarms.",
        }
    }
}

impl fmt::Display for FilterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilterStage::OpenDate => "open date",
            FilterStage::Cluster => "cluster",
            FilterStage::Operator => "operator",
            FilterStage::Uncleared => "uncleared",
            FilterStage::Alarm => "alarm",
        };
        f.write_str(name)
    }
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct CleanedTable {
    /// Filtered, sorted rows without administrative columns
    pub frame: DataFrame,
    /// Date the rows were selected for
    pub processing_date: NaiveDate,
    /// Rows left after each stage
    pub stage_counts: Vec<(FilterStage, usize)>,
}

/// Either a cleaned table or the stage that emptied the working set
#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    Cleaned(CleanedTable),
    NoData {
        stage: FilterStage,
        rows_before: usize,
    },
}

impl PipelineOutcome {
    pub fn is_no_data(&self) -> bool {
        matches!(self, PipelineOutcome::NoData { .. })
    }

    pub fn cleaned(self) -> Option<CleanedTable> {
        match self {
            PipelineOutcome::Cleaned(table) => Some(table),
            PipelineOutcome::NoData { .. } => None,
        }
    }
}

/// Filters raw alarm exports; holds configuration only
#[derive(Debug, Clone)]
pub struct AlarmFilterPipeline {
    config: PipelineConfig,
}

impl AlarmFilterPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage over `raw`
    ///
    /// # Arguments
    /// * `raw` - Raw export as read by `read_raw_table`
    /// * `criteria` - Operator / alarm / cluster selection (empty = catalog)
    /// * `processing_date` - Calendar day whose alarms are kept
    ///
    /// # Returns
    /// `Cleaned` with the final table, or `NoData` naming the stage that emptied it
    pub fn run(
        &self,
        raw: DataFrame,
        criteria: &SelectionCriteria,
        processing_date: NaiveDate,
    ) -> Result<PipelineOutcome> {
        tracing::info!(
            rows = raw.height(),
            cols = raw.width(),
            %processing_date,
            "Alarm filtering starts"
        );

        check_required_columns(&raw)?;
        let resolved = criteria.resolve(&self.config.catalog());

        let mut frame = raw;
        let mut stage_counts = Vec::with_capacity(FilterStage::ORDER.len());

        for stage in FilterStage::ORDER {
            let rows_before = frame.height();
            frame = apply_stage(stage, &frame, &resolved, processing_date)?;
            tracing::info!(stage = %stage, rows = frame.height(), "Filtered by {}", stage);
            stage_counts.push((stage, frame.height()));

            if frame.height() == 0 {
                tracing::warn!(stage = %stage, rows_before, "{}", stage.empty_message());
                return Ok(PipelineOutcome::NoData { stage, rows_before });
            }
        }

        let sorted = frame.sort(
            columns::SORT_KEYS,
            SortMultipleOptions::default()
                .with_maintain_order(true)
                .with_nulls_last(true),
        )?;
        tracing::info!(shape = ?sorted.shape(), "Data sorted");

        let cleaned = drop_columns(&sorted, &self.config.drop_columns)?;
        tracing::info!(shape = ?cleaned.shape(), "Administrative columns dropped");

        Ok(PipelineOutcome::Cleaned(CleanedTable {
            frame: cleaned,
            processing_date,
            stage_counts,
        }))
    }
}

fn check_required_columns(frame: &DataFrame) -> Result<()> {
    let present: HashSet<&str> = frame
        .get_column_names()
        .into_iter()
        .map(|name| name.as_str())
        .collect();

    let missing: Vec<String> = columns::REQUIRED
        .iter()
        .filter(|name| !present.contains(*name))
        .map(|name| name.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AlarmError::Schema {
            missing,
            rows: frame.height(),
            cols: frame.width(),
        })
    }
}

fn apply_stage(
    stage: FilterStage,
    frame: &DataFrame,
    criteria: &ResolvedCriteria,
    processing_date: NaiveDate,
) -> Result<DataFrame> {
    let mask = match stage {
        FilterStage::OpenDate => {
            let (mask, normalized) = open_date_mask(frame, processing_date)?;
            let mut frame = frame.clone();
            frame.with_column(normalized)?;
            return Ok(frame.filter(&mask)?);
        }
        FilterStage::Cluster => membership_mask(frame, columns::CLUSTER, &criteria.cluster_set())?,
        FilterStage::Operator => {
            membership_mask(frame, columns::SOURCE_INPUT, &criteria.operator_set())?
        }
        FilterStage::Uncleared => null_mask(frame, columns::CLEARED_DATE_TIME)?,
        FilterStage::Alarm => membership_mask(frame, columns::EVENT_NAME, &criteria.alarm_set())?,
    };
    Ok(frame.filter(&mask)?)
}

fn string_column(frame: &DataFrame, name: &str) -> Result<StringChunked> {
    let series = frame
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    Ok(series.str()?.clone())
}

/// Mask of rows opened on `date`, plus OpenTime rewritten as `YYYY-MM-DD HH:MM:SS`
///
/// A null OpenTime never matches. Any other value that does not parse fails the batch.
fn open_date_mask(frame: &DataFrame, date: NaiveDate) -> Result<(BooleanChunked, Series)> {
    let open_times = string_column(frame, columns::OPEN_TIME)?;

    let mut mask = Vec::with_capacity(open_times.len());
    let mut normalized: Vec<Option<String>> = Vec::with_capacity(open_times.len());

    for (row, value) in open_times.into_iter().enumerate() {
        let parsed = match value {
            Some(text) if !text.trim().is_empty() => {
                Some(parse_day_first(text).ok_or_else(|| AlarmError::InvalidOpenTime {
                    row,
                    value: text.to_string(),
                })?)
            }
            _ => None,
        };
        mask.push(parsed.is_some_and(|ts| ts.date() == date));
        normalized.push(parsed.map(|ts| ts.format(NORMALIZED_FORMAT).to_string()));
    }

    let mask: BooleanChunked = mask.into_iter().collect();
    Ok((mask, Series::new(columns::OPEN_TIME.into(), normalized)))
}

fn membership_mask(frame: &DataFrame, name: &str, allowed: &HashSet<&str>) -> Result<BooleanChunked> {
    let values = string_column(frame, name)?;
    Ok(values
        .into_iter()
        .map(|value| value.is_some_and(|v| allowed.contains(v)))
        .collect())
}

/// Rows whose value is null; blank cells are already null after `read_raw_table`
fn null_mask(frame: &DataFrame, name: &str) -> Result<BooleanChunked> {
    let values = string_column(frame, name)?;
    Ok(values.into_iter().map(|value| value.is_none()).collect())
}

/// Keep every column not listed in `drop`; names that are absent are ignored
fn drop_columns(frame: &DataFrame, drop: &[String]) -> Result<DataFrame> {
    let drop: HashSet<&str> = drop.iter().map(String::as_str).collect();
    let keep: Vec<PlSmallStr> = frame
        .get_column_names()
        .into_iter()
        .filter(|name| !drop.contains(name.as_str()))
        .cloned()
        .collect();
    Ok(frame.select(keep)?)
}
