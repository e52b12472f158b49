//! Snapshot configuration
//!
//! Configuration is loaded from an optional JSON file (camelCase keys). Every field has a
//! default, so a file only needs the values it changes. Catalog defaults come from the
//! embedded catalog.json via `Catalog::builtin`; render defaults mirror a 23x15 inch
//! landscape canvas at 600 DPI.

use crate::alarms::error::{AlarmError, Result};
use crate::alarms::Catalog;
use crate::render::svg::parse_hex_color;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub pipeline: PipelineConfig,
    pub render: RenderConfig,
    pub output: OutputConfig,
}

impl AppConfig {
    /// Parse a JSON config; missing keys keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(json)
            .map_err(|e| AlarmError::Config(format!("Failed to parse config JSON: {}", e)))?;
        config.render.validate()?;
        Ok(config)
    }

    /// Load configuration from `path`, or use defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            tracing::info!("No config file given, using defaults");
            return Ok(Self::default());
        };

        let json = std::fs::read_to_string(path).map_err(|e| {
            AlarmError::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        let config = Self::from_json(&json)?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }
}

/// Filtering settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Zero-based physical row holding the column names (row 0 is a title row)
    pub header_row: usize,

    /// Default clusters when the selection is empty
    pub clusters: Vec<String>,

    /// Default operators (SourceInput values) when the selection is empty
    pub operators: Vec<String>,

    /// Default alarm types (EventName values) when the selection is empty
    pub alarms: Vec<String>,

    /// Administrative columns removed from cleaned tables
    pub drop_columns: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let builtin = Catalog::builtin();
        Self {
            header_row: 1,
            clusters: builtin.clusters,
            operators: builtin.operators,
            alarms: builtin.alarms,
            drop_columns: builtin.administrative_columns,
        }
    }
}

impl PipelineConfig {
    /// Catalog used to resolve empty selections
    pub fn catalog(&self) -> Catalog {
        Catalog {
            clusters: self.clusters.clone(),
            operators: self.operators.clone(),
            alarms: self.alarms.clone(),
            administrative_columns: self.drop_columns.clone(),
        }
    }
}

/// Table image settings
///
/// Lengths are inches unless the name says otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderConfig {
    /// Output resolution
    pub dpi: u32,

    /// Largest image width; wider tables are clipped
    pub canvas_width: f32,

    /// Largest image height; taller tables are clipped
    pub canvas_height: f32,

    /// Width of one character unit before the column width hint is applied
    pub char_width: f32,

    /// Width multiplier for columns without an explicit hint
    pub default_width_hint: f32,

    /// Height of every row, header included
    pub row_height: f32,

    /// Blank border around the table
    pub margin: f32,

    /// Cell text size in points
    pub font_size_pt: f32,

    /// CSS font-family list for cell text
    pub font_family: String,

    /// Extra directory of font files loaded next to the system fonts
    pub font_dir: Option<PathBuf>,

    /// Header background, `#RRGGBB`
    pub header_fill: String,

    /// Header text color, `#RRGGBB`
    pub header_text: String,

    /// Data row background, `#RRGGBB`
    pub body_fill: String,

    /// Data row text color, `#RRGGBB`
    pub body_text: String,

    /// Cell border color, `#RRGGBB`
    pub grid_color: String,

    /// Cell border width in points
    pub grid_width_pt: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dpi: 600,
            canvas_width: 23.0,
            canvas_height: 15.0,
            char_width: 0.07,
            default_width_hint: 1.5,
            row_height: 0.3,
            margin: 0.25,
            font_size_pt: 10.0,
            font_family: "DejaVu Sans, Arial, Helvetica, sans-serif".to_string(),
            font_dir: None,
            header_fill: "#FFFF00".to_string(),
            header_text: "#000000".to_string(),
            body_fill: "#FFFFFF".to_string(),
            body_text: "#000000".to_string(),
            grid_color: "#000000".to_string(),
            grid_width_pt: 0.5,
        }
    }
}

impl RenderConfig {
    /// Reject values the renderer cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.dpi == 0 {
            return Err(AlarmError::Config("dpi must be positive".to_string()));
        }

        let lengths = [
            ("canvasWidth", self.canvas_width),
            ("canvasHeight", self.canvas_height),
            ("charWidth", self.char_width),
            ("defaultWidthHint", self.default_width_hint),
            ("rowHeight", self.row_height),
            ("fontSizePt", self.font_size_pt),
        ];
        for (name, value) in lengths {
            if !(value.is_finite() && value > 0.0) {
                return Err(AlarmError::Config(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        if !(self.margin.is_finite() && self.margin >= 0.0) {
            return Err(AlarmError::Config(format!(
                "margin must not be negative, got {}",
                self.margin
            )));
        }

        let colors = [
            ("headerFill", &self.header_fill),
            ("headerText", &self.header_text),
            ("bodyFill", &self.body_fill),
            ("bodyText", &self.body_text),
            ("gridColor", &self.grid_color),
        ];
        for (name, value) in colors {
            if parse_hex_color(value).is_none() {
                return Err(AlarmError::Config(format!(
                    "{} is not a hex color: '{}'",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Where the CLI puts its artifacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OutputConfig {
    pub artifacts_dir: PathBuf,
    /// `.csv` writes CSV; any other extension writes an xlsx workbook
    pub clean_data_file: String,
    pub image_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            artifacts_dir: PathBuf::from("artifacts"),
            clean_data_file: "clean_data.xlsx".to_string(),
            image_file: "Alarm.png".to_string(),
        }
    }
}

impl OutputConfig {
    pub fn clean_data_path(&self) -> PathBuf {
        self.artifacts_dir.join(&self.clean_data_file)
    }

    pub fn image_path(&self) -> PathBuf {
        self.artifacts_dir.join(&self.image_file)
    }
}
