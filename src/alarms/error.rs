use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Rendering step that failed, reported inside [`AlarmError::Render`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStage {
    /// Measuring the table and sizing the canvas
    Layout,
    /// Building and parsing the SVG scene
    Compose,
    /// Allocating the pixmap and drawing into it
    Rasterize,
    /// Encoding the pixmap as PNG
    Encode,
}

impl fmt::Display for RenderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RenderStage::Layout => "layout",
            RenderStage::Compose => "compose",
            RenderStage::Rasterize => "rasterize",
            RenderStage::Encode => "encode",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while reading, filtering or rendering an alarm export
#[derive(Debug, Error)]
pub enum AlarmError {
    /// Raw export file does not exist
    #[error("raw alarm export not found at {}", path.display())]
    MissingSource { path: PathBuf },

    /// Raw export exists but could not be decoded
    #[error("failed to read alarm export from {origin}: {reason}")]
    UnreadableSource { origin: String, reason: String },

    /// Required columns absent after header parsing
    #[error("alarm export is missing required column(s) {missing:?} (shape {rows}x{cols})")]
    Schema {
        missing: Vec<String>,
        rows: usize,
        cols: usize,
    },

    /// An OpenTime cell is not a day-first date/time
    #[error("OpenTime value {value:?} at data row {row} is not a day-first date/time")]
    InvalidOpenTime { row: usize, value: String },

    /// Table could not be turned into a PNG
    #[error("table render failed during {stage}: {reason}")]
    Render { stage: RenderStage, reason: String },

    /// Configuration error (unreadable config file, invalid colors, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// DataFrame operation error
    #[error("DataFrame error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// CSV read/write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// xlsx write error
    #[error("xlsx error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AlarmError {
    pub(crate) fn render(stage: RenderStage, reason: impl Into<String>) -> Self {
        AlarmError::Render {
            stage,
            reason: reason.into(),
        }
    }
}

/// Type alias for Results using AlarmError
pub type Result<T> = std::result::Result<T, AlarmError>;
