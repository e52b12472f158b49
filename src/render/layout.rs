//! Table measurement
//!
//! Column widths follow the content: the longest stringified value in a column times its
//! width hint times `char_width`. The image is the table plus margins, capped at the
//! canvas size. Anything past the canvas is clipped.

use crate::alarms::error::{AlarmError, RenderStage, Result};
use crate::alarms::sink::string_columns;
use crate::config::RenderConfig;
use polars::prelude::*;
use std::collections::HashMap;

/// Stringified table: header plus data rows, nulls as empty strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCells {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableCells {
    pub fn from_frame(frame: &DataFrame) -> Result<Self> {
        let header = frame
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect();

        let columns = string_columns(frame)?;
        let rows = (0..frame.height())
            .map(|row| {
                columns
                    .iter()
                    .map(|col| col.get(row).unwrap_or("").to_string())
                    .collect()
            })
            .collect();

        Ok(Self { header, rows })
    }

    pub fn n_cols(&self) -> usize {
        self.header.len()
    }

    /// Longest value (in chars) per column over the data rows
    fn max_chars(&self) -> Vec<usize> {
        (0..self.n_cols())
            .map(|col| {
                self.rows
                    .iter()
                    .map(|row| row.get(col).map_or(0, |v| v.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }
}

/// Rectangle in inches, origin top-left
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl CellRect {
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Measured table
#[derive(Debug, Clone, PartialEq)]
pub struct TableLayout {
    /// Width of each column in inches
    pub column_widths: Vec<f32>,
    /// Height of every row (header included) in inches
    pub row_height: f32,
    pub margin: f32,
    /// Data rows, header excluded
    pub n_rows: usize,
    /// Table plus margins, before the canvas cap
    pub content_width: f32,
    pub content_height: f32,
    /// Image size after the canvas cap
    pub width: f32,
    pub height: f32,
}

impl TableLayout {
    /// Measure `cells`
    ///
    /// # Arguments
    /// * `cells` - Stringified table
    /// * `width_hints` - Per-column multipliers; columns without one use the default hint
    /// * `config` - Render settings (char width, row height, margins, canvas)
    pub fn compute(
        cells: &TableCells,
        width_hints: Option<&HashMap<String, f32>>,
        config: &RenderConfig,
    ) -> Result<Self> {
        if cells.rows.is_empty() {
            return Err(AlarmError::render(RenderStage::Layout, "cannot render empty table"));
        }
        if cells.n_cols() == 0 {
            return Err(AlarmError::render(RenderStage::Layout, "table has no columns"));
        }

        let column_widths: Vec<f32> = cells
            .header
            .iter()
            .zip(cells.max_chars())
            .map(|(name, chars)| {
                let hint = width_hints
                    .and_then(|hints| hints.get(name))
                    .copied()
                    .unwrap_or(config.default_width_hint);
                chars.max(1) as f32 * hint * config.char_width
            })
            .collect();

        if let Some(bad) = column_widths.iter().find(|w| !(w.is_finite() && **w > 0.0)) {
            return Err(AlarmError::render(
                RenderStage::Layout,
                format!("invalid column width {}; width hints must be positive", bad),
            ));
        }

        let n_rows = cells.rows.len();
        let content_width = column_widths.iter().sum::<f32>() + 2.0 * config.margin;
        let content_height = (n_rows + 1) as f32 * config.row_height + 2.0 * config.margin;

        let layout = Self {
            column_widths,
            row_height: config.row_height,
            margin: config.margin,
            n_rows,
            content_width,
            content_height,
            width: content_width.min(config.canvas_width),
            height: content_height.min(config.canvas_height),
        };

        if layout.is_clipped() {
            tracing::warn!(
                content_width,
                content_height,
                canvas_width = config.canvas_width,
                canvas_height = config.canvas_height,
                "Table exceeds canvas, output will be clipped"
            );
        }

        Ok(layout)
    }

    pub fn n_cols(&self) -> usize {
        self.column_widths.len()
    }

    pub fn is_clipped(&self) -> bool {
        self.content_width > self.width || self.content_height > self.height
    }

    /// Cell rectangle; `row` 0 is the header, data rows start at 1
    pub fn cell_rect(&self, row: usize, col: usize) -> CellRect {
        let x = self.margin + self.column_widths[..col].iter().sum::<f32>();
        CellRect {
            x,
            y: self.margin + row as f32 * self.row_height,
            width: self.column_widths[col],
            height: self.row_height,
        }
    }

    /// Image size in pixels at `dpi`
    pub fn pixel_size(&self, dpi: u32) -> (u32, u32) {
        let to_px = |inches: f32| (inches * dpi as f32).ceil().max(1.0) as u32;
        (to_px(self.width), to_px(self.height))
    }
}
