//! Table image rendering
//!
//! Turns a cleaned DataFrame into a PNG table: yellow bold header, white body, every cell
//! boxed and centered.
//!
//! Structure:
//! - `layout.rs`: stringified cells and content-driven column sizing
//! - `svg.rs`: SVG scene in points, hex color parsing
//! - `raster.rs`: resvg rasterization and PNG encoding with DPI metadata

pub mod layout;
pub mod raster;
pub mod svg;

pub use layout::{CellRect, TableCells, TableLayout};

use crate::alarms::error::{AlarmError, Result};
use crate::config::RenderConfig;
use base64::Engine;
use polars::prelude::*;
use resvg::usvg::fontdb;
use std::collections::HashMap;
use std::sync::Arc;

/// Encoded table image
#[derive(Debug, Clone)]
pub struct RenderedTable {
    png: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
    pub dpi: u32,
    pub layout: TableLayout,
}

impl RenderedTable {
    /// PNG bytes
    pub fn bytes(&self) -> &[u8] {
        &self.png
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.png
    }

    /// `data:image/png;base64,...` for embedding in a page
    pub fn data_uri(&self) -> String {
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.png)
        )
    }
}

/// Renders DataFrames as PNG tables
///
/// Holds the render configuration and a font database loaded once at construction.
#[derive(Clone)]
pub struct TableImageRenderer {
    config: RenderConfig,
    fonts: Arc<fontdb::Database>,
}

impl TableImageRenderer {
    pub fn new(config: RenderConfig) -> Result<Self> {
        config.validate()?;
        let fonts = raster::load_fonts(config.font_dir.as_deref());
        Ok(Self { config, fonts })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render `table` to PNG
    ///
    /// # Arguments
    /// * `table` - Table to draw; column names become the header row
    /// * `width_hints` - Per-column width multipliers (default hint for missing columns)
    /// * `dpi` - Output resolution; the configured dpi when `None`
    ///
    /// # Returns
    /// PNG bytes with their pixel size and the layout they were drawn from
    pub fn render(
        &self,
        table: &DataFrame,
        width_hints: Option<&HashMap<String, f32>>,
        dpi: Option<u32>,
    ) -> Result<RenderedTable> {
        let dpi = dpi.unwrap_or(self.config.dpi);
        if dpi == 0 {
            return Err(AlarmError::Config("dpi must be positive".to_string()));
        }

        // 1. Measure
        let cells = TableCells::from_frame(table)?;
        let layout = TableLayout::compute(&cells, width_hints, &self.config)?;
        let (width_px, height_px) = layout.pixel_size(dpi);
        tracing::debug!(
            column_widths = ?layout.column_widths,
            width_in = layout.width,
            height_in = layout.height,
            width_px,
            height_px,
            "Table layout"
        );

        // 2. Compose and rasterize
        let svg = svg::compose_svg(&cells, &layout, &self.config);
        let pixmap = raster::rasterize(
            &svg,
            Arc::clone(&self.fonts),
            &self.config.font_family,
            width_px,
            height_px,
            dpi,
        )?;

        // 3. Encode
        let png = raster::encode_png(&pixmap, dpi)?;
        tracing::info!(
            rows = layout.n_rows,
            cols = layout.n_cols(),
            width_px,
            height_px,
            dpi,
            bytes = png.len(),
            "Table rendered"
        );

        Ok(RenderedTable {
            png,
            width_px,
            height_px,
            dpi,
            layout,
        })
    }
}

impl std::fmt::Debug for TableImageRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableImageRenderer")
            .field("config", &self.config)
            .field("font_faces", &self.fonts.len())
            .finish()
    }
}
