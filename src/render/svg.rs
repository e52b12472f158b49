//! SVG scene for a measured table
//!
//! Coordinates are points (1/72 inch); the rasterizer scales them to the requested DPI.

use super::layout::{TableCells, TableLayout};
use crate::config::RenderConfig;
use std::fmt::Write;

const POINTS_PER_INCH: f32 = 72.0;

/// Page background behind the table margins
const PAGE_FILL: &str = "#FFFFFF";

/// Build the SVG document for `cells` laid out as `layout`
pub fn compose_svg(cells: &TableCells, layout: &TableLayout, config: &RenderConfig) -> String {
    let pt = |inches: f32| inches * POINTS_PER_INCH;
    let (width, height) = (pt(layout.width), pt(layout.height));

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.2}" height="{h:.2}" viewBox="0 0 {w:.2} {h:.2}">"#,
        w = width,
        h = height
    );
    let _ = writeln!(
        svg,
        r#"<rect x="0" y="0" width="{:.2}" height="{:.2}" fill="{}"/>"#,
        width, height, PAGE_FILL
    );

    let header = std::iter::once(&cells.header);
    for (row, values) in header.chain(cells.rows.iter()).enumerate() {
        let is_header = row == 0;
        let (fill, text_color, weight) = if is_header {
            (&config.header_fill, &config.header_text, "bold")
        } else {
            (&config.body_fill, &config.body_text, "normal")
        };

        for col in 0..layout.n_cols() {
            let rect = layout.cell_rect(row, col);
            let _ = writeln!(
                svg,
                r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}" stroke="{}" stroke-width="{:.2}"/>"#,
                pt(rect.x),
                pt(rect.y),
                pt(rect.width),
                pt(rect.height),
                fill,
                config.grid_color,
                config.grid_width_pt
            );

            let text = values.get(col).map(String::as_str).unwrap_or("");
            if text.is_empty() {
                continue;
            }
            let (cx, cy) = rect.center();
            // Baseline sits a little below the middle so glyphs look centered
            let baseline = pt(cy) + config.font_size_pt * 0.35;
            let _ = writeln!(
                svg,
                r#"<text x="{:.2}" y="{:.2}" font-family="{}" font-size="{:.2}" font-weight="{}" text-anchor="middle" fill="{}">{}</text>"#,
                pt(cx),
                baseline,
                escape_xml(&config.font_family),
                config.font_size_pt,
                weight,
                text_color,
                escape_xml(text)
            );
        }
    }

    svg.push_str("</svg>\n");
    svg
}

fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c if c.is_control() => escaped.push(' '),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Parse a hex color string to RGB array
///
/// Supports formats:
/// - `#RRGGBB` (6 hex digits)
/// - `#RRGGBBAA` (8 hex digits, alpha ignored)
/// - `RRGGBB` (without #)
/// - `RRGGBBAA` (without #)
pub fn parse_hex_color(hex: &str) -> Option<[u8; 3]> {
    let hex = hex.trim_start_matches('#');

    // Handle 6-digit (RGB) or 8-digit (RGBA) hex
    if hex.len() != 6 && hex.len() != 8 {
        return None;
    }
    if !hex.is_ascii() {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some([r, g, b])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (TableCells, TableLayout, RenderConfig) {
        let cells = TableCells {
            header: vec!["Cluster".into(), "EventName".into()],
            rows: vec![vec!["Pune-1".into(), "A&B <x>".into()], vec!["Goa".into(), "".into()]],
        };
        let config = RenderConfig::default();
        let layout = TableLayout::compute(&cells, None, &config).unwrap();
        (cells, layout, config)
    }

    #[test]
    fn test_parse_hex_color() {
        // 6-digit hex
        assert_eq!(parse_hex_color("#FF0000"), Some([255, 0, 0]));
        assert_eq!(parse_hex_color("#FFFF00"), Some([255, 255, 0]));
        assert_eq!(parse_hex_color("#1F78B4"), Some([31, 120, 180]));

        // Without #
        assert_eq!(parse_hex_color("FF0000"), Some([255, 0, 0]));

        // 8-digit hex (with alpha, ignored)
        assert_eq!(parse_hex_color("#440154FF"), Some([68, 1, 84]));

        // Invalid
        assert_eq!(parse_hex_color("#FFF"), None); // Too short
        assert_eq!(parse_hex_color("GGGGGG"), None); // Invalid hex
        assert_eq!(parse_hex_color("yellow"), None);
    }

    #[test]
    fn test_header_and_body_styles() {
        let (cells, layout, config) = sample();
        let svg = compose_svg(&cells, &layout, &config);

        // 2 columns x (1 header + 2 rows) cells plus the page background
        assert_eq!(svg.matches("<rect").count(), 7);
        assert_eq!(svg.matches(r##"fill="#FFFF00""##).count(), 2);
        assert_eq!(svg.matches(r#"font-weight="bold""#).count(), 2);
        // Empty cell gets a box but no text
        assert_eq!(svg.matches("<text").count(), 5);
    }

    #[test]
    fn test_text_is_escaped() {
        let (cells, layout, config) = sample();
        let svg = compose_svg(&cells, &layout, &config);

        assert!(svg.contains(">A&amp;B &lt;x&gt;</text>"));
        assert!(!svg.contains("A&B"));
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml(r#"a"b'c"#), "a&quot;b&apos;c");
        assert_eq!(escape_xml("tab\there"), "tab here");
    }
}
