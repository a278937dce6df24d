//! Shareable results card.
//!
//! The document is self-contained (no fonts, images or stylesheets are
//! referenced) and is a pure function of the measurement result, so the same
//! result always renders to the same bytes.

use serde::Serialize;

use super::normalize::{normalize, UNIT};
use crate::measurement::MeasurementResult;

const CARD_WIDTH: u32 = 400;
const PADDING: u32 = 32;
const HEADER_HEIGHT: u32 = 96;
const ROW_HEIGHT: u32 = 64;
const ROW_GAP: u32 = 12;
const FOOTER_HEIGHT: u32 = 56;

const BADGE: &str = "AI Body Measurements";
const TITLE: &str = "Your Measurements";
const FOOTER: &str = "Generated using AI-based pose estimation";
const ABSENT: &str = "—";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactRow {
    pub label: String,
    /// Formatted value; `None` renders as a dash with no unit.
    pub value: Option<String>,
    pub unit: &'static str,
}

/// A renderable handle for the export pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderableDocument {
    pub width: u32,
    pub height: u32,
    pub badge: String,
    pub title: String,
    pub rows: Vec<ArtifactRow>,
    pub footer: String,
}

pub fn build_shareable_artifact(raw: &MeasurementResult) -> RenderableDocument {
    let rows: Vec<ArtifactRow> = normalize(raw)
        .into_iter()
        .map(|row| ArtifactRow {
            label: row.label.to_string(),
            value: row.formatted_value(),
            unit: UNIT,
        })
        .collect();

    let n = rows.len() as u32;
    let rows_height = n * ROW_HEIGHT + n.saturating_sub(1) * ROW_GAP;
    let height = PADDING * 2 + HEADER_HEIGHT + rows_height + FOOTER_HEIGHT;

    RenderableDocument {
        width: CARD_WIDTH,
        height,
        badge: BADGE.to_string(),
        title: TITLE.to_string(),
        rows,
        footer: FOOTER.to_string(),
    }
}

impl RenderableDocument {
    /// SVG markup for the card, ready for an external rasterizer.
    pub fn to_svg(&self) -> String {
        let inner = self.width.saturating_sub(PADDING * 2);
        let mut svg = String::new();

        svg.push_str(&format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"##,
            w = self.width,
            h = self.height
        ));
        svg.push_str(
            r##"<defs><linearGradient id="bg" x1="0" y1="0" x2="1" y2="1"><stop offset="0" stop-color="#fdfaf6"/><stop offset="1" stop-color="#f1e7dc"/></linearGradient></defs>"##,
        );
        svg.push_str(&format!(
            r##"<rect width="{}" height="{}" rx="16" fill="url(#bg)"/>"##,
            self.width, self.height
        ));

        // Header
        let center = self.width / 2;
        svg.push_str(&format!(
            r##"<rect x="{}" y="{}" width="180" height="26" rx="13" fill="#8b5e3c" fill-opacity="0.1"/>"##,
            center.saturating_sub(90),
            PADDING
        ));
        svg.push_str(&format!(
            r##"<text x="{}" y="{}" text-anchor="middle" font-family="sans-serif" font-size="12" fill="#8b5e3c">{}</text>"##,
            center,
            PADDING + 17,
            escape_xml(&self.badge)
        ));
        svg.push_str(&format!(
            r##"<text x="{}" y="{}" text-anchor="middle" font-family="serif" font-size="22" fill="#2b2118">{}</text>"##,
            center,
            PADDING + 68,
            escape_xml(&self.title)
        ));

        // Rows
        let mut y = PADDING + HEADER_HEIGHT;
        for row in &self.rows {
            svg.push_str(&format!(
                r##"<rect x="{}" y="{}" width="{}" height="{}" rx="12" fill="#ffffff" fill-opacity="0.8" stroke="#e6dccf"/>"##,
                PADDING, y, inner, ROW_HEIGHT
            ));
            let baseline = y + ROW_HEIGHT / 2 + 5;
            svg.push_str(&format!(
                r##"<text x="{}" y="{}" font-family="sans-serif" font-size="14" fill="#2b2118">{}</text>"##,
                PADDING + 20,
                baseline,
                escape_xml(&row.label)
            ));
            let value = match &row.value {
                Some(v) => format!(
                    r##"<tspan font-size="18" font-weight="bold">{}</tspan><tspan font-size="12" fill="#7a6a5c"> {}</tspan>"##,
                    escape_xml(v),
                    row.unit
                ),
                None => format!(r##"<tspan font-size="18" fill="#7a6a5c">{}</tspan>"##, ABSENT),
            };
            svg.push_str(&format!(
                r##"<text x="{}" y="{}" text-anchor="end" font-family="sans-serif" fill="#2b2118">{}</text>"##,
                PADDING + inner - 20,
                baseline,
                value
            ));
            y += ROW_HEIGHT + ROW_GAP;
        }

        // Footer
        let footer_top = self.height.saturating_sub(PADDING + FOOTER_HEIGHT) + 16;
        svg.push_str(&format!(
            r##"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="#e6dccf"/>"##,
            PADDING,
            footer_top,
            PADDING + inner,
            footer_top
        ));
        svg.push_str(&format!(
            r##"<text x="{}" y="{}" text-anchor="middle" font-family="sans-serif" font-size="11" fill="#7a6a5c">{}</text>"##,
            center,
            footer_top + 26,
            escape_xml(&self.footer)
        ));

        svg.push_str("</svg>");
        svg
    }
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
