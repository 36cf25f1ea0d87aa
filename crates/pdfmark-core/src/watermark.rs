//! Diagonal text watermark stamped on every page

use crate::annotations::Color;
use crate::compose::escape_pdf_string;
use crate::document::PdfDocument;
use crate::error::PdfMarkError;
use crate::resources::{append_content, register_resource};
use crate::search::text_width;
use lopdf::{dictionary, Object};
use serde::{Deserialize, Serialize};
use tracing::debug;

const FONT_NAME: &str = "FWm";
const GSTATE_NAME: &str = "GSWm";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkStyle {
    pub text: String,
    /// `None` scales the text to a quarter of the shorter page side
    pub font_size: Option<f64>,
    pub opacity: f64,
    pub color: Color,
    /// Counter-clockwise, in degrees
    pub angle: f64,
}

impl Default for WatermarkStyle {
    fn default() -> Self {
        Self {
            text: "DRAFT".into(),
            font_size: None,
            opacity: 0.18,
            color: Color::RED,
            angle: 45.0,
        }
    }
}

fn stamp(style: &WatermarkStyle, (width, height): (f64, f64)) -> String {
    let font_size = style.font_size.unwrap_or(0.25 * width.min(height));
    let theta = style.angle.to_radians();
    let (cos, sin) = (theta.cos(), theta.sin());
    let [r, g, b] = style.color.components();
    let dx = -text_width(&style.text, font_size) / 2.0;
    let dy = -font_size * 0.35;

    format!(
        "q\n/{gs} gs\n{r} {g} {b} rg\n{cos:.5} {sin:.5} {nsin:.5} {cos:.5} {cx:.3} {cy:.3} cm\n\
         BT\n/{font} {fs:.3} Tf\n{dx:.3} {dy:.3} Td\n({text}) Tj\nET\nQ\n",
        gs = GSTATE_NAME,
        font = FONT_NAME,
        nsin = -sin,
        cx = width / 2.0,
        cy = height / 2.0,
        fs = font_size,
        text = escape_pdf_string(&style.text),
    )
}

/// Stamp `style.text` across the centre of every page
pub fn apply_watermark(bytes: &[u8], style: &WatermarkStyle) -> Result<Vec<u8>, PdfMarkError> {
    if style.text.trim().is_empty() {
        return Err(PdfMarkError::Operation("Watermark text is empty".into()));
    }
    if let Some(size) = style.font_size {
        if !(size.is_finite() && size > 0.0) {
            return Err(PdfMarkError::Operation(format!(
                "Invalid watermark font size: {}",
                size
            )));
        }
    }

    let mut doc = PdfDocument::open(bytes)?;
    let opacity = style.opacity.clamp(0.0, 1.0) as f32;

    let (font_id, gs_id) = {
        let inner = doc.inner_mut();
        let font_id = inner.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
        });
        let gs_id = inner.add_object(dictionary! {
            "Type" => "ExtGState",
            "BM" => "Normal",
            "ca" => Object::Real(opacity),
            "CA" => Object::Real(opacity),
        });
        (font_id, gs_id)
    };

    for page in 0..doc.page_count() {
        let size = doc.page_size(page)?;
        let page_id = doc.page_object_id(page)?;
        let inner = doc.inner_mut();
        register_resource(inner, page_id, "Font", FONT_NAME, font_id)?;
        register_resource(inner, page_id, "ExtGState", GSTATE_NAME, gs_id)?;
        append_content(inner, page_id, stamp(style, size).into_bytes())?;
    }

    debug!(pages = doc.page_count(), text = %style.text, "watermark applied");
    doc.serialize()
}
