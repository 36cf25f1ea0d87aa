//! Pending annotation records
//!
//! Ink strokes and text notes are recorded here while the user edits, and
//! only become PDF objects when the session is flushed.

use crate::error::PdfMarkError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest coordinate magnitude accepted for annotation geometry
pub const MAX_COORDINATE: f64 = 1.0e9;

/// Validate a coordinate and round it to the single precision PDF reals are
/// stored with, so recorded and written values agree
pub fn pdf_coordinate(value: f64) -> Result<f64, PdfMarkError> {
    if !value.is_finite() || value.abs() > MAX_COORDINATE {
        return Err(PdfMarkError::InvalidCoordinate(format!(
            "{} is not finite or exceeds {}",
            value, MAX_COORDINATE
        )));
    }
    Ok(value as f32 as f64)
}

/// A point in PDF user space (origin at the bottom-left of the page)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The point as it will be written to a PDF
    pub fn to_pdf_precision(self) -> Result<Self, PdfMarkError> {
        Ok(Self::new(pdf_coordinate(self.x)?, pdf_coordinate(self.y)?))
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PdfRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PdfRect {
    /// Rect as a PDF `[llx lly urx ury]` quadruple
    pub fn corners(&self) -> [f64; 4] {
        [self.x, self.y, self.x + self.width, self.y + self.height]
    }
}

/// RGB color, serialized as `#RRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse hex color string (e.g., "#FF0000" or "FF0000")
    pub fn from_hex(color: &str) -> Result<Self, PdfMarkError> {
        let hex = color.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(PdfMarkError::InvalidColor(color.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|_| PdfMarkError::InvalidColor(color.to_string()))
        };
        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// RGB floats in the 0-1 range used by PDF color operators
    pub fn components(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for Color {
    type Error = PdfMarkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// A freehand stroke drawn on one page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InkStroke {
    pub page: usize,
    pub points: Vec<Point>,
    pub color: Color,
    pub width: f64,
}

/// A text note anchored at a point on one page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextNote {
    pub page: usize,
    pub text: String,
    pub anchor: Point,
    #[serde(default)]
    pub color: Color,
}

/// Anything that can be written onto a page as an annotation
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    Ink(InkStroke),
    Text(TextNote),
    Highlight {
        rect: PdfRect,
        color: Color,
        opacity: f64,
    },
}

/// Per-page ordered lists of pending annotations
///
/// Holds exactly one entry per page of the loaded document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationMap<T> {
    pages: Vec<Vec<T>>,
}

impl<T> Default for AnnotationMap<T> {
    fn default() -> Self {
        Self { pages: Vec::new() }
    }
}

impl<T> AnnotationMap<T> {
    pub fn with_pages(page_count: usize) -> Self {
        let mut pages = Vec::with_capacity(page_count);
        pages.resize_with(page_count, Vec::new);
        Self { pages }
    }

    /// Drop all entries and size the map for a new document
    pub fn reset(&mut self, page_count: usize) {
        *self = Self::with_pages(page_count);
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn push(&mut self, page: usize, item: T) -> Result<(), PdfMarkError> {
        let page_count = self.pages.len();
        let entries = self
            .pages
            .get_mut(page)
            .ok_or(PdfMarkError::InvalidPageIndex {
                index: page,
                page_count,
            })?;
        entries.push(item);
        Ok(())
    }

    pub fn for_page(&self, page: usize) -> &[T] {
        self.pages.get(page).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Pages with their entries, in page order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[T])> {
        self.pages
            .iter()
            .enumerate()
            .map(|(page, entries)| (page, entries.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.pages.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.iter().all(Vec::is_empty)
    }
}
