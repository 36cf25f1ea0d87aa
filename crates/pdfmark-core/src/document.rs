//! Loaded PDF document
//!
//! Thin adapter over `lopdf::Document` that speaks zero-based page indices
//! and the annotation types of this crate.

use crate::annotations::{Annotation, Color, InkStroke, PdfRect, Point, TextNote};
use crate::apply::{apply_annotation, decode_text_string};
use crate::error::PdfMarkError;
use crate::search::{find_text, TextRun};
use lopdf::{Dictionary, Document, Object, ObjectId};
use serde::Serialize;
use std::io::Write;

/// Annotation subtypes this crate writes, plus everything else
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    Ink,
    Text,
    Highlight,
    Other(String),
}

/// An annotation read back from a page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationInfo {
    pub kind: AnnotationKind,
    /// `[llx, lly, urx, ury]`
    pub rect: [f64; 4],
    pub contents: Option<String>,
    /// One point list per `/InkList` entry
    pub ink: Vec<Vec<Point>>,
    pub color: Option<Color>,
}

#[derive(Debug, Clone)]
pub struct PdfDocument {
    doc: Document,
    pages: Vec<ObjectId>,
}

pub(crate) fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some(*f as f64),
        _ => None,
    }
}

impl PdfDocument {
    /// Parse a document from raw bytes
    pub fn open(bytes: &[u8]) -> Result<Self, PdfMarkError> {
        if bytes.is_empty() {
            return Err(PdfMarkError::DocumentLoad("empty input".into()));
        }
        let doc =
            Document::load_mem(bytes).map_err(|e| PdfMarkError::DocumentLoad(e.to_string()))?;
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if pages.is_empty() {
            return Err(PdfMarkError::DocumentLoad("document has no pages".into()));
        }
        Ok(Self { doc, pages })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn check_page(&self, index: usize) -> Result<(), PdfMarkError> {
        if index < self.pages.len() {
            Ok(())
        } else {
            Err(PdfMarkError::InvalidPageIndex {
                index,
                page_count: self.pages.len(),
            })
        }
    }

    fn page_id(&self, index: usize) -> Result<ObjectId, PdfMarkError> {
        self.check_page(index)?;
        Ok(self.pages[index])
    }

    fn page_dict(&self, index: usize) -> Result<&Dictionary, PdfMarkError> {
        let id = self.page_id(index)?;
        Ok(self.doc.get_object(id)?.as_dict()?)
    }

    /// Page width and height in points, following inherited `/MediaBox`
    pub fn page_size(&self, index: usize) -> Result<(f64, f64), PdfMarkError> {
        let mut current = Some(self.page_id(index)?);
        while let Some(id) = current {
            let dict = self.doc.get_object(id)?.as_dict()?;
            if let Some([llx, lly, urx, ury]) = self.media_box(dict) {
                return Ok((urx - llx, ury - lly));
            }
            current = dict.get(b"Parent").and_then(Object::as_reference).ok();
        }
        // Missing MediaBox; viewers fall back to Letter
        Ok(crate::compose::LETTER)
    }

    fn media_box(&self, dict: &Dictionary) -> Option<[f64; 4]> {
        let arr = self.resolve(dict.get(b"MediaBox").ok()?).as_array().ok()?;
        if arr.len() != 4 {
            return None;
        }
        Some([
            number(&arr[0])?,
            number(&arr[1])?,
            number(&arr[2])?,
            number(&arr[3])?,
        ])
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).unwrap_or(obj),
            other => other,
        }
    }

    pub fn apply_ink_annotation(&mut self, stroke: &InkStroke) -> Result<ObjectId, PdfMarkError> {
        let page_id = self.page_id(stroke.page)?;
        apply_annotation(&mut self.doc, page_id, &Annotation::Ink(stroke.clone()))
    }

    pub fn apply_text_annotation(&mut self, note: &TextNote) -> Result<ObjectId, PdfMarkError> {
        let page_id = self.page_id(note.page)?;
        apply_annotation(&mut self.doc, page_id, &Annotation::Text(note.clone()))
    }

    pub fn apply_annotation(
        &mut self,
        page: usize,
        annotation: &Annotation,
    ) -> Result<ObjectId, PdfMarkError> {
        let page_id = self.page_id(page)?;
        apply_annotation(&mut self.doc, page_id, annotation)
    }

    /// Decoded content stream of a page
    fn page_content(&self, index: usize) -> Result<Vec<u8>, PdfMarkError> {
        let id = self.page_id(index)?;
        Ok(self.doc.get_page_content(id)?)
    }

    /// Positioned text runs of a page
    pub fn text_runs(&self, index: usize) -> Result<Vec<TextRun>, PdfMarkError> {
        let content = self.page_content(index)?;
        crate::search::text_runs(&content)
    }

    /// Bounding boxes of every occurrence of `query` on a page
    pub fn search_text(&self, index: usize, query: &str) -> Result<Vec<PdfRect>, PdfMarkError> {
        let runs = self.text_runs(index)?;
        find_text(&runs, query)
    }

    /// Plain text of a page
    pub fn extract_text(&self, index: usize) -> Result<String, PdfMarkError> {
        self.check_page(index)?;
        Ok(self.doc.extract_text(&[index as u32 + 1])?)
    }

    /// Annotations of a page in `/Annots` order
    pub fn annotations(&self, index: usize) -> Result<Vec<AnnotationInfo>, PdfMarkError> {
        let page = self.page_dict(index)?;
        let annots = match page.get(b"Annots") {
            Ok(obj) => self.resolve(obj).as_array()?.clone(),
            Err(_) => return Ok(Vec::new()),
        };

        let mut infos = Vec::with_capacity(annots.len());
        for annot in &annots {
            let dict = self.resolve(annot).as_dict()?;
            infos.push(self.annotation_info(dict));
        }
        Ok(infos)
    }

    fn annotation_info(&self, dict: &Dictionary) -> AnnotationInfo {
        let kind = match dict.get(b"Subtype").and_then(Object::as_name) {
            Ok(b"Ink") => AnnotationKind::Ink,
            Ok(b"Text") => AnnotationKind::Text,
            Ok(b"Highlight") => AnnotationKind::Highlight,
            Ok(other) => AnnotationKind::Other(String::from_utf8_lossy(other).into_owned()),
            Err(_) => AnnotationKind::Other(String::new()),
        };

        let numbers = |key: &[u8]| -> Vec<f64> {
            dict.get(key)
                .ok()
                .and_then(|o| self.resolve(o).as_array().ok())
                .map(|arr| arr.iter().filter_map(number).collect())
                .unwrap_or_default()
        };

        let rect = match numbers(b"Rect").as_slice() {
            [a, b, c, d] => [*a, *b, *c, *d],
            _ => [0.0; 4],
        };

        let contents = dict
            .get(b"Contents")
            .ok()
            .and_then(|o| self.resolve(o).as_str().ok())
            .map(decode_text_string);

        let ink = dict
            .get(b"InkList")
            .ok()
            .and_then(|o| self.resolve(o).as_array().ok())
            .map(|paths| {
                paths
                    .iter()
                    .filter_map(|path| self.resolve(path).as_array().ok())
                    .map(|coords| {
                        coords
                            .chunks_exact(2)
                            .filter_map(|pair| {
                                Some(Point::new(number(&pair[0])?, number(&pair[1])?))
                            })
                            .collect()
                    })
                    .collect()
            })
            .unwrap_or_default();

        let color = match numbers(b"C").as_slice() {
            [r, g, b] => Some(Color::rgb(
                (r * 255.0).round() as u8,
                (g * 255.0).round() as u8,
                (b * 255.0).round() as u8,
            )),
            _ => None,
        };

        AnnotationInfo {
            kind,
            rect,
            contents,
            ink,
            color,
        }
    }

    /// Serialize into a writer
    pub fn save_to<W: Write>(&mut self, target: &mut W) -> Result<(), PdfMarkError> {
        self.doc
            .save_to(target)
            .map_err(|e| PdfMarkError::Save(e.to_string()))
    }

    pub fn serialize(&mut self) -> Result<Vec<u8>, PdfMarkError> {
        let mut buffer = Vec::new();
        self.save_to(&mut buffer)?;
        Ok(buffer)
    }

    pub(crate) fn inner(&self) -> &Document {
        &self.doc
    }

    pub(crate) fn inner_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub(crate) fn page_object_id(&self, index: usize) -> Result<ObjectId, PdfMarkError> {
        self.page_id(index)
    }
}

/// Parse PDF bytes and return page count
pub fn get_page_count(bytes: &[u8]) -> Result<usize, PdfMarkError> {
    Ok(PdfDocument::open(bytes)?.page_count())
}
