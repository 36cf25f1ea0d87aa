//! Text search over page content streams
//!
//! Walks the text operators of a content stream and records where each
//! string is shown. Glyph advances come from the Helvetica metrics, so boxes
//! are estimates for other fonts. Text shown through CID fonts (two-byte
//! codes) is not decoded.

use crate::annotations::{Annotation, Color, PdfRect};
use crate::document::{number, PdfDocument};
use crate::error::PdfMarkError;
use lopdf::content::Content;
use lopdf::Object;
use serde::Serialize;
use tracing::debug;

/// Helvetica widths for WinAnsi 32..=126, in 1/1000 em
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, 556, 556, 556,
    556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, 1015, 667, 667, 722, 722, 667,
    611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667,
    667, 611, 278, 278, 278, 469, 556, 333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500,
    222, 833, 556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

const FALLBACK_WIDTH: u16 = 600;

/// Share of the font size that sits below the baseline
const DESCENT: f64 = 0.2;

fn glyph_width(byte: u8) -> f64 {
    match byte {
        32..=126 => HELVETICA_WIDTHS[(byte - 32) as usize] as f64,
        _ => FALLBACK_WIDTH as f64,
    }
}

/// Width of `text` set in Helvetica at `font_size`
pub(crate) fn text_width(text: &str, font_size: f64) -> f64 {
    text.bytes().map(glyph_width).sum::<f64>() * font_size / 1000.0
}

/// Affine matrix `[a b c d e f]` in PDF row-vector convention
type Matrix = [f64; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

fn multiply(m1: &Matrix, m2: &Matrix) -> Matrix {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

fn transform(m: &Matrix, x: f64, y: f64) -> (f64, f64) {
    (x * m[0] + y * m[2] + m[4], x * m[1] + y * m[3] + m[5])
}

fn translation(tx: f64, ty: f64) -> Matrix {
    [1.0, 0.0, 0.0, 1.0, tx, ty]
}

/// A string shown on the page, with the user-space x of every glyph edge
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextRun {
    pub text: String,
    /// `text.chars().count() + 1` entries: left edge of each glyph, then the right edge of the last
    pub edges: Vec<f64>,
    pub baseline: f64,
    pub height: f64,
}

impl TextRun {
    fn bounds(&self, start: usize, end: usize) -> PdfRect {
        let x0 = self.edges[start].min(self.edges[end]);
        let x1 = self.edges[start].max(self.edges[end]);
        PdfRect {
            x: x0,
            y: self.baseline - self.height * DESCENT,
            width: x1 - x0,
            height: self.height,
        }
    }
}

#[derive(Debug, Clone)]
struct TextState {
    ctm: Matrix,
    tm: Matrix,
    tlm: Matrix,
    font_size: f64,
    leading: f64,
    char_spacing: f64,
    word_spacing: f64,
    horizontal_scale: f64,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            ctm: IDENTITY,
            tm: IDENTITY,
            tlm: IDENTITY,
            font_size: 0.0,
            leading: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
        }
    }
}

impl TextState {
    fn move_line(&mut self, tx: f64, ty: f64) {
        self.tlm = multiply(&translation(tx, ty), &self.tlm);
        self.tm = self.tlm;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    /// Advance the text matrix by a horizontal displacement in text space
    fn advance(&mut self, tx: f64) {
        self.tm = multiply(&translation(tx, 0.0), &self.tm);
    }

    fn glyph_advance(&self, byte: u8) -> f64 {
        let mut w = glyph_width(byte) / 1000.0 * self.font_size + self.char_spacing;
        if byte == b' ' {
            w += self.word_spacing;
        }
        w * self.horizontal_scale
    }

    fn user_x(&self) -> f64 {
        transform(&multiply(&self.tm, &self.ctm), 0.0, 0.0).0
    }
}

/// Accumulates one run per show operator
struct RunBuilder {
    text: String,
    edges: Vec<f64>,
    baseline: f64,
    height: f64,
}

impl RunBuilder {
    fn start(state: &TextState) -> Self {
        let trm = multiply(&state.tm, &state.ctm);
        let (x, baseline) = transform(&trm, 0.0, 0.0);
        let scale_y = (trm[2] * trm[2] + trm[3] * trm[3]).sqrt();
        Self {
            text: String::new(),
            edges: vec![x],
            baseline,
            height: state.font_size * scale_y,
        }
    }

    fn show(&mut self, state: &mut TextState, bytes: &[u8]) {
        for &byte in bytes {
            self.text.push(byte as char);
            state.advance(state.glyph_advance(byte));
            self.edges.push(state.user_x());
        }
    }

    fn finish(self) -> Option<TextRun> {
        if self.text.is_empty() {
            return None;
        }
        Some(TextRun {
            text: self.text,
            edges: self.edges,
            baseline: self.baseline,
            height: self.height,
        })
    }
}

fn operand(operands: &[Object], index: usize) -> f64 {
    operands.get(index).and_then(number).unwrap_or(0.0)
}

/// Extract positioned text runs from a decoded content stream
pub fn text_runs(content: &[u8]) -> Result<Vec<TextRun>, PdfMarkError> {
    let content = Content::decode(content)
        .map_err(|e| PdfMarkError::Operation(format!("Failed to decode content: {}", e)))?;

    let mut state = TextState::default();
    let mut saved: Vec<Matrix> = Vec::new();
    let mut runs = Vec::new();

    for op in &content.operations {
        let ops = op.operands.as_slice();
        match op.operator.as_str() {
            "q" => saved.push(state.ctm),
            "Q" => {
                if let Some(ctm) = saved.pop() {
                    state.ctm = ctm;
                }
            }
            "cm" if ops.len() == 6 => {
                let m = [
                    operand(ops, 0),
                    operand(ops, 1),
                    operand(ops, 2),
                    operand(ops, 3),
                    operand(ops, 4),
                    operand(ops, 5),
                ];
                state.ctm = multiply(&m, &state.ctm);
            }
            "BT" => {
                state.tm = IDENTITY;
                state.tlm = IDENTITY;
            }
            "Tf" => state.font_size = operand(ops, 1),
            "TL" => state.leading = operand(ops, 0),
            "Tc" => state.char_spacing = operand(ops, 0),
            "Tw" => state.word_spacing = operand(ops, 0),
            "Tz" => state.horizontal_scale = operand(ops, 0) / 100.0,
            "Td" => state.move_line(operand(ops, 0), operand(ops, 1)),
            "TD" => {
                state.leading = -operand(ops, 1);
                state.move_line(operand(ops, 0), operand(ops, 1));
            }
            "Tm" if ops.len() == 6 => {
                state.tlm = [
                    operand(ops, 0),
                    operand(ops, 1),
                    operand(ops, 2),
                    operand(ops, 3),
                    operand(ops, 4),
                    operand(ops, 5),
                ];
                state.tm = state.tlm;
            }
            "T*" => state.next_line(),
            "Tj" | "'" | "\"" => {
                let string_index = match op.operator.as_str() {
                    "'" => {
                        state.next_line();
                        0
                    }
                    "\"" => {
                        state.word_spacing = operand(ops, 0);
                        state.char_spacing = operand(ops, 1);
                        state.next_line();
                        2
                    }
                    _ => 0,
                };
                if let Some(Object::String(bytes, _)) = ops.get(string_index) {
                    let mut run = RunBuilder::start(&state);
                    run.show(&mut state, bytes);
                    runs.extend(run.finish());
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = ops.first() {
                    let mut run = RunBuilder::start(&state);
                    for item in items {
                        match item {
                            Object::String(bytes, _) => run.show(&mut state, bytes),
                            other => {
                                if let Some(adjust) = number(other) {
                                    let tx = -adjust / 1000.0
                                        * state.font_size
                                        * state.horizontal_scale;
                                    state.advance(tx);
                                    if let Some(last) = run.edges.last_mut() {
                                        *last = state.user_x();
                                    }
                                }
                            }
                        }
                    }
                    runs.extend(run.finish());
                }
            }
            _ => {}
        }
    }

    Ok(runs)
}

/// Bounding boxes of every occurrence of `query`, ASCII case-insensitive
pub fn find_text(runs: &[TextRun], query: &str) -> Result<Vec<PdfRect>, PdfMarkError> {
    if query.trim().is_empty() {
        return Err(PdfMarkError::InvalidQuery("query is empty".into()));
    }
    let needle: Vec<char> = query.chars().map(|c| c.to_ascii_lowercase()).collect();

    let mut hits = Vec::new();
    for run in runs {
        let haystack: Vec<char> = run.text.chars().map(|c| c.to_ascii_lowercase()).collect();
        let mut start = 0;
        while start + needle.len() <= haystack.len() {
            if haystack[start..start + needle.len()] == needle[..] {
                hits.push(run.bounds(start, start + needle.len()));
                start += needle.len();
            } else {
                start += 1;
            }
        }
    }
    Ok(hits)
}

/// Result of highlighting search hits on a page
#[derive(Debug, Clone)]
pub struct HighlightOutcome {
    pub pdf: Vec<u8>,
    pub matches: Vec<PdfRect>,
}

/// Search a page and add one highlight annotation per hit
pub fn highlight_matches(
    bytes: &[u8],
    page: usize,
    query: &str,
    color: Color,
    opacity: f64,
) -> Result<HighlightOutcome, PdfMarkError> {
    let mut doc = PdfDocument::open(bytes)?;
    let matches = doc.search_text(page, query)?;
    debug!(page, query, hits = matches.len(), "highlighting search hits");

    for rect in &matches {
        doc.apply_annotation(
            page,
            &Annotation::Highlight {
                rect: rect.clone(),
                color,
                opacity,
            },
        )?;
    }

    Ok(HighlightOutcome {
        pdf: doc.serialize()?,
        matches,
    })
}
