//! Annotation session store
//!
//! An [`AnnotationSession`] owns one loaded document together with the ink
//! strokes and text notes the user has added to it. Nothing is written into
//! the document until [`AnnotationSession::flush`], which replays the whole
//! history onto a fresh copy every time it is called.
//!
//! ```text
//! Empty --load--> Loaded --load--> Loaded (previous annotations discarded)
//!                   |
//!                   +--close--> Empty
//! ```

use crate::annotations::{
    pdf_coordinate, AnnotationMap, Color, InkStroke, PdfRect, Point, TextNote,
};
use crate::command::{BatchOutcome, SessionCommand};
use crate::document::PdfDocument;
use crate::error::PdfMarkError;
use crate::render::{check_scale, PageRasterizer, RasterImage};
use crate::tool::{Tool, ToolInput};
use serde::Serialize;
use std::io::Write;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Empty,
    Loaded,
}

/// Snapshot of a session for status reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub state: SessionState,
    pub page_count: usize,
    pub current_page: usize,
    pub tool: Tool,
    pub pending_ink: usize,
    pub pending_text: usize,
}

#[derive(Debug, Clone)]
struct LoadedDocument {
    /// Bytes as uploaded; rasterizers read these
    source: Vec<u8>,
    document: PdfDocument,
}

#[derive(Debug, Default)]
pub struct AnnotationSession {
    loaded: Option<LoadedDocument>,
    ink: AnnotationMap<InkStroke>,
    text: AnnotationMap<TextNote>,
    current_page: usize,
    tool: Tool,
}

/// Stroke points as they will be written, or the first unwritable one
fn stroke_points(points: Vec<Point>) -> Result<Vec<Point>, PdfMarkError> {
    if points.is_empty() {
        return Err(PdfMarkError::InvalidStroke(
            "a stroke needs at least one point".into(),
        ));
    }
    points.into_iter().map(Point::to_pdf_precision).collect()
}

fn stroke_width(width: f64) -> Result<f64, PdfMarkError> {
    if width.is_nan() || width <= 0.0 {
        return Err(PdfMarkError::InvalidStroke(format!(
            "width must be positive, got {}",
            width
        )));
    }
    pdf_coordinate(width)
}

impl AnnotationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        if self.loaded.is_some() {
            SessionState::Loaded
        } else {
            SessionState::Empty
        }
    }

    /// Pages of the loaded document, 0 when empty
    pub fn page_count(&self) -> usize {
        self.loaded
            .as_ref()
            .map_or(0, |loaded| loaded.document.page_count())
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn document(&self) -> Option<&PdfDocument> {
        self.loaded.as_ref().map(|loaded| &loaded.document)
    }

    /// Open a new document, discarding the previous one and all its pending
    /// annotations. On failure the session is left as it was.
    pub fn load(&mut self, bytes: Vec<u8>) -> Result<&PdfDocument, PdfMarkError> {
        let document = match PdfDocument::open(&bytes) {
            Ok(document) => document,
            Err(err) => {
                warn!(size = bytes.len(), error = %err, "document load failed");
                return Err(err);
            }
        };

        let page_count = document.page_count();
        self.ink.reset(page_count);
        self.text.reset(page_count);
        self.current_page = 0;
        self.tool = Tool::default();
        info!(pages = page_count, size = bytes.len(), "document loaded");

        let loaded = self.loaded.insert(LoadedDocument {
            source: bytes,
            document,
        });
        Ok(&loaded.document)
    }

    /// Drop the loaded document and everything pending on it
    pub fn close(&mut self) {
        if self.loaded.take().is_some() {
            debug!(discarded = self.pending_count(), "session closed");
        }
        self.ink.reset(0);
        self.text.reset(0);
        self.current_page = 0;
        self.tool = Tool::default();
    }

    fn check_page(&self, page: usize) -> Result<(), PdfMarkError> {
        let page_count = self.page_count();
        if page < page_count {
            Ok(())
        } else {
            Err(PdfMarkError::InvalidPageIndex {
                index: page,
                page_count,
            })
        }
    }

    fn loaded(&self) -> Result<&LoadedDocument, PdfMarkError> {
        self.loaded.as_ref().ok_or(PdfMarkError::NoDocument)
    }

    pub fn add_ink_stroke(
        &mut self,
        page: usize,
        points: Vec<Point>,
        color: Color,
        width: f64,
    ) -> Result<(), PdfMarkError> {
        self.check_page(page)?;
        let points = stroke_points(points)?;
        let width = stroke_width(width)?;

        debug!(page, points = points.len(), "ink stroke added");
        self.ink.push(
            page,
            InkStroke {
                page,
                points,
                color,
                width,
            },
        )
    }

    pub fn add_text_note(
        &mut self,
        text: impl Into<String>,
        x: f64,
        y: f64,
        page: usize,
    ) -> Result<(), PdfMarkError> {
        self.push_text_note(text.into(), Point::new(x, y), page, Color::default())
    }

    fn push_text_note(
        &mut self,
        text: String,
        anchor: Point,
        page: usize,
        color: Color,
    ) -> Result<(), PdfMarkError> {
        self.check_page(page)?;
        let anchor = anchor.to_pdf_precision()?;
        debug!(page, len = text.len(), "text note added");
        self.text.push(
            page,
            TextNote {
                page,
                text,
                anchor,
                color,
            },
        )
    }

    /// Move to another page; out-of-range requests are rejected, never clamped
    pub fn select_page(&mut self, page: usize) -> Result<(), PdfMarkError> {
        self.check_page(page)?;
        self.current_page = page;
        Ok(())
    }

    pub fn select_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    /// Turn a gesture on the current page into an annotation using the
    /// active tool
    pub fn apply_tool(&mut self, input: ToolInput) -> Result<(), PdfMarkError> {
        let page = self.current_page;
        match (self.tool, input) {
            (Tool::Ink { color, width }, ToolInput::Stroke { points }) => {
                self.add_ink_stroke(page, points, color, width)
            }
            (Tool::Text { color }, ToolInput::Place { x, y, text }) => {
                self.push_text_note(text, Point::new(x, y), page, color)
            }
            (tool, input) => Err(PdfMarkError::ToolMismatch {
                tool: tool.name(),
                input: input.name(),
            }),
        }
    }

    pub fn execute(&mut self, command: SessionCommand) -> Result<(), PdfMarkError> {
        match command {
            SessionCommand::AddInkStroke {
                page,
                points,
                color,
                width,
            } => self.add_ink_stroke(page, points, color, width),
            SessionCommand::AddTextNote { page, text, x, y } => {
                self.add_text_note(text, x, y, page)
            }
            SessionCommand::SelectPage { page } => self.select_page(page),
            SessionCommand::SelectTool { tool } => {
                self.select_tool(tool);
                Ok(())
            }
            SessionCommand::UseTool { input } => self.apply_tool(input),
        }
    }

    /// Run commands in order, stopping at the first failure. Commands before
    /// the failing one stay applied.
    pub fn execute_all(
        &mut self,
        commands: impl IntoIterator<Item = SessionCommand>,
    ) -> BatchOutcome {
        let mut applied = 0;
        for (index, command) in commands.into_iter().enumerate() {
            if let Err(err) = self.execute(command) {
                debug!(index, error = %err, "batch stopped");
                return BatchOutcome {
                    applied,
                    failed_at: Some(index),
                    error: Some(err.to_string()),
                };
            }
            applied += 1;
        }
        BatchOutcome {
            applied,
            failed_at: None,
            error: None,
        }
    }

    pub fn ink_strokes(&self, page: usize) -> &[InkStroke] {
        self.ink.for_page(page)
    }

    pub fn text_notes(&self, page: usize) -> &[TextNote] {
        self.text.for_page(page)
    }

    pub fn ink_map(&self) -> &AnnotationMap<InkStroke> {
        &self.ink
    }

    pub fn text_map(&self) -> &AnnotationMap<TextNote> {
        &self.text
    }

    pub fn pending_count(&self) -> usize {
        self.ink.len() + self.text.len()
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            state: self.state(),
            page_count: self.page_count(),
            current_page: self.current_page,
            tool: self.tool,
            pending_ink: self.ink.len(),
            pending_text: self.text.len(),
        }
    }

    /// Apply every pending annotation to a copy of the loaded document and
    /// write the result. Ink goes first on each page, then text notes, both
    /// in insertion order. Pending annotations are kept, and any failure is
    /// reported as [`PdfMarkError::Save`].
    pub fn flush_to<W: Write>(&self, target: &mut W) -> Result<(), PdfMarkError> {
        let mut copy = self.loaded()?.document.clone();

        if let Err(err) = self.write_pending(&mut copy, target) {
            warn!(error = %err, "flush failed, pending annotations kept");
            return Err(match err {
                PdfMarkError::Save(_) => err,
                other => PdfMarkError::Save(other.to_string()),
            });
        }
        info!(
            ink = self.ink.len(),
            text = self.text.len(),
            "session flushed"
        );
        Ok(())
    }

    fn write_pending<W: Write>(
        &self,
        copy: &mut PdfDocument,
        target: &mut W,
    ) -> Result<(), PdfMarkError> {
        for (_, strokes) in self.ink.iter() {
            for stroke in strokes {
                copy.apply_ink_annotation(stroke)?;
            }
        }
        for (_, notes) in self.text.iter() {
            for note in notes {
                copy.apply_text_annotation(note)?;
            }
        }
        copy.save_to(target)
    }

    pub fn flush(&self) -> Result<Vec<u8>, PdfMarkError> {
        let mut buffer = Vec::new();
        self.flush_to(&mut buffer)?;
        Ok(buffer)
    }

    /// Rasterize a page of the document as loaded. Pending annotations are
    /// not drawn.
    pub fn render_page(
        &self,
        rasterizer: &dyn PageRasterizer,
        page: usize,
        scale: f32,
    ) -> Result<RasterImage, PdfMarkError> {
        let loaded = self.loaded()?;
        self.check_page(page)?;
        check_scale(scale)?;
        rasterizer.rasterize(&loaded.source, page, scale)
    }

    pub fn search_text(&self, page: usize, query: &str) -> Result<Vec<PdfRect>, PdfMarkError> {
        let loaded = self.loaded()?;
        loaded.document.search_text(page, query)
    }

    /// Plain text of a page of the loaded document
    pub fn extract_text(&self, page: usize) -> Result<String, PdfMarkError> {
        self.loaded()?.document.extract_text(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::{create_blank_document, create_document, PageSpec};
    use crate::document::AnnotationKind;
    use std::io;

    fn loaded(pages: usize) -> AnnotationSession {
        let mut session = AnnotationSession::new();
        session.load(create_blank_document(pages).unwrap()).unwrap();
        session
    }

    fn line() -> Vec<Point> {
        vec![Point::new(10.0, 10.0), Point::new(20.0, 20.0)]
    }

    #[test]
    fn test_new_session_is_empty() {
        let session = AnnotationSession::new();
        assert_eq!(session.state(), SessionState::Empty);
        assert_eq!(session.page_count(), 0);
        assert_eq!(session.tool(), Tool::Select);
        assert!(matches!(session.flush(), Err(PdfMarkError::NoDocument)));
    }

    #[test]
    fn test_load_sizes_maps_to_page_count() {
        let session = loaded(3);
        assert_eq!(session.state(), SessionState::Loaded);
        assert_eq!(session.page_count(), 3);
        assert_eq!(session.ink_map().page_count(), 3);
        assert_eq!(session.text_map().page_count(), 3);
        assert!(session.ink_map().is_empty());
        assert!(session.text_map().is_empty());
        assert_eq!(session.current_page(), 0);
    }

    #[test]
    fn test_failed_load_keeps_previous_document() {
        let mut session = loaded(2);
        session.add_text_note("keep", 1.0, 1.0, 1).unwrap();
        session.select_page(1).unwrap();

        assert!(matches!(
            session.load(b"garbage".to_vec()),
            Err(PdfMarkError::DocumentLoad(_))
        ));
        assert_eq!(session.page_count(), 2);
        assert_eq!(session.current_page(), 1);
        assert_eq!(session.text_notes(1).len(), 1);
    }

    #[test]
    fn test_failed_load_from_empty_stays_empty() {
        let mut session = AnnotationSession::new();
        assert!(session.load(Vec::new()).is_err());
        assert_eq!(session.state(), SessionState::Empty);
    }

    #[test]
    fn test_adds_on_empty_session_are_invalid_page() {
        let mut session = AnnotationSession::new();
        assert!(matches!(
            session.add_ink_stroke(0, line(), Color::BLACK, 1.0),
            Err(PdfMarkError::InvalidPageIndex {
                index: 0,
                page_count: 0
            })
        ));
        assert!(matches!(
            session.add_text_note("x", 0.0, 0.0, 0),
            Err(PdfMarkError::InvalidPageIndex { .. })
        ));
        assert!(session.select_page(0).is_err());
    }

    #[test]
    fn test_out_of_range_leaves_maps_unchanged() {
        let mut session = loaded(2);
        session.add_ink_stroke(0, line(), Color::RED, 2.0).unwrap();

        assert!(session.add_ink_stroke(2, line(), Color::RED, 2.0).is_err());
        assert!(session.add_text_note("x", 0.0, 0.0, 7).is_err());
        assert!(matches!(
            session.select_page(2),
            Err(PdfMarkError::InvalidPageIndex {
                index: 2,
                page_count: 2
            })
        ));

        assert_eq!(session.ink_map().len(), 1);
        assert!(session.text_map().is_empty());
        assert_eq!(session.current_page(), 0);
    }

    #[test]
    fn test_invalid_strokes_are_rejected() {
        let mut session = loaded(1);
        assert!(matches!(
            session.add_ink_stroke(0, Vec::new(), Color::BLACK, 1.0),
            Err(PdfMarkError::InvalidStroke(_))
        ));
        assert!(matches!(
            session.add_ink_stroke(0, vec![Point::new(f64::NAN, 0.0)], Color::BLACK, 1.0),
            Err(PdfMarkError::InvalidCoordinate(_))
        ));
        assert!(session.add_ink_stroke(0, line(), Color::BLACK, 0.0).is_err());
        assert!(session.add_ink_stroke(0, line(), Color::BLACK, f64::NAN).is_err());
        assert_eq!(session.pending_count(), 0);
    }

    #[test]
    fn test_unwritable_coordinates_are_rejected() {
        let mut session = loaded(1);
        let far = vec![Point::new(1e300, 0.0)];
        assert!(matches!(
            session.add_ink_stroke(0, far, Color::BLACK, 1.0),
            Err(PdfMarkError::InvalidCoordinate(_))
        ));
        assert!(session.add_ink_stroke(0, line(), Color::BLACK, 1e300).is_err());
        for (x, y) in [(f64::NAN, 5.0), (5.0, f64::INFINITY), (1e300, 0.0)] {
            assert!(matches!(
                session.add_text_note("nowhere", x, y, 0),
                Err(PdfMarkError::InvalidCoordinate(_))
            ));
        }
        assert_eq!(session.pending_count(), 0);

        let out = PdfDocument::open(&session.flush().unwrap()).unwrap();
        assert!(out.annotations(0).unwrap().is_empty());
    }

    #[test]
    fn test_fractional_coordinates_match_after_flush() {
        let mut session = loaded(1);
        let points = vec![Point::new(10.1, 20.2), Point::new(30.3, 40.4)];
        session
            .add_ink_stroke(0, points.clone(), Color::RED, 1.5)
            .unwrap();
        session.add_text_note("there", 7.7, 8.8, 0).unwrap();

        let recorded = session.ink_strokes(0)[0].points.clone();
        for (kept, given) in recorded.iter().zip(&points) {
            assert!((kept.x - given.x).abs() < 1e-5 && (kept.y - given.y).abs() < 1e-5);
        }
        let anchor = session.text_notes(0)[0].anchor;

        let out = PdfDocument::open(&session.flush().unwrap()).unwrap();
        let annots = out.annotations(0).unwrap();
        assert_eq!(annots[0].ink, vec![recorded]);
        assert_eq!(&annots[1].rect[..2], &[anchor.x, anchor.y]);
    }

    #[test]
    fn test_three_page_session() {
        let mut session = loaded(3);
        session.add_ink_stroke(0, line(), Color::BLACK, 2.0).unwrap();
        session.add_text_note("hello", 5.0, 5.0, 1).unwrap();

        let out = PdfDocument::open(&session.flush().unwrap()).unwrap();

        let page0 = out.annotations(0).unwrap();
        assert_eq!(page0.len(), 1);
        assert_eq!(page0[0].kind, AnnotationKind::Ink);
        assert_eq!(page0[0].ink, vec![line()]);

        let page1 = out.annotations(1).unwrap();
        assert_eq!(page1.len(), 1);
        assert_eq!(page1[0].kind, AnnotationKind::Text);
        assert_eq!(page1[0].contents.as_deref(), Some("hello"));
        assert_eq!(&page1[0].rect[..2], &[5.0, 5.0]);

        assert!(out.annotations(2).unwrap().is_empty());
    }

    #[test]
    fn test_flush_keeps_insertion_order() {
        let mut session = loaded(1);
        for text in ["first", "second", "third"] {
            session.add_text_note(text, 0.0, 0.0, 0).unwrap();
        }
        let out = PdfDocument::open(&session.flush().unwrap()).unwrap();
        let contents: Vec<_> = out
            .annotations(0)
            .unwrap()
            .into_iter()
            .filter_map(|a| a.contents)
            .collect();
        assert_eq!(contents, ["first", "second", "third"]);
    }

    #[test]
    fn test_repeated_flush_is_stable() {
        let mut session = loaded(2);
        session.add_ink_stroke(1, line(), Color::RED, 3.0).unwrap();
        session.add_text_note("again", 50.0, 60.0, 0).unwrap();

        let first = PdfDocument::open(&session.flush().unwrap()).unwrap();
        let second = PdfDocument::open(&session.flush().unwrap()).unwrap();
        for page in 0..2 {
            assert_eq!(
                first.annotations(page).unwrap(),
                second.annotations(page).unwrap()
            );
        }
        // Flush replays onto a fresh copy, so nothing doubles up
        assert_eq!(second.annotations(1).unwrap().len(), 1);
        assert_eq!(session.pending_count(), 2);
    }

    #[test]
    fn test_reload_discards_previous_annotations() {
        let mut session = loaded(2);
        session.add_text_note("from A", 1.0, 1.0, 0).unwrap();
        session.select_page(1).unwrap();
        session.select_tool(Tool::ink());

        session.load(create_blank_document(1).unwrap()).unwrap();
        assert_eq!(session.pending_count(), 0);
        assert_eq!(session.current_page(), 0);
        assert_eq!(session.tool(), Tool::Select);

        let out = PdfDocument::open(&session.flush().unwrap()).unwrap();
        assert_eq!(out.page_count(), 1);
        assert!(out.annotations(0).unwrap().is_empty());
    }

    struct FailingWriter;

    impl io::Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// One-page document whose /Annots points at a number
    fn broken_annots_document() -> Vec<u8> {
        let mut doc = lopdf::Document::load_mem(&create_blank_document(1).unwrap()).unwrap();
        let page_id = *doc.get_pages().get(&1).unwrap();
        let bogus = doc.add_object(lopdf::Object::Integer(7));
        doc.get_object_mut(page_id)
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .set("Annots", lopdf::Object::Reference(bogus));
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_apply_failure_during_flush_is_save_error() {
        let mut session = AnnotationSession::new();
        session.load(broken_annots_document()).unwrap();
        session.add_text_note("stuck", 1.0, 1.0, 0).unwrap();

        assert!(matches!(session.flush(), Err(PdfMarkError::Save(_))));
        assert_eq!(session.text_notes(0).len(), 1);
    }

    #[test]
    fn test_save_failure_keeps_pending() {
        let mut session = loaded(1);
        session.add_text_note("retry me", 1.0, 1.0, 0).unwrap();

        assert!(matches!(
            session.flush_to(&mut FailingWriter),
            Err(PdfMarkError::Save(_))
        ));
        assert_eq!(session.text_notes(0).len(), 1);
        assert!(session.flush().is_ok());
    }

    #[test]
    fn test_apply_tool_dispatch() {
        let mut session = loaded(2);
        session.select_page(1).unwrap();

        session.select_tool(Tool::Ink {
            color: Color::RED,
            width: 4.0,
        });
        session
            .apply_tool(ToolInput::Stroke { points: line() })
            .unwrap();
        assert_eq!(session.ink_strokes(1)[0].width, 4.0);
        assert_eq!(session.ink_strokes(1)[0].color, Color::RED);

        session.select_tool(Tool::Text {
            color: Color::YELLOW,
        });
        session
            .apply_tool(ToolInput::Place {
                x: 3.0,
                y: 4.0,
                text: "note".into(),
            })
            .unwrap();
        assert_eq!(session.text_notes(1)[0].anchor, Point::new(3.0, 4.0));
        assert_eq!(session.text_notes(1)[0].color, Color::YELLOW);
    }

    #[test]
    fn test_apply_tool_mismatch_changes_nothing() {
        let mut session = loaded(1);
        assert!(matches!(
            session.apply_tool(ToolInput::Stroke { points: line() }),
            Err(PdfMarkError::ToolMismatch {
                tool: "select",
                input: "stroke"
            })
        ));

        session.select_tool(Tool::ink());
        assert!(session
            .apply_tool(ToolInput::Place {
                x: 0.0,
                y: 0.0,
                text: "x".into()
            })
            .is_err());
        assert_eq!(session.pending_count(), 0);
    }

    #[test]
    fn test_execute_all_stops_at_first_failure() {
        let mut session = loaded(2);
        let outcome = session.execute_all(vec![
            SessionCommand::SelectPage { page: 1 },
            SessionCommand::AddTextNote {
                page: 0,
                text: "ok".into(),
                x: 0.0,
                y: 0.0,
            },
            SessionCommand::SelectPage { page: 9 },
            SessionCommand::AddTextNote {
                page: 0,
                text: "skipped".into(),
                x: 0.0,
                y: 0.0,
            },
        ]);

        assert_eq!(outcome.applied, 2);
        assert_eq!(outcome.failed_at, Some(2));
        assert!(outcome.error.is_some());
        assert_eq!(session.current_page(), 1);
        assert_eq!(session.text_notes(0).len(), 1);
    }

    #[test]
    fn test_close_returns_to_empty() {
        let mut session = loaded(2);
        session.add_text_note("gone", 0.0, 0.0, 0).unwrap();
        session.close();
        assert_eq!(session.state(), SessionState::Empty);
        assert_eq!(session.pending_count(), 0);
        assert!(session.document().is_none());
    }

    #[test]
    fn test_extract_text_reads_loaded_document() {
        let mut session = AnnotationSession::new();
        assert!(matches!(
            session.extract_text(0),
            Err(PdfMarkError::NoDocument)
        ));
        session
            .load(create_document(&[PageSpec::text(["Quarterly report"])]).unwrap())
            .unwrap();
        assert!(session.extract_text(0).unwrap().contains("Quarterly report"));
        assert!(matches!(
            session.extract_text(1),
            Err(PdfMarkError::InvalidPageIndex { .. })
        ));
    }

    #[test]
    fn test_search_uses_loaded_document() {
        let mut session = AnnotationSession::new();
        assert!(matches!(
            session.search_text(0, "x"),
            Err(PdfMarkError::NoDocument)
        ));

        session
            .load(create_document(&[PageSpec::text(["alpha beta alpha"])]).unwrap())
            .unwrap();
        assert_eq!(session.search_text(0, "alpha").unwrap().len(), 2);
        assert!(session.search_text(1, "alpha").is_err());
    }

    struct FlatRasterizer;

    impl PageRasterizer for FlatRasterizer {
        fn rasterize(
            &self,
            pdf: &[u8],
            page: usize,
            scale: f32,
        ) -> Result<RasterImage, PdfMarkError> {
            assert!(pdf.starts_with(b"%PDF"));
            let side = (10.0 * scale) as u32 + page as u32;
            RasterImage::new(side, side, vec![255; (side * side * 4) as usize])
        }
    }

    #[test]
    fn test_render_page_validates_and_keeps_pending() {
        let mut session = loaded(2);
        session.add_text_note("pending", 0.0, 0.0, 0).unwrap();

        let image = session.render_page(&FlatRasterizer, 1, 2.0).unwrap();
        assert_eq!(image.width, 21);
        assert!(matches!(
            session.render_page(&FlatRasterizer, 2, 1.0),
            Err(PdfMarkError::InvalidPageIndex { .. })
        ));
        assert!(matches!(
            session.render_page(&FlatRasterizer, 0, 0.0),
            Err(PdfMarkError::InvalidScale(_))
        ));
        assert_eq!(session.pending_count(), 1);
    }
}
