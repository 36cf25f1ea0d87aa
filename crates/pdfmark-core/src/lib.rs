//! PDF annotation sessions
//!
//! An [`AnnotationSession`] tracks ink strokes and text notes per page of a
//! loaded PDF and writes them into a copy of the document on flush. Alongside
//! it sit the stateless document operations of the editor: search and
//! highlight, merge, watermark, signature placement and page rasterization.
//!
//! Structure is handled with `lopdf`; pixels come from a [`PageRasterizer`]
//! (Pdfium with the `pdfium` feature).

pub mod annotations;
pub mod apply;
pub mod command;
pub mod compose;
pub mod document;
pub mod error;
pub mod merge;
pub mod render;
mod resources;
pub mod search;
pub mod session;
pub mod signature;
pub mod tool;
pub mod watermark;

pub use annotations::{
    pdf_coordinate, Annotation, AnnotationMap, Color, InkStroke, PdfRect, Point, TextNote,
    MAX_COORDINATE,
};
pub use command::{BatchOutcome, SessionCommand};
pub use compose::{create_blank_document, create_document, PageSpec};
pub use document::{get_page_count, AnnotationInfo, AnnotationKind, PdfDocument};
pub use error::PdfMarkError;
pub use merge::merge_documents;
pub use render::{PageRasterizer, RasterImage};
#[cfg(feature = "pdfium")]
pub use render::PdfiumRasterizer;
pub use search::{highlight_matches, HighlightOutcome};
pub use session::{AnnotationSession, SessionState, SessionSummary};
pub use signature::place_signature;
pub use tool::{Tool, ToolInput};
pub use watermark::{apply_watermark, WatermarkStyle};
