use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfMarkError {
    #[error("Failed to load document: {0}")]
    DocumentLoad(String),

    #[error("Page index {index} out of range (document has {page_count} pages)")]
    InvalidPageIndex { index: usize, page_count: usize },

    #[error("Failed to save document: {0}")]
    Save(String),

    #[error("No document loaded")]
    NoDocument,

    #[error("Tool {tool} cannot handle {input} input")]
    ToolMismatch {
        tool: &'static str,
        input: &'static str,
    },

    #[error("Invalid ink stroke: {0}")]
    InvalidStroke(String),

    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Invalid search query: {0}")]
    InvalidQuery(String),

    #[error("Invalid render scale: {0}")]
    InvalidScale(f32),

    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("PDF operation failed: {0}")]
    Operation(String),
}

impl From<lopdf::Error> for PdfMarkError {
    fn from(err: lopdf::Error) -> Self {
        PdfMarkError::Operation(err.to_string())
    }
}
