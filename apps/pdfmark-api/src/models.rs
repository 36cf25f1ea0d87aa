//! Request and response bodies for the pdfmark API

use pdfmark_core::{
    BatchOutcome, Color, PageSpec, PdfRect, Point, SessionCommand, SessionSummary, Tool,
    WatermarkStyle,
};
use serde::{Deserialize, Serialize};

/// Session response for API
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub id: String,
    #[serde(flatten)]
    pub summary: SessionSummary,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InkRequest {
    pub page: usize,
    pub points: Vec<Point>,
    #[serde(default)]
    pub color: Color,
    #[serde(default = "default_ink_width")]
    pub width: f64,
}

fn default_ink_width() -> f64 {
    pdfmark_core::tool::DEFAULT_INK_WIDTH
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextRequest {
    pub page: usize,
    pub text: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageRequest {
    pub page: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolRequest {
    pub tool: Tool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandsRequest {
    pub commands: Vec<SessionCommand>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandsResponse {
    #[serde(flatten)]
    pub outcome: BatchOutcome,
    pub session: SessionResponse,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub page: usize,
    pub query: String,
    pub matches: Vec<PdfRect>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderQuery {
    #[serde(default = "default_scale")]
    pub scale: f32,
}

fn default_scale() -> f32 {
    1.0
}

#[derive(Debug, Clone, Serialize)]
pub struct TextResponse {
    pub page: usize,
    pub text: String,
}

/// Build a new PDF, one entry per page
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRequest {
    pub pages: Vec<PageSpec>,
}

/// Merge base64-encoded PDFs in order
#[derive(Debug, Clone, Deserialize)]
pub struct MergeRequest {
    pub documents: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WatermarkRequest {
    pub pdf_base64: String,
    #[serde(default)]
    pub style: WatermarkStyle,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HighlightRequest {
    pub pdf_base64: String,
    pub page: usize,
    pub query: String,
    #[serde(default = "default_highlight_color")]
    pub color: Color,
    #[serde(default = "default_highlight_opacity")]
    pub opacity: f64,
}

fn default_highlight_color() -> Color {
    Color::YELLOW
}

fn default_highlight_opacity() -> f64 {
    0.4
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignatureRequest {
    pub pdf_base64: String,
    pub page: usize,
    pub png_base64: String,
    pub rect: PdfRect,
}

/// Result of a stateless document operation
#[derive(Debug, Clone, Serialize)]
pub struct ProcessResult {
    pub success: bool,
    /// Base64-encoded PDF data
    pub data: String,
    pub metrics: ProcessMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matches: Option<Vec<PdfRect>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessMetrics {
    pub input_size_bytes: usize,
    pub output_size_bytes: usize,
    pub page_count: usize,
    pub processing_time_ms: u64,
}
