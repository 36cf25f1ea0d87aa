//! Page rasterization
//!
//! Pixels come from an external engine behind [`PageRasterizer`]. With the
//! `pdfium` feature, [`PdfiumRasterizer`] renders through Pdfium.

use crate::error::PdfMarkError;
use serde::Serialize;

pub const MAX_RENDER_SCALE: f32 = 10.0;

/// RGBA8 pixels, row-major, no padding
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    #[serde(skip)]
    pub rgba: Vec<u8>,
}

impl RasterImage {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, PdfMarkError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(PdfMarkError::Render(format!(
                "expected {} bytes for {}x{} RGBA, got {}",
                expected,
                width,
                height,
                rgba.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    /// Encode as PNG
    pub fn to_png(&self) -> Result<Vec<u8>, PdfMarkError> {
        let mut buffer = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut buffer, self.width, self.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder
                .write_header()
                .map_err(|e| PdfMarkError::Render(e.to_string()))?;
            writer
                .write_image_data(&self.rgba)
                .map_err(|e| PdfMarkError::Render(e.to_string()))?;
        }
        Ok(buffer)
    }
}

/// Turns one page of a PDF into pixels
pub trait PageRasterizer: Send + Sync {
    /// `page` is zero-based; `scale` 1.0 renders at 72 DPI
    fn rasterize(&self, pdf: &[u8], page: usize, scale: f32) -> Result<RasterImage, PdfMarkError>;
}

pub fn check_scale(scale: f32) -> Result<(), PdfMarkError> {
    if scale.is_finite() && scale > 0.0 && scale <= MAX_RENDER_SCALE {
        Ok(())
    } else {
        Err(PdfMarkError::InvalidScale(scale))
    }
}

#[cfg(feature = "pdfium")]
pub use pdfium::PdfiumRasterizer;

#[cfg(feature = "pdfium")]
mod pdfium {
    use super::{PageRasterizer, RasterImage};
    use crate::error::PdfMarkError;
    use pdfium_render::prelude::*;
    use std::path::PathBuf;

    /// Renders through a Pdfium shared library
    ///
    /// The library is bound per call, so the rasterizer itself is cheap to
    /// share between threads.
    #[derive(Debug, Clone, Default)]
    pub struct PdfiumRasterizer {
        library_dir: Option<PathBuf>,
    }

    impl PdfiumRasterizer {
        /// Use the system library search path
        pub fn system() -> Self {
            Self { library_dir: None }
        }

        /// Load `libpdfium` from a directory
        pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
            Self {
                library_dir: Some(dir.into()),
            }
        }

        fn bind(&self) -> Result<Pdfium, PdfMarkError> {
            let bindings = match &self.library_dir {
                Some(dir) => Pdfium::bind_to_library(
                    Pdfium::pdfium_platform_library_name_at_path(dir),
                ),
                None => Pdfium::bind_to_system_library(),
            }
            .map_err(|e| PdfMarkError::Render(format!("Failed to bind Pdfium: {}", e)))?;
            Ok(Pdfium::new(bindings))
        }
    }

    impl PageRasterizer for PdfiumRasterizer {
        fn rasterize(
            &self,
            pdf: &[u8],
            page: usize,
            scale: f32,
        ) -> Result<RasterImage, PdfMarkError> {
            let pdfium = self.bind()?;
            let document = pdfium
                .load_pdf_from_byte_slice(pdf, None)
                .map_err(|e| PdfMarkError::Render(e.to_string()))?;
            let index = u16::try_from(page)
                .map_err(|_| PdfMarkError::Render(format!("page {} beyond Pdfium range", page)))?;
            let page = document
                .pages()
                .get(index)
                .map_err(|e| PdfMarkError::Render(e.to_string()))?;
            let config = PdfRenderConfig::new().scale_page_by_factor(scale);
            let bitmap = page
                .render_with_config(&config)
                .map_err(|e| PdfMarkError::Render(e.to_string()))?;
            RasterImage::new(
                bitmap.width() as u32,
                bitmap.height() as u32,
                bitmap.as_rgba_bytes(),
            )
        }
    }
}
