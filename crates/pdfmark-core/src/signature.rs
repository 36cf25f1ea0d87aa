//! Place a PNG signature image on a page
//!
//! The image becomes an `/Image` XObject with its alpha channel split into
//! an `/SMask`, both Flate-compressed, drawn by a content stream appended to
//! the page.

use crate::annotations::{pdf_coordinate, PdfRect};
use crate::document::PdfDocument;
use crate::error::PdfMarkError;
use crate::resources::{append_content, register_resource};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Object, Stream};
use std::io::{Cursor, Write};
use tracing::debug;

/// Decoded 8-bit image, colour and alpha planes separated
#[derive(Debug)]
struct SignatureImage {
    width: u32,
    height: u32,
    rgb: Vec<u8>,
    alpha: Option<Vec<u8>>,
}

fn image_error(err: impl std::fmt::Display) -> PdfMarkError {
    PdfMarkError::InvalidImage(err.to_string())
}

fn decode_png(bytes: &[u8]) -> Result<SignatureImage, PdfMarkError> {
    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info().map_err(image_error)?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let frame = reader.next_frame(&mut buf).map_err(image_error)?;
    buf.truncate(frame.buffer_size());

    let pixels = frame.width as usize * frame.height as usize;
    let (rgb, alpha) = match frame.color_type {
        png::ColorType::Rgb => (buf, None),
        png::ColorType::Rgba => {
            let mut rgb = Vec::with_capacity(pixels * 3);
            let mut alpha = Vec::with_capacity(pixels);
            for px in buf.chunks_exact(4) {
                rgb.extend_from_slice(&px[..3]);
                alpha.push(px[3]);
            }
            (rgb, Some(alpha))
        }
        png::ColorType::Grayscale => (buf.iter().flat_map(|&v| [v, v, v]).collect(), None),
        png::ColorType::GrayscaleAlpha => {
            let mut rgb = Vec::with_capacity(pixels * 3);
            let mut alpha = Vec::with_capacity(pixels);
            for px in buf.chunks_exact(2) {
                rgb.extend_from_slice(&[px[0], px[0], px[0]]);
                alpha.push(px[1]);
            }
            (rgb, Some(alpha))
        }
        png::ColorType::Indexed => {
            return Err(PdfMarkError::InvalidImage(
                "indexed colour was not expanded".into(),
            ))
        }
    };

    Ok(SignatureImage {
        width: frame.width,
        height: frame.height,
        rgb,
        alpha,
    })
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, PdfMarkError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| PdfMarkError::Operation(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| PdfMarkError::Operation(e.to_string()))
}

fn image_stream(
    width: u32,
    height: u32,
    color_space: &str,
    data: &[u8],
) -> Result<Stream, PdfMarkError> {
    Ok(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        },
        deflate(data)?,
    ))
}

/// Draw a PNG image into `rect` on a zero-based page
pub fn place_signature(
    bytes: &[u8],
    page: usize,
    png_bytes: &[u8],
    rect: &PdfRect,
) -> Result<Vec<u8>, PdfMarkError> {
    for value in [rect.x, rect.y, rect.width, rect.height] {
        pdf_coordinate(value)?;
    }
    if !(rect.width > 0.0 && rect.height > 0.0) {
        return Err(PdfMarkError::Operation(format!(
            "Signature box must have a positive size, got {}x{}",
            rect.width, rect.height
        )));
    }

    let mut doc = PdfDocument::open(bytes)?;
    let page_id = doc.page_object_id(page)?;
    let image = decode_png(png_bytes)?;

    let inner = doc.inner_mut();
    let mut picture = image_stream(image.width, image.height, "DeviceRGB", &image.rgb)?;
    if let Some(alpha) = &image.alpha {
        let smask = image_stream(image.width, image.height, "DeviceGray", alpha)?;
        let smask_id = inner.add_object(smask);
        picture.dict.set("SMask", Object::Reference(smask_id));
    }
    let image_id = inner.add_object(picture);

    let name = format!("ImSig{}", image_id.0);
    register_resource(inner, page_id, "XObject", &name, image_id)?;
    let draw = format!(
        "q\n{:.3} 0 0 {:.3} {:.3} {:.3} cm\n/{} Do\nQ\n",
        rect.width, rect.height, rect.x, rect.y, name
    );
    append_content(inner, page_id, draw.into_bytes())?;

    debug!(
        page,
        width = image.width,
        height = image.height,
        "signature placed"
    );
    doc.serialize()
}
