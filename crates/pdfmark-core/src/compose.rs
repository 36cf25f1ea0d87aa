//! Create new PDF documents from scratch

use crate::error::PdfMarkError;
use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};
use serde::{Deserialize, Serialize};

/// US Letter at 72 DPI
pub const LETTER: (f64, f64) = (612.0, 792.0);

const MARGIN: f64 = 72.0;

/// One page of generated text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSpec {
    pub lines: Vec<String>,
    pub font_size: f64,
    pub size: (f64, f64),
}

impl PageSpec {
    pub fn text<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> Self {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

impl Default for PageSpec {
    fn default() -> Self {
        Self {
            lines: Vec::new(),
            font_size: 12.0,
            size: LETTER,
        }
    }
}

/// Escape `(`, `)` and `\` for a literal string inside a content stream
pub(crate) fn escape_pdf_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

fn page_content(spec: &PageSpec) -> String {
    let leading = spec.font_size * 1.2;
    let top = spec.size.1 - MARGIN;
    let mut content = format!(
        "BT\n/F1 {} Tf\n{} TL\n{} {} Td\n",
        spec.font_size, leading, MARGIN, top
    );
    for (i, line) in spec.lines.iter().enumerate() {
        if i > 0 {
            content.push_str("T*\n");
        }
        content.push_str(&format!("({}) Tj\n", escape_pdf_string(line)));
    }
    content.push_str("ET");
    content
}

/// Build a document with one page per spec, text set in Helvetica
pub fn create_document(pages: &[PageSpec]) -> Result<Vec<u8>, PdfMarkError> {
    if pages.is_empty() {
        return Err(PdfMarkError::Operation(
            "A document needs at least one page".into(),
        ));
    }

    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::with_capacity(pages.len());
    for spec in pages {
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            page_content(spec).into_bytes(),
        ));

        let mut fonts = Dictionary::new();
        fonts.set("F1", Object::Reference(font_id));
        let mut resources = Dictionary::new();
        resources.set("Font", Object::Dictionary(fonts));

        let mut page_dict = Dictionary::new();
        page_dict.set("Type", Object::Name(b"Page".to_vec()));
        page_dict.set("Parent", Object::Reference(pages_id));
        page_dict.set("Contents", Object::Reference(content_id));
        page_dict.set("Resources", Object::Dictionary(resources));
        page_dict.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(spec.size.0 as f32),
                Object::Real(spec.size.1 as f32),
            ]),
        );
        kids.push(Object::Reference(doc.add_object(page_dict)));
    }

    let mut pages_dict = Dictionary::new();
    pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
    pages_dict.set("Count", Object::Integer(kids.len() as i64));
    pages_dict.set("Kids", Object::Array(kids));
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut info = Dictionary::new();
    info.set(
        "Producer",
        Object::String(b"pdfmark".to_vec(), StringFormat::Literal),
    );
    let info_id = doc.add_object(info);
    doc.trailer.set("Info", Object::Reference(info_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PdfMarkError::Save(e.to_string()))?;
    Ok(buffer)
}

/// Letter-sized document whose pages each read "Page N"
pub fn create_blank_document(page_count: usize) -> Result<Vec<u8>, PdfMarkError> {
    let pages: Vec<PageSpec> = (1..=page_count)
        .map(|n| PageSpec::text([format!("Page {}", n)]))
        .collect();
    create_document(&pages)
}
