//! Merge several PDFs into one document, pages in input order

use crate::error::PdfMarkError;
use lopdf::{Document, Object, ObjectId};
use tracing::debug;

/// Merge multiple PDFs into one
///
/// 1. Empty input is an error; a single document is returned untouched
/// 2. The first document becomes the destination
/// 3. Every other document has its object ids shifted past the destination's
///    highest id, is copied in, and has its pages appended
/// 4. The root page tree is rewritten to list all pages
pub fn merge_documents(documents: Vec<Vec<u8>>) -> Result<Vec<u8>, PdfMarkError> {
    let mut inputs = documents.into_iter();
    let first = inputs
        .next()
        .ok_or_else(|| PdfMarkError::Operation("No documents to merge".into()))?;

    let rest: Vec<Vec<u8>> = inputs.collect();
    if rest.is_empty() {
        return Ok(first);
    }

    let mut dest = load(0, &first)?;
    let mut page_refs: Vec<ObjectId> = dest.get_pages().into_values().collect();

    for (i, bytes) in rest.iter().enumerate() {
        let source = load(i + 1, bytes)?;
        let offset = dest.max_id;
        page_refs.extend(
            source
                .get_pages()
                .into_values()
                .map(|(num, gen)| (num + offset, gen)),
        );

        for ((num, gen), object) in source.objects {
            dest.objects
                .insert((num + offset, gen), shift_refs(object, offset));
        }
        dest.max_id = dest.max_id.max(source.max_id + offset);
    }

    let page_count = page_refs.len();
    set_page_tree(&mut dest, page_refs)?;
    dest.compress();

    let mut buffer = Vec::new();
    dest.save_to(&mut buffer)
        .map_err(|e| PdfMarkError::Save(format!("Failed to save merged PDF: {}", e)))?;
    debug!(inputs = rest.len() + 1, pages = page_count, "documents merged");
    Ok(buffer)
}

fn load(index: usize, bytes: &[u8]) -> Result<Document, PdfMarkError> {
    Document::load_mem(bytes).map_err(|e| {
        PdfMarkError::DocumentLoad(format!("Failed to load document {}: {}", index, e))
    })
}

/// Shift every indirect reference inside an object by `offset`
fn shift_refs(obj: Object, offset: u32) -> Object {
    match obj {
        Object::Reference((num, gen)) => Object::Reference((num + offset, gen)),
        Object::Array(items) => {
            Object::Array(items.into_iter().map(|o| shift_refs(o, offset)).collect())
        }
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = shift_refs(std::mem::replace(value, Object::Null), offset);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = shift_refs(std::mem::replace(value, Object::Null), offset);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}

/// Point the destination's root `/Pages` at every page, reparenting the
/// imported ones
fn set_page_tree(doc: &mut Document, page_refs: Vec<ObjectId>) -> Result<(), PdfMarkError> {
    let pages_id = doc
        .catalog()
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|e| PdfMarkError::Operation(format!("No page tree root: {}", e)))?;

    for &page_id in &page_refs {
        if let Ok(page) = doc.get_object_mut(page_id).and_then(Object::as_dict_mut) {
            page.set("Parent", Object::Reference(pages_id));
        }
    }

    let pages = doc
        .get_object_mut(pages_id)
        .and_then(Object::as_dict_mut)
        .map_err(|_| PdfMarkError::Operation("Invalid pages dictionary".into()))?;
    pages.set("Count", Object::Integer(page_refs.len() as i64));
    pages.set(
        "Kids",
        Object::Array(page_refs.into_iter().map(Object::Reference).collect()),
    );
    Ok(())
}
