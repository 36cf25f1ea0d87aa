//! Page resources and content stream plumbing shared by stamping operations

use crate::error::PdfMarkError;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

/// Resolve a possibly indirect dictionary into an owned copy
fn owned_dict(doc: &Document, obj: &Object) -> Option<Dictionary> {
    match obj {
        Object::Dictionary(dict) => Some(dict.clone()),
        Object::Reference(id) => doc.get_dictionary(*id).ok().cloned(),
        _ => None,
    }
}

/// Resources in effect for a page, following `/Parent` inheritance
fn effective_resources(doc: &Document, page_id: ObjectId) -> Dictionary {
    let mut current = Some(page_id);
    while let Some(id) = current {
        let Ok(dict) = doc.get_dictionary(id) else {
            break;
        };
        if let Some(resources) = dict.get(b"Resources").ok().and_then(|o| owned_dict(doc, o)) {
            return resources;
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }
    Dictionary::new()
}

/// Register `target` under `/Resources/<category>/<name>` of a page.
///
/// The page gets its own direct resource dictionary so shared or inherited
/// resources of other pages stay untouched.
pub(crate) fn register_resource(
    doc: &mut Document,
    page_id: ObjectId,
    category: &str,
    name: &str,
    target: ObjectId,
) -> Result<(), PdfMarkError> {
    let mut resources = effective_resources(doc, page_id);
    let mut entries = resources
        .get(category.as_bytes())
        .ok()
        .and_then(|o| owned_dict(doc, o))
        .unwrap_or_default();
    entries.set(name, Object::Reference(target));
    resources.set(category, Object::Dictionary(entries));

    doc.get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Resources", Object::Dictionary(resources));
    Ok(())
}

/// Draw `content` on top of a page.
///
/// Existing content is wrapped in `q`/`Q` so its graphics state cannot leak
/// into the appended stream.
pub(crate) fn append_content(
    doc: &mut Document,
    page_id: ObjectId,
    content: Vec<u8>,
) -> Result<(), PdfMarkError> {
    let existing = match doc.get_dictionary(page_id)?.get(b"Contents") {
        Ok(Object::Reference(id)) => vec![Object::Reference(*id)],
        Ok(Object::Array(refs)) => refs.clone(),
        _ => Vec::new(),
    };

    let mut contents = Vec::with_capacity(existing.len() + 3);
    if !existing.is_empty() {
        let save = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let restore = doc.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));
        contents.push(Object::Reference(save));
        contents.extend(existing);
        contents.push(Object::Reference(restore));
    }
    let stamp = doc.add_object(Stream::new(Dictionary::new(), content));
    contents.push(Object::Reference(stamp));

    doc.get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Contents", Object::Array(contents));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::create_blank_document;
    use lopdf::dictionary;

    fn first_page(doc: &Document) -> ObjectId {
        *doc.get_pages().get(&1).unwrap()
    }

    #[test]
    fn test_register_resource_keeps_existing_fonts() {
        let mut doc = Document::load_mem(&create_blank_document(1).unwrap()).unwrap();
        let page = first_page(&doc);
        let gs = doc.add_object(dictionary! { "Type" => "ExtGState" });

        register_resource(&mut doc, page, "ExtGState", "GS1", gs).unwrap();

        let resources = doc
            .get_dictionary(page)
            .unwrap()
            .get(b"Resources")
            .unwrap()
            .as_dict()
            .unwrap();
        assert!(resources.get(b"Font").unwrap().as_dict().unwrap().has(b"F1"));
        assert_eq!(
            resources
                .get(b"ExtGState")
                .unwrap()
                .as_dict()
                .unwrap()
                .get(b"GS1")
                .unwrap()
                .as_reference()
                .unwrap(),
            gs
        );
    }

    #[test]
    fn test_append_content_wraps_existing() {
        let mut doc = Document::load_mem(&create_blank_document(1).unwrap()).unwrap();
        let page = first_page(&doc);

        append_content(&mut doc, page, b"0 0 m 10 10 l S".to_vec()).unwrap();

        let contents = doc
            .get_dictionary(page)
            .unwrap()
            .get(b"Contents")
            .unwrap()
            .as_array()
            .unwrap()
            .clone();
        assert_eq!(contents.len(), 4);

        let content = doc.get_page_content(page).unwrap();
        let text = String::from_utf8_lossy(&content);
        assert!(text.starts_with("q\n"));
        assert!(text.trim_end().ends_with("0 0 m 10 10 l S"));
    }
}
