//! Write pending annotations into a PDF document

use crate::annotations::{Annotation, Color, InkStroke, PdfRect, TextNote};
use crate::error::PdfMarkError;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};

/// Side length of the note icon a text annotation is anchored with
pub const NOTE_ICON_SIZE: f64 = 20.0;

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

fn color_array(color: Color) -> Object {
    Object::Array(color.components().into_iter().map(Object::Real).collect())
}

fn rect_array(corners: [f64; 4]) -> Object {
    Object::Array(corners.into_iter().map(real).collect())
}

/// Encode a text string for a PDF string object.
/// ASCII stays literal; anything else becomes UTF-16BE with a byte order mark.
pub fn encode_text_string(text: &str) -> Vec<u8> {
    if text.is_ascii() {
        return text.as_bytes().to_vec();
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    bytes
}

/// Inverse of [`encode_text_string`]; single-byte strings are read as Latin-1
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| b as char).collect()
}

/// Apply one annotation to a page, returning the new annotation object id
pub fn apply_annotation(
    doc: &mut Document,
    page_id: ObjectId,
    annotation: &Annotation,
) -> Result<ObjectId, PdfMarkError> {
    match annotation {
        Annotation::Ink(stroke) => add_ink_annotation(doc, page_id, stroke),
        Annotation::Text(note) => add_text_annotation(doc, page_id, note),
        Annotation::Highlight {
            rect,
            color,
            opacity,
        } => add_highlight_annotation(doc, page_id, rect, *color, *opacity),
    }
}

/// Bounding box of the stroke points, padded by the stroke width
fn ink_bounds(stroke: &InkStroke) -> [f64; 4] {
    let pad = stroke.width.max(1.0);
    let mut bounds = [f64::MAX, f64::MAX, f64::MIN, f64::MIN];
    for p in &stroke.points {
        bounds[0] = bounds[0].min(p.x);
        bounds[1] = bounds[1].min(p.y);
        bounds[2] = bounds[2].max(p.x);
        bounds[3] = bounds[3].max(p.y);
    }
    [
        bounds[0] - pad,
        bounds[1] - pad,
        bounds[2] + pad,
        bounds[3] + pad,
    ]
}

fn add_ink_annotation(
    doc: &mut Document,
    page_id: ObjectId,
    stroke: &InkStroke,
) -> Result<ObjectId, PdfMarkError> {
    if stroke.points.is_empty() {
        return Err(PdfMarkError::InvalidStroke("stroke has no points".into()));
    }
    let bounds = ink_bounds(stroke);

    let path: Vec<Object> = stroke
        .points
        .iter()
        .flat_map(|p| [real(p.x), real(p.y)])
        .collect();

    let mut annot = Dictionary::new();
    annot.set("Type", Object::Name(b"Annot".to_vec()));
    annot.set("Subtype", Object::Name(b"Ink".to_vec()));
    annot.set("Rect", rect_array(bounds));
    annot.set("InkList", Object::Array(vec![Object::Array(path)]));
    annot.set("C", color_array(stroke.color));
    // Print flag
    annot.set("F", Object::Integer(4));

    let mut bs = Dictionary::new();
    bs.set("W", real(stroke.width));
    bs.set("S", Object::Name(b"S".to_vec()));
    annot.set("BS", Object::Dictionary(bs));

    // Normal appearance so viewers that ignore InkList still draw the stroke
    let appearance_id = doc.add_object(ink_appearance_stream(stroke, bounds));
    let mut ap = Dictionary::new();
    ap.set("N", Object::Reference(appearance_id));
    annot.set("AP", Object::Dictionary(ap));

    let annot_id = doc.add_object(Object::Dictionary(annot));
    add_annotation_to_page(doc, page_id, annot_id)?;
    Ok(annot_id)
}

fn ink_appearance_stream(stroke: &InkStroke, bounds: [f64; 4]) -> Object {
    let [r, g, b] = stroke.color.components();
    let mut content = format!("q\n{} {} {} RG\n{} w\n1 J\n1 j\n", r, g, b, stroke.width);
    let first = stroke.points[0];
    content.push_str(&format!("{} {} m\n", first.x, first.y));
    if stroke.points.len() == 1 {
        // Zero-length segment renders as a dot with round caps
        content.push_str(&format!("{} {} l\n", first.x, first.y));
    }
    for p in &stroke.points[1..] {
        content.push_str(&format!("{} {} l\n", p.x, p.y));
    }
    content.push_str("S\nQ");

    let mut stream_dict = Dictionary::new();
    stream_dict.set("Type", Object::Name(b"XObject".to_vec()));
    stream_dict.set("Subtype", Object::Name(b"Form".to_vec()));
    stream_dict.set("FormType", Object::Integer(1));
    stream_dict.set("BBox", rect_array(bounds));

    Object::Stream(Stream::new(stream_dict, content.into_bytes()))
}

fn add_text_annotation(
    doc: &mut Document,
    page_id: ObjectId,
    note: &TextNote,
) -> Result<ObjectId, PdfMarkError> {
    let mut annot = Dictionary::new();
    annot.set("Type", Object::Name(b"Annot".to_vec()));
    annot.set("Subtype", Object::Name(b"Text".to_vec()));
    annot.set(
        "Rect",
        rect_array([
            note.anchor.x,
            note.anchor.y,
            note.anchor.x + NOTE_ICON_SIZE,
            note.anchor.y + NOTE_ICON_SIZE,
        ]),
    );
    annot.set(
        "Contents",
        Object::String(encode_text_string(&note.text), StringFormat::Literal),
    );
    annot.set("Name", Object::Name(b"Note".to_vec()));
    annot.set("Open", Object::Boolean(false));
    annot.set("C", color_array(note.color));
    annot.set("F", Object::Integer(4));

    let annot_id = doc.add_object(Object::Dictionary(annot));
    add_annotation_to_page(doc, page_id, annot_id)?;
    Ok(annot_id)
}

fn add_highlight_annotation(
    doc: &mut Document,
    page_id: ObjectId,
    rect: &PdfRect,
    color: Color,
    opacity: f64,
) -> Result<ObjectId, PdfMarkError> {
    let [x1, y1, x2, y2] = rect.corners();

    let mut annot = Dictionary::new();
    annot.set("Type", Object::Name(b"Annot".to_vec()));
    annot.set("Subtype", Object::Name(b"Highlight".to_vec()));
    annot.set("Rect", rect_array([x1, y1, x2, y2]));
    // QuadPoints for highlight
    annot.set(
        "QuadPoints",
        Object::Array(
            [x1, y2, x2, y2, x1, y1, x2, y1]
                .into_iter()
                .map(real)
                .collect(),
        ),
    );
    annot.set("CA", real(opacity.clamp(0.0, 1.0)));
    annot.set("C", color_array(color));
    annot.set("F", Object::Integer(4));

    let annot_id = doc.add_object(Object::Dictionary(annot));
    add_annotation_to_page(doc, page_id, annot_id)?;
    Ok(annot_id)
}

/// Append an annotation reference to the page's `/Annots`, which may be
/// missing, a direct array, or a reference to an array.
fn add_annotation_to_page(
    doc: &mut Document,
    page_id: ObjectId,
    annot_id: ObjectId,
) -> Result<(), PdfMarkError> {
    let indirect = match doc.get_object(page_id)?.as_dict()?.get(b"Annots") {
        Ok(Object::Reference(id)) => Some(*id),
        _ => None,
    };

    if let Some(array_id) = indirect {
        if let Object::Array(arr) = doc.get_object_mut(array_id)? {
            arr.push(Object::Reference(annot_id));
            return Ok(());
        }
        return Err(PdfMarkError::Operation(format!(
            "Annots of page {:?} is not an array",
            page_id
        )));
    }

    let page_dict = doc.get_object_mut(page_id)?.as_dict_mut()?;
    if let Ok(Object::Array(arr)) = page_dict.get_mut(b"Annots") {
        arr.push(Object::Reference(annot_id));
    } else {
        page_dict.set("Annots", Object::Array(vec![Object::Reference(annot_id)]));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::Point;
    use crate::compose::create_blank_document;

    fn first_page(doc: &Document) -> ObjectId {
        *doc.get_pages().get(&1).unwrap()
    }

    fn stroke(points: &[(f64, f64)]) -> InkStroke {
        InkStroke {
            page: 0,
            points: points.iter().copied().map(Point::from).collect(),
            color: Color::RED,
            width: 2.0,
        }
    }

    fn annots(doc: &Document, page_id: ObjectId) -> Vec<ObjectId> {
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        match page.get(b"Annots").unwrap() {
            Object::Array(arr) => arr.iter().map(|o| o.as_reference().unwrap()).collect(),
            Object::Reference(id) => doc
                .get_object(*id)
                .unwrap()
                .as_array()
                .unwrap()
                .iter()
                .map(|o| o.as_reference().unwrap())
                .collect(),
            other => panic!("unexpected Annots {:?}", other),
        }
    }

    #[test]
    fn test_text_string_roundtrip_ascii_and_unicode() {
        assert_eq!(encode_text_string("hello"), b"hello".to_vec());
        let encoded = encode_text_string("héllo ✓");
        assert_eq!(&encoded[..2], &[0xFE, 0xFF]);
        assert_eq!(decode_text_string(&encoded), "héllo ✓");
    }

    #[test]
    fn test_ink_annotation_structure() {
        let mut doc = Document::load_mem(&create_blank_document(1).unwrap()).unwrap();
        let page_id = first_page(&doc);

        let id = apply_annotation(
            &mut doc,
            page_id,
            &Annotation::Ink(stroke(&[(10.0, 10.0), (20.0, 20.0)])),
        )
        .unwrap();

        let annot = doc.get_object(id).unwrap().as_dict().unwrap();
        assert_eq!(annot.get(b"Subtype").unwrap().as_name().unwrap(), b"Ink");
        let ink_list = annot.get(b"InkList").unwrap().as_array().unwrap();
        assert_eq!(ink_list.len(), 1);
        assert_eq!(ink_list[0].as_array().unwrap().len(), 4);
        assert!(annot.get(b"AP").is_ok());
        assert_eq!(annots(&doc, page_id), vec![id]);
    }

    #[test]
    fn test_ink_rect_covers_points_with_padding() {
        let bounds = ink_bounds(&stroke(&[(10.0, 30.0), (50.0, 5.0)]));
        assert_eq!(bounds, [8.0, 3.0, 52.0, 32.0]);
    }

    #[test]
    fn test_empty_stroke_rejected() {
        let mut doc = Document::load_mem(&create_blank_document(1).unwrap()).unwrap();
        let page_id = first_page(&doc);
        let err = apply_annotation(&mut doc, page_id, &Annotation::Ink(stroke(&[]))).unwrap_err();
        assert!(matches!(err, PdfMarkError::InvalidStroke(_)));
    }

    #[test]
    fn test_single_point_stroke_draws_dot() {
        let s = stroke(&[(5.0, 5.0)]);
        let bounds = ink_bounds(&s);
        if let Object::Stream(stream) = ink_appearance_stream(&s, bounds) {
            let content = String::from_utf8(stream.content).unwrap();
            assert!(content.contains("5 5 m\n5 5 l"));
        } else {
            panic!("expected stream");
        }
    }

    #[test]
    fn test_text_annotation_anchor_and_contents() {
        let mut doc = Document::load_mem(&create_blank_document(1).unwrap()).unwrap();
        let page_id = first_page(&doc);
        let note = TextNote {
            page: 0,
            text: "hello".into(),
            anchor: Point::new(5.0, 5.0),
            color: Color::BLACK,
        };
        let id = apply_annotation(&mut doc, page_id, &Annotation::Text(note)).unwrap();

        let annot = doc.get_object(id).unwrap().as_dict().unwrap();
        assert_eq!(annot.get(b"Subtype").unwrap().as_name().unwrap(), b"Text");
        assert_eq!(
            annot.get(b"Contents").unwrap().as_str().unwrap(),
            b"hello"
        );
        let rect = annot.get(b"Rect").unwrap().as_array().unwrap();
        assert_eq!(rect[0].as_float().unwrap(), 5.0);
        assert_eq!(rect[1].as_float().unwrap(), 5.0);
    }

    #[test]
    fn test_highlight_uses_requested_color() {
        let mut doc = Document::load_mem(&create_blank_document(1).unwrap()).unwrap();
        let page_id = first_page(&doc);
        let id = apply_annotation(
            &mut doc,
            page_id,
            &Annotation::Highlight {
                rect: PdfRect {
                    x: 50.0,
                    y: 600.0,
                    width: 300.0,
                    height: 20.0,
                },
                color: Color::rgb(0, 255, 0),
                opacity: 0.5,
            },
        )
        .unwrap();

        let annot = doc.get_object(id).unwrap().as_dict().unwrap();
        let c = annot.get(b"C").unwrap().as_array().unwrap();
        assert_eq!(c[0].as_float().unwrap(), 0.0);
        assert_eq!(c[1].as_float().unwrap(), 1.0);
        assert_eq!(
            annot.get(b"QuadPoints").unwrap().as_array().unwrap().len(),
            8
        );
    }

    #[test]
    fn test_annotations_append_in_order() {
        let mut doc = Document::load_mem(&create_blank_document(1).unwrap()).unwrap();
        let page_id = first_page(&doc);
        let a = apply_annotation(
            &mut doc,
            page_id,
            &Annotation::Ink(stroke(&[(1.0, 1.0), (2.0, 2.0)])),
        )
        .unwrap();
        let b = apply_annotation(
            &mut doc,
            page_id,
            &Annotation::Ink(stroke(&[(3.0, 3.0), (4.0, 4.0)])),
        )
        .unwrap();
        assert_eq!(annots(&doc, page_id), vec![a, b]);
    }

    #[test]
    fn test_indirect_annots_array_is_extended() {
        let mut doc = Document::load_mem(&create_blank_document(1).unwrap()).unwrap();
        let page_id = first_page(&doc);
        let array_id = doc.add_object(Object::Array(vec![]));
        doc.get_object_mut(page_id)
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .set("Annots", Object::Reference(array_id));

        let id = apply_annotation(
            &mut doc,
            page_id,
            &Annotation::Ink(stroke(&[(1.0, 1.0), (2.0, 2.0)])),
        )
        .unwrap();

        let arr = doc.get_object(array_id).unwrap().as_array().unwrap();
        assert_eq!(arr.len(), 1);
        assert_eq!(arr[0].as_reference().unwrap(), id);
    }
}
