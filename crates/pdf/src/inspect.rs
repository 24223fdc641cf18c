use crate::assembler::decode_text_string;
use crate::error::PdfError;
use lopdf::{Dictionary, Document, Object};
use std::collections::BTreeMap;
use std::path::Path;

pub const NO_METADATA_MESSAGE: &str = "No metadata found in the PDF.";

/// Reads the Info dictionary of the PDF at `path` as decoded `key -> value` pairs.
///
/// Keys keep their PDF spelling without the leading slash. A file without an
/// Info dictionary yields an empty map.
pub fn read_info(path: &Path) -> Result<BTreeMap<String, String>, PdfError> {
    let doc = Document::load(path).map_err(|e| PdfError::open(path, e))?;
    let Some(info) = info_dictionary(&doc) else {
        return Ok(BTreeMap::new());
    };
    Ok(info
        .iter()
        .map(|(key, value)| {
            (
                String::from_utf8_lossy(key).into_owned(),
                render_value(&doc, value),
            )
        })
        .collect())
}

/// Renders the Info dictionary as one `/Key: value` line per entry, sorted by key.
pub fn check(path: &Path) -> Result<String, PdfError> {
    let info = read_info(path)?;
    if info.is_empty() {
        return Ok(NO_METADATA_MESSAGE.to_string());
    }
    Ok(info
        .iter()
        .map(|(key, value)| format!("/{key}: {value}"))
        .collect::<Vec<_>>()
        .join("\n"))
}

fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn render_value(doc: &Document, value: &Object) -> String {
    match value {
        Object::String(bytes, _) => decode_text_string(bytes),
        Object::Name(name) => String::from_utf8_lossy(name).into_owned(),
        Object::Integer(i) => i.to_string(),
        Object::Real(r) => r.to_string(),
        Object::Boolean(b) => b.to_string(),
        Object::Null => "null".to_string(),
        Object::Reference(id) => match doc.get_object(*id) {
            Ok(Object::Reference(_)) | Err(_) => format!("{} {} R", id.0, id.1),
            Ok(resolved) => render_value(doc, resolved),
        },
        other => format!("{other:?}"),
    }
}
