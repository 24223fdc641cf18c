//! Writes new PDF files from pages of existing ones.
//!
//! Pages are copied with their content and resources into a fresh page tree.
//! Source catalogs, page-tree nodes and outlines are left behind, and anything
//! no longer referenced is pruned before saving.

use crate::error::PdfError;
use bookmeta::DocumentMetadata;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, StringFormat};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, info};

/// Written to the Info dictionary's `/Producer` entry.
pub const PRODUCER: &str = "PDF Metadata Manager";

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_ATTRIBUTES: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Page-tree nesting beyond this is treated as a cycle.
const MAX_TREE_DEPTH: usize = 64;

/// Which pages of a source document to copy.
pub(crate) enum PageSelection {
    All,
    First,
}

/// Writes `<cover page?> + <every source page>` to `output` with an Info
/// dictionary built from `metadata`.
pub fn assemble(
    source: &Path,
    metadata: &DocumentMetadata,
    cover: Option<&Path>,
    output: &Path,
) -> Result<(), PdfError> {
    let mut parts = Vec::with_capacity(2);
    if let Some(cover_path) = cover {
        let cover_doc =
            Document::load(cover_path).map_err(|e| PdfError::assembly(cover_path, e))?;
        parts.push((cover_doc, PageSelection::All));
    }
    let source_doc = Document::load(source).map_err(|e| PdfError::assembly(source, e))?;
    parts.push((source_doc, PageSelection::All));

    let mut doc = compose(parts).map_err(|reason| PdfError::assembly(source, reason))?;
    let info_id = doc.add_object(info_dictionary(metadata));
    doc.trailer.set("Info", info_id);
    doc.compress();
    doc.save(output)
        .map_err(|e| PdfError::assembly(output, e))?;

    info!(
        "Wrote {} pages with embedded metadata to '{}'.",
        doc.get_pages().len(),
        output.display()
    );
    Ok(())
}

/// Builds a new document from the selected pages of each part, in order.
///
/// `All` of a document without pages contributes nothing; `First` requires a page.
pub(crate) fn compose(parts: Vec<(Document, PageSelection)>) -> Result<Document, String> {
    let version = parts
        .first()
        .map(|(doc, _)| doc.version.clone())
        .unwrap_or_else(|| "1.5".to_string());
    let mut output = Document::with_version(version);
    let pages_id = output.new_object_id();
    let mut kids: Vec<Object> = Vec::new();

    for (mut doc, selection) in parts {
        doc.renumber_objects_with(output.max_id + 1);
        let page_ids: Vec<ObjectId> = match selection {
            PageSelection::All => doc.get_pages().into_values().collect(),
            PageSelection::First => doc.get_pages().into_values().take(1).collect(),
        };
        if page_ids.is_empty() && matches!(selection, PageSelection::First) {
            return Err("document has no pages".to_string());
        }

        let mut pages = Vec::with_capacity(page_ids.len());
        for page_id in page_ids {
            let mut page = doc
                .get_dictionary(page_id)
                .map_err(|e| format!("page {page_id:?}: {e}"))?
                .clone();
            for key in INHERITABLE_ATTRIBUTES {
                if !page.has(key) {
                    if let Some(value) = inherited_attribute(&doc, &page, key) {
                        page.set(key, value);
                    }
                }
            }
            page.set("Parent", pages_id);
            pages.push((page_id, page));
        }

        for (id, object) in std::mem::take(&mut doc.objects) {
            let structural = matches!(
                object.type_name().unwrap_or_default(),
                "Catalog" | "Pages" | "Page" | "Outlines" | "Outline"
            );
            if !structural {
                output.objects.insert(id, object);
            }
        }
        for (id, page) in pages {
            output.objects.insert(id, Object::Dictionary(page));
            kids.push(Object::Reference(id));
        }
        output.max_id = output.max_id.max(doc.max_id);
    }

    let page_count = kids.len() as i64;
    output.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
        }),
    );
    let catalog_id = output.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    output.trailer.set("Root", catalog_id);

    let pruned = output.prune_objects();
    debug!("Pruned {} unreferenced objects.", pruned.len());
    Ok(output)
}

fn inherited_attribute(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_dictionary(parent?).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

/// Maps the metadata record onto standard Info dictionary keys.
///
/// `/CreationDate` is only written when the publication date yields a year.
pub fn info_dictionary(metadata: &DocumentMetadata) -> Dictionary {
    let entries = [
        ("Title", metadata.title.as_str()),
        ("Author", metadata.authors.as_str()),
        ("Subject", metadata.publisher.as_str()),
        ("Keywords", metadata.isbn.as_str()),
        ("Producer", PRODUCER),
    ];
    let mut info = Dictionary::new();
    for (key, value) in entries {
        info.set(key, text_string(value));
    }
    if let Some(date) = pdf_date(&metadata.publication_date) {
        info.set("CreationDate", Object::string_literal(date));
    }
    info
}

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\b(\d{4})(?:[-/.](\d{1,2})(?:[-/.](\d{1,2}))?)?\b")
            .expect("date pattern is a valid regex")
    })
}

/// Converts a free-form publication date (`1965`, `1965-08`, `1965/8/1`,
/// `August 1965`) to a PDF date `D:YYYY[MM[DD]]`.
pub fn pdf_date(publication_date: &str) -> Option<String> {
    let caps = date_pattern().captures(publication_date)?;
    let component = |index: usize, max: u8| {
        caps.get(index)
            .and_then(|m| m.as_str().parse::<u8>().ok())
            .filter(|value| (1..=max).contains(value))
    };
    let mut date = format!("D:{}", &caps[1]);
    if let Some(month) = component(2, 12) {
        date.push_str(&format!("{month:02}"));
        if let Some(day) = component(3, 31) {
            date.push_str(&format!("{day:02}"));
        }
    }
    Some(date)
}

/// Encodes a PDF text string: a literal for ASCII, UTF-16BE with a byte-order mark otherwise.
pub fn text_string(value: &str) -> Object {
    if value.is_ascii() {
        return Object::string_literal(value);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in value.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Decodes a PDF text string written as UTF-16BE, UTF-8 (with BOM) or a single-byte encoding.
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(utf8) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(utf8).into_owned();
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}
