//! Title-based file naming.

use crate::error::PdfError;
use bookmeta::metadata::is_unknown;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Characters that are not allowed in file names on common platforms.
const FORBIDDEN_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

const MAX_STEM_BYTES: usize = 200;

/// Turns a title into a file stem: forbidden characters become spaces, each
/// word is capitalized and words are joined with single spaces.
///
/// Returns `None` when nothing usable is left.
pub fn title_to_file_stem(title: &str) -> Option<String> {
    let cleaned: String = title
        .chars()
        .map(|c| {
            if FORBIDDEN_CHARS.contains(&c) || c.is_control() {
                ' '
            } else {
                c
            }
        })
        .collect();

    let mut stem = cleaned
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ");
    stem = stem.trim_start_matches('.').trim().to_string();

    if stem.len() > MAX_STEM_BYTES {
        let mut cut = MAX_STEM_BYTES;
        while !stem.is_char_boundary(cut) {
            cut -= 1;
        }
        stem.truncate(cut);
        stem = stem.trim_end().to_string();
    }

    (!stem.is_empty()).then_some(stem)
}

/// Upper-cases the first character and lower-cases the rest.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Returns `path` if nothing exists there, otherwise the first free
/// `<stem> (N).<ext>` sibling, starting at 2.
pub fn unique_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (2..)
        .map(|n| parent.join(format!("{stem} ({n}){extension}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

/// Renames the PDF at `path` after `title` within the same directory.
///
/// Unknown or empty titles leave the file where it is. An existing file with
/// the target name is never overwritten.
pub fn rename_by_title(path: &Path, title: &str) -> Result<PathBuf, PdfError> {
    if is_unknown(title) {
        warn!(
            "Title is unknown; keeping file name '{}'.",
            path.display()
        );
        return Ok(path.to_path_buf());
    }
    let Some(stem) = title_to_file_stem(title) else {
        warn!("Title '{}' has no usable characters for a file name.", title);
        return Ok(path.to_path_buf());
    };

    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let target = parent.join(format!("{stem}.pdf"));
    if target == path {
        return Ok(target);
    }
    let target = unique_path(&target);

    std::fs::rename(path, &target).map_err(|e| PdfError::io(path, e))?;
    info!("Renamed '{}' to '{}'.", path.display(), target.display());
    Ok(target)
}
