//! Per-page extraction from a directory of PDF files.
//!
//! Extracted text carries a form feed between pages; each page becomes its
//! own record so search hits land on a page, not a whole manual. Record ids
//! mix the whole-file digest with the page number, which keeps every page
//! addressable. The legacy mode reuses the bare file digest for all pages
//! of a file, reproducing the historical last-page-wins behavior.

use std::path::Path;

use indexfeed_core::config::PdfConfig;
use indexfeed_core::fingerprint::{fingerprint_fields, fingerprint_file, HashAlgorithm};
use indexfeed_core::IngestError;

use crate::assemble::RecordParts;

const PAGE_SEPARATOR: char = '\x0C';

/// Split extracted text into pages, dropping pages with no visible text.
/// Page numbers are positions in the original document, so a blank page
/// still advances the numbering.
fn paginate(text: &str) -> Vec<(usize, &str)> {
    text.split(PAGE_SEPARATOR)
        .enumerate()
        .filter(|(_, page)| !page.trim().is_empty())
        .collect()
}

fn page_records(
    text: &str,
    file_digest: &str,
    file_name: &str,
    title: &str,
    url: &str,
    algorithm: HashAlgorithm,
    legacy_page_ids: bool,
) -> Vec<RecordParts> {
    paginate(text)
        .into_iter()
        .map(|(page_number, page)| {
            let page_tag = page_number.to_string();
            let id = if legacy_page_ids {
                file_digest.to_string()
            } else {
                fingerprint_fields(algorithm, &[file_digest, page_tag.as_str()])
            };
            RecordParts {
                id,
                content: page.to_string(),
                filepath: file_name.to_string(),
                title: title.to_string(),
                url: url.to_string(),
            }
        })
        .collect()
}

/// Extract one file into per-page records.
pub fn extract_file(
    path: &Path,
    algorithm: HashAlgorithm,
    config: &PdfConfig,
) -> Result<Vec<RecordParts>, IngestError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let title = path
        .file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let file_digest = fingerprint_file(algorithm, path)?;
    let text = pdf_extract::extract_text(path)
        .map_err(|err| IngestError::parse(path.display().to_string(), err.to_string()))?;

    let records = page_records(
        &text,
        &file_digest,
        &file_name,
        &title,
        &path.display().to_string(),
        algorithm,
        config.legacy_page_ids,
    );
    tracing::info!(file = %file_name, pages = records.len(), "extracted PDF");
    Ok(records)
}

/// Walk a directory and extract every `.pdf` file in it, in name order.
/// A file that fails to parse is logged and skipped; the rest of the
/// directory is still processed.
pub fn extract_dir(
    dir: &Path,
    algorithm: HashAlgorithm,
    config: &PdfConfig,
) -> Result<Vec<RecordParts>, IngestError> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    paths.sort();

    let mut records = Vec::new();
    for path in paths {
        match extract_file(&path, algorithm, config) {
            Ok(mut pages) => records.append(&mut pages),
            Err(err) => {
                tracing::warn!(file = %path.display(), error = %err, "skipping unreadable PDF");
            }
        }
    }
    Ok(records)
}
