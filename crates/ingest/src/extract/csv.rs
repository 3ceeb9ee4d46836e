//! Product-catalog extraction from a CSV file.
//!
//! One record per row: the id comes from the row's `id` column, the title
//! from `name`, and the embedded text from the configured content column.
//! The public URL and filepath are both derived from the slugified title.

use std::path::Path;

use indexfeed_core::config::CsvConfig;
use indexfeed_core::IngestError;

use crate::assemble::RecordParts;

/// Lowercase the title and replace spaces with dashes.
fn slugify(title: &str) -> String {
    title.to_lowercase().replace(' ', "-")
}

fn column_index(headers: &csv::StringRecord, name: &str, path: &Path) -> Result<usize, IngestError> {
    headers.iter().position(|h| h == name).ok_or_else(|| {
        IngestError::Config(format!(
            "missing column `{name}` in {}",
            path.display()
        ))
    })
}

/// Read every row of the catalog into pending records.
pub fn extract(path: &Path, config: &CsvConfig) -> Result<Vec<RecordParts>, IngestError> {
    let mut reader = csv::Reader::from_path(path).map_err(|err| {
        IngestError::parse(path.display().to_string(), err.to_string())
    })?;

    let headers = reader
        .headers()
        .map_err(|err| IngestError::parse(path.display().to_string(), err.to_string()))?
        .clone();
    let id_idx = column_index(&headers, "id", path)?;
    let name_idx = column_index(&headers, "name", path)?;
    let content_idx = column_index(&headers, &config.content_column, path)?;

    let mut records = Vec::new();
    for (row_number, row) in reader.records().enumerate() {
        let row = row.map_err(|err| {
            IngestError::parse(format!("{}:{}", path.display(), row_number + 2), err.to_string())
        })?;

        let id = row.get(id_idx).unwrap_or_default().to_string();
        let title = row.get(name_idx).unwrap_or_default().to_string();
        let content = row.get(content_idx).unwrap_or_default().to_string();
        let slug = slugify(&title);

        records.push(RecordParts {
            id,
            content,
            filepath: slug.clone(),
            title,
            url: format!("/products/{slug}"),
        });
    }

    tracing::info!(path = %path.display(), rows = records.len(), "extracted CSV catalog");
    Ok(records)
}
