//! Wiki-page extraction from the relational database.
//!
//! Pages live across three tables: content and format in `WikiPage`
//! (one row per version), the node description in `WikiNode`, and the
//! stable title in `WikiPageResource`. Only the newest version of each
//! page is ingested, and rows with empty content or an empty node
//! description are filtered out in SQL.

use sqlx::mysql::{MySqlPool, MySqlPoolOptions};

use indexfeed_core::IngestError;

const LATEST_PAGES_SQL: &str = r#"
    SELECT description, title, content, format
    FROM (
        SELECT b.description, c.title, a.content, a.format,
               ROW_NUMBER() OVER (PARTITION BY a.resourcePrimKey ORDER BY a.version DESC) AS row_num
        FROM WikiPage a
        JOIN WikiNode b ON b.nodeId = a.nodeId
        JOIN WikiPageResource c ON c.resourcePrimKey = a.resourcePrimKey
    ) ranked
    WHERE row_num = 1
      AND LENGTH(content) > 0
      AND description <> ''
"#;

/// The newest version of one wiki page.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WikiRow {
    pub description: String,
    pub title: String,
    pub content: String,
    pub format: String,
}

pub async fn connect(url: &str) -> Result<MySqlPool, IngestError> {
    MySqlPoolOptions::new()
        .max_connections(4)
        .connect(url)
        .await
        .map_err(|err| IngestError::Database(err.to_string()))
}

pub async fn fetch_latest_pages(pool: &MySqlPool) -> Result<Vec<WikiRow>, IngestError> {
    let rows = sqlx::query_as::<_, WikiRow>(LATEST_PAGES_SQL)
        .fetch_all(pool)
        .await
        .map_err(|err| IngestError::Database(err.to_string()))?;
    tracing::info!(pages = rows.len(), "fetched latest wiki pages");
    Ok(rows)
}

/// Public link for a wiki page: base URL, node description, page title,
/// with spaces encoded as `+` the way the wiki front end expects.
pub fn page_url(base: &str, description: &str, title: &str) -> String {
    format!(
        "{}/{}/{}",
        base.trim_end_matches('/'),
        description.replace(' ', "+"),
        title.replace(' ', "+")
    )
}
