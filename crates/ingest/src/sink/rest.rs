use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use indexfeed_core::config::SearchConfig;
use indexfeed_core::{EmbeddedRecord, IngestError};

use super::IndexSink;

/// Sink that upserts records into the hosted search index over its REST
/// document API. Every record is sent with the merge-or-upload action, so
/// an id that already exists is updated in place.
pub struct SearchRestSink {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    index_name: String,
}

impl SearchRestSink {
    pub fn from_config(config: &SearchConfig) -> Result<Self, IngestError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|err| IngestError::Config(format!("HTTP client: {err}")))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            index_name: config.index_name.clone(),
        })
    }

    fn docs_url(&self) -> String {
        format!("{}/indexes/{}/docs/index", self.endpoint, self.index_name)
    }
}

fn to_upsert_action(record: &EmbeddedRecord) -> Result<Value, IngestError> {
    let mut value = serde_json::to_value(record).map_err(|err| IngestError::Upload {
        count: 1,
        reason: format!("record serialization: {err}"),
    })?;
    value
        .as_object_mut()
        .expect("records serialize to objects")
        .insert("@search.action".into(), json!("mergeOrUpload"));
    Ok(value)
}

#[async_trait]
impl IndexSink for SearchRestSink {
    async fn upsert_batch(&self, records: &[EmbeddedRecord]) -> Result<(), IngestError> {
        let actions = records
            .iter()
            .map(to_upsert_action)
            .collect::<Result<Vec<_>, _>>()?;
        let body = json!({ "value": actions });

        let mut builder = self.client.post(self.docs_url()).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.header("api-key", key);
        }

        let response = builder.send().await.map_err(|err| IngestError::Upload {
            count: records.len(),
            reason: err.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(IngestError::Upload {
                count: records.len(),
                reason: format!("{status}: {detail}"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_action_wraps_wire_fields() {
        let record = EmbeddedRecord {
            id: "abc".into(),
            content: "body".into(),
            filepath: "file.pdf".into(),
            title: "Title".into(),
            url: "https://example.com".into(),
            content_vector: vec![0.25, 0.5],
        };
        let action = to_upsert_action(&record).unwrap();
        assert_eq!(action["@search.action"], "mergeOrUpload");
        assert_eq!(action["id"], "abc");
        assert_eq!(action["contentVector"][1], 0.5);
    }

    #[test]
    fn docs_url_strips_trailing_slash() {
        let sink = SearchRestSink::from_config(&SearchConfig {
            endpoint: "https://search.example.com/".into(),
            api_key: None,
            index_name: "documents".into(),
        })
        .unwrap();
        assert_eq!(
            sink.docs_url(),
            "https://search.example.com/indexes/documents/docs/index"
        );
    }
}
