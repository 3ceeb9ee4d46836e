//! Breadth-first site crawl.
//!
//! Starting from one URL, every fetched page becomes a single record and
//! its same-site links are queued. A visited set and a page cap bound the
//! crawl; pages answering anything but 2xx are logged and skipped, and a
//! page that fails to download does not stop the rest of the crawl.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

use indexfeed_core::config::CrawlConfig;
use indexfeed_core::fingerprint::{fingerprint_fields, HashAlgorithm};
use indexfeed_core::IngestError;

use crate::assemble::RecordParts;

pub struct Crawler {
    client: Client,
    session_cookie: Option<String>,
    max_pages: usize,
    algorithm: HashAlgorithm,
}

struct ParsedPage {
    title: Option<String>,
    text: String,
    links: Vec<String>,
}

/// Pull title, visible text and same-site links out of one page.
///
/// Links are resolved against the page URL, then kept only when the
/// start URL appears in the resolved form, so the crawl never leaves
/// the site (or the subtree) it was pointed at.
fn parse_page(html: &str, page_url: &Url, site_filter: &str) -> ParsedPage {
    let doc = Html::parse_document(html);

    let title_selector = Selector::parse("title").expect("static selector");
    let title = doc
        .select(&title_selector)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());

    let text = doc
        .root_element()
        .text()
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    let link_selector = Selector::parse("a[href]").expect("static selector");
    let links = doc
        .select(&link_selector)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| page_url.join(href).ok())
        .map(|mut resolved| {
            resolved.set_fragment(None);
            resolved.to_string()
        })
        .filter(|resolved| resolved.contains(site_filter))
        .collect();

    ParsedPage { title, text, links }
}

impl Crawler {
    pub fn from_config(config: &CrawlConfig, algorithm: HashAlgorithm) -> Result<Self, IngestError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| IngestError::Config(format!("HTTP client: {err}")))?;
        Ok(Self {
            client,
            session_cookie: config.session_cookie.clone(),
            max_pages: config.max_pages.max(1),
            algorithm,
        })
    }

    async fn fetch(&self, url: &str) -> Result<(reqwest::StatusCode, String), IngestError> {
        let mut builder = self.client.get(url);
        if let Some(cookie) = &self.session_cookie {
            builder = builder.header("Cookie", cookie.clone());
        }
        let response = builder
            .send()
            .await
            .map_err(|err| IngestError::network(url, err.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| IngestError::network(url, err.to_string()))?;
        Ok((status, body))
    }

    /// Crawl the site rooted at `start_url`, one record per fetched page.
    pub async fn crawl(&self, start_url: &str) -> Result<Vec<RecordParts>, IngestError> {
        Url::parse(start_url)
            .map_err(|err| IngestError::parse(start_url, err.to_string()))?;

        let mut queue: VecDeque<String> = VecDeque::from([start_url.to_string()]);
        let mut visited: HashSet<String> = HashSet::new();
        let mut records = Vec::new();
        let mut fetched = 0usize;

        while let Some(url) = queue.pop_front() {
            if !visited.insert(url.clone()) {
                continue;
            }
            if fetched >= self.max_pages {
                tracing::warn!(max_pages = self.max_pages, "page cap reached, stopping crawl");
                break;
            }
            fetched += 1;

            let (status, body) = match self.fetch(&url).await {
                Ok(ok) => ok,
                Err(err) => {
                    tracing::warn!(%url, error = %err, "fetch failed, skipping page");
                    continue;
                }
            };
            if !status.is_success() {
                tracing::warn!(%url, %status, "skipping page");
                continue;
            }

            let page_url = match Url::parse(&url) {
                Ok(parsed) => parsed,
                Err(err) => {
                    tracing::warn!(%url, error = %err, "unparsable URL, skipping page");
                    continue;
                }
            };
            let page = parse_page(&body, &page_url, start_url);

            tracing::info!(%url, links = page.links.len(), "processed page");
            records.push(RecordParts {
                id: fingerprint_fields(self.algorithm, &[&page.text]),
                content: page.text,
                filepath: url.clone(),
                title: page.title.unwrap_or_else(|| url.clone()),
                url,
            });

            for link in page.links {
                if !visited.contains(&link) {
                    queue.push_back(link);
                }
            }
        }

        Ok(records)
    }
}
