// Reference fetching: fill in citations for response URLs that arrived bare.
//
// A reply posted from a form only carries the URL it replies to. Fetching the
// page gives us a title to show as reply context and to store as a
// NoteContext. Fetch failures only cost us that context, so they're logged
// and skipped.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex_lite::Regex;
use tracing::{debug, warn};

use super::jf2::{decode_entities, Citation, Entry, Reference};

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());

#[async_trait]
pub trait ReferenceFetcher: Send + Sync {
    /// Build a reference for `url`, or `None` if this fetcher doesn't fetch.
    async fn fetch(&self, url: &str) -> Result<Option<Reference>>;
}

/// Fetcher used when reference fetching is disabled.
pub struct NoopReferenceFetcher;

#[async_trait]
impl ReferenceFetcher for NoopReferenceFetcher {
    async fn fetch(&self, _url: &str) -> Result<Option<Reference>> {
        Ok(None)
    }
}

/// Fetches referenced pages over HTTP and cites them by their `<title>`.
pub struct HttpReferenceFetcher {
    client: reqwest::Client,
}

impl HttpReferenceFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(crate::USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ReferenceFetcher for HttpReferenceFetcher {
    async fn fetch(&self, url: &str) -> Result<Option<Reference>> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "text/html")
            .send()
            .await
            .with_context(|| format!("Failed to fetch {url}"))?;

        if !response.status().is_success() {
            anyhow::bail!("{} returned {}", url, response.status());
        }

        let body = response.text().await.context("Failed to read page body")?;
        Ok(Some(Reference::Cite(citation_from_html(url, &body))))
    }
}

/// Build a citation from a fetched page.
pub fn citation_from_html(url: &str, html: &str) -> Citation {
    let name = TITLE_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| decode_entities(m.as_str().split_whitespace().collect::<Vec<_>>().join(" ").as_str()))
        .filter(|t| !t.is_empty());

    Citation {
        url: vec![url.to_string()],
        name,
        ..Default::default()
    }
}

/// Fetch a reference for every response URL the entry doesn't already have one for.
pub async fn fetch_missing(fetcher: &dyn ReferenceFetcher, entry: &mut Entry) {
    let missing: Vec<String> = entry
        .response_urls()
        .filter(|url| !entry.references.contains_key(*url))
        .cloned()
        .collect();

    for url in missing {
        match fetcher.fetch(&url).await {
            Ok(Some(reference)) => {
                debug!(url = %url, "Fetched reference");
                entry.references.insert(url, reference);
            }
            Ok(None) => {}
            Err(e) => warn!(url = %url, error = %e, "Failed to fetch reference"),
        }
    }
}
