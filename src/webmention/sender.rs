// HTTP webmention sender.
//
// Discovers the target's endpoint (see discovery.rs), resolves it against the
// target URL, and POSTs `source` and `target` as a form.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, LINK};
use reqwest::Url;
use tracing::debug;

use super::discovery::{endpoint_from_html, endpoint_from_link_headers};
use super::WebmentionSender;

pub struct HttpWebmentionSender {
    client: reqwest::Client,
}

impl HttpWebmentionSender {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(crate::USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    /// Discover the webmention endpoint for `target`, as an absolute URL.
    pub async fn discover(&self, target: &str) -> Result<Url> {
        let target_url = Url::parse(target).with_context(|| format!("Invalid target URL {target}"))?;

        let response = self
            .client
            .get(target_url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to fetch {target}"))?;

        // Redirects are followed, so relative endpoints resolve against the final URL.
        let base = response.url().clone();

        let from_header = endpoint_from_link_headers(
            response
                .headers()
                .get_all(LINK)
                .iter()
                .filter_map(|v| v.to_str().ok()),
        );

        let endpoint = match from_header {
            Some(endpoint) => endpoint,
            None => {
                let is_html = response
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map_or(true, |ct| ct.contains("html"));
                if !is_html {
                    anyhow::bail!("No webmention endpoint advertised by {target}");
                }
                let body = response.text().await.context("Failed to read target page")?;
                endpoint_from_html(&body)
                    .with_context(|| format!("No webmention endpoint advertised by {target}"))?
            }
        };

        base.join(&endpoint)
            .with_context(|| format!("Invalid webmention endpoint {endpoint:?} for {target}"))
    }
}

#[async_trait]
impl WebmentionSender for HttpWebmentionSender {
    async fn send(&self, source: &str, target: &str) -> Result<String> {
        let endpoint = self.discover(target).await?;
        debug!(endpoint = %endpoint, target = target, "Discovered webmention endpoint");

        let response = self
            .client
            .post(endpoint.clone())
            .form(&[("source", source), ("target", target)])
            .send()
            .await
            .with_context(|| format!("Webmention request to {endpoint} failed"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Webmention endpoint {} returned {}: {}", endpoint, status, body);
        }

        Ok(format!("Webmention sent to {target} via {endpoint} ({status})"))
    }
}
