use std::env;

use anyhow::Result;

/// Token endpoint used when MARGINALIA_TOKEN_ENDPOINT is unset.
pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://tokens.indieauth.com/token";

/// Site-wide settings shared by every route.
///
/// Built once at startup and handed to the router inside an `Arc`; handlers
/// only ever read it.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Canonical site URL, without a trailing slash (e.g. https://example.com)
    pub url: String,
    /// Human-readable site name used in page titles
    pub name: String,
    /// IndieAuth token endpoint used to verify bearer tokens
    pub token_endpoint: String,
    /// Require the token's client_id to equal "{url}/". Off by default.
    pub validate_client_id: bool,
}

impl SiteConfig {
    pub fn new(url: &str, token_endpoint: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            name: "Notes".to_string(),
            token_endpoint: token_endpoint.to_string(),
            validate_client_id: false,
        }
    }

    /// URL of the preview endpoint advertised by `q=config`.
    pub fn preview_url(&self) -> String {
        format!("{}/micropub/preview", self.url)
    }

    /// Canonical URL of a note with the given slug.
    pub fn note_url(&self, slug: &str) -> String {
        format!("{}/notes/{}", self.url, slug)
    }

    /// True if `url` points somewhere on this site.
    pub fn is_own_url(&self, url: &str) -> bool {
        !self.url.is_empty()
            && (url == self.url || url.starts_with(&format!("{}/", self.url)))
    }
}

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy.
pub struct Config {
    pub site: SiteConfig,
    pub db_path: String,
    /// Fetch titles for referenced URLs that arrive without an embedded h-cite.
    pub fetch_references: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Only the site URL lacks a default; `serve` refuses to start without it.
    pub fn load() -> Result<Self> {
        let mut site = SiteConfig::new(
            &env::var("MARGINALIA_SITE_URL").unwrap_or_default(),
            &env::var("MARGINALIA_TOKEN_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_TOKEN_ENDPOINT.to_string()),
        );
        if let Ok(name) = env::var("MARGINALIA_SITE_NAME") {
            site.name = name;
        }
        site.validate_client_id = env_flag("MARGINALIA_VALIDATE_CLIENT_ID", false);

        Ok(Self {
            site,
            db_path: env::var("MARGINALIA_DB_PATH").unwrap_or_else(|_| "./marginalia.db".to_string()),
            fetch_references: env_flag("MARGINALIA_FETCH_REFERENCES", true),
        })
    }

    /// Check that the site URL is configured.
    /// Call this before serving: note URLs and the preview URL derive from it.
    pub fn require_site(&self) -> Result<()> {
        if self.site.url.is_empty() {
            anyhow::bail!(
                "MARGINALIA_SITE_URL not set. Add it to your .env file.\n\
                 See .env.example for the required variables."
            );
        }
        if !self.site.url.starts_with("http://") && !self.site.url.starts_with("https://") {
            anyhow::bail!(
                "MARGINALIA_SITE_URL must be an absolute http(s) URL, got {}",
                self.site.url
            );
        }
        Ok(())
    }
}

fn env_flag(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .and_then(|v| parse_flag(&v))
        .unwrap_or(default)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
