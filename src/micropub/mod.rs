// Micropub request handling: parsing submissions into JF2 entries.
//
// A submission goes through three steps before anything is saved:
//   parse (form or JSON) -> fetch missing references -> classify post types
// `normalize` runs all three; the create and preview handlers share it.

pub mod form;
pub mod jf2;
pub mod json;
pub mod post_types;
pub mod query;
pub mod references;

use anyhow::Result;

pub use jf2::{Author, Card, Citation, Entry, PostType, Reference};
pub use references::{HttpReferenceFetcher, NoopReferenceFetcher, ReferenceFetcher};

/// Reasons a submission can't be turned into an entry.
#[derive(Debug, thiserror::Error)]
pub enum MicropubError {
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("unsupported post type: h-{0}")]
    UnsupportedType(String),

    #[error("unsupported action: {0}")]
    UnsupportedAction(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("malformed JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse a request body according to its Content-Type.
pub fn parse_request(content_type: Option<&str>, body: &[u8]) -> Result<Entry, MicropubError> {
    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .unwrap_or_default();

    match mime.as_str() {
        "application/x-www-form-urlencoded" => form::parse_form(body),
        "application/json" => json::parse_json(body),
        "" => Err(MicropubError::UnsupportedContentType("(none)".to_string())),
        other => Err(MicropubError::UnsupportedContentType(other.to_string())),
    }
}

/// Parse, fill in missing references and classify a submission.
pub async fn normalize(
    content_type: Option<&str>,
    body: &[u8],
    fetcher: &dyn ReferenceFetcher,
) -> Result<Entry> {
    let mut entry = parse_request(content_type, body)?;
    references::fetch_missing(fetcher, &mut entry).await;
    post_types::classify(&mut entry);
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_on_content_type() {
        let entry = parse_request(
            Some("application/x-www-form-urlencoded; charset=utf-8"),
            b"content=hi",
        )
        .unwrap();
        assert_eq!(entry.content.as_deref(), Some("hi"));

        let entry = parse_request(
            Some("Application/JSON"),
            br#"{"type":["h-entry"],"properties":{"content":["hi"]}}"#,
        )
        .unwrap();
        assert_eq!(entry.content.as_deref(), Some("hi"));
    }

    #[test]
    fn test_multipart_unsupported() {
        let err = parse_request(Some("multipart/form-data; boundary=x"), b"").unwrap_err();
        assert!(matches!(err, MicropubError::UnsupportedContentType(ct) if ct == "multipart/form-data"));
        assert!(parse_request(None, b"content=hi").is_err());
    }

    #[tokio::test]
    async fn test_normalize_classifies() {
        let entry = normalize(
            Some("application/x-www-form-urlencoded"),
            b"content=nice&in-reply-to=https%3A%2F%2Fother.example%2F",
            &NoopReferenceFetcher,
        )
        .await
        .unwrap();
        assert_eq!(entry.post_types, vec![PostType::Reply, PostType::Note]);
    }
}
