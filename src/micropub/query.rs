// Micropub query endpoint: GET /micropub?q=...
//
// Supported queries:
//   q=config        endpoint configuration, including the preview URL
//   q=syndicate-to  syndication targets (none are configured)
//   q=source&url=   properties of a stored note, optionally filtered
//                   with properties[]=name

use serde_json::{json, Map, Value};

use crate::config::SiteConfig;
use crate::db::models::Note;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryRequest {
    Config,
    SyndicateTo,
    Source { url: String, properties: Vec<String> },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("missing `q` parameter")]
    MissingQuery,
    #[error("unsupported query: {0}")]
    UnsupportedQuery(String),
    #[error("q=source requires a `url` parameter")]
    MissingUrl,
}

/// Parse the raw query string of a query request.
pub fn parse_query(raw: Option<&str>) -> Result<QueryRequest, QueryError> {
    let mut q = None;
    let mut url = None;
    let mut properties = Vec::new();

    for (key, value) in form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
        match key.as_ref() {
            "q" => q = Some(value.into_owned()),
            "url" => url = Some(value.into_owned()),
            "properties" | "properties[]" => properties.push(value.into_owned()),
            _ => {}
        }
    }

    match q.as_deref() {
        None | Some("") => Err(QueryError::MissingQuery),
        Some("config") => Ok(QueryRequest::Config),
        Some("syndicate-to") => Ok(QueryRequest::SyndicateTo),
        Some("source") => match url {
            Some(url) if !url.is_empty() => Ok(QueryRequest::Source { url, properties }),
            _ => Err(QueryError::MissingUrl),
        },
        Some(other) => Err(QueryError::UnsupportedQuery(other.to_string())),
    }
}

pub fn config_response(site: &SiteConfig) -> Value {
    json!({
        "syndicate-to": [],
        "preview": site.preview_url(),
    })
}

pub fn syndicate_to_response() -> Value {
    json!({ "syndicate-to": [] })
}

/// Microformats2 JSON for a stored note. With a non-empty `properties`
/// filter only those properties are returned, and without `type`.
pub fn source_response(note: &Note, properties: &[String]) -> Value {
    let all = note_properties(note);
    if properties.is_empty() {
        return json!({ "type": ["h-entry"], "properties": all });
    }
    let filtered: Map<String, Value> = all
        .into_iter()
        .filter(|(k, _)| properties.iter().any(|p| p == k))
        .collect();
    json!({ "properties": filtered })
}

fn note_properties(note: &Note) -> Map<String, Value> {
    let mut props = Map::new();
    let mut put_one = |key: &str, value: &Option<String>| {
        if let Some(v) = value {
            props.insert(key.to_string(), json!([v]));
        }
    };
    put_one("name", &note.name);
    put_one("content", &note.content);
    put_one("summary", &note.summary);
    put_one("rsvp", &note.rsvp);

    props.insert("published".to_string(), json!([note.published.to_rfc3339()]));
    props.insert("url".to_string(), json!([note.url]));

    for (key, values) in [
        ("category", &note.category),
        ("in-reply-to", &note.in_reply_to),
        ("like-of", &note.like_of),
        ("repost-of", &note.repost_of),
        ("bookmark-of", &note.bookmark_of),
        ("photo", &note.photo),
        ("video", &note.video),
        ("syndication", &note.syndication),
    ] {
        if !values.is_empty() {
            props.insert(key.to_string(), json!(values));
        }
    }
    props
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        assert_eq!(parse_query(Some("q=config")), Ok(QueryRequest::Config));
        assert_eq!(
            parse_query(Some("q=syndicate-to")),
            Ok(QueryRequest::SyndicateTo)
        );
    }

    #[test]
    fn test_parse_source() {
        assert_eq!(
            parse_query(Some(
                "q=source&url=https%3A%2F%2Fexample.com%2Fnotes%2Fa&properties[]=content"
            )),
            Ok(QueryRequest::Source {
                url: "https://example.com/notes/a".to_string(),
                properties: vec!["content".to_string()],
            })
        );
        assert_eq!(parse_query(Some("q=source")), Err(QueryError::MissingUrl));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_query(None), Err(QueryError::MissingQuery));
        assert_eq!(
            parse_query(Some("q=category")),
            Err(QueryError::UnsupportedQuery("category".to_string()))
        );
    }

    #[test]
    fn test_config_response_has_preview() {
        let site = SiteConfig::new("https://example.com", "https://tokens.example/token");
        let value = config_response(&site);
        assert_eq!(value["preview"], "https://example.com/micropub/preview");
        assert!(value["syndicate-to"].as_array().unwrap().is_empty());
    }
}
