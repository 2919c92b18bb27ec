// JSON Micropub requests (application/json).
//
//   {"type": ["h-entry"], "properties": {"content": ["hello"], ...}}
//
// Property values may be plain strings, `{"html": ..., "value": ...}` content
// objects, or nested microformats objects. Nested h-cite objects in the
// response properties (in-reply-to, like-of, ...) and nested h-card objects in
// `category` are lifted into the entry's reference map; the property itself
// keeps only the object's URL.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::jf2::{html_to_text, Author, Card, Citation, Entry, Reference};
use super::MicropubError;

const RESPONSE_PROPERTIES: [&str; 4] = ["in-reply-to", "like-of", "repost-of", "bookmark-of"];

#[derive(Deserialize)]
struct JsonRequest {
    #[serde(rename = "type", default)]
    kind: Vec<String>,
    #[serde(default)]
    properties: Map<String, Value>,
    action: Option<String>,
}

/// Parse a JSON body into an entry.
pub fn parse_json(body: &[u8]) -> Result<Entry, MicropubError> {
    let request: JsonRequest = serde_json::from_slice(body)?;

    if let Some(action) = request.action {
        return Err(MicropubError::UnsupportedAction(action));
    }
    if let Some(kind) = request.kind.first() {
        if kind != "h-entry" {
            return Err(MicropubError::UnsupportedType(
                kind.trim_start_matches("h-").to_string(),
            ));
        }
    }

    let mut entry = Entry::default();
    for (key, values) in request.properties {
        let values = match values {
            Value::Array(values) => values,
            other => vec![other],
        };
        for value in values {
            apply_value(&mut entry, &key, value)?;
        }
    }
    Ok(entry)
}

fn apply_value(entry: &mut Entry, key: &str, value: Value) -> Result<(), MicropubError> {
    match value {
        Value::String(s) => {
            if !entry.set_property(key, s) {
                debug!(property = key, "Ignoring unsupported JSON property");
            }
        }
        Value::Object(obj) if obj.contains_key("type") => {
            let url = extract_reference(entry, key, &obj)?;
            entry.set_property(key, url);
        }
        Value::Object(obj) => {
            if let Some(text) = content_text(&obj) {
                entry.set_property(key, text);
            }
        }
        _ => debug!(property = key, "Ignoring non-string property value"),
    }
    Ok(())
}

/// Text of a `{"value": ..., "html": ...}` object, preferring the plain value.
fn content_text(obj: &Map<String, Value>) -> Option<String> {
    if let Some(Value::String(value)) = obj.get("value") {
        return Some(value.clone());
    }
    match obj.get("html") {
        Some(Value::String(html)) => Some(html_to_text(html)),
        _ => None,
    }
}

/// Lift a nested microformats object into the reference map and return the
/// URL it should be referred to by.
fn extract_reference(
    entry: &mut Entry,
    key: &str,
    obj: &Map<String, Value>,
) -> Result<String, MicropubError> {
    let types = strings(obj.get("type"));
    let props = match obj.get("properties") {
        Some(Value::Object(props)) => props,
        _ => {
            return Err(MicropubError::InvalidRequest(format!(
                "nested object in `{key}` has no properties"
            )))
        }
    };

    let is_card = types.iter().any(|t| t == "h-card");

    if is_card {
        let card = card_from_props(props);
        // Person tags are allowed to omit a URL; the persistence step decides
        // whether such a card is usable, so key it by name instead.
        let reference_key = card
            .url
            .first()
            .cloned()
            .or_else(|| card.uid.clone())
            .or_else(|| card.name.clone())
            .ok_or_else(|| {
                MicropubError::InvalidRequest(format!("h-card in `{key}` has no url or name"))
            })?;
        entry
            .references
            .insert(reference_key.clone(), Reference::Card(card));
        return Ok(reference_key);
    }

    if !RESPONSE_PROPERTIES.contains(&key) {
        return Err(MicropubError::InvalidRequest(format!(
            "nested {} objects are not accepted in `{key}`",
            types.first().map(String::as_str).unwrap_or("microformats")
        )));
    }

    let url = first_string(props, "url").ok_or_else(|| {
        MicropubError::InvalidRequest(format!("nested object in `{key}` has no url"))
    })?;

    let author = match props.get("author").and_then(|v| first_value(v)) {
        Some(Value::Object(author)) => {
            let author_props = match author.get("properties") {
                Some(Value::Object(p)) => Some(p),
                _ => None,
            };
            author_props.map(|p| {
                let card = card_from_props(p);
                let author = Author {
                    name: card.name.clone(),
                    url: card.url.first().cloned(),
                };
                if let Some(author_url) = card.url.first().cloned() {
                    entry
                        .references
                        .entry(author_url)
                        .or_insert(Reference::Card(card));
                }
                author
            })
        }
        Some(Value::String(s)) if s.starts_with("http") => Some(Author {
            name: None,
            url: Some(s.clone()),
        }),
        Some(Value::String(s)) => Some(Author {
            name: Some(s.clone()),
            url: None,
        }),
        _ => None,
    };

    let cite = Citation {
        url: strings(props.get("url")),
        name: first_string(props, "name"),
        content: props.get("content").and_then(first_value).and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Object(o) => content_text(o),
            _ => None,
        }),
        published: first_string(props, "published"),
        author,
        post_types: Vec::new(),
    };
    entry.references.insert(url.clone(), Reference::Cite(cite));
    Ok(url)
}

fn card_from_props(props: &Map<String, Value>) -> Card {
    Card {
        uid: first_string(props, "uid"),
        url: strings(props.get("url")),
        name: first_string(props, "name"),
        photo: first_string(props, "photo"),
        post_types: Vec::new(),
    }
}

fn first_value(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(values) => values.first(),
        other => Some(other),
    }
}

fn first_string(props: &Map<String, Value>, key: &str) -> Option<String> {
    strings(props.get(key)).into_iter().next()
}

/// All string values of a property. Objects with a `value` contribute that.
fn strings(value: Option<&Value>) -> Vec<String> {
    let values = match value {
        Some(Value::Array(values)) => values.iter().collect::<Vec<_>>(),
        Some(other) => vec![other],
        None => return Vec::new(),
    };
    values
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Object(o) => match o.get("value") {
                Some(Value::String(s)) => Some(s.clone()),
                _ => None,
            },
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_note() {
        let entry =
            parse_json(br#"{"type":["h-entry"],"properties":{"content":["hello world"]}}"#)
                .unwrap();
        assert_eq!(entry.content.as_deref(), Some("hello world"));
    }

    #[test]
    fn test_html_content_reduced_to_text() {
        let entry = parse_json(
            br#"{"type":["h-entry"],"properties":{"content":[{"html":"<p>hi <em>there</em></p>"}]}}"#,
        )
        .unwrap();
        assert_eq!(entry.content.as_deref(), Some("hi there"));
    }

    #[test]
    fn test_nested_cite_becomes_reference() {
        let entry = parse_json(
            br#"{"type":["h-entry"],"properties":{
                "content":["nice"],
                "in-reply-to":[{"type":["h-cite"],"properties":{
                    "url":["https://other.example/post"],
                    "name":["Their post"],
                    "author":[{"type":["h-card"],"properties":{"name":["Bob"],"url":["https://bob.example/"]}}]
                }}]
            }}"#,
        )
        .unwrap();
        assert_eq!(entry.in_reply_to, vec!["https://other.example/post"]);
        match entry.references.get("https://other.example/post") {
            Some(Reference::Cite(cite)) => {
                assert_eq!(cite.name.as_deref(), Some("Their post"));
                assert_eq!(
                    cite.author.as_ref().and_then(|a| a.name.as_deref()),
                    Some("Bob")
                );
            }
            other => panic!("expected cite, got {other:?}"),
        }
        assert!(matches!(
            entry.references.get("https://bob.example/"),
            Some(Reference::Card(_))
        ));
    }

    #[test]
    fn test_person_tag_in_category() {
        let entry = parse_json(
            br#"{"type":["h-entry"],"properties":{"category":["rust",
                {"type":["h-card"],"properties":{"name":["Alice"],"url":["https://alice.example/"]}}]}}"#,
        )
        .unwrap();
        assert_eq!(entry.category, vec!["rust", "https://alice.example/"]);
        assert!(matches!(
            entry.references.get("https://alice.example/"),
            Some(Reference::Card(card)) if card.uid.is_none()
        ));
    }

    #[test]
    fn test_cite_without_url_rejected() {
        let err = parse_json(
            br#"{"type":["h-entry"],"properties":{"like-of":[{"type":["h-cite"],"properties":{"name":["x"]}}]}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, MicropubError::InvalidRequest(_)));
    }

    #[test]
    fn test_action_rejected() {
        let err = parse_json(br#"{"action":"delete","url":"https://example.com/notes/a"}"#)
            .unwrap_err();
        assert!(matches!(err, MicropubError::UnsupportedAction(a) if a == "delete"));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            parse_json(b"{not json").unwrap_err(),
            MicropubError::Json(_)
        ));
    }

    #[test]
    fn test_scalar_property_value_accepted() {
        let entry =
            parse_json(br#"{"type":["h-entry"],"properties":{"content":"bare string"}}"#).unwrap();
        assert_eq!(entry.content.as_deref(), Some("bare string"));
    }
}
