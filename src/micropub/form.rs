// Form-encoded Micropub requests (application/x-www-form-urlencoded).
//
//   h=entry&content=hello&category[]=a&category[]=b&mp-slug=hi
//
// Repeated keys and the `key[]` spelling both collect into lists. Form posts
// can't carry nested objects, so they never produce references on their own.

use tracing::debug;

use super::jf2::Entry;
use super::MicropubError;

/// Parse a form-encoded body into an entry.
pub fn parse_form(body: &[u8]) -> Result<Entry, MicropubError> {
    let mut entry = Entry::default();
    let mut kind = None;

    for (key, value) in form_urlencoded::parse(body) {
        let key = key.strip_suffix("[]").unwrap_or(&key);
        match key {
            "h" => kind = Some(value.into_owned()),
            // Consumed by the auth middleware.
            "access_token" => {}
            "action" => return Err(MicropubError::UnsupportedAction(value.into_owned())),
            "content[html]" => {
                entry.set_property("content", super::jf2::html_to_text(&value));
            }
            _ => {
                if !entry.set_property(key, value.into_owned()) {
                    debug!(property = key, "Ignoring unsupported form property");
                }
            }
        }
    }

    match kind.as_deref() {
        None | Some("entry") => Ok(entry),
        Some(other) => Err(MicropubError::UnsupportedType(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_note() {
        let entry = parse_form(b"h=entry&content=hello+world").unwrap();
        assert_eq!(entry.content.as_deref(), Some("hello world"));
        assert!(entry.references.is_empty());
    }

    #[test]
    fn test_bracketed_and_repeated_keys() {
        let entry =
            parse_form(b"h=entry&category[]=a&category%5B%5D=b&category=c&syndication=x").unwrap();
        assert_eq!(entry.category, vec!["a", "b", "c"]);
        assert_eq!(entry.syndication, vec!["x"]);
    }

    #[test]
    fn test_missing_h_defaults_to_entry() {
        let entry = parse_form(b"in-reply-to=https%3A%2F%2Fother.example%2Fpost").unwrap();
        assert_eq!(entry.in_reply_to, vec!["https://other.example/post"]);
    }

    #[test]
    fn test_rejects_other_types() {
        let err = parse_form(b"h=event&name=party").unwrap_err();
        assert!(matches!(err, MicropubError::UnsupportedType(t) if t == "event"));
    }

    #[test]
    fn test_rejects_actions() {
        let err = parse_form(b"action=delete&url=https%3A%2F%2Fexample.com%2Fnotes%2Fa").unwrap_err();
        assert!(matches!(err, MicropubError::UnsupportedAction(_)));
    }

    #[test]
    fn test_access_token_and_slug() {
        let entry = parse_form(b"h=entry&content=x&access_token=secret&mp-slug=my-post").unwrap();
        assert_eq!(entry.mp_slug.as_deref(), Some("my-post"));
        assert_eq!(entry.content.as_deref(), Some("x"));
    }
}
