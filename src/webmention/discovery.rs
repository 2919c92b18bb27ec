// Webmention endpoint discovery.
//
// An HTTP `Link` header with rel="webmention" wins; otherwise the first
// <link> or <a> element whose rel contains "webmention". An empty href means
// the target page itself is the endpoint.

use std::sync::LazyLock;

use regex_lite::Regex;

static LINK_VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([^>]*)>([^<]*)").unwrap());
static REL_PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\brel\s*=\s*(?:"([^"]*)"|([^\s;,]+))"#).unwrap());
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(?:link|a)\b[^>]*>").unwrap());
static REL_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\brel\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());
static HREF_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());

/// Find a webmention endpoint in the values of one or more `Link` headers.
pub fn endpoint_from_link_headers<'a>(values: impl IntoIterator<Item = &'a str>) -> Option<String> {
    for value in values {
        for caps in LINK_VALUE_RE.captures_iter(value) {
            let params = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            let rel = REL_PARAM_RE
                .captures(params)
                .and_then(|c| c.get(1).or_else(|| c.get(2)))
                .map(|m| m.as_str());
            if rel.is_some_and(has_webmention_rel) {
                return caps.get(1).map(|m| m.as_str().to_string());
            }
        }
    }
    None
}

/// Find a webmention endpoint in an HTML document.
pub fn endpoint_from_html(html: &str) -> Option<String> {
    for tag in TAG_RE.find_iter(html) {
        let tag = tag.as_str();
        let rel = REL_ATTR_RE
            .captures(tag)
            .and_then(|c| c.get(1).or_else(|| c.get(2)))
            .map(|m| m.as_str());
        if !rel.is_some_and(has_webmention_rel) {
            continue;
        }
        if let Some(href) = HREF_ATTR_RE
            .captures(tag)
            .and_then(|c| c.get(1).or_else(|| c.get(2)))
        {
            return Some(crate::micropub::jf2::decode_entities(href.as_str()));
        }
    }
    None
}

fn has_webmention_rel(rel: &str) -> bool {
    rel.split_whitespace()
        .any(|r| r.eq_ignore_ascii_case("webmention"))
}
