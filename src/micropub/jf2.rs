// JF2 entry types: the normalized form every Micropub submission is parsed into.
//
// Multi-valued properties stay as lists (no JF2 "compact" collapsing), content
// is always plain text, and embedded microformats objects are pulled out into
// the `references` map keyed by URL.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

/// A post type as determined by post-type discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Rsvp,
    Reply,
    Repost,
    Like,
    Bookmark,
    Video,
    Photo,
    Article,
    Note,
}

impl PostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Rsvp => "rsvp",
            PostType::Reply => "reply",
            PostType::Repost => "repost",
            PostType::Like => "like",
            PostType::Bookmark => "bookmark",
            PostType::Video => "video",
            PostType::Photo => "photo",
            PostType::Article => "article",
            PostType::Note => "note",
        }
    }
}

impl fmt::Display for PostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A normalized h-entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Entry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
    #[serde(default)]
    pub category: Vec<String>,
    #[serde(default)]
    pub in_reply_to: Vec<String>,
    #[serde(default)]
    pub like_of: Vec<String>,
    #[serde(default)]
    pub repost_of: Vec<String>,
    #[serde(default)]
    pub bookmark_of: Vec<String>,
    #[serde(default)]
    pub photo: Vec<String>,
    #[serde(default)]
    pub video: Vec<String>,
    #[serde(default)]
    pub syndication: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsvp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mp_slug: Option<String>,
    #[serde(default)]
    pub post_types: Vec<PostType>,
    #[serde(default)]
    pub references: BTreeMap<String, Reference>,
}

impl Entry {
    /// Apply a single string value for a Micropub property.
    ///
    /// Returns false for properties this endpoint doesn't store, so callers
    /// can log and skip them. Empty values are dropped.
    pub fn set_property(&mut self, key: &str, value: String) -> bool {
        let value = value.trim().to_string();
        if value.is_empty() {
            return known_property(key);
        }
        match key {
            "name" => self.name = Some(value),
            "content" => self.content = Some(value),
            "summary" => self.summary = Some(value),
            // Client-supplied publish times get overwritten on create, but we
            // keep them so the overwrite is observable.
            "published" => {
                self.published = DateTime::parse_from_rfc3339(&value)
                    .ok()
                    .map(|d| d.with_timezone(&Utc))
            }
            "category" => self.category.push(value),
            "in-reply-to" => self.in_reply_to.push(value),
            "like-of" => self.like_of.push(value),
            "repost-of" => self.repost_of.push(value),
            "bookmark-of" => self.bookmark_of.push(value),
            "photo" => self.photo.push(value),
            "video" => self.video.push(value),
            "syndication" => self.syndication.push(value),
            "rsvp" => self.rsvp = Some(value.to_lowercase()),
            "mp-slug" => self.mp_slug = Some(value),
            _ => return false,
        }
        true
    }

    /// URLs this entry responds to (reply, like, repost, bookmark), in that order.
    pub fn response_urls(&self) -> impl Iterator<Item = &String> {
        self.in_reply_to
            .iter()
            .chain(&self.like_of)
            .chain(&self.repost_of)
            .chain(&self.bookmark_of)
    }
}

fn known_property(key: &str) -> bool {
    matches!(
        key,
        "name"
            | "content"
            | "summary"
            | "published"
            | "category"
            | "in-reply-to"
            | "like-of"
            | "repost-of"
            | "bookmark-of"
            | "photo"
            | "video"
            | "syndication"
            | "rsvp"
            | "mp-slug"
    )
}

/// An embedded object discovered while normalizing a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Reference {
    /// A cited post (h-cite): the thing being replied to, liked, reposted...
    Cite(Citation),
    /// A person (h-card), e.g. a person tag.
    Card(Card),
}

impl Reference {
    pub fn post_types(&self) -> &[PostType] {
        match self {
            Reference::Cite(cite) => &cite.post_types,
            Reference::Card(card) => &card.post_types,
        }
    }

    pub fn set_post_types(&mut self, post_types: Vec<PostType>) {
        match self {
            Reference::Cite(cite) => cite.post_types = post_types,
            Reference::Card(card) => card.post_types = post_types,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Citation {
    #[serde(default)]
    pub url: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    #[serde(default)]
    pub post_types: Vec<PostType>,
}

/// Author of a citation, flattened to the two fields we display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Card {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default)]
    pub url: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default)]
    pub post_types: Vec<PostType>,
}

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
static BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>|</p\s*>|</div\s*>|</li\s*>").unwrap());

/// Reduce an HTML fragment to plain text: block boundaries become newlines,
/// tags are dropped, the common entities are decoded.
pub fn html_to_text(html: &str) -> String {
    let with_breaks = BLOCK_RE.replace_all(html, "\n");
    let stripped = TAG_RE.replace_all(&with_breaks, "");
    decode_entities(stripped.trim())
}

/// Decode the handful of entities that show up in titles and content.
pub fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_property_collects_lists() {
        let mut entry = Entry::default();
        assert!(entry.set_property("category", "rust".to_string()));
        assert!(entry.set_property("category", "indieweb".to_string()));
        assert_eq!(entry.category, vec!["rust", "indieweb"]);
    }

    #[test]
    fn test_set_property_drops_empty_values() {
        let mut entry = Entry::default();
        assert!(entry.set_property("content", "   ".to_string()));
        assert!(entry.content.is_none());
    }

    #[test]
    fn test_set_property_unknown_key() {
        let mut entry = Entry::default();
        assert!(!entry.set_property("location", "geo:1,2".to_string()));
    }

    #[test]
    fn test_published_parsed_as_rfc3339() {
        let mut entry = Entry::default();
        entry.set_property("published", "2020-01-02T03:04:05Z".to_string());
        assert_eq!(
            entry.published.map(|p| p.to_rfc3339()),
            Some("2020-01-02T03:04:05+00:00".to_string())
        );
    }

    #[test]
    fn test_reference_serde_tag() {
        let card = Reference::Card(Card {
            uid: Some("https://alice.example/".to_string()),
            ..Default::default()
        });
        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["type"], "card");

        let cite: Reference =
            serde_json::from_str(r#"{"type":"cite","url":["https://a.example/post"]}"#).unwrap();
        assert!(matches!(cite, Reference::Cite(_)));
    }

    #[test]
    fn test_html_to_text() {
        assert_eq!(
            html_to_text("<p>Hello <b>world</b></p><p>Tom &amp; Jerry</p>"),
            "Hello world\nTom & Jerry"
        );
    }
}
