// Note construction: turning a normalized entry into the document we store.
//
// The slug comes from `mp-slug` when the client sent a usable one, otherwise
// from the publish time. Mention targets are every URL the note responds to
// plus every link in its content, minus links back to this site.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex_lite::Regex;

use crate::config::SiteConfig;
use crate::db::models::Note;
use crate::micropub::Entry;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"'()\[\]]+"#).unwrap());

/// Build the note for an entry published at `published`.
///
/// The entry's reference map is ignored: references are stored separately.
pub fn build_note(entry: &Entry, site: &SiteConfig, published: DateTime<Utc>) -> Note {
    let slug = client_slug(entry).unwrap_or_else(|| timestamp_slug(&published));

    Note {
        url: site.note_url(&slug),
        slug,
        name: entry.name.clone(),
        content: entry.content.clone(),
        summary: entry.summary.clone(),
        published,
        category: entry.category.clone(),
        in_reply_to: entry.in_reply_to.clone(),
        like_of: entry.like_of.clone(),
        repost_of: entry.repost_of.clone(),
        bookmark_of: entry.bookmark_of.clone(),
        photo: entry.photo.clone(),
        video: entry.video.clone(),
        syndication: entry.syndication.clone(),
        rsvp: entry.rsvp.clone(),
        post_types: entry.post_types.clone(),
        mention_targets: mention_targets(entry, site),
    }
}

/// The client's `mp-slug`, if it sanitizes to something usable.
pub fn client_slug(entry: &Entry) -> Option<String> {
    entry
        .mp_slug
        .as_deref()
        .map(sanitize_slug)
        .filter(|s| !s.is_empty())
}

/// Lowercase, keep `[a-z0-9]`, and collapse everything else into single dashes.
pub fn sanitize_slug(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    for c in raw.trim().to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// Base-36 encoding of the publish time in milliseconds.
pub fn timestamp_slug(published: &DateTime<Utc>) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut n = published.timestamp_millis().max(0) as u64;
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// URLs to send webmentions to, deduplicated in first-seen order.
pub fn mention_targets(entry: &Entry, site: &SiteConfig) -> Vec<String> {
    let content_links = entry
        .content
        .iter()
        .flat_map(|c| URL_RE.find_iter(c))
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?']).to_string());

    let mut targets: Vec<String> = Vec::new();
    for url in entry.response_urls().cloned().chain(content_links) {
        if site.is_own_url(&url) || targets.contains(&url) {
            continue;
        }
        targets.push(url);
    }
    targets
}
