// Data models: Rust structs that map to database rows.
//
// Notes are the primary documents; contexts and people are the references
// split out of a submission and stored independently.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::micropub::{Card, Citation, PostType};

/// A published post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub slug: String,
    pub url: String,
    pub name: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub published: DateTime<Utc>,
    pub category: Vec<String>,
    pub in_reply_to: Vec<String>,
    pub like_of: Vec<String>,
    pub repost_of: Vec<String>,
    pub bookmark_of: Vec<String>,
    pub photo: Vec<String>,
    pub video: Vec<String>,
    pub syndication: Vec<String>,
    pub rsvp: Option<String>,
    pub post_types: Vec<PostType>,
    /// URLs to notify via webmention once the note is saved.
    pub mention_targets: Vec<String>,
}

impl Note {
    /// Most specific post type, for display and logging.
    pub fn primary_type(&self) -> PostType {
        self.post_types.first().copied().unwrap_or(PostType::Note)
    }

    /// URLs this note responds to (reply, like, repost, bookmark).
    pub fn response_urls(&self) -> impl Iterator<Item = &String> {
        self.in_reply_to
            .iter()
            .chain(&self.like_of)
            .chain(&self.repost_of)
            .chain(&self.bookmark_of)
    }
}

/// A cited post, stored so reply/like context can be shown without refetching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteContext {
    /// Row ID; zero until inserted.
    pub id: i64,
    pub url: String,
    pub name: Option<String>,
    pub content: Option<String>,
    pub author_name: Option<String>,
    pub author_url: Option<String>,
    pub published: Option<String>,
    pub post_types: Vec<PostType>,
}

impl NoteContext {
    /// Build a context from a citation found under `key` in the reference map.
    /// The citation's own URL wins; the map key is the fallback.
    pub fn from_citation(key: &str, cite: Citation, post_types: Vec<PostType>) -> Self {
        let author = cite.author.unwrap_or_default();
        Self {
            id: 0,
            url: cite.url.into_iter().next().unwrap_or_else(|| key.to_string()),
            name: cite.name,
            content: cite.content,
            author_name: author.name,
            author_url: author.url,
            published: cite.published,
            post_types,
        }
    }

    /// Title to show for this context: its name, else its URL.
    pub fn title(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.url)
    }
}

/// A person (h-card) mentioned or tagged in a note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    /// Stable identifier: the card's uid, or its first URL.
    pub uid: String,
    pub name: Option<String>,
    pub url: Vec<String>,
    pub photo: Option<String>,
    pub post_types: Vec<PostType>,
}

impl Person {
    /// Build a person from a card. Fails if the card has neither a uid nor a URL.
    pub fn from_card(card: Card, post_types: Vec<PostType>) -> Result<Self> {
        let uid = match card.uid.or_else(|| card.url.first().cloned()) {
            Some(uid) => uid,
            None => anyhow::bail!(
                "card {:?} has no uid or url",
                card.name.as_deref().unwrap_or("(unnamed)")
            ),
        };
        Ok(Self {
            uid,
            name: card.name,
            url: card.url,
            photo: card.photo,
            post_types,
        })
    }
}
