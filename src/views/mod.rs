// HTML views for the notes pages and the Micropub preview.
//
// Rendering uses maud, so every dynamic value is escaped. Notes are marked up
// as h-entry so other sites can parse replies and mentions back out of them.
// Client-supplied URLs only become `href`/`src` attributes when they are
// http(s); anything else is shown as text.

pub mod notes;

use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::config::SiteConfig;
use crate::db::models::{Note, NoteContext};
use crate::micropub::PostType;
use crate::web::AuthUser;

pub use notes::{note_preview, note_single, notes_list};

const PAGE_CSS: &str = r#"
body{font-family:-apple-system,BlinkMacSystemFont,"Segoe UI",Roboto,sans-serif;line-height:1.6;color:#111;background:#fafafa;max-width:640px;margin:0 auto;padding:1.5rem 1rem}
a{color:#0645ad}
header.site{display:flex;justify-content:space-between;align-items:baseline;margin-bottom:2rem}
.h-entry{padding:1rem 0;border-bottom:1px solid #e5e5e5}
.e-content{white-space:pre-wrap;word-break:break-word}
.context{font-size:.9rem;color:#555;margin-bottom:.5rem}
.meta{font-size:.85rem;color:#777}
.tags a{margin-right:.5rem}
.preview-banner{background:#fff3cd;padding:.5rem 1rem;border-radius:4px}
"#;

/// Full page wrapper shared by every view.
pub fn page_shell(site: &SiteConfig, user: Option<&AuthUser>, title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " · " (site.name) }
                link rel="micropub" href={ (site.url) "/micropub" };
                link rel="token_endpoint" href=(site.token_endpoint);
                style { (PreEscaped(PAGE_CSS)) }
            }
            body {
                header class="site" {
                    a href={ (site.url) "/notes/" } { (site.name) }
                    @if let Some(me) = user.and_then(|u| u.me.as_deref()) {
                        span class="meta" { "Signed in as " (me) }
                    }
                }
                main { (body) }
            }
        }
    }
}

/// One note as an h-entry. `contexts` are the cited posts shown above it.
pub fn h_entry(note: &Note, contexts: &[NoteContext], link_permalink: bool) -> Markup {
    html! {
        article class="h-entry" {
            @for context in contexts {
                (context_line(note, context))
            }
            @if let Some(name) = note.name.as_deref().filter(|_| note.post_types.contains(&PostType::Article)) {
                h2 class="p-name" { (name) }
            }
            @if let Some(summary) = &note.summary {
                p class="p-summary" { (summary) }
            }
            @if let Some(content) = &note.content {
                div class="e-content" { (content) }
            }
            @for photo in &note.photo {
                @if is_safe_url(photo) {
                    img class="u-photo" src=(photo) alt="";
                } @else {
                    p class="meta" { "Photo: " (photo) }
                }
            }
            @for video in &note.video {
                @if is_safe_url(video) {
                    video class="u-video" src=(video) controls {}
                } @else {
                    p class="meta" { "Video: " (video) }
                }
            }
            @if !note.category.is_empty() {
                p class="tags" {
                    @for tag in &note.category {
                        @if is_safe_url(tag) {
                            a class="u-category h-card" href=(tag) { (tag) }
                        } @else {
                            span class="p-category" { "#" (tag) }
                        }
                    }
                }
            }
            p class="meta" {
                (note.primary_type().as_str()) " · "
                @if link_permalink {
                    a class="u-url" href=(note.url) {
                        time class="dt-published" datetime=(note.published.to_rfc3339()) {
                            (note.published.format("%Y-%m-%d %H:%M UTC"))
                        }
                    }
                } @else {
                    time class="dt-published" datetime=(note.published.to_rfc3339()) {
                        (note.published.format("%Y-%m-%d %H:%M UTC"))
                    }
                }
                @for url in &note.syndication {
                    " · "
                    (link("u-syndication", url, url))
                }
            }
        }
    }
}

fn context_line(note: &Note, context: &NoteContext) -> Markup {
    let (label, class) = if note.in_reply_to.contains(&context.url) {
        ("In reply to", "u-in-reply-to")
    } else if note.like_of.contains(&context.url) {
        ("Liked", "u-like-of")
    } else if note.repost_of.contains(&context.url) {
        ("Reposted", "u-repost-of")
    } else {
        ("Bookmarked", "u-bookmark-of")
    };
    html! {
        div class="context" {
            (label) " "
            (link(class, &context.url, context.title()))
            @if let Some(author) = &context.author_name {
                " by "
                @match &context.author_url {
                    Some(url) => { (link("", url, author)) }
                    None => { (author) }
                }
            }
        }
    }
}

/// An anchor for http(s) URLs, plain text for anything else.
fn link(class: &str, url: &str, text: &str) -> Markup {
    html! {
        @if !is_safe_url(url) {
            span class=(class) { (text) }
        } @else if class.is_empty() {
            a href=(url) { (text) }
        } @else {
            a class=(class) href=(url) { (text) }
        }
    }
}

/// Check if a URL is safe to use in `src` or `href` attributes.
pub fn is_safe_url(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://")
}

/// Contexts for a note's response URLs that have no stored or fetched
/// citation: link the bare URL.
pub fn bare_contexts(note: &Note, known: &[NoteContext]) -> Vec<NoteContext> {
    note.response_urls()
        .filter(|url| !known.iter().any(|c| &c.url == *url))
        .map(|url| NoteContext {
            id: 0,
            url: url.clone(),
            name: None,
            content: None,
            author_name: None,
            author_url: None,
            published: None,
            post_types: Vec::new(),
        })
        .collect()
}
