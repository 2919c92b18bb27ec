// Notes pages: the list, a single note, and the Micropub preview.

use maud::{html, Markup};

use super::{bare_contexts, h_entry, page_shell};
use crate::config::SiteConfig;
use crate::db::models::{Note, NoteContext};
use crate::web::AuthUser;

/// GET /notes/: every note, newest first.
pub fn notes_list(site: &SiteConfig, user: Option<&AuthUser>, notes: &[Note]) -> Markup {
    let body = html! {
        div class="h-feed" {
            h1 class="p-name" { (site.name) }
            @if notes.is_empty() {
                p class="meta" { "Nothing here yet." }
            }
            @for note in notes {
                (h_entry(note, &bare_contexts(note, &[]), true))
            }
        }
    };
    page_shell(site, user, "Notes", body)
}

/// GET /notes/{slug}: one note with whatever reply context we stored.
pub fn note_single(
    site: &SiteConfig,
    user: Option<&AuthUser>,
    note: &Note,
    contexts: &[NoteContext],
) -> Markup {
    let mut all = contexts.to_vec();
    all.extend(bare_contexts(note, contexts));
    page_shell(site, user, &page_title(note), h_entry(note, &all, true))
}

/// POST /micropub/preview: an unsaved note, with its citations inline.
pub fn note_preview(site: &SiteConfig, note: &Note, contexts: &[NoteContext]) -> Markup {
    let mut all = contexts.to_vec();
    all.extend(bare_contexts(note, contexts));
    let body = html! {
        p class="preview-banner" { "Preview: this note has not been published." }
        (h_entry(note, &all, false))
    };
    page_shell(site, None, &format!("Preview: {}", page_title(note)), body)
}

fn page_title(note: &Note) -> String {
    if let Some(name) = &note.name {
        return name.clone();
    }
    let content = note.content.as_deref().unwrap_or(note.primary_type().as_str());
    crate::output::truncate_chars(content, 60)
}
