// Preview handler: POST /micropub/preview
//
// Same parsing as create, but nothing is saved: the entry is rendered as it
// would appear, with any citations shown inline.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use chrono::Utc;
use tracing::{debug, error};

use super::content_type;
use crate::db::models::NoteContext;
use crate::micropub::{self, Reference};
use crate::pipeline::build_note;
use crate::views;
use crate::web::AppState;

pub async fn preview(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let entry = match micropub::normalize(content_type(&headers), &body, state.fetcher.as_ref()).await {
        Ok(entry) => entry,
        Err(e) => {
            error!(error = %e, "Failed to parse Micropub preview request");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let note = build_note(&entry, &state.site, Utc::now());
    let contexts: Vec<NoteContext> = entry
        .references
        .iter()
        .filter_map(|(key, reference)| match reference {
            Reference::Cite(cite) => Some(NoteContext::from_citation(
                key,
                cite.clone(),
                reference.post_types().to_vec(),
            )),
            Reference::Card(_) => None,
        })
        .collect();

    debug!(slug = %note.slug, contexts = contexts.len(), "Rendering preview");
    Html(views::note_preview(&state.site, &note, &contexts).into_string()).into_response()
}
