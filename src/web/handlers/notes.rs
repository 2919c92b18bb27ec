// Notes pages.
//
// GET /notes/        every note, newest first
// GET /notes/{slug}  one note, with stored reply context

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Extension;
use tracing::error;

use crate::db::models::NoteContext;
use crate::views;
use crate::web::{AppState, AuthUser};

/// GET /notes/: a storage error renders an empty list rather than failing.
pub async fn list_notes(
    State(state): State<AppState>,
    user: Option<Extension<AuthUser>>,
) -> impl IntoResponse {
    let notes = state.db.find_notes().await.unwrap_or_else(|e| {
        error!(error = %e, "Failed to load notes");
        Vec::new()
    });
    let user = user.as_ref().map(|Extension(u)| u);
    Html(views::notes_list(&state.site, user, &notes).into_string())
}

/// GET /notes/{slug}
pub async fn show_note(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    user: Option<Extension<AuthUser>>,
) -> Response {
    let note = match state.db.find_note_by_slug(&slug).await {
        Ok(Some(note)) => note,
        Ok(None) => {
            error!(slug = %slug, "Note not found");
            return StatusCode::NOT_FOUND.into_response();
        }
        Err(e) => {
            error!(slug = %slug, error = %e, "Failed to load note");
            return StatusCode::NOT_FOUND.into_response();
        }
    };

    // First stored context per response URL; lookup failures just drop the context.
    let mut contexts: Vec<NoteContext> = Vec::new();
    for url in note.response_urls() {
        match state.db.find_contexts_by_url(url).await {
            Ok(found) => contexts.extend(found.into_iter().next()),
            Err(e) => error!(url = %url, error = %e, "Failed to load note context"),
        }
    }

    let user = user.as_ref().map(|Extension(u)| u);
    Html(views::note_single(&state.site, user, &note, &contexts).into_string()).into_response()
}
