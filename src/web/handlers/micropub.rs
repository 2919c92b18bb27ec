// Create handler: POST /micropub
//
// normalize -> publish -> 201 Created with Location, then webmentions go out
// in the background. Any failure before the note is saved is a bare 500.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use tracing::{error, info};

use super::content_type;
use crate::micropub;
use crate::pipeline;
use crate::web::{AppState, AuthUser};
use crate::webmention;

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let entry = match micropub::normalize(content_type(&headers), &body, state.fetcher.as_ref()).await {
        Ok(entry) => entry,
        Err(e) => {
            error!(error = %e, "Failed to parse Micropub request");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let published = match pipeline::publish(state.db.as_ref(), &state.site, entry).await {
        Ok(published) => published,
        Err(e) => {
            error!(error = %e, "Failed to save note");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let note = published.note;
    info!(
        slug = %note.slug,
        post_type = %note.primary_type(),
        me = ?user.me,
        references = published.references_saved,
        reference_failures = published.reference_failures,
        "Published note"
    );

    webmention::dispatch(
        state.webmentions.clone(),
        note.url.clone(),
        note.mention_targets.clone(),
    );

    (StatusCode::CREATED, [(header::LOCATION, note.url)]).into_response()
}
