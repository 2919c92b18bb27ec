// Query handler: GET /micropub?q=config|syndicate-to|source

use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{debug, error};

use crate::micropub::query::{self, QueryRequest};
use crate::web::{api_error, AppState};

pub async fn query(State(state): State<AppState>, RawQuery(raw): RawQuery) -> Response {
    let request = match query::parse_query(raw.as_deref()) {
        Ok(request) => request,
        Err(e) => {
            debug!(error = %e, "Bad Micropub query");
            return api_error(StatusCode::BAD_REQUEST, "invalid_request", Some(&e.to_string()));
        }
    };

    match request {
        QueryRequest::Config => Json(query::config_response(&state.site)).into_response(),
        QueryRequest::SyndicateTo => Json(query::syndicate_to_response()).into_response(),
        QueryRequest::Source { url, properties } => match state.db.find_note_by_url(&url).await {
            Ok(Some(note)) => Json(query::source_response(&note, &properties)).into_response(),
            Ok(None) => api_error(StatusCode::NOT_FOUND, "not_found", None),
            Err(e) => {
                error!(error = %e, url = %url, "Failed to look up note for q=source");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        },
    }
}
