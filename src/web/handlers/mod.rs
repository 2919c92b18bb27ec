pub mod micropub;
pub mod notes;
pub mod preview;
pub mod query;

use axum::http::{header, HeaderMap};

/// The request's Content-Type, if it is valid UTF-8.
fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok())
}
