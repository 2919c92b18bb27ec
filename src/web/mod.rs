// Web server: Axum routes for the Micropub endpoint and the notes pages.
//
// Route groups:
//   protected  POST /micropub, POST /micropub/preview   bearer token required
//   notes      GET /notes/, GET /notes/{slug}            token optional
//   public     GET /micropub (query), GET /health
//
// Auth: IndieAuth bearer tokens verified against the configured token
// endpoint on every request. No sessions, no caching.

use std::sync::Arc;

use anyhow::Result;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::SiteConfig;
use crate::db::Database;
use crate::micropub::ReferenceFetcher;
use crate::webmention::WebmentionSender;

pub mod auth;
pub mod handlers;

pub use auth::{RemoteTokenVerifier, TokenVerifier};

/// Shared application state threaded through all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
    pub site: Arc<SiteConfig>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub webmentions: Arc<dyn WebmentionSender>,
    pub fetcher: Arc<dyn ReferenceFetcher>,
}

/// Start the Axum web server and block until it exits.
pub async fn run_server(state: AppState, port: u16, bind: &str) -> Result<()> {
    let site_url = state.site.url.clone();
    let app = build_router(state);

    let addr = format!("{bind}:{port}");
    info!(site = %site_url, "Marginalia listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    // Micropub writes (require a token with create/post scope)
    let protected = Router::new()
        .route("/micropub", post(handlers::micropub::create))
        .route("/micropub/preview", post(handlers::preview::preview))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    // Notes pages (a valid token only adds "signed in" details)
    let notes = Router::new()
        .route("/notes", get(handlers::notes::list_notes))
        .route("/notes/", get(handlers::notes::list_notes))
        .route("/notes/{slug}", get(handlers::notes::show_note))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::identify,
        ));

    // Public routes (no auth)
    let public = Router::new()
        .route("/health", get(health))
        .route("/micropub", get(handlers::query::query))
        .route("/micropub/", get(handlers::query::query));

    Router::new()
        .merge(protected)
        .merge(notes)
        .merge(public)
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
                .expose_headers([header::LOCATION]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check: always returns 200 OK.
async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({ "status": "ok" })),
    )
}

/// Micropub-style JSON error body: `{"error": ..., "error_description": ...}`.
pub fn api_error(status: StatusCode, error: &str, description: Option<&str>) -> Response {
    let body = match description {
        Some(description) => serde_json::json!({ "error": error, "error_description": description }),
        None => serde_json::json!({ "error": error }),
    };
    (status, axum::Json(body)).into_response()
}

/// The verified identity behind a bearer token.
/// Inserted into request extensions by the `require_auth` and `identify` middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// The user's profile URL, as reported by the token endpoint.
    pub me: Option<String>,
    pub client_id: Option<String>,
    pub scopes: Vec<String>,
}

impl AuthUser {
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }

    /// Whether this token may create posts (`create`, or the legacy `post`).
    pub fn can_create(&self) -> bool {
        self.has_scope("create") || self.has_scope("post")
    }
}
