// Auth middleware: IndieAuth bearer token verification.
//
// Token lookup order:
//   Authorization: Bearer <token> header
//   ?access_token= query parameter
//   access_token field of a form-encoded body (the body is buffered and
//   handed back to the handler unchanged)
//
// Verification: GET {token_endpoint} with the token as a bearer credential
// and Accept: application/x-www-form-urlencoded. A 200 whose `scope` holds
// `create` or `post` passes. The endpoint may answer in JSON instead.
//
// Every request is verified again; nothing is cached.

use anyhow::Context;
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use super::{AppState, AuthUser};
use crate::config::SiteConfig;

/// Largest form body buffered while looking for `access_token`.
const MAX_FORM_BODY: usize = 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("no access token in request")]
    MissingToken,

    #[error("token endpoint rejected token (HTTP {0})")]
    Rejected(u16),

    #[error("token lacks create/post scope")]
    MissingScope,

    #[error("client {0} is not authorized for this site")]
    ClientNotAuthorized(String),

    #[error("token endpoint request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed token endpoint response: {0}")]
    MalformedResponse(String),

    #[error("request body could not be read")]
    Body,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let challenge = match self {
            AuthError::MissingToken => "Bearer",
            AuthError::MissingScope => r#"Bearer error="insufficient_scope", scope="create""#,
            _ => r#"Bearer error="invalid_token""#,
        };
        let mut response = StatusCode::UNAUTHORIZED.into_response();
        response
            .headers_mut()
            .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(challenge));
        response
    }
}

/// Checks a bearer token with whoever issued it.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Resolve `token` to the identity it was issued for.
    ///
    /// Scope is not checked here; see [`AuthUser::can_create`].
    async fn verify(&self, token: &str) -> Result<AuthUser, AuthError>;
}

/// Verifies tokens against a remote IndieAuth token endpoint.
pub struct RemoteTokenVerifier {
    client: reqwest::Client,
    token_endpoint: String,
}

impl RemoteTokenVerifier {
    pub fn new(token_endpoint: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(crate::USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            token_endpoint: token_endpoint.to_string(),
        })
    }
}

#[async_trait]
impl TokenVerifier for RemoteTokenVerifier {
    async fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        let response = self
            .client
            .get(&self.token_endpoint)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/x-www-form-urlencoded")
            .send()
            .await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        parse_token_response(status, content_type.as_deref(), &body)
    }
}

/// Interpret a token endpoint response.
pub fn parse_token_response(
    status: u16,
    content_type: Option<&str>,
    body: &str,
) -> Result<AuthUser, AuthError> {
    if status != 200 {
        return Err(AuthError::Rejected(status));
    }

    let is_json = content_type.is_some_and(|ct| ct.contains("json"));
    let (me, client_id, scope) = if is_json {
        let value: serde_json::Value = serde_json::from_str(body)
            .map_err(|e| AuthError::MalformedResponse(e.to_string()))?;
        let field = |key: &str| value.get(key).and_then(|v| v.as_str()).map(str::to_string);
        (field("me"), field("client_id"), field("scope"))
    } else {
        let mut me = None;
        let mut client_id = None;
        let mut scope = None;
        for (key, value) in form_urlencoded::parse(body.as_bytes()) {
            match key.as_ref() {
                "me" => me = Some(value.into_owned()),
                "client_id" => client_id = Some(value.into_owned()),
                "scope" => scope = Some(value.into_owned()),
                _ => {}
            }
        }
        (me, client_id, scope)
    };

    let Some(scope) = scope else {
        return Err(AuthError::MissingScope);
    };

    Ok(AuthUser {
        me,
        client_id,
        scopes: scope.split_whitespace().map(str::to_string).collect(),
    })
}

/// With client-ID validation on, only the site's own client may post.
pub fn check_client_id(site: &SiteConfig, user: &AuthUser) -> Result<(), AuthError> {
    if !site.validate_client_id {
        return Ok(());
    }
    let expected = format!("{}/", site.url);
    match user.client_id.as_deref() {
        Some(client_id) if client_id == expected => Ok(()),
        other => Err(AuthError::ClientNotAuthorized(
            other.unwrap_or("(none)").to_string(),
        )),
    }
}

/// Axum middleware: reject requests without a token allowed to create posts.
pub async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    match authorize(&state, request).await {
        Ok((user, mut request)) => {
            debug!(me = ?user.me, client_id = ?user.client_id, "Token accepted");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(err) => {
            warn!(error = %err, "Rejected Micropub request");
            err.into_response()
        }
    }
}

/// Axum middleware: attach an `AuthUser` when the request carries a valid
/// bearer header. Never rejects.
pub async fn identify(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    if let Some(token) = bearer_token(&request) {
        match state.verifier.verify(&token).await {
            Ok(user) => {
                request.extensions_mut().insert(user);
            }
            Err(err) => debug!(error = %err, "Ignoring unverifiable token on notes page"),
        }
    }
    next.run(request).await
}

async fn authorize(state: &AppState, request: Request) -> Result<(AuthUser, Request), AuthError> {
    let (token, request) = extract_token(request).await?;
    let token = token.ok_or(AuthError::MissingToken)?;

    let user = state.verifier.verify(&token).await?;
    if !user.can_create() {
        return Err(AuthError::MissingScope);
    }
    check_client_id(&state.site, &user)?;
    Ok((user, request))
}

/// Find the access token, returning the request (body restored if it had to be read).
pub async fn extract_token(request: Request) -> Result<(Option<String>, Request), AuthError> {
    if let Some(token) = bearer_token(&request) {
        return Ok((Some(token), request));
    }

    if let Some(token) = request
        .uri()
        .query()
        .and_then(|q| form_value(q.as_bytes(), "access_token"))
    {
        return Ok((Some(token), request));
    }

    let is_form = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));
    if !is_form {
        return Ok((None, request));
    }

    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, MAX_FORM_BODY)
        .await
        .map_err(|_| AuthError::Body)?;
    let token = form_value(&bytes, "access_token");
    Ok((token, Request::from_parts(parts, Body::from(bytes))))
}

fn bearer_token(request: &Request) -> Option<String> {
    let value = request.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

fn form_value(input: &[u8], name: &str) -> Option<String> {
    form_urlencoded::parse(input)
        .find(|(key, value)| key == name && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}
