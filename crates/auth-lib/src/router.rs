// ============================
// crates/auth-lib/src/router.rs
// ============================
//! HTTP router and handlers. Thin shell over [`AuthService`]: request
//! decoding, cookie plumbing, response texts. No auth logic lives here.
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::models::{LoginRequest, RegisterRequest};
use crate::AppState;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session_token";

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/dashboard", get(dashboard))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Response, AppError> {
    state.auth.register(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({"message": "Registration successful"})),
    )
        .into_response())
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let issued = state.auth.login(req).await?;
    let cookie = session_cookie(
        &issued.token,
        state.settings.session_ttl_secs,
        state.settings.cookie_secure,
    );
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(json!({"message": "Login successful"})),
    )
        .into_response())
}

async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let token = session_token_from(&headers);
    state.auth.logout(token.as_deref()).await?;
    Ok((
        [(header::SET_COOKIE, clear_session_cookie(state.settings.cookie_secure))],
        Json(json!({"message": "Logged out"})),
    )
        .into_response())
}

async fn dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let token = session_token_from(&headers);
    let user_id = state.auth.validate_session(token.as_deref()).await?;
    Ok(Json(json!({"message": "Welcome to dashboard!", "user_id": user_id})).into_response())
}

/// Extract the session token from the request's Cookie header
fn session_token_from(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

/// Build the Set-Cookie value for a fresh session. HttpOnly and
/// SameSite=Strict always; Secure only under the deployment flag.
fn session_cookie(token: &str, max_age_secs: u64, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Strict; Max-Age={max_age_secs}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Build the Set-Cookie value that clears the session cookie
fn clear_session_cookie(secure: bool) -> String {
    let mut cookie =
        format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
