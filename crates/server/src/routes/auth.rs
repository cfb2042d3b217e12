//! Account endpoints under `/api/auth`.
//!
//! Handlers only check that the identifier and secret are present, then hand
//! the payload to the [`Authenticator`] and translate its answer.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use service::auth::{
    domain::{AuthenticatedUser, LoginInput, RegisterInput, UserProfile},
    Authenticator,
};

use crate::errors::AuthRejection;
use crate::metrics;

pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Clone)]
pub struct ServerState {
    pub authenticator: Arc<dyn Authenticator>,
    pub cookie_secure: bool,
}

impl ServerState {
    pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
        Self { authenticator, cookie_secure: false }
    }
}

fn require_present(email: &str, password: &str) -> Result<(), AuthRejection> {
    if email.trim().is_empty() {
        return Err(AuthRejection::bad_request("email is required"));
    }
    if password.is_empty() {
        return Err(AuthRejection::bad_request("password is required"));
    }
    Ok(())
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        // "Bearer " with nothing after it falls through to the cookie
        .filter(|t| !t.is_empty())
}

#[utoipa::path(post, path = "/api/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged in", body = crate::openapi::AuthenticatedUserDoc), (status = 400, description = "Rejected; body is the error message", body = String)))]
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> Result<(CookieJar, Json<AuthenticatedUser>), AuthRejection> {
    // Malformed JSON and blank fields never reach the authenticator
    let Json(input) = payload?;
    require_present(&input.email, &input.password)?;

    // Any failure becomes 400 with the authenticator's message
    let res = state.authenticator.authenticate(input).await;
    metrics::record_login(&res);
    let authenticated = res?;

    // Browser clients get the token as an HttpOnly cookie as well
    let jar = match &authenticated.token {
        Some(token) => jar.add(session_cookie(token.clone(), state.cookie_secure)),
        None => jar,
    };
    Ok((jar, Json(authenticated)))
}

#[utoipa::path(post, path = "/api/auth/register", tag = "auth", request_body = crate::openapi::RegisterRequest, responses((status = 200, description = "Registered", body = crate::openapi::AuthenticatedUserDoc), (status = 400, description = "Rejected; body is the error message", body = String)))]
pub async fn register(
    State(state): State<ServerState>,
    payload: Result<Json<RegisterInput>, JsonRejection>,
) -> Result<Json<AuthenticatedUser>, AuthRejection> {
    let Json(input) = payload?;
    require_present(&input.email, &input.password)?;

    // Registration never logs in, so no cookie here
    let res = state.authenticator.create_account(input).await;
    metrics::record_register(&res);
    Ok(Json(res?))
}

#[utoipa::path(post, path = "/api/auth/logout", tag = "auth", responses((status = 204, description = "Session cookie cleared")))]
pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    // Path must match the one the cookie was set with
    let jar = jar.remove(Cookie::build(AUTH_COOKIE).path("/"));
    (jar, StatusCode::NO_CONTENT)
}

/// Bearer header wins over the cookie.
#[utoipa::path(get, path = "/api/auth/me", tag = "auth", responses((status = 200, description = "Current user", body = crate::openapi::UserProfileDoc), (status = 401, description = "Missing or invalid token", body = String)))]
pub async fn me(
    State(state): State<ServerState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<Json<UserProfile>, AuthRejection> {
    let token = bearer_token(&headers)
        .or_else(|| jar.get(AUTH_COOKIE).map(|c| c.value().to_string()))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthRejection::unauthorized("missing token"))?;

    let user = state
        .authenticator
        .resolve_token(&token)
        .await
        .map_err(|e| {
            tracing::warn!(code = e.code(), error = %e, "token rejected");
            AuthRejection::unauthorized(e.to_string())
        })?;
    Ok(Json(user))
}
