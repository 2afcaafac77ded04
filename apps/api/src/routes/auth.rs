use axum::{
    extract::{Query, Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::platform::auth::Session;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "resumeiq_session";

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPageResponse {
    pub signed_in: bool,
    pub next: String,
}

/// Only same-origin paths are followed after sign-in. Browsers read `/\host`
/// like `//host`, and drop tabs and newlines before resolving.
pub fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(path) if is_local_path(path) => path.to_string(),
        _ => "/".to_string(),
    }
}

fn is_local_path(path: &str) -> bool {
    let mut chars = path.chars();
    chars.next() == Some('/')
        && !matches!(chars.next(), Some('/') | Some('\\'))
        && !path.chars().any(char::is_control)
}

/// GET /auth?next=
///
/// Already signed in: straight on to `next`. Otherwise tells the client to
/// show the sign-in form.
pub async fn handle_auth_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<NextQuery>,
) -> Result<Response, AppError> {
    let next = safe_next(query.next.as_deref());
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if state.platform.auth.session(cookie.value()).await?.is_some() {
            return Ok(Redirect::to(&next).into_response());
        }
    }
    Ok(Json(AuthPageResponse {
        signed_in: false,
        next,
    })
    .into_response())
}

/// POST /auth/sign-up?next=
pub async fn handle_sign_up(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<NextQuery>,
    Json(request): Json<CredentialsRequest>,
) -> Result<(CookieJar, Redirect), AppError> {
    if !state.platform.ensure_ready().await {
        return Err(AppError::NotReady);
    }

    let session = state
        .platform
        .auth
        .sign_up(&request.username, &request.password)
        .await?;
    info!(user = %session.user_id, "Signed up");
    Ok(start_session(&state, jar, session, query.next.as_deref()))
}

/// POST /auth/sign-in?next=
pub async fn handle_sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<NextQuery>,
    Json(request): Json<CredentialsRequest>,
) -> Result<(CookieJar, Redirect), AppError> {
    if !state.platform.ensure_ready().await {
        return Err(AppError::NotReady);
    }

    let session = state
        .platform
        .auth
        .sign_in(&request.username, &request.password)
        .await?;
    info!(user = %session.user_id, "Signed in");
    Ok(start_session(&state, jar, session, query.next.as_deref()))
}

fn start_session(
    state: &AppState,
    jar: CookieJar,
    session: Session,
    next: Option<&str>,
) -> (CookieJar, Redirect) {
    let cookie = Cookie::build((SESSION_COOKIE, session.token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.cookie_secure);
    (jar.add(cookie), Redirect::to(&safe_next(next)))
}

/// POST /auth/sign-out
pub async fn handle_sign_out(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.platform.auth.sign_out(cookie.value()).await?;
    }
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((jar, Redirect::to("/auth")))
}

/// Gate for every page that needs a signed-in user. Puts the `Session` in
/// request extensions; anonymous requests are sent to `/auth?next=<path>`.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !state.platform.ensure_ready().await {
        return Err(AppError::NotReady);
    }

    let session = match jar.get(SESSION_COOKIE) {
        Some(cookie) => state.platform.auth.session(cookie.value()).await?,
        None => None,
    };

    let Some(session) = session else {
        let path = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let target = format!("/auth?next={}", urlencoding::encode(path));
        return Ok(Redirect::to(&target).into_response());
    };

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next_keeps_local_paths() {
        assert_eq!(safe_next(Some("/resume/abc")), "/resume/abc");
        assert_eq!(safe_next(Some("/?tab=2")), "/?tab=2");
    }

    #[test]
    fn test_safe_next_rejects_other_origins() {
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(Some("/\\evil.example")), "/");
        assert_eq!(safe_next(Some("/\tevil.example")), "/");
        assert_eq!(safe_next(Some("/resume\n/abc")), "/");
        assert_eq!(safe_next(Some("https://evil.example")), "/");
        assert_eq!(safe_next(Some("")), "/");
        assert_eq!(safe_next(None), "/");
    }
}
