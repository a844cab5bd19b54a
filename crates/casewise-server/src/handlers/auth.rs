//! Login, logout, and session status.

use casewise_core::requests::LoginRequest;
use casewise_core::responses::SessionInfo;

use crate::app::AppState;
use crate::error::ApiError;
use crate::http::{ApiRequest, ApiResponse};
use crate::session;

/// `POST /api/auth/login`
pub async fn login(state: &AppState, req: &ApiRequest) -> Result<ApiResponse, ApiError> {
    let auth = &state.config.auth;
    let body: LoginRequest = state.parse_body(req, "login_request")?;

    if !auth.enabled {
        return ApiResponse::ok(&SessionInfo {
            authenticated: true,
            expires_at: None,
        });
    }
    if !session::password_matches(&body.password, &auth.password) {
        tracing::warn!("login rejected: wrong password");
        return Err(ApiError::Unauthorized);
    }

    let purged = state.service.purge_expired_sessions().await?;
    if purged > 0 {
        tracing::debug!(purged, "expired sessions removed");
    }

    let token = session::new_token()?;
    let ttl = chrono::Duration::seconds(auth.session_ttl_secs());
    let created = state.service.create_auth_session(&token, ttl).await?;
    tracing::info!(expires_at = %created.expires_at, "session created");

    Ok(ApiResponse::ok(&SessionInfo {
        authenticated: true,
        expires_at: Some(created.expires_at),
    })?
    .with_header(
        "Set-Cookie",
        session::set_cookie(&auth.cookie_name, &token, auth.session_ttl_secs()),
    ))
}

/// `POST /api/auth/logout`. Always succeeds and clears the cookie.
pub async fn logout(state: &AppState, req: &ApiRequest) -> Result<ApiResponse, ApiError> {
    let cookie_name = &state.config.auth.cookie_name;
    if let Some(token) = req.cookie(cookie_name) {
        state.service.delete_auth_session(token).await?;
    }
    Ok(ApiResponse::no_content().with_header("Set-Cookie", session::clear_cookie(cookie_name)))
}

/// `GET /api/auth/session`
pub async fn status(state: &AppState, req: &ApiRequest) -> Result<ApiResponse, ApiError> {
    if !state.config.auth.enabled {
        return ApiResponse::ok(&SessionInfo {
            authenticated: true,
            expires_at: None,
        });
    }
    let current = session::current_session(state, req).await?;
    ApiResponse::ok(&SessionInfo {
        authenticated: current.is_some(),
        expires_at: current.map(|s| s.expires_at),
    })
}
