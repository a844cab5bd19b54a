//! Cookie-based sessions backed by the `auth_sessions` table.

use casewise_core::entities::AuthSession;

use crate::app::AppState;
use crate::error::ApiError;
use crate::http::ApiRequest;

const TOKEN_BYTES: usize = 32;

/// 32 random bytes, hex encoded.
///
/// # Errors
///
/// Returns 500 if the OS random source fails.
pub fn new_token() -> Result<String, ApiError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    getrandom::fill(&mut bytes)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("failed to generate session token: {e}")))?;
    Ok(bytes.iter().map(|b| format!("{b:02x}")).collect())
}

/// Compare without short-circuiting on the first differing byte.
#[must_use]
pub fn password_matches(given: &str, expected: &str) -> bool {
    let (a, b) = (given.as_bytes(), expected.as_bytes());
    let mut diff = a.len() ^ b.len();
    for (i, byte) in a.iter().enumerate() {
        diff |= usize::from(byte ^ b.get(i % b.len().max(1)).copied().unwrap_or(0));
    }
    diff == 0
}

#[must_use]
pub fn set_cookie(name: &str, token: &str, max_age_secs: i64) -> String {
    format!("{name}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={max_age_secs}")
}

#[must_use]
pub fn clear_cookie(name: &str) -> String {
    format!("{name}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0")
}

/// The live session named by the request's cookie, if any.
///
/// # Errors
///
/// Returns 500 if the session lookup fails.
pub async fn current_session(
    state: &AppState,
    req: &ApiRequest,
) -> Result<Option<AuthSession>, ApiError> {
    let Some(token) = req.cookie(&state.config.auth.cookie_name) else {
        return Ok(None);
    };
    Ok(state.service.get_valid_session(token).await?)
}

/// Reject the request with 401 unless auth is disabled or a live session
/// cookie is present.
///
/// # Errors
///
/// Returns [`ApiError::Unauthorized`] when no valid session exists.
pub async fn require_session(state: &AppState, req: &ApiRequest) -> Result<(), ApiError> {
    if !state.config.auth.enabled {
        return Ok(());
    }
    match current_session(state, req).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::Unauthorized),
    }
}
