//! Request routing: a `match` over `(method, path segments)`.
//!
//! Paths that exist under another method answer 405; everything else that
//! does not match answers 404. Every `/api/*` route except health and the
//! auth endpoints sits behind the session check.

use std::time::Instant;

use crate::app::AppState;
use crate::error::ApiError;
use crate::handlers::{
    audit, auth, cases, health, interactions, participants, reports, schemas, summary, tasks,
};
use crate::http::{ApiRequest, ApiResponse, Method};
use crate::session;

/// Route one request and render any error. Logs method, path, status, and
/// elapsed time.
pub async fn handle(state: &AppState, req: ApiRequest) -> ApiResponse {
    let started = Instant::now();
    let response = match dispatch(state, &req).await {
        Ok(resp) => resp,
        Err(e) => e.into_response(),
    };
    tracing::info!(
        method = ?req.method,
        path = %req.path,
        status = response.status,
        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "request"
    );
    response
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn is_public(segs: &[&str]) -> bool {
    matches!(
        segs,
        ["api", "health"] | ["api", "auth", "login" | "logout" | "session"]
    )
}

fn parse_index(raw: &str) -> Result<usize, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::NotFound(format!("section index '{raw}' is not a number")))
}

async fn dispatch(state: &AppState, req: &ApiRequest) -> Result<ApiResponse, ApiError> {
    let segs = segments(&req.path);
    if segs.first() != Some(&"api") {
        return Err(ApiError::NotFound(format!("no route for {}", req.path)));
    }
    if !is_public(&segs) {
        session::require_session(state, req).await?;
    }

    use Method::{Delete, Get, Patch, Post, Put};
    match (req.method, segs.as_slice()) {
        (Get, ["api", "health"]) => health::get(state).await,

        (Post, ["api", "auth", "login"]) => auth::login(state, req).await,
        (Post, ["api", "auth", "logout"]) => auth::logout(state, req).await,
        (Get, ["api", "auth", "session"]) => auth::status(state, req).await,

        (Get, ["api", "cases"]) => cases::list(state, req).await,
        (Post, ["api", "cases"]) => cases::create(state, req).await,
        (Get, ["api", "cases", id]) => cases::get(state, id).await,
        (Patch, ["api", "cases", id]) => cases::update(state, req, id).await,
        (Delete, ["api", "cases", id]) => cases::delete(state, id).await,
        (Post, ["api", "cases", id, "status"]) => cases::transition(state, req, id).await,
        (Get, ["api", "cases", id, "overview"]) => cases::overview(state, id).await,
        (Post, ["api", "cases", id, "capacity-summary"]) => {
            cases::capacity_summary(state, id).await
        }
        (Get, ["api", "cases", id, "participants"]) => participants::list(state, id).await,
        (Post, ["api", "cases", id, "participants"]) => {
            participants::create(state, req, id).await
        }

        (Get, ["api", "participants", id]) => participants::get(state, id).await,
        (Patch, ["api", "participants", id]) => participants::update(state, req, id).await,
        (Delete, ["api", "participants", id]) => participants::delete(state, id).await,

        (Get, ["api", "interactions"]) => interactions::list(state, req).await,
        (Post, ["api", "interactions"]) => interactions::create(state, req).await,
        (Get, ["api", "interactions", id]) => interactions::get(state, id).await,
        (Patch, ["api", "interactions", id]) => interactions::update(state, req, id).await,
        (Delete, ["api", "interactions", id]) => interactions::delete(state, id).await,
        (Post, ["api", "interactions", id, "participants", pid]) => {
            interactions::link(state, id, pid).await
        }
        (Delete, ["api", "interactions", id, "participants", pid]) => {
            interactions::unlink(state, id, pid).await
        }
        (Post, ["api", "interactions", id, "summarize"]) => {
            interactions::summarize(state, id).await
        }
        (Post, ["api", "interactions", id, "transcribe"]) => {
            interactions::transcribe(state, req, id).await
        }
        (Get, ["api", "interactions", id, "summary"]) => summary::get(state, id).await,
        (Put, ["api", "interactions", id, "summary"]) => summary::replace(state, req, id).await,
        (Post, ["api", "interactions", id, "summary", "sections"]) => {
            summary::create_section(state, req, id).await
        }
        (Patch, ["api", "interactions", id, "summary", "sections", index]) => {
            summary::edit_section(state, req, id, parse_index(index)?).await
        }
        (Delete, ["api", "interactions", id, "summary", "sections", index]) => {
            summary::delete_section(state, id, parse_index(index)?).await
        }

        (Get, ["api", "tasks"]) => tasks::list(state, req).await,
        (Post, ["api", "tasks"]) => tasks::create(state, req).await,
        (Get, ["api", "tasks", id]) => tasks::get(state, id).await,
        (Patch, ["api", "tasks", id]) => tasks::update(state, req, id).await,
        (Delete, ["api", "tasks", id]) => tasks::delete(state, id).await,
        (Post, ["api", "tasks", id, "status"]) => tasks::transition(state, req, id).await,

        (Get, ["api", "reports"]) => reports::list(state, req).await,
        (Post, ["api", "reports", "generate"]) => reports::generate(state, req).await,
        (Get, ["api", "reports", id]) => reports::get(state, id).await,
        (Patch, ["api", "reports", id]) => reports::update(state, req, id).await,
        (Delete, ["api", "reports", id]) => reports::delete(state, id).await,
        (Post, ["api", "reports", id, "finalize"]) => reports::finalize(state, id).await,

        (Get, ["api", "audit"]) => audit::list(state, req).await,

        (Get, ["api", "schemas"]) => schemas::list(state),
        (Get, ["api", "schemas", name]) => schemas::get(state, name),

        (_, segs) if is_known_path(segs) => Err(ApiError::MethodNotAllowed),
        _ => Err(ApiError::NotFound(format!("no route for {}", req.path))),
    }
}

/// Whether some method is routed for this path shape.
fn is_known_path(segs: &[&str]) -> bool {
    matches!(
        segs,
        ["api", "health"]
            | ["api", "auth", "login" | "logout" | "session"]
            | ["api", "cases" | "interactions" | "tasks" | "reports" | "audit" | "schemas"]
            | ["api", "cases" | "participants" | "interactions" | "tasks" | "reports" | "schemas", _]
            | ["api", "cases", _, "status" | "overview" | "capacity-summary" | "participants"]
            | ["api", "interactions", _, "summarize" | "transcribe" | "summary"]
            | ["api", "interactions", _, "participants", _]
            | ["api", "interactions", _, "summary", "sections"]
            | ["api", "interactions", _, "summary", "sections", _]
            | ["api", "tasks", _, "status"]
            | ["api", "reports", _, "finalize"]
    )
}
