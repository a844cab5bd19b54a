//! `tiny_http` accept loop bridged onto the tokio runtime.
//!
//! Accepting blocks, so it runs in `spawn_blocking`. Each accepted request is
//! handed to a tokio task that reads the body (bounded), routes it, and writes
//! the response, with the blocking socket I/O in `spawn_blocking`.

use std::io::Read;
use std::sync::Arc;

use anyhow::Context;

use crate::app::AppState;
use crate::error::ApiError;
use crate::http::{ApiRequest, ApiResponse, Method};
use crate::router;

/// Bind the configured address and serve until Ctrl-C.
///
/// # Errors
///
/// Fails if the address cannot be bound or the accept loop panics.
pub async fn serve(state: Arc<AppState>) -> anyhow::Result<()> {
    let server = bind(&state.config.server.bind_addr())?;

    tokio::select! {
        result = run(Arc::clone(&server), state) => result,
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl-C")?;
            tracing::info!("shutting down");
            server.unblock();
            Ok(())
        }
    }
}

/// Bind a listener. Port 0 picks a free port.
///
/// # Errors
///
/// Fails if the address cannot be bound.
pub fn bind(addr: &str) -> anyhow::Result<Arc<tiny_http::Server>> {
    let server =
        tiny_http::Server::http(addr).map_err(|e| anyhow::anyhow!("failed to bind {addr}: {e}"))?;
    if let Some(bound) = server.server_addr().to_ip() {
        tracing::info!(addr = %bound, "casewise listening");
    }
    Ok(Arc::new(server))
}

/// Accept and serve requests until `server.unblock()` is called.
///
/// # Errors
///
/// Fails if the accept loop panics.
pub async fn run(server: Arc<tiny_http::Server>, state: Arc<AppState>) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Handle::current();
    tokio::task::spawn_blocking(move || accept_loop(&server, &state, &runtime))
        .await
        .context("accept loop panicked")
}

fn accept_loop(
    server: &tiny_http::Server,
    state: &Arc<AppState>,
    runtime: &tokio::runtime::Handle,
) {
    for request in server.incoming_requests() {
        let state = Arc::clone(state);
        runtime.spawn(async move {
            if let Err(e) = handle_connection(state, request).await {
                tracing::error!(error = %format!("{e:#}"), "connection failed");
            }
        });
    }
}

async fn handle_connection(
    state: Arc<AppState>,
    mut request: tiny_http::Request,
) -> anyhow::Result<()> {
    let limit = state.config.server.max_body_bytes;
    let (request, read) = tokio::task::spawn_blocking(move || {
        let read = read_request(&mut request, limit);
        (request, read)
    })
    .await
    .context("body reader panicked")?;

    let response = match read {
        Ok(api_request) => router::handle(&state, api_request).await,
        Err(e) => {
            tracing::warn!(url = %request.url(), error = %e, "request rejected before routing");
            e.into_response()
        }
    };

    tokio::task::spawn_blocking(move || write_response(request, response))
        .await
        .context("response writer panicked")?
        .context("failed to write response")
}

/// Read method, target, headers, and at most `limit` body bytes.
fn read_request(request: &mut tiny_http::Request, limit: u64) -> Result<ApiRequest, ApiError> {
    if request
        .body_length()
        .is_some_and(|len| u64::try_from(len).unwrap_or(u64::MAX) > limit)
    {
        return Err(ApiError::PayloadTooLarge { limit });
    }

    let mut body = Vec::new();
    request
        .as_reader()
        .take(limit.saturating_add(1))
        .read_to_end(&mut body)
        .map_err(|e| ApiError::bad_request(format!("failed to read request body: {e}")))?;
    if u64::try_from(body.len()).unwrap_or(u64::MAX) > limit {
        return Err(ApiError::PayloadTooLarge { limit });
    }

    let mut api_request = ApiRequest::new(Method::parse(request.method().as_str()), request.url());
    api_request.headers = request
        .headers()
        .iter()
        .map(|h| (h.field.to_string(), h.value.to_string()))
        .collect();
    api_request.body = body;
    Ok(api_request)
}

fn write_response(request: tiny_http::Request, response: ApiResponse) -> std::io::Result<()> {
    let mut out = tiny_http::Response::from_data(response.body).with_status_code(response.status);
    for (name, value) in &response.headers {
        match tiny_http::Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            Ok(header) => out.add_header(header),
            Err(()) => tracing::warn!(%name, "dropping invalid response header"),
        }
    }
    request.respond(out)
}
