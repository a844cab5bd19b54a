use std::sync::Arc;

use anyhow::Context;
use casewise_server::{AppState, server};

use crate::bootstrap;
use crate::cli::ServeArgs;

/// Handle `casewise serve`.
///
/// Builds its own multi-threaded runtime so `server.worker_threads` from the
/// configuration takes effect.
pub fn handle(args: &ServeArgs) -> anyhow::Result<()> {
    let config = bootstrap::load_config(args)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.worker_threads)
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;

    runtime.block_on(async move {
        tracing::info!(
            database = %config.database.path,
            auth = config.auth.enabled,
            ai = config.ai.is_configured(),
            "starting casewise"
        );
        let state = AppState::init(config)
            .await
            .context("failed to initialize application state")?;
        server::serve(Arc::new(state)).await
    })
}
