use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::Result;
use crate::api;
use crate::orchestrator::Orchestrator;

pub fn app(orchestrator: Arc<Orchestrator>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api::router(orchestrator))
        .layer(cors)
}

pub async fn run(orchestrator: Arc<Orchestrator>, port: u16) -> Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await.inspect_err(|e| {
        tracing::error!(addr = %addr, error = %e, "Failed to bind web server");
    })?;
    tracing::info!("Web server running at http://localhost:{}", port);

    axum::serve(listener, app(orchestrator))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Web server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
