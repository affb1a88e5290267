//! API server — HTTP REST endpoints plus the Prometheus metrics exporter.

use crate::page_rest;
use crate::quiz_rest;
use crate::rest::{self, AppState};
use axum::routing::{get, post, put};
use axum::Router;
use std::net::SocketAddr;
use storefront_core::config::AppConfig;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Sizing quiz
        .route("/v1/quiz/questions", get(quiz_rest::list_questions))
        .route("/v1/quiz/questions/:id", get(quiz_rest::get_question))
        .route("/v1/quiz/sessions", post(quiz_rest::create_session))
        .route(
            "/v1/quiz/sessions/:id",
            get(quiz_rest::get_session).delete(quiz_rest::delete_session),
        )
        .route("/v1/quiz/sessions/:id/answers", put(quiz_rest::set_answer))
        .route("/v1/quiz/sessions/:id/next", post(quiz_rest::go_to_next))
        // Audience targeting
        .route("/v1/pages/:slug", get(page_rest::get_page))
        .route("/v1/targeting/resolve", post(page_rest::resolve_targeting))
        // Operational endpoints
        .route("/health", get(rest::health_check))
        .route("/ready", get(rest::readiness))
        .route("/live", get(rest::liveness))
        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Main API server.
pub struct ApiServer {
    config: AppConfig,
    state: AppState,
}

impl ApiServer {
    pub fn new(config: AppConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Start the HTTP REST server. Returns after Ctrl-C.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let app = router(self.state.clone());

        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);

        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }

    /// Start the metrics exporter on a separate port.
    pub fn start_metrics(&self) -> anyhow::Result<()> {
        if !self.config.metrics.enabled {
            info!("Metrics exporter disabled");
            return Ok(());
        }

        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
