//! Storefront — sizing quiz and audience-targeted page service.
//!
//! Main entry point that loads configuration and the question catalog,
//! then starts the HTTP server.

use clap::Parser;
use std::sync::Arc;
use std::time::{Duration, Instant};
use storefront_api::{ApiServer, AppState, ContentDirectory};
use storefront_core::config::AppConfig;
use storefront_quiz::{QuestionCatalog, SessionStore};
use storefront_targeting::AudienceResolver;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "storefront")]
#[command(about = "Sizing quiz and audience-targeted page service")]
#[command(version)]
struct Cli {
    /// Site identifier (overrides config)
    #[arg(long, env = "STOREFRONT__SITE_ID")]
    site_id: Option<String>,

    /// Bind address (overrides config)
    #[arg(long, env = "STOREFRONT__API__HOST")]
    host: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "STOREFRONT__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Prometheus exporter port (overrides config)
    #[arg(long, env = "STOREFRONT__METRICS__PORT")]
    metrics_port: Option<u16>,

    /// Question catalog JSON file; the built-in sizing quiz is used when unset
    #[arg(long, env = "STOREFRONT__QUIZ__CATALOG_PATH")]
    catalog: Option<String>,

    /// Directory holding page documents
    #[arg(long, env = "STOREFRONT__CONTENT__PAGES_DIR")]
    pages_dir: Option<String>,

    /// Serve default components only, ignoring audience targeting
    #[arg(long, default_value_t = false)]
    no_targeting: bool,
}

fn load_catalog(config: &AppConfig) -> anyhow::Result<QuestionCatalog> {
    let catalog = match &config.quiz.catalog_path {
        Some(path) => {
            info!(path = %path, "Loading question catalog");
            QuestionCatalog::load_file(path)?
        }
        None => QuestionCatalog::sizing_quiz()?,
    };
    Ok(catalog)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "storefront=info,storefront_api=info,storefront_quiz=info,tower_http=info".into()
            }),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("Storefront starting up");

    // Load configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(site_id) = cli.site_id {
        config.site_id = site_id;
    }
    if let Some(host) = cli.host {
        config.api.host = host;
    }
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(port) = cli.metrics_port {
        config.metrics.port = port;
    }
    if let Some(path) = cli.catalog {
        config.quiz.catalog_path = Some(path);
    }
    if let Some(dir) = cli.pages_dir {
        config.content.pages_dir = dir;
    }
    if cli.no_targeting {
        config.targeting.enabled = false;
    }

    info!(
        site_id = %config.site_id,
        http_port = config.api.http_port,
        pages_dir = %config.content.pages_dir,
        targeting = config.targeting.enabled,
        "Configuration loaded"
    );

    let catalog = Arc::new(load_catalog(&config)?);
    info!(
        questions = catalog.len(),
        flows = catalog.flows().len(),
        "Question catalog ready"
    );

    let sessions = Arc::new(SessionStore::new(
        catalog,
        Duration::from_secs(config.quiz.session_ttl_secs),
        config.quiz.max_sessions,
    ));

    let state = AppState {
        sessions: sessions.clone(),
        content: Arc::new(ContentDirectory::new(&config.content.pages_dir)),
        resolver: AudienceResolver::new(config.targeting.enabled),
        quiz: Arc::new(config.quiz.clone()),
        site_id: config.site_id.clone(),
        start_time: Instant::now(),
    };

    let api_server = ApiServer::new(config.clone(), state);

    // Start metrics exporter
    if let Err(e) = api_server.start_metrics() {
        error!(error = %e, "Failed to start metrics exporter");
    }

    // Spawn session eviction task
    let eviction_every = Duration::from_secs(config.quiz.eviction_interval_secs.max(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(eviction_every);
        loop {
            interval.tick().await;
            sessions.evict_expired();
        }
    });

    info!("Storefront is ready to serve traffic");

    // Start HTTP server (blocks until shutdown)
    api_server.start_http().await?;

    Ok(())
}
