//! Worksite map viewer service.
//!
//! HTTP server publishing per-record map views: resolved extents, composed
//! WMS overlays, point labels and the embedded browser viewer.

mod config;
mod handlers;
pub mod metrics;
mod state;

use anyhow::Result;
use axum::{extract::Extension, routing::get, Router};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use std::{env, net::SocketAddr, path::PathBuf, sync::Arc};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::ServiceConfig;
use state::AppState;

#[derive(Parser, Debug)]
#[command(name = "map-api")]
#[command(about = "Worksite map viewer server")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    listen: String,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Path to the YAML configuration file
    #[arg(short, long, env = "MAP_API_CONFIG")]
    config: Option<PathBuf>,

    /// Number of tokio worker threads (default: number of CPU cores)
    #[arg(long)]
    worker_threads: Option<usize>,
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Build tokio runtime with configurable worker threads
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(threads) = args.worker_threads {
        info!("Configuring tokio runtime with {} worker threads", threads);
        runtime_builder.worker_threads(threads);
    } else if let Ok(threads_str) = env::var("TOKIO_WORKER_THREADS") {
        if let Ok(threads) = threads_str.parse::<usize>() {
            info!(
                "Configuring tokio runtime with {} worker threads (from env)",
                threads
            );
            runtime_builder.worker_threads(threads);
        }
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(async_main(args))?;
    Ok(())
}

async fn async_main(args: Args) -> Result<()> {
    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Initialize Prometheus metrics exporter
    let prometheus_handle: PrometheusHandle =
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .install_recorder()
            .expect("Failed to install Prometheus recorder");

    info!("Prometheus metrics exporter initialized");
    info!("Starting worksite map viewer server");

    // Load configuration and initialize application state
    let service_config = ServiceConfig::load(args.config.as_deref())?;
    let state = Arc::new(AppState::new(&service_config)?);

    // Build router
    let app = Router::new()
        // Viewer pages
        .route("/", get(handlers::root_page_handler))
        .route("/:record", get(handlers::viewer_page_handler))
        // Per-record view API
        .route("/api/sites/:record/view", get(handlers::view_handler))
        .route("/api/sites/:record/layers", get(handlers::layers_handler))
        .route("/api/sites/:record/points", get(handlers::points_handler))
        .route("/api/sites/:record/route", get(handlers::route_handler))
        .route(
            "/api/sites/:record/feature-info",
            get(handlers::feature_info_handler),
        )
        // Health check
        .route("/health", get(handlers::health_handler))
        .route("/ready", get(handlers::ready_handler))
        // Metrics
        .route("/metrics", get(handlers::metrics_handler))
        .route("/api/stats", get(handlers::api_stats_handler))
        // Layer extensions
        .layer(Extension(state))
        .layer(Extension(prometheus_handle))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive());

    // Parse listen address
    let addr: SocketAddr = args.listen.parse()?;
    info!(address = %addr, "Listening");

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
