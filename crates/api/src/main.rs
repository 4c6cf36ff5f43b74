use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use sitetrack_api::config::ServerConfig;
use sitetrack_api::router::build_app_router;
use sitetrack_api::state::AppState;

const DEFAULT_LOG_FILTER: &str = "sitetrack_api=debug,tower_http=debug";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });
    tracing::info!(
        host = %config.host,
        port = config.port,
        upload_dir = %config.upload_dir.display(),
        cors_origins = ?config.cors_origins,
        "Configuration loaded",
    );

    let pool = sitetrack_db::create_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");
    sitetrack_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    sitetrack_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready");

    let addr = SocketAddr::new(
        config.host.parse().expect("HOST must be an IP address"),
        config.port,
    );

    let state = AppState::new(pool, Arc::new(config.clone()));
    state
        .attachments
        .ensure_root()
        .await
        .expect("Failed to create upload directory");
    let app = build_app_router(state, &config);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Server stopped");
}

/// `RUST_LOG` filters; `LOG_FORMAT=json` switches to one JSON object per line.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Resolve on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Ctrl-C received, shutting down"),
        () = terminate => tracing::info!("SIGTERM received, shutting down"),
    }
}
