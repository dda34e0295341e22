use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use launchkit_api::config::ServerConfig;
use launchkit_api::engine::ProjectLocks;
use launchkit_api::router::build_app_router;
use launchkit_api::state::AppState;
use launchkit_textgen::TextGenConfig;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    init_tracing();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = launchkit_db::create_pool(&database_url, config.db_max_connections)
        .await
        .expect("Failed to connect to database");
    tracing::info!(max_connections = config.db_max_connections, "Database connection pool created");

    launchkit_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    launchkit_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Text generation ---
    let textgen_config = TextGenConfig::from_env();
    let generator = launchkit_textgen::build_generator(&textgen_config)
        .expect("Failed to build text-generation client");
    if generator.is_some() {
        tracing::info!(model = %textgen_config.model, base_url = %textgen_config.base_url, "Text-generation client configured");
    }

    // --- App state ---
    let locks = Arc::new(ProjectLocks::new());
    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        generator,
        locks: Arc::clone(&locks),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");
    drain_generation_jobs(&locks, Duration::from_secs(config.shutdown_timeout_secs)).await;

    pool.close().await;
    tracing::info!("Graceful shutdown complete");
}

/// Install the global subscriber. `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "launchkit_api=debug,tower_http=debug".into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Give in-flight generation jobs up to `timeout` to finish so their final
/// log entries land before the pool closes.
async fn drain_generation_jobs(locks: &ProjectLocks, timeout: Duration) {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let active = locks.active_count();
        if active == 0 {
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            tracing::warn!(active, "Shutdown timeout reached with generation jobs still running");
            return;
        }
        tracing::info!(active, "Waiting for generation jobs to finish");
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
}

/// Wait for SIGINT (Ctrl-C) or SIGTERM to start graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
