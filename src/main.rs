// src/main.rs

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use academy::catalog::Catalog;
use academy::config::Config;
use academy::routes;
use academy::sandbox::{self, Sandbox};
use academy::state::AppState;
use academy::store::{SharedStore, SqliteStore};
use academy::tutor::{HttpTutorClient, TutorClient};
use dotenvy::dotenv;
use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    // The sandbox re-executes this binary to run one script per process.
    let mut args = std::env::args().skip(1);
    if args.next().as_deref() == Some(sandbox::WORKER_ARG) {
        std::process::exit(sandbox::run_worker(args));
    }

    serve();
}

#[tokio::main]
async fn serve() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let catalog = Catalog::load(&config.catalog_path).expect("Failed to load course catalog");

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&config.database_url)
        .await
        .expect("Failed to open database");

    // Migrations run inside the store constructor
    tracing::info!("Running migrations...");
    let store: SharedStore = Arc::new(
        SqliteStore::new(pool)
            .await
            .expect("Failed to run database migrations"),
    );
    tracing::info!("Migrations applied successfully.");

    let tutor: Option<Arc<dyn TutorClient>> = match &config.tutor_url {
        Some(url) => {
            let client = HttpTutorClient::new(url.clone()).expect("Failed to build tutor client");
            tracing::info!("AI tutor forwarding to {}", url);
            Some(Arc::new(client))
        }
        None => {
            tracing::warn!("TUTOR_URL not set, tutor requests will be rejected");
            None
        }
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    let sandbox = Sandbox::current_exe(config.sandbox.clone())
        .expect("Failed to locate the server executable for sandbox workers");

    // Create AppState
    let state = AppState::new(config, store, catalog, sandbox, tutor);

    // Create the Axum application router
    let app = routes::create_router(state);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listening address");

    // Start the server
    axum::serve(listener, app).await.expect("Server error");
}
