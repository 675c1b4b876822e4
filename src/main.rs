use readshelf::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    repository::{PostgresRepository, RepositoryState},
    storage::{S3StorageClient, StorageService, StorageState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Pretty output for humans locally, JSON for log aggregation in production.
/// `RUST_LOG` always wins over the built-in default filter.
fn init_tracing(env: &Env) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "readshelf=debug,tower_http=info,axum=trace".into());

    let registry = tracing_subscriber::registry().with(filter);
    match env {
        Env::Local => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .init(),
        Env::Production => registry.with(tracing_subscriber::fmt::layer().json()).init(),
    }
}

#[tokio::main]
async fn main() {
    // .env first, so AppConfig::load sees everything.
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    init_tracing(&config.env);
    tracing::info!(?config.env, "catalog service starting");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    let repo: RepositoryState = Arc::new(PostgresRepository::new(pool));

    let s3_client = S3StorageClient::from_config(&config).await;
    if config.env == Env::Local {
        // Dev convenience: provision the MinIO bucket on first run.
        s3_client.ensure_bucket_exists().await;
    }
    let storage: StorageState = Arc::new(s3_client);

    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState {
        repo,
        storage,
        config,
    });

    let listener = TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("FATAL: could not bind {bind_addr}: {e}"));

    tracing::info!("listening on {bind_addr}");
    tracing::info!("API docs at http://{bind_addr}/swagger-ui");

    axum::serve(listener, app).await.expect("FATAL: server error");
}
