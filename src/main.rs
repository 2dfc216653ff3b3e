use media_monitor::{
    AppState,
    cache::{RedisStatsStore, StatsState},
    config::{AppConfig, Env},
    create_router,
    log_search::{GraylogClient, LogSearchState},
    queue::{PgJobQueue, QueueState},
    repository::{PostgresRepository, RepositoryState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Initializes configuration, logging, the Postgres pool, the Redis cache and
/// the Graylog client, then serves the monitoring router.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast on missing production secrets)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging: RUST_LOG wins, otherwise development defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "media_monitor=debug,tower_http=info,axum=trace".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // JSON lines for the log aggregator.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Monitor starting in {:?} mode", config.env);

    // 3. Database (sounds, tickets, users, jobs)
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    let repo = Arc::new(PostgresRepository::new(pool.clone())) as RepositoryState;
    let queue = Arc::new(PgJobQueue::new(pool)) as QueueState;

    // 4. Statistics cache
    let stats = Arc::new(
        RedisStatsStore::connect(&config.redis_url)
            .await
            .expect("FATAL: Failed to connect to Redis. Check REDIS_URL."),
    ) as StatsState;

    // 5. Log search
    let log_search = Arc::new(GraylogClient::new(
        reqwest::Client::new(),
        &config.graylog_domain,
        &config.graylog_username,
        &config.graylog_password,
        &config.graylog_search_stream_id,
        &config.graylog_api_stream_id,
    )) as LogSearchState;

    // 6. Unified state and server
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState {
        repo,
        stats,
        log_search,
        queue,
        config,
    };

    let app = create_router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind the HTTP listener. Check BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "HTTP server terminated");
    }
}
