use std::net::SocketAddr;

use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Sqlite, SqlitePool};
use tokio::time::{sleep, Duration};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use studyshelf::state::AppState;
use studyshelf::{build_router, config, db, error};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging (stdout + daily file rotation under ./logs)
    std::fs::create_dir_all("logs").ok();
    let (stdout_nb, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    let file_appender = tracing_appender::rolling::daily("logs", "studyshelf.log");
    let (file_nb, file_guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(stdout_nb))
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file_nb))
        .init();
    // Keep the guards alive so the non-blocking writers flush on shutdown
    let _log_guards = (stdout_guard, file_guard);

    // Load configuration (embedded defaults -> studyshelf.toml -> env/.env)
    let app_cfg = config::load()?;
    error::set_expose_error_details(app_cfg.is_development());

    // Prepare the SQLite database and connect, retrying on failure
    let db_url = app_cfg.database.url.clone();
    config::ensure_sqlite_parent_dir(&db_url)?;
    let pool = connect_with_retry(&db_url).await;
    db::init_db(&pool).await?;

    let state = AppState::new(pool, app_cfg.clone())?;

    // Periodic eviction of expired rate-limit windows
    studyshelf::middleware::rate_limit::spawn_cleanup_task(state.rate_limiter.clone());

    let app = build_router(state)?;

    let addr: SocketAddr = format!("{}:{}", app_cfg.server.host, app_cfg.server.port)
        .parse()
        .map_err(|e| {
            anyhow::anyhow!("invalid listen addr {}:{} - {}", app_cfg.server.host, app_cfg.server.port, e)
        })?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("StudyShelf listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Connects to the datastore, retrying indefinitely with a fixed delay.
/// Startup blocks until a connection succeeds.
async fn connect_with_retry(db_url: &str) -> SqlitePool {
    const RETRY_DELAY: Duration = Duration::from_secs(5);
    loop {
        match try_connect(db_url).await {
            Ok(pool) => {
                info!("Connected to database at {}", db_url);
                return pool;
            }
            Err(e) => {
                error!("Database connection error: {:#}. Retrying in {:?}", e, RETRY_DELAY);
                sleep(RETRY_DELAY).await;
            }
        }
    }
}

async fn try_connect(db_url: &str) -> anyhow::Result<SqlitePool> {
    if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
        info!("Creating SQLite database at {}", db_url);
        Sqlite::create_database(db_url).await?;
    }
    let pool = SqlitePoolOptions::new()
        .max_connections(16)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                let _ = sqlx::query("PRAGMA foreign_keys=ON;").execute(&mut *conn).await;
                let _ = sqlx::query("PRAGMA busy_timeout=10000;").execute(&mut *conn).await;
                Ok(())
            })
        })
        .connect(db_url)
        .await?;
    Ok(pool)
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut term = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("Shutdown signal received. Stopping server...");
}
