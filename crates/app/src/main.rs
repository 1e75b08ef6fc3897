use std::time::Duration;

use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

const DEFAULT_PURGE_INTERVAL_MINUTES: u64 = 60;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;
    let mut tasks = tokio::task::JoinSet::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "sample_app={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let Some(server) = settings.server else {
        tracing::warn!("no [server] settings found, nothing to run");
        return Ok(());
    };

    tracing::info!("Found server settings...");
    let db = parse_database(&server.database).await?;

    let engine = build_engine(db.clone(), &server).await?;
    let sweeper = build_engine(db, &server).await?;

    let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let config = server::ServerConfig {
        secure_cookies: server.secure_cookies,
    };
    tasks.spawn(async move {
        if let Err(err) = server::run_with_listener(engine, config, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    let every = Duration::from_secs(
        60 * server
            .purge_interval_minutes
            .unwrap_or(DEFAULT_PURGE_INTERVAL_MINUTES)
            .max(1),
    );
    tasks.spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            match sweeper.purge_expired_sessions().await {
                Ok(0) => {}
                Ok(purged) => tracing::info!(purged, "expired sessions removed"),
                Err(err) => tracing::error!("failed to purge sessions: {err}"),
            }
        }
    });

    while tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }

    Ok(())
}

async fn build_engine(
    db: sea_orm::DatabaseConnection,
    server: &settings::Server,
) -> Result<engine::Engine, engine::EngineError> {
    let mut builder = engine::Engine::builder().database(db);
    if let Some(per_page) = server.per_page {
        builder = builder.per_page(per_page);
    }
    if let Some(hours) = server.session_ttl_hours {
        builder = builder.session_ttl(chrono::Duration::hours(hours));
    }
    builder.build().await
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
