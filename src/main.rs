use std::time::Duration;

use axum::{extract::Request, ServiceExt};
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use wanderlust::{migration::Migrator, AppState, ExpiredDeletion, SeaOrmStore, Settings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let settings = Settings::from_env()?;

    let mut opt = ConnectOptions::new(settings.database_url.clone());
    opt.max_connections(10)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    let db = Database::connect(opt).await?;
    Migrator::up(&db, None).await?;
    info!("connected to database");

    // Sweep expired sessions in the background
    let store = SeaOrmStore::new(db.clone());
    let mut sweep = tokio::time::interval(Duration::from_secs(settings.session_cleanup_secs.max(1)));
    tokio::spawn(async move {
        loop {
            sweep.tick().await;
            if let Err(e) = store.delete_expired().await {
                warn!(error = %e, "expired session sweep failed");
            }
        }
    });

    let addr = settings.addr;
    let app = wanderlust::app(AppState::new(db, settings));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("server listening on http://{}", addr);
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app)).await?;

    Ok(())
}
