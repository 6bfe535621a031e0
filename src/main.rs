use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recruitment_backend::{
    build_router,
    config::Config,
    store::{MemoryStore, PgStore, RecruitmentStore},
    utils::database::create_pool,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recruitment_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    if let Err(e) = std::fs::create_dir_all(&config.upload_dir) {
        tracing::warn!(
            "Failed to create upload directory {}: {}",
            config.upload_dir.display(),
            e
        );
    }

    let store: Arc<dyn RecruitmentStore> = match &config.database_url {
        Some(database_url) => {
            let db = create_pool(database_url, config.database_max_connections).await?;
            sqlx::migrate!("./migrations").run(&db).await?;
            Arc::new(PgStore::new(db))
        }
        None => {
            tracing::warn!("DATABASE_URL is not set; using the in-memory store, data is lost on exit");
            Arc::new(MemoryStore::with_default_evaluators().await?)
        }
    };

    let bind_addr = config.bind_addr.clone();
    let app = build_router(AppState::new(store, config))?;

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server running on http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
