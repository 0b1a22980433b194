use myblog::{config::AppConfig, init_db, make_router, run_app};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let (cfg, migrate_only) = AppConfig::from_env_and_args()?;
    tracing::info!("Starting myblog with config: {:?}", cfg);

    // init_db applies the migrations on its way in.
    let db = init_db(&cfg.database_url).await?;
    if migrate_only {
        tracing::info!("Database migration complete.");
        return Ok(());
    }

    let addr = cfg.addr()?;
    if let Err(error) = run_app(make_router(), addr, db).await {
        tracing::error!("Error: {}", error);
        return Err(error);
    }
    Ok(())
}
