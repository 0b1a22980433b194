pub mod config;
mod data_formats;
mod db_helpers;
mod errors;
mod handlers;
mod models;

use anyhow::Context;
pub use anyhow::Result;
use axum::http::StatusCode;
use axum::{routing::*, Extension, Json, Router};
pub use data_formats::*;
use handlers::*;
use sqlx::{
    migrate::MigrateDatabase,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Sqlite, SqlitePool,
};
use std::{
    net::{SocketAddr, TcpListener},
    str::FromStr,
    sync::Arc,
    time::Duration,
};

pub type JsonResponse<T> = (StatusCode, Json<T>);

/// How long a write waits for another writer's lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn run_app(app: Router, address: SocketAddr, db: SqlitePool) -> Result<()> {
    let listener =
        TcpListener::bind(address).with_context(|| format!("binding to {}", address))?;
    serve(app, listener, db).await
}

/// Serves `app` on an already bound listener.
pub async fn serve(app: Router, listener: TcpListener, db: SqlitePool) -> Result<()> {
    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    listener.set_nonblocking(true)?;
    let app = app.layer(Extension(Arc::new(db)));
    axum::Server::from_tcp(listener)?
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

/// Connects to `db_url`, creating the database file if needed, and runs the
/// embedded migrations.
pub async fn init_db(db_url: &str) -> Result<SqlitePool> {
    let in_memory = db_url.contains(":memory:");
    let pool = if in_memory {
        // Every connection to `:memory:` is its own database, so keep exactly one alive.
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(db_url)
            .await?
    } else {
        if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
            tracing::info!("Creating database {}", db_url);
            Sqlite::create_database(db_url)
                .await
                .with_context(|| format!("creating database {}", db_url))?;
        } else {
            tracing::debug!("Database already exists");
        }
        let options = SqliteConnectOptions::from_str(db_url)
            .with_context(|| format!("parsing database url {}", db_url))?
            .busy_timeout(BUSY_TIMEOUT);
        SqlitePoolOptions::new().connect_with(options).await?
    };
    migrate(&pool).await?;
    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    tracing::debug!("Running migrations");
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run migrations")?;
    tracing::debug!("Migrations completed");
    Ok(())
}

/// Binds a listener on a free local port.
pub fn get_random_free_port() -> Result<(TcpListener, SocketAddr)> {
    let listener = TcpListener::bind("127.0.0.1:0").context("Could not get a free port")?;
    let addr = listener.local_addr()?;
    Ok((listener, addr))
}

pub fn make_router() -> Router {
    Router::new()
        .route("/check_health", get(alive))
        .route("/articles", get(list_articles).post(create_article))
        .route("/articles/search-content", get(search_content))
        .route("/articles/search-after", get(search_after))
        .route("/articles/latest", get(latest_articles))
        .route(
            "/articles/:id",
            get(get_article).put(update_article).delete(delete_article),
        )
        .route("/authors", get(list_authors).post(create_author))
        .route(
            "/authors/:id",
            get(get_author).put(update_author).delete(delete_author),
        )
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
        .route("/images", get(list_images).post(create_image))
        .route(
            "/images/:id",
            get(get_image).put(update_image).delete(delete_image),
        )
        .fallback(not_found)
}
