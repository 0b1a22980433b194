use sqlx::{Sqlite, SqliteConnection, SqlitePool};

use crate::{data_formats::ImageRequest, errors::RequestError, models::Image};

pub async fn image_exists(conn: &mut SqliteConnection, id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<Sqlite, bool>("SELECT EXISTS (SELECT 1 FROM images WHERE id = $1)")
        .bind(id)
        .fetch_one(&mut *conn)
        .await
}

pub async fn insert_image(conn: &mut SqliteConnection, url: &str) -> Result<Image, sqlx::Error> {
    sqlx::query_as::<Sqlite, Image>("INSERT INTO images (url) VALUES ($1) RETURNING id, url")
        .bind(url)
        .fetch_one(&mut *conn)
        .await
}

/// Images linked to an article, in the order they were linked.
pub async fn get_images_by_article(
    conn: &mut SqliteConnection,
    article_id: i64,
) -> Result<Vec<Image>, sqlx::Error> {
    sqlx::query_as::<Sqlite, Image>(
        r#"
        SELECT images.id, images.url
        FROM article_images
            JOIN images ON images.id = article_images.image_id
        WHERE article_images.article_id = $1
        ORDER BY article_images.rowid
        "#,
    )
    .bind(article_id)
    .fetch_all(&mut *conn)
    .await
}

/// Replaces the image links of an article. The ids must exist.
pub async fn replace_article_images(
    conn: &mut SqliteConnection,
    article_id: i64,
    image_ids: &[i64],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM article_images WHERE article_id = $1")
        .bind(article_id)
        .execute(&mut *conn)
        .await?;
    for &image_id in image_ids {
        sqlx::query(
            "INSERT OR IGNORE INTO article_images (article_id, image_id) VALUES ($1, $2)",
        )
        .bind(article_id)
        .bind(image_id)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub async fn find_image_in_db(pool: &SqlitePool, id: i64) -> Result<Option<Image>, RequestError> {
    let result = sqlx::query_as::<Sqlite, Image>("SELECT id, url FROM images WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}

pub async fn list_images_in_db(pool: &SqlitePool) -> Result<Vec<Image>, RequestError> {
    let result = sqlx::query_as::<Sqlite, Image>("SELECT id, url FROM images ORDER BY id")
        .fetch_all(pool)
        .await?;
    Ok(result)
}

pub async fn create_image_in_db(
    pool: &SqlitePool,
    ImageRequest { url }: ImageRequest,
) -> Result<Image, RequestError> {
    let mut conn = pool.acquire().await?;
    Ok(insert_image(&mut conn, &url).await?)
}

pub async fn update_image_in_db(
    pool: &SqlitePool,
    id: i64,
    ImageRequest { url }: ImageRequest,
) -> Result<Image, RequestError> {
    let result = sqlx::query_as::<Sqlite, Image>(
        "UPDATE images SET url = $1 WHERE id = $2 RETURNING id, url",
    )
    .bind(url)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    result.ok_or(RequestError::NotFound)
}

pub async fn delete_image_in_db(pool: &SqlitePool, id: i64) -> Result<(), RequestError> {
    let result = sqlx::query("DELETE FROM images WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound);
    }
    Ok(())
}
