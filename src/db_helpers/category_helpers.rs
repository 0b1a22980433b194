use sqlx::{Sqlite, SqliteConnection, SqlitePool};

use crate::{data_formats::CategoryRequest, errors::RequestError, models::Category};

pub async fn get_category_by_id(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<Sqlite, Category>("SELECT id, name FROM categories WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn find_category_in_db(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<Category>, RequestError> {
    let mut conn = pool.acquire().await?;
    Ok(get_category_by_id(&mut conn, id).await?)
}

pub async fn list_categories_in_db(pool: &SqlitePool) -> Result<Vec<Category>, RequestError> {
    let result = sqlx::query_as::<Sqlite, Category>("SELECT id, name FROM categories ORDER BY id")
        .fetch_all(pool)
        .await?;
    Ok(result)
}

pub async fn create_category_in_db(
    pool: &SqlitePool,
    CategoryRequest { name }: CategoryRequest,
) -> Result<Category, RequestError> {
    let result = sqlx::query_as::<Sqlite, Category>(
        "INSERT INTO categories (name) VALUES ($1) RETURNING id, name",
    )
    .bind(name)
    .fetch_one(pool)
    .await?;
    Ok(result)
}

pub async fn update_category_in_db(
    pool: &SqlitePool,
    id: i64,
    CategoryRequest { name }: CategoryRequest,
) -> Result<Category, RequestError> {
    let result = sqlx::query_as::<Sqlite, Category>(
        "UPDATE categories SET name = $1 WHERE id = $2 RETURNING id, name",
    )
    .bind(name)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    result.ok_or(RequestError::NotFound)
}

/// Articles in the category keep existing with no category.
pub async fn delete_category_in_db(pool: &SqlitePool, id: i64) -> Result<(), RequestError> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound);
    }
    Ok(())
}
