use sqlx::{Sqlite, SqliteConnection, SqlitePool};

use crate::{
    data_formats::AuthorRequest,
    errors::RequestError,
    models::{Author, AuthorGraph, LinkedArticle},
};

use super::{
    join_helpers::{delete_join_rows, insert_join_rows, replace_join_set, JoinOwner},
    resolver::resolve_articles,
    write_transaction::WriteTransaction,
};

// ----------------- Helper Functions -----------------

pub async fn get_author_by_id(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<Author>, sqlx::Error> {
    sqlx::query_as::<Sqlite, Author>("SELECT id, firstname, lastname FROM authors WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn author_exists(conn: &mut SqliteConnection, id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<Sqlite, bool>("SELECT EXISTS (SELECT 1 FROM authors WHERE id = $1)")
        .bind(id)
        .fetch_one(&mut *conn)
        .await
}

async fn get_linked_articles(
    conn: &mut SqliteConnection,
    author_id: i64,
) -> Result<Vec<LinkedArticle>, sqlx::Error> {
    sqlx::query_as::<Sqlite, LinkedArticle>(
        r#"
        SELECT article_authors.id           AS "id",
               articles.id                  AS "article_id",
               article_authors.contribution AS "contribution"
        FROM article_authors
            LEFT JOIN articles ON articles.id = article_authors.article_id
        WHERE article_authors.author_id = $1
        ORDER BY article_authors.id
        "#,
    )
    .bind(author_id)
    .fetch_all(&mut *conn)
    .await
}

async fn load_author_graph(
    conn: &mut SqliteConnection,
    author: Author,
) -> Result<AuthorGraph, sqlx::Error> {
    let articles = get_linked_articles(conn, author.id).await?;
    Ok(AuthorGraph { author, articles })
}

pub async fn get_author_graph(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<AuthorGraph>, sqlx::Error> {
    match get_author_by_id(conn, id).await? {
        Some(author) => Ok(Some(load_author_graph(conn, author).await?)),
        None => Ok(None),
    }
}

// ----------------- End Helper Functions -----------------

// ----------------- Author Queries -----------------

pub async fn list_all_authors(pool: &SqlitePool) -> Result<Vec<AuthorGraph>, RequestError> {
    let mut conn = pool.acquire().await?;
    let authors =
        sqlx::query_as::<Sqlite, Author>("SELECT id, firstname, lastname FROM authors ORDER BY id")
            .fetch_all(&mut *conn)
            .await?;
    let mut result = Vec::with_capacity(authors.len());
    for author in authors {
        result.push(load_author_graph(&mut conn, author).await?);
    }
    Ok(result)
}

pub async fn find_author_in_db(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<AuthorGraph>, RequestError> {
    let mut conn = pool.acquire().await?;
    Ok(get_author_graph(&mut conn, id).await?)
}

pub async fn create_author_in_db(
    pool: &SqlitePool,
    AuthorRequest {
        firstname,
        lastname,
        articles,
    }: AuthorRequest,
) -> Result<AuthorGraph, RequestError> {
    let mut tx = WriteTransaction::begin(pool).await?;

    let entries = match &articles {
        Some(links) => resolve_articles(&mut tx, links).await?,
        None => Vec::new(),
    };

    let author = sqlx::query_as::<Sqlite, Author>(
        r#"
        INSERT INTO authors (firstname, lastname)
        VALUES ($1, $2)
        RETURNING id, firstname, lastname
        "#,
    )
    .bind(firstname)
    .bind(lastname)
    .fetch_one(&mut *tx)
    .await?;

    insert_join_rows(&mut tx, JoinOwner::Author(author.id), &entries).await?;
    let result = load_author_graph(&mut tx, author).await?;

    tx.commit().await?;
    Ok(result)
}

pub async fn update_author_in_db(
    pool: &SqlitePool,
    id: i64,
    AuthorRequest {
        firstname,
        lastname,
        articles,
    }: AuthorRequest,
) -> Result<AuthorGraph, RequestError> {
    let mut tx = WriteTransaction::begin(pool).await?;

    if get_author_by_id(&mut tx, id).await?.is_none() {
        return Err(RequestError::NotFound);
    }

    // Resolve the whole replacement set before touching the old rows.
    let entries = match &articles {
        Some(links) => Some(resolve_articles(&mut tx, links).await?),
        None => None,
    };

    let author = sqlx::query_as::<Sqlite, Author>(
        r#"
        UPDATE authors SET firstname = $1, lastname = $2
        WHERE id = $3
        RETURNING id, firstname, lastname
        "#,
    )
    .bind(firstname)
    .bind(lastname)
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    if let Some(entries) = entries {
        replace_join_set(&mut tx, JoinOwner::Author(id), &entries).await?;
    }
    let result = load_author_graph(&mut tx, author).await?;

    tx.commit().await?;
    Ok(result)
}

pub async fn delete_author_in_db(pool: &SqlitePool, id: i64) -> Result<(), RequestError> {
    let mut tx = WriteTransaction::begin(pool).await?;

    let removed = delete_join_rows(&mut tx, JoinOwner::Author(id)).await?;
    let result = sqlx::query("DELETE FROM authors WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound);
    }

    tx.commit().await?;
    tracing::debug!(author_id = id, join_rows = removed, "deleted author");
    Ok(())
}

// ----------------- End Author Queries -----------------
