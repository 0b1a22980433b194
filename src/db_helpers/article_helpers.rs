use chrono::{NaiveDateTime, Utc};
use sqlx::{Sqlite, SqliteConnection, SqlitePool};

use crate::data_formats::ArticleRequest;
use crate::errors::RequestError;
use crate::models::{Article, ArticleGraph, LinkedAuthor};

use super::{
    get_category_by_id, get_images_by_article,
    join_helpers::{delete_join_rows, insert_join_rows, replace_join_set, JoinOwner},
    replace_article_images,
    resolver::resolve_article_request,
    write_transaction::WriteTransaction,
};

const ARTICLE_COLUMNS: &str = "id, title, content, created_at, updated_at, category_id";

/// How many articles `/articles/latest` returns.
pub const LATEST_ARTICLES_LIMIT: i64 = 5;

// ----------------- Helper Functions -----------------

pub async fn get_article_by_id(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<Article>, sqlx::Error> {
    let query = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1");
    sqlx::query_as::<Sqlite, Article>(&query)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn article_exists(conn: &mut SqliteConnection, id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<Sqlite, bool>("SELECT EXISTS (SELECT 1 FROM articles WHERE id = $1)")
        .bind(id)
        .fetch_one(&mut *conn)
        .await
}

async fn get_linked_authors(
    conn: &mut SqliteConnection,
    article_id: i64,
) -> Result<Vec<LinkedAuthor>, sqlx::Error> {
    sqlx::query_as::<Sqlite, LinkedAuthor>(
        r#"
        SELECT article_authors.id           AS "id",
               article_authors.author_id    AS "author_id",
               article_authors.contribution AS "contribution",
               authors.firstname            AS "firstname",
               authors.lastname             AS "lastname"
        FROM article_authors
            LEFT JOIN authors ON authors.id = article_authors.author_id
        WHERE article_authors.article_id = $1
        ORDER BY article_authors.id
        "#,
    )
    .bind(article_id)
    .fetch_all(&mut *conn)
    .await
}

async fn load_article_graph(
    conn: &mut SqliteConnection,
    article: Article,
) -> Result<ArticleGraph, sqlx::Error> {
    let category = match article.category_id {
        Some(category_id) => get_category_by_id(conn, category_id).await?,
        None => None,
    };
    let images = get_images_by_article(conn, article.id).await?;
    let authors = get_linked_authors(conn, article.id).await?;
    Ok(ArticleGraph {
        article,
        category,
        images,
        authors,
    })
}

async fn load_article_graphs(
    conn: &mut SqliteConnection,
    articles: Vec<Article>,
) -> Result<Vec<ArticleGraph>, sqlx::Error> {
    let mut result = Vec::with_capacity(articles.len());
    for article in articles {
        result.push(load_article_graph(conn, article).await?);
    }
    Ok(result)
}

pub async fn get_article_graph(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<ArticleGraph>, sqlx::Error> {
    match get_article_by_id(conn, id).await? {
        Some(article) => Ok(Some(load_article_graph(conn, article).await?)),
        None => Ok(None),
    }
}

// ----------------- End Helper Functions -----------------

// ----------------- Article Queries -----------------

pub async fn list_all_articles(pool: &SqlitePool) -> Result<Vec<ArticleGraph>, RequestError> {
    let mut conn = pool.acquire().await?;
    let query = format!("SELECT {ARTICLE_COLUMNS} FROM articles ORDER BY id");
    let articles = sqlx::query_as::<Sqlite, Article>(&query)
        .fetch_all(&mut *conn)
        .await?;
    Ok(load_article_graphs(&mut conn, articles).await?)
}

pub async fn find_article_in_db(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<ArticleGraph>, RequestError> {
    let mut conn = pool.acquire().await?;
    Ok(get_article_graph(&mut conn, id).await?)
}

/// Case-sensitive substring match on the article content.
pub async fn search_articles_by_content(
    pool: &SqlitePool,
    term: &str,
) -> Result<Vec<ArticleGraph>, RequestError> {
    let mut conn = pool.acquire().await?;
    let query =
        format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE instr(content, $1) > 0 ORDER BY id");
    let articles = sqlx::query_as::<Sqlite, Article>(&query)
        .bind(term)
        .fetch_all(&mut *conn)
        .await?;
    Ok(load_article_graphs(&mut conn, articles).await?)
}

pub async fn list_articles_created_after(
    pool: &SqlitePool,
    after: NaiveDateTime,
) -> Result<Vec<ArticleGraph>, RequestError> {
    let mut conn = pool.acquire().await?;
    let query = format!(
        "SELECT {ARTICLE_COLUMNS} FROM articles WHERE created_at > $1 ORDER BY created_at, id"
    );
    let articles = sqlx::query_as::<Sqlite, Article>(&query)
        .bind(after)
        .fetch_all(&mut *conn)
        .await?;
    Ok(load_article_graphs(&mut conn, articles).await?)
}

/// Newest first, ties broken by insertion order.
pub async fn list_latest_articles(
    pool: &SqlitePool,
    limit: i64,
) -> Result<Vec<ArticleGraph>, RequestError> {
    let mut conn = pool.acquire().await?;
    let query = format!(
        "SELECT {ARTICLE_COLUMNS} FROM articles ORDER BY created_at DESC, id DESC LIMIT $1"
    );
    let articles = sqlx::query_as::<Sqlite, Article>(&query)
        .bind(limit)
        .fetch_all(&mut *conn)
        .await?;
    Ok(load_article_graphs(&mut conn, articles).await?)
}

pub async fn create_article_in_db(
    pool: &SqlitePool,
    request: ArticleRequest,
) -> Result<ArticleGraph, RequestError> {
    let mut tx = WriteTransaction::begin(pool).await?;

    let resolved = resolve_article_request(&mut tx, &request).await?;
    let now = Utc::now().naive_utc();

    let query = format!(
        r#"
        INSERT INTO articles (title, content, created_at, updated_at, category_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {ARTICLE_COLUMNS}
        "#
    );
    let article = sqlx::query_as::<Sqlite, Article>(&query)
        .bind(&request.title)
        .bind(&request.content)
        .bind(now)
        .bind(now)
        .bind(resolved.category.as_ref().map(|category| category.id))
        .fetch_one(&mut *tx)
        .await?;

    replace_article_images(&mut tx, article.id, &resolved.image_ids).await?;
    if let Some(entries) = &resolved.authors {
        insert_join_rows(&mut tx, JoinOwner::Article(article.id), entries).await?;
    }
    let result = load_article_graph(&mut tx, article).await?;

    tx.commit().await?;
    Ok(result)
}

/// Replaces title, content and images. The category is only changed when one
/// is given, the author set only when a list is given.
pub async fn update_article_in_db(
    pool: &SqlitePool,
    id: i64,
    request: ArticleRequest,
) -> Result<ArticleGraph, RequestError> {
    let mut tx = WriteTransaction::begin(pool).await?;

    let current = match get_article_by_id(&mut tx, id).await? {
        Some(article) => article,
        None => return Err(RequestError::NotFound),
    };

    let resolved = resolve_article_request(&mut tx, &request).await?;
    let category_id = resolved
        .category
        .as_ref()
        .map(|category| category.id)
        .or(current.category_id);

    let query = format!(
        r#"
        UPDATE articles
        SET title = $1, content = $2, updated_at = $3, category_id = $4
        WHERE id = $5
        RETURNING {ARTICLE_COLUMNS}
        "#
    );
    let article = sqlx::query_as::<Sqlite, Article>(&query)
        .bind(&request.title)
        .bind(&request.content)
        .bind(Utc::now().naive_utc())
        .bind(category_id)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

    replace_article_images(&mut tx, id, &resolved.image_ids).await?;
    if let Some(entries) = &resolved.authors {
        replace_join_set(&mut tx, JoinOwner::Article(id), entries).await?;
    }
    let result = load_article_graph(&mut tx, article).await?;

    tx.commit().await?;
    Ok(result)
}

pub async fn delete_article_in_db(pool: &SqlitePool, id: i64) -> Result<(), RequestError> {
    let mut tx = WriteTransaction::begin(pool).await?;

    let removed = delete_join_rows(&mut tx, JoinOwner::Article(id)).await?;
    replace_article_images(&mut tx, id, &[]).await?;
    let result = sqlx::query("DELETE FROM articles WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound);
    }

    tx.commit().await?;
    tracing::debug!(article_id = id, join_rows = removed, "deleted article");
    Ok(())
}

// ----------------- End Article Queries -----------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_helpers::{
        author_exists,
        join_helpers::list_join_rows,
        list_images_in_db,
        test_support::{seed_author, seed_category, test_pool},
    };

    fn request(body: serde_json::Value) -> ArticleRequest {
        serde_json::from_value(body).unwrap()
    }

    async fn seed_authors(pool: &SqlitePool, count: usize) -> Vec<i64> {
        let mut conn = pool.acquire().await.unwrap();
        let mut ids = Vec::new();
        for index in 0..count {
            ids.push(seed_author(&mut conn, &format!("First{index}"), "Last").await);
        }
        ids
    }

    #[tokio::test]
    async fn create_links_every_author_in_order() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let category = seed_category(&mut conn, "Rust").await;
        drop(conn);
        let authors = seed_authors(&pool, 3).await;

        let graph = create_article_in_db(
            &pool,
            request(serde_json::json!({
                "title": "A",
                "content": "hello world",
                "categoryId": category,
                "authors": [
                    {"authorId": authors[2], "contribution": "lead"},
                    {"authorId": authors[0], "contribution": "editor"},
                    {"authorId": authors[1], "contribution": "review"},
                ],
            })),
        )
        .await
        .unwrap();

        assert_eq!(graph.category.map(|c| c.name).as_deref(), Some("Rust"));
        assert_eq!(graph.article.created_at, graph.article.updated_at);
        let linked: Vec<(i64, Option<String>)> = graph
            .authors
            .iter()
            .map(|link| (link.author_id, link.contribution.clone()))
            .collect();
        assert_eq!(
            linked,
            vec![
                (authors[2], Some("lead".into())),
                (authors[0], Some("editor".into())),
                (authors[1], Some("review".into())),
            ]
        );
    }

    #[tokio::test]
    async fn failed_create_leaves_no_rows_behind() {
        let pool = test_pool().await;
        let authors = seed_authors(&pool, 1).await;

        let result = create_article_in_db(
            &pool,
            request(serde_json::json!({
                "title": "A",
                "content": "b",
                "images": [{"url": "http://img/new.png"}],
                "authors": [{"authorId": authors[0]}, {"authorId": 999}],
            })),
        )
        .await;

        assert!(matches!(
            result,
            Err(RequestError::InvalidReference { kind: "author", id: 999 })
        ));
        assert!(list_all_articles(&pool).await.unwrap().is_empty());
        assert!(list_images_in_db(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_replaces_join_set_and_keeps_created_at() {
        let pool = test_pool().await;
        let authors = seed_authors(&pool, 3).await;
        let created = create_article_in_db(
            &pool,
            request(serde_json::json!({
                "title": "A",
                "content": "b",
                "authors": [{"authorId": authors[0]}, {"authorId": authors[1]}],
            })),
        )
        .await
        .unwrap();
        let id = created.article.id;

        let updated = update_article_in_db(
            &pool,
            id,
            request(serde_json::json!({
                "title": "A2",
                "content": "b2",
                "authors": [{"authorId": authors[2], "contribution": "rewrite"}],
            })),
        )
        .await
        .unwrap();

        assert_eq!(updated.article.title, "A2");
        assert_eq!(updated.article.created_at, created.article.created_at);
        assert!(updated.article.updated_at >= created.article.updated_at);
        assert_eq!(updated.authors.len(), 1);
        assert_eq!(updated.authors[0].author_id, authors[2]);

        let cleared = update_article_in_db(
            &pool,
            id,
            request(serde_json::json!({"title": "A3", "content": "b3", "authors": []})),
        )
        .await
        .unwrap();
        assert!(cleared.authors.is_empty());
        let mut conn = pool.acquire().await.unwrap();
        assert!(list_join_rows(&mut conn, JoinOwner::Article(id))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn failed_update_keeps_previous_state() {
        let pool = test_pool().await;
        let authors = seed_authors(&pool, 1).await;
        let created = create_article_in_db(
            &pool,
            request(serde_json::json!({
                "title": "A",
                "content": "b",
                "authors": [{"authorId": authors[0], "contribution": "writer"}],
            })),
        )
        .await
        .unwrap();

        let result = update_article_in_db(
            &pool,
            created.article.id,
            request(serde_json::json!({
                "title": "Changed",
                "content": "b",
                "categoryId": 77,
                "authors": [],
            })),
        )
        .await;
        assert!(matches!(
            result,
            Err(RequestError::InvalidReference { kind: "category", .. })
        ));

        let graph = find_article_in_db(&pool, created.article.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(graph.article.title, "A");
        assert_eq!(graph.authors.len(), 1);
    }

    #[tokio::test]
    async fn update_without_category_keeps_the_current_one() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let category = seed_category(&mut conn, "Rust").await;
        drop(conn);
        let created = create_article_in_db(
            &pool,
            request(serde_json::json!({"title": "A", "content": "b", "categoryId": category})),
        )
        .await
        .unwrap();

        let updated = update_article_in_db(
            &pool,
            created.article.id,
            request(serde_json::json!({"title": "A", "content": "c"})),
        )
        .await
        .unwrap();
        assert_eq!(updated.article.category_id, Some(category));
    }

    #[tokio::test]
    async fn update_missing_article_is_not_found() {
        let pool = test_pool().await;
        let result = update_article_in_db(
            &pool,
            3,
            request(serde_json::json!({"title": "A", "content": "b"})),
        )
        .await;
        assert!(matches!(result, Err(RequestError::NotFound)));
    }

    #[tokio::test]
    async fn delete_removes_join_rows_but_not_authors() {
        let pool = test_pool().await;
        let authors = seed_authors(&pool, 2).await;
        let created = create_article_in_db(
            &pool,
            request(serde_json::json!({
                "title": "A",
                "content": "b",
                "authors": [{"authorId": authors[0]}, {"authorId": authors[1]}],
            })),
        )
        .await
        .unwrap();

        delete_article_in_db(&pool, created.article.id).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        assert!(
            list_join_rows(&mut conn, JoinOwner::Article(created.article.id))
                .await
                .unwrap()
                .is_empty()
        );
        assert!(author_exists(&mut conn, authors[0])
            .await
            .unwrap());
        drop(conn);
        assert!(matches!(
            delete_article_in_db(&pool, created.article.id).await,
            Err(RequestError::NotFound)
        ));
    }

    #[tokio::test]
    async fn search_and_latest_queries() {
        let pool = test_pool().await;
        let mut ids = Vec::new();
        for index in 0..7 {
            let content = if index % 2 == 0 {
                format!("hello world {index}")
            } else {
                format!("goodbye {index}")
            };
            let graph = create_article_in_db(
                &pool,
                request(serde_json::json!({"title": format!("T{index}"), "content": content})),
            )
            .await
            .unwrap();
            ids.push(graph.article.id);
        }

        let hits = search_articles_by_content(&pool, "hello").await.unwrap();
        assert_eq!(hits.len(), 4);
        assert!(search_articles_by_content(&pool, "Hello")
            .await
            .unwrap()
            .is_empty());

        let latest = list_latest_articles(&pool, LATEST_ARTICLES_LIMIT)
            .await
            .unwrap();
        let latest_ids: Vec<i64> = latest.iter().map(|g| g.article.id).collect();
        let expected: Vec<i64> = ids.iter().rev().take(5).copied().collect();
        assert_eq!(latest_ids, expected);

        let third = find_article_in_db(&pool, ids[2]).await.unwrap().unwrap();
        let after = list_articles_created_after(&pool, third.article.created_at)
            .await
            .unwrap();
        assert!(after
            .iter()
            .all(|g| g.article.created_at > third.article.created_at));
        assert!(after.iter().all(|g| g.article.id != ids[0]));
    }
}
