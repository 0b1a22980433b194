//! Resolves the ids embedded in article and author writes.
//!
//! Every existing reference is checked before anything is written, and all
//! of it runs on the caller's transaction, so a dangling id leaves no trace.

use sqlx::SqliteConnection;

use crate::{
    data_formats::{ArticleLinkRequest, ArticleRequest, AuthorLinkRequest, ImageRef},
    errors::RequestError,
    models::Category,
};

use super::{
    article_exists, author_exists, get_category_by_id, image_exists, insert_image,
    join_helpers::JoinEntry,
};

/// The storage-side view of an [`ArticleRequest`].
#[derive(Debug, Clone)]
pub struct ResolvedArticle {
    pub category: Option<Category>,
    pub image_ids: Vec<i64>,
    pub authors: Option<Vec<JoinEntry>>,
}

pub async fn resolve_category(
    conn: &mut SqliteConnection,
    category_id: Option<i64>,
) -> Result<Option<Category>, RequestError> {
    let Some(id) = category_id else {
        return Ok(None);
    };
    match get_category_by_id(&mut *conn, id).await? {
        Some(category) => Ok(Some(category)),
        None => Err(RequestError::invalid_reference("category", id)),
    }
}

pub async fn check_existing_images(
    conn: &mut SqliteConnection,
    images: &[ImageRef],
) -> Result<(), RequestError> {
    for id in images.iter().filter_map(|image| image.id) {
        if !image_exists(conn, id).await? {
            return Err(RequestError::invalid_reference("image", id));
        }
    }
    Ok(())
}

/// Turns image references into ids, creating rows for url-only entries.
/// Call [`check_existing_images`] first; this one writes.
pub async fn persist_images(
    conn: &mut SqliteConnection,
    images: &[ImageRef],
) -> Result<Vec<i64>, RequestError> {
    let mut ids: Vec<i64> = Vec::with_capacity(images.len());
    for image in images {
        let id = match (image.id, image.url.as_deref()) {
            (Some(id), _) => id,
            (None, Some(url)) => insert_image(conn, url).await?.id,
            (None, None) => {
                return Err(RequestError::MalformedInput(
                    "image entries need an id or a url".to_owned(),
                ))
            }
        };
        // An article holds a set of images.
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

pub async fn resolve_authors(
    conn: &mut SqliteConnection,
    links: &[AuthorLinkRequest],
) -> Result<Vec<JoinEntry>, RequestError> {
    let mut entries = Vec::with_capacity(links.len());
    for link in links {
        if !author_exists(conn, link.author_id).await? {
            return Err(RequestError::invalid_reference("author", link.author_id));
        }
        entries.push(JoinEntry {
            counterpart_id: link.author_id,
            contribution: link.contribution.clone(),
        });
    }
    Ok(entries)
}

pub async fn resolve_articles(
    conn: &mut SqliteConnection,
    links: &[ArticleLinkRequest],
) -> Result<Vec<JoinEntry>, RequestError> {
    let mut entries = Vec::with_capacity(links.len());
    for link in links {
        if !article_exists(conn, link.article_id).await? {
            return Err(RequestError::invalid_reference("article", link.article_id));
        }
        entries.push(JoinEntry {
            counterpart_id: link.article_id,
            contribution: link.contribution.clone(),
        });
    }
    Ok(entries)
}

/// Validates every reference of `request`, then creates its inline images.
pub async fn resolve_article_request(
    conn: &mut SqliteConnection,
    request: &ArticleRequest,
) -> Result<ResolvedArticle, RequestError> {
    request.validate()?;
    let category = resolve_category(conn, request.category_id).await?;
    check_existing_images(conn, &request.images).await?;
    let authors = match &request.authors {
        Some(links) => Some(resolve_authors(conn, links).await?),
        None => None,
    };
    let image_ids = persist_images(conn, &request.images).await?;
    Ok(ResolvedArticle {
        category,
        image_ids,
        authors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_helpers::{
        list_images_in_db,
        test_support::{seed_article, seed_author, seed_category, test_pool},
    };

    fn request(body: &str) -> ArticleRequest {
        serde_json::from_str(body).unwrap()
    }

    #[tokio::test]
    async fn resolves_every_reference() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let category = seed_category(&mut conn, "Rust").await;
        let ada = seed_author(&mut conn, "Ada", "Lovelace").await;
        let existing = insert_image(&mut conn, "http://img/old.png").await.unwrap();

        let body = format!(
            r#"{{"title":"A","content":"b","categoryId":{category},
                "images":[{{"id":{}}},{{"url":"http://img/new.png"}}],
                "authors":[{{"authorId":{ada},"contribution":"writer"}}]}}"#,
            existing.id
        );
        let resolved = resolve_article_request(&mut conn, &request(&body))
            .await
            .unwrap();

        assert_eq!(resolved.category.map(|c| c.name).as_deref(), Some("Rust"));
        assert_eq!(resolved.image_ids.len(), 2);
        assert_eq!(resolved.image_ids[0], existing.id);
        assert_eq!(
            resolved.authors,
            Some(vec![JoinEntry {
                counterpart_id: ada,
                contribution: Some("writer".into()),
            }])
        );
    }

    #[tokio::test]
    async fn missing_category_is_an_invalid_reference() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let result = resolve_article_request(
            &mut conn,
            &request(r#"{"title":"A","content":"b","categoryId":99}"#),
        )
        .await;
        assert!(matches!(
            result,
            Err(RequestError::InvalidReference {
                kind: "category",
                id: 99
            })
        ));
    }

    #[tokio::test]
    async fn dangling_author_fails_before_inline_images_are_written() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let result = resolve_article_request(
            &mut conn,
            &request(
                r#"{"title":"A","content":"b",
                    "images":[{"url":"http://img/new.png"}],
                    "authors":[{"authorId":404}]}"#,
            ),
        )
        .await;
        assert!(matches!(
            result,
            Err(RequestError::InvalidReference { kind: "author", .. })
        ));
        drop(conn);
        assert!(list_images_in_db(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_image_id_is_an_invalid_reference() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let result = check_existing_images(
            &mut conn,
            &[ImageRef {
                id: Some(12),
                url: None,
            }],
        )
        .await;
        assert!(matches!(
            result,
            Err(RequestError::InvalidReference { kind: "image", id: 12 })
        ));
    }

    #[tokio::test]
    async fn repeated_images_collapse_to_one_link() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let image = insert_image(&mut conn, "http://img/a.png").await.unwrap();
        let reference = ImageRef {
            id: Some(image.id),
            url: None,
        };
        let ids = persist_images(&mut conn, &[reference.clone(), reference])
            .await
            .unwrap();
        assert_eq!(ids, vec![image.id]);
    }

    #[tokio::test]
    async fn resolves_articles_from_the_author_side() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let article = seed_article(&mut conn, "A", "b").await;
        let links = vec![
            ArticleLinkRequest {
                article_id: article,
                contribution: Some("editor".into()),
            },
            ArticleLinkRequest {
                article_id: article + 1,
                contribution: None,
            },
        ];
        let result = resolve_articles(&mut conn, &links).await;
        assert!(matches!(
            result,
            Err(RequestError::InvalidReference { kind: "article", id }) if id == article + 1
        ));
        let entries = resolve_articles(&mut conn, &links[..1]).await.unwrap();
        assert_eq!(entries[0].counterpart_id, article);
    }
}
