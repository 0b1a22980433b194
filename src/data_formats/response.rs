use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::{ArticleGraph, AuthorGraph, Category, Image, LinkedAuthor};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArticleResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    pub image_urls: Vec<String>,
    pub authors: Vec<ArticleAuthorResponse>,
}

/// An author as listed on an article.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ArticleAuthorResponse {
    pub id: i64,
    pub firstname: String,
    pub lastname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contribution: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthorResponse {
    pub id: i64,
    pub firstname: String,
    pub lastname: String,
    pub article_ids: Vec<i64>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ImageResponse {
    pub id: i64,
    pub url: String,
}

impl ArticleResponse {
    pub fn new(
        ArticleGraph {
            article,
            category,
            images,
            authors,
        }: ArticleGraph,
    ) -> Self {
        ArticleResponse {
            id: article.id,
            title: article.title,
            content: article.content,
            created_at: article.created_at,
            updated_at: article.updated_at,
            category_name: category.map(|category| category.name),
            image_urls: images.into_iter().map(|image| image.url).collect(),
            authors: authors
                .into_iter()
                .filter_map(ArticleAuthorResponse::from_link)
                .collect(),
        }
    }
}

impl ArticleAuthorResponse {
    fn from_link(
        LinkedAuthor {
            author_id,
            contribution,
            firstname,
            lastname,
            ..
        }: LinkedAuthor,
    ) -> Option<Self> {
        // Both names are NOT NULL, so a missing one means the author row is gone.
        Some(ArticleAuthorResponse {
            id: author_id,
            firstname: firstname?,
            lastname: lastname?,
            contribution,
        })
    }
}

impl AuthorResponse {
    pub fn new(AuthorGraph { author, articles }: AuthorGraph) -> Self {
        AuthorResponse {
            id: author.id,
            firstname: author.firstname,
            lastname: author.lastname,
            article_ids: articles.into_iter().filter_map(|link| link.article_id).collect(),
        }
    }
}

impl From<Category> for CategoryResponse {
    fn from(Category { id, name }: Category) -> Self {
        CategoryResponse { id, name }
    }
}

impl From<Image> for ImageResponse {
    fn from(Image { id, url }: Image) -> Self {
        ImageResponse { id, url }
    }
}
