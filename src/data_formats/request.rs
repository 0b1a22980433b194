use serde::{Deserialize, Serialize};

use crate::errors::RequestError;

// ----------------- Article Request -----------------
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub images: Vec<ImageRef>,
    /// `None` leaves the join set alone on update, `Some(vec![])` clears it.
    #[serde(default)]
    pub authors: Option<Vec<AuthorLinkRequest>>,
}

/// Either a reference to an existing image or a new image to create inline.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ImageRef {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AuthorLinkRequest {
    pub author_id: i64,
    #[serde(default)]
    pub contribution: Option<String>,
}

// ----------------- Author Request -----------------
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct AuthorRequest {
    pub firstname: String,
    pub lastname: String,
    #[serde(default)]
    pub articles: Option<Vec<ArticleLinkRequest>>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ArticleLinkRequest {
    pub article_id: i64,
    #[serde(default)]
    pub contribution: Option<String>,
}

// ----------------- Category / Image Request -----------------
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CategoryRequest {
    pub name: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ImageRequest {
    pub url: String,
}

impl ArticleRequest {
    /// Catches image entries that carry neither an id nor a url before any
    /// storage work starts.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self
            .images
            .iter()
            .any(|image| image.id.is_none() && image.url.is_none())
        {
            return Err(RequestError::MalformedInput(
                "image entries need an id or a url".to_owned(),
            ));
        }
        Ok(())
    }
}
