use chrono::NaiveDateTime;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Author {
    pub id: i64,
    pub firstname: String,
    pub lastname: String,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Image {
    pub id: i64,
    pub url: String,
}

/// A join row seen from its article. The author columns come from a left
/// join and are `None` when the author row is gone.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LinkedAuthor {
    pub id: i64,
    pub author_id: i64,
    pub contribution: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
}

/// A join row seen from its author. `article_id` is `None` when the article
/// row is gone.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LinkedArticle {
    pub id: i64,
    pub article_id: Option<i64>,
    pub contribution: Option<String>,
}

/// An article with every association the transfer objects need.
#[derive(Debug, Clone)]
pub struct ArticleGraph {
    pub article: Article,
    pub category: Option<Category>,
    pub images: Vec<Image>,
    pub authors: Vec<LinkedAuthor>,
}

#[derive(Debug, Clone)]
pub struct AuthorGraph {
    pub author: Author,
    pub articles: Vec<LinkedArticle>,
}
