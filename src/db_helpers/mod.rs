//! Storage access. Functions taking a `&SqlitePool` are whole operations and
//! own their transaction; writes go through a
//! [`WriteTransaction`](write_transaction::WriteTransaction). Functions taking
//! a `&mut SqliteConnection` are steps meant to run inside one.

mod article_helpers;
mod author_helpers;
mod category_helpers;
mod image_helpers;
pub mod join_helpers;
pub mod resolver;
pub mod write_transaction;

pub use article_helpers::*;
pub use author_helpers::*;
pub use category_helpers::*;
pub use image_helpers::*;

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use sqlx::{SqliteConnection, SqlitePool};

    pub async fn test_pool() -> SqlitePool {
        crate::init_db("sqlite::memory:")
            .await
            .expect("in-memory database")
    }

    pub async fn seed_category(conn: &mut SqliteConnection, name: &str) -> i64 {
        sqlx::query_scalar("INSERT INTO categories (name) VALUES ($1) RETURNING id")
            .bind(name)
            .fetch_one(&mut *conn)
            .await
            .unwrap()
    }

    pub async fn seed_author(conn: &mut SqliteConnection, firstname: &str, lastname: &str) -> i64 {
        sqlx::query_scalar("INSERT INTO authors (firstname, lastname) VALUES ($1, $2) RETURNING id")
            .bind(firstname)
            .bind(lastname)
            .fetch_one(&mut *conn)
            .await
            .unwrap()
    }

    pub async fn seed_article(conn: &mut SqliteConnection, title: &str, content: &str) -> i64 {
        let now = Utc::now().naive_utc();
        sqlx::query_scalar(
            r#"
            INSERT INTO articles (title, content, created_at, updated_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *conn)
        .await
        .unwrap()
    }
}
