//! The article/author join set.
//!
//! Both the article and the author write paths go through the functions in
//! this module, addressed by a [`JoinOwner`]. Callers pass a connection that
//! is already inside their transaction.

#[cfg(test)]
use sqlx::Sqlite;
use sqlx::SqliteConnection;

/// The root a set of join rows is owned by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOwner {
    Article(i64),
    Author(i64),
}

/// One resolved entry of a submitted join set. `counterpart_id` is an author
/// id when the owner is an article and an article id when it is an author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinEntry {
    pub counterpart_id: i64,
    pub contribution: Option<String>,
}

impl JoinOwner {
    pub fn id(&self) -> i64 {
        match self {
            JoinOwner::Article(id) | JoinOwner::Author(id) => *id,
        }
    }

    fn column(&self) -> &'static str {
        match self {
            JoinOwner::Article(_) => "article_id",
            JoinOwner::Author(_) => "author_id",
        }
    }

    /// Returns the `(article_id, author_id)` pair for an entry of this owner.
    pub fn pair(&self, entry: &JoinEntry) -> (i64, i64) {
        match self {
            JoinOwner::Article(article_id) => (*article_id, entry.counterpart_id),
            JoinOwner::Author(author_id) => (entry.counterpart_id, *author_id),
        }
    }
}

/// Inserts one row per entry, in submission order. Duplicate pairs are kept.
pub async fn insert_join_rows(
    conn: &mut SqliteConnection,
    owner: JoinOwner,
    entries: &[JoinEntry],
) -> Result<u64, sqlx::Error> {
    let mut inserted = 0;
    for entry in entries {
        let (article_id, author_id) = owner.pair(entry);
        inserted += sqlx::query(
            "INSERT INTO article_authors (article_id, author_id, contribution) VALUES ($1, $2, $3)",
        )
        .bind(article_id)
        .bind(author_id)
        .bind(entry.contribution.as_deref())
        .execute(&mut *conn)
        .await?
        .rows_affected();
    }
    Ok(inserted)
}

pub async fn delete_join_rows(
    conn: &mut SqliteConnection,
    owner: JoinOwner,
) -> Result<u64, sqlx::Error> {
    let query = format!("DELETE FROM article_authors WHERE {} = $1", owner.column());
    let result = sqlx::query(&query)
        .bind(owner.id())
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

/// Swaps the whole join set of `owner` for `entries` and returns how many
/// rows it now has.
///
/// Every counterpart must already be resolved: this runs the delete first,
/// so it is only safe inside the caller's transaction.
pub async fn replace_join_set(
    conn: &mut SqliteConnection,
    owner: JoinOwner,
    entries: &[JoinEntry],
) -> Result<u64, sqlx::Error> {
    let removed = delete_join_rows(conn, owner).await?;
    let inserted = insert_join_rows(conn, owner, entries).await?;
    tracing::debug!(?owner, removed, inserted, "replaced join set");
    Ok(inserted)
}

/// A raw `article_authors` row.
#[cfg(test)]
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JoinRow {
    pub article_id: i64,
    pub author_id: i64,
    pub contribution: Option<String>,
}

#[cfg(test)]
pub async fn list_join_rows(
    conn: &mut SqliteConnection,
    owner: JoinOwner,
) -> Result<Vec<JoinRow>, sqlx::Error> {
    let query = format!(
        "SELECT article_id, author_id, contribution FROM article_authors WHERE {} = $1 ORDER BY id",
        owner.column()
    );
    sqlx::query_as::<Sqlite, JoinRow>(&query)
        .bind(owner.id())
        .fetch_all(&mut *conn)
        .await
}
