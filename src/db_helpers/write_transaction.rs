//! Write transactions that take SQLite's write lock up front.
//!
//! A deferred `BEGIN` starts out as a reader. If another writer commits before
//! it first writes, SQLite fails the upgrade with `SQLITE_BUSY` and does not
//! consult the busy handler. `BEGIN IMMEDIATE` takes the lock before the first
//! read and waits on the connection's busy timeout, so concurrent writes queue
//! up instead of failing.

use std::ops::{Deref, DerefMut};

use sqlx::{pool::PoolConnection, Sqlite, SqliteConnection, SqlitePool};

const TAKEN: &str = "connection is only taken by commit or drop";

/// An open `BEGIN IMMEDIATE` transaction on a pooled connection.
///
/// Dropping it without [`commit`](WriteTransaction::commit) rolls back.
pub struct WriteTransaction {
    conn: Option<PoolConnection<Sqlite>>,
}

impl WriteTransaction {
    pub async fn begin(pool: &SqlitePool) -> Result<Self, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
        Ok(WriteTransaction { conn: Some(conn) })
    }

    pub async fn commit(mut self) -> Result<(), sqlx::Error> {
        sqlx::query("COMMIT").execute(&mut *self).await?;
        // Committed: hand the connection back to the pool as is.
        self.conn.take();
        Ok(())
    }
}

impl Deref for WriteTransaction {
    type Target = SqliteConnection;

    fn deref(&self) -> &SqliteConnection {
        self.conn.as_ref().expect(TAKEN)
    }
}

impl DerefMut for WriteTransaction {
    fn deref_mut(&mut self) -> &mut SqliteConnection {
        self.conn.as_mut().expect(TAKEN)
    }
}

impl Drop for WriteTransaction {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(rollback(conn));
            }
            // Closing the connection rolls the transaction back.
            Err(_) => drop(conn.detach()),
        }
    }
}

async fn rollback(mut conn: PoolConnection<Sqlite>) {
    if let Err(e) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
        tracing::error!(error = %e, "rollback failed, closing connection");
        drop(conn.detach());
    }
}
