//! Named store lifecycle: open, enumerate, delete.

use super::connection::CacheStorage;
use crate::Error;
use tokio_rusqlite::rusqlite::OptionalExtension;
use tokio_rusqlite::{Connection, params};

/// Handle to one named cache store.
///
/// Obtained from [`CacheStorage::open_store`] and passed explicitly to whichever
/// handler reads or writes the store. Once the store is deleted, writes through
/// a stale handle fail and reads return nothing.
#[derive(Clone, Debug)]
pub struct CacheStore {
    pub(crate) name: String,
    pub(crate) conn: Connection,
}

impl CacheStore {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl CacheStorage {
    /// Open the store with the given name, creating it if absent.
    pub async fn open_store(&self, name: &str) -> Result<CacheStore, Error> {
        if name.trim().is_empty() {
            return Err(Error::InvalidInput("store name cannot be empty".into()));
        }

        let owned = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        let created = self
            .conn
            .call(move |conn| -> Result<usize, Error> {
                let n = conn.execute(
                    "INSERT OR IGNORE INTO cache_stores (name, created_at) VALUES (?1, ?2)",
                    params![owned, now],
                )?;
                Ok(n)
            })
            .await
            .map_err(Error::from)?;

        if created > 0 {
            tracing::debug!(store = name, "created cache store");
        }

        Ok(CacheStore { name: name.to_string(), conn: self.conn.clone() })
    }

    /// Get a handle to an existing store without creating it.
    pub async fn store(&self, name: &str) -> Result<CacheStore, Error> {
        if !self.has_store(name).await? {
            return Err(Error::StoreNotFound(name.to_string()));
        }
        Ok(CacheStore { name: name.to_string(), conn: self.conn.clone() })
    }

    /// Whether a store with this name exists.
    pub async fn has_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let found = conn
                    .query_row("SELECT 1 FROM cache_stores WHERE name = ?1", params![name], |_| Ok(()))
                    .optional()?;
                Ok(found.is_some())
            })
            .await
            .map_err(Error::from)
    }

    /// Names of all stores, oldest first.
    pub async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM cache_stores ORDER BY created_at ASC, name ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a store and every entry in it.
    ///
    /// Returns false if no store had that name.
    pub async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        let owned = name.to_string();
        let deleted = self
            .conn
            .call(move |conn| -> Result<usize, Error> {
                let n = conn.execute("DELETE FROM cache_stores WHERE name = ?1", params![owned])?;
                Ok(n)
            })
            .await
            .map_err(Error::from)?;

        if deleted > 0 {
            tracing::debug!(store = name, "deleted cache store");
        }
        Ok(deleted > 0)
    }
}
