//! Entry operations on a single cache store.
//!
//! Entries are keyed by `(store, request key)`; writing the same key twice
//! replaces the entry, so there is only ever one logical entry per request.

use super::stores::CacheStore;
use crate::Error;
use crate::http::{Request, Response, ResponseType};
use bytes::Bytes;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;
use url::Url;

const UPSERT_ENTRY: &str = "INSERT INTO cache_entries (
        store, key, method, url, status, status_text, response_type, headers_json, body, stored_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
    ON CONFLICT(store, key) DO UPDATE SET
        method = excluded.method,
        url = excluded.url,
        status = excluded.status,
        status_text = excluded.status_text,
        response_type = excluded.response_type,
        headers_json = excluded.headers_json,
        body = excluded.body,
        stored_at = excluded.stored_at";

/// A response as persisted in a store.
#[derive(Debug, Clone)]
pub struct StoredEntry {
    pub key: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub response_type: String,
    pub headers_json: String,
    pub body: Vec<u8>,
    pub stored_at: String,
}

impl StoredEntry {
    fn from_pair(request: &Request, response: &Response) -> Result<Self, Error> {
        let headers_json =
            serde_json::to_string(&response.headers).map_err(|e| Error::CorruptEntry(format!("headers: {e}")))?;
        Ok(Self {
            key: request.cache_key(),
            method: request.method.clone(),
            url: request.url.to_string(),
            status: response.status,
            status_text: response.status_text.clone(),
            response_type: response.response_type.as_str().to_string(),
            headers_json,
            body: response.body.to_vec(),
            stored_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Rebuild the response this entry was stored from.
    pub fn into_response(self) -> Result<Response, Error> {
        let url = Url::parse(&self.url).map_err(|e| Error::CorruptEntry(format!("url {}: {e}", self.url)))?;
        let headers: Vec<(String, String)> =
            serde_json::from_str(&self.headers_json).map_err(|e| Error::CorruptEntry(format!("headers: {e}")))?;
        let response_type: ResponseType = self.response_type.parse().map_err(Error::CorruptEntry)?;

        Ok(Response {
            url,
            status: self.status,
            status_text: self.status_text,
            headers,
            body: Bytes::from(self.body),
            response_type,
        })
    }

    fn execute(&self, conn: &rusqlite::Connection, store: &str) -> Result<(), Error> {
        conn.execute(
            UPSERT_ENTRY,
            params![
                store,
                &self.key,
                &self.method,
                &self.url,
                self.status,
                &self.status_text,
                &self.response_type,
                &self.headers_json,
                &self.body,
                &self.stored_at,
            ],
        )?;
        Ok(())
    }
}

impl CacheStore {
    /// Look up the stored response for a request by exact key.
    pub async fn match_request(&self, request: &Request) -> Result<Option<Response>, Error> {
        let entry = self.get_entry(&request.cache_key()).await?;
        entry.map(StoredEntry::into_response).transpose()
    }

    /// Get a raw entry by request key.
    pub async fn get_entry(&self, key: &str) -> Result<Option<StoredEntry>, Error> {
        let store = self.name.clone();
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<StoredEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key, method, url, status, status_text, response_type, headers_json, body, stored_at
                     FROM cache_entries WHERE store = ?1 AND key = ?2",
                )?;

                let result = stmt.query_row(params![store, key], |row| {
                    Ok(StoredEntry {
                        key: row.get(0)?,
                        method: row.get(1)?,
                        url: row.get(2)?,
                        status: row.get(3)?,
                        status_text: row.get(4)?,
                        response_type: row.get(5)?,
                        headers_json: row.get(6)?,
                        body: row.get(7)?,
                        stored_at: row.get(8)?,
                    })
                });

                match result {
                    Ok(entry) => Ok(Some(entry)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Store a response under the request's key, replacing any previous entry.
    pub async fn put(&self, request: &Request, response: &Response) -> Result<(), Error> {
        let store = self.name.clone();
        let entry = StoredEntry::from_pair(request, response)?;
        self.conn
            .call(move |conn| entry.execute(conn, &store))
            .await
            .map_err(Error::from)
    }

    /// Store every pair in one transaction: either all entries land or none do.
    pub async fn put_all(&self, pairs: &[(Request, Response)]) -> Result<(), Error> {
        let store = self.name.clone();
        let entries = pairs
            .iter()
            .map(|(req, res)| StoredEntry::from_pair(req, res))
            .collect::<Result<Vec<_>, _>>()?;

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                for entry in &entries {
                    entry.execute(&tx, &store)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Remove the entry for a request. Returns false if there was none.
    pub async fn delete(&self, request: &Request) -> Result<bool, Error> {
        let store = self.name.clone();
        let key = request.cache_key();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let n = conn.execute("DELETE FROM cache_entries WHERE store = ?1 AND key = ?2", params![store, key])?;
                Ok(n > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries in this store.
    pub async fn len(&self) -> Result<u64, Error> {
        let store = self.name.clone();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM cache_entries WHERE store = ?1", params![store], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.len().await? == 0)
    }

    /// URLs of all stored entries, sorted.
    pub async fn urls(&self) -> Result<Vec<String>, Error> {
        let store = self.name.clone();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT url FROM cache_entries WHERE store = ?1 ORDER BY url ASC")?;
                let urls = stmt
                    .query_map(params![store], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStorage;

    fn get(path: &str) -> Request {
        Request::get(Url::parse("https://app.example").unwrap().join(path).unwrap())
    }

    fn ok_response(path: &str, body: &'static [u8]) -> Response {
        Response {
            url: Url::parse("https://app.example").unwrap().join(path).unwrap(),
            status: 200,
            status_text: "OK".to_string(),
            headers: vec![("content-type".to_string(), "text/html".to_string())],
            body: Bytes::from_static(body),
            response_type: ResponseType::Basic,
        }
    }

    #[tokio::test]
    async fn test_put_and_match() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        let store = storage.open_store("v1").await.unwrap();
        let response = ok_response("/index.html", b"<html></html>");

        store.put(&get("/index.html"), &response).await.unwrap();

        let found = store.match_request(&get("/index.html")).await.unwrap().unwrap();
        assert_eq!(found, response);
    }

    #[tokio::test]
    async fn test_match_missing() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        let store = storage.open_store("v1").await.unwrap();
        assert!(store.match_request(&get("/missing")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_twice_is_one_entry() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        let store = storage.open_store("v1").await.unwrap();

        store.put(&get("/a"), &ok_response("/a", b"one")).await.unwrap();
        store.put(&get("/a"), &ok_response("/a", b"two")).await.unwrap();

        assert_eq!(store.len().await.unwrap(), 1);
        let found = store.match_request(&get("/a")).await.unwrap().unwrap();
        assert_eq!(&found.body[..], b"two");
    }

    #[tokio::test]
    async fn test_stores_are_isolated() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        let v1 = storage.open_store("v1").await.unwrap();
        let v2 = storage.open_store("v2").await.unwrap();

        v1.put(&get("/a"), &ok_response("/a", b"old")).await.unwrap();

        assert!(v2.match_request(&get("/a")).await.unwrap().is_none());
        assert!(v2.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_put_all_commits_every_pair() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        let store = storage.open_store("v1").await.unwrap();
        let pairs = vec![
            (get("/index.html"), ok_response("/index.html", b"index")),
            (get("/manifest.json"), ok_response("/manifest.json", b"{}")),
        ];

        store.put_all(&pairs).await.unwrap();

        assert_eq!(
            store.urls().await.unwrap(),
            vec!["https://app.example/index.html".to_string(), "https://app.example/manifest.json".to_string()]
        );
    }

    #[tokio::test]
    async fn test_put_into_deleted_store_fails() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        let store = storage.open_store("v1").await.unwrap();
        storage.delete_store("v1").await.unwrap();

        let result = store.put(&get("/a"), &ok_response("/a", b"x")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_put_all_into_deleted_store_writes_nothing() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        let store = storage.open_store("v1").await.unwrap();
        storage.delete_store("v1").await.unwrap();

        let pairs = vec![(get("/a"), ok_response("/a", b"a")), (get("/b"), ok_response("/b", b"b"))];
        assert!(store.put_all(&pairs).await.is_err());
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_store_cascades_entries() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        let store = storage.open_store("v1").await.unwrap();
        store.put(&get("/a"), &ok_response("/a", b"x")).await.unwrap();

        storage.delete_store("v1").await.unwrap();

        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_entry() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        let store = storage.open_store("v1").await.unwrap();
        store.put(&get("/a"), &ok_response("/a", b"x")).await.unwrap();

        assert!(store.delete(&get("/a")).await.unwrap());
        assert!(!store.delete(&get("/a")).await.unwrap());
    }
}
