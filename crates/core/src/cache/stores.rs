//! Store and entry CRUD operations.
//!
//! These are the raw table operations. Version-tag and cacheability rules
//! live one level up in [`CacheRegistry`](super::CacheRegistry).

use super::connection::CacheDb;
use super::hash::compute_entry_key;
use crate::Error;
use crate::http::Response;
use bytes::Bytes;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A response stored under a normalized request key.
#[derive(Debug, Clone)]
pub struct StoredEntry {
    pub store: String,
    pub key_hash: String,
    pub method: String,
    pub url: String,
    pub response: Response,
    pub stored_at: String,
}

impl StoredEntry {
    /// Build an entry for `method url` timestamped now.
    pub fn new(store: &str, method: &str, url: &str, response: Response) -> Self {
        Self {
            store: store.to_string(),
            key_hash: compute_entry_key(method, url),
            method: method.to_string(),
            url: url.to_string(),
            response,
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

fn ensure_store(conn: &rusqlite::Connection, name: &str) -> Result<(), Error> {
    conn.execute(
        "INSERT OR IGNORE INTO cache_stores (name, created_at) VALUES (?1, ?2)",
        params![name, chrono::Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

fn write_entry(conn: &rusqlite::Connection, entry: &StoredEntry) -> Result<(), Error> {
    let headers_json = serde_json::to_string(&entry.response.headers)
        .map_err(|e| Error::CorruptEntry(format!("headers for {}: {e}", entry.url)))?;
    ensure_store(conn, &entry.store)?;
    conn.execute(
        "INSERT INTO cache_entries (
            store, key_hash, method, url, status, status_text, headers_json, body, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(store, key_hash) DO UPDATE SET
            method = excluded.method,
            url = excluded.url,
            status = excluded.status,
            status_text = excluded.status_text,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            &entry.store,
            &entry.key_hash,
            &entry.method,
            &entry.url,
            entry.response.status as i64,
            &entry.response.status_text,
            headers_json,
            entry.response.body.as_ref(),
            &entry.stored_at,
        ],
    )?;
    Ok(())
}

impl CacheDb {
    /// Create a store if it does not exist yet.
    pub async fn create_store(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> { ensure_store(conn, &name) })
            .await
            .map_err(Error::from)
    }

    /// Delete a store and, through the foreign key, all of its entries.
    ///
    /// Returns whether the store existed.
    pub async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM cache_stores WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// List store names in creation order.
    pub async fn list_stores(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM cache_stores ORDER BY created_at ASC, rowid ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace a single entry, creating its store on demand.
    pub async fn upsert_entry(&self, entry: &StoredEntry) -> Result<(), Error> {
        let entry = entry.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> { write_entry(conn, &entry) })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace several entries atomically.
    ///
    /// Either every entry is written or none is.
    pub async fn upsert_entries(&self, entries: Vec<StoredEntry>) -> Result<(), Error> {
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                for entry in &entries {
                    write_entry(&tx, entry)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get an entry by store and key hash.
    ///
    /// Returns None if the store or the key doesn't exist.
    pub async fn get_entry(&self, store: &str, key_hash: &str) -> Result<Option<StoredEntry>, Error> {
        let store = store.to_string();
        let key_hash = key_hash.to_string();
        self.conn
            .call(move |conn| -> Result<Option<StoredEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT store, key_hash, method, url, status, status_text, headers_json, body, stored_at
                     FROM cache_entries WHERE store = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![store, key_hash], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, Vec<u8>>(7)?,
                        row.get::<_, String>(8)?,
                    ))
                });

                let (store, key_hash, method, url, status, status_text, headers_json, body, stored_at) = match result {
                    Ok(row) => row,
                    Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
                    Err(e) => return Err(e.into()),
                };

                let headers = serde_json::from_str(&headers_json)
                    .map_err(|e| Error::CorruptEntry(format!("headers for {url}: {e}")))?;
                let status = u16::try_from(status).map_err(|_| Error::CorruptEntry(format!("status {status}")))?;

                Ok(Some(StoredEntry {
                    store,
                    key_hash,
                    method,
                    url,
                    response: Response { status, status_text, headers, body: Bytes::from(body) },
                    stored_at,
                }))
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries in a store. Unknown stores count as empty.
    pub async fn count_entries(&self, store: &str) -> Result<u64, Error> {
        let store = store.to_string();
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

    /// URLs of every entry in a store, oldest write first.
    pub async fn list_entry_urls(&self, store: &str) -> Result<Vec<String>, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt =
                    conn.prepare("SELECT url FROM cache_entries WHERE store = ?1 ORDER BY stored_at ASC, url ASC")?;
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

    fn make_entry(store: &str, url: &str, body: &str) -> StoredEntry {
        let response = Response::new(200, body.to_string()).with_header("Content-Type", "text/html");
        StoredEntry::new(store, "GET", url, response)
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let entry = make_entry("static-v1", "https://example.com/index.html", "<h1>hi</h1>");

        db.upsert_entry(&entry).await.unwrap();

        let retrieved = db.get_entry("static-v1", &entry.key_hash).await.unwrap().unwrap();
        assert_eq!(retrieved.url, entry.url);
        assert_eq!(retrieved.response, entry.response);
    }

    #[tokio::test]
    async fn test_binary_body_stored_exactly() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let png = Bytes::from_static(&[0x89, b'P', b'N', b'G', 0xff, 0x00, 0xfe]);
        let response = Response::new(200, png.clone()).with_header("Content-Type", "image/png");
        let entry = StoredEntry::new("static-v1", "GET", "https://example.com/logo.png", response);

        db.upsert_entry(&entry).await.unwrap();

        let stored = db.get_entry("static-v1", &entry.key_hash).await.unwrap().unwrap();
        assert_eq!(stored.response.body, png);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let result = db.get_entry("static-v1", "nonexistent").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_upsert_overwrites() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.upsert_entry(&make_entry("dynamic-v1", "https://example.com/api", "old"))
            .await
            .unwrap();
        let newer = make_entry("dynamic-v1", "https://example.com/api", "new");
        db.upsert_entry(&newer).await.unwrap();

        assert_eq!(db.count_entries("dynamic-v1").await.unwrap(), 1);
        let stored = db.get_entry("dynamic-v1", &newer.key_hash).await.unwrap().unwrap();
        assert_eq!(stored.response.body, Bytes::from("new"));
    }

    #[tokio::test]
    async fn test_delete_store_cascades() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.upsert_entry(&make_entry("static-v1", "https://example.com/a.css", "a"))
            .await
            .unwrap();

        assert!(db.delete_store("static-v1").await.unwrap());
        assert!(!db.delete_store("static-v1").await.unwrap());
        assert_eq!(db.count_entries("static-v1").await.unwrap(), 0);
        assert!(db.list_stores().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_same_url_in_two_stores() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.upsert_entries(vec![
            make_entry("static-v1", "https://example.com/", "one"),
            make_entry("static-v2", "https://example.com/", "two"),
        ])
        .await
        .unwrap();

        let stores = db.list_stores().await.unwrap();
        assert_eq!(stores, vec!["static-v1".to_string(), "static-v2".to_string()]);
        assert_eq!(db.list_entry_urls("static-v2").await.unwrap(), vec!["https://example.com/".to_string()]);
    }
}
