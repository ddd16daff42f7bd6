//! Cache generations and their entries.
//!
//! A generation is a named bucket of request → response entries. Entries
//! are keyed by [`request_key`] and cascade-delete with their generation.

use super::connection::CacheDb;
use super::hash::request_key;
use crate::Error;
use crate::http::{Request, Response, ResponseType};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Handle to one named cache generation.
///
/// Obtained from [`CacheDb::open_generation`]. The handle does not keep the
/// generation alive; if it is deleted, writes through the handle fail with
/// [`Error::GenerationMissing`] and lookups miss.
#[derive(Clone, Debug)]
pub struct Generation {
    db: CacheDb,
    label: String,
}

impl CacheDb {
    /// Open the generation named `label`, creating it if absent.
    pub async fn open_generation(&self, label: &str) -> Result<Generation, Error> {
        if label.is_empty() {
            return Err(Error::InvalidInput("generation label cannot be empty".into()));
        }

        let name = label.to_string();
        let created_at = chrono::Utc::now().to_rfc3339();
        let created = self
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let inserted = conn.execute(
                    "INSERT INTO generations (label, created_at) VALUES (?1, ?2)
                    ON CONFLICT(label) DO NOTHING",
                    params![name, created_at],
                )?;
                Ok(inserted == 1)
            })
            .await
            .map_err(Error::from)?;

        if created {
            tracing::debug!(generation = label, "created cache generation");
        }

        Ok(Generation { db: self.clone(), label: label.to_string() })
    }

    /// Handle to a generation without creating it.
    ///
    /// Lookups through the handle miss if the generation does not exist.
    pub fn generation(&self, label: &str) -> Generation {
        Generation { db: self.clone(), label: label.to_string() }
    }

    /// Check whether a generation exists.
    pub async fn has_generation(&self, label: &str) -> Result<bool, Error> {
        let label = label.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM generations WHERE label = ?1)",
                    params![label],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// All generation labels, oldest first.
    pub async fn generation_labels(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT label FROM generations ORDER BY created_at ASC, label ASC")?;
                let labels = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(labels)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a generation and every entry it holds.
    ///
    /// Returns false if no generation had that label.
    pub async fn delete_generation(&self, label: &str) -> Result<bool, Error> {
        let label = label.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM generations WHERE label = ?1", params![label])?;
                Ok(deleted == 1)
            })
            .await
            .map_err(Error::from)
    }
}

impl Generation {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Store a response for a request, replacing any previous entry.
    ///
    /// Concurrent writers to the same key are last-write-wins.
    pub async fn put(&self, request: &Request, response: &Response) -> Result<(), Error> {
        let label = self.label.clone();
        let key_hash = request_key(request);
        let method = request.method.clone();
        let url = request.url.to_string();
        let headers_json = serde_json::to_string(&response.headers)?;
        let response = response.clone();
        let stored_at = chrono::Utc::now().to_rfc3339();

        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM generations WHERE label = ?1)",
                    params![label],
                    |row| row.get(0),
                )?;
                if !exists {
                    return Err(Error::GenerationMissing(label));
                }

                conn.execute(
                    "INSERT INTO entries (
                    generation, key_hash, method, url, status, status_text,
                    response_type, headers_json, body, stored_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                ON CONFLICT(generation, key_hash) DO UPDATE SET
                    status = excluded.status,
                    status_text = excluded.status_text,
                    response_type = excluded.response_type,
                    headers_json = excluded.headers_json,
                    body = excluded.body,
                    stored_at = excluded.stored_at",
                    params![
                        label,
                        key_hash,
                        method,
                        url,
                        response.status,
                        response.status_text,
                        response.response_type.as_str(),
                        headers_json,
                        response.body.as_ref(),
                        stored_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up the stored response for a request by exact key.
    pub async fn match_request(&self, request: &Request) -> Result<Option<Response>, Error> {
        let label = self.label.clone();
        let key_hash = request_key(request);
        self.db
            .conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT status, status_text, response_type, headers_json, body
                    FROM entries WHERE generation = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![label, key_hash], |row| {
                    Ok((
                        row.get::<_, u16>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Vec<u8>>(4)?,
                    ))
                });

                match result {
                    Ok((status, status_text, response_type, headers_json, body)) => {
                        let response_type = ResponseType::parse(&response_type)
                            .ok_or_else(|| Error::CorruptEntry(format!("unknown response type {response_type}")))?;
                        Ok(Some(Response {
                            status,
                            status_text,
                            headers: serde_json::from_str(&headers_json)?,
                            body: body.into(),
                            response_type,
                        }))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Requests with a stored entry, in insertion order.
    pub async fn keys(&self) -> Result<Vec<Request>, Error> {
        let label = self.label.clone();
        let rows = self
            .db
            .conn
            .call(move |conn| -> Result<Vec<(String, String)>, Error> {
                let mut stmt =
                    conn.prepare("SELECT method, url FROM entries WHERE generation = ?1 ORDER BY rowid ASC")?;
                let rows = stmt
                    .query_map(params![label], |row| Ok((row.get(0)?, row.get(1)?)))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)?;

        rows.iter().map(|(method, url)| Request::new(method, url)).collect()
    }
}
