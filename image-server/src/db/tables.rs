use anyhow::{Context, Result};
use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use time::OffsetDateTime;
use tokio::sync::Mutex;

use crate::api_types::{ImageResponse, PLACEHOLDER_STORAGE_URL, UNKNOWN_SOURCE};

/// Row for `insert_image`. `id`, `status` and defaults are filled in by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewImage {
    pub name: String,
    pub google_drive_id: Option<String>,
    pub size: Option<u64>,
    pub mime_type: Option<String>,
    pub storage_url: String,
    pub source: String,
}

/// A stored image row, nullable columns and all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRow {
    pub id: i64,
    pub name: String,
    pub google_drive_id: Option<String>,
    pub size: Option<i64>,
    pub mime_type: Option<String>,
    pub storage_url: Option<String>,
    pub source: Option<String>,
    pub created_at: Option<OffsetDateTime>,
    pub status: String,
}

impl From<ImageRow> for ImageResponse {
    fn from(value: ImageRow) -> Self {
        Self {
            id: value.id,
            name: value.name,
            size: value
                .size
                .and_then(|size| u64::try_from(size).ok())
                .unwrap_or(0),
            storage_url: value
                .storage_url
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| PLACEHOLDER_STORAGE_URL.to_owned()),
            source: value
                .source
                .filter(|source| !source.is_empty())
                .unwrap_or_else(|| UNKNOWN_SOURCE.to_owned()),
        }
    }
}

/// Handle to the [database connection](rusqlite::Connection)
pub struct DB {
    conn: Mutex<Connection>,
}

impl DB {
    pub fn open<T: AsRef<Path>>(db_path: T) -> Result<Connection> {
        Connection::open(db_path).context("failed to open connection")
    }

    /// Wrap an already-migrated connection.
    pub fn new(conn: Connection) -> Self {
        DB {
            conn: Mutex::new(conn),
        }
    }

    /// Insert one image. Returns `false` when a row with the same drive id already exists.
    pub async fn insert_image(&self, image: &NewImage) -> Result<bool> {
        let size = image
            .size
            .map(i64::try_from)
            .transpose()
            .context("image size out of range")?;

        let conn = self.conn.lock().await;
        let inserted = conn
            .execute(
                r"insert or ignore into images
                    (name, google_drive_id, size, mime_type, storage_url, source, created_at, status)
                  values (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'imported')",
                params![
                    image.name,
                    image.google_drive_id,
                    size,
                    image.mime_type,
                    image.storage_url,
                    image.source,
                    OffsetDateTime::now_utc(),
                ],
            )
            .with_context(|| format!("failed to insert image {}", image.name))?;

        Ok(inserted == 1)
    }

    pub async fn has_drive_file(&self, google_drive_id: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        let found = conn
            .query_row(
                "select 1 from images where google_drive_id = ?1",
                [google_drive_id],
                |_| Ok(()),
            )
            .optional()
            .context("failed to look up drive file")?;

        Ok(found.is_some())
    }

    /// All images, newest first.
    pub async fn list_images(&self) -> Result<Vec<ImageRow>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            r"select id, name, google_drive_id, size, mime_type, storage_url, source, created_at, status
              from images
              order by id desc",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(ImageRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    google_drive_id: row.get(2)?,
                    size: row.get(3)?,
                    mime_type: row.get(4)?,
                    storage_url: row.get(5)?,
                    source: row.get(6)?,
                    created_at: row.get(7)?,
                    status: row.get(8)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to read images")?;

        Ok(rows)
    }

    /// Cheap round trip used by the health endpoint.
    pub async fn ping(&self) -> bool {
        let conn = self.conn.lock().await;
        conn.query_row("select 1", [], |row| row.get::<usize, i64>(0))
            .is_ok()
    }
}
