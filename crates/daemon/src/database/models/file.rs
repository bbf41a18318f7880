use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::database::Database;

/// An uploaded file. `storage_path` locates the bytes in the upload store
///  and never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct File {
    pub id: i64,
    pub share_id: i64,
    pub hash: String,
    pub filename: String,
    #[serde(skip)]
    pub storage_path: String,
    pub mime_type: String,
    pub size_bytes: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub uploaded_at: OffsetDateTime,
}

impl File {
    pub async fn create(
        share_id: i64,
        hash: &str,
        filename: &str,
        storage_path: &str,
        mime_type: &str,
        size_bytes: i64,
        db: &Database,
    ) -> Result<File, sqlx::Error> {
        let now = OffsetDateTime::now_utc();

        sqlx::query_as::<_, File>(
            r#"
            INSERT INTO files (
                share_id, hash, filename, storage_path, mime_type, size_bytes, uploaded_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING
                id, share_id, hash, filename, storage_path, mime_type, size_bytes, uploaded_at
            "#,
        )
        .bind(share_id)
        .bind(hash)
        .bind(filename)
        .bind(storage_path)
        .bind(mime_type)
        .bind(size_bytes)
        .bind(now)
        .fetch_one(&**db)
        .await
    }

    pub async fn get(id: i64, db: &Database) -> Result<Option<File>, sqlx::Error> {
        sqlx::query_as::<_, File>(
            r#"
            SELECT id, share_id, hash, filename, storage_path, mime_type, size_bytes, uploaded_at
            FROM files
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&**db)
        .await
    }

    pub async fn get_by_hash(hash: &str, db: &Database) -> Result<Option<File>, sqlx::Error> {
        sqlx::query_as::<_, File>(
            r#"
            SELECT id, share_id, hash, filename, storage_path, mime_type, size_bytes, uploaded_at
            FROM files
            WHERE hash = ?1
            "#,
        )
        .bind(hash)
        .fetch_optional(&**db)
        .await
    }

    pub async fn hash_exists(hash: &str, db: &Database) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM files WHERE hash = ?1)")
            .bind(hash)
            .fetch_one(&**db)
            .await
    }

    /// Files of a share, newest first
    pub async fn list_for_share(share_id: i64, db: &Database) -> Result<Vec<File>, sqlx::Error> {
        sqlx::query_as::<_, File>(
            r#"
            SELECT id, share_id, hash, filename, storage_path, mime_type, size_bytes, uploaded_at
            FROM files
            WHERE share_id = ?1
            ORDER BY uploaded_at DESC, id DESC
            "#,
        )
        .bind(share_id)
        .fetch_all(&**db)
        .await
    }

    /// Delete a file and, through the cascade, its comments. Returns the
    ///  removed row so the caller can release its bytes.
    pub async fn delete(id: i64, db: &Database) -> Result<Option<File>, sqlx::Error> {
        sqlx::query_as::<_, File>(
            r#"
            DELETE FROM files
            WHERE id = ?1
            RETURNING
                id, share_id, hash, filename, storage_path, mime_type, size_bytes, uploaded_at
            "#,
        )
        .bind(id)
        .fetch_optional(&**db)
        .await
    }
}
