use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::database::Database;

/// A named set of files handed out behind one opaque link
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Share {
    pub id: i64,
    pub hash: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Share row plus aggregate counts for the admin dashboard
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ShareWithStats {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub share: Share,
    pub file_count: i64,
    pub comment_count: i64,
}

/// What a share delete removed: the share row and the storage paths of
///  every file that went with it
#[derive(Debug, Clone)]
pub struct DeletedShare {
    pub share: Share,
    pub storage_paths: Vec<String>,
}

impl Share {
    /// Insert a share under `hash`. A duplicate hash surfaces as a unique
    ///  violation from the store.
    pub async fn create(
        hash: &str,
        name: &str,
        description: Option<&str>,
        db: &Database,
    ) -> Result<Share, sqlx::Error> {
        let now = OffsetDateTime::now_utc();

        sqlx::query_as::<_, Share>(
            r#"
            INSERT INTO shares (hash, name, description, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            RETURNING id, hash, name, description, created_at, updated_at
            "#,
        )
        .bind(hash)
        .bind(name)
        .bind(description)
        .bind(now)
        .fetch_one(&**db)
        .await
    }

    pub async fn get(id: i64, db: &Database) -> Result<Option<Share>, sqlx::Error> {
        sqlx::query_as::<_, Share>(
            r#"
            SELECT id, hash, name, description, created_at, updated_at
            FROM shares
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&**db)
        .await
    }

    pub async fn get_by_hash(hash: &str, db: &Database) -> Result<Option<Share>, sqlx::Error> {
        sqlx::query_as::<_, Share>(
            r#"
            SELECT id, hash, name, description, created_at, updated_at
            FROM shares
            WHERE hash = ?1
            "#,
        )
        .bind(hash)
        .fetch_optional(&**db)
        .await
    }

    pub async fn hash_exists(hash: &str, db: &Database) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM shares WHERE hash = ?1)")
            .bind(hash)
            .fetch_one(&**db)
            .await
    }

    /// All shares, newest first, with distinct file and comment counts
    ///  computed in a single query
    pub async fn list_with_stats(db: &Database) -> Result<Vec<ShareWithStats>, sqlx::Error> {
        sqlx::query_as::<_, ShareWithStats>(
            r#"
            SELECT
                s.id, s.hash, s.name, s.description, s.created_at, s.updated_at,
                COUNT(DISTINCT f.id) AS file_count,
                COUNT(DISTINCT c.id) AS comment_count
            FROM shares s
            LEFT JOIN files f ON f.share_id = s.id
            LEFT JOIN comments c ON c.file_id = f.id
            GROUP BY s.id
            ORDER BY s.created_at DESC, s.id DESC
            "#,
        )
        .fetch_all(&**db)
        .await
    }

    /// Delete a share. Files and comments go with it through the schema's
    ///  cascade, all inside one transaction.
    pub async fn delete(id: i64, db: &Database) -> Result<Option<DeletedShare>, sqlx::Error> {
        let mut tx = db.begin().await?;

        let storage_paths = sqlx::query_scalar::<_, String>(
            "SELECT storage_path FROM files WHERE share_id = ?1",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let share = sqlx::query_as::<_, Share>(
            r#"
            DELETE FROM shares
            WHERE id = ?1
            RETURNING id, hash, name, description, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(share.map(|share| DeletedShare {
            share,
            storage_paths,
        }))
    }
}
