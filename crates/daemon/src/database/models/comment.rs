use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::database::Database;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: i64,
    pub file_id: i64,
    pub username: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Comment {
    pub async fn create(
        file_id: i64,
        username: &str,
        content: &str,
        db: &Database,
    ) -> Result<Comment, sqlx::Error> {
        let now = OffsetDateTime::now_utc();

        sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (file_id, username, content, created_at)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id, file_id, username, content, created_at
            "#,
        )
        .bind(file_id)
        .bind(username)
        .bind(content)
        .bind(now)
        .fetch_one(&**db)
        .await
    }

    /// Comments on one file, oldest first
    pub async fn list_for_file(file_id: i64, db: &Database) -> Result<Vec<Comment>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, file_id, username, content, created_at
            FROM comments
            WHERE file_id = ?1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(file_id)
        .fetch_all(&**db)
        .await
    }

    /// Every comment on every file of a share, oldest first
    pub async fn list_for_share(share_id: i64, db: &Database) -> Result<Vec<Comment>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            SELECT c.id, c.file_id, c.username, c.content, c.created_at
            FROM comments c
            JOIN files f ON f.id = c.file_id
            WHERE f.share_id = ?1
            ORDER BY c.created_at ASC, c.id ASC
            "#,
        )
        .bind(share_id)
        .fetch_all(&**db)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{File, Share};

    #[tokio::test]
    async fn test_list_for_share_spans_files() {
        let db = Database::in_memory().await.unwrap();
        let share = Share::create("abcdefghijkl", "s", None, &db).await.unwrap();
        let other = Share::create("otherotherot", "o", None, &db).await.unwrap();
        let a = File::create(share.id, "fileaaaaaaaaaaaa", "a", "1/a", "text/plain", 1, &db)
            .await
            .unwrap();
        let b = File::create(share.id, "filebbbbbbbbbbbb", "b", "1/b", "text/plain", 1, &db)
            .await
            .unwrap();
        let c = File::create(other.id, "filecccccccccccc", "c", "2/c", "text/plain", 1, &db)
            .await
            .unwrap();

        Comment::create(a.id, "ana", "first", &db).await.unwrap();
        Comment::create(b.id, "ben", "second", &db).await.unwrap();
        Comment::create(c.id, "cy", "elsewhere", &db).await.unwrap();

        let contents: Vec<String> = Comment::list_for_share(share.id, &db)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.content)
            .collect();
        assert_eq!(contents, vec!["first", "second"]);
    }
}
