//! Share, file and comment operations on top of the database and the
//! upload store.
//!
//! Every public lookup goes through an opaque hash; a malformed hash and an
//! unknown hash are the same `NotFound`. Comment writes are gated by the
//! caller's bound identity and by one process-wide rate limiter.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;

use common::ids::{self, IdError, FILE_HASH_LEN, SHARE_HASH_LEN};
use common::prelude::{RateLimitResult, RateLimiter};

use crate::database::models::{Comment, File, Share, ShareWithStats};
use crate::database::{is_foreign_key_violation, is_unique_violation, Database};
use crate::uploads::{Uploads, UploadsError};

/// Attempts at minting an unused hash before creation is abandoned
pub const MAX_HASH_ATTEMPTS: usize = 10;

/// Stored filename when the upload carried none
const UNNAMED_FILE: &str = "unnamed";
const FALLBACK_MIME: &str = "application/octet-stream";

#[derive(Debug, Clone, Serialize)]
pub struct FileWithComments {
    #[serde(flatten)]
    pub file: File,
    pub comments: Vec<Comment>,
}

/// Everything a visitor holding a share link gets to see
#[derive(Debug, Clone, Serialize)]
pub struct ShareView {
    pub share: Share,
    pub files: Vec<FileWithComments>,
}

/// Admin view of a single share
#[derive(Debug, Clone, Serialize)]
pub struct ShareDetail {
    pub share: Share,
    pub files: Vec<File>,
}

#[derive(Clone)]
pub struct ShareManager {
    db: Database,
    uploads: Uploads,
    comment_limiter: Arc<RateLimiter>,
}

impl ShareManager {
    pub fn new(db: Database, uploads: Uploads, comment_limiter: Arc<RateLimiter>) -> Self {
        Self {
            db,
            uploads,
            comment_limiter,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn uploads(&self) -> &Uploads {
        &self.uploads
    }

    // admin operations

    pub async fn create_share(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Share, ShareManagerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ShareManagerError::Validation("share name is required"));
        }
        let description = description.map(str::trim).filter(|d| !d.is_empty());

        for attempt in 1..=MAX_HASH_ATTEMPTS {
            let hash = ids::generate(SHARE_HASH_LEN)?;
            if Share::hash_exists(&hash, &self.db).await? {
                tracing::warn!(attempt, "share hash collision, drawing again");
                continue;
            }

            // the UNIQUE constraint settles races the existence check can't see
            match Share::create(&hash, name, description, &self.db).await {
                Ok(share) => {
                    tracing::info!(share_id = share.id, "share created");
                    return Ok(share);
                }
                Err(e) if is_unique_violation(&e) => {
                    tracing::warn!(attempt, "share hash taken on insert, drawing again");
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::error!(
            attempts = MAX_HASH_ATTEMPTS,
            "no unused share hash found, giving up"
        );
        Err(ShareManagerError::CreationFailed)
    }

    pub async fn list_shares(&self) -> Result<Vec<ShareWithStats>, ShareManagerError> {
        Ok(Share::list_with_stats(&self.db).await?)
    }

    pub async fn get_share(&self, id: i64) -> Result<Share, ShareManagerError> {
        Share::get(id, &self.db)
            .await?
            .ok_or(ShareManagerError::NotFound)
    }

    pub async fn share_detail(&self, id: i64) -> Result<ShareDetail, ShareManagerError> {
        let share = self.get_share(id).await?;
        let files = File::list_for_share(share.id, &self.db).await?;
        Ok(ShareDetail { share, files })
    }

    /// Delete a share with all its files and comments. Stored bytes are
    ///  released afterwards; failures there are logged and leave the
    ///  delete standing.
    pub async fn delete_share(&self, id: i64) -> Result<Share, ShareManagerError> {
        let deleted = Share::delete(id, &self.db)
            .await?
            .ok_or(ShareManagerError::NotFound)?;

        for path in &deleted.storage_paths {
            if let Err(e) = self.uploads.delete(path).await {
                tracing::warn!(share_id = id, path = %path, error = %e, "failed to remove stored bytes");
            }
        }

        tracing::info!(
            share_id = id,
            files = deleted.storage_paths.len(),
            "share deleted"
        );
        Ok(deleted.share)
    }

    /// Store `data` and record it as a file of share `share_id`. If the
    ///  record can't be written the stored bytes are removed again.
    pub async fn upload_file(
        &self,
        share_id: i64,
        filename: &str,
        content_type: Option<&str>,
        data: Bytes,
    ) -> Result<File, ShareManagerError> {
        let share = self.get_share(share_id).await?;

        let filename = match filename.trim() {
            "" => UNNAMED_FILE,
            name => name,
        };
        let mime_type = resolve_mime(content_type, filename);
        let size_bytes = data.len() as i64;

        let storage_path = Uploads::storage_path(share.id);
        self.uploads.put(&storage_path, data).await?;

        match self
            .record_file(share.id, filename, &storage_path, &mime_type, size_bytes)
            .await
        {
            Ok(file) => {
                tracing::info!(share_id = share.id, file_id = file.id, size_bytes, "file uploaded");
                Ok(file)
            }
            Err(e) => {
                tracing::error!(share_id = share.id, error = %e, "failed to record upload");
                if let Err(cleanup) = self.uploads.delete(&storage_path).await {
                    tracing::warn!(path = %storage_path, error = %cleanup, "failed to remove orphaned upload");
                }
                Err(ShareManagerError::CreationFailed)
            }
        }
    }

    async fn record_file(
        &self,
        share_id: i64,
        filename: &str,
        storage_path: &str,
        mime_type: &str,
        size_bytes: i64,
    ) -> Result<File, ShareManagerError> {
        for attempt in 1..=MAX_HASH_ATTEMPTS {
            let hash = ids::generate(FILE_HASH_LEN)?;
            if File::hash_exists(&hash, &self.db).await? {
                tracing::warn!(attempt, "file hash collision, drawing again");
                continue;
            }

            match File::create(
                share_id,
                &hash,
                filename,
                storage_path,
                mime_type,
                size_bytes,
                &self.db,
            )
            .await
            {
                Ok(file) => return Ok(file),
                Err(e) if is_unique_violation(&e) => {
                    tracing::warn!(attempt, "file hash taken on insert, drawing again");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ShareManagerError::CreationFailed)
    }

    pub async fn get_file(&self, id: i64) -> Result<File, ShareManagerError> {
        File::get(id, &self.db)
            .await?
            .ok_or(ShareManagerError::NotFound)
    }

    /// Delete a file and its comments, then release its bytes
    pub async fn delete_file(&self, id: i64) -> Result<File, ShareManagerError> {
        let file = File::delete(id, &self.db)
            .await?
            .ok_or(ShareManagerError::NotFound)?;

        if let Err(e) = self.uploads.delete(&file.storage_path).await {
            tracing::warn!(file_id = id, error = %e, "failed to remove stored bytes");
        }

        tracing::info!(file_id = id, share_id = file.share_id, "file deleted");
        Ok(file)
    }

    // public operations

    pub async fn find_share(&self, hash: &str) -> Result<Share, ShareManagerError> {
        if !ids::is_well_formed(hash, SHARE_HASH_LEN) {
            return Err(ShareManagerError::NotFound);
        }

        Share::get_by_hash(hash, &self.db)
            .await?
            .ok_or(ShareManagerError::NotFound)
    }

    /// A share with its files, each carrying its comments
    pub async fn view_share(&self, hash: &str) -> Result<ShareView, ShareManagerError> {
        let share = self.find_share(hash).await?;
        let files = File::list_for_share(share.id, &self.db).await?;

        let mut comments: HashMap<i64, Vec<Comment>> = HashMap::new();
        for comment in Comment::list_for_share(share.id, &self.db).await? {
            comments.entry(comment.file_id).or_default().push(comment);
        }

        let files = files
            .into_iter()
            .map(|file| {
                let comments = comments.remove(&file.id).unwrap_or_default();
                FileWithComments { file, comments }
            })
            .collect();

        Ok(ShareView { share, files })
    }

    /// A file's record and bytes. Bytes gone missing from the store read as
    ///  not found.
    pub async fn open_file(&self, hash: &str) -> Result<(File, Bytes), ShareManagerError> {
        if !ids::is_well_formed(hash, FILE_HASH_LEN) {
            return Err(ShareManagerError::NotFound);
        }

        let file = File::get_by_hash(hash, &self.db)
            .await?
            .ok_or(ShareManagerError::NotFound)?;

        match self.uploads.get(&file.storage_path).await? {
            Some(bytes) => Ok((file, bytes)),
            None => {
                tracing::warn!(file_id = file.id, "stored bytes missing for file");
                Err(ShareManagerError::NotFound)
            }
        }
    }

    /// Leave a comment on file `file_id` as `author`. A missing author is
    ///  rejected, never defaulted.
    pub async fn add_comment(
        &self,
        file_id: i64,
        author: Option<&str>,
        content: &str,
    ) -> Result<Comment, ShareManagerError> {
        let author = author
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .ok_or(ShareManagerError::Unauthenticated)?;

        let content = content.trim();
        if content.is_empty() {
            return Err(ShareManagerError::Validation("comment content is required"));
        }

        if let RateLimitResult::Limited { retry_after } = self.comment_limiter.check() {
            tracing::warn!(file_id, "comment rate limit reached");
            return Err(ShareManagerError::RateLimited { retry_after });
        }

        match Comment::create(file_id, author, content, &self.db).await {
            Ok(comment) => Ok(comment),
            Err(e) if is_foreign_key_violation(&e) => Err(ShareManagerError::NotFound),
            Err(e) => Err(e.into()),
        }
    }
}

/// Declared content type when it parses, otherwise a guess from the
///  filename, otherwise octet-stream
fn resolve_mime(declared: Option<&str>, filename: &str) -> String {
    declared
        .map(str::trim)
        .and_then(|ct| ct.parse::<mime_guess::mime::Mime>().ok())
        .map(|mime| mime.essence_str().to_string())
        .or_else(|| {
            mime_guess::from_path(filename)
                .first()
                .map(|m| m.essence_str().to_string())
        })
        .unwrap_or_else(|| FALLBACK_MIME.to_string())
}

#[derive(Debug, thiserror::Error)]
pub enum ShareManagerError {
    #[error("not found")]
    NotFound,

    #[error("invalid input: {0}")]
    Validation(&'static str),

    #[error("no display name bound to this session")]
    Unauthenticated,

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("creation failed")]
    CreationFailed,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("upload storage error: {0}")]
    Uploads(#[from] UploadsError),

    #[error("random source error: {0}")]
    RandomSource(#[from] IdError),
}

#[cfg(test)]
mod tests {
    use common::prelude::RateLimitConfig;
    use futures::stream::BoxStream;
    use object_store::memory::InMemory;
    use object_store::path::Path as ObjectPath;
    use object_store::{
        GetOptions, GetResult, ListResult, MultipartUpload, ObjectMeta, ObjectStore,
        PutMultipartOpts, PutOptions, PutPayload, PutResult,
    };

    use super::*;

    /// In-memory store that refuses every delete
    #[derive(Debug, Default)]
    struct UndeletableStore(InMemory);

    impl std::fmt::Display for UndeletableStore {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "UndeletableStore")
        }
    }

    #[async_trait::async_trait]
    impl ObjectStore for UndeletableStore {
        async fn put_opts(
            &self,
            location: &ObjectPath,
            payload: PutPayload,
            opts: PutOptions,
        ) -> object_store::Result<PutResult> {
            self.0.put_opts(location, payload, opts).await
        }

        async fn put_multipart_opts(
            &self,
            location: &ObjectPath,
            opts: PutMultipartOpts,
        ) -> object_store::Result<Box<dyn MultipartUpload>> {
            self.0.put_multipart_opts(location, opts).await
        }

        async fn get_opts(
            &self,
            location: &ObjectPath,
            options: GetOptions,
        ) -> object_store::Result<GetResult> {
            self.0.get_opts(location, options).await
        }

        async fn delete(&self, _location: &ObjectPath) -> object_store::Result<()> {
            Err(object_store::Error::Generic {
                store: "undeletable",
                source: "delete refused".into(),
            })
        }

        fn list(
            &self,
            prefix: Option<&ObjectPath>,
        ) -> BoxStream<'_, object_store::Result<ObjectMeta>> {
            self.0.list(prefix)
        }

        async fn list_with_delimiter(
            &self,
            prefix: Option<&ObjectPath>,
        ) -> object_store::Result<ListResult> {
            self.0.list_with_delimiter(prefix).await
        }

        async fn copy(&self, from: &ObjectPath, to: &ObjectPath) -> object_store::Result<()> {
            self.0.copy(from, to).await
        }

        async fn copy_if_not_exists(
            &self,
            from: &ObjectPath,
            to: &ObjectPath,
        ) -> object_store::Result<()> {
            self.0.copy_if_not_exists(from, to).await
        }
    }

    async fn manager() -> ShareManager {
        manager_with_limit(RateLimitConfig::default()).await
    }

    async fn manager_with_limit(config: RateLimitConfig) -> ShareManager {
        let db = Database::in_memory().await.unwrap();
        ShareManager::new(db, Uploads::memory(), Arc::new(RateLimiter::new(config)))
    }

    #[tokio::test]
    async fn test_create_share_validates_name() {
        let shares = manager().await;
        assert!(matches!(
            shares.create_share("   ", None).await,
            Err(ShareManagerError::Validation(_))
        ));

        let share = shares.create_share("  Mockups ", Some("  ")).await.unwrap();
        assert_eq!(share.name, "Mockups");
        assert!(share.description.is_none());
        assert_eq!(share.hash.len(), SHARE_HASH_LEN);
        assert!(ids::is_well_formed(&share.hash, SHARE_HASH_LEN));
    }

    #[tokio::test]
    async fn test_malformed_and_unknown_hashes_look_the_same() {
        let shares = manager().await;
        for hash in ["", "short", "abcdefghijk!", "abcdefghijkl", "../../etc/pas"] {
            assert!(matches!(
                shares.find_share(hash).await,
                Err(ShareManagerError::NotFound)
            ));
        }
        assert!(matches!(
            shares.open_file("abcdefghijklmnop").await,
            Err(ShareManagerError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_upload_and_open() {
        let shares = manager().await;
        let share = shares.create_share("s", None).await.unwrap();

        let file = shares
            .upload_file(
                share.id,
                "report.pdf",
                Some("application/pdf"),
                Bytes::from_static(b"%PDF-1.7"),
            )
            .await
            .unwrap();
        assert_eq!(file.hash.len(), FILE_HASH_LEN);
        assert_eq!(file.size_bytes, 8);
        assert!(file.storage_path.starts_with(&format!("{}/", share.id)));

        let (opened, bytes) = shares.open_file(&file.hash).await.unwrap();
        assert_eq!(opened.filename, "report.pdf");
        assert_eq!(opened.mime_type, "application/pdf");
        assert_eq!(bytes, Bytes::from_static(b"%PDF-1.7"));
    }

    #[tokio::test]
    async fn test_upload_into_missing_share_stores_nothing() {
        let shares = manager().await;
        assert!(matches!(
            shares
                .upload_file(99, "a.txt", None, Bytes::from_static(b"x"))
                .await,
            Err(ShareManagerError::NotFound)
        ));
        assert_eq!(shares.uploads().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_record_removes_orphaned_bytes() {
        let shares = manager().await;
        let share = shares.create_share("s", None).await.unwrap();

        // break the files table so the insert after the byte write fails
        sqlx::query("DROP TABLE comments")
            .execute(&**shares.database())
            .await
            .unwrap();
        sqlx::query("DROP TABLE files")
            .execute(&**shares.database())
            .await
            .unwrap();

        let result = shares
            .upload_file(share.id, "a.txt", None, Bytes::from_static(b"orphan"))
            .await;
        assert!(matches!(result, Err(ShareManagerError::CreationFailed)));
        assert_eq!(shares.uploads().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_bytes_read_as_not_found() {
        let shares = manager().await;
        let share = shares.create_share("s", None).await.unwrap();
        let file = shares
            .upload_file(share.id, "a.txt", None, Bytes::from_static(b"x"))
            .await
            .unwrap();
        shares.uploads().delete(&file.storage_path).await.unwrap();

        assert!(matches!(
            shares.open_file(&file.hash).await,
            Err(ShareManagerError::NotFound)
        ));
        // the record is still removable
        shares.delete_file(file.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_share_releases_bytes() {
        let shares = manager().await;
        let share = shares.create_share("s", None).await.unwrap();
        for name in ["a.txt", "b.txt"] {
            shares
                .upload_file(share.id, name, None, Bytes::from_static(b"x"))
                .await
                .unwrap();
        }
        assert_eq!(shares.uploads().count().await.unwrap(), 2);

        shares.delete_share(share.id).await.unwrap();
        assert_eq!(shares.uploads().count().await.unwrap(), 0);
        assert!(matches!(
            shares.delete_share(share.id).await,
            Err(ShareManagerError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_view_groups_comments_by_file() {
        let shares = manager().await;
        let share = shares.create_share("s", None).await.unwrap();
        let a = shares
            .upload_file(share.id, "a.txt", None, Bytes::from_static(b"a"))
            .await
            .unwrap();
        let b = shares
            .upload_file(share.id, "b.txt", None, Bytes::from_static(b"b"))
            .await
            .unwrap();
        shares.add_comment(a.id, Some("ana"), "one").await.unwrap();
        shares.add_comment(a.id, Some("ana"), "two").await.unwrap();
        shares.add_comment(b.id, Some("ben"), "three").await.unwrap();

        let view = shares.view_share(&share.hash).await.unwrap();
        assert_eq!(view.share.id, share.id);
        let counts: HashMap<i64, usize> = view
            .files
            .iter()
            .map(|f| (f.file.id, f.comments.len()))
            .collect();
        assert_eq!(counts[&a.id], 2);
        assert_eq!(counts[&b.id], 1);
    }

    #[tokio::test]
    async fn test_comment_requires_author_and_content() {
        let shares = manager().await;
        let share = shares.create_share("s", None).await.unwrap();
        let file = shares
            .upload_file(share.id, "a.txt", None, Bytes::from_static(b"a"))
            .await
            .unwrap();

        assert!(matches!(
            shares.add_comment(file.id, None, "hello").await,
            Err(ShareManagerError::Unauthenticated)
        ));
        assert!(matches!(
            shares.add_comment(file.id, Some("  "), "hello").await,
            Err(ShareManagerError::Unauthenticated)
        ));
        assert!(matches!(
            shares.add_comment(file.id, Some("ana"), " \n ").await,
            Err(ShareManagerError::Validation(_))
        ));
        assert!(matches!(
            shares.add_comment(12345, Some("ana"), "hello").await,
            Err(ShareManagerError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_comment_rate_limit() {
        let shares = manager_with_limit(RateLimitConfig {
            rate_per_sec: 0.0,
            burst: 2,
        })
        .await;
        let share = shares.create_share("s", None).await.unwrap();
        let file = shares
            .upload_file(share.id, "a.txt", None, Bytes::from_static(b"a"))
            .await
            .unwrap();

        shares.add_comment(file.id, Some("ana"), "1").await.unwrap();
        shares.add_comment(file.id, Some("ana"), "2").await.unwrap();
        assert!(matches!(
            shares.add_comment(file.id, Some("ana"), "3").await,
            Err(ShareManagerError::RateLimited { .. })
        ));
    }

    #[tokio::test]
    async fn test_deletes_stand_when_bytes_cannot_be_removed() {
        let db = Database::in_memory().await.unwrap();
        let uploads = Uploads::from_store(Arc::new(UndeletableStore::default()));
        let shares = ShareManager::new(db, uploads, Arc::new(RateLimiter::default()));

        let share = shares.create_share("s", None).await.unwrap();
        let a = shares
            .upload_file(share.id, "a.txt", None, Bytes::from_static(b"a"))
            .await
            .unwrap();
        let b = shares
            .upload_file(share.id, "b.txt", None, Bytes::from_static(b"b"))
            .await
            .unwrap();

        let deleted = shares.delete_file(a.id).await.unwrap();
        assert_eq!(deleted.id, a.id);
        assert!(File::get(a.id, shares.database()).await.unwrap().is_none());
        assert!(matches!(
            shares.get_file(a.id).await,
            Err(ShareManagerError::NotFound)
        ));

        let deleted = shares.delete_share(share.id).await.unwrap();
        assert_eq!(deleted.id, share.id);
        assert!(Share::get(share.id, shares.database()).await.unwrap().is_none());
        assert!(File::get(b.id, shares.database()).await.unwrap().is_none());

        // the bytes are orphaned, not lost from the store's point of view
        assert_eq!(shares.uploads().count().await.unwrap(), 2);
    }

    #[test]
    fn test_resolve_mime() {
        assert_eq!(resolve_mime(Some("application/pdf"), "x.bin"), "application/pdf");
        assert_eq!(resolve_mime(Some("text/plain; charset=utf-8"), "x"), "text/plain");
        assert_eq!(resolve_mime(None, "photo.png"), "image/png");
        assert_eq!(resolve_mime(Some("not a type"), "photo.png"), "image/png");
        assert_eq!(resolve_mime(None, "README"), "application/octet-stream");
    }
}
