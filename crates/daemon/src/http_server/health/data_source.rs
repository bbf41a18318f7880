use std::fmt::Debug;
use std::ops::Deref;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use http::request::Parts;

use crate::database::Database;
use crate::uploads::Uploads;
use crate::ServiceState;

#[async_trait]
pub trait DataSource {
    /// Check that everything a request may touch is reachable.
    async fn is_ready(&self) -> Result<(), DataSourceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DataSourceError {
    #[error("database is not answering")]
    Database,

    #[error("upload storage is not answering")]
    Uploads,
}

impl DataSourceError {
    /// Name of the failing dependency as reported by `/_status/readyz`
    pub fn dependency(&self) -> &'static str {
        match self {
            DataSourceError::Database => "database",
            DataSourceError::Uploads => "uploads",
        }
    }
}

pub type DynDataSource = Arc<dyn DataSource + Send + Sync>;

pub struct StateDataSource(DynDataSource);

impl Debug for StateDataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateDataSource").finish()
    }
}

impl StateDataSource {
    #[cfg(test)]
    pub fn new(dds: DynDataSource) -> Self {
        Self(dds)
    }
}

impl Deref for StateDataSource {
    type Target = DynDataSource;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Readiness backed by the live service: one query and one listing
struct ServiceSource {
    db: Database,
    uploads: Uploads,
}

#[async_trait]
impl DataSource for ServiceSource {
    async fn is_ready(&self) -> Result<(), DataSourceError> {
        sqlx::query("SELECT 1")
            .fetch_one(self.db.deref())
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "readiness: database check failed");
                DataSourceError::Database
            })?;

        self.uploads.probe().await.map_err(|e| {
            tracing::warn!(error = %e, "readiness: upload storage check failed");
            DataSourceError::Uploads
        })?;

        Ok(())
    }
}

#[async_trait]
impl FromRequestParts<ServiceState> for StateDataSource {
    type Rejection = ();

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &ServiceState,
    ) -> Result<Self, Self::Rejection> {
        let shares = state.shares();
        Ok(StateDataSource(Arc::new(ServiceSource {
            db: shares.database().clone(),
            uploads: shares.uploads().clone(),
        })))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[derive(Clone)]
    pub(crate) enum MockReadiness {
        Ready,
        DatabaseDown,
        UploadsDown,
    }

    #[async_trait]
    impl DataSource for MockReadiness {
        async fn is_ready(&self) -> Result<(), DataSourceError> {
            use MockReadiness::*;

            match self {
                Ready => Ok(()),
                DatabaseDown => Err(DataSourceError::Database),
                UploadsDown => Err(DataSourceError::Uploads),
            }
        }
    }

    #[tokio::test]
    async fn test_service_source_ready_until_db_closes() {
        let db = Database::in_memory().await.unwrap();
        let source = ServiceSource {
            db: db.clone(),
            uploads: Uploads::memory(),
        };
        assert!(source.is_ready().await.is_ok());

        db.close().await;
        assert!(matches!(
            source.is_ready().await,
            Err(DataSourceError::Database)
        ));
    }
}
