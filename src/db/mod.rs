pub mod models;
pub mod queries;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::services::ingest::DocumentStore;
use models::WeatherDocument;

/// Postgres-backed document store.
///
/// Holds the connection pool for the run; each insert checks a connection
/// out of the pool for the duration of the write and returns it on every
/// exit path.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert_document(&self, document: &WeatherDocument) -> Result<(), AppError> {
        queries::insert_document(&self.pool, document).await?;
        Ok(())
    }
}
