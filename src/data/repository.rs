//! Repository interface
//!
//! Storage backends hold JSON documents grouped by [`Collection`] plus the
//! tag registry. Typed access goes through [`RepositoryExt`], so backends
//! only implement the untyped, object-safe [`ContentRepository`].
//!
//! Backends maintain the tag registry themselves: every put or delete in a
//! tag-counting collection applies the delta between the stored body and the
//! new one while the batch holds the write lock.

use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;

use super::models::{Collection, Document, TagRegistry};
use crate::error::AppError;

/// One write inside an atomic [`WriteBatch`]
#[derive(Debug, Clone)]
pub enum WriteOp {
    Put {
        collection: Collection,
        id: String,
        document: Value,
    },
    /// Deleting a missing document is a no-op
    Delete {
        collection: Collection,
        id: String,
    },
}

/// Writes applied all-or-nothing
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    pub ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put<D: Document>(mut self, document: &D) -> Result<Self, AppError> {
        self.ops.push(WriteOp::Put {
            collection: D::COLLECTION,
            id: document.id().to_string(),
            document: serde_json::to_value(document)?,
        });
        Ok(self)
    }

    pub fn delete<D: Document>(mut self, id: &str) -> Self {
        self.ops.push(WriteOp::Delete {
            collection: D::COLLECTION,
            id: id.to_string(),
        });
        self
    }
}

/// Document store used by every service
///
/// Listing returns documents ordered by id; ULIDs make that creation order.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn list_documents(&self, collection: Collection) -> Result<Vec<Value>, AppError>;

    async fn get_document(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Value>, AppError>;

    async fn tag_registry(&self) -> Result<TagRegistry, AppError>;

    /// Apply every op of the batch atomically, keeping the tag registry in
    /// step with the stored documents.
    async fn commit(&self, batch: WriteBatch) -> Result<(), AppError>;

    /// Remove every catalog document and tag. User accounts are kept.
    async fn clear(&self) -> Result<(), AppError>;
}

/// Typed helpers over any [`ContentRepository`]
#[async_trait]
pub trait RepositoryExt: ContentRepository {
    async fn list<D: Document>(&self) -> Result<Vec<D>, AppError> {
        let started = Instant::now();
        let raw = self.list_documents(D::COLLECTION).await?;
        crate::metrics::observe_db_query("list", D::COLLECTION.as_str(), started.elapsed());

        let mut documents = Vec::with_capacity(raw.len());
        for value in raw {
            match serde_json::from_value::<D>(value) {
                Ok(document) => documents.push(document),
                Err(error) => tracing::warn!(
                    collection = D::COLLECTION.as_str(),
                    %error,
                    "Skipping undecodable document"
                ),
            }
        }
        Ok(documents)
    }

    async fn get<D: Document>(&self, id: &str) -> Result<Option<D>, AppError> {
        let started = Instant::now();
        let raw = self.get_document(D::COLLECTION, id).await?;
        crate::metrics::observe_db_query("get", D::COLLECTION.as_str(), started.elapsed());

        raw.map(serde_json::from_value::<D>)
            .transpose()
            .map_err(AppError::from)
    }

    async fn put<D: Document>(&self, document: &D) -> Result<(), AppError> {
        let batch = WriteBatch::new().put(document)?;
        self.commit_timed(batch, D::COLLECTION).await
    }

    async fn remove<D: Document>(&self, id: &str) -> Result<(), AppError> {
        let batch = WriteBatch::new().delete::<D>(id);
        self.commit_timed(batch, D::COLLECTION).await
    }

    async fn commit_timed(
        &self,
        batch: WriteBatch,
        collection: Collection,
    ) -> Result<(), AppError> {
        let started = Instant::now();
        let result = self.commit(batch).await;
        crate::metrics::observe_db_query("commit", collection.as_str(), started.elapsed());
        result
    }
}

impl<R: ContentRepository + ?Sized> RepositoryExt for R {}
