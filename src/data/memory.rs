//! In-memory repository
//!
//! Volatile backend used by tests and the default configuration.
//! A single write lock makes every batch atomic, tag counting included.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::models::{Collection, TagDelta, TagRegistry};
use super::repository::{ContentRepository, WriteBatch, WriteOp};
use crate::error::AppError;

#[derive(Default)]
struct Store {
    documents: HashMap<Collection, BTreeMap<String, Value>>,
    tags: TagRegistry,
}

/// Repository backed by process memory
#[derive(Default)]
pub struct InMemoryRepository {
    store: RwLock<Store>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContentRepository for InMemoryRepository {
    async fn list_documents(&self, collection: Collection) -> Result<Vec<Value>, AppError> {
        let store = self.store.read().await;
        Ok(store
            .documents
            .get(&collection)
            .map(|documents| documents.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn get_document(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Value>, AppError> {
        let store = self.store.read().await;
        Ok(store
            .documents
            .get(&collection)
            .and_then(|documents| documents.get(id))
            .cloned())
    }

    async fn tag_registry(&self) -> Result<TagRegistry, AppError> {
        Ok(self.store.read().await.tags.clone())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), AppError> {
        let mut store = self.store.write().await;
        for op in batch.ops {
            match op {
                WriteOp::Put {
                    collection,
                    id,
                    document,
                } => {
                    let previous = store
                        .documents
                        .entry(collection)
                        .or_default()
                        .insert(id, document.clone());
                    if collection.counts_tags() {
                        let delta = TagDelta::between_documents(previous.as_ref(), Some(&document));
                        store.tags.apply(&delta);
                    }
                }
                WriteOp::Delete { collection, id } => {
                    let removed = store
                        .documents
                        .get_mut(&collection)
                        .and_then(|documents| documents.remove(&id));
                    if collection.counts_tags() {
                        if let Some(removed) = removed {
                            store
                                .tags
                                .apply(&TagDelta::between_documents(Some(&removed), None));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), AppError> {
        let mut store = self.store.write().await;
        store
            .documents
            .retain(|collection, _| *collection == Collection::Users);
        store.tags = TagRegistry::default();
        Ok(())
    }
}
