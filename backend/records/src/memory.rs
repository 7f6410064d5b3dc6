use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::store::{Document, DocumentStore, StoreError};

/// Process-local store for development runs and tests.
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<(String, String), Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

fn key(collection: &str, id: &str) -> (String, String) {
    (collection.to_string(), id.to_string())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.documents.read().await.get(&key(collection, id)).cloned())
    }

    async fn set(&self, collection: &str, id: &str, document: Document) -> Result<(), StoreError> {
        self.documents
            .write()
            .await
            .insert(key(collection, id), document);

        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<(), StoreError> {
        let mut documents = self.documents.write().await;

        let document = documents
            .get_mut(&key(collection, id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        document.extend(fields);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_update_touches_only_given_fields() {
        let store = MemoryStore::new();
        store
            .set("appointments", "a1", doc(json!({"status": "scheduled", "notes": "x"})))
            .await
            .unwrap();

        store
            .update("appointments", "a1", doc(json!({"status": "completed"})))
            .await
            .unwrap();

        let stored = store.get("appointments", "a1").await.unwrap().unwrap();
        assert_eq!(stored, doc(json!({"status": "completed", "notes": "x"})));
    }

    #[tokio::test]
    async fn test_update_missing_document() {
        let store = MemoryStore::new();

        let result = store
            .update("appointments", "nope", doc(json!({"status": "completed"})))
            .await;

        assert!(matches!(result, Err(StoreError::NotFound { .. })));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_collections_are_separate() {
        let store = MemoryStore::new();
        store.set("users", "x", doc(json!({"a": 1}))).await.unwrap();

        assert!(store.get("appointments", "x").await.unwrap().is_none());
        assert_eq!(store.len().await, 1);
    }
}
