use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use thiserror::Error;

pub type Document = Map<String, Value>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("No document at {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Malformed document: {0}")]
    Malformed(String),
}

/// Get/set/update by identifier on named collections.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Replaces the whole document, creating it if needed.
    async fn set(&self, collection: &str, id: &str, document: Document) -> Result<(), StoreError>;

    /// Overwrites only the given fields. Fails with [`StoreError::NotFound`]
    /// instead of creating a document.
    async fn update(&self, collection: &str, id: &str, fields: Document)
    -> Result<(), StoreError>;
}

pub async fn read_record<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
    id: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(collection, id).await? {
        Some(document) => Ok(Some(serde_json::from_value(Value::Object(document))?)),
        None => Ok(None),
    }
}

pub async fn write_record<T: Serialize>(
    store: &dyn DocumentStore,
    collection: &str,
    id: &str,
    record: &T,
) -> Result<(), StoreError> {
    store.set(collection, id, to_document(record)?).await
}

pub fn to_document<T: Serialize>(record: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(record)? {
        Value::Object(document) => Ok(document),
        other => Err(StoreError::Malformed(format!(
            "expected an object, got {other}"
        ))),
    }
}
