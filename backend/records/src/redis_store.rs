//! # Redis
//!
//! Document store backed by Redis hashes.
//!
//! ## Layout
//!
//! - One hash per document, keyed `{collection}:{id}`
//! - Each hash field is a top-level document field, value JSON-encoded
//! - Single-field updates are a plain `HSET`, nothing else in the hash moves
//!
//! ## Writes
//!
//! - `set` replaces the document in a MULTI block (`DEL` + `HSET`)
//! - `update` runs a script that refuses to create a missing document, so an
//!   unknown id surfaces as not found instead of a half-empty record
use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use redis::{
    AsyncCommands, Client, Script,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use serde_json::Value;
use tracing::debug;

use crate::store::{Document, DocumentStore, StoreError};

const UPDATE_EXISTING: &str = r#"
    if redis.call('EXISTS', KEYS[1]) == 0 then
        return 0
    end
    redis.call('HSET', KEYS[1], unpack(ARGV))
    return 1
"#;

pub async fn init_redis(redis_url: &str) -> Result<ConnectionManager, StoreError> {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(100));

    let client = Client::open(redis_url)?;
    let connection_manager = client.get_connection_manager_with_config(config).await?;

    Ok(connection_manager)
}

pub struct RedisStore {
    connection: ConnectionManager,
    update_script: Script,
}

impl RedisStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self {
            connection,
            update_script: Script::new(UPDATE_EXISTING),
        }
    }

    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        Ok(Self::new(init_redis(redis_url).await?))
    }
}

pub fn document_key(collection: &str, id: &str) -> String {
    format!("{collection}:{id}")
}

pub fn encode_fields(document: &Document) -> Result<Vec<(String, String)>, StoreError> {
    document
        .iter()
        .map(|(field, value)| Ok((field.clone(), serde_json::to_string(value)?)))
        .collect()
}

pub fn decode_fields(hash: HashMap<String, String>) -> Result<Option<Document>, StoreError> {
    // HGETALL on a missing key is an empty hash
    if hash.is_empty() {
        return Ok(None);
    }

    let mut document = Document::new();
    for (field, raw) in hash {
        let value: Value = serde_json::from_str(&raw)?;
        document.insert(field, value);
    }

    Ok(Some(document))
}

#[async_trait]
impl DocumentStore for RedisStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let mut connection = self.connection.clone();

        let hash: HashMap<String, String> =
            connection.hgetall(document_key(collection, id)).await?;

        decode_fields(hash)
    }

    async fn set(&self, collection: &str, id: &str, document: Document) -> Result<(), StoreError> {
        let key = document_key(collection, id);
        let fields = encode_fields(&document)?;
        let mut connection = self.connection.clone();

        let mut pipe = redis::pipe();
        pipe.atomic().del(&key).ignore();
        if !fields.is_empty() {
            pipe.hset_multiple(&key, fields.as_slice()).ignore();
        }

        let _: () = pipe.query_async(&mut connection).await?;

        debug!("Wrote {key} ({} fields)", fields.len());
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<(), StoreError> {
        let key = document_key(collection, id);
        let fields = encode_fields(&fields)?;

        if fields.is_empty() {
            return Ok(());
        }

        let mut invocation = self.update_script.key(&key);
        for (field, value) in &fields {
            invocation.arg(field).arg(value);
        }

        let mut connection = self.connection.clone();
        let updated: i64 = invocation.invoke_async(&mut connection).await?;

        if updated == 0 {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }

        debug!("Updated {key} ({} fields)", fields.len());
        Ok(())
    }
}
