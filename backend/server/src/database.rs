//! # Collaborators
//!
//! Store and identity backends picked from config.
//!
//! ## Memory
//!
//! - Everything lives in the process and is gone on restart
//! - Meant for local runs and tests
//!
//! ## Hosted
//!
//! - Redis for documents, see [`records::redis_store`]
//! - The hosted identity REST API for accounts, see [`auth::rest`]
//! - No transaction spans the two, registration compensates on its own
use std::sync::Arc;

use auth::{IdentityProvider, MemoryIdentity, RestIdentity};
use records::{DocumentStore, MemoryStore, RedisStore, StoreError};
use tracing::info;

use crate::config::Backend;

pub struct Collaborators {
    pub store: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityProvider>,
}

pub async fn init_collaborators(backend: &Backend) -> Result<Collaborators, StoreError> {
    match backend {
        Backend::Memory => {
            info!("Using in-memory store and identity provider");

            Ok(Collaborators {
                store: Arc::new(MemoryStore::new()),
                identity: Arc::new(MemoryIdentity::new()),
            })
        }
        Backend::Hosted(hosted) => {
            info!("Connecting to Redis at {}", hosted.redis_url);
            let store = RedisStore::connect(&hosted.redis_url).await?;

            Ok(Collaborators {
                store: Arc::new(store),
                identity: Arc::new(RestIdentity::new(&hosted.identity_url, &hosted.identity_key)),
            })
        }
    }
}
