use std::sync::Arc;

use auth::AccountManager;
use records::DocumentStore;

use super::{
    config::Config,
    database::{Collaborators, init_collaborators},
};

pub struct State {
    pub config: Config,
    pub store: Arc<dyn DocumentStore>,
    pub accounts: AccountManager,
}

impl State {
    pub async fn new(config: Config) -> anyhow::Result<Arc<Self>> {
        let collaborators = init_collaborators(&config.backend).await?;

        Ok(Self::with_collaborators(config, collaborators))
    }

    pub fn with_collaborators(config: Config, collaborators: Collaborators) -> Arc<Self> {
        let Collaborators { store, identity } = collaborators;

        Arc::new(Self {
            config,
            accounts: AccountManager::new(identity, store.clone()),
            store,
        })
    }
}
