use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    /// The provider answered and said no, e.g. `EMAIL_EXISTS`.
    #[error("Identity provider rejected the request: {code}")]
    Rejected { code: String },

    #[error("Identity provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Handle for an authenticated account, as issued by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub id_token: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Creates an email/password account and returns it signed in.
    async fn create_account(&self, email: &str, password: &str)
    -> Result<Identity, ProviderError>;

    async fn set_display_name(
        &self,
        identity: &Identity,
        display_name: &str,
    ) -> Result<(), ProviderError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, ProviderError>;

    /// Looks up the account behind a token issued by `sign_in` or `create_account`.
    async fn resume(&self, id_token: &str) -> Result<Identity, ProviderError>;

    async fn sign_out(&self, identity: &Identity) -> Result<(), ProviderError>;

    async fn delete_account(&self, identity: &Identity) -> Result<(), ProviderError>;
}
