use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::identity::{Identity, IdentityProvider, ProviderError};

const MIN_PASSWORD_LEN: usize = 6;

struct Account {
    uid: String,
    password: String,
    display_name: Option<String>,
}

/// In-process identity provider using the hosted provider's error codes.
///
/// Tracks which uids currently hold a provider-side session, and which
/// tokens are live for them.
#[derive(Default)]
pub struct MemoryIdentity {
    accounts: RwLock<HashMap<String, Account>>,
    signed_in: RwLock<HashSet<String>>,
    tokens: RwLock<HashMap<String, String>>,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_signed_in(&self, uid: &str) -> bool {
        self.signed_in.read().await.contains(uid)
    }

    pub async fn has_account(&self, email: &str) -> bool {
        self.accounts.read().await.contains_key(email)
    }

    async fn open(&self, email: &str, identity: &Identity) {
        self.signed_in.write().await.insert(identity.uid.clone());
        self.tokens
            .write()
            .await
            .insert(identity.id_token.clone(), email.to_string());
    }
}

fn rejected(code: &str) -> ProviderError {
    ProviderError::Rejected {
        code: code.to_string(),
    }
}

fn identity_for(email: &str, account: &Account) -> Identity {
    Identity {
        uid: account.uid.clone(),
        email: Some(email.to_string()),
        display_name: account.display_name.clone(),
        id_token: Uuid::new_v4().to_string(),
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, ProviderError> {
        if email.is_empty() || !email.contains('@') {
            return Err(rejected("INVALID_EMAIL"));
        }

        if password.len() < MIN_PASSWORD_LEN {
            return Err(rejected("WEAK_PASSWORD"));
        }

        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(email) {
            return Err(rejected("EMAIL_EXISTS"));
        }

        let account = Account {
            uid: Uuid::new_v4().simple().to_string(),
            password: password.to_string(),
            display_name: None,
        };
        let identity = identity_for(email, &account);
        accounts.insert(email.to_string(), account);

        self.open(email, &identity).await;

        Ok(identity)
    }

    async fn set_display_name(
        &self,
        identity: &Identity,
        display_name: &str,
    ) -> Result<(), ProviderError> {
        let mut accounts = self.accounts.write().await;

        let account = accounts
            .values_mut()
            .find(|account| account.uid == identity.uid)
            .ok_or_else(|| rejected("USER_NOT_FOUND"))?;

        account.display_name = Some(display_name.to_string());
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, ProviderError> {
        let accounts = self.accounts.read().await;

        let account = accounts
            .get(email)
            .ok_or_else(|| rejected("EMAIL_NOT_FOUND"))?;

        if account.password != password {
            return Err(rejected("INVALID_PASSWORD"));
        }

        let identity = identity_for(email, account);
        self.open(email, &identity).await;

        Ok(identity)
    }

    async fn resume(&self, id_token: &str) -> Result<Identity, ProviderError> {
        let email = self
            .tokens
            .read()
            .await
            .get(id_token)
            .cloned()
            .ok_or_else(|| rejected("INVALID_ID_TOKEN"))?;

        let accounts = self.accounts.read().await;
        let account = accounts
            .get(&email)
            .ok_or_else(|| rejected("USER_NOT_FOUND"))?;

        Ok(Identity {
            id_token: id_token.to_string(),
            ..identity_for(&email, account)
        })
    }

    async fn sign_out(&self, identity: &Identity) -> Result<(), ProviderError> {
        self.signed_in.write().await.remove(&identity.uid);
        self.tokens.write().await.remove(&identity.id_token);

        Ok(())
    }

    async fn delete_account(&self, identity: &Identity) -> Result<(), ProviderError> {
        self.accounts
            .write()
            .await
            .retain(|_, account| account.uid != identity.uid);
        self.signed_in.write().await.remove(&identity.uid);
        self.tokens.write().await.remove(&identity.id_token);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(error: ProviderError) -> String {
        match error {
            ProviderError::Rejected { code } => code,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_create_then_sign_in() {
        let provider = MemoryIdentity::new();

        let created = provider.create_account("a@x.com", "secret1").await.unwrap();
        assert!(provider.is_signed_in(&created.uid).await);

        provider.sign_out(&created).await.unwrap();
        assert!(!provider.is_signed_in(&created.uid).await);

        let signed_in = provider.sign_in("a@x.com", "secret1").await.unwrap();
        assert_eq!(signed_in.uid, created.uid);
        assert_ne!(signed_in.id_token, created.id_token);
    }

    #[tokio::test]
    async fn test_error_codes() {
        let provider = MemoryIdentity::new();
        provider.create_account("a@x.com", "secret1").await.unwrap();

        assert_eq!(
            code(provider.create_account("a@x.com", "secret1").await.unwrap_err()),
            "EMAIL_EXISTS"
        );
        assert_eq!(
            code(provider.create_account("b@x.com", "pw").await.unwrap_err()),
            "WEAK_PASSWORD"
        );
        assert_eq!(
            code(provider.sign_in("c@x.com", "secret1").await.unwrap_err()),
            "EMAIL_NOT_FOUND"
        );
        assert_eq!(
            code(provider.sign_in("a@x.com", "wrong!").await.unwrap_err()),
            "INVALID_PASSWORD"
        );
    }

    #[tokio::test]
    async fn test_resume_from_token() {
        let provider = MemoryIdentity::new();
        let signed_in = provider.create_account("a@x.com", "secret1").await.unwrap();

        let resumed = provider.resume(&signed_in.id_token).await.unwrap();
        assert_eq!(resumed, signed_in);

        provider.sign_out(&signed_in).await.unwrap();
        assert_eq!(
            code(provider.resume(&signed_in.id_token).await.unwrap_err()),
            "INVALID_ID_TOKEN"
        );
    }

    #[tokio::test]
    async fn test_delete_account() {
        let provider = MemoryIdentity::new();
        let identity = provider.create_account("a@x.com", "secret1").await.unwrap();

        provider.delete_account(&identity).await.unwrap();

        assert!(!provider.has_account("a@x.com").await);
        assert!(!provider.is_signed_in(&identity.uid).await);
    }
}
