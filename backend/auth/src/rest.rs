//! # Hosted identity provider
//!
//! Email/password accounts over the provider's REST surface.
//!
//! ## Endpoints
//! - `accounts:signUp`: create, returns a signed-in token
//! - `accounts:signInWithPassword`: authenticate
//! - `accounts:update`: display name
//! - `accounts:lookup`: account behind a token
//! - `accounts:delete`: remove the account behind a token
//!
//! Errors come back as `{"error": {"message": "EMAIL_EXISTS", ...}}`. Some
//! messages carry a suffix (`WEAK_PASSWORD : Password should be ...`), only
//! the code before it is kept.
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;
use tracing::debug;

use crate::identity::{Identity, IdentityProvider, ProviderError};

pub const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com/v1";

pub struct RestIdentity {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    local_id: String,
    id_token: String,
    email: Option<String>,
    display_name: Option<String>,
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl From<TokenResponse> for Identity {
    fn from(response: TokenResponse) -> Self {
        Identity {
            uid: response.local_id,
            email: response.email,
            display_name: response.display_name.filter(|name| !name.is_empty()),
            id_token: response.id_token,
        }
    }
}

pub fn error_code(message: &str) -> String {
    message
        .split(" : ")
        .next()
        .unwrap_or(message)
        .trim()
        .to_string()
}

impl RestIdentity {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/accounts:{method}?key={}", self.base_url, self.api_key)
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T, ProviderError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("Identity call accounts:{method}");

        let response = self
            .client
            .post(self.endpoint(method))
            .json(body)
            .send()
            .await?;

        read(response).await
    }
}

async fn read<T: DeserializeOwned>(response: Response) -> Result<T, ProviderError> {
    if response.status().is_success() {
        return Ok(response.json().await?);
    }

    let status = response.status();
    let code = match response.json::<ErrorEnvelope>().await {
        Ok(envelope) => error_code(&envelope.error.message),
        Err(_) => format!("HTTP_{}", status.as_u16()),
    };

    Err(ProviderError::Rejected { code })
}

#[async_trait]
impl IdentityProvider for RestIdentity {
    async fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, ProviderError> {
        let request = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };

        let response: TokenResponse = self.call("signUp", &request).await?;
        Ok(response.into())
    }

    async fn set_display_name(
        &self,
        identity: &Identity,
        display_name: &str,
    ) -> Result<(), ProviderError> {
        let request = json!({
            "idToken": identity.id_token,
            "displayName": display_name,
            "returnSecureToken": false,
        });

        let _: serde_json::Value = self.call("update", &request).await?;
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, ProviderError> {
        let request = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };

        let response: TokenResponse = self.call("signInWithPassword", &request).await?;
        Ok(response.into())
    }

    async fn resume(&self, id_token: &str) -> Result<Identity, ProviderError> {
        let request = json!({ "idToken": id_token });

        let response: LookupResponse = self.call("lookup", &request).await?;
        let user = response
            .users
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Rejected {
                code: "USER_NOT_FOUND".to_string(),
            })?;

        Ok(Identity {
            uid: user.local_id,
            email: user.email,
            display_name: user.display_name.filter(|name| !name.is_empty()),
            id_token: id_token.to_string(),
        })
    }

    async fn sign_out(&self, identity: &Identity) -> Result<(), ProviderError> {
        // Tokens are bearer-held, dropping them ends the session
        debug!("Released token for {}", identity.uid);

        Ok(())
    }

    async fn delete_account(&self, identity: &Identity) -> Result<(), ProviderError> {
        let request = json!({ "idToken": identity.id_token });

        let _: serde_json::Value = self.call("delete", &request).await?;
        Ok(())
    }
}
