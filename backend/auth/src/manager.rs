use std::sync::Arc;

use rand::Rng;
use records::{AccountRecord, DocumentStore, Role, USERS, read_record, write_record};
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::{
    error::AuthError,
    identity::{Identity, IdentityProvider},
    session::{Session, SessionContext},
};

pub type Attributes = Map<String, Value>;

const DEFAULT_PINCODE: &str = "000000";

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub identity: Identity,
    pub record: AccountRecord,
}

/// Composes the identity provider and the `users` collection into the
/// register / login / sign-out workflow.
#[derive(Clone)]
pub struct AccountManager {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn DocumentStore>,
}

impl AccountManager {
    pub fn new(identity: Arc<dyn IdentityProvider>, store: Arc<dyn DocumentStore>) -> Self {
        Self { identity, store }
    }

    /// Creates the identity and its profile, then signs the session into it.
    ///
    /// If anything fails once the identity exists, the identity is deleted
    /// again (best effort) and [`AuthError::PartialFailure`] is returned.
    pub async fn register(
        &self,
        session: &Session,
        email: &str,
        password: &str,
        display_name: &str,
        role: Role,
        attributes: Attributes,
    ) -> Result<AccountRecord, AuthError> {
        require(&[email, password, display_name])?;

        if session.is_active() {
            self.sign_out(session).await?;
        }

        let identity = self
            .identity
            .create_account(email, password)
            .await
            .inspect_err(|e| error!("Error registering user: {e}"))?;

        match self
            .write_profile(&identity, email, display_name, role, attributes)
            .await
        {
            Ok(record) => {
                info!("Registered {} as {role}", record.uid);
                session.establish(identity);

                Ok(record)
            }
            Err(error) => Err(self.compensate(&identity, error).await),
        }
    }

    async fn write_profile(
        &self,
        identity: &Identity,
        email: &str,
        display_name: &str,
        role: Role,
        attributes: Attributes,
    ) -> Result<AccountRecord, AuthError> {
        self.identity
            .set_display_name(identity, display_name)
            .await?;

        let record = build_record(identity, email, display_name, role, attributes);

        write_record(self.store.as_ref(), USERS, &record.uid, &record)
            .await
            .inspect_err(|e| error!("Error writing profile for {}: {e}", record.uid))?;

        Ok(record)
    }

    async fn compensate(&self, identity: &Identity, source: AuthError) -> AuthError {
        let compensated = match self.identity.delete_account(identity).await {
            Ok(()) => {
                warn!("Removed orphaned identity {}", identity.uid);
                true
            }
            Err(e) => {
                error!("Orphaned identity {} could not be removed: {e}", identity.uid);
                false
            }
        };

        AuthError::PartialFailure {
            uid: identity.uid.clone(),
            compensated,
            source: Box::new(source),
        }
    }

    /// Authenticates and checks the stored role against `role`.
    ///
    /// Any failure after authentication signs the new identity back out, so
    /// the session is left as it was.
    pub async fn login(
        &self,
        session: &Session,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<LoginOutcome, AuthError> {
        require(&[email, password])?;

        if session.context() == SessionContext::Interactive && session.is_active() {
            self.sign_out(session).await?;
        }

        let identity = self
            .identity
            .sign_in(email, password)
            .await
            .inspect_err(|e| error!("Error logging in: {e}"))?;
        info!("User logged in: {}", identity.uid);

        match self.verify_role(&identity, role).await {
            Ok(record) => {
                session.establish(identity.clone());

                Ok(LoginOutcome { identity, record })
            }
            Err(denied) => {
                if let Err(e) = self.identity.sign_out(&identity).await {
                    error!("Error rolling back login for {}: {e}", identity.uid);
                }

                Err(denied)
            }
        }
    }

    async fn verify_role(&self, identity: &Identity, role: Role) -> Result<AccountRecord, AuthError> {
        let record: Option<AccountRecord> =
            read_record(self.store.as_ref(), USERS, &identity.uid).await?;

        let Some(record) = record else {
            error!("User document doesn't exist for UID: {}", identity.uid);
            return Err(AuthError::ProfileNotFound {
                uid: identity.uid.clone(),
            });
        };

        if record.role != role {
            error!("Role mismatch: {} vs {role}", record.role);
            return Err(AuthError::AccessDenied { role });
        }

        Ok(record)
    }

    /// Signs the session into the account behind an id token issued earlier
    /// by `login` or `register`.
    pub async fn resume(&self, session: &Session, id_token: &str) -> Result<Identity, AuthError> {
        require(&[id_token])?;

        let identity = self
            .identity
            .resume(id_token)
            .await
            .inspect_err(|e| warn!("Rejected id token: {e}"))?;

        session.establish(identity.clone());
        Ok(identity)
    }

    /// Ends the provider session and clears the handle. On provider failure
    /// the handle is left untouched.
    pub async fn sign_out(&self, session: &Session) -> Result<(), AuthError> {
        if let Some(identity) = session.current() {
            self.identity
                .sign_out(&identity)
                .await
                .inspect_err(|e| error!("Error signing out: {e}"))?;

            info!("Signed out {}", identity.uid);
        }

        session.clear();
        Ok(())
    }

    /// Profile of whoever the session holds, if anyone.
    pub async fn current_user_data(
        &self,
        session: &Session,
    ) -> Result<Option<AccountRecord>, AuthError> {
        let Some(identity) = session.current() else {
            return Ok(None);
        };

        let record: Option<AccountRecord> =
            read_record(self.store.as_ref(), USERS, &identity.uid).await?;

        if record.is_none() {
            error!("No user data found for logged in user: {}", identity.uid);
        }

        Ok(record)
    }

    /// Resolves once, from the first session state observed, then detaches.
    pub async fn check_auth(&self, session: &Session) -> bool {
        let mut changes = session.subscribe();

        let uid = match changes.wait_for(|_| true).await {
            Ok(state) => Option::as_ref(&state).map(|identity| identity.uid.clone()),
            Err(_) => None,
        };

        drop(changes);

        match uid {
            Some(uid) => {
                info!("User is authenticated: {uid}");
                true
            }
            None => {
                info!("User is not authenticated");
                false
            }
        }
    }
}

fn require(fields: &[&str]) -> Result<(), AuthError> {
    if fields.iter().any(|field| field.trim().is_empty()) {
        return Err(AuthError::Validation("Missing required fields".to_string()));
    }

    Ok(())
}

fn build_record(
    identity: &Identity,
    email: &str,
    display_name: &str,
    role: Role,
    mut attributes: Attributes,
) -> AccountRecord {
    for key in AccountRecord::RESERVED {
        if attributes.remove(key).is_some() {
            warn!("Ignoring registration attribute {key}");
        }
    }

    let gender = take_string(&mut attributes, "gender");
    let phone_number = take_string(&mut attributes, "phoneNumber");

    let hospital_id = match role {
        Role::Admin => Some(hospital_id(attributes.get("pincode"))),
        _ => None,
    };

    AccountRecord {
        uid: identity.uid.clone(),
        email: identity.email.clone().or_else(|| Some(email.to_string())),
        display_name: display_name.to_string(),
        role,
        gender,
        phone_number,
        hospital_id,
        extra: attributes,
    }
}

fn take_string(attributes: &mut Attributes, key: &str) -> Option<String> {
    match attributes.remove(key)? {
        Value::String(value) => Some(value),
        other => {
            warn!("Dropping non-string {key}: {other}");
            None
        }
    }
}

/// `{serial}-{pincode}`, serial being four random digits.
pub fn hospital_id(pincode: Option<&Value>) -> String {
    let pincode = match pincode {
        Some(Value::String(code)) if !code.is_empty() => code.clone(),
        Some(Value::Number(code)) => code.to_string(),
        _ => DEFAULT_PINCODE.to_string(),
    };

    let serial = rand::thread_rng().gen_range(1000..=9999);

    format!("{serial}-{pincode}")
}
