use records::{Role, StoreError};
use thiserror::Error;

use crate::identity::ProviderError;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("You don't have {role} access. Please sign in with the correct account type.")]
    AccessDenied { role: Role },

    #[error("User data not found. Please contact support.")]
    ProfileNotFound { uid: String },

    /// The identity exists but its profile could not be written.
    /// `compensated` says whether the identity was deleted again.
    #[error("Registration incomplete for {uid} (identity removed: {compensated}): {source}")]
    PartialFailure {
        uid: String,
        compensated: bool,
        #[source]
        source: Box<AuthError>,
    },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
