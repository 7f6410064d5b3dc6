//! # Auth
//!
//! Role-gated account workflow on top of an external identity provider and
//! the `users` collection.
//!
//! ## Sessions
//!
//! - Every caller owns its [`Session`], nothing is process-wide
//! - Interactive sessions drop whatever they hold before a new login
//! - Server sessions never sign anything out implicitly before a login
//!
//! ## Roles
//!
//! The role written at registration decides which login succeeds. A login
//! asking for another role is signed straight back out and denied.
pub mod error;
pub mod identity;
pub mod manager;
pub mod memory;
pub mod rest;
pub mod session;

pub use error::AuthError;
pub use identity::{Identity, IdentityProvider, ProviderError};
pub use manager::{AccountManager, Attributes, LoginOutcome};
pub use memory::MemoryIdentity;
pub use rest::RestIdentity;
pub use session::{Session, SessionContext};
