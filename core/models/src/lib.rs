//! Data models shared by all Portcullis components.
//!
//! - [`CredentialEnvelope`]: unverified credentials extracted from a request.
//! - [`Identity`]: the verified result of authenticating a [`CredentialEnvelope`].
//! - [`Caller`]: who is performing the current request, authenticated or not.
mod credential;
mod identity;

pub use self::credential::CredentialEnvelope;
pub use self::credential::Scheme;
pub use self::identity::Caller;
pub use self::identity::Identity;
pub use self::identity::Principal;
