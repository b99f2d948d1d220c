//! Unverified credentials as extracted from requests.
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;

use serde::Deserialize;
use serde::Serialize;

/// Family of credential format and verification method.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scheme {
    /// Assertion issued by an external identity provider.
    FederatedToken,

    /// Secret shared between the service and a trusted client.
    FixedSecret,

    /// Username and password pair.
    Password,
}

impl Scheme {
    /// Stable string identifier of the scheme.
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::FederatedToken => "federated-token",
            Scheme::FixedSecret => "fixed-secret",
            Scheme::Password => "password",
        }
    }
}

impl Display for Scheme {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unverified claims and proof material extracted from a request.
///
/// Envelopes are consumed by value when authenticated so they can't be reused
/// once verification has been attempted.
/// A successful verification produces an [`Identity`](crate::Identity) in their place.
#[derive(Clone, Eq, PartialEq)]
pub enum CredentialEnvelope {
    /// Opaque assertion to verify with an external identity provider.
    FederatedToken { assertion: String },

    /// Shared secret presented by a trusted client.
    FixedSecret { secret: String },

    /// Username and password claimed by the client.
    Password { username: String, password: String },
}

impl CredentialEnvelope {
    /// Principal the client claims to be, for schemes that carry one.
    pub fn claimed_principal(&self) -> Option<&str> {
        match self {
            CredentialEnvelope::Password { username, .. } => Some(username),
            _ => None,
        }
    }

    /// Envelope for an external identity assertion.
    pub fn federated<S: Into<String>>(assertion: S) -> Self {
        CredentialEnvelope::FederatedToken {
            assertion: assertion.into(),
        }
    }

    /// Envelope for a shared secret.
    pub fn fixed_secret<S: Into<String>>(secret: S) -> Self {
        CredentialEnvelope::FixedSecret {
            secret: secret.into(),
        }
    }

    /// Envelope for a username and password pair.
    pub fn password<S1, S2>(username: S1, password: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        CredentialEnvelope::Password {
            username: username.into(),
            password: password.into(),
        }
    }

    /// The [`Scheme`] this envelope is tagged with.
    pub fn scheme(&self) -> Scheme {
        match self {
            CredentialEnvelope::FederatedToken { .. } => Scheme::FederatedToken,
            CredentialEnvelope::FixedSecret { .. } => Scheme::FixedSecret,
            CredentialEnvelope::Password { .. } => Scheme::Password,
        }
    }
}

// Proof material must never end up in logs.
impl Debug for CredentialEnvelope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialEnvelope::FederatedToken { .. } => f
                .debug_struct("FederatedToken")
                .field("assertion", &"<redacted>")
                .finish(),
            CredentialEnvelope::FixedSecret { .. } => f
                .debug_struct("FixedSecret")
                .field("secret", &"<redacted>")
                .finish(),
            CredentialEnvelope::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CredentialEnvelope;
    use super::Scheme;

    #[test]
    fn debug_redacts_proof() {
        let envelope = CredentialEnvelope::password("alice", "hunter2");
        let debug = format!("{:?}", envelope);
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));

        let envelope = CredentialEnvelope::fixed_secret("beep-boop");
        assert!(!format!("{:?}", envelope).contains("beep-boop"));
    }

    #[test]
    fn claimed_principal_only_for_passwords() {
        let envelope = CredentialEnvelope::password("alice", "password");
        assert_eq!(envelope.claimed_principal(), Some("alice"));
        let envelope = CredentialEnvelope::federated("token");
        assert_eq!(envelope.claimed_principal(), None);
    }

    #[test]
    fn scheme_tags() {
        assert_eq!(
            CredentialEnvelope::federated("t").scheme(),
            Scheme::FederatedToken
        );
        assert_eq!(
            CredentialEnvelope::fixed_secret("s").scheme(),
            Scheme::FixedSecret
        );
        assert_eq!(Scheme::FixedSecret.to_string(), "fixed-secret");
        let json = serde_json::to_string(&Scheme::FederatedToken).unwrap();
        assert_eq!(json, "\"federated-token\"");
    }
}
