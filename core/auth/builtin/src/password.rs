//! Username and password authentication.
use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use serde::Serialize;

use portcullis_auth::identity::CredentialExtractor;
use portcullis_auth::identity::RequestView;
use portcullis_auth::identity::Verification;
use portcullis_auth::identity::VerificationFailure;
use portcullis_auth::identity::Verifier;
use portcullis_context::Context;
use portcullis_models::CredentialEnvelope;
use portcullis_models::Identity;
use portcullis_models::Principal;
use portcullis_models::Scheme;

const BAD_CREDENTIALS: &str = "Bad credentials";

/// Extract [`CredentialEnvelope::Password`]s from HTTP Basic `Authorization` headers.
#[derive(Clone, Debug, Default)]
pub struct BasicAuth;

impl BasicAuth {
    fn credentials(value: &str) -> Result<CredentialEnvelope, String> {
        let encoded = crate::authorization_credentials(value, "Basic")
            .ok_or_else(|| "authorization header is not using the Basic scheme".to_string())?;
        let decoded = BASE64
            .decode(encoded.trim())
            .map_err(|error| format!("invalid Basic authorization encoding: {}", error))?;
        let decoded = String::from_utf8(decoded)
            .map_err(|_| "Basic authorization credentials are not valid UTF-8".to_string())?;
        let (username, password) = decoded
            .split_once(':')
            .ok_or_else(|| "Basic authorization credentials are missing a password".to_string())?;
        Ok(CredentialEnvelope::password(username, password))
    }
}

impl CredentialExtractor for BasicAuth {
    fn applies(&self, request: &dyn RequestView) -> bool {
        match request.header("authorization") {
            Ok(Some(value)) => crate::authorization_credentials(value, "Basic").is_some(),
            _ => false,
        }
    }

    fn extract(&self, request: &dyn RequestView) -> Result<CredentialEnvelope, VerificationFailure> {
        let value = match request.header("authorization") {
            Ok(Some(value)) => value,
            Ok(None) => {
                return Err(VerificationFailure::BadCredentials {
                    reason: "missing authorization header".into(),
                })
            }
            Err(error) => {
                return Err(VerificationFailure::BadCredentials {
                    reason: format!("invalid authorization header: {}", error),
                })
            }
        };
        BasicAuth::credentials(value).map_err(|reason| VerificationFailure::BadCredentials { reason })
    }

    fn scheme(&self) -> Scheme {
        Scheme::Password
    }
}

/// Account known to a [`UserStore`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Capabilities granted to the user once authenticated.
    #[serde(default)]
    pub capabilities: Vec<String>,

    /// Locked users exist but can't log in.
    #[serde(default)]
    pub locked: bool,

    /// Password the user must present.
    pub password: String,

    /// Name the user logs in with.
    pub username: String,
}

impl User {
    /// Define a user that can log in with the given password.
    pub fn new<S1, S2, I, C>(username: S1, password: S2, capabilities: I) -> User
    where
        S1: Into<String>,
        S2: Into<String>,
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        User {
            capabilities: capabilities.into_iter().map(Into::into).collect(),
            locked: false,
            password: password.into(),
            username: username.into(),
        }
    }

    /// Prevent the user from logging in.
    pub fn lock(mut self) -> User {
        self.locked = true;
        self
    }
}

/// In-memory lookup of users by username.
#[derive(Clone, Debug, Default)]
pub struct UserStore {
    users: BTreeMap<String, User>,
}

impl UserStore {
    /// Find a user by username.
    pub fn get(&self, username: &str) -> Option<&User> {
        self.users.get(username)
    }

    /// Add a user to the store, replacing any user with the same username.
    pub fn insert(&mut self, user: User) {
        self.users.insert(user.username.clone(), user);
    }

    /// Number of users in the store.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Check if the store has no users.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl FromIterator<User> for UserStore {
    fn from_iter<T: IntoIterator<Item = User>>(iter: T) -> Self {
        let mut store = UserStore::default();
        for user in iter {
            store.insert(user);
        }
        store
    }
}

/// Verify username and password pairs against a [`UserStore`].
///
/// Passwords are compared as plain text.
#[derive(Clone, Debug)]
pub struct PasswordVerifier {
    users: UserStore,
}

impl PasswordVerifier {
    pub fn new(users: UserStore) -> PasswordVerifier {
        PasswordVerifier { users }
    }
}

#[async_trait::async_trait]
impl Verifier for PasswordVerifier {
    fn scheme(&self) -> Scheme {
        Scheme::Password
    }

    async fn verify(&self, context: &Context, envelope: &CredentialEnvelope) -> Verification {
        let (username, password) = match envelope {
            CredentialEnvelope::Password { username, password } => (username, password),
            _ => {
                return Verification::Failed(VerificationFailure::UnsupportedEnvelope {
                    scheme: envelope.scheme(),
                })
            }
        };
        let user = match self.users.get(username) {
            Some(user) if user.password == *password => user,
            _ => {
                slog::trace!(context.logger, "Password mismatch or unknown user"; "username" => username);
                return Verification::bad_credentials(BAD_CREDENTIALS);
            }
        };
        if user.locked {
            return Verification::Failed(VerificationFailure::AccountLocked {
                principal: user.username.clone(),
            });
        }
        let principal = Principal::user(user.username.clone());
        Verification::Verified(Identity::new(principal, user.capabilities.iter().cloned()))
    }
}

/// Authenticate one special principal regardless of the password it presents.
///
/// All other principals are declined so a fallback verifier can check them.
#[derive(Clone, Debug)]
pub struct SinglePrincipalVerifier {
    capabilities: Vec<String>,
    username: String,
}

impl SinglePrincipalVerifier {
    /// Always authenticate `username` with the given capabilities.
    pub fn new<S, I, C>(username: S, capabilities: I) -> SinglePrincipalVerifier
    where
        S: Into<String>,
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        SinglePrincipalVerifier {
            capabilities: capabilities.into_iter().map(Into::into).collect(),
            username: username.into(),
        }
    }
}

#[async_trait::async_trait]
impl Verifier for SinglePrincipalVerifier {
    fn scheme(&self) -> Scheme {
        Scheme::Password
    }

    async fn verify(&self, _: &Context, envelope: &CredentialEnvelope) -> Verification {
        if envelope.claimed_principal() != Some(self.username.as_str()) {
            return Verification::Declined;
        }
        let principal = Principal::user(self.username.clone());
        Verification::Verified(Identity::new(principal, self.capabilities.iter().cloned()))
    }
}
