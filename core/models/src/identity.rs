//! Verified identities and the caller of a request.
use std::collections::BTreeSet;
use std::fmt::Display;
use std::fmt::Formatter;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

/// The identified subject of a request.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Principal {
    /// Identity asserted by an external identity provider.
    Federated { subject: String, email: String },

    /// Synthetic identity for automated clients.
    Service { name: String },

    /// Human user known to the service.
    User { username: String },
}

impl Principal {
    /// Domain part of the principal's email address, for federated principals.
    pub fn email_domain(&self) -> Option<&str> {
        match self {
            Principal::Federated { email, .. } => email.rsplit_once('@').map(|(_, domain)| domain),
            _ => None,
        }
    }

    /// Name the principal is known by for display and authorisation purposes.
    pub fn name(&self) -> &str {
        match self {
            Principal::Federated { email, .. } => email,
            Principal::Service { name } => name,
            Principal::User { username } => username,
        }
    }

    /// Create a [`Principal::Service`].
    pub fn service<S: Into<String>>(name: S) -> Self {
        Principal::Service { name: name.into() }
    }

    /// Create a [`Principal::User`].
    pub fn user<S: Into<String>>(username: S) -> Self {
        Principal::User {
            username: username.into(),
        }
    }
}

impl Display for Principal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable result of a successful verification: a principal and its capabilities.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Identity {
    capabilities: BTreeSet<String>,
    principal: Principal,
}

impl Identity {
    /// Create a verified identity granted the given capabilities.
    ///
    /// Duplicate capabilities collapse into one.
    pub fn new<I, S>(principal: Principal, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let capabilities = capabilities.into_iter().map(Into::into).collect();
        Identity {
            capabilities,
            principal,
        }
    }

    /// Capabilities granted to the identity.
    pub fn capabilities(&self) -> &BTreeSet<String> {
        &self.capabilities
    }

    /// Check if the identity was granted a capability.
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }

    /// The verified principal.
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Identities only exist once verified.
    pub fn verified(&self) -> bool {
        true
    }
}

/// Who is performing the current request.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum Caller {
    /// No authenticated identity is attached to the request.
    #[default]
    Anonymous,

    /// The request was authenticated as the given identity.
    Authenticated(Arc<Identity>),
}

impl Caller {
    /// The authenticated identity, if any.
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Caller::Anonymous => None,
            Caller::Authenticated(identity) => Some(identity),
        }
    }

    /// Check if the caller is anonymous.
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Caller::Anonymous)
    }

    /// Name of the caller for logs and audit records.
    pub fn name(&self) -> &str {
        match self {
            Caller::Anonymous => "anonymous",
            Caller::Authenticated(identity) => identity.principal().name(),
        }
    }
}

impl From<Identity> for Caller {
    fn from(value: Identity) -> Self {
        Caller::Authenticated(Arc::new(value))
    }
}
