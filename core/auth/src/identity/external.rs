//! Interface to external identity providers verifying federated assertions.
use serde::Deserialize;
use serde::Serialize;

use portcullis_context::Context;

/// Claims about a principal as asserted by an external identity provider.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FederatedClaims {
    /// Email address of the principal.
    pub email: String,

    /// Capabilities granted to the principal by the provider, if any.
    #[serde(default)]
    pub capabilities: Vec<String>,

    /// Provider specific unique identifier of the principal.
    pub subject: String,
}

/// The external identity provider rejected an assertion.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("[{code}] {description}")]
pub struct ExternalFailure {
    /// Machine readable failure code, such as `invalid_token`.
    pub code: String,

    /// Human readable description of the failure.
    pub description: String,
}

impl ExternalFailure {
    /// The assertion is not a valid token.
    pub fn invalid_token<S: Into<String>>(description: S) -> Self {
        ExternalFailure::new("invalid_token", description)
    }

    /// Create a failure with an arbitrary code.
    pub fn new<S1, S2>(code: S1, description: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        ExternalFailure {
            code: code.into(),
            description: description.into(),
        }
    }
}

/// Verify opaque assertions with an external identity provider.
///
/// The protocol used to verify assertions (for example an OpenID Connect token exchange)
/// is entirely up to implementations.
#[async_trait::async_trait]
pub trait ExternalIdentityVerifier: Send + Sync {
    /// Verify an assertion and return the claims it carries.
    async fn verify_assertion(
        &self,
        context: &Context,
        assertion: &str,
    ) -> Result<FederatedClaims, ExternalFailure>;
}
